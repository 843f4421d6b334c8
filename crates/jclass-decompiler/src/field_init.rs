//! `<clinit>`-to-field-initializer rerouting (§4.6).
//!
//! Grounded on `angelscript-compiler/src/field_init.rs`'s static
//! initializer rerouting: the teacher collects global-variable
//! initializer bytecode emitted during compilation and reattaches it to
//! the declaration rather than leaving it in a synthetic init function.
//! Here the direction is reversed — `<clinit>`'s reconstructed statements
//! already exist as ordinary `putstatic` assignments, and this module
//! pulls the ones that belong to *this* class's own fields back out into
//! each field's initializer slot, leaving only what doesn't qualify
//! (other classes' statics, control flow, helper calls) in the static
//! initializer body.

use rustc_hash::FxHashMap;

use jclass_core::types::{RefType, Type};

use crate::operation::{AssignTarget, Operation, OperationArena, OperationId};
use crate::scope::{Scope, Statement};

/// One class field's recovered initializer expression, keyed by field
/// name — `<clinit>` assigns fields by name, never by slot.
pub type FieldInitializers = FxHashMap<String, OperationId>;

/// Walk a reconstructed `<clinit>` body and pull out every `putstatic`
/// whose target is a field of `this_class` and that has not already been
/// claimed by an earlier statement touching the same field (a field may
/// only take its *first* assignment as a declaration-site initializer —
/// anything after that is genuine static-block logic).
pub fn extract(this_class_internal: &str, body: &Scope, arena: &OperationArena) -> (FieldInitializers, Vec<Statement>) {
    let mut initializers = FieldInitializers::default();
    let mut remaining = Vec::with_capacity(body.statements.len());

    for statement in &body.statements {
        if let Statement::Expression(id) = statement {
            if let Operation::Assign { target: AssignTarget::Field { owner, name, receiver: None }, value, .. } = arena.get(*id) {
                if owns_field(owner, this_class_internal) && !initializers.contains_key(name) {
                    initializers.insert(name.clone(), *value);
                    continue;
                }
            }
        }
        remaining.push(statement.clone());
    }

    (initializers, remaining)
}

fn owns_field(owner: &Type, this_class_internal: &str) -> bool {
    matches!(owner, Type::Reference(RefType::Class { name, .. }) if name.internal() == this_class_internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jclass_core::qualified_name::QualifiedName;
    use jclass_core::types::Primitive;
    use crate::operation::Literal;
    use crate::scope::ScopeKind;

    fn field_target(class: &str, name: &str) -> AssignTarget {
        AssignTarget::Field {
            owner: Type::class(QualifiedName::parse(class)),
            name: name.to_string(),
            receiver: None,
        }
    }

    #[test]
    fn first_assignment_to_own_field_becomes_initializer() {
        let mut arena = OperationArena::new();
        let value = arena.push(Operation::Constant(Literal::Int(7)));
        let assign = arena.push(Operation::Assign {
            target: field_target("com/example/Foo", "COUNT"),
            value,
            ty: Type::Primitive(Primitive::Int),
        });
        let mut body = Scope::new(ScopeKind::Method);
        body.push(Statement::Expression(assign));

        let (initializers, remaining) = extract("com/example/Foo", &body, &arena);
        assert_eq!(initializers.get("COUNT"), Some(&value));
        assert!(remaining.is_empty());
    }

    #[test]
    fn second_assignment_to_same_field_stays_in_body() {
        let mut arena = OperationArena::new();
        let first = arena.push(Operation::Constant(Literal::Int(1)));
        let second = arena.push(Operation::Constant(Literal::Int(2)));
        let a1 = arena.push(Operation::Assign { target: field_target("com/example/Foo", "COUNT"), value: first, ty: Type::Primitive(Primitive::Int) });
        let a2 = arena.push(Operation::Assign { target: field_target("com/example/Foo", "COUNT"), value: second, ty: Type::Primitive(Primitive::Int) });
        let mut body = Scope::new(ScopeKind::Method);
        body.push(Statement::Expression(a1));
        body.push(Statement::Expression(a2));

        let (initializers, remaining) = extract("com/example/Foo", &body, &arena);
        assert_eq!(initializers.len(), 1);
        assert_eq!(remaining.len(), 1);
    }

    #[test]
    fn assignment_to_another_class_field_never_becomes_an_initializer() {
        let mut arena = OperationArena::new();
        let value = arena.push(Operation::Constant(Literal::Int(9)));
        let assign = arena.push(Operation::Assign {
            target: field_target("com/example/Other", "X"),
            value,
            ty: Type::Primitive(Primitive::Int),
        });
        let mut body = Scope::new(ScopeKind::Method);
        body.push(Statement::Expression(assign));

        let (initializers, remaining) = extract("com/example/Foo", &body, &arena);
        assert!(initializers.is_empty());
        assert_eq!(remaining.len(), 1);
    }
}
