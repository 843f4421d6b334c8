//! Overload-resolution ranking (§9 "Overload resolution").
//!
//! Grounded on `angelscript-compiler/src/overload/ranking.rs`, simplified
//! to `Type::implicit_cast_status` ranking: the teacher scores candidate
//! functions against call-site argument types to pick *the* overload a
//! call resolves to during compilation; here a call already resolved to
//! one concrete overload at compile time (the descriptor on the `Call`
//! operation says exactly which), so the only question left is whether
//! each argument's explicit cast can be dropped because every *other*
//! overload would have rejected the uncast argument.
//!
//! Per §9: when the registry has no data for the callee's class, cast
//! removal is conservatively disabled — every argument keeps its
//! explicit cast.

use jclass_core::types::{ImplicitCastStatus, Type};
use jclass_registry::ClassRegistry;

/// Whether the explicit cast on argument `index` of a call to
/// `owner::method` can be rendered away because no sibling overload of
/// `method` would also implicitly accept the uncast argument type.
pub fn cast_is_redundant(
    registry: &ClassRegistry,
    owner_internal: &str,
    method_name: &str,
    param_types: &[Type],
    arg_types: &[Type],
    index: usize,
) -> bool {
    if !registry.is_loaded(owner_internal) {
        return false;
    }
    let Some(target) = param_types.get(index) else { return false };
    let Some(arg) = arg_types.get(index) else { return false };

    if arg.implicit_cast_status(target) == ImplicitCastStatus::None {
        return false;
    }

    let overloads = registry.method_overloads(owner_internal, method_name);
    let rivals = overloads
        .iter()
        .filter(|m| m.descriptor.parameters.len() == param_types.len())
        .filter(|m| m.descriptor.parameters != param_types);

    for rival in rivals {
        let Some(rival_param) = rival.descriptor.parameters.get(index) else { continue };
        if accepts_every_other_argument(rival, param_types, arg_types, index)
            && arg.implicit_cast_status(rival_param) != ImplicitCastStatus::None
        {
            // A sibling overload would also implicitly accept this
            // argument at this position — the cast is load-bearing to
            // disambiguate which overload is called, so keep it.
            return false;
        }
    }

    true
}

fn accepts_every_other_argument(
    rival: &jclass_core::class_file::MethodInfo,
    param_types: &[Type],
    arg_types: &[Type],
    skip: usize,
) -> bool {
    rival
        .descriptor
        .parameters
        .iter()
        .enumerate()
        .all(|(i, rival_param)| {
            if i == skip {
                return true;
            }
            let Some(arg) = arg_types.get(i).or_else(|| param_types.get(i)) else { return false };
            arg.implicit_cast_status(rival_param) != ImplicitCastStatus::None
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jclass_core::access::{ClassAccess, MethodAccess};
    use jclass_core::pool::{Constant, ConstantPool};
    use jclass_core::qualified_name::QualifiedName;
    use jclass_core::types::{parse_method_descriptor, Primitive};

    fn class_with_methods(name: &str, descriptors: &[&str]) -> jclass_core::class_file::ClassFile {
        let methods = descriptors
            .iter()
            .map(|d| jclass_core::class_file::MethodInfo {
                access_flags: MethodAccess::PUBLIC,
                name: "call".to_string(),
                raw_descriptor: d.to_string(),
                descriptor: parse_method_descriptor(d).unwrap(),
                attributes: Vec::new(),
            })
            .collect();
        jclass_core::class_file::ClassFile {
            minor_version: 0,
            major_version: 61,
            access_flags: ClassAccess::PUBLIC,
            this_class: QualifiedName::parse(name),
            super_class: Some(QualifiedName::parse("java/lang/Object")),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods,
            attributes: Vec::new(),
            pool: ConstantPool::from_entries(vec![Constant::Unusable]).unwrap(),
        }
    }

    #[test]
    fn unloaded_class_keeps_every_cast() {
        let registry = ClassRegistry::new();
        let redundant = cast_is_redundant(
            &registry,
            "com/example/Foo",
            "call",
            &[Type::Primitive(Primitive::Long)],
            &[Type::Primitive(Primitive::Int)],
            0,
        );
        assert!(!redundant);
    }

    #[test]
    fn sole_overload_drops_its_widening_cast() {
        let mut registry = ClassRegistry::new();
        registry.register(class_with_methods("com/example/Foo", &["(J)V"])).unwrap();
        let redundant = cast_is_redundant(
            &registry,
            "com/example/Foo",
            "call",
            &[Type::Primitive(Primitive::Long)],
            &[Type::Primitive(Primitive::Int)],
            0,
        );
        assert!(redundant);
    }

    #[test]
    fn ambiguous_sibling_overload_keeps_the_cast() {
        let mut registry = ClassRegistry::new();
        registry.register(class_with_methods("com/example/Foo", &["(J)V", "(I)V"])).unwrap();
        let redundant = cast_is_redundant(
            &registry,
            "com/example/Foo",
            "call",
            &[Type::Primitive(Primitive::Long)],
            &[Type::Primitive(Primitive::Int)],
            0,
        );
        assert!(!redundant);
    }
}
