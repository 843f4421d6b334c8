//! Local variable scoping and the reconstructed statement tree (§3
//! "Scope"/"Variable", §4.7, §4.8).
//!
//! Grounded on `angelscript-compiler/src/scope.rs`'s `LocalScope`, which
//! tracks declared variables and a shadow stack while compiling source
//! down to bytecode. Here the direction is reversed: a `Scope` is
//! populated as the evaluator discovers slot reads/writes and as the
//! control-flow reconstructor groups instruction ranges into nested
//! blocks, rather than as a parser walks nested `{ }`. The teacher's
//! lambda-capture walk (`get_or_capture` recursing into a parent scope)
//! has no analogue here — JVM locals aren't implicitly captured the way
//! AngelScript closures capture outer locals — so it is dropped in favor
//! of a flat parent-chain variable lookup.

use rustc_hash::FxHashMap;

use crate::operation::OperationId;
use crate::variable::Variable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Method,
    Block,
    If,
    Else,
    While,
    For,
    Switch,
    Try,
    Catch,
}

/// A binding to break/continue against; assigned lazily the first time a
/// jump needs to name a scope more than one level up (§9 Open Question:
/// labeled break/continue naming).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label(pub String);

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expression(OperationId),
    VarDecl { slot: u16, initializer: Option<OperationId> },
    Return(Option<OperationId>),
    Throw(OperationId),
    If { condition: OperationId, then_branch: Scope, else_branch: Option<Scope> },
    While { condition: OperationId, body: Scope, label: Option<Label> },
    /// Recovered `for` loop: `init` statements run once, `step`
    /// operations run at the bottom of every iteration after `body`
    /// (§4.8 "for recovery").
    For {
        init: Vec<Statement>,
        condition: Option<OperationId>,
        step: Vec<OperationId>,
        body: Scope,
        label: Option<Label>,
    },
    Switch { selector: OperationId, cases: Vec<SwitchCase>, label: Option<Label> },
    Try { body: Scope, catches: Vec<CatchClause> },
    /// `$assertionsDisabled`-guarded `if`/`throw AssertionError` pair
    /// rewritten back to `assert cond [: message];` (§4.8 "Assertions").
    Assert { condition: OperationId, message: Option<OperationId> },
    Break(Option<Label>),
    Continue(Option<Label>),
    /// A method body that failed to reconstruct under tolerant mode
    /// (§5): the original error is kept for the renderer's comment.
    FailedRegion(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// Empty means the `default` case.
    pub labels: Vec<i32>,
    pub body: Scope,
    pub falls_through: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    /// One or more caught types, grouped into one clause when bytecode
    /// shows identical handler ranges for each (multi-catch, §4.8).
    pub exception_types: Vec<jclass_core::types::Type>,
    pub exception_slot: u16,
    pub body: Scope,
}

/// A lexical scope: the variables newly visible within it plus the
/// statements it directly contains. Owns its children scopes by value —
/// built bottom-up once per method and never shared, so no arena/index
/// indirection is needed here (unlike [`crate::operation::OperationArena`],
/// whose nodes may be aliased by `dup`).
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    pub kind: ScopeKind,
    /// Variables first observed (read, written, or declared) within this
    /// scope, keyed by JVM local slot.
    variables: FxHashMap<u16, Variable>,
    pub statements: Vec<Statement>,
}

impl Scope {
    pub fn new(kind: ScopeKind) -> Self {
        Scope {
            kind,
            variables: FxHashMap::default(),
            statements: Vec::new(),
        }
    }

    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    /// Declare (or redeclare) a variable directly owned by this scope —
    /// used for `this`/parameters on the method scope and for a fresh
    /// slot first assigned inside a nested block.
    pub fn declare(&mut self, var: Variable) {
        self.variables.insert(var.slot, var);
    }

    pub fn variable(&self, slot: u16) -> Option<&Variable> {
        self.variables.get(&slot)
    }

    pub fn variable_mut(&mut self, slot: u16) -> Option<&mut Variable> {
        self.variables.get_mut(&slot)
    }

    pub fn owns(&self, slot: u16) -> bool {
        self.variables.contains_key(&slot)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }
}

/// Lookup across a chain of enclosing scopes, mirroring the teacher's
/// `LocalScope::get_variable` walk but without capture semantics: a hit
/// in an ancestor is read in place, never copied into the child.
pub struct ScopeChain<'a> {
    scopes: Vec<&'a Scope>,
}

impl<'a> ScopeChain<'a> {
    pub fn new(scopes: Vec<&'a Scope>) -> Self {
        ScopeChain { scopes }
    }

    /// Innermost-to-outermost search for the scope owning `slot`.
    pub fn find(&self, slot: u16) -> Option<&'a Variable> {
        self.scopes.iter().rev().find_map(|s| s.variable(slot))
    }

    /// Descend into a nested scope, keeping every ancestor searchable.
    pub fn child(&self, scope: &'a Scope) -> ScopeChain<'a> {
        let mut scopes = self.scopes.clone();
        scopes.push(scope);
        ScopeChain { scopes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::Variable;
    use jclass_core::types::{Primitive, Type};

    #[test]
    fn declares_and_looks_up_owned_variable() {
        let mut scope = Scope::new(ScopeKind::Method);
        scope.declare(Variable::fixed(0, Type::Primitive(Primitive::Int), "count"));
        assert!(scope.owns(0));
        assert_eq!(scope.variable(0).unwrap().slot, 0);
    }

    #[test]
    fn chain_finds_variable_in_outer_scope() {
        let mut outer = Scope::new(ScopeKind::Method);
        outer.declare(Variable::new(1, Type::Primitive(Primitive::Int)));
        let inner = Scope::new(ScopeKind::If);
        let chain = ScopeChain::new(vec![&outer, &inner]);
        assert!(chain.find(1).is_some());
        assert!(chain.find(99).is_none());
    }

    #[test]
    fn inner_scope_shadows_outer_on_find_order() {
        // find() walks innermost-first; this just documents the order,
        // since JVM slots are never genuinely shadowed (each slot is one
        // variable per its live range).
        let outer = Scope::new(ScopeKind::Method);
        let mut inner = Scope::new(ScopeKind::Block);
        inner.declare(Variable::new(2, Type::Primitive(Primitive::Int)));
        let chain = ScopeChain::new(vec![&outer, &inner]);
        assert!(chain.find(2).is_some());
    }
}
