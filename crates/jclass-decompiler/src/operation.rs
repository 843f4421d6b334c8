//! The typed operation tree built by the symbolic evaluator (§3
//! "Operation", §4.6).
//!
//! Grounded on `angelscript-compiler/src/expr/*.rs`'s `ExprInfo` nodes,
//! inverted: the teacher's expression compiler walks a parsed AST down
//! into bytecode; this walks bytecode up into an expression tree. Dup
//! instructions mean two instructions can produce the *same* subexpression
//! node (e.g. `new Foo(); dup; invokespecial <init>` shares one `New`
//! node between the pushed value and the constructor receiver), so this
//! is a DAG, not a tree — stored as a `Vec`-backed arena of `OperationId`
//! handles rather than owned recursive boxes.

use jclass_core::pool::CpIndex;
use jclass_core::types::Type;

/// Handle into an [`OperationArena`]. Cheap to copy, stable for the
/// lifetime of one method's evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    Ushr,
    And,
    Or,
    Xor,
}

impl BinaryOp {
    /// Printer precedence, loosely mirroring `javac`'s own grammar —
    /// used by the renderer to decide when a child expression needs
    /// parentheses (§4.9).
    pub fn priority(&self) -> u8 {
        match self {
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 2,
            BinaryOp::Add | BinaryOp::Sub => 3,
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::Ushr => 4,
            BinaryOp::And => 5,
            BinaryOp::Xor => 6,
            BinaryOp::Or => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
}

impl Comparison {
    /// The comparison for the logical negation of this test.
    pub fn negated(self) -> Comparison {
        match self {
            Comparison::Eq => Comparison::Ne,
            Comparison::Ne => Comparison::Eq,
            Comparison::Lt => Comparison::Ge,
            Comparison::Ge => Comparison::Lt,
            Comparison::Gt => Comparison::Le,
            Comparison::Le => Comparison::Gt,
        }
    }
}

/// Which family of `if*` produced a [`Operation::Compare`] node, needed
/// to render `x == null` vs `x != null` vs a boolean test bare (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareKind {
    IntZero,
    IntInt,
    RefRef,
    RefNull,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// A constant value already fully known (numeric literal, string
    /// literal, class literal, `null`).
    Constant(Literal),
    /// Read of a local variable slot (§4.7).
    LocalRead { slot: u16 },
    /// `this` reference, distinguished from a general local read so the
    /// renderer never prints an explicit `this` load for the receiver of
    /// an implicit instance member access.
    This,
    Binary {
        op: BinaryOp,
        lhs: OperationId,
        rhs: OperationId,
        ty: Type,
    },
    Unary {
        negate: bool,
        operand: OperationId,
        ty: Type,
    },
    /// A marked comparison, consumed by the control-flow reconstructor
    /// when it fuses the following `if*` into a condition rather than
    /// rendering the comparison opcode's result directly (§4.6).
    Compare {
        kind: CompareKind,
        cmp: Comparison,
        lhs: OperationId,
        rhs: OperationId,
    },
    /// An explicit narrowing/widening/reference cast. `implicit` is set
    /// once overload-ranking decides the cast is redundant and the
    /// renderer should omit it (§9).
    Cast {
        target: Type,
        operand: OperationId,
        implicit: bool,
    },
    /// `getstatic`/`getfield`.
    FieldRead {
        owner: Type,
        name: String,
        ty: Type,
        receiver: Option<OperationId>,
    },
    /// `invokevirtual`/`invokespecial`/`invokestatic`/`invokeinterface`,
    /// after `new`+`dup`+`<init>` fusion has already rewritten the
    /// allocation triple into a single [`Operation::New`] (§4.6).
    Call {
        owner: Type,
        name: String,
        descriptor: String,
        receiver: Option<OperationId>,
        args: Vec<OperationId>,
        ty: Type,
        is_static: bool,
    },
    /// The result of collapsing `new T; dup; <args...>; invokespecial
    /// <init>` into one expression (§4.6).
    New {
        ty: Type,
        ctor_descriptor: String,
        args: Vec<OperationId>,
    },
    NewArray {
        element: Type,
        dimensions: Vec<OperationId>,
        /// Present when the following stores form a contiguous `0..n`
        /// initializer run the renderer can collapse to `{a, b, c}`
        /// (§4.6, §4.9).
        inline_initializer: Option<Vec<OperationId>>,
    },
    ArrayLoad { array: OperationId, index: OperationId, element: Type },
    ArrayLength { array: OperationId },
    InstanceOf { operand: OperationId, target: Type },
    /// `invokedynamic` resolved against `StringConcatFactory` (§4.6);
    /// any other bootstrap is kept opaque via `Call`-shaped args under a
    /// synthetic owner so tolerant rendering can still show *something*.
    StringConcat { parts: Vec<OperationId> },
    /// An assignment to a local, field, or array element — also an
    /// "Operation" per §3 since a `putfield` receiver can itself sit
    /// inside an enclosing expression's operand list.
    Assign {
        target: AssignTarget,
        value: OperationId,
        ty: Type,
    },
    /// An if/else collapsed by the control-flow reconstructor because
    /// both branches leave exactly one value behind — a return or an
    /// assignment to the same target (§4.8 "If with else").
    Ternary {
        condition: OperationId,
        if_true: OperationId,
        if_false: OperationId,
        ty: Type,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Local(u16),
    Field { owner: Type, name: String, receiver: Option<OperationId> },
    ArrayElement { array: OperationId, index: OperationId },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Class(Type),
    Null,
    /// Not-yet-committed int/boolean literal (§3, §9); narrows via
    /// [`Type::cast_to`] the first time it's consumed in a typed context.
    AmbiguousInt(i64),
}

impl Operation {
    pub fn return_type(&self) -> Type {
        match self {
            Operation::Constant(lit) => lit.natural_type(),
            Operation::LocalRead { .. } | Operation::This => Type::Any,
            Operation::Binary { ty, .. } => ty.clone(),
            Operation::Unary { ty, .. } => ty.clone(),
            Operation::Compare { .. } => Type::Primitive(jclass_core::types::Primitive::Boolean),
            Operation::Cast { target, .. } => target.clone(),
            Operation::FieldRead { ty, .. } => ty.clone(),
            Operation::Call { ty, .. } => ty.clone(),
            Operation::New { ty, .. } => ty.clone(),
            Operation::NewArray { element, dimensions, .. } => {
                Type::array(element.clone(), dimensions.len().saturating_sub(1) as u8)
            }
            Operation::ArrayLoad { element, .. } => element.clone(),
            Operation::ArrayLength { .. } => Type::Primitive(jclass_core::types::Primitive::Int),
            Operation::InstanceOf { .. } => Type::Primitive(jclass_core::types::Primitive::Boolean),
            Operation::StringConcat { .. } => {
                Type::class(jclass_core::qualified_name::QualifiedName::parse("java/lang/String"))
            }
            Operation::Assign { ty, .. } => ty.clone(),
            Operation::Ternary { ty, .. } => ty.clone(),
        }
    }

    /// Printer precedence, loosely mirroring `javac`'s own grammar —
    /// used by the renderer to decide when a child expression needs
    /// parentheses (§4.9).
    pub fn priority(&self) -> u8 {
        match self {
            Operation::Constant(_)
            | Operation::LocalRead { .. }
            | Operation::This
            | Operation::FieldRead { .. }
            | Operation::Call { .. }
            | Operation::New { .. }
            | Operation::NewArray { .. }
            | Operation::ArrayLoad { .. }
            | Operation::ArrayLength { .. } => 0,
            Operation::Unary { .. } | Operation::Cast { .. } | Operation::InstanceOf { .. } => 1,
            Operation::Binary { op, .. } => op.priority(),
            Operation::Compare { .. } => 8,
            Operation::StringConcat { .. } => 3,
            Operation::Ternary { .. } | Operation::Assign { .. } => 9,
        }
    }
}

impl Literal {
    pub fn natural_type(&self) -> Type {
        use jclass_core::types::Primitive;
        match self {
            Literal::Int(_) => Type::Primitive(Primitive::Int),
            Literal::Long(_) => Type::Primitive(Primitive::Long),
            Literal::Float(_) => Type::Primitive(Primitive::Float),
            Literal::Double(_) => Type::Primitive(Primitive::Double),
            Literal::String(_) => Type::class(jclass_core::qualified_name::QualifiedName::parse("java/lang/String")),
            Literal::Class(ty) => ty.clone(),
            Literal::Null => Type::AnyObject,
            Literal::AmbiguousInt(v) => Type::ambiguous_literal(*v),
        }
    }
}

/// Where a constant-pool constant came from, kept only for diagnostics —
/// evaluator code never needs to re-look-up the index once the literal
/// is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralSource(pub CpIndex);

/// Append-only arena of [`Operation`] nodes built while evaluating one
/// method body. Shared subexpressions (dup'd values) are represented by
/// two stack slots holding the same [`OperationId`], not by cloning the
/// node.
#[derive(Default)]
pub struct OperationArena {
    nodes: Vec<Operation>,
}

impl OperationArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: Operation) -> OperationId {
        let id = OperationId(self.nodes.len() as u32);
        self.nodes.push(op);
        id
    }

    pub fn get(&self, id: OperationId) -> &Operation {
        &self.nodes[id.0 as usize]
    }

    /// Overwrite a node in place, keeping its id stable — used to finish
    /// a `new` allocation once its `<init>` call is seen, so every stack
    /// slot that was `dup`'d from the placeholder observes the same
    /// completed `Operation::New` (§4.6 "new+dup+<init> fusion").
    pub fn replace(&mut self, id: OperationId, op: Operation) {
        self.nodes[id.0 as usize] = op;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Peel transparent wrapper nodes (implicit casts only) to find the
    /// operation that actually produced a value — used when deciding
    /// whether a `dup`'d receiver is a fresh `new` allocation (§4.6
    /// "new+dup+<init> fusion").
    pub fn original(&self, mut id: OperationId) -> OperationId {
        loop {
            match self.get(id) {
                Operation::Cast { operand, implicit: true, .. } => id = *operand,
                _ => return id,
            }
        }
    }
}
