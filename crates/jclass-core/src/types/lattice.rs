//! The type lattice (§3, §4.3, §9).
//!
//! `Type` is the unit every operation, variable, and cast reasons about.
//! Integer literals start out `Ambiguous` — represented as a bitset over
//! the five integral/boolean primitives rather than a committed type —
//! and get refined as they flow into typed contexts (a `bstore`, a
//! `byte` field, an `int` parameter...). This mirrors the teacher's
//! `DataType`/`convert` modules, simplified: no user-defined conversions,
//! no generics-aware overload ranking, no handles — just the JVM's
//! primitive-widening and reference-subtyping rules plus the
//! literal-ambiguity bitset from §9.

use std::fmt;

use crate::error::LogicError;
use crate::qualified_name::QualifiedName;
use crate::types::primitive::Primitive;

bitflags::bitflags! {
    /// Bitset over the five JVM-compatible integral/boolean primitives,
    /// used by [`Type::Ambiguous`] and [`Type::Excluding`] (§9: "An
    /// implementation may represent it as a bitset over the five
    /// integral/boolean primitives").
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct IntFamily: u8 {
        const BOOLEAN = 0b0000_0001;
        const BYTE    = 0b0000_0010;
        const CHAR    = 0b0000_0100;
        const SHORT   = 0b0000_1000;
        const INT     = 0b0001_0000;
    }
}

impl IntFamily {
    pub const ANY_INT: IntFamily = IntFamily::BYTE.union(IntFamily::CHAR).union(IntFamily::SHORT).union(IntFamily::INT);
    pub const ANY_INT_OR_BOOLEAN: IntFamily = Self::ANY_INT.union(IntFamily::BOOLEAN);
    pub const BYTE_OR_BOOLEAN: IntFamily = IntFamily::BYTE.union(IntFamily::BOOLEAN);
    pub const SHORT_OR_INT: IntFamily = IntFamily::SHORT.union(IntFamily::INT);

    pub fn singleton(p: Primitive) -> Option<IntFamily> {
        Some(match p {
            Primitive::Boolean => IntFamily::BOOLEAN,
            Primitive::Byte => IntFamily::BYTE,
            Primitive::Char => IntFamily::CHAR,
            Primitive::Short => IntFamily::SHORT,
            Primitive::Int => IntFamily::INT,
            _ => return None,
        })
    }

    pub fn contains_primitive(self, p: Primitive) -> bool {
        IntFamily::singleton(p).is_some_and(|s| self.contains(s))
    }

    /// The narrowest primitive in this set by JVM promotion order
    /// (boolean is incomparable to the others and is only picked when
    /// it's the sole remaining member).
    pub fn narrowest(self) -> Option<Primitive> {
        for (flag, prim) in [
            (IntFamily::BOOLEAN, Primitive::Boolean),
            (IntFamily::BYTE, Primitive::Byte),
            (IntFamily::SHORT, Primitive::Short),
            (IntFamily::CHAR, Primitive::Char),
            (IntFamily::INT, Primitive::Int),
        ] {
            if self.contains(flag) {
                return Some(prim);
            }
        }
        None
    }
}

/// A reference type: class, array, or unresolved type-variable (§3).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RefType {
    Class {
        name: QualifiedName,
        /// Generic type arguments, if a `Signature` attribute supplied
        /// them (§4.3 signature parser). Rendered but not unified.
        generic_args: Vec<Type>,
    },
    Array {
        element: Box<Type>,
        /// Nesting level beyond the first `[` (e.g. `int[][]` has
        /// `nesting == 1` with `element == int`).
        nesting: u8,
    },
    /// An as-yet-unbound signature type variable, e.g. `T` in `T<...>;`.
    TypeParameter(String),
}

impl RefType {
    pub fn class(name: QualifiedName) -> Self {
        RefType::Class {
            name,
            generic_args: Vec::new(),
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, RefType::Class { name, .. } if name.internal() == "java/lang/Object")
    }
}

/// The full type lattice element (§3).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(Primitive),
    Reference(RefType),
    /// Not-yet-committed integer/boolean literal (§3, §9).
    Ambiguous(IntFamily),
    /// "Any reference but these" — used when a literal `null` must avoid
    /// unifying with a handful of excluded candidate types.
    Excluding(IntFamily),
    /// Top type used when no further narrowing is possible (e.g. an
    /// operand whose producing instruction could not be resolved).
    Any,
    /// Top reference type, equivalent to `java.lang.Object` but kept
    /// distinct so the renderer need not synthesize a `QualifiedName`.
    AnyObject,
}

impl Type {
    pub fn prim(p: Primitive) -> Self {
        Type::Primitive(p)
    }

    pub fn class(name: QualifiedName) -> Self {
        Type::Reference(RefType::class(name))
    }

    pub fn array(element: Type, nesting: u8) -> Self {
        Type::Reference(RefType::Array {
            element: Box::new(element),
            nesting,
        })
    }

    pub fn ambiguous_literal(value: i64) -> Self {
        let mut set = IntFamily::INT;
        if value == 0 || value == 1 {
            set |= IntFamily::BOOLEAN;
        }
        if (i8::MIN as i64..=i8::MAX as i64).contains(&value) {
            set |= IntFamily::BYTE;
        }
        if (0..=(u16::MAX as i64)).contains(&value) {
            set |= IntFamily::CHAR;
        }
        if (i16::MIN as i64..=i16::MAX as i64).contains(&value) {
            set |= IntFamily::SHORT;
        }
        Type::Ambiguous(set)
    }

    /// JVM operand-stack slot size in words (§3).
    pub fn slot_size(&self) -> u8 {
        match self {
            Type::Primitive(p) => p.slot_size(),
            Type::Ambiguous(_) | Type::Excluding(_) => 1,
            Type::Reference(_) | Type::Any | Type::AnyObject => 1,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Reference(_) | Type::AnyObject | Type::Any)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    /// Narrow an `Ambiguous`/`Excluding` type to its single surviving
    /// candidate, if any, leaving committed types untouched.
    pub fn narrowest_primitive(&self) -> Option<Primitive> {
        match self {
            Type::Primitive(p) => Some(*p),
            Type::Ambiguous(set) => set.narrowest(),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Lattice operations (§4.3)
    // ------------------------------------------------------------------

    /// Returns the narrowed type that satisfies both `self` and `other`,
    /// or `IncompatibleTypes`.
    pub fn cast_to(&self, other: &Type) -> Result<Type, LogicError> {
        use Type::*;
        match (self, other) {
            (a, b) if a == b => Ok(a.clone()),
            (Any, t) | (t, Any) => Ok(t.clone()),
            (Ambiguous(a), Ambiguous(b)) => {
                let merged = *a & *b;
                if merged.is_empty() {
                    self.incompatible(other)
                } else {
                    Ok(Ambiguous(merged))
                }
            }
            (Ambiguous(set), Primitive(p)) | (Primitive(p), Ambiguous(set)) => {
                if set.contains_primitive(*p) {
                    Ok(Primitive(*p))
                } else if p.is_int_family() {
                    self.incompatible(other)
                } else {
                    self.incompatible(other)
                }
            }
            (Primitive(a), Primitive(b)) => {
                if a == b {
                    Ok(Primitive(*a))
                } else if a.is_int_family() && b.is_int_family() {
                    // narrower of the two widening-compatible ints
                    Ok(Primitive(narrower_int(*a, *b)))
                } else {
                    self.incompatible(other)
                }
            }
            (AnyObject, Reference(r)) | (Reference(r), AnyObject) => Ok(Reference(r.clone())),
            (AnyObject, AnyObject) => Ok(AnyObject),
            (Reference(a), Reference(b)) => {
                if a == b {
                    Ok(Reference(a.clone()))
                } else if a.is_object() {
                    Ok(Reference(b.clone()))
                } else if b.is_object() {
                    Ok(Reference(a.clone()))
                } else {
                    // Without a class hierarchy oracle, fall back to Object;
                    // the registry-backed resolver can refine this later.
                    Ok(AnyObject)
                }
            }
            _ => self.incompatible(other),
        }
    }

    /// Like `cast_to` but prefers the wider of two candidates — used when
    /// unifying a variable's type across multiple stores/loads (§4.6
    /// `*load`/`*store`).
    pub fn cast_to_widest(&self, other: &Type) -> Result<Type, LogicError> {
        use Type::*;
        match (self, other) {
            (Primitive(a), Primitive(b)) if a.is_int_family() && b.is_int_family() => {
                Ok(Primitive(wider_int(*a, *b)))
            }
            (Ambiguous(set), Primitive(p)) | (Primitive(p), Ambiguous(set)) if p.is_int_family() => {
                if set.contains_primitive(*p) {
                    Ok(Primitive(*p))
                } else {
                    Ok(Primitive(*p))
                }
            }
            _ => self.cast_to(other),
        }
    }

    /// Tries `cast_to_widest` in both directions, then the reversed
    /// argument order, so the result doesn't depend on which operand is
    /// `self` (§4.3 "enforces commutativity of literal/variable
    /// refinement").
    pub fn two_way_cast_to(&self, other: &Type) -> Result<Type, LogicError> {
        self.cast_to_widest(other)
            .or_else(|_| other.cast_to_widest(self))
    }

    /// Reflexive, transitive subtype relation (§4.3).
    pub fn is_subtype_of(&self, other: &Type) -> bool {
        use Type::*;
        match (self, other) {
            (a, b) if a == b => true,
            (_, Any) | (Any, _) => true,
            (_, AnyObject) if self.is_reference() => true,
            (Primitive(a), Primitive(b)) => primitive_subtype(*a, *b),
            (Ambiguous(set), Primitive(b)) => set.contains_primitive(*b),
            (Ambiguous(a), Ambiguous(b)) => a.iter().all(|f| {
                IntFamily::from_bits_truncate(f.bits())
                    .narrowest()
                    .is_some_and(|p| b.contains_primitive(p))
            }),
            (Reference(RefType::Array { element: e1, nesting: n1 }), Reference(RefType::Array { element: e2, nesting: n2 })) => {
                n1 == n2 && e1.is_subtype_of(e2)
            }
            (Reference(RefType::Class { name: a, .. }), Reference(RefType::Class { name: b, .. })) => {
                a == b || b.internal() == "java/lang/Object"
            }
            _ => false,
        }
    }

    /// Degree of implicit-cast compatibility used by overload resolution
    /// (§4.3, §9). Only consulted when a `ClassRegistry` oracle is
    /// present; absent that, callers conservatively treat everything as
    /// `None` and keep explicit casts (§9 Open Question).
    pub fn implicit_cast_status(&self, target: &Type) -> ImplicitCastStatus {
        if self == target {
            return ImplicitCastStatus::Same;
        }
        match (self, target) {
            (Type::Primitive(a), Type::Primitive(b)) if a.is_int_family() && b.is_int_family() => {
                if primitive_subtype(*a, *b) {
                    ImplicitCastStatus::Extend
                } else {
                    ImplicitCastStatus::None
                }
            }
            (Type::Ambiguous(set), Type::Primitive(b)) if set.contains_primitive(*b) => {
                ImplicitCastStatus::Same
            }
            (Type::Primitive(p), Type::Reference(RefType::Class { name, .. }))
                if name.simple_name() == p.boxed_name() =>
            {
                ImplicitCastStatus::Autobox
            }
            (Type::Primitive(_), Type::Reference(r)) if r.is_object() => ImplicitCastStatus::ObjectAutobox,
            (a, b) if a.is_subtype_of(b) => ImplicitCastStatus::Extend,
            _ => ImplicitCastStatus::None,
        }
    }

    /// A cast that never fails, falling back to `Any` — used by the
    /// renderer when it must display *something* even for a type the
    /// lattice couldn't unify (e.g. malformed input under tolerant mode).
    pub fn cast_noexcept(&self, other: &Type) -> Type {
        self.cast_to(other).unwrap_or(Type::Any)
    }

    fn incompatible(&self, other: &Type) -> Result<Type, LogicError> {
        Err(LogicError::IncompatibleTypes {
            lhs: self.display_name(),
            rhs: other.display_name(),
        })
    }

    pub fn display_name(&self) -> String {
        match self {
            Type::Primitive(p) => p.java_name().to_string(),
            Type::Reference(RefType::Class { name, .. }) => name.simple_name().to_string(),
            Type::Reference(RefType::Array { element, nesting }) => {
                format!("{}{}", element.display_name(), "[]".repeat(*nesting as usize + 1))
            }
            Type::Reference(RefType::TypeParameter(t)) => t.clone(),
            Type::Ambiguous(set) => format!("{{{:?}}}", set),
            Type::Excluding(set) => format!("!{{{:?}}}", set),
            Type::Any => "<any>".to_string(),
            Type::AnyObject => "Object".to_string(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Result of [`Type::implicit_cast_status`] (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImplicitCastStatus {
    Same,
    Extend,
    Autobox,
    ObjectAutobox,
    Varargs,
    None,
}

fn int_rank(p: Primitive) -> u8 {
    match p {
        Primitive::Boolean => 0,
        Primitive::Byte => 1,
        Primitive::Short => 2,
        Primitive::Char => 2,
        Primitive::Int => 3,
        Primitive::Long => 4,
        Primitive::Float => 5,
        Primitive::Double => 6,
        Primitive::Void => u8::MAX,
    }
}

fn narrower_int(a: Primitive, b: Primitive) -> Primitive {
    if int_rank(a) <= int_rank(b) { a } else { b }
}

fn wider_int(a: Primitive, b: Primitive) -> Primitive {
    if int_rank(a) >= int_rank(b) { a } else { b }
}

/// `byte ⊑ short ⊑ int`, `char ⊑ int`, every numeric primitive widens to
/// `long`/`float`/`double` per JVM promotion rules (§4.3).
fn primitive_subtype(a: Primitive, b: Primitive) -> bool {
    if a == b {
        return true;
    }
    int_rank(a) != u8::MAX && int_rank(b) != u8::MAX && int_rank(a) <= int_rank(b) && !(a == Primitive::Boolean || b == Primitive::Boolean)
}

pub mod primitives {
    use super::*;

    pub fn ambiguous_int_or_boolean() -> Type {
        Type::Ambiguous(IntFamily::ANY_INT_OR_BOOLEAN)
    }

    pub fn ambiguous_int() -> Type {
        Type::Ambiguous(IntFamily::ANY_INT)
    }
}
