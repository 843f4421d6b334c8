//! The type system component (§4.3): descriptor/signature parsing and the
//! lattice of primitive, reference, and ambiguous types.

pub mod descriptor;
pub mod lattice;
pub mod primitive;
pub mod signature;

pub use descriptor::{parse_field_descriptor, parse_method_descriptor, MethodDescriptor};
pub use lattice::{primitives, ImplicitCastStatus, IntFamily, RefType, Type};
pub use primitive::Primitive;
pub use signature::{parse_class_signature, parse_field_signature, parse_method_signature};
