//! Data model and pure logic shared by every stage of the decompilation
//! pipeline: the constant pool, the type lattice, attribute parsing, and
//! the class-file structure itself. Byte-stream reading for bytecode
//! proper (the disassembler) lives in `jclass-parser`, which depends on
//! this crate rather than the reverse.

pub mod access;
pub mod attributes;
pub mod class_file;
pub mod error;
pub mod pool;
pub mod pos;
pub mod qualified_name;
pub mod types;

pub use access::{ClassAccess, FieldAccess, MethodAccess};
pub use attributes::{Attribute, AttributeContext, Code};
pub use class_file::{ClassFile, FieldInfo, MethodInfo};
pub use error::{DecompileError, FormatError, LogicError, StreamError};
pub use pool::ConstantPool;
pub use pos::{IndexRange, Pos};
pub use qualified_name::QualifiedName;
pub use types::{parse_field_descriptor, parse_method_descriptor, ImplicitCastStatus, MethodDescriptor, Primitive, RefType, Type};
