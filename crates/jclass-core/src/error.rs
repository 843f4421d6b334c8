//! Unified error types for the decompilation pipeline.
//!
//! Mirrors the phases a class file passes through: reading bytes,
//! parsing the class-file format, and reconstructing source. Each phase
//! has its own error enum; [`DecompileError`] unifies them for callers
//! that don't need phase-specific handling.
//!
//! ## Error hierarchy
//!
//! ```text
//! DecompileError (top-level wrapper)
//! ├── StreamError    - positioned-reader failures
//! ├── FormatError     - class-file / constant-pool / attribute structure
//! └── LogicError      - decompilation-time stack/type/control-flow failures
//! ```
//!
//! Format and stream errors fail the whole class. Logic errors are caught
//! per method: under strict mode they propagate, under tolerant mode the
//! method is rendered with a comment instead of a body.

use thiserror::Error;

use crate::pos::Pos;

/// Errors raised by the positioned binary reader (§4.1).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("unexpected end of stream at {pos}: needed {needed} more byte(s)")]
    UnexpectedEof { pos: Pos, needed: u32 },

    #[error("seek to {pos} is out of bounds (stream length {len})")]
    SeekOutOfBounds { pos: Pos, len: u32 },
}

/// Errors raised while parsing the class-file / constant-pool / attribute
/// format (§4.2, §4.4, §6).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("wrong magic number at {pos}: expected 0xCAFEBABE, got {found:#010x}")]
    WrongMagic { pos: Pos, found: u32 },

    #[error("illegal constant pool tag {tag} at {pos}")]
    IllegalConstantKind { tag: u8, pos: Pos },

    #[error("constant pool index {index} out of bounds (pool size {size})")]
    PoolIndexOutOfBounds { index: u16, size: u16 },

    #[error("constant pool entry {index} has wrong kind: expected {expected}, got {actual}")]
    WrongConstantKind {
        index: u16,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("attribute '{name}' length mismatch: declared {declared}, consumed {consumed}")]
    AttributeLengthMismatch {
        name: String,
        declared: u32,
        consumed: u32,
    },

    #[error("illegal attribute '{name}' in this context at {pos}")]
    IllegalAttribute { name: String, pos: Pos },

    #[error("invalid type name at {pos}: {detail}")]
    InvalidTypeName { pos: Pos, detail: String },

    #[error("invalid signature at {pos}: {detail}")]
    InvalidSignature { pos: Pos, detail: String },

    #[error("illegal method header for '{name}{descriptor}': {detail}")]
    IllegalMethodHeader {
        name: String,
        descriptor: String,
        detail: String,
    },

    #[error("illegal modifiers {flags:#06x} for {what}")]
    IllegalModifiers { flags: u16, what: &'static str },

    #[error("illegal opcode {opcode:#04x} at {pos}")]
    IllegalOpcode { opcode: u8, pos: Pos },

    #[error("malformed instruction at {pos}: {detail}")]
    InstructionFormat { pos: Pos, detail: String },

    #[error("block [{start}, {end}] exceeds parent bounds [{parent_start}, {parent_end}]")]
    BlockOutOfBounds {
        start: u32,
        end: u32,
        parent_start: u32,
        parent_end: u32,
    },

    #[error(transparent)]
    Stream(#[from] StreamError),
}

/// Errors raised while symbolically evaluating bytecode or reconstructing
/// control flow (§4.6, §4.8, §8).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogicError {
    #[error("illegal stack state at instruction {index}: expected depth {expected}, got {actual}")]
    IllegalStackState {
        index: u32,
        expected: i32,
        actual: i32,
    },

    #[error("attempted to pop from an empty operand stack at instruction {index}")]
    EmptyStack { index: u32 },

    #[error("type size mismatch: {lhs} is {lhs_size} byte(s), {rhs} is {rhs_size} byte(s)")]
    TypeSizeMismatch {
        lhs: String,
        lhs_size: u8,
        rhs: String,
        rhs_size: u8,
    },

    #[error("incompatible types: cannot unify '{lhs}' and '{rhs}'")]
    IncompatibleTypes { lhs: String, rhs: String },

    #[error("illegal method descriptor '{descriptor}': {detail}")]
    IllegalMethodDescriptor { descriptor: String, detail: String },

    #[error("malformed control flow at instruction {index}: {detail}")]
    MalformedControlFlow { index: u32, detail: String },

    #[error("internal assertion failed: {0}")]
    AssertionFailure(String),
}

/// Top-level error type returned by the decompilation facade.
///
/// Carries the owning class name and, where known, the method descriptor
/// so callers get "one error message per failure, naming file, method
/// descriptor, and bytecode position when known."
#[derive(Debug, Clone, Error)]
pub enum DecompileError {
    #[error("{class}: {source}")]
    Format {
        class: String,
        #[source]
        source: FormatError,
    },

    #[error("{class}#{method}: {source}")]
    Method {
        class: String,
        method: String,
        #[source]
        source: LogicError,
    },

    #[error("{class}: {source}")]
    Stream {
        class: String,
        #[source]
        source: StreamError,
    },
}

impl DecompileError {
    pub fn format(class: impl Into<String>, source: FormatError) -> Self {
        Self::Format {
            class: class.into(),
            source,
        }
    }

    pub fn method(class: impl Into<String>, method: impl Into<String>, source: LogicError) -> Self {
        Self::Method {
            class: class.into(),
            method: method.into(),
            source,
        }
    }

    /// Whether this error originated in a single method body, and can
    /// therefore be downgraded to a `// Exception while decompiling
    /// method: ...` comment under tolerant mode rather than failing the
    /// whole class.
    pub fn is_method_scoped(&self) -> bool {
        matches!(self, DecompileError::Method { .. })
    }
}

pub type StreamResult<T> = Result<T, StreamError>;
pub type FormatResult<T> = Result<T, FormatError>;
pub type LogicResult<T> = Result<T, LogicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_error_is_method_scoped() {
        let err = DecompileError::method(
            "Foo",
            "bar()V",
            LogicError::EmptyStack { index: 3 },
        );
        assert!(err.is_method_scoped());
        assert_eq!(
            err.to_string(),
            "Foo#bar()V: attempted to pop from an empty operand stack at instruction 3"
        );
    }
}
