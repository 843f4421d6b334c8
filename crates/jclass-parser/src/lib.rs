//! Bytecode disassembly: the opcode table, the positioned binary reader
//! driving it, the decoded `Instruction` stream, and the block tree pass 2
//! builds over it. Everything above the instruction/block level (typed
//! expressions, scopes, structured control flow) lives in
//! `jclass-decompiler`, which depends on this crate.

pub mod block;
pub mod disassembler;
pub mod instruction;
pub mod opcode;
pub mod reader;

pub use block::{Block, BlockKind, BlockTree};
pub use disassembler::{disassemble, DisassemblyResult};
pub use instruction::{Instruction, Operand};
pub use opcode::Opcode;
pub use reader::Reader;
