//! The immutable per-opcode record produced by pass 1 of the disassembler
//! (§3, §4.5). `Instruction` only carries what pass 1 can know from the
//! byte stream and the opcode table; resolving a branch offset into a
//! sibling instruction's index happens once the whole method has been
//! decoded, via [`super::disassembler::DisassemblyResult::index_at`].
//!
//! `toOperation`/`toBlock` are not methods here: building an expression
//! tree needs the constant pool and the active scope, which this crate
//! does not own. They are implemented as an extension trait over
//! `Instruction` downstream, in the symbolic evaluator.

use jclass_core::pool::CpIndex;
use jclass_core::pos::Pos;

use crate::opcode::Opcode;

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    /// `*load`/`*store`/`ret` local-variable slot (widened by `wide` to `u16`).
    Local(u16),
    /// `iinc index, const` — widened by `wide` to an `i16` constant.
    IncLocal { local: u16, constant: i32 },
    ImmediateByte(i8),
    ImmediateShort(i16),
    /// `ldc`/`ldc_w`/`ldc2_w`, `new`, `checkcast`, `instanceof`, `anewarray`,
    /// `get*`/`put*`, `invokevirtual`/`invokespecial`/`invokestatic`.
    PoolRef(CpIndex),
    InvokeInterface { pool_ref: CpIndex, arg_count: u8 },
    InvokeDynamic { pool_ref: CpIndex },
    /// Relative branch: `offset` is the raw signed operand, `target` the
    /// absolute position it addresses.
    Branch { offset: i32, target: Pos },
    Tableswitch { default: Pos, low: i32, high: i32, targets: Vec<Pos> },
    Lookupswitch { default: Pos, pairs: Vec<(i32, Pos)> },
    /// `newarray` primitive type code (JVMS Table 6.1: 4=boolean .. 11=long).
    NewArrayType(u8),
    MultiNewArray { pool_ref: CpIndex, dimensions: u8 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub index: u32,
    pub pos: Pos,
    pub opcode: Opcode,
    pub operand: Operand,
}

impl Instruction {
    pub fn is_branch(&self) -> bool {
        matches!(self.operand, Operand::Branch { .. })
    }

    pub fn is_unconditional_goto(&self) -> bool {
        matches!(self.opcode, Opcode::Goto | Opcode::GotoW)
    }

    pub fn is_conditional(&self) -> bool {
        matches!(
            self.opcode,
            Opcode::Ifeq
                | Opcode::Ifne
                | Opcode::Iflt
                | Opcode::Ifge
                | Opcode::Ifgt
                | Opcode::Ifle
                | Opcode::IfIcmpeq
                | Opcode::IfIcmpne
                | Opcode::IfIcmplt
                | Opcode::IfIcmpge
                | Opcode::IfIcmpgt
                | Opcode::IfIcmple
                | Opcode::IfAcmpeq
                | Opcode::IfAcmpne
                | Opcode::Ifnull
                | Opcode::Ifnonnull
        )
    }

    pub fn is_return(&self) -> bool {
        matches!(
            self.opcode,
            Opcode::Ireturn | Opcode::Lreturn | Opcode::Freturn | Opcode::Dreturn | Opcode::Areturn | Opcode::Return
        )
    }
}
