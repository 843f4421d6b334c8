//! Two-pass disassembler (§4.5): byte stream in, instruction list plus
//! block tree out.

use jclass_core::attributes::ExceptionTableEntry;
use jclass_core::error::FormatError;
use jclass_core::pos::{IndexRange, Pos};
use rustc_hash::FxHashMap;

use crate::block::{BlockKind, BlockTree};
use crate::instruction::{Instruction, Operand};
use crate::opcode::Opcode;
use crate::reader::Reader;

#[derive(Debug)]
pub struct DisassemblyResult {
    pub instructions: Vec<Instruction>,
    pub blocks: BlockTree,
    pos_to_index: FxHashMap<u32, u32>,
}

impl DisassemblyResult {
    /// Resolve an absolute code position to its instruction index, the
    /// `posToIndex` lookup §4.5 requires for every branch/switch target.
    pub fn index_at(&self, pos: Pos) -> Option<u32> {
        self.pos_to_index.get(&pos.offset()).copied()
    }
}

/// Disassemble one method's `Code` bytes. `exception_table` drives the
/// try-escape case of `goto` resolution (rule 3, §4.5), and seeds the
/// `Try`/`Catch` block pair `discover_try_catch_blocks` records ahead of
/// the if/loop scan — the control-flow reconstructor only has to turn
/// those block shapes into a `Statement::Try`, not find them.
pub fn disassemble(code: &[u8], base: Pos, exception_table: &[ExceptionTableEntry]) -> Result<DisassemblyResult, FormatError> {
    let (instructions, pos_to_index) = decode_linear(code, base)?;
    let last_index = instructions.len().saturating_sub(1) as u32;
    let mut blocks = BlockTree::new(last_index);
    discover_try_catch_blocks(&pos_to_index, exception_table, &mut blocks)?;
    discover_blocks(&instructions, &pos_to_index, exception_table, &mut blocks)?;
    Ok(DisassemblyResult { instructions, blocks, pos_to_index })
}

/// Pre-pass: one `Try` block per distinct `(start_pc, end_pc)` exception
/// table range, and one `Catch` block per distinct `handler_pc` inside
/// it — `javac` emits one exception table row per caught type, so a
/// `catch (A | B e)` multi-catch shares a single `handler_pc` across
/// several rows (§4.8), collapsing back to one `Catch` block here the
/// same way the control-flow reconstructor later collapses it to one
/// `CatchClause`. A handler's end is bounded by whichever comes first:
/// the next handler sharing this try's scope, or the enclosing block's
/// own end — straight-line catch bodies (no further nested try/if/loop)
/// are all this needs to resolve correctly.
fn discover_try_catch_blocks(
    pos_to_index: &FxHashMap<u32, u32>,
    exception_table: &[ExceptionTableEntry],
    blocks: &mut BlockTree,
) -> Result<(), FormatError> {
    let index_at = |pc: u16| pos_to_index.get(&(pc as u32)).copied();

    let mut try_ranges: Vec<(u16, u16)> = Vec::new();
    for entry in exception_table {
        if !try_ranges.contains(&(entry.start_pc, entry.end_pc)) {
            try_ranges.push((entry.start_pc, entry.end_pc));
        }
    }

    for (start_pc, end_pc) in try_ranges {
        let (Some(start_index), Some(end_index)) = (index_at(start_pc), index_at(end_pc)) else { continue };
        if end_index <= start_index {
            continue;
        }
        let try_range = IndexRange::new(start_index, end_index - 1);
        let parent = blocks.innermost_containing(start_index);
        blocks.push_child(parent, BlockKind::Try, try_range)?;

        let mut handler_starts: Vec<u32> = Vec::new();
        for entry in exception_table.iter().filter(|e| (e.start_pc, e.end_pc) == (start_pc, end_pc)) {
            if let Some(idx) = index_at(entry.handler_pc) {
                if !handler_starts.contains(&idx) {
                    handler_starts.push(idx);
                }
            }
        }
        handler_starts.sort_unstable();

        let enclosing_end = blocks.get(parent).range.end;
        for (i, &handler_start) in handler_starts.iter().enumerate() {
            let handler_end = handler_starts.get(i + 1).map(|&next| next - 1).unwrap_or(enclosing_end);
            if handler_end < handler_start {
                continue;
            }
            blocks.push_child(parent, BlockKind::Catch, IndexRange::new(handler_start, handler_end))?;
        }
    }
    Ok(())
}

fn decode_linear(code: &[u8], base: Pos) -> Result<(Vec<Instruction>, FxHashMap<u32, u32>), FormatError> {
    let mut reader = Reader::new(code, base);
    let mut instructions = Vec::new();
    let mut pos_to_index = FxHashMap::default();
    let mut index: u32 = 0;

    while !reader.is_eof() {
        let pos = reader.pos();
        pos_to_index.insert(pos.offset(), index);
        let byte = reader.u8()?;
        let opcode = Opcode::try_from(byte).map_err(|_| FormatError::IllegalOpcode { opcode: byte, pos })?;
        let operand = decode_operand(opcode, &mut reader, pos)?;
        instructions.push(Instruction { index, pos, opcode, operand });
        index += 1;
    }

    Ok((instructions, pos_to_index))
}

fn decode_operand(opcode: Opcode, r: &mut Reader, pos: Pos) -> Result<Operand, FormatError> {
    use Opcode::*;
    let operand = match opcode {
        Bipush => Operand::ImmediateByte(r.i8()?),
        Sipush => Operand::ImmediateShort(r.i16()?),
        Ldc => Operand::PoolRef(r.u8()? as u16),
        LdcW | Ldc2W => Operand::PoolRef(r.u16()?),
        Iload | Lload | Fload | Dload | Aload | Istore | Lstore | Fstore | Dstore | Astore => {
            Operand::Local(r.u8()? as u16)
        }
        Ret => Operand::Local(r.u8()? as u16),
        Iinc => {
            let local = r.u8()? as u16;
            let constant = r.i8()? as i32;
            Operand::IncLocal { local, constant }
        }
        Ifeq | Ifne | Iflt | Ifge | Ifgt | Ifle | IfIcmpeq | IfIcmpne | IfIcmplt | IfIcmpge | IfIcmpgt | IfIcmple
        | IfAcmpeq | IfAcmpne | Goto | Jsr | Ifnull | Ifnonnull => {
            let offset = r.i16()? as i32;
            Operand::Branch { offset, target: Pos::new((pos.offset() as i64 + offset as i64) as u32) }
        }
        GotoW | JsrW => {
            let offset = r.i32()?;
            Operand::Branch { offset, target: Pos::new((pos.offset() as i64 + offset as i64) as u32) }
        }
        Tableswitch => {
            r.align4()?;
            let default = Pos::new((pos.offset() as i64 + r.i32()? as i64) as u32);
            let low = r.i32()?;
            let high = r.i32()?;
            if high < low {
                return Err(FormatError::InstructionFormat { pos, detail: "tableswitch high < low".to_string() });
            }
            let count = (high - low + 1) as usize;
            let mut targets = Vec::with_capacity(count);
            for _ in 0..count {
                let offset = r.i32()?;
                targets.push(Pos::new((pos.offset() as i64 + offset as i64) as u32));
            }
            Operand::Tableswitch { default, low, high, targets }
        }
        Lookupswitch => {
            r.align4()?;
            let default = Pos::new((pos.offset() as i64 + r.i32()? as i64) as u32);
            let npairs = r.i32()?;
            if npairs < 0 {
                return Err(FormatError::InstructionFormat { pos, detail: "lookupswitch negative npairs".to_string() });
            }
            let mut pairs = Vec::with_capacity(npairs as usize);
            for _ in 0..npairs {
                let key = r.i32()?;
                let offset = r.i32()?;
                pairs.push((key, Pos::new((pos.offset() as i64 + offset as i64) as u32)));
            }
            Operand::Lookupswitch { default, pairs }
        }
        Getstatic | Putstatic | Getfield | Putfield | Invokevirtual | Invokespecial | Invokestatic | New
        | Anewarray | Checkcast | Instanceof => Operand::PoolRef(r.u16()?),
        Invokeinterface => {
            let pool_ref = r.u16()?;
            let arg_count = r.u8()?;
            let _zero = r.u8()?;
            Operand::InvokeInterface { pool_ref, arg_count }
        }
        Invokedynamic => {
            let pool_ref = r.u16()?;
            let _zero = r.u16()?;
            Operand::InvokeDynamic { pool_ref }
        }
        Newarray => Operand::NewArrayType(r.u8()?),
        Multianewarray => {
            let pool_ref = r.u16()?;
            let dimensions = r.u8()?;
            Operand::MultiNewArray { pool_ref, dimensions }
        }
        Wide => return decode_wide(r, pos),
        _ => Operand::None,
    };
    Ok(operand)
}

fn decode_wide(r: &mut Reader, pos: Pos) -> Result<Operand, FormatError> {
    let inner = r.u8()?;
    let opcode = Opcode::try_from(inner).map_err(|_| FormatError::IllegalOpcode { opcode: inner, pos })?;
    if !opcode.widenable() {
        return Err(FormatError::InstructionFormat { pos, detail: format!("{} is not valid after wide", opcode.mnemonic()) });
    }
    if opcode == Opcode::Iinc {
        let local = r.u16()?;
        let constant = r.i16()? as i32;
        Ok(Operand::IncLocal { local, constant })
    } else {
        Ok(Operand::Local(r.u16()?))
    }
}

/// Pass 2: walk the decoded instructions and build the block tree,
/// applying the four-case `goto` resolution (§4.5).
fn discover_blocks(
    instructions: &[Instruction],
    pos_to_index: &FxHashMap<u32, u32>,
    exception_table: &[ExceptionTableEntry],
    blocks: &mut BlockTree,
) -> Result<(), FormatError> {
    let index_at = |p: Pos| pos_to_index.get(&p.offset()).copied();
    // Tracks the block each `if` produced, so a later `goto` at exactly the
    // if's end can be reattached as an `else`.
    let mut pending_if: Option<(usize, u32)> = None;
    let mut current = BlockTree::ROOT;

    for instr in instructions {
        // Pop back out to whichever ancestor block still contains us.
        while current != BlockTree::ROOT && !blocks.get(current).range.contains_index(instr.index) {
            current = blocks.get(current).parent.unwrap_or(BlockTree::ROOT);
        }

        if instr.is_conditional() {
            if let Operand::Branch { target, .. } = instr.operand {
                if let Some(target_index) = index_at(target) {
                    // target_index == instr.index + 1 is an empty body (no
                    // instructions between the branch and its target) — no
                    // block to record.
                    if target_index > instr.index + 1 {
                        let range = IndexRange::new(instr.index + 1, target_index - 1);
                        let id = blocks.push_child(current, BlockKind::If, range)?;
                        pending_if = Some((id, target_index - 1));
                        current = id;
                    }
                }
            }
            continue;
        }

        if instr.is_unconditional_goto() {
            let (offset, target) = match instr.operand {
                Operand::Branch { offset, target } => (offset, target),
                _ => unreachable!("goto always decodes a Branch operand"),
            };

            // Case 1: offset == 0 is an empty infinite loop at this point.
            if offset == 0 {
                blocks.push_child(current, BlockKind::InfiniteLoop, IndexRange::new(instr.index, instr.index))?;
                continue;
            }

            // Case 2: sitting at the end of the enclosing `if` — attach an else.
            if let Some((if_id, if_end)) = pending_if {
                if if_end + 1 == instr.index {
                    if let Some(target_index) = index_at(target) {
                        if target_index > instr.index + 1 {
                            let parent = blocks.get(if_id).parent.unwrap_or(BlockTree::ROOT);
                            let range = IndexRange::new(instr.index + 1, target_index - 1);
                            blocks.push_child(parent, BlockKind::Else, range)?;
                            pending_if = None;
                            continue;
                        }
                    }
                }
            }

            // Case 3: escaping a try range at its end — no block, the
            // handler is already known from the exception table.
            let escapes_try = exception_table
                .iter()
                .filter_map(|e| index_at(Pos::new(e.end_pc as u32)).map(|end| (index_at(Pos::new(e.start_pc as u32)), end)))
                .any(|(start, end)| start.is_some() && end == instr.index);
            if escapes_try {
                continue;
            }

            // Case 4: backward goto forms (or extends) an infinite loop.
            if offset < 0 {
                if let Some(target_index) = index_at(target) {
                    let existing = blocks
                        .get(current)
                        .children
                        .iter()
                        .copied()
                        .find(|&c| blocks.get(c).kind == BlockKind::InfiniteLoop && blocks.get(c).range.contains_index(target_index));
                    match existing {
                        Some(id) => {
                            blocks.extend_end(id, instr.index)?;
                        }
                        None => {
                            blocks.push_child(current, BlockKind::InfiniteLoop, IndexRange::new(target_index, instr.index))?;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
