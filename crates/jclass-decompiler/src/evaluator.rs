//! The symbolic evaluator (§4.6): walks the instruction stream produced
//! by `jclass-parser`'s disassembler and turns it into [`Operation`]
//! nodes plus the flat, not-yet-structured [`Statement`] sequence the
//! control-flow reconstructor later groups into nested scopes.
//!
//! Grounded on `angelscript-compiler/src/expr/*.rs`'s per-opcode
//! `compile_*` functions, inverted: the teacher walks an AST node down to
//! bytecode; `step` walks one bytecode instruction up into zero or more
//! stack pushes/statements. The operand stack here is the same shape as
//! the teacher's `compiler.emitter()`'s implicit JVM-style stack
//! discipline, just read instead of written.

use jclass_core::attributes::{BootstrapMethod, LocalVariableEntry};
use jclass_core::error::LogicError;
use jclass_core::pool::ConstantPool;
use jclass_core::qualified_name::QualifiedName;
use jclass_core::types::{parse_method_descriptor, Primitive, Type};
use jclass_parser::instruction::{Instruction, Operand};
use jclass_parser::opcode::Opcode;

use crate::config::Config;
use crate::operation::{AssignTarget, BinaryOp, CompareKind, Comparison, Literal, Operation, OperationArena, OperationId};
use crate::overload;
use crate::scope::{Scope, Statement};
use crate::variable::Variable;

const STRING_CONCAT_FACTORY: &str = "java/lang/invoke/StringConcatFactory";

/// Drives one method body's instruction stream into operations and
/// statements. One evaluator instance per method.
pub struct SymbolicEvaluator<'a> {
    pool: &'a ConstantPool,
    bootstrap_methods: &'a [BootstrapMethod],
    local_variable_table: &'a [LocalVariableEntry],
    arena: OperationArena,
    stack: Vec<OperationId>,
    /// Slots the method scope has already seen a read/write for —
    /// `getVariable`/`addVariable` (§4.7): the first touch materializes a
    /// `Variable`, later touches unify its type.
    known_slots: std::collections::BTreeSet<u16>,
    /// Overload-resolution oracle for argument-cast redundancy (§4.3,
    /// §9) — `None` when no registry was supplied, which keeps every
    /// explicit cast rather than risk dropping one that disambiguates an
    /// overload it can't see.
    registry: Option<&'a jclass_registry::ClassRegistry>,
    cast_wrappers: bool,
    auto_box: bool,
}

impl<'a> SymbolicEvaluator<'a> {
    pub fn new(pool: &'a ConstantPool) -> Self {
        Self::with_bootstrap_methods(pool, &[])
    }

    /// Same as [`SymbolicEvaluator::new`], but also wired up to resolve
    /// `invokedynamic` call sites' bootstrap methods against the owning
    /// class's `BootstrapMethods` attribute (§4.6 string-concat
    /// recognition).
    pub fn with_bootstrap_methods(pool: &'a ConstantPool, bootstrap_methods: &'a [BootstrapMethod]) -> Self {
        Self::with_debug_info(pool, bootstrap_methods, &[])
    }

    /// Same as [`SymbolicEvaluator::with_bootstrap_methods`], but also
    /// wired up to a method's `LocalVariableTable` attribute, so the first
    /// touch of a slot inside an entry's `[start_pc, start_pc+length)`
    /// range seeds the resulting `Variable`'s name from the entry rather
    /// than from `simple_name_from_type`'s generic fallback (§4.7).
    pub fn with_debug_info(
        pool: &'a ConstantPool,
        bootstrap_methods: &'a [BootstrapMethod],
        local_variable_table: &'a [LocalVariableEntry],
    ) -> Self {
        SymbolicEvaluator {
            pool,
            bootstrap_methods,
            local_variable_table,
            arena: OperationArena::new(),
            stack: Vec::new(),
            known_slots: std::collections::BTreeSet::new(),
            registry: None,
            cast_wrappers: true,
            auto_box: true,
        }
    }

    /// Same as [`SymbolicEvaluator::with_debug_info`], but also wired up
    /// to a [`jclass_registry::ClassRegistry`] and the call's [`Config`]
    /// — unlocks overload-ranked argument-cast removal (§4.3, §9) and the
    /// boxed-wrapper idiom (§4.6) on top of everything the other
    /// constructors already do.
    pub fn with_context(
        pool: &'a ConstantPool,
        bootstrap_methods: &'a [BootstrapMethod],
        local_variable_table: &'a [LocalVariableEntry],
        registry: &'a jclass_registry::ClassRegistry,
        config: &Config,
    ) -> Self {
        let mut evaluator = Self::with_debug_info(pool, bootstrap_methods, local_variable_table);
        evaluator.registry = Some(registry);
        evaluator.cast_wrappers = config.cast_wrappers;
        evaluator.auto_box = config.auto_box;
        evaluator
    }

    pub fn into_arena(self) -> OperationArena {
        self.arena
    }

    pub fn arena(&self) -> &OperationArena {
        &self.arena
    }

    /// Mutable access for post-hoc tree rewrites the control-flow
    /// reconstructor applies once a range is fully built — ternary
    /// collapse (§4.8) is the only caller today.
    pub fn arena_mut(&mut self) -> &mut OperationArena {
        &mut self.arena
    }

    /// Pop the condition an `if*` instruction just pushed (§4.6) — used
    /// by the control-flow reconstructor once it recognizes the
    /// instruction immediately preceding an `If`-kind block.
    pub fn pop_condition(&mut self, index: u32) -> Result<OperationId, LogicError> {
        self.pop(index)
    }

    /// Pop the switch selector `tableswitch`/`lookupswitch` leaves on
    /// the stack.
    pub fn pop_value(&mut self, index: u32) -> Result<OperationId, LogicError> {
        self.pop(index)
    }

    /// A bare `true` literal for a loop the reconstructor could not
    /// prove terminates any other way (§4.8 "while recovery" fallback).
    pub fn true_literal(&mut self) -> OperationId {
        self.arena.push(Operation::Constant(Literal::Int(1)))
    }

    /// Logical negation of a condition (§4.8): a `Compare` node flips its
    /// own comparison rather than wrapping in a `Unary`, matching how
    /// `javac` would have emitted the opposite branch test directly. Used
    /// by the control-flow reconstructor to turn a block's "skip this
    /// range" test (the literal polarity a conditional jump decodes to)
    /// into the "run this range" condition `if`/`while` actually render.
    pub fn negate(&mut self, id: OperationId) -> OperationId {
        match self.arena.get(id) {
            Operation::Compare { kind, cmp, lhs, rhs } => {
                let (kind, lhs, rhs) = (*kind, *lhs, *rhs);
                let cmp = cmp.negated();
                self.arena.push(Operation::Compare { kind, cmp, lhs, rhs })
            }
            _ => self.arena.push(Operation::Unary { negate: true, operand: id, ty: Type::Primitive(Primitive::Boolean) }),
        }
    }

    fn push(&mut self, op: Operation) -> OperationId {
        let id = self.arena.push(op);
        self.stack.push(id);
        id
    }

    fn pop(&mut self, index: u32) -> Result<OperationId, LogicError> {
        self.stack.pop().ok_or(LogicError::EmptyStack { index })
    }

    fn pop_n(&mut self, n: usize, index: u32) -> Result<Vec<OperationId>, LogicError> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.pop(index)?);
        }
        out.reverse();
        Ok(out)
    }

    /// Record a local-variable touch (§4.7 `getVariable`/`addVariable`),
    /// unifying its inferred type with what this use site requires. `pc`
    /// is the touching instruction's index, used to match this slot's
    /// `LocalVariableTable` entry (if any) on first sight.
    fn touch_local(&mut self, scope: &mut Scope, slot: u16, required: Type, pc: u32) {
        if !self.known_slots.insert(slot) && scope.owns(slot) {
            if let Some(var) = scope.variable_mut(slot) {
                var.unify_with(&required);
            }
            return;
        }
        let mut var = match self.debug_entry(slot, pc) {
            Some((name, ty)) => Variable::fixed(slot, ty, name),
            None => Variable::new(slot, required.clone()),
        };
        var.unify_with(&required);
        scope.declare(var);
    }

    /// The `LocalVariableTable` entry covering `slot` at `pc`, if any,
    /// resolved to its declared name and descriptor-derived type.
    fn debug_entry(&self, slot: u16, pc: u32) -> Option<(String, Type)> {
        let entry = self
            .local_variable_table
            .iter()
            .find(|e| e.index == slot && (e.start_pc as u32) <= pc && pc < e.start_pc as u32 + e.length as u32)?;
        let ty = jclass_core::types::parse_field_descriptor(&entry.descriptor).ok()?;
        Some((entry.name.clone(), ty))
    }

    /// Evaluate one instruction, mutating the operand stack and
    /// appending any resulting statement to `scope`. Branch instructions
    /// (`if*`, `goto`, `tableswitch`, `lookupswitch`) are left to the
    /// control-flow reconstructor — this only pops the compared operands
    /// and leaves a [`Operation::Compare`] on the stack for conditional
    /// jumps to consume.
    pub fn step(&mut self, instr: &Instruction, scope: &mut Scope) -> Result<(), LogicError> {
        use Opcode::*;
        let i = instr.index;
        match instr.opcode {
            Nop => {}
            AconstNull => {
                self.push(Operation::Constant(Literal::Null));
            }
            IconstM1 => { self.push_int_literal(-1); }
            Iconst0 => { self.push_int_literal(0); }
            Iconst1 => { self.push_int_literal(1); }
            Iconst2 => { self.push_int_literal(2); }
            Iconst3 => { self.push_int_literal(3); }
            Iconst4 => { self.push_int_literal(4); }
            Iconst5 => { self.push_int_literal(5); }
            Lconst0 => {
                self.push(Operation::Constant(Literal::Long(0)));
            }
            Lconst1 => {
                self.push(Operation::Constant(Literal::Long(1)));
            }
            Fconst0 => {
                self.push(Operation::Constant(Literal::Float(0.0)));
            }
            Fconst1 => {
                self.push(Operation::Constant(Literal::Float(1.0)));
            }
            Fconst2 => {
                self.push(Operation::Constant(Literal::Float(2.0)));
            }
            Dconst0 => {
                self.push(Operation::Constant(Literal::Double(0.0)));
            }
            Dconst1 => {
                self.push(Operation::Constant(Literal::Double(1.0)));
            }
            Bipush => {
                if let Operand::ImmediateByte(v) = instr.operand {
                    self.push_int_literal(v as i64);
                }
            }
            Sipush => {
                if let Operand::ImmediateShort(v) = instr.operand {
                    self.push_int_literal(v as i64);
                }
            }
            Ldc | LdcW | Ldc2W => self.eval_ldc(instr)?,

            Iload | Fload | Aload | Iload0 | Iload1 | Iload2 | Iload3 | Fload0 | Fload1 | Fload2 | Fload3 | Aload0
            | Aload1 | Aload2 | Aload3 => {
                let slot = local_slot(instr)?;
                let required = if matches!(instr.opcode, Fload | Fload0 | Fload1 | Fload2 | Fload3) {
                    Type::Primitive(Primitive::Float)
                } else if matches!(instr.opcode, Aload | Aload0 | Aload1 | Aload2 | Aload3) {
                    Type::AnyObject
                } else {
                    jclass_core::types::primitives::ambiguous_int_or_boolean()
                };
                self.touch_local(scope, slot, required, i);
                self.push(Operation::LocalRead { slot });
            }
            Lload | Lload0 | Lload1 | Lload2 | Lload3 => {
                let slot = local_slot(instr)?;
                self.touch_local(scope, slot, Type::Primitive(Primitive::Long), i);
                self.push(Operation::LocalRead { slot });
            }
            Dload | Dload0 | Dload1 | Dload2 | Dload3 => {
                let slot = local_slot(instr)?;
                self.touch_local(scope, slot, Type::Primitive(Primitive::Double), i);
                self.push(Operation::LocalRead { slot });
            }

            Istore | Fstore | Astore | Istore0 | Istore1 | Istore2 | Istore3 | Fstore0 | Fstore1 | Fstore2
            | Fstore3 | Astore0 | Astore1 | Astore2 | Astore3 | Lstore | Lstore0 | Lstore1 | Lstore2 | Lstore3
            | Dstore | Dstore0 | Dstore1 | Dstore2 | Dstore3 => {
                let slot = local_slot(instr)?;
                let value = self.pop(i)?;
                let required = self.arena.get(value).return_type();
                self.touch_local(scope, slot, required.clone(), i);
                let assign = self.arena.push(Operation::Assign {
                    target: AssignTarget::Local(slot),
                    value,
                    ty: required,
                });
                scope.push(Statement::Expression(assign));
            }

            Iinc => {
                if let Operand::IncLocal { local, constant } = instr.operand {
                    self.touch_local(scope, local, jclass_core::types::primitives::ambiguous_int(), i);
                    let read = self.arena.push(Operation::LocalRead { slot: local });
                    let lit = self.arena.push(Operation::Constant(Literal::Int(constant.unsigned_abs() as i32)));
                    let sum = self.arena.push(Operation::Binary {
                        op: if constant >= 0 { BinaryOp::Add } else { BinaryOp::Sub },
                        lhs: read,
                        rhs: lit,
                        ty: Type::Primitive(Primitive::Int),
                    });
                    let assign = self.arena.push(Operation::Assign {
                        target: AssignTarget::Local(local),
                        value: sum,
                        ty: Type::Primitive(Primitive::Int),
                    });
                    scope.push(Statement::Expression(assign));
                }
            }

            Iaload | Laload | Faload | Daload | Aaload | Baload | Caload | Saload => {
                let index = self.pop(i)?;
                let array = self.pop(i)?;
                let element = array_element_type(instr.opcode);
                self.push(Operation::ArrayLoad { array, index, element });
            }
            Iastore | Lastore | Fastore | Dastore | Aastore | Bastore | Castore | Sastore => {
                let value = self.pop(i)?;
                let index = self.pop(i)?;
                let array = self.pop(i)?;
                let ty = self.arena.get(value).return_type();
                let assign = self.arena.push(Operation::Assign {
                    target: AssignTarget::ArrayElement { array, index },
                    value,
                    ty,
                });
                scope.push(Statement::Expression(assign));
            }

            Pop => {
                self.pop(i)?;
            }
            Pop2 => {
                self.pop(i)?;
                self.pop(i)?;
            }
            Dup => {
                let top = *self.stack.last().ok_or(LogicError::EmptyStack { index: i })?;
                self.stack.push(top);
            }
            DupX1 => {
                let a = self.pop(i)?;
                let b = self.pop(i)?;
                self.stack.extend([a, b, a]);
            }
            DupX2 => {
                let a = self.pop(i)?;
                let b = self.pop(i)?;
                let c = self.pop(i)?;
                self.stack.extend([a, c, b, a]);
            }
            Dup2 => {
                let a = self.pop(i)?;
                let b = self.pop(i)?;
                self.stack.extend([b, a, b, a]);
            }
            Dup2X1 => {
                let a = self.pop(i)?;
                let b = self.pop(i)?;
                let c = self.pop(i)?;
                self.stack.extend([b, a, c, b, a]);
            }
            Dup2X2 => {
                let a = self.pop(i)?;
                let b = self.pop(i)?;
                let c = self.pop(i)?;
                let d = self.pop(i)?;
                self.stack.extend([b, a, d, c, b, a]);
            }
            Swap => {
                let a = self.pop(i)?;
                let b = self.pop(i)?;
                self.stack.extend([a, b]);
            }

            Iadd | Ladd | Fadd | Dadd => self.binary(i, BinaryOp::Add)?,
            Isub | Lsub | Fsub | Dsub => self.binary(i, BinaryOp::Sub)?,
            Imul | Lmul | Fmul | Dmul => self.binary(i, BinaryOp::Mul)?,
            Idiv | Ldiv | Fdiv | Ddiv => self.binary(i, BinaryOp::Div)?,
            Irem | Lrem | Frem | Drem => self.binary(i, BinaryOp::Rem)?,
            Ishl | Lshl => self.binary(i, BinaryOp::Shl)?,
            Ishr | Lshr => self.binary(i, BinaryOp::Shr)?,
            Iushr | Lushr => self.binary(i, BinaryOp::Ushr)?,
            Iand | Land => self.binary(i, BinaryOp::And)?,
            Ior | Lor => self.binary(i, BinaryOp::Or)?,
            Ixor | Lxor => {
                // `x ^ -1` is how javac emits unary `~x` (§4.6).
                let rhs = self.pop(i)?;
                let lhs = self.pop(i)?;
                if let Operation::Constant(Literal::Int(-1)) = self.arena.get(rhs) {
                    let ty = self.arena.get(lhs).return_type();
                    self.push(Operation::Unary { negate: false, operand: lhs, ty });
                } else {
                    let ty = self.arena.get(lhs).return_type();
                    self.push(Operation::Binary { op: BinaryOp::Xor, lhs, rhs, ty });
                }
            }
            Ineg | Lneg | Fneg | Dneg => {
                let operand = self.pop(i)?;
                let ty = self.arena.get(operand).return_type();
                self.push(Operation::Unary { negate: true, operand, ty });
            }

            I2l => self.cast(i, Type::Primitive(Primitive::Long))?,
            I2f => self.cast(i, Type::Primitive(Primitive::Float))?,
            I2d => self.cast(i, Type::Primitive(Primitive::Double))?,
            L2i => self.cast(i, Type::Primitive(Primitive::Int))?,
            L2f => self.cast(i, Type::Primitive(Primitive::Float))?,
            L2d => self.cast(i, Type::Primitive(Primitive::Double))?,
            F2i => self.cast(i, Type::Primitive(Primitive::Int))?,
            F2l => self.cast(i, Type::Primitive(Primitive::Long))?,
            F2d => self.cast(i, Type::Primitive(Primitive::Double))?,
            D2i => self.cast(i, Type::Primitive(Primitive::Int))?,
            D2l => self.cast(i, Type::Primitive(Primitive::Long))?,
            D2f => self.cast(i, Type::Primitive(Primitive::Float))?,
            I2b => self.cast(i, Type::Primitive(Primitive::Byte))?,
            I2c => self.cast(i, Type::Primitive(Primitive::Char))?,
            I2s => self.cast(i, Type::Primitive(Primitive::Short))?,

            Lcmp => self.raw_compare(i, CompareKind::IntInt)?,
            Fcmpl | Fcmpg | Dcmpl | Dcmpg => self.raw_compare(i, CompareKind::IntInt)?,

            Ifeq | Ifne | Iflt | Ifge | Ifgt | Ifle => {
                let operand = self.pop(i)?;
                let (cmp, lhs, rhs) = self.resolve_if_operands(operand, instr.opcode);
                self.push(Operation::Compare { kind: CompareKind::IntZero, cmp, lhs, rhs });
            }
            IfIcmpeq | IfIcmpne | IfIcmplt | IfIcmpge | IfIcmpgt | IfIcmple => {
                let rhs = self.pop(i)?;
                let lhs = self.pop(i)?;
                let cmp = icmp_to_comparison(instr.opcode);
                self.push(Operation::Compare { kind: CompareKind::IntInt, cmp, lhs, rhs });
            }
            IfAcmpeq | IfAcmpne => {
                let rhs = self.pop(i)?;
                let lhs = self.pop(i)?;
                let cmp = if matches!(instr.opcode, IfAcmpeq) { Comparison::Eq } else { Comparison::Ne };
                self.push(Operation::Compare { kind: CompareKind::RefRef, cmp, lhs, rhs });
            }
            Ifnull | Ifnonnull => {
                let lhs = self.pop(i)?;
                let rhs = self.arena.push(Operation::Constant(Literal::Null));
                let cmp = if matches!(instr.opcode, Ifnull) { Comparison::Eq } else { Comparison::Ne };
                self.push(Operation::Compare { kind: CompareKind::RefNull, cmp, lhs, rhs });
            }

            Getstatic | Getfield => self.eval_field_read(instr)?,
            Putstatic | Putfield => self.eval_field_write(instr, scope)?,

            Invokevirtual | Invokespecial | Invokestatic | Invokeinterface => self.eval_invoke(instr, scope)?,
            Invokedynamic => self.eval_invoke_dynamic(instr)?,

            New => {
                if let Operand::PoolRef(idx) = instr.operand {
                    let name = self.pool.class_name(idx).map_err(|_| LogicError::MalformedControlFlow {
                        index: i,
                        detail: "new: class-pool index did not resolve".into(),
                    })?;
                    self.push(Operation::New {
                        ty: Type::class(QualifiedName::parse(name)),
                        ctor_descriptor: String::new(),
                        args: Vec::new(),
                    });
                }
            }
            Newarray => {
                if let Operand::NewArrayType(code) = instr.operand {
                    let dim = self.pop(i)?;
                    self.push(Operation::NewArray {
                        element: Type::Primitive(newarray_primitive(code)),
                        dimensions: vec![dim],
                        inline_initializer: None,
                    });
                }
            }
            Anewarray => {
                if let Operand::PoolRef(idx) = instr.operand {
                    let dim = self.pop(i)?;
                    let name = self.pool.class_name(idx).map_err(|_| LogicError::MalformedControlFlow {
                        index: i,
                        detail: "anewarray: class-pool index did not resolve".into(),
                    })?;
                    self.push(Operation::NewArray {
                        element: Type::class(QualifiedName::parse(name)),
                        dimensions: vec![dim],
                        inline_initializer: None,
                    });
                }
            }
            Multianewarray => {
                if let Operand::MultiNewArray { pool_ref, dimensions } = &instr.operand {
                    let dims = self.pop_n(*dimensions as usize, i)?;
                    let name = self.pool.class_name(*pool_ref).map_err(|_| LogicError::MalformedControlFlow {
                        index: i,
                        detail: "multianewarray: class-pool index did not resolve".into(),
                    })?;
                    self.push(Operation::NewArray {
                        element: Type::class(QualifiedName::parse(name)),
                        dimensions: dims,
                        inline_initializer: None,
                    });
                }
            }
            Arraylength => {
                let array = self.pop(i)?;
                self.push(Operation::ArrayLength { array });
            }
            Checkcast => {
                if let Operand::PoolRef(idx) = instr.operand {
                    let operand = self.pop(i)?;
                    let name = self.pool.class_name(idx).map_err(|_| LogicError::MalformedControlFlow {
                        index: i,
                        detail: "checkcast: class-pool index did not resolve".into(),
                    })?;
                    self.push(Operation::Cast { target: Type::class(QualifiedName::parse(name)), operand, implicit: false });
                }
            }
            Instanceof => {
                if let Operand::PoolRef(idx) = instr.operand {
                    let operand = self.pop(i)?;
                    let name = self.pool.class_name(idx).map_err(|_| LogicError::MalformedControlFlow {
                        index: i,
                        detail: "instanceof: class-pool index did not resolve".into(),
                    })?;
                    self.push(Operation::InstanceOf { operand, target: Type::class(QualifiedName::parse(name)) });
                }
            }

            Athrow => {
                let operand = self.pop(i)?;
                scope.push(Statement::Throw(operand));
            }
            Ireturn | Lreturn | Freturn | Dreturn | Areturn => {
                let operand = self.pop(i)?;
                scope.push(Statement::Return(Some(operand)));
            }
            Return => {
                scope.push(Statement::Return(None));
            }

            Monitorenter | Monitorexit => {
                // Synchronized blocks recover from exception-table shape,
                // not these opcodes directly (§4.8 Non-goal); drop the
                // operand like a plain expression statement would.
                self.pop(i)?;
            }

            Goto | GotoW | Jsr | JsrW | Ret | Tableswitch | Lookupswitch | Wide => {
                // Control transfer is the reconstructor's job; nothing to
                // evaluate here.
            }
        }
        Ok(())
    }

    fn push_int_literal(&mut self, v: i64) -> OperationId {
        self.push(Operation::Constant(Literal::AmbiguousInt(v)))
    }

    fn binary(&mut self, index: u32, op: BinaryOp) -> Result<(), LogicError> {
        let rhs = self.pop(index)?;
        let lhs = self.pop(index)?;
        let ty = self.arena.get(lhs).return_type();
        self.push(Operation::Binary { op, lhs, rhs, ty });
        Ok(())
    }

    fn cast(&mut self, index: u32, target: Type) -> Result<(), LogicError> {
        let operand = self.pop(index)?;
        self.push(Operation::Cast { target, operand, implicit: false });
        Ok(())
    }

    fn raw_compare(&mut self, index: u32, kind: CompareKind) -> Result<(), LogicError> {
        let rhs = self.pop(index)?;
        let lhs = self.pop(index)?;
        // Placeholder node: `cmp` is meaningless until the following
        // `if*` rewrites it (§4.6 three-instruction comparison idiom).
        self.push(Operation::Compare { kind, cmp: Comparison::Eq, lhs, rhs });
        Ok(())
    }

    /// `ifeq`/`ifne`/... either tests a raw `lcmp`/`fcmpl`/`dcmpg` result
    /// against zero (fuse into the real two-operand comparison) or tests
    /// a plain int/boolean value against zero directly (§4.6).
    fn resolve_if_operands(&self, operand: OperationId, opcode: Opcode) -> (Comparison, OperationId, OperationId) {
        if let Operation::Compare { lhs, rhs, .. } = self.arena.get(operand) {
            return (if_to_comparison(opcode), *lhs, *rhs);
        }
        (if_to_comparison(opcode), operand, operand)
    }

    fn eval_ldc(&mut self, instr: &Instruction) -> Result<(), LogicError> {
        let idx = match instr.operand {
            Operand::PoolRef(idx) => idx,
            _ => return Ok(()),
        };
        if let Ok(v) = self.pool.integer(idx) {
            self.push(Operation::Constant(Literal::Int(v)));
        } else if let Ok(v) = self.pool.float(idx) {
            self.push(Operation::Constant(Literal::Float(v)));
        } else if let Ok(v) = self.pool.long(idx) {
            self.push(Operation::Constant(Literal::Long(v)));
        } else if let Ok(v) = self.pool.double(idx) {
            self.push(Operation::Constant(Literal::Double(v)));
        } else if let Ok(s) = self.pool.string(idx) {
            self.push(Operation::Constant(Literal::String(s.to_string())));
        } else if let Ok(name) = self.pool.class_name(idx) {
            self.push(Operation::Constant(Literal::Class(Type::class(QualifiedName::parse(name)))));
        } else {
            self.push(Operation::Constant(Literal::Null));
        }
        Ok(())
    }

    fn eval_field_read(&mut self, instr: &Instruction) -> Result<(), LogicError> {
        let idx = match instr.operand {
            Operand::PoolRef(idx) => idx,
            _ => return Ok(()),
        };
        let member = self.pool.fieldref(idx).map_err(|_| LogicError::MalformedControlFlow {
            index: instr.index,
            detail: "field access: fieldref did not resolve".into(),
        })?;
        let owner = Type::class(QualifiedName::parse(member.class_name));
        let ty = jclass_core::types::parse_field_descriptor(&member.descriptor).unwrap_or(Type::Any);
        let receiver = if matches!(instr.opcode, Opcode::Getfield) {
            Some(self.pop(instr.index)?)
        } else {
            None
        };
        self.push(Operation::FieldRead { owner, name: member.name, ty, receiver });
        Ok(())
    }

    fn eval_field_write(&mut self, instr: &Instruction, scope: &mut Scope) -> Result<(), LogicError> {
        let idx = match instr.operand {
            Operand::PoolRef(idx) => idx,
            _ => return Ok(()),
        };
        let member = self.pool.fieldref(idx).map_err(|_| LogicError::MalformedControlFlow {
            index: instr.index,
            detail: "field write: fieldref did not resolve".into(),
        })?;
        let owner = Type::class(QualifiedName::parse(member.class_name));
        let ty = jclass_core::types::parse_field_descriptor(&member.descriptor).unwrap_or(Type::Any);
        let value = self.pop(instr.index)?;
        let receiver = if matches!(instr.opcode, Opcode::Putfield) {
            Some(self.pop(instr.index)?)
        } else {
            None
        };
        let assign = self
            .arena
            .push(Operation::Assign { target: AssignTarget::Field { owner, name: member.name, receiver }, value, ty });
        scope.push(Statement::Expression(assign));
        Ok(())
    }

    fn eval_invoke(&mut self, instr: &Instruction, scope: &mut Scope) -> Result<(), LogicError> {
        let idx = match &instr.operand {
            Operand::PoolRef(idx) => *idx,
            Operand::InvokeInterface { pool_ref, .. } => *pool_ref,
            _ => return Ok(()),
        };
        let is_static = matches!(instr.opcode, Opcode::Invokestatic);
        let is_special = matches!(instr.opcode, Opcode::Invokespecial);
        let is_virtual = matches!(instr.opcode, Opcode::Invokevirtual);
        let member = self.pool.any_methodref(idx).map_err(|_| LogicError::MalformedControlFlow {
            index: instr.index,
            detail: "invoke: methodref did not resolve".into(),
        })?;
        let descriptor = parse_method_descriptor(&member.descriptor).map_err(|_| LogicError::IllegalMethodDescriptor {
            descriptor: member.descriptor.clone(),
            detail: "could not parse method descriptor".into(),
        })?;

        // Boxed-wrapper idiom (§4.6): `Integer.intValue()` unboxes to a
        // primitive cast regardless of `auto_box` (unboxing is always
        // recognized once `cast_wrappers` is on); `Integer.valueOf(int)`
        // boxes to a reference cast, gated on `auto_box` too.
        if is_virtual && self.cast_wrappers && descriptor.parameters.is_empty() {
            if let Some(target) = unboxing_target(&member.class_name, &member.name) {
                let receiver = self.pop(instr.index)?;
                let cast = self.arena.push(Operation::Cast { target, operand: receiver, implicit: false });
                self.stack.push(cast);
                return Ok(());
            }
        }
        if is_static && self.cast_wrappers && self.auto_box && member.name == "valueOf" && descriptor.parameters.len() == 1 {
            if let Type::Primitive(p) = &descriptor.parameters[0] {
                if member.class_name == format!("java/lang/{}", p.boxed_name()) {
                    let arg = self.pop(instr.index)?;
                    let target = Type::class(QualifiedName::parse(member.class_name.clone()));
                    let cast = self.arena.push(Operation::Cast { target, operand: arg, implicit: false });
                    self.stack.push(cast);
                    return Ok(());
                }
            }
        }

        let args = self.pop_n(descriptor.parameters.len(), instr.index)?;
        let owner = Type::class(QualifiedName::parse(&member.class_name));

        // Overload-ranked argument-cast removal (§4.3, §9): an explicit
        // checkcast feeding this call's argument list disappears into an
        // implicit one if no sibling overload of this call needs it to
        // disambiguate.
        if let Some(registry) = self.registry {
            let arg_types: Vec<Type> = args.iter().map(|&a| self.arena.get(a).return_type()).collect();
            for (i, &arg) in args.iter().enumerate() {
                let is_explicit_cast = matches!(self.arena.get(arg), Operation::Cast { implicit: false, .. });
                if is_explicit_cast
                    && overload::cast_is_redundant(registry, &member.class_name, &member.name, &descriptor.parameters, &arg_types, i)
                {
                    if let Operation::Cast { target, operand, .. } = self.arena.get(arg).clone() {
                        self.arena.replace(arg, Operation::Cast { target, operand, implicit: true });
                    }
                }
            }
        }

        if is_special && member.name == "<init>" {
            let receiver = self.pop(instr.index)?;
            let target = self.arena.original(receiver);
            if let Operation::New { ty, .. } = self.arena.get(target).clone() {
                self.arena.replace(target, Operation::New { ty, ctor_descriptor: member.descriptor.clone(), args });
                return Ok(());
            }
            // `super(...)`/`this(...)` on an existing receiver: render as
            // an ordinary call statement.
            let call = self.arena.push(Operation::Call {
                owner,
                name: member.name,
                descriptor: member.descriptor,
                receiver: Some(receiver),
                args,
                ty: Type::Primitive(Primitive::Void),
                is_static: false,
            });
            scope.push(Statement::Expression(call));
            return Ok(());
        }

        let receiver = if is_static { None } else { Some(self.pop(instr.index)?) };
        let call = self.arena.push(Operation::Call {
            owner,
            name: member.name,
            descriptor: member.descriptor,
            receiver,
            args,
            ty: descriptor.return_type.clone(),
            is_static,
        });
        if matches!(descriptor.return_type, Type::Primitive(Primitive::Void)) {
            scope.push(Statement::Expression(call));
        } else {
            self.stack.push(call);
        }
        Ok(())
    }

    /// `invokedynamic` against `StringConcatFactory.makeConcatWithConstants`
    /// (javac 9+'s string-concat lowering) decodes the bootstrap's recipe
    /// string and collapses to an [`Operation::StringConcat`] with the
    /// recipe's literal segments spliced back in between the dynamic
    /// arguments; any other bootstrap keeps its arguments as an opaque
    /// call so tolerant rendering still emits something recognizable
    /// (§4.6).
    fn eval_invoke_dynamic(&mut self, instr: &Instruction) -> Result<(), LogicError> {
        let idx = match instr.operand {
            Operand::InvokeDynamic { pool_ref } => pool_ref,
            _ => return Ok(()),
        };
        let (bootstrap_index, nat) = self.pool.invoke_dynamic(idx).map_err(|_| LogicError::MalformedControlFlow {
            index: instr.index,
            detail: "invokedynamic: constant did not resolve".into(),
        })?;
        let descriptor = parse_method_descriptor(&nat.descriptor).map_err(|_| LogicError::IllegalMethodDescriptor {
            descriptor: nat.descriptor.clone(),
            detail: "could not parse invokedynamic descriptor".into(),
        })?;
        let args = self.pop_n(descriptor.parameters.len(), instr.index)?;
        let recipe = self.string_concat_recipe(bootstrap_index);
        match recipe {
            Some(recipe) => {
                let parts = self.splice_recipe(&recipe, args);
                self.push(Operation::StringConcat { parts });
            }
            None => {
                // No resolvable `StringConcatFactory` recipe — keep the
                // call site visible as an opaque static call under a
                // synthetic owner rather than silently dropping it
                // (lambda/method-ref `invokedynamic` forms land here).
                let owner = Type::class(QualifiedName::parse("invokedynamic"));
                self.push(Operation::Call {
                    owner,
                    name: nat.name.clone(),
                    descriptor: nat.descriptor.clone(),
                    receiver: None,
                    args,
                    ty: descriptor.return_type,
                    is_static: true,
                });
            }
        }
        Ok(())
    }

    /// The bootstrap at `bootstrap_index` is `StringConcatFactory`'s, its
    /// recipe string is its first static argument (§4.6).
    fn string_concat_recipe(&self, bootstrap_index: u16) -> Option<String> {
        let bootstrap = self.bootstrap_methods.get(bootstrap_index as usize)?;
        let (_, reference_index) = self.pool.method_handle(bootstrap.method_ref).ok()?;
        let member = self.pool.any_methodref(reference_index).ok()?;
        if member.class_name != STRING_CONCAT_FACTORY || member.name != "makeConcatWithConstants" {
            return None;
        }
        let recipe_index = *bootstrap.arguments.first()?;
        self.pool.string(recipe_index).ok().map(|s| s.to_string())
    }

    /// Splits `recipe` on `\u0001` (the dynamic-argument placeholder) and
    /// interleaves its literal segments with `args` in order, dropping
    /// empty segments so two adjacent placeholders don't leave a bogus
    /// `"" +` in the rendered expression. `\u0002` (constant placeholder)
    /// never appears in `javac`'s own lowering and is left in its segment
    /// verbatim if it does.
    fn splice_recipe(&mut self, recipe: &str, args: Vec<OperationId>) -> Vec<OperationId> {
        let mut parts = Vec::new();
        let mut args = args.into_iter();
        for (i, segment) in recipe.split('\u{1}').enumerate() {
            if i > 0 {
                if let Some(arg) = args.next() {
                    parts.push(arg);
                }
            }
            if !segment.is_empty() {
                parts.push(self.arena.push(Operation::Constant(Literal::String(segment.to_string()))));
            }
        }
        parts.extend(args);
        parts
    }
}

fn local_slot(instr: &Instruction) -> Result<u16, LogicError> {
    match instr.operand {
        Operand::Local(slot) => Ok(slot),
        _ => Err(LogicError::MalformedControlFlow {
            index: instr.index,
            detail: "expected a local-variable operand".into(),
        }),
    }
}

fn array_element_type(opcode: Opcode) -> Type {
    use Opcode::*;
    match opcode {
        Iaload => Type::Primitive(Primitive::Int),
        Laload => Type::Primitive(Primitive::Long),
        Faload => Type::Primitive(Primitive::Float),
        Daload => Type::Primitive(Primitive::Double),
        Aaload => Type::AnyObject,
        Baload => Type::Primitive(Primitive::Byte),
        Caload => Type::Primitive(Primitive::Char),
        Saload => Type::Primitive(Primitive::Short),
        _ => Type::Any,
    }
}

/// JVMS Table 6.1 `newarray` atype codes.
fn newarray_primitive(code: u8) -> Primitive {
    match code {
        4 => Primitive::Boolean,
        5 => Primitive::Char,
        6 => Primitive::Float,
        7 => Primitive::Double,
        8 => Primitive::Byte,
        9 => Primitive::Short,
        10 => Primitive::Int,
        11 => Primitive::Long,
        _ => Primitive::Int,
    }
}

/// `java/lang/Integer.intValue()` and its seven siblings, recognized by
/// the boxed class's name plus the unboxing method's own `<prim>Value`
/// naming convention rather than a hardcoded table (§4.6).
fn unboxing_target(owner_internal: &str, method_name: &str) -> Option<Type> {
    const PRIMITIVES: [Primitive; 8] = [
        Primitive::Boolean,
        Primitive::Byte,
        Primitive::Char,
        Primitive::Short,
        Primitive::Int,
        Primitive::Long,
        Primitive::Float,
        Primitive::Double,
    ];
    PRIMITIVES
        .into_iter()
        .find(|p| owner_internal == format!("java/lang/{}", p.boxed_name()) && method_name == format!("{}Value", p.java_name()))
        .map(Type::Primitive)
}

fn if_to_comparison(opcode: Opcode) -> Comparison {
    use Opcode::*;
    match opcode {
        Ifeq => Comparison::Eq,
        Ifne => Comparison::Ne,
        Iflt => Comparison::Lt,
        Ifge => Comparison::Ge,
        Ifgt => Comparison::Gt,
        Ifle => Comparison::Le,
        _ => Comparison::Eq,
    }
}

fn icmp_to_comparison(opcode: Opcode) -> Comparison {
    use Opcode::*;
    match opcode {
        IfIcmpeq => Comparison::Eq,
        IfIcmpne => Comparison::Ne,
        IfIcmplt => Comparison::Lt,
        IfIcmpge => Comparison::Ge,
        IfIcmpgt => Comparison::Gt,
        IfIcmple => Comparison::Le,
        _ => Comparison::Eq,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopeKind;
    use jclass_core::attributes::BootstrapMethod;
    use jclass_core::pool::{Constant, ConstantPool, MethodHandleKind};
    use jclass_core::pos::Pos;
    use jclass_parser::instruction::Instruction;
    use jclass_parser::opcode::Opcode;

    fn empty_pool() -> ConstantPool {
        ConstantPool::from_entries(vec![Constant::Unusable]).unwrap()
    }

    fn instr(index: u32, opcode: Opcode, operand: Operand) -> Instruction {
        Instruction { index, pos: Pos::new(index), opcode, operand }
    }

    #[test]
    fn arithmetic_produces_binary_node() {
        let pool = empty_pool();
        let mut eval = SymbolicEvaluator::new(&pool);
        let mut scope = Scope::new(ScopeKind::Method);
        eval.step(&instr(0, Opcode::Iconst1, Operand::None), &mut scope).unwrap();
        eval.step(&instr(1, Opcode::Iconst2, Operand::None), &mut scope).unwrap();
        eval.step(&instr(2, Opcode::Iadd, Operand::None), &mut scope).unwrap();
        let arena = eval.into_arena();
        assert_eq!(arena.len(), 3);
        assert!(matches!(arena.get(crate::operation::OperationId(2)), Operation::Binary { op: BinaryOp::Add, .. }));
    }

    #[test]
    fn store_emits_assign_statement() {
        let pool = empty_pool();
        let mut eval = SymbolicEvaluator::new(&pool);
        let mut scope = Scope::new(ScopeKind::Method);
        eval.step(&instr(0, Opcode::Iconst1, Operand::None), &mut scope).unwrap();
        eval.step(&instr(1, Opcode::Istore0, Operand::Local(0)), &mut scope).unwrap();
        assert_eq!(scope.statements.len(), 1);
        assert!(matches!(scope.statements[0], Statement::Expression(_)));
        assert!(scope.owns(0));
    }

    #[test]
    fn xor_with_minus_one_becomes_bitwise_not() {
        let pool = empty_pool();
        let mut eval = SymbolicEvaluator::new(&pool);
        let mut scope = Scope::new(ScopeKind::Method);
        eval.step(&instr(0, Opcode::Iconst1, Operand::None), &mut scope).unwrap();
        eval.step(&instr(1, Opcode::IconstM1, Operand::None), &mut scope).unwrap();
        eval.step(&instr(2, Opcode::Ixor, Operand::None), &mut scope).unwrap();
        let arena = eval.into_arena();
        assert!(matches!(arena.get(crate::operation::OperationId(2)), Operation::Unary { negate: false, .. }));
    }

    #[test]
    fn lcmp_then_ifle_fuses_into_two_operand_compare() {
        let pool = empty_pool();
        let mut eval = SymbolicEvaluator::new(&pool);
        let mut scope = Scope::new(ScopeKind::Method);
        eval.step(&instr(0, Opcode::Lconst0, Operand::None), &mut scope).unwrap();
        eval.step(&instr(1, Opcode::Lconst1, Operand::None), &mut scope).unwrap();
        eval.step(&instr(2, Opcode::Lcmp, Operand::None), &mut scope).unwrap();
        eval.step(&instr(3, Opcode::Ifle, Operand::Branch { offset: 10, target: Pos::new(13) }), &mut scope).unwrap();
        let arena = eval.into_arena();
        match arena.get(crate::operation::OperationId(3)) {
            Operation::Compare { cmp: Comparison::Le, lhs, rhs, .. } => {
                assert_eq!(*lhs, crate::operation::OperationId(0));
                assert_eq!(*rhs, crate::operation::OperationId(1));
            }
            other => panic!("expected fused compare, got {other:?}"),
        }
    }

    #[test]
    fn negate_flips_a_compare_in_place_rather_than_wrapping() {
        let pool = empty_pool();
        let mut eval = SymbolicEvaluator::new(&pool);
        let mut scope = Scope::new(ScopeKind::Method);
        eval.step(&instr(0, Opcode::Iconst0, Operand::None), &mut scope).unwrap();
        eval.step(&instr(1, Opcode::Ifle, Operand::Branch { offset: 10, target: Pos::new(11) }), &mut scope).unwrap();
        let operand = crate::operation::OperationId(0);
        let condition = crate::operation::OperationId(1);
        let negated = eval.negate(condition);
        assert_eq!(
            eval.arena().get(negated),
            &Operation::Compare { kind: CompareKind::IntZero, cmp: Comparison::Gt, lhs: operand, rhs: operand }
        );
    }

    #[test]
    fn negate_wraps_a_non_compare_operand_in_unary() {
        let pool = empty_pool();
        let mut eval = SymbolicEvaluator::new(&pool);
        let id = eval.arena.push(Operation::Constant(Literal::Int(1)));
        let negated = eval.negate(id);
        assert!(matches!(eval.arena().get(negated), Operation::Unary { negate: true, operand, .. } if *operand == id));
    }

    /// Pool entries for one `invokedynamic` call site bootstrapped against
    /// `StringConcatFactory.makeConcatWithConstants` with recipe
    /// `"a= b="` and two `int` dynamic args — the shape `javac`
    /// emits for `"a=" + a + " b=" + b` (§8 scenario 2).
    fn string_concat_pool_and_bootstrap() -> (ConstantPool, Vec<BootstrapMethod>) {
        let entries = vec![
            Constant::Unusable, // 0: unused
            Constant::Utf8("java/lang/invoke/StringConcatFactory".to_string()), // 1
            Constant::Class { name_index: 1 },                                  // 2
            Constant::Utf8("makeConcatWithConstants".to_string()),              // 3
            Constant::Utf8("(II)Ljava/lang/String;".to_string()),               // 4
            Constant::NameAndType { name_index: 3, descriptor_index: 4 },       // 5
            Constant::Methodref { class_index: 2, name_and_type_index: 5 },     // 6
            Constant::MethodHandle { kind: MethodHandleKind::InvokeStatic, reference_index: 6 }, // 7
            Constant::Utf8("a=\u{1} b=\u{1}".to_string()),                      // 8: recipe
            Constant::String { string_index: 8 },                              // 9
            Constant::InvokeDynamic { bootstrap_method_attr_index: 0, name_and_type_index: 5 }, // 10
        ];
        let pool = ConstantPool::from_entries(entries).unwrap();
        let bootstraps = vec![BootstrapMethod { method_ref: 7, arguments: vec![9] }];
        (pool, bootstraps)
    }

    #[test]
    fn invoke_dynamic_against_string_concat_factory_splices_recipe_literals() {
        let (pool, bootstraps) = string_concat_pool_and_bootstrap();
        let mut eval = SymbolicEvaluator::with_bootstrap_methods(&pool, &bootstraps);
        let mut scope = Scope::new(ScopeKind::Method);
        eval.step(&instr(0, Opcode::Iconst1, Operand::None), &mut scope).unwrap();
        eval.step(&instr(1, Opcode::Iconst2, Operand::None), &mut scope).unwrap();
        eval.step(&instr(2, Opcode::Invokedynamic, Operand::InvokeDynamic { pool_ref: 10 }), &mut scope).unwrap();
        let arena = eval.into_arena();
        let top = arena.get(crate::operation::OperationId(arena.len() as u32 - 1));
        let Operation::StringConcat { parts } = top else { panic!("expected StringConcat, got {top:?}") };
        assert_eq!(parts.len(), 4);
        assert!(matches!(arena.get(parts[0]), Operation::Constant(Literal::String(s)) if s == "a="));
        assert!(matches!(arena.get(parts[1]), Operation::Constant(Literal::Int(1))));
        assert!(matches!(arena.get(parts[2]), Operation::Constant(Literal::String(s)) if s == " b="));
        assert!(matches!(arena.get(parts[3]), Operation::Constant(Literal::Int(2))));
    }

    #[test]
    fn invoke_dynamic_against_an_unrecognized_bootstrap_renders_as_an_opaque_call() {
        // Same pool shape, but the `Class` constant the method handle's
        // methodref points at names some other factory: the recipe lookup
        // should fail closed rather than mis-identify it as string
        // concatenation.
        let entries = vec![
            Constant::Unusable,                                                  // 0
            Constant::Utf8("some/other/Factory".to_string()),                    // 1
            Constant::Class { name_index: 1 },                                   // 2
            Constant::Utf8("makeConcatWithConstants".to_string()),               // 3
            Constant::Utf8("(II)Ljava/lang/String;".to_string()),                // 4
            Constant::NameAndType { name_index: 3, descriptor_index: 4 },        // 5
            Constant::Methodref { class_index: 2, name_and_type_index: 5 },      // 6
            Constant::MethodHandle { kind: MethodHandleKind::InvokeStatic, reference_index: 6 }, // 7
            Constant::Utf8("a=\u{1} b=\u{1}".to_string()),                       // 8
            Constant::String { string_index: 8 },                               // 9
            Constant::InvokeDynamic { bootstrap_method_attr_index: 0, name_and_type_index: 5 }, // 10
        ];
        let pool = ConstantPool::from_entries(entries).unwrap();
        let bootstraps = vec![BootstrapMethod { method_ref: 7, arguments: vec![9] }];
        let mut eval = SymbolicEvaluator::with_bootstrap_methods(&pool, &bootstraps);
        let mut scope = Scope::new(ScopeKind::Method);
        eval.step(&instr(0, Opcode::Iconst1, Operand::None), &mut scope).unwrap();
        eval.step(&instr(1, Opcode::Iconst2, Operand::None), &mut scope).unwrap();
        eval.step(&instr(2, Opcode::Invokedynamic, Operand::InvokeDynamic { pool_ref: 10 }), &mut scope).unwrap();
        let arena = eval.into_arena();
        let top = arena.get(crate::operation::OperationId(arena.len() as u32 - 1));
        assert!(matches!(top, Operation::Call { is_static: true, .. }));
    }

    #[test]
    fn a_local_variable_table_entry_names_the_slot_on_first_touch() {
        let pool = empty_pool();
        let locals = vec![LocalVariableEntry {
            start_pc: 0,
            length: 10,
            name: "x".to_string(),
            descriptor: "I".to_string(),
            index: 1,
        }];
        let mut eval = SymbolicEvaluator::with_debug_info(&pool, &[], &locals);
        let mut scope = Scope::new(ScopeKind::Method);
        eval.step(&instr(0, Opcode::Iload1, Operand::Local(1)), &mut scope).unwrap();
        let var = scope.variable(1).unwrap();
        assert_eq!(var.name_candidates, vec!["x".to_string()]);
        assert!(var.fixed_type);
        assert!(matches!(var.inferred_type, Type::Primitive(Primitive::Int)));
    }

    #[test]
    fn a_touch_outside_the_entrys_live_range_falls_back_to_the_heuristic_name() {
        let pool = empty_pool();
        let locals = vec![LocalVariableEntry {
            start_pc: 5,
            length: 10,
            name: "x".to_string(),
            descriptor: "I".to_string(),
            index: 1,
        }];
        let mut eval = SymbolicEvaluator::with_debug_info(&pool, &[], &locals);
        let mut scope = Scope::new(ScopeKind::Method);
        eval.step(&instr(0, Opcode::Iload1, Operand::Local(1)), &mut scope).unwrap();
        let var = scope.variable(1).unwrap();
        assert!(var.name_candidates.is_empty());
        assert!(!var.fixed_type);
    }
}
