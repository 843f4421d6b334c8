//! The control-flow reconstructor (§4.8): walks the disassembler's
//! [`BlockTree`] and switch/exception-table shapes, driving the
//! [`SymbolicEvaluator`] over straight-line instruction ranges and
//! folding the block nesting into a [`Scope`] tree of structured
//! [`Statement`]s.
//!
//! Grounded on `angelscript-compiler/src/stmt/{if_stmt,while_stmt,
//! for_stmt,switch_stmt,try_catch,block}.rs` — the teacher walks a
//! parsed statement AST down into bytecode block markers; this walks
//! the block markers back up into the same statement shapes. `goto`
//! instructions that survive inside a block's range (the disassembler
//! has already folded the rest into block nesting) are resolved against
//! an explicit break/continue target stack rather than rendered
//! directly — a stray `goto` whose target matches neither is the
//! familiar "jump past the else" idiom and is dropped silently, since
//! the If/Else block pair already captures that control transfer
//! structurally.

use jclass_core::attributes::{BootstrapMethod, Code};
use jclass_core::error::LogicError;
use jclass_core::pool::ConstantPool;
use jclass_core::pos::{IndexRange, Pos};
use jclass_core::qualified_name::QualifiedName;
use jclass_core::types::{RefType, Type};
use jclass_parser::block::{Block, BlockKind};
use jclass_parser::disassembler::DisassemblyResult;
use jclass_parser::instruction::{Instruction, Operand};
use jclass_parser::opcode::Opcode;
use rustc_hash::FxHashMap;

use crate::config::Config;
use crate::evaluator::SymbolicEvaluator;
use crate::operation::{AssignTarget, BinaryOp, Comparison, CompareKind, Operation, OperationArena, OperationId};
use crate::scope::{CatchClause, Label, Scope, ScopeKind, Statement, SwitchCase};
use crate::variable::Variable;

pub struct ControlFlowReconstructor<'a> {
    pool: &'a ConstantPool,
    bootstrap_methods: &'a [BootstrapMethod],
    disasm: &'a DisassemblyResult,
    code: &'a Code,
    instructions_by_index: FxHashMap<u32, &'a Instruction>,
    break_targets: Vec<u32>,
    continue_targets: Vec<u32>,
    labels_by_target: FxHashMap<u32, Label>,
    next_label: u32,
    /// Whether the owning class declares a synthetic
    /// `$assertionsDisabled` field — `javac` only emits one when the
    /// class body contains a source-level `assert`, so its presence
    /// gates the assertion-pattern recognizer (§4.8 "Assertions").
    has_assertions_disabled: bool,
    /// Overload oracle and idiom flags handed to the evaluator, set via
    /// [`ControlFlowReconstructor::with_registry`]. `None` keeps every
    /// method call's casts exactly as disassembled.
    registry: Option<(&'a jclass_registry::ClassRegistry, &'a Config)>,
}

impl<'a> ControlFlowReconstructor<'a> {
    pub fn new(
        pool: &'a ConstantPool,
        bootstrap_methods: &'a [BootstrapMethod],
        disasm: &'a DisassemblyResult,
        code: &'a Code,
        has_assertions_disabled: bool,
    ) -> Self {
        let instructions_by_index = disasm.instructions.iter().map(|i| (i.index, i)).collect();
        ControlFlowReconstructor {
            pool,
            bootstrap_methods,
            disasm,
            code,
            instructions_by_index,
            break_targets: Vec::new(),
            continue_targets: Vec::new(),
            labels_by_target: FxHashMap::default(),
            next_label: 0,
            has_assertions_disabled,
            registry: None,
        }
    }

    /// Wires a [`jclass_registry::ClassRegistry`] and [`Config`] into the
    /// evaluator this reconstructor builds, unlocking overload-ranked
    /// argument-cast removal and the boxed-wrapper idiom (§4.3, §4.6, §9).
    pub fn with_registry(mut self, registry: &'a jclass_registry::ClassRegistry, config: &'a Config) -> Self {
        self.registry = Some((registry, config));
        self
    }

    /// Entry point: reconstruct the whole method body as one [`Scope`]
    /// plus the [`OperationArena`] every `OperationId` inside it indexes
    /// into. Callers wrap a failure into `DecompileError::Method` with
    /// the owning class/method name (§5 tolerant-mode rendering).
    pub fn reconstruct(&mut self) -> Result<(Scope, OperationArena), LogicError> {
        let locals = self.code.local_variable_table().unwrap_or(&[]);
        let mut evaluator = match self.registry {
            Some((registry, config)) => SymbolicEvaluator::with_context(self.pool, self.bootstrap_methods, locals, registry, config),
            None => SymbolicEvaluator::with_debug_info(self.pool, self.bootstrap_methods, locals),
        };
        let mut scope = Scope::new(ScopeKind::Method);
        let root = self.disasm.blocks.root();
        let range = root.range;
        let children = root.children.clone();
        self.build_range(range, &children, &mut evaluator, &mut scope)?;
        Ok((scope, evaluator.into_arena()))
    }

    fn instruction(&self, index: u32) -> Option<&'a Instruction> {
        self.instructions_by_index.get(&index).copied()
    }

    fn label_for(&mut self, target: u32) -> Label {
        if let Some(l) = self.labels_by_target.get(&target) {
            return l.clone();
        }
        self.next_label += 1;
        let label = Label(if self.next_label == 1 { "L".to_string() } else { format!("L{}", self.next_label) });
        self.labels_by_target.insert(target, label.clone());
        label
    }

    /// Turn a resolved `goto` target into `Break`/`Continue` against the
    /// enclosing loop/switch stack, or `None` if it targets neither (the
    /// if/else "jump past the else" idiom).
    fn jump_statement(&mut self, target: u32) -> Option<Statement> {
        if let Some(pos) = self.break_targets.iter().rposition(|&t| t == target) {
            let innermost = pos == self.break_targets.len() - 1;
            return Some(Statement::Break(if innermost { None } else { Some(self.label_for(target)) }));
        }
        if let Some(pos) = self.continue_targets.iter().rposition(|&t| t == target) {
            let innermost = pos == self.continue_targets.len() - 1;
            return Some(Statement::Continue(if innermost { None } else { Some(self.label_for(target)) }));
        }
        None
    }

    /// Walk a flat instruction range, descending into any child blocks
    /// whose start falls inside it and skipping past their extent once
    /// handled. Shared between the method body, loop/if bodies, and
    /// individual switch-case arms (none of which the block tree itself
    /// models as a distinct kind for switches).
    fn build_range(
        &mut self,
        range: IndexRange,
        children: &[usize],
        evaluator: &mut SymbolicEvaluator,
        scope: &mut Scope,
    ) -> Result<(), LogicError> {
        let mut sorted: Vec<usize> = children
            .iter()
            .copied()
            .filter(|&c| range.contains_range(self.disasm.blocks.get(c).range))
            .collect();
        sorted.sort_by_key(|&c| self.disasm.blocks.get(c).range.start);

        let mut index = range.start;
        let mut child_cursor = 0;
        while index <= range.end {
            if let Some(&child_id) = sorted.get(child_cursor) {
                let block = self.disasm.blocks.get(child_id);
                if block.range.start == index {
                    // `Else` is handled together with its preceding `If`,
                    // `Catch` together with its preceding `Try` — both
                    // still need `index` advanced past them.
                    if !matches!(block.kind, BlockKind::Else | BlockKind::Catch) {
                        self.build_block(child_id, evaluator, scope)?;
                    }
                    index = block.range.end.saturating_add(1);
                    child_cursor += 1;
                    continue;
                }
            }

            let Some(instr) = self.instruction(index) else {
                index += 1;
                continue;
            };

            if matches!(instr.opcode, Opcode::Goto | Opcode::GotoW) {
                if let Operand::Branch { target, .. } = instr.operand {
                    if let Some(target_index) = self.disasm.index_at(target) {
                        if let Some(stmt) = self.jump_statement(target_index) {
                            scope.push(stmt);
                        }
                    }
                }
                index += 1;
                continue;
            }

            if matches!(instr.operand, Operand::Tableswitch { .. } | Operand::Lookupswitch { .. }) {
                self.build_switch(instr, evaluator, scope)?;
                index = self.switch_end(instr);
                continue;
            }

            evaluator.step(instr, scope)?;
            index += 1;
        }
        self.collapse_trailing_diverging_if(evaluator, &mut scope.statements);
        Ok(())
    }

    /// `build_if` only tries [`ternary_collapse`] against an `Else` the
    /// block tree itself discovered, which `javac` only leaves behind
    /// when a trailing `goto` skips past it — but a then-branch that
    /// already diverges (`return`/`throw`) needs no such `goto`, so a
    /// bytecode-identical `if (cond) return a; return b;` never gets
    /// that `Else` sibling at all. Retry the same collapse here, against
    /// whatever statement happens to follow the `if` in this same
    /// sequence, once the full list is known — late enough that
    /// `assertion_collapse` (which requires `else_branch: None` and runs
    /// inside `build_if` itself) has already had its look first.
    fn collapse_trailing_diverging_if(&self, evaluator: &mut SymbolicEvaluator, statements: &mut Vec<Statement>) {
        let mut i = 0;
        while i + 1 < statements.len() {
            let collapsed = match &statements[i] {
                Statement::If { condition, then_branch, else_branch: None } if diverges(then_branch.statements.last()) => {
                    ternary_collapse(evaluator.arena_mut(), *condition, &then_branch.statements, std::slice::from_ref(&statements[i + 1]))
                }
                _ => None,
            };
            match collapsed {
                Some(stmt) => {
                    statements.splice(i..i + 2, [stmt]);
                }
                None => i += 1,
            }
        }
    }

    fn build_block(&mut self, id: usize, evaluator: &mut SymbolicEvaluator, scope: &mut Scope) -> Result<(), LogicError> {
        let block = self.disasm.blocks.get(id).clone();
        match block.kind {
            BlockKind::Root => {
                let children = block.children.clone();
                self.build_range(block.range, &children, evaluator, scope)
            }
            BlockKind::If => self.build_if(id, &block, evaluator, scope),
            BlockKind::Else => {
                // Reached only if an `Else` block has no preceding `If`
                // sibling in range (malformed input) — render it as a
                // plain block rather than failing reconstruction.
                let children = block.children.clone();
                let mut inner = Scope::new(ScopeKind::Block);
                self.build_range(block.range, &children, evaluator, &mut inner)?;
                scope.statements.extend(inner.statements);
                Ok(())
            }
            BlockKind::Try => self.build_try(id, &block, evaluator, scope),
            BlockKind::Catch => {
                // Handled from `build_try`; reaching here directly means
                // an orphan catch block, rendered inline as best-effort.
                let children = block.children.clone();
                self.build_range(block.range, &children, evaluator, scope)
            }
            BlockKind::InfiniteLoop => self.build_loop(id, &block, evaluator, scope),
        }
    }

    fn build_if(
        &mut self,
        id: usize,
        block: &Block,
        evaluator: &mut SymbolicEvaluator,
        scope: &mut Scope,
    ) -> Result<(), LogicError> {
        // The conditional jump's own test is the *skip* condition — the
        // block's range is exactly what that jump jumps past, so it runs
        // when the test is false. Negate once here so `Statement::If`
        // carries the condition under which `then_branch` actually runs,
        // matching ordinary `if (cond) { ... }` semantics for rendering.
        let skip_test = evaluator.pop_condition(block.range.start)?;
        let condition = evaluator.negate(skip_test);

        let then_children = self.disasm.blocks.get(id).children.clone();
        let mut then_branch = Scope::new(ScopeKind::If);
        self.build_range(block.range, &then_children, evaluator, &mut then_branch)?;

        let else_sibling = block
            .parent
            .map(|p| self.disasm.blocks.get(p).children.clone())
            .unwrap_or_default()
            .into_iter()
            .find(|&c| {
                let b = self.disasm.blocks.get(c);
                b.kind == BlockKind::Else && b.range.start == block.range.end.saturating_add(1)
            });

        let else_branch = if let Some(else_id) = else_sibling {
            let else_block = self.disasm.blocks.get(else_id).clone();
            let else_children = self.disasm.blocks.get(else_id).children.clone();
            let mut branch = Scope::new(ScopeKind::Else);
            self.build_range(else_block.range, &else_children, evaluator, &mut branch)?;
            Some(branch)
        } else {
            None
        };

        if let Some(else_branch) = &else_branch {
            if let Some(stmt) = ternary_collapse(evaluator.arena_mut(), condition, then_branch.statements.as_slice(), else_branch.statements.as_slice()) {
                scope.push(stmt);
                return Ok(());
            }
        } else if let Some(stmt) = self.assertion_collapse(evaluator, condition, &then_branch) {
            scope.push(stmt);
            return Ok(());
        }

        scope.push(Statement::If { condition, then_branch, else_branch });
        Ok(())
    }

    /// Recognize `getstatic $assertionsDisabled; ifne END; <cond>; ifne
    /// END; new AssertionError(...); athrow; END:` — after the raw
    /// `build_if` negation, reconstructed as a guard `if
    /// (!$assertionsDisabled)` whose body is a single nested `if (!cond)
    /// throw new AssertionError(...)` — and rewrite it to `assert cond
    /// [: message];` (§4.8 "Assertions").
    fn assertion_collapse(&self, evaluator: &mut SymbolicEvaluator, condition: OperationId, then_branch: &Scope) -> Option<Statement> {
        if !self.has_assertions_disabled {
            return None;
        }
        let inner_condition;
        let message;
        {
            let arena = evaluator.arena();
            let Operation::Compare { kind: CompareKind::IntZero, cmp: Comparison::Eq, lhs: guard_field, .. } = arena.get(condition) else {
                return None;
            };
            let Operation::FieldRead { name, receiver: None, .. } = arena.get(*guard_field) else {
                return None;
            };
            if name != "$assertionsDisabled" {
                return None;
            }

            let [Statement::If { condition: cond, then_branch: inner_then, else_branch: None }] = then_branch.statements.as_slice() else {
                return None;
            };
            let [Statement::Throw(thrown)] = inner_then.statements.as_slice() else {
                return None;
            };
            let Operation::New { ty, args, .. } = arena.get(*thrown) else {
                return None;
            };
            if !matches!(ty, Type::Reference(RefType::Class { name, .. }) if name.internal() == "java/lang/AssertionError") {
                return None;
            }

            inner_condition = *cond;
            message = args.first().copied();
        }

        let assert_condition = evaluator.negate(inner_condition);
        Some(Statement::Assert { condition: assert_condition, message })
    }

    fn build_try(
        &mut self,
        id: usize,
        block: &Block,
        evaluator: &mut SymbolicEvaluator,
        scope: &mut Scope,
    ) -> Result<(), LogicError> {
        let body_children = self.disasm.blocks.get(id).children.clone();
        let mut body = Scope::new(ScopeKind::Try);
        self.build_range(block.range, &body_children, evaluator, &mut body)?;

        // Multi-catch renders as one clause: javac emits one handler
        // range per try block but the SAME `handler_pc` for every
        // caught type in a `catch (A | B e)` (§4.8).
        let mut groups: Vec<(u16, u16, u16, Vec<Option<String>>)> = Vec::new();
        for entry in &self.code.exception_table {
            let Some(start_index) = self.disasm.index_at(Pos::new(entry.start_pc as u32)) else { continue };
            if start_index != block.range.start {
                continue;
            }
            if let Some(g) = groups
                .iter_mut()
                .find(|(s, e, h, _)| *s == entry.start_pc && *e == entry.end_pc && *h == entry.handler_pc)
            {
                g.3.push(entry.catch_type.clone());
            } else {
                groups.push((entry.start_pc, entry.end_pc, entry.handler_pc, vec![entry.catch_type.clone()]));
            }
        }

        let mut catches = Vec::new();
        for (_, _, handler_pc, types) in groups {
            let Some(handler_index) = self.disasm.index_at(Pos::new(handler_pc as u32)) else { continue };
            let handler_id = self.disasm.blocks.innermost_containing(handler_index);
            let handler_block = self.disasm.blocks.get(handler_id).clone();
            let handler_children = self.disasm.blocks.get(handler_id).children.clone();

            let exception_slot = self
                .instruction(handler_block.range.start)
                .and_then(|i| if let Operand::Local(slot) = i.operand { Some(slot) } else { None })
                .unwrap_or(0);

            let mut catch_body = Scope::new(ScopeKind::Catch);
            // The handler's first instruction stores the caught
            // exception off the top of stack; skip it here and declare
            // the slot explicitly rather than emitting a spurious
            // assignment statement for it.
            catch_body.declare(Variable::new(exception_slot, Type::AnyObject));
            let inner_start = handler_block.range.start.saturating_add(1);
            if inner_start <= handler_block.range.end {
                let inner_range = IndexRange::new(inner_start, handler_block.range.end);
                self.build_range(inner_range, &handler_children, evaluator, &mut catch_body)?;
            }

            let exception_types = types
                .into_iter()
                .map(|t| match t {
                    Some(name) => Type::class(QualifiedName::parse(&name)),
                    None => Type::class(QualifiedName::parse("java/lang/Throwable")),
                })
                .collect();

            catches.push(CatchClause { exception_types, exception_slot, body: catch_body });
        }

        scope.push(Statement::Try { body, catches });
        Ok(())
    }

    fn build_loop(
        &mut self,
        id: usize,
        block: &Block,
        evaluator: &mut SymbolicEvaluator,
        scope: &mut Scope,
    ) -> Result<(), LogicError> {
        let children = self.disasm.blocks.get(id).children.clone();
        let break_target = block.range.end.saturating_add(1);
        let continue_target = block.range.start;

        let mut body = Scope::new(ScopeKind::While);
        self.break_targets.push(break_target);
        self.continue_targets.push(continue_target);
        let result = self.build_range(block.range, &children, evaluator, &mut body);
        self.break_targets.pop();
        self.continue_targets.pop();
        result?;

        // The `goto` that closes the loop back to `continue_target` is
        // itself part of `block.range`, so `build_range` always walks it
        // last and `jump_statement` always turns it into a trailing
        // `continue;` — redundant, since falling off the end of the body
        // does the same thing. Drop it so the while/for recovery checks
        // below see the body's real last statement.
        if matches!(body.statements.last(), Some(Statement::Continue(None))) {
            body.statements.pop();
        }

        let label =
            self.labels_by_target.get(&break_target).or_else(|| self.labels_by_target.get(&continue_target)).cloned();

        // `while (cond) { ... }` recovery: the compiler emits the guard
        // as a leading `if (!cond) break;` inside an otherwise-infinite
        // loop body (§4.8 "while recovery").
        if let Some(Statement::If { condition, then_branch, else_branch: None }) = body.statements.first() {
            if then_branch.statements.len() == 1 && matches!(then_branch.statements[0], Statement::Break(None)) {
                let break_condition = *condition;
                let condition = evaluator.negate(break_condition);
                let mut rest = Scope::new(ScopeKind::While);
                rest.statements = body.statements[1..].to_vec();
                for v in body.variables() {
                    rest.declare(v.clone());
                }
                scope.push(Statement::While { condition, body: rest, label });
                return Ok(());
            }
        }

        // `for (init; cond; step) { ... }` recovery: a trailing
        // increment of a single local is promoted to the step clause
        // and the variable flagged as a loop counter (§4.8 "for
        // recovery").
        if let Some(Statement::Expression(stmt_id)) = body.statements.last().cloned() {
            let arena = evaluator.arena();
            if let Operation::Assign { target: AssignTarget::Local(slot), value, .. } = arena.get(stmt_id) {
                let slot = *slot;
                if is_increment_of(arena, arena.get(*value), slot) {
                    if let Some(var) = body.variable_mut(slot) {
                        var.is_loop_counter = true;
                    }
                    let mut rest = Scope::new(ScopeKind::For);
                    rest.statements = body.statements[..body.statements.len() - 1].to_vec();
                    for v in body.variables() {
                        rest.declare(v.clone());
                    }
                    scope.push(Statement::For {
                        init: Vec::new(),
                        condition: None,
                        step: vec![stmt_id],
                        body: rest,
                        label,
                    });
                    return Ok(());
                }
            }
        }

        let condition = evaluator.true_literal();
        scope.push(Statement::While { condition, body, label });
        Ok(())
    }

    fn switch_end(&self, instr: &Instruction) -> u32 {
        let targets: Vec<Pos> = match &instr.operand {
            Operand::Tableswitch { default, targets, .. } => {
                let mut t = targets.clone();
                t.push(*default);
                t
            }
            Operand::Lookupswitch { default, pairs } => {
                let mut t: Vec<Pos> = pairs.iter().map(|(_, p)| *p).collect();
                t.push(*default);
                t
            }
            _ => Vec::new(),
        };
        targets
            .iter()
            .filter_map(|p| self.disasm.index_at(*p))
            .max()
            .map(|m| m.saturating_add(1))
            .unwrap_or(instr.index + 1)
    }

    fn build_switch(
        &mut self,
        instr: &Instruction,
        evaluator: &mut SymbolicEvaluator,
        scope: &mut Scope,
    ) -> Result<(), LogicError> {
        let selector = evaluator.pop_value(instr.index)?;

        let (int_arms, default_pos): (Vec<(i32, Pos)>, Pos) = match &instr.operand {
            Operand::Tableswitch { default, low, targets, .. } => {
                let arms = targets.iter().enumerate().map(|(i, pos)| (low + i as i32, *pos)).collect();
                (arms, *default)
            }
            Operand::Lookupswitch { default, pairs } => (pairs.clone(), *default),
            _ => return Ok(()),
        };

        let mut case_groups: Vec<(Pos, Vec<i32>)> = Vec::new();
        for (key, pos) in int_arms {
            if let Some(g) = case_groups.iter_mut().find(|(p, _)| *p == pos) {
                g.1.push(key);
            } else {
                case_groups.push((pos, vec![key]));
            }
        }
        let mut arms: Vec<(Pos, Vec<i32>)> = case_groups;
        arms.push((default_pos, Vec::new()));
        arms.sort_by_key(|(pos, _)| self.disasm.index_at(*pos).unwrap_or(u32::MAX));

        let switch_end = self.switch_end(instr);
        self.break_targets.push(switch_end);

        let mut cases = Vec::new();
        for (i, (pos, labels)) in arms.iter().enumerate() {
            let start = self.disasm.index_at(*pos).unwrap_or(instr.index + 1);
            let end = arms
                .get(i + 1)
                .and_then(|(next, _)| self.disasm.index_at(*next))
                .map(|e| e.saturating_sub(1))
                .unwrap_or_else(|| switch_end.saturating_sub(1));

            if start > end {
                cases.push(SwitchCase { labels: labels.clone(), body: Scope::new(ScopeKind::Switch), falls_through: false });
                continue;
            }

            let range = IndexRange::new(start, end);
            let owning_block = self.disasm.blocks.innermost_containing(start);
            let owned_children: Vec<usize> = self
                .disasm
                .blocks
                .get(owning_block)
                .children
                .iter()
                .copied()
                .filter(|&c| range.contains_range(self.disasm.blocks.get(c).range))
                .collect();

            let mut body = Scope::new(ScopeKind::Switch);
            if let Err(e) = self.build_range(range, &owned_children, evaluator, &mut body) {
                self.break_targets.pop();
                return Err(e);
            }
            let falls_through = !matches!(body.statements.last(), Some(Statement::Break(_)) | Some(Statement::Return(_)));
            if matches!(body.statements.last(), Some(Statement::Break(None))) {
                body.statements.pop();
            }
            cases.push(SwitchCase { labels: labels.clone(), body, falls_through });
        }
        self.break_targets.pop();

        let label = self.labels_by_target.get(&switch_end).cloned();
        scope.push(Statement::Switch { selector, cases, label });
        Ok(())
    }
}

/// Collapse `if (cond) return a; else return b;` / `if (cond) x = a; else
/// x = b;` into a single statement built around `Operation::Ternary`
/// (§4.8 "If with else": "when both the if and its else leave exactly one
/// operand on the stack"). Conservative: only fires when both branches
/// are exactly one statement of a recognized matching shape, never
/// partially collapses a longer branch.
fn diverges(last: Option<&Statement>) -> bool {
    matches!(last, Some(Statement::Return(_)) | Some(Statement::Throw(_)))
}

fn ternary_collapse(arena: &mut OperationArena, condition: OperationId, then_stmts: &[Statement], else_stmts: &[Statement]) -> Option<Statement> {
    if then_stmts.len() != 1 || else_stmts.len() != 1 {
        return None;
    }
    match (&then_stmts[0], &else_stmts[0]) {
        (Statement::Return(Some(a)), Statement::Return(Some(b))) => {
            let ty = arena.get(*a).return_type();
            let id = arena.push(Operation::Ternary { condition, if_true: *a, if_false: *b, ty });
            Some(Statement::Return(Some(id)))
        }
        (Statement::Expression(a), Statement::Expression(b)) => {
            let Operation::Assign { target: target_a, value: value_a, ty: ty_a } = arena.get(*a).clone() else { return None };
            let Operation::Assign { target: target_b, value: value_b, .. } = arena.get(*b) else { return None };
            if target_a != *target_b {
                return None;
            }
            let tern = arena.push(Operation::Ternary { condition, if_true: value_a, if_false: *value_b, ty: ty_a.clone() });
            let id = arena.push(Operation::Assign { target: target_a, value: tern, ty: ty_a });
            Some(Statement::Expression(id))
        }
        _ => None,
    }
}

/// Recognize `slot = slot + k` / `slot = slot - k`, the desugared form
/// `iinc` already produces inside [`crate::evaluator::SymbolicEvaluator`]
/// (§4.6 `iinc` three-form recognition, reused here for `for`-loop step
/// detection).
fn is_increment_of(arena: &OperationArena, op: &Operation, slot: u16) -> bool {
    if let Operation::Binary { op: BinaryOp::Add | BinaryOp::Sub, lhs, .. } = op {
        matches!(arena.get(*lhs), Operation::LocalRead { slot: s } if *s == slot)
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jclass_core::pool::Constant;
    use jclass_core::types::Primitive;

    fn empty_pool() -> ConstantPool {
        ConstantPool::from_entries(vec![Constant::Unusable]).unwrap()
    }

    // A single bare `return`, with no branches of its own — just enough
    // to build a real `DisassemblyResult`/`Code` pair without depending
    // on the disassembler's branch/block arithmetic for these
    // reconstructor-only unit tests.
    fn trivial_disasm() -> DisassemblyResult {
        jclass_parser::disassemble(&[0xB1], Pos::new(0), &[]).unwrap()
    }

    fn trivial_code() -> Code {
        Code { max_stack: 0, max_locals: 0, code: vec![0xB1], exception_table: Vec::new(), attributes: Vec::new() }
    }

    #[test]
    fn jump_statement_innermost_break_is_unlabeled() {
        let pool = empty_pool();
        let disasm = trivial_disasm();
        let code = trivial_code();
        let mut r = ControlFlowReconstructor::new(&pool, &[], &disasm, &code, false);
        r.break_targets.push(10);
        assert_eq!(r.jump_statement(10), Some(Statement::Break(None)));
    }

    #[test]
    fn jump_statement_outer_break_gets_a_reused_label() {
        let pool = empty_pool();
        let disasm = trivial_disasm();
        let code = trivial_code();
        let mut r = ControlFlowReconstructor::new(&pool, &[], &disasm, &code, false);
        r.break_targets.push(10);
        r.break_targets.push(20);
        let first = r.jump_statement(10);
        assert!(matches!(first, Some(Statement::Break(Some(_)))));
        let second = r.jump_statement(10);
        assert_eq!(first, second);
    }

    #[test]
    fn jump_statement_unmatched_target_is_none() {
        let pool = empty_pool();
        let disasm = trivial_disasm();
        let code = trivial_code();
        let mut r = ControlFlowReconstructor::new(&pool, &[], &disasm, &code, false);
        r.break_targets.push(5);
        assert!(r.jump_statement(99).is_none());
    }

    #[test]
    fn continue_targets_outrank_nothing_when_break_matches_first() {
        let pool = empty_pool();
        let disasm = trivial_disasm();
        let code = trivial_code();
        let mut r = ControlFlowReconstructor::new(&pool, &[], &disasm, &code, false);
        r.continue_targets.push(7);
        assert_eq!(r.jump_statement(7), Some(Statement::Continue(None)));
    }

    #[test]
    fn increment_of_matches_add_to_same_slot_only() {
        let mut arena = OperationArena::new();
        let read = arena.push(Operation::LocalRead { slot: 3 });
        let lit = arena.push(Operation::Constant(crate::operation::Literal::Int(1)));
        let sum = Operation::Binary { op: BinaryOp::Add, lhs: read, rhs: lit, ty: Type::Primitive(Primitive::Int) };
        assert!(is_increment_of(&arena, &sum, 3));
        assert!(!is_increment_of(&arena, &sum, 4));
    }

    #[test]
    fn ternary_collapse_fuses_matching_returns() {
        let mut arena = OperationArena::new();
        let cond = arena.push(Operation::Compare {
            kind: crate::operation::CompareKind::IntZero,
            cmp: crate::operation::Comparison::Gt,
            lhs: OperationId(0),
            rhs: OperationId(0),
        });
        let a = arena.push(Operation::Constant(crate::operation::Literal::Int(1)));
        let b = arena.push(Operation::Constant(crate::operation::Literal::Int(0)));
        let then_stmts = [Statement::Return(Some(a))];
        let else_stmts = [Statement::Return(Some(b))];
        let collapsed = ternary_collapse(&mut arena, cond, &then_stmts, &else_stmts);
        match collapsed {
            Some(Statement::Return(Some(id))) => {
                assert!(matches!(arena.get(id), Operation::Ternary { if_true, if_false, .. } if *if_true == a && *if_false == b));
            }
            other => panic!("expected collapsed return, got {other:?}"),
        }
    }

    #[test]
    fn ternary_collapse_refuses_longer_branches() {
        let mut arena = OperationArena::new();
        let cond = arena.push(Operation::Constant(crate::operation::Literal::Int(1)));
        let a = arena.push(Operation::Constant(crate::operation::Literal::Int(1)));
        let then_stmts = [Statement::Return(Some(a)), Statement::Break(None)];
        let else_stmts = [Statement::Return(Some(a))];
        assert!(ternary_collapse(&mut arena, cond, &then_stmts, &else_stmts).is_none());
    }

    #[test]
    fn ternary_collapse_refuses_assigns_to_different_targets() {
        let mut arena = OperationArena::new();
        let cond = arena.push(Operation::Constant(crate::operation::Literal::Int(1)));
        let value = arena.push(Operation::Constant(crate::operation::Literal::Int(1)));
        let assign_a = arena.push(Operation::Assign { target: AssignTarget::Local(1), value, ty: Type::Primitive(Primitive::Int) });
        let assign_b = arena.push(Operation::Assign { target: AssignTarget::Local(2), value, ty: Type::Primitive(Primitive::Int) });
        let then_stmts = [Statement::Expression(assign_a)];
        let else_stmts = [Statement::Expression(assign_b)];
        assert!(ternary_collapse(&mut arena, cond, &then_stmts, &else_stmts).is_none());
    }

    #[test]
    fn collapse_trailing_diverging_if_fuses_an_if_return_with_the_statement_after_it() {
        let pool = empty_pool();
        let disasm = trivial_disasm();
        let code = trivial_code();
        let r = ControlFlowReconstructor::new(&pool, &[], &disasm, &code, false);
        let mut evaluator = SymbolicEvaluator::new(&pool);
        let arena = evaluator.arena_mut();
        let cond = arena.push(Operation::Compare {
            kind: crate::operation::CompareKind::IntZero,
            cmp: crate::operation::Comparison::Gt,
            lhs: OperationId(0),
            rhs: OperationId(0),
        });
        let a = arena.push(Operation::Constant(crate::operation::Literal::Int(1)));
        let b = arena.push(Operation::Constant(crate::operation::Literal::Int(0)));
        let mut statements = vec![
            Statement::If { condition: cond, then_branch: scope_with(vec![Statement::Return(Some(a))]), else_branch: None },
            Statement::Return(Some(b)),
        ];
        r.collapse_trailing_diverging_if(&mut evaluator, &mut statements);
        match statements.as_slice() {
            [Statement::Return(Some(id))] => {
                assert!(matches!(evaluator.arena().get(*id), Operation::Ternary { if_true, if_false, .. } if *if_true == a && *if_false == b));
            }
            other => panic!("expected a single fused return, got {other:?}"),
        }
    }

    #[test]
    fn collapse_trailing_diverging_if_leaves_a_non_ternary_pair_untouched() {
        let pool = empty_pool();
        let disasm = trivial_disasm();
        let code = trivial_code();
        let r = ControlFlowReconstructor::new(&pool, &[], &disasm, &code, false);
        let mut evaluator = SymbolicEvaluator::new(&pool);
        let arena = evaluator.arena_mut();
        let cond = arena.push(Operation::Compare {
            kind: crate::operation::CompareKind::IntZero,
            cmp: crate::operation::Comparison::Gt,
            lhs: OperationId(0),
            rhs: OperationId(0),
        });
        let a = arena.push(Operation::Constant(crate::operation::Literal::Int(1)));
        let mut statements = vec![
            Statement::If { condition: cond, then_branch: scope_with(vec![Statement::Return(Some(a))]), else_branch: None },
            Statement::Break(None),
        ];
        let before = statements.clone();
        r.collapse_trailing_diverging_if(&mut evaluator, &mut statements);
        assert_eq!(statements, before);
    }

    fn scope_with(statements: Vec<Statement>) -> Scope {
        let mut scope = Scope::new(ScopeKind::Block);
        scope.statements = statements;
        scope
    }

    /// Builds the `Compare`/`FieldRead`/`New`/`Throw` chain for
    /// `getstatic $assertionsDisabled; ifne END; <cond>; ifne END; new
    /// AssertionError(msg); athrow;` already negated the way `build_if`
    /// negates it, i.e. as it would sit in `then_branch` by the time
    /// `assertion_collapse` runs.
    fn guarded_throw_fixture(evaluator: &mut SymbolicEvaluator, exception_class: &str, message: Option<&str>) -> (OperationId, Scope) {
        let arena = evaluator.arena_mut();
        let guard_field = arena.push(Operation::FieldRead {
            owner: Type::class(QualifiedName::parse("com/example/Foo")),
            name: "$assertionsDisabled".to_string(),
            ty: Type::Primitive(Primitive::Boolean),
            receiver: None,
        });
        let outer_condition = arena.push(Operation::Compare {
            kind: crate::operation::CompareKind::IntZero,
            cmp: crate::operation::Comparison::Eq,
            lhs: guard_field,
            rhs: guard_field,
        });
        let user_cond = arena.push(Operation::Constant(crate::operation::Literal::AmbiguousInt(1)));
        let inner_condition = arena.push(Operation::Unary { negate: true, operand: user_cond, ty: Type::Primitive(Primitive::Boolean) });
        let args = message
            .map(|m| vec![arena.push(Operation::Constant(crate::operation::Literal::String(m.to_string())))])
            .unwrap_or_default();
        let new_exception =
            arena.push(Operation::New { ty: Type::class(QualifiedName::parse(exception_class)), ctor_descriptor: String::new(), args });
        let mut inner_then = Scope::new(ScopeKind::If);
        inner_then.push(Statement::Throw(new_exception));
        let mut then_branch = Scope::new(ScopeKind::If);
        then_branch.push(Statement::If { condition: inner_condition, then_branch: inner_then, else_branch: None });
        (outer_condition, then_branch)
    }

    #[test]
    fn assertion_collapse_fuses_guarded_throw_into_assert() {
        let pool = empty_pool();
        let disasm = trivial_disasm();
        let code = trivial_code();
        let r = ControlFlowReconstructor::new(&pool, &[], &disasm, &code, true);
        let mut evaluator = SymbolicEvaluator::new(&pool);
        let (outer_condition, then_branch) = guarded_throw_fixture(&mut evaluator, "java/lang/AssertionError", Some("bad state"));
        let result = r.assertion_collapse(&mut evaluator, outer_condition, &then_branch);
        match result {
            Some(Statement::Assert { message: Some(_), .. }) => {}
            other => panic!("expected an Assert statement with a message, got {other:?}"),
        }
    }

    #[test]
    fn assertion_collapse_requires_the_class_level_flag() {
        let pool = empty_pool();
        let disasm = trivial_disasm();
        let code = trivial_code();
        let r = ControlFlowReconstructor::new(&pool, &[], &disasm, &code, false);
        let mut evaluator = SymbolicEvaluator::new(&pool);
        let (outer_condition, then_branch) = guarded_throw_fixture(&mut evaluator, "java/lang/AssertionError", None);
        assert!(r.assertion_collapse(&mut evaluator, outer_condition, &then_branch).is_none());
    }

    #[test]
    fn assertion_collapse_ignores_non_assertion_error_throws() {
        let pool = empty_pool();
        let disasm = trivial_disasm();
        let code = trivial_code();
        let r = ControlFlowReconstructor::new(&pool, &[], &disasm, &code, true);
        let mut evaluator = SymbolicEvaluator::new(&pool);
        let (outer_condition, then_branch) = guarded_throw_fixture(&mut evaluator, "java/lang/IllegalStateException", None);
        assert!(r.assertion_collapse(&mut evaluator, outer_condition, &then_branch).is_none());
    }
}
