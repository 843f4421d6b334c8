//! Java source rendering (§4.9).
//!
//! Grounded on the tree-walk in `angelscript-compiler/src/passes/
//! compilation.rs`, repurposed from bytecode emission to Java source text
//! emission: the teacher walks a checked AST once, per function, emitting
//! one bytecode chunk per node; this walks a reconstructed [`Scope`] tree
//! once, per method, emitting one line group per [`Statement`].

use std::fmt::Write as _;

use rustc_hash::FxHashMap;

use jclass_core::access::{FieldAccess, MethodAccess};
use jclass_core::class_file::{ClassFile, FieldInfo, MethodInfo};
use jclass_core::pos::Pos;
use jclass_core::types::{Primitive, RefType, Type};
use jclass_parser::disassembler::disassemble;
use jclass_registry::ClassRegistry;

use crate::config::{Config, ConstantMode, HexMode};
use crate::control_flow::ControlFlowReconstructor;
use crate::field_init::FieldInitializers;
use crate::operation::{AssignTarget, BinaryOp, Comparison, CompareKind, Literal, Operation, OperationArena, OperationId};
use crate::scope::{CatchClause, Label, Scope, ScopeChain, Statement, SwitchCase};

/// One method's recovered body, paired with the arena it was built
/// against — every [`OperationId`] inside `scope` indexes into `arena`.
pub struct MethodBody {
    pub scope: Scope,
    pub arena: OperationArena,
}

/// Tracks which short class names have been claimed so far, to decide
/// between `Foo` and `com.example.Foo` at every reference site (§4.9
/// `addImport`).
#[derive(Default)]
struct ImportTracker {
    /// Short name -> the first internal name that claimed it.
    claimed: FxHashMap<String, String>,
}

impl ImportTracker {
    /// Register a reference to `internal_name`; returns `true` if its
    /// short name is (still) unique, `false` if a different class
    /// already claimed that short name and every reference to it must be
    /// fully qualified from here on.
    fn add(&mut self, internal_name: &str) -> bool {
        let short = internal_name.rsplit('/').next().unwrap_or(internal_name).to_string();
        match self.claimed.get(&short) {
            Some(existing) if existing == internal_name => true,
            Some(_) => false,
            None => {
                self.claimed.insert(short, internal_name.to_string());
                true
            }
        }
    }

    fn imports(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .claimed
            .values()
            .filter(|n| n.contains('/') && *n != "java/lang/Object")
            .map(|n| n.replace('/', "."))
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

pub struct Renderer<'a> {
    config: &'a Config,
    imports: ImportTracker,
    /// Internal name of the class currently being rendered, so an
    /// `<init>` call on `this` can be told apart as `this(...)` (same
    /// class) or `super(...)` (anywhere else) — set once per
    /// [`Renderer::render_class`] call.
    current_class: Option<String>,
    /// Loaded-class oracle for anonymous-class inlining (§4.8). `None`
    /// leaves a `new`'d numeric-simple-name class as the opaque
    /// synthetic reference it disassembles to.
    registry: Option<&'a ClassRegistry>,
}

impl<'a> Renderer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Renderer { config, imports: ImportTracker::default(), current_class: None, registry: None }
    }

    /// Wires a [`ClassRegistry`] in, so a `new`'d anonymous class (§4.8
    /// "Anonymous classes") renders its body inline instead of as a bare
    /// synthetic-name constructor call.
    pub fn with_registry(mut self, registry: &'a ClassRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Render a full class: package-relative header, collected imports,
    /// field declarations (with recovered initializers), and method
    /// bodies.
    pub fn render_class(
        &mut self,
        class: &ClassFile,
        field_inits: &FieldInitializers,
        field_init_arena: Option<&OperationArena>,
        methods: &FxHashMap<String, MethodBody>,
    ) -> String {
        let mut out = String::new();

        // First pass: walk every field/method type reference so imports
        // are fully known before the header prints them (two-phase,
        // mirroring §5's read-all-then-render-all discipline).
        for field in &class.fields {
            self.touch_type(&field.descriptor);
        }
        for method in &class.methods {
            for p in &method.descriptor.parameters {
                self.touch_type(p);
            }
            self.touch_type(&method.descriptor.return_type);
        }

        self.current_class = Some(class.this_class.internal().to_string());
        let unit = self.config.indent.unit();
        let short_name = class.this_class.simple_name();

        for import in self.imports.imports() {
            let _ = writeln!(out, "import {import};");
        }
        if !out.is_empty() {
            out.push('\n');
        }

        let is_enum = class.access_flags.contains(jclass_core::access::ClassAccess::ENUM);
        let modifiers = class_modifiers(class);
        let kind = if class.access_flags.contains(jclass_core::access::ClassAccess::INTERFACE) {
            "interface"
        } else if is_enum {
            "enum"
        } else {
            "class"
        };
        let extends = class
            .super_class
            .as_ref()
            .filter(|s| s.internal() != "java/lang/Object")
            .map(|s| format!(" extends {}", self.qualified_ref(s.internal())));
        let implements = if class.interfaces.is_empty() {
            String::new()
        } else {
            let names: Vec<String> = class.interfaces.iter().map(|i| self.qualified_ref(i.internal())).collect();
            format!(" implements {}", names.join(", "))
        };

        let _ = writeln!(out, "{modifiers}{kind} {short_name}{}{implements} {{", extends.unwrap_or_default());

        if is_enum {
            if let Some(arena) = field_init_arena {
                let no_locals = ScopeChain::new(Vec::new());
                if let Some(line) = self.render_enum_constants(class, field_inits, arena, &no_locals) {
                    let _ = writeln!(out, "{unit}{line}");
                }
            }
        }

        for field in &class.fields {
            if is_hidden_field(field) || (is_enum && field.is_enum_constant()) {
                continue;
            }
            let initializer = field_inits.get(&field.name).zip(field_init_arena);
            let no_locals = ScopeChain::new(Vec::new());
            let line = self.render_field(field, initializer, &no_locals);
            let _ = writeln!(out, "{unit}{line}");
        }

        for method in &class.methods {
            if is_hidden_method(method, is_enum) {
                continue;
            }
            let key = format!("{}{}", method.name, method.raw_descriptor);
            let body = methods.get(&key);
            for line in self.render_method(method, body, is_enum, short_name) {
                let _ = writeln!(out, "{unit}{line}");
            }
        }

        out.push_str("}\n");
        out
    }

    /// `RED(255, 0, 0), GREEN(0, 255, 0), BLUE(0, 0, 255);` — the
    /// `ENUM`-flagged fields' `<clinit>` initializers, in declaration
    /// order, with the compiler-inserted name/ordinal arguments every
    /// enum constant's constructor call carries dropped (§4.8 "Enums").
    fn render_enum_constants(
        &mut self,
        class: &ClassFile,
        field_inits: &FieldInitializers,
        arena: &OperationArena,
        chain: &ScopeChain,
    ) -> Option<String> {
        let constants: Vec<String> = class
            .fields
            .iter()
            .filter(|f| f.is_enum_constant())
            .filter_map(|f| {
                let id = field_inits.get(&f.name)?;
                let Operation::New { args, .. } = arena.get(*id) else { return None };
                let extra = if args.len() >= 2 { &args[2..] } else { &args[..] };
                if extra.is_empty() {
                    Some(f.name.clone())
                } else {
                    let args_str = extra.iter().map(|a| self.render_operation(arena, *a, chain, 0)).collect::<Vec<_>>().join(", ");
                    Some(format!("{}({args_str})", f.name))
                }
            })
            .collect();
        if constants.is_empty() { None } else { Some(format!("{};", constants.join(", "))) }
    }

    fn render_field(&mut self, field: &FieldInfo, initializer: Option<(&OperationId, &OperationArena)>, chain: &ScopeChain) -> String {
        let modifiers = field_modifiers(field);
        let ty = self.type_name(&field.descriptor);
        let mut line = format!("{modifiers}{ty} {}", field.name);
        if let Some((id, arena)) = initializer {
            let _ = write!(line, " = {}", self.render_operation(arena, *id, chain, 0));
        }
        line.push(';');
        if field.is_deprecated() {
            line = format!("@Deprecated {line}");
        }
        line
    }

    fn render_method(&mut self, method: &MethodInfo, body: Option<&MethodBody>, is_enum: bool, class_short_name: &str) -> Vec<String> {
        let mut lines = Vec::new();
        let modifiers = method_modifiers(method);
        // `javac` prepends `(String name, int ordinal)` to every enum
        // constructor's descriptor; those two are never written at the
        // source level, so they're dropped from the rendered signature.
        let skip_params = if is_enum && method.is_constructor() { 2 } else { 0 };
        let params: Vec<String> = method
            .descriptor
            .parameters
            .iter()
            .enumerate()
            .skip(skip_params)
            .map(|(i, ty)| {
                let ty_name = self.type_name(ty);
                let name = body
                    .and_then(|b| b.scope.variable(parameter_slot(method, i) as u16))
                    .map(|v| v.preferred_raw_name())
                    .unwrap_or_else(|| format!("arg{i}"));
                format!("{ty_name} {name}")
            })
            .collect();

        let header = if method.is_constructor() {
            format!("{modifiers}{class_short_name}({})", params.join(", "))
        } else if method.is_static_initializer() {
            "static".to_string()
        } else {
            let ret = self.type_name(&method.descriptor.return_type);
            format!("{modifiers}{ret} {}({})", method.name, params.join(", "))
        };

        let throws = method.throws();
        let header = if throws.is_empty() {
            header
        } else {
            let names: Vec<String> = throws.iter().map(|t| self.qualified_ref(t)).collect();
            format!("{header} throws {}", names.join(", "))
        };

        if method.is_abstract() || method.is_native() {
            lines.push(format!("{header};"));
            return lines;
        }

        lines.push(format!("{header} {{"));
        match body {
            Some(b) => {
                let statements: &[Statement] = if is_enum && method.is_constructor() && starts_with_implicit_super_call(&b.arena, &b.scope.statements, self.current_class.as_deref()) {
                    &b.scope.statements[1..]
                } else {
                    &b.scope.statements
                };
                let chain = ScopeChain::new(vec![&b.scope]);
                lines.extend(indent_all(self.render_statements(&b.arena, &chain, statements)))
            }
            None => lines.push(indent_one("// no Code attribute".to_string())),
        }
        lines.push("}".to_string());
        lines
    }

    fn render_scope(&mut self, arena: &OperationArena, chain: &ScopeChain, scope: &Scope) -> Vec<String> {
        let inner = chain.child(scope);
        self.render_statements(arena, &inner, &scope.statements)
    }

    fn render_statements(&mut self, arena: &OperationArena, chain: &ScopeChain, statements: &[Statement]) -> Vec<String> {
        statements.iter().flat_map(|s| self.render_statement(arena, chain, s)).collect()
    }

    fn render_statement(&mut self, arena: &OperationArena, chain: &ScopeChain, statement: &Statement) -> Vec<String> {
        match statement {
            Statement::Expression(id) => vec![format!("{};", self.render_operation(arena, *id, chain, 0))],
            Statement::VarDecl { slot, initializer } => {
                let ty = chain.find(*slot).map(|v| self.type_name(&v.inferred_type)).unwrap_or_else(|| "Object".to_string());
                let name = variable_name(chain, *slot);
                match initializer {
                    Some(id) => vec![format!("{ty} {name} = {};", self.render_operation(arena, *id, chain, 0))],
                    None => vec![format!("{ty} {name};")],
                }
            }
            Statement::Return(None) => vec!["return;".to_string()],
            Statement::Return(Some(id)) => vec![format!("return {};", self.render_operation(arena, *id, chain, 0))],
            Statement::Throw(id) => vec![format!("throw {};", self.render_operation(arena, *id, chain, 0))],
            Statement::Break(label) => vec![format!("break{};", label_suffix(label))],
            Statement::Continue(label) => vec![format!("continue{};", label_suffix(label))],
            Statement::FailedRegion(msg) => vec![format!("// Exception while decompiling method: {msg}")],
            Statement::If { condition, then_branch, else_branch } => {
                let mut lines = vec![format!("if ({}) {{", self.render_operation(arena, *condition, chain, 0))];
                lines.extend(indent_all(self.render_scope(arena, chain, then_branch)));
                match else_branch {
                    Some(else_scope) => {
                        lines.push("} else {".to_string());
                        lines.extend(indent_all(self.render_scope(arena, chain, else_scope)));
                        lines.push("}".to_string());
                    }
                    None => lines.push("}".to_string()),
                }
                lines
            }
            Statement::While { condition, body, label } => {
                let mut lines = Vec::new();
                if let Some(l) = label {
                    lines.push(format!("{}:", l.0));
                }
                lines.push(format!("while ({}) {{", self.render_operation(arena, *condition, chain, 0)));
                lines.extend(indent_all(self.render_scope(arena, chain, body)));
                lines.push("}".to_string());
                lines
            }
            Statement::For { init, condition, step, body, label } => {
                let init_str = init
                    .iter()
                    .flat_map(|s| self.render_statement(arena, chain, s))
                    .collect::<Vec<_>>()
                    .join(" ")
                    .trim_end_matches(';')
                    .to_string();
                let cond_str = condition.map(|c| self.render_operation(arena, c, chain, 0)).unwrap_or_default();
                let step_str = step.iter().map(|s| self.render_operation(arena, *s, chain, 0)).collect::<Vec<_>>().join(", ");
                let mut lines = Vec::new();
                if let Some(l) = label {
                    lines.push(format!("{}:", l.0));
                }
                lines.push(format!("for ({init_str}; {cond_str}; {step_str}) {{"));
                lines.extend(indent_all(self.render_scope(arena, chain, body)));
                lines.push("}".to_string());
                lines
            }
            Statement::Switch { selector, cases, label } => {
                let mut lines = Vec::new();
                if let Some(l) = label {
                    lines.push(format!("{}:", l.0));
                }
                lines.push(format!("switch ({}) {{", self.render_operation(arena, *selector, chain, 0)));
                for case in cases {
                    lines.extend(indent_all(self.render_case(arena, chain, case)));
                }
                lines.push("}".to_string());
                lines
            }
            Statement::Assert { condition, message } => match message {
                None => vec![format!("assert {};", self.render_operation(arena, *condition, chain, 0))],
                Some(msg) => vec![format!(
                    "assert {} : {};",
                    self.render_operation(arena, *condition, chain, 0),
                    self.render_operation(arena, *msg, chain, 0)
                )],
            },
            Statement::Try { body, catches } => {
                let mut lines = vec!["try {".to_string()];
                lines.extend(indent_all(self.render_scope(arena, chain, body)));
                for catch in catches {
                    lines.push(format!("}} {} {{", self.render_catch_header(catch)));
                    lines.extend(indent_all(self.render_scope(arena, chain, &catch.body)));
                }
                lines.push("}".to_string());
                lines
            }
        }
    }

    fn render_case(&mut self, arena: &OperationArena, chain: &ScopeChain, case: &SwitchCase) -> Vec<String> {
        let mut lines = Vec::new();
        if case.labels.is_empty() {
            lines.push("default:".to_string());
        } else {
            for label in &case.labels {
                lines.push(format!("case {label}:"));
            }
        }
        lines.extend(indent_all(self.render_scope(arena, chain, &case.body)));
        if !case.falls_through {
            lines.push("break;".to_string());
        }
        lines
    }

    fn render_catch_header(&mut self, catch: &CatchClause) -> String {
        let types: Vec<String> = catch.exception_types.iter().map(|t| self.type_name(t)).collect();
        let name = catch.body.variable(catch.exception_slot).map(|v| v.preferred_raw_name()).unwrap_or_else(|| "ex".to_string());
        format!("catch ({} {name})", types.join(" | "))
    }

    pub fn render_operation(&mut self, arena: &OperationArena, id: OperationId, chain: &ScopeChain, parent_priority: u8) -> String {
        let op = arena.get(id);
        let rendered = match op {
            Operation::Constant(lit) => self.render_literal(lit),
            Operation::LocalRead { slot } => variable_name(chain, *slot),
            Operation::This => "this".to_string(),
            Operation::Binary { op, lhs, rhs, .. } => {
                let l = self.render_operation(arena, *lhs, chain, op.priority());
                let r = self.render_operation(arena, *rhs, chain, op.priority());
                format!("{l} {} {r}", binary_symbol(op))
            }
            Operation::Unary { negate, operand, .. } => {
                let inner = self.render_operation(arena, *operand, chain, 1);
                if *negate { format!("-{inner}") } else { format!("~{inner}") }
            }
            Operation::Compare { kind, cmp, lhs, rhs } => self.render_compare(arena, chain, *kind, *cmp, *lhs, *rhs),
            Operation::Cast { target, operand, implicit } => {
                let inner = self.render_operation(arena, *operand, chain, 1);
                if *implicit { inner } else { format!("({}) {inner}", self.type_name(target)) }
            }
            Operation::FieldRead { name, receiver, .. } => match receiver {
                Some(r) => format!("{}.{name}", self.render_operation(arena, *r, chain, 0)),
                None => name.clone(),
            },
            Operation::Call { name, receiver, args, owner, is_static, .. } => {
                let args_str = args.iter().map(|a| self.render_operation(arena, *a, chain, 0)).collect::<Vec<_>>().join(", ");
                let calls_init_on_this = name == "<init>" && matches!(receiver, Some(r) if matches!(arena.get(*r), Operation::This));
                if calls_init_on_this {
                    if owner_internal_name(owner) == self.current_class.as_deref() {
                        format!("this({args_str})")
                    } else {
                        format!("super({args_str})")
                    }
                } else {
                    match receiver {
                        Some(r) => format!("{}.{name}({args_str})", self.render_operation(arena, *r, chain, 0)),
                        None if *is_static => format!("{}.{name}({args_str})", self.type_name(owner)),
                        None => format!("{name}({args_str})"),
                    }
                }
            }
            Operation::New { ty, args, .. } => {
                let args_str = args.iter().map(|a| self.render_operation(arena, *a, chain, 0)).collect::<Vec<_>>().join(", ");
                match self.anonymous_class_body(ty) {
                    Some((super_name, body)) if body.is_empty() => format!("new {super_name}({args_str}) {{}}"),
                    Some((super_name, body)) => format!("new {super_name}({args_str}) {{\n{body}\n}}"),
                    None => format!("new {}({args_str})", self.type_name(ty)),
                }
            }
            Operation::NewArray { element, dimensions, inline_initializer } => {
                let ty = self.type_name(element);
                match inline_initializer {
                    Some(values) if self.config.short_array_init => {
                        let items = values.iter().map(|v| self.render_operation(arena, *v, chain, 0)).collect::<Vec<_>>().join(", ");
                        format!("new {ty}[]{{{items}}}")
                    }
                    _ => {
                        let dims = dimensions.iter().map(|d| format!("[{}]", self.render_operation(arena, *d, chain, 0))).collect::<Vec<_>>().join("");
                        format!("new {ty}{dims}")
                    }
                }
            }
            Operation::ArrayLoad { array, index, .. } => {
                format!("{}[{}]", self.render_operation(arena, *array, chain, 0), self.render_operation(arena, *index, chain, 0))
            }
            Operation::ArrayLength { array } => format!("{}.length", self.render_operation(arena, *array, chain, 0)),
            Operation::InstanceOf { operand, target } => {
                format!("{} instanceof {}", self.render_operation(arena, *operand, chain, 1), self.type_name(target))
            }
            Operation::StringConcat { parts } => {
                parts.iter().map(|p| self.render_operation(arena, *p, chain, BinaryOp::Add.priority())).collect::<Vec<_>>().join(" + ")
            }
            Operation::Ternary { condition, if_true, if_false, .. } => self.render_ternary(arena, chain, *condition, *if_true, *if_false),
            Operation::Assign { target, value, .. } => {
                let value_str = self.render_operation(arena, *value, chain, 9);
                match target {
                    AssignTarget::Local(slot) => format!("{} = {value_str}", variable_name(chain, *slot)),
                    AssignTarget::Field { name, receiver: Some(r), .. } => {
                        format!("{}.{name} = {value_str}", self.render_operation(arena, *r, chain, 0))
                    }
                    AssignTarget::Field { name, receiver: None, .. } => format!("{name} = {value_str}"),
                    AssignTarget::ArrayElement { array, index } => {
                        format!(
                            "{}[{}] = {value_str}",
                            self.render_operation(arena, *array, chain, 0),
                            self.render_operation(arena, *index, chain, 0)
                        )
                    }
                }
            }
        };

        if op.priority() > parent_priority && parent_priority != 0 {
            format!("({rendered})")
        } else {
            rendered
        }
    }

    fn render_compare(&mut self, arena: &OperationArena, chain: &ScopeChain, kind: CompareKind, cmp: Comparison, lhs: OperationId, rhs: OperationId) -> String {
        let l = self.render_operation(arena, lhs, chain, 8);
        match (kind, cmp) {
            (CompareKind::IntZero, Comparison::Ne) => l,
            (CompareKind::IntZero, Comparison::Eq) => format!("!{l}"),
            (CompareKind::RefNull, Comparison::Eq) => format!("{l} == null"),
            (CompareKind::RefNull, Comparison::Ne) => format!("{l} != null"),
            _ => {
                let r = self.render_operation(arena, rhs, chain, 8);
                format!("{l} {} {r}", comparison_symbol(cmp))
            }
        }
    }

    /// `cond ? a : b`, collapsing to the bare (possibly negated)
    /// condition when both arms are the integer literals `1`/`0` — a
    /// boolean-valued comparison re-boxed through a ternary by `javac`
    /// is just the condition itself (§4.8 "If with else").
    fn render_ternary(&mut self, arena: &OperationArena, chain: &ScopeChain, condition: OperationId, if_true: OperationId, if_false: OperationId) -> String {
        match (int_literal(arena, if_true), int_literal(arena, if_false)) {
            (Some(1), Some(0)) => self.render_operation(arena, condition, chain, 0),
            (Some(0), Some(1)) => format!("!{}", self.render_operation(arena, condition, chain, 1)),
            _ => {
                let cond = self.render_operation(arena, condition, chain, 8);
                let a = self.render_operation(arena, if_true, chain, 8);
                let b = self.render_operation(arena, if_false, chain, 8);
                format!("{cond} ? {a} : {b}")
            }
        }
    }

    fn render_literal(&mut self, lit: &Literal) -> String {
        match lit {
            Literal::Int(v) => self.render_int(*v as i64, Primitive::Int),
            Literal::AmbiguousInt(v) => self.render_int(*v, Primitive::Int),
            Literal::Long(v) => format!("{}L", self.render_int(*v, Primitive::Long)),
            Literal::Float(v) => format!("{}F", render_float(*v as f64, self.config.use_constants)),
            Literal::Double(v) => render_float(*v, self.config.use_constants),
            Literal::String(s) => format!("\"{}\"", escape_java_string(s)),
            Literal::Null => "null".to_string(),
            Literal::Class(ty) => format!("{}.class", self.type_name(ty)),
        }
    }

    fn render_int(&self, v: i64, _prim: Primitive) -> String {
        match self.config.hex {
            HexMode::Always => format!("{v:#x}"),
            HexMode::Never => format!("{v}"),
            HexMode::Auto => {
                if v.unsigned_abs() > 0xFFFF {
                    format!("{v:#x}")
                } else {
                    format!("{v}")
                }
            }
        }
    }

    fn touch_type(&mut self, ty: &Type) {
        match ty {
            Type::Reference(RefType::Class { name, .. }) => {
                self.imports.add(name.internal());
            }
            Type::Reference(RefType::Array { element, .. }) => self.touch_type(element),
            _ => {}
        }
    }

    fn qualified_ref(&mut self, internal_name: &str) -> String {
        if self.imports.add(internal_name) {
            internal_name.rsplit('/').next().unwrap_or(internal_name).to_string()
        } else {
            internal_name.replace('/', ".")
        }
    }

    fn type_name(&mut self, ty: &Type) -> String {
        match ty {
            Type::Primitive(p) => p.java_name().to_string(),
            Type::Reference(RefType::Class { name, .. }) => self.qualified_ref(name.internal()),
            Type::Reference(RefType::Array { element, nesting }) => {
                format!("{}{}", self.type_name(element), "[]".repeat(*nesting as usize + 1))
            }
            Type::Reference(RefType::TypeParameter(t)) => t.clone(),
            Type::AnyObject | Type::Any => "Object".to_string(),
            Type::Ambiguous(_) | Type::Excluding(_) => "int".to_string(),
        }
    }

    /// `new SuperOrIface() { <body> }` for a `new` targeting a numeric-
    /// simple-name class the registry has loaded (§4.8 "Anonymous
    /// classes"): `(super-or-interface name, rendered member lines)`, or
    /// `None` when `ty` isn't an anonymous class or the registry never
    /// saw it — the caller falls back to the opaque synthetic-name
    /// reference in that case.
    fn anonymous_class_body(&mut self, ty: &Type) -> Option<(String, String)> {
        let Type::Reference(RefType::Class { name, .. }) = ty else { return None };
        if !name.is_anonymous() {
            return None;
        }
        let anon = self.registry?.get(name.internal())?;

        let super_name = anon
            .super_class
            .as_ref()
            .filter(|s| s.internal() != "java/lang/Object")
            .or_else(|| anon.interfaces.first())
            .map(|q| q.internal().to_string())
            .map(|internal| self.qualified_ref(&internal))
            .unwrap_or_else(|| "Object".to_string());

        let mut lines = Vec::new();
        for method in &anon.methods {
            if method.is_constructor() || method.is_static_initializer() {
                continue;
            }
            let body = self.reconstruct_method_body(anon, method);
            lines.extend(self.render_method(method, body.as_ref(), false, name.simple_name()));
        }
        Some((super_name, indent_all(lines).join("\n")))
    }

    /// Runs the same disassemble-then-reconstruct pipeline
    /// `decompile_class` runs for a top-level method, for one method of
    /// an anonymous class pulled out of the registry mid-render. A
    /// failure renders as a missing body (`render_method`'s `// no Code
    /// attribute` fallback) rather than failing the whole enclosing
    /// method, matching §7's tolerant-mode spirit.
    fn reconstruct_method_body(&self, class: &ClassFile, method: &MethodInfo) -> Option<MethodBody> {
        let code = method.code()?;
        let disasm = disassemble(&code.code, Pos::new(0), &code.exception_table).ok()?;
        let has_assertions_disabled = class.fields.iter().any(|f| f.name == "$assertionsDisabled");
        let mut reconstructor = ControlFlowReconstructor::new(&class.pool, class.bootstrap_methods(), &disasm, code, has_assertions_disabled);
        if let Some(registry) = self.registry {
            reconstructor = reconstructor.with_registry(registry, self.config);
        }
        let (scope, arena) = reconstructor.reconstruct().ok()?;
        Some(MethodBody { scope, arena })
    }
}

/// `Some(v)` when `id` is a plain int literal (ambiguous or committed),
/// used to spot the `1`/`0` boolean-as-ternary idiom (§4.8).
fn int_literal(arena: &OperationArena, id: OperationId) -> Option<i64> {
    match arena.get(id) {
        Operation::Constant(Literal::Int(v)) => Some(*v as i64),
        Operation::Constant(Literal::AmbiguousInt(v)) => Some(*v),
        _ => None,
    }
}

fn binary_symbol(op: &BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Rem => "%",
        BinaryOp::Shl => "<<",
        BinaryOp::Shr => ">>",
        BinaryOp::Ushr => ">>>",
        BinaryOp::And => "&",
        BinaryOp::Or => "|",
        BinaryOp::Xor => "^",
    }
}

fn comparison_symbol(cmp: Comparison) -> &'static str {
    match cmp {
        Comparison::Eq => "==",
        Comparison::Ne => "!=",
        Comparison::Lt => "<",
        Comparison::Ge => ">=",
        Comparison::Gt => ">",
        Comparison::Le => "<=",
    }
}

fn label_suffix(label: &Option<Label>) -> String {
    match label {
        Some(l) => format!(" {}", l.0),
        None => String::new(),
    }
}

fn variable_name(chain: &ScopeChain, slot: u16) -> String {
    chain.find(slot).map(|v| v.preferred_raw_name()).unwrap_or_else(|| format!("local{slot}"))
}

fn indent_one(line: String) -> String {
    format!("    {line}")
}

fn indent_all(lines: Vec<String>) -> Vec<String> {
    lines.into_iter().map(indent_one).collect()
}

fn parameter_slot(method: &MethodInfo, index: usize) -> usize {
    let is_instance = !method.access_flags.contains(MethodAccess::STATIC);
    let mut slot = if is_instance { 1 } else { 0 };
    for p in method.descriptor.parameters.iter().take(index) {
        slot += p.slot_size() as usize;
    }
    slot
}

fn class_modifiers(class: &ClassFile) -> String {
    use jclass_core::access::ClassAccess;
    let mut m = Vec::new();
    if class.access_flags.contains(ClassAccess::PUBLIC) {
        m.push("public");
    }
    if class.access_flags.contains(ClassAccess::FINAL) {
        m.push("final");
    }
    if class.access_flags.contains(ClassAccess::ABSTRACT) && !class.access_flags.contains(ClassAccess::INTERFACE) {
        m.push("abstract");
    }
    if m.is_empty() { String::new() } else { format!("{} ", m.join(" ")) }
}

fn field_modifiers(field: &FieldInfo) -> String {
    let mut m = Vec::new();
    if field.access_flags.contains(FieldAccess::PUBLIC) {
        m.push("public");
    } else if field.access_flags.contains(FieldAccess::PRIVATE) {
        m.push("private");
    } else if field.access_flags.contains(FieldAccess::PROTECTED) {
        m.push("protected");
    }
    if field.access_flags.contains(FieldAccess::STATIC) {
        m.push("static");
    }
    if field.access_flags.contains(FieldAccess::FINAL) {
        m.push("final");
    }
    if field.access_flags.contains(FieldAccess::VOLATILE) {
        m.push("volatile");
    }
    if field.access_flags.contains(FieldAccess::TRANSIENT) {
        m.push("transient");
    }
    if m.is_empty() { String::new() } else { format!("{} ", m.join(" ")) }
}

fn method_modifiers(method: &MethodInfo) -> String {
    let mut m = Vec::new();
    if method.access_flags.contains(MethodAccess::PUBLIC) {
        m.push("public");
    } else if method.access_flags.contains(MethodAccess::PRIVATE) {
        m.push("private");
    } else if method.access_flags.contains(MethodAccess::PROTECTED) {
        m.push("protected");
    }
    if method.access_flags.contains(MethodAccess::STATIC) {
        m.push("static");
    }
    if method.access_flags.contains(MethodAccess::FINAL) {
        m.push("final");
    }
    if method.access_flags.contains(MethodAccess::ABSTRACT) {
        m.push("abstract");
    }
    if method.access_flags.contains(MethodAccess::SYNCHRONIZED) {
        m.push("synchronized");
    }
    if method.access_flags.contains(MethodAccess::NATIVE) {
        m.push("native");
    }
    if m.is_empty() { String::new() } else { format!("{} ", m.join(" ")) }
}

fn is_hidden_field(field: &FieldInfo) -> bool {
    field.is_synthetic() && field.name.starts_with("$")
}

fn is_hidden_method(method: &MethodInfo, is_enum: bool) -> bool {
    (method.is_synthetic() && (method.name == "values" || method.name == "valueOf"))
        || (is_enum && method.is_constructor() && method.raw_descriptor == "(Ljava/lang/String;I)V")
}

fn owner_internal_name(ty: &Type) -> Option<&str> {
    match ty {
        Type::Reference(RefType::Class { name, .. }) => Some(name.internal()),
        _ => None,
    }
}

/// Whether `statements` opens with the compiler-inserted
/// `super(name, ordinal)` every enum constant's constructor carries —
/// an `<init>` call on `this` whose owner is *not* the enum class itself
/// (ruling out a genuine source-level `this(...)` constructor chain,
/// which an enum constructor may still write).
fn starts_with_implicit_super_call(arena: &OperationArena, statements: &[Statement], current_class: Option<&str>) -> bool {
    let Some(Statement::Expression(id)) = statements.first() else { return false };
    let Operation::Call { name, receiver: Some(r), owner, .. } = arena.get(*id) else { return false };
    name == "<init>" && matches!(arena.get(*r), Operation::This) && owner_internal_name(owner) != current_class
}

/// Java modified-UTF-8-safe string escaping (§4.9): BMP characters stay
/// as UTF-8, control characters and the standard escapes use their short
/// form, and only supplementary-plane characters (those needing a UTF-16
/// surrogate pair) fall back to `\uXXXX`.
fn escape_java_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || (c as u32) == 0x7f => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c if (c as u32) > 0xffff => {
                for unit in c.encode_utf16(&mut [0u16; 2]) {
                    let _ = write!(out, "\\u{unit:04x}");
                }
            }
            c => out.push(c),
        }
    }
    out
}

fn render_float(v: f64, mode: ConstantMode) -> String {
    if v.is_nan() {
        return match mode {
            ConstantMode::Never => "(0.0/0.0)".to_string(),
            _ => "Float.NaN".to_string(),
        };
    }
    if v.is_infinite() {
        let sign = if v > 0.0 { "" } else { "-" };
        return match mode {
            ConstantMode::Never => format!("({sign}1.0/0.0)"),
            _ => format!("{sign}Float.POSITIVE_INFINITY").replace("-Float.POSITIVE_INFINITY", "Float.NEGATIVE_INFINITY"),
        };
    }
    if v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}
