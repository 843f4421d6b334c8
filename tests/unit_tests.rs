//! End-to-end scenarios driving the full `jclass_decompiler::decompile_class`
//! pipeline against hand-built `ClassFile` fixtures — disassembly, symbolic
//! evaluation, control-flow reconstruction, and rendering all run for real;
//! only the byte-level class-file parser is bypassed in favor of struct
//! literals, since every field on `ClassFile`/`FieldInfo`/`MethodInfo` is
//! already public.

use jclass_core::access::{ClassAccess, FieldAccess, MethodAccess};
use jclass_core::attributes::{Attribute, BootstrapMethod, Code, LocalVariableEntry};
use jclass_core::class_file::{ClassFile, FieldInfo, MethodInfo};
use jclass_core::pool::{Constant, ConstantPool, MethodHandleKind};
use jclass_core::qualified_name::QualifiedName;
use jclass_core::types::descriptor::parse_method_descriptor;
use jclass_decompiler::config::Config;

fn registry() -> jclass_registry::ClassRegistry {
    jclass_registry::ClassRegistry::new()
}

fn empty_pool() -> ConstantPool {
    ConstantPool::from_entries(vec![Constant::Unusable]).unwrap()
}

fn bare_class(name: &str) -> ClassFile {
    ClassFile {
        minor_version: 0,
        major_version: 61,
        access_flags: ClassAccess::PUBLIC,
        this_class: QualifiedName::parse(name.to_string()),
        super_class: Some(QualifiedName::parse("java/lang/Object".to_string())),
        interfaces: Vec::new(),
        fields: Vec::new(),
        methods: Vec::new(),
        attributes: Vec::new(),
        pool: empty_pool(),
    }
}

fn method(name: &str, descriptor: &str, access: MethodAccess, code: Code) -> MethodInfo {
    MethodInfo {
        access_flags: access,
        name: name.to_string(),
        raw_descriptor: descriptor.to_string(),
        descriptor: parse_method_descriptor(descriptor).unwrap(),
        attributes: vec![Attribute::Code(code)],
    }
}

fn local(name: &str, descriptor: &str, index: u16, start_pc: u16, length: u16) -> LocalVariableEntry {
    LocalVariableEntry {
        start_pc,
        length,
        name: name.to_string(),
        descriptor: descriptor.to_string(),
        index,
    }
}

/// Scenario 1: recover a ternary from a single guarded early-return.
///
/// `iload_1; iconst_0; if_icmple L1; iload_1; iconst_1; isub; ireturn;
/// L1: iconst_0; ireturn;` for `int f(int x)`.
#[test]
fn ternary_recovered_from_guarded_early_return() {
    let mut class = bare_class("Scenario1");
    let code = Code {
        max_stack: 2,
        max_locals: 2,
        code: vec![27, 3, 164, 0, 7, 27, 4, 100, 172, 3, 172],
        exception_table: Vec::new(),
        attributes: vec![Attribute::LocalVariableTable(vec![local("x", "I", 1, 0, 10)])],
    };
    class.methods.push(method("f", "(I)I", MethodAccess::PUBLIC, code));

    let source = jclass_decompiler::decompile_class(&class, &registry(), &Config::default()).unwrap();
    assert!(source.contains("int f(int x)"), "{source}");
    assert!(source.contains("return x > 0 ? x - 1 : 0;"), "{source}");
}

/// Scenario 2: `invokedynamic` against the string-concat factory splices
/// recipe literals and dynamic `int` arguments back into a `+` chain.
#[test]
fn string_concat_invokedynamic_recovered_as_plus_chain() {
    let entries = vec![
        Constant::Unusable,                                                                       // 0
        Constant::Utf8("Scenario2".to_string()),                                                   // 1
        Constant::Class { name_index: 1 },                                                         // 2
        Constant::Utf8("java/lang/invoke/StringConcatFactory".to_string()),                        // 3
        Constant::Class { name_index: 3 },                                                         // 4
        Constant::Utf8("makeConcatWithConstants".to_string()),                                     // 5
        Constant::Utf8("(II)Ljava/lang/String;".to_string()),                                      // 6
        Constant::NameAndType { name_index: 5, descriptor_index: 6 },                              // 7
        Constant::Methodref { class_index: 4, name_and_type_index: 7 },                            // 8
        Constant::MethodHandle { kind: MethodHandleKind::InvokeStatic, reference_index: 8 },        // 9
        Constant::Utf8("a=\u{1} b=\u{1}".to_string()),                                              // 10
        Constant::String { string_index: 10 },                                                     // 11
        Constant::InvokeDynamic { bootstrap_method_attr_index: 0, name_and_type_index: 7 },         // 12
    ];
    let pool = ConstantPool::from_entries(entries).unwrap();

    let mut class = bare_class("Scenario2");
    class.pool = pool;
    class.attributes.push(Attribute::BootstrapMethods(vec![BootstrapMethod { method_ref: 9, arguments: vec![11] }]));

    let code = Code {
        max_stack: 2,
        max_locals: 2,
        code: vec![26, 27, 186, 0, 12, 0, 0, 176],
        exception_table: Vec::new(),
        attributes: vec![Attribute::LocalVariableTable(vec![
            local("a", "I", 0, 0, 4),
            local("b", "I", 1, 0, 4),
        ])],
    };
    class.methods.push(method("concat", "(II)Ljava/lang/String;", MethodAccess::PUBLIC | MethodAccess::STATIC, code));

    let source = jclass_decompiler::decompile_class(&class, &registry(), &Config::default()).unwrap();
    assert!(source.contains("static String concat(int a, int b)"), "{source}");
    assert!(source.contains(r#"return "a=" + a + " b=" + b;"#), "{source}");
}

/// Scenario 6: the `javac` `$assertionsDisabled`-guarded throw is folded
/// back into a bare `assert`.
#[test]
fn assertions_disabled_guarded_throw_recovered_as_assert() {
    let entries = vec![
        Constant::Unusable,                                                  // 0
        Constant::Utf8("Scenario6".to_string()),                             // 1
        Constant::Class { name_index: 1 },                                   // 2
        Constant::Utf8("java/lang/AssertionError".to_string()),              // 3
        Constant::Class { name_index: 3 },                                   // 4
        Constant::Utf8("<init>".to_string()),                                // 5
        Constant::Utf8("()V".to_string()),                                   // 6
        Constant::NameAndType { name_index: 5, descriptor_index: 6 },        // 7
        Constant::Methodref { class_index: 4, name_and_type_index: 7 },      // 8
        Constant::Utf8("$assertionsDisabled".to_string()),                   // 9
        Constant::Utf8("Z".to_string()),                                     // 10
        Constant::NameAndType { name_index: 9, descriptor_index: 10 },       // 11
        Constant::Fieldref { class_index: 2, name_and_type_index: 11 },      // 12
    ];
    let pool = ConstantPool::from_entries(entries).unwrap();

    let mut class = bare_class("Scenario6");
    class.pool = pool;
    class.fields.push(FieldInfo {
        access_flags: FieldAccess::STATIC | FieldAccess::FINAL | FieldAccess::SYNTHETIC,
        name: "$assertionsDisabled".to_string(),
        descriptor: jclass_core::types::Type::Primitive(jclass_core::types::Primitive::Boolean),
        attributes: Vec::new(),
    });

    let code = Code {
        max_stack: 2,
        max_locals: 2,
        code: vec![178, 0, 12, 154, 0, 15, 27, 154, 0, 11, 187, 0, 4, 89, 183, 0, 8, 191, 177],
        exception_table: Vec::new(),
        attributes: vec![Attribute::LocalVariableTable(vec![local("ok", "Z", 1, 0, 10)])],
    };
    class.methods.push(method("check", "(Z)V", MethodAccess::PUBLIC, code));

    let source = jclass_decompiler::decompile_class(&class, &registry(), &Config::default()).unwrap();
    assert!(source.contains("void check(boolean ok)"), "{source}");
    assert!(source.contains("assert ok;"), "{source}");
    assert!(!source.contains("$assertionsDisabled"), "{source}");
}

/// §8 Invariants: "Determinism" — re-running the pipeline on the same
/// input yields byte-identical output.
#[test]
fn decompiling_the_same_class_twice_is_deterministic() {
    let mut class = bare_class("Scenario1Again");
    let code = Code {
        max_stack: 2,
        max_locals: 2,
        code: vec![27, 3, 164, 0, 7, 27, 4, 100, 172, 3, 172],
        exception_table: Vec::new(),
        attributes: vec![Attribute::LocalVariableTable(vec![local("x", "I", 1, 0, 10)])],
    };
    class.methods.push(method("f", "(I)I", MethodAccess::PUBLIC, code));

    let config = Config::default();
    let reg = registry();
    let first = jclass_decompiler::decompile_class(&class, &reg, &config).unwrap();
    let second = jclass_decompiler::decompile_class(&class, &reg, &config).unwrap();
    assert_eq!(first, second);
}

/// §8 Invariants: "Pool round-trip" — a `ConstantPool` built from a given
/// entry list resolves every index back to the entry it was given.
#[test]
fn constant_pool_round_trips_every_entry() {
    let entries = vec![
        Constant::Unusable,
        Constant::Utf8("hello".to_string()),
        Constant::Integer(42),
    ];
    let pool = ConstantPool::from_entries(entries).unwrap();
    assert_eq!(pool.utf8(1).unwrap(), "hello");
    assert_eq!(pool.integer(2).unwrap(), 42);
}

/// Scenario 4: two exception-table rows sharing one `(start_pc, end_pc,
/// handler_pc)` triple collapse into a single `catch (A | B ex)` clause.
///
/// `nop; goto +4; astore_2; return` for `void m()`, with the `nop`
/// covered by a try range whose handler (at the `astore_2`) is listed
/// once for `IOException` and once for `SQLException`.
#[test]
fn multi_catch_exception_rows_collapse_to_one_clause() {
    let mut class = bare_class("Scenario4");
    let code = Code {
        max_stack: 1,
        max_locals: 3,
        code: vec![0, 167, 0, 4, 77, 177],
        exception_table: vec![
            jclass_core::attributes::ExceptionTableEntry {
                start_pc: 0,
                end_pc: 1,
                handler_pc: 4,
                catch_type: Some("java/io/IOException".to_string()),
            },
            jclass_core::attributes::ExceptionTableEntry {
                start_pc: 0,
                end_pc: 1,
                handler_pc: 4,
                catch_type: Some("java/sql/SQLException".to_string()),
            },
        ],
        attributes: Vec::new(),
    };
    class.methods.push(method("m", "()V", MethodAccess::PUBLIC | MethodAccess::STATIC, code));

    let source = jclass_decompiler::decompile_class(&class, &registry(), &Config::default()).unwrap();
    assert!(source.contains("void m()"), "{source}");
    assert!(source.contains("try {"), "{source}");
    assert!(source.contains("catch (IOException | SQLException ex)"), "{source}");
}

/// Scenario 5: a trailing `i = i + 1` inside an otherwise-unguarded
/// infinite loop promotes to a `for` loop's step clause, with `i`
/// flagged as the loop counter rather than left as a plain assignment.
///
/// `iconst_0; istore_1; L: iinc 1,1; goto L` for `static void m()`.
#[test]
fn trailing_increment_promotes_loop_to_for() {
    let mut class = bare_class("Scenario5");
    let code = Code {
        max_stack: 2,
        max_locals: 2,
        code: vec![3, 60, 132, 1, 1, 167, 255, 253],
        exception_table: Vec::new(),
        attributes: vec![Attribute::LocalVariableTable(vec![local("i", "I", 1, 0, 8)])],
    };
    class.methods.push(method("m", "()V", MethodAccess::PUBLIC | MethodAccess::STATIC, code));

    let source = jclass_decompiler::decompile_class(&class, &registry(), &Config::default()).unwrap();
    assert!(source.contains("void m()"), "{source}");
    assert!(source.contains("for (; ; i = i + 1) {"), "{source}");
    assert!(!source.contains("while"), "{source}");
}

/// A body containing a byte that isn't a legal JVM opcode surfaces as a
/// `DecompileError::Format` rather than a panic — this check runs ahead
/// of reconstruction, so it's unconditional regardless of
/// `fail_on_error`.
#[test]
fn illegal_opcode_surfaces_as_a_format_error() {
    let mut class = bare_class("Scenario1Broken");
    let code = Code {
        max_stack: 1,
        max_locals: 1,
        code: vec![0xCA],
        exception_table: Vec::new(),
        attributes: Vec::new(),
    };
    class.methods.push(method("f", "()V", MethodAccess::PUBLIC, code));

    let err = jclass_decompiler::decompile_class(&class, &registry(), &Config::default()).unwrap_err();
    assert!(matches!(err, jclass_core::error::DecompileError::Format { .. }));
}
