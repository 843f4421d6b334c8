//! Performance benchmarks for the decompilation pipeline.
//!
//! Grounded on the teacher's `benches/parser_benchmarks.rs` shape (size
//! tiers, feature-specific cases, a complexity tier) but fixtures are
//! built programmatically rather than loaded from `include_str!`'d
//! scripts, since a `.class` file is binary and there's no source text
//! to check in: `ClassFile`'s fields are all `pub`, so a fixture is a
//! struct literal instead of a parsed byte buffer.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use jclass_core::access::{ClassAccess, MethodAccess};
use jclass_core::attributes::{Attribute, BootstrapMethod, Code, LocalVariableEntry};
use jclass_core::class_file::{ClassFile, MethodInfo};
use jclass_core::pool::{Constant, ConstantPool, MethodHandleKind};
use jclass_core::qualified_name::QualifiedName;
use jclass_core::types::descriptor::parse_method_descriptor;
use jclass_decompiler::config::Config;
use jclass_registry::ClassRegistry;

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

fn method_with_code(name: &str, descriptor: &str, access: MethodAccess, code: Code) -> MethodInfo {
    MethodInfo {
        access_flags: access,
        name: name.to_string(),
        raw_descriptor: descriptor.to_string(),
        descriptor: parse_method_descriptor(descriptor).unwrap(),
        attributes: vec![Attribute::Code(code)],
    }
}

fn local(name: &str, descriptor: &str, index: u16) -> LocalVariableEntry {
    LocalVariableEntry { start_pc: 0, length: u16::MAX, name: name.to_string(), descriptor: descriptor.to_string(), index }
}

/// `x = x + 1;` repeated `n` times: `iload_1; iconst_1; iadd; istore_1`,
/// then `iload_1; ireturn`. Stresses the evaluator's straight-line
/// stepping and the renderer's statement-list walk without any control
/// flow at all.
fn straight_line_class(n: usize) -> ClassFile {
    let mut code = Vec::with_capacity(n * 4 + 2);
    for _ in 0..n {
        code.extend_from_slice(&[27, 4, 96, 60]);
    }
    code.extend_from_slice(&[27, 172]);

    let mut class = bare_class("StraightLine");
    let body = Code {
        max_stack: 2,
        max_locals: 2,
        code,
        exception_table: Vec::new(),
        attributes: vec![Attribute::LocalVariableTable(vec![local("x", "I", 1)])],
    };
    class.methods.push(method_with_code("run", "(I)I", MethodAccess::PUBLIC, body));
    class
}

/// `if (x > 0) { x++; }` repeated `n` times in sequence (not nested):
/// `iload_1; ifle skip; iinc 1,1;`, `skip:` being the next repeat's
/// start, then a final `return`. Stresses `build_if`'s per-block
/// bookkeeping at scale.
fn sequential_ifs_class(n: usize) -> ClassFile {
    let mut code = Vec::with_capacity(n * 7 + 1);
    for _ in 0..n {
        code.extend_from_slice(&[27, 158, 0, 6, 132, 1, 1]);
    }
    code.push(177);

    let mut class = bare_class("SequentialIfs");
    let body = Code {
        max_stack: 1,
        max_locals: 2,
        code,
        exception_table: Vec::new(),
        attributes: vec![Attribute::LocalVariableTable(vec![local("x", "I", 1)])],
    };
    class.methods.push(method_with_code("run", "(I)V", MethodAccess::PUBLIC, body));
    class
}

/// The ternary scenario also covered in `tests/unit_tests.rs`: one
/// guarded early return, about as small as a method body gets.
fn ternary_class() -> ClassFile {
    let mut class = bare_class("Ternary");
    let code = Code {
        max_stack: 2,
        max_locals: 2,
        code: vec![27, 3, 164, 0, 7, 27, 4, 100, 172, 3, 172],
        exception_table: Vec::new(),
        attributes: vec![Attribute::LocalVariableTable(vec![local("x", "I", 1)])],
    };
    class.methods.push(method_with_code("f", "(I)I", MethodAccess::PUBLIC, code));
    class
}

/// The string-concat `invokedynamic` scenario also covered in
/// `tests/unit_tests.rs`.
fn string_concat_class() -> ClassFile {
    let entries = vec![
        Constant::Unusable,
        Constant::Utf8("StringConcat".to_string()),
        Constant::Class { name_index: 1 },
        Constant::Utf8("java/lang/invoke/StringConcatFactory".to_string()),
        Constant::Class { name_index: 3 },
        Constant::Utf8("makeConcatWithConstants".to_string()),
        Constant::Utf8("(II)Ljava/lang/String;".to_string()),
        Constant::NameAndType { name_index: 5, descriptor_index: 6 },
        Constant::Methodref { class_index: 4, name_and_type_index: 7 },
        Constant::MethodHandle { kind: MethodHandleKind::InvokeStatic, reference_index: 8 },
        Constant::Utf8("a=\u{1} b=\u{1}".to_string()),
        Constant::String { string_index: 10 },
        Constant::InvokeDynamic { bootstrap_method_attr_index: 0, name_and_type_index: 7 },
    ];
    let mut class = bare_class("StringConcat");
    class.pool = ConstantPool::from_entries(entries).unwrap();
    class.attributes.push(Attribute::BootstrapMethods(vec![BootstrapMethod { method_ref: 9, arguments: vec![11] }]));

    let code = Code {
        max_stack: 2,
        max_locals: 2,
        code: vec![26, 27, 186, 0, 12, 0, 0, 176],
        exception_table: Vec::new(),
        attributes: vec![Attribute::LocalVariableTable(vec![local("a", "I", 0), local("b", "I", 1)])],
    };
    class.methods.push(method_with_code("concat", "(II)Ljava/lang/String;", MethodAccess::PUBLIC | MethodAccess::STATIC, code));
    class
}

/// `n` copies of the ternary method under distinct names, in one class
/// — stresses `render_class`'s import-tracking and per-method loop
/// rather than any single method's reconstruction.
fn many_methods_class(n: usize) -> ClassFile {
    let mut class = bare_class("ManyMethods");
    for i in 0..n {
        let code = Code {
            max_stack: 2,
            max_locals: 2,
            code: vec![27, 3, 164, 0, 7, 27, 4, 100, 172, 3, 172],
            exception_table: Vec::new(),
            attributes: vec![Attribute::LocalVariableTable(vec![local("x", "I", 1)])],
        };
        class.methods.push(method_with_code(&format!("f{i}"), "(I)I", MethodAccess::PUBLIC, code));
    }
    class
}

fn decompile(class: &ClassFile) -> String {
    let registry = ClassRegistry::new();
    let config = Config::default();
    jclass_decompiler::decompile_class(black_box(class), &registry, &config).unwrap()
}

fn size_based_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompile/straight_line_body_size");
    for &n in &[10usize, 100, 1_000] {
        let class = straight_line_class(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("{n}_statements"), |b| {
            b.iter(|| decompile(&class));
        });
    }
    group.finish();
}

fn feature_specific_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompile/recognizer_patterns");

    let ternary = ternary_class();
    group.bench_function("ternary_collapse", |b| {
        b.iter(|| decompile(&ternary));
    });

    let concat = string_concat_class();
    group.bench_function("string_concat_invokedynamic", |b| {
        b.iter(|| decompile(&concat));
    });

    group.finish();
}

fn complexity_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompile/if_reconstruction_scale");
    for &n in &[10usize, 100, 500] {
        let class = sequential_ifs_class(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("{n}_sequential_ifs"), |b| {
            b.iter(|| decompile(&class));
        });
    }
    group.finish();
}

fn whole_class_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompile/class_method_count");
    for &n in &[5usize, 50, 200] {
        let class = many_methods_class(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("{n}_methods"), |b| {
            b.iter(|| decompile(&class));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    size_based_benchmarks,
    feature_specific_benchmarks,
    complexity_benchmarks,
    whole_class_benchmarks,
);

criterion_main!(benches);
