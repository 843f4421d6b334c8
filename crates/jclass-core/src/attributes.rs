//! Attribute parsing (§4.4).
//!
//! Each attribute is length-prefixed; recognized attributes are decoded
//! into typed variants, anything else survives as [`Attribute::Unknown`]
//! so a tolerant caller can still round-trip a class it doesn't fully
//! understand. Grounded on the same two-pass-resolution shape as
//! [`crate::pool`]: a local byte cursor decodes raw fields, constant-pool
//! indices are resolved against the already-built [`ConstantPool`]
//! immediately (attributes never forward-reference entries that aren't
//! already resolvable).

use crate::error::FormatError;
use crate::pool::ConstantPool;
use crate::pos::Pos;

/// Which declaration an attribute table belongs to — attributes legal
/// in one context are illegal in another (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeContext {
    Class,
    Field,
    Method,
    Code,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalVariableEntry {
    pub start_pc: u16,
    pub length: u16,
    pub name: String,
    pub descriptor: String,
    pub index: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InnerClassEntry {
    pub inner_class: String,
    pub outer_class: Option<String>,
    pub inner_name: Option<String>,
    pub access_flags: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapMethod {
    pub method_ref: u16,
    pub arguments: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Vec<Attribute>,
}

impl Code {
    pub fn local_variable_table(&self) -> Option<&[LocalVariableEntry]> {
        self.attributes.iter().find_map(|a| match a {
            Attribute::LocalVariableTable(table) => Some(table.as_slice()),
            _ => None,
        })
    }
}

/// A decoded annotation element value (§4.4).
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Byte(i32),
    Char(i32),
    Double(f64),
    Float(f32),
    Int(i32),
    Long(i64),
    Short(i32),
    Boolean(bool),
    String(String),
    Enum { type_descriptor: String, const_name: String },
    Class(String),
    Annotation(Annotation),
    Array(Vec<ElementValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub type_descriptor: String,
    pub element_values: Vec<(String, ElementValue)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    BootstrapMethods(Vec<BootstrapMethod>),
    InnerClasses(Vec<InnerClassEntry>),
    NestMembers(Vec<String>),
    SourceFile(String),
    Signature(String),
    ConstantValue(u16),
    Code(Code),
    Exceptions(Vec<String>),
    AnnotationDefault(ElementValue),
    LocalVariableTable(Vec<LocalVariableEntry>),
    Deprecated,
    RuntimeVisibleAnnotations(Vec<Annotation>),
    RuntimeInvisibleAnnotations(Vec<Annotation>),
    RuntimeVisibleParameterAnnotations(Vec<Vec<Annotation>>),
    RuntimeInvisibleParameterAnnotations(Vec<Vec<Annotation>>),
    Unknown { name: String, bytes: Vec<u8> },
}

fn legal_in(name: &str, ctx: AttributeContext) -> bool {
    use AttributeContext::*;
    matches!(
        (name, ctx),
        ("BootstrapMethods", Class)
            | ("InnerClasses", Class)
            | ("NestMembers", Class)
            | ("SourceFile", Class)
            | ("Signature", Class | Field | Method)
            | ("ConstantValue", Field)
            | ("Code", Method)
            | ("Exceptions", Method)
            | ("AnnotationDefault", Method)
            | ("LocalVariableTable", Code)
            | ("Deprecated", Class | Field | Method)
            | ("RuntimeVisibleAnnotations", Class | Field | Method)
            | ("RuntimeInvisibleAnnotations", Class | Field | Method)
            | ("RuntimeVisibleParameterAnnotations", Method)
            | ("RuntimeInvisibleParameterAnnotations", Method)
    )
}

/// A local big-endian byte cursor over an attribute's (or the whole
/// attribute table's) payload. Class-file-level byte reading otherwise
/// lives in `jclass-parser` alongside the disassembler, but attribute
/// structure is self-contained enough not to need that crate's
/// position-tracked stream — see `jclass-parser` for why bytecode
/// decoding does.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    base: Pos,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8], base: Pos) -> Self {
        Self { bytes, pos: 0, base }
    }

    fn here(&self) -> Pos {
        self.base.advance(self.pos as u32)
    }

    fn eof(&self, name: &str) -> FormatError {
        FormatError::AttributeLengthMismatch {
            name: name.to_string(),
            declared: self.bytes.len() as u32,
            consumed: self.pos as u32,
        }
    }

    fn u8(&mut self, name: &str) -> Result<u8, FormatError> {
        let b = *self.bytes.get(self.pos).ok_or_else(|| self.eof(name))?;
        self.pos += 1;
        Ok(b)
    }

    fn u16(&mut self, name: &str) -> Result<u16, FormatError> {
        let hi = self.u8(name)? as u16;
        let lo = self.u8(name)? as u16;
        Ok((hi << 8) | lo)
    }

    fn u32(&mut self, name: &str) -> Result<u32, FormatError> {
        let hi = self.u16(name)? as u32;
        let lo = self.u16(name)? as u32;
        Ok((hi << 16) | lo)
    }

    fn bytes(&mut self, n: usize, name: &str) -> Result<&'a [u8], FormatError> {
        if self.pos + n > self.bytes.len() {
            return Err(self.eof(name));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

/// Parse an attribute table of `count` entries starting at `bytes[0]`.
/// `bytes` holds exactly the table's encoding (no trailing data).
pub fn parse_attributes(
    bytes: &[u8],
    base: Pos,
    count: u16,
    pool: &ConstantPool,
    ctx: AttributeContext,
) -> Result<Vec<Attribute>, FormatError> {
    let mut cursor = Cursor::new(bytes, base);
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name_index = cursor.u16("attribute_name_index")?;
        let name = pool.utf8(name_index)?.to_string();
        let length = cursor.u32("attribute_length")?;
        let start_pos = cursor.here();
        let payload = cursor.bytes(length as usize, &name)?;

        if !legal_in(&name, ctx) {
            out.push(Attribute::Unknown { name, bytes: payload.to_vec() });
            continue;
        }

        let mut payload_cursor = Cursor::new(payload, start_pos);
        let attr = parse_one(&name, &mut payload_cursor, pool)?;
        if payload_cursor.pos != payload.len() {
            return Err(FormatError::AttributeLengthMismatch {
                name,
                declared: length,
                consumed: payload_cursor.pos as u32,
            });
        }
        out.push(attr);
    }
    Ok(out)
}

fn parse_one(name: &str, c: &mut Cursor, pool: &ConstantPool) -> Result<Attribute, FormatError> {
    Ok(match name {
        "SourceFile" => Attribute::SourceFile(pool.utf8(c.u16(name)?)?.to_string()),
        "Signature" => Attribute::Signature(pool.utf8(c.u16(name)?)?.to_string()),
        "ConstantValue" => Attribute::ConstantValue(c.u16(name)?),
        "Deprecated" => Attribute::Deprecated,
        "NestMembers" => {
            let count = c.u16(name)?;
            let mut members = Vec::with_capacity(count as usize);
            for _ in 0..count {
                members.push(pool.class_name(c.u16(name)?)?.to_string());
            }
            Attribute::NestMembers(members)
        }
        "Exceptions" => {
            let count = c.u16(name)?;
            let mut throws = Vec::with_capacity(count as usize);
            for _ in 0..count {
                throws.push(pool.class_name(c.u16(name)?)?.to_string());
            }
            Attribute::Exceptions(throws)
        }
        "InnerClasses" => {
            let count = c.u16(name)?;
            let mut entries = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let inner_class_index = c.u16(name)?;
                let outer_class_index = c.u16(name)?;
                let inner_name_index = c.u16(name)?;
                let access_flags = c.u16(name)?;
                entries.push(InnerClassEntry {
                    inner_class: pool.class_name(inner_class_index)?.to_string(),
                    outer_class: pool.class_name_opt(outer_class_index)?.map(str::to_string),
                    inner_name: pool.utf8_opt(inner_name_index)?.map(str::to_string),
                    access_flags,
                });
            }
            Attribute::InnerClasses(entries)
        }
        "BootstrapMethods" => {
            let count = c.u16(name)?;
            let mut methods = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let method_ref = c.u16(name)?;
                let arg_count = c.u16(name)?;
                let mut arguments = Vec::with_capacity(arg_count as usize);
                for _ in 0..arg_count {
                    arguments.push(c.u16(name)?);
                }
                methods.push(BootstrapMethod { method_ref, arguments });
            }
            Attribute::BootstrapMethods(methods)
        }
        "LocalVariableTable" => {
            let count = c.u16(name)?;
            let mut entries = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let start_pc = c.u16(name)?;
                let length = c.u16(name)?;
                let name_index = c.u16(name)?;
                let descriptor_index = c.u16(name)?;
                let index = c.u16(name)?;
                entries.push(LocalVariableEntry {
                    start_pc,
                    length,
                    name: pool.utf8(name_index)?.to_string(),
                    descriptor: pool.utf8(descriptor_index)?.to_string(),
                    index,
                });
            }
            Attribute::LocalVariableTable(entries)
        }
        "AnnotationDefault" => Attribute::AnnotationDefault(parse_element_value(c, pool, name)?),
        "RuntimeVisibleAnnotations" => Attribute::RuntimeVisibleAnnotations(parse_annotations(c, pool, name)?),
        "RuntimeInvisibleAnnotations" => Attribute::RuntimeInvisibleAnnotations(parse_annotations(c, pool, name)?),
        "RuntimeVisibleParameterAnnotations" => {
            Attribute::RuntimeVisibleParameterAnnotations(parse_parameter_annotations(c, pool, name)?)
        }
        "RuntimeInvisibleParameterAnnotations" => {
            Attribute::RuntimeInvisibleParameterAnnotations(parse_parameter_annotations(c, pool, name)?)
        }
        "Code" => {
            let max_stack = c.u16(name)?;
            let max_locals = c.u16(name)?;
            let code_length = c.u32(name)?;
            let code = c.bytes(code_length as usize, name)?.to_vec();
            let exc_count = c.u16(name)?;
            let mut exception_table = Vec::with_capacity(exc_count as usize);
            for _ in 0..exc_count {
                let start_pc = c.u16(name)?;
                let end_pc = c.u16(name)?;
                let handler_pc = c.u16(name)?;
                let catch_type_index = c.u16(name)?;
                exception_table.push(ExceptionTableEntry {
                    start_pc,
                    end_pc,
                    handler_pc,
                    catch_type: pool.class_name_opt(catch_type_index)?.map(str::to_string),
                });
            }
            let nested_count = c.u16(name)?;
            let nested_start = c.here();
            let nested_bytes = c.bytes(c.remaining(), name)?;
            let attributes = parse_attributes(nested_bytes, nested_start, nested_count, pool, AttributeContext::Code)?;
            Attribute::Code(Code { max_stack, max_locals, code, exception_table, attributes })
        }
        other => unreachable!("parse_one called for unrecognized attribute '{other}'"),
    })
}

fn parse_annotations(c: &mut Cursor, pool: &ConstantPool, ctx_name: &str) -> Result<Vec<Annotation>, FormatError> {
    let count = c.u16(ctx_name)?;
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        out.push(parse_annotation(c, pool, ctx_name)?);
    }
    Ok(out)
}

fn parse_parameter_annotations(
    c: &mut Cursor,
    pool: &ConstantPool,
    ctx_name: &str,
) -> Result<Vec<Vec<Annotation>>, FormatError> {
    let num_parameters = c.u8(ctx_name)?;
    let mut out = Vec::with_capacity(num_parameters as usize);
    for _ in 0..num_parameters {
        out.push(parse_annotations(c, pool, ctx_name)?);
    }
    Ok(out)
}

fn parse_annotation(c: &mut Cursor, pool: &ConstantPool, ctx_name: &str) -> Result<Annotation, FormatError> {
    let type_descriptor = pool.utf8(c.u16(ctx_name)?)?.to_string();
    let pair_count = c.u16(ctx_name)?;
    let mut element_values = Vec::with_capacity(pair_count as usize);
    for _ in 0..pair_count {
        let name = pool.utf8(c.u16(ctx_name)?)?.to_string();
        let value = parse_element_value(c, pool, ctx_name)?;
        element_values.push((name, value));
    }
    Ok(Annotation { type_descriptor, element_values })
}

/// Decode one `element_value` (§4.4): tag byte then tag-specific payload.
fn parse_element_value(c: &mut Cursor, pool: &ConstantPool, ctx_name: &str) -> Result<ElementValue, FormatError> {
    let tag = c.u8(ctx_name)?;
    Ok(match tag {
        b'B' => ElementValue::Byte(pool.integer(c.u16(ctx_name)?)?),
        b'S' => ElementValue::Short(pool.integer(c.u16(ctx_name)?)?),
        b'I' => ElementValue::Int(pool.integer(c.u16(ctx_name)?)?),
        b'C' => ElementValue::Char(pool.integer(c.u16(ctx_name)?)?),
        b'Z' => ElementValue::Boolean(pool.integer(c.u16(ctx_name)?)? != 0),
        b'F' => ElementValue::Float(pool.float(c.u16(ctx_name)?)?),
        b'J' => ElementValue::Long(pool.long(c.u16(ctx_name)?)?),
        b'D' => ElementValue::Double(pool.double(c.u16(ctx_name)?)?),
        b's' => ElementValue::String(pool.utf8(c.u16(ctx_name)?)?.to_string()),
        b'e' => {
            let type_descriptor = pool.utf8(c.u16(ctx_name)?)?.to_string();
            let const_name = pool.utf8(c.u16(ctx_name)?)?.to_string();
            ElementValue::Enum { type_descriptor, const_name }
        }
        b'c' => ElementValue::Class(pool.utf8(c.u16(ctx_name)?)?.to_string()),
        b'@' => ElementValue::Annotation(parse_annotation(c, pool, ctx_name)?),
        b'[' => {
            let count = c.u16(ctx_name)?;
            let mut values = Vec::with_capacity(count as usize);
            for _ in 0..count {
                values.push(parse_element_value(c, pool, ctx_name)?);
            }
            ElementValue::Array(values)
        }
        other => {
            return Err(FormatError::InstructionFormat {
                pos: c.here(),
                detail: format!("unknown annotation element_value tag '{}'", other as char),
            })
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Constant;

    fn pool_with(entries: Vec<Constant>) -> ConstantPool {
        let mut full = vec![Constant::Unusable];
        full.extend(entries);
        ConstantPool::from_entries(full).unwrap()
    }

    #[test]
    fn parses_source_file_attribute() {
        let pool = pool_with(vec![
            Constant::Utf8("SourceFile".into()),
            Constant::Utf8("Foo.java".into()),
        ]);
        let mut bytes = vec![0, 1]; // name_index = 1 ("SourceFile")
        bytes.extend_from_slice(&2u32.to_be_bytes()); // length = 2
        bytes.extend_from_slice(&2u16.to_be_bytes()); // sourcefile_index = 2

        let attrs = parse_attributes(&bytes, Pos::new(0), 1, &pool, AttributeContext::Class).unwrap();
        assert_eq!(attrs, vec![Attribute::SourceFile("Foo.java".into())]);
    }

    #[test]
    fn unknown_attribute_is_preserved_opaque() {
        let pool = pool_with(vec![Constant::Utf8("Synthetic".into())]);
        let mut bytes = vec![0, 1];
        bytes.extend_from_slice(&0u32.to_be_bytes());
        let attrs = parse_attributes(&bytes, Pos::new(0), 1, &pool, AttributeContext::Field).unwrap();
        assert_eq!(attrs, vec![Attribute::Unknown { name: "Synthetic".into(), bytes: vec![] }]);
    }

    #[test]
    fn code_attribute_round_trips_exception_table() {
        let pool = pool_with(vec![
            Constant::Utf8("Code".into()),
            Constant::Utf8("java/io/IOException".into()),
            Constant::Class { name_index: 2 },
        ]);
        let mut bytes = vec![0, 1]; // "Code"
        let mut payload = Vec::new();
        payload.extend_from_slice(&2u16.to_be_bytes()); // max_stack
        payload.extend_from_slice(&1u16.to_be_bytes()); // max_locals
        payload.extend_from_slice(&2u32.to_be_bytes()); // code_length
        payload.extend_from_slice(&[0xB1, 0x00]); // 2 bytes of "code"
        payload.extend_from_slice(&1u16.to_be_bytes()); // exception_table_length
        payload.extend_from_slice(&0u16.to_be_bytes()); // start_pc
        payload.extend_from_slice(&2u16.to_be_bytes()); // end_pc
        payload.extend_from_slice(&2u16.to_be_bytes()); // handler_pc
        payload.extend_from_slice(&3u16.to_be_bytes()); // catch_type -> Class #3
        payload.extend_from_slice(&0u16.to_be_bytes()); // attributes_count
        bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&payload);

        let attrs = parse_attributes(&bytes, Pos::new(0), 1, &pool, AttributeContext::Method).unwrap();
        match &attrs[0] {
            Attribute::Code(code) => {
                assert_eq!(code.max_stack, 2);
                assert_eq!(code.exception_table.len(), 1);
                assert_eq!(code.exception_table[0].catch_type.as_deref(), Some("java/io/IOException"));
            }
            _ => panic!("expected Code attribute"),
        }
    }
}
