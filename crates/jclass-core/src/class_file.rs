//! The class-file data model (§3, §6): `ClassFile`, `FieldInfo`,
//! `MethodInfo`, and the top-level byte parser that ties the constant
//! pool and attribute parsers together.

use crate::access::{ClassAccess, FieldAccess, MethodAccess};
use crate::attributes::{parse_attributes, Attribute, AttributeContext, Code};
use crate::error::FormatError;
use crate::pool::ConstantPool;
use crate::pos::Pos;
use crate::qualified_name::QualifiedName;
use crate::types::descriptor::{parse_field_descriptor, parse_method_descriptor, MethodDescriptor};
use crate::types::lattice::Type;

const MAGIC: u32 = 0xCAFE_BABE;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub access_flags: FieldAccess,
    pub name: String,
    pub descriptor: Type,
    pub attributes: Vec<Attribute>,
}

impl FieldInfo {
    pub fn is_synthetic(&self) -> bool {
        self.access_flags.contains(FieldAccess::SYNTHETIC) || self.has_attribute("Synthetic")
    }

    pub fn is_deprecated(&self) -> bool {
        self.attributes.iter().any(|a| matches!(a, Attribute::Deprecated))
    }

    pub fn is_enum_constant(&self) -> bool {
        self.access_flags.contains(FieldAccess::ENUM)
    }

    pub fn signature(&self) -> Option<&str> {
        self.attributes.iter().find_map(|a| match a {
            Attribute::Signature(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn constant_value_index(&self) -> Option<u16> {
        self.attributes.iter().find_map(|a| match a {
            Attribute::ConstantValue(idx) => Some(*idx),
            _ => None,
        })
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.attributes
            .iter()
            .any(|a| matches!(a, Attribute::Unknown { name: n, .. } if n == name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub access_flags: MethodAccess,
    pub name: String,
    pub raw_descriptor: String,
    pub descriptor: MethodDescriptor,
    pub attributes: Vec<Attribute>,
}

impl MethodInfo {
    pub fn code(&self) -> Option<&Code> {
        self.attributes.iter().find_map(|a| match a {
            Attribute::Code(code) => Some(code),
            _ => None,
        })
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags.contains(MethodAccess::ABSTRACT)
    }

    pub fn is_native(&self) -> bool {
        self.access_flags.contains(MethodAccess::NATIVE)
    }

    pub fn is_synthetic(&self) -> bool {
        self.access_flags.contains(MethodAccess::SYNTHETIC)
    }

    pub fn is_bridge(&self) -> bool {
        self.access_flags.contains(MethodAccess::BRIDGE)
    }

    pub fn is_deprecated(&self) -> bool {
        self.attributes.iter().any(|a| matches!(a, Attribute::Deprecated))
    }

    pub fn is_varargs(&self) -> bool {
        self.access_flags.contains(MethodAccess::VARARGS)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    pub fn is_static_initializer(&self) -> bool {
        self.name == "<clinit>"
    }

    pub fn throws(&self) -> &[String] {
        self.attributes
            .iter()
            .find_map(|a| match a {
                Attribute::Exceptions(list) => Some(list.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn signature(&self) -> Option<&str> {
        self.attributes.iter().find_map(|a| match a {
            Attribute::Signature(s) => Some(s.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: ClassAccess,
    pub this_class: QualifiedName,
    pub super_class: Option<QualifiedName>,
    pub interfaces: Vec<QualifiedName>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Vec<Attribute>,
    pub pool: ConstantPool,
}

impl ClassFile {
    pub fn source_file(&self) -> Option<&str> {
        self.attributes.iter().find_map(|a| match a {
            Attribute::SourceFile(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn signature(&self) -> Option<&str> {
        self.attributes.iter().find_map(|a| match a {
            Attribute::Signature(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn nest_members(&self) -> &[String] {
        self.attributes
            .iter()
            .find_map(|a| match a {
                Attribute::NestMembers(m) => Some(m.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// The class's `invokedynamic` call sites' bootstrap methods, indexed
    /// by `bootstrap_method_attr_index` (§4.6 string-concat recognition).
    pub fn bootstrap_methods(&self) -> &[crate::attributes::BootstrapMethod] {
        self.attributes
            .iter()
            .find_map(|a| match a {
                Attribute::BootstrapMethods(m) => Some(m.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// The synthetic `$assertionsDisabled` field, if the compiler emitted
    /// one for this class (§4.8 assertion recovery).
    pub fn assertions_disabled_field(&self) -> Option<&FieldInfo> {
        self.fields
            .iter()
            .find(|f| f.name == "$assertionsDisabled" && f.access_flags.contains(FieldAccess::STATIC))
    }

    pub fn field_named(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn method_named(&self, name: &str, descriptor: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.name == name && m.raw_descriptor == descriptor)
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn here(&self) -> Pos {
        Pos::new(self.pos as u32)
    }

    fn eof(&self) -> FormatError {
        FormatError::Stream(crate::error::StreamError::UnexpectedEof {
            pos: self.here(),
            needed: 1,
        })
    }

    fn u8(&mut self) -> Result<u8, FormatError> {
        let b = *self.bytes.get(self.pos).ok_or_else(|| self.eof())?;
        self.pos += 1;
        Ok(b)
    }

    fn u16(&mut self) -> Result<u16, FormatError> {
        Ok(((self.u8()? as u16) << 8) | self.u8()? as u16)
    }

    fn u32(&mut self) -> Result<u32, FormatError> {
        Ok(((self.u16()? as u32) << 16) | self.u16()? as u32)
    }

    fn bytes(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        if self.pos + n > self.bytes.len() {
            return Err(self.eof());
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn rest(&mut self) -> Result<&'a [u8], FormatError> {
        self.bytes(self.bytes.len() - self.pos)
    }
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<ClassFile, FormatError> {
        let mut c = Cursor::new(bytes);
        let magic_pos = c.here();
        let magic = c.u32()?;
        if magic != MAGIC {
            return Err(FormatError::WrongMagic { pos: magic_pos, found: magic });
        }
        let minor_version = c.u16()?;
        let major_version = c.u16()?;

        let pool_pos = c.here();
        let pool_bytes = c.rest()?;
        let (pool, pool_consumed) = ConstantPool::parse(pool_bytes, pool_pos)?;
        c.pos = pool_pos.offset() as usize + pool_consumed;

        let raw_flags = c.u16()?;
        let access_flags = ClassAccess::from_bits_truncate(raw_flags);
        let this_class_index = c.u16()?;
        let this_class = QualifiedName::parse(pool.class_name(this_class_index)?);
        let super_class_index = c.u16()?;
        let super_class = pool.class_name_opt(super_class_index)?.map(QualifiedName::parse);

        let interfaces_count = c.u16()?;
        let mut interfaces = Vec::with_capacity(interfaces_count as usize);
        for _ in 0..interfaces_count {
            interfaces.push(QualifiedName::parse(pool.class_name(c.u16()?)?));
        }

        let fields_count = c.u16()?;
        let mut fields = Vec::with_capacity(fields_count as usize);
        for _ in 0..fields_count {
            fields.push(parse_field(&mut c, &pool)?);
        }

        let methods_count = c.u16()?;
        let mut methods = Vec::with_capacity(methods_count as usize);
        for _ in 0..methods_count {
            methods.push(parse_method(&mut c, &pool)?);
        }

        let attrs_count = c.u16()?;
        let attrs_pos = c.here();
        let attrs_bytes = c.rest()?;
        let attributes = parse_attributes(attrs_bytes, attrs_pos, attrs_count, &pool, AttributeContext::Class)?;

        Ok(ClassFile {
            minor_version,
            major_version,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
            pool,
        })
    }
}

fn parse_field(c: &mut Cursor, pool: &ConstantPool) -> Result<FieldInfo, FormatError> {
    let access_flags = FieldAccess::from_bits_truncate(c.u16()?);
    let name = pool.utf8(c.u16()?)?.to_string();
    let descriptor_index = c.u16()?;
    let descriptor = parse_field_descriptor(pool.utf8(descriptor_index)?)?;
    let attrs_count = c.u16()?;
    let attrs_pos = c.here();
    let attrs_bytes = c.rest()?;
    let attributes = parse_attributes(attrs_bytes, attrs_pos, attrs_count, pool, AttributeContext::Field)?;
    Ok(FieldInfo { access_flags, name, descriptor, attributes })
}

fn parse_method(c: &mut Cursor, pool: &ConstantPool) -> Result<MethodInfo, FormatError> {
    let access_flags = MethodAccess::from_bits_truncate(c.u16()?);
    let name = pool.utf8(c.u16()?)?.to_string();
    let descriptor_index = c.u16()?;
    let raw_descriptor = pool.utf8(descriptor_index)?.to_string();
    let descriptor = parse_method_descriptor(&raw_descriptor).map_err(|e| match e {
        FormatError::InvalidTypeName { detail, .. } => FormatError::IllegalMethodHeader {
            name: name.clone(),
            descriptor: raw_descriptor.clone(),
            detail,
        },
        other => other,
    })?;
    let attrs_count = c.u16()?;
    let attrs_pos = c.here();
    let attrs_bytes = c.rest()?;
    let attributes = parse_attributes(attrs_bytes, attrs_pos, attrs_count, pool, AttributeContext::Method)?;
    Ok(MethodInfo { access_flags, name, raw_descriptor, descriptor, attributes })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_class_bytes() -> Vec<u8> {
        // Constant pool: #1 Utf8("Foo"), #2 Class(#1), #3 Utf8("java/lang/Object"), #4 Class(#3)
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MAGIC.to_be_bytes());
        bytes.extend_from_slice(&0u16.to_be_bytes()); // minor
        bytes.extend_from_slice(&52u16.to_be_bytes()); // major (Java 8)

        bytes.extend_from_slice(&5u16.to_be_bytes()); // cp_count = 5
        bytes.push(1);
        bytes.extend_from_slice(&3u16.to_be_bytes());
        bytes.extend_from_slice(b"Foo");
        bytes.push(7);
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.push(1);
        bytes.extend_from_slice(&16u16.to_be_bytes());
        bytes.extend_from_slice(b"java/lang/Object");
        bytes.push(7);
        bytes.extend_from_slice(&3u16.to_be_bytes());

        bytes.extend_from_slice(&0x0021u16.to_be_bytes()); // access_flags: PUBLIC|SUPER
        bytes.extend_from_slice(&2u16.to_be_bytes()); // this_class = #2
        bytes.extend_from_slice(&4u16.to_be_bytes()); // super_class = #4
        bytes.extend_from_slice(&0u16.to_be_bytes()); // interfaces_count
        bytes.extend_from_slice(&0u16.to_be_bytes()); // fields_count
        bytes.extend_from_slice(&0u16.to_be_bytes()); // methods_count
        bytes.extend_from_slice(&0u16.to_be_bytes()); // attributes_count
        bytes
    }

    #[test]
    fn parses_minimal_class() {
        let bytes = minimal_class_bytes();
        let class = ClassFile::parse(&bytes).unwrap();
        assert_eq!(class.this_class.internal(), "Foo");
        assert_eq!(class.super_class.unwrap().internal(), "java/lang/Object");
        assert!(class.access_flags.contains(ClassAccess::PUBLIC));
        assert!(class.fields.is_empty());
        assert!(class.methods.is_empty());
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut bytes = minimal_class_bytes();
        bytes[0] = 0;
        let err = ClassFile::parse(&bytes).unwrap_err();
        assert!(matches!(err, FormatError::WrongMagic { .. }));
    }
}
