//! The constant pool (§3, §4.2).
//!
//! Grounded on the teacher's `unresolved.rs` deferred-resolution pattern:
//! there, an `UnresolvedType` captures what was written in source and the
//! context needed to resolve it later; here, each [`Constant`] captures
//! the raw indices read from the class file, and a second pass validates
//! that every index resolves to an entry of the expected kind before any
//! consumer touches them. Rather than rewriting indices into raw
//! pointers (the original C++ implementation's approach), entries stay
//! index-addressed — an arena with index handles, per the design notes on
//! avoiding self-referential cycles — and the typed accessors do the
//! kind-checked dereference.

use num_enum::TryFromPrimitive;
use rustc_hash::FxHashMap;

use crate::error::FormatError;
use crate::pos::Pos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum ConstantTag {
    Utf8 = 1,
    Integer = 3,
    Float = 4,
    Long = 5,
    Double = 6,
    Class = 7,
    String = 8,
    Fieldref = 9,
    Methodref = 10,
    InterfaceMethodref = 11,
    NameAndType = 12,
    MethodHandle = 15,
    MethodType = 16,
    InvokeDynamic = 18,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum MethodHandleKind {
    GetField = 1,
    GetStatic = 2,
    PutField = 3,
    PutStatic = 4,
    InvokeVirtual = 5,
    InvokeStatic = 6,
    InvokeSpecial = 7,
    NewInvokeSpecial = 8,
    InvokeInterface = 9,
}

/// An index into the constant pool, 1-based per the class-file format.
pub type CpIndex = u16;

/// One constant-pool entry, storing raw indices into the same pool
/// rather than resolved references (§3 "Constant Pool owns its
/// constants"; see module docs for why indices, not pointers).
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: CpIndex },
    String { string_index: CpIndex },
    Fieldref { class_index: CpIndex, name_and_type_index: CpIndex },
    Methodref { class_index: CpIndex, name_and_type_index: CpIndex },
    InterfaceMethodref { class_index: CpIndex, name_and_type_index: CpIndex },
    NameAndType { name_index: CpIndex, descriptor_index: CpIndex },
    MethodHandle { kind: MethodHandleKind, reference_index: CpIndex },
    MethodType { descriptor_index: CpIndex },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: CpIndex },
    /// The unusable second slot after a `Long`/`Double` entry (§3).
    Unusable,
}

impl Constant {
    pub fn tag_name(&self) -> &'static str {
        match self {
            Constant::Utf8(_) => "Utf8",
            Constant::Integer(_) => "Integer",
            Constant::Float(_) => "Float",
            Constant::Long(_) => "Long",
            Constant::Double(_) => "Double",
            Constant::Class { .. } => "Class",
            Constant::String { .. } => "String",
            Constant::Fieldref { .. } => "Fieldref",
            Constant::Methodref { .. } => "Methodref",
            Constant::InterfaceMethodref { .. } => "InterfaceMethodref",
            Constant::NameAndType { .. } => "NameAndType",
            Constant::MethodHandle { .. } => "MethodHandle",
            Constant::MethodType { .. } => "MethodType",
            Constant::InvokeDynamic { .. } => "InvokeDynamic",
            Constant::Unusable => "<unusable>",
        }
    }
}

/// A resolved `NameAndType` pair, returned by [`ConstantPool::name_and_type`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameAndType {
    pub name: String,
    pub descriptor: String,
}

/// A resolved `Fieldref`/`Methodref`/`InterfaceMethodref`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRef {
    pub class_name: String,
    pub name: String,
    pub descriptor: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantPool {
    /// Index 0 is unused (the format is 1-indexed); entries after a
    /// `Long`/`Double` occupy two slots, the second being `Unusable`.
    entries: Vec<Constant>,
    /// Reverse lookup from Utf8 content to the first index holding it —
    /// not required by the format, but every renderer/evaluator lookup
    /// of "does this class have an attribute named X" wants it, so we
    /// build it once instead of re-scanning (`rustc-hash` per the
    /// teacher's convention for hot lookup maps).
    utf8_index: FxHashMap<String, CpIndex>,
}

/// A local big-endian byte cursor, mirroring `attributes::Cursor` — kept
/// separate rather than shared because each reads a different notion of
/// "current position" (whole-file offset here vs. attribute-relative
/// there) and pool parsing runs before any `ConstantPool` exists to hand
/// a resolver to.
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

    fn i32(&mut self) -> Result<i32, FormatError> {
        Ok(self.u32()? as i32)
    }

    fn i64(&mut self) -> Result<i64, FormatError> {
        Ok(((self.u32()? as i64) << 32) | self.u32()? as i64)
    }

    fn f32(&mut self) -> Result<f32, FormatError> {
        Ok(f32::from_bits(self.u32()?))
    }

    fn f64(&mut self) -> Result<f64, FormatError> {
        let bits = ((self.u32()? as u64) << 32) | self.u32()? as u64;
        Ok(f64::from_bits(bits))
    }

    fn bytes(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        if self.pos + n > self.bytes.len() {
            return Err(self.eof());
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }
}

impl ConstantPool {
    /// Pass 1 (§4.2): read `count`, then `count − 1` logical entries,
    /// skipping the slot after every `Long`/`Double`. Returns the pool
    /// (already validated, see [`ConstantPool::from_entries`]) and the
    /// number of bytes consumed.
    pub fn parse(bytes: &[u8], base: Pos) -> Result<(Self, usize), FormatError> {
        let mut c = Cursor::new(bytes, base);
        let count = c.u16()?;
        let mut entries = vec![Constant::Unusable]; // index 0 is unused
        let mut i = 1u16;
        while i < count {
            let pos = c.here();
            let tag_byte = c.u8()?;
            let tag = ConstantTag::try_from(tag_byte).map_err(|_| FormatError::IllegalConstantKind {
                tag: tag_byte,
                pos,
            })?;
            let entry = match tag {
                ConstantTag::Utf8 => {
                    let len = c.u16()? as usize;
                    let raw = c.bytes(len)?;
                    Constant::Utf8(decode_modified_utf8(raw, pos)?)
                }
                ConstantTag::Integer => Constant::Integer(c.i32()?),
                ConstantTag::Float => Constant::Float(c.f32()?),
                ConstantTag::Long => Constant::Long(c.i64()?),
                ConstantTag::Double => Constant::Double(c.f64()?),
                ConstantTag::Class => Constant::Class { name_index: c.u16()? },
                ConstantTag::String => Constant::String { string_index: c.u16()? },
                ConstantTag::Fieldref => Constant::Fieldref {
                    class_index: c.u16()?,
                    name_and_type_index: c.u16()?,
                },
                ConstantTag::Methodref => Constant::Methodref {
                    class_index: c.u16()?,
                    name_and_type_index: c.u16()?,
                },
                ConstantTag::InterfaceMethodref => Constant::InterfaceMethodref {
                    class_index: c.u16()?,
                    name_and_type_index: c.u16()?,
                },
                ConstantTag::NameAndType => Constant::NameAndType {
                    name_index: c.u16()?,
                    descriptor_index: c.u16()?,
                },
                ConstantTag::MethodHandle => {
                    let kind_byte = c.u8()?;
                    let kind = MethodHandleKind::try_from(kind_byte).map_err(|_| FormatError::IllegalConstantKind {
                        tag: kind_byte,
                        pos,
                    })?;
                    Constant::MethodHandle {
                        kind,
                        reference_index: c.u16()?,
                    }
                }
                ConstantTag::MethodType => Constant::MethodType { descriptor_index: c.u16()? },
                ConstantTag::InvokeDynamic => Constant::InvokeDynamic {
                    bootstrap_method_attr_index: c.u16()?,
                    name_and_type_index: c.u16()?,
                },
            };
            let wide = matches!(entry, Constant::Long(_) | Constant::Double(_));
            entries.push(entry);
            i += 1;
            if wide {
                entries.push(Constant::Unusable);
                i += 1;
            }
        }
        let pool = Self::from_entries(entries)?;
        Ok((pool, c.pos))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    pub fn from_entries(entries: Vec<Constant>) -> Result<Self, FormatError> {
        let mut utf8_index = FxHashMap::default();
        for (i, entry) in entries.iter().enumerate() {
            if let Constant::Utf8(s) = entry {
                utf8_index.entry(s.clone()).or_insert(i as CpIndex);
            }
        }
        let pool = Self { entries, utf8_index };
        pool.validate()?;
        Ok(pool)
    }

    /// Pass 2: walk every entry once and confirm its indices resolve
    /// in-bounds and to the expected kind (§4.2).
    fn validate(&self) -> Result<(), FormatError> {
        for i in 1..self.entries.len() as CpIndex {
            match &self.entries[i as usize] {
                Constant::Class { name_index } => {
                    self.utf8(*name_index)?;
                }
                Constant::String { string_index } => {
                    self.utf8(*string_index)?;
                }
                Constant::Fieldref { class_index, name_and_type_index }
                | Constant::Methodref { class_index, name_and_type_index }
                | Constant::InterfaceMethodref { class_index, name_and_type_index } => {
                    self.class_name(*class_index)?;
                    self.name_and_type(*name_and_type_index)?;
                }
                Constant::NameAndType { name_index, descriptor_index } => {
                    self.utf8(*name_index)?;
                    self.utf8(*descriptor_index)?;
                }
                Constant::MethodHandle { reference_index, .. } => {
                    match self.get(*reference_index)? {
                        Constant::Fieldref { .. } | Constant::Methodref { .. } | Constant::InterfaceMethodref { .. } => {}
                        other => {
                            return Err(FormatError::WrongConstantKind {
                                index: *reference_index,
                                expected: "Fieldref|Methodref|InterfaceMethodref",
                                actual: other.tag_name(),
                            });
                        }
                    }
                }
                Constant::MethodType { descriptor_index } => {
                    self.utf8(*descriptor_index)?;
                }
                Constant::InvokeDynamic { name_and_type_index, .. } => {
                    self.name_and_type(*name_and_type_index)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn get(&self, index: CpIndex) -> Result<&Constant, FormatError> {
        self.entries
            .get(index as usize)
            .filter(|c| !matches!(c, Constant::Unusable) || index == 0)
            .ok_or(FormatError::PoolIndexOutOfBounds {
                index,
                size: self.entries.len() as u16,
            })
    }

    pub fn utf8(&self, index: CpIndex) -> Result<&str, FormatError> {
        match self.get(index)? {
            Constant::Utf8(s) => Ok(s.as_str()),
            other => Err(FormatError::WrongConstantKind {
                index,
                expected: "Utf8",
                actual: other.tag_name(),
            }),
        }
    }

    /// `getNullable<K>(0)` returns `None` (§4.2); index 0 is only legal
    /// for a handful of optional references (e.g. a catch-all `catch`
    /// entry's type index, or `super_class` for `java.lang.Object`).
    pub fn utf8_opt(&self, index: CpIndex) -> Result<Option<&str>, FormatError> {
        if index == 0 {
            return Ok(None);
        }
        self.utf8(index).map(Some)
    }

    pub fn integer(&self, index: CpIndex) -> Result<i32, FormatError> {
        match self.get(index)? {
            Constant::Integer(v) => Ok(*v),
            other => Err(FormatError::WrongConstantKind { index, expected: "Integer", actual: other.tag_name() }),
        }
    }

    pub fn float(&self, index: CpIndex) -> Result<f32, FormatError> {
        match self.get(index)? {
            Constant::Float(v) => Ok(*v),
            other => Err(FormatError::WrongConstantKind { index, expected: "Float", actual: other.tag_name() }),
        }
    }

    pub fn long(&self, index: CpIndex) -> Result<i64, FormatError> {
        match self.get(index)? {
            Constant::Long(v) => Ok(*v),
            other => Err(FormatError::WrongConstantKind { index, expected: "Long", actual: other.tag_name() }),
        }
    }

    pub fn double(&self, index: CpIndex) -> Result<f64, FormatError> {
        match self.get(index)? {
            Constant::Double(v) => Ok(*v),
            other => Err(FormatError::WrongConstantKind { index, expected: "Double", actual: other.tag_name() }),
        }
    }

    pub fn class_name(&self, index: CpIndex) -> Result<&str, FormatError> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            other => Err(FormatError::WrongConstantKind { index, expected: "Class", actual: other.tag_name() }),
        }
    }

    pub fn class_name_opt(&self, index: CpIndex) -> Result<Option<&str>, FormatError> {
        if index == 0 {
            return Ok(None);
        }
        self.class_name(index).map(Some)
    }

    pub fn string(&self, index: CpIndex) -> Result<&str, FormatError> {
        match self.get(index)? {
            Constant::String { string_index } => self.utf8(*string_index),
            other => Err(FormatError::WrongConstantKind { index, expected: "String", actual: other.tag_name() }),
        }
    }

    pub fn name_and_type(&self, index: CpIndex) -> Result<NameAndType, FormatError> {
        match self.get(index)? {
            Constant::NameAndType { name_index, descriptor_index } => Ok(NameAndType {
                name: self.utf8(*name_index)?.to_string(),
                descriptor: self.utf8(*descriptor_index)?.to_string(),
            }),
            other => Err(FormatError::WrongConstantKind { index, expected: "NameAndType", actual: other.tag_name() }),
        }
    }

    fn member_ref(&self, index: CpIndex, expected: &'static str) -> Result<MemberRef, FormatError> {
        let (class_index, nat_index) = match self.get(index)? {
            Constant::Fieldref { class_index, name_and_type_index } if expected == "Fieldref" => {
                (*class_index, *name_and_type_index)
            }
            Constant::Methodref { class_index, name_and_type_index } if expected == "Methodref" => {
                (*class_index, *name_and_type_index)
            }
            Constant::InterfaceMethodref { class_index, name_and_type_index } if expected == "InterfaceMethodref" => {
                (*class_index, *name_and_type_index)
            }
            other => {
                return Err(FormatError::WrongConstantKind {
                    index,
                    expected,
                    actual: other.tag_name(),
                })
            }
        };
        let nat = self.name_and_type(nat_index)?;
        Ok(MemberRef {
            class_name: self.class_name(class_index)?.to_string(),
            name: nat.name,
            descriptor: nat.descriptor,
        })
    }

    pub fn fieldref(&self, index: CpIndex) -> Result<MemberRef, FormatError> {
        self.member_ref(index, "Fieldref")
    }

    pub fn methodref(&self, index: CpIndex) -> Result<MemberRef, FormatError> {
        self.member_ref(index, "Methodref")
    }

    pub fn interface_methodref(&self, index: CpIndex) -> Result<MemberRef, FormatError> {
        self.member_ref(index, "InterfaceMethodref")
    }

    /// Either a `Methodref` or `InterfaceMethodref` — `invokedynamic`
    /// bootstrap method handles may reference either (§4.6).
    pub fn any_methodref(&self, index: CpIndex) -> Result<MemberRef, FormatError> {
        self.member_ref(index, "Methodref")
            .or_else(|_| self.member_ref(index, "InterfaceMethodref"))
    }

    pub fn method_handle(&self, index: CpIndex) -> Result<(MethodHandleKind, CpIndex), FormatError> {
        match self.get(index)? {
            Constant::MethodHandle { kind, reference_index } => Ok((*kind, *reference_index)),
            other => Err(FormatError::WrongConstantKind { index, expected: "MethodHandle", actual: other.tag_name() }),
        }
    }

    pub fn method_type(&self, index: CpIndex) -> Result<&str, FormatError> {
        match self.get(index)? {
            Constant::MethodType { descriptor_index } => self.utf8(*descriptor_index),
            other => Err(FormatError::WrongConstantKind { index, expected: "MethodType", actual: other.tag_name() }),
        }
    }

    pub fn invoke_dynamic(&self, index: CpIndex) -> Result<(u16, NameAndType), FormatError> {
        match self.get(index)? {
            Constant::InvokeDynamic { bootstrap_method_attr_index, name_and_type_index } => {
                Ok((*bootstrap_method_attr_index, self.name_and_type(*name_and_type_index)?))
            }
            other => Err(FormatError::WrongConstantKind { index, expected: "InvokeDynamic", actual: other.tag_name() }),
        }
    }

    pub fn find_utf8_index(&self, s: &str) -> Option<CpIndex> {
        self.utf8_index.get(s).copied()
    }
}

/// Decode the modified-UTF-8 byte sequence used by `Utf8` constants
/// (§6), including the 6-byte supplementary-character surrogate-pair
/// encoding (`ED A0..AF 80..BF ED B0..BF 80..BF`, JVMS §4.4.7).
pub fn decode_modified_utf8(bytes: &[u8], pos: Pos) -> Result<String, FormatError> {
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i];
        if b0 & 0x80 == 0 {
            out.push(b0 as char);
            i += 1;
        } else if b0 & 0xE0 == 0xC0 && i + 1 < bytes.len() {
            let b1 = bytes[i + 1];
            let cp = (((b0 & 0x1F) as u32) << 6) | (b1 & 0x3F) as u32;
            out.push(char::from_u32(cp).unwrap_or('\u{FFFD}'));
            i += 2;
        } else if b0 == 0xED && i + 5 < bytes.len() && bytes[i + 3] == 0xED {
            // Supplementary character surrogate pair.
            let (b1, b2) = (bytes[i + 1], bytes[i + 2]);
            let (b4, b5) = (bytes[i + 4], bytes[i + 5]);
            let high = 0x10000u32
                + (((b1 & 0x0F) as u32) << 16)
                + (((b2 & 0x3F) as u32) << 10)
                + (((b4 & 0x0F) as u32) << 6)
                + (b5 & 0x3F) as u32;
            out.push(char::from_u32(high).unwrap_or('\u{FFFD}'));
            i += 6;
        } else if b0 & 0xF0 == 0xE0 && i + 2 < bytes.len() {
            let (b1, b2) = (bytes[i + 1], bytes[i + 2]);
            let cp = (((b0 & 0x0F) as u32) << 12) | (((b1 & 0x3F) as u32) << 6) | (b2 & 0x3F) as u32;
            out.push(char::from_u32(cp).unwrap_or('\u{FFFD}'));
            i += 3;
        } else {
            return Err(FormatError::InstructionFormat {
                pos,
                detail: format!("invalid modified-UTF-8 byte {b0:#04x} at offset {i}"),
            });
        }
    }
    Ok(out)
}
