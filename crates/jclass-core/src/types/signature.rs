//! Signature parsing: the generics-aware superset of descriptors used by
//! the `Signature` attribute (§4.3, §4.4).
//!
//! Signatures additionally accept `<...>` generic argument lists and
//! `T<name>;` type-variable references. This parser is intentionally
//! narrower than a full generics resolver (Non-goal: "producing a full
//! AST suitable for a compiler front-end") — it recovers enough
//! structure to render generic type arguments and bounds, not to check
//! them.

use crate::error::FormatError;
use crate::pos::Pos;
use crate::qualified_name::QualifiedName;
use crate::types::lattice::{RefType, Type};
use crate::types::primitive::Primitive;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub superclass: Type,
    pub interfaces: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSignature {
    pub field_type: Type,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub parameters: Vec<Type>,
    pub return_type: Type,
    pub throws: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParameter {
    pub name: String,
    pub bounds: Vec<Type>,
}

struct Cursor<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn err(&self, detail: impl Into<String>) -> FormatError {
        FormatError::InvalidSignature {
            pos: Pos::new(self.pos as u32),
            detail: detail.into(),
        }
    }

    fn take_until(&mut self, stop: u8) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == stop {
                break;
            }
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }
}

pub fn parse_class_signature(sig: &str) -> Result<ClassSignature, FormatError> {
    let mut c = Cursor::new(sig);
    let type_parameters = parse_optional_type_params(&mut c)?;
    let superclass = parse_type(&mut c)?;
    let mut interfaces = Vec::new();
    while c.peek() == Some(b'L') {
        interfaces.push(parse_type(&mut c)?);
    }
    Ok(ClassSignature {
        type_parameters,
        superclass,
        interfaces,
    })
}

pub fn parse_field_signature(sig: &str) -> Result<FieldSignature, FormatError> {
    let mut c = Cursor::new(sig);
    let field_type = parse_type(&mut c)?;
    Ok(FieldSignature { field_type })
}

pub fn parse_method_signature(sig: &str) -> Result<MethodSignature, FormatError> {
    let mut c = Cursor::new(sig);
    let type_parameters = parse_optional_type_params(&mut c)?;
    if !c.eat(b'(') {
        return Err(c.err("expected '(' starting method signature parameters"));
    }
    let mut parameters = Vec::new();
    while c.peek() != Some(b')') {
        if c.peek().is_none() {
            return Err(c.err("unterminated parameter list"));
        }
        parameters.push(parse_type(&mut c)?);
    }
    c.bump(); // ')'
    let return_type = if c.peek() == Some(b'V') {
        c.bump();
        Type::Primitive(Primitive::Void)
    } else {
        parse_type(&mut c)?
    };
    let mut throws = Vec::new();
    while c.eat(b'^') {
        throws.push(parse_type(&mut c)?);
    }
    Ok(MethodSignature {
        type_parameters,
        parameters,
        return_type,
        throws,
    })
}

fn parse_optional_type_params(c: &mut Cursor) -> Result<Vec<TypeParameter>, FormatError> {
    if !c.eat(b'<') {
        return Ok(Vec::new());
    }
    let mut params = Vec::new();
    while c.peek() != Some(b'>') {
        let name = c.take_until(b':').to_string();
        if !c.eat(b':') {
            return Err(c.err("expected ':' after type parameter name"));
        }
        let mut bounds = Vec::new();
        // class bound may be empty (e.g. `T::Ljava/lang/Comparable;`)
        if c.peek() != Some(b':') && c.peek() != Some(b'>') {
            bounds.push(parse_type(c)?);
        }
        while c.eat(b':') {
            bounds.push(parse_type(c)?);
        }
        params.push(TypeParameter { name, bounds });
    }
    c.bump(); // '>'
    Ok(params)
}

fn parse_type(c: &mut Cursor) -> Result<Type, FormatError> {
    match c.peek() {
        Some(b'[') => {
            c.bump();
            let mut nesting = 0u8;
            let mut element = parse_type(c)?;
            while let Type::Reference(RefType::Array { element: inner, nesting: inner_nesting }) = element {
                nesting = nesting.saturating_add(inner_nesting + 1);
                element = *inner;
            }
            Ok(Type::array(element, nesting))
        }
        Some(b'T') => {
            c.bump();
            let name = c.take_until(b';').to_string();
            if !c.eat(b';') {
                return Err(c.err("unterminated type variable reference"));
            }
            Ok(Type::Reference(RefType::TypeParameter(name)))
        }
        Some(b'L') => {
            c.bump();
            let start = c.pos;
            loop {
                match c.peek() {
                    Some(b';') => break,
                    Some(b'<') => {
                        // skip balanced generic argument list
                        let mut depth = 0i32;
                        loop {
                            match c.bump() {
                                Some(b'<') => depth += 1,
                                Some(b'>') => {
                                    depth -= 1;
                                    if depth == 0 {
                                        break;
                                    }
                                }
                                Some(_) => {}
                                None => return Err(c.err("unterminated generic argument list")),
                            }
                        }
                    }
                    Some(_) => {
                        c.bump();
                    }
                    None => return Err(c.err("unterminated class type signature")),
                }
            }
            let internal_with_generics = &c.src[start..c.pos];
            let internal = internal_with_generics
                .find('<')
                .map(|i| &internal_with_generics[..i])
                .unwrap_or(internal_with_generics);
            c.bump(); // ';'
            Ok(Type::class(QualifiedName::parse(internal)))
        }
        Some(ch) => {
            if let Some(p) = Primitive::from_descriptor_char(ch as char) {
                c.bump();
                Ok(Type::Primitive(p))
            } else {
                Err(c.err(format!("unexpected signature character '{}'", ch as char)))
            }
        }
        None => Err(c.err("unexpected end of signature")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_signature_generic_class() {
        let sig = parse_field_signature("Ljava/util/List<Ljava/lang/String;>;").unwrap();
        match sig.field_type {
            Type::Reference(RefType::Class { name, .. }) => assert_eq!(name.internal(), "java/util/List"),
            _ => panic!(),
        }
    }

    #[test]
    fn method_signature_with_type_param_and_throws() {
        let sig = parse_method_signature("<T:Ljava/lang/Object;>(TT;)V^Ljava/io/IOException;").unwrap();
        assert_eq!(sig.type_parameters.len(), 1);
        assert_eq!(sig.type_parameters[0].name, "T");
        assert_eq!(sig.parameters.len(), 1);
        assert_eq!(sig.throws.len(), 1);
    }

    #[test]
    fn class_signature_with_interfaces() {
        let sig = parse_class_signature("Ljava/lang/Object;Ljava/io/Serializable;").unwrap();
        assert_eq!(sig.interfaces.len(), 1);
    }
}
