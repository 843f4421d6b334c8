//! Descriptor parsing: field descriptors (`Lfoo/Bar;`, `[I`, `Z`, ...) and
//! method descriptors (`(ILjava/lang/String;)V`), §4.3.

use crate::error::FormatError;
use crate::pos::Pos;
use crate::qualified_name::QualifiedName;
use crate::types::lattice::{RefType, Type};
use crate::types::primitive::Primitive;

/// A parsed method descriptor: ordered parameter types and a return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub parameters: Vec<Type>,
    pub return_type: Type,
}

/// Parse a field descriptor (`B`, `Ljava/lang/String;`, `[[I`, ...).
pub fn parse_field_descriptor(descriptor: &str) -> Result<Type, FormatError> {
    let mut chars = descriptor.char_indices().peekable();
    let ty = parse_type(descriptor, &mut chars)?;
    if chars.peek().is_some() {
        return Err(FormatError::InvalidTypeName {
            pos: Pos::new(0),
            detail: format!("trailing characters after descriptor '{descriptor}'"),
        });
    }
    Ok(ty)
}

/// Parse a method descriptor `(params)return`.
pub fn parse_method_descriptor(descriptor: &str) -> Result<MethodDescriptor, FormatError> {
    let bytes = descriptor.as_bytes();
    if bytes.first() != Some(&b'(') {
        return Err(FormatError::IllegalMethodHeader {
            name: String::new(),
            descriptor: descriptor.to_string(),
            detail: "descriptor must start with '('".into(),
        });
    }
    let close = descriptor.find(')').ok_or_else(|| FormatError::IllegalMethodHeader {
        name: String::new(),
        descriptor: descriptor.to_string(),
        detail: "missing ')'".into(),
    })?;
    let params_str = &descriptor[1..close];
    let mut chars = params_str.char_indices().peekable();
    let mut parameters = Vec::new();
    while chars.peek().is_some() {
        parameters.push(parse_type(params_str, &mut chars)?);
    }
    let return_type = parse_field_descriptor_allow_void(&descriptor[close + 1..])?;
    Ok(MethodDescriptor {
        parameters,
        return_type,
    })
}

fn parse_field_descriptor_allow_void(descriptor: &str) -> Result<Type, FormatError> {
    if descriptor == "V" {
        return Ok(Type::Primitive(Primitive::Void));
    }
    parse_field_descriptor(descriptor)
}

type Chars<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

fn parse_type(full: &str, chars: &mut Chars) -> Result<Type, FormatError> {
    let (_, c) = chars.next().ok_or_else(|| FormatError::InvalidTypeName {
        pos: Pos::new(0),
        detail: format!("unexpected end of descriptor '{full}'"),
    })?;

    if let Some(p) = Primitive::from_descriptor_char(c) {
        return Ok(Type::Primitive(p));
    }

    match c {
        'L' => {
            let start = chars.peek().map(|(i, _)| *i).unwrap_or(full.len());
            let mut end = full.len();
            for (i, ch) in chars.by_ref() {
                if ch == ';' {
                    end = i;
                    break;
                }
            }
            if end == full.len() && !full.ends_with(';') {
                return Err(FormatError::InvalidTypeName {
                    pos: Pos::new(0),
                    detail: format!("unterminated class descriptor in '{full}'"),
                });
            }
            let internal = &full[start..end];
            Ok(Type::class(QualifiedName::parse(internal)))
        }
        '[' => {
            let mut nesting = 0u8;
            let mut element = parse_type(full, chars)?;
            // collapse additional leading '[' that parse_type already consumed
            // recursively by unwrapping nested arrays it may have produced.
            while let Type::Reference(RefType::Array { element: inner, nesting: inner_nesting }) = element {
                nesting = nesting.saturating_add(inner_nesting + 1);
                element = *inner;
            }
            Ok(Type::array(element, nesting))
        }
        other => Err(FormatError::InvalidTypeName {
            pos: Pos::new(0),
            detail: format!("unexpected descriptor character '{other}' in '{full}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_descriptor() {
        assert_eq!(parse_field_descriptor("I").unwrap(), Type::Primitive(Primitive::Int));
    }

    #[test]
    fn class_descriptor() {
        let ty = parse_field_descriptor("Ljava/lang/String;").unwrap();
        match ty {
            Type::Reference(RefType::Class { name, .. }) => assert_eq!(name.internal(), "java/lang/String"),
            _ => panic!("expected class type"),
        }
    }

    #[test]
    fn array_descriptor() {
        let ty = parse_field_descriptor("[[I").unwrap();
        match ty {
            Type::Reference(RefType::Array { element, nesting }) => {
                assert_eq!(nesting, 1);
                assert_eq!(*element, Type::Primitive(Primitive::Int));
            }
            _ => panic!("expected array type"),
        }
    }

    #[test]
    fn method_descriptor_with_mixed_params() {
        let md = parse_method_descriptor("(ILjava/lang/String;[B)Z").unwrap();
        assert_eq!(md.parameters.len(), 3);
        assert_eq!(md.parameters[0], Type::Primitive(Primitive::Int));
        assert_eq!(md.return_type, Type::Primitive(Primitive::Boolean));
    }

    #[test]
    fn method_descriptor_void_no_args() {
        let md = parse_method_descriptor("()V").unwrap();
        assert!(md.parameters.is_empty());
        assert_eq!(md.return_type, Type::Primitive(Primitive::Void));
    }
}
