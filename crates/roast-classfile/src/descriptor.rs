//! Field and method descriptor parsing.

/// A parsed field type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    /// Internal class name, e.g. `java/lang/String`.
    Object(String),
    /// Full array descriptor, e.g. `[I` or `[Ljava/lang/String;`.
    Array(String),
}

impl FieldType {
    /// Local variable slots the value occupies.
    pub fn slot_width(&self) -> u16 {
        match self {
            Self::Long | Self::Double => 2,
            _ => 1,
        }
    }
}

/// A parsed method descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub params: Vec<FieldType>,
    /// `None` for `void`.
    pub ret: Option<FieldType>,
}

impl MethodDescriptor {
    /// Local variable slots taken by the parameters (receiver excluded).
    pub fn param_slots(&self) -> u16 {
        self.params.iter().map(FieldType::slot_width).sum()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid descriptor {descriptor:?} at {offset}")]
pub struct DescriptorError {
    pub descriptor: String,
    pub offset: usize,
}

fn parse_field_at(desc: &str, start: usize) -> Option<(FieldType, usize)> {
    let bytes = desc.as_bytes();
    let ty = match *bytes.get(start)? {
        b'B' => FieldType::Byte,
        b'C' => FieldType::Char,
        b'D' => FieldType::Double,
        b'F' => FieldType::Float,
        b'I' => FieldType::Int,
        b'J' => FieldType::Long,
        b'S' => FieldType::Short,
        b'Z' => FieldType::Boolean,
        b'L' => {
            let end = start + desc[start..].find(';')?;
            if end == start + 1 {
                return None;
            }
            return Some((FieldType::Object(desc[start + 1..end].to_string()), end + 1));
        }
        b'[' => {
            let mut elem = start;
            while bytes.get(elem) == Some(&b'[') {
                elem += 1;
            }
            let (_, end) = parse_field_at(desc, elem)?;
            return Some((FieldType::Array(desc[start..end].to_string()), end));
        }
        _ => return None,
    };
    Some((ty, start + 1))
}

/// Parse a single field descriptor such as `J` or `[Ljava/lang/String;`.
pub fn parse_field(desc: &str) -> Result<FieldType, DescriptorError> {
    match parse_field_at(desc, 0) {
        Some((ty, end)) if end == desc.len() => Ok(ty),
        Some((_, end)) => Err(DescriptorError {
            descriptor: desc.to_string(),
            offset: end,
        }),
        None => Err(DescriptorError {
            descriptor: desc.to_string(),
            offset: 0,
        }),
    }
}

/// Parse a method descriptor such as `(IJLjava/lang/String;)V`.
pub fn parse_method(desc: &str) -> Result<MethodDescriptor, DescriptorError> {
    let err = |offset| DescriptorError {
        descriptor: desc.to_string(),
        offset,
    };

    if !desc.starts_with('(') {
        return Err(err(0));
    }
    let mut pos = 1;
    let mut params = Vec::new();
    loop {
        match desc.as_bytes().get(pos) {
            Some(b')') => break,
            Some(_) => {
                let (ty, next) = parse_field_at(desc, pos).ok_or_else(|| err(pos))?;
                params.push(ty);
                pos = next;
            }
            None => return Err(err(pos)),
        }
    }
    pos += 1;

    let ret = if desc[pos..] == *"V" {
        None
    } else {
        match parse_field_at(desc, pos) {
            Some((ty, end)) if end == desc.len() => Some(ty),
            _ => return Err(err(pos)),
        }
    };

    Ok(MethodDescriptor { params, ret })
}
