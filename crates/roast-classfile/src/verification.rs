//! Verification types as they appear on the wire.

use super::constants::vtag;
use super::ids::CpIndex;

/// A resolved `verification_type_info`.
///
/// Object types carry the constant pool index of their CONSTANT_Class entry;
/// uninitialized values carry the offset of the `new` that created them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VerificationType {
    Top,
    Integer,
    Float,
    Long,
    Double,
    Null,
    UninitializedThis,
    Object(CpIndex),
    Uninitialized(u16),
}

impl VerificationType {
    #[inline]
    pub fn tag(self) -> u8 {
        match self {
            Self::Top => vtag::TOP,
            Self::Integer => vtag::INTEGER,
            Self::Float => vtag::FLOAT,
            Self::Long => vtag::LONG,
            Self::Double => vtag::DOUBLE,
            Self::Null => vtag::NULL,
            Self::UninitializedThis => vtag::UNINITIALIZED_THIS,
            Self::Object(_) => vtag::OBJECT,
            Self::Uninitialized(_) => vtag::UNINITIALIZED,
        }
    }

    /// Long and double occupy two local slots but are written once.
    #[inline]
    pub fn is_wide(self) -> bool {
        matches!(self, Self::Long | Self::Double)
    }

    /// Encoded size in bytes.
    #[inline]
    pub fn encoded_len(self) -> usize {
        match self {
            Self::Object(_) | Self::Uninitialized(_) => 3,
            _ => 1,
        }
    }

    /// Decode one entry, returning it and the number of bytes consumed.
    pub fn read(bytes: &[u8]) -> Option<(Self, usize)> {
        let operand = || -> Option<u16> {
            Some(u16::from_be_bytes([*bytes.get(1)?, *bytes.get(2)?]))
        };
        let ty = match *bytes.first()? {
            vtag::TOP => Self::Top,
            vtag::INTEGER => Self::Integer,
            vtag::FLOAT => Self::Float,
            vtag::DOUBLE => Self::Double,
            vtag::LONG => Self::Long,
            vtag::NULL => Self::Null,
            vtag::UNINITIALIZED_THIS => Self::UninitializedThis,
            vtag::OBJECT => return Some((Self::Object(CpIndex(operand()?)), 3)),
            vtag::UNINITIALIZED => return Some((Self::Uninitialized(operand()?), 3)),
            _ => return None,
        };
        Some((ty, 1))
    }
}

/// Append the wire form of `ty`: one tag byte, plus a u2 operand for object
/// and uninitialized types.
///
/// Every place that writes verification types goes through this function.
pub fn encode_verification_type(out: &mut Vec<u8>, ty: VerificationType) {
    out.push(ty.tag());
    match ty {
        VerificationType::Object(index) => out.extend_from_slice(&index.to_be_bytes()),
        VerificationType::Uninitialized(offset) => out.extend_from_slice(&offset.to_be_bytes()),
        _ => {}
    }
}
