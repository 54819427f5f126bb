//! StackMapTable frames.

use super::constants::frame_type as ft;
use super::verification::{VerificationType, encode_verification_type};

/// One `stack_map_frame` entry.
///
/// `Same` and `SameLocals1StackItem` pick their compact or extended wire form
/// from the delta when written; the reader folds both forms back into the
/// same variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StackMapFrame {
    Same {
        offset_delta: u16,
    },
    SameLocals1StackItem {
        offset_delta: u16,
        stack: VerificationType,
    },
    Chop {
        offset_delta: u16,
        k: u8,
    },
    Append {
        offset_delta: u16,
        locals: Vec<VerificationType>,
    },
    Full {
        offset_delta: u16,
        locals: Vec<VerificationType>,
        stack: Vec<VerificationType>,
    },
}

impl StackMapFrame {
    pub fn offset_delta(&self) -> u16 {
        match *self {
            Self::Same { offset_delta }
            | Self::SameLocals1StackItem { offset_delta, .. }
            | Self::Chop { offset_delta, .. }
            | Self::Append { offset_delta, .. }
            | Self::Full { offset_delta, .. } => offset_delta,
        }
    }

    /// Short name used by dumps and logs.
    pub fn kind_name(&self) -> &'static str {
        let compact = self.offset_delta() <= ft::COMPACT_DELTA_MAX;
        match self {
            Self::Same { .. } if compact => "same",
            Self::Same { .. } => "same_extended",
            Self::SameLocals1StackItem { .. } if compact => "same_locals_1",
            Self::SameLocals1StackItem { .. } => "same_locals_1_extended",
            Self::Chop { .. } => "chop",
            Self::Append { .. } => "append",
            Self::Full { .. } => "full",
        }
    }

    /// Append the wire form of this frame to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        match self {
            Self::Same { offset_delta } => {
                if *offset_delta <= ft::COMPACT_DELTA_MAX {
                    out.push(*offset_delta as u8);
                } else {
                    out.push(ft::SAME_EXTENDED);
                    out.extend_from_slice(&offset_delta.to_be_bytes());
                }
            }
            Self::SameLocals1StackItem {
                offset_delta,
                stack,
            } => {
                if *offset_delta <= ft::COMPACT_DELTA_MAX {
                    out.push(ft::SAME_LOCALS_1_STACK_ITEM + *offset_delta as u8);
                } else {
                    out.push(ft::SAME_LOCALS_1_STACK_ITEM_EXTENDED);
                    out.extend_from_slice(&offset_delta.to_be_bytes());
                }
                encode_verification_type(out, *stack);
            }
            Self::Chop { offset_delta, k } => {
                out.push(ft::SAME_EXTENDED - k);
                out.extend_from_slice(&offset_delta.to_be_bytes());
            }
            Self::Append {
                offset_delta,
                locals,
            } => {
                out.push(ft::SAME_EXTENDED + locals.len() as u8);
                out.extend_from_slice(&offset_delta.to_be_bytes());
                for &local in locals {
                    encode_verification_type(out, local);
                }
            }
            Self::Full {
                offset_delta,
                locals,
                stack,
            } => {
                out.push(ft::FULL);
                out.extend_from_slice(&offset_delta.to_be_bytes());
                out.extend_from_slice(&(locals.len() as u16).to_be_bytes());
                for &local in locals {
                    encode_verification_type(out, local);
                }
                out.extend_from_slice(&(stack.len() as u16).to_be_bytes());
                for &item in stack {
                    encode_verification_type(out, item);
                }
            }
        }
    }

    /// Decode one frame, returning it and the number of bytes consumed.
    pub fn read(bytes: &[u8]) -> Option<(Self, usize)> {
        let mut r = Cursor { bytes, pos: 0 };
        let tag = r.u1()?;
        let frame = match tag {
            0..=ft::SAME_MAX => Self::Same {
                offset_delta: tag as u16,
            },
            ft::SAME_LOCALS_1_STACK_ITEM..=ft::SAME_LOCALS_1_STACK_ITEM_MAX => {
                Self::SameLocals1StackItem {
                    offset_delta: (tag - ft::SAME_LOCALS_1_STACK_ITEM) as u16,
                    stack: r.vtype()?,
                }
            }
            ft::SAME_LOCALS_1_STACK_ITEM_EXTENDED => {
                let offset_delta = r.u2()?;
                Self::SameLocals1StackItem {
                    offset_delta,
                    stack: r.vtype()?,
                }
            }
            ft::CHOP_MIN..=250 => Self::Chop {
                offset_delta: r.u2()?,
                k: ft::SAME_EXTENDED - tag,
            },
            ft::SAME_EXTENDED => Self::Same {
                offset_delta: r.u2()?,
            },
            252..=ft::APPEND_MAX => {
                let offset_delta = r.u2()?;
                let locals = (0..tag - ft::SAME_EXTENDED)
                    .map(|_| r.vtype())
                    .collect::<Option<Vec<_>>>()?;
                Self::Append {
                    offset_delta,
                    locals,
                }
            }
            ft::FULL => {
                let offset_delta = r.u2()?;
                let nlocals = r.u2()?;
                let locals = (0..nlocals)
                    .map(|_| r.vtype())
                    .collect::<Option<Vec<_>>>()?;
                let nstack = r.u2()?;
                let stack = (0..nstack).map(|_| r.vtype()).collect::<Option<Vec<_>>>()?;
                Self::Full {
                    offset_delta,
                    locals,
                    stack,
                }
            }
            _ => return None,
        };
        Some((frame, r.pos))
    }

    /// Decode the body of a StackMapTable attribute (count + frames).
    pub fn read_table(info: &[u8]) -> Option<Vec<Self>> {
        let count = u16::from_be_bytes([*info.first()?, *info.get(1)?]) as usize;
        let mut pos = 2;
        let mut frames = Vec::with_capacity(count);
        for _ in 0..count {
            let (frame, len) = Self::read(info.get(pos..)?)?;
            frames.push(frame);
            pos += len;
        }
        (pos == info.len()).then_some(frames)
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn u1(&mut self) -> Option<u8> {
        let b = *self.bytes.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    fn u2(&mut self) -> Option<u16> {
        let hi = self.u1()?;
        let lo = self.u1()?;
        Some(u16::from_be_bytes([hi, lo]))
    }

    fn vtype(&mut self) -> Option<VerificationType> {
        let (ty, len) = VerificationType::read(self.bytes.get(self.pos..)?)?;
        self.pos += len;
        Some(ty)
    }
}
