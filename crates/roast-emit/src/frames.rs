//! StackMapTable construction.
//!
//! Frames arrive as slot-indexed snapshots at branch targets. Each one is
//! compared against the previous frame (the method's implicit initial frame
//! for the first) and written in the smallest form that expresses the
//! difference: same, same_locals_1_stack_item, append, chop, or full.

use roast_classfile::StackMapFrame;
use roast_classfile::constants::frame_type::MAX_CHOP_APPEND;
use roast_classfile::descriptor::{self, DescriptorError, FieldType};
use roast_classfile::VerificationType;

use super::constant_pool::{ConstantPool, PoolError};
use super::model::{FrameState, FrameType};

/// A frame with its types resolved against the constant pool.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedFrame {
    pub offset: u16,
    /// Slot-indexed, wide types followed by `Top`
    pub locals: Vec<VerificationType>,
    pub stack: Vec<VerificationType>,
}

/// Frames whose offsets do not strictly increase.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("frame at offset {offset} does not follow frame at offset {previous}")]
pub struct FrameOrderError {
    pub previous: u16,
    pub offset: u16,
}

/// Locals of the implicit frame at offset 0: the receiver, then the parameters.
///
/// Inside a constructor the receiver is uninitialized until the super
/// constructor runs, except in `java/lang/Object` which has no super.
pub fn initial_locals(
    owner: &str,
    method: &str,
    method_descriptor: &str,
    is_static: bool,
) -> Result<Vec<FrameType>, DescriptorError> {
    let parsed = descriptor::parse_method(method_descriptor)?;
    let mut locals = Vec::with_capacity(parsed.params.len() + 1);
    if !is_static {
        if method == "<init>" && owner != "java/lang/Object" {
            locals.push(FrameType::UninitializedThis);
        } else {
            locals.push(FrameType::object(owner));
        }
    }
    for param in parsed.params {
        match param {
            FieldType::Byte
            | FieldType::Char
            | FieldType::Short
            | FieldType::Boolean
            | FieldType::Int => locals.push(FrameType::Integer),
            FieldType::Float => locals.push(FrameType::Float),
            FieldType::Long => locals.extend([FrameType::Long, FrameType::Top]),
            FieldType::Double => locals.extend([FrameType::Double, FrameType::Top]),
            FieldType::Object(name) => locals.push(FrameType::Object(name)),
            FieldType::Array(descriptor) => locals.push(FrameType::Object(descriptor)),
        }
    }
    Ok(locals)
}

/// Resolve a frame type, interning object types as CONSTANT_Class.
pub fn resolve_type(ty: &FrameType, pool: &mut ConstantPool) -> Result<VerificationType, PoolError> {
    Ok(match ty {
        FrameType::Top => VerificationType::Top,
        FrameType::Integer => VerificationType::Integer,
        FrameType::Float => VerificationType::Float,
        FrameType::Long => VerificationType::Long,
        FrameType::Double => VerificationType::Double,
        FrameType::Null => VerificationType::Null,
        FrameType::UninitializedThis => VerificationType::UninitializedThis,
        FrameType::Object(name) => VerificationType::Object(pool.class(name)?),
        FrameType::Uninitialized(offset) => VerificationType::Uninitialized(*offset),
    })
}

pub fn resolve_types(
    types: &[FrameType],
    pool: &mut ConstantPool,
) -> Result<Vec<VerificationType>, PoolError> {
    types.iter().map(|t| resolve_type(t, pool)).collect()
}

pub fn resolve(frame: &FrameState, pool: &mut ConstantPool) -> Result<ResolvedFrame, PoolError> {
    Ok(ResolvedFrame {
        offset: frame.offset,
        locals: resolve_types(&frame.locals, pool)?,
        stack: resolve_types(&frame.stack, pool)?,
    })
}

/// Convert slot-indexed locals to their wire form.
///
/// The continuation slot after a long or double is implied and dropped, and
/// trailing `Top` entries carry no information.
pub fn wire_locals(slots: &[VerificationType]) -> Vec<VerificationType> {
    let mut out = Vec::with_capacity(slots.len());
    let mut i = 0;
    while i < slots.len() {
        let ty = slots[i];
        out.push(ty);
        i += if ty.is_wide() { 2 } else { 1 };
    }
    while out.last() == Some(&VerificationType::Top) {
        out.pop();
    }
    out
}

/// Choose the frame form for `current` given the previous frame's wire locals.
fn diff(
    offset_delta: u16,
    previous: &[VerificationType],
    locals: &[VerificationType],
    stack: &[VerificationType],
) -> StackMapFrame {
    if locals == previous {
        match stack {
            [] => return StackMapFrame::Same { offset_delta },
            [item] => {
                return StackMapFrame::SameLocals1StackItem {
                    offset_delta,
                    stack: *item,
                };
            }
            _ => {}
        }
    }

    if stack.is_empty() {
        if locals.len() > previous.len()
            && locals.len() - previous.len() <= MAX_CHOP_APPEND
            && locals.starts_with(previous)
        {
            return StackMapFrame::Append {
                offset_delta,
                locals: locals[previous.len()..].to_vec(),
            };
        }
        if previous.len() > locals.len()
            && previous.len() - locals.len() <= MAX_CHOP_APPEND
            && previous.starts_with(locals)
        {
            return StackMapFrame::Chop {
                offset_delta,
                k: (previous.len() - locals.len()) as u8,
            };
        }
    }

    StackMapFrame::Full {
        offset_delta,
        locals: locals.to_vec(),
        stack: stack.to_vec(),
    }
}

/// Compress resolved frames into their minimal-diff encoding.
///
/// `initial` holds the slot-indexed locals of the implicit frame at offset 0.
pub fn compress(
    initial: &[VerificationType],
    frames: &[ResolvedFrame],
) -> Result<Vec<StackMapFrame>, FrameOrderError> {
    let mut out = Vec::with_capacity(frames.len());
    let mut previous_locals = wire_locals(initial);
    let mut previous_offset: Option<u16> = None;

    for frame in frames {
        let offset_delta = match previous_offset {
            None => frame.offset,
            Some(previous) if frame.offset > previous => frame.offset - previous - 1,
            Some(previous) => {
                return Err(FrameOrderError {
                    previous,
                    offset: frame.offset,
                });
            }
        };
        let locals = wire_locals(&frame.locals);
        let encoded = diff(offset_delta, &previous_locals, &locals, &frame.stack);
        log::trace!(
            "frame at {}: {} delta={offset_delta}",
            frame.offset,
            encoded.kind_name()
        );
        out.push(encoded);
        previous_locals = locals;
        previous_offset = Some(frame.offset);
    }

    Ok(out)
}

/// Append the StackMapTable payload: a u2 frame count, then each frame.
pub fn write_table(frames: &[StackMapFrame], out: &mut Vec<u8>) {
    out.extend_from_slice(&(frames.len() as u16).to_be_bytes());
    for frame in frames {
        frame.write(out);
    }
}
