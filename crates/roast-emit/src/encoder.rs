//! Shared encoder state and the attribute writing protocol.
//!
//! Every attribute goes through [`Encoder::attribute`]: the name index and a
//! length placeholder are written, the payload writer runs, and the result
//! decides whether the bytes are kept. A writer that hits a null binding (or
//! has nothing to say) leaves no trace in the buffer.

use super::buffer::{Body, EmitBuffer, U2Slot};
use super::constant_pool::ConstantPool;
use super::diagnostics::{DiagnosticKind, EmitDiagnostic};
use super::error::Failure;
use super::options::EmitOptions;

/// Initial capacity of a fresh body buffer.
const BODY_CAPACITY: usize = 4096;

/// Buffers, pool and diagnostics shared by the member encoders.
#[derive(Debug)]
pub(crate) struct Encoder {
    pub body: EmitBuffer<Body>,
    pub pool: ConstantPool,
    pub options: EmitOptions,
    pub diagnostics: Vec<EmitDiagnostic>,
    /// `name descriptor` of the member being encoded
    pub member: Option<String>,
}

/// An open count-prefixed attribute list.
#[derive(Debug)]
#[must_use = "attribute list must be closed with end_attributes"]
pub(crate) struct AttributeList {
    count: U2Slot,
    len: u16,
}

impl Encoder {
    pub fn new(options: EmitOptions) -> Self {
        Self {
            body: EmitBuffer::with_capacity(BODY_CAPACITY),
            pool: ConstantPool::new(),
            options,
            diagnostics: Vec::new(),
            member: None,
        }
    }

    pub fn reset(&mut self) {
        self.body.clear();
        self.pool.clear();
        self.diagnostics.clear();
        self.member = None;
    }

    pub fn report(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let diagnostic = EmitDiagnostic::new(kind, self.member.clone(), message);
        log::debug!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    pub fn begin_attributes(&mut self) -> AttributeList {
        AttributeList {
            count: self.body.reserve_u2(),
            len: 0,
        }
    }

    pub fn end_attributes(&mut self, list: AttributeList) {
        self.body.patch_u2(list.count, list.len);
    }

    /// Write one attribute, keeping it only if `write` returns `Ok(true)`.
    ///
    /// `Ok(false)` drops the attribute silently. `Failure::Unresolved` drops it
    /// with a warning. Any other failure drops it and propagates.
    pub fn attribute(
        &mut self,
        list: &mut AttributeList,
        name: &str,
        write: impl FnOnce(&mut Self) -> Result<bool, Failure>,
    ) -> Result<(), Failure> {
        let mark = self.body.mark();
        let name_index = self.pool.utf8(name)?;
        self.body.u2(name_index.get());
        let length = self.body.reserve_u4();

        match write(self) {
            Ok(true) => {
                self.body.patch_length(length);
                list.len += 1;
                log::trace!("attribute {name}: {} bytes", self.body.len() - mark.offset());
                Ok(())
            }
            Ok(false) => {
                self.body.rewind(mark);
                Ok(())
            }
            Err(Failure::Unresolved(what)) => {
                self.body.rewind(mark);
                self.report(
                    DiagnosticKind::AttributeSkipped,
                    format!("{name} dropped: unresolved {what}"),
                );
                Ok(())
            }
            Err(e) => {
                self.body.rewind(mark);
                Err(e)
            }
        }
    }

    /// Attribute with no payload.
    pub fn marker_attribute(&mut self, list: &mut AttributeList, name: &str) -> Result<(), Failure> {
        self.attribute(list, name, |_| Ok(true))
    }
}
