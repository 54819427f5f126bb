//! Error types for class file emission.

use super::constant_pool::PoolError;
use super::diagnostics::DiagnosticKind;

/// A failure that aborts emission of the whole type.
///
/// Everything smaller (a skipped attribute, a member routed through the
/// placeholder path) is reported as an [`EmitDiagnostic`](crate::EmitDiagnostic)
/// on the emitted class instead.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum EmitError {
    #[error("constant pool is full (max 65535 slots)")]
    TooManyConstants,
    #[error("too many fields: {0} (max 65535)")]
    TooManyFields(usize),
    #[error("too many methods: {0} (max 65535)")]
    TooManyMethods(usize),
    #[error("too many interfaces: {0} (max 65535)")]
    TooManyInterfaces(usize),
    #[error("cannot encode {member}: {message}")]
    Unencodable { member: String, message: String },
    #[error("invalid descriptor for {member}: {descriptor:?}")]
    InvalidDescriptor { member: String, descriptor: String },
}

/// A failure that abandons one member.
///
/// The member is re-emitted through the placeholder path and the failure is
/// recorded as a diagnostic.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MemberFailure {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl MemberFailure {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of a failed write, ordered from the smallest unit that can absorb it.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Failure {
    /// A null binding: the enclosing attribute is rolled back and skipped.
    Unresolved(String),
    /// The member cannot be encoded as written.
    Member(MemberFailure),
    /// The type cannot be encoded at all.
    Type(EmitError),
}

impl Failure {
    pub fn unresolved(what: impl Into<String>) -> Self {
        Self::Unresolved(what.into())
    }

    pub fn member(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::Member(MemberFailure::new(kind, message))
    }
}

impl From<PoolError> for Failure {
    fn from(e: PoolError) -> Self {
        match e {
            PoolError::StringTooLong { len } => Self::member(
                DiagnosticKind::StringTooLong,
                format!("string constant is too long: {len} bytes encoded (max 65535)"),
            ),
            PoolError::Full => Self::Type(EmitError::TooManyConstants),
        }
    }
}

impl From<EmitError> for Failure {
    fn from(e: EmitError) -> Self {
        Self::Type(e)
    }
}
