//! Diagnostics reported while emitting a type.
//!
//! Emission never fails for a single member: a broken member is replaced by a
//! placeholder and an unresolvable attribute is dropped. Both leave a
//! diagnostic behind so the driver can surface them.

use std::fmt;

/// Severity of an emission diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl Severity {
    pub fn is_error(self) -> bool {
        self == Self::Error
    }
}

/// What went wrong. Capacity kinds come first, then invariant violations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    // Fixed-width fields that would overflow
    CodeTooLarge,
    TooManyExceptions,
    TooManyLocalVariables,
    TooManyExceptionHandlers,
    TooManyLineEntries,
    TooManyInnerClasses,
    TooManyAnnotationEntries,
    StringTooLong,
    ConstantIndexOverflow,

    // Input that breaks an encoder invariant
    UnpairedExceptionRange,
    FrameOrder,
    InvalidDescriptor,

    // Carried from upstream analysis
    BrokenMember,

    // Attribute dropped after a null binding
    AttributeSkipped,
}

impl DiagnosticKind {
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::AttributeSkipped => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Base message for this kind.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::CodeTooLarge => "code of method is too large",
            Self::TooManyExceptions => "too many declared exceptions",
            Self::TooManyLocalVariables => "too many local variable entries",
            Self::TooManyExceptionHandlers => "too many exception handler entries",
            Self::TooManyLineEntries => "too many line number entries",
            Self::TooManyInnerClasses => "too many inner class entries",
            Self::TooManyAnnotationEntries => "annotation table overflows its count field",
            Self::StringTooLong => "string constant is too long",
            Self::ConstantIndexOverflow => "constant pool index does not fit its operand",
            Self::UnpairedExceptionRange => "exception range is not well paired",
            Self::FrameOrder => "stack map frames are not strictly ordered",
            Self::InvalidDescriptor => "invalid method descriptor",
            Self::BrokenMember => "member has compilation problems",
            Self::AttributeSkipped => "attribute dropped after an unresolved reference",
        }
    }
}

/// One diagnostic produced by the emitter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmitDiagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    /// `name descriptor` of the member, or `None` for type-level diagnostics.
    pub member: Option<String>,
    pub message: String,
}

impl EmitDiagnostic {
    /// An empty `message` is replaced by the kind's fallback message.
    pub fn new(kind: DiagnosticKind, member: Option<String>, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.is_empty() {
            message = kind.fallback_message().to_string();
        }
        Self {
            kind,
            severity: kind.default_severity(),
            member,
            message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for EmitDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match &self.member {
            Some(member) => write!(f, "{level}: {member}: {}", self.message),
            None => write!(f, "{level}: {}", self.message),
        }
    }
}
