//! Configuration for class file emission.

use roast_classfile::MajorVersion;
use serde::{Deserialize, Serialize};

/// Platform release whose class file version is written.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum TargetVersion {
    #[serde(rename = "1.1")]
    Jdk1_1,
    #[serde(rename = "1.2")]
    Jdk1_2,
    #[serde(rename = "1.3")]
    Jdk1_3,
    #[serde(rename = "1.4")]
    Jdk1_4,
    #[serde(rename = "1.5")]
    Jdk1_5,
    #[serde(rename = "1.6")]
    Jdk1_6,
    #[serde(rename = "1.7")]
    Jdk1_7,
    #[default]
    #[serde(rename = "1.8")]
    Jdk1_8,
    #[serde(rename = "9")]
    Jdk9,
    #[serde(rename = "10")]
    Jdk10,
    #[serde(rename = "11")]
    Jdk11,
    #[serde(rename = "17")]
    Jdk17,
}

impl TargetVersion {
    pub fn major_version(self) -> MajorVersion {
        match self {
            Self::Jdk1_1 => MajorVersion::Jdk1_1,
            Self::Jdk1_2 => MajorVersion::Jdk1_2,
            Self::Jdk1_3 => MajorVersion::Jdk1_3,
            Self::Jdk1_4 => MajorVersion::Jdk1_4,
            Self::Jdk1_5 => MajorVersion::Jdk1_5,
            Self::Jdk1_6 => MajorVersion::Jdk1_6,
            Self::Jdk1_7 => MajorVersion::Jdk1_7,
            Self::Jdk1_8 => MajorVersion::Jdk1_8,
            Self::Jdk9 => MajorVersion::Jdk9,
            Self::Jdk10 => MajorVersion::Jdk10,
            Self::Jdk11 => MajorVersion::Jdk11,
            Self::Jdk17 => MajorVersion::Jdk17,
        }
    }
}

/// Options controlling what the emitter writes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitOptions {
    /// Class file version to target
    pub(crate) target: TargetVersion,
    /// Whether to write LineNumberTable attributes
    pub(crate) line_numbers: bool,
    /// Whether to write LocalVariableTable and LocalVariableTypeTable attributes
    pub(crate) local_variables: bool,
    /// Whether to write the SourceFile attribute
    pub(crate) source_file: bool,
    /// Whether to write StackMapTable attributes (ignored before 1.6)
    pub(crate) stack_maps: bool,
    /// Number of reusable emitters kept by an [`EmitterPool`](crate::EmitterPool)
    pub(crate) pool_capacity: usize,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            target: TargetVersion::default(),
            line_numbers: true,
            local_variables: true,
            source_file: true,
            stack_maps: true,
            pool_capacity: 25,
        }
    }
}

impl EmitOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target version.
    pub fn target(mut self, value: TargetVersion) -> Self {
        self.target = value;
        self
    }

    /// Set whether to write line number tables.
    pub fn line_numbers(mut self, value: bool) -> Self {
        self.line_numbers = value;
        self
    }

    /// Set whether to write local variable tables.
    pub fn local_variables(mut self, value: bool) -> Self {
        self.local_variables = value;
        self
    }

    /// Set whether to write the source file attribute.
    pub fn source_file(mut self, value: bool) -> Self {
        self.source_file = value;
        self
    }

    /// Set whether to write stack map tables.
    pub fn stack_maps(mut self, value: bool) -> Self {
        self.stack_maps = value;
        self
    }

    /// Set the emitter pool capacity.
    pub fn pool_capacity(mut self, value: usize) -> Self {
        self.pool_capacity = value;
        self
    }

    pub fn version(&self) -> MajorVersion {
        self.target.major_version()
    }

    pub fn pool_size(&self) -> usize {
        self.pool_capacity
    }

    /// Generic signatures, annotations and the ACC_SYNTHETIC flag.
    pub(crate) fn generics(&self) -> bool {
        self.version().supports_generics()
    }

    pub(crate) fn writes_stack_maps(&self) -> bool {
        self.stack_maps && self.version().supports_stack_maps()
    }
}
