//! Class file wire constants.

/// Magic bytes at the start of every class file.
pub const MAGIC: u32 = 0xCAFE_BABE;

/// Largest value a u2 count or index field can hold.
pub const MAX_U2: usize = u16::MAX as usize;

/// Maximum encoded length of a CONSTANT_Utf8 payload.
pub const MAX_UTF8_LEN: usize = u16::MAX as usize;

/// Maximum length of a method's instruction block.
pub const MAX_CODE_LEN: usize = u16::MAX as usize;

/// Constant pool entries are numbered from 1; the count field holds `entries + 1`.
pub const MAX_POOL_COUNT: usize = u16::MAX as usize;

/// Constant pool tags.
pub mod tag {
    pub const UTF8: u8 = 1;
    pub const INTEGER: u8 = 3;
    pub const FLOAT: u8 = 4;
    pub const LONG: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const CLASS: u8 = 7;
    pub const STRING: u8 = 8;
    pub const FIELD_REF: u8 = 9;
    pub const METHOD_REF: u8 = 10;
    pub const INTERFACE_METHOD_REF: u8 = 11;
    pub const NAME_AND_TYPE: u8 = 12;
}

/// Attribute names.
pub mod attr {
    pub const ANNOTATION_DEFAULT: &str = "AnnotationDefault";
    pub const CODE: &str = "Code";
    pub const CONSTANT_VALUE: &str = "ConstantValue";
    pub const DEPRECATED: &str = "Deprecated";
    pub const ENCLOSING_METHOD: &str = "EnclosingMethod";
    pub const EXCEPTIONS: &str = "Exceptions";
    pub const INCONSISTENT_HIERARCHY: &str = "InconsistentHierarchy";
    pub const INNER_CLASSES: &str = "InnerClasses";
    pub const LINE_NUMBER_TABLE: &str = "LineNumberTable";
    pub const LOCAL_VARIABLE_TABLE: &str = "LocalVariableTable";
    pub const LOCAL_VARIABLE_TYPE_TABLE: &str = "LocalVariableTypeTable";
    pub const RUNTIME_INVISIBLE_ANNOTATIONS: &str = "RuntimeInvisibleAnnotations";
    pub const RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS: &str =
        "RuntimeInvisibleParameterAnnotations";
    pub const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
    pub const RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS: &str = "RuntimeVisibleParameterAnnotations";
    pub const SIGNATURE: &str = "Signature";
    pub const SOURCE_FILE: &str = "SourceFile";
    pub const STACK_MAP_TABLE: &str = "StackMapTable";
    pub const SYNTHETIC: &str = "Synthetic";
}

/// StackMapTable frame type ranges.
pub mod frame_type {
    /// `0..=63`: same_frame, delta in the tag.
    pub const SAME_MAX: u8 = 63;
    /// `64..=127`: same_locals_1_stack_item_frame, delta is `tag - 64`.
    pub const SAME_LOCALS_1_STACK_ITEM: u8 = 64;
    pub const SAME_LOCALS_1_STACK_ITEM_MAX: u8 = 127;
    pub const SAME_LOCALS_1_STACK_ITEM_EXTENDED: u8 = 247;
    /// `248..=250`: chop_frame, removed count is `251 - tag`.
    pub const CHOP_MIN: u8 = 248;
    pub const SAME_EXTENDED: u8 = 251;
    /// `252..=254`: append_frame, added count is `tag - 251`.
    pub const APPEND_MAX: u8 = 254;
    pub const FULL: u8 = 255;
    /// Largest delta that fits the compact same/same-locals forms.
    pub const COMPACT_DELTA_MAX: u16 = 63;
    /// Chop and append carry at most three locals.
    pub const MAX_CHOP_APPEND: usize = 3;
}

/// Verification type tags.
pub mod vtag {
    pub const TOP: u8 = 0;
    pub const INTEGER: u8 = 1;
    pub const FLOAT: u8 = 2;
    pub const DOUBLE: u8 = 3;
    pub const LONG: u8 = 4;
    pub const NULL: u8 = 5;
    pub const UNINITIALIZED_THIS: u8 = 6;
    pub const OBJECT: u8 = 7;
    pub const UNINITIALIZED: u8 = 8;
}

/// Annotation element value tags.
pub mod element_tag {
    pub const BYTE: u8 = b'B';
    pub const CHAR: u8 = b'C';
    pub const DOUBLE: u8 = b'D';
    pub const FLOAT: u8 = b'F';
    pub const INT: u8 = b'I';
    pub const LONG: u8 = b'J';
    pub const SHORT: u8 = b'S';
    pub const BOOLEAN: u8 = b'Z';
    pub const STRING: u8 = b's';
    pub const ENUM: u8 = b'e';
    pub const CLASS: u8 = b'c';
    pub const ANNOTATION: u8 = b'@';
    pub const ARRAY: u8 = b'[';
}

/// Opcodes the emitter writes on its own (placeholder stubs).
pub mod opcode {
    pub const LDC: u8 = 0x12;
    pub const LDC_W: u8 = 0x13;
    pub const ATHROW: u8 = 0xBF;
    pub const DUP: u8 = 0x59;
    pub const INVOKESPECIAL: u8 = 0xB7;
    pub const NEW: u8 = 0xBB;
}

/// Class file major versions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum MajorVersion {
    Jdk1_1 = 45,
    Jdk1_2 = 46,
    Jdk1_3 = 47,
    Jdk1_4 = 48,
    Jdk1_5 = 49,
    Jdk1_6 = 50,
    Jdk1_7 = 51,
    Jdk1_8 = 52,
    Jdk9 = 53,
    Jdk10 = 54,
    Jdk11 = 55,
    Jdk17 = 61,
}

impl MajorVersion {
    #[inline]
    pub fn major(self) -> u16 {
        self as u16
    }

    /// Minor version paired with this major (1.1 uses 3).
    #[inline]
    pub fn minor(self) -> u16 {
        match self {
            Self::Jdk1_1 => 3,
            _ => 0,
        }
    }

    /// Signature, annotations and the ACC_SYNTHETIC flag.
    #[inline]
    pub fn supports_generics(self) -> bool {
        self >= Self::Jdk1_5
    }

    #[inline]
    pub fn supports_stack_maps(self) -> bool {
        self >= Self::Jdk1_6
    }

    pub fn from_major(major: u16) -> Option<Self> {
        Some(match major {
            45 => Self::Jdk1_1,
            46 => Self::Jdk1_2,
            47 => Self::Jdk1_3,
            48 => Self::Jdk1_4,
            49 => Self::Jdk1_5,
            50 => Self::Jdk1_6,
            51 => Self::Jdk1_7,
            52 => Self::Jdk1_8,
            53 => Self::Jdk9,
            54 => Self::Jdk10,
            55 => Self::Jdk11,
            61 => Self::Jdk17,
            _ => return None,
        })
    }
}
