//! Resolved input model handed to the emitter by semantic analysis.
//!
//! References are textual: internal class names (`java/lang/Object`), field
//! and method descriptors, generic signatures. A reference the upstream could
//! not resolve is `None` (a null binding); the emitter drops the attribute
//! that needed it rather than the whole member.

use super::diagnostics::Severity;

/// Byte range in the compilation unit's source text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SourceRange {
    pub start: u32,
    pub end: u32,
}

impl SourceRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, other: &SourceRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// A compilation problem reported by earlier phases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Problem {
    pub message: String,
    pub range: SourceRange,
    pub severity: Severity,
}

impl Problem {
    pub fn error(message: impl Into<String>, range: SourceRange) -> Self {
        Self {
            message: message.into(),
            range,
            severity: Severity::Error,
        }
    }
}

/// How a nested type is nested.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NestingKind {
    #[default]
    Member,
    Local,
    Anonymous,
}

/// One entry of the InnerClasses table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NestedType {
    /// Internal name of the nested type
    pub name: String,
    /// Enclosing type for member types; `None` for local and anonymous types
    pub outer: Option<String>,
    /// Simple name; `None` for anonymous types
    pub simple_name: Option<String>,
    /// Source modifiers of the nested type
    pub access: u16,
    pub kind: NestingKind,
}

/// EnclosingMethod link of a local or anonymous type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnclosingMethod {
    pub class: Option<String>,
    /// `(name, descriptor)`; `None` when enclosed by an initializer.
    pub method: Option<(String, String)>,
}

/// Annotation retention policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Retention {
    Source,
    #[default]
    Class,
    Runtime,
}

/// A resolved annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    /// Field descriptor of the annotation type, e.g. `Ljava/lang/Deprecated;`
    pub type_descriptor: Option<String>,
    pub retention: Retention,
    pub elements: Vec<ElementPair>,
}

impl Annotation {
    pub fn new(type_descriptor: &str, retention: Retention) -> Self {
        Self {
            type_descriptor: Some(type_descriptor.to_string()),
            retention,
            elements: Vec::new(),
        }
    }

    pub fn element(mut self, name: &str, declared: &str, value: ElementValue) -> Self {
        self.elements.push(ElementPair {
            name: name.to_string(),
            declared: declared.to_string(),
            value,
        });
        self
    }
}

/// `name = value` inside an annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementPair {
    pub name: String,
    /// Return descriptor of the annotation member. An array descriptor wraps a
    /// scalar value in a one-element array.
    pub declared: String,
    pub value: ElementValue,
}

/// Annotation element value.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementValue {
    Boolean(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Enum {
        type_descriptor: Option<String>,
        constant: String,
    },
    /// Class literal by return descriptor (`V` for `void.class`).
    Class(Option<String>),
    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),
    /// An expression the upstream could not resolve.
    Unresolved,
}

/// Compile-time constant of a field.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstantValue {
    Boolean(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

/// A symbolic constant referenced from instruction bytes.
#[derive(Clone, Debug, PartialEq)]
pub enum PoolConstant {
    Int(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(String),
    Class(String),
    FieldRef {
        owner: String,
        name: String,
        descriptor: String,
    },
    MethodRef {
        owner: String,
        name: String,
        descriptor: String,
    },
    InterfaceMethodRef {
        owner: String,
        name: String,
        descriptor: String,
    },
}

/// A constant pool operand inside instruction bytes, patched at emission.
#[derive(Clone, Debug, PartialEq)]
pub struct PoolRef {
    pub offset: u16,
    /// 1 for `ldc`, 2 for every other pool operand.
    pub width: u8,
    pub constant: PoolConstant,
}

/// One protected region of a try statement.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// Flat `start, end` pairs; finally blocks split one region into several.
    pub ranges: Vec<u16>,
    pub handler_pc: u16,
    /// Internal name of the caught type; `None` catches anything.
    pub catch_type: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineEntry {
    pub pc: u16,
    pub line: u16,
}

/// A local variable with its live ranges.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocalVariable {
    pub slot: u16,
    pub name: String,
    pub descriptor: String,
    /// Generic signature; only parameterized types get one.
    pub signature: Option<String>,
    /// `(start_pc, end_pc)` per live range, end exclusive.
    pub ranges: Vec<(u16, u16)>,
}

/// Type of a local slot or stack value in a frame.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FrameType {
    Top,
    Integer,
    Float,
    Long,
    Double,
    Null,
    UninitializedThis,
    /// Internal name, or an array descriptor
    Object(String),
    /// Value created by the `new` at this offset
    Uninitialized(u16),
}

impl FrameType {
    pub fn object(name: &str) -> Self {
        Self::Object(name.to_string())
    }

    pub fn is_wide(&self) -> bool {
        matches!(self, Self::Long | Self::Double)
    }
}

/// Types at a branch target.
///
/// `locals` is slot-indexed: a long or double is followed by `Top` for its
/// second slot. `stack` holds one entry per value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameState {
    pub offset: u16,
    pub locals: Vec<FrameType>,
    pub stack: Vec<FrameType>,
}

/// A method body produced by instruction selection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CodeBlock {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub pool_refs: Vec<PoolRef>,
    pub exception_handlers: Vec<ExceptionHandler>,
    pub lines: Vec<LineEntry>,
    pub local_variables: Vec<LocalVariable>,
    pub frames: Vec<FrameState>,
}

/// A field to emit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldDescriptor {
    pub access: u16,
    pub name: String,
    pub descriptor: String,
    pub constant: Option<ConstantValue>,
    pub signature: Option<String>,
    pub deprecated: bool,
    pub synthetic: bool,
    pub annotations: Vec<Annotation>,
}

/// Kind of code a method body holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MethodKind {
    #[default]
    Normal,
    /// Compiler-generated: bridges, accessors, enum helpers
    Synthetic,
}

/// A method to emit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MethodDescriptor {
    pub access: u16,
    pub name: String,
    pub descriptor: String,
    pub kind: MethodKind,
    /// Declared exception types; `None` entries are unresolved.
    pub thrown: Vec<Option<String>>,
    pub signature: Option<String>,
    pub deprecated: bool,
    pub annotations: Vec<Annotation>,
    pub parameter_annotations: Vec<Vec<Annotation>>,
    /// Default value of an annotation type member
    pub default_value: Option<ElementValue>,
    pub body: Option<CodeBlock>,
    /// Marked broken by semantic analysis
    pub broken: bool,
    pub source_range: Option<SourceRange>,
    /// Line of the declaration, used by placeholder bodies
    pub line: u16,
}

impl MethodDescriptor {
    pub fn is_class_init(&self) -> bool {
        self.name == "<clinit>"
    }
}

/// A fully resolved type ready for emission.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeDescriptor {
    /// Internal name, e.g. `com/example/Foo$Bar`
    pub name: String,
    /// Source modifiers, including `private`/`protected`/`static` of member types
    pub access: u16,
    /// `None` only for `java/lang/Object`
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    /// This type's own InnerClasses entry when it is nested
    pub nesting: Option<NestedType>,
    /// Other nested types referenced or declared by this type
    pub nested_types: Vec<NestedType>,
    pub enclosing_method: Option<EnclosingMethod>,
    pub signature: Option<String>,
    pub source_file: Option<String>,
    pub deprecated: bool,
    pub synthetic: bool,
    pub annotations: Vec<Annotation>,
    pub inconsistent_hierarchy: bool,
    pub fields: Vec<FieldDescriptor>,
    pub methods: Vec<MethodDescriptor>,
    pub problems: Vec<Problem>,
}

impl TypeDescriptor {
    pub fn is_interface(&self) -> bool {
        roast_classfile::access::has(self.access, roast_classfile::access::ACC_INTERFACE)
    }
}
