//! Class file writer: sequences one type into a finished class file.
//!
//! Members are encoded into the body buffer first, growing the constant pool
//! as they go. Only when the last class attribute is written is the pool
//! serialized into the header buffer, and the two buffers concatenated.

use indexmap::IndexMap;
use roast_classfile::MAGIC;
use roast_classfile::access::{
    ACC_ABSTRACT, ACC_INTERFACE, ACC_PRIVATE, ACC_PROTECTED, ACC_PUBLIC, ACC_STATIC, ACC_SUPER,
    ACC_SYNTHETIC, CLASS_MASK, has,
};
use roast_classfile::constants::{MAX_U2, attr};

use super::buffer::{EmitBuffer, Header};
use super::diagnostics::EmitDiagnostic;
use super::encoder::Encoder;
use super::error::{EmitError, Failure};
use super::model::{MethodDescriptor, NestedType, Problem, TypeDescriptor};
use super::options::EmitOptions;

/// Initial capacity of a fresh header buffer.
const HEADER_CAPACITY: usize = 1024;

/// Result of emitting one type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmittedClass {
    /// Internal name of the type
    pub name: String,
    pub bytes: Vec<u8>,
    /// Members replaced by placeholders and attributes dropped along the way
    pub diagnostics: Vec<EmitDiagnostic>,
}

impl EmittedClass {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(EmitDiagnostic::is_error)
    }
}

/// Encodes types into class files. Reusable across types via [`reset`](Self::reset).
#[derive(Debug)]
pub struct ClassEmitter {
    header: EmitBuffer<Header>,
    encoder: Encoder,
    /// InnerClasses entries by nested type name, first record wins
    inner_classes: IndexMap<String, NestedType>,
}

impl ClassEmitter {
    pub fn new(options: EmitOptions) -> Self {
        Self {
            header: EmitBuffer::with_capacity(HEADER_CAPACITY),
            encoder: Encoder::new(options),
            inner_classes: IndexMap::new(),
        }
    }

    pub fn options(&self) -> &EmitOptions {
        &self.encoder.options
    }

    /// Forget the previous type, keeping buffer allocations.
    pub fn reset(&mut self) {
        self.header.clear();
        self.encoder.reset();
        self.inner_classes.clear();
    }

    /// Record a nested type for the InnerClasses attribute of the next
    /// emitted type. Entries recorded here precede the type's own.
    pub fn record_nested(&mut self, entry: &NestedType) {
        if !self.inner_classes.contains_key(&entry.name) {
            self.inner_classes.insert(entry.name.clone(), entry.clone());
        }
    }

    /// Encode `ty` into a class file.
    pub fn emit(&mut self, ty: &TypeDescriptor) -> Result<EmittedClass, EmitError> {
        self.header.clear();
        self.encoder.reset();
        let result = self.emit_type(ty);
        self.inner_classes.clear();
        result
    }

    fn emit_type(&mut self, ty: &TypeDescriptor) -> Result<EmittedClass, EmitError> {
        log::debug!("emitting {}", ty.name);

        let version = self.encoder.options.version();
        self.header.u4(MAGIC);
        self.header.u2(version.minor());
        self.header.u2(version.major());

        self.type_header(ty).map_err(|e| type_level(&ty.name, e))?;
        self.fields(ty)?;
        self.methods(ty)?;
        self.class_attributes(ty)?;

        self.encoder.pool.write_to(&mut self.header);
        let bytes = self.header.concat(&self.encoder.body);
        log::debug!(
            "emitted {}: {} bytes, {} constants",
            ty.name,
            bytes.len(),
            self.encoder.pool.count() - 1
        );

        Ok(EmittedClass {
            name: ty.name.clone(),
            bytes,
            diagnostics: std::mem::take(&mut self.encoder.diagnostics),
        })
    }

    fn type_header(&mut self, ty: &TypeDescriptor) -> Result<(), Failure> {
        let enc = &mut self.encoder;
        let flags = class_flags(ty, enc.options.generics());
        let this = enc.pool.class(&ty.name)?;
        let super_class = match &ty.super_class {
            Some(name) => enc.pool.class(name)?.get(),
            None => 0,
        };
        enc.body.u2(flags);
        enc.body.u2(this.get());
        enc.body.u2(super_class);

        if ty.interfaces.len() > MAX_U2 {
            return Err(EmitError::TooManyInterfaces(ty.interfaces.len()).into());
        }
        enc.body.u2(ty.interfaces.len() as u16);
        for name in &ty.interfaces {
            let index = enc.pool.class(name)?;
            enc.body.u2(index.get());
        }
        log::trace!("header of {}: flags {flags:#06x}", ty.name);
        Ok(())
    }

    fn fields(&mut self, ty: &TypeDescriptor) -> Result<(), EmitError> {
        if ty.fields.len() > MAX_U2 {
            return Err(EmitError::TooManyFields(ty.fields.len()));
        }
        self.encoder.body.u2(ty.fields.len() as u16);
        for field in &ty.fields {
            self.encoder.field(field)?;
        }
        self.encoder.member = None;
        Ok(())
    }

    fn methods(&mut self, ty: &TypeDescriptor) -> Result<(), EmitError> {
        let type_problems: Vec<&str> = ty
            .problems
            .iter()
            .filter(|p| p.severity.is_error())
            .filter(|p| !ty.methods.iter().any(|m| overlaps(m, p)))
            .map(|p| p.message.as_str())
            .collect();
        let declares_clinit = ty.methods.iter().any(MethodDescriptor::is_class_init);
        let synthesized_clinit = !type_problems.is_empty() && !declares_clinit;

        let total = ty.methods.len() + usize::from(synthesized_clinit);
        if total > MAX_U2 {
            return Err(EmitError::TooManyMethods(total));
        }
        let count = self.encoder.body.reserve_u2();

        for method in &ty.methods {
            let mut problems: Vec<&str> = ty
                .problems
                .iter()
                .filter(|p| p.severity.is_error() && overlaps(method, p))
                .map(|p| p.message.as_str())
                .collect();
            if method.is_class_init() && !type_problems.is_empty() {
                problems.extend(type_problems.iter().copied());
                let broken = MethodDescriptor {
                    broken: true,
                    ..method.clone()
                };
                self.encoder.method(ty, &broken, &problems)?;
            } else {
                self.encoder.method(ty, method, &problems)?;
            }
        }
        if synthesized_clinit {
            let clinit = MethodDescriptor {
                access: ACC_STATIC,
                name: "<clinit>".to_string(),
                descriptor: "()V".to_string(),
                broken: true,
                ..MethodDescriptor::default()
            };
            self.encoder.method(ty, &clinit, &type_problems)?;
        }

        self.encoder.body.patch_u2(count, total as u16);
        self.encoder.member = None;
        Ok(())
    }

    fn class_attributes(&mut self, ty: &TypeDescriptor) -> Result<(), EmitError> {
        if let Some(own) = &ty.nesting {
            self.record_nested(own);
        }
        for nested in &ty.nested_types {
            self.record_nested(nested);
        }
        let entries: Vec<&NestedType> = self.inner_classes.values().collect();
        let enc = &mut self.encoder;
        let name = ty.name.as_str();

        let mut attrs = enc.begin_attributes();
        if let Some(file) = &ty.source_file
            && enc.options.source_file
        {
            let r = enc.source_file_attribute(&mut attrs, file);
            absorb(enc, name, r)?;
        }
        let r = enc.marker_attributes(&mut attrs, ty.synthetic, ty.deprecated);
        absorb(enc, name, r)?;
        let r = enc.inner_classes_attribute(&mut attrs, &entries);
        absorb(enc, name, r)?;
        let r = enc.signature_attribute(&mut attrs, ty.signature.as_deref());
        absorb(enc, name, r)?;
        if let Some(link) = &ty.enclosing_method {
            let r = enc.enclosing_method_attribute(&mut attrs, link);
            absorb(enc, name, r)?;
        }
        let r = enc.annotation_attributes(&mut attrs, &ty.annotations);
        absorb(enc, name, r)?;
        if ty.inconsistent_hierarchy {
            let r = enc.marker_attribute(&mut attrs, attr::INCONSISTENT_HIERARCHY);
            absorb(enc, name, r)?;
        }
        enc.end_attributes(attrs);
        Ok(())
    }
}

/// A class attribute that cannot be written is dropped with a diagnostic;
/// only type-level failures abort.
fn absorb(enc: &mut Encoder, name: &str, result: Result<(), Failure>) -> Result<(), EmitError> {
    match result {
        Ok(()) => Ok(()),
        Err(Failure::Member(f)) => {
            enc.report(f.kind, f.message);
            Ok(())
        }
        Err(e) => Err(type_level(name, e)),
    }
}

fn overlaps(method: &MethodDescriptor, problem: &Problem) -> bool {
    method
        .source_range
        .is_some_and(|range| range.overlaps(&problem.range))
}

fn type_level(name: &str, failure: Failure) -> EmitError {
    match failure {
        Failure::Type(e) => e,
        Failure::Member(f) => EmitError::Unencodable {
            member: name.to_string(),
            message: f.message,
        },
        Failure::Unresolved(what) => EmitError::Unencodable {
            member: name.to_string(),
            message: format!("unresolved {what}"),
        },
    }
}

/// `access_flags` of the class header.
///
/// Nested types are widened to a top-level visibility (protected becomes
/// public, private becomes package) and lose `static`. Classes get
/// `ACC_SUPER`, interfaces are always abstract.
pub(crate) fn class_flags(ty: &TypeDescriptor, generics: bool) -> u16 {
    let mut flags = ty.access;
    if ty.nesting.is_some() && has(flags, ACC_PROTECTED) {
        flags |= ACC_PUBLIC;
    }
    flags &= !(ACC_PRIVATE | ACC_PROTECTED | ACC_STATIC);
    flags &= CLASS_MASK;
    if has(flags, ACC_INTERFACE) {
        flags |= ACC_ABSTRACT;
        flags &= !ACC_SUPER;
    } else {
        flags |= ACC_SUPER;
    }
    if ty.synthetic && generics {
        flags | ACC_SYNTHETIC
    } else {
        flags & !ACC_SYNTHETIC
    }
}
