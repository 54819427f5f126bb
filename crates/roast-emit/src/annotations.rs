//! Annotation attributes and element values.
//!
//! Annotations are split by retention: runtime-retained ones go to the
//! visible attribute, class-retained ones to the invisible one, and
//! source-retained ones are not written. An annotation whose type or value
//! is unresolved is rolled back on its own; the attribute is dropped only
//! when none of its annotations survive.

use roast_classfile::constants::{MAX_U2, attr, element_tag};

use super::diagnostics::DiagnosticKind;
use super::encoder::{AttributeList, Encoder};
use super::error::Failure;
use super::model::{Annotation, ElementValue, Retention};

/// Visible/invisible pair of attribute names.
struct Split {
    retention: Retention,
    name: &'static str,
}

const ANNOTATIONS: [Split; 2] = [
    Split {
        retention: Retention::Runtime,
        name: attr::RUNTIME_VISIBLE_ANNOTATIONS,
    },
    Split {
        retention: Retention::Class,
        name: attr::RUNTIME_INVISIBLE_ANNOTATIONS,
    },
];

const PARAMETER_ANNOTATIONS: [Split; 2] = [
    Split {
        retention: Retention::Runtime,
        name: attr::RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS,
    },
    Split {
        retention: Retention::Class,
        name: attr::RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS,
    },
];

impl Encoder {
    pub fn annotation_attributes(
        &mut self,
        list: &mut AttributeList,
        annotations: &[Annotation],
    ) -> Result<(), Failure> {
        if !self.options.generics() {
            return Ok(());
        }
        for split in &ANNOTATIONS {
            let selected: Vec<&Annotation> = annotations
                .iter()
                .filter(|a| a.retention == split.retention)
                .collect();
            if selected.is_empty() {
                continue;
            }
            self.attribute(list, split.name, |enc| {
                let count = enc.body.reserve_u2();
                let written = enc.annotation_list(&selected)?;
                enc.body.patch_u2(count, written);
                Ok(written > 0)
            })?;
        }
        Ok(())
    }

    pub fn parameter_annotation_attributes(
        &mut self,
        list: &mut AttributeList,
        parameters: &[Vec<Annotation>],
    ) -> Result<(), Failure> {
        if !self.options.generics() || parameters.is_empty() {
            return Ok(());
        }
        for split in &PARAMETER_ANNOTATIONS {
            let selected: Vec<Vec<&Annotation>> = parameters
                .iter()
                .map(|p| p.iter().filter(|a| a.retention == split.retention).collect())
                .collect();
            if selected.iter().all(Vec::is_empty) {
                continue;
            }
            let Ok(params) = u8::try_from(selected.len()) else {
                return Err(overflow(selected.len(), "annotated parameters", u8::MAX.into()));
            };
            self.attribute(list, split.name, |enc| {
                enc.body.u1(params);
                let mut total = 0;
                for annotations in &selected {
                    let count = enc.body.reserve_u2();
                    let written = enc.annotation_list(annotations)?;
                    enc.body.patch_u2(count, written);
                    total += written;
                }
                Ok(total > 0)
            })?;
        }
        Ok(())
    }

    /// AnnotationDefault of an annotation type member.
    pub fn annotation_default_attribute(
        &mut self,
        list: &mut AttributeList,
        value: &ElementValue,
        return_descriptor: &str,
    ) -> Result<(), Failure> {
        if !self.options.generics() {
            return Ok(());
        }
        self.attribute(list, attr::ANNOTATION_DEFAULT, |enc| {
            enc.element_value(value, Some(return_descriptor))?;
            Ok(true)
        })
    }

    /// Write each annotation, rolling back the ones that fail to resolve.
    /// Returns the number written.
    fn annotation_list(&mut self, annotations: &[&Annotation]) -> Result<u16, Failure> {
        if annotations.len() > MAX_U2 {
            return Err(overflow(annotations.len(), "annotations", MAX_U2));
        }
        let mut written = 0;
        for annotation in annotations {
            let mark = self.body.mark();
            match self.annotation(annotation) {
                Ok(()) => written += 1,
                Err(Failure::Unresolved(what)) => {
                    self.body.rewind(mark);
                    log::trace!("annotation dropped: unresolved {what}");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(written)
    }

    fn annotation(&mut self, annotation: &Annotation) -> Result<(), Failure> {
        let Some(ty) = &annotation.type_descriptor else {
            return Err(Failure::unresolved("annotation type"));
        };
        if annotation.elements.len() > MAX_U2 {
            return Err(overflow(annotation.elements.len(), "element pairs", MAX_U2));
        }
        let ty = self.pool.utf8(ty)?;
        self.body.u2(ty.get());
        self.body.u2(annotation.elements.len() as u16);
        for pair in &annotation.elements {
            let name = self.pool.utf8(&pair.name)?;
            self.body.u2(name.get());
            self.element_value(&pair.value, Some(&pair.declared))?;
        }
        Ok(())
    }

    /// Write one `element_value`. A scalar whose declared type is an array
    /// is wrapped in a one-element array.
    fn element_value(&mut self, value: &ElementValue, declared: Option<&str>) -> Result<(), Failure> {
        if let Some(component) = declared.and_then(|d| d.strip_prefix('['))
            && !matches!(value, ElementValue::Array(_))
        {
            self.body.u1(element_tag::ARRAY);
            self.body.u2(1);
            return self.element_value(value, Some(component));
        }

        let pool = &mut self.pool;
        let (tag, index) = match value {
            ElementValue::Boolean(v) => (element_tag::BOOLEAN, pool.integer(*v as i32)?),
            ElementValue::Byte(v) => (element_tag::BYTE, pool.integer(*v as i32)?),
            ElementValue::Char(v) => (element_tag::CHAR, pool.integer(*v as i32)?),
            ElementValue::Short(v) => (element_tag::SHORT, pool.integer(*v as i32)?),
            ElementValue::Int(v) => (element_tag::INT, pool.integer(*v)?),
            ElementValue::Long(v) => (element_tag::LONG, pool.long(*v)?),
            ElementValue::Float(v) => (element_tag::FLOAT, pool.float(*v)?),
            ElementValue::Double(v) => (element_tag::DOUBLE, pool.double(*v)?),
            ElementValue::String(text) => (element_tag::STRING, pool.utf8(text)?),
            ElementValue::Class(descriptor) => {
                let Some(descriptor) = descriptor else {
                    return Err(Failure::unresolved("class literal"));
                };
                (element_tag::CLASS, pool.utf8(descriptor)?)
            }
            ElementValue::Enum {
                type_descriptor,
                constant,
            } => {
                let Some(ty) = type_descriptor else {
                    return Err(Failure::unresolved("enum type"));
                };
                let ty = pool.utf8(ty)?;
                let constant = pool.utf8(constant)?;
                self.body.u1(element_tag::ENUM);
                self.body.u2(ty.get());
                self.body.u2(constant.get());
                return Ok(());
            }
            ElementValue::Annotation(nested) => {
                self.body.u1(element_tag::ANNOTATION);
                return self.annotation(nested);
            }
            ElementValue::Array(items) => {
                if items.len() > MAX_U2 {
                    return Err(overflow(items.len(), "array elements", MAX_U2));
                }
                self.body.u1(element_tag::ARRAY);
                self.body.u2(items.len() as u16);
                let component = declared.and_then(|d| d.strip_prefix('['));
                for item in items {
                    self.element_value(item, component)?;
                }
                return Ok(());
            }
            ElementValue::Unresolved => return Err(Failure::unresolved("element value")),
        };
        self.body.u1(tag);
        self.body.u2(index.get());
        Ok(())
    }
}

fn overflow(len: usize, what: &str, max: usize) -> Failure {
    Failure::member(
        DiagnosticKind::TooManyAnnotationEntries,
        format!("{len} {what} (max {max})"),
    )
}
