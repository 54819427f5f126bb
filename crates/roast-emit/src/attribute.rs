//! Fixed-shape attributes shared by classes and members.

use roast_classfile::access::{
    ACC_ABSTRACT, ACC_ENUM, ACC_FINAL, ACC_INTERFACE, ACC_STATIC, INNER_CLASS_MASK, VISIBILITY,
};
use roast_classfile::constants::{MAX_U2, attr};

use super::diagnostics::DiagnosticKind;
use super::encoder::{AttributeList, Encoder};
use super::error::Failure;
use super::model::{ConstantValue, EnclosingMethod, NestedType, NestingKind};

impl Encoder {
    /// ConstantValue: a u2 index of the pool entry matching the field type.
    pub fn constant_value_attribute(
        &mut self,
        list: &mut AttributeList,
        value: &ConstantValue,
    ) -> Result<(), Failure> {
        self.attribute(list, attr::CONSTANT_VALUE, |enc| {
            let pool = &mut enc.pool;
            let index = match value {
                ConstantValue::Boolean(v) => pool.integer(*v as i32)?,
                ConstantValue::Byte(v) => pool.integer(*v as i32)?,
                ConstantValue::Char(v) => pool.integer(*v as i32)?,
                ConstantValue::Short(v) => pool.integer(*v as i32)?,
                ConstantValue::Int(v) => pool.integer(*v)?,
                ConstantValue::Long(v) => pool.long(*v)?,
                ConstantValue::Float(v) => pool.float(*v)?,
                ConstantValue::Double(v) => pool.double(*v)?,
                ConstantValue::String(text) => pool.string(text)?,
            };
            enc.body.u2(index.get());
            Ok(true)
        })
    }

    /// Exceptions: the declared thrown types of a method.
    pub fn exceptions_attribute(
        &mut self,
        list: &mut AttributeList,
        thrown: &[Option<String>],
    ) -> Result<(), Failure> {
        if thrown.is_empty() {
            return Ok(());
        }
        if thrown.len() > MAX_U2 {
            return Err(Failure::member(
                DiagnosticKind::TooManyExceptions,
                format!("{} declared exceptions (max 65535)", thrown.len()),
            ));
        }
        self.attribute(list, attr::EXCEPTIONS, |enc| {
            enc.body.u2(thrown.len() as u16);
            for ty in thrown {
                let Some(name) = ty else {
                    return Err(Failure::unresolved("thrown type"));
                };
                let index = enc.pool.class(name)?;
                enc.body.u2(index.get());
            }
            Ok(true)
        })
    }

    /// Signature, written only for targets that understand generics.
    pub fn signature_attribute(
        &mut self,
        list: &mut AttributeList,
        signature: Option<&str>,
    ) -> Result<(), Failure> {
        let Some(signature) = signature else {
            return Ok(());
        };
        if !self.options.generics() {
            return Ok(());
        }
        self.attribute(list, attr::SIGNATURE, |enc| {
            let index = enc.pool.utf8(signature)?;
            enc.body.u2(index.get());
            Ok(true)
        })
    }

    /// Deprecated and, before 1.5, Synthetic markers.
    pub fn marker_attributes(
        &mut self,
        list: &mut AttributeList,
        synthetic: bool,
        deprecated: bool,
    ) -> Result<(), Failure> {
        if synthetic && !self.options.generics() {
            self.marker_attribute(list, attr::SYNTHETIC)?;
        }
        if deprecated {
            self.marker_attribute(list, attr::DEPRECATED)?;
        }
        Ok(())
    }

    pub fn source_file_attribute(
        &mut self,
        list: &mut AttributeList,
        file: &str,
    ) -> Result<(), Failure> {
        self.attribute(list, attr::SOURCE_FILE, |enc| {
            let index = enc.pool.utf8(file)?;
            enc.body.u2(index.get());
            Ok(true)
        })
    }

    /// InnerClasses: one fixed-stride row per recorded nested type.
    pub fn inner_classes_attribute(
        &mut self,
        list: &mut AttributeList,
        entries: &[&NestedType],
    ) -> Result<(), Failure> {
        if entries.is_empty() {
            return Ok(());
        }
        if entries.len() > MAX_U2 {
            return Err(Failure::member(
                DiagnosticKind::TooManyInnerClasses,
                format!("{} inner class entries (max 65535)", entries.len()),
            ));
        }
        self.attribute(list, attr::INNER_CLASSES, |enc| {
            enc.body.u2(entries.len() as u16);
            for entry in entries {
                let inner = enc.pool.class(&entry.name)?;
                let outer = match (&entry.outer, entry.kind) {
                    (Some(outer), NestingKind::Member) => enc.pool.class(outer)?.get(),
                    _ => 0,
                };
                let name = match (&entry.simple_name, entry.kind) {
                    (_, NestingKind::Anonymous) | (None, _) => 0,
                    (Some(simple), _) => enc.pool.utf8(simple)?.get(),
                };
                enc.body.u2(inner.get());
                enc.body.u2(outer);
                enc.body.u2(name);
                enc.body.u2(inner_class_flags(entry));
            }
            Ok(true)
        })
    }

    pub fn enclosing_method_attribute(
        &mut self,
        list: &mut AttributeList,
        link: &EnclosingMethod,
    ) -> Result<(), Failure> {
        self.attribute(list, attr::ENCLOSING_METHOD, |enc| {
            let Some(class) = &link.class else {
                return Err(Failure::unresolved("enclosing type"));
            };
            let class = enc.pool.class(class)?;
            let method = match &link.method {
                Some((name, descriptor)) => enc.pool.name_and_type(name, descriptor)?.get(),
                None => 0,
            };
            enc.body.u2(class.get());
            enc.body.u2(method);
            Ok(true)
        })
    }
}

/// `inner_class_access_flags` for a nested type.
///
/// Local and anonymous types have no visibility. Member interfaces,
/// annotations and enums are implicitly static.
pub(crate) fn inner_class_flags(entry: &NestedType) -> u16 {
    let mut flags = entry.access & INNER_CLASS_MASK;
    match entry.kind {
        NestingKind::Member => {}
        NestingKind::Local => flags &= !VISIBILITY,
        NestingKind::Anonymous => flags &= !(VISIBILITY | ACC_FINAL | ACC_ABSTRACT),
    }
    if flags & (ACC_INTERFACE | ACC_ENUM) != 0 {
        flags |= ACC_STATIC;
    }
    flags
}
