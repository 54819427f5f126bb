//! Field and method encoding.
//!
//! A member that cannot be encoded as written does not take the type down
//! with it: its bytes are rolled back and it is re-emitted in a reduced form
//! (a bare header for fields, a placeholder body for methods).

use roast_classfile::access::{
    ACC_ABSTRACT, ACC_NATIVE, ACC_STATIC, ACC_STRICT, ACC_SYNTHETIC, FIELD_MASK, METHOD_MASK, has,
};
use roast_classfile::descriptor;

use super::code::{CodeKind, CodeTarget};
use super::diagnostics::DiagnosticKind;
use super::encoder::Encoder;
use super::error::{EmitError, Failure};
use super::model::{FieldDescriptor, MethodDescriptor, MethodKind, TypeDescriptor};
use super::problem;

/// Flags a placeholder method cannot keep, since it always has a body.
const BODYLESS: u16 = ACC_NATIVE | ACC_ABSTRACT | ACC_STRICT;

/// Escalate a failure that has no smaller fallback left.
fn unabsorbed(member: Option<&String>, failure: Failure) -> EmitError {
    let member = member.cloned().unwrap_or_default();
    match failure {
        Failure::Type(e) => e,
        Failure::Member(f) => EmitError::Unencodable {
            member,
            message: f.message,
        },
        Failure::Unresolved(what) => EmitError::Unencodable {
            member,
            message: format!("unresolved {what}"),
        },
    }
}

impl Encoder {
    fn synthetic_flag(&self, flags: u16, synthetic: bool) -> u16 {
        if synthetic && self.options.generics() {
            flags | ACC_SYNTHETIC
        } else {
            flags & !ACC_SYNTHETIC
        }
    }

    fn member_header(&mut self, flags: u16, name: &str, descriptor: &str) -> Result<(), Failure> {
        let name = self.pool.utf8(name)?;
        let descriptor = self.pool.utf8(descriptor)?;
        self.body.u2(flags);
        self.body.u2(name.get());
        self.body.u2(descriptor.get());
        Ok(())
    }

    pub fn field(&mut self, field: &FieldDescriptor) -> Result<(), EmitError> {
        self.member = Some(format!("{} {}", field.name, field.descriptor));
        let mark = self.body.mark();
        match self.write_field(field, true) {
            Ok(()) => Ok(()),
            Err(Failure::Member(f)) => {
                self.body.rewind(mark);
                self.report(f.kind, f.message);
                self.write_field(field, false)
                    .map_err(|e| unabsorbed(self.member.as_ref(), e))
            }
            Err(e) => Err(unabsorbed(self.member.as_ref(), e)),
        }
    }

    fn write_field(&mut self, field: &FieldDescriptor, with_attributes: bool) -> Result<(), Failure> {
        let flags = self.synthetic_flag(field.access & FIELD_MASK, field.synthetic);
        self.member_header(flags, &field.name, &field.descriptor)?;

        let mut attrs = self.begin_attributes();
        if with_attributes {
            if let Some(value) = &field.constant {
                self.constant_value_attribute(&mut attrs, value)?;
            }
            self.marker_attributes(&mut attrs, field.synthetic, field.deprecated)?;
            self.signature_attribute(&mut attrs, field.signature.as_deref())?;
            self.annotation_attributes(&mut attrs, &field.annotations)?;
        }
        self.end_attributes(attrs);
        Ok(())
    }

    /// Encode a method, routing it through the placeholder path when it is
    /// broken or cannot be encoded. `problems` are the messages of upstream
    /// problems overlapping the method.
    pub fn method(
        &mut self,
        owner: &TypeDescriptor,
        method: &MethodDescriptor,
        problems: &[&str],
    ) -> Result<(), EmitError> {
        self.member = Some(format!("{}{}", method.name, method.descriptor));
        if method.broken {
            self.report(
                DiagnosticKind::BrokenMember,
                format!("{} problem(s) embedded in placeholder body", problems.len()),
            );
            return self.problem_method(owner, method, problems);
        }

        let mark = self.body.mark();
        match self.write_method(owner, method) {
            Ok(()) => Ok(()),
            Err(Failure::Type(e)) => Err(e),
            Err(Failure::Member(f)) => {
                self.body.rewind(mark);
                self.report(f.kind, f.message.clone());
                self.problem_method(owner, method, &[f.message.as_str()])
            }
            Err(Failure::Unresolved(what)) => {
                self.body.rewind(mark);
                let message = format!("unresolved {what}");
                self.report(DiagnosticKind::BrokenMember, message.clone());
                self.problem_method(owner, method, &[message.as_str()])
            }
        }
    }

    fn write_method(
        &mut self,
        owner: &TypeDescriptor,
        method: &MethodDescriptor,
    ) -> Result<(), Failure> {
        let synthetic = method.kind == MethodKind::Synthetic;
        let mut flags = self.synthetic_flag(method.access & METHOD_MASK, synthetic);
        if method.is_class_init() {
            flags = ACC_STATIC;
        }
        self.member_header(flags, &method.name, &method.descriptor)?;

        let mut attrs = self.begin_attributes();
        self.exceptions_attribute(&mut attrs, &method.thrown)?;
        self.marker_attributes(&mut attrs, synthetic, method.deprecated)?;
        self.signature_attribute(&mut attrs, method.signature.as_deref())?;
        self.annotation_attributes(&mut attrs, &method.annotations)?;
        self.parameter_annotation_attributes(&mut attrs, &method.parameter_annotations)?;
        if let Some(value) = &method.default_value {
            let ret = method
                .descriptor
                .rsplit_once(')')
                .map_or("", |(_, ret)| ret);
            self.annotation_default_attribute(&mut attrs, value, ret)?;
        }
        if let Some(body) = &method.body {
            let kind = if method.is_class_init() {
                CodeKind::ClassInit
            } else if synthetic {
                CodeKind::Synthetic
            } else {
                CodeKind::Normal
            };
            let target = CodeTarget {
                owner: &owner.name,
                name: &method.name,
                descriptor: &method.descriptor,
                is_static: has(flags, ACC_STATIC),
                kind,
            };
            self.code_attribute(&mut attrs, &target, body)?;
        }
        self.end_attributes(attrs);
        Ok(())
    }

    /// Emit `method` with a body that throws the given problems.
    ///
    /// The declared flags lose native, abstract and strictfp; only the
    /// Synthetic/Deprecated markers and the Code attribute are written.
    fn problem_method(
        &mut self,
        owner: &TypeDescriptor,
        method: &MethodDescriptor,
        problems: &[&str],
    ) -> Result<(), EmitError> {
        log::debug!(
            "placeholder body for {}.{}{}",
            owner.name,
            method.name,
            method.descriptor
        );
        self.write_problem_method(owner, method, problems)
            .map_err(|e| unabsorbed(self.member.as_ref(), e))
    }

    fn write_problem_method(
        &mut self,
        owner: &TypeDescriptor,
        method: &MethodDescriptor,
        problems: &[&str],
    ) -> Result<(), Failure> {
        let synthetic = method.kind == MethodKind::Synthetic;
        let mut flags = self.synthetic_flag(method.access & METHOD_MASK & !BODYLESS, synthetic);
        if method.is_class_init() {
            flags = ACC_STATIC;
        }
        let is_static = has(flags, ACC_STATIC);

        let parsed = descriptor::parse_method(&method.descriptor).map_err(|_| {
            EmitError::InvalidDescriptor {
                member: method.name.clone(),
                descriptor: method.descriptor.clone(),
            }
        })?;
        let max_locals = parsed.param_slots() + u16::from(!is_static);

        self.member_header(flags, &method.name, &method.descriptor)?;
        let mut attrs = self.begin_attributes();
        self.marker_attributes(&mut attrs, synthetic, method.deprecated)?;

        let text = problem::problem_text(problems);
        let block = problem::stub_code(
            &mut self.pool,
            &text,
            problems.len(),
            max_locals,
            method.line,
        )?;
        let target = CodeTarget {
            owner: &owner.name,
            name: &method.name,
            descriptor: &method.descriptor,
            is_static,
            kind: CodeKind::Problem,
        };
        self.code_attribute(&mut attrs, &target, &block)?;
        self.end_attributes(attrs);
        Ok(())
    }
}
