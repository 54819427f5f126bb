//! Test utilities: emit a type and read it back.

use roast_classfile::{ClassFile, dump};

use crate::model::{CodeBlock, FieldDescriptor, MethodDescriptor, TypeDescriptor};
use crate::{ClassEmitter, EmitOptions, EmittedClass};

/// Options with every optional table off, for compact dumps.
pub fn bare_options() -> EmitOptions {
    EmitOptions::new()
        .line_numbers(false)
        .local_variables(false)
        .source_file(false)
        .stack_maps(false)
}

pub fn emit_with(ty: &TypeDescriptor, options: EmitOptions) -> EmittedClass {
    ClassEmitter::new(options)
        .emit(ty)
        .expect("type must be encodable")
}

pub fn parse(emitted: &EmittedClass) -> ClassFile {
    ClassFile::parse(&emitted.bytes).expect("emitted class must decode")
}

/// Emit `ty` and return the dump of the decoded class.
pub fn emit_dump(ty: &TypeDescriptor, options: EmitOptions) -> String {
    dump(&parse(&emit_with(ty, options)))
}

/// `public class name extends java/lang/Object`.
pub fn class(name: &str) -> TypeDescriptor {
    TypeDescriptor {
        name: name.to_string(),
        access: roast_classfile::access::ACC_PUBLIC,
        super_class: Some("java/lang/Object".to_string()),
        ..TypeDescriptor::default()
    }
}

pub fn field(access: u16, name: &str, descriptor: &str) -> FieldDescriptor {
    FieldDescriptor {
        access,
        name: name.to_string(),
        descriptor: descriptor.to_string(),
        ..FieldDescriptor::default()
    }
}

pub fn method(access: u16, name: &str, descriptor: &str) -> MethodDescriptor {
    MethodDescriptor {
        access,
        name: name.to_string(),
        descriptor: descriptor.to_string(),
        ..MethodDescriptor::default()
    }
}

/// A body consisting of a single `return`.
pub fn return_body(max_stack: u16, max_locals: u16) -> CodeBlock {
    CodeBlock {
        max_stack,
        max_locals,
        code: vec![0xB1],
        ..CodeBlock::default()
    }
}
