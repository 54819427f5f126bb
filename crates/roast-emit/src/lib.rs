//! Class file emission backend for Roast.
//!
//! Takes a fully resolved type (members, constants, signatures, annotations
//! and already-selected instruction bytes) and produces class file bytes:
//! - `constant_pool` - deduplicating constant pool builder
//! - `buffer` - typed header/body output buffers
//! - `frames` - minimal-diff StackMapTable encoding
//! - `problem` - placeholder bodies for members that failed to compile
//! - `ClassEmitter` - orchestrates one type into one class file
//! - `EmitterPool` - reuses emitters across the types of one pass

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod annotations;
mod attribute;
pub mod buffer;
mod class_writer;
mod code;
pub mod constant_pool;
mod diagnostics;
mod encoder;
mod error;
pub mod frames;
mod member;
pub mod model;
mod options;
mod pool;
pub mod problem;

#[cfg(test)]
mod annotations_tests;
#[cfg(test)]
mod buffer_tests;
#[cfg(test)]
mod code_tests;
#[cfg(test)]
mod diagnostics_tests;
#[cfg(test)]
mod pool_tests;
#[cfg(test)]
pub mod test_utils;

pub use class_writer::{ClassEmitter, EmittedClass};
pub use constant_pool::{ConstantPool, PoolError};
pub use diagnostics::{DiagnosticKind, EmitDiagnostic, Severity};
pub use error::EmitError;
pub use options::{EmitOptions, TargetVersion};
pub use pool::{EmitterPool, PooledEmitter};
