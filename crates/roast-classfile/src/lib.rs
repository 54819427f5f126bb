//! Class file format definitions for Roast.
//!
//! This crate contains:
//! - Wire constants (magic, versions, constant tags, attribute names, limits)
//! - Index newtypes and access flags
//! - Modified UTF-8 and method descriptor helpers
//! - Verification types and stack map frames (shared by writer and reader)
//! - A reference reader and a human-readable dump, used for testing emitted blobs

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod access;
pub mod constants;
pub mod descriptor;
pub mod dump;
pub mod frame;
pub mod ids;
pub mod mutf8;
pub mod reader;
pub mod verification;

#[cfg(test)]
mod reader_tests;

pub use constants::{MAGIC, MajorVersion};
pub use dump::dump;
pub use frame::StackMapFrame;
pub use ids::CpIndex;
pub use reader::{
    Attribute, ClassFile, CodeAttribute, Constant, ConstantPoolView, ExceptionEntry, Member,
    ReadError,
};
pub use verification::{VerificationType, encode_verification_type};
