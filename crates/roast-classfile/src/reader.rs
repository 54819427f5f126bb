//! Reference reader for emitted class files.
//!
//! Decodes the structure of a class file far enough to inspect it: the
//! constant pool, members, and raw attribute payloads, plus helpers for the
//! Code attribute. It does no verification and resolves nothing beyond the
//! constant pool.

use super::constants::{MAGIC, attr, tag};
use super::ids::CpIndex;
use super::mutf8::{self, InvalidMutf8};

/// Class file decode error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReadError {
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEof(usize),
    #[error("invalid magic: {0:#010x}")]
    InvalidMagic(u32),
    #[error("unknown constant tag {tag} at pool index {index}")]
    UnknownConstantTag { tag: u8, index: u16 },
    #[error("constant pool index {0} out of range or of the wrong kind")]
    BadIndex(u16),
    #[error("{0} trailing bytes")]
    TrailingBytes(usize),
    #[error(transparent)]
    Utf8(#[from] InvalidMutf8),
}

/// A decoded constant pool entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    /// Index 0 and the slot after a long/double.
    Unusable,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(CpIndex),
    String(CpIndex),
    FieldRef {
        class: CpIndex,
        name_and_type: CpIndex,
    },
    MethodRef {
        class: CpIndex,
        name_and_type: CpIndex,
    },
    InterfaceMethodRef {
        class: CpIndex,
        name_and_type: CpIndex,
    },
    NameAndType {
        name: CpIndex,
        descriptor: CpIndex,
    },
}

/// Decoded constant pool, indexed from 1.
#[derive(Clone, Debug, Default)]
pub struct ConstantPoolView {
    entries: Vec<Constant>,
}

impl ConstantPoolView {
    /// The value of the header's `constant_pool_count` field.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: CpIndex) -> Option<&Constant> {
        match self.entries.get(index.get() as usize)? {
            Constant::Unusable => None,
            c => Some(c),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (CpIndex, &Constant)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, c)| !matches!(c, Constant::Unusable))
            .map(|(i, c)| (CpIndex(i as u16), c))
    }

    pub fn utf8(&self, index: CpIndex) -> Result<&str, ReadError> {
        match self.get(index) {
            Some(Constant::Utf8(s)) => Ok(s),
            _ => Err(ReadError::BadIndex(index.get())),
        }
    }

    /// Name of a CONSTANT_Class entry.
    pub fn class_name(&self, index: CpIndex) -> Result<&str, ReadError> {
        match self.get(index) {
            Some(Constant::Class(name)) => self.utf8(*name),
            _ => Err(ReadError::BadIndex(index.get())),
        }
    }

    /// Text of a CONSTANT_String entry.
    pub fn string(&self, index: CpIndex) -> Result<&str, ReadError> {
        match self.get(index) {
            Some(Constant::String(text)) => self.utf8(*text),
            _ => Err(ReadError::BadIndex(index.get())),
        }
    }

    /// `(name, descriptor)` of a CONSTANT_NameAndType entry.
    pub fn name_and_type(&self, index: CpIndex) -> Result<(&str, &str), ReadError> {
        match self.get(index) {
            Some(Constant::NameAndType { name, descriptor }) => {
                Ok((self.utf8(*name)?, self.utf8(*descriptor)?))
            }
            _ => Err(ReadError::BadIndex(index.get())),
        }
    }

    /// `(owner, name, descriptor)` of a field, method or interface method reference.
    pub fn member_ref(&self, index: CpIndex) -> Result<(&str, &str, &str), ReadError> {
        match self.get(index) {
            Some(
                Constant::FieldRef {
                    class,
                    name_and_type,
                }
                | Constant::MethodRef {
                    class,
                    name_and_type,
                }
                | Constant::InterfaceMethodRef {
                    class,
                    name_and_type,
                },
            ) => {
                let (name, descriptor) = self.name_and_type(*name_and_type)?;
                Ok((self.class_name(*class)?, name, descriptor))
            }
            _ => Err(ReadError::BadIndex(index.get())),
        }
    }
}

/// An attribute with its name resolved and its payload left raw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub info: Vec<u8>,
}

impl Attribute {
    /// Payload as a single u2 (ConstantValue, Signature, SourceFile).
    pub fn u2(&self) -> Option<u16> {
        match self.info.as_slice() {
            [hi, lo] => Some(u16::from_be_bytes([*hi, *lo])),
            _ => None,
        }
    }

    /// Payload as a u2 count followed by that many u2 values (Exceptions).
    pub fn u2_list(&self) -> Option<Vec<u16>> {
        let mut r = Reader::new(&self.info);
        let count = r.u2().ok()?;
        let items = (0..count).map(|_| r.u2()).collect::<Result<Vec<_>, _>>().ok()?;
        r.finish().ok()?;
        Some(items)
    }
}

fn find<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attributes.iter().find(|a| a.name == name)
}

/// A field or method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub attributes: Vec<Attribute>,
}

impl Member {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        find(&self.attributes, name)
    }

    pub fn code(&self, pool: &ConstantPoolView) -> Result<Option<CodeAttribute>, ReadError> {
        self.attribute(attr::CODE)
            .map(|a| CodeAttribute::parse(&a.info, pool))
            .transpose()
    }
}

/// One exception_table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExceptionEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: CpIndex,
}

/// A decoded Code attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionEntry>,
    pub attributes: Vec<Attribute>,
}

impl CodeAttribute {
    pub fn parse(info: &[u8], pool: &ConstantPoolView) -> Result<Self, ReadError> {
        let mut r = Reader::new(info);
        let max_stack = r.u2()?;
        let max_locals = r.u2()?;
        let code_len = r.u4()? as usize;
        let code = r.bytes(code_len)?.to_vec();
        let table_len = r.u2()?;
        let mut exception_table = Vec::with_capacity(table_len as usize);
        for _ in 0..table_len {
            exception_table.push(ExceptionEntry {
                start_pc: r.u2()?,
                end_pc: r.u2()?,
                handler_pc: r.u2()?,
                catch_type: CpIndex(r.u2()?),
            });
        }
        let attributes = r.attributes(pool)?;
        r.finish()?;

        Ok(Self {
            max_stack,
            max_locals,
            code,
            exception_table,
            attributes,
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        find(&self.attributes, name)
    }

    /// `(start_pc, line)` pairs from the LineNumberTable, if present.
    pub fn line_numbers(&self) -> Option<Vec<(u16, u16)>> {
        let a = self.attribute(attr::LINE_NUMBER_TABLE)?;
        let mut r = Reader::new(&a.info);
        let count = r.u2().ok()?;
        let mut out = Vec::with_capacity(count as usize);
        for _ in 0..count {
            out.push((r.u2().ok()?, r.u2().ok()?));
        }
        Some(out)
    }

    /// Rows of a LocalVariableTable or LocalVariableTypeTable:
    /// `(start_pc, length, name, descriptor_or_signature, slot)`.
    pub fn local_variables(
        &self,
        table: &str,
        pool: &ConstantPoolView,
    ) -> Result<Option<Vec<(u16, u16, String, String, u16)>>, ReadError> {
        let Some(a) = self.attribute(table) else {
            return Ok(None);
        };
        let mut r = Reader::new(&a.info);
        let count = r.u2()?;
        let mut out = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let start = r.u2()?;
            let length = r.u2()?;
            let name = pool.utf8(CpIndex(r.u2()?))?.to_string();
            let ty = pool.utf8(CpIndex(r.u2()?))?.to_string();
            let slot = r.u2()?;
            out.push((start, length, name, ty, slot));
        }
        r.finish()?;
        Ok(Some(out))
    }
}

/// A decoded class file.
#[derive(Clone, Debug)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub pool: ConstantPoolView,
    pub access_flags: u16,
    pub this_class: CpIndex,
    pub super_class: CpIndex,
    pub interfaces: Vec<CpIndex>,
    pub fields: Vec<Member>,
    pub methods: Vec<Member>,
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<Self, ReadError> {
        let mut r = Reader::new(bytes);
        let magic = r.u4()?;
        if magic != MAGIC {
            return Err(ReadError::InvalidMagic(magic));
        }
        let minor_version = r.u2()?;
        let major_version = r.u2()?;
        let pool = r.constant_pool()?;
        let access_flags = r.u2()?;
        let this_class = CpIndex(r.u2()?);
        let super_class = CpIndex(r.u2()?);
        let interface_count = r.u2()?;
        let interfaces = (0..interface_count)
            .map(|_| r.u2().map(CpIndex))
            .collect::<Result<Vec<_>, _>>()?;
        let fields = r.members(&pool)?;
        let methods = r.members(&pool)?;
        let attributes = r.attributes(&pool)?;
        r.finish()?;

        Ok(Self {
            minor_version,
            major_version,
            pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    pub fn this_name(&self) -> Result<&str, ReadError> {
        self.pool.class_name(self.this_class)
    }

    pub fn super_name(&self) -> Result<Option<&str>, ReadError> {
        if self.super_class.is_none() {
            return Ok(None);
        }
        self.pool.class_name(self.super_class).map(Some)
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        find(&self.attributes, name)
    }

    pub fn field(&self, name: &str) -> Option<&Member> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&Member> {
        self.methods.iter().find(|m| m.name == name)
    }
}

pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub(crate) fn bytes(&mut self, len: usize) -> Result<&'a [u8], ReadError> {
        let end = self.pos + len;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or(ReadError::UnexpectedEof(self.bytes.len()))?;
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn u1(&mut self) -> Result<u8, ReadError> {
        Ok(self.bytes(1)?[0])
    }

    pub(crate) fn u2(&mut self) -> Result<u16, ReadError> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub(crate) fn u4(&mut self) -> Result<u32, ReadError> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn u8(&mut self) -> Result<u64, ReadError> {
        let hi = self.u4()? as u64;
        let lo = self.u4()? as u64;
        Ok(hi << 32 | lo)
    }

    pub(crate) fn finish(&self) -> Result<(), ReadError> {
        match self.bytes.len() - self.pos {
            0 => Ok(()),
            n => Err(ReadError::TrailingBytes(n)),
        }
    }

    fn constant_pool(&mut self) -> Result<ConstantPoolView, ReadError> {
        let count = self.u2()? as usize;
        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable);
        while entries.len() < count {
            let index = entries.len() as u16;
            let t = self.u1()?;
            let entry = match t {
                tag::UTF8 => {
                    let len = self.u2()? as usize;
                    Constant::Utf8(mutf8::decode(self.bytes(len)?)?)
                }
                tag::INTEGER => Constant::Integer(self.u4()? as i32),
                tag::FLOAT => Constant::Float(f32::from_bits(self.u4()?)),
                tag::LONG => Constant::Long(self.u8()? as i64),
                tag::DOUBLE => Constant::Double(f64::from_bits(self.u8()?)),
                tag::CLASS => Constant::Class(CpIndex(self.u2()?)),
                tag::STRING => Constant::String(CpIndex(self.u2()?)),
                tag::FIELD_REF | tag::METHOD_REF | tag::INTERFACE_METHOD_REF => {
                    let class = CpIndex(self.u2()?);
                    let name_and_type = CpIndex(self.u2()?);
                    match t {
                        tag::FIELD_REF => Constant::FieldRef {
                            class,
                            name_and_type,
                        },
                        tag::METHOD_REF => Constant::MethodRef {
                            class,
                            name_and_type,
                        },
                        _ => Constant::InterfaceMethodRef {
                            class,
                            name_and_type,
                        },
                    }
                }
                tag::NAME_AND_TYPE => Constant::NameAndType {
                    name: CpIndex(self.u2()?),
                    descriptor: CpIndex(self.u2()?),
                },
                _ => return Err(ReadError::UnknownConstantTag { tag: t, index }),
            };
            let wide = matches!(entry, Constant::Long(_) | Constant::Double(_));
            entries.push(entry);
            if wide {
                entries.push(Constant::Unusable);
            }
        }
        Ok(ConstantPoolView { entries })
    }

    pub(crate) fn attributes(
        &mut self,
        pool: &ConstantPoolView,
    ) -> Result<Vec<Attribute>, ReadError> {
        let count = self.u2()?;
        let mut out = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let name = pool.utf8(CpIndex(self.u2()?))?.to_string();
            let len = self.u4()? as usize;
            let info = self.bytes(len)?.to_vec();
            out.push(Attribute { name, info });
        }
        Ok(out)
    }

    fn members(&mut self, pool: &ConstantPoolView) -> Result<Vec<Member>, ReadError> {
        let count = self.u2()?;
        let mut out = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let access_flags = self.u2()?;
            let name = pool.utf8(CpIndex(self.u2()?))?.to_string();
            let descriptor = pool.utf8(CpIndex(self.u2()?))?.to_string();
            let attributes = self.attributes(pool)?;
            out.push(Member {
                access_flags,
                name,
                descriptor,
                attributes,
            });
        }
        Ok(out)
    }
}
