//! Constant pool builder.
//!
//! Interns literals and symbolic references, assigning each distinct entry the
//! next free index on first use. Indices are never reassigned within one
//! emission, even when the attribute that interned an entry is rolled back.

use indexmap::IndexMap;
use roast_classfile::constants::{MAX_POOL_COUNT, MAX_UTF8_LEN, tag};
use roast_classfile::{CpIndex, mutf8};

use super::buffer::{EmitBuffer, Header};
use super::model::PoolConstant;

/// Why an entry could not be interned.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("string is too long: {len} bytes encoded (max 65535)")]
    StringTooLong { len: usize },
    #[error("constant pool is full")]
    Full,
}

/// Pool entry keyed by content. Floating point values are keyed by their bits.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Entry {
    Utf8(String),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class(CpIndex),
    String(CpIndex),
    FieldRef(CpIndex, CpIndex),
    MethodRef(CpIndex, CpIndex),
    InterfaceMethodRef(CpIndex, CpIndex),
    NameAndType(CpIndex, CpIndex),
}

impl Entry {
    fn is_wide(&self) -> bool {
        matches!(self, Self::Long(_) | Self::Double(_))
    }
}

/// Deduplicating constant pool.
#[derive(Debug)]
pub struct ConstantPool {
    entries: IndexMap<Entry, CpIndex>,
    /// Next free index; also the value of `constant_pool_count`.
    next: u16,
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantPool {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            next: 1,
        }
    }

    /// Forget every entry, keeping the allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.next = 1;
    }

    /// Value of the `constant_pool_count` header field.
    pub fn count(&self) -> u16 {
        self.next
    }

    /// Number of distinct entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn intern(&mut self, entry: Entry) -> Result<CpIndex, PoolError> {
        if let Some(&index) = self.entries.get(&entry) {
            return Ok(index);
        }
        let width = if entry.is_wide() { 2 } else { 1 };
        if self.next as usize + width > MAX_POOL_COUNT {
            return Err(PoolError::Full);
        }
        let index = CpIndex(self.next);
        self.next += width as u16;
        self.entries.insert(entry, index);
        Ok(index)
    }

    /// Intern a CONSTANT_Utf8. Text longer than 65535 encoded bytes is refused.
    pub fn utf8(&mut self, text: &str) -> Result<CpIndex, PoolError> {
        let entry = Entry::Utf8(text.to_string());
        if let Some(&index) = self.entries.get(&entry) {
            return Ok(index);
        }
        let len = mutf8::encoded_len(text);
        if len > MAX_UTF8_LEN {
            return Err(PoolError::StringTooLong { len });
        }
        self.intern(entry)
    }

    pub fn integer(&mut self, value: i32) -> Result<CpIndex, PoolError> {
        self.intern(Entry::Integer(value))
    }

    pub fn float(&mut self, value: f32) -> Result<CpIndex, PoolError> {
        self.intern(Entry::Float(value.to_bits()))
    }

    pub fn long(&mut self, value: i64) -> Result<CpIndex, PoolError> {
        self.intern(Entry::Long(value))
    }

    pub fn double(&mut self, value: f64) -> Result<CpIndex, PoolError> {
        self.intern(Entry::Double(value.to_bits()))
    }

    /// Intern a CONSTANT_String literal.
    pub fn string(&mut self, text: &str) -> Result<CpIndex, PoolError> {
        let utf8 = self.utf8(text)?;
        self.intern(Entry::String(utf8))
    }

    /// Intern a CONSTANT_Class by internal name or array descriptor.
    pub fn class(&mut self, name: &str) -> Result<CpIndex, PoolError> {
        let utf8 = self.utf8(name)?;
        self.intern(Entry::Class(utf8))
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> Result<CpIndex, PoolError> {
        let name = self.utf8(name)?;
        let descriptor = self.utf8(descriptor)?;
        self.intern(Entry::NameAndType(name, descriptor))
    }

    pub fn field_ref(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<CpIndex, PoolError> {
        let class = self.class(owner)?;
        let nat = self.name_and_type(name, descriptor)?;
        self.intern(Entry::FieldRef(class, nat))
    }

    pub fn method_ref(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<CpIndex, PoolError> {
        let class = self.class(owner)?;
        let nat = self.name_and_type(name, descriptor)?;
        self.intern(Entry::MethodRef(class, nat))
    }

    pub fn interface_method_ref(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<CpIndex, PoolError> {
        let class = self.class(owner)?;
        let nat = self.name_and_type(name, descriptor)?;
        self.intern(Entry::InterfaceMethodRef(class, nat))
    }

    /// Intern a symbolic constant referenced from instruction bytes.
    pub fn constant(&mut self, constant: &PoolConstant) -> Result<CpIndex, PoolError> {
        match constant {
            PoolConstant::Int(v) => self.integer(*v),
            PoolConstant::Float(v) => self.float(*v),
            PoolConstant::Long(v) => self.long(*v),
            PoolConstant::Double(v) => self.double(*v),
            PoolConstant::String(text) => self.string(text),
            PoolConstant::Class(name) => self.class(name),
            PoolConstant::FieldRef {
                owner,
                name,
                descriptor,
            } => self.field_ref(owner, name, descriptor),
            PoolConstant::MethodRef {
                owner,
                name,
                descriptor,
            } => self.method_ref(owner, name, descriptor),
            PoolConstant::InterfaceMethodRef {
                owner,
                name,
                descriptor,
            } => self.interface_method_ref(owner, name, descriptor),
        }
    }

    /// Serialize `constant_pool_count` and every entry in index order.
    ///
    /// Call only after the last member has been encoded.
    pub fn write_to(&self, out: &mut EmitBuffer<Header>) {
        out.u2(self.next);
        for entry in self.entries.keys() {
            match entry {
                Entry::Utf8(text) => {
                    let bytes = mutf8::encode(text);
                    out.u1(tag::UTF8);
                    out.u2(bytes.len() as u16);
                    out.bytes(&bytes);
                }
                Entry::Integer(v) => {
                    out.u1(tag::INTEGER);
                    out.u4(*v as u32);
                }
                Entry::Float(bits) => {
                    out.u1(tag::FLOAT);
                    out.u4(*bits);
                }
                Entry::Long(v) => {
                    out.u1(tag::LONG);
                    out.bytes(&v.to_be_bytes());
                }
                Entry::Double(bits) => {
                    out.u1(tag::DOUBLE);
                    out.bytes(&bits.to_be_bytes());
                }
                Entry::Class(name) => {
                    out.u1(tag::CLASS);
                    out.u2(name.get());
                }
                Entry::String(text) => {
                    out.u1(tag::STRING);
                    out.u2(text.get());
                }
                Entry::FieldRef(class, nat) => ref_entry(out, tag::FIELD_REF, *class, *nat),
                Entry::MethodRef(class, nat) => ref_entry(out, tag::METHOD_REF, *class, *nat),
                Entry::InterfaceMethodRef(class, nat) => {
                    ref_entry(out, tag::INTERFACE_METHOD_REF, *class, *nat)
                }
                Entry::NameAndType(name, descriptor) => {
                    ref_entry(out, tag::NAME_AND_TYPE, *name, *descriptor)
                }
            }
        }
    }
}

fn ref_entry(out: &mut EmitBuffer<Header>, tag: u8, first: CpIndex, second: CpIndex) {
    out.u1(tag);
    out.u2(first.get());
    out.u2(second.get());
}
