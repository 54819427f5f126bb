//! Growable output buffers for the two halves of a class file.
//!
//! The constant pool sits near the start of a class file, but members keep
//! adding to it until the very end. Member bytes therefore go into a
//! [`Body`] buffer while the pool and the fixed header go into a [`Header`]
//! buffer; the two are concatenated once the pool is final. The section
//! marker keeps the two from being mixed up.

use std::marker::PhantomData;

/// Buffer holding magic, version and the constant pool.
#[derive(Debug)]
pub struct Header;

/// Buffer holding everything after the constant pool.
#[derive(Debug)]
pub struct Body;

/// Position in a buffer, used to roll back a partial write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Mark(usize);

impl Mark {
    pub fn offset(self) -> usize {
        self.0
    }
}

/// A reserved u2 field, patched once its value is known.
#[derive(Debug)]
#[must_use = "reserved field must be patched"]
pub struct U2Slot(usize);

/// A reserved u4 field, patched once its value is known.
#[derive(Debug)]
#[must_use = "reserved field must be patched"]
pub struct U4Slot(usize);

impl U4Slot {
    pub fn offset(&self) -> usize {
        self.0
    }
}

/// Big-endian byte buffer for one section of a class file.
///
/// Capacity doubles on growth, or grows by the shortfall when a single write
/// is larger. Offsets stay valid across growth.
#[derive(Debug)]
pub struct EmitBuffer<S> {
    bytes: Vec<u8>,
    _section: PhantomData<S>,
}

impl<S> EmitBuffer<S> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            _section: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Drop the contents, keeping the allocation.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    fn grow_for(&mut self, additional: usize) {
        let free = self.bytes.capacity() - self.bytes.len();
        if additional <= free {
            return;
        }
        let step = self.bytes.capacity().max(additional - free).max(64);
        self.bytes.reserve_exact(free + step);
    }

    pub fn u1(&mut self, value: u8) {
        self.grow_for(1);
        self.bytes.push(value);
    }

    pub fn u2(&mut self, value: u16) {
        self.bytes(&value.to_be_bytes());
    }

    pub fn u4(&mut self, value: u32) {
        self.bytes(&value.to_be_bytes());
    }

    pub fn bytes(&mut self, data: &[u8]) {
        self.grow_for(data.len());
        self.bytes.extend_from_slice(data);
    }

    pub fn mark(&self) -> Mark {
        Mark(self.bytes.len())
    }

    /// Discard everything written since `mark`.
    pub fn rewind(&mut self, mark: Mark) {
        self.bytes.truncate(mark.0);
    }

    pub fn reserve_u2(&mut self) -> U2Slot {
        let at = self.bytes.len();
        self.u2(0);
        U2Slot(at)
    }

    pub fn reserve_u4(&mut self) -> U4Slot {
        let at = self.bytes.len();
        self.u4(0);
        U4Slot(at)
    }

    pub fn patch_u2(&mut self, slot: U2Slot, value: u16) {
        self.bytes[slot.0..slot.0 + 2].copy_from_slice(&value.to_be_bytes());
    }

    pub fn patch_u4(&mut self, slot: U4Slot, value: u32) {
        self.bytes[slot.0..slot.0 + 4].copy_from_slice(&value.to_be_bytes());
    }

    /// Patch a u4 length field with the number of bytes written after it.
    pub fn patch_length(&mut self, slot: U4Slot) {
        let len = self.bytes.len() - slot.0 - 4;
        self.patch_u4(slot, len as u32);
    }

    /// Read back a u2 written earlier.
    pub fn u2_at(&self, offset: usize) -> Option<u16> {
        let b = self.bytes.get(offset..offset + 2)?;
        Some(u16::from_be_bytes([b[0], b[1]]))
    }
}

impl EmitBuffer<Header> {
    /// Join the finished header with the body into the class file bytes.
    pub fn concat(&self, body: &EmitBuffer<Body>) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len() + body.len());
        out.extend_from_slice(&self.bytes);
        out.extend_from_slice(&body.bytes);
        out
    }
}
