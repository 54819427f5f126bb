//! Class file index newtypes.

/// Index into the constant pool.
///
/// Index 0 is never a valid entry; it doubles as the "absent" value in
/// fields such as `super_class` or an inner class's `outer_class_info_index`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
#[repr(transparent)]
pub struct CpIndex(pub u16);

impl CpIndex {
    pub const NONE: Self = Self(0);

    #[inline]
    pub fn get(self) -> u16 {
        self.0
    }

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl std::fmt::Display for CpIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_zero() {
        assert!(CpIndex::NONE.is_none());
        assert!(!CpIndex(1).is_none());
        assert_eq!(CpIndex(0x1234).to_be_bytes(), [0x12, 0x34]);
    }

    #[test]
    fn display_uses_hash_prefix() {
        assert_eq!(CpIndex(7).to_string(), "#7");
    }
}
