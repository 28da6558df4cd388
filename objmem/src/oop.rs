use std::fmt;

/// Index of an entry in the object table.
pub type TableIndex = u16;

/// A 16-bit tagged object pointer.
///
/// Encoding:
/// - **Small integer**: `XXXXXXX1` (odd); the upper 15 bits are the
///   value, sign-extended (range -16384 ..= 16383).
/// - **Reference**: `XXXXXXX0` (even); the upper 15 bits index the
///   object table.
///
/// Oop `0` is reserved as the invalid pointer. It decodes to table
/// index 0, which is never allocated, so resolving it always fails.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Oop(u16);

/// An oop decoded into its two possible shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OopKind {
    SmallInt(i16),
    Ref(TableIndex),
}

impl Oop {
    #[inline(always)]
    pub const fn raw(self) -> u16 {
        self.0
    }

    #[inline(always)]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// True iff the oop is an indirect reference (even tag).
    #[inline(always)]
    pub const fn is_pointer(self) -> bool {
        self.0 & 1 == 0
    }

    /// Decodes the tag bit once; callers match instead of re-testing.
    #[inline(always)]
    pub const fn kind(self) -> OopKind {
        if self.0 & 1 == 1 {
            OopKind::SmallInt((self.0 as i16) >> 1)
        } else {
            OopKind::Ref(self.0 >> 1)
        }
    }

    // ── small integers ─────────────────────────────────────────────

    #[inline(always)]
    pub fn from_small_int(n: i16) -> Self {
        debug_assert!(
            (-0x4000..0x4000).contains(&n),
            "small integer overflow: {n}"
        );
        Self(((n << 1) | 1) as u16)
    }

    /// Signed value of a small integer, `None` for references.
    #[inline(always)]
    pub const fn as_small_int(self) -> Option<i16> {
        if self.0 & 1 == 1 {
            Some((self.0 as i16) >> 1)
        } else {
            None
        }
    }

    /// Unsigned 15-bit payload of a small integer. Packed header words
    /// (method headers, instance specs) are read in this form.
    #[inline(always)]
    pub const fn as_small_bits(self) -> Option<u16> {
        if self.0 & 1 == 1 {
            Some(self.0 >> 1)
        } else {
            None
        }
    }

    #[inline(always)]
    pub fn from_small_bits(bits: u16) -> Self {
        debug_assert!(bits <= 0x7FFF, "small integer payload overflow: {bits}");
        Self((bits << 1) | 1)
    }
}

impl fmt::Debug for Oop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            OopKind::SmallInt(n) => write!(f, "SmallInt({n})"),
            OopKind::Ref(index) => write!(f, "Ref(0x{index:x})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_oops_are_small_integers_and_even_oops_are_references() {
        assert!(!Oop::from_raw(1).is_pointer());
        assert!(!Oop::from_raw(0xFFFF).is_pointer());
        assert!(Oop::from_raw(2).is_pointer());
        assert!(Oop::from_raw(0).is_pointer());
    }

    #[test]
    fn small_integers_roundtrip_across_the_whole_range() {
        for n in -16384..=16383i16 {
            let oop = Oop::from_small_int(n);
            assert!(!oop.is_pointer());
            assert_eq!(oop.as_small_int(), Some(n));
        }
    }

    #[test]
    fn documented_constants_decode_to_their_values() {
        assert_eq!(Oop::from_raw(0xFFFF).as_small_int(), Some(-1));
        assert_eq!(Oop::from_raw(1).as_small_int(), Some(0));
        assert_eq!(Oop::from_raw(3).as_small_int(), Some(1));
        assert_eq!(Oop::from_raw(5).as_small_int(), Some(2));

        assert_eq!(Oop::from_small_int(-1).raw(), 0xFFFF);
        assert_eq!(Oop::from_small_int(0).raw(), 1);
        assert_eq!(Oop::from_small_int(1).raw(), 3);
        assert_eq!(Oop::from_small_int(2).raw(), 5);
    }

    #[test]
    fn kind_splits_references_from_small_integers() {
        assert_eq!(Oop::from_raw(0x0C).kind(), OopKind::Ref(6));
        assert_eq!(Oop::from_raw(7).kind(), OopKind::SmallInt(3));
        assert_eq!(Oop::from_raw(0).kind(), OopKind::Ref(0));
    }

    #[test]
    fn integer_accessors_answer_none_for_references() {
        assert_eq!(Oop::from_raw(2).as_small_int(), None);
        assert_eq!(Oop::from_raw(0).as_small_bits(), None);
    }

    #[test]
    fn small_bits_expose_the_unsigned_payload() {
        let oop = Oop::from_small_bits(0x4002);
        assert_eq!(oop.raw(), 0x8005);
        assert_eq!(oop.as_small_bits(), Some(0x4002));
        // the signed reading of the same payload is negative
        assert!(oop.as_small_int().unwrap() < 0);
    }

    #[test]
    fn debug_renders_the_decoded_form() {
        assert_eq!(format!("{:?}", Oop::from_small_int(3)), "SmallInt(3)");
        assert_eq!(format!("{:?}", Oop::from_raw(0x0C)), "Ref(0x6)");
    }
}
