//! The object table.
//!
//! Every reference oop resolves here. An entry records where the
//! object's fields live in the object space, how many field bytes it
//! owns, and whether those fields hold oops or raw data. Entry 0 is
//! never allocated, so oop 0 stays invalid forever.

use crate::oop::{Oop, TableIndex};

/// Half the oop range is odd and tagged as small integers, so the
/// table can never exceed this.
pub(crate) const MAX_TABLE_ENTRIES: usize = 1 << 15;

/// One object table entry.
///
/// `len` is the exact field byte count, excluding the 4-byte header
/// and the trailing pad byte of odd-length objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectData {
    pub pos: u32,
    pub len: u32,
    pub is_ptr: bool,
}

const PTR_BIT: u32 = 1 << 31;
const LEN_MASK: u32 = PTR_BIT - 1;

impl ObjectData {
    /// Decodes the packed half of a serialized entry.
    ///
    /// ```text
    /// packed: bit 31    pointer flag
    ///         bits 30-0 field byte length
    /// ```
    pub(crate) fn unpack(pos: u32, packed: u32) -> Self {
        Self {
            pos,
            len: packed & LEN_MASK,
            is_ptr: packed & PTR_BIT != 0,
        }
    }

    #[allow(unused)]
    pub(crate) fn pack(self) -> (u32, u32) {
        debug_assert!(self.len <= LEN_MASK);
        let mut packed = self.len;
        if self.is_ptr {
            packed |= PTR_BIT;
        }
        (self.pos, packed)
    }
}

pub(crate) struct ObjectTable {
    entries: Vec<Option<ObjectData>>,
    // Lowest index that may still be free. Allocation scans from here.
    scan_from: usize,
}

impl ObjectTable {
    pub(crate) fn new() -> Self {
        Self {
            entries: vec![None],
            scan_from: 1,
        }
    }

    pub(crate) fn from_entries(mut entries: Vec<Option<ObjectData>>) -> Self {
        if entries.is_empty() {
            entries.push(None);
        }
        Self {
            entries,
            scan_from: 1,
        }
    }

    pub(crate) fn get(&self, index: TableIndex) -> Option<ObjectData> {
        self.entries.get(index as usize).copied().flatten()
    }

    pub(crate) fn set(&mut self, index: TableIndex, data: ObjectData) {
        self.entries[index as usize] = Some(data);
    }

    /// Finds a free entry, reusing interior holes before growing the
    /// table. Returns `None` once all 32768 entries are in use. The
    /// caller must fill the returned index before the next call.
    pub(crate) fn find_next_free(&mut self) -> Option<TableIndex> {
        for index in self.scan_from..self.entries.len() {
            if self.entries[index].is_none() {
                self.scan_from = index;
                return Some(index as TableIndex);
            }
        }
        if self.entries.len() == MAX_TABLE_ENTRIES {
            return None;
        }
        self.entries.push(None);
        self.scan_from = self.entries.len() - 1;
        Some(self.scan_from as TableIndex)
    }

    /// All oops whose entries are in use, in ascending order.
    pub(crate) fn used_oops(&self) -> impl Iterator<Item = Oop> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_some())
            .map(|(index, _)| Oop::from_raw((index as u16) << 1))
    }

    pub(crate) fn used_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }

    #[allow(unused)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn reset(&mut self) {
        self.entries.clear();
        self.entries.push(None);
        self.scan_from = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_packing_roundtrips_flag_and_length() {
        let data = ObjectData {
            pos: 0x1234,
            len: LEN_MASK,
            is_ptr: true,
        };
        let (pos, packed) = data.pack();
        assert_eq!(pos, 0x1234);
        assert_eq!(packed, 0xFFFF_FFFF);
        assert_eq!(ObjectData::unpack(pos, packed), data);

        let plain = ObjectData {
            pos: 8,
            len: 5,
            is_ptr: false,
        };
        let (pos, packed) = plain.pack();
        assert_eq!(packed, 5);
        assert_eq!(ObjectData::unpack(pos, packed), plain);
    }

    #[test]
    fn entry_zero_is_never_handed_out() {
        let mut table = ObjectTable::new();
        let first = table.find_next_free().unwrap();
        assert_eq!(first, 1);
        assert!(table.get(0).is_none());
    }

    #[test]
    fn interior_holes_are_reused_before_growing() {
        let dummy = ObjectData {
            pos: 0,
            len: 2,
            is_ptr: false,
        };
        let mut table = ObjectTable::from_entries(vec![
            None,
            Some(dummy),
            None,
            Some(dummy),
        ]);
        assert_eq!(table.find_next_free(), Some(2));
        table.set(2, dummy);
        assert_eq!(table.find_next_free(), Some(4));
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn a_full_table_refuses_to_grow() {
        let dummy = ObjectData {
            pos: 0,
            len: 2,
            is_ptr: false,
        };
        let mut entries = vec![Some(dummy); MAX_TABLE_ENTRIES];
        entries[0] = None;
        let mut table = ObjectTable::from_entries(entries);
        assert_eq!(table.find_next_free(), None);
    }

    #[test]
    fn used_oops_skips_free_entries() {
        let dummy = ObjectData {
            pos: 0,
            len: 2,
            is_ptr: false,
        };
        let table = ObjectTable::from_entries(vec![None, Some(dummy), None, Some(dummy)]);
        let oops: Vec<Oop> = table.used_oops().collect();
        assert_eq!(oops, vec![Oop::from_raw(2), Oop::from_raw(6)]);
        assert_eq!(table.used_count(), 2);
    }
}
