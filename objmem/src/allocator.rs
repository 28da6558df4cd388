//! Instance allocation.
//!
//! New bodies are appended to the object space and registered in the
//! lowest free table entry. Nothing is ever moved or reclaimed, so an
//! oop stays valid for the life of the memory.

use log::trace;

use crate::error::{MemoryError, MemoryResult};
use crate::known;
use crate::memory::ObjectMemory;
use crate::oop::Oop;
use crate::table::ObjectData;

impl ObjectMemory {
    /// Creates an instance with `size` oop fields, each preset to nil.
    pub fn instantiate_class_with_pointers(
        &mut self,
        class: Oop,
        size: u16,
    ) -> MemoryResult<Oop> {
        let oop = self.create_instance(class, 2 * size as u32, true)?;
        let data = self.data_of(oop, true)?;
        for field in 0..size {
            self.space
                .write_word(data.pos + 2 * field as u32, known::NIL.raw());
        }
        Ok(oop)
    }

    /// Creates an instance with `size` 16-bit word fields, zero
    /// filled.
    pub fn instantiate_class_with_words(&mut self, class: Oop, size: u16) -> MemoryResult<Oop> {
        self.create_instance(class, 2 * size as u32, false)
    }

    /// Creates an instance with `byte_size` byte fields, zero filled.
    pub fn instantiate_class_with_bytes(
        &mut self,
        class: Oop,
        byte_size: u16,
    ) -> MemoryResult<Oop> {
        self.create_instance(class, byte_size as u32, false)
    }

    fn create_instance(&mut self, class: Oop, byte_len: u32, is_ptr: bool) -> MemoryResult<Oop> {
        if byte_len > u16::MAX as u32 {
            return Err(MemoryError::OutOfMemory {
                reason: "instance exceeds the 16-bit length budget",
            });
        }
        if !self.space.fits(byte_len) {
            return Err(MemoryError::OutOfMemory {
                reason: "object space exhausted",
            });
        }
        // Capacity is checked first so a found entry is always
        // committed.
        let index = self
            .table
            .find_next_free()
            .ok_or(MemoryError::OutOfMemory {
                reason: "object table exhausted",
            })?;
        let pos = self.space.append_object(byte_len, class);
        self.table.set(
            index,
            ObjectData {
                pos,
                len: byte_len,
                is_ptr,
            },
        );
        let oop = Oop::from_raw(index << 1);
        trace!("allocated {oop:?}: class {class:?}, {byte_len} field bytes at {pos}");
        Ok(oop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{MAX_TABLE_ENTRIES, ObjectTable};

    #[test]
    fn pointer_instances_come_nil_filled() {
        let mut memory = ObjectMemory::new();
        let class = memory.instantiate_class_with_pointers(known::NIL, 0).unwrap();
        let instance = memory.instantiate_class_with_pointers(class, 3).unwrap();
        for field in 0..3 {
            assert_eq!(memory.fetch_pointer_of_object(field, instance), Ok(known::NIL));
        }
        assert_eq!(memory.fetch_class_of(instance), Ok(class));
        assert_eq!(memory.has_pointer_members(instance), Ok(true));
        assert_eq!(memory.fetch_byte_length_of(instance), Ok(6));
    }

    #[test]
    fn word_and_byte_instances_come_zeroed() {
        let mut memory = ObjectMemory::new();
        let words = memory.instantiate_class_with_words(known::NIL, 2).unwrap();
        assert_eq!(memory.fetch_word_of_object(0, words), Ok(0));
        assert_eq!(memory.fetch_word_of_object(1, words), Ok(0));
        assert_eq!(memory.has_pointer_members(words), Ok(false));

        let bytes = memory.instantiate_class_with_bytes(known::NIL, 3).unwrap();
        for index in 0..3 {
            assert_eq!(memory.fetch_byte_of_object(index, bytes), Ok(0));
        }
        assert_eq!(memory.fetch_word_length_of(bytes), Ok(2));
    }

    #[test]
    fn oversized_instances_are_refused() {
        let mut memory = ObjectMemory::new();
        assert_eq!(
            memory.instantiate_class_with_pointers(known::NIL, 0x8000),
            Err(MemoryError::OutOfMemory {
                reason: "instance exceeds the 16-bit length budget",
            })
        );
        assert_eq!(
            memory.instantiate_class_with_words(known::NIL, 0x8001),
            Err(MemoryError::OutOfMemory {
                reason: "instance exceeds the 16-bit length budget",
            })
        );
    }

    #[test]
    fn oops_ascend_and_bodies_stay_put() {
        let mut memory = ObjectMemory::new();
        let first = memory.instantiate_class_with_pointers(known::NIL, 1).unwrap();
        let second = memory.instantiate_class_with_bytes(known::NIL, 2).unwrap();
        let third = memory.instantiate_class_with_words(known::NIL, 1).unwrap();
        assert_eq!(first, Oop::from_raw(2));
        assert_eq!(second, Oop::from_raw(4));
        assert_eq!(third, Oop::from_raw(6));

        let marker = Oop::from_small_int(123);
        memory.store_pointer_of_object(0, first, marker).unwrap();
        for _ in 0..16 {
            memory.instantiate_class_with_bytes(known::NIL, 9).unwrap();
        }
        assert_eq!(memory.fetch_pointer_of_object(0, first), Ok(marker));
    }

    #[test]
    fn zero_sized_instances_are_valid() {
        let mut memory = ObjectMemory::new();
        let empty = memory.instantiate_class_with_pointers(known::NIL, 0).unwrap();
        assert_eq!(memory.fetch_byte_length_of(empty), Ok(0));
        assert_eq!(
            memory.fetch_pointer_of_object(0, empty),
            Err(MemoryError::IndexOutOfRange { index: 0, limit: 0 })
        );
    }

    #[test]
    fn a_full_table_reports_out_of_memory() {
        let mut memory = ObjectMemory::new();
        let dummy = ObjectData {
            pos: 0,
            len: 0,
            is_ptr: false,
        };
        let mut entries = vec![Some(dummy); MAX_TABLE_ENTRIES];
        entries[0] = None;
        memory.table = ObjectTable::from_entries(entries);
        assert_eq!(
            memory.instantiate_class_with_bytes(known::NIL, 2),
            Err(MemoryError::OutOfMemory {
                reason: "object table exhausted",
            })
        );
    }
}
