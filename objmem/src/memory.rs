//! The owning store.
//!
//! `ObjectMemory` holds the object table and the object space and is
//! the only way to reach either. Accessors hand out oops or borrowed
//! byte views; the borrow keeps the memory immutable while a view is
//! alive, so object bodies cannot move or change under a reader.

use std::collections::HashSet;
use std::fmt;

use crate::error::{MemoryError, MemoryResult};
use crate::known;
use crate::oop::{Oop, OopKind};
use crate::space::{CLASS_WORD_OFFSET, OBJECT_HEADER_BYTES, ObjectSpace};
use crate::table::{ObjectData, ObjectTable};

pub struct ObjectMemory {
    pub(crate) table: ObjectTable,
    pub(crate) space: ObjectSpace,
    pub(crate) objects: HashSet<Oop>,
    pub(crate) classes: HashSet<Oop>,
    pub(crate) metaclasses: HashSet<Oop>,
}

impl ObjectMemory {
    pub fn new() -> Self {
        Self {
            table: ObjectTable::new(),
            space: ObjectSpace::new(),
            objects: HashSet::new(),
            classes: HashSet::new(),
            metaclasses: HashSet::new(),
        }
    }

    pub(crate) fn entry_of(&self, oop: Oop) -> MemoryResult<ObjectData> {
        match oop.kind() {
            OopKind::SmallInt(_) => Err(MemoryError::InvalidOop { oop }),
            OopKind::Ref(index) => self
                .table
                .get(index)
                .ok_or(MemoryError::InvalidOop { oop }),
        }
    }

    /// Extent of an object's bytes, optionally without the header.
    pub(crate) fn data_of(&self, oop: Oop, no_header: bool) -> MemoryResult<ObjectData> {
        let mut data = self.entry_of(oop)?;
        if no_header {
            data.pos += OBJECT_HEADER_BYTES;
        } else {
            data.len += OBJECT_HEADER_BYTES;
        }
        Ok(data)
    }

    /// The object's raw bytes. With `no_header` the view starts at the
    /// first field, otherwise it covers the 4-byte header as well. The
    /// trailing pad byte of odd-length objects is excluded either way.
    pub fn fetch_data_of(&self, oop: Oop, no_header: bool) -> MemoryResult<&[u8]> {
        let data = self.data_of(oop, no_header)?;
        Ok(self.space.slice(data.pos, data.len))
    }

    pub(crate) fn class_of(&self, oop: Oop) -> MemoryResult<Oop> {
        let data = self.entry_of(oop)?;
        Ok(Oop::from_raw(self.space.read_word(data.pos + CLASS_WORD_OFFSET)))
    }

    /// The class of any oop. Small integers answer the SmallInteger
    /// class without touching the table.
    pub fn fetch_class_of(&self, oop: Oop) -> MemoryResult<Oop> {
        match oop.kind() {
            OopKind::SmallInt(_) => Ok(known::CLASS_SMALL_INTEGER),
            OopKind::Ref(_) => self.class_of(oop),
        }
    }

    /// Whether the object's fields hold oops rather than raw data.
    pub fn has_pointer_members(&self, oop: Oop) -> MemoryResult<bool> {
        Ok(self.entry_of(oop)?.is_ptr)
    }

    fn pointer_data(&self, oop: Oop) -> MemoryResult<ObjectData> {
        let data = self.entry_of(oop)?;
        if !data.is_ptr {
            return Err(MemoryError::TypeMismatch {
                oop,
                expected: "a pointer object",
            });
        }
        Ok(data)
    }

    fn non_pointer_data(&self, oop: Oop) -> MemoryResult<ObjectData> {
        let data = self.entry_of(oop)?;
        if data.is_ptr {
            return Err(MemoryError::TypeMismatch {
                oop,
                expected: "a word or byte object",
            });
        }
        Ok(data)
    }

    fn check_index(index: u16, limit: u16) -> MemoryResult<()> {
        if index >= limit {
            return Err(MemoryError::IndexOutOfRange { index, limit });
        }
        Ok(())
    }

    // Word indices may reach into the padded word of an odd-length
    // object; byte indices may not.
    fn word_limit(data: &ObjectData) -> u16 {
        data.len.div_ceil(2) as u16
    }

    pub fn fetch_pointer_of_object(&self, field_index: u16, oop: Oop) -> MemoryResult<Oop> {
        let data = self.pointer_data(oop)?;
        Self::check_index(field_index, Self::word_limit(&data))?;
        let pos = data.pos + OBJECT_HEADER_BYTES + 2 * field_index as u32;
        Ok(Oop::from_raw(self.space.read_word(pos)))
    }

    pub fn store_pointer_of_object(
        &mut self,
        field_index: u16,
        oop: Oop,
        value: Oop,
    ) -> MemoryResult<()> {
        let data = self.pointer_data(oop)?;
        Self::check_index(field_index, Self::word_limit(&data))?;
        let pos = data.pos + OBJECT_HEADER_BYTES + 2 * field_index as u32;
        self.space.write_word(pos, value.raw());
        Ok(())
    }

    pub fn fetch_word_of_object(&self, field_index: u16, oop: Oop) -> MemoryResult<u16> {
        let data = self.non_pointer_data(oop)?;
        Self::check_index(field_index, Self::word_limit(&data))?;
        let pos = data.pos + OBJECT_HEADER_BYTES + 2 * field_index as u32;
        Ok(self.space.read_word(pos))
    }

    pub fn store_word_of_object(
        &mut self,
        field_index: u16,
        oop: Oop,
        value: u16,
    ) -> MemoryResult<()> {
        let data = self.non_pointer_data(oop)?;
        Self::check_index(field_index, Self::word_limit(&data))?;
        let pos = data.pos + OBJECT_HEADER_BYTES + 2 * field_index as u32;
        self.space.write_word(pos, value);
        Ok(())
    }

    pub fn fetch_byte_of_object(&self, byte_index: u16, oop: Oop) -> MemoryResult<u8> {
        let data = self.non_pointer_data(oop)?;
        Self::check_index(byte_index, data.len as u16)?;
        Ok(self.space.read_byte(data.pos + OBJECT_HEADER_BYTES + byte_index as u32))
    }

    pub fn store_byte_of_object(
        &mut self,
        byte_index: u16,
        oop: Oop,
        value: u8,
    ) -> MemoryResult<()> {
        let data = self.non_pointer_data(oop)?;
        Self::check_index(byte_index, data.len as u16)?;
        self.space
            .write_byte(data.pos + OBJECT_HEADER_BYTES + byte_index as u32, value);
        Ok(())
    }

    /// The exact field byte count, excluding header and padding.
    pub fn fetch_byte_length_of(&self, oop: Oop) -> MemoryResult<u16> {
        Ok(self.entry_of(oop)?.len as u16)
    }

    /// The field length in 16-bit words, counting a trailing odd byte
    /// as a full word.
    pub fn fetch_word_length_of(&self, oop: Oop) -> MemoryResult<u16> {
        Ok(self.entry_of(oop)?.len.div_ceil(2) as u16)
    }

    /// The field bytes of a byte object, typically a String or Symbol.
    pub fn fetch_byte_string(&self, oop: Oop) -> MemoryResult<&[u8]> {
        let data = self.non_pointer_data(oop)?;
        Ok(self.space.slice(data.pos + OBJECT_HEADER_BYTES, data.len))
    }

    /// Every oop whose table entry is in use, in ascending order.
    pub fn all_valid_oops(&self) -> Vec<Oop> {
        self.table.used_oops().collect()
    }

    /// Plain instances found when the image was loaded. Allocation
    /// does not update this snapshot.
    pub fn objects(&self) -> &HashSet<Oop> {
        &self.objects
    }

    /// Class oops found when the image was loaded.
    pub fn classes(&self) -> &HashSet<Oop> {
        &self.classes
    }

    /// Metaclass oops found when the image was loaded.
    pub fn metaclasses(&self) -> &HashSet<Oop> {
        &self.metaclasses
    }

    pub(crate) fn reset(&mut self) {
        self.table.reset();
        self.space.reset();
        self.objects.clear();
        self.classes.clear();
        self.metaclasses.clear();
    }
}

impl Default for ObjectMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectMemory")
            .field("used", &self.table.used_count())
            .field("space_bytes", &self.space.len())
            .field("classes", &self.classes.len())
            .field("metaclasses", &self.metaclasses.len())
            .finish()
    }
}
