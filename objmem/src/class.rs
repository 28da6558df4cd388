//! Class-shaped accessors.
//!
//! Classes are ordinary pointer objects with a fixed layout for their
//! first slots. The instance specification slot packs the shape of
//! future instances into a single small integer.

use crate::error::{MemoryError, MemoryResult};
use crate::memory::ObjectMemory;
use crate::oop::Oop;

pub const CLASS_SUPERCLASS_INDEX: u16 = 0;
pub const CLASS_MESSAGE_DICT_INDEX: u16 = 1;
pub const CLASS_INSTANCE_SPEC_INDEX: u16 = 2;
/// A class keeps its name Symbol here. A metaclass keeps the class it
/// describes here instead.
pub const CLASS_NAME_INDEX: u16 = 6;
pub const ASSOCIATION_VALUE_INDEX: u16 = 1;

const POINTERS_BIT: u16 = 1 << 14;
const WORDS_BIT: u16 = 1 << 13;
const INDEXABLE_BIT: u16 = 1 << 12;
const FIXED_FIELDS_MASK: u16 = 0x07FF;

/// Decoded instance specification.
///
/// ```text
/// bit 14     fields hold oops
/// bit 13     fields are 16-bit words
/// bit 12     instances are indexable
/// bits 10-0  fixed field count
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstanceSpec {
    pub pointers: bool,
    pub words: bool,
    pub indexable: bool,
    pub fixed_fields: u16,
}

impl InstanceSpec {
    pub fn unpack(bits: u16) -> Self {
        Self {
            pointers: bits & POINTERS_BIT != 0,
            words: bits & WORDS_BIT != 0,
            indexable: bits & INDEXABLE_BIT != 0,
            fixed_fields: bits & FIXED_FIELDS_MASK,
        }
    }

    pub fn pack(self) -> u16 {
        debug_assert!(self.fixed_fields <= FIXED_FIELDS_MASK);
        let mut bits = self.fixed_fields;
        if self.pointers {
            bits |= POINTERS_BIT;
        }
        if self.words {
            bits |= WORDS_BIT;
        }
        if self.indexable {
            bits |= INDEXABLE_BIT;
        }
        bits
    }
}

impl ObjectMemory {
    pub fn fetch_superclass_of(&self, class: Oop) -> MemoryResult<Oop> {
        self.fetch_pointer_of_object(CLASS_SUPERCLASS_INDEX, class)
    }

    pub fn fetch_message_dict_of(&self, class: Oop) -> MemoryResult<Oop> {
        self.fetch_pointer_of_object(CLASS_MESSAGE_DICT_INDEX, class)
    }

    /// The decoded instance specification of a class.
    pub fn instance_spec_of(&self, class: Oop) -> MemoryResult<InstanceSpec> {
        let spec = self.fetch_pointer_of_object(CLASS_INSTANCE_SPEC_INDEX, class)?;
        let bits = spec.as_small_bits().ok_or(MemoryError::TypeMismatch {
            oop: spec,
            expected: "a small integer",
        })?;
        Ok(InstanceSpec::unpack(bits))
    }

    /// The value slot of an Association, e.g. of the Smalltalk root.
    pub fn association_value_of(&self, association: Oop) -> MemoryResult<Oop> {
        self.fetch_pointer_of_object(ASSOCIATION_VALUE_INDEX, association)
    }

    /// The name bytes of a class. When the name slot holds a pointer
    /// object the receiver is a metaclass and the slot holds the
    /// described class, so the lookup hops once.
    pub fn fetch_class_name(&self, class: Oop) -> MemoryResult<&[u8]> {
        let name = self.fetch_pointer_of_object(CLASS_NAME_INDEX, class)?;
        if self.has_pointer_members(name)? {
            let described = self.fetch_pointer_of_object(CLASS_NAME_INDEX, name)?;
            self.fetch_byte_string(described)
        } else {
            self.fetch_byte_string(name)
        }
    }
}
