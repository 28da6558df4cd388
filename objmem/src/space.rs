//! The object space.
//!
//! One contiguous byte region holding every object body. Each body is
//! a 4-byte header (size word, class word) followed by the fields,
//! padded to an even byte count. Words are stored little-endian.

use crate::oop::Oop;

pub(crate) const OBJECT_HEADER_BYTES: u32 = 4;
pub(crate) const SIZE_WORD_OFFSET: u32 = 0;
pub(crate) const CLASS_WORD_OFFSET: u32 = 2;

/// Rounds a field byte length up to the next word boundary.
pub(crate) fn padded(len: u32) -> u32 {
    len + (len & 1)
}

pub(crate) struct ObjectSpace {
    bytes: Vec<u8>,
}

impl ObjectSpace {
    pub(crate) fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    pub(crate) fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub(crate) fn len(&self) -> u32 {
        self.bytes.len() as u32
    }

    pub(crate) fn read_word(&self, pos: u32) -> u16 {
        let pos = pos as usize;
        u16::from_le_bytes([self.bytes[pos], self.bytes[pos + 1]])
    }

    pub(crate) fn write_word(&mut self, pos: u32, value: u16) {
        let pos = pos as usize;
        self.bytes[pos..pos + 2].copy_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn read_byte(&self, pos: u32) -> u8 {
        self.bytes[pos as usize]
    }

    pub(crate) fn write_byte(&mut self, pos: u32, value: u8) {
        self.bytes[pos as usize] = value;
    }

    pub(crate) fn slice(&self, pos: u32, len: u32) -> &[u8] {
        &self.bytes[pos as usize..(pos + len) as usize]
    }

    /// Whether a body with this many field bytes still fits without
    /// overrunning the 32-bit position range.
    pub(crate) fn fits(&self, field_len: u32) -> bool {
        let end = self.bytes.len() as u64
            + OBJECT_HEADER_BYTES as u64
            + padded(field_len) as u64;
        end <= u32::MAX as u64
    }

    /// Appends a zero-filled body and returns its header position.
    pub(crate) fn append_object(&mut self, field_len: u32, class: Oop) -> u32 {
        let pos = self.bytes.len() as u32;
        self.bytes.extend_from_slice(&(field_len as u16).to_le_bytes());
        self.bytes.extend_from_slice(&class.raw().to_le_bytes());
        let total = (pos + OBJECT_HEADER_BYTES + padded(field_len)) as usize;
        self.bytes.resize(total, 0);
        pos
    }

    pub(crate) fn reset(&mut self) {
        self.bytes.clear();
    }
}
