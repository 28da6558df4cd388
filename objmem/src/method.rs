//! Compiled method decoding.
//!
//! A compiled method is a byte object whose leading words hold oops:
//!
//! ```text
//! word 0           header, a packed small integer
//! words 1..1+L     literal frame, L = literal count
//! bytes 2*(1+L)..  bytecodes
//! ```
//!
//! Methods flagged as primitive returns carry no bytecodes at all.

use crate::error::{MemoryError, MemoryResult};
use crate::memory::ObjectMemory;
use crate::oop::Oop;
use crate::space::OBJECT_HEADER_BYTES;

const FLAGS_SHIFT: u16 = 12;
const FLAGS_MASK: u16 = 0x7;
const TEMPORARY_SHIFT: u16 = 7;
const TEMPORARY_MASK: u16 = 0x1F;
const LARGE_CONTEXT_BIT: u16 = 1 << 6;
const LITERAL_MASK: u16 = 0x3F;

const EXTENSION_ARGS_SHIFT: u16 = 8;
const EXTENSION_ARGS_MASK: u16 = 0x1F;
const EXTENSION_PRIMITIVE_MASK: u16 = 0xFF;

/// The flag field of a method header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodFlags {
    ZeroArguments,
    OneArgument,
    TwoArguments,
    ThreeArguments,
    FourArguments,
    /// Primitive that returns self. The method has no bytecodes.
    ZeroArgPrimitiveReturnSelf,
    /// Primitive that returns an instance variable, whose index sits
    /// in the temporary count field. No bytecodes either.
    ZeroArgPrimitiveReturnVar,
    /// Argument count and primitive index live in an extension
    /// literal.
    HeaderExtension,
}

impl MethodFlags {
    fn from_bits(bits: u16) -> Self {
        match bits {
            0 => Self::ZeroArguments,
            1 => Self::OneArgument,
            2 => Self::TwoArguments,
            3 => Self::ThreeArguments,
            4 => Self::FourArguments,
            5 => Self::ZeroArgPrimitiveReturnSelf,
            6 => Self::ZeroArgPrimitiveReturnVar,
            _ => Self::HeaderExtension,
        }
    }

    fn bits(self) -> u16 {
        match self {
            Self::ZeroArguments => 0,
            Self::OneArgument => 1,
            Self::TwoArguments => 2,
            Self::ThreeArguments => 3,
            Self::FourArguments => 4,
            Self::ZeroArgPrimitiveReturnSelf => 5,
            Self::ZeroArgPrimitiveReturnVar => 6,
            Self::HeaderExtension => 7,
        }
    }
}

/// Decoded method header.
///
/// `temporary_count` includes the arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MethodHeader {
    pub flags: MethodFlags,
    pub temporary_count: u8,
    pub large_context: bool,
    pub literal_count: u8,
}

impl MethodHeader {
    /// Decodes the 15-bit header payload.
    ///
    /// ```text
    /// bits 14-12  flags
    /// bits 11-7   temporary count
    /// bit 6       large context
    /// bits 5-0    literal count
    /// ```
    pub fn unpack(bits: u16) -> Self {
        Self {
            flags: MethodFlags::from_bits((bits >> FLAGS_SHIFT) & FLAGS_MASK),
            temporary_count: ((bits >> TEMPORARY_SHIFT) & TEMPORARY_MASK) as u8,
            large_context: bits & LARGE_CONTEXT_BIT != 0,
            literal_count: (bits & LITERAL_MASK) as u8,
        }
    }

    pub fn pack(self) -> u16 {
        debug_assert!(u16::from(self.temporary_count) <= TEMPORARY_MASK);
        debug_assert!(u16::from(self.literal_count) <= LITERAL_MASK);
        let mut bits = self.flags.bits() << FLAGS_SHIFT;
        bits |= u16::from(self.temporary_count) << TEMPORARY_SHIFT;
        if self.large_context {
            bits |= LARGE_CONTEXT_BIT;
        }
        bits | u16::from(self.literal_count)
    }
}

impl ObjectMemory {
    fn method_word(&self, index: u16, method: Oop) -> MemoryResult<u16> {
        let data = self.entry_of(method)?;
        if data.is_ptr {
            return Err(MemoryError::TypeMismatch {
                oop: method,
                expected: "a compiled method",
            });
        }
        let limit = data.len.div_ceil(2) as u16;
        if index >= limit {
            return Err(MemoryError::IndexOutOfRange { index, limit });
        }
        Ok(self
            .space
            .read_word(data.pos + OBJECT_HEADER_BYTES + 2 * index as u32))
    }

    fn method_word_bits(&self, index: u16, method: Oop) -> MemoryResult<u16> {
        let word = Oop::from_raw(self.method_word(index, method)?);
        word.as_small_bits().ok_or(MemoryError::TypeMismatch {
            oop: word,
            expected: "a small integer",
        })
    }

    // The extension literal sits second from the end of the literal
    // frame.
    fn method_extension(&self, method: Oop, header: &MethodHeader) -> MemoryResult<u16> {
        let index = header
            .literal_count
            .checked_sub(2)
            .ok_or(MemoryError::TypeMismatch {
                oop: method,
                expected: "a method with a header extension",
            })?;
        self.method_word_bits(1 + u16::from(index), method)
    }

    /// The decoded header word of a compiled method.
    pub fn method_header_of(&self, method: Oop) -> MemoryResult<MethodHeader> {
        Ok(MethodHeader::unpack(self.method_word_bits(0, method)?))
    }

    pub fn method_flags(&self, method: Oop) -> MemoryResult<MethodFlags> {
        Ok(self.method_header_of(method)?.flags)
    }

    /// Temporaries including arguments. For a return-variable
    /// primitive this is the index of the variable to return.
    pub fn method_temporary_count(&self, method: Oop) -> MemoryResult<u8> {
        Ok(self.method_header_of(method)?.temporary_count)
    }

    pub fn method_large_context(&self, method: Oop) -> MemoryResult<bool> {
        Ok(self.method_header_of(method)?.large_context)
    }

    pub fn method_literal_count(&self, method: Oop) -> MemoryResult<u8> {
        Ok(self.method_header_of(method)?.literal_count)
    }

    pub fn method_argument_count(&self, method: Oop) -> MemoryResult<u8> {
        let header = self.method_header_of(method)?;
        match header.flags {
            MethodFlags::HeaderExtension => {
                let extension = self.method_extension(method, &header)?;
                Ok(((extension >> EXTENSION_ARGS_SHIFT) & EXTENSION_ARGS_MASK) as u8)
            }
            MethodFlags::ZeroArgPrimitiveReturnSelf | MethodFlags::ZeroArgPrimitiveReturnVar => {
                Ok(0)
            }
            flags => Ok(flags.bits() as u8),
        }
    }

    /// The primitive number, or 0 when the method has none.
    pub fn method_primitive_index(&self, method: Oop) -> MemoryResult<u8> {
        let header = self.method_header_of(method)?;
        match header.flags {
            MethodFlags::HeaderExtension => {
                let extension = self.method_extension(method, &header)?;
                Ok((extension & EXTENSION_PRIMITIVE_MASK) as u8)
            }
            _ => Ok(0),
        }
    }

    pub fn method_literal(&self, method: Oop, index: u8) -> MemoryResult<Oop> {
        let header = self.method_header_of(method)?;
        if index >= header.literal_count {
            return Err(MemoryError::IndexOutOfRange {
                index: u16::from(index),
                limit: u16::from(header.literal_count),
            });
        }
        Ok(Oop::from_raw(self.method_word(1 + u16::from(index), method)?))
    }

    /// The bytecode portion of the method body.
    pub fn method_bytecodes(&self, method: Oop) -> MemoryResult<&[u8]> {
        let header = self.method_header_of(method)?;
        if matches!(
            header.flags,
            MethodFlags::ZeroArgPrimitiveReturnSelf | MethodFlags::ZeroArgPrimitiveReturnVar
        ) {
            return Ok(&[]);
        }
        let data = self.entry_of(method)?;
        let start = (2 * (1 + u32::from(header.literal_count))).min(data.len);
        Ok(self
            .space
            .slice(data.pos + OBJECT_HEADER_BYTES + start, data.len - start))
    }
}
