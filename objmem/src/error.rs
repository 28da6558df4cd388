use std::fmt;

use crate::Oop;

/// Convenience alias for fallible object-memory operations.
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Everything the object memory can refuse to do.
///
/// All failures surface synchronously to the immediate caller; there is
/// no retry or recovery logic in this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// The oop is zero, a small integer where a reference is required,
    /// out of table range, or names a free entry.
    InvalidOop { oop: Oop },
    /// A field, word, byte or literal index beyond the object's length.
    IndexOutOfRange { index: u16, limit: u16 },
    /// Pointer access on a word/byte object, or vice versa.
    TypeMismatch { oop: Oop, expected: &'static str },
    /// Table or space growth would exceed its budget.
    OutOfMemory { reason: &'static str },
    /// The image stream is truncated or internally inconsistent.
    MalformedImage { reason: &'static str },
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidOop { oop } => {
                write!(f, "invalid oop {oop:?}")
            }
            Self::IndexOutOfRange { index, limit } => {
                write!(f, "index {index} is out of range (limit {limit})")
            }
            Self::TypeMismatch { oop, expected } => {
                write!(f, "{oop:?} is not {expected}")
            }
            Self::OutOfMemory { reason } => {
                write!(f, "out of memory: {reason}")
            }
            Self::MalformedImage { reason } => {
                write!(f, "malformed image: {reason}")
            }
        }
    }
}

impl std::error::Error for MemoryError {}
