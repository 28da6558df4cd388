//! Object memory of a 16-bit Smalltalk-80 style system.
//!
//! Objects are named by tagged 16-bit oops: odd values are immediate
//! small integers, even values index the object table, which maps
//! each object to its body in one contiguous object space. The
//! `ObjectMemory` struct owns both and exposes field access, method
//! decoding, instance allocation and image loading. Well-known oops
//! fixed by the image format live in the `known` module.

mod allocator;
mod class;
mod error;
mod image;
pub mod known;
mod memory;
mod method;
mod oop;
mod shared;
mod space;
mod table;

pub use class::{
    ASSOCIATION_VALUE_INDEX, CLASS_INSTANCE_SPEC_INDEX, CLASS_MESSAGE_DICT_INDEX,
    CLASS_NAME_INDEX, CLASS_SUPERCLASS_INDEX, InstanceSpec,
};
pub use error::{MemoryError, MemoryResult};
pub use memory::ObjectMemory;
pub use method::{MethodFlags, MethodHeader};
pub use oop::{Oop, OopKind, TableIndex};
pub use shared::SharedObjectMemory;
