//! Oops fixed by the image format.
//!
//! The interpreter addresses these objects by name. The loader neither
//! creates nor verifies them; it loads whatever the image assigns to
//! the corresponding table slots.

use crate::Oop;

// ── small integers ─────────────────────────────────────────────────

pub const MINUS_ONE: Oop = Oop::from_raw(0xFFFF);
pub const ZERO: Oop = Oop::from_raw(0x01);
pub const ONE: Oop = Oop::from_raw(0x03);
pub const TWO: Oop = Oop::from_raw(0x05);

// ── undefined, boolean ─────────────────────────────────────────────

pub const NIL: Oop = Oop::from_raw(0x02);
pub const FALSE: Oop = Oop::from_raw(0x04);
pub const TRUE: Oop = Oop::from_raw(0x06);

// ── roots ──────────────────────────────────────────────────────────

/// An Association whose value field is the Processor scheduler.
pub const PROCESSOR: Oop = Oop::from_raw(0x08);
/// An Association whose value field is the SystemDictionary.
pub const SMALLTALK: Oop = Oop::from_raw(0x12);

// ── classes ────────────────────────────────────────────────────────

pub const CLASS_SMALL_INTEGER: Oop = Oop::from_raw(0x0C);
pub const CLASS_STRING: Oop = Oop::from_raw(0x0E);
pub const CLASS_ARRAY: Oop = Oop::from_raw(0x10);
pub const CLASS_FLOAT: Oop = Oop::from_raw(0x14);
pub const CLASS_METHOD_CONTEXT: Oop = Oop::from_raw(0x16);
pub const CLASS_BLOCK_CONTEXT: Oop = Oop::from_raw(0x18);
pub const CLASS_POINT: Oop = Oop::from_raw(0x1A);
pub const CLASS_LARGE_POSITIVE_INTEGER: Oop = Oop::from_raw(0x1C);
pub const CLASS_DISPLAY_BITMAP: Oop = Oop::from_raw(0x1E);
pub const CLASS_MESSAGE: Oop = Oop::from_raw(0x20);
pub const CLASS_COMPILED_METHOD: Oop = Oop::from_raw(0x22);
pub const CLASS_SEMAPHORE: Oop = Oop::from_raw(0x26);
pub const CLASS_CHARACTER: Oop = Oop::from_raw(0x28);
pub const CLASS_SYMBOL: Oop = Oop::from_raw(0x38);

// ── symbols ────────────────────────────────────────────────────────

/// The Symbol class variable USTable.
pub const SYMBOL_TABLE: Oop = Oop::from_raw(0x0A);
pub const SYMBOL_DOES_NOT_UNDERSTAND: Oop = Oop::from_raw(0x2A);
pub const SYMBOL_CANNOT_RETURN: Oop = Oop::from_raw(0x2C);
pub const SYMBOL_MONITOR: Oop = Oop::from_raw(0x2E);
pub const SYMBOL_UNUSED_OOP18: Oop = Oop::from_raw(0x24);
pub const SYMBOL_MUST_BE_BOOLEAN: Oop = Oop::from_raw(0x34);

// ── selector and character tables ──────────────────────────────────

/// SystemDictionary class variable: the array of selectors behind the
/// send-special bytecodes.
pub const SPECIAL_SELECTORS: Oop = Oop::from_raw(0x30);
/// Character class variable: the table of character instances.
pub const CHARACTER_TABLE: Oop = Oop::from_raw(0x32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_integer_constants_carry_the_integer_tag() {
        assert_eq!(MINUS_ONE.as_small_int(), Some(-1));
        assert_eq!(ZERO.as_small_int(), Some(0));
        assert_eq!(ONE.as_small_int(), Some(1));
        assert_eq!(TWO.as_small_int(), Some(2));
    }

    #[test]
    fn object_constants_are_references() {
        let knowns = [
            NIL,
            FALSE,
            TRUE,
            PROCESSOR,
            SMALLTALK,
            CLASS_SMALL_INTEGER,
            CLASS_COMPILED_METHOD,
            CLASS_POINT,
            SYMBOL_TABLE,
            SPECIAL_SELECTORS,
            CHARACTER_TABLE,
            CLASS_SYMBOL,
        ];
        for oop in knowns {
            assert!(oop.is_pointer(), "{oop:?} must be a reference");
        }
    }
}
