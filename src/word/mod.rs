//! Word-level primitives of the SSEM.
//!
//! This module provides:
//! - [`Word`] - one 32-bit store line, read as data or as an instruction
//! - [`Address`] - a validated store line number (0-31)
//! - the raw (bit-reversed) view used by the CRT-style display

mod address;

pub use address::{Address, AddressOutOfRange};

/// A single 32-bit store line.
///
/// No type tag is kept: whether a word is data or an instruction is decided
/// each time it is fetched.
pub type Word = i32;

/// Number of bits in a word.
pub const WORD_BITS: usize = 32;

/// Bit-reversed unsigned view of a word.
///
/// The Baby's display tube showed each line least significant bit first,
/// so the leftmost dot on a row is bit 0.
#[inline]
pub const fn raw_word(word: Word) -> u32 {
    (word as u32).reverse_bits()
}

/// Inverse of [`raw_word`].
#[inline]
pub const fn from_raw(raw: u32) -> Word {
    raw.reverse_bits() as Word
}

/// Render a word as the 32 characters of its raw view.
///
/// This is the same notation the binary program format uses, so the
/// output of this function can be loaded back verbatim.
pub fn format_raw(word: Word) -> String {
    format!("{:032b}", raw_word(word))
}
