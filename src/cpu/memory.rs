//! SSEM store.
//!
//! The Baby's main store was a single Williams-Kilburn tube holding
//! 32 lines of 32 bits.

use crate::word::{self, Address, Word};
use serde::{Serialize, Deserialize};

/// The number of store lines.
pub const MEMORY_SIZE: usize = Address::COUNT;

/// SSEM store: 32 signed 32-bit words.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Memory {
    words: [Word; MEMORY_SIZE],
}

impl Memory {
    /// Create a store with all lines zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from a complete image.
    pub const fn from_words(words: [Word; MEMORY_SIZE]) -> Self {
        Self { words }
    }

    /// Read a line.
    #[inline]
    pub fn read(&self, addr: Address) -> Word {
        self.words[addr.index()]
    }

    /// Write a line.
    #[inline]
    pub fn write(&mut self, addr: Address, value: Word) {
        self.words[addr.index()] = value;
    }

    /// Read a line in its bit-reversed display form.
    #[inline]
    pub fn raw_word(&self, addr: Address) -> u32 {
        word::raw_word(self.read(addr))
    }

    /// The whole image, indexed by address.
    pub fn words(&self) -> &[Word; MEMORY_SIZE] {
        &self.words
    }

    /// Iterate over `(address, word)` pairs in address order.
    pub fn iter(&self) -> impl Iterator<Item = (Address, Word)> + '_ {
        Address::all().map(move |addr| (addr, self.read(addr)))
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only show non-zero lines
        let non_zero: Vec<_> = self.iter().filter(|(_, w)| *w != 0).collect();

        f.debug_struct("Memory")
            .field("non_zero_lines", &non_zero)
            .field("total_lines", &MEMORY_SIZE)
            .finish()
    }
}
