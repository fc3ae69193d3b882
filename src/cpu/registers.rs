//! SSEM registers.
//!
//! The Baby had three registers on their own CRTs:
//! - CI: the control instruction (program counter)
//! - PI: the present instruction (held only during a cycle, not modelled)
//! - A: the accumulator

use serde::{Serialize, Deserialize};
use crate::word::Word;

/// Value of CI after construction.
///
/// CI is incremented before every fetch, so the first instruction
/// executed comes from line 0.
pub const INITIAL_CI: i64 = -1;

/// Value of CI after a reset. A reset machine fetches line 1 first.
pub const RESET_CI: i64 = 0;

/// The SSEM register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// CI: address of the most recently fetched instruction.
    ///
    /// Kept wider than a store address so that jumps outside the store
    /// can be detected on the next fetch instead of wrapping.
    pub ci: i64,

    /// A: the accumulator. Arithmetic wraps at 32 bits.
    pub acc: Word,
}

impl Registers {
    /// Create a register file for a freshly loaded program.
    pub fn new() -> Self {
        Self {
            ci: INITIAL_CI,
            acc: 0,
        }
    }

    /// Clear both registers.
    pub fn reset(&mut self) {
        self.ci = RESET_CI;
        self.acc = 0;
    }

    /// The CI value the next fetch will use.
    #[inline]
    pub fn next_ci(&self) -> i64 {
        self.ci + 1
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
