//! Store line addresses.

use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use super::Word;

/// A store line number in the range 0-31.
///
/// Every way of building an `Address` checks the range, so code holding one
/// can index the store without further checks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Address(u8);

impl Address {
    /// Number of addressable lines.
    pub const COUNT: usize = 32;

    /// Highest valid address.
    pub const MAX: u8 = 31;

    /// Line 0.
    pub const ZERO: Self = Self(0);

    /// Mask selecting the address field of an instruction word (bits 0-4).
    pub const FIELD_MASK: Word = 0b1_1111;

    /// Create an address, returning `None` if it is out of range.
    #[inline]
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Extract the 5-bit address field of an instruction word.
    ///
    /// Every 5-bit value is a valid address, so this cannot fail.
    #[inline]
    pub const fn from_field(word: Word) -> Self {
        Self((word & Self::FIELD_MASK) as u8)
    }

    /// The address as a store index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The address as a plain number.
    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Iterate over every address in ascending order.
    pub fn all() -> impl Iterator<Item = Address> {
        (0..=Self::MAX).map(Address)
    }
}

impl TryFrom<i64> for Address {
    type Error = AddressOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(AddressOutOfRange(value))
    }
}

impl TryFrom<i32> for Address {
    type Error = AddressOutOfRange;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}

impl TryFrom<u32> for Address {
    type Error = AddressOutOfRange;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}

impl TryFrom<u8> for Address {
    type Error = AddressOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(AddressOutOfRange(i64::from(value)))
    }
}

impl From<Address> for u8 {
    fn from(addr: Address) -> u8 {
        addr.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// A value that does not name a store line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("address {0} out of range (0-31)")]
pub struct AddressOutOfRange(pub i64);
