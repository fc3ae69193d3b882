//! CPU emulation for the SSEM.
//!
//! This module implements the Manchester Baby (1948) architecture:
//! - 32 thirty-two-bit store lines
//! - 2 architectural registers: CI (control instruction) and A (accumulator)
//! - 7 operations in a 3-bit function field, single-address format

pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;

pub use memory::{Memory, MEMORY_SIZE};
pub use registers::Registers;
pub use decode::{Instruction, Opcode, decode, encode};
pub use execute::{Cpu, CpuError, CpuState, Executed};
