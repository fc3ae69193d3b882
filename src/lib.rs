//! # SSEM Emulator
//!
//! An emulator of the Manchester Small-Scale Experimental Machine (1948),
//! better known as the Manchester Baby.
//!
//! The Baby was the first electronic stored-program computer to run a
//! program. This emulator reproduces its 32-line store, its accumulator and
//! control registers, and the exact bit layout of its seven instructions.

pub mod word;
pub mod cpu;
pub mod asm;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use word::{Address, AddressOutOfRange, Word};
pub use cpu::{Cpu, CpuState, CpuError, Executed, Memory, Registers, Instruction, Opcode};
pub use asm::{load_program, load_lines, load_file, LoadError, ParseError, ProgramFileError};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
