//! Program text handling for the SSEM.
//!
//! This module provides:
//! - A line parser for assembly and binary notation
//! - A loader that turns program text into a store image
//! - A disassembler (store image → listing or binary program text)

pub mod parser;
pub mod loader;
pub mod disasm;

pub use parser::{parse_line, ParseError};
pub use loader::{load_program, load_lines, load_file, LoadError, ProgramFileError};
pub use disasm::{disassemble_word, listing, export_binary};
