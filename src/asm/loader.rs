//! Program loader.
//!
//! Builds a complete store image from program text. Loading is
//! all-or-nothing: the first bad line aborts the load and no partial image
//! is returned.

use std::path::{Path, PathBuf};
use crate::asm::parser::{parse_line, ParseError};
use crate::cpu::Memory;
use thiserror::Error;
use tracing::debug;

/// Load a program from source text.
///
/// Lines are split on `\n` alone; a `\r` stays part of its line. Empty
/// lines are skipped. Lines that write the same address twice are
/// allowed and the later one wins. Lines never written stay zero.
pub fn load_program(source: &str) -> Result<Memory, LoadError> {
    load_lines(source.split('\n'))
}

/// Load a program from individual lines.
pub fn load_lines<I, S>(lines: I) -> Result<Memory, LoadError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut mem = Memory::new();
    let mut written = 0usize;

    for (index, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        if line.is_empty() {
            continue;
        }

        let (address, word) = parse_line(line).map_err(|kind| LoadError {
            line: index + 1,
            kind,
        })?;
        mem.write(address, word);
        written += 1;
    }

    debug!(lines = written, "program loaded");
    Ok(mem)
}

/// Read and load a program file.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Memory, ProgramFileError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| ProgramFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(load_program(&source)?)
}

/// A program line that failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("error on line {line}: {kind}")]
pub struct LoadError {
    /// 1-based line number.
    pub line: usize,
    /// What was wrong with it.
    #[source]
    pub kind: ParseError,
}

/// Errors from [`load_file`].
#[derive(Debug, Error)]
pub enum ProgramFileError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Load(#[from] LoadError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::{decode, Cpu, Instruction};
    use crate::word::Address;

    fn addr(value: u8) -> Address {
        Address::new(value).unwrap()
    }

    // 10 - 3, stored at line 22. Line 0 holds 0, a jump to line 1, so the
    // program also runs after a reset.
    const SUBTRACT: &str = include_str!("../../programs/subtract.ssem");

    // Counts line 20 down from 3 until it goes negative. The decrement at
    // line 21 is written in binary notation.
    const COUNTDOWN: &str = include_str!("../../programs/countdown.ssem");

    #[test]
    fn test_load_mixed_notations() {
        let mem = load_program("0001 STP\n0002:10000000000000000000000000000000\n").unwrap();

        assert_eq!(decode(mem.read(addr(1))), Instruction::Stp);
        assert_eq!(mem.read(addr(2)), 1);
        assert_eq!(mem.read(addr(0)), 0);
    }

    #[test]
    fn test_blank_lines_are_skipped_but_counted() {
        let err = load_program("0001 STP\n\n\n0002 FOO 1\n").unwrap_err();

        assert_eq!(err, LoadError { line: 4, kind: ParseError::BadInstruction });
        assert_eq!(err.to_string(), "error on line 4: unknown instruction");
    }

    #[test]
    fn test_first_error_aborts_load() {
        let result = load_lines(["0001 STP", "0002 JMP", "0003 STO 99", "0004 STP"]);

        assert_eq!(result, Err(LoadError { line: 2, kind: ParseError::MissingOperand }));
    }

    #[test]
    fn test_later_definition_wins() {
        let mem = load_lines(["0005 NUM 1", "0005 NUM 2"]).unwrap();
        assert_eq!(mem.read(addr(5)), 2);
    }

    #[test]
    fn test_whitespace_only_line_is_not_blank() {
        let result = load_program("0001 STP\n \n");
        assert_eq!(result, Err(LoadError { line: 2, kind: ParseError::BadAddress }));
    }

    #[test]
    fn test_carriage_return_is_not_stripped() {
        // "STP\r" is not a known mnemonic, so it is asked for an operand.
        let result = load_program("0001 STP\r\n0002 NUM 3\r\n");
        assert_eq!(result, Err(LoadError { line: 1, kind: ParseError::MissingOperand }));

        let result = load_program("0001 NUM 3\n0002 LDN 3\r\n");
        assert_eq!(result, Err(LoadError { line: 2, kind: ParseError::BadOperand }));
    }

    #[test]
    fn test_trailing_newline_is_not_a_line() {
        let mem = load_program("0001 STP\n").unwrap();
        assert_eq!(decode(mem.read(addr(1))), Instruction::Stp);
    }

    #[test]
    fn test_empty_program_is_all_zero() {
        assert_eq!(load_program("").unwrap(), Memory::new());
    }

    #[test]
    fn test_run_subtract_program() {
        let mut cpu = Cpu::new(load_program(SUBTRACT).unwrap());

        let executed = cpu.run().unwrap();

        assert_eq!(executed, 7);
        assert_eq!(cpu.acc(), 7);
        assert_eq!(cpu.mem().read(addr(22)), 7);
    }

    #[test]
    fn test_subtract_program_reruns_after_reset() {
        let mut cpu = Cpu::new(load_program(SUBTRACT).unwrap());
        cpu.run().unwrap();

        cpu.reset();

        assert_eq!(cpu.run().unwrap(), 6);
        assert_eq!(cpu.acc(), 7);
    }

    #[test]
    fn test_run_countdown_program() {
        let mut cpu = Cpu::new(load_program(COUNTDOWN).unwrap());

        let executed = cpu.run_limited(1_000).unwrap();

        assert!(cpu.is_halted());
        assert_eq!(executed, 29);
        assert_eq!(cpu.mem().read(addr(20)), -1);
        assert_eq!(cpu.mem().read(addr(21)), 1);
        assert_eq!(cpu.acc(), -1);
        assert_eq!(cpu.ci(), 8);
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir().join(format!("ssem-load-{}.ssem", std::process::id()));
        std::fs::write(&path, SUBTRACT).unwrap();

        let mem = load_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(mem, load_program(SUBTRACT).unwrap());
    }

    #[test]
    fn test_load_file_errors() {
        let missing = std::env::temp_dir().join("ssem-no-such-program.ssem");
        assert!(matches!(load_file(&missing), Err(ProgramFileError::Io { .. })));

        let path = std::env::temp_dir().join(format!("ssem-bad-{}.ssem", std::process::id()));
        std::fs::write(&path, "0001 STP 4\n").unwrap();
        let result = load_file(&path);
        std::fs::remove_file(&path).unwrap();

        match result {
            Err(ProgramFileError::Load(err)) => assert_eq!(err.kind, ParseError::ExtraOperand),
            other => panic!("expected a load error, got {:?}", other),
        }
    }
}
