//! Line parser for SSEM program text.
//!
//! Two line notations are accepted:
//! ```text
//! 0010 JMP 22
//! 0003 CMP
//! 0023 NUM 10
//! 0001:11011000000000100000000010000000
//! ```
//! Assembly lines are `ADDRESS MNEMONIC [OPERAND]`; binary lines are
//! `ADDRESS:BITS` with the least significant bit first.
//! A line containing `:` is binary notation, anything else is assembly.
//! Fields are split on the literal separators only; nothing is trimmed.

use crate::cpu::decode::{encode, Instruction, Opcode};
use crate::word::{self, Address, Word, WORD_BITS};
use thiserror::Error;

/// Pseudo-mnemonic that stores its operand as a raw word.
pub const NUM_MNEMONIC: &str = "NUM";

/// Parse one non-blank line in either notation.
pub fn parse_line(line: &str) -> Result<(Address, Word), ParseError> {
    if line.contains(':') {
        parse_binary_line(line)
    } else {
        parse_assembly_line(line)
    }
}

/// Parse `ADDRESS MNEMONIC [OPERAND]`.
///
/// `CMP` and `STP` take no operand. Every other mnemonic takes exactly one,
/// which must name a store line. `NUM` takes any 32-bit decimal value and
/// stores it verbatim; for 0-31 that is the same word as `JMP` would give.
pub fn parse_assembly_line(line: &str) -> Result<(Address, Word), ParseError> {
    let mut fields = line.splitn(3, ' ');
    let address = parse_address(fields.next().unwrap_or_default())?;
    let mnemonic = fields.next().ok_or(ParseError::BadEntry)?;
    let operand = fields.next();

    let opcode = Opcode::from_mnemonic(mnemonic);
    if let Some(opcode) = opcode.filter(|op| !op.takes_operand()) {
        if operand.is_some() {
            return Err(ParseError::ExtraOperand);
        }
        return Ok((address, encode(&Instruction::new(opcode, Address::ZERO))));
    }

    let operand = operand.ok_or(ParseError::MissingOperand)?;
    let value: i32 = operand.parse().map_err(|_| ParseError::BadOperand)?;

    if mnemonic == NUM_MNEMONIC {
        return Ok((address, value));
    }

    let opcode = opcode.ok_or(ParseError::BadInstruction)?;
    let operand = Address::try_from(value).map_err(|_| ParseError::BadOperand)?;

    Ok((address, encode(&Instruction::new(opcode, operand))))
}

/// Parse `ADDRESS:BITS`, where `BITS` is exactly 32 binary digits with the
/// least significant bit first.
pub fn parse_binary_line(line: &str) -> Result<(Address, Word), ParseError> {
    let (address, bits) = line.split_once(':').ok_or(ParseError::BadEntry)?;
    let address = parse_address(address)?;

    if bits.len() != WORD_BITS || !bits.bytes().all(|b| b == b'0' || b == b'1') {
        return Err(ParseError::BadMemory);
    }
    let raw = u32::from_str_radix(bits, 2).map_err(|_| ParseError::BadMemory)?;

    Ok((address, word::from_raw(raw)))
}

/// Parse a decimal store line number. Only ASCII digits are accepted.
fn parse_address(token: &str) -> Result<Address, ParseError> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::BadAddress);
    }
    let value: u32 = token.parse().map_err(|_| ParseError::BadAddress)?;
    Address::try_from(value).map_err(|_| ParseError::BadAddress)
}

/// Ways a program line can be malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("bad address: expected a line number from 0 to 31")]
    BadAddress,

    #[error("bad entry: not an assembly or binary line")]
    BadEntry,

    #[error("missing operand")]
    MissingOperand,

    #[error("unexpected operand")]
    ExtraOperand,

    #[error("bad operand: expected a line number from 0 to 31")]
    BadOperand,

    #[error("unknown instruction")]
    BadInstruction,

    #[error("bad binary word: expected 32 binary digits")]
    BadMemory,
}
