//! Disassembler for SSEM store images.
//!
//! Renders a store either as a human-readable listing or as binary-notation
//! program text that loads back to the same image.

use crate::cpu::Memory;
use crate::cpu::decode::decode;
use crate::word::{format_raw, Address, Word};

/// Disassemble a single word to text.
pub fn disassemble_word(word: Word) -> String {
    decode(word).to_string()
}

/// One listing row: `NNNN:<raw bits> | [<instruction> ; <value>]`.
pub fn listing_line(addr: Address, word: Word) -> String {
    format!("{:04}:{} | [{} ; {}]", addr.value(), format_raw(word), decode(word), word)
}

/// Full listing of a store, one row per line.
pub fn listing(mem: &Memory) -> String {
    let mut output = String::new();

    for (addr, word) in mem.iter() {
        output.push_str(&listing_line(addr, word));
        output.push('\n');
    }

    output
}

/// Program text for a store image in binary notation.
///
/// Zero lines are left out since the loader zero-fills.
pub fn export_binary(mem: &Memory) -> String {
    mem.iter()
        .filter(|(_, word)| *word != 0)
        .map(|(addr, word)| format!("{:04}:{}\n", addr.value(), format_raw(word)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::load_program;

    #[test]
    fn test_disassemble_word() {
        assert_eq!(disassemble_word(7 << 13), "STP");
        assert_eq!(disassemble_word((2 << 13) | 21), "LDN 21");
        assert_eq!(disassemble_word(-1), "STP");
    }

    #[test]
    fn test_listing_line() {
        let line = listing_line(Address::new(1).unwrap(), 16793627);
        assert_eq!(line, "0001:11011000000000100000000010000000 | [LDN 27 ; 16793627]");
    }

    #[test]
    fn test_listing_has_every_line() {
        let listing = listing(&Memory::new());
        assert_eq!(listing.lines().count(), 32);
        assert!(listing.starts_with("0000:00000000000000000000000000000000 | [JMP 0 ; 0]"));
    }

    #[test]
    fn test_export_loads_back() {
        let source = "0000 LDN 20\n0001 CMP\n0002 STP\n0020 NUM -12345\n0031:01010101010101010101010101010101\n";
        let mem = load_program(source).unwrap();

        let exported = export_binary(&mem);

        assert_eq!(exported.lines().count(), 5);
        assert_eq!(load_program(&exported).unwrap(), mem);
    }
}
