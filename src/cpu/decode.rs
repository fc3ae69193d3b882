//! Instruction decoder for the SSEM.
//!
//! An instruction occupies a single 32-bit word:
//! - Bits 0-4: store line operand (5 bits, 0-31)
//! - Bits 13-15: function number (3 bits)
//!
//! All other bits are ignored when decoding and written as zero when encoding.

use std::fmt;
use serde::{Serialize, Deserialize};
use crate::word::{Address, Word};

/// Bit position of the function number.
pub const OPCODE_SHIFT: u32 = 13;

/// Mask for the function number once shifted down.
pub const OPCODE_MASK: u32 = 0b111;

/// The seven operations of the Baby.
///
/// There are eight function numbers: 4 and 5 both mean subtract.
/// Decoding folds them together and encoding always emits 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// Indirect jump: CI := S
    Jmp,
    /// Relative jump: CI := CI + S
    Jrp,
    /// Load negative: A := -S
    Ldn,
    /// Store: S := A
    Sto,
    /// Subtract: A := A - S
    Sub,
    /// Skip next instruction if A < 0
    Cmp,
    /// Stop
    Stp,
}

impl Opcode {
    /// Every operation, in function number order.
    pub const ALL: [Opcode; 7] = [
        Opcode::Jmp,
        Opcode::Jrp,
        Opcode::Ldn,
        Opcode::Sto,
        Opcode::Sub,
        Opcode::Cmp,
        Opcode::Stp,
    ];

    /// Decode a 3-bit function number. Only the low three bits are used.
    pub const fn from_bits(bits: u32) -> Self {
        match bits & OPCODE_MASK {
            0 => Opcode::Jmp,
            1 => Opcode::Jrp,
            2 => Opcode::Ldn,
            3 => Opcode::Sto,
            4 | 5 => Opcode::Sub,
            6 => Opcode::Cmp,
            _ => Opcode::Stp,
        }
    }

    /// Canonical function number.
    pub const fn bits(self) -> u32 {
        match self {
            Opcode::Jmp => 0,
            Opcode::Jrp => 1,
            Opcode::Ldn => 2,
            Opcode::Sto => 3,
            Opcode::Sub => 4,
            Opcode::Cmp => 6,
            Opcode::Stp => 7,
        }
    }

    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Jmp => "JMP",
            Opcode::Jrp => "JRP",
            Opcode::Ldn => "LDN",
            Opcode::Sto => "STO",
            Opcode::Sub => "SUB",
            Opcode::Cmp => "CMP",
            Opcode::Stp => "STP",
        }
    }

    /// Look up a mnemonic. Matching is case-sensitive.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.mnemonic() == mnemonic)
    }

    /// Whether the operation uses its store line operand.
    pub const fn takes_operand(self) -> bool {
        !matches!(self, Opcode::Cmp | Opcode::Stp)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Decoded SSEM instruction.
///
/// `Cmp` and `Stp` carry no operand at all, so an operand on them cannot
/// be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instruction {
    /// CI := [addr]
    Jmp { addr: Address },
    /// CI := CI + [addr]
    Jrp { addr: Address },
    /// A := -[addr]
    Ldn { addr: Address },
    /// [addr] := A
    Sto { addr: Address },
    /// A := A - [addr]
    Sub { addr: Address },
    /// if A < 0 then CI := CI + 1
    Cmp,
    /// Halt
    Stp,
}

impl Instruction {
    /// Build an instruction from an operation and operand.
    ///
    /// The operand is dropped for `Cmp` and `Stp`.
    pub const fn new(opcode: Opcode, addr: Address) -> Self {
        match opcode {
            Opcode::Jmp => Instruction::Jmp { addr },
            Opcode::Jrp => Instruction::Jrp { addr },
            Opcode::Ldn => Instruction::Ldn { addr },
            Opcode::Sto => Instruction::Sto { addr },
            Opcode::Sub => Instruction::Sub { addr },
            Opcode::Cmp => Instruction::Cmp,
            Opcode::Stp => Instruction::Stp,
        }
    }

    /// The operation of this instruction.
    pub const fn opcode(&self) -> Opcode {
        match self {
            Instruction::Jmp { .. } => Opcode::Jmp,
            Instruction::Jrp { .. } => Opcode::Jrp,
            Instruction::Ldn { .. } => Opcode::Ldn,
            Instruction::Sto { .. } => Opcode::Sto,
            Instruction::Sub { .. } => Opcode::Sub,
            Instruction::Cmp => Opcode::Cmp,
            Instruction::Stp => Opcode::Stp,
        }
    }

    /// The store line operand, if the instruction has one.
    pub const fn operand(&self) -> Option<Address> {
        match *self {
            Instruction::Jmp { addr }
            | Instruction::Jrp { addr }
            | Instruction::Ldn { addr }
            | Instruction::Sto { addr }
            | Instruction::Sub { addr } => Some(addr),
            Instruction::Cmp | Instruction::Stp => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand() {
            Some(addr) => write!(f, "{} {}", self.opcode(), addr),
            None => write!(f, "{}", self.opcode()),
        }
    }
}

/// Decode a store word as an instruction.
///
/// Every word decodes to something: the Baby had no illegal instructions.
pub fn decode(word: Word) -> Instruction {
    let opcode = Opcode::from_bits((word as u32) >> OPCODE_SHIFT);
    Instruction::new(opcode, Address::from_field(word))
}

/// Encode an instruction as a store word.
pub fn encode(instr: &Instruction) -> Word {
    let operand = instr.operand().map_or(0, |addr| addr.value() as u32);
    ((instr.opcode().bits() << OPCODE_SHIFT) | operand) as Word
}
