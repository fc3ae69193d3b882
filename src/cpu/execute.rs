//! CPU execution engine for the SSEM.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use std::fmt;
use crate::word::Address;
use crate::cpu::{Memory, Registers};
use crate::cpu::decode::{self, Instruction};
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has halted (executed STP).
    Halted,
    /// CPU tried to fetch from outside the store.
    Faulted,
}

/// Record of one executed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Executed {
    /// Line the instruction was fetched from.
    pub address: Address,
    /// The decoded instruction.
    pub instruction: Instruction,
}

impl fmt::Display for Executed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}: {}", self.address.value(), self.instruction)
    }
}

/// The SSEM CPU.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cpu {
    regs: Registers,
    mem: Memory,
    state: CpuState,
    /// Instruction count since the last reset.
    cycles: u64,
    /// Last executed instruction (for debugging).
    last_executed: Option<Executed>,
}

impl Cpu {
    /// Create a CPU ready to run the given store image.
    pub fn new(mem: Memory) -> Self {
        Self {
            regs: Registers::new(),
            mem,
            state: CpuState::Running,
            cycles: 0,
            last_executed: None,
        }
    }

    /// Reset registers and state. The store is left untouched.
    ///
    /// CI is cleared to 0, so the next fetch is line 1.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.last_executed = None;
        debug!("cpu reset");
    }

    /// Replace the whole store, then reset.
    pub fn reboot(&mut self, mem: Memory) {
        self.mem = mem;
        self.reset();
    }

    /// Execute a single instruction.
    ///
    /// CI is incremented before the fetch. If the incremented value is not a
    /// store address the CPU faults and nothing else changes.
    pub fn step(&mut self) -> Result<Executed, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        // Fetch
        let ci = self.regs.next_ci();
        let address = match Address::try_from(ci) {
            Ok(address) => address,
            Err(_) => {
                warn!(ci, cycles = self.cycles, "program counter left the store");
                self.state = CpuState::Faulted;
                return Err(CpuError::RunawayProgramCounter(ci));
            }
        };
        self.regs.ci = ci;

        // Decode
        let instruction = decode::decode(self.mem.read(address));

        // Execute
        self.execute(instruction);

        let executed = Executed { address, instruction };
        self.cycles += 1;
        self.last_executed = Some(executed);
        trace!(%executed, ci = self.regs.ci, acc = self.regs.acc, "step");

        if self.state == CpuState::Halted {
            info!(cycles = self.cycles, acc = self.regs.acc, "halted");
        }

        Ok(executed)
    }

    /// Run until halt or fault.
    ///
    /// Returns the number of instructions executed. A program that never
    /// stops makes this loop forever; use [`Cpu::run_limited`] to bound it.
    pub fn run(&mut self) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while self.state == CpuState::Running {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<u64, CpuError> {
        self.run_limited_with(max_cycles, |_, _| {})
    }

    /// Run for at most `max_cycles` instructions, calling `observer` after
    /// each one with the CPU state it left behind.
    pub fn run_limited_with<F>(&mut self, max_cycles: u64, mut observer: F) -> Result<u64, CpuError>
    where
        F: FnMut(&Cpu, &Executed),
    {
        let start_cycles = self.cycles;
        let limit = self.cycles.saturating_add(max_cycles);

        while self.state == CpuState::Running && self.cycles < limit {
            let executed = self.step()?;
            observer(self, &executed);
        }

        Ok(self.cycles - start_cycles)
    }

    /// Execute a decoded instruction.
    fn execute(&mut self, instr: Instruction) {
        match instr {
            Instruction::Jmp { addr } => {
                // Indirect: the operand line holds the new CI, and the
                // next fetch comes from the line after it.
                self.regs.ci = i64::from(self.mem.read(addr));
            }

            Instruction::Jrp { addr } => {
                self.regs.ci += i64::from(self.mem.read(addr));
            }

            Instruction::Ldn { addr } => {
                self.regs.acc = self.mem.read(addr).wrapping_neg();
            }

            Instruction::Sto { addr } => {
                self.mem.write(addr, self.regs.acc);
            }

            Instruction::Sub { addr } => {
                self.regs.acc = self.regs.acc.wrapping_sub(self.mem.read(addr));
            }

            Instruction::Cmp => {
                if self.regs.acc < 0 {
                    self.regs.ci += 1;
                }
            }

            Instruction::Stp => {
                self.state = CpuState::Halted;
            }
        }
    }

    /// The register file.
    pub fn regs(&self) -> &Registers {
        &self.regs
    }

    /// CI: address of the most recently fetched instruction.
    pub fn ci(&self) -> i64 {
        self.regs.ci
    }

    /// The accumulator.
    pub fn acc(&self) -> i32 {
        self.regs.acc
    }

    /// The store.
    pub fn mem(&self) -> &Memory {
        &self.mem
    }

    /// Current execution state.
    pub fn state(&self) -> CpuState {
        self.state
    }

    /// Instructions executed since the last reset.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Get the last executed instruction.
    pub fn last_executed(&self) -> Option<Executed> {
        self.last_executed
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new(Memory::new())
    }
}

impl fmt::Debug for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("program counter ran away to {0} (store is 0-31)")]
    RunawayProgramCounter(i64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::encode;
    use crate::word::Word;
    use proptest::prelude::*;

    fn addr(value: u8) -> Address {
        Address::new(value).unwrap()
    }

    /// Build a store with `program` at line 0 onwards and `data` at the
    /// given lines.
    fn make_memory(program: &[Instruction], data: &[(u8, Word)]) -> Memory {
        let mut mem = Memory::new();
        for (line, instr) in program.iter().enumerate() {
            mem.write(addr(line as u8), encode(instr));
        }
        for &(line, value) in data {
            mem.write(addr(line), value);
        }
        mem
    }

    #[test]
    fn test_cpu_halt() {
        let mut cpu = Cpu::new(make_memory(&[Instruction::Stp], &[]));

        let executed = cpu.run().unwrap();

        assert_eq!(executed, 1);
        assert!(cpu.is_halted());
        assert_eq!(cpu.ci(), 0);
    }

    #[test]
    fn test_step_after_halt_changes_nothing() {
        let mut cpu = Cpu::new(make_memory(&[Instruction::Stp], &[]));
        cpu.step().unwrap();
        let before = cpu.clone();

        assert_eq!(cpu.step(), Err(CpuError::NotRunning(CpuState::Halted)));
        assert_eq!(cpu, before);
    }

    #[test]
    fn test_indirect_jump_halts_after_two_steps() {
        // Line 0 jumps through line 3, which holds 0, so the next fetch is line 1.
        let mut cpu = Cpu::new(make_memory(
            &[
                Instruction::Jmp { addr: addr(3) },
                Instruction::Stp,
                Instruction::Jmp { addr: addr(5) },
            ],
            &[(3, 0)],
        ));

        let first = cpu.step().unwrap();
        assert_eq!(first.instruction, Instruction::Jmp { addr: addr(3) });
        assert_eq!(cpu.ci(), 0);

        let second = cpu.step().unwrap();
        assert_eq!(second.address, addr(1));
        assert!(cpu.is_halted());
        assert_eq!(cpu.cycles(), 2);
    }

    #[test]
    fn test_jump_uses_contents_not_operand() {
        // JMP 2 lands on the value stored at line 2 (encode(JMP 5) == 5).
        let mut cpu = Cpu::new(make_memory(
            &[Instruction::Jmp { addr: addr(2) }, Instruction::Stp, Instruction::Jmp { addr: addr(5) }],
            &[],
        ));

        cpu.step().unwrap();
        assert_eq!(cpu.ci(), 5);
        assert_eq!(cpu.step().unwrap().address, addr(6));
    }

    #[test]
    fn test_relative_jump_is_from_incremented_ci() {
        // JRP at line 0 with offset 1: CI becomes 0 + 1, so line 1 is skipped.
        let mut cpu = Cpu::new(make_memory(
            &[
                Instruction::Jrp { addr: addr(3) },
                Instruction::Sub { addr: addr(4) },
                Instruction::Stp,
            ],
            &[(3, 1), (4, 99)],
        ));

        cpu.step().unwrap();
        assert_eq!(cpu.ci(), 1);

        cpu.run().unwrap();
        assert_eq!(cpu.acc(), 0);
        assert_eq!(cpu.cycles(), 2);
    }

    #[test]
    fn test_relative_jump_backwards() {
        let mut cpu = Cpu::new(make_memory(
            &[Instruction::Stp, Instruction::Stp, Instruction::Jrp { addr: addr(10) }],
            &[(10, -2)],
        ));
        cpu.regs.ci = 1;

        cpu.step().unwrap();
        assert_eq!(cpu.ci(), 0);
        assert_eq!(cpu.step().unwrap().address, addr(1));
    }

    #[test]
    fn test_load_negative_subtract_store() {
        let mut cpu = Cpu::new(make_memory(
            &[
                Instruction::Ldn { addr: addr(20) },
                Instruction::Sub { addr: addr(21) },
                Instruction::Sto { addr: addr(22) },
                Instruction::Stp,
            ],
            &[(20, 10), (21, 3)],
        ));

        cpu.run().unwrap();

        assert_eq!(cpu.acc(), -13);
        assert_eq!(cpu.mem().read(addr(22)), -13);
        assert_eq!(cpu.mem().read(addr(20)), 10);
    }

    #[test]
    fn test_arithmetic_wraps() {
        let mut cpu = Cpu::new(make_memory(
            &[
                Instruction::Ldn { addr: addr(20) },
                Instruction::Sub { addr: addr(21) },
                Instruction::Stp,
            ],
            &[(20, i32::MIN), (21, 1)],
        ));

        cpu.step().unwrap();
        // -MIN wraps to MIN
        assert_eq!(cpu.acc(), i32::MIN);
        cpu.step().unwrap();
        assert_eq!(cpu.acc(), i32::MAX);
    }

    #[test]
    fn test_compare_skips_when_negative() {
        let mut cpu = Cpu::new(make_memory(
            &[
                Instruction::Ldn { addr: addr(20) },
                Instruction::Cmp,
                Instruction::Stp,
                Instruction::Stp,
            ],
            &[(20, 5)],
        ));

        cpu.run().unwrap();

        assert_eq!(cpu.last_executed().unwrap().address, addr(3));
        assert_eq!(cpu.cycles(), 3);
    }

    #[test]
    fn test_compare_falls_through_when_zero() {
        let mut cpu = Cpu::new(make_memory(
            &[Instruction::Cmp, Instruction::Stp, Instruction::Stp],
            &[],
        ));

        cpu.run().unwrap();

        assert_eq!(cpu.last_executed().unwrap().address, addr(1));
    }

    #[test]
    fn test_runaway_faults_without_changing_state() {
        // Jump through line 5, which holds 31: the next fetch would be line 32.
        let mut cpu = Cpu::new(make_memory(&[Instruction::Jmp { addr: addr(5) }], &[(5, 31)]));
        cpu.step().unwrap();
        let regs = cpu.regs().clone();

        assert_eq!(cpu.step(), Err(CpuError::RunawayProgramCounter(32)));
        assert_eq!(cpu.state(), CpuState::Faulted);
        assert_eq!(cpu.regs(), &regs);
        assert_eq!(cpu.cycles(), 1);
        assert_eq!(cpu.step(), Err(CpuError::NotRunning(CpuState::Faulted)));
    }

    #[test]
    fn test_runaway_to_negative_line() {
        let mut cpu = Cpu::new(make_memory(&[Instruction::Jmp { addr: addr(5) }], &[(5, -10)]));

        assert_eq!(cpu.run(), Err(CpuError::RunawayProgramCounter(-9)));
    }

    #[test]
    fn test_reset_keeps_memory() {
        let mut cpu = Cpu::new(make_memory(
            &[Instruction::Ldn { addr: addr(20) }, Instruction::Sto { addr: addr(21) }, Instruction::Stp],
            &[(20, 4)],
        ));
        cpu.run().unwrap();
        let mem = cpu.mem().clone();

        cpu.reset();

        assert!(cpu.is_running());
        assert_eq!(cpu.ci(), 0);
        assert_eq!(cpu.acc(), 0);
        assert_eq!(cpu.cycles(), 0);
        assert_eq!(cpu.mem(), &mem);
        assert_eq!(cpu.mem().read(addr(21)), -4);
    }

    #[test]
    fn test_reset_recovers_from_fault() {
        let mut cpu = Cpu::new(make_memory(&[Instruction::Jmp { addr: addr(5) }], &[(5, 40)]));
        assert!(cpu.run().is_err());

        cpu.reset();
        assert!(cpu.is_running());
        assert_eq!(cpu.step().unwrap().address, addr(1));
    }

    #[test]
    fn test_reset_after_steps_clears_ci() {
        let mut cpu = Cpu::new(Memory::new());
        cpu.run_limited(3).unwrap();

        cpu.reset();

        assert_eq!(cpu.ci(), 0);
        assert_eq!(cpu.regs().next_ci(), 1);
    }

    #[test]
    fn test_reboot_replaces_memory() {
        let mut cpu = Cpu::new(make_memory(&[Instruction::Stp], &[(9, 9)]));
        cpu.run().unwrap();

        // Line 0 is never fetched after a reboot.
        let fresh = make_memory(
            &[Instruction::Stp, Instruction::Ldn { addr: addr(4) }, Instruction::Stp],
            &[(4, 2)],
        );
        cpu.reboot(fresh.clone());

        assert!(cpu.is_running());
        assert_eq!(cpu.ci(), 0);
        assert_eq!(cpu.mem(), &fresh);
        assert_eq!(cpu.run().unwrap(), 2);
        assert_eq!(cpu.acc(), -2);
    }

    #[test]
    fn test_run_limited_stops_infinite_loop() {
        // JMP 0 with line 0 holding encode(JMP 0) == 0 loops forever.
        let mut cpu = Cpu::new(Memory::new());

        let executed = cpu.run_limited(50).unwrap();

        assert_eq!(executed, 50);
        assert!(cpu.is_running());
    }

    #[test]
    fn test_observer_sees_every_step() {
        let mut cpu = Cpu::new(make_memory(
            &[Instruction::Ldn { addr: addr(20) }, Instruction::Cmp, Instruction::Stp, Instruction::Stp],
            &[(20, 1)],
        ));
        let mut seen = Vec::new();

        cpu.run_limited_with(100, |cpu, executed| seen.push((executed.address.value(), cpu.acc())))
            .unwrap();

        assert_eq!(seen, vec![(0, -1), (1, -1), (3, -1)]);
    }

    #[test]
    fn test_state_serializes() {
        let cpu = Cpu::new(make_memory(&[Instruction::Stp], &[]));
        let json = serde_json::to_string(&cpu).unwrap();
        let back: Cpu = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cpu);
    }

    proptest! {
        #[test]
        fn random_images_never_panic(words in prop::array::uniform32(any::<i32>())) {
            let mut cpu = Cpu::new(Memory::from_words(words));
            let result = cpu.run_limited(1_000);
            match result {
                Ok(_) => prop_assert!(cpu.is_running() || cpu.is_halted()),
                Err(e) => {
                    prop_assert!(matches!(e, CpuError::RunawayProgramCounter(_)));
                    prop_assert_eq!(cpu.state(), CpuState::Faulted);
                }
            }
            prop_assert!(cpu.cycles() <= 1_000);
        }
    }
}
