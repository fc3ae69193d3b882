//! WebAssembly bindings for the SSEM emulator.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.

use js_sys::Int32Array;
use wasm_bindgen::prelude::*;
use crate::{Cpu, Memory, Address};
use crate::asm::{load_program, disassemble_word};
use crate::word::format_raw;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly CPU wrapper.
#[wasm_bindgen]
pub struct WasmBaby {
    cpu: Cpu,
    program: Memory,
}

#[wasm_bindgen]
impl WasmBaby {
    /// Create a new machine with an empty store.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            cpu: Cpu::default(),
            program: Memory::new(),
        }
    }

    /// Load a program from source text in either notation.
    ///
    /// Returns the number of non-zero store lines.
    #[wasm_bindgen]
    pub fn load(&mut self, source: &str) -> Result<usize, JsError> {
        let mem = load_program(source)
            .map_err(|e| JsError::new(&e.to_string()))?;

        let used = mem.iter().filter(|(_, word)| *word != 0).count();
        self.program = mem.clone();
        self.cpu = Cpu::new(mem);

        Ok(used)
    }

    /// Step one instruction. Returns the disassembled instruction.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        let executed = self.cpu.step()
            .map_err(|e| JsError::new(&e.to_string()))?;

        Ok(executed.instruction.to_string())
    }

    /// Run until halt or max cycles. Returns the total cycle count.
    #[wasm_bindgen]
    pub fn run(&mut self, max_cycles: u32) -> Result<u64, JsError> {
        self.cpu.run_limited(u64::from(max_cycles))
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(self.cpu.cycles())
    }

    /// Reset registers, keeping the store.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.cpu.reset();
    }

    /// Restore the store as it was loaded, then reset.
    #[wasm_bindgen]
    pub fn reboot(&mut self) {
        self.cpu.reboot(self.program.clone());
    }

    /// Check if CPU is running.
    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.cpu.is_running()
    }

    /// Check if CPU is halted.
    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.cpu.is_halted()
    }

    /// Get cycle count.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles()
    }

    /// Get the control instruction register.
    #[wasm_bindgen]
    pub fn ci(&self) -> i64 {
        self.cpu.ci()
    }

    /// Get accumulator value.
    #[wasm_bindgen]
    pub fn accumulator(&self) -> i32 {
        self.cpu.acc()
    }

    /// Get state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.cpu.state())
    }

    /// Get a store line (0-31); lines outside the store read as 0.
    #[wasm_bindgen]
    pub fn memory_at(&self, line: u8) -> i32 {
        Address::new(line).map_or(0, |addr| self.cpu.mem().read(addr))
    }

    /// Get a store line as its 32 display bits.
    #[wasm_bindgen]
    pub fn memory_bits_at(&self, line: u8) -> String {
        format_raw(self.memory_at(line))
    }

    /// Get a store line disassembled.
    #[wasm_bindgen]
    pub fn memory_disasm_at(&self, line: u8) -> String {
        disassemble_word(self.memory_at(line))
    }

    /// Get the whole store as a typed array.
    #[wasm_bindgen]
    pub fn memory_all(&self) -> Int32Array {
        Int32Array::from(&self.cpu.mem().words()[..])
    }

    /// Get the full machine state as JSON.
    #[wasm_bindgen]
    pub fn state_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.cpu)
            .map_err(|e| JsError::new(&e.to_string()))
    }
}

impl Default for WasmBaby {
    fn default() -> Self {
        Self::new()
    }
}

/// Disassemble a single word.
#[wasm_bindgen]
pub fn wasm_disassemble(word: i32) -> String {
    disassemble_word(word)
}
