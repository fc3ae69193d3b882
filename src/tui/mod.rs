//! TUI debugger for the SSEM emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - A store view drawn like the Baby's display tube
//! - Register visualization
//! - Step/run/reset/reboot and breakpoint controls

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
