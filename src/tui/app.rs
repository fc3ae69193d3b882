//! Debugger application state and logic.

use crate::{Cpu, Memory, Address};
use crate::asm::load_file;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Debugger application state.
pub struct DebuggerApp {
    /// The CPU being debugged.
    pub cpu: Cpu,
    /// Program file, re-read on reboot.
    pub program_path: PathBuf,
    /// Breakpoints (by fetch address).
    pub breakpoints: HashSet<Address>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset.
    pub mem_scroll: usize,
    /// Delay between steps while running.
    pub tick: Duration,
    last_tick: Instant,
    /// Set by `run` so a resume does not stop on the breakpoint it left.
    resuming: bool,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program_path: PathBuf, mem: Memory, tick: Duration) -> Self {
        Self {
            cpu: Cpu::new(mem),
            program_path,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            mem_scroll: 0,
            tick,
            last_tick: Instant::now(),
            resuming: false,
        }
    }

    /// The line the next step will fetch from, if it is inside the store.
    pub fn next_fetch(&self) -> Option<Address> {
        Address::try_from(self.cpu.regs().next_ci()).ok()
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        if !self.cpu.is_running() {
            self.status = format!("CPU stopped: {:?}", self.cpu.state());
            self.running = false;
            return;
        }

        match self.cpu.step() {
            Ok(executed) => {
                self.status = format!("{}  A={}", executed, self.cpu.acc());
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }
    }

    /// Run until halt, breakpoint, or error.
    pub fn run(&mut self) {
        self.running = true;
        self.resuming = true;
        self.last_tick = Instant::now();
        self.status = "Running...".into();
    }

    /// Stop continuous execution.
    pub fn pause(&mut self) {
        self.running = false;
        self.status = "Paused.".into();
    }

    /// Run one iteration of continuous execution, if a tick has elapsed.
    pub fn tick(&mut self) {
        if !self.running || self.last_tick.elapsed() < self.tick {
            return;
        }
        self.last_tick = Instant::now();

        if !self.cpu.is_running() {
            self.running = false;
            self.status = format!("Stopped after {} cycles", self.cpu.cycles());
            return;
        }

        // Check for breakpoint
        if let Some(next) = self.next_fetch() {
            if self.breakpoints.contains(&next) && !self.resuming {
                self.running = false;
                self.status = format!("Breakpoint at line {}", next);
                return;
            }
        }

        self.resuming = false;
        self.step();
    }

    /// Toggle breakpoint at the next fetch address.
    pub fn toggle_breakpoint(&mut self) {
        let Some(next) = self.next_fetch() else {
            self.status = "No breakpoint possible outside the store".into();
            return;
        };

        if self.breakpoints.remove(&next) {
            self.status = format!("Removed breakpoint at line {}", next);
        } else {
            self.breakpoints.insert(next);
            self.status = format!("Set breakpoint at line {}", next);
        }
    }

    /// Reset registers; the store keeps whatever the program wrote.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    /// Re-read the program file and reboot with a fresh store.
    pub fn reboot(&mut self) {
        self.running = false;
        match load_file(&self.program_path) {
            Ok(mem) => {
                self.cpu.reboot(mem);
                self.status = format!("Rebooted from {}", self.program_path.display());
            }
            Err(e) => {
                self.status = format!("Reboot failed: {}", e);
            }
        }
    }
}

/// Raw mode and the alternate screen, undone on drop so an early error
/// still leaves a usable terminal.
struct TerminalGuard {
    active: bool,
}

impl TerminalGuard {
    fn enter() -> std::io::Result<Self> {
        use crossterm::{terminal::{enable_raw_mode, EnterAlternateScreen}, ExecutableCommand};

        enable_raw_mode()?;
        let guard = Self { active: true };
        std::io::stdout().execute(EnterAlternateScreen)?;
        Ok(guard)
    }

    fn restore(&mut self) -> std::io::Result<()> {
        use crossterm::{terminal::{disable_raw_mode, LeaveAlternateScreen}, ExecutableCommand};

        if !self.active {
            return Ok(());
        }
        self.active = false;
        disable_raw_mode()?;
        std::io::stdout().execute(LeaveAlternateScreen)?;
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program_path: PathBuf, mem: Memory, tick: Duration) -> std::io::Result<()> {
    use crossterm::event::{self, Event, KeyCode, KeyEventKind};
    use ratatui::prelude::*;
    use std::io::stdout;

    // Setup terminal
    let mut guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create app
    let mut app = DebuggerApp::new(program_path, mem, tick);

    // Main loop
    loop {
        // Draw
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        // Handle input
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => app.pause(),
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Char('l') => app.reboot(),
                        KeyCode::Up => {
                            app.mem_scroll = app.mem_scroll.saturating_sub(1);
                        }
                        KeyCode::Down => {
                            if app.mem_scroll + 1 < Address::COUNT {
                                app.mem_scroll += 1;
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        // Tick for continuous running
        app.tick();

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    guard.restore()
}
