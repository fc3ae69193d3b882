//! SSEM Emulator - CLI Entry Point
//!
//! Commands:
//! - `ssem-emu run <program>` - Run a program until it stops
//! - `ssem-emu debug <program>` - Interactive debugger
//! - `ssem-emu disasm <program>` - Show the loaded store as a listing
//! - `ssem-emu asm <source>` - Convert a program to binary notation

use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use ssem::{load_file, Cpu, CpuState, Memory};
use ssem::asm::disasm::{export_binary, listing};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ssem-emu")]
#[command(version)]
#[command(about = "An emulator of the Manchester Small-Scale Experimental Machine (1948)")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it stops
    Run {
        /// Path to the program file (assembly or binary notation)
        program: PathBuf,
        /// Maximum number of instructions to execute
        #[arg(short, long, default_value = "100000")]
        max_cycles: u64,
        /// Print every executed instruction
        #[arg(short, long)]
        trace: bool,
        /// Pause between instructions, in milliseconds
        #[arg(short, long, default_value = "0")]
        delay_ms: u64,
        /// Print the final machine state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive debugger
    #[cfg(feature = "tui")]
    Debug {
        /// Path to the program file
        program: PathBuf,
        /// Milliseconds between instructions while running
        #[arg(short, long, default_value = "1000")]
        tick_ms: u64,
    },
    /// Show the loaded store as a listing
    Disasm {
        /// Path to the program file
        program: PathBuf,
    },
    /// Convert a program to binary notation
    Asm {
        /// Path to the source file
        source: PathBuf,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { program, max_cycles, trace, delay_ms, json }) => {
            init_logging(cli.verbose, false);
            run_program(&program, max_cycles, trace, Duration::from_millis(delay_ms), json);
        }
        #[cfg(feature = "tui")]
        Some(Commands::Debug { program, tick_ms }) => {
            // Log lines on stderr would tear the screen, so only log on request.
            init_logging(cli.verbose, true);
            debug_program(program, Duration::from_millis(tick_ms));
        }
        Some(Commands::Disasm { program }) => {
            init_logging(cli.verbose, false);
            disassemble_file(&program);
        }
        Some(Commands::Asm { source, output }) => {
            init_logging(cli.verbose, false);
            assemble_file(&source, output);
        }
        None => {
            println!("SSEM Emulator v{}", env!("CARGO_PKG_VERSION"));
            println!("The Manchester Baby, 1948");
            println!();
            println!("Use --help for available commands");
        }
    }
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` takes precedence over `-v`. With `only_from_env` set, nothing
/// is installed unless `RUST_LOG` is present.
fn init_logging(verbose: u8, only_from_env: bool) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if only_from_env => return,
        Err(_) => {
            let level = match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            };
            EnvFilter::new(level)
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_or_exit(path: &Path) -> Memory {
    match load_file(path) {
        Ok(mem) => mem,
        Err(e) => {
            eprintln!("❌ Failed to load {}: {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn run_program(path: &Path, max_cycles: u64, trace: bool, delay: Duration, json: bool) {
    let mut cpu = Cpu::new(load_or_exit(path));

    if !json {
        println!("🔧 Running: {}", path.display());
        println!();
    }

    let result = cpu.run_limited_with(max_cycles, |cpu, executed| {
        if trace {
            println!("{}  CI={} A={}", executed, cpu.ci(), cpu.acc());
        }
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    });

    if let Err(e) = result {
        eprintln!("❌ CPU error after {} cycles: {}", cpu.cycles(), e);
        process::exit(1);
    }

    if json {
        match serde_json::to_string_pretty(&cpu) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("❌ Failed to serialize state: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    println!("━━━ Result ━━━");
    println!("Cycles: {}", cpu.cycles());
    println!("State:  {:?}", cpu.state());
    println!("CI:     {}", cpu.ci());
    println!("A:      {}", cpu.acc());

    if cpu.state() == CpuState::Running {
        println!();
        println!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", max_cycles);
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: PathBuf, tick: Duration) {
    let mem = load_or_exit(&path);

    if let Err(e) = ssem::run_debugger(path, mem, tick) {
        eprintln!("❌ Debugger error: {}", e);
        process::exit(1);
    }
}

fn disassemble_file(path: &Path) {
    let mem = load_or_exit(path);
    print!("{}", listing(&mem));
}

fn assemble_file(source: &Path, output: Option<PathBuf>) {
    let mem = load_or_exit(source);
    let text = export_binary(&mem);

    match output {
        Some(out_path) => {
            if let Err(e) = std::fs::write(&out_path, text) {
                eprintln!("❌ Failed to write {}: {}", out_path.display(), e);
                process::exit(1);
            }
            println!("✓ Saved to {}", out_path.display());
        }
        None => print!("{}", text),
    }
}
