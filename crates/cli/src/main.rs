//! APEX cycle-accurate simulator CLI.
//!
//! A single `run` subcommand: assemble a program, execute it to completion
//! or to a runtime error, and report the final architectural state.

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::{fs, process};

use apex_core::Config;
use apex_core::common::error::ExitCode;
use apex_core::sim::{loader, simulator::Simulator};

#[derive(Parser, Debug)]
#[command(
    name = "apex",
    author,
    version,
    about = "APEX cycle-accurate out-of-order pipeline simulator",
    long_about = "Run an APEX assembly program to completion and report the final register file.\n\nExamples:\n  apex run program.asm\n  apex run program.asm --config config.json\n  apex run program.asm --trace --dump-memory"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assemble and run a program.
    Run {
        /// Path to the APEX assembly program.
        program: PathBuf,

        /// Optional JSON config overriding structural sizes or start PC.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Enable per-stage tracing events (stalls, retires, mispredicts).
        #[arg(long)]
        trace: bool,

        /// Dump the full data memory after the run.
        #[arg(long)]
        dump_memory: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            program,
            config,
            trace,
            dump_memory,
        } => cmd_run(&program, config.as_deref(), trace, dump_memory),
    }
}

fn load_config(path: Option<&std::path::Path>, trace: bool) -> Config {
    let mut config = match path {
        Some(p) => {
            let text = fs::read_to_string(p).unwrap_or_else(|e| {
                eprintln!("[!] could not read config {}: {e}", p.display());
                process::exit(ExitCode::AssembleFailure as i32);
            });
            serde_json::from_str(&text).unwrap_or_else(|e| {
                eprintln!("[!] malformed config {}: {e}", p.display());
                process::exit(ExitCode::AssembleFailure as i32);
            })
        }
        None => Config::default(),
    };
    config.general.trace |= trace;
    config
}

fn cmd_run(program: &std::path::Path, config_path: Option<&std::path::Path>, trace: bool, dump_memory: bool) {
    let config = load_config(config_path, trace);

    let code = loader::load_program(program).unwrap_or_else(|e| {
        eprintln!("[!] {e}");
        process::exit(ExitCode::AssembleFailure as i32);
    });

    println!("[*] Loaded {} instructions from {}", code.len(), program.display());
    println!("    start_pc={:#x} rob={} iq={} lsq={} bq={}", config.general.start_pc, config.core.rob_capacity, config.core.iq_capacity, config.core.lsq_capacity, config.core.bq_capacity);

    let mut sim = Simulator::new(&config, code);
    let error = sim.run();

    println!();
    println!("[*] Halted after {} ticks, {} instructions retired", sim.tick_count(), sim.retired_count());
    sim.registers().dump();
    let flags = sim.flags();
    println!("FLAGS: Z={} P={} N={}", flags.z, flags.p, flags.n);

    if dump_memory {
        for (addr, value) in sim.data_memory().iter().enumerate().filter(|(_, v)| **v != 0) {
            println!("MEM[{addr}] = {value}");
        }
    }

    std::io::stdout().flush().ok();

    if sim.is_hung() {
        eprintln!("[!] engine made no progress for too many ticks; this is a simulator bug, not a program error");
        process::exit(ExitCode::ProgramFailure as i32);
    }
    if let Some(err) = error {
        eprintln!("[!] program error: {err}");
        process::exit(ExitCode::ProgramFailure as i32);
    }
    process::exit(ExitCode::Ok as i32);
}
