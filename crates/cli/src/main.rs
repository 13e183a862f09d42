//! SISD cycle-accurate simulator CLI.
//!
//! This binary drives a `SisdCore` from the command line. It provides:
//! 1. **Run:** Build a core from the default or a JSON configuration, tick it for a
//!    number of cycles and print the statistics report.
//! 2. **Snapshots:** Optionally stream one JSON snapshot per tick to stdout.
//! 3. **Config:** Print the effective default configuration as JSON.
//!
//! Logging goes through `tracing`; `RUST_LOG` selects the filter and `--trace`
//! raises the default to per-instruction events.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sisd_core::stats::STATS_SECTIONS;
use sisd_core::{ClockDomain, Config, SisdCore};

#[derive(Parser, Debug)]
#[command(
    name = "sisd",
    author,
    version,
    about = "Cycle-accurate SISD processor simulator",
    long_about = "Run a single-issue core on generated code with independent clock domains.\n\nExamples:\n  sisd run --cycles 500\n  sisd run --config machine.json --stats summary fetch\n  sisd run --cycles 40 --json > ticks.jsonl\n  sisd config > machine.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tick a core for a number of cycles and report statistics.
    Run {
        /// Number of core ticks to simulate.
        #[arg(short, long, default_value_t = 1000)]
        cycles: u64,

        /// JSON configuration file (defaults are used when omitted).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the workload generator seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Disable the instruction cache.
        #[arg(long)]
        no_cache: bool,

        /// Emit per-instruction trace events.
        #[arg(long)]
        trace: bool,

        /// Print one JSON snapshot per tick.
        #[arg(long)]
        json: bool,

        /// Core clock override in Hz, clamped to keep suppliers at a third of it.
        #[arg(long)]
        core_hz: Option<u32>,

        /// Statistics sections to print (summary, pipeline, instruction_mix, fetch).
        #[arg(long, num_args = 1.., value_parser = clap::builder::PossibleValuesParser::new(STATS_SECTIONS.iter().copied()))]
        stats: Vec<String>,
    },

    /// Print the default configuration as JSON.
    Config,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            cycles,
            config,
            seed,
            no_cache,
            trace,
            json,
            core_hz,
            stats,
        } => {
            let options = RunOptions {
                cycles,
                config,
                seed,
                no_cache,
                trace,
                json,
                core_hz,
                stats,
            };
            if let Err(message) = cmd_run(&options) {
                eprintln!("\n[!] {message}");
                process::exit(1);
            }
        }
        Commands::Config => match serde_json::to_string_pretty(&Config::default()) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("[!] cannot render configuration: {e}");
                process::exit(1);
            }
        },
    }
}

/// Arguments of the `run` subcommand.
#[derive(Debug)]
struct RunOptions {
    cycles: u64,
    config: Option<PathBuf>,
    seed: Option<u64>,
    no_cache: bool,
    trace: bool,
    json: bool,
    core_hz: Option<u32>,
    stats: Vec<String>,
}

/// Installs the `tracing` subscriber; `RUST_LOG` wins over the default level.
fn init_tracing(trace: bool) {
    let default = if trace { "trace" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the core, ticks it and prints the report.
///
/// On a fatal simulation error the statistics gathered so far are still printed.
fn cmd_run(options: &RunOptions) -> Result<(), String> {
    let mut config = match &options.config {
        Some(path) => Config::from_file(path).map_err(|e| e.to_string())?,
        None => Config::default(),
    };
    if let Some(seed) = options.seed {
        config.general.seed = seed;
    }
    if options.no_cache {
        config.cache.enabled = false;
    }
    config.general.trace |= options.trace;
    init_tracing(config.general.trace);

    let mut core = SisdCore::new(config).map_err(|e| e.to_string())?;
    if let Some(hz) = options.core_hz {
        let _ = core.update_clock(ClockDomain::Core, hz);
    }
    info!(cycles = options.cycles, "starting run");

    for _ in 0..options.cycles {
        if let Err(e) = core.tick() {
            error!(cycle = core.cycle(), "fatal simulation error: {e}");
            core.stats()
                .print_sections(&options.stats, core.frequency(ClockDomain::Core));
            return Err(format!("FATAL at cycle {}: {e}", core.cycle()));
        }
        if options.json {
            let line = serde_json::to_string(&core.snapshot()).map_err(|e| e.to_string())?;
            println!("{line}");
        }
    }

    core.stats()
        .print_sections(&options.stats, core.frequency(ClockDomain::Core));
    Ok(())
}
