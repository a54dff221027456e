//! Reorder-buffer timing core CLI.
//!
//! This binary replays micro-op traces through the timing core. It performs:
//! 1. **Single core:** One `--trace` drives one engine.
//! 2. **Multi-core:** Several `--trace` files run in parallel, one engine per
//!    trace, over shared light caches.
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`.

use std::path::PathBuf;
use std::{fs, process};

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use robsim_core::config::Config;
use robsim_core::sim::{Batch, TraceLoader, run_cores};
use robsim_core::stats::STATS_SECTIONS;

#[derive(Parser, Debug)]
#[command(
    name = "robsim",
    author,
    version,
    about = "Reorder-buffer timing core",
    long_about = "Replay JSON-lines micro-op traces through the out-of-order timing core.\n\nExamples:\n  robsim --trace loop.jsonl\n  robsim --config wide.json --trace core0.jsonl --trace core1.jsonl --stats cpi memory"
)]
struct Cli {
    /// JSON configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Micro-op trace, one per core.
    #[arg(short, long = "trace", required = true)]
    traces: Vec<PathBuf>,

    /// Micro-ops per simulate call; one instruction per call when omitted.
    #[arg(short, long)]
    batch: Option<usize>,

    /// Step one cycle at a time instead of skipping idle cycles.
    #[arg(long)]
    no_skip: bool,

    /// Statistics sections to print; all when omitted.
    #[arg(long, num_args = 1.., value_parser = clap::builder::PossibleValuesParser::new(STATS_SECTIONS.iter().copied()))]
    stats: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = cli.config.as_ref().map_or_else(
        || Ok(Config::default()),
        |path| {
            let text = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading config {}: {e}", path.display());
                process::exit(1);
            });
            Config::from_json(&text)
        },
    )
    .unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });
    if cli.no_skip {
        config.rob.skip_ahead = false;
    }

    let mut loader = TraceLoader::new();
    let traces: Vec<_> = cli
        .traces
        .iter()
        .map(|path| {
            loader.load_file(path).unwrap_or_else(|e| {
                eprintln!("Error loading {}: {e}", path.display());
                process::exit(1);
            })
        })
        .collect();
    info!(cores = traces.len(), templates = loader.distinct_templates(), "traces loaded");

    let batch = cli.batch.map_or(Batch::Instruction, Batch::MicroOps);
    let runs = run_cores(&config, traces, batch).unwrap_or_else(|e| {
        eprintln!("\n[!] FATAL: {e}");
        process::exit(1);
    });

    for run in &runs {
        println!(
            "\n[*] Core {}: {} instructions in {} cycles",
            run.core, run.outcome.instructions, run.outcome.latency
        );
        run.stats.print_sections(&cli.stats);
    }
}
