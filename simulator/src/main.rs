use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reentrancy_simulator::{fuzz, scenarios, Scenario, SimulatorConfig};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, Level};

fn init_tracing(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML config file (defaults apply when omitted).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides `log_level` from the config.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one named scenario and print its report.
    Scenario {
        #[arg(value_enum)]
        name: Scenario,
    },
    /// Attack every guard policy and report which ones hold.
    Compare,
    /// Check conservation invariants under a seeded random workload.
    Fuzz {
        /// Overrides `seed` from the config.
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, default_value_t = 1_000)]
        iterations: u64,
    },
}

fn build_config(args: &Args) -> Result<SimulatorConfig> {
    let mut config = match &args.config {
        Some(path) => SimulatorConfig::load(path)?,
        None => SimulatorConfig::default(),
    };
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    if let Command::Fuzz {
        iterations: 0,
        ..
    } = args.command
    {
        anyhow::bail!("iterations must be > 0");
    }
    config.validate()?;
    Ok(config)
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize report")?;
    println!("{json}");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = build_config(&args)?;
    init_tracing(config.level()?);

    match args.command {
        Command::Scenario { name } => {
            info!(scenario = ?name, "running scenario");
            let report = scenarios::run(name, &config).context("scenario failed")?;
            print_json(&report)
        }
        Command::Compare => {
            let reports = scenarios::compare(&config).context("comparison failed")?;
            print_json(&reports)
        }
        Command::Fuzz { seed, iterations } => {
            let seed = seed.unwrap_or(config.seed);
            info!(seed, iterations, "fuzzing");
            let report = fuzz::run(&config, seed, iterations)?;
            print_json(&report)
        }
    }
}
