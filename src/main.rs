use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::fs;
use std::path::PathBuf;

use poolsim::config::{self, CliOverrides, SimulationConfig};
use poolsim::export;
use poolsim::ledger::PoolType;
use poolsim::simulation::simulate;

/// Synthetic multi-pool ledger history generator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the simulation configuration YAML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory for generated CSV datasets
    #[arg(short, long, default_value = "sim_output")]
    output: PathBuf,

    /// RNG seed override
    #[arg(long)]
    seed: Option<u64>,

    /// Number of simulated periods override
    #[arg(long)]
    periods: Option<u64>,

    /// User population override
    #[arg(long)]
    users: Option<u32>,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Starting poolsim ledger history generator");
    info!("Output directory: {:?}", args.output);

    // Load configuration, falling back to the built-in defaults
    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => {
            info!("No configuration file given, using defaults");
            SimulationConfig::default()
        }
    };

    // Apply CLI overrides
    let overrides = CliOverrides {
        seed: args.seed,
        periods: args.periods,
        users: args.users,
    };
    config::apply_overrides(&mut config, &overrides)?;

    // Create the output directory
    fs::create_dir_all(&args.output).wrap_err_with(|| {
        format!(
            "Failed to create output directory '{}'",
            args.output.display()
        )
    })?;

    // Run the simulation
    let result = simulate(&config)?;

    // Export the datasets
    export::write_chain_file(&result, &args.output.join("blockchain.csv"))?;
    export::write_balance_file(
        &result,
        PoolType::Sprout,
        &args.output.join("user_balance_sprout.csv"),
    )?;
    export::write_balance_file(
        &result,
        PoolType::Sapling,
        &args.output.join("user_balance_sapling.csv"),
    )?;

    info!("Datasets written to {:?}", args.output);

    Ok(())
}
