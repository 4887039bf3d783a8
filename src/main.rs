//! Customer Report Batch CLI
//!
//! Runs the scheduled customer report job against a local JSON input file.

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use customer_report::{build_runtime, run_once, run_scheduler, seed_customers, Config};

#[derive(Parser)]
#[command(name = "customer-report")]
#[command(about = "Scheduled chunk-oriented customer report job", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the job on its schedule (default if no command specified)
    Run,

    /// Execute a single run immediately and print its status
    RunOnce,

    /// Validate configuration
    Validate,

    /// Generate a sample configuration file
    GenerateConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Seed the input file with random sample customers
    Seed {
        /// Number of customers to generate
        #[arg(short = 'n', long, default_value_t = 1000)]
        count: u32,

        /// Destination path (defaults to the configured input path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Run) => {
            run_command(cli.config)?;
        }

        Some(Commands::RunOnce) => {
            run_once_command(cli.config)?;
        }

        Some(Commands::Validate) => {
            validate_command(cli.config)?;
        }

        Some(Commands::GenerateConfig { output }) => {
            generate_config_command(output)?;
        }

        Some(Commands::Seed { count, output }) => {
            seed_command(cli.config, count, output)?;
        }
    }

    Ok(())
}

fn run_command(config_path: PathBuf) -> Result<()> {
    let config = Config::from_file(&config_path)?;
    config.validate()?;

    let runtime = build_runtime(None)?;
    runtime.block_on(async { run_scheduler(config).await })?;

    Ok(())
}

fn run_once_command(config_path: PathBuf) -> Result<()> {
    let config = Config::from_file(&config_path)?;
    let status = run_once(&config)?;
    println!("{status}");

    if status.is_failed() {
        anyhow::bail!("run failed");
    }
    Ok(())
}

fn validate_command(config_path: PathBuf) -> Result<()> {
    let config = Config::from_file(&config_path)?;
    config.validate()?;
    println!("Configuration is valid");
    Ok(())
}

fn seed_command(config_path: PathBuf, count: u32, output: Option<PathBuf>) -> Result<()> {
    let path = match output {
        Some(path) => path,
        None => Config::from_file(&config_path)?.input.path,
    };
    seed_customers(&path, count, Local::now().date_naive())?;
    println!("Seeded {} customers to {}", count, path.display());
    Ok(())
}

fn generate_config_command(output: PathBuf) -> Result<()> {
    // Generate a commented YAML config
    let yaml = r#"# Customer Report Job Configuration

# === JOB: Identity, chunking, and schedule ===
job:
  # Registry key and log label for this job
  name: customer-report

  # Kept records committed to the report per chunk
  chunk_size: 20

  # Fixed tick interval between runs, in seconds.
  # A run longer than the interval delays the next tick; runs never overlap.
  interval_secs: 5

# === INPUT: Where customers are read from ===
input:
  # JSON array of customers, decoded in full at the start of every run.
  # Use the `seed` subcommand to generate sample data here.
  path: customers.json

# === OUTPUT: Where the report is written ===
output:
  # One surviving customer per line; rewritten by each run
  path: output.txt

# === FILTERS: The stage chain, applied in order ===
filters:
  # Customers with at least this many transactions are dropped
  transaction_limit: 5

  # Birthday eligibility window, one of:
  #   same_month                  - birthday in the current calendar month
  #   same_day                    - birthday is today (month and day)
  #   within_days: { days: N }    - birthday within N days, wrapping the year
  birthday_window: same_month
"#;

    std::fs::write(&output, yaml)?;
    println!("Generated sample configuration at: {}", output.display());

    Ok(())
}
