//! # Tumbuh CLI Module
//!
//! This module implements the CLI interface for Tumbuh.
//!
//! ## Available Commands
//!
//! - `evaluate` - Compute z-scores for one measurement
//! - `batch` - Compute z-scores for a JSON or CSV file of measurements
//! - `tables` - List the loaded reference tables
//! - `curve` - Print an SD line of one reference table
//! - `verify` - Load and validate reference data, print its fingerprint
//! - `server` - Start the HTTP server

mod commands;

use crate::config::Config;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tumbuh_core::GrowthError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Tumbuh - WHO child growth standard evaluator
///
/// Converts weight, length/height and head circumference into WHO z-scores
/// using the LMS method.
#[derive(Parser, Debug)]
#[command(name = "tumbuh")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a tumbuh.toml configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Load reference CSVs from this directory instead of the embedded tables
    #[arg(short = 'R', long, global = true)]
    pub reference_dir: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Batch input file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BatchFormat {
    Json,
    Csv,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Evaluate one measurement
    Evaluate {
        /// MALE / FEMALE (also L / P)
        #[arg(short, long)]
        sex: String,

        /// Age in months
        #[arg(short, long)]
        age: Option<f64>,

        /// Birth date (YYYY-MM-DD), used with --measured-on
        #[arg(long)]
        birth_date: Option<NaiveDate>,

        /// Measurement date (YYYY-MM-DD)
        #[arg(long)]
        measured_on: Option<NaiveDate>,

        /// Weight in kg
        #[arg(short, long)]
        weight: Option<f64>,

        /// Length/height in cm
        #[arg(short = 'l', long)]
        height: Option<f64>,

        /// Head circumference in cm
        #[arg(long)]
        head: Option<f64>,

        /// How length/height was measured (recumbent, standing)
        #[arg(long)]
        position: Option<String>,

        /// Apply the WHO restricted application beyond ±3 SD
        #[arg(long)]
        restrict_tails: bool,
    },

    /// Evaluate every measurement in a file
    Batch {
        /// Path to the input file
        #[arg(short, long)]
        file: PathBuf,

        /// Input format
        #[arg(short = 't', long, value_enum, default_value = "json")]
        format: BatchFormat,
    },

    /// List loaded reference tables
    Tables,

    /// Print the SD line of a reference table
    Curve {
        /// Standard code (wfa, lfa, hfa, hcfa, wfl, wfh)
        #[arg(short = 't', long)]
        standard: String,

        /// MALE / FEMALE
        #[arg(short, long)]
        sex: String,

        /// SD line to print
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        z: f64,
    },

    /// Validate reference data and print its BLAKE3 fingerprint
    Verify,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve configuration: file and environment, then CLI flags.
pub fn resolve_config(cli: &Cli) -> Result<Config, GrowthError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.reference_dir {
        config.reference.dir = Some(dir.clone());
    }
    Ok(config)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), GrowthError> {
    let mut config = resolve_config(&cli)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_server(&config).await
        }
        Some(Commands::Evaluate {
            sex,
            age,
            birth_date,
            measured_on,
            weight,
            height,
            head,
            position,
            restrict_tails,
        }) => {
            if restrict_tails {
                config.evaluator.restrict_tails = true;
            }
            let request = crate::api::MeasurementRequest {
                sex,
                age_in_months: age,
                birth_date,
                measured_on,
                weight_kg: weight,
                height_cm: height,
                head_circumference_cm: head,
                position,
            };
            cmd_evaluate(&config, json_mode, &request)
        }
        Some(Commands::Batch { file, format }) => cmd_batch(&config, json_mode, &file, format),
        Some(Commands::Curve { standard, sex, z }) => {
            cmd_curve(&config, json_mode, &standard, &sex, z)
        }
        Some(Commands::Verify) => cmd_verify(&config, json_mode),
        Some(Commands::Tables) | None => cmd_tables(&config, json_mode),
    }
}
