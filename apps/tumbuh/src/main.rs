//! # Tumbuh - WHO Growth Standard Evaluator
//!
//! The main binary for the Tumbuh growth engine.
//!
//! This application provides:
//! - HTTP JSON API server (axum-based)
//! - CLI interface for evaluations and reference data
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            apps/tumbuh (THE BINARY)          │
//! │                                              │
//! │  ┌─────────────┐        ┌─────────────┐      │
//! │  │   CLI       │        │   HTTP API  │      │
//! │  │  (clap)     │        │   (axum)    │      │
//! │  └──────┬──────┘        └──────┬──────┘      │
//! │         └───────────┬──────────┘             │
//! │                     ▼                        │
//! │             ┌───────────────┐                │
//! │             │  tumbuh-core  │                │
//! │             │  (THE LOGIC)  │                │
//! │             └───────────────┘                │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! tumbuh server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! tumbuh evaluate --sex MALE --age 6 --weight 7.9
//! tumbuh batch -f posyandu.csv -t csv
//! tumbuh curve -t wfa -s FEMALE -z -2
//! tumbuh verify
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tumbuh::cli;

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // TUMBUH_LOG_FORMAT=json enables machine-parseable output. Logs go to
    // stderr so `--json-mode` output on stdout stays clean.
    let log_format = std::env::var("TUMBUH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "tumbuh=debug,tower_http=debug"
    } else {
        "tumbuh=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Tumbuh startup banner.
fn print_banner() {
    println!(
        r#"
  ████████╗██╗   ██╗███╗   ███╗██████╗ ██╗   ██╗██╗  ██╗
  ╚══██╔══╝██║   ██║████╗ ████║██╔══██╗██║   ██║██║  ██║
     ██║   ██║   ██║██╔████╔██║██████╔╝██║   ██║███████║
     ██║   ██║   ██║██║╚██╔╝██║██╔══██╗██║   ██║██╔══██║
     ██║   ╚██████╔╝██║ ╚═╝ ██║██████╔╝╚██████╔╝██║  ██║
     ╚═╝    ╚═════╝ ╚═╝     ╚═╝╚═════╝  ╚═════╝ ╚═╝  ╚═╝

  WHO Growth Standard Evaluator v{}

  WHO 2006 • LMS • Deterministic
"#,
        env!("CARGO_PKG_VERSION")
    );
}
