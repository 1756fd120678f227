//! # schemaforge
//!
//! The command line tool for the schemaforge assembly engine.
//!
//! This application provides:
//! - Config fragment loading (JSON / TOML)
//! - Built-in plugins (`describe`, `paginate`)
//! - Build, validation and inspection of stored schemas
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                apps/schemaforge (THE BINARY)                │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────────┐  │
//! │  │    CLI      │    │   Loader    │    │ Built-in plugins│  │
//! │  │   (clap)    │    │ (json/toml) │    │                 │  │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬────────┘  │
//! │         │                  │                    │           │
//! │         └──────────────────┼────────────────────┘           │
//! │                            ▼                                │
//! │                  ┌───────────────────┐                      │
//! │                  │ schemaforge-core  │                      │
//! │                  │    (THE LOGIC)    │                      │
//! │                  └───────────────────┘                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Build and store a schema
//! schemaforge --catalog classes.toml build base.toml blog.json
//!
//! # Inspect it
//! schemaforge status
//! schemaforge sdl -o schema.graphql
//! schemaforge types
//! ```

use clap::Parser;
use schemaforge::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // SCHEMAFORGE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("SCHEMAFORGE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "schemaforge=info,schemaforge_core=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the schemaforge startup banner.
fn print_banner() {
    println!("schemaforge v{}", env!("CARGO_PKG_VERSION"));
    println!();
}
