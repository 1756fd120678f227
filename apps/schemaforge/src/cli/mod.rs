//! # schemaforge CLI Module
//!
//! This module implements the CLI interface for schemaforge.
//!
//! ## Available Commands
//!
//! - `build` - Apply config fragments, build and persist the schema
//! - `validate` - Build without persisting
//! - `status` - Show whether a build is stored, with counts and checksums
//! - `sdl` - Print or write the SDL of the stored schema
//! - `types` - Show the class → type mapping of the stored schema

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use schemaforge_core::SchemaError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// schemaforge - schema assembly from config fragments
///
/// Merges type, query, mutation and model definitions from any number of
/// JSON or TOML fragments, runs plugins, validates and stores the result.
#[derive(Parser, Debug)]
#[command(name = "schemaforge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log build stages at info level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the schema database (redb backend)
    #[arg(short = 'D', long, global = true, default_value = "schemaforge.redb")]
    pub database: PathBuf,

    /// Schema key
    #[arg(short, long, global = true, default_value = "default")]
    pub key: String,

    /// Storage backend
    #[arg(short = 'B', long, global = true, value_enum, default_value_t = Backend::Redb)]
    pub backend: Backend,

    /// Class catalog (JSON or TOML) used to introspect models
    #[arg(short, long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Where built schemas are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// ACID database file
    Redb,
    /// Process memory; nothing outlives the command
    Memory,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and persist a schema from config fragments
    Build {
        /// Config fragments, applied in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Build a schema without persisting it
    Validate {
        /// Config fragments, applied in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show the stored schema status
    Status,

    /// Render the stored schema as SDL
    Sdl {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the class → type mapping of the stored schema
    Types,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), SchemaError> {
    let workspace = Workspace::open(&cli)?;

    match cli.command {
        Some(Commands::Build { files }) => cmd_build(&workspace, &files),
        Some(Commands::Validate { files }) => cmd_validate(&workspace, &files),
        Some(Commands::Status) => cmd_status(&workspace),
        Some(Commands::Sdl { output }) => cmd_sdl(&workspace, output.as_deref()),
        Some(Commands::Types) => cmd_types(&workspace),
        None => {
            // No subcommand - show status by default
            cmd_status(&workspace)
        }
    }
}
