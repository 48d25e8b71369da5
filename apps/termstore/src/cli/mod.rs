//! # termstore CLI Module
//!
//! ## Available Commands
//!
//! - `init` - Create an empty store
//! - `import` - Merge chronologies from a JSON file
//! - `show` - Print a decoded entity
//! - `latest` - Resolve the latest version under a stamp coordinate
//! - `describe` - Best description text of a concept
//! - `stats` - Segment statistics
//! - `checkpoint` - Flush and compact the database

mod commands;

use crate::config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use termstore_core::TermstoreError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// termstore - versioned terminology store
#[derive(Parser, Debug)]
#[command(name = "termstore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to termstore.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the redb database (overrides the config file)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Suppress the version banner
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new empty database
    Init {
        /// Overwrite an existing database
        #[arg(short, long)]
        force: bool,
    },

    /// Merge chronologies from a JSON array
    Import {
        /// Path to the JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print the decoded entity of a nid
    Show {
        nid: i32,
    },

    /// Resolve the latest version of a nid
    Latest {
        nid: i32,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Print the best description of a concept
    Describe {
        concept: i32,

        /// Language preset (e.g. us-english-regular-name)
        #[arg(short, long, default_value = "us-english-regular-name")]
        language: String,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Show segment statistics
    Stats,

    /// Flush dirty segments and compact the database
    Checkpoint {
        /// Stop after writing this many segments
        #[arg(long)]
        max_segments: Option<usize>,
    },
}

/// Stamp coordinate overrides. Unset fields keep "master, latest, active and
/// inactive".
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Path nid
    #[arg(long)]
    pub path: Option<i32>,

    /// Position time (epoch millis)
    #[arg(long)]
    pub time: Option<i64>,

    /// Allowed statuses, comma-separated (active,inactive,...)
    #[arg(long)]
    pub states: Option<String>,

    /// Module nids to ignore
    #[arg(long = "exclude-module", value_delimiter = ',')]
    pub exclude_modules: Vec<i32>,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli, config: &Config) -> Result<(), TermstoreError> {
    let db_path = cli
        .database
        .clone()
        .unwrap_or_else(|| config.store.path.clone());
    let spine = config.spine_config();
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Init { force }) => cmd_init(&db_path, spine, force),
        Some(Commands::Import { file }) => cmd_import(&db_path, spine, json_mode, &file),
        Some(Commands::Show { nid }) => cmd_show(&db_path, spine, json_mode, nid),
        Some(Commands::Latest { nid, view }) => cmd_latest(&db_path, spine, json_mode, nid, &view),
        Some(Commands::Describe {
            concept,
            language,
            view,
        }) => cmd_describe(&db_path, spine, json_mode, concept, &language, &view),
        Some(Commands::Checkpoint { max_segments }) => {
            cmd_checkpoint(&db_path, spine, json_mode, max_segments)
        }
        Some(Commands::Stats) | None => cmd_stats(&db_path, spine, json_mode),
    }
}
