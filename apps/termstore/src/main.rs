//! # termstore
//!
//! Command-line access to a termstore database.
//!
//! ## Usage
//!
//! ```bash
//! termstore init
//! termstore import -f chronologies.json
//! termstore latest 100 --path 3 --states active
//! termstore describe 100 --language us-english-regular-name
//! termstore checkpoint --max-segments 64
//! ```

use clap::Parser;
use termstore::config::{Config, LogConfig};
use termstore::{cli, logging};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // Logging comes up before the config error is reported, so fall back to
    // the default log settings when the file is broken.
    let config = Config::load(cli.config.as_deref());
    let log = config
        .as_ref()
        .map(|c| c.log.clone())
        .unwrap_or_else(|_| LogConfig::default());
    logging::init(&log);

    if !cli.quiet {
        eprintln!("termstore v{}", env!("CARGO_PKG_VERSION"));
    }

    let result = config.and_then(|config| cli::execute(cli, &config));
    if let Err(e) = result {
        tracing::error!(kind = ?e.kind(), "Error: {}", e);
        std::process::exit(1);
    }
}
