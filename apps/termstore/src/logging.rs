//! Tracing subscriber setup.
//!
//! Filter: `TERMSTORE_LOG`, then `RUST_LOG`, then the config filter.
//! Format: JSON when `TERMSTORE_LOG_FORMAT=json` or the config says so.
//! Everything goes to stderr so stdout stays clean for `--json-mode`.

use crate::config::{LogConfig, LogFormat};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Effective format given the `TERMSTORE_LOG_FORMAT` value, if any.
#[must_use]
pub fn resolve_format(config: &LogConfig, env_format: Option<&str>) -> LogFormat {
    match env_format.map(str::trim) {
        Some(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
        Some(value) if value.eq_ignore_ascii_case("text") => LogFormat::Text,
        _ => config.format,
    }
}

/// Install the global subscriber. Call once, before any command runs.
pub fn init(config: &LogConfig) {
    let env_format = std::env::var("TERMSTORE_LOG_FORMAT").ok();
    let format = resolve_format(config, env_format.as_deref());

    let filter = EnvFilter::try_from_env("TERMSTORE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(&config.filter));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
