//! `tracing` subscriber setup

use crate::config::CliConfig;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid
#[must_use]
pub fn log_filter(config: &CliConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.default_log_filter()))
}

/// Install the global subscriber, writing to stderr so stdout stays parseable
pub fn init_logging(config: &CliConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(log_filter(config))
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if config.log_json {
        builder.json().try_init()
    } else {
        builder.with_ansi(config.color.should_color()).try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
