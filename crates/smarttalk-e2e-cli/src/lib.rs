//! SmartTalk E2E CLI library
//!
//! Command-line front end for the SmartTalk chat suite: argument parsing,
//! logging setup, progress output and the subcommand handlers.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, ConfigSource, FormatArg, ListArgs, RunArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
