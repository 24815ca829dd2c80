//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use smarttalk_e2e::{FailureMode, ReportFormat, RunConfig};
use std::path::PathBuf;

/// smarttalk-e2e: run the SmartTalk chat end-to-end suite in Chromium
#[derive(Parser, Debug)]
#[command(name = "smarttalk-e2e")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (only failures and the final report)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit log events as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the chat suite against a running app
    Run(RunArgs),

    /// List scenarios and their screenshot checkpoints
    List(ListArgs),

    /// Show the effective run configuration as YAML
    Config(ConfigArgs),
}

/// Where the run configuration comes from
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigSource {
    /// YAML run configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Application origin
    #[arg(long, env = "SMARTTALK_ORIGIN")]
    pub origin: Option<String>,

    /// Screenshot root directory
    #[arg(long, env = "SMARTTALK_ARTIFACTS")]
    pub artifacts: Option<PathBuf>,
}

impl ConfigSource {
    /// Overlay origin and artifact directory onto `config`
    #[must_use]
    pub fn apply(&self, mut config: RunConfig) -> RunConfig {
        if let Some(ref origin) = self.origin {
            config = config.with_origin(origin.clone());
        }
        if let Some(ref dir) = self.artifacts {
            config = config.with_artifacts_dir(dir.clone());
        }
        config
    }
}

/// Arguments for the run command
#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: ConfigSource,

    /// Only run scenarios whose name contains this text (case-insensitive)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Chromium executable
    #[arg(long, env = "CHROMIUM_PATH")]
    pub chromium: Option<String>,

    /// Disable the Chromium sandbox (containers/CI)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Skip remaining scenarios after the first failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Report format printed to stdout
    #[arg(long, default_value = "text")]
    pub format: FormatArg,

    /// Also write the report to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl RunArgs {
    /// Overlay every run flag onto `config`
    #[must_use]
    pub fn apply(&self, config: RunConfig) -> RunConfig {
        let mut config = self.source.apply(config);
        if let Some(ref filter) = self.filter {
            config = config.with_filter(filter.clone());
        }
        if self.fail_fast {
            config = config.with_failure_mode(FailureMode::FailFast);
        }

        let mut browser = config.browser.clone();
        if self.headed {
            browser = browser.with_headless(false);
        }
        if let Some(ref path) = self.chromium {
            browser = browser.with_chromium_path(path.clone());
        }
        if self.no_sandbox {
            browser = browser.with_no_sandbox();
        }
        config.with_browser(browser)
    }
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub source: ConfigSource,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub source: ConfigSource,
}

/// Report format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
    /// `JUnit` XML for CI systems
    Junit,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
            FormatArg::Junit => Self::Junit,
        }
    }
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
