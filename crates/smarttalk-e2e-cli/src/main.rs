//! SmartTalk E2E CLI: run the chat suite against a local app
//!
//! ## Usage
//!
//! ```bash
//! smarttalk-e2e run                          # Run all scenarios headless
//! smarttalk-e2e run --headed --filter chat   # Watch a subset run
//! smarttalk-e2e run --format junit --report target/e2e.xml
//! smarttalk-e2e list                         # Scenarios and checkpoints
//! smarttalk-e2e config                       # Effective configuration
//! ```

use clap::Parser;
use smarttalk_e2e_cli::{
    handlers, logging, Cli, CliConfig, CliResult, ColorChoice, Commands, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    logging::init_logging(&config);

    match cli.command {
        Commands::Run(ref args) => handlers::run_suite(&config, args),
        Commands::List(ref args) => handlers::list_scenarios(args),
        Commands::Config(ref args) => handlers::show_config(args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.clone().into();

    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
        .with_log_json(cli.log_json)
}
