//! Subcommand handlers

use crate::commands::{ConfigArgs, ConfigSource, ListArgs, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use smarttalk_e2e::{
    smarttalk, BrowserDriver, ReportFormat, RunConfig, RunObserver, ScenarioRunner, Suite,
    SuiteReport,
};

/// Load the YAML file (if any), overlay flags, and validate
pub fn load_run_config(source: &ConfigSource) -> CliResult<RunConfig> {
    let base = match source.config {
        Some(ref path) => RunConfig::from_yaml_file(path)?,
        None => RunConfig::default(),
    };
    let config = source.apply(base);
    config.validate()?;
    Ok(config)
}

/// Run the suite with a driver and close it afterwards
pub async fn execute<D: BrowserDriver>(
    driver: D,
    config: &RunConfig,
    suite: &Suite,
    observer: &mut dyn RunObserver,
) -> SuiteReport {
    let mut runner = ScenarioRunner::new(driver, config.clone());
    let report = runner.run_suite_with(suite, observer).await;
    if let Err(e) = runner.close().await {
        tracing::warn!(error = %e, "browser did not close cleanly");
    }
    report
}

#[cfg(feature = "browser")]
async fn execute_in_chromium(
    config: &RunConfig,
    suite: &Suite,
    observer: &mut dyn RunObserver,
) -> CliResult<SuiteReport> {
    let driver = smarttalk_e2e::ChromiumDriver::launch(&config.browser).await?;
    Ok(execute(driver, config, suite, observer).await)
}

#[cfg(not(feature = "browser"))]
async fn execute_in_chromium(
    _config: &RunConfig,
    _suite: &Suite,
    _observer: &mut dyn RunObserver,
) -> CliResult<SuiteReport> {
    Err(CliError::config(
        "browser support not enabled. Rebuild with --features browser",
    ))
}

/// Render the report in the requested format
pub fn render_report(report: &SuiteReport, format: ReportFormat) -> CliResult<String> {
    Ok(match format {
        ReportFormat::Text => report.render_text(),
        ReportFormat::Json => report.render_json()?,
        ReportFormat::Junit => report.render_junit(),
    })
}

/// Map the report onto the process outcome
pub fn check_outcome(report: &SuiteReport) -> CliResult<()> {
    let failed = report.failed_count();
    let skipped = report.skipped_count();
    if failed == 0 && skipped == 0 {
        Ok(())
    } else {
        Err(CliError::ScenariosFailed {
            failed,
            skipped,
            total: report.total_count(),
        })
    }
}

/// `run`
pub fn run_suite(cli: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let config = args.apply(load_run_config(&args.source)?);
    config.validate()?;

    let suite = smarttalk::suite(&config);
    if let Some(ref filter) = config.filter {
        if suite.clone().filtered(filter).scenarios.is_empty() {
            return Err(CliError::invalid_argument(format!(
                "no scenario matches filter {filter:?}"
            )));
        }
    }

    let mut reporter = ProgressReporter::new(cli.color.should_color(), cli.verbosity.is_quiet())
        .with_steps(cli.verbosity.is_verbose());
    reporter.header(&suite.name);
    reporter.info(&format!("origin {}", config.origin));

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(execute_in_chromium(&config, &suite, &mut reporter))?;
    reporter.summary(&report);

    let format = ReportFormat::from(args.format);
    println!("{}", render_report(&report, format)?);
    if let Some(ref path) = args.report {
        report.write_to(path, format)?;
        reporter.info(&format!("report written to {}", path.display()));
    }

    check_outcome(&report)
}

/// Scenario names with their screenshot checkpoints
#[must_use]
pub fn render_listing(suite: &Suite) -> String {
    let mut out = format!("{} ({})\n", suite.name, suite.origin);
    for (index, scenario) in suite.scenarios.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", index + 1, scenario.name));
        for checkpoint in scenario.checkpoints() {
            out.push_str(&format!("     - {checkpoint}.png\n"));
        }
    }
    out
}

/// `list`
pub fn list_scenarios(args: &ListArgs) -> CliResult<()> {
    let config = load_run_config(&args.source)?;
    print!("{}", render_listing(&smarttalk::suite(&config)));
    Ok(())
}

/// `config`
pub fn show_config(args: &ConfigArgs) -> CliResult<()> {
    let config = load_run_config(&args.source)?;
    print!("{}", config.to_yaml()?);
    Ok(())
}
