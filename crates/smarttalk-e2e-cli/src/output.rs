//! Progress reporting on stderr

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use smarttalk_e2e::{
    RunObserver, ScenarioReport, ScenarioStatus, ScreenshotWriteWarning, StepRecord, SuiteReport,
};
use std::time::Duration;

/// Progress reporter for suite execution
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    spinner: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
    /// Print every finished action
    pub show_steps: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            spinner: None,
            use_color,
            quiet,
            show_steps: false,
        }
    }

    /// Print each action as it finishes
    #[must_use]
    pub const fn with_steps(mut self, show_steps: bool) -> Self {
        self.show_steps = show_steps;
        self
    }

    fn start_spinner(&mut self, message: String) {
        if self.quiet {
            return;
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn line(&self, prefix: &str, message: &str) {
        let text = format!("{prefix} {message}");
        match self.spinner {
            Some(ref spinner) => spinner.suspend(|| {
                let _ = self.term.write_line(&text);
            }),
            None => {
                let _ = self.term.write_line(&text);
            }
        }
    }

    fn prefix(&self, symbol: &str, plain: &str, color: fn(&str) -> String) -> String {
        if self.use_color {
            color(symbol)
        } else {
            plain.to_string()
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("✓", "PASS", |s| style(s).green().bold().to_string());
        self.line(&prefix, message);
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Failures are printed even in quiet mode
        let prefix = self.prefix("✗", "FAIL", |s| style(s).red().bold().to_string());
        self.line(&prefix, message);
    }

    /// Print a skipped message
    pub fn skipped(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("-", "SKIP", |s| style(s).yellow().to_string());
        self.line(&prefix, message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("⚠", "WARN", |s| style(s).yellow().bold().to_string());
        self.line(&prefix, message);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("ℹ", "INFO", |s| style(s).blue().bold().to_string());
        self.line(&prefix, message);
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Print the closing summary line
    pub fn summary(&self, report: &SuiteReport) {
        let failed = report.failed_count();
        if self.quiet && failed == 0 {
            return;
        }

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&self.summary_line(report));
    }

    /// Render the summary line without writing it
    #[must_use]
    pub fn summary_line(&self, report: &SuiteReport) -> String {
        let passed = report.passed_count();
        let failed = report.failed_count();
        let skipped = report.skipped_count();
        let total = report.total_count();
        let secs = report.total_duration().as_secs_f64();

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let skipped_style = Style::new().yellow();

            let status = if failed > 0 {
                failed_style.apply_to("FAILED")
            } else {
                passed_style.apply_to("PASSED")
            };

            format!(
                "{status} {total} scenarios in {secs:.2}s ({} passed, {} failed, {} skipped)",
                passed_style.apply_to(passed),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
                skipped_style.apply_to(skipped)
            )
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            format!(
                "{status} {total} scenarios in {secs:.2}s ({passed} passed, {failed} failed, {skipped} skipped)"
            )
        }
    }
}

impl RunObserver for ProgressReporter {
    fn scenario_started(&mut self, index: usize, total: usize, name: &str) {
        self.start_spinner(format!("[{}/{total}] {name}", index + 1));
    }

    fn step_finished(&mut self, step: &StepRecord) {
        if !self.show_steps {
            return;
        }
        let message = format!("  {} ({}ms)", step.action, step.duration.as_millis());
        if step.ok {
            self.info(&message);
        } else {
            self.failure(&message);
        }
    }

    fn warning(&mut self, warning: &ScreenshotWriteWarning) {
        ProgressReporter::warning(self, &warning.to_string());
    }

    fn scenario_finished(&mut self, report: &ScenarioReport) {
        self.stop_spinner();
        let secs = report.duration.as_secs_f64();
        match report.status {
            ScenarioStatus::Passed => {
                self.success(&format!("{} ({secs:.2}s)", report.name));
                for path in &report.screenshots {
                    self.info(&format!("  screenshot {}", path.display()));
                }
            }
            ScenarioStatus::Failed => {
                self.failure(&format!("{} ({secs:.2}s)", report.name));
                if let Some(ref failure) = report.failure {
                    self.failure(&format!("  {}: {}", failure.action, failure.message));
                }
            }
            _ => self.skipped(&report.name),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use smarttalk_e2e::{FailureInfo, FailureKind};

    fn report() -> SuiteReport {
        let mut report = SuiteReport::new("Chat", "http://localhost:3000");
        let mut passed = ScenarioReport::new("first");
        passed.status = ScenarioStatus::Passed;
        let mut failed = ScenarioReport::new("second");
        failed.status = ScenarioStatus::Failed;
        failed.failure = Some(FailureInfo {
            kind: FailureKind::Assertion,
            message: "not visible".into(),
            action: "assertVisible(text \"Chat Grupal\")".into(),
        });
        report.scenarios.push(passed);
        report.scenarios.push(failed);
        report.scenarios.push(ScenarioReport::skipped("third"));
        report
    }

    mod summary_tests {
        use super::*;

        #[test]
        fn test_plain_summary() {
            let reporter = ProgressReporter::new(false, false);
            let line = reporter.summary_line(&report());
            assert!(line.starts_with("FAILED 3 scenarios"));
            assert!(line.contains("(1 passed, 1 failed, 1 skipped)"));
        }

        #[test]
        fn test_all_passed_summary() {
            let reporter = ProgressReporter::new(false, false);
            let mut report = report();
            report.scenarios.truncate(1);
            assert!(reporter.summary_line(&report).starts_with("PASSED 1 scenarios"));
        }
    }

    mod observer_tests {
        use super::*;

        #[test]
        fn test_quiet_never_starts_spinner() {
            let mut reporter = ProgressReporter::new(false, true);
            reporter.scenario_started(0, 3, "first");
            assert!(reporter.spinner.is_none());
        }

        #[test]
        fn test_spinner_cleared_on_finish() {
            let mut reporter = ProgressReporter::new(false, false);
            reporter.scenario_started(0, 1, "first");
            assert!(reporter.spinner.is_some());
            reporter.scenario_finished(&report().scenarios[1]);
            assert!(reporter.spinner.is_none());
        }

        #[test]
        fn test_builder() {
            let reporter = ProgressReporter::default().with_steps(true);
            assert!(reporter.show_steps);
            assert!(reporter.use_color);
        }
    }
}
