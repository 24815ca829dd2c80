//! Per-scenario pass/fail reporting.
//!
//! ```text
//! ┌──────────────────┐   ┌────────────────────┐   ┌───────────────────┐
//! │ ScenarioRunner   │──►│ SuiteReport        │──►│ summary / JSON /  │
//! │ (one per suite)  │   │  ScenarioReport[]  │   │ JUnit XML         │
//! └──────────────────┘   └────────────────────┘   └───────────────────┘
//! ```

use crate::result::{E2eResult, FailureKind, ScreenshotWriteWarning};
use crate::scenario::ScenarioStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What the runner does after a scenario fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Run every scenario regardless of earlier failures
    #[default]
    CollectAll,
    /// Stop after the first failed scenario; the rest are skipped
    FailFast,
}

/// Timing and outcome of one executed action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Action description
    pub action: String,
    /// Time taken
    #[serde(with = "crate::scenario::duration_ms")]
    pub duration: Duration,
    /// Whether the action succeeded
    pub ok: bool,
}

/// Failure details for a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureInfo {
    /// Failure class
    pub kind: FailureKind,
    /// Human-readable message
    pub message: String,
    /// Action that failed
    pub action: String,
}

/// Outcome of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario name
    pub name: String,
    /// Final status
    pub status: ScenarioStatus,
    /// Wall time
    #[serde(with = "crate::scenario::duration_ms")]
    pub duration: Duration,
    /// Executed steps, before-each included
    pub steps: Vec<StepRecord>,
    /// Failure details when `status` is `Failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureInfo>,
    /// Screenshot files written
    #[serde(default)]
    pub screenshots: Vec<PathBuf>,
    /// Screenshot warnings
    #[serde(default)]
    pub warnings: Vec<ScreenshotWriteWarning>,
}

impl ScenarioReport {
    /// Report for a scenario that has not run
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ScenarioStatus::Pending,
            duration: Duration::ZERO,
            steps: Vec::new(),
            failure: None,
            screenshots: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Report for a scenario skipped by fail-fast
    #[must_use]
    pub fn skipped(name: impl Into<String>) -> Self {
        Self {
            status: ScenarioStatus::Skipped,
            ..Self::new(name)
        }
    }

    /// Whether the scenario passed
    #[must_use]
    pub fn is_passed(&self) -> bool {
        self.status == ScenarioStatus::Passed
    }

    /// Whether the scenario failed
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.status == ScenarioStatus::Failed
    }
}

/// Outcome of a whole suite run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Suite name
    pub suite_name: String,
    /// Origin the suite ran against
    pub origin: String,
    /// Run start time
    pub started_at: DateTime<Utc>,
    /// Scenario reports in execution order
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    /// Create an empty report stamped with the current time
    #[must_use]
    pub fn new(suite_name: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            suite_name: suite_name.into(),
            origin: origin.into(),
            started_at: Utc::now(),
            scenarios: Vec::new(),
        }
    }

    /// Get number of passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.scenarios.iter().filter(|s| s.is_passed()).count()
    }

    /// Get number of failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.scenarios.iter().filter(|s| s.is_failed()).count()
    }

    /// Get number of skipped scenarios
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.scenarios
            .iter()
            .filter(|s| s.status == ScenarioStatus::Skipped)
            .count()
    }

    /// Get total scenario count
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.scenarios.len()
    }

    /// Get pass rate (0.0 to 1.0)
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        if self.scenarios.is_empty() {
            return 1.0;
        }
        self.passed_count() as f64 / self.scenarios.len() as f64
    }

    /// True when nothing failed or was skipped
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0 && self.skipped_count() == 0
    }

    /// Get total duration
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.scenarios.iter().map(|s| s.duration).sum()
    }

    /// Every screenshot warning across scenarios
    pub fn warnings(&self) -> impl Iterator<Item = &ScreenshotWriteWarning> {
        self.scenarios.iter().flat_map(|s| s.warnings.iter())
    }

    /// Generate summary string
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {}/{} passed ({:.1}%)",
            self.suite_name,
            self.passed_count(),
            self.total_count(),
            self.pass_rate() * 100.0
        )
    }

    /// Render a plain-text report, one line per scenario
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for scenario in &self.scenarios {
            let mark = match scenario.status {
                ScenarioStatus::Passed => "PASS",
                ScenarioStatus::Failed => "FAIL",
                ScenarioStatus::Skipped => "SKIP",
                ScenarioStatus::Pending | ScenarioStatus::Running => "----",
            };
            out.push_str(&format!(
                "{mark} {} ({} ms)\n",
                scenario.name,
                scenario.duration.as_millis()
            ));
            if let Some(failure) = &scenario.failure {
                out.push_str(&format!(
                    "     {} at {}: {}\n",
                    failure.kind, failure.action, failure.message
                ));
            }
            for path in &scenario.screenshots {
                out.push_str(&format!("     screenshot {}\n", path.display()));
            }
            for warning in &scenario.warnings {
                out.push_str(&format!("     warning: {warning}\n"));
            }
        }
        out.push_str(&self.summary());
        out.push('\n');
        out
    }

    /// Render as pretty JSON
    pub fn render_json(&self) -> E2eResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render JUnit XML content
    #[must_use]
    pub fn render_junit(&self) -> String {
        let mut xml = String::new();

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(
            r#"<testsuite name="{}" tests="{}" failures="{}" skipped="{}" time="{:.3}" timestamp="{}">"#,
            escape_xml(&self.suite_name),
            self.total_count(),
            self.failed_count(),
            self.skipped_count(),
            self.total_duration().as_secs_f64(),
            self.started_at.format("%Y-%m-%dT%H:%M:%S")
        ));
        xml.push('\n');

        for scenario in &self.scenarios {
            xml.push_str(&format!(
                r#"  <testcase name="{}" classname="{}" time="{:.3}">"#,
                escape_xml(&scenario.name),
                escape_xml(&self.suite_name),
                scenario.duration.as_secs_f64()
            ));
            xml.push('\n');

            if let Some(failure) = &scenario.failure {
                xml.push_str(&format!(
                    r#"    <failure type="{}" message="{}">{}</failure>"#,
                    failure.kind,
                    escape_xml(&failure.message),
                    escape_xml(&format!("{}: {}", failure.action, failure.message))
                ));
                xml.push('\n');
            }
            if scenario.status == ScenarioStatus::Skipped {
                xml.push_str("    <skipped/>\n");
            }
            if !scenario.warnings.is_empty() {
                let warnings: Vec<String> =
                    scenario.warnings.iter().map(ToString::to_string).collect();
                xml.push_str(&format!(
                    "    <system-err>{}</system-err>\n",
                    escape_xml(&warnings.join("\n"))
                ));
            }

            xml.push_str("  </testcase>\n");
        }

        xml.push_str("</testsuite>\n");
        xml
    }

    /// Write the report to `path` in the given format
    pub fn write_to(&self, path: &Path, format: ReportFormat) -> E2eResult<()> {
        let body = match format {
            ReportFormat::Text => self.render_text(),
            ReportFormat::Json => self.render_json()?,
            ReportFormat::Junit => self.render_junit(),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, body)?;
        Ok(())
    }
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
    /// JUnit XML
    Junit,
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
