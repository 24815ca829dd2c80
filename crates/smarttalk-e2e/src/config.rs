//! Run configuration.
//!
//! Every field has a default, so a YAML file only needs the keys it changes:
//!
//! ```yaml
//! origin: http://localhost:3000
//! artifacts_dir: artifacts/screenshots
//! implicit_wait_ms: 4000
//! browser:
//!   headless: true
//! ```

use crate::artifacts::DEFAULT_ARTIFACTS_DIR;
use crate::browser::BrowserConfig;
use crate::reporter::FailureMode;
use crate::result::{E2eError, E2eResult};
use crate::wait::{
    WaitOptions, DEFAULT_IMPLICIT_WAIT_MS, DEFAULT_NAVIGATION_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_SETTLE_TIMEOUT_MS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default application origin
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Configuration for one suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Application origin
    pub origin: String,
    /// Screenshot root directory
    pub artifacts_dir: PathBuf,
    /// Implicit wait for locate/assert actions
    pub implicit_wait_ms: u64,
    /// Poll interval for all waits
    pub poll_interval_ms: u64,
    /// Timeout for settle waits
    pub settle_timeout_ms: u64,
    /// Navigation timeout
    pub navigation_timeout_ms: u64,
    /// Behaviour after a failed scenario
    pub failure_mode: FailureMode,
    /// Case-insensitive scenario name filter
    pub filter: Option<String>,
    /// Browser launch settings
    pub browser: BrowserConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            implicit_wait_ms: DEFAULT_IMPLICIT_WAIT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            settle_timeout_ms: DEFAULT_SETTLE_TIMEOUT_MS,
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            failure_mode: FailureMode::default(),
            filter: None,
            browser: BrowserConfig::default(),
        }
    }
}

impl RunConfig {
    /// Create a config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a YAML file
    pub fn from_yaml_file(path: &Path) -> E2eResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| E2eError::Config {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded run config");
        Ok(config)
    }

    /// Parse from YAML text
    pub fn from_yaml_str(text: &str) -> E2eResult<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> E2eResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check invariants that serde cannot express
    pub fn validate(&self) -> E2eResult<()> {
        if !(self.origin.starts_with("http://") || self.origin.starts_with("https://")) {
            return Err(E2eError::Config {
                message: format!("origin must be an http(s) URL, got {:?}", self.origin),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(E2eError::Config {
                message: "poll_interval_ms must be greater than zero".to_string(),
            });
        }
        if self.navigation_timeout_ms == 0 {
            return Err(E2eError::Config {
                message: "navigation_timeout_ms must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Set origin
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Set artifact directory
    #[must_use]
    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = dir.into();
        self
    }

    /// Set implicit wait in milliseconds
    #[must_use]
    pub const fn with_implicit_wait(mut self, ms: u64) -> Self {
        self.implicit_wait_ms = ms;
        self
    }

    /// Set settle timeout in milliseconds
    #[must_use]
    pub const fn with_settle_timeout(mut self, ms: u64) -> Self {
        self.settle_timeout_ms = ms;
        self
    }

    /// Set navigation timeout in milliseconds
    #[must_use]
    pub const fn with_navigation_timeout(mut self, ms: u64) -> Self {
        self.navigation_timeout_ms = ms;
        self
    }

    /// Set failure mode
    #[must_use]
    pub const fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    /// Set scenario filter
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Set browser settings
    #[must_use]
    pub fn with_browser(mut self, browser: BrowserConfig) -> Self {
        self.browser = browser;
        self
    }

    /// Options for locate/assert polling
    #[must_use]
    pub const fn implicit_wait(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.implicit_wait_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    /// Settle timeout as duration
    #[must_use]
    pub const fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }

    /// Navigation timeout as duration
    #[must_use]
    pub const fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.origin, "http://localhost:3000");
        assert_eq!(config.implicit_wait().timeout_ms, 4_000);
        assert_eq!(config.navigation_timeout(), Duration::from_secs(60));
        assert_eq!(config.failure_mode, FailureMode::CollectAll);
        assert!(config.browser.headless);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = RunConfig::from_yaml_str(
            "origin: http://127.0.0.1:8080\nfailure_mode: fail_fast\nbrowser:\n  headless: false\n",
        )
        .unwrap();
        assert_eq!(config.origin, "http://127.0.0.1:8080");
        assert_eq!(config.failure_mode, FailureMode::FailFast);
        assert!(!config.browser.headless);
        assert_eq!(config.settle_timeout_ms, 10_000);
        assert_eq!(config.browser.viewport_width, 1000);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = RunConfig::new()
            .with_origin("http://localhost:4000")
            .with_filter("chat")
            .with_implicit_wait(100);
        let yaml = config.to_yaml().unwrap();
        assert_eq!(RunConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn test_invalid_origin() {
        let err = RunConfig::from_yaml_str("origin: localhost:3000\n").unwrap_err();
        assert!(matches!(err, E2eError::Config { .. }));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let config = RunConfig {
            poll_interval_ms: 0,
            ..RunConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_yaml() {
        let err = RunConfig::from_yaml_str("origin: [").unwrap_err();
        assert!(matches!(err, E2eError::Yaml(_)));
    }

    #[test]
    fn test_from_missing_file() {
        let err = RunConfig::from_yaml_file(Path::new("/nonexistent/run.yaml")).unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }

    #[test]
    fn test_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("run.yaml");
        std::fs::write(&path, "artifacts_dir: out/shots\n").unwrap();
        let config = RunConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.artifacts_dir, PathBuf::from("out/shots"));
    }
}
