//! Result and error types for the scenario runner.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for runner operations
pub type E2eResult<T> = Result<T, E2eError>;

/// Errors that can occur while driving a scenario
#[derive(Debug, Error)]
pub enum E2eError {
    /// Navigation did not complete within the navigation timeout
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// No element matched the selector within the wait window
    #[error("Element not found: {selector} (waited {waited_ms}ms)")]
    ElementNotFound {
        /// Human-readable selector description
        selector: String,
        /// Time spent waiting in milliseconds
        waited_ms: u64,
    },

    /// The subject element could not be acted on (stale, hidden, disabled)
    #[error("Interaction failed: {message}")]
    Interaction {
        /// Error message
        message: String,
    },

    /// An assertion did not hold at check time
    #[error("Assertion failed: {message}")]
    Assertion {
        /// Error message
        message: String,
    },

    /// Browser executable could not be launched
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Backend driver failure not covered by the other variants
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl E2eError {
    /// Create an interaction error
    #[must_use]
    pub fn interaction(message: impl Into<String>) -> Self {
        Self::Interaction {
            message: message.into(),
        }
    }

    /// Create an assertion error
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }

    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Classify this error for scenario reports
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Navigation { .. } => FailureKind::Navigation,
            Self::ElementNotFound { .. } => FailureKind::ElementNotFound,
            Self::Interaction { .. } => FailureKind::Interaction,
            Self::Assertion { .. } => FailureKind::Assertion,
            Self::BrowserLaunch { .. }
            | Self::Driver { .. }
            | Self::Config { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Yaml(_) => FailureKind::Harness,
        }
    }
}

/// Scenario-aborting failure classes as they appear in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// `NavigationError`
    Navigation,
    /// `ElementNotFoundError`
    ElementNotFound,
    /// `InteractionError`
    Interaction,
    /// `AssertionError`
    Assertion,
    /// Browser or environment failure outside the scenario's control
    Harness,
}

impl FailureKind {
    /// Name used in reports
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Navigation => "NavigationError",
            Self::ElementNotFound => "ElementNotFoundError",
            Self::Interaction => "InteractionError",
            Self::Assertion => "AssertionError",
            Self::Harness => "HarnessError",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-fatal warning raised when a screenshot could not be captured or written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotWriteWarning {
    /// Checkpoint name
    pub name: String,
    /// Target path, when one was computed
    pub path: Option<PathBuf>,
    /// Underlying cause
    pub message: String,
}

impl std::fmt::Display for ScreenshotWriteWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(
                f,
                "screenshot '{}' not written to {}: {}",
                self.name,
                path.display(),
                self.message
            ),
            None => write!(f, "screenshot '{}' not captured: {}", self.name, self.message),
        }
    }
}
