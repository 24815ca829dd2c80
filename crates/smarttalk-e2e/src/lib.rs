//! SmartTalk E2E: browser scenario runner for the SmartTalk chat app.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │   ┌────────────┐    ┌────────────┐    ┌────────────────────┐    │
//! │   │ Suite      │    │ Scenario   │    │ BrowserDriver      │    │
//! │   │ (actions,  │───►│ Runner     │───►│  ChromiumDriver    │    │
//! │   │ selectors) │    │ (wait/poll)│    │  MockDriver        │    │
//! │   └────────────┘    └─────┬──────┘    └────────────────────┘    │
//! │                           │                                     │
//! │               ┌───────────┴───────────┐                         │
//! │               ▼                       ▼                         │
//! │        ┌────────────┐          ┌────────────┐                   │
//! │        │ Artifact   │          │ Suite      │                   │
//! │        │ Store      │          │ Report     │                   │
//! │        └────────────┘          └────────────┘                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use smarttalk_e2e::{smarttalk, MockDriver, RunConfig, ScenarioRunner};
//!
//! # async fn demo() {
//! let config = RunConfig::default();
//! let mut runner = ScenarioRunner::new(MockDriver::new(), config.clone());
//! let report = runner.run_suite(&smarttalk::suite(&config)).await;
//! println!("{}", report.summary());
//! # }
//! ```

#![warn(missing_docs)]

mod artifacts;
mod browser;
mod config;
mod driver;
mod locator;
mod reporter;
mod result;
mod runner;
mod scenario;
mod wait;

pub mod smarttalk;

pub use artifacts::{sanitize_name, slugify, ArtifactStore, DEFAULT_ARTIFACTS_DIR};
#[cfg(feature = "browser")]
pub use browser::ChromiumDriver;
pub use browser::BrowserConfig;
pub use config::{RunConfig, DEFAULT_ORIGIN};
pub use driver::{
    BoundingBox, BrowserDriver, ElementHandle, MockDriver, MockEffect, MockElement, MockPage,
    SelectorEngine,
};
pub use locator::{handle_css, resolve_handle_js, Selector, HANDLE_ATTRIBUTE};
pub use reporter::{
    FailureInfo, FailureMode, ReportFormat, ScenarioReport, StepRecord, SuiteReport,
};
pub use result::{E2eError, E2eResult, FailureKind, ScreenshotWriteWarning};
pub use runner::{NoopObserver, RunObserver, ScenarioRunner};
pub use scenario::{Action, Scenario, ScenarioStatus, Suite, TextMatch};
pub use wait::{
    PollClock, WaitOptions, Waiter, DEFAULT_IMPLICIT_WAIT_MS,
    DEFAULT_NAVIGATION_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SETTLE_TIMEOUT_MS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        Action, BrowserDriver, E2eError, E2eResult, FailureMode, RunConfig, Scenario,
        ScenarioRunner, Selector, SelectorEngine, Suite, SuiteReport,
    };
}
