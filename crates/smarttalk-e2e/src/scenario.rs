//! Scenario model: actions, scenarios and suites.

use crate::locator::Selector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// How `AssertText` compares the subject's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMatch {
    /// Whole value must be equal
    #[default]
    Exact,
    /// Value must contain the text
    Contains,
}

impl TextMatch {
    /// Apply the comparison
    #[must_use]
    pub fn matches(self, actual: &str, expected: &str) -> bool {
        match self {
            Self::Exact => actual == expected,
            Self::Contains => actual.contains(expected),
        }
    }
}

/// One step of a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Load a URL (relative paths resolve against the suite origin)
    Navigate {
        /// Target URL or path
        url: String,
    },
    /// Find an element and make it the subject
    Locate {
        /// Element predicate
        selector: Selector,
    },
    /// Type into the subject
    Type {
        /// Text to type
        text: String,
    },
    /// Click the subject
    Click,
    /// Fixed wall-clock pause
    Pause {
        /// Pause length
        #[serde(with = "duration_ms")]
        duration: Duration,
    },
    /// Poll until a match is visible, then make it the subject
    WaitFor {
        /// Element predicate
        selector: Selector,
        /// Bound on the wait
        #[serde(with = "duration_ms")]
        timeout: Duration,
    },
    /// Assert a match is visible, then make it the subject
    AssertVisible {
        /// Element predicate
        selector: Selector,
    },
    /// Assert on the subject's value or text content
    AssertText {
        /// Expected text
        expected: String,
        /// Comparison mode
        #[serde(default)]
        mode: TextMatch,
    },
    /// Assert nothing matches at check time
    AssertAbsent {
        /// Element predicate
        selector: Selector,
    },
    /// Persist a named screenshot
    Screenshot {
        /// Checkpoint name
        name: String,
    },
}

impl Action {
    /// Short action name for step records and logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Navigate { .. } => "navigate",
            Self::Locate { .. } => "locate",
            Self::Type { .. } => "type",
            Self::Click => "click",
            Self::Pause { .. } => "wait",
            Self::WaitFor { .. } => "waitFor",
            Self::AssertVisible { .. } => "assertVisible",
            Self::AssertText { .. } => "assertText",
            Self::AssertAbsent { .. } => "assertAbsent",
            Self::Screenshot { .. } => "captureScreenshot",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigate { url } => write!(f, "navigate({url})"),
            Self::Locate { selector }
            | Self::AssertVisible { selector }
            | Self::AssertAbsent { selector } => write!(f, "{}({selector})", self.name()),
            Self::Type { text } => write!(f, "type({text:?})"),
            Self::Click => f.write_str("click()"),
            Self::Pause { duration } => write!(f, "wait({}ms)", duration.as_millis()),
            Self::WaitFor { selector, timeout } => {
                write!(f, "waitFor({selector}, {}ms)", timeout.as_millis())
            }
            Self::AssertText { expected, mode } => write!(f, "assertText({expected:?}, {mode:?})"),
            Self::Screenshot { name } => write!(f, "captureScreenshot({name})"),
        }
    }
}

/// Serde adapter storing a `Duration` as whole milliseconds
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// An ordered sequence of actions with its own pass/fail outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name
    pub name: String,
    /// Actions in execution order
    pub actions: Vec<Action>,
}

impl Scenario {
    /// Create an empty scenario
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    /// Append an action
    #[must_use]
    pub fn then(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Append `navigate(url)`
    #[must_use]
    pub fn navigate(self, url: impl Into<String>) -> Self {
        self.then(Action::Navigate { url: url.into() })
    }

    /// Append `locate(selector)`
    #[must_use]
    pub fn locate(self, selector: Selector) -> Self {
        self.then(Action::Locate { selector })
    }

    /// Append `type(text)`
    #[must_use]
    pub fn type_text(self, text: impl Into<String>) -> Self {
        self.then(Action::Type { text: text.into() })
    }

    /// Append `click()`
    #[must_use]
    pub fn click(self) -> Self {
        self.then(Action::Click)
    }

    /// Append a fixed pause
    #[must_use]
    pub fn pause(self, duration: Duration) -> Self {
        self.then(Action::Pause { duration })
    }

    /// Append `waitFor(selector, timeout)`
    #[must_use]
    pub fn wait_for(self, selector: Selector, timeout: Duration) -> Self {
        self.then(Action::WaitFor { selector, timeout })
    }

    /// Append `assertVisible(selector)`
    #[must_use]
    pub fn assert_visible(self, selector: Selector) -> Self {
        self.then(Action::AssertVisible { selector })
    }

    /// Append an exact `assertText`
    #[must_use]
    pub fn assert_text(self, expected: impl Into<String>) -> Self {
        self.then(Action::AssertText {
            expected: expected.into(),
            mode: TextMatch::Exact,
        })
    }

    /// Append a substring `assertText`
    #[must_use]
    pub fn assert_text_contains(self, expected: impl Into<String>) -> Self {
        self.then(Action::AssertText {
            expected: expected.into(),
            mode: TextMatch::Contains,
        })
    }

    /// Append `assertAbsent(selector)`
    #[must_use]
    pub fn assert_absent(self, selector: Selector) -> Self {
        self.then(Action::AssertAbsent { selector })
    }

    /// Append `captureScreenshot(name)`
    #[must_use]
    pub fn screenshot(self, name: impl Into<String>) -> Self {
        self.then(Action::Screenshot { name: name.into() })
    }

    /// Screenshot checkpoint names in order
    #[must_use]
    pub fn checkpoints(&self) -> Vec<&str> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::Screenshot { name } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Named collection of scenarios sharing an origin and a before-each hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suite {
    /// Suite name
    pub name: String,
    /// Base URL of the application under test
    pub origin: String,
    /// Actions run before every scenario
    pub before_each: Vec<Action>,
    /// Scenarios in execution order
    pub scenarios: Vec<Scenario>,
}

impl Suite {
    /// Create an empty suite
    #[must_use]
    pub fn new(name: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: origin.into(),
            before_each: Vec::new(),
            scenarios: Vec::new(),
        }
    }

    /// Add a before-each action
    #[must_use]
    pub fn before_each(mut self, action: Action) -> Self {
        self.before_each.push(action);
        self
    }

    /// Add a scenario
    #[must_use]
    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Keep only scenarios whose name contains `filter` (case-insensitive)
    #[must_use]
    pub fn filtered(mut self, filter: &str) -> Self {
        let needle = filter.to_lowercase();
        self.scenarios
            .retain(|s| s.name.to_lowercase().contains(&needle));
        self
    }

    /// Resolve a navigation target against the origin
    #[must_use]
    pub fn resolve_url(&self, url: &str) -> String {
        if url.contains("://") {
            url.to_string()
        } else if url.is_empty() || url == "/" {
            self.origin.clone()
        } else {
            format!(
                "{}/{}",
                self.origin.trim_end_matches('/'),
                url.trim_start_matches('/')
            )
        }
    }
}

/// Scenario lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    /// Not started yet
    Pending,
    /// Executing actions
    Running,
    /// Every action succeeded
    Passed,
    /// An action failed
    Failed,
    /// Not run because an earlier scenario failed under fail-fast
    Skipped,
}

impl ScenarioStatus {
    /// Whether the scenario reached a final state
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Skipped)
    }
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}
