//! Scenario execution.
//!
//! Scenarios run one after another against a single driver. Each scenario
//! runs the suite's before-each actions, then its own actions in order; the
//! first failing action aborts the scenario and the runner moves on.

use crate::artifacts::ArtifactStore;
use crate::config::RunConfig;
use crate::driver::{BrowserDriver, ElementHandle};
use crate::locator::Selector;
use crate::reporter::{FailureInfo, FailureMode, ScenarioReport, StepRecord, SuiteReport};
use crate::result::{E2eError, E2eResult, ScreenshotWriteWarning};
use crate::scenario::{Action, Scenario, ScenarioStatus, Suite, TextMatch};
use crate::wait::{WaitOptions, Waiter};
use std::time::Instant;

/// Progress callbacks for a suite run
pub trait RunObserver: Send {
    /// A scenario is about to run
    fn scenario_started(&mut self, _index: usize, _total: usize, _name: &str) {}

    /// An action finished (successfully or not)
    fn step_finished(&mut self, _step: &StepRecord) {}

    /// A screenshot could not be captured or written
    fn warning(&mut self, _warning: &ScreenshotWriteWarning) {}

    /// A scenario reached a final state
    fn scenario_finished(&mut self, _report: &ScenarioReport) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Per-scenario mutable state
#[derive(Debug)]
struct ScenarioState {
    subject: Option<ElementHandle>,
    report: ScenarioReport,
}

/// Runs suites against a [`BrowserDriver`]
#[derive(Debug)]
pub struct ScenarioRunner<D: BrowserDriver> {
    driver: D,
    config: RunConfig,
}

impl<D: BrowserDriver> ScenarioRunner<D> {
    /// Create a runner
    #[must_use]
    pub fn new(driver: D, config: RunConfig) -> Self {
        Self { driver, config }
    }

    /// Run configuration
    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Borrow the driver
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Take the driver back
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Run a suite without progress callbacks
    pub async fn run_suite(&mut self, suite: &Suite) -> SuiteReport {
        self.run_suite_with(suite, &mut NoopObserver).await
    }

    /// Run a suite, reporting progress to `observer`
    pub async fn run_suite_with(
        &mut self,
        suite: &Suite,
        observer: &mut dyn RunObserver,
    ) -> SuiteReport {
        let suite = match &self.config.filter {
            Some(filter) => suite.clone().filtered(filter),
            None => suite.clone(),
        };
        let store = ArtifactStore::new(&self.config.artifacts_dir, &suite.name);
        let mut report = SuiteReport::new(&suite.name, &suite.origin);
        let total = suite.scenarios.len();

        tracing::info!(
            suite = %suite.name,
            origin = %suite.origin,
            scenarios = total,
            artifacts = %store.dir().display(),
            "starting suite"
        );

        let mut stopped = false;
        for (index, scenario) in suite.scenarios.iter().enumerate() {
            if stopped {
                let skipped = ScenarioReport::skipped(&scenario.name);
                observer.scenario_finished(&skipped);
                report.scenarios.push(skipped);
                continue;
            }

            observer.scenario_started(index, total, &scenario.name);
            let result = self.run_scenario(&suite, scenario, &store, observer).await;
            observer.scenario_finished(&result);

            if result.is_failed() && self.config.failure_mode == FailureMode::FailFast {
                tracing::warn!(scenario = %scenario.name, "fail-fast: skipping remaining scenarios");
                stopped = true;
            }
            report.scenarios.push(result);
        }

        tracing::info!(summary = %report.summary(), "suite finished");
        report
    }

    /// Run one scenario: before-each actions, then the scenario's own
    pub async fn run_scenario(
        &mut self,
        suite: &Suite,
        scenario: &Scenario,
        store: &ArtifactStore,
        observer: &mut dyn RunObserver,
    ) -> ScenarioReport {
        let started = Instant::now();
        let mut state = ScenarioState {
            subject: None,
            report: ScenarioReport::new(&scenario.name),
        };
        state.report.status = ScenarioStatus::Running;
        tracing::info!(scenario = %scenario.name, "scenario started");

        for action in suite.before_each.iter().chain(&scenario.actions) {
            let step_started = Instant::now();
            let outcome = self.execute(suite, store, &mut state, action, observer).await;
            let step = StepRecord {
                action: action.to_string(),
                duration: step_started.elapsed(),
                ok: outcome.is_ok(),
            };
            observer.step_finished(&step);
            state.report.steps.push(step);

            if let Err(err) = outcome {
                tracing::warn!(
                    scenario = %scenario.name,
                    action = %action,
                    kind = %err.kind(),
                    error = %err,
                    "scenario failed"
                );
                state.report.failure = Some(FailureInfo {
                    kind: err.kind(),
                    message: err.to_string(),
                    action: action.to_string(),
                });
                state.report.status = ScenarioStatus::Failed;
                break;
            }
        }

        if !state.report.status.is_terminal() {
            state.report.status = ScenarioStatus::Passed;
            tracing::info!(scenario = %scenario.name, "scenario passed");
        }
        state.report.duration = started.elapsed();
        state.report
    }

    async fn execute(
        &mut self,
        suite: &Suite,
        store: &ArtifactStore,
        state: &mut ScenarioState,
        action: &Action,
        observer: &mut dyn RunObserver,
    ) -> E2eResult<()> {
        tracing::debug!(action = %action, "executing");
        match action {
            Action::Navigate { url } => {
                let url = suite.resolve_url(url);
                self.navigate(&url).await?;
                state.subject = None;
            }
            Action::Locate { selector } => {
                let handle = self
                    .poll_for(selector, self.config.implicit_wait(), false)
                    .await?;
                state.subject = Some(handle);
            }
            Action::Type { text } => {
                let handle = self.actionable_subject(state.subject.as_ref()).await?;
                self.driver.type_text(&handle, text).await?;
                state.subject = Some(handle);
            }
            Action::Click => {
                let handle = self.actionable_subject(state.subject.as_ref()).await?;
                self.driver.click(&handle).await?;
                state.subject = Some(handle);
            }
            Action::Pause { duration } => {
                tokio::time::sleep(*duration).await;
            }
            Action::WaitFor { selector, timeout } => {
                let options = WaitOptions::new()
                    .with_timeout(timeout.as_millis() as u64)
                    .with_poll_interval(self.config.poll_interval_ms);
                let handle = self.poll_for(selector, options, true).await?;
                state.subject = Some(handle);
            }
            Action::AssertVisible { selector } => {
                let handle = self
                    .poll_for(selector, self.config.implicit_wait(), true)
                    .await?;
                state.subject = Some(handle);
            }
            Action::AssertText { expected, mode } => {
                let handle = self
                    .assert_subject_text(state.subject.as_ref(), expected, *mode)
                    .await?;
                state.subject = Some(handle);
            }
            Action::AssertAbsent { selector } => {
                let matches = self.driver.count(selector).await?;
                if matches > 0 {
                    return Err(E2eError::assertion(format!(
                        "expected no element matching {selector}, found {matches}"
                    )));
                }
            }
            Action::Screenshot { name } => {
                match self.capture(store, name).await {
                    Ok(path) => state.report.screenshots.push(path),
                    Err(warning) => {
                        tracing::warn!(%warning, "screenshot skipped");
                        observer.warning(&warning);
                        state.report.warnings.push(warning);
                    }
                }
            }
        }
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> E2eResult<()> {
        let timeout = self.config.navigation_timeout();
        match tokio::time::timeout(timeout, self.driver.navigate(url)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(E2eError::Navigation {
                    url: url.to_string(),
                    message: format!("timed out after {}ms", timeout.as_millis()),
                })
            }
        }
        let landed = self.driver.current_url().await?;
        tracing::debug!(requested = %url, %landed, "page loaded");
        Ok(())
    }

    /// Poll until the selector matches (and, if asked, the match is visible).
    ///
    /// Nothing matched: `ElementNotFound`. Matched but stayed hidden:
    /// `Assertion`.
    async fn poll_for(
        &mut self,
        selector: &Selector,
        options: WaitOptions,
        require_visible: bool,
    ) -> E2eResult<ElementHandle> {
        let mut clock = Waiter::with_options(options).start();
        let mut hidden_match;
        loop {
            clock.record_attempt();
            match self.driver.query(selector).await? {
                Some(handle) if !require_visible || handle.visible => {
                    tracing::debug!(
                        %selector,
                        attempts = clock.attempts(),
                        elapsed_ms = clock.elapsed().as_millis() as u64,
                        "matched"
                    );
                    return Ok(handle);
                }
                Some(_) => hidden_match = true,
                None => hidden_match = false,
            }
            if !clock.tick().await {
                break;
            }
        }

        let waited_ms = clock.elapsed().as_millis() as u64;
        if hidden_match {
            Err(E2eError::assertion(format!(
                "{selector} matched but is not visible (waited {waited_ms}ms)"
            )))
        } else {
            Err(E2eError::ElementNotFound {
                selector: selector.to_string(),
                waited_ms,
            })
        }
    }

    /// Re-resolve the subject and wait for it to become visible and enabled
    async fn actionable_subject(&mut self, subject: Option<&ElementHandle>) -> E2eResult<ElementHandle> {
        let subject = subject.ok_or_else(|| {
            E2eError::interaction("no subject element; locate one before acting")
        })?;
        let mut clock = Waiter::with_options(self.config.implicit_wait()).start();
        loop {
            clock.record_attempt();
            let current = self.driver.resolve(subject).await?.ok_or_else(|| {
                E2eError::interaction(format!(
                    "<{}> is stale: it is no longer attached to the page",
                    subject.tag
                ))
            })?;
            if current.is_interactable() {
                return Ok(current);
            }
            if !clock.tick().await {
                let reason = if current.visible { "disabled" } else { "hidden" };
                return Err(E2eError::interaction(format!(
                    "<{}> is {reason} after {}ms",
                    current.tag,
                    clock.elapsed().as_millis()
                )));
            }
        }
    }

    /// Poll the subject's value or text until it matches
    async fn assert_subject_text(
        &mut self,
        subject: Option<&ElementHandle>,
        expected: &str,
        mode: TextMatch,
    ) -> E2eResult<ElementHandle> {
        let subject = subject.ok_or_else(|| {
            E2eError::interaction("no subject element; locate one before asserting text")
        })?;
        let mut clock = Waiter::with_options(self.config.implicit_wait()).start();
        loop {
            clock.record_attempt();
            let current = self.driver.resolve(subject).await?.ok_or_else(|| {
                E2eError::interaction(format!("<{}> is stale", subject.tag))
            })?;
            if mode.matches(current.observed_text(), expected) {
                return Ok(current);
            }
            if !clock.tick().await {
                let verb = match mode {
                    TextMatch::Exact => "equal",
                    TextMatch::Contains => "contain",
                };
                return Err(E2eError::assertion(format!(
                    "expected <{}> text {:?} to {verb} {expected:?}",
                    current.tag,
                    current.observed_text()
                )));
            }
        }
    }

    async fn capture(
        &mut self,
        store: &ArtifactStore,
        name: &str,
    ) -> Result<std::path::PathBuf, ScreenshotWriteWarning> {
        let png = self
            .driver
            .screenshot()
            .await
            .map_err(|e| ScreenshotWriteWarning {
                name: name.to_string(),
                path: None,
                message: e.to_string(),
            })?;
        store.write(name, &png)
    }

    /// Close the underlying browser session
    pub async fn close(&mut self) -> E2eResult<()> {
        self.driver.close().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockEffect, MockElement, MockPage};
    use crate::result::FailureKind;
    use std::time::Duration;

    const ORIGIN: &str = "http://localhost:3000";

    fn page() -> MockPage {
        MockPage::new()
            .with_element(MockElement::new("title", "h1").with_text("Bienvenido"))
            .with_element(
                MockElement::new("field", "input").with_attribute("placeholder", "Tu nombre"),
            )
            .with_element(MockElement::new("locked", "input").disabled())
            .with_element(MockElement::new("ghost", "p").with_text("Oculto").hidden())
            .with_element(
                MockElement::new("go", "button")
                    .with_text("Ir")
                    .on_click(MockEffect::RevealAfter {
                        id: "ghost".into(),
                        queries: 3,
                    }),
            )
            .with_element(
                MockElement::new("once", "button")
                    .with_text("Una vez")
                    .on_click(MockEffect::Remove("once".into())),
            )
            .with_element(
                MockElement::new("vanish", "button")
                    .with_text("Borrar")
                    .on_click(MockEffect::Remove("field".into())),
            )
    }

    fn config(artifacts: &std::path::Path) -> RunConfig {
        RunConfig::default()
            .with_artifacts_dir(artifacts)
            .with_implicit_wait(40)
            .with_settle_timeout(200)
    }

    fn suite(scenarios: Vec<Scenario>) -> Suite {
        let mut suite = Suite::new("Runner", ORIGIN).before_each(Action::Navigate { url: "/".into() });
        suite.scenarios = scenarios;
        suite
    }

    fn runner(artifacts: &std::path::Path) -> ScenarioRunner<MockDriver> {
        ScenarioRunner::new(MockDriver::new().with_page(ORIGIN, page()), config(artifacts))
    }

    async fn run_one(scenario: Scenario) -> ScenarioReport {
        let tmp = tempfile::tempdir().unwrap();
        let mut runner = runner(tmp.path());
        let mut report = runner.run_suite(&suite(vec![scenario])).await;
        report.scenarios.remove(0)
    }

    fn failure_kind(report: &ScenarioReport) -> FailureKind {
        report.failure.as_ref().unwrap().kind
    }

    mod action_tests {
        use super::*;

        #[tokio::test]
        async fn test_locate_type_assert() {
            let report = run_one(
                Scenario::new("typing")
                    .locate(Selector::placeholder("input", "nombre"))
                    .type_text("John Cypress")
                    .assert_text("John Cypress"),
            )
            .await;
            assert_eq!(report.status, ScenarioStatus::Passed);
            assert_eq!(report.steps.len(), 4);
            assert!(report.steps.iter().all(|s| s.ok));
        }

        #[tokio::test]
        async fn test_navigate_reads_landed_url() {
            let tmp = tempfile::tempdir().unwrap();
            let mut runner = runner(tmp.path());
            let report = runner.run_suite(&suite(vec![Scenario::new("lands")])).await;
            assert!(report.all_passed());
            assert!(report.scenarios[0].status.is_terminal());

            let driver = runner.into_driver();
            let navigate = driver
                .call_history
                .iter()
                .position(|c| c == &format!("navigate:{ORIGIN}"))
                .unwrap();
            assert_eq!(driver.call_history[navigate + 1], "current_url");
        }

        #[tokio::test]
        async fn test_locate_missing_is_element_not_found() {
            let report = run_one(Scenario::new("missing").locate(Selector::text("Nada"))).await;
            assert_eq!(report.status, ScenarioStatus::Failed);
            assert_eq!(failure_kind(&report), FailureKind::ElementNotFound);
        }

        #[tokio::test]
        async fn test_assert_visible_hidden_is_assertion() {
            let report =
                run_one(Scenario::new("hidden").assert_visible(Selector::text("Oculto"))).await;
            assert_eq!(failure_kind(&report), FailureKind::Assertion);
        }

        #[tokio::test]
        async fn test_type_without_subject() {
            let report = run_one(Scenario::new("no subject").type_text("x")).await;
            assert_eq!(failure_kind(&report), FailureKind::Interaction);
            assert!(report.failure.unwrap().message.contains("no subject"));
        }

        #[tokio::test]
        async fn test_click_hidden_subject() {
            let report = run_one(Scenario::new("hidden click").locate(Selector::text("Oculto")).click()).await;
            assert_eq!(failure_kind(&report), FailureKind::Interaction);
            assert!(report.failure.unwrap().message.contains("hidden"));
        }

        #[tokio::test]
        async fn test_type_disabled_subject() {
            let report = run_one(
                Scenario::new("disabled")
                    .locate(Selector::text("Borrar"))
                    .click()
                    .locate(Selector::css("input"))
                    .type_text("x"),
            )
            .await;
            let failure = report.failure.unwrap();
            assert_eq!(failure.kind, FailureKind::Interaction);
            assert!(failure.message.contains("disabled"));
        }

        #[tokio::test]
        async fn test_stale_subject_after_removal() {
            let report = run_one(
                Scenario::new("stale")
                    .locate(Selector::text("Una vez"))
                    .click()
                    .click(),
            )
            .await;
            let failure = report.failure.unwrap();
            assert_eq!(failure.kind, FailureKind::Interaction);
            assert!(failure.message.contains("stale"));
        }

        #[tokio::test]
        async fn test_stale_subject_after_navigation() {
            let report = run_one(
                Scenario::new("stale nav")
                    .locate(Selector::placeholder("input", "nombre"))
                    .navigate("/")
                    .type_text("x"),
            )
            .await;
            // navigation clears the subject
            assert!(report.failure.unwrap().message.contains("no subject"));
        }

        #[tokio::test]
        async fn test_wait_for_late_element() {
            let report = run_one(
                Scenario::new("late")
                    .locate(Selector::text("Ir"))
                    .click()
                    .wait_for(Selector::text("Oculto"), Duration::from_secs(2)),
            )
            .await;
            assert_eq!(report.status, ScenarioStatus::Passed);
        }

        #[tokio::test]
        async fn test_wait_for_times_out() {
            let report = run_one(
                Scenario::new("never")
                    .wait_for(Selector::text("Chat Grupal"), Duration::from_millis(30)),
            )
            .await;
            let failure = report.failure.unwrap();
            assert_eq!(failure.kind, FailureKind::ElementNotFound);
            assert!(failure.action.starts_with("waitFor"));
        }

        #[tokio::test]
        async fn test_assert_text_mismatch() {
            let report = run_one(
                Scenario::new("mismatch")
                    .locate(Selector::text("Bienvenido"))
                    .assert_text("Hola"),
            )
            .await;
            assert_eq!(failure_kind(&report), FailureKind::Assertion);
        }

        #[tokio::test]
        async fn test_assert_text_contains() {
            let report = run_one(
                Scenario::new("contains")
                    .locate(Selector::text("Bienvenido"))
                    .assert_text_contains("Bienven"),
            )
            .await;
            assert_eq!(report.status, ScenarioStatus::Passed);
        }

        #[tokio::test]
        async fn test_assert_absent() {
            let ok = run_one(Scenario::new("absent").assert_absent(Selector::text("Enviado"))).await;
            assert_eq!(ok.status, ScenarioStatus::Passed);
            let present =
                run_one(Scenario::new("present").assert_absent(Selector::text("Bienvenido"))).await;
            assert_eq!(failure_kind(&present), FailureKind::Assertion);
        }

        #[tokio::test]
        async fn test_pause() {
            let report = run_one(Scenario::new("pause").pause(Duration::from_millis(5))).await;
            assert_eq!(report.status, ScenarioStatus::Passed);
            assert!(report.steps[1].duration >= Duration::from_millis(5));
        }
    }

    mod flow_tests {
        use super::*;

        #[tokio::test]
        async fn test_first_failure_aborts_scenario_only() {
            let tmp = tempfile::tempdir().unwrap();
            let mut runner = runner(tmp.path());
            let suite = suite(vec![
                Scenario::new("fails")
                    .locate(Selector::text("Nada"))
                    .screenshot("never-taken"),
                Scenario::new("passes").screenshot("taken"),
            ]);
            let report = runner.run_suite(&suite).await;
            assert_eq!(report.scenarios[0].status, ScenarioStatus::Failed);
            assert_eq!(report.scenarios[0].steps.len(), 2);
            assert!(report.scenarios[0].screenshots.is_empty());
            assert_eq!(report.scenarios[1].status, ScenarioStatus::Passed);
            assert_eq!(report.scenarios[1].screenshots.len(), 1);
        }

        #[tokio::test]
        async fn test_fail_fast_skips_rest() {
            let tmp = tempfile::tempdir().unwrap();
            let mut runner = ScenarioRunner::new(
                MockDriver::new().with_page(ORIGIN, page()),
                config(tmp.path()).with_failure_mode(FailureMode::FailFast),
            );
            let suite = suite(vec![
                Scenario::new("fails").locate(Selector::text("Nada")),
                Scenario::new("skipped"),
            ]);
            let report = runner.run_suite(&suite).await;
            assert_eq!(report.scenarios[1].status, ScenarioStatus::Skipped);
            assert_eq!(report.skipped_count(), 1);
        }

        #[tokio::test]
        async fn test_navigation_failure() {
            let tmp = tempfile::tempdir().unwrap();
            let mut runner = ScenarioRunner::new(
                MockDriver::new().with_unreachable(ORIGIN),
                config(tmp.path()),
            );
            let report = runner
                .run_suite(&suite(vec![Scenario::new("a"), Scenario::new("b")]))
                .await;
            assert_eq!(report.failed_count(), 2);
            assert_eq!(
                report.scenarios[0].failure.as_ref().unwrap().kind,
                FailureKind::Navigation
            );
        }

        #[tokio::test]
        async fn test_navigation_timeout() {
            let tmp = tempfile::tempdir().unwrap();
            let mut runner = ScenarioRunner::new(
                MockDriver::new()
                    .with_page(ORIGIN, page())
                    .with_navigation_delay(Duration::from_millis(200)),
                config(tmp.path()).with_navigation_timeout(10),
            );
            let report = runner.run_suite(&suite(vec![Scenario::new("slow")])).await;
            let failure = report.scenarios[0].failure.as_ref().unwrap();
            assert_eq!(failure.kind, FailureKind::Navigation);
            assert!(failure.message.contains("timed out"));
        }

        #[tokio::test]
        async fn test_screenshot_capture_failure_is_warning() {
            let tmp = tempfile::tempdir().unwrap();
            let mut runner = ScenarioRunner::new(
                MockDriver::new().with_page(ORIGIN, page()).without_screenshots(),
                config(tmp.path()),
            );
            let report = runner
                .run_suite(&suite(vec![Scenario::new("shots").screenshot("A1")]))
                .await;
            assert_eq!(report.scenarios[0].status, ScenarioStatus::Passed);
            assert_eq!(report.scenarios[0].warnings.len(), 1);
            assert!(report.scenarios[0].warnings[0].path.is_none());
        }

        #[tokio::test]
        async fn test_filter_from_config() {
            let tmp = tempfile::tempdir().unwrap();
            let mut runner = ScenarioRunner::new(
                MockDriver::new().with_page(ORIGIN, page()),
                config(tmp.path()).with_filter("segundo"),
            );
            let report = runner
                .run_suite(&suite(vec![Scenario::new("Primero"), Scenario::new("Segundo")]))
                .await;
            assert_eq!(report.total_count(), 1);
            assert_eq!(report.scenarios[0].name, "Segundo");
        }

        #[derive(Default)]
        struct Recorder {
            events: Vec<String>,
        }

        impl RunObserver for Recorder {
            fn scenario_started(&mut self, index: usize, total: usize, name: &str) {
                self.events.push(format!("start {index}/{total} {name}"));
            }

            fn warning(&mut self, warning: &ScreenshotWriteWarning) {
                self.events.push(format!("warn {}", warning.name));
            }

            fn scenario_finished(&mut self, report: &ScenarioReport) {
                self.events.push(format!("end {} {}", report.name, report.status));
            }
        }

        #[tokio::test]
        async fn test_observer_events() {
            let tmp = tempfile::tempdir().unwrap();
            let mut runner = ScenarioRunner::new(
                MockDriver::new().with_page(ORIGIN, page()).without_screenshots(),
                config(tmp.path()),
            );
            let mut recorder = Recorder::default();
            runner
                .run_suite_with(&suite(vec![Scenario::new("one").screenshot("A1")]), &mut recorder)
                .await;
            assert_eq!(
                recorder.events,
                ["start 0/1 one", "warn A1", "end one passed"]
            );
        }

        #[tokio::test]
        async fn test_close_delegates() {
            let tmp = tempfile::tempdir().unwrap();
            let mut runner = runner(tmp.path());
            runner.close().await.unwrap();
            assert!(runner.into_driver().was_called("close"));
        }
    }
}
