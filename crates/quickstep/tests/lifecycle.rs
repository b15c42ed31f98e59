//! Behaviour tests for instance lifetime and cleanup guarantees.

use quickstep::{
    FeatureRunner, FeatureSteps, InstanceScope, RegistryBuilder, ScenarioError, ScenarioStatus,
    StdHarness, StepFault, StepResult, panic_message,
};
use serial_test::serial;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};

static CONNECTION_CLEANUPS: AtomicUsize = AtomicUsize::new(0);

#[derive(Default)]
struct Connection {
    open: bool,
    queries: u32,
}

fn crash_driver() {
    panic!("driver crashed");
}

impl FeatureSteps for Connection {
    const FEATURE_FILE: Option<&'static str> = Some("tests/features/lifecycle.feature");

    fn create() -> Result<Self, StepFault> {
        Ok(Self::default())
    }

    fn register(steps: &mut RegistryBuilder<Self>) {
        steps.given("an open connection", |conn: &mut Self, ()| conn.open = true);
        steps.when("I run a query", |conn: &mut Self, ()| {
            assert!(conn.open, "connection should be open");
            conn.queries += 1;
        });
        steps.when("I run a broken query", |conn: &mut Self, ()| {
            conn.queries += 1;
            Err::<(), _>(std::io::Error::other("syntax error near SELEC"))
        });
        steps.when("the driver crashes", |_: &mut Self, ()| crash_driver());
        steps.then(r"the query count is (\d+)", |conn: &mut Self, (n,): (u32,)| {
            assert_eq!(conn.queries, n);
        });
    }

    fn cleanup(&mut self) -> StepResult {
        self.open = false;
        CONNECTION_CLEANUPS.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
#[serial]
fn cleanup_runs_once_per_scenario_on_every_exit_path() {
    let runner = FeatureRunner::<Connection>::load()
        .unwrap_or_else(|err| panic!("lifecycle feature should load: {err}"));
    let before = CONNECTION_CLEANUPS.load(Ordering::SeqCst);
    let report = runner.run_all(&StdHarness::new());
    assert_eq!(CONNECTION_CLEANUPS.load(Ordering::SeqCst) - before, 4);

    let labels: Vec<&str> = report.scenarios.iter().map(|r| r.status.label()).collect();
    assert_eq!(labels, ["passed", "failed", "failed", "failed"]);
    let indices: Vec<Option<usize>> = report
        .scenarios
        .iter()
        .map(|r| r.error().and_then(ScenarioError::step_index))
        .collect();
    assert_eq!(indices, [None, Some(1), Some(1), Some(1)]);

    let Some(ScenarioError::Execution(fault)) = report.scenarios.get(1).and_then(|r| r.error())
    else {
        panic!("the broken query should fault");
    };
    assert_eq!(fault.text, "I run a broken query");
    assert_eq!(fault.fault.to_string(), "syntax error near SELEC");
    assert!(matches!(
        report.scenarios.get(3).and_then(|r| r.error()),
        Some(ScenarioError::Binding { .. })
    ));
}

#[test]
#[serial]
fn handler_panics_resume_with_their_original_payload() {
    let runner = FeatureRunner::<Connection>::load()
        .unwrap_or_else(|err| panic!("lifecycle feature should load: {err}"));
    let report = runner
        .run_named(&StdHarness::new(), "Query panics")
        .unwrap_or_else(|| panic!("scenario should exist"));
    let Some(ScenarioError::Execution(fault)) = report.error() else {
        panic!("the crash should be reported as a step fault");
    };
    assert!(fault.fault.is_panic());

    let payload = catch_unwind(AssertUnwindSafe(|| report.assert_passed()))
        .err()
        .unwrap_or_else(|| panic!("assert_passed should resume the panic"));
    assert_eq!(panic_message(payload.as_ref()), "driver crashed");
}

struct Leaky;

impl FeatureSteps for Leaky {
    fn create() -> Result<Self, StepFault> {
        Ok(Self)
    }

    fn register(steps: &mut RegistryBuilder<Self>) {
        steps.given("a step that fails", |_: &mut Self, ()| {
            Err::<(), _>(StepFault::msg("primary failure"))
        });
        steps.given("a step that passes", |_: &mut Self, ()| {});
    }

    fn cleanup(&mut self) -> StepResult {
        Err(StepFault::msg("socket already closed"))
    }
}

const LEAKY: &str = "Feature: Leaky
  Scenario: Fails
    Given a step that fails

  Scenario: Passes
    Given a step that passes
";

#[test]
#[serial]
fn cleanup_faults_never_mask_the_primary_result() {
    quickstep::config::set_fail_on_cleanup(false);
    let runner = FeatureRunner::<Leaky>::from_source(LEAKY)
        .unwrap_or_else(|err| panic!("feature should parse: {err}"));
    let report = runner.run_all(&StdHarness::new());
    quickstep::config::clear_fail_on_cleanup_override();

    let Some(failed) = report.scenarios.first() else {
        panic!("expected a report");
    };
    let Some(ScenarioError::Execution(fault)) = failed.error() else {
        panic!("the primary failure should be kept");
    };
    assert_eq!(fault.fault.to_string(), "primary failure");
    assert_eq!(
        failed.cleanup.as_ref().map(ToString::to_string),
        Some("cleanup failed: socket already closed".to_owned())
    );

    let Some(passed) = report.scenarios.get(1) else {
        panic!("expected a second report");
    };
    assert!(passed.is_passed());
    assert!(passed.cleanup.is_some());
}

#[test]
#[serial]
fn cleanup_faults_can_fail_passing_scenarios() {
    quickstep::config::set_fail_on_cleanup(true);
    let runner = FeatureRunner::<Leaky>::from_source(LEAKY)
        .unwrap_or_else(|err| panic!("feature should parse: {err}"));
    let report = runner.run_all(&StdHarness::new());
    quickstep::config::clear_fail_on_cleanup_override();

    assert!(matches!(
        report.scenarios.first().map(|r| &r.status),
        Some(ScenarioStatus::Failed(ScenarioError::Execution(_)))
    ));
    assert!(matches!(
        report.scenarios.get(1).map(|r| &r.status),
        Some(ScenarioStatus::Failed(ScenarioError::Cleanup(_)))
    ));
}

static COUNTERS_CREATED: AtomicUsize = AtomicUsize::new(0);
static COUNTER_CLEANUPS: AtomicUsize = AtomicUsize::new(0);

struct Counter {
    value: u32,
}

impl FeatureSteps for Counter {
    const FEATURE_FILE: Option<&'static str> = Some("tests/features/counter.feature");
    const SCOPE: InstanceScope = InstanceScope::Shared;

    fn create() -> Result<Self, StepFault> {
        COUNTERS_CREATED.fetch_add(1, Ordering::SeqCst);
        Ok(Self { value: 0 })
    }

    fn register(steps: &mut RegistryBuilder<Self>) {
        steps.when("I increment the counter", |counter: &mut Self, ()| {
            counter.value += 1;
        });
        steps.then(r"the counter reads (\d+)", |counter: &mut Self, (n,): (u32,)| {
            assert_eq!(counter.value, n);
        });
    }

    fn cleanup(&mut self) -> StepResult {
        COUNTER_CLEANUPS.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn shared_instances_live_for_the_whole_group() {
    let runner = FeatureRunner::<Counter>::load()
        .unwrap_or_else(|err| panic!("counter feature should load: {err}"));
    let created = COUNTERS_CREATED.load(Ordering::SeqCst);
    let cleaned = COUNTER_CLEANUPS.load(Ordering::SeqCst);

    runner.run_all(&StdHarness::new()).assert_passed();

    assert_eq!(COUNTERS_CREATED.load(Ordering::SeqCst) - created, 1);
    assert_eq!(COUNTER_CLEANUPS.load(Ordering::SeqCst) - cleaned, 2);
}

struct Unreachable;

impl FeatureSteps for Unreachable {
    fn create() -> Result<Self, StepFault> {
        Err(StepFault::msg("database offline"))
    }

    fn register(steps: &mut RegistryBuilder<Self>) {
        steps.given("anything", |_: &mut Self, ()| {});
    }
}

#[test]
fn setup_failures_are_reported_per_scenario() {
    let runner = FeatureRunner::<Unreachable>::from_source(
        "Feature: Offline
  Scenario: One
    Given anything

  Scenario: Two
    Given anything
",
    )
    .unwrap_or_else(|err| panic!("feature should parse: {err}"));
    let report = runner.run_all(&StdHarness::new());
    assert_eq!(report.failures().count(), 2);
    assert!(report.failures().all(|r| {
        matches!(r.error(), Some(ScenarioError::Setup(_))) && r.cleanup.is_none()
    }));
}
