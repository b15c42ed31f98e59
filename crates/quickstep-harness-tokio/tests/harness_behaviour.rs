//! Behavioural tests for Tokio harness adapter execution semantics.

use quickstep_harness::{HarnessAdapter, ScenarioMetadata, ScenarioRunRequest, ScenarioRunner};
use quickstep_harness_tokio::TokioHarness;
use rstest::{fixture, rstest};
use std::cell::RefCell;
use std::time::Duration;

#[fixture]
fn default_metadata() -> ScenarioMetadata {
    ScenarioMetadata::default()
}

#[rstest]
fn tokio_harness_awaits_timers_before_returning(default_metadata: ScenarioMetadata) {
    let trace = RefCell::new(Vec::new());
    let request = ScenarioRunRequest::new(
        default_metadata,
        ScenarioRunner::new(async {
            trace.borrow_mut().push("before sleep");
            tokio::time::sleep(Duration::from_millis(5)).await;
            trace.borrow_mut().push("after sleep");
        }),
    );

    TokioHarness::new().run(request);
    assert_eq!(*trace.borrow(), vec!["before sleep", "after sleep"]);
}

#[rstest]
fn tokio_harness_supports_non_static_runner_borrows(default_metadata: ScenarioMetadata) {
    let mut counter = 0u8;
    let request = ScenarioRunRequest::new(
        default_metadata,
        ScenarioRunner::blocking(|| {
            counter += 1;
            counter
        }),
    );

    assert_eq!(TokioHarness::new().run(request), 1);
    assert_eq!(counter, 1);
}

#[test]
fn spawn_local_tasks_can_be_awaited_inside_the_harness() {
    let request = ScenarioRunRequest::new(
        ScenarioMetadata::default(),
        ScenarioRunner::new(async {
            let handle = tokio::task::spawn_local(async { 6 * 7 });
            handle.await.unwrap_or_default()
        }),
    );
    assert_eq!(TokioHarness::new().run(request), 42);
}

#[test]
#[should_panic(expected = "tokio harness panic propagation")]
fn tokio_harness_propagates_runner_panics() {
    let request = ScenarioRunRequest::new(
        ScenarioMetadata::default(),
        ScenarioRunner::blocking(|| panic!("tokio harness panic propagation")),
    );
    TokioHarness::new().run(request);
}
