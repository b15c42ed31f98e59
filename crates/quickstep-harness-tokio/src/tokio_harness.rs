//! Tokio current-thread harness adapter for scenario execution.

use quickstep_harness::{HarnessAdapter, ScenarioRunRequest};

/// Drives scenario futures inside a Tokio current-thread runtime with a
/// [`LocalSet`](tokio::task::LocalSet).
///
/// A fresh runtime and `LocalSet` are built per scenario, then the scenario
/// future is blocked on. Step futures need not be `Send`, and
/// `tokio::task::spawn_local` is available inside awaitable handlers. Tasks a
/// handler spawns without awaiting are not drained; the engine rejects
/// handlers that rely on such detached work.
///
/// # Examples
///
/// ```
/// use quickstep_harness::{HarnessAdapter, ScenarioMetadata, ScenarioRunRequest, ScenarioRunner};
/// use quickstep_harness_tokio::TokioHarness;
///
/// let request = ScenarioRunRequest::new(
///     ScenarioMetadata::new("Reminders.feature", "Async scenario", 5, vec![]),
///     ScenarioRunner::new(async {
///         tokio::task::yield_now().await;
///         2 + 2
///     }),
/// );
/// assert_eq!(TokioHarness::new().run(request), 4);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioHarness;

impl TokioHarness {
    /// Creates a new Tokio harness instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HarnessAdapter for TokioHarness {
    fn run<T>(&self, request: ScenarioRunRequest<'_, T>) -> T {
        // HarnessAdapter::run is infallible, so a runtime that cannot be built
        // aborts the scenario.
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap_or_else(|err| {
                panic!("quickstep-harness-tokio: failed to build Tokio runtime: {err}")
            });
        let local_set = tokio::task::LocalSet::new();
        local_set.block_on(&runtime, request.into_future())
    }
}
