//! Default blocking harness implementation.

use crate::adapter::HarnessAdapter;
use crate::runner::ScenarioRunRequest;

/// Runtime-free harness that blocks the calling thread on the scenario future.
///
/// Awaitable steps that rely on a specific async runtime (timers, sockets)
/// need that runtime's harness instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdHarness;

impl StdHarness {
    /// Creates a new blocking harness.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HarnessAdapter for StdHarness {
    fn run<T>(&self, request: ScenarioRunRequest<'_, T>) -> T {
        futures::executor::block_on(request.into_future())
    }
}
