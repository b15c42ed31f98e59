//! Tokio harness adapter for `quickstep`.
//!
//! Scenario futures run inside a current-thread Tokio runtime so awaitable
//! step handlers can use Tokio timers, channels, and `spawn_local`.

mod tokio_harness;

pub use tokio_harness::TokioHarness;
