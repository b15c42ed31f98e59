//! Harness adapter contracts for `quickstep`.
//!
//! A harness owns the environment a scenario future is driven in. The engine
//! hands each runnable unit to a [`HarnessAdapter`] as a [`ScenarioRunRequest`];
//! the blocking [`StdHarness`] polls it on the calling thread, while other
//! crates plug in async runtimes.

mod adapter;
mod runner;
mod std_harness;

pub use adapter::HarnessAdapter;
pub use runner::{ScenarioMetadata, ScenarioRunRequest, ScenarioRunner};
pub use std_harness::StdHarness;
