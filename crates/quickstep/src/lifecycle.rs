//! Definition instance lifetime and guaranteed cleanup.
//!
//! A [`ScenarioGroup`] owns the instance a scenario runs against. Per-scenario
//! definitions get a fresh instance every run; shared definitions keep one
//! instance for the whole group. Either way the instance's cleanup hook runs
//! once after every scenario, whatever the outcome.

use crate::assembler::PlannedStep;
use crate::binder::bind_plan;
use crate::definition::{FeatureSteps, InstanceScope, short_type_name};
use crate::error::{CleanupFault, ScenarioError};
use crate::executor::{ExecutionReport, Executor};
use crate::handler::StepFault;
use crate::registry::StepRegistry;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// The result of one scenario run.
#[derive(Debug)]
pub struct ScenarioOutcome {
    /// The scenario's own result.
    pub result: Result<ExecutionReport, ScenarioError>,
    /// A fault raised by the cleanup hook, reported alongside `result`.
    pub cleanup: Option<CleanupFault>,
}

impl ScenarioOutcome {
    /// Return `true` when the steps passed and cleanup raised nothing.
    #[must_use]
    pub const fn is_clean_pass(&self) -> bool {
        self.result.is_ok() && self.cleanup.is_none()
    }
}

fn create_instance<W: FeatureSteps>() -> Result<W, StepFault> {
    catch_unwind(W::create).unwrap_or_else(|payload| Err(StepFault::Panicked(payload)))
}

async fn execute<W>(
    registry: &StepRegistry<W>,
    steps: &[PlannedStep],
    instance: &mut W,
) -> Result<ExecutionReport, ScenarioError> {
    let plan = bind_plan(steps, registry)?;
    Ok(Executor::run_async(plan, instance).await?)
}

fn run_cleanup<W: FeatureSteps>(instance: &mut W) -> Option<CleanupFault> {
    let result = catch_unwind(AssertUnwindSafe(|| instance.cleanup()))
        .unwrap_or_else(|payload| Err(StepFault::Panicked(payload)));
    result.err().map(|fault| {
        log::warn!("cleanup for {} failed: {fault}", short_type_name::<W>());
        CleanupFault { fault }
    })
}

/// Scenarios that share one lifecycle context.
///
/// For [`InstanceScope::Shared`] definitions the instance is created before
/// the first scenario and released when the group is finished or dropped.
/// The group hands out an exclusive borrow per scenario, so a shared
/// instance is never used by two scenarios at once.
pub struct ScenarioGroup<W: FeatureSteps> {
    shared: Option<W>,
    scenarios_run: usize,
}

impl<W: FeatureSteps> Default for ScenarioGroup<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: FeatureSteps> ScenarioGroup<W> {
    /// Create an empty group. No instance exists until the first scenario.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            shared: None,
            scenarios_run: 0,
        }
    }

    /// Number of scenarios run through this group.
    #[must_use]
    pub const fn scenarios_run(&self) -> usize {
        self.scenarios_run
    }

    /// Return `true` while a shared instance is alive.
    #[must_use]
    pub const fn has_shared_instance(&self) -> bool {
        self.shared.is_some()
    }

    fn acquire<'s>(&'s mut self, fresh: &'s mut Option<W>) -> Result<&'s mut W, StepFault> {
        match W::SCOPE {
            InstanceScope::PerScenario => Ok(fresh.insert(create_instance::<W>()?)),
            InstanceScope::Shared => match &mut self.shared {
                Some(instance) => Ok(instance),
                slot @ None => {
                    log::debug!("creating shared {} instance", short_type_name::<W>());
                    Ok(slot.insert(create_instance::<W>()?))
                }
            },
        }
    }

    /// Bind and run `steps`, then clean up.
    ///
    /// Binding happens after the instance exists, so a binding failure still
    /// triggers cleanup. Nothing is cleaned up when the instance could not be
    /// created.
    pub async fn run_async(
        &mut self,
        registry: &StepRegistry<W>,
        steps: &[PlannedStep],
    ) -> ScenarioOutcome {
        self.scenarios_run += 1;
        let mut fresh = None;
        let instance = match self.acquire(&mut fresh) {
            Ok(instance) => instance,
            Err(fault) => {
                return ScenarioOutcome {
                    result: Err(ScenarioError::Setup(fault)),
                    cleanup: None,
                };
            }
        };
        let result = execute(registry, steps, instance).await;
        let cleanup = run_cleanup(instance);
        ScenarioOutcome { result, cleanup }
    }

    /// Blocking form of [`run_async`](Self::run_async).
    pub fn run(&mut self, registry: &StepRegistry<W>, steps: &[PlannedStep]) -> ScenarioOutcome {
        futures::executor::block_on(self.run_async(registry, steps))
    }

    /// Release the shared instance, if any.
    pub fn finish(self) {
        drop(self);
    }
}

impl<W: FeatureSteps> Drop for ScenarioGroup<W> {
    fn drop(&mut self) {
        if self.shared.take().is_some() {
            log::debug!(
                "released shared {} instance after {} scenarios",
                short_type_name::<W>(),
                self.scenarios_run
            );
        }
    }
}
