//! Sequential step execution.
//!
//! Steps run strictly in plan order on the caller's task. Awaitable handlers
//! are awaited to completion before the next step starts, and the first
//! fault stops the scenario.

use crate::binder::ScenarioPlan;
use crate::error::ExecutionFault;
use crate::handler::StepFault;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;

/// Summary of a fully executed plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Number of steps that ran.
    pub steps_run: usize,
}

/// Runs bound scenario plans against a definition instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Executor;

impl Executor {
    /// Run `plan` to completion, blocking the current thread.
    ///
    /// Awaitable handlers are polled with [`futures::executor::block_on`];
    /// handlers that need a specific runtime should run through
    /// [`run_async`](Self::run_async) under a matching harness.
    ///
    /// # Errors
    ///
    /// Returns the first [`ExecutionFault`]; later steps do not run.
    pub fn run<W>(
        plan: ScenarioPlan<'_, W>,
        instance: &mut W,
    ) -> Result<ExecutionReport, ExecutionFault> {
        futures::executor::block_on(Self::run_async(plan, instance))
    }

    /// Run `plan` to completion on the current task.
    ///
    /// # Errors
    ///
    /// Returns the first [`ExecutionFault`]; later steps do not run. A
    /// handler panic is caught and reported as [`StepFault::Panicked`] with
    /// its original payload.
    pub async fn run_async<W>(
        plan: ScenarioPlan<'_, W>,
        instance: &mut W,
    ) -> Result<ExecutionReport, ExecutionFault> {
        let mut report = ExecutionReport::default();
        for binding in plan {
            let step = binding.step;
            let future = binding.handler.invoke(instance, binding.arguments);
            let outcome = match AssertUnwindSafe(future).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(StepFault::Panicked(payload)),
            };
            if let Err(fault) = outcome {
                log::debug!(
                    "step {} `{} {}` failed: {fault}",
                    step.index,
                    step.keyword,
                    step.text
                );
                return Err(ExecutionFault {
                    index: step.index,
                    keyword: step.keyword,
                    text: step.text,
                    fault,
                });
            }
            report.steps_run += 1;
        }
        Ok(report)
    }
}
