//! Step-dispatch engine for Given/When/Then scenarios.
//!
//! A test-definition type implements [`FeatureSteps`] and registers its step
//! handlers on a [`RegistryBuilder`]. The engine resolves each scenario line
//! to a handler by effective keyword and anchored pattern, converts captures
//! and block arguments to typed parameters, and runs the handlers strictly in
//! order. Scenario documents are parsed by the `gherkin` crate.
//!
//! ```
//! use quickstep::{FeatureRunner, FeatureSteps, RegistryBuilder, StdHarness, StepFault};
//!
//! #[derive(Default)]
//! struct Basket {
//!     items: u32,
//! }
//!
//! impl FeatureSteps for Basket {
//!     fn create() -> Result<Self, StepFault> {
//!         Ok(Self::default())
//!     }
//!
//!     fn register(steps: &mut RegistryBuilder<Self>) {
//!         steps.given("an empty basket", |_: &mut Self, ()| {});
//!         steps.when(r"I add (\d+) apples", |basket: &mut Self, (n,): (u32,)| {
//!             basket.items += n;
//!         });
//!         steps.then(r"the basket holds (\d+) items", |basket: &mut Self, (n,): (u32,)| {
//!             assert_eq!(basket.items, n);
//!         });
//!     }
//! }
//!
//! let runner = FeatureRunner::<Basket>::from_source(
//!     "Feature: Basket
//!   Scenario: Fill
//!     Given an empty basket
//!     When I add 3 apples
//!     Then the basket holds 3 items
//! ",
//! )?;
//! let report = runner.run_all(&StdHarness::new());
//! assert_eq!(report.passed(), 1);
//! # Ok::<(), quickstep::RunnerError>(())
//! ```

mod argument;
mod assembler;
mod binder;
pub mod config;
mod definition;
mod discovery;
mod error;
mod executor;
mod handler;
pub mod keyword;
mod lifecycle;
mod panic;
mod recovery;
mod registry;
mod runner;
#[cfg(test)]
mod test_support;
mod value;

pub use argument::{DataTable, DocString, StepArgument, docstring_content};
pub use assembler::{ExampleRow, PlannedStep, assemble, assemble_example};
pub use binder::{ScenarioPlan, StepBinding, bind, bind_plan};
pub use definition::{FeatureSteps, InstanceScope, feature_file};
pub use discovery::{
    IGNORE_TAG, LoadError, ScenarioUnit, discover, feature_path_for, is_ignored, load_feature,
    normalise_tag, parse_feature,
};
pub use error::{
    BindingError, CleanupFault, DefinitionError, ExecutionFault, ScenarioError,
};
pub use executor::{ExecutionReport, Executor};
pub use handler::{HandlerKind, IntoStepResult, StepFault, StepFuture, StepResult, step_future};
pub use lifecycle::{ScenarioGroup, ScenarioOutcome};
pub use panic::panic_message;
pub use quickstep_harness::{
    HarnessAdapter, ScenarioMetadata, ScenarioRunRequest, ScenarioRunner, StdHarness,
};
pub use quickstep_patterns::{PatternError, PlaceholderError, StepKeyword, StepPattern};
pub use registry::{
    Candidate, Declaration, HandlerBuilder, HandlerDescriptor, HandlerId, RegistryBuilder,
    StepRegistry,
};
pub use runner::{FeatureReport, FeatureRunner, RunnerError, ScenarioReport, ScenarioStatus};
pub use value::{
    ArgumentMismatch, CaptureParser, FromStepArgs, ParamKind, ParamSpec, StepParam, StepValue,
};
