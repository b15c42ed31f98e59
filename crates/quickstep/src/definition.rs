//! The test-definition trait tying handlers, lifecycle hooks, and a feature
//! file to one Rust type.

use crate::handler::{StepFault, StepResult};
use crate::registry::RegistryBuilder;

/// How long a definition instance lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InstanceScope {
    /// A fresh instance per scenario.
    #[default]
    PerScenario,
    /// One instance shared by every scenario of a
    /// [`ScenarioGroup`](crate::ScenarioGroup), created before the first.
    Shared,
}

/// A type whose handlers implement the steps of one feature file.
///
/// # Examples
///
/// ```
/// use quickstep::{FeatureSteps, RegistryBuilder, StepFault, feature_file};
///
/// #[derive(Default)]
/// struct Calculator {
///     operands: Vec<i64>,
///     result: i64,
/// }
///
/// impl FeatureSteps for Calculator {
///     fn create() -> Result<Self, StepFault> {
///         Ok(Self::default())
///     }
///
///     fn register(steps: &mut RegistryBuilder<Self>) {
///         steps.given(r"I chose (\d+) as (?:first|second) number", |calc: &mut Self, (n,): (i64,)| {
///             calc.operands.push(n);
///         });
///         steps.when("I press add", |calc: &mut Self, ()| {
///             calc.result = calc.operands.iter().sum();
///         });
///     }
/// }
///
/// assert_eq!(feature_file::<Calculator>(), "Calculator.feature");
/// ```
pub trait FeatureSteps: Sized + 'static {
    /// Feature-file identifier; `None` derives it from the type name.
    const FEATURE_FILE: Option<&'static str> = None;

    /// Instance lifetime across the scenarios of a group.
    const SCOPE: InstanceScope = InstanceScope::PerScenario;

    /// Construct an instance before its first scenario.
    ///
    /// # Errors
    ///
    /// A fault here is reported as a setup failure and no steps run.
    fn create() -> Result<Self, StepFault>;

    /// Declare this type's step handlers.
    fn register(steps: &mut RegistryBuilder<Self>);

    /// Release resources after each scenario.
    ///
    /// Runs exactly once per scenario whether the scenario passed or not.
    ///
    /// # Errors
    ///
    /// A fault here is reported alongside the scenario's own result.
    fn cleanup(&mut self) -> StepResult {
        Ok(())
    }
}

/// Return the feature-file identifier for `W`.
///
/// This is [`FeatureSteps::FEATURE_FILE`] verbatim when set, otherwise the
/// unqualified, non-generic type name followed by `.feature`.
#[must_use]
pub fn feature_file<W: FeatureSteps>() -> String {
    W::FEATURE_FILE.map_or_else(
        || format!("{}.feature", short_type_name::<W>()),
        str::to_owned,
    )
}

/// The last path segment of `T`'s type name, without generic arguments.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
