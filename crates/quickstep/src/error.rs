//! Error types raised while building registries, binding steps, and running
//! scenarios.

use crate::handler::StepFault;
use crate::value::ParamKind;
use quickstep_patterns::{PatternError, PlaceholderError, StepKeyword, UnsupportedStepType};
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Static misconfiguration of a definition type or a scenario document.
///
/// These are raised before any handler runs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DefinitionError {
    /// A step sequence opens with `And`, `But`, or `*`.
    #[error("step {index} `{keyword} {text}` has no preceding Given, When, or Then to inherit from")]
    LeadingConjunction {
        /// Position of the step within its sequence.
        index: usize,
        /// The conjunction keyword.
        keyword: StepKeyword,
        /// The step text.
        text: String,
    },
    /// The parser produced a step type with no keyword counterpart.
    #[error(transparent)]
    UnsupportedStepType(#[from] UnsupportedStepType),
    /// A handler launches work without a completion signal.
    #[error("handler '{handler}' on {owner} is detached; step handlers must block or return a future")]
    DetachedHandler {
        /// Definition type declaring the handler.
        owner: &'static str,
        /// Handler name.
        handler: String,
    },
    /// A handler was registered without any keyword and pattern.
    #[error("handler '{handler}' on {owner} declares no step patterns")]
    NoDeclarations {
        /// Definition type declaring the handler.
        owner: &'static str,
        /// Handler name.
        handler: String,
    },
    /// A declared pattern is not a valid regular expression.
    #[error("handler '{handler}': {source}")]
    InvalidPattern {
        /// Handler name.
        handler: String,
        /// Compilation failure.
        #[source]
        source: PatternError,
    },
    /// A pattern's capture groups do not line up with the handler parameters.
    #[error(
        "handler '{handler}': pattern '{pattern}' has {captures} capture groups but the handler takes {parameters} captured parameters"
    )]
    CaptureCountMismatch {
        /// Handler name.
        handler: String,
        /// The offending pattern source.
        pattern: String,
        /// Capture groups in the pattern.
        captures: usize,
        /// Parameters filled from captures.
        parameters: usize,
    },
    /// A data table or doc string parameter is not the final parameter.
    #[error("handler '{handler}': {kind} parameter at position {position} must be the only structured parameter and come last")]
    MisplacedStructuredArgument {
        /// Handler name.
        handler: String,
        /// Kind of the misplaced parameter.
        kind: ParamKind,
        /// Zero-based parameter position.
        position: usize,
    },
    /// An outline step references a column missing from its Examples table.
    #[error("scenario '{scenario}': {source}")]
    UnknownPlaceholder {
        /// Scenario name.
        scenario: String,
        /// Substitution failure.
        #[source]
        source: PlaceholderError,
    },
    /// A unit refers to a scenario its feature does not contain.
    #[error("feature has no scenario for unit '{unit}'")]
    UnknownScenario {
        /// Unit name.
        unit: String,
    },
}

/// A step that could not be matched to a handler, or whose arguments could
/// not be converted.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum BindingError {
    /// No declared pattern matches the step.
    #[error("no handler matches `{keyword} {text}`")]
    NotFound {
        /// Effective keyword used for lookup.
        keyword: StepKeyword,
        /// Step text.
        text: String,
    },
    /// A capture could not be converted to the parameter's type.
    #[error("step `{text}`: cannot convert '{value}' to {expected} for parameter {parameter}: {reason}")]
    Conversion {
        /// Step text.
        text: String,
        /// Zero-based parameter position.
        parameter: usize,
        /// Rust type of the parameter.
        expected: &'static str,
        /// Captured text.
        value: String,
        /// Conversion failure.
        reason: String,
    },
    /// The step carries a different block argument than the handler takes.
    #[error("step `{text}` carries a {found} but the handler expects a {expected}")]
    ArgumentKindMismatch {
        /// Step text.
        text: String,
        /// Kind the handler expects.
        expected: ParamKind,
        /// Kind the step carries.
        found: ParamKind,
    },
    /// The step carries a block argument the handler does not accept.
    #[error("step `{text}` carries a {found} the handler does not accept")]
    UnexpectedArgument {
        /// Step text.
        text: String,
        /// Kind the step carries.
        found: ParamKind,
    },
    /// The handler expects a block argument the step does not carry.
    #[error("step `{text}` needs a {expected} argument")]
    MissingArgument {
        /// Step text.
        text: String,
        /// Kind the handler expects.
        expected: ParamKind,
    },
}

/// A handler fault, annotated with the step that raised it.
#[derive(Debug)]
pub struct ExecutionFault {
    /// Position of the step within the scenario plan.
    pub index: usize,
    /// The step's keyword as written.
    pub keyword: StepKeyword,
    /// The step text.
    pub text: String,
    /// The fault, unchanged.
    pub fault: StepFault,
}

impl ExecutionFault {
    /// Discard the step context and return the original fault.
    #[must_use]
    pub fn into_fault(self) -> StepFault {
        self.fault
    }
}

impl fmt::Display for ExecutionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step {} `{} {}` failed: {}",
            self.index, self.keyword, self.text, self.fault
        )
    }
}

impl Error for ExecutionFault {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.fault.as_error().map(|err| err as &(dyn Error + 'static))
    }
}

/// A fault raised by a definition instance's cleanup hook.
#[derive(Debug)]
pub struct CleanupFault {
    /// The fault, unchanged.
    pub fault: StepFault,
}

impl fmt::Display for CleanupFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cleanup failed: {}", self.fault)
    }
}

impl Error for CleanupFault {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.fault.as_error().map(|err| err as &(dyn Error + 'static))
    }
}

/// Why a single scenario did not pass.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScenarioError {
    /// The definition instance could not be created.
    #[error("failed to create the step definition instance: {0}")]
    Setup(StepFault),
    /// The scenario document is malformed.
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    /// A step could not be bound.
    #[error("step {index}: {source}")]
    Binding {
        /// Position of the step within the scenario plan.
        index: usize,
        /// Binding failure.
        #[source]
        source: BindingError,
    },
    /// A handler faulted.
    #[error(transparent)]
    Execution(#[from] ExecutionFault),
    /// Cleanup faulted after the steps passed and cleanup faults are
    /// configured to fail the scenario.
    #[error(transparent)]
    Cleanup(CleanupFault),
}

impl ScenarioError {
    /// Return the index of the step that caused the failure, if any.
    #[must_use]
    pub const fn step_index(&self) -> Option<usize> {
        match self {
            Self::Binding { index, .. } | Self::Execution(ExecutionFault { index, .. }) => {
                Some(*index)
            }
            Self::Setup(_) | Self::Definition(_) | Self::Cleanup(_) => None,
        }
    }
}
