//! End-to-end execution of feature units through a harness.
//!
//! A [`FeatureRunner`] pairs a parsed feature with the registry of one
//! definition type. Each unit is assembled, bound, and executed inside a
//! [`ScenarioGroup`], and the outcome is returned as a [`ScenarioReport`].
//! One unit's failure never stops its siblings.

use crate::assembler::{PlannedStep, assemble, assemble_example};
use crate::config;
use crate::definition::{FeatureSteps, feature_file};
use crate::discovery::{
    LoadError, ScenarioUnit, discover, feature_path_for, load_feature, parse_feature,
};
use crate::error::{CleanupFault, DefinitionError, ScenarioError};
use crate::lifecycle::{ScenarioGroup, ScenarioOutcome};
use crate::registry::StepRegistry;
use camino::{Utf8Path, Utf8PathBuf};
use quickstep_harness::{HarnessAdapter, ScenarioMetadata, ScenarioRunRequest, ScenarioRunner};
use std::sync::Arc;
use thiserror::Error;

/// Failure to prepare a [`FeatureRunner`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunnerError {
    /// The feature could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// The definition type's registry is invalid.
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

/// How a unit ended.
#[derive(Debug)]
pub enum ScenarioStatus {
    /// Every step passed.
    Passed {
        /// Number of steps run.
        steps: usize,
    },
    /// The unit failed.
    Failed(ScenarioError),
    /// The unit was not run.
    Skipped {
        /// Why the unit was skipped.
        reason: String,
    },
}

impl ScenarioStatus {
    /// Lowercase label for the status.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed { .. } => "passed",
            Self::Failed(_) => "failed",
            Self::Skipped { .. } => "skipped",
        }
    }
}

/// The outcome of one unit.
#[derive(Debug)]
pub struct ScenarioReport {
    /// Identity of the unit.
    pub metadata: ScenarioMetadata,
    /// How the unit ended.
    pub status: ScenarioStatus,
    /// A cleanup fault that did not fail the unit.
    pub cleanup: Option<CleanupFault>,
}

impl ScenarioReport {
    /// Return `true` when the unit passed.
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self.status, ScenarioStatus::Passed { .. })
    }

    /// Return `true` when the unit was skipped.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self.status, ScenarioStatus::Skipped { .. })
    }

    /// The failure, if the unit failed.
    #[must_use]
    pub const fn error(&self) -> Option<&ScenarioError> {
        match &self.status {
            ScenarioStatus::Failed(err) => Some(err),
            ScenarioStatus::Passed { .. } | ScenarioStatus::Skipped { .. } => None,
        }
    }

    /// Panic unless the unit passed or was skipped.
    ///
    /// A handler panic is resumed with its original payload so the host
    /// test reports the assertion that failed.
    ///
    /// # Panics
    ///
    /// Panics when the unit failed.
    pub fn assert_passed(self) {
        let ScenarioStatus::Failed(err) = self.status else {
            return;
        };
        match err {
            ScenarioError::Execution(fault) if fault.fault.is_panic() => {
                fault.into_fault().resume()
            }
            other => panic!(
                "scenario '{}' ({}:{}) failed: {other}",
                self.metadata.scenario_name(),
                self.metadata.feature_path(),
                self.metadata.scenario_line()
            ),
        }
    }
}

/// Reports for every unit of a feature.
#[derive(Debug)]
pub struct FeatureReport {
    /// The feature file the units came from.
    pub path: Utf8PathBuf,
    /// One report per unit, in discovery order.
    pub scenarios: Vec<ScenarioReport>,
}

impl FeatureReport {
    /// Number of passed units.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|r| r.is_passed()).count()
    }

    /// Number of skipped units.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.scenarios.iter().filter(|r| r.is_skipped()).count()
    }

    /// Reports of failed units.
    pub fn failures(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.scenarios.iter().filter(|r| r.error().is_some())
    }

    /// Return `true` when no unit failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Panic with the first failure, if any.
    ///
    /// # Panics
    ///
    /// Panics when any unit failed.
    pub fn assert_passed(self) {
        for report in self.scenarios {
            report.assert_passed();
        }
    }
}

/// Runs the units of one feature against definition type `W`.
pub struct FeatureRunner<W: FeatureSteps> {
    feature: gherkin::Feature,
    path: Utf8PathBuf,
    units: Vec<ScenarioUnit>,
    registry: Arc<StepRegistry<W>>,
}

impl<W: FeatureSteps> FeatureRunner<W> {
    /// Create a runner for an already parsed feature.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Definition`] when `W`'s registry is invalid.
    pub fn new(
        feature: gherkin::Feature,
        path: impl Into<Utf8PathBuf>,
    ) -> Result<Self, RunnerError> {
        let path = path.into();
        let registry = StepRegistry::<W>::shared()?;
        let units = discover(&feature, &path);
        Ok(Self {
            feature,
            path,
            units,
            registry,
        })
    }

    /// Load `W`'s feature file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] when the file cannot be loaded or the
    /// registry is invalid.
    pub fn load() -> Result<Self, RunnerError> {
        let path = feature_path_for::<W>();
        let feature = load_feature(&path)?;
        Self::new(feature, path)
    }

    /// Parse feature text held in memory, labelled with `W`'s identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] when the text cannot be parsed or the
    /// registry is invalid.
    pub fn from_source(text: &str) -> Result<Self, RunnerError> {
        let path = Utf8PathBuf::from(feature_file::<W>());
        let feature = parse_feature(text, &path)?;
        Self::new(feature, path)
    }

    /// The feature being run.
    #[must_use]
    pub const fn feature(&self) -> &gherkin::Feature {
        &self.feature
    }

    /// The feature's path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The runnable units, in discovery order.
    #[must_use]
    pub fn units(&self) -> &[ScenarioUnit] {
        &self.units
    }

    /// The registry units are bound against.
    #[must_use]
    pub fn registry(&self) -> &StepRegistry<W> {
        &self.registry
    }

    /// Look up a unit by name.
    #[must_use]
    pub fn unit(&self, name: &str) -> Option<&ScenarioUnit> {
        self.units.iter().find(|unit| unit.name == name)
    }

    /// Assemble the steps `unit` runs.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError`] when the unit does not belong to this
    /// feature or its steps are malformed.
    pub fn plan(&self, unit: &ScenarioUnit) -> Result<Vec<PlannedStep>, DefinitionError> {
        let scenario = unit
            .scenario(&self.feature)
            .ok_or_else(|| DefinitionError::UnknownScenario {
                unit: unit.name.clone(),
            })?;
        let rule = unit.rule(&self.feature);
        unit.example.as_ref().map_or_else(
            || assemble(&self.feature, rule, scenario),
            |example| assemble_example(&self.feature, rule, scenario, example),
        )
    }

    /// Run `unit` on the current task.
    ///
    /// Units tagged `@ignore` are skipped without creating an instance.
    pub async fn run_unit_async(
        &self,
        group: &mut ScenarioGroup<W>,
        unit: &ScenarioUnit,
    ) -> ScenarioReport {
        let metadata = unit.metadata();
        if unit.is_ignored() {
            log::warn!("skipping scenario '{}': tagged @ignore", unit.name);
            return ScenarioReport {
                metadata,
                status: ScenarioStatus::Skipped {
                    reason: "tagged @ignore".to_owned(),
                },
                cleanup: None,
            };
        }

        let outcome = match self.plan(unit) {
            Ok(steps) => group.run_async(&self.registry, &steps).await,
            Err(err) => ScenarioOutcome {
                result: Err(err.into()),
                cleanup: None,
            },
        };
        let report = Self::report(metadata, outcome);
        match &report.status {
            ScenarioStatus::Passed { steps } => {
                log::info!("scenario '{}' passed ({steps} steps)", unit.name);
            }
            ScenarioStatus::Failed(err) => log::info!("scenario '{}' failed: {err}", unit.name),
            ScenarioStatus::Skipped { .. } => {}
        }
        report
    }

    fn report(metadata: ScenarioMetadata, outcome: ScenarioOutcome) -> ScenarioReport {
        let ScenarioOutcome { result, cleanup } = outcome;
        let (status, cleanup) = match (result, cleanup) {
            (Ok(_), Some(fault)) if config::fail_on_cleanup() => {
                (ScenarioStatus::Failed(ScenarioError::Cleanup(fault)), None)
            }
            (Ok(report), cleanup) => (
                ScenarioStatus::Passed {
                    steps: report.steps_run,
                },
                cleanup,
            ),
            (Err(err), cleanup) => (ScenarioStatus::Failed(err), cleanup),
        };
        ScenarioReport {
            metadata,
            status,
            cleanup,
        }
    }

    /// Run `unit` through `harness`.
    pub fn run_unit<H: HarnessAdapter>(
        &self,
        harness: &H,
        group: &mut ScenarioGroup<W>,
        unit: &ScenarioUnit,
    ) -> ScenarioReport {
        let request = ScenarioRunRequest::new(
            unit.metadata(),
            ScenarioRunner::new(self.run_unit_async(group, unit)),
        );
        harness.run(request)
    }

    /// Run every unit through `harness` in one scenario group.
    pub fn run_all<H: HarnessAdapter>(&self, harness: &H) -> FeatureReport {
        let mut group = ScenarioGroup::new();
        let scenarios = self
            .units
            .iter()
            .map(|unit| self.run_unit(harness, &mut group, unit))
            .collect();
        group.finish();
        FeatureReport {
            path: self.path.clone(),
            scenarios,
        }
    }

    /// Run the unit called `name` in a fresh scenario group.
    ///
    /// Returns `None` when the feature has no such unit.
    pub fn run_named<H: HarnessAdapter>(&self, harness: &H, name: &str) -> Option<ScenarioReport> {
        let unit = self.unit(name)?;
        let mut group = ScenarioGroup::new();
        Some(self.run_unit(harness, &mut group, unit))
    }
}
