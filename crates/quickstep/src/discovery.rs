//! Feature loading and runnable-unit enumeration.
//!
//! A feature yields one [`ScenarioUnit`] per plain scenario and one per
//! Examples row of a Scenario Outline. Units carry the union of feature,
//! rule, scenario, and Examples tags in `@tag` form.

use crate::assembler::ExampleRow;
use crate::config;
use crate::definition::{FeatureSteps, feature_file};
use crate::recovery;
use camino::{Utf8Path, Utf8PathBuf};
use gherkin::GherkinEnv;
use quickstep_harness::ScenarioMetadata;
use thiserror::Error;

/// Tag that marks a unit as skipped.
pub const IGNORE_TAG: &str = "@ignore";

/// Failure to read or parse a feature file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read feature file {path}: {source}")]
    Io {
        /// The path that was read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid Gherkin.
    #[error("failed to parse feature file {path}: {source}")]
    Parse {
        /// The path that was parsed.
        path: Utf8PathBuf,
        /// Parser error.
        #[source]
        source: gherkin::ParseError,
    },
}

fn normalise_trailing_newline(text: &mut String) {
    if !text.ends_with('\n') {
        text.push('\n');
    }
}

/// Parse feature text held in memory.
///
/// A background or scenario that opens with `And` or `But` does not fail the
/// whole document: the step keeps its conjunction keyword and only the units
/// that use the sequence fail, when they are planned.
///
/// # Errors
///
/// Returns [`LoadError::Parse`] when `text` is not valid Gherkin. `path` is
/// only used to label the error.
pub fn parse_feature(text: &str, path: &Utf8Path) -> Result<gherkin::Feature, LoadError> {
    let mut source = text.to_owned();
    normalise_trailing_newline(&mut source);
    match gherkin::Feature::parse(&source, GherkinEnv::default()) {
        Ok(feature) => Ok(feature),
        Err(err) => recovery::recover(&source).ok_or_else(|| LoadError::Parse {
            path: path.to_owned(),
            source: err,
        }),
    }
}

/// Read and parse the feature file at `path`.
///
/// # Errors
///
/// Returns [`LoadError`] when the file cannot be read or parsed.
pub fn load_feature(path: &Utf8Path) -> Result<gherkin::Feature, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })?;
    parse_feature(&text, path)
}

/// The resolved location of `W`'s feature file.
///
/// Relative identifiers are joined onto [`config::feature_root`].
#[must_use]
pub fn feature_path_for<W: FeatureSteps>() -> Utf8PathBuf {
    config::resolve_feature_path(Utf8Path::new(&feature_file::<W>()))
}

/// Normalise `tag` to `@tag` form.
#[must_use]
pub fn normalise_tag(tag: &str) -> String {
    let trimmed = tag.trim();
    if trimmed.starts_with('@') {
        trimmed.to_owned()
    } else {
        format!("@{trimmed}")
    }
}

/// Extend `target` with `additions`, keeping first-seen order and dropping
/// duplicates.
fn extend_tags(target: &mut Vec<String>, additions: &[String]) {
    for tag in additions.iter().map(|tag| normalise_tag(tag)) {
        if !target.contains(&tag) {
            target.push(tag);
        }
    }
}

/// Return `true` when `tags` contain [`IGNORE_TAG`].
#[must_use]
pub fn is_ignored(tags: &[String]) -> bool {
    tags.iter().any(|tag| normalise_tag(tag) == IGNORE_TAG)
}

/// One runnable scenario, or one Examples row of an outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioUnit {
    /// Display name; outline rows carry an `(example N: col=value)` suffix.
    pub name: String,
    /// The feature file the unit came from.
    pub feature_path: Utf8PathBuf,
    /// Source line of the scenario.
    pub line: usize,
    /// Inherited and own tags in `@tag` form.
    pub tags: Vec<String>,
    /// Index of the enclosing rule within the feature.
    pub rule: Option<usize>,
    /// Index of the scenario within the feature or rule.
    pub scenario: usize,
    /// The Examples row for outline units.
    pub example: Option<ExampleRow>,
}

impl ScenarioUnit {
    /// The enclosing rule, if any.
    #[must_use]
    pub fn rule<'f>(&self, feature: &'f gherkin::Feature) -> Option<&'f gherkin::Rule> {
        self.rule.and_then(|index| feature.rules.get(index))
    }

    /// The scenario this unit runs.
    #[must_use]
    pub fn scenario<'f>(&self, feature: &'f gherkin::Feature) -> Option<&'f gherkin::Scenario> {
        self.rule.map_or_else(
            || feature.scenarios.get(self.scenario),
            |index| {
                feature
                    .rules
                    .get(index)
                    .and_then(|rule| rule.scenarios.get(self.scenario))
            },
        )
    }

    /// Return `true` when the unit is tagged `@ignore`.
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        is_ignored(&self.tags)
    }

    /// Harness metadata describing this unit.
    #[must_use]
    pub fn metadata(&self) -> ScenarioMetadata {
        let line = u32::try_from(self.line).unwrap_or(u32::MAX);
        let metadata = ScenarioMetadata::new(
            self.feature_path.as_str(),
            self.name.as_str(),
            line,
            self.tags.clone(),
        );
        if let Some(example) = &self.example {
            return metadata.with_example_row(example.ordinal);
        }
        metadata
    }
}

/// Enumerate the runnable units of `feature`, in document order.
///
/// Scenarios directly under the feature come before those inside rules.
/// Examples blocks without a table contribute no rows; an outline with no
/// rows at all yields a single unit with its steps as written.
#[must_use]
pub fn discover(feature: &gherkin::Feature, feature_path: &Utf8Path) -> Vec<ScenarioUnit> {
    let mut base = Vec::new();
    extend_tags(&mut base, &feature.tags);

    let mut units = Vec::new();
    for (index, scenario) in feature.scenarios.iter().enumerate() {
        push_units(&mut units, &base, feature_path, None, index, scenario);
    }
    for (rule_index, rule) in feature.rules.iter().enumerate() {
        let mut rule_tags = base.clone();
        extend_tags(&mut rule_tags, &rule.tags);
        for (index, scenario) in rule.scenarios.iter().enumerate() {
            push_units(
                &mut units,
                &rule_tags,
                feature_path,
                Some(rule_index),
                index,
                scenario,
            );
        }
    }
    log::debug!("discovered {} units in {feature_path}", units.len());
    units
}

fn push_units(
    units: &mut Vec<ScenarioUnit>,
    inherited: &[String],
    feature_path: &Utf8Path,
    rule: Option<usize>,
    index: usize,
    scenario: &gherkin::Scenario,
) {
    let mut tags = inherited.to_vec();
    extend_tags(&mut tags, &scenario.tags);
    let plain = ScenarioUnit {
        name: scenario.name.clone(),
        feature_path: feature_path.to_owned(),
        line: scenario.position.line,
        tags,
        rule,
        scenario: index,
        example: None,
    };

    let mut ordinal = 0;
    for examples in &scenario.examples {
        let Some(table) = examples.table.as_ref() else {
            continue;
        };
        let Some((headers, rows)) = table.rows.split_first() else {
            continue;
        };
        let mut row_tags = plain.tags.clone();
        extend_tags(&mut row_tags, &examples.tags);
        for values in rows {
            let example = ExampleRow {
                headers: headers.clone(),
                values: values.clone(),
                ordinal,
            };
            ordinal += 1;
            units.push(ScenarioUnit {
                name: format!(
                    "{} (example {ordinal}: {})",
                    scenario.name,
                    example.describe()
                ),
                tags: row_tags.clone(),
                example: Some(example),
                ..plain.clone()
            });
        }
    }
    if ordinal == 0 {
        units.push(plain);
    }
}
