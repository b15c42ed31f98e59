//! Scenario assembly: backgrounds first, then the scenario's own steps.

use crate::argument::{DataTable, DocString, StepArgument};
use crate::error::DefinitionError;
use crate::keyword::normalize;
use quickstep_patterns::{PlaceholderError, StepKeyword, substitute_placeholders};

/// A document step ready for binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    /// Position within the assembled plan, starting at zero.
    pub index: usize,
    /// The keyword as written.
    pub keyword: StepKeyword,
    /// The keyword used for lookup after conjunction inheritance.
    pub effective: StepKeyword,
    /// The step text after the keyword.
    pub text: String,
    /// The step's table or doc string.
    pub argument: Option<StepArgument>,
    /// Source line of the step.
    pub line: usize,
}

/// One row of an outline's Examples table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleRow {
    /// Column names from the table's first row.
    pub headers: Vec<String>,
    /// Cell values aligned with `headers`.
    pub values: Vec<String>,
    /// Position of the row across every Examples table of the outline,
    /// starting at zero.
    pub ordinal: usize,
}

impl ExampleRow {
    /// Replace `<column>` tokens in `text` with this row's values.
    ///
    /// # Errors
    ///
    /// Returns [`PlaceholderError`] for tokens naming an unknown column.
    pub fn substitute(&self, text: &str) -> Result<String, PlaceholderError> {
        substitute_placeholders(text, &self.headers, &self.values)
    }

    fn substitute_argument(
        &self,
        argument: StepArgument,
    ) -> Result<StepArgument, PlaceholderError> {
        match argument {
            StepArgument::DocString(doc) => {
                Ok(StepArgument::DocString(DocString::from(self.substitute(&doc)?)))
            }
            StepArgument::Table(table) => {
                let rows = table
                    .iter()
                    .map(|row| row.iter().map(|cell| self.substitute(cell)).collect())
                    .collect::<Result<Vec<Vec<String>>, _>>()?;
                Ok(StepArgument::Table(DataTable::from(rows)))
            }
        }
    }

    /// `column=value` pairs joined by commas, for scenario names.
    #[must_use]
    pub fn describe(&self) -> String {
        self.headers
            .iter()
            .zip(&self.values)
            .map(|(header, value)| format!("{header}={value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Assemble the steps of `scenario` with its backgrounds.
///
/// The feature's background comes first, then the background of `rule`
/// when the scenario sits under one, then the scenario's steps. Each
/// sequence resolves conjunctions on its own. Text and block arguments are
/// kept as written.
///
/// # Errors
///
/// Returns [`DefinitionError::LeadingConjunction`] when any sequence opens
/// with `And`, `But`, or `*`.
pub fn assemble(
    feature: &gherkin::Feature,
    rule: Option<&gherkin::Rule>,
    scenario: &gherkin::Scenario,
) -> Result<Vec<PlannedStep>, DefinitionError> {
    assemble_with(feature, rule, scenario, None)
}

/// Assemble one example of a Scenario Outline.
///
/// Behaves like [`assemble`], then substitutes `<column>` tokens in the
/// scenario's step text, doc strings, and table cells. Background steps are
/// not substituted.
///
/// # Errors
///
/// Returns [`DefinitionError::UnknownPlaceholder`] for tokens naming a column
/// the row lacks, or any error [`assemble`] reports.
pub fn assemble_example(
    feature: &gherkin::Feature,
    rule: Option<&gherkin::Rule>,
    scenario: &gherkin::Scenario,
    example: &ExampleRow,
) -> Result<Vec<PlannedStep>, DefinitionError> {
    assemble_with(feature, rule, scenario, Some(example))
}

fn assemble_with(
    feature: &gherkin::Feature,
    rule: Option<&gherkin::Rule>,
    scenario: &gherkin::Scenario,
    example: Option<&ExampleRow>,
) -> Result<Vec<PlannedStep>, DefinitionError> {
    let mut plan = Vec::new();
    let backgrounds = feature
        .background
        .iter()
        .chain(rule.and_then(|rule| rule.background.as_ref()));
    for background in backgrounds {
        extend_plan(&mut plan, &background.steps, None, &scenario.name)?;
    }
    extend_plan(&mut plan, &scenario.steps, example, &scenario.name)?;
    Ok(plan)
}

fn extend_plan(
    plan: &mut Vec<PlannedStep>,
    steps: &[gherkin::Step],
    example: Option<&ExampleRow>,
    scenario: &str,
) -> Result<(), DefinitionError> {
    let unknown = |source| DefinitionError::UnknownPlaceholder {
        scenario: scenario.to_owned(),
        source,
    };
    for normalized in normalize(steps)? {
        let step = normalized.step;
        let mut text = step.value.clone();
        let mut argument = StepArgument::from_step(step);
        if let Some(example) = example {
            text = example.substitute(&text).map_err(unknown)?;
            argument = argument
                .map(|argument| example.substitute_argument(argument))
                .transpose()
                .map_err(unknown)?;
        }
        plan.push(PlannedStep {
            index: plan.len(),
            keyword: normalized.raw,
            effective: normalized.effective,
            text,
            argument,
            line: step.position.line,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::parse_feature;

    fn summary(plan: &[PlannedStep]) -> Vec<(usize, StepKeyword, &str)> {
        plan.iter()
            .map(|step| (step.index, step.effective, step.text.as_str()))
            .collect()
    }

    #[test]
    fn backgrounds_precede_scenario_steps() {
        let feature = parse_feature(
            "Feature: Accounts
  Background:
    Given a bank
    And an open branch

  Rule: Overdrafts
    Background:
      Given an account with overdraft

    Scenario: Withdraw
      When I withdraw 10
      Then the balance is -10
",
        );
        let Some(rule) = feature.rules.first() else {
            panic!("expected a rule");
        };
        let Some(scenario) = rule.scenarios.first() else {
            panic!("expected a scenario");
        };
        let plan = assemble(&feature, Some(rule), scenario)
            .unwrap_or_else(|err| panic!("scenario should assemble: {err}"));
        assert_eq!(
            summary(&plan),
            [
                (0, StepKeyword::Given, "a bank"),
                (1, StepKeyword::Given, "an open branch"),
                (2, StepKeyword::Given, "an account with overdraft"),
                (3, StepKeyword::When, "I withdraw 10"),
                (4, StepKeyword::Then, "the balance is -10"),
            ]
        );
        assert_eq!(plan.get(1).map(|step| step.keyword), Some(StepKeyword::And));
    }

    #[test]
    fn scenario_does_not_inherit_from_background() {
        let feature = parse_feature(
            "Feature: Orphans
  Background:
    Given a setup step

  Scenario: Leading conjunction
    And a dangling step
",
        );
        let Some(scenario) = feature.scenarios.first() else {
            panic!("expected a scenario");
        };
        let result = assemble(&feature, None, scenario);
        assert!(matches!(
            result,
            Err(DefinitionError::LeadingConjunction { index: 0, .. })
        ));
    }

    #[test]
    fn block_arguments_are_preserved() {
        let feature = parse_feature(
            r#"Feature: Arguments
  Scenario: Both kinds
    Given the users:
      | name | age |
      | Ada  | 36  |
    Then the report reads:
      """
      Ada is 36
      """
"#,
        );
        let Some(scenario) = feature.scenarios.first() else {
            panic!("expected a scenario");
        };
        let plan = assemble(&feature, None, scenario)
            .unwrap_or_else(|err| panic!("scenario should assemble: {err}"));
        let Some(StepArgument::Table(table)) = plan.first().and_then(|s| s.argument.clone())
        else {
            panic!("expected a table");
        };
        assert_eq!(table.cell(1, 0), Some("Ada"));
        let Some(StepArgument::DocString(doc)) = plan.get(1).and_then(|s| s.argument.clone())
        else {
            panic!("expected a doc string");
        };
        assert_eq!(doc.as_str(), "Ada is 36");
    }

    #[test]
    fn example_rows_substitute_text_and_arguments() {
        let feature = parse_feature(
            "Feature: Outlines
  Scenario Outline: Eating
    Given there are <start> cucumbers
    When I eat <eat> cucumbers
      | who   | count |
      | <who> | <eat> |
    Then I should have <left> cucumbers

    Examples:
      | start | eat | left | who |
      | 12    | 5   | 7    | Ann |
",
        );
        let Some(scenario) = feature.scenarios.first() else {
            panic!("expected a scenario");
        };
        let example = ExampleRow {
            headers: vec!["start".into(), "eat".into(), "left".into(), "who".into()],
            values: vec!["12".into(), "5".into(), "7".into(), "Ann".into()],
            ordinal: 0,
        };
        let plan = assemble_example(&feature, None, scenario, &example)
            .unwrap_or_else(|err| panic!("example should assemble: {err}"));
        assert_eq!(
            summary(&plan),
            [
                (0, StepKeyword::Given, "there are 12 cucumbers"),
                (1, StepKeyword::When, "I eat 5 cucumbers"),
                (2, StepKeyword::Then, "I should have 7 cucumbers"),
            ]
        );
        let Some(StepArgument::Table(table)) = plan.get(1).and_then(|s| s.argument.clone())
        else {
            panic!("expected a table");
        };
        assert_eq!(table.cell(1, 0), Some("Ann"));
        assert_eq!(table.cell(1, 1), Some("5"));
        assert_eq!(example.describe(), "start=12, eat=5, left=7, who=Ann");
    }

    #[test]
    fn unknown_columns_are_reported() {
        let feature = parse_feature(
            "Feature: Outlines
  Scenario Outline: Typo
    Given there are <strat> cucumbers

    Examples:
      | start |
      | 12    |
",
        );
        let Some(scenario) = feature.scenarios.first() else {
            panic!("expected a scenario");
        };
        let example = ExampleRow {
            headers: vec!["start".into()],
            values: vec!["12".into()],
            ordinal: 0,
        };
        let Err(DefinitionError::UnknownPlaceholder { scenario, source }) =
            assemble_example(&feature, None, scenario, &example)
        else {
            panic!("expected unknown placeholder");
        };
        assert_eq!(scenario, "Typo");
        assert_eq!(source.placeholder, "strat");
    }

    #[test]
    fn assembling_twice_is_deterministic() {
        let feature = parse_feature(
            "Feature: Repeat
  Scenario: Twice
    Given one
    * two
",
        );
        let Some(scenario) = feature.scenarios.first() else {
            panic!("expected a scenario");
        };
        let first = assemble(&feature, None, scenario);
        let second = assemble(&feature, None, scenario);
        assert_eq!(first.ok(), second.ok());
    }
}
