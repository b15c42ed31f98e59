//! Step binding: choose a handler for each planned step and convert its
//! arguments.

use crate::assembler::PlannedStep;
use crate::error::{BindingError, ScenarioError};
use crate::registry::{Candidate, HandlerDescriptor, StepRegistry};
use crate::value::{ParamSpec, StepValue};
use quickstep_patterns::StepKeyword;
use std::fmt;

/// A planned step paired with its handler and converted arguments.
pub struct StepBinding<'r, W> {
    /// The step being bound.
    pub step: PlannedStep,
    /// The chosen handler.
    pub handler: &'r HandlerDescriptor<W>,
    /// Converted captures, followed by the block argument when the handler
    /// takes one.
    pub arguments: Vec<StepValue>,
}

impl<W> PartialEq for StepBinding<'_, W> {
    fn eq(&self, other: &Self) -> bool {
        self.step == other.step
            && self.handler.id() == other.handler.id()
            && self.arguments == other.arguments
    }
}

impl<W> fmt::Debug for StepBinding<'_, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepBinding")
            .field("step", &self.step)
            .field("handler", &self.handler.name())
            .field("arguments", &self.arguments)
            .finish()
    }
}

/// The bindings of one scenario, background steps first.
pub struct ScenarioPlan<'r, W> {
    bindings: Vec<StepBinding<'r, W>>,
}

impl<'r, W> ScenarioPlan<'r, W> {
    /// Borrow the bindings in execution order.
    #[must_use]
    pub fn bindings(&self) -> &[StepBinding<'r, W>] {
        &self.bindings
    }

    /// Number of bound steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Return `true` when the scenario has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<'r, W> IntoIterator for ScenarioPlan<'r, W> {
    type Item = StepBinding<'r, W>;
    type IntoIter = std::vec::IntoIter<StepBinding<'r, W>>;

    fn into_iter(self) -> Self::IntoIter {
        self.bindings.into_iter()
    }
}

impl<'r, W> FromIterator<StepBinding<'r, W>> for ScenarioPlan<'r, W> {
    fn from_iter<I: IntoIterator<Item = StepBinding<'r, W>>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}

impl<W> PartialEq for ScenarioPlan<'_, W> {
    fn eq(&self, other: &Self) -> bool {
        self.bindings == other.bindings
    }
}

impl<W> fmt::Debug for ScenarioPlan<'_, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.bindings).finish()
    }
}

/// Keywords to search, in order, for a step.
///
/// The effective keyword comes first. A step written as `And` or `But` then
/// falls back to handlers declared under that conjunction, and every step
/// finally falls back to wildcard declarations.
fn lookup_order(step: &PlannedStep) -> Vec<StepKeyword> {
    let mut order = vec![step.effective];
    if matches!(step.keyword, StepKeyword::And | StepKeyword::But) {
        order.push(step.keyword);
    }
    if step.effective != StepKeyword::Wildcard {
        order.push(StepKeyword::Wildcard);
    }
    order
}

fn find_match<'r, W>(
    step: &PlannedStep,
    registry: &'r StepRegistry<W>,
) -> Option<(Candidate<'r, W>, Vec<String>)> {
    lookup_order(step).into_iter().find_map(|keyword| {
        registry.candidates(keyword).find_map(|candidate| {
            candidate
                .pattern
                .captures(&step.text)
                .map(|captures| (candidate, captures))
        })
    })
}

fn convert_captures(
    step: &PlannedStep,
    specs: &[ParamSpec],
    captures: Vec<String>,
) -> Result<Vec<StepValue>, BindingError> {
    specs
        .iter()
        .zip(captures)
        .enumerate()
        .map(|(parameter, (spec, value))| {
            spec.parse(&value)
                .map_err(|reason| BindingError::Conversion {
                    text: step.text.clone(),
                    parameter,
                    expected: spec.type_name(),
                    value,
                    reason,
                })
        })
        .collect()
}

fn structured_value(
    step: &PlannedStep,
    expected: Option<&ParamSpec>,
) -> Result<Option<StepValue>, BindingError> {
    let expected = expected.map(ParamSpec::kind).filter(|kind| kind.is_structured());
    match (expected, step.argument.as_ref()) {
        (None, None) => Ok(None),
        (Some(expected), Some(argument)) if argument.kind() == expected => {
            Ok(Some(StepValue::from(argument.clone())))
        }
        (Some(expected), Some(argument)) => Err(BindingError::ArgumentKindMismatch {
            text: step.text.clone(),
            expected,
            found: argument.kind(),
        }),
        (None, Some(argument)) => Err(BindingError::UnexpectedArgument {
            text: step.text.clone(),
            found: argument.kind(),
        }),
        (Some(expected), None) => Err(BindingError::MissingArgument {
            text: step.text.clone(),
            expected,
        }),
    }
}

/// Bind one planned step against `registry`.
///
/// Candidates are tried under the effective keyword, then under the raw
/// `And`/`But` keyword, then under the wildcard. Within each keyword the
/// first matching declaration wins; see [`StepRegistry::candidates`].
///
/// # Errors
///
/// Returns [`BindingError::NotFound`] when no pattern matches, a conversion
/// error when a capture does not fit its parameter, or a structured
/// argument error when the step's table or doc string disagrees with the
/// handler.
pub fn bind<'r, W>(
    step: &PlannedStep,
    registry: &'r StepRegistry<W>,
) -> Result<StepBinding<'r, W>, BindingError> {
    let Some((candidate, captures)) = find_match(step, registry) else {
        return Err(BindingError::NotFound {
            keyword: step.effective,
            text: step.text.clone(),
        });
    };
    let handler = candidate.handler;
    let params = handler.params();
    let mut arguments = convert_captures(step, params, captures)?;
    if let Some(value) = structured_value(step, params.last())? {
        arguments.push(value);
    }
    log::debug!(
        "bound step {} `{} {}` to {}::{}",
        step.index,
        step.keyword,
        step.text,
        handler.owner(),
        handler.name()
    );
    Ok(StepBinding {
        step: step.clone(),
        handler,
        arguments,
    })
}

/// Bind every step of a plan, stopping at the first failure.
///
/// # Errors
///
/// Returns [`ScenarioError::Binding`] carrying the failing step's index.
pub fn bind_plan<'r, W>(
    steps: &[PlannedStep],
    registry: &'r StepRegistry<W>,
) -> Result<ScenarioPlan<'r, W>, ScenarioError> {
    steps
        .iter()
        .map(|step| {
            bind(step, registry).map_err(|source| ScenarioError::Binding {
                index: step.index,
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::{DataTable, DocString, StepArgument};
    use crate::assembler::assemble;
    use crate::registry::RegistryBuilder;
    use crate::test_support::parse_feature;
    use rstest::{fixture, rstest};

    #[derive(Default)]
    struct Shop {
        log: Vec<String>,
    }

    fn planned(keyword: StepKeyword, effective: StepKeyword, text: &str) -> PlannedStep {
        PlannedStep {
            index: 0,
            keyword,
            effective,
            text: text.to_owned(),
            argument: None,
            line: 1,
        }
    }

    #[fixture]
    fn registry() -> StepRegistry<Shop> {
        let mut steps = RegistryBuilder::<Shop>::new();
        steps.given(r"I have (\d+) (\w+)", |shop: &mut Shop, (n, item): (u32, String)| {
            shop.log.push(format!("{n} {item}"));
        });
        steps.given("the price list:", |shop: &mut Shop, (table,): (DataTable,)| {
            shop.log.push(format!("{} rows", table.len()));
        });
        steps.then("the receipt reads:", |shop: &mut Shop, (doc,): (DocString,)| {
            shop.log.push(doc.to_string());
        });
        steps.and("a loyalty card", |shop: &mut Shop, ()| shop.log.push("card".into()));
        steps.star("I wait", |shop: &mut Shop, ()| shop.log.push("wait".into()));
        steps.when(r"I pay (true|false|maybe)", |shop: &mut Shop, (cash,): (bool,)| {
            shop.log.push(cash.to_string());
        });
        steps
            .build()
            .unwrap_or_else(|err| panic!("registry should build: {err}"))
    }

    #[rstest]
    fn captures_convert_positionally(registry: StepRegistry<Shop>) {
        let step = planned(StepKeyword::Given, StepKeyword::Given, "I have 3 apples");
        let binding = bind(&step, &registry).unwrap_or_else(|err| panic!("should bind: {err}"));
        assert_eq!(
            binding.arguments,
            [StepValue::Integer(3), StepValue::Text("apples".into())]
        );
    }

    #[rstest]
    fn unmatched_steps_are_not_found(registry: StepRegistry<Shop>) {
        let step = planned(StepKeyword::Then, StepKeyword::Then, "I have 3 apples");
        assert_eq!(
            bind(&step, &registry).err(),
            Some(BindingError::NotFound {
                keyword: StepKeyword::Then,
                text: "I have 3 apples".into(),
            })
        );
    }

    #[rstest]
    fn conversion_failures_name_the_parameter(registry: StepRegistry<Shop>) {
        let step = planned(StepKeyword::When, StepKeyword::When, "I pay maybe");
        let Err(BindingError::Conversion {
            parameter,
            expected,
            value,
            ..
        }) = bind(&step, &registry)
        else {
            panic!("expected conversion failure");
        };
        assert_eq!((parameter, expected, value.as_str()), (0, "bool", "maybe"));
    }

    #[rstest]
    fn conjunction_falls_back_to_its_raw_keyword(registry: StepRegistry<Shop>) {
        let step = planned(StepKeyword::And, StepKeyword::Given, "a loyalty card");
        assert!(bind(&step, &registry).is_ok());
        let step = planned(StepKeyword::Given, StepKeyword::Given, "a loyalty card");
        assert!(bind(&step, &registry).is_err());
    }

    fn scenario_plan(text: &str) -> Vec<PlannedStep> {
        let feature = parse_feature(text);
        let Some(scenario) = feature.scenarios.first() else {
            panic!("expected a scenario");
        };
        assemble(&feature, None, scenario)
            .unwrap_or_else(|err| panic!("scenario should assemble: {err}"))
    }

    #[rstest]
    #[case::english("Feature: Shop\n  Scenario: Card\n    Given I have 1 pear\n    And a loyalty card\n")]
    #[case::french(
        "# language: fr\nFonctionnalité: Boutique\n  Scénario: Carte\n    Soit I have 1 pear\n    Et a loyalty card\n"
    )]
    fn written_conjunctions_reach_their_handlers(
        registry: StepRegistry<Shop>,
        #[case] text: &str,
    ) {
        let steps = scenario_plan(text);
        let plan = bind_plan(&steps, &registry).unwrap_or_else(|err| panic!("should bind: {err}"));
        let names: Vec<&str> = plan.bindings().iter().map(|b| b.handler.name()).collect();
        assert_eq!(names, [r"I have (\d+) (\w+)", "a loyalty card"]);
    }

    #[rstest]
    #[case::general_first(&[r"I have \d+ \w+", "I have 3 apples"])]
    #[case::exact_first(&["I have 3 apples", r"I have \d+ \w+"])]
    fn first_registered_overlapping_pattern_wins(#[case] patterns: &[&str]) {
        let mut steps = RegistryBuilder::<Shop>::new();
        for pattern in patterns {
            steps
                .handler(|shop: &mut Shop, ()| shop.log.push("matched".into()))
                .named(*pattern)
                .given(*pattern);
        }
        let registry = steps
            .build()
            .unwrap_or_else(|err| panic!("registry should build: {err}"));
        let plan = scenario_plan("Feature: Shop\n  Scenario: Overlap\n    Given I have 3 apples\n");
        let Some(step) = plan.first() else {
            panic!("expected one step");
        };
        let binding = bind(step, &registry).unwrap_or_else(|err| panic!("should bind: {err}"));
        assert_eq!(Some(binding.handler.name()), patterns.first().copied());
    }

    #[rstest]
    #[case(StepKeyword::Given, StepKeyword::Given)]
    #[case(StepKeyword::But, StepKeyword::Then)]
    #[case(StepKeyword::Wildcard, StepKeyword::When)]
    fn wildcard_declarations_match_any_keyword(
        registry: StepRegistry<Shop>,
        #[case] keyword: StepKeyword,
        #[case] effective: StepKeyword,
    ) {
        let step = planned(keyword, effective, "I wait");
        assert!(bind(&step, &registry).is_ok());
    }

    #[rstest]
    fn tables_bind_as_the_last_argument(registry: StepRegistry<Shop>) {
        let table = DataTable::from(vec![vec!["apple".to_string(), "1".to_string()]]);
        let mut step = planned(StepKeyword::Given, StepKeyword::Given, "the price list:");
        step.argument = Some(StepArgument::Table(table.clone()));
        let binding = bind(&step, &registry).unwrap_or_else(|err| panic!("should bind: {err}"));
        assert_eq!(binding.arguments, [StepValue::Table(table)]);
    }

    #[rstest]
    fn missing_and_mismatched_arguments_are_reported(registry: StepRegistry<Shop>) {
        let step = planned(StepKeyword::Then, StepKeyword::Then, "the receipt reads:");
        assert!(matches!(
            bind(&step, &registry),
            Err(BindingError::MissingArgument { .. })
        ));

        let mut step = step;
        step.argument = Some(StepArgument::Table(DataTable::default()));
        assert!(matches!(
            bind(&step, &registry),
            Err(BindingError::ArgumentKindMismatch { .. })
        ));
    }

    #[rstest]
    fn unexpected_arguments_are_reported(registry: StepRegistry<Shop>) {
        let mut step = planned(StepKeyword::Given, StepKeyword::Given, "I have 1 pear");
        step.argument = Some(StepArgument::DocString(DocString::from("note")));
        assert!(matches!(
            bind(&step, &registry),
            Err(BindingError::UnexpectedArgument { .. })
        ));
    }

    #[rstest]
    fn plan_errors_carry_the_step_index(registry: StepRegistry<Shop>) {
        let mut steps = vec![
            planned(StepKeyword::Given, StepKeyword::Given, "I have 1 pear"),
            planned(StepKeyword::When, StepKeyword::When, "I dance"),
        ];
        if let Some(step) = steps.get_mut(1) {
            step.index = 1;
        }
        let Err(err) = bind_plan(&steps, &registry) else {
            panic!("expected binding failure");
        };
        assert_eq!(err.step_index(), Some(1));
    }
}
