//! The six step keywords.
//!
//! Declared keywords and document keywords are compared through the same
//! [`StepKeyword`] type in the registry, the normalizer and the binder.

use gherkin::StepType;
use std::fmt;
use std::str::FromStr;

/// Keyword used to categorise a step definition or a document step.
///
/// `Given`, `When`, and `Then` are concrete keywords. `And`, `But`, and the
/// wildcard `*` are conjunctions: inside a scenario they inherit the last
/// concrete keyword seen (see [`inherit`](Self::inherit)). Handlers may still
/// declare any of the six keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StepKeyword {
    /// `Given`: arranges state.
    Given,
    /// `When`: performs the action under test.
    When,
    /// `Then`: checks an outcome.
    Then,
    /// `And`: continues the previous keyword.
    And,
    /// `But`: continues the previous keyword.
    But,
    /// `*`: continues the previous keyword; handlers declared under it match
    /// every effective keyword.
    Wildcard,
}

impl StepKeyword {
    /// Return the keyword as it appears in a feature file.
    ///
    /// # Examples
    ///
    /// ```
    /// use quickstep_patterns::StepKeyword;
    ///
    /// assert_eq!(StepKeyword::Given.as_str(), "Given");
    /// assert_eq!(StepKeyword::Wildcard.as_str(), "*");
    /// ```
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
            Self::And => "And",
            Self::But => "But",
            Self::Wildcard => "*",
        }
    }

    /// Return `true` for `Given`, `When`, and `Then`.
    #[must_use]
    pub const fn is_concrete(self) -> bool {
        matches!(self, Self::Given | Self::When | Self::Then)
    }

    /// Return `true` for `And`, `But`, and `*`.
    #[must_use]
    pub const fn is_conjunction(self) -> bool {
        !self.is_concrete()
    }

    /// Resolve this keyword against the last concrete keyword of a sequence.
    ///
    /// Concrete keywords resolve to themselves. Conjunctions resolve to
    /// `last`, which is `None` when the conjunction leads the sequence.
    ///
    /// # Examples
    ///
    /// ```
    /// use quickstep_patterns::StepKeyword;
    ///
    /// assert_eq!(StepKeyword::And.inherit(Some(StepKeyword::When)), Some(StepKeyword::When));
    /// assert_eq!(StepKeyword::Then.inherit(Some(StepKeyword::When)), Some(StepKeyword::Then));
    /// assert_eq!(StepKeyword::But.inherit(None), None);
    /// ```
    #[must_use]
    pub const fn inherit(self, last: Option<Self>) -> Option<Self> {
        if self.is_concrete() { Some(self) } else { last }
    }

    /// Classify the written keywords of one step sequence.
    ///
    /// English keywords are read from their text, so `And`, `But`, and `*`
    /// survive parsing. Other languages are read by position: the parser types
    /// a localized conjunction with the step type it continues, so a step whose
    /// keyword text differs from the text that opened the current run of its
    /// type is reported as [`And`](Self::And). Localized `And` and `But` are not
    /// told apart.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedStepType`] when a step type has no keyword
    /// counterpart.
    ///
    /// # Examples
    ///
    /// ```
    /// use gherkin::{Feature, GherkinEnv};
    /// use quickstep_patterns::StepKeyword;
    ///
    /// let text = "# language: fr\nFonctionnalité: Panier\n  Scénario: Ajout\n    Soit un panier\n    Et une pomme\n    Quand je pèse\n";
    /// let feature = Feature::parse(text, GherkinEnv::default()).unwrap_or_else(|e| panic!("{e}"));
    /// let steps = feature.scenarios.first().map(|s| s.steps.as_slice()).unwrap_or_default();
    /// assert_eq!(
    ///     StepKeyword::classify(steps),
    ///     Ok(vec![StepKeyword::Given, StepKeyword::And, StepKeyword::When])
    /// );
    /// ```
    pub fn classify(steps: &[gherkin::Step]) -> Result<Vec<Self>, UnsupportedStepType> {
        let mut opener: Option<(StepType, &str)> = None;
        steps
            .iter()
            .map(|step| {
                let written = step.keyword.trim();
                if let Ok(keyword) = written.parse::<Self>() {
                    if keyword.is_concrete() {
                        opener = Some((step.ty, written));
                    }
                    return Ok(keyword);
                }
                match opener {
                    Some((ty, text)) if ty == step.ty && text != written => Ok(Self::And),
                    _ => {
                        opener = Some((step.ty, written));
                        Self::try_from(step.ty)
                    }
                }
            })
            .collect()
    }
}

impl fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text that names none of the six keywords.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid step keyword: {0}")]
pub struct StepKeywordParseError(pub String);

impl FromStr for StepKeyword {
    type Err = StepKeywordParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let word = value.trim();
        [
            Self::Given,
            Self::When,
            Self::Then,
            Self::And,
            Self::But,
            Self::Wildcard,
        ]
        .into_iter()
        .find(|keyword| keyword.as_str().eq_ignore_ascii_case(word))
        .ok_or_else(|| StepKeywordParseError(word.to_owned()))
    }
}

impl TryFrom<&str> for StepKeyword {
    type Error = StepKeywordParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A Gherkin [`StepType`] with no keyword counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unsupported step type: {0:?}")]
pub struct UnsupportedStepType(pub StepType);

impl TryFrom<StepType> for StepKeyword {
    type Error = UnsupportedStepType;

    fn try_from(ty: StepType) -> Result<Self, Self::Error> {
        match ty {
            StepType::Given => Ok(Self::Given),
            StepType::When => Ok(Self::When),
            StepType::Then => Ok(Self::Then),
            #[expect(unreachable_patterns, reason = "StepType may gain variants")]
            other => Err(UnsupportedStepType(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse_kw(input: &str) -> StepKeyword {
        input
            .parse()
            .unwrap_or_else(|err| panic!("test input should parse to a keyword: {err}"))
    }

    #[rstest]
    #[case("Given", StepKeyword::Given)]
    #[case("given", StepKeyword::Given)]
    #[case(" WhEn ", StepKeyword::When)]
    #[case("THEN", StepKeyword::Then)]
    #[case("AND", StepKeyword::And)]
    #[case(" but ", StepKeyword::But)]
    #[case("* ", StepKeyword::Wildcard)]
    fn parses_case_insensitively(#[case] input: &str, #[case] expected: StepKeyword) {
        assert_eq!(parse_kw(input), expected);
    }

    #[test]
    fn rejects_invalid_keyword() {
        let Err(err) = "invalid".parse::<StepKeyword>() else {
            panic!("expected parse error for invalid keyword");
        };
        assert_eq!(err.0, "invalid");
    }

    #[rstest]
    #[case(StepType::Given, StepKeyword::Given)]
    #[case(StepType::When, StepKeyword::When)]
    #[case(StepType::Then, StepKeyword::Then)]
    fn maps_step_type(#[case] ty: StepType, #[case] expected: StepKeyword) {
        assert_eq!(StepKeyword::try_from(ty), Ok(expected));
    }

    #[rstest]
    #[case(StepKeyword::Given, true)]
    #[case(StepKeyword::When, true)]
    #[case(StepKeyword::Then, true)]
    #[case(StepKeyword::And, false)]
    #[case(StepKeyword::But, false)]
    #[case(StepKeyword::Wildcard, false)]
    fn classifies_concrete_keywords(#[case] keyword: StepKeyword, #[case] concrete: bool) {
        assert_eq!(keyword.is_concrete(), concrete);
        assert_eq!(keyword.is_conjunction(), !concrete);
    }

    #[test]
    fn inherit_returns_last_for_conjunctions() {
        let last = Some(StepKeyword::When);
        assert_eq!(StepKeyword::And.inherit(last), last);
        assert_eq!(StepKeyword::But.inherit(last), last);
        assert_eq!(StepKeyword::Wildcard.inherit(last), last);
    }

    #[test]
    fn inherit_leading_conjunction_has_nothing_to_inherit() {
        assert_eq!(StepKeyword::And.inherit(None), None);
        assert_eq!(StepKeyword::Given.inherit(None), Some(StepKeyword::Given));
    }

    fn scenario_steps(text: &str) -> Vec<gherkin::Step> {
        gherkin::Feature::parse(text, gherkin::GherkinEnv::default())
            .unwrap_or_else(|err| panic!("test feature should parse: {err}"))
            .scenarios
            .into_iter()
            .next()
            .map(|scenario| scenario.steps)
            .unwrap_or_default()
    }

    #[rstest]
    #[case::english(
        "Feature: F\n  Scenario: S\n    Given a\n    And b\n    When c\n    But d\n    * e\n",
        &[StepKeyword::Given, StepKeyword::And, StepKeyword::When, StepKeyword::But, StepKeyword::Wildcard]
    )]
    #[case::french(
        "# language: fr\nFonctionnalité: F\n  Scénario: S\n    Soit a\n    Et b\n    Quand c\n    Mais d\n    Alors e\n    Et que f\n",
        &[StepKeyword::Given, StepKeyword::And, StepKeyword::When, StepKeyword::And, StepKeyword::Then, StepKeyword::And]
    )]
    #[case::french_repeated_type(
        "# language: fr\nFonctionnalité: F\n  Scénario: S\n    Soit a\n    Quand b\n    Soit c\n",
        &[StepKeyword::Given, StepKeyword::When, StepKeyword::Given]
    )]
    fn classifies_written_keywords(#[case] text: &str, #[case] expected: &[StepKeyword]) {
        let steps = scenario_steps(text);
        assert_eq!(StepKeyword::classify(&steps).as_deref(), Ok(expected));
    }

    #[test]
    fn display_matches_feature_spelling() {
        assert_eq!(StepKeyword::Then.to_string(), "Then");
        assert_eq!(StepKeyword::Wildcard.to_string(), "*");
    }
}
