//! Effective keyword resolution for step sequences.
//!
//! `And`, `But`, and `*` take the keyword of the closest preceding `Given`,
//! `When`, or `Then` in the same sequence. Backgrounds and scenarios are
//! separate sequences, so a scenario cannot inherit from its background.
//! Localized `And` and `But` resolve the same way once classified by
//! [`StepKeyword::classify`].

use crate::error::DefinitionError;
use quickstep_patterns::StepKeyword;

/// A document step as seen by the normalizer.
pub trait RawStep: Sized {
    /// The keywords of `steps` as written, in order.
    ///
    /// Keywords are read per sequence because a localized conjunction is
    /// only recognisable next to the step it continues.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::UnsupportedStepType`] when a keyword has no
    /// [`StepKeyword`] counterpart.
    fn raw_keywords(steps: &[Self]) -> Result<Vec<StepKeyword>, DefinitionError>;

    /// The step text after the keyword.
    fn text(&self) -> &str;
}

impl RawStep for gherkin::Step {
    fn raw_keywords(steps: &[Self]) -> Result<Vec<StepKeyword>, DefinitionError> {
        Ok(StepKeyword::classify(steps)?)
    }

    fn text(&self) -> &str {
        &self.value
    }
}

impl RawStep for (StepKeyword, &str) {
    fn raw_keywords(steps: &[Self]) -> Result<Vec<StepKeyword>, DefinitionError> {
        Ok(steps.iter().map(|(keyword, _)| *keyword).collect())
    }

    fn text(&self) -> &str {
        self.1
    }
}

/// A step with its written and effective keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalized<'a, S> {
    /// The keyword as written.
    pub raw: StepKeyword,
    /// The keyword used for lookup.
    pub effective: StepKeyword,
    /// The step itself.
    pub step: &'a S,
}

/// Pair each step with its effective keyword.
///
/// # Errors
///
/// Returns [`DefinitionError::LeadingConjunction`] when a conjunction appears
/// before any concrete keyword.
///
/// # Examples
///
/// ```
/// use quickstep::StepKeyword;
/// use quickstep::keyword::normalize;
///
/// let steps = [
///     (StepKeyword::Given, "a basket"),
///     (StepKeyword::And, "an apple"),
///     (StepKeyword::When, "I weigh it"),
///     (StepKeyword::But, "the scale is off"),
/// ];
/// let effective: Vec<StepKeyword> = normalize(&steps)
///     .unwrap_or_else(|err| panic!("{err}"))
///     .into_iter()
///     .map(|step| step.effective)
///     .collect();
/// assert_eq!(
///     effective,
///     [StepKeyword::Given, StepKeyword::Given, StepKeyword::When, StepKeyword::When]
/// );
/// ```
pub fn normalize<S: RawStep>(steps: &[S]) -> Result<Vec<Normalized<'_, S>>, DefinitionError> {
    let mut last = None;
    S::raw_keywords(steps)?
        .into_iter()
        .zip(steps)
        .enumerate()
        .map(|(index, (raw, step))| {
            let effective = raw
                .inherit(last)
                .ok_or_else(|| DefinitionError::LeadingConjunction {
                    index,
                    keyword: raw,
                    text: step.text().to_owned(),
                })?;
            last = Some(effective);
            Ok(Normalized {
                raw,
                effective,
                step,
            })
        })
        .collect()
}
