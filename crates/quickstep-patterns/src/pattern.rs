//! Anchored step patterns compiled into regular expressions.

use std::fmt;
use std::hash::{Hash, Hasher};

use regex::Regex;

use crate::capture::extract_captured_values;
use crate::errors::PatternError;

/// Wrap a pattern source so that it must match the whole step text.
///
/// The source is grouped before anchoring so alternations such as `a|b` do
/// not escape the anchors.
///
/// # Examples
/// ```
/// use quickstep_patterns::anchor_pattern;
/// assert_eq!(anchor_pattern(r"I have (\d+) cukes"), r"^(?:I have (\d+) cukes)$");
/// ```
#[must_use]
pub fn anchor_pattern(source: &str) -> String {
    let mut anchored = String::with_capacity(source.len().saturating_add(6));
    anchored.push_str("^(?:");
    anchored.push_str(source);
    anchored.push_str(")$");
    anchored
}

/// A declared step pattern together with its compiled, anchored regex.
///
/// Matching is case-sensitive and anchored at both ends. Equality and hashing
/// use the declared source text.
///
/// # Examples
/// ```
/// use quickstep_patterns::StepPattern;
///
/// let pattern = StepPattern::new(r"I chose (\d+) as first number")
///     .unwrap_or_else(|err| panic!("pattern should compile: {err}"));
/// assert_eq!(pattern.capture_count(), 1);
/// assert_eq!(
///     pattern.captures("I chose 12 as first number"),
///     Some(vec!["12".to_string()])
/// );
/// assert!(pattern.captures("i chose 12 as first number").is_none());
/// ```
#[derive(Clone)]
pub struct StepPattern {
    source: String,
    regex: Regex,
}

impl StepPattern {
    /// Compile `source` into an anchored pattern.
    ///
    /// # Errors
    /// Returns [`PatternError::Regex`] when the source is not a valid regular
    /// expression.
    pub fn new(source: impl Into<String>) -> Result<Self, PatternError> {
        let source = source.into();
        let regex = Regex::new(&anchor_pattern(&source)).map_err(|err| PatternError::Regex {
            pattern: source.clone(),
            source: err,
        })?;
        Ok(Self { source, regex })
    }

    /// Access the declared pattern text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Access the compiled, anchored regex.
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Number of capture groups declared by the pattern, excluding the
    /// implicit whole-match group.
    #[must_use]
    pub fn capture_count(&self) -> usize {
        self.regex.captures_len().saturating_sub(1)
    }

    /// Return `true` when the pattern matches the whole of `text`.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Extract positional captures when `text` matches, `None` otherwise.
    #[must_use]
    pub fn captures(&self, text: &str) -> Option<Vec<String>> {
        extract_captured_values(&self.regex, text)
    }
}

impl fmt::Debug for StepPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StepPattern").field(&self.source).finish()
    }
}

impl fmt::Display for StepPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl PartialEq for StepPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for StepPattern {}

impl Hash for StepPattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

impl TryFrom<&str> for StepPattern {
    type Error = PatternError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
