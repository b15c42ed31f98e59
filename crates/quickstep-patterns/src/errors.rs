//! Error types shared by the pattern modules.

use thiserror::Error;

/// Errors surfaced while compiling declared step patterns.
///
/// # Examples
/// ```
/// use quickstep_patterns::StepPattern;
/// let Err(err) = StepPattern::new("unclosed (group") else {
///     panic!("pattern should be rejected");
/// };
/// assert!(err.to_string().starts_with("invalid step pattern 'unclosed (group'"));
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PatternError {
    /// The declared pattern is not a valid regular expression.
    #[error("invalid step pattern '{pattern}': {source}")]
    Regex {
        /// Declared pattern text.
        pattern: String,
        /// Underlying regex compilation failure.
        source: regex::Error,
    },
}
