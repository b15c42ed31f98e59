//! Placeholder substitution for Scenario Outline steps.
//!
//! Outline steps reference Examples columns as `<column>` tokens. Each example
//! row produces its own concrete scenario by replacing those tokens in step
//! text, doc strings, and table cells.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Matches `<placeholder>` tokens, capturing the column name.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([^>\s][^>]*)>").unwrap_or_else(|_| unreachable!("placeholder regex is valid"))
});

/// Error returned when a placeholder references a column the row lacks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("placeholder '<{placeholder}>' not found in Examples table; available columns: [{}]", .available_columns.join(", "))]
pub struct PlaceholderError {
    /// The placeholder name that was not found.
    pub placeholder: String,
    /// The column headers of the Examples table.
    pub available_columns: Vec<String>,
}

/// Substitute `<placeholder>` tokens in `text` with values from an Examples row.
///
/// `headers` and `row` are aligned by position. Text without placeholders is
/// returned unchanged.
///
/// # Errors
///
/// Returns [`PlaceholderError`] when a token names a column missing from
/// `headers`, or when `row` is shorter than `headers`.
///
/// # Examples
///
/// ```
/// use quickstep_patterns::substitute_placeholders;
///
/// let headers = vec!["count".to_string(), "item".to_string()];
/// let row = vec!["5".to_string(), "apples".to_string()];
/// let text = substitute_placeholders("I have <count> <item>", &headers, &row)
///     .unwrap_or_else(|err| panic!("{err}"));
/// assert_eq!(text, "I have 5 apples");
/// ```
pub fn substitute_placeholders(
    text: &str,
    headers: &[String],
    row: &[String],
) -> Result<String, PlaceholderError> {
    let mut result = String::with_capacity(text.len());
    let mut last = 0;

    for cap in PLACEHOLDER_RE.captures_iter(text) {
        let (Some(full_match), Some(name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let value = headers
            .iter()
            .position(|h| h == name.as_str())
            .and_then(|idx| row.get(idx))
            .ok_or_else(|| PlaceholderError {
                placeholder: name.as_str().to_string(),
                available_columns: headers.to_vec(),
            })?;
        result.push_str(text.get(last..full_match.start()).unwrap_or_default());
        result.push_str(value);
        last = full_match.end();
    }
    result.push_str(text.get(last..).unwrap_or_default());

    Ok(result)
}

/// Return `true` when `text` contains at least one `<placeholder>` token.
#[must_use]
pub fn contains_placeholders(text: &str) -> bool {
    PLACEHOLDER_RE.is_match(text)
}
