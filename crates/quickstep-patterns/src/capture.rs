//! Regex capture helpers used by step patterns.

use regex::Regex;

/// Return the positional groups of `re` matched against `text`.
///
/// Group 0 is skipped. A group that did not take part in the match becomes an
/// empty string so the result always has one entry per declared group.
///
/// ```
/// use quickstep_patterns::extract_captured_values;
/// use regex::Regex;
///
/// let re = Regex::new(r"^I add (\d+) to (\w+)$").unwrap_or_else(|e| panic!("{e}"));
/// assert_eq!(
///     extract_captured_values(&re, "I add 3 to basket"),
///     Some(vec!["3".to_owned(), "basket".to_owned()])
/// );
/// assert_eq!(extract_captured_values(&re, "I remove 3"), None);
/// ```
#[must_use]
pub fn extract_captured_values(re: &Regex, text: &str) -> Option<Vec<String>> {
    re.captures(text).map(|caps| {
        caps.iter()
            .skip(1)
            .map(|group| group.map_or_else(String::new, |m| m.as_str().to_owned()))
            .collect()
    })
}
