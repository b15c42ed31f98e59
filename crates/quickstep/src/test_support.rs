//! Helpers shared by unit tests.

use crate::discovery;
use camino::Utf8Path;

/// Parse inline feature text, panicking on malformed input.
pub(crate) fn parse_feature(text: &str) -> gherkin::Feature {
    discovery::parse_feature(text, Utf8Path::new("inline.feature"))
        .unwrap_or_else(|err| panic!("feature text should parse: {err}"))
}
