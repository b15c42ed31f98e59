//! Step keyword and step-pattern utilities shared by the quickstep crates.
//!
//! The crate owns the canonical [`StepKeyword`] enum, compiles declared step
//! patterns into anchored regular expressions, extracts positional captures,
//! and substitutes Scenario Outline placeholders. The runtime crate builds its
//! registry and binder on top of these helpers.

mod capture;
mod errors;
mod keyword;
mod outline;
mod pattern;

pub use capture::extract_captured_values;
pub use errors::PatternError;
pub use keyword::{StepKeyword, StepKeywordParseError, UnsupportedStepType};
pub use outline::{PlaceholderError, contains_placeholders, substitute_placeholders};
pub use pattern::{StepPattern, anchor_pattern};
