//! Recovery for step sequences that open with a conjunction.
//!
//! The parser rejects a whole feature when any background or scenario starts
//! with `And` or `But`. Such steps are located by parsing the document one
//! line at a time, rewritten as `*` steps so the remaining text parses, and
//! then handed back their keyword. Planning the affected unit reports the
//! leading conjunction while its siblings stay runnable.

use gherkin::{Feature, GherkinEnv, Step};
use log::debug;
use quickstep_patterns::StepKeyword;

const DELIMITERS: [&str; 2] = ["\"\"\"", "```"];

/// Stand-in step inserted ahead of a suspect line.
const PLACEHOLDER: &str = "* _";

/// A conjunction step found at the start of its sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Orphan {
    /// One-based source line.
    line: usize,
    /// Keyword reported for the step once the feature parses.
    keyword: &'static str,
}

/// Parse `source`, keeping sequences that open with a conjunction.
///
/// Returns `None` when the document fails for any other reason, or when no
/// leading conjunction was found.
pub(crate) fn recover(source: &str) -> Option<Feature> {
    let mut lines: Vec<String> = source.lines().map(str::to_owned).collect();
    let mut orphans = Vec::new();
    let mut parsed_once = false;
    for index in checkpoints(&lines) {
        if parse(&join(&lines, index + 1)).is_ok() {
            parsed_once = true;
            continue;
        }
        if !parsed_once {
            continue;
        }
        let (orphan, rewritten) = conjunction_at(&lines, index)?;
        if let Some(line) = lines.get_mut(index) {
            *line = rewritten;
        }
        parse(&join(&lines, index + 1)).ok()?;
        debug!("line {} opens its sequence with a conjunction", orphan.line);
        orphans.push(orphan);
    }
    if orphans.is_empty() {
        return None;
    }
    let mut feature = parse(&join(&lines, lines.len())).ok()?;
    restore(&mut feature, &orphans);
    Some(feature)
}

fn parse(source: &str) -> Result<Feature, gherkin::ParseError> {
    Feature::parse(source, GherkinEnv::default())
}

fn join(lines: &[String], count: usize) -> String {
    lines.iter().take(count).fold(String::new(), |mut text, line| {
        text.push_str(line);
        text.push('\n');
        text
    })
}

/// Indices of lines after which the document may be complete.
///
/// Blank lines, comments and tags are skipped, as is everything inside a doc
/// string up to its closing delimiter.
fn checkpoints(lines: &[String]) -> Vec<usize> {
    let mut open: Option<&str> = None;
    let mut points = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();
        if let Some(delimiter) = open {
            if trimmed.starts_with(delimiter) {
                open = None;
                points.push(index);
            }
            continue;
        }
        let opening = DELIMITERS.into_iter().find(|delimiter| {
            trimmed
                .strip_prefix(delimiter)
                .is_some_and(|rest| !rest.contains(delimiter))
        });
        if opening.is_some() {
            open = opening;
        } else if !(trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('@')) {
            points.push(index);
        }
    }
    points
}

/// Check whether the line at `index` is a conjunction with nothing before it.
///
/// The line qualifies when it parses as a step once a placeholder step is
/// inserted ahead of it. On success the orphan is returned together with the
/// line rewritten as a `*` step.
fn conjunction_at(lines: &[String], index: usize) -> Option<(Orphan, String)> {
    let line = lines.get(index)?;
    let content = line.trim_start();
    let indent = line.get(..line.len() - content.len()).unwrap_or_default();
    let mut witnessed: Vec<String> = lines.iter().take(index).cloned().collect();
    witnessed.push(format!("{indent}{PLACEHOLDER}"));
    witnessed.push(line.clone());
    let feature = parse(&join(&witnessed, witnessed.len())).ok()?;
    let step = steps(&feature).find(|step| step.position.line == index + 2)?;
    let keyword = match step.keyword.trim().parse::<StepKeyword>() {
        Ok(StepKeyword::But) => "But ",
        _ => "And ",
    };
    let orphan = Orphan {
        line: index + 1,
        keyword,
    };
    Some((orphan, format!("{indent}* {}", step.value)))
}

fn steps(feature: &Feature) -> impl Iterator<Item = &Step> {
    let rules = feature.rules.iter().flat_map(|rule| {
        rule.background
            .iter()
            .flat_map(|background| &background.steps)
            .chain(rule.scenarios.iter().flat_map(|scenario| &scenario.steps))
    });
    feature
        .background
        .iter()
        .flat_map(|background| &background.steps)
        .chain(feature.scenarios.iter().flat_map(|scenario| &scenario.steps))
        .chain(rules)
}

fn restore(feature: &mut Feature, orphans: &[Orphan]) {
    let mut sequences: Vec<&mut Vec<Step>> = Vec::new();
    if let Some(background) = feature.background.as_mut() {
        sequences.push(&mut background.steps);
    }
    sequences.extend(feature.scenarios.iter_mut().map(|scenario| &mut scenario.steps));
    for rule in &mut feature.rules {
        if let Some(background) = rule.background.as_mut() {
            sequences.push(&mut background.steps);
        }
        sequences.extend(rule.scenarios.iter_mut().map(|scenario| &mut scenario.steps));
    }
    for step in sequences.into_iter().flatten() {
        if let Some(orphan) = orphans.iter().find(|orphan| orphan.line == step.position.line) {
            step.keyword = orphan.keyword.to_owned();
        }
    }
}
