//! Shared scenario runner request and metadata types.

use std::future::{Future, IntoFuture};
use std::pin::Pin;

/// Scenario metadata provided to harness adapters.
///
/// # Examples
///
/// ```
/// use quickstep_harness::ScenarioMetadata;
///
/// let metadata = ScenarioMetadata::new(
///     "Calculator.feature",
///     "Add two numbers",
///     12,
///     vec!["@smoke".to_string()],
/// );
/// assert_eq!(metadata.feature_path(), "Calculator.feature");
/// assert_eq!(metadata.scenario_name(), "Add two numbers");
/// assert_eq!(metadata.example_row(), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioMetadata {
    feature_path: String,
    scenario_name: String,
    scenario_line: u32,
    tags: Vec<String>,
    example_row: Option<usize>,
}

impl ScenarioMetadata {
    /// Creates metadata for one scenario run.
    #[must_use]
    pub fn new(
        feature_path: impl Into<String>,
        scenario_name: impl Into<String>,
        scenario_line: u32,
        tags: Vec<String>,
    ) -> Self {
        Self {
            feature_path: feature_path.into(),
            scenario_name: scenario_name.into(),
            scenario_line,
            tags,
            example_row: None,
        }
    }

    /// Marks the metadata as describing one Examples row of an outline.
    #[must_use]
    pub fn with_example_row(mut self, row: usize) -> Self {
        self.example_row = Some(row);
        self
    }

    /// Returns the feature path.
    #[must_use]
    pub fn feature_path(&self) -> &str {
        &self.feature_path
    }

    /// Returns the scenario name.
    #[must_use]
    pub fn scenario_name(&self) -> &str {
        &self.scenario_name
    }

    /// Returns the one-based line number in the feature file.
    #[must_use]
    pub const fn scenario_line(&self) -> u32 {
        self.scenario_line
    }

    /// Returns the scenario tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the zero-based Examples row for outline units.
    #[must_use]
    pub const fn example_row(&self) -> Option<usize> {
        self.example_row
    }
}

impl Default for ScenarioMetadata {
    fn default() -> Self {
        Self::new("<unknown>", "<unknown>", 1, Vec::new())
    }
}

/// A scenario future owned by a harness until it completes.
///
/// # Examples
///
/// ```
/// use quickstep_harness::ScenarioRunner;
///
/// let runner = ScenarioRunner::new(async { 41 + 1 });
/// assert_eq!(futures::executor::block_on(runner.into_future()), 42);
/// ```
pub struct ScenarioRunner<'a, T> {
    inner: Pin<Box<dyn Future<Output = T> + 'a>>,
}

impl<'a, T: 'a> ScenarioRunner<'a, T> {
    /// Wraps a future as a scenario runner.
    #[must_use]
    pub fn new(inner: impl Future<Output = T> + 'a) -> Self {
        Self {
            inner: Box::pin(inner),
        }
    }

    /// Wraps a synchronous closure; it runs on the first poll.
    #[must_use]
    pub fn blocking(inner: impl FnOnce() -> T + 'a) -> Self {
        Self::new(async move { inner() })
    }
}

impl<'a, T> IntoFuture for ScenarioRunner<'a, T> {
    type Output = T;
    type IntoFuture = Pin<Box<dyn Future<Output = T> + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        self.inner
    }
}

/// A harness execution request for one scenario.
///
/// # Examples
///
/// ```
/// use quickstep_harness::{ScenarioMetadata, ScenarioRunRequest, ScenarioRunner};
///
/// let request = ScenarioRunRequest::new(
///     ScenarioMetadata::new("Login.feature", "User signs in", 9, vec![]),
///     ScenarioRunner::blocking(|| "ok"),
/// );
/// assert_eq!(request.metadata().scenario_line(), 9);
/// assert_eq!(futures::executor::block_on(request.into_future()), "ok");
/// ```
pub struct ScenarioRunRequest<'a, T> {
    metadata: ScenarioMetadata,
    runner: ScenarioRunner<'a, T>,
}

impl<'a, T> ScenarioRunRequest<'a, T> {
    /// Creates a request from metadata and a runner.
    #[must_use]
    pub fn new(metadata: ScenarioMetadata, runner: ScenarioRunner<'a, T>) -> Self {
        Self { metadata, runner }
    }

    /// Returns immutable metadata for diagnostics or harness setup.
    #[must_use]
    pub fn metadata(&self) -> &ScenarioMetadata {
        &self.metadata
    }

    /// Consumes the request and returns metadata and runner separately.
    #[must_use]
    pub fn into_parts(self) -> (ScenarioMetadata, ScenarioRunner<'a, T>) {
        (self.metadata, self.runner)
    }
}

impl<'a, T> IntoFuture for ScenarioRunRequest<'a, T> {
    type Output = T;
    type IntoFuture = Pin<Box<dyn Future<Output = T> + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        self.runner.into_future()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for scenario metadata and runner primitives.

    use super::{ScenarioMetadata, ScenarioRunRequest, ScenarioRunner};
    use futures::executor::block_on;
    use std::cell::Cell;
    use std::future::IntoFuture;
    use std::rc::Rc;

    #[test]
    fn metadata_default_is_unknown() {
        let metadata = ScenarioMetadata::default();
        assert_eq!(metadata.feature_path(), "<unknown>");
        assert_eq!(metadata.scenario_name(), "<unknown>");
        assert_eq!(metadata.scenario_line(), 1);
        assert!(metadata.tags().is_empty());
        assert_eq!(metadata.example_row(), None);
    }

    #[test]
    fn example_row_is_recorded() {
        let metadata = ScenarioMetadata::default().with_example_row(2);
        assert_eq!(metadata.example_row(), Some(2));
    }

    #[test]
    fn blocking_runner_defers_until_polled() {
        let flag = Rc::new(Cell::new(false));
        let flag_clone = Rc::clone(&flag);
        let runner = ScenarioRunner::blocking(move || {
            flag_clone.set(true);
            7
        });
        assert!(!flag.get());
        assert_eq!(block_on(runner.into_future()), 7);
        assert!(flag.get());
    }

    #[test]
    fn scenario_runner_supports_non_static_borrows() {
        let value = 42;
        let runner = ScenarioRunner::new(async { value });
        assert_eq!(block_on(runner.into_future()), 42);
    }

    #[test]
    fn request_splits_into_parts() {
        let request = ScenarioRunRequest::new(
            ScenarioMetadata::new(
                "Auth.feature",
                "Login succeeds",
                17,
                vec!["@smoke".to_string(), "@fast".to_string()],
            ),
            ScenarioRunner::blocking(|| 11),
        );
        let (metadata, runner) = request.into_parts();
        assert_eq!(metadata.scenario_name(), "Login succeeds");
        assert_eq!(metadata.tags(), ["@smoke", "@fast"]);
        assert_eq!(block_on(runner.into_future()), 11);
    }
}
