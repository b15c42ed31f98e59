//! Structured step arguments: data tables and doc strings.
//!
//! A Gherkin step may carry one block argument below its text line. The
//! binder hands it to the handler unchanged as the final positional argument.

use derive_more::{Deref, From, IntoIterator};
use std::fmt;

/// Rows of text cells attached to a step.
///
/// The first row is not treated specially; handlers that expect a header row
/// can use [`header`](Self::header) and [`body`](Self::body).
///
/// # Examples
///
/// ```
/// use quickstep::DataTable;
///
/// let table = DataTable::from(vec![
///     vec!["name".to_string(), "age".to_string()],
///     vec!["Ada".to_string(), "36".to_string()],
/// ]);
/// assert_eq!(table.cell(1, 0), Some("Ada"));
/// assert_eq!(table.hashes()[0]["age"], "36");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, From, IntoIterator)]
#[into_iterator(owned, ref)]
pub struct DataTable(Vec<Vec<String>>);

impl DataTable {
    /// Return every row, header included.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.0
    }

    /// Return the first row, if any.
    #[must_use]
    pub fn header(&self) -> Option<&[String]> {
        self.0.first().map(Vec::as_slice)
    }

    /// Return every row after the first.
    #[must_use]
    pub fn body(&self) -> &[Vec<String>] {
        self.0.get(1..).unwrap_or_default()
    }

    /// Return the cell at `row`, `column`.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.0.get(row)?.get(column).map(String::as_str)
    }

    /// Map each body row to a header-keyed map.
    ///
    /// Cells beyond the header width are ignored.
    #[must_use]
    pub fn hashes(&self) -> Vec<hashbrown::HashMap<String, String>> {
        let Some(header) = self.header() else {
            return Vec::new();
        };
        self.body()
            .iter()
            .map(|row| header.iter().cloned().zip(row.iter().cloned()).collect())
            .collect()
    }

    /// Consume the table, returning its rows.
    #[must_use]
    pub fn into_inner(self) -> Vec<Vec<String>> {
        self.0
    }
}

impl From<&gherkin::Table> for DataTable {
    fn from(table: &gherkin::Table) -> Self {
        Self(table.rows.clone())
    }
}

/// A multi-line text block attached to a step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deref, From)]
pub struct DocString(String);

impl DocString {
    /// Borrow the text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the doc string, returning its text.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for DocString {
    fn from(text: &str) -> Self {
        Self(text.to_owned())
    }
}

impl fmt::Display for DocString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Recover the text written between a doc string's delimiters.
///
/// The parser hands back everything after the opening delimiter: the rest of
/// that line (empty, or a media type such as `json`), the content lines, and
/// the line break before the closing delimiter. Only the content lines are
/// kept, dedented by their common indentation.
///
/// ```
/// use quickstep::docstring_content;
///
/// assert_eq!(docstring_content("\nline one\n  line two\n"), "line one\n  line two");
/// assert_eq!(docstring_content("json\n    {}\n"), "{}");
/// ```
#[must_use]
pub fn docstring_content(raw: &str) -> String {
    let Some((_, body)) = raw.split_once('\n') else {
        return raw.to_owned();
    };
    let body = body.trim_end_matches([' ', '\t']);
    let body = body.strip_suffix('\n').unwrap_or(body);
    let body = body.strip_suffix('\r').unwrap_or(body);
    textwrap::dedent(body)
}

/// The structured payload of a step, if it has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepArgument {
    /// A data table.
    Table(DataTable),
    /// A doc string.
    DocString(DocString),
}

impl StepArgument {
    /// Extract the block argument of a parsed step.
    ///
    /// Gherkin allows at most one; a table takes precedence should the parser
    /// ever report both. Doc strings are reduced to the lines between their
    /// delimiters; see [`docstring_content`].
    #[must_use]
    pub fn from_step(step: &gherkin::Step) -> Option<Self> {
        step.table
            .as_ref()
            .map(|table| Self::Table(DataTable::from(table)))
            .or_else(|| {
                step.docstring
                    .as_deref()
                    .map(|raw| Self::DocString(DocString(docstring_content(raw))))
            })
    }

    /// Describe the kind of argument this is.
    #[must_use]
    pub const fn kind(&self) -> crate::ParamKind {
        match self {
            Self::Table(_) => crate::ParamKind::Table,
            Self::DocString(_) => crate::ParamKind::DocString,
        }
    }
}
