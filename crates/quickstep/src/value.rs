//! Typed step parameters and their conversion from captured text.
//!
//! Each handler parameter is described by a [`ParamSpec`], which the binder
//! uses to turn a captured substring into a [`StepValue`]. The handler wrapper
//! turns the values back into native types through [`FromStepArgs`].

use crate::argument::{DataTable, DocString};
use std::fmt;
use thiserror::Error;

/// The category of a handler parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Signed or unsigned integers.
    Integer,
    /// Floating point numbers.
    Float,
    /// `true` or `false`, case-insensitive.
    Boolean,
    /// Text captured verbatim.
    Text,
    /// A step's data table.
    Table,
    /// A step's doc string.
    DocString,
}

impl ParamKind {
    /// Return `true` for kinds filled from the step's block argument rather
    /// than from a capture group.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Table | Self::DocString)
    }

    /// Lower-case name used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Text => "text",
            Self::Table => "data table",
            Self::DocString => "doc string",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A converted argument ready to be handed to a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    /// An integer capture.
    Integer(i64),
    /// A floating point capture.
    Float(f64),
    /// A boolean capture.
    Boolean(bool),
    /// A text capture.
    Text(String),
    /// The step's data table.
    Table(DataTable),
    /// The step's doc string.
    DocString(DocString),
}

impl StepValue {
    /// Return the kind of this value.
    #[must_use]
    pub const fn kind(&self) -> ParamKind {
        match self {
            Self::Integer(_) => ParamKind::Integer,
            Self::Float(_) => ParamKind::Float,
            Self::Boolean(_) => ParamKind::Boolean,
            Self::Text(_) => ParamKind::Text,
            Self::Table(_) => ParamKind::Table,
            Self::DocString(_) => ParamKind::DocString,
        }
    }
}

impl From<crate::argument::StepArgument> for StepValue {
    fn from(argument: crate::argument::StepArgument) -> Self {
        match argument {
            crate::argument::StepArgument::Table(table) => Self::Table(table),
            crate::argument::StepArgument::DocString(doc) => Self::DocString(doc),
        }
    }
}

/// Converter from captured text to a [`StepValue`].
pub type CaptureParser = fn(&str) -> Result<StepValue, String>;

/// Description of one handler parameter.
#[derive(Clone, Copy)]
pub struct ParamSpec {
    kind: ParamKind,
    type_name: &'static str,
    parse: CaptureParser,
}

impl ParamSpec {
    /// Describe the parameter type `T`.
    #[must_use]
    pub fn of<T: StepParam>() -> Self {
        Self {
            kind: T::KIND,
            type_name: std::any::type_name::<T>(),
            parse: T::parse_capture,
        }
    }

    /// The parameter's kind.
    #[must_use]
    pub const fn kind(&self) -> ParamKind {
        self.kind
    }

    /// The Rust type name of the parameter.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Convert a captured substring.
    ///
    /// # Errors
    ///
    /// Returns the conversion failure reason.
    pub fn parse(&self, raw: &str) -> Result<StepValue, String> {
        (self.parse)(raw)
    }
}

impl fmt::Debug for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamSpec")
            .field("kind", &self.kind)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ParamSpec {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.type_name == other.type_name
    }
}

/// A type usable as a single handler parameter.
pub trait StepParam: Sized + 'static {
    /// The parameter category.
    const KIND: ParamKind;

    /// Convert a captured substring.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when `raw` is not a valid value.
    fn parse_capture(raw: &str) -> Result<StepValue, String>;

    /// Recover the native value, or `None` when `value` is of another kind.
    fn from_value(value: StepValue) -> Option<Self>;
}

macro_rules! integer_params {
    ($($ty:ty),* $(,)?) => {
        $(
            impl StepParam for $ty {
                const KIND: ParamKind = ParamKind::Integer;

                fn parse_capture(raw: &str) -> Result<StepValue, String> {
                    let parsed = raw.trim().parse::<$ty>().map_err(|err| err.to_string())?;
                    i64::try_from(parsed)
                        .map(StepValue::Integer)
                        .map_err(|err| err.to_string())
                }

                fn from_value(value: StepValue) -> Option<Self> {
                    match value {
                        StepValue::Integer(number) => <$ty>::try_from(number).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

integer_params!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl StepParam for f64 {
    const KIND: ParamKind = ParamKind::Float;

    fn parse_capture(raw: &str) -> Result<StepValue, String> {
        raw.trim()
            .parse::<Self>()
            .map(StepValue::Float)
            .map_err(|err| err.to_string())
    }

    fn from_value(value: StepValue) -> Option<Self> {
        match value {
            StepValue::Float(number) => Some(number),
            _ => None,
        }
    }
}

impl StepParam for f32 {
    const KIND: ParamKind = ParamKind::Float;

    fn parse_capture(raw: &str) -> Result<StepValue, String> {
        raw.trim()
            .parse::<Self>()
            .map(|number| StepValue::Float(f64::from(number)))
            .map_err(|err| err.to_string())
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "the value was parsed as f32 before widening"
    )]
    fn from_value(value: StepValue) -> Option<Self> {
        match value {
            StepValue::Float(number) => Some(number as Self),
            _ => None,
        }
    }
}

impl StepParam for bool {
    const KIND: ParamKind = ParamKind::Boolean;

    fn parse_capture(raw: &str) -> Result<StepValue, String> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            Ok(StepValue::Boolean(true))
        } else if trimmed.eq_ignore_ascii_case("false") {
            Ok(StepValue::Boolean(false))
        } else {
            Err(format!("'{trimmed}' is neither true nor false"))
        }
    }

    fn from_value(value: StepValue) -> Option<Self> {
        match value {
            StepValue::Boolean(flag) => Some(flag),
            _ => None,
        }
    }
}

impl StepParam for String {
    const KIND: ParamKind = ParamKind::Text;

    fn parse_capture(raw: &str) -> Result<StepValue, String> {
        Ok(StepValue::Text(raw.to_owned()))
    }

    fn from_value(value: StepValue) -> Option<Self> {
        match value {
            StepValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl StepParam for DataTable {
    const KIND: ParamKind = ParamKind::Table;

    fn parse_capture(_raw: &str) -> Result<StepValue, String> {
        Err("data tables are taken from the step's block argument".to_owned())
    }

    fn from_value(value: StepValue) -> Option<Self> {
        match value {
            StepValue::Table(table) => Some(table),
            _ => None,
        }
    }
}

impl StepParam for DocString {
    const KIND: ParamKind = ParamKind::DocString;

    fn parse_capture(_raw: &str) -> Result<StepValue, String> {
        Err("doc strings are taken from the step's block argument".to_owned())
    }

    fn from_value(value: StepValue) -> Option<Self> {
        match value {
            StepValue::DocString(doc) => Some(doc),
            _ => None,
        }
    }
}

/// Error raised when bound values do not fit a handler's parameter list.
///
/// The binder checks kinds before invocation, so this only surfaces when a
/// handler is invoked with hand-built values.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("handler expected {expected} arguments of types [{}], received {received}", .types.join(", "))]
pub struct ArgumentMismatch {
    /// Number of parameters the handler declares.
    pub expected: usize,
    /// Number of values supplied.
    pub received: usize,
    /// Declared parameter types.
    pub types: Vec<&'static str>,
}

/// A handler's full parameter list, expressed as a tuple of [`StepParam`]s.
///
/// Implemented for `()` and tuples of up to six parameters.
pub trait FromStepArgs: Sized {
    /// Describe each parameter in order.
    fn specs() -> Vec<ParamSpec>;

    /// Rebuild the tuple from bound values.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentMismatch`] when the count or kinds disagree.
    fn from_values(values: Vec<StepValue>) -> Result<Self, ArgumentMismatch>;
}

fn mismatch<A: FromStepArgs>(received: usize) -> ArgumentMismatch {
    let specs = A::specs();
    ArgumentMismatch {
        expected: specs.len(),
        received,
        types: specs.iter().map(ParamSpec::type_name).collect(),
    }
}

impl FromStepArgs for () {
    fn specs() -> Vec<ParamSpec> {
        Vec::new()
    }

    fn from_values(values: Vec<StepValue>) -> Result<Self, ArgumentMismatch> {
        if values.is_empty() {
            Ok(())
        } else {
            Err(mismatch::<Self>(values.len()))
        }
    }
}

macro_rules! tuple_args {
    ($count:literal => $($name:ident),+) => {
        impl<$($name: StepParam),+> FromStepArgs for ($($name,)+) {
            fn specs() -> Vec<ParamSpec> {
                vec![$(ParamSpec::of::<$name>()),+]
            }

            fn from_values(values: Vec<StepValue>) -> Result<Self, ArgumentMismatch> {
                let received = values.len();
                if received != $count {
                    return Err(mismatch::<Self>(received));
                }
                let mut values = values.into_iter();
                Ok(($(
                    values
                        .next()
                        .and_then($name::from_value)
                        .ok_or_else(|| mismatch::<Self>(received))?,
                )+))
            }
        }
    };
}

tuple_args!(1 => A);
tuple_args!(2 => A, B);
tuple_args!(3 => A, B, C);
tuple_args!(4 => A, B, C, D);
tuple_args!(5 => A, B, C, D, E);
tuple_args!(6 => A, B, C, D, E, F);
