//! Step handler signatures and their type-erased wrappers.
//!
//! Handlers are plain closures or functions taking the test-definition
//! instance and a tuple of typed parameters. Blocking handlers return `()` or
//! a `Result`; awaitable handlers return a [`StepFuture`] borrowing the
//! instance. The registry stores both behind [`ErasedHandler`] so the executor
//! can drive every step as a future.

use crate::panic::panic_message;
use crate::value::{FromStepArgs, StepValue};
use std::any::Any;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

/// A fault raised by a handler or a lifecycle hook.
///
/// The original error or panic payload is kept unchanged so callers can
/// inspect it or re-raise it with [`resume`](Self::resume).
pub enum StepFault {
    /// The handler returned an error.
    Failed(Box<dyn Error + Send + Sync + 'static>),
    /// The handler panicked; the payload is the one given to `panic!`.
    Panicked(Box<dyn Any + Send + 'static>),
}

impl StepFault {
    /// Build a fault from a plain message.
    ///
    /// # Examples
    ///
    /// ```
    /// use quickstep::StepFault;
    ///
    /// let fault = StepFault::msg("balance went negative");
    /// assert_eq!(fault.to_string(), "balance went negative");
    /// ```
    #[must_use]
    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::Failed(message.into())
    }

    /// Return `true` when the fault came from a panic.
    #[must_use]
    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }

    /// Borrow the returned error, if the fault is not a panic.
    #[must_use]
    pub fn as_error(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        match self {
            Self::Failed(err) => Some(err.as_ref()),
            Self::Panicked(_) => None,
        }
    }

    /// Re-raise the fault on the current thread.
    ///
    /// Panics resume with their original payload; returned errors panic with
    /// their display text.
    pub fn resume(self) -> ! {
        match self {
            Self::Panicked(payload) => std::panic::resume_unwind(payload),
            Self::Failed(err) => panic!("{err}"),
        }
    }
}

impl<E> From<E> for StepFault
where
    E: Error + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self::Failed(Box::new(err))
    }
}

impl fmt::Display for StepFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(err) => write!(f, "{err}"),
            Self::Panicked(payload) => {
                write!(f, "panicked: {}", panic_message(payload.as_ref()))
            }
        }
    }
}

impl fmt::Debug for StepFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
            Self::Panicked(payload) => f
                .debug_tuple("Panicked")
                .field(&panic_message(payload.as_ref()))
                .finish(),
        }
    }
}

/// Outcome of one handler invocation.
pub type StepResult = Result<(), StepFault>;

/// Future returned by awaitable handlers, borrowing the instance for `'a`.
pub type StepFuture<'a> = Pin<Box<dyn Future<Output = StepResult> + 'a>>;

/// Box an async block into a [`StepFuture`].
///
/// # Examples
///
/// ```
/// use quickstep::{StepFuture, step_future};
///
/// fn wait(counter: &mut u32) -> StepFuture<'_> {
///     step_future(async move {
///         *counter += 1;
///         Ok(())
///     })
/// }
/// # let mut n = 0;
/// # futures::executor::block_on(wait(&mut n)).unwrap_or_else(|e| panic!("{e}"));
/// # assert_eq!(n, 1);
/// ```
pub fn step_future<'a, F>(future: F) -> StepFuture<'a>
where
    F: Future<Output = StepResult> + 'a,
{
    Box::pin(future)
}

/// Return types accepted from blocking handlers.
pub trait IntoStepResult {
    /// Convert into a [`StepResult`].
    ///
    /// # Errors
    ///
    /// Returns the handler's own error as a [`StepFault`].
    fn into_step_result(self) -> StepResult;
}

impl IntoStepResult for () {
    fn into_step_result(self) -> StepResult {
        Ok(())
    }
}

impl<E> IntoStepResult for Result<(), E>
where
    E: Into<StepFault>,
{
    fn into_step_result(self) -> StepResult {
        self.map_err(Into::into)
    }
}

/// How a handler completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// Runs to completion before returning.
    Blocking,
    /// Returns a future the executor awaits before the next step.
    Awaitable,
    /// Launches background work and returns without a completion signal.
    ///
    /// Registries refuse to build while such a handler is declared.
    Detached,
}

impl HandlerKind {
    /// Lower-case name used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blocking => "blocking",
            Self::Awaitable => "awaitable",
            Self::Detached => "detached",
        }
    }
}

/// A handler with its parameter types erased.
pub(crate) trait ErasedHandler<W>: Send + Sync {
    fn invoke<'a>(&'a self, instance: &'a mut W, args: Vec<StepValue>) -> StepFuture<'a>;
}

pub(crate) type SharedHandler<W> = Arc<dyn ErasedHandler<W>>;

pub(crate) struct Blocking<F, A> {
    body: F,
    _args: PhantomData<fn(A)>,
}

impl<F, A> Blocking<F, A> {
    pub(crate) const fn new(body: F) -> Self {
        Self {
            body,
            _args: PhantomData,
        }
    }
}

impl<W, A, R, F> ErasedHandler<W> for Blocking<F, A>
where
    F: Fn(&mut W, A) -> R + Send + Sync,
    A: FromStepArgs,
    R: IntoStepResult,
{
    fn invoke<'a>(&'a self, instance: &'a mut W, args: Vec<StepValue>) -> StepFuture<'a> {
        // The body runs on first poll so that panics surface inside the
        // executor's unwind guard.
        Box::pin(async move {
            let args = A::from_values(args)?;
            (self.body)(instance, args).into_step_result()
        })
    }
}

pub(crate) struct Awaitable<F, A> {
    body: F,
    _args: PhantomData<fn(A)>,
}

impl<F, A> Awaitable<F, A> {
    pub(crate) const fn new<W>(body: F) -> Self
    where
        F: for<'w> Fn(&'w mut W, A) -> StepFuture<'w>,
    {
        Self {
            body,
            _args: PhantomData,
        }
    }
}

impl<W, A, F> ErasedHandler<W> for Awaitable<F, A>
where
    F: for<'w> Fn(&'w mut W, A) -> StepFuture<'w> + Send + Sync,
    A: FromStepArgs,
{
    fn invoke<'a>(&'a self, instance: &'a mut W, args: Vec<StepValue>) -> StepFuture<'a> {
        Box::pin(async move {
            let args = A::from_values(args)?;
            (self.body)(instance, args).await
        })
    }
}

/// Projects a handler written for `U` onto a definition type `W`.
pub(crate) struct Mounted<W, U> {
    inner: SharedHandler<U>,
    lens: fn(&mut W) -> &mut U,
}

impl<W, U> Mounted<W, U> {
    pub(crate) fn new(inner: SharedHandler<U>, lens: fn(&mut W) -> &mut U) -> Self {
        Self { inner, lens }
    }
}

impl<W, U: 'static> ErasedHandler<W> for Mounted<W, U> {
    fn invoke<'a>(&'a self, instance: &'a mut W, args: Vec<StepValue>) -> StepFuture<'a> {
        Box::pin(async move {
            let component = (self.lens)(instance);
            self.inner.invoke(component, args).await
        })
    }
}
