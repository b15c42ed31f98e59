//! Explicit handler registration.

use super::{Declaration, HandlerDescriptor, HandlerId, StepRegistry};
use crate::definition::short_type_name;
use crate::error::DefinitionError;
use crate::handler::{
    Awaitable, Blocking, HandlerKind, IntoStepResult, Mounted, SharedHandler, StepFuture,
};
use crate::value::{FromStepArgs, ParamSpec};
use quickstep_patterns::{StepKeyword, StepPattern};
use std::sync::Arc;

struct PendingHandler<W> {
    owner: &'static str,
    name: Option<String>,
    declarations: Vec<(StepKeyword, String)>,
    params: Vec<ParamSpec>,
    kind: HandlerKind,
    handler: SharedHandler<W>,
}

impl<W> PendingHandler<W> {
    fn display_name(&self, position: usize) -> String {
        self.name
            .clone()
            .or_else(|| self.declarations.first().map(|(_, pattern)| pattern.clone()))
            .unwrap_or_else(|| format!("handler #{position}"))
    }

    fn compile(self, id: HandlerId) -> Result<HandlerDescriptor<W>, DefinitionError> {
        let name = self.display_name(id.index());
        if self.declarations.is_empty() {
            return Err(DefinitionError::NoDeclarations {
                owner: self.owner,
                handler: name,
            });
        }

        let last = self.params.len().saturating_sub(1);
        if let Some((position, spec)) = self
            .params
            .iter()
            .enumerate()
            .find(|(position, spec)| spec.kind().is_structured() && *position != last)
        {
            return Err(DefinitionError::MisplacedStructuredArgument {
                handler: name,
                kind: spec.kind(),
                position,
            });
        }
        let structured = self
            .params
            .last()
            .is_some_and(|spec| spec.kind().is_structured());
        let captured = self.params.len() - usize::from(structured);

        let mut declarations = Vec::with_capacity(self.declarations.len());
        for (keyword, source) in self.declarations {
            let pattern = StepPattern::new(source).map_err(|source| {
                DefinitionError::InvalidPattern {
                    handler: name.clone(),
                    source,
                }
            })?;
            if pattern.capture_count() != captured {
                return Err(DefinitionError::CaptureCountMismatch {
                    handler: name,
                    pattern: pattern.as_str().to_owned(),
                    captures: pattern.capture_count(),
                    parameters: captured,
                });
            }
            declarations.push(Declaration { keyword, pattern });
        }

        Ok(HandlerDescriptor {
            id,
            owner: self.owner,
            name,
            declarations,
            params: self.params,
            kind: self.kind,
            handler: self.handler,
        })
    }
}

/// Collects the handlers of a definition type `W`.
///
/// Each registration method returns a [`HandlerBuilder`] that can attach
/// further keyword and pattern pairs to the same handler. Handlers are kept
/// in registration order, which is also the order in which they are tried
/// when several patterns match one step.
///
/// # Examples
///
/// ```
/// use quickstep::RegistryBuilder;
///
/// #[derive(Default)]
/// struct Lights {
///     on: bool,
/// }
///
/// let mut steps = RegistryBuilder::<Lights>::new();
/// steps
///     .given("the lights are on", |lights: &mut Lights, ()| lights.on = true)
///     .and("the lights are on");
/// steps.then(r"the lights are (on|off)", |lights: &mut Lights, (state,): (String,)| {
///     assert_eq!(lights.on, state == "on");
/// });
/// let registry = steps.build().unwrap_or_else(|err| panic!("{err}"));
/// assert_eq!(registry.len(), 2);
/// ```
pub struct RegistryBuilder<W> {
    owner: &'static str,
    pending: Vec<PendingHandler<W>>,
}

impl<W: 'static> Default for RegistryBuilder<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: 'static> RegistryBuilder<W> {
    /// Create an empty builder for `W`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            owner: short_type_name::<W>(),
            pending: Vec::new(),
        }
    }

    /// Number of handlers registered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Return `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn push(
        &mut self,
        kind: HandlerKind,
        params: Vec<ParamSpec>,
        handler: SharedHandler<W>,
    ) -> HandlerBuilder<'_, W> {
        self.pending.push(PendingHandler {
            owner: self.owner,
            name: None,
            declarations: Vec::new(),
            params,
            kind,
            handler,
        });
        let position = self.pending.len() - 1;
        HandlerBuilder {
            builder: self,
            position,
        }
    }

    /// Register a blocking handler without declarations.
    ///
    /// The handler receives the instance and a tuple of its parameters, and
    /// returns `()` or a `Result`.
    pub fn handler<A, R, F>(&mut self, body: F) -> HandlerBuilder<'_, W>
    where
        F: Fn(&mut W, A) -> R + Send + Sync + 'static,
        A: FromStepArgs + 'static,
        R: IntoStepResult + 'static,
    {
        self.push(
            HandlerKind::Blocking,
            A::specs(),
            Arc::new(Blocking::new(body)),
        )
    }

    /// Register an awaitable handler without declarations.
    ///
    /// The returned future is awaited to completion before the next step.
    pub fn awaitable<A, F>(&mut self, body: F) -> HandlerBuilder<'_, W>
    where
        F: for<'w> Fn(&'w mut W, A) -> StepFuture<'w> + Send + Sync + 'static,
        A: FromStepArgs + 'static,
    {
        self.push(
            HandlerKind::Awaitable,
            A::specs(),
            Arc::new(Awaitable::new::<W>(body)),
        )
    }

    /// Register a handler that launches background work and returns without
    /// a completion signal.
    ///
    /// This models fire-and-forget handlers so they can be declared and
    /// reported; [`build`](Self::build) rejects any builder holding one.
    pub fn detached<A, F>(&mut self, body: F) -> HandlerBuilder<'_, W>
    where
        F: Fn(&mut W, A) + Send + Sync + 'static,
        A: FromStepArgs + 'static,
    {
        self.push(
            HandlerKind::Detached,
            A::specs(),
            Arc::new(Blocking::new(body)),
        )
    }

    /// Register a blocking handler for a `Given` pattern.
    pub fn given<A, R, F>(&mut self, pattern: &str, body: F) -> HandlerBuilder<'_, W>
    where
        F: Fn(&mut W, A) -> R + Send + Sync + 'static,
        A: FromStepArgs + 'static,
        R: IntoStepResult + 'static,
    {
        self.handler(body).given(pattern)
    }

    /// Register a blocking handler for a `When` pattern.
    pub fn when<A, R, F>(&mut self, pattern: &str, body: F) -> HandlerBuilder<'_, W>
    where
        F: Fn(&mut W, A) -> R + Send + Sync + 'static,
        A: FromStepArgs + 'static,
        R: IntoStepResult + 'static,
    {
        self.handler(body).when(pattern)
    }

    /// Register a blocking handler for a `Then` pattern.
    pub fn then<A, R, F>(&mut self, pattern: &str, body: F) -> HandlerBuilder<'_, W>
    where
        F: Fn(&mut W, A) -> R + Send + Sync + 'static,
        A: FromStepArgs + 'static,
        R: IntoStepResult + 'static,
    {
        self.handler(body).then(pattern)
    }

    /// Register a blocking handler for an `And` pattern.
    pub fn and<A, R, F>(&mut self, pattern: &str, body: F) -> HandlerBuilder<'_, W>
    where
        F: Fn(&mut W, A) -> R + Send + Sync + 'static,
        A: FromStepArgs + 'static,
        R: IntoStepResult + 'static,
    {
        self.handler(body).and(pattern)
    }

    /// Register a blocking handler for a `But` pattern.
    pub fn but<A, R, F>(&mut self, pattern: &str, body: F) -> HandlerBuilder<'_, W>
    where
        F: Fn(&mut W, A) -> R + Send + Sync + 'static,
        A: FromStepArgs + 'static,
        R: IntoStepResult + 'static,
    {
        self.handler(body).but(pattern)
    }

    /// Register a blocking handler matching any keyword.
    pub fn star<A, R, F>(&mut self, pattern: &str, body: F) -> HandlerBuilder<'_, W>
    where
        F: Fn(&mut W, A) -> R + Send + Sync + 'static,
        A: FromStepArgs + 'static,
        R: IntoStepResult + 'static,
    {
        self.handler(body).star(pattern)
    }

    /// Apply another registration function to this builder.
    ///
    /// Use this to share a set of handlers between definition types of the
    /// same shape, such as generic helpers over a common trait.
    pub fn include(&mut self, register: impl FnOnce(&mut Self)) -> &mut Self {
        register(self);
        self
    }

    /// Register every handler of a component type `U` on `W`.
    ///
    /// Mounted handlers run against the component returned by `lens`. They
    /// keep their declarations and are tried after handlers registered
    /// earlier on this builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use quickstep::{FeatureSteps, RegistryBuilder, StepFault};
    ///
    /// #[derive(Default)]
    /// struct Cart {
    ///     items: Vec<String>,
    /// }
    ///
    /// impl FeatureSteps for Cart {
    ///     fn create() -> Result<Self, StepFault> {
    ///         Ok(Self::default())
    ///     }
    ///
    ///     fn register(steps: &mut RegistryBuilder<Self>) {
    ///         steps.given(r"I add (\w+)", |cart: &mut Self, (item,): (String,)| {
    ///             cart.items.push(item);
    ///         });
    ///     }
    /// }
    ///
    /// #[derive(Default)]
    /// struct Checkout {
    ///     cart: Cart,
    ///     paid: bool,
    /// }
    ///
    /// let mut steps = RegistryBuilder::<Checkout>::new();
    /// steps.mount(|checkout: &mut Checkout| &mut checkout.cart, Cart::register);
    /// steps.when("I pay", |checkout: &mut Checkout, ()| checkout.paid = true);
    /// assert_eq!(steps.len(), 2);
    /// ```
    pub fn mount<U: 'static>(
        &mut self,
        lens: fn(&mut W) -> &mut U,
        register: impl FnOnce(&mut RegistryBuilder<U>),
    ) -> &mut Self {
        let mut component = RegistryBuilder::<U>::new();
        register(&mut component);
        for pending in component.pending {
            self.pending.push(PendingHandler {
                owner: pending.owner,
                name: pending.name,
                declarations: pending.declarations,
                params: pending.params,
                kind: pending.kind,
                handler: Arc::new(Mounted::new(pending.handler, lens)),
            });
        }
        self
    }

    /// Validate every handler and build an immutable registry.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::DetachedHandler`] when any handler is
    /// detached, regardless of the others. Otherwise returns the first
    /// handler's declaration problem: no declarations, an invalid pattern, a
    /// capture count that disagrees with the parameters, or a misplaced data
    /// table or doc string parameter.
    pub fn build(self) -> Result<StepRegistry<W>, DefinitionError> {
        if let Some((position, pending)) = self
            .pending
            .iter()
            .enumerate()
            .find(|(_, pending)| pending.kind == HandlerKind::Detached)
        {
            return Err(DefinitionError::DetachedHandler {
                owner: pending.owner,
                handler: pending.display_name(position),
            });
        }

        let handlers = self
            .pending
            .into_iter()
            .enumerate()
            .map(|(position, pending)| pending.compile(HandlerId(position)))
            .collect::<Result<Vec<_>, _>>()?;
        let registry = StepRegistry::from_handlers(self.owner, handlers);
        log::debug!(
            "built step registry for {} with {} handlers",
            registry.owner(),
            registry.len()
        );
        Ok(registry)
    }
}

/// Attaches declarations and a name to a freshly registered handler.
pub struct HandlerBuilder<'b, W> {
    builder: &'b mut RegistryBuilder<W>,
    position: usize,
}

#[expect(
    clippy::return_self_not_must_use,
    reason = "the last call in a registration chain is a statement"
)]
impl<W> HandlerBuilder<'_, W> {
    fn pending(&mut self) -> Option<&mut PendingHandler<W>> {
        self.builder.pending.get_mut(self.position)
    }

    /// Add a keyword and pattern pair.
    pub fn declare(mut self, keyword: StepKeyword, pattern: impl Into<String>) -> Self {
        if let Some(pending) = self.pending() {
            pending.declarations.push((keyword, pattern.into()));
        }
        self
    }

    /// Name the handler in diagnostics. Defaults to its first pattern.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        if let Some(pending) = self.pending() {
            pending.name = Some(name.into());
        }
        self
    }

    /// Add a `Given` pattern.
    pub fn given(self, pattern: impl Into<String>) -> Self {
        self.declare(StepKeyword::Given, pattern)
    }

    /// Add a `When` pattern.
    pub fn when(self, pattern: impl Into<String>) -> Self {
        self.declare(StepKeyword::When, pattern)
    }

    /// Add a `Then` pattern.
    pub fn then(self, pattern: impl Into<String>) -> Self {
        self.declare(StepKeyword::Then, pattern)
    }

    /// Add an `And` pattern.
    pub fn and(self, pattern: impl Into<String>) -> Self {
        self.declare(StepKeyword::And, pattern)
    }

    /// Add a `But` pattern.
    pub fn but(self, pattern: impl Into<String>) -> Self {
        self.declare(StepKeyword::But, pattern)
    }

    /// Add a pattern matching any keyword.
    pub fn star(self, pattern: impl Into<String>) -> Self {
        self.declare(StepKeyword::Wildcard, pattern)
    }
}
