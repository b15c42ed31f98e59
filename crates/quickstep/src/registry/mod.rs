//! Step registry: the handlers of one definition type, indexed by keyword.
//!
//! A registry is built once from a [`RegistryBuilder`] and never changes
//! afterwards. [`StepRegistry::shared`] caches one registry per definition
//! type for the lifetime of the process so concurrent scenario runs share it
//! through an [`Arc`].

mod builder;
#[cfg(feature = "diagnostics")]
mod diagnostics;

pub use builder::{HandlerBuilder, RegistryBuilder};

use crate::definition::FeatureSteps;
use crate::error::DefinitionError;
use crate::handler::{HandlerKind, SharedHandler, StepFuture};
use crate::value::{ParamSpec, StepValue};
use hashbrown::HashMap;
use quickstep_patterns::{StepKeyword, StepPattern};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

type RegistryCache = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

static REGISTRIES: LazyLock<Mutex<RegistryCache>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Position of a handler within its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(usize);

impl HandlerId {
    /// Registration position, starting at zero.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One keyword and pattern pair declared by a handler.
#[derive(Debug, Clone)]
pub struct Declaration {
    /// The keyword the pattern is registered under.
    pub keyword: StepKeyword,
    /// The anchored pattern.
    pub pattern: StepPattern,
}

/// A validated handler.
pub struct HandlerDescriptor<W> {
    id: HandlerId,
    owner: &'static str,
    name: String,
    declarations: Vec<Declaration>,
    params: Vec<ParamSpec>,
    kind: HandlerKind,
    handler: SharedHandler<W>,
}

impl<W> HandlerDescriptor<W> {
    /// Registration position within the registry.
    #[must_use]
    pub const fn id(&self) -> HandlerId {
        self.id
    }

    /// Name of the type that declared the handler.
    #[must_use]
    pub const fn owner(&self) -> &'static str {
        self.owner
    }

    /// Diagnostic name of the handler.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keyword and pattern pairs in declaration order.
    #[must_use]
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Parameter descriptions in order.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// How the handler completes.
    #[must_use]
    pub const fn kind(&self) -> HandlerKind {
        self.kind
    }

    pub(crate) fn invoke<'a>(
        &'a self,
        instance: &'a mut W,
        args: Vec<StepValue>,
    ) -> StepFuture<'a> {
        self.handler.invoke(instance, args)
    }
}

impl<W> fmt::Debug for HandlerDescriptor<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("declarations", &self.declarations)
            .field("params", &self.params)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// A handler declaration that may match a step.
#[derive(Debug)]
pub struct Candidate<'r, W> {
    /// The declaring handler.
    pub handler: &'r HandlerDescriptor<W>,
    /// The declared pattern.
    pub pattern: &'r StepPattern,
}

/// The immutable handler table of one definition type.
pub struct StepRegistry<W> {
    owner: &'static str,
    handlers: Vec<HandlerDescriptor<W>>,
    by_keyword: HashMap<StepKeyword, Vec<(usize, usize)>>,
}

impl<W: FeatureSteps> StepRegistry<W> {
    /// Build a fresh registry from [`FeatureSteps::register`].
    ///
    /// # Errors
    ///
    /// Returns the first [`DefinitionError`] found while validating handlers.
    pub fn build() -> Result<Self, DefinitionError> {
        let mut steps = RegistryBuilder::new();
        W::register(&mut steps);
        steps.build()
    }

    /// Return the process-wide registry for `W`, building it on first use.
    ///
    /// Failed builds are not cached, so every call reports the error.
    ///
    /// # Errors
    ///
    /// Returns the first [`DefinitionError`] found while validating handlers.
    pub fn shared() -> Result<Arc<Self>, DefinitionError> {
        let key = TypeId::of::<W>();
        let cached = REGISTRIES
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(registry) = cached.and_then(|entry| entry.downcast::<Self>().ok()) {
            return Ok(registry);
        }

        // Build outside the lock so registration code may consult other
        // registries.
        let built: Arc<dyn Any + Send + Sync> = Arc::new(Self::build()?);
        let entry = REGISTRIES
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(built)
            .clone();
        entry.downcast::<Self>().map_err(|_| {
            unreachable!("registry cache entries are keyed by their own type")
        })
    }
}

impl<W> StepRegistry<W> {
    pub(crate) fn from_handlers(owner: &'static str, handlers: Vec<HandlerDescriptor<W>>) -> Self {
        let mut by_keyword: HashMap<StepKeyword, Vec<(usize, usize)>> = HashMap::new();
        for (handler_index, handler) in handlers.iter().enumerate() {
            for (declaration_index, declaration) in handler.declarations.iter().enumerate() {
                log::debug!(
                    "registering {} `{}` for {}::{}",
                    declaration.keyword,
                    declaration.pattern,
                    owner,
                    handler.name
                );
                by_keyword
                    .entry(declaration.keyword)
                    .or_default()
                    .push((handler_index, declaration_index));
            }
        }
        Self {
            owner,
            handlers,
            by_keyword,
        }
    }

    /// Name of the definition type the registry was built for.
    #[must_use]
    pub const fn owner(&self) -> &'static str {
        self.owner
    }

    /// Every handler in registration order.
    #[must_use]
    pub fn handlers(&self) -> &[HandlerDescriptor<W>] {
        &self.handlers
    }

    /// Look up a handler by id.
    #[must_use]
    pub fn handler(&self, id: HandlerId) -> Option<&HandlerDescriptor<W>> {
        self.handlers.get(id.index())
    }

    /// Number of handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Return `true` when no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Declarations registered under `keyword`, in match priority order.
    ///
    /// When several patterns match the same step, the first candidate wins:
    /// handlers in registration order, and within one handler its
    /// declarations in the order they were added.
    pub fn candidates(&self, keyword: StepKeyword) -> impl Iterator<Item = Candidate<'_, W>> {
        self.by_keyword
            .get(&keyword)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(|&(handler_index, declaration_index)| {
                let handler = self.handlers.get(handler_index)?;
                let declaration = handler.declarations.get(declaration_index)?;
                Some(Candidate {
                    handler,
                    pattern: &declaration.pattern,
                })
            })
    }
}

impl<W> fmt::Debug for StepRegistry<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepRegistry")
            .field("owner", &self.owner)
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::StepFault;

    struct Traffic {
        colour: String,
    }

    impl FeatureSteps for Traffic {
        fn create() -> Result<Self, StepFault> {
            Ok(Self {
                colour: String::new(),
            })
        }

        fn register(steps: &mut RegistryBuilder<Self>) {
            steps.given(r"the light is (\w+)", |t: &mut Self, (colour,): (String,)| {
                t.colour = colour;
            });
            steps
                .given(r"the light is red", |t: &mut Self, ()| t.colour = "RED".into())
                .then("the light is red");
            steps.star("anything", |_: &mut Self, ()| {});
        }
    }

    #[test]
    fn candidates_follow_registration_order() {
        let registry = StepRegistry::<Traffic>::build()
            .unwrap_or_else(|err| panic!("registry should build: {err}"));
        let given: Vec<&str> = registry
            .candidates(StepKeyword::Given)
            .map(|candidate| candidate.pattern.as_str())
            .collect();
        assert_eq!(given, [r"the light is (\w+)", "the light is red"]);
        assert_eq!(registry.candidates(StepKeyword::Then).count(), 1);
        assert_eq!(registry.candidates(StepKeyword::Wildcard).count(), 1);
        assert_eq!(registry.candidates(StepKeyword::But).count(), 0);
    }

    #[test]
    fn shared_registry_is_built_once() {
        let first = StepRegistry::<Traffic>::shared()
            .unwrap_or_else(|err| panic!("registry should build: {err}"));
        let second = StepRegistry::<Traffic>::shared()
            .unwrap_or_else(|err| panic!("registry should build: {err}"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.owner(), "Traffic");
    }

    #[test]
    fn handlers_are_addressable_by_id() {
        let registry = StepRegistry::<Traffic>::build()
            .unwrap_or_else(|err| panic!("registry should build: {err}"));
        let Some(handler) = registry.handler(HandlerId(1)) else {
            panic!("expected second handler");
        };
        assert_eq!(handler.name(), "the light is red");
        assert_eq!(handler.declarations().len(), 2);
        assert!(registry.handler(HandlerId(3)).is_none());
    }
}
