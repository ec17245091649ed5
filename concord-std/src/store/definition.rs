//! Store definitions.

use crate::{action::Action, snapshot::Snapshot};
use concord_core::{DispatchError, WaitFor};
use indexmap::IndexMap;
use std::{fmt, rc::Rc};

/// A reducer over whole actions.
///
/// Must return a clone of `state` when nothing changed; see the identity
/// contract on [`Snapshot`].
pub type ReducerFn<S, D> = Rc<
    dyn Fn(&Snapshot<S>, &Action<D>, &WaitFor<'_, Action<D>>) -> Result<Snapshot<S>, DispatchError>,
>;

/// A handler for a single action type, receiving only the action data.
pub type HandlerFn<S, D> =
    Rc<dyn Fn(&Snapshot<S>, &D, &WaitFor<'_, Action<D>>) -> Result<Snapshot<S>, DispatchError>>;

pub(crate) fn reducer_fn<S, D, F>(reducer: F) -> ReducerFn<S, D>
where
    F: Fn(&Snapshot<S>, &Action<D>, &WaitFor<'_, Action<D>>) -> Result<Snapshot<S>, DispatchError>
        + 'static,
{
    Rc::new(reducer)
}

/// How a store computes its state.
pub enum StoreDefinition<S, D: 'static> {
    /// A single reducer, called for every action.
    Reducer {
        /// State before the first action.
        initial: S,
        /// The reducer.
        reducer: ReducerFn<S, D>,
    },
    /// One handler per action type.
    Config(StoreConfig<S, D>),
}

impl<S, D: 'static> StoreDefinition<S, D> {
    /// Define a store by a reducer and its initial state.
    ///
    /// `initial` is used as is: the reducer is not called to produce it, and
    /// first sees a state when the first action is dispatched.
    pub fn reducer<F>(initial: S, reducer: F) -> Self
    where
        F: Fn(&Snapshot<S>, &Action<D>, &WaitFor<'_, Action<D>>) -> Result<Snapshot<S>, DispatchError>
            + 'static,
    {
        StoreDefinition::Reducer {
            initial,
            reducer: reducer_fn(reducer),
        }
    }

    /// Define a store by per-action handlers.
    pub fn config(config: StoreConfig<S, D>) -> Self {
        StoreDefinition::Config(config)
    }
}

impl<S, D: 'static> From<StoreConfig<S, D>> for StoreDefinition<S, D> {
    fn from(config: StoreConfig<S, D>) -> Self {
        StoreDefinition::Config(config)
    }
}

impl<S, D: 'static> fmt::Debug for StoreDefinition<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreDefinition::Reducer { .. } => f.write_str("StoreDefinition::Reducer"),
            StoreDefinition::Config(config) => f
                .debug_tuple("StoreDefinition::Config")
                .field(&config.handlers.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}

/// Builder for handler-based stores.
///
/// # Example
///
/// ```rust,ignore
/// let config = StoreConfig::<i32, i32>::new()
///     .on("add", |state, amount, _| Ok(Snapshot::new(**state + amount)))
///     .on("reset", |_, _, _| Ok(Snapshot::new(0)));
/// ```
pub struct StoreConfig<S, D: 'static> {
    initializer: Box<dyn FnOnce() -> S>,
    pub(crate) handlers: IndexMap<String, HandlerFn<S, D>>,
}

impl<S: Default + 'static, D: 'static> StoreConfig<S, D> {
    /// Start a config whose initial state is `S::default()`.
    pub fn new() -> Self {
        Self::with_initializer(S::default)
    }
}

impl<S: Default + 'static, D: 'static> Default for StoreConfig<S, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, D: 'static> StoreConfig<S, D> {
    /// Start a config whose initial state comes from `initializer`.
    pub fn with_initializer<F>(initializer: F) -> Self
    where
        F: FnOnce() -> S + 'static,
    {
        Self {
            initializer: Box::new(initializer),
            handlers: IndexMap::new(),
        }
    }

    /// Handle `action_type`. A later handler for the same type replaces the
    /// earlier one.
    pub fn on<F>(mut self, action_type: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Snapshot<S>, &D, &WaitFor<'_, Action<D>>) -> Result<Snapshot<S>, DispatchError>
            + 'static,
    {
        self.handlers.insert(action_type.into(), Rc::new(handler));
        self
    }

    /// Declared action types, in declaration order.
    pub fn action_types(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub(crate) fn into_parts(self) -> (Box<dyn FnOnce() -> S>, IndexMap<String, HandlerFn<S, D>>) {
        (self.initializer, self.handlers)
    }
}

/// Build the reducer behind a config store. Unhandled types keep the state.
pub(crate) fn config_reducer<S: 'static, D: 'static>(
    handlers: IndexMap<String, HandlerFn<S, D>>,
) -> ReducerFn<S, D> {
    reducer_fn(move |state, action, wait| match handlers.get(action.action_type()) {
        Some(handler) => handler(state, &action.data, wait),
        None => Ok(state.clone()),
    })
}
