//! # Stores
//!
//! A [`Store`] owns one [`Snapshot`] and registers exactly one callback with
//! the shared [`Dispatcher`]. On every dispatch that callback runs the
//! store's reducer; when the reducer returns a snapshot that is not the
//! current one (by identity), the store swaps it in and notifies its
//! subscribers in subscription order.
//!
//! Store handles are cheap to clone and all clones share the same state.
//! Apart from [`Store::set_state`], nothing on a handle mutates it.

mod definition;
mod listeners;

pub use definition::{HandlerFn, ReducerFn, StoreConfig, StoreDefinition};
pub use listeners::Subscription;

pub(crate) use definition::reducer_fn;

use crate::{
    action::{Action, IntoAction},
    dispatch::{ActionCreator, DispatchResult, dispatch},
    error::StoreError,
    selectors::Selectors,
    snapshot::{AnySnapshot, Snapshot},
};
use concord_core::{DispatchError, DispatchToken, Dispatcher, WaitFor};
use definition::config_reducer;
use listeners::ListenerSet;
use std::{cell::RefCell, fmt, rc::Rc};
use tracing::{debug, trace};

/// Create a store on `dispatcher` with the given selectors.
pub fn create_store<S: 'static, D: 'static>(
    dispatcher: &Rc<Dispatcher<Action<D>>>,
    definition: StoreDefinition<S, D>,
    selectors: Selectors<S>,
) -> Result<Store<S, D>, StoreError> {
    match definition {
        StoreDefinition::Reducer { initial, reducer } => Ok(Store::from_parts(
            dispatcher,
            Snapshot::new(initial),
            reducer,
            selectors,
            Vec::new(),
        )),
        StoreDefinition::Config(config) => {
            if config.action_types().any(str::is_empty) {
                return Err(StoreError::InvalidDefinition(
                    "action types must not be empty".to_owned(),
                ));
            }
            let (initializer, handlers) = config.into_parts();
            let action_types = handlers.keys().cloned().collect();
            Ok(Store::from_parts(
                dispatcher,
                Snapshot::new(initializer()),
                config_reducer(handlers),
                selectors,
                action_types,
            ))
        }
    }
}

struct StoreInner<S: 'static, D: 'static> {
    token: DispatchToken,
    dispatcher: Rc<Dispatcher<Action<D>>>,
    reducer: ReducerFn<S, D>,
    state: RefCell<Snapshot<S>>,
    listeners: Rc<ListenerSet>,
    selectors: Selectors<S>,
    action_types: Vec<String>,
}

impl<S: 'static, D: 'static> StoreInner<S, D> {
    fn handle(
        &self,
        action: &Action<D>,
        wait: &WaitFor<'_, Action<D>>,
    ) -> Result<(), DispatchError> {
        let current = self.state.borrow().clone();
        let next = (self.reducer)(&current, action, wait)?;
        if Snapshot::ptr_eq(&current, &next) {
            return Ok(());
        }

        *self.state.borrow_mut() = next;
        trace!(
            token = %self.token,
            action_type = %action.action_type,
            listeners = self.listeners.len(),
            "store state changed"
        );
        self.listeners.notify();
        Ok(())
    }
}

impl<S: 'static, D: 'static> Drop for StoreInner<S, D> {
    // Mid-dispatch the callback stays behind as a no-op; the registry cannot
    // change under an in-flight dispatch.
    fn drop(&mut self) {
        if self.dispatcher.is_dispatching() {
            return;
        }
        if self.dispatcher.unregister(self.token).is_ok() {
            debug!(token = %self.token, "store dropped");
        }
    }
}

/// Handle to a store.
pub struct Store<S: 'static, D: 'static> {
    inner: Rc<StoreInner<S, D>>,
}

impl<S: 'static, D: 'static> Store<S, D> {
    /// Create a store without selectors.
    pub fn new(
        dispatcher: &Rc<Dispatcher<Action<D>>>,
        definition: StoreDefinition<S, D>,
    ) -> Result<Self, StoreError> {
        create_store(dispatcher, definition, Selectors::new())
    }

    pub(crate) fn from_parts(
        dispatcher: &Rc<Dispatcher<Action<D>>>,
        initial: Snapshot<S>,
        reducer: ReducerFn<S, D>,
        selectors: Selectors<S>,
        action_types: Vec<String>,
    ) -> Self {
        let inner = Rc::new_cyclic(|weak: &std::rc::Weak<StoreInner<S, D>>| {
            let weak = weak.clone();
            let token = dispatcher.register(move |action, wait| match weak.upgrade() {
                Some(store) => store.handle(action, wait),
                None => Ok(()),
            });
            StoreInner {
                token,
                dispatcher: Rc::clone(dispatcher),
                reducer,
                state: RefCell::new(initial),
                listeners: Rc::default(),
                selectors,
                action_types,
            }
        });
        debug!(token = %inner.token, "store created");
        Self { inner }
    }

    /// The current snapshot.
    pub fn get_state(&self) -> Snapshot<S> {
        self.inner.state.borrow().clone()
    }

    /// Replace the current snapshot without notifying anyone.
    pub fn set_state(&self, state: impl Into<Snapshot<S>>) {
        *self.inner.state.borrow_mut() = state.into();
    }

    /// Call `listener` after every dispatch that changes this store's state.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        self.inner.listeners.add(Rc::new(listener))
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Run the reducer against `state`, bound to the shared `wait_for`.
    ///
    /// Nothing is stored and nobody is notified. Reducers that wait on other
    /// stores fail with [`DispatchError::NotDispatching`] outside a dispatch.
    pub fn reduce(
        &self,
        state: &Snapshot<S>,
        action: &Action<D>,
    ) -> Result<Snapshot<S>, DispatchError> {
        (self.inner.reducer)(state, action, &self.inner.dispatcher.waiter())
    }

    /// Token of this store's dispatcher callback.
    pub fn dispatch_token(&self) -> DispatchToken {
        self.inner.token
    }

    /// The dispatcher this store is registered with.
    pub fn dispatcher(&self) -> &Rc<Dispatcher<Action<D>>> {
        &self.inner.dispatcher
    }

    /// Run a named selector against the live state.
    pub fn select<A: 'static, R: 'static>(&self, name: &str, args: A) -> Result<R, StoreError> {
        let state = self.get_state();
        self.inner.selectors.call(name, &state, args)
    }

    /// Names of the selectors this store exposes.
    pub fn selector_names(&self) -> impl Iterator<Item = &str> {
        self.inner.selectors.names()
    }

    /// Action types declared by a config store, in declaration order.
    pub fn action_types(&self) -> impl Iterator<Item = &str> {
        self.inner.action_types.iter().map(String::as_str)
    }

    /// The action creator for a declared action type.
    ///
    /// Only config stores declare action types.
    pub fn action(&self, action_type: &str) -> Option<ActionCreator<D>> {
        self.inner
            .action_types
            .iter()
            .any(|declared| declared == action_type)
            .then(|| ActionCreator::new(Rc::clone(&self.inner.dispatcher), action_type))
    }
}

impl<S: 'static, D: Clone + 'static> Store<S, D> {
    /// Broadcast an action through the shared dispatcher.
    pub fn dispatch(&self, action: impl IntoAction<D>) -> DispatchResult<D> {
        dispatch(&self.inner.dispatcher, action)
    }
}

impl<S: 'static, D: 'static> Clone for Store<S, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: fmt::Debug + 'static, D: 'static> fmt::Debug for Store<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("token", &self.inner.token)
            .field("state", &self.get_state())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Anything a composed store can be built from.
///
/// Every [`Store`] is a state source, including composed ones.
pub trait StateSource<D: 'static> {
    /// Token to wait for before reading the state.
    fn dispatch_token(&self) -> DispatchToken;

    /// Dispatcher the source is registered with.
    fn dispatcher(&self) -> &Rc<Dispatcher<Action<D>>>;

    /// The current state, type erased.
    fn erased_state(&self) -> AnySnapshot;
}

impl<S: 'static, D: 'static> StateSource<D> for Store<S, D> {
    fn dispatch_token(&self) -> DispatchToken {
        Store::dispatch_token(self)
    }

    fn dispatcher(&self) -> &Rc<Dispatcher<Action<D>>> {
        Store::dispatcher(self)
    }

    fn erased_state(&self) -> AnySnapshot {
        self.get_state().erase()
    }
}
