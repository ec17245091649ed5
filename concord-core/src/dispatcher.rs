//! # Dependency-ordered Dispatcher
//!
//! The [`Dispatcher`] broadcasts one payload to every registered callback.
//! Visitation order is registration order unless a running callback asks,
//! through [`WaitFor::wait_for`], for other callbacks to complete first.
//!
//! # Ordering Model
//!
//! Constraints are declared by the callbacks themselves while the dispatch is
//! running, so no order is computed up front. Each dispatch is a depth-first
//! visit driven by a single linear pass over the registry:
//!
//! - every token starts the session `Idle`
//! - invoking a callback marks it `Pending`, then `Handled` once it returns
//! - `wait_for` on an `Idle` token invokes it right away (recursively)
//! - `wait_for` on a `Pending` token means we looped back into a callback that
//!   is waiting on us: [`DispatchError::CircularDependency`]
//!
//! A cycle is only reported once it is actually traversed. A callback that
//! would issue a circular `wait_for` but is never reached causes no error.
//!
//! # Reentrancy
//!
//! Only one dispatch may be in flight. Registry borrows are never held across
//! a callback invocation, so callbacks are free to query the dispatcher.

use crate::{error::DispatchError, token::DispatchToken};
use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashMap},
    fmt,
    marker::PhantomData,
    rc::Rc,
};
use tracing::{debug, trace, warn};

/// A registered callback.
///
/// Receives the session payload and a [`WaitFor`] handle for declaring
/// ordering constraints.
pub type BoxCallback<P> = Rc<dyn Fn(&P, &WaitFor<'_, P>) -> Result<(), DispatchError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Idle,
    Pending,
    Handled,
}

struct Session<P> {
    payload: Rc<P>,
    status: HashMap<DispatchToken, Status>,
}

/// Synchronous broadcast dispatcher with `wait_for` ordering.
///
/// Construct one per application and share it (usually behind an `Rc`) with
/// every store that needs to order against the others.
///
/// # Example
///
/// ```rust
/// use concord_core::Dispatcher;
/// use std::{cell::RefCell, rc::Rc};
///
/// let dispatcher = Dispatcher::<&'static str>::new();
/// let log = Rc::new(RefCell::new(Vec::new()));
///
/// let first = {
///     let log = log.clone();
///     dispatcher.register(move |payload, _| {
///         log.borrow_mut().push(format!("first:{payload}"));
///         Ok(())
///     })
/// };
/// {
///     let log = log.clone();
///     dispatcher.register(move |payload, wait| {
///         wait.wait_for(&[first])?;
///         log.borrow_mut().push(format!("second:{payload}"));
///         Ok(())
///     });
/// }
///
/// dispatcher.dispatch("hello").unwrap();
/// assert_eq!(*log.borrow(), ["first:hello", "second:hello"]);
/// ```
pub struct Dispatcher<P: 'static> {
    label: Option<String>,
    callbacks: RefCell<BTreeMap<DispatchToken, BoxCallback<P>>>,
    last_id: Cell<u64>,
    session: RefCell<Option<Session<P>>>,
}

impl<P: 'static> Dispatcher<P> {
    /// Create an unlabelled dispatcher.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start configuring a dispatcher.
    pub fn builder() -> DispatcherBuilder<P> {
        DispatcherBuilder::new()
    }

    /// The label attached to this dispatcher's log events, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Register a callback to be invoked with every dispatched payload.
    ///
    /// Always succeeds and returns a token that has never been issued before.
    pub fn register<F>(&self, callback: F) -> DispatchToken
    where
        F: Fn(&P, &WaitFor<'_, P>) -> Result<(), DispatchError> + 'static,
    {
        let id = self.last_id.get() + 1;
        self.last_id.set(id);
        let token = DispatchToken::from_raw(id);
        self.callbacks.borrow_mut().insert(token, Rc::new(callback));
        debug!(dispatcher = self.name(), token = %token, "registered callback");
        token
    }

    /// Remove a callback.
    ///
    /// Removing a callback while a dispatch is running is not supported; a
    /// token removed this way is skipped if it has not been visited yet.
    pub fn unregister(&self, token: DispatchToken) -> Result<(), DispatchError> {
        match self.callbacks.borrow_mut().remove(&token) {
            Some(_) => {
                debug!(dispatcher = self.name(), token = %token, "unregistered callback");
                Ok(())
            }
            None => Err(DispatchError::UnknownToken(token)),
        }
    }

    /// Whether `token` currently maps to a callback.
    pub fn is_registered(&self, token: DispatchToken) -> bool {
        self.callbacks.borrow().contains_key(&token)
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.callbacks.borrow().len()
    }

    /// Whether no callbacks are registered.
    pub fn is_empty(&self) -> bool {
        self.callbacks.borrow().is_empty()
    }

    /// Whether a dispatch is currently in flight.
    pub fn is_dispatching(&self) -> bool {
        self.session.borrow().is_some()
    }

    /// A [`WaitFor`] handle bound to this dispatcher.
    pub fn waiter(&self) -> WaitFor<'_, P> {
        WaitFor { dispatcher: self }
    }

    /// Invoke the callbacks for `tokens` before continuing the current one.
    ///
    /// Only valid while dispatching. Tokens are processed in the given order:
    /// already handled ones are skipped, idle ones are invoked immediately,
    /// and reaching one that is still pending is a cycle.
    pub fn wait_for(&self, tokens: &[DispatchToken]) -> Result<(), DispatchError> {
        if !self.is_dispatching() {
            return Err(DispatchError::NotDispatching);
        }
        for &token in tokens {
            if !self.is_registered(token) {
                return Err(DispatchError::UnknownToken(token));
            }
            match self.status(token) {
                Some(Status::Handled) => continue,
                Some(Status::Pending) => {
                    debug!(
                        dispatcher = self.name(),
                        token = %token,
                        "circular dependency detected"
                    );
                    return Err(DispatchError::CircularDependency(token));
                }
                Some(Status::Idle) | None => self.invoke_callback(token)?,
            }
        }
        Ok(())
    }

    /// Broadcast `payload` to every registered callback.
    ///
    /// The first callback error aborts the dispatch and is returned. The
    /// session is torn down on every exit path, including unwinding, so the
    /// dispatcher is always ready for the next call.
    pub fn dispatch(&self, payload: P) -> Result<(), DispatchError> {
        if self.is_dispatching() {
            warn!(
                dispatcher = self.name(),
                "dispatch rejected: another dispatch is in flight"
            );
            return Err(DispatchError::AlreadyDispatching);
        }

        let tokens: Vec<DispatchToken> = self.callbacks.borrow().keys().copied().collect();
        let _session = self.start_dispatching(payload, &tokens);
        debug!(
            dispatcher = self.name(),
            callbacks = tokens.len(),
            "dispatch started"
        );

        for token in tokens {
            if self.status(token) == Some(Status::Idle) {
                self.invoke_callback(token)?;
            }
        }

        debug!(dispatcher = self.name(), "dispatch completed");
        Ok(())
    }

    fn start_dispatching(&self, payload: P, tokens: &[DispatchToken]) -> SessionGuard<'_, P> {
        let status = tokens.iter().map(|&token| (token, Status::Idle)).collect();
        *self.session.borrow_mut() = Some(Session {
            payload: Rc::new(payload),
            status,
        });
        SessionGuard { dispatcher: self }
    }

    fn status(&self, token: DispatchToken) -> Option<Status> {
        self.session
            .borrow()
            .as_ref()
            .and_then(|session| session.status.get(&token).copied())
    }

    fn set_status(&self, token: DispatchToken, status: Status) {
        if let Some(session) = self.session.borrow_mut().as_mut() {
            session.status.insert(token, status);
        }
    }

    fn invoke_callback(&self, token: DispatchToken) -> Result<(), DispatchError> {
        let Some(callback) = self.callbacks.borrow().get(&token).cloned() else {
            return Ok(());
        };
        let Some(payload) = self
            .session
            .borrow()
            .as_ref()
            .map(|session| Rc::clone(&session.payload))
        else {
            return Err(DispatchError::NotDispatching);
        };

        self.set_status(token, Status::Pending);
        trace!(dispatcher = self.name(), token = %token, "invoking callback");
        callback(&*payload, &self.waiter())?;
        self.set_status(token, Status::Handled);
        Ok(())
    }

    fn name(&self) -> &str {
        self.label.as_deref().unwrap_or("default")
    }
}

impl<P: 'static> Default for Dispatcher<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: 'static> fmt::Debug for Dispatcher<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("label", &self.label)
            .field("callbacks", &self.len())
            .field("dispatching", &self.is_dispatching())
            .finish()
    }
}

/// Clears the session when the dispatch ends, however it ends.
struct SessionGuard<'a, P: 'static> {
    dispatcher: &'a Dispatcher<P>,
}

impl<P: 'static> Drop for SessionGuard<'_, P> {
    fn drop(&mut self) {
        if let Ok(mut session) = self.dispatcher.session.try_borrow_mut() {
            *session = None;
        }
    }
}

/// Capability handed to callbacks for declaring ordering constraints.
pub struct WaitFor<'a, P: 'static> {
    dispatcher: &'a Dispatcher<P>,
}

impl<'a, P: 'static> WaitFor<'a, P> {
    /// See [`Dispatcher::wait_for`].
    pub fn wait_for(&self, tokens: &[DispatchToken]) -> Result<(), DispatchError> {
        self.dispatcher.wait_for(tokens)
    }

    /// Whether the underlying dispatcher is dispatching.
    pub fn is_dispatching(&self) -> bool {
        self.dispatcher.is_dispatching()
    }

    /// The dispatcher this handle belongs to.
    pub fn dispatcher(&self) -> &'a Dispatcher<P> {
        self.dispatcher
    }
}

impl<P: 'static> Clone for WaitFor<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: 'static> Copy for WaitFor<'_, P> {}

/// Builder for [`Dispatcher`].
///
/// The payload type is carried by the builder, so it is usually inferred
/// from where the built dispatcher ends up.
pub struct DispatcherBuilder<P: 'static> {
    label: Option<String>,
    _payload: PhantomData<fn(P)>,
}

impl<P: 'static> DispatcherBuilder<P> {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self {
            label: None,
            _payload: PhantomData,
        }
    }

    /// Attach a label to every log event the dispatcher emits.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Build the dispatcher.
    pub fn build(self) -> Dispatcher<P> {
        Dispatcher {
            label: self.label,
            callbacks: RefCell::new(BTreeMap::new()),
            last_id: Cell::new(0),
            session: RefCell::new(None),
        }
    }
}

impl<P: 'static> Default for DispatcherBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: 'static> Clone for DispatcherBuilder<P> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            _payload: PhantomData,
        }
    }
}

impl<P: 'static> fmt::Debug for DispatcherBuilder<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("label", &self.label)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn recorder(
        log: &Log,
        name: &'static str,
    ) -> impl Fn(&u32, &WaitFor<'_, u32>) -> Result<(), DispatchError> + 'static {
        let log = log.clone();
        move |_, _| {
            log.borrow_mut().push(name);
            Ok(())
        }
    }

    #[test]
    fn tokens_are_distinct_and_increasing() {
        let dispatcher = Dispatcher::<u32>::new();
        let tokens: Vec<_> = (0..5).map(|_| dispatcher.register(|_, _| Ok(()))).collect();

        assert!(tokens.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(tokens[0].to_string(), "ID_1");
        assert_eq!(dispatcher.len(), 5);
    }

    #[test]
    fn tokens_are_not_reused_after_unregister() {
        let dispatcher = Dispatcher::<u32>::new();
        let first = dispatcher.register(|_, _| Ok(()));
        dispatcher.unregister(first).unwrap();
        let second = dispatcher.register(|_, _| Ok(()));

        assert!(second > first);
    }

    #[test]
    fn dispatch_visits_in_registration_order() {
        let dispatcher = Dispatcher::<u32>::new();
        let log = Log::default();
        dispatcher.register(recorder(&log, "a"));
        dispatcher.register(recorder(&log, "b"));
        dispatcher.register(recorder(&log, "c"));

        dispatcher.dispatch(1).unwrap();

        assert_eq!(*log.borrow(), ["a", "b", "c"]);
    }

    #[test]
    fn callbacks_see_the_payload() {
        let dispatcher = Dispatcher::<u32>::new();
        let seen = Rc::new(Cell::new(0));
        let sink = seen.clone();
        dispatcher.register(move |payload, _| {
            sink.set(*payload);
            Ok(())
        });

        dispatcher.dispatch(42).unwrap();

        assert_eq!(seen.get(), 42);
    }

    #[test]
    fn unregister_unknown_token_fails() {
        let dispatcher = Dispatcher::<u32>::new();
        let err = dispatcher
            .unregister(DispatchToken::from_raw(9))
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownToken(t) if t.as_raw() == 9));
    }

    #[test]
    fn unregistered_callback_no_longer_receives_payloads() {
        let dispatcher = Dispatcher::<u32>::new();
        let log = Log::default();
        let a = dispatcher.register(recorder(&log, "a"));
        dispatcher.register(recorder(&log, "b"));

        dispatcher.unregister(a).unwrap();
        dispatcher.dispatch(1).unwrap();

        assert_eq!(*log.borrow(), ["b"]);
        assert!(matches!(
            dispatcher.unregister(a),
            Err(DispatchError::UnknownToken(_))
        ));
    }

    #[test]
    fn wait_for_outside_dispatch_fails() {
        let dispatcher = Dispatcher::<u32>::new();
        let token = dispatcher.register(|_, _| Ok(()));

        assert!(matches!(
            dispatcher.wait_for(&[token]),
            Err(DispatchError::NotDispatching)
        ));
        assert!(matches!(
            dispatcher.wait_for(&[]),
            Err(DispatchError::NotDispatching)
        ));
    }

    #[test]
    fn wait_for_orders_dependencies_first() {
        let dispatcher = Dispatcher::<u32>::new();
        let log = Log::default();
        let slot = Rc::new(Cell::new(DispatchToken::from_raw(0)));

        {
            let log = log.clone();
            let slot = slot.clone();
            dispatcher.register(move |_, wait| {
                wait.wait_for(&[slot.get()])?;
                log.borrow_mut().push("a");
                Ok(())
            });
        }
        slot.set(dispatcher.register(recorder(&log, "b")));

        dispatcher.dispatch(1).unwrap();

        assert_eq!(*log.borrow(), ["b", "a"]);
    }

    #[test]
    fn wait_for_many_runs_each_once() {
        let dispatcher = Dispatcher::<u32>::new();
        let log = Log::default();
        let a = dispatcher.register(recorder(&log, "a"));
        let b = dispatcher.register(recorder(&log, "b"));
        {
            let log = log.clone();
            dispatcher.register(move |_, wait| {
                wait.wait_for(&[a, b])?;
                // Both already handled: no-op.
                wait.wait_for(&[b, a])?;
                log.borrow_mut().push("c");
                Ok(())
            });
        }

        dispatcher.dispatch(1).unwrap();

        assert_eq!(*log.borrow(), ["a", "b", "c"]);
    }

    #[test]
    fn wait_for_unknown_token_fails() {
        let dispatcher = Dispatcher::<u32>::new();
        dispatcher.register(|_, wait| wait.wait_for(&[DispatchToken::from_raw(77)]));

        assert!(matches!(
            dispatcher.dispatch(1),
            Err(DispatchError::UnknownToken(t)) if t.as_raw() == 77
        ));
    }

    #[test]
    fn mutual_wait_is_circular() {
        let dispatcher = Dispatcher::<u32>::new();
        let token_a = Rc::new(Cell::new(DispatchToken::from_raw(0)));
        let token_b = Rc::new(Cell::new(DispatchToken::from_raw(0)));

        let b = token_b.clone();
        token_a.set(dispatcher.register(move |_, wait| wait.wait_for(&[b.get()])));
        let a = token_a.clone();
        token_b.set(dispatcher.register(move |_, wait| wait.wait_for(&[a.get()])));

        let err = dispatcher.dispatch(1).unwrap_err();
        assert!(err.is_circular());
        assert!(!dispatcher.is_dispatching());
    }

    #[test]
    fn waiting_on_self_is_circular() {
        let dispatcher = Rc::new(Dispatcher::<u32>::new());
        let slot = Rc::new(Cell::new(DispatchToken::from_raw(0)));
        let own = slot.clone();
        slot.set(dispatcher.register(move |_, wait| wait.wait_for(&[own.get()])));

        assert!(matches!(
            dispatcher.dispatch(1),
            Err(DispatchError::CircularDependency(t)) if t == slot.get()
        ));
    }

    #[test]
    fn unreached_cycle_goes_unnoticed() {
        let dispatcher = Dispatcher::<bool>::new();
        let token_a = Rc::new(Cell::new(DispatchToken::from_raw(0)));
        let token_b = Rc::new(Cell::new(DispatchToken::from_raw(0)));

        // Both only wait when the payload asks them to.
        let b = token_b.clone();
        token_a.set(dispatcher.register(move |cyclic, wait| {
            if *cyclic {
                wait.wait_for(&[b.get()])?;
            }
            Ok(())
        }));
        let a = token_a.clone();
        token_b.set(dispatcher.register(move |cyclic, wait| {
            if *cyclic {
                wait.wait_for(&[a.get()])?;
            }
            Ok(())
        }));

        assert!(dispatcher.dispatch(false).is_ok());
        assert!(dispatcher.dispatch(true).unwrap_err().is_circular());
    }

    #[test]
    fn nested_dispatch_is_rejected() {
        let dispatcher = Dispatcher::<u32>::new();
        dispatcher.register(|payload, wait| {
            assert!(wait.is_dispatching());
            wait.dispatcher().dispatch(payload + 1)
        });

        assert!(matches!(
            dispatcher.dispatch(1),
            Err(DispatchError::AlreadyDispatching)
        ));
        assert!(!dispatcher.is_dispatching());
    }

    #[test]
    fn failing_callback_leaves_dispatcher_clean() {
        let dispatcher = Dispatcher::<u32>::new();
        let log = Log::default();
        dispatcher.register(|payload, _| {
            if *payload == 0 {
                Err(DispatchError::callback("zero is not allowed"))
            } else {
                Ok(())
            }
        });
        dispatcher.register(recorder(&log, "after"));

        assert!(matches!(
            dispatcher.dispatch(0),
            Err(DispatchError::Callback(_))
        ));
        assert!(!dispatcher.is_dispatching());
        assert!(log.borrow().is_empty());

        dispatcher.dispatch(1).unwrap();
        assert_eq!(*log.borrow(), ["after"]);
    }

    #[test]
    fn panicking_callback_leaves_dispatcher_clean() {
        let dispatcher = Dispatcher::<u32>::new();
        dispatcher.register(|payload, _| {
            if *payload == 0 {
                panic!("boom");
            }
            Ok(())
        });

        let outcome = catch_unwind(AssertUnwindSafe(|| dispatcher.dispatch(0)));
        assert!(outcome.is_err());
        assert!(!dispatcher.is_dispatching());
        assert!(dispatcher.dispatch(1).is_ok());
    }

    #[test]
    fn is_dispatching_only_inside_dispatch() {
        let dispatcher = Dispatcher::<u32>::new();
        let inside = Rc::new(Cell::new(false));
        let flag = inside.clone();
        dispatcher.register(move |_, wait| {
            flag.set(wait.is_dispatching());
            Ok(())
        });

        assert!(!dispatcher.is_dispatching());
        dispatcher.dispatch(1).unwrap();
        assert!(inside.get());
        assert!(!dispatcher.is_dispatching());
    }

    #[test]
    fn callback_registered_mid_dispatch_waits_for_next_one() {
        let dispatcher = Rc::new(Dispatcher::<u32>::new());
        let log = Log::default();
        {
            let log = log.clone();
            dispatcher.register(move |payload, wait| {
                if *payload == 1 {
                    wait.dispatcher().register(recorder(&log, "late"));
                }
                Ok(())
            });
        }

        dispatcher.dispatch(1).unwrap();
        assert!(log.borrow().is_empty());

        dispatcher.dispatch(2).unwrap();
        assert_eq!(*log.borrow(), ["late"]);
    }

    #[test]
    fn builder_sets_label() {
        let dispatcher: Dispatcher<()> = Dispatcher::builder().label("app").build();
        assert_eq!(dispatcher.label(), Some("app"));
        assert!(dispatcher.is_empty());
        assert!(format!("{dispatcher:?}").contains("app"));
    }

    #[test]
    fn builder_payload_inferred_from_use() {
        let log = Log::default();
        let dispatcher = Dispatcher::builder().label("inferred").build();
        dispatcher.register(recorder(&log, "only"));
        dispatcher.dispatch(7).unwrap();

        assert_eq!(*log.borrow(), ["only"]);
        assert_eq!(dispatcher.label(), Some("inferred"));
        assert_eq!(Dispatcher::<u32>::new().label(), None);
    }
}
