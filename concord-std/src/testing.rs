//! Testing utilities for Concord.
//!
//! This module provides small helpers for asserting on dispatch order and
//! change notifications.
//!
//! # Features
//!
//! - [`OrderRecorder`]: A shared log of which callbacks ran, in order
//! - [`RecordingCallback`]: A dispatcher callback that records payloads
//! - [`CountingListener`]: A store listener factory that counts notifications

use concord_core::{DispatchToken, Dispatcher};
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

// ============================================================================
// Order Recorder
// ============================================================================

/// A shared, append-only log of names.
///
/// # Example
///
/// ```rust,ignore
/// let order = OrderRecorder::new();
/// order.register(&dispatcher, "a");
/// order.register(&dispatcher, "b");
///
/// dispatcher.dispatch(payload)?;
/// assert_eq!(order.entries(), ["a", "b"]);
/// ```
#[derive(Clone, Default)]
pub struct OrderRecorder {
    entries: Rc<RefCell<Vec<String>>>,
}

impl OrderRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a name.
    pub fn record(&self, name: impl Into<String>) {
        self.entries.borrow_mut().push(name.into());
    }

    /// Register a callback with `dispatcher` that records `name` every time
    /// it runs.
    pub fn register<P: 'static>(&self, dispatcher: &Dispatcher<P>, name: &str) -> DispatchToken {
        let recorder = self.clone();
        let name = name.to_owned();
        dispatcher.register(move |_, _| {
            recorder.record(name.as_str());
            Ok(())
        })
    }

    /// Register a callback with `dispatcher` that waits for `deps` (read when
    /// it runs) and then records `name`.
    pub fn register_waiting<P: 'static>(
        &self,
        dispatcher: &Dispatcher<P>,
        name: &str,
        deps: Rc<RefCell<Vec<DispatchToken>>>,
    ) -> DispatchToken {
        let recorder = self.clone();
        let name = name.to_owned();
        dispatcher.register(move |_, wait| {
            let tokens = deps.borrow().clone();
            wait.wait_for(&tokens)?;
            recorder.record(name.as_str());
            Ok(())
        })
    }

    /// Everything recorded so far.
    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

// ============================================================================
// Recording Callback
// ============================================================================

/// Registers a callback that keeps a copy of every payload it receives.
pub struct RecordingCallback<P> {
    token: DispatchToken,
    payloads: Rc<RefCell<Vec<P>>>,
}

impl<P: Clone + 'static> RecordingCallback<P> {
    /// Register a recording callback with `dispatcher`.
    pub fn register(dispatcher: &Dispatcher<P>) -> Self {
        let payloads: Rc<RefCell<Vec<P>>> = Rc::default();
        let sink = payloads.clone();
        let token = dispatcher.register(move |payload: &P, _| {
            sink.borrow_mut().push(payload.clone());
            Ok(())
        });
        Self { token, payloads }
    }

    /// Token of the registered callback.
    pub fn token(&self) -> DispatchToken {
        self.token
    }

    /// Payloads received so far.
    pub fn payloads(&self) -> Vec<P> {
        self.payloads.borrow().clone()
    }

    /// Number of payloads received.
    pub fn count(&self) -> usize {
        self.payloads.borrow().len()
    }
}

// ============================================================================
// Counting Listener
// ============================================================================

/// Counts store change notifications.
///
/// # Example
///
/// ```rust,ignore
/// let changes = CountingListener::new();
/// store.subscribe(changes.listener());
///
/// dispatcher.dispatch(action)?;
/// assert_eq!(changes.count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct CountingListener {
    count: Rc<Cell<usize>>,
}

impl CountingListener {
    /// Create a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener closure that bumps this counter.
    pub fn listener(&self) -> impl Fn() + 'static {
        let count = self.count.clone();
        move || count.set(count.get() + 1)
    }

    /// Notifications counted so far.
    pub fn count(&self) -> usize {
        self.count.get()
    }

    /// Reset the counter.
    pub fn reset(&self) {
        self.count.set(0);
    }
}
