//! # Snapshots
//!
//! A [`Snapshot`] is the immutable state value a store owns. It is shared by
//! reference counting and never mutated; a transition replaces it.
//!
//! # Identity Contract
//!
//! Change detection compares snapshots by identity ([`Snapshot::ptr_eq`]),
//! never by value. A reducer signals "no change" by returning a clone of the
//! snapshot it was given. Returning `Snapshot::new(..)` always counts as a
//! change, even when the new value is equal to the old one, and wakes every
//! subscriber.

use std::{any::Any, fmt, ops::Deref, rc::Rc};

/// Immutable, reference-counted store state.
pub struct Snapshot<S: ?Sized>(Rc<S>);

impl<S> Snapshot<S> {
    /// Wrap a fresh value. The result is distinct from every other snapshot.
    pub fn new(value: S) -> Self {
        Self(Rc::new(value))
    }
}

impl<S: ?Sized> Snapshot<S> {
    /// Wrap an existing reference-counted value without copying it.
    pub fn from_rc(value: Rc<S>) -> Self {
        Self(value)
    }

    /// Whether both snapshots are the same allocation.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Unwrap into the shared value.
    pub fn into_rc(self) -> Rc<S> {
        self.0
    }
}

impl<S: 'static> Snapshot<S> {
    /// Erase the state type, keeping identity.
    pub fn erase(&self) -> AnySnapshot {
        AnySnapshot(self.0.clone())
    }
}

impl<S: ?Sized> Clone for Snapshot<S> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<S: ?Sized> Deref for Snapshot<S> {
    type Target = S;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S: ?Sized> AsRef<S> for Snapshot<S> {
    fn as_ref(&self) -> &S {
        &self.0
    }
}

impl<S> From<S> for Snapshot<S> {
    fn from(value: S) -> Self {
        Self::new(value)
    }
}

impl<S: ?Sized + fmt::Debug> fmt::Debug for Snapshot<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Snapshot").field(&&*self.0).finish()
    }
}

/// A snapshot whose state type has been erased.
///
/// Composed stores hold one per constituent so that stores of different
/// state types can be combined.
#[derive(Clone)]
pub struct AnySnapshot(Rc<dyn Any>);

impl AnySnapshot {
    /// Recover the typed snapshot, if the state is an `S`.
    pub fn downcast<S: 'static>(&self) -> Option<Snapshot<S>> {
        Rc::downcast::<S>(self.0.clone()).ok().map(Snapshot)
    }

    /// Whether the state is an `S`.
    pub fn is<S: 'static>(&self) -> bool {
        self.0.is::<S>()
    }

    /// Whether both point to the same allocation.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&a.0), Rc::as_ptr(&b.0))
    }

    /// Whether this is the same allocation as a typed snapshot.
    pub fn same_as<S: 'static>(&self, other: &Snapshot<S>) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl fmt::Debug for AnySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AnySnapshot(..)")
    }
}
