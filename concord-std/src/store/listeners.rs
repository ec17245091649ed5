//! Change listeners.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
};

type Listener = Rc<dyn Fn()>;

struct Entry {
    listener: Listener,
    active: Cell<bool>,
}

#[derive(Default)]
pub(crate) struct ListenerSet {
    entries: RefCell<Vec<Rc<Entry>>>,
}

impl ListenerSet {
    pub(crate) fn add(self: &Rc<Self>, listener: Listener) -> Subscription {
        let entry = Rc::new(Entry {
            listener,
            active: Cell::new(true),
        });
        let handle = Rc::downgrade(&entry);
        self.entries.borrow_mut().push(entry);
        Subscription {
            set: Rc::downgrade(self),
            entry: handle,
        }
    }

    fn remove(&self, entry: &Rc<Entry>) -> bool {
        if !entry.active.replace(false) {
            return false;
        }
        self.entries
            .borrow_mut()
            .retain(|other| !Rc::ptr_eq(other, entry));
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Call every listener in subscription order.
    ///
    /// Listeners removed while this runs are not called; listeners added
    /// while this runs wait for the next change.
    pub(crate) fn notify(&self) {
        let current: Vec<Rc<Entry>> = self.entries.borrow().clone();
        for entry in current {
            if entry.active.get() {
                (entry.listener)();
            }
        }
    }
}

/// Handle returned by `subscribe`.
///
/// Dropping it does not unsubscribe; call [`Subscription::unsubscribe`].
pub struct Subscription {
    set: Weak<ListenerSet>,
    entry: Weak<Entry>,
}

impl Subscription {
    /// Remove exactly this registration. Further calls are no-ops.
    ///
    /// Returns whether the listener was still subscribed.
    pub fn unsubscribe(&self) -> bool {
        match (self.set.upgrade(), self.entry.upgrade()) {
            (Some(set), Some(entry)) => set.remove(&entry),
            _ => false,
        }
    }

    /// Whether this registration is still active.
    pub fn is_active(&self) -> bool {
        self.set.upgrade().is_some()
            && self
                .entry
                .upgrade()
                .is_some_and(|entry| entry.active.get())
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
