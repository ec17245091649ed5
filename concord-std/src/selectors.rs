//! Named selectors bound to a store's live state.

use crate::error::StoreError;
use indexmap::IndexMap;
use std::{
    any::{Any, type_name},
    fmt,
    rc::Rc,
};

type SelectorFn<S, A, R> = Rc<dyn Fn(&S, A) -> R>;

/// Named queries over a store's state.
///
/// Each selector has its own argument type `A` (use `()` for none, a tuple
/// for several) and result type `R`. Types are checked when the selector is
/// called through [`Store::select`].
///
/// [`Store::select`]: crate::Store::select
pub struct Selectors<S> {
    entries: IndexMap<String, Box<dyn Any>>,
    _state: std::marker::PhantomData<fn(&S)>,
}

impl<S: 'static> Selectors<S> {
    /// An empty selector set.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            _state: std::marker::PhantomData,
        }
    }

    /// Add a selector. A later selector with the same name replaces the
    /// earlier one.
    pub fn add<A, R, F>(mut self, name: impl Into<String>, selector: F) -> Self
    where
        A: 'static,
        R: 'static,
        F: Fn(&S, A) -> R + 'static,
    {
        let selector: SelectorFn<S, A, R> = Rc::new(selector);
        self.entries.insert(name.into(), Box::new(selector));
        self
    }

    /// Registered selector names, in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Whether a selector with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub(crate) fn call<A: 'static, R: 'static>(
        &self,
        name: &str,
        state: &S,
        args: A,
    ) -> Result<R, StoreError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| StoreError::UnknownSelector(name.to_owned()))?;
        let selector = entry.downcast_ref::<SelectorFn<S, A, R>>().ok_or_else(|| {
            StoreError::SelectorSignature(format!(
                "`{name}` does not take `{}` and return `{}`",
                type_name::<A>(),
                type_name::<R>()
            ))
        })?;
        Ok(selector(state, args))
    }
}

impl<S: 'static> Default for Selectors<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: 'static> fmt::Debug for Selectors<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
