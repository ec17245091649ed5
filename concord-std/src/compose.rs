//! # Composed Stores
//!
//! [`compose_store`] derives a new store from existing ones. Its reducer
//! first waits for every constituent, so each constituent has applied the
//! current action before the composed state is read. The composed snapshot
//! is only replaced when at least one constituent snapshot changed identity;
//! otherwise the previous one is returned as is and subscribers stay quiet.
//!
//! Constituents come in two shapes:
//!
//! - keyed: `ComposedState::Keyed`, one field per name
//! - ordered: `ComposedState::Ordered`, one element per position
//!
//! A composed store is a plain [`Store`], so composed stores compose too.

use crate::{
    action::Action,
    error::StoreError,
    selectors::Selectors,
    snapshot::{AnySnapshot, Snapshot},
    store::{StateSource, Store, reducer_fn},
};
use concord_core::{DispatchToken, Dispatcher};
use indexmap::IndexMap;
use std::rc::Rc;
use tracing::debug;

type Source<D> = Rc<dyn StateSource<D>>;

/// The stores a composed store is built from.
pub enum Constituents<D: 'static> {
    /// Named constituents.
    Keyed(Vec<(String, Source<D>)>),
    /// Positional constituents.
    Ordered(Vec<Source<D>>),
}

impl<D: 'static> Constituents<D> {
    /// Start an empty keyed set.
    pub fn keyed() -> KeyedConstituents<D> {
        KeyedConstituents {
            entries: Vec::new(),
        }
    }

    /// Start an empty ordered set.
    pub fn ordered() -> OrderedConstituents<D> {
        OrderedConstituents {
            entries: Vec::new(),
        }
    }

    /// Number of constituents.
    pub fn len(&self) -> usize {
        match self {
            Constituents::Keyed(entries) => entries.len(),
            Constituents::Ordered(entries) => entries.len(),
        }
    }

    /// Whether there are no constituents.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sources(&self) -> Box<dyn Iterator<Item = &Source<D>> + '_> {
        match self {
            Constituents::Keyed(entries) => Box::new(entries.iter().map(|(_, source)| source)),
            Constituents::Ordered(entries) => Box::new(entries.iter()),
        }
    }

    fn read(&self) -> ComposedState {
        match self {
            Constituents::Keyed(entries) => ComposedState::Keyed(
                entries
                    .iter()
                    .map(|(key, source)| (key.clone(), source.erased_state()))
                    .collect(),
            ),
            Constituents::Ordered(entries) => ComposedState::Ordered(
                entries.iter().map(|source| source.erased_state()).collect(),
            ),
        }
    }
}

/// Builder for named constituents, from [`Constituents::keyed`].
pub struct KeyedConstituents<D: 'static> {
    entries: Vec<(String, Source<D>)>,
}

impl<D: 'static> KeyedConstituents<D> {
    /// Add a constituent under `key`.
    pub fn with<S: 'static>(mut self, key: impl Into<String>, store: &Store<S, D>) -> Self {
        self.entries.push((key.into(), Rc::new(store.clone())));
        self
    }
}

impl<D: 'static> From<KeyedConstituents<D>> for Constituents<D> {
    fn from(set: KeyedConstituents<D>) -> Self {
        Constituents::Keyed(set.entries)
    }
}

/// Builder for positional constituents, from [`Constituents::ordered`].
pub struct OrderedConstituents<D: 'static> {
    entries: Vec<Source<D>>,
}

impl<D: 'static> OrderedConstituents<D> {
    /// Append a constituent.
    pub fn push<S: 'static>(mut self, store: &Store<S, D>) -> Self {
        self.entries.push(Rc::new(store.clone()));
        self
    }
}

impl<D: 'static> From<OrderedConstituents<D>> for Constituents<D> {
    fn from(set: OrderedConstituents<D>) -> Self {
        Constituents::Ordered(set.entries)
    }
}

impl<S: 'static, D: 'static, const N: usize> From<[&Store<S, D>; N]> for Constituents<D> {
    fn from(stores: [&Store<S, D>; N]) -> Self {
        stores
            .into_iter()
            .fold(Constituents::ordered(), |set, store| set.push(store))
            .into()
    }
}

impl<S: 'static, D: 'static, const N: usize> From<[(&str, &Store<S, D>); N]> for Constituents<D> {
    fn from(stores: [(&str, &Store<S, D>); N]) -> Self {
        stores
            .into_iter()
            .fold(Constituents::keyed(), |set, (key, store)| set.with(key, store))
            .into()
    }
}

/// State of a composed store.
#[derive(Debug, Clone)]
pub enum ComposedState {
    /// One snapshot per constituent name, in declaration order.
    Keyed(IndexMap<String, AnySnapshot>),
    /// One snapshot per constituent position.
    Ordered(Vec<AnySnapshot>),
}

impl ComposedState {
    /// Typed snapshot of a named constituent.
    pub fn get<S: 'static>(&self, key: &str) -> Option<Snapshot<S>> {
        self.field(key)?.downcast()
    }

    /// Typed snapshot of a positional constituent.
    pub fn at<S: 'static>(&self, index: usize) -> Option<Snapshot<S>> {
        self.element(index)?.downcast()
    }

    /// Erased snapshot of a named constituent.
    pub fn field(&self, key: &str) -> Option<&AnySnapshot> {
        match self {
            ComposedState::Keyed(fields) => fields.get(key),
            ComposedState::Ordered(_) => None,
        }
    }

    /// Erased snapshot of a positional constituent.
    ///
    /// Keyed states are indexed in declaration order.
    pub fn element(&self, index: usize) -> Option<&AnySnapshot> {
        match self {
            ComposedState::Keyed(fields) => fields.get_index(index).map(|(_, value)| value),
            ComposedState::Ordered(elements) => elements.get(index),
        }
    }

    /// Number of constituents.
    pub fn len(&self) -> usize {
        match self {
            ComposedState::Keyed(fields) => fields.len(),
            ComposedState::Ordered(elements) => elements.len(),
        }
    }

    /// Whether there are no constituents.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every field (element) is the same snapshot as in `other`.
    pub fn same_members(&self, other: &ComposedState) -> bool {
        match (self, other) {
            (ComposedState::Keyed(a), ComposedState::Keyed(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|((ka, va), (kb, vb))| {
                        ka == kb && AnySnapshot::ptr_eq(va, vb)
                    })
            }
            (ComposedState::Ordered(a), ComposedState::Ordered(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(va, vb)| AnySnapshot::ptr_eq(va, vb))
            }
            _ => false,
        }
    }
}

/// Compose a store from `constituents`.
pub fn compose_store<D: 'static>(
    dispatcher: &Rc<Dispatcher<Action<D>>>,
    constituents: impl Into<Constituents<D>>,
) -> Result<Store<ComposedState, D>, StoreError> {
    compose_store_with_selectors(dispatcher, constituents, Selectors::new())
}

/// Compose a store from `constituents`, exposing `selectors`.
///
/// Every constituent must be registered with `dispatcher`, and keyed
/// constituents must have distinct names.
pub fn compose_store_with_selectors<D: 'static>(
    dispatcher: &Rc<Dispatcher<Action<D>>>,
    constituents: impl Into<Constituents<D>>,
    selectors: Selectors<ComposedState>,
) -> Result<Store<ComposedState, D>, StoreError> {
    let constituents = constituents.into();
    validate(dispatcher, &constituents)?;

    let tokens: Vec<DispatchToken> = constituents
        .sources()
        .map(|source| source.dispatch_token())
        .collect();
    let initial = Snapshot::new(constituents.read());
    debug!(constituents = tokens.len(), "composing store");

    let reducer = reducer_fn(move |previous: &Snapshot<ComposedState>, _, wait| {
        wait.wait_for(&tokens)?;
        let next = constituents.read();
        if previous.same_members(&next) {
            Ok(previous.clone())
        } else {
            Ok(Snapshot::new(next))
        }
    });

    Ok(Store::from_parts(
        dispatcher,
        initial,
        reducer,
        selectors,
        Vec::new(),
    ))
}

fn validate<D: 'static>(
    dispatcher: &Rc<Dispatcher<Action<D>>>,
    constituents: &Constituents<D>,
) -> Result<(), StoreError> {
    for source in constituents.sources() {
        if !Rc::ptr_eq(source.dispatcher(), dispatcher) {
            return Err(StoreError::InvalidArgument(format!(
                "constituent `{}` is registered with a different dispatcher",
                source.dispatch_token()
            )));
        }
    }
    if let Constituents::Keyed(entries) = constituents {
        let mut seen = std::collections::HashSet::new();
        for (key, _) in entries {
            if !seen.insert(key.as_str()) {
                return Err(StoreError::InvalidArgument(format!(
                    "duplicate constituent name `{key}`"
                )));
            }
        }
    }
    Ok(())
}
