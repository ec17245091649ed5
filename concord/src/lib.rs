//! # concord - Dependency-Ordered State Dispatch
//!
//! `concord` broadcasts actions synchronously to a set of stores. Order is
//! undefined unless a store asks, while the action is being handled, for
//! other stores to go first. Derived stores built with [`compose_store`] do
//! exactly that for every store they read from.
//!
//! ## Quick Start
//!
//! ```rust
//! use concord::prelude::*;
//! use std::rc::Rc;
//!
//! let dispatcher = Rc::new(Dispatcher::new());
//!
//! let clicks = Store::new(
//!     &dispatcher,
//!     StoreConfig::<u32, ()>::new()
//!         .on("click", |state, _, _| Ok(Snapshot::new(**state + 1)))
//!         .into(),
//! )?;
//! let label = Store::new(
//!     &dispatcher,
//!     StoreConfig::<String, ()>::new()
//!         .on("rename", |_, _, _| Ok(Snapshot::new("renamed".to_owned())))
//!         .into(),
//! )?;
//! let page = compose_store(
//!     &dispatcher,
//!     Constituents::keyed().with("clicks", &clicks).with("label", &label),
//! )?;
//!
//! clicks.dispatch("click").into_inner()?;
//!
//! assert_eq!(*page.get_state().get::<u32>("clicks").unwrap(), 1);
//! # Ok::<(), ConcordError>(())
//! ```
//!
//! ## Identity Contract
//!
//! Stores notify subscribers only when their reducer returns a different
//! [`Snapshot`] allocation. Return `state.clone()` to say "unchanged".

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod error;

pub use error::ConcordError;

pub use concord_core::{
    BoxCallback, BoxError, DispatchError, DispatchToken, Dispatcher, DispatcherBuilder, WaitFor,
};

pub use concord_std::{
    Action, ActionCreator, AnySnapshot, ComposedState, Constituents, DispatchResult, HandlerFn,
    IntoAction, KeyedConstituents, OrderedConstituents, ReducerFn, Selectors, Snapshot,
    StateSource, Store, StoreConfig, StoreDefinition, StoreError, Subscription, compose_store,
    compose_store_with_selectors, create_store, dispatch,
};

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use concord_std::testing::*;
}

/// Prelude module - common imports for Concord.
///
/// # Usage
///
/// ```rust,ignore
/// use concord::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Actions
        Action,
        // Composition
        ComposedState,
        // Errors
        ConcordError,
        Constituents,
        DispatchError,
        // Dispatcher
        DispatchToken,
        Dispatcher,
        IntoAction,
        Selectors,
        // Stores
        Snapshot,
        Store,
        StoreConfig,
        StoreDefinition,
        StoreError,
        WaitFor,
        compose_store,
        create_store,
        dispatch,
    };
}
