//! # concord-std
//!
//! Stores built on the Concord dispatcher.
//!
//! This crate provides:
//! - **Actions**: [`Action`], [`IntoAction`], and the promise-style [`dispatch`]
//! - **Snapshots**: [`Snapshot`], the identity-compared state value
//! - **Stores**: [`Store`], [`create_store`], [`StoreDefinition`], [`StoreConfig`]
//! - **Selectors**: [`Selectors`], named queries bound to live state
//! - **Composition**: [`compose_store`], derived stores over other stores
//! - **Testing**: helpers in [`testing`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use concord_core;

mod action;
mod compose;
mod dispatch;
mod error;
mod selectors;
mod snapshot;
mod store;
pub mod testing;

pub use action::{Action, IntoAction};
pub use compose::{
    ComposedState, Constituents, KeyedConstituents, OrderedConstituents, compose_store,
    compose_store_with_selectors,
};
pub use dispatch::{ActionCreator, DispatchResult, dispatch};
pub use error::StoreError;
pub use selectors::Selectors;
pub use snapshot::{AnySnapshot, Snapshot};
pub use store::{
    HandlerFn, ReducerFn, StateSource, Store, StoreConfig, StoreDefinition, Subscription,
    create_store,
};
