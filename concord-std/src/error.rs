//! Errors raised by the store layer.

use concord_core::DispatchError;
use thiserror::Error;

/// Errors that can occur while building or querying stores.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A store definition cannot be turned into a store.
    #[error("invalid store definition: {0}")]
    InvalidDefinition(String),

    /// An argument to a store constructor was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No selector is registered under this name.
    #[error("no selector named `{0}`")]
    UnknownSelector(String),

    /// The selector exists but has different argument or result types.
    #[error("selector signature mismatch: {0}")]
    SelectorSignature(String),

    /// A dispatcher operation failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
