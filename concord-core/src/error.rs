//! Error types for the dispatcher.
//!
//! Every variant except [`DispatchError::Callback`] is a contract violation
//! by the caller: nothing here is transient, so nothing is retried.

use crate::token::DispatchToken;
use thiserror::Error;

/// A boxed error type for errors raised by user callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while registering, ordering or dispatching.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The token is not (or no longer) registered with this dispatcher.
    #[error("`{0}` does not map to a registered callback")]
    UnknownToken(DispatchToken),

    /// `wait_for` was called while no dispatch was in flight.
    #[error("wait_for must be invoked while dispatching")]
    NotDispatching,

    /// A dispatch was started while another one was still running.
    #[error("cannot dispatch in the middle of a dispatch")]
    AlreadyDispatching,

    /// A `wait_for` constraint looped back to a callback that is still running.
    #[error("circular dependency detected while waiting for `{0}`")]
    CircularDependency(DispatchToken),

    /// The payload was rejected before the dispatch began.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// A callback failed with its own error.
    #[error("callback error")]
    Callback(#[source] BoxError),
}

impl DispatchError {
    /// Wrap an arbitrary error raised inside a callback or reducer.
    pub fn callback(err: impl Into<BoxError>) -> Self {
        DispatchError::Callback(err.into())
    }

    /// Returns `true` for the cycle-detection failure.
    pub fn is_circular(&self) -> bool {
        matches!(self, DispatchError::CircularDependency(_))
    }
}

impl From<BoxError> for DispatchError {
    fn from(err: BoxError) -> Self {
        DispatchError::Callback(err)
    }
}
