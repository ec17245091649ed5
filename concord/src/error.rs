//! Top-level error type.

use concord_core::{BoxError, DispatchError};
use concord_std::StoreError;
use thiserror::Error;

/// Any error produced by Concord, for applications that want one type.
#[derive(Error, Debug)]
pub enum ConcordError {
    /// A dispatcher operation failed.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// A store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

impl From<BoxError> for ConcordError {
    fn from(err: BoxError) -> Self {
        ConcordError::Custom(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_each_layer() {
        let dispatch: ConcordError = DispatchError::NotDispatching.into();
        let store: ConcordError = StoreError::UnknownSelector("total".into()).into();

        assert_eq!(
            dispatch.to_string(),
            "dispatch error: wait_for must be invoked while dispatching"
        );
        assert_eq!(store.to_string(), "store error: no selector named `total`");
    }
}
