//! Promise-style dispatch entry point.
//!
//! [`dispatch`] never panics and never returns an error directly: success and
//! failure both arrive through the returned ready future, so callers can
//! `.await` it alongside other futures or unwrap it on the spot with
//! [`Ready::into_inner`].

use crate::action::{Action, IntoAction};
use concord_core::{DispatchError, Dispatcher};
use futures::future::{Ready, ready};
use std::{fmt, rc::Rc};
use tracing::debug;

/// Outcome of [`dispatch`]: resolves to the dispatched action or the error.
pub type DispatchResult<D> = Ready<Result<Action<D>, DispatchError>>;

/// Broadcast an action through `dispatcher`.
///
/// Accepts a full [`Action`] or a `(type, data)` pair. An empty action type
/// is rejected before the dispatch begins.
pub fn dispatch<D: Clone + 'static>(
    dispatcher: &Dispatcher<Action<D>>,
    action: impl IntoAction<D>,
) -> DispatchResult<D> {
    ready(try_dispatch(dispatcher, action.into_action()))
}

fn try_dispatch<D: Clone + 'static>(
    dispatcher: &Dispatcher<Action<D>>,
    action: Action<D>,
) -> Result<Action<D>, DispatchError> {
    if action.action_type.is_empty() {
        return Err(DispatchError::InvalidAction(
            "action type must not be empty".to_owned(),
        ));
    }
    debug!(action_type = %action.action_type, "dispatching action");
    dispatcher.dispatch(action.clone())?;
    Ok(action)
}

/// Dispatches one declared action type of a config store.
pub struct ActionCreator<D: 'static> {
    dispatcher: Rc<Dispatcher<Action<D>>>,
    action_type: String,
}

impl<D: 'static> ActionCreator<D> {
    pub(crate) fn new(dispatcher: Rc<Dispatcher<Action<D>>>, action_type: &str) -> Self {
        Self {
            dispatcher,
            action_type: action_type.to_owned(),
        }
    }

    /// The action type this creator dispatches.
    pub fn action_type(&self) -> &str {
        &self.action_type
    }
}

impl<D: Clone + 'static> ActionCreator<D> {
    /// Broadcast `{ type, data }`.
    pub fn call(&self, data: D) -> DispatchResult<D> {
        dispatch(&self.dispatcher, Action::new(self.action_type.clone(), data))
    }
}

impl<D: 'static> Clone for ActionCreator<D> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Rc::clone(&self.dispatcher),
            action_type: self.action_type.clone(),
        }
    }
}

impl<D: 'static> fmt::Debug for ActionCreator<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionCreator")
            .field("action_type", &self.action_type)
            .finish()
    }
}
