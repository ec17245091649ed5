//! Actions broadcast by stores.

/// The payload stores exchange through the shared dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action<D> {
    /// Action type; config stores route on it.
    pub action_type: String,
    /// Action data.
    pub data: D,
}

impl<D> Action<D> {
    /// Create an action.
    pub fn new(action_type: impl Into<String>, data: D) -> Self {
        Self {
            action_type: action_type.into(),
            data,
        }
    }

    /// The action type.
    pub fn action_type(&self) -> &str {
        &self.action_type
    }

    /// Whether this action has the given type.
    pub fn is(&self, action_type: &str) -> bool {
        self.action_type == action_type
    }
}

impl<D: Default> Action<D> {
    /// Create an action carrying default data.
    pub fn bare(action_type: impl Into<String>) -> Self {
        Self::new(action_type, D::default())
    }
}

/// Anything that can be turned into an [`Action`] by [`dispatch`].
///
/// Covers the two call shapes: a fully formed action, or a type plus data.
///
/// [`dispatch`]: crate::dispatch
pub trait IntoAction<D> {
    /// Perform the conversion.
    fn into_action(self) -> Action<D>;
}

impl<D> IntoAction<D> for Action<D> {
    fn into_action(self) -> Action<D> {
        self
    }
}

impl<D> IntoAction<D> for (&str, D) {
    fn into_action(self) -> Action<D> {
        Action::new(self.0, self.1)
    }
}

impl<D> IntoAction<D> for (String, D) {
    fn into_action(self) -> Action<D> {
        Action::new(self.0, self.1)
    }
}

impl<D: Default> IntoAction<D> for &str {
    fn into_action(self) -> Action<D> {
        Action::bare(self)
    }
}
