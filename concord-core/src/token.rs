//! Dispatch tokens.

use std::fmt;

/// Opaque handle identifying a registered callback.
///
/// Tokens are minted by [`Dispatcher::register`] from a counter that only
/// moves forward, so a dispatcher never hands out the same token twice and
/// `Ord` follows issuance order.
///
/// [`Dispatcher::register`]: crate::Dispatcher::register
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DispatchToken(u64);

impl DispatchToken {
    /// Build a token from its raw counter value.
    ///
    /// Only useful in tests and diagnostics; a token built this way is not
    /// registered anywhere.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw counter value.
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DispatchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID_{}", self.0)
    }
}
