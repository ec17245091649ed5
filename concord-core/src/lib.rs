//! # concord-core
//!
//! The dependency-ordered dispatcher at the heart of the Concord state
//! framework.
//!
//! This crate has minimal dependencies and is designed to be imported by code
//! that only needs broadcast-with-ordering, without the store layer from
//! `concord-std`.
//!
//! # Building Blocks
//!
//! - [`Dispatcher`] - holds registered callbacks and runs one synchronous
//!   dispatch at a time
//! - [`DispatchToken`] - opaque handle returned by registration, used for
//!   ordering and removal
//! - [`WaitFor`] - capability handed to a running callback so it can require
//!   other callbacks to complete first
//!
//! # Error Types
//!
//! - [`DispatchError`] - every way registration, ordering or dispatch can fail

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod dispatcher;
mod error;
mod token;

// Re-exports
pub use dispatcher::{BoxCallback, Dispatcher, DispatcherBuilder, WaitFor};
pub use error::{BoxError, DispatchError};
pub use token::DispatchToken;
