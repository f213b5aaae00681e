//! Account status lifecycle.
//!
//! Accounts move between a small closed set of states. Only the
//! administrative lifecycle operations may change an account's status,
//! and `Closed` is terminal.

pub mod status;

pub use status::{AccountStatus, LifecycleError};
