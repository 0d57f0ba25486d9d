//! Core types shared by the container, the graph analyzer and the CLI.
//!
//! Right now this is the error layer:
//! - [`WeaveError`] for failures code can match on
//! - [`ErrorContext`] for failures shown to a person, with a suggestion attached
//! - [`user_friendly_error`] to turn any `anyhow::Error` into an `ErrorContext`

pub mod error;

pub use error::{ErrorContext, WeaveError, user_friendly_error};
