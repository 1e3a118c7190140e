//! Shared plumbing: the relay error type and logging setup.

pub mod error;
pub mod logging;

pub use error::{RelayError, RelayResult};
