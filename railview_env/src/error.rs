//! Error types for the RailView environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// No async runtime is available to schedule work on
    #[error("No runtime: {0}")]
    NoRuntime(String),
}

impl EnvError {
    /// Creates a missing-runtime error.
    pub fn no_runtime(msg: impl Into<String>) -> Self {
        Self::NoRuntime(msg.into())
    }
}
