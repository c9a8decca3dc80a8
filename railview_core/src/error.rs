//! Error type shared by every dashboard operation.

use crate::model::TrainId;
use crate::session::Action;
use railview_env::EnvError;
use thiserror::Error;

/// Errors returned to the presentation layer.
///
/// None of these leave state modified; the caller drops the command.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Malformed input, e.g. an empty login name or no role picked
    #[error("Validation error: {0}")]
    Validation(String),

    /// The current session may not perform this action
    #[error("Unauthorized: {action} requires a controller session")]
    Unauthorized { action: Action },

    /// Signal command against an unknown train
    #[error("Train not found: {0}")]
    TrainNotFound(TrainId),

    /// The environment could not schedule work
    #[error(transparent)]
    Env(#[from] EnvError),
}

impl DashboardError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
