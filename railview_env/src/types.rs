//! Common types for the RailView environment abstraction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier minted for a logged-in user.
///
/// Display/debug only; it carries no authority of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Creates a new random UserId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a UserId from a UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // First 9 chars, the same length the login form used to show
        write!(f, "{}", &self.0.simple().to_string()[..9])
    }
}
