//! Domain model: users, trains, sections and notifications.
//!
//! Pure data shapes. Behaviour lives in the session gate, the simulation
//! engine and the notification feed.

use railview_env::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

// =============================================================================
// IDENTIFIERS
// =============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Train identifier, e.g. `T001`.
    TrainId
);
string_id!(
    /// Section identifier, e.g. `SEC-A`.
    SectionId
);
string_id!(
    /// Notification identifier, e.g. `N004`.
    NotificationId
);

// =============================================================================
// ENUMERATIONS
// =============================================================================

/// Role picked at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Read-only viewer
    Government,
    /// Section controller, may change signals
    Controller,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Government => "government",
            Role::Controller => "controller",
        }
    }

    /// Label shown in the dashboard header.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Government => "Government Official",
            Role::Controller => "Section Controller",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "government" | "gov" => Ok(Role::Government),
            "controller" | "ctl" => Ok(Role::Controller),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Operational label shown to viewers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrainStatus {
    OnTime,
    Delayed,
    Diverted,
    Held,
}

impl TrainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainStatus::OnTime => "on-time",
            TrainStatus::Delayed => "delayed",
            TrainStatus::Diverted => "diverted",
            TrainStatus::Held => "held",
        }
    }
}

impl fmt::Display for TrainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator-facing control value driving a train's simulated behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalState {
    Allow,
    Hold,
    Divert,
}

impl SignalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalState::Allow => "allow",
            SignalState::Hold => "hold",
            SignalState::Divert => "divert",
        }
    }

    /// Status a train takes on when an operator sets this signal.
    ///
    /// `Allow` maps to `OnTime` even for a train that was `Delayed`.
    pub fn implied_status(&self) -> TrainStatus {
        match self {
            SignalState::Hold => TrainStatus::Held,
            SignalState::Divert => TrainStatus::Diverted,
            SignalState::Allow => TrainStatus::OnTime,
        }
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SignalState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "allow" => Ok(SignalState::Allow),
            "hold" => Ok(SignalState::Hold),
            "divert" => Ok(SignalState::Divert),
            _ => Err(format!("Unknown signal: {}", s)),
        }
    }
}

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Warning,
    Error,
}

// =============================================================================
// ENTITIES
// =============================================================================

/// The logged-in user. Owned by the session gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub role: Role,
}

/// Position on the schematic map.
///
/// `x` is cyclic in `[0, 100)`; `y` never changes after seeding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Train {
    pub id: TrainId,
    pub name: String,
    /// Free-text label, matched informally against `Section::name`
    pub current_section: String,
    pub next_section: String,
    pub status: TrainStatus,
    /// km/h
    pub speed: f64,
    /// Wall-clock `HH:MM`
    pub expected_arrival: String,
    /// Minutes
    pub delay: u32,
    pub signal_state: SignalState,
    pub position: Position,
}

/// Rectangle a section occupies on the schematic map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A named track segment with an assigned controller. Static reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    pub controller: String,
    pub trains: Vec<TrainId>,
    pub coordinates: SectionBounds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub timestamp: SystemTime,
    pub read: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_implied_status() {
        assert_eq!(SignalState::Hold.implied_status(), TrainStatus::Held);
        assert_eq!(SignalState::Divert.implied_status(), TrainStatus::Diverted);
        assert_eq!(SignalState::Allow.implied_status(), TrainStatus::OnTime);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&TrainStatus::OnTime).unwrap(), "\"on-time\"");
        assert_eq!(serde_json::to_string(&SignalState::Divert).unwrap(), "\"divert\"");
        assert_eq!(serde_json::to_string(&Role::Controller).unwrap(), "\"controller\"");
        assert_eq!(serde_json::to_string(&NotificationKind::Warning).unwrap(), "\"warning\"");
    }

    #[test]
    fn test_parse_role_and_signal() {
        assert_eq!(" Controller ".parse::<Role>(), Ok(Role::Controller));
        assert!("admin".parse::<Role>().is_err());
        assert_eq!("HOLD".parse::<SignalState>(), Ok(SignalState::Hold));
        assert!("stop".parse::<SignalState>().is_err());
    }

    #[test]
    fn test_role_display_name() {
        assert_eq!(Role::Government.display_name(), "Government Official");
        assert_eq!(Role::Controller.display_name(), "Section Controller");
    }
}
