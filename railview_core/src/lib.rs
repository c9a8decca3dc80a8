//! RailView Core - state model behind the railway traffic dashboard
//!
//! Four collaborators, all in-memory and owned by one [`Dashboard`]:
//! 1. **Session gate**: who is logged in and whether they may change signals
//! 2. **Simulation engine**: the train set, advanced on a fixed tick
//! 3. **Notification feed**: newest-first log of signal changes and alerts
//! 4. **Reference data**: the trains, sections and notifications loaded at startup
//!
//! Timer ticks and user commands are serialized through a single mutex, and
//! every random draw comes from a stream handed out by the
//! [`railview_env::RailViewContext`], so a seeded context replays exactly.

pub mod config;
pub mod dashboard;
pub mod details;
pub mod error;
pub mod model;
pub mod notifications;
pub mod seed;
pub mod session;
pub mod simulation;

// Re-export key types for convenience
pub use config::DashboardConfig;
pub use dashboard::{Dashboard, DashboardSnapshot, Ticker};
pub use details::{MapPoint, TrainDetails};
pub use error::DashboardError;
pub use model::{
    Notification, NotificationId, NotificationKind, Position, Role, Section, SectionId,
    SignalState, Train, TrainId, TrainStatus, User,
};
pub use notifications::NotificationFeed;
pub use session::{Action, Session};
pub use simulation::{SignalChange, SimulationEngine, StatusSummary};
