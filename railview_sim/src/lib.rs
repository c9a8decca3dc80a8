//! RailView Deterministic Simulation Harness
//!
//! Runs the dashboard on a virtual clock with every random draw derived from
//! one 64-bit seed, so any failing run replays from its seed number.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │               ScenarioRunner                  │
//! │  ┌─────────────┐   ticks    ┌──────────────┐  │
//! │  │ SimContext  │──────────►│  Dashboard   │  │
//! │  │ (clock+RNG) │           │ (core state) │  │
//! │  └─────────────┘           └──────┬───────┘  │
//! │                                   │ trains,  │
//! │                           ┌───────▼──────┐   │
//! │                           │    Oracle    │   │
//! │                           │ (invariants) │   │
//! │                           └──────────────┘   │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use railview_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42).run(ScenarioId::ControllerShift);
//! assert!(result.passed);
//! ```

mod context;
mod oracle;
mod runner;
mod exporter;
pub mod scenarios;

pub use context::SimContext;
pub use oracle::{Oracle, Violation};
pub use runner::{ScenarioRunner, ScenarioResult, ScenarioMetrics};
pub use exporter::{SimExport, SimFrame, TrainFrame, SimEvent};
