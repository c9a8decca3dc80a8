//! JSON exporter for recorded runs.
//!
//! Frames hold what the dashboard would have rendered at each sampled tick.

use railview_core::{DashboardSnapshot, NotificationKind, StatusSummary, Train};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimFrame {
    /// Tick number
    pub tick: u64,

    /// Virtual time in seconds
    pub time_sec: f64,

    pub trains: Vec<TrainFrame>,

    pub summary: StatusSummary,

    pub unread: usize,

    /// Notifications recorded since the previous frame
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub events: Vec<SimEvent>,
}

impl SimFrame {
    pub fn from_snapshot(
        snapshot: &DashboardSnapshot,
        time_sec: f64,
        events: Vec<SimEvent>,
    ) -> Self {
        Self {
            tick: snapshot.tick,
            time_sec,
            trains: snapshot.trains.iter().map(TrainFrame::from).collect(),
            summary: snapshot.summary,
            unread: snapshot.unread,
            events,
        }
    }
}

/// Per-train state in a frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainFrame {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    pub status: String,
    pub signal: String,
}

impl From<&Train> for TrainFrame {
    fn from(t: &Train) -> Self {
        Self {
            id: t.id.to_string(),
            x: t.position.x,
            y: t.position.y,
            speed: t.speed,
            status: t.status.to_string(),
            signal: t.signal_state.to_string(),
        }
    }
}

/// Simulation event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimEvent {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl SimEvent {
    pub fn new(message: impl Into<String>, kind: NotificationKind) -> Self {
        let level = match kind {
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
        };
        Self {
            message: message.into(),
            level: Some(level.to_string()),
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Duration in seconds
    pub duration_sec: f64,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub violations: Vec<String>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_sec: 0.0,
            frames: Vec::new(),
            passed: false,
            violations: Vec::new(),
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, violations: Vec<String>) {
        self.passed = passed;
        self.violations = violations;
    }

    /// Serializes to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railview_core::seed;

    #[test]
    fn test_train_frame_uses_wire_names() {
        let trains = seed::reference_trains();
        let frame = TrainFrame::from(&trains[1]);
        assert_eq!(frame.status, "delayed");
        assert_eq!(frame.signal, "hold");
    }

    #[test]
    fn test_export_skips_empty_lists() {
        let mut export = SimExport::new("long_haul", 42);
        export.finalize(true, Vec::new());
        let json = export.to_json().unwrap();

        assert!(!json.contains("violations"));
        let back: SimExport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, export);
    }
}
