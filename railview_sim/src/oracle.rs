//! Invariant oracle for simulation runs.
//!
//! The Oracle watches every tick and every command outcome and records any
//! state the dashboard should never be able to reach.

use railview_core::simulation::{ALLOW_SPEED_FLOOR, DIVERT_SPEED_FLOOR, TRACK_LENGTH};
use railview_core::{Notification, SignalState, StatusSummary, Train};
use std::collections::HashMap;

/// A single broken invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub tick: u64,
    pub message: String,
}

/// Records invariant violations across a run.
#[derive(Debug, Default)]
pub struct Oracle {
    violations: Vec<Violation>,
    checks: u64,
    /// Seeded `y` of every train; it must never change
    initial_y: HashMap<String, f64>,
}

impl Oracle {
    /// Creates an oracle primed with the starting train set.
    pub fn new(trains: &[Train]) -> Self {
        Self {
            violations: Vec::new(),
            checks: 0,
            initial_y: trains
                .iter()
                .map(|t| (t.id.to_string(), t.position.y))
                .collect(),
        }
    }

    fn violate(&mut self, tick: u64, message: String) {
        self.violations.push(Violation { tick, message });
    }

    /// Checks the per-tick physics invariants.
    pub fn observe_tick(&mut self, tick: u64, trains: &[Train]) {
        for t in trains {
            self.checks += 1;

            if !(t.speed >= 0.0) {
                self.violate(tick, format!("{} speed {} is negative", t.id, t.speed));
            }
            if !(t.position.x >= 0.0 && t.position.x < TRACK_LENGTH) {
                self.violate(tick, format!("{} x={} left the track", t.id, t.position.x));
            }
            match t.signal_state {
                SignalState::Allow if t.speed < ALLOW_SPEED_FLOOR => {
                    self.violate(tick, format!("{} allowed at {} km/h", t.id, t.speed));
                }
                SignalState::Hold if t.speed != 0.0 => {
                    self.violate(tick, format!("{} held at {} km/h", t.id, t.speed));
                }
                SignalState::Divert if t.speed < DIVERT_SPEED_FLOOR => {
                    self.violate(tick, format!("{} diverted at {} km/h", t.id, t.speed));
                }
                _ => {}
            }
            if let Some(&y) = self.initial_y.get(t.id.as_str()) {
                if t.position.y != y {
                    self.violate(tick, format!("{} y moved {} -> {}", t.id, y, t.position.y));
                }
            }
        }
    }

    /// Checks that summary counts partition the train set.
    pub fn observe_summary(&mut self, tick: u64, summary: &StatusSummary, trains: &[Train]) {
        self.checks += 1;
        let counted = summary.on_time + summary.delayed + summary.diverted;
        if counted != trains.len() || summary.total != trains.len() {
            self.violate(
                tick,
                format!("summary {:?} does not partition {} trains", summary, trains.len()),
            );
        }
    }

    /// Checks the feed is newest first.
    pub fn observe_feed(&mut self, tick: u64, feed: &[Notification]) {
        self.checks += 1;
        if feed.windows(2).any(|w| w[0].timestamp < w[1].timestamp) {
            self.violate(tick, "feed is not newest first".to_string());
        }
    }

    /// Records a scenario-level expectation.
    pub fn expect(&mut self, tick: u64, holds: bool, message: impl Into<String>) {
        self.checks += 1;
        if !holds {
            self.violate(tick, message.into());
        }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn checks(&self) -> u64 {
        self.checks
    }

    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railview_core::seed;

    #[test]
    fn test_reference_data_is_clean() {
        let trains = seed::reference_trains();
        let mut oracle = Oracle::new(&trains);
        oracle.observe_tick(0, &trains);

        assert!(oracle.passed());
        assert_eq!(oracle.checks(), 5);
    }

    #[test]
    fn test_detects_held_train_moving() {
        let mut trains = seed::reference_trains();
        let mut oracle = Oracle::new(&trains);
        trains[1].speed = 12.0;

        oracle.observe_tick(3, &trains);

        assert_eq!(oracle.violations().len(), 1);
        assert_eq!(oracle.violations()[0].tick, 3);
        assert!(oracle.violations()[0].message.contains("T002"));
    }

    #[test]
    fn test_detects_lateral_motion() {
        let mut trains = seed::reference_trains();
        let mut oracle = Oracle::new(&trains);
        trains[0].position.y += 1.0;

        oracle.observe_tick(1, &trains);
        assert!(!oracle.passed());
    }

    #[test]
    fn test_detects_bad_summary() {
        let trains = seed::reference_trains();
        let mut oracle = Oracle::new(&trains);
        let summary = StatusSummary {
            total: 5,
            on_time: 5,
            delayed: 1,
            diverted: 0,
        };

        oracle.observe_summary(0, &summary, &trains);
        assert!(!oracle.passed());
    }
}
