//! Train simulation engine.
//!
//! Owns the train set. Each tick nudges positions and speeds according to
//! the train's signal state:
//! - **allow**: moves forward by up to 2 units, speed random-walks above 60
//! - **hold**: stands still at speed 0
//! - **divert**: stands still while speed decays by 20% down to 30
//!
//! The motion is cosmetic; there is no block signalling or interlocking.

use crate::error::DashboardError;
use crate::model::{NotificationKind, SignalState, Train, TrainId, TrainStatus};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Length of the cyclic track coordinate.
pub const TRACK_LENGTH: f64 = 100.0;
/// Largest per-tick advance of a moving train.
pub const MAX_STEP: f64 = 2.0;
/// Speed floor for trains on an allow signal.
pub const ALLOW_SPEED_FLOOR: f64 = 60.0;
/// Full width of the per-tick speed jitter on an allow signal.
pub const ALLOW_SPEED_JITTER: f64 = 10.0;
/// Speed floor for diverted trains.
pub const DIVERT_SPEED_FLOOR: f64 = 30.0;
/// Per-tick speed factor for diverted trains.
pub const DIVERT_DECAY: f64 = 0.8;

/// Counts shown on the dashboard's summary cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub total: usize,
    pub on_time: usize,
    /// Delayed and held trains
    pub delayed: usize,
    pub diverted: usize,
}

/// Outcome of an operator signal command.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalChange {
    pub train_id: TrainId,
    pub previous_signal: SignalState,
    pub previous_status: TrainStatus,
    pub signal: SignalState,
}

impl SignalChange {
    /// Feed message describing the change.
    pub fn message(&self) -> String {
        format!(
            "Signal changed to {} for train {}",
            self.signal.as_str().to_uppercase(),
            self.train_id
        )
    }

    /// Holds are flagged as warnings, everything else is informational.
    pub fn kind(&self) -> NotificationKind {
        match self.signal {
            SignalState::Hold => NotificationKind::Warning,
            SignalState::Allow | SignalState::Divert => NotificationKind::Info,
        }
    }
}

impl Train {
    /// Returns this train one tick later.
    ///
    /// Draws from `rng` only for the terms that are random: the advance of a
    /// moving train and the speed jitter of an allowed one.
    pub fn advanced<R: Rng + ?Sized>(&self, rng: &mut R) -> Train {
        let mut next = self.clone();

        if self.signal_state == SignalState::Allow && self.status == TrainStatus::OnTime {
            next.position.x = wrap_track(self.position.x + rng.gen::<f64>() * MAX_STEP);
        }

        next.speed = match self.signal_state {
            SignalState::Hold => 0.0,
            SignalState::Allow => {
                let jitter = (rng.gen::<f64>() - 0.5) * ALLOW_SPEED_JITTER;
                (self.speed + jitter).max(ALLOW_SPEED_FLOOR)
            }
            SignalState::Divert => (self.speed * DIVERT_DECAY).max(DIVERT_SPEED_FLOOR),
        };

        next
    }
}

/// Maps any coordinate onto `[0, TRACK_LENGTH)`.
fn wrap_track(x: f64) -> f64 {
    let wrapped = x.rem_euclid(TRACK_LENGTH);
    // rem_euclid can round up to the modulus for tiny negative inputs
    if wrapped >= TRACK_LENGTH {
        0.0
    } else {
        wrapped
    }
}

/// The single writer of the train set.
#[derive(Debug, Clone, Default)]
pub struct SimulationEngine {
    trains: Vec<Train>,
    ticks: u64,
}

impl SimulationEngine {
    pub fn new(trains: Vec<Train>) -> Self {
        Self { trains, ticks: 0 }
    }

    /// Advances every train by one tick.
    ///
    /// The next generation is built aside and swapped in whole, so the set is
    /// never observed half-updated.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let next: Vec<Train> = self.trains.iter().map(|t| t.advanced(rng)).collect();
        self.trains = next;
        self.ticks += 1;

        debug!("tick {} | trains={}", self.ticks, self.trains.len());
    }

    /// Applies an operator signal command.
    ///
    /// Status is derived from the signal; `delay` is left as it was, so an
    /// allowed train can read on-time with a nonzero delay.
    pub fn set_signal(
        &mut self,
        train_id: &TrainId,
        signal: SignalState,
    ) -> Result<SignalChange, DashboardError> {
        let train = self
            .trains
            .iter_mut()
            .find(|t| &t.id == train_id)
            .ok_or_else(|| DashboardError::TrainNotFound(train_id.clone()))?;

        let change = SignalChange {
            train_id: train.id.clone(),
            previous_signal: train.signal_state,
            previous_status: train.status,
            signal,
        };
        train.signal_state = signal;
        train.status = signal.implied_status();

        Ok(change)
    }

    pub fn status_summary(&self) -> StatusSummary {
        self.trains.iter().fold(
            StatusSummary {
                total: self.trains.len(),
                ..Default::default()
            },
            |mut summary, train| {
                match train.status {
                    TrainStatus::OnTime => summary.on_time += 1,
                    TrainStatus::Delayed | TrainStatus::Held => summary.delayed += 1,
                    TrainStatus::Diverted => summary.diverted += 1,
                }
                summary
            },
        )
    }

    pub fn trains(&self) -> &[Train] {
        &self.trains
    }

    pub fn train(&self, id: &TrainId) -> Option<&Train> {
        self.trains.iter().find(|t| &t.id == id)
    }

    pub fn contains(&self, id: &TrainId) -> bool {
        self.train(id).is_some()
    }

    /// Number of ticks applied so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
