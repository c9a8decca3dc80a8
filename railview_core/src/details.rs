//! Read models for the detail panel and the schematic map.

use crate::model::{Position, Section, Train, TrainStatus};
use serde::Serialize;

/// Speed below which the detail panel never recommends.
const MIN_RECOMMENDED_SPEED: f64 = 45.0;

/// Screen coordinates of a train on the schematic map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

impl From<Position> for MapPoint {
    fn from(p: Position) -> Self {
        Self {
            x: 50.0 + p.x * 7.0,
            y: 180.0 + p.y * 0.4,
        }
    }
}

/// Everything the detail panel shows for one train.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainDetails {
    pub train: Train,
    /// Section whose name matches `train.current_section`, if any
    pub section: Option<Section>,
    pub recommended_speed: f64,
    /// Percent
    pub route_efficiency: u8,
    pub delay_label: String,
    pub map_point: MapPoint,
}

impl TrainDetails {
    pub fn new(train: Train, section: Option<Section>) -> Self {
        let route_efficiency = match train.status {
            TrainStatus::OnTime => 90,
            TrainStatus::Delayed => 60,
            TrainStatus::Diverted | TrainStatus::Held => 75,
        };
        let delay_label = if train.delay > 0 {
            format!("+{} min", train.delay)
        } else {
            "On Time".to_string()
        };

        Self {
            recommended_speed: (train.speed - 10.0).max(MIN_RECOMMENDED_SPEED),
            route_efficiency,
            delay_label,
            map_point: train.position.into(),
            section,
            train,
        }
    }
}
