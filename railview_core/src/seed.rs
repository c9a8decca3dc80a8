//! Reference data loaded at startup: 5 trains, 4 sections, 3 notifications.

use crate::model::{
    Notification, NotificationId, NotificationKind, Position, Section, SectionBounds, SectionId,
    SignalState, Train, TrainId, TrainStatus,
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[allow(clippy::too_many_arguments)]
fn train(
    id: &str,
    name: &str,
    current: &str,
    next: &str,
    status: TrainStatus,
    speed: f64,
    eta: &str,
    delay: u32,
    signal: SignalState,
    (x, y): (f64, f64),
) -> Train {
    Train {
        id: TrainId::from(id),
        name: name.to_string(),
        current_section: current.to_string(),
        next_section: next.to_string(),
        status,
        speed,
        expected_arrival: eta.to_string(),
        delay,
        signal_state: signal,
        position: Position::new(x, y),
    }
}

pub fn reference_trains() -> Vec<Train> {
    use SignalState::*;
    use TrainStatus::*;

    vec![
        train(
            "T001",
            "Express Delhi-Mumbai",
            "Section A",
            "Section B",
            OnTime,
            85.0,
            "14:30",
            0,
            Allow,
            (10.0, 20.0),
        ),
        train(
            "T002",
            "Rajdhani Express",
            "Section B",
            "Section C",
            Delayed,
            0.0,
            "15:45",
            15,
            Hold,
            (30.0, 45.0),
        ),
        train(
            "T003",
            "Shatabdi Express",
            "Section C",
            "Section D",
            OnTime,
            95.0,
            "16:20",
            0,
            Allow,
            (60.0, 35.0),
        ),
        train(
            "T004",
            "Freight Express",
            "Section D",
            "Section A",
            Diverted,
            45.0,
            "17:15",
            5,
            Divert,
            (80.0, 60.0),
        ),
        train(
            "T005",
            "Local Passenger",
            "Section A",
            "Section B",
            OnTime,
            65.0,
            "18:00",
            0,
            Allow,
            (15.0, 75.0),
        ),
    ]
}

pub fn reference_sections() -> Vec<Section> {
    let section = |id: &str, name: &str, controller: &str, trains: &[&str], x: f64| Section {
        id: SectionId::from(id),
        name: name.to_string(),
        controller: controller.to_string(),
        trains: trains.iter().map(|t| TrainId::from(*t)).collect(),
        coordinates: SectionBounds {
            x,
            y: 0.0,
            width: 200.0,
            height: 100.0,
        },
    };

    vec![
        section("SEC-A", "Section A", "Controller North", &["T001", "T005"], 0.0),
        section("SEC-B", "Section B", "Controller East", &["T002"], 200.0),
        section("SEC-C", "Section C", "Controller South", &["T003"], 400.0),
        section("SEC-D", "Section D", "Controller West", &["T004"], 600.0),
    ]
}

/// Sample feed, newest first, timestamped relative to `now`.
pub fn reference_notifications(now: SystemTime) -> Vec<Notification> {
    let ago = |mins: u64| {
        now.checked_sub(Duration::from_secs(mins * 60))
            .unwrap_or(UNIX_EPOCH)
    };
    let notification = |id: &str, message: &str, kind, mins, read| Notification {
        id: NotificationId::from(id),
        message: message.to_string(),
        kind,
        timestamp: ago(mins),
        read,
    };

    vec![
        notification(
            "N001",
            "Train T002 has entered Section B and requires signal clearance",
            NotificationKind::Warning,
            5,
            false,
        ),
        notification(
            "N002",
            "Train T001 is running on schedule in Section A",
            NotificationKind::Info,
            10,
            true,
        ),
        notification(
            "N003",
            "Emergency signal activated for Train T004 in Section D",
            NotificationKind::Error,
            15,
            false,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_reference_cardinality() {
        assert_eq!(reference_trains().len(), 5);
        assert_eq!(reference_sections().len(), 4);
        assert_eq!(reference_notifications(SystemTime::now()).len(), 3);
    }

    #[test]
    fn test_train_ids_unique() {
        let ids: HashSet<_> = reference_trains().into_iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_notifications_newest_first() {
        let feed = reference_notifications(SystemTime::now());
        assert!(feed.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
    }

    #[test]
    fn test_notifications_near_epoch_saturate() {
        let feed = reference_notifications(UNIX_EPOCH + Duration::from_secs(60));
        assert_eq!(feed[2].timestamp, UNIX_EPOCH);
    }
}
