//! Named scenarios for deterministic dashboard runs.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// RV-001: controller works the signals while the timer runs
    ControllerShift,

    /// RV-002: government viewer tries every signal command
    GovernmentAudit,

    /// RV-003: commands against trains that do not exist
    PhantomTrain,

    /// RV-004: notifications read and dismissed, twice over
    FeedHousekeeping,

    /// RV-005: logins and logouts interleaved with commands
    SessionChurn,

    /// RV-006: thousands of ticks with random signal flips
    LongHaul,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::ControllerShift,
            ScenarioId::GovernmentAudit,
            ScenarioId::PhantomTrain,
            ScenarioId::FeedHousekeeping,
            ScenarioId::SessionChurn,
            ScenarioId::LongHaul,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::ControllerShift => "controller_shift",
            ScenarioId::GovernmentAudit => "government_audit",
            ScenarioId::PhantomTrain => "phantom_train",
            ScenarioId::FeedHousekeeping => "feed_housekeeping",
            ScenarioId::SessionChurn => "session_churn",
            ScenarioId::LongHaul => "long_haul",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::ControllerShift => {
                "Controller holds, diverts and releases trains between ticks"
            }
            ScenarioId::GovernmentAudit => "Viewer commands are all rejected and change nothing",
            ScenarioId::PhantomTrain => "Unknown train ids fail the same way for every role",
            ScenarioId::FeedHousekeeping => "mark-read and dismiss are idempotent",
            ScenarioId::SessionChurn => "Signal rights follow the logged-in role",
            ScenarioId::LongHaul => "Speed floors and track range hold over a long run",
        }
    }

    /// Default tick budget for the scenario.
    pub fn default_ticks(&self) -> u64 {
        match self {
            ScenarioId::LongHaul => 5_000,
            _ => 100,
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "controller_shift" | "controllershift" | "rv-001" => Ok(ScenarioId::ControllerShift),
            "government_audit" | "governmentaudit" | "rv-002" => Ok(ScenarioId::GovernmentAudit),
            "phantom_train" | "phantomtrain" | "rv-003" => Ok(ScenarioId::PhantomTrain),
            "feed_housekeeping" | "feedhousekeeping" | "rv-004" => Ok(ScenarioId::FeedHousekeeping),
            "session_churn" | "sessionchurn" | "rv-005" => Ok(ScenarioId::SessionChurn),
            "long_haul" | "longhaul" | "rv-006" => Ok(ScenarioId::LongHaul),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for id in ScenarioId::all() {
            assert_eq!(id.name().parse::<ScenarioId>(), Ok(id));
        }
        assert_eq!("RV-003".parse::<ScenarioId>(), Ok(ScenarioId::PhantomTrain));
        assert!("split_brain".parse::<ScenarioId>().is_err());
    }
}
