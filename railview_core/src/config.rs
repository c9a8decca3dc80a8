//! Dashboard configuration.

use std::time::Duration;

/// Configuration for a dashboard instance.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Period of the simulation ticker
    pub tick_interval: Duration,

    /// Load the reference trains, sections and notifications at startup
    pub seed_reference_data: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(3),
            seed_reference_data: true,
        }
    }
}

impl DashboardConfig {
    /// Sets the ticker period.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Starts from an empty train set and feed.
    pub fn without_reference_data(mut self) -> Self {
        self.seed_reference_data = false;
        self
    }
}
