//! Core environment context trait for the RailView dashboard.

use crate::EnvError;
use async_trait::async_trait;
use rand_chacha::ChaCha8Rng;
use std::future::Future;
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;

/// The central interface for environment interaction.
///
/// Abstracts the "real world" so the dashboard can run either against the
/// wall clock or inside a deterministic simulation.
///
/// # Implementations
///
/// - **Live**: `TokioContext` - wraps `tokio::time`, OS entropy
/// - **Simulation**: `SimContext` - virtual clock, `ChaCha8Rng(seed)`
#[async_trait]
pub trait RailViewContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Returns the wall-clock time used for notification timestamps.
    ///
    /// In simulation, this is derived from virtual clock + epoch offset.
    fn system_time(&self) -> SystemTime;

    /// Suspends execution for the given duration.
    ///
    /// Live: wraps `tokio::time::sleep`
    /// Simulation: advances the virtual clock
    async fn sleep(&self, duration: Duration);

    /// Spawns a background task.
    ///
    /// Fails when no runtime is available to run it on.
    fn spawn<F>(&self, name: &str, future: F) -> Result<JoinHandle<()>, EnvError>
    where
        F: Future<Output = ()> + Send + 'static;

    /// Derives an independent pseudo-random stream.
    ///
    /// In simulation the stream is a pure function of the master seed and
    /// `stream`, so two contexts with the same seed hand out identical
    /// streams. Live contexts seed from OS entropy and ignore `stream`.
    fn derive_rng(&self, stream: u64) -> ChaCha8Rng;

    /// Returns the context's seed (for logging/debugging).
    ///
    /// Live contexts are not seeded and return 0.
    fn seed(&self) -> u64;
}
