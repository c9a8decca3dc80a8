//! RailView Environment Abstraction Layer
//!
//! This crate provides the seam that lets the RailView dashboard run both
//! **live** (tokio timers, OS entropy) and **simulated** (virtual clock,
//! seeded RNG) without changing the dashboard itself.
//!
//! # Core Concept
//!
//! Everything non-deterministic the dashboard touches goes through a
//! [`RailViewContext`]:
//! - Time (`now()`, `system_time()`, `sleep()`)
//! - Scheduling (`spawn()`)
//! - Randomness (`derive_rng()`)
//!
//! In simulation all entropy is derived from a single 64-bit seed, so any
//! run can be replayed from its seed number.
//!
//! # Example
//!
//! ```ignore
//! use railview_env::RailViewContext;
//!
//! async fn ticker<Ctx: RailViewContext>(ctx: &Ctx, mut stop: watch::Receiver<bool>) {
//!     loop {
//!         tokio::select! {
//!             _ = stop.changed() => break,
//!             _ = ctx.sleep(Duration::from_secs(3)) => tick(),
//!         }
//!     }
//! }
//! ```

mod context;
mod types;
mod error;
mod tokio_impl;

pub use context::RailViewContext;
pub use types::UserId;
pub use error::EnvError;
pub use tokio_impl::TokioContext;
