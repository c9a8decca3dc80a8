//! The coordinating context object.
//!
//! `Dashboard` owns the session gate, the simulation engine and the
//! notification feed behind one mutex, so timer ticks and user commands are
//! strictly serialized. Clones share the same state.

use crate::config::DashboardConfig;
use crate::details::TrainDetails;
use crate::error::DashboardError;
use crate::model::{
    Notification, NotificationId, Role, Section, SectionId, SignalState, Train, TrainId, User,
};
use crate::notifications::NotificationFeed;
use crate::seed;
use crate::session::{Action, Session};
use crate::simulation::{SimulationEngine, StatusSummary};
use railview_env::{RailViewContext, UserId};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// RNG stream driving train motion.
const PHYSICS_STREAM: u64 = 1;
/// RNG stream for minting user ids, kept apart so logins don't perturb motion.
const IDENTITY_STREAM: u64 = 2;

struct DashboardState {
    session: Session,
    engine: SimulationEngine,
    feed: NotificationFeed,
    sections: Vec<Section>,
    physics_rng: ChaCha8Rng,
    identity_rng: ChaCha8Rng,
    last_update: SystemTime,
}

/// Point-in-time copy of everything the dashboard renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub tick: u64,
    pub last_update: SystemTime,
    pub user: Option<User>,
    pub summary: StatusSummary,
    pub trains: Vec<Train>,
    pub notifications: Vec<Notification>,
    pub unread: usize,
}

pub struct Dashboard<Ctx: RailViewContext> {
    ctx: Arc<Ctx>,
    config: DashboardConfig,
    state: Arc<Mutex<DashboardState>>,
}

impl<Ctx: RailViewContext> Clone for Dashboard<Ctx> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
            config: self.config.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<Ctx: RailViewContext> Dashboard<Ctx> {
    /// Creates a dashboard, loading the reference data unless disabled.
    pub fn new(ctx: Arc<Ctx>, config: DashboardConfig) -> Self {
        if config.seed_reference_data {
            let now = ctx.system_time();
            Self::with_data(
                ctx,
                config,
                seed::reference_trains(),
                seed::reference_sections(),
                seed::reference_notifications(now),
            )
        } else {
            Self::with_data(ctx, config, Vec::new(), Vec::new(), Vec::new())
        }
    }

    /// Creates a dashboard over caller-supplied data.
    ///
    /// `notifications` must be newest first.
    pub fn with_data(
        ctx: Arc<Ctx>,
        config: DashboardConfig,
        trains: Vec<Train>,
        sections: Vec<Section>,
        notifications: Vec<Notification>,
    ) -> Self {
        let state = DashboardState {
            session: Session::new(),
            engine: SimulationEngine::new(trains),
            feed: NotificationFeed::with_entries(notifications),
            sections,
            physics_rng: ctx.derive_rng(PHYSICS_STREAM),
            identity_rng: ctx.derive_rng(IDENTITY_STREAM),
            last_update: ctx.system_time(),
        };
        info!(
            "Dashboard ready: {} trains, {} sections (seed={})",
            state.engine.trains().len(),
            state.sections.len(),
            ctx.seed()
        );

        Self {
            ctx,
            config,
            state: Arc::new(Mutex::new(state)),
        }
    }

    // A panic mid-command cannot leave a half-applied mutation behind, so a
    // poisoned lock still guards consistent state.
    fn lock(&self) -> MutexGuard<'_, DashboardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn context(&self) -> &Arc<Ctx> {
        &self.ctx
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    // =========================================================================
    // SESSION
    // =========================================================================

    pub fn login(&self, name: &str, role: Option<Role>) -> Result<User, DashboardError> {
        let mut state = self.lock();
        let bytes: [u8; 16] = state.identity_rng.gen();
        let id = UserId::from_uuid(uuid::Builder::from_random_bytes(bytes).into_uuid());
        state.session.login_as(id, name, role).cloned()
    }

    pub fn logout(&self) {
        self.lock().session.logout();
    }

    pub fn current_user(&self) -> Option<User> {
        self.lock().session.current_user().cloned()
    }

    pub fn is_authorized(&self, action: Action) -> bool {
        self.lock().session.is_authorized(action)
    }

    // =========================================================================
    // SIMULATION
    // =========================================================================

    /// Advances every train by one tick and returns the tick count.
    pub fn tick(&self) -> u64 {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.engine.tick(&mut state.physics_rng);
        state.last_update = self.ctx.system_time();
        state.engine.ticks()
    }

    /// Applies an operator signal command and records it in the feed.
    ///
    /// Unknown trains are reported before the role check, so every caller
    /// gets `TrainNotFound` for a bad id.
    pub fn set_signal(
        &self,
        train_id: &TrainId,
        signal: SignalState,
    ) -> Result<Notification, DashboardError> {
        let mut guard = self.lock();
        let state = &mut *guard;

        if !state.engine.contains(train_id) {
            warn!("Signal {} rejected: unknown train {}", signal, train_id);
            return Err(DashboardError::TrainNotFound(train_id.clone()));
        }
        if let Err(e) = state.session.authorize(Action::ChangeSignal) {
            warn!("Signal {} for {} rejected: {}", signal, train_id, e);
            return Err(e);
        }

        let change = state.engine.set_signal(train_id, signal)?;
        let notification = state
            .feed
            .record(change.message(), change.kind(), self.ctx.system_time());
        info!(
            "Signal {} -> {} for {} ({} -> {})",
            change.previous_signal,
            change.signal,
            change.train_id,
            change.previous_status,
            signal.implied_status()
        );

        Ok(notification)
    }

    pub fn status_summary(&self) -> StatusSummary {
        self.lock().engine.status_summary()
    }

    pub fn tick_count(&self) -> u64 {
        self.lock().engine.ticks()
    }

    pub fn last_update(&self) -> SystemTime {
        self.lock().last_update
    }

    /// Bumps `last_update` without advancing the simulation.
    pub fn refresh(&self) -> SystemTime {
        let now = self.ctx.system_time();
        self.lock().last_update = now;
        now
    }

    pub fn trains(&self) -> Vec<Train> {
        self.lock().engine.trains().to_vec()
    }

    pub fn train(&self, id: &TrainId) -> Option<Train> {
        self.lock().engine.train(id).cloned()
    }

    pub fn train_details(&self, id: &TrainId) -> Result<TrainDetails, DashboardError> {
        let state = self.lock();
        let train = state
            .engine
            .train(id)
            .cloned()
            .ok_or_else(|| DashboardError::TrainNotFound(id.clone()))?;
        let section = state
            .sections
            .iter()
            .find(|s| s.name == train.current_section)
            .cloned();
        Ok(TrainDetails::new(train, section))
    }

    // =========================================================================
    // SECTIONS
    // =========================================================================

    pub fn sections(&self) -> Vec<Section> {
        self.lock().sections.clone()
    }

    /// Looks up a section by the free-text label trains carry.
    pub fn section_by_name(&self, name: &str) -> Option<Section> {
        self.lock().sections.iter().find(|s| s.name == name).cloned()
    }

    /// Trains listed on a section that still exist in the train set.
    pub fn trains_in_section(&self, id: &SectionId) -> Vec<Train> {
        let state = self.lock();
        state
            .sections
            .iter()
            .find(|s| &s.id == id)
            .map(|section| {
                section
                    .trains
                    .iter()
                    .filter_map(|t| state.engine.train(t).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    // =========================================================================
    // NOTIFICATIONS
    // =========================================================================

    /// Newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().feed.iter().cloned().collect()
    }

    pub fn mark_read(&self, id: &NotificationId) {
        self.lock().feed.mark_read(id);
    }

    pub fn dismiss(&self, id: &NotificationId) {
        self.lock().feed.dismiss(id);
    }

    pub fn unread_count(&self) -> usize {
        self.lock().feed.unread_count()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let state = self.lock();
        DashboardSnapshot {
            tick: state.engine.ticks(),
            last_update: state.last_update,
            user: state.session.current_user().cloned(),
            summary: state.engine.status_summary(),
            trains: state.engine.trains().to_vec(),
            notifications: state.feed.iter().cloned().collect(),
            unread: state.feed.unread_count(),
        }
    }

    // =========================================================================
    // TICKER
    // =========================================================================

    /// Starts ticking every `config.tick_interval` on the context's runtime.
    ///
    /// Stopping discards the pending sleep; missed ticks are not replayed.
    pub fn start_ticker(&self) -> Result<Ticker, DashboardError> {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let dashboard = self.clone();
        let period = self.config.tick_interval;

        let handle = self.ctx.spawn("railview-ticker", async move {
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = dashboard.ctx.sleep(period) => {
                        let tick = dashboard.tick();
                        debug!("ticker fired (tick={})", tick);
                    }
                }
            }
            debug!("ticker stopped");
        })?;
        info!("Ticker started (every {:?})", period);

        Ok(Ticker {
            stop: stop_tx,
            handle: Some(handle),
        })
    }
}

/// Handle to a running ticker. Dropping it stops the ticker.
pub struct Ticker {
    stop: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Signals the ticker to stop without waiting for it.
    pub fn stop(self) {
        let _ = self.stop.send(true);
    }

    /// Signals the ticker to stop and waits for the task to exit.
    pub async fn shutdown(mut self) {
        let _ = self.stop.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NotificationKind, TrainStatus};
    use railview_env::TokioContext;
    use std::time::Duration;
    use support::FixedContext;

    mod support {
        use async_trait::async_trait;
        use rand::SeedableRng;
        use rand_chacha::ChaCha8Rng;
        use railview_env::{EnvError, RailViewContext};
        use std::future::Future;
        use std::sync::atomic::{AtomicU64, Ordering};
        use std::time::{Duration, SystemTime, UNIX_EPOCH};
        use tokio::task::JoinHandle;

        /// Fixed wall clock, streams seeded from the stream id, no runtime.
        pub struct FixedContext;

        #[async_trait]
        impl RailViewContext for FixedContext {
            fn now(&self) -> Duration {
                Duration::ZERO
            }

            fn system_time(&self) -> SystemTime {
                UNIX_EPOCH + Duration::from_secs(1_704_067_200)
            }

            async fn sleep(&self, _duration: Duration) {}

            fn spawn<F>(&self, name: &str, _future: F) -> Result<JoinHandle<()>, EnvError>
            where
                F: Future<Output = ()> + Send + 'static,
            {
                Err(EnvError::no_runtime(name.to_string()))
            }

            fn derive_rng(&self, stream: u64) -> ChaCha8Rng {
                ChaCha8Rng::seed_from_u64(stream)
            }

            fn seed(&self) -> u64 {
                1
            }
        }

        /// Wall clock that moves forward one second per reading.
        #[derive(Default)]
        pub struct SteppingContext {
            reads: AtomicU64,
        }

        #[async_trait]
        impl RailViewContext for SteppingContext {
            fn now(&self) -> Duration {
                Duration::from_secs(self.reads.load(Ordering::SeqCst))
            }

            fn system_time(&self) -> SystemTime {
                let step = self.reads.fetch_add(1, Ordering::SeqCst);
                UNIX_EPOCH + Duration::from_secs(1_704_067_200 + step)
            }

            async fn sleep(&self, _duration: Duration) {}

            fn spawn<F>(&self, name: &str, _future: F) -> Result<JoinHandle<()>, EnvError>
            where
                F: Future<Output = ()> + Send + 'static,
            {
                Err(EnvError::no_runtime(name.to_string()))
            }

            fn derive_rng(&self, stream: u64) -> ChaCha8Rng {
                ChaCha8Rng::seed_from_u64(stream)
            }

            fn seed(&self) -> u64 {
                1
            }
        }
    }

    fn dashboard() -> Dashboard<FixedContext> {
        Dashboard::new(Arc::new(FixedContext), DashboardConfig::default())
    }

    #[test]
    fn test_reference_data_loaded() {
        let d = dashboard();
        assert_eq!(d.trains().len(), 5);
        assert_eq!(d.sections().len(), 4);
        assert_eq!(d.notifications().len(), 3);
        assert_eq!(d.unread_count(), 2);
        assert!(d.current_user().is_none());
    }

    #[test]
    fn test_empty_dashboard() {
        let d = Dashboard::new(
            Arc::new(FixedContext),
            DashboardConfig::default().without_reference_data(),
        );
        assert!(d.trains().is_empty());
        assert_eq!(d.status_summary(), StatusSummary::default());
    }

    #[test]
    fn test_controller_allows_delayed_train() {
        let d = dashboard();
        d.login("Asha", Some(Role::Controller)).unwrap();
        let before = d.notifications();

        let n = d.set_signal(&TrainId::from("T002"), SignalState::Allow).unwrap();

        let t = d.train(&TrainId::from("T002")).unwrap();
        assert_eq!(t.status, TrainStatus::OnTime);
        assert_eq!(t.signal_state, SignalState::Allow);
        assert_eq!(t.delay, 15);

        let after = d.notifications();
        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(after[0], n);
        assert_eq!(n.kind, NotificationKind::Info);
        assert!(n.message.contains("T002"));
        assert_eq!(n.message, "Signal changed to ALLOW for train T002");
        assert_eq!(&after[1..], before.as_slice());
    }

    #[test]
    fn test_controller_hold_yields_held_and_warning() {
        let d = dashboard();
        d.login("Asha", Some(Role::Controller)).unwrap();

        let n = d.set_signal(&TrainId::from("T001"), SignalState::Hold).unwrap();

        assert_eq!(d.train(&TrainId::from("T001")).unwrap().status, TrainStatus::Held);
        assert_eq!(n.kind, NotificationKind::Warning);
        assert_eq!(n.id.as_str(), "N004");
        assert_eq!(d.status_summary().delayed, 2);
    }

    #[test]
    fn test_government_cannot_change_signal() {
        let d = dashboard();
        d.login("Vikram", Some(Role::Government)).unwrap();
        let before = d.train(&TrainId::from("T001")).unwrap();
        let feed_before = d.notifications();

        let err = d.set_signal(&TrainId::from("T001"), SignalState::Hold).unwrap_err();

        assert!(matches!(err, DashboardError::Unauthorized { action: Action::ChangeSignal }));
        assert_eq!(d.train(&TrainId::from("T001")).unwrap(), before);
        assert_eq!(d.notifications(), feed_before);
    }

    #[test]
    fn test_logged_out_cannot_change_signal() {
        let d = dashboard();
        let err = d.set_signal(&TrainId::from("T001"), SignalState::Hold).unwrap_err();
        assert!(matches!(err, DashboardError::Unauthorized { .. }));
    }

    #[test]
    fn test_unknown_train_for_any_role() {
        let d = dashboard();
        let ghost = TrainId::from("nonexistent");

        let anonymous = d.set_signal(&ghost, SignalState::Allow).unwrap_err();
        assert!(matches!(anonymous, DashboardError::TrainNotFound(_)));

        for role in [Role::Government, Role::Controller] {
            d.login("Someone", Some(role)).unwrap();
            let err = d.set_signal(&ghost, SignalState::Allow).unwrap_err();
            assert!(matches!(err, DashboardError::TrainNotFound(_)));
        }
        assert_eq!(d.notifications().len(), 3);
    }

    #[test]
    fn test_login_ids_are_deterministic_per_seed() {
        let a = dashboard().login("Asha", Some(Role::Controller)).unwrap();
        let b = dashboard().login("Asha", Some(Role::Controller)).unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_login_does_not_perturb_motion() {
        let quiet = dashboard();
        let busy = dashboard();
        busy.login("Asha", Some(Role::Controller)).unwrap();

        quiet.tick();
        busy.tick();

        assert_eq!(quiet.trains(), busy.trains());
    }

    #[test]
    fn test_logout_revokes_signal_rights() {
        let d = dashboard();
        d.login("Asha", Some(Role::Controller)).unwrap();
        assert!(d.is_authorized(Action::ChangeSignal));
        d.logout();
        assert!(!d.is_authorized(Action::ChangeSignal));
        assert!(d.current_user().is_none());
    }

    #[test]
    fn test_tick_updates_trains_and_last_update() {
        let d = dashboard();
        assert_eq!(d.tick(), 1);
        assert_eq!(d.tick(), 2);
        assert_eq!(d.tick_count(), 2);
        assert_eq!(d.last_update(), FixedContext.system_time());

        for t in d.trains() {
            assert!(t.position.x >= 0.0 && t.position.x < 100.0);
            match t.signal_state {
                SignalState::Allow => assert!(t.speed >= 60.0),
                SignalState::Hold => assert_eq!(t.speed, 0.0),
                SignalState::Divert => assert!(t.speed >= 30.0),
            }
        }
    }

    #[test]
    fn test_mark_read_and_dismiss_idempotent() {
        let d = dashboard();
        let id = NotificationId::from("N001");

        d.mark_read(&id);
        let once = d.notifications();
        d.mark_read(&id);
        assert_eq!(d.notifications(), once);
        assert_eq!(d.unread_count(), 1);

        d.dismiss(&id);
        let once = d.notifications();
        d.dismiss(&id);
        assert_eq!(d.notifications(), once);
        assert_eq!(once.len(), 2);

        d.mark_read(&NotificationId::from("nope"));
        d.dismiss(&NotificationId::from("nope"));
        assert_eq!(d.notifications(), once);
    }

    #[test]
    fn test_sections_lookup() {
        let d = dashboard();
        let a = d.section_by_name("Section A").unwrap();
        assert_eq!(a.controller, "Controller North");

        let ids: Vec<_> = d
            .trains_in_section(&a.id)
            .into_iter()
            .map(|t| t.id.0)
            .collect();
        assert_eq!(ids, vec!["T001", "T005"]);
        assert!(d.trains_in_section(&SectionId::from("SEC-Z")).is_empty());
        assert!(d.section_by_name("Section Z").is_none());
    }

    #[test]
    fn test_train_details() {
        let d = dashboard();
        let details = d.train_details(&TrainId::from("T003")).unwrap();
        assert_eq!(details.section.unwrap().id.as_str(), "SEC-C");
        assert_eq!(details.route_efficiency, 90);

        assert!(matches!(
            d.train_details(&TrainId::from("T999")),
            Err(DashboardError::TrainNotFound(_))
        ));
    }

    #[test]
    fn test_snapshot_matches_accessors() {
        let d = dashboard();
        d.login("Asha", Some(Role::Controller)).unwrap();
        d.tick();

        let snap = d.snapshot();
        assert_eq!(snap.tick, 1);
        assert_eq!(snap.trains, d.trains());
        assert_eq!(snap.summary, d.status_summary());
        assert_eq!(snap.unread, d.unread_count());
        assert_eq!(snap.user.map(|u| u.name), Some("Asha".to_string()));
    }

    #[test]
    fn test_ticker_needs_runtime() {
        let d = dashboard();
        assert!(matches!(d.start_ticker(), Err(DashboardError::Env(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_fires_on_interval_and_stops() {
        let d = Dashboard::new(
            TokioContext::shared(),
            DashboardConfig::default().with_tick_interval(Duration::from_secs(3)),
        );
        let ticker = d.start_ticker().unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(d.tick_count(), 3);

        ticker.shutdown().await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(d.tick_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_ticker_stops_it() {
        let d = Dashboard::new(TokioContext::shared(), DashboardConfig::default());
        let ticker = d.start_ticker().unwrap();

        tokio::time::sleep(Duration::from_secs(4)).await;
        drop(ticker);
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(d.tick_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_ticker_fires_no_more() {
        let d = Dashboard::new(TokioContext::shared(), DashboardConfig::default());
        let ticker = d.start_ticker().unwrap();

        tokio::time::sleep(Duration::from_secs(7)).await;
        assert_eq!(d.tick_count(), 2);
        assert!(!ticker.is_finished());

        ticker.stop();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(d.tick_count(), 2);
    }

    #[test]
    fn test_refresh_bumps_last_update_only() {
        let d = Dashboard::new(
            Arc::new(support::SteppingContext::default()),
            DashboardConfig::default(),
        );
        let before = d.last_update();
        let trains = d.trains();

        let refreshed = d.refresh();
        assert!(refreshed > before);
        assert_eq!(d.last_update(), refreshed);
        assert_eq!(d.tick_count(), 0);
        assert_eq!(d.trains(), trains);
    }
}
