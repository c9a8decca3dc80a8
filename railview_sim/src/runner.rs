//! Scenario runner - drives a dashboard on a virtual clock and checks it.

use crate::context::SimContext;
use crate::exporter::{SimEvent, SimExport, SimFrame};
use crate::oracle::Oracle;
use crate::scenarios::ScenarioId;

use railview_core::{
    Dashboard, DashboardConfig, DashboardError, Notification, NotificationId, Role, SignalState,
    StatusSummary, TrainId,
};
use railview_env::RailViewContext;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// RNG stream for scenario-level choices, apart from the dashboard's own.
const SCENARIO_STREAM: u64 = 100;

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total ticks executed
    pub total_ticks: u64,

    /// Final virtual time in seconds
    pub final_time_secs: f64,

    /// Summary cards at the end of the run
    pub final_summary: StatusSummary,

    /// First violation, if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioMetrics {
    /// Signal commands issued
    pub commands_issued: u64,

    /// Commands the dashboard applied
    pub commands_accepted: u64,

    /// Commands rejected (unauthorized or unknown train)
    pub commands_rejected: u64,

    /// Invariant checks performed by the oracle
    pub invariant_checks: u64,
}

/// One dashboard under test plus the instruments around it.
struct Harness {
    context: Arc<SimContext>,
    dashboard: Dashboard<SimContext>,
    oracle: Oracle,
    rng: ChaCha8Rng,
    metrics: ScenarioMetrics,
    export: Option<SimExport>,
    pending_events: Vec<SimEvent>,
    frame_interval: u64,
}

impl Harness {
    fn new(scenario: ScenarioId, seed: u64, record: bool, frame_interval: u64) -> Self {
        let context = SimContext::shared(seed);
        let dashboard = Dashboard::new(context.clone(), DashboardConfig::default());
        let oracle = Oracle::new(&dashboard.trains());
        let rng = context.derive_rng(SCENARIO_STREAM);

        Self {
            context,
            dashboard,
            oracle,
            rng,
            metrics: ScenarioMetrics::default(),
            export: record.then(|| SimExport::new(scenario.name(), seed)),
            pending_events: Vec::new(),
            frame_interval: frame_interval.max(1),
        }
    }

    fn tick_count(&self) -> u64 {
        self.dashboard.tick_count()
    }

    /// One timer period: advance the clock, tick, check, maybe record.
    fn step(&mut self) {
        self.context.advance_time(self.dashboard.config().tick_interval);
        let tick = self.dashboard.tick();

        let trains = self.dashboard.trains();
        self.oracle.observe_tick(tick, &trains);
        self.oracle
            .observe_summary(tick, &self.dashboard.status_summary(), &trains);
        self.oracle.observe_feed(tick, &self.dashboard.notifications());

        if tick % self.frame_interval == 0 {
            if let Some(export) = self.export.as_mut() {
                let events = std::mem::take(&mut self.pending_events);
                let snapshot = self.dashboard.snapshot();
                export.add_frame(SimFrame::from_snapshot(
                    &snapshot,
                    self.context.now().as_secs_f64(),
                    events,
                ));
            }
        }
    }

    fn command(&mut self, id: &str, signal: SignalState) -> Result<Notification, DashboardError> {
        self.metrics.commands_issued += 1;
        let result = self.dashboard.set_signal(&TrainId::from(id), signal);

        match &result {
            Ok(n) => {
                self.metrics.commands_accepted += 1;
                if self.export.is_some() {
                    self.pending_events.push(SimEvent::new(n.message.clone(), n.kind));
                }
            }
            Err(e) => {
                self.metrics.commands_rejected += 1;
                debug!("  command {} {} rejected: {}", id, signal, e);
            }
        }
        result
    }

    /// Applies a command that must succeed and checks its effects.
    fn expect_applied(&mut self, id: &str, signal: SignalState) {
        let tick = self.tick_count();
        match self.command(id, signal) {
            Ok(n) => {
                let train = self.dashboard.train(&TrainId::from(id));
                self.oracle.expect(
                    tick,
                    train.as_ref().map(|t| (t.signal_state, t.status))
                        == Some((signal, signal.implied_status())),
                    format!("{} did not take signal {}", id, signal),
                );
                let head = self.dashboard.notifications().into_iter().next();
                self.oracle.expect(
                    tick,
                    head.as_ref() == Some(&n) && n.message.contains(id) && !n.read,
                    format!("notification for {} is not at the head of the feed", id),
                );
            }
            Err(e) => self.oracle.expect(tick, false, format!("{} {} failed: {}", id, signal, e)),
        }
    }

    /// Issues a command that must be rejected without side effects.
    fn expect_rejected(&mut self, id: &str, signal: SignalState, unauthorized: bool) {
        let tick = self.tick_count();
        let before = self.dashboard.snapshot();
        let result = self.command(id, signal);
        let after = self.dashboard.snapshot();

        let right_error = match result {
            Err(DashboardError::Unauthorized { .. }) => unauthorized,
            Err(DashboardError::TrainNotFound(_)) => !unauthorized,
            _ => false,
        };
        self.oracle.expect(
            tick,
            right_error,
            format!("{} {} was not rejected as expected", id, signal),
        );
        self.oracle.expect(
            tick,
            before.trains == after.trains && before.notifications == after.notifications,
            format!("rejected {} {} changed state", id, signal),
        );
    }

    fn finish(mut self, scenario: ScenarioId, seed: u64) -> (ScenarioResult, Option<SimExport>) {
        let passed = self.oracle.passed();
        let violations: Vec<String> = self
            .oracle
            .violations()
            .iter()
            .map(|v| format!("tick {}: {}", v.tick, v.message))
            .collect();
        self.metrics.invariant_checks = self.oracle.checks();

        if let Some(export) = self.export.as_mut() {
            export.finalize(passed, violations.clone());
        }

        let result = ScenarioResult {
            scenario,
            seed,
            passed,
            total_ticks: self.tick_count(),
            final_time_secs: self.context.now().as_secs_f64(),
            final_summary: self.dashboard.status_summary(),
            failure_reason: violations.first().cloned(),
            metrics: self.metrics,
        };
        (result, self.export)
    }
}

/// Runs dashboard scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Tick budget override
    ticks: Option<u64>,

    /// Record a frame every N ticks
    frame_interval: u64,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ticks: None,
            frame_interval: 1,
        }
    }

    /// Overrides every scenario's tick budget.
    pub fn with_ticks(mut self, ticks: u64) -> Self {
        self.ticks = Some(ticks);
        self
    }

    /// Sets how often recorded runs capture a frame.
    pub fn with_frame_interval(mut self, every: u64) -> Self {
        self.frame_interval = every;
        self
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.execute(scenario, false).0
    }

    /// Runs a scenario and also returns its recorded frames.
    pub fn run_recorded(&self, scenario: ScenarioId) -> (ScenarioResult, SimExport) {
        let (result, export) = self.execute(scenario, true);
        let export = export.unwrap_or_else(|| SimExport::new(scenario.name(), self.seed));
        (result, export)
    }

    fn execute(&self, scenario: ScenarioId, record: bool) -> (ScenarioResult, Option<SimExport>) {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);
        let ticks = self.ticks.unwrap_or_else(|| scenario.default_ticks());
        let mut h = Harness::new(scenario, self.seed, record, self.frame_interval);

        match scenario {
            ScenarioId::ControllerShift => self.run_controller_shift(&mut h, ticks),
            ScenarioId::GovernmentAudit => self.run_government_audit(&mut h, ticks),
            ScenarioId::PhantomTrain => self.run_phantom_train(&mut h, ticks),
            ScenarioId::FeedHousekeeping => self.run_feed_housekeeping(&mut h, ticks),
            ScenarioId::SessionChurn => self.run_session_churn(&mut h, ticks),
            ScenarioId::LongHaul => self.run_long_haul(&mut h, ticks),
        }

        let (result, export) = h.finish(scenario, self.seed);
        if result.passed {
            info!(
                "✓ {} complete: {} ticks, {} commands ({} accepted), {} checks",
                scenario.name(),
                result.total_ticks,
                result.metrics.commands_issued,
                result.metrics.commands_accepted,
                result.metrics.invariant_checks
            );
        } else {
            warn!(
                "✗ {} failed: {}",
                scenario.name(),
                result.failure_reason.as_deref().unwrap_or("unknown")
            );
        }
        (result, export)
    }

    /// RV-001: a controller works the signals between ticks.
    fn run_controller_shift(&self, h: &mut Harness, ticks: u64) {
        let plan: [(u64, &str, SignalState); 6] = [
            (10, "T001", SignalState::Hold),
            (20, "T003", SignalState::Divert),
            (30, "T002", SignalState::Allow),
            (40, "T004", SignalState::Allow),
            (50, "T005", SignalState::Hold),
            (60, "T001", SignalState::Allow),
        ];

        let login = h.dashboard.login("Asha Rao", Some(Role::Controller));
        h.oracle.expect(0, login.is_ok(), "controller login failed");
        let feed_start = h.dashboard.notifications().len();

        for _ in 0..ticks {
            h.step();
            let tick = h.tick_count();
            for (at, id, signal) in plan.iter().filter(|(at, _, _)| *at == tick) {
                debug!("  t={} | {} -> {}", at, id, signal);
                h.expect_applied(id, *signal);
            }
        }

        let recorded = h.dashboard.notifications().len() - feed_start;
        h.oracle.expect(
            h.tick_count(),
            recorded as u64 == h.metrics.commands_accepted,
            format!("{} notifications for {} commands", recorded, h.metrics.commands_accepted),
        );
    }

    /// RV-002: a government viewer cannot move anything.
    fn run_government_audit(&self, h: &mut Harness, ticks: u64) {
        let signals = [SignalState::Hold, SignalState::Divert, SignalState::Allow];
        let ids: Vec<String> = h.dashboard.trains().iter().map(|t| t.id.to_string()).collect();

        let login = h.dashboard.login("Vikram Iyer", Some(Role::Government));
        h.oracle.expect(0, login.is_ok(), "government login failed");

        // Identical dashboard that is only ever ticked
        let shadow = Dashboard::new(SimContext::shared(self.seed), DashboardConfig::default());

        for i in 0..ticks as usize {
            h.step();
            shadow.tick();
            if let Some(id) = ids.get(i % ids.len().max(1)) {
                h.expect_rejected(id, signals[i % signals.len()], true);
            }
        }

        h.oracle.expect(
            h.tick_count(),
            h.dashboard.trains() == shadow.trains(),
            "rejected commands changed the simulation",
        );
        h.oracle.expect(
            h.tick_count(),
            h.dashboard.notifications().len() == 3,
            "rejected commands produced notifications",
        );
    }

    /// RV-003: unknown trains fail with not-found whoever asks.
    fn run_phantom_train(&self, h: &mut Harness, ticks: u64) {
        let phantoms = ["nonexistent", "T999", "t001", ""];
        let roles = [None, Some(Role::Government), Some(Role::Controller)];

        for i in 0..ticks as usize {
            h.step();
            match roles[i % roles.len()] {
                Some(role) => {
                    let login = h.dashboard.login("Phantom Hunter", Some(role));
                    let tick = h.tick_count();
                    h.oracle.expect(tick, login.is_ok(), format!("{} login failed", role));
                }
                None => h.dashboard.logout(),
            }
            h.expect_rejected(phantoms[i % phantoms.len()], SignalState::Allow, false);
        }
    }

    /// RV-004: read and dismiss are idempotent.
    fn run_feed_housekeeping(&self, h: &mut Harness, ticks: u64) {
        let login = h.dashboard.login("Asha Rao", Some(Role::Controller));
        h.oracle.expect(0, login.is_ok(), "controller login failed");

        for i in 0..ticks {
            h.step();
            let tick = h.tick_count();

            if i % 4 == 0 {
                let ids: Vec<String> =
                    h.dashboard.trains().iter().map(|t| t.id.to_string()).collect();
                if let Some(id) = ids.choose(&mut h.rng).cloned() {
                    let signal = [SignalState::Hold, SignalState::Allow, SignalState::Divert]
                        [h.rng.gen_range(0..3)];
                    h.expect_applied(&id, signal);
                }
            }

            let feed = h.dashboard.notifications();
            let Some(target) = feed.choose(&mut h.rng).map(|n| n.id.clone()) else {
                continue;
            };

            h.dashboard.mark_read(&target);
            let once = h.dashboard.notifications();
            h.dashboard.mark_read(&target);
            h.oracle.expect(
                tick,
                h.dashboard.notifications() == once,
                format!("mark_read({}) is not idempotent", target),
            );

            if i % 3 == 0 {
                h.dashboard.dismiss(&target);
                let once = h.dashboard.notifications();
                h.dashboard.dismiss(&target);
                h.oracle.expect(
                    tick,
                    h.dashboard.notifications() == once && once.iter().all(|n| n.id != target),
                    format!("dismiss({}) is not idempotent", target),
                );
            }

            let ghost = NotificationId::from("N-ghost");
            let before = h.dashboard.notifications();
            h.dashboard.mark_read(&ghost);
            h.dashboard.dismiss(&ghost);
            h.oracle.expect(
                tick,
                h.dashboard.notifications() == before,
                "unknown notification id changed the feed",
            );
        }
    }

    /// RV-005: signal rights follow whoever is logged in.
    fn run_session_churn(&self, h: &mut Harness, ticks: u64) {
        let shifts = [
            ("Asha Rao", Some(Role::Controller)),
            ("Vikram Iyer", Some(Role::Government)),
            ("", Some(Role::Controller)),
            ("Meera Das", None),
        ];
        let ids: Vec<String> = h.dashboard.trains().iter().map(|t| t.id.to_string()).collect();

        for i in 0..ticks as usize {
            h.step();
            let tick = h.tick_count();

            if i % 7 == 0 {
                let (name, role) = shifts[(i / 7) % shifts.len()];
                let before = h.dashboard.current_user();
                let login = h.dashboard.login(name, role);
                let valid = !name.trim().is_empty() && role.is_some();
                h.oracle.expect(
                    tick,
                    login.is_ok() == valid,
                    format!("login({:?}, {:?}) validity mismatch", name, role),
                );
                if !valid {
                    h.oracle.expect(
                        tick,
                        h.dashboard.current_user() == before,
                        "failed login replaced the session",
                    );
                }
            }
            if i % 23 == 22 {
                h.dashboard.logout();
            }

            let Some(id) = ids.get(i % ids.len().max(1)) else {
                continue;
            };
            let is_controller =
                h.dashboard.current_user().map(|u| u.role) == Some(Role::Controller);
            let signal = if i % 2 == 0 { SignalState::Hold } else { SignalState::Allow };
            if is_controller {
                h.expect_applied(id, signal);
            } else {
                h.expect_rejected(id, signal, true);
            }
        }
    }

    /// RV-006: long run with sporadic random commands.
    fn run_long_haul(&self, h: &mut Harness, ticks: u64) {
        let login = h.dashboard.login("Night Shift", Some(Role::Controller));
        h.oracle.expect(0, login.is_ok(), "controller login failed");
        let ids: Vec<String> = h.dashboard.trains().iter().map(|t| t.id.to_string()).collect();
        let signals = [SignalState::Allow, SignalState::Hold, SignalState::Divert];

        for tick in 0..ticks {
            h.step();

            if h.rng.gen_bool(0.05) {
                if let (Some(id), Some(signal)) =
                    (ids.choose(&mut h.rng).cloned(), signals.choose(&mut h.rng).copied())
                {
                    h.expect_applied(&id, signal);
                }
            }

            if tick % 1000 == 0 {
                let s = h.dashboard.status_summary();
                debug!(
                    "  t={:.0}s | on-time={} delayed={} diverted={}",
                    h.context.now().as_secs_f64(),
                    s.on_time,
                    s.delayed,
                    s.diverted
                );
            }
        }
    }
}
