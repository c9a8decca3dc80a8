//! RailView Simulator CLI
//!
//! Run deterministic dashboard scenarios, or drive a live dashboard on a
//! real timer and watch the summary cards change.

use clap::Parser;
use railview_core::{Dashboard, DashboardConfig, DashboardError, Role, SignalState, TrainId};
use railview_env::TokioContext;
use railview_sim::scenarios::ScenarioId;
use railview_sim::{ScenarioResult, ScenarioRunner};
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// RailView simulation CLI
#[derive(Parser, Debug)]
#[command(name = "railview-sim")]
#[command(about = "Run deterministic or live simulations of the RailView dashboard", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (controller_shift, government_audit, phantom_train,
    /// feed_housekeeping, session_churn, long_haul, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Number of consecutive seeds to test (for CI mode)
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Override every scenario's tick budget
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export recorded frames of a single scenario to this JSON file
    #[arg(long)]
    export: Option<String>,

    /// Record a frame every N ticks when exporting
    #[arg(long, default_value = "1")]
    frame_interval: u64,

    /// Drive a live dashboard on the wall clock instead of running scenarios
    #[arg(long)]
    live: bool,

    /// Live mode: tick period in milliseconds
    #[arg(long, default_value = "3000")]
    interval_ms: u64,

    /// Live mode: how long to run, in seconds
    #[arg(long, default_value = "15")]
    duration_secs: f64,

    /// Live mode: name to log in with
    #[arg(long, default_value = "Section Controller")]
    user: String,

    /// Live mode: role to log in with (government, controller)
    #[arg(long, default_value = "controller")]
    role: Role,

    /// Live mode: signal command issued after login, e.g. T002=allow (repeatable)
    #[arg(long = "signal", value_parser = parse_signal_command)]
    signals: Vec<(TrainId, SignalState)>,
}

fn parse_signal_command(s: &str) -> Result<(TrainId, SignalState), String> {
    let (id, signal) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TRAIN=SIGNAL, got '{}'", s))?;
    Ok((TrainId::from(id.trim()), signal.parse()?))
}

fn live_duration(secs: f64) -> Result<Duration, String> {
    Duration::try_from_secs_f64(secs.max(0.0))
        .map_err(|e| format!("invalid --duration-secs {}: {}", secs, e))
}

fn main() {
    let args = Args::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        std::process::exit(1);
    }

    if args.live {
        let duration = match live_duration(args.duration_secs) {
            Ok(d) => d,
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        };
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                error!("Failed to start runtime: {}", e);
                std::process::exit(1);
            }
        };
        if let Err(e) = runtime.block_on(run_live(&args, duration)) {
            error!("Live run failed: {}", e);
            std::process::exit(1);
        }
        return;
    }

    if !args.json {
        info!("RailView Simulator v0.1.0");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        match args.scenario.parse() {
            Ok(id) => vec![id],
            Err(e) => {
                error!("{}", e);
                let names: Vec<&str> = ScenarioId::all().iter().map(|s| s.name()).collect();
                error!("Available scenarios: {}, all", names.join(", "));
                std::process::exit(1);
            }
        }
    };

    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    let runner_for = |seed: u64| {
        let runner = ScenarioRunner::new(seed).with_frame_interval(args.frame_interval);
        match args.ticks {
            Some(ticks) => runner.with_ticks(ticks),
            None => runner,
        }
    };

    // Handle --export mode
    if let Some(export_path) = &args.export {
        if scenarios.len() > 1 {
            error!("--export only supports a single scenario, not 'all'");
            std::process::exit(1);
        }

        let (result, export) = runner_for(base_seed).run_recorded(scenarios[0]);
        match export.write_to_file(export_path) {
            Ok(()) => info!("Exported {} frames to {}", export.frames.len(), export_path),
            Err(e) => {
                error!("Failed to write export: {}", e);
                std::process::exit(1);
            }
        }

        if !result.passed {
            error!(
                "✗ {} FAILED: {}",
                scenarios[0].name(),
                result.failure_reason.as_deref().unwrap_or("unknown")
            );
            std::process::exit(1);
        }
        return;
    }

    // Run simulations
    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;

    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);
        let runner = runner_for(seed);

        for scenario in &scenarios {
            let result = runner.run(*scenario);

            if !args.json {
                if result.passed {
                    info!("✓ {} (seed={}) PASSED", scenario.name(), seed);
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        scenario.name(),
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }

            if !result.passed {
                failed_count += 1;
            }
            all_results.push(result);
        }
    }

    // Summary
    let total = all_results.len();
    let passed = total - failed_count;

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "seed": r.seed,
                    "passed": r.passed,
                    "ticks": r.total_ticks,
                    "time_secs": r.final_time_secs,
                    "commands": r.metrics.commands_issued,
                    "rejected": r.metrics.commands_rejected,
                    "checks": r.metrics.invariant_checks,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to encode summary: {}", e),
        }
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);
            for result in all_results.iter().filter(|r| !r.passed) {
                error!(
                    "  - {} seed={}: {}",
                    result.scenario.name(),
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
}

/// Runs a dashboard against the wall clock until the duration elapses or Ctrl-C.
async fn run_live(args: &Args, duration: Duration) -> Result<(), DashboardError> {
    let interval = Duration::from_millis(args.interval_ms.max(1));
    let config = DashboardConfig::default().with_tick_interval(interval);
    let dashboard = Dashboard::new(TokioContext::shared(), config);

    let user = dashboard.login(&args.user, Some(args.role))?;
    info!("Welcome, {} • {}", user.name, user.role.display_name());

    for (train_id, signal) in &args.signals {
        match dashboard.set_signal(train_id, *signal) {
            Ok(n) => info!("[{:?}] {}", n.kind, n.message),
            Err(e) => warn!("{} {}: {}", train_id, signal, e),
        }
    }

    let ticker = dashboard.start_ticker()?;
    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);
    let mut report = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            _ = report.tick() => {
                let s = dashboard.status_summary();
                info!(
                    "tick={} | active={} on-time={} delayed/held={} diverted={} | unread={}",
                    dashboard.tick_count(),
                    s.total,
                    s.on_time,
                    s.delayed,
                    s.diverted,
                    dashboard.unread_count()
                );
            }
        }
    }

    ticker.shutdown().await;
    dashboard.logout();

    if args.json {
        match serde_json::to_string_pretty(&dashboard.snapshot()) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to encode snapshot: {}", e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_signal_command() {
        let (id, signal) = parse_signal_command("T002=allow").unwrap();
        assert_eq!(id.as_str(), "T002");
        assert_eq!(signal, SignalState::Allow);

        assert!(parse_signal_command("T002").is_err());
        assert!(parse_signal_command("T002=stop").is_err());
    }

    #[test]
    fn test_live_duration_rejects_unrepresentable() {
        assert_eq!(live_duration(1.5).unwrap(), Duration::from_millis(1500));
        assert_eq!(live_duration(-3.0).unwrap(), Duration::ZERO);
        assert!(live_duration(f64::INFINITY).is_err());
        assert!(live_duration(1e30).is_err());
    }

    #[test]
    fn test_args_parse_live_mode() {
        let args = Args::try_parse_from([
            "railview-sim",
            "--live",
            "--role",
            "government",
            "--signal",
            "T001=hold",
        ])
        .unwrap();

        assert!(args.live);
        assert_eq!(args.role, Role::Government);
        assert_eq!(args.signals.len(), 1);
    }
}
