/*!
 * Resource Allocation Simulator - Main Entry Point
 *
 * Runs the scheduler against a random workload:
 * - Priority scheduling of one execution unit
 * - Main memory and swap with class-weighted eviction
 * - Aging, swap-in reclamation and rolling metrics
 */

use miette::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use resalloc::core::limits::METRIC_INTERVAL;
use resalloc::monitoring::spawn_reporter;
use resalloc::{
    init_tracing, spawn_auto_generator, Clock, ConfigError, LogBuffer, MetricAggregator,
    Scheduler, SchedulerConfig, SimResult, SystemClock, WorkloadGenerator,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured tracing
    init_tracing();

    run().await?;
    Ok(())
}

/// Run the simulator until Ctrl+C or `RESALLOC_RUN_SECS` elapses
async fn run() -> SimResult<()> {
    info!("Resource allocation simulator starting...");
    info!("================================================");

    let config = SchedulerConfig::from_env()?;
    let run_for = run_duration()?;
    let json_snapshots = std::env::var("RESALLOC_SNAPSHOT_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let seed = config.seed;

    info!(
        max_memory = config.max_memory,
        max_swap = config.max_swap,
        speed = config.initial_speed,
        io_probability = config.io_probability,
        "Configuration loaded"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let events = Arc::new(LogBuffer::new(Arc::clone(&clock)));

    let scheduler = Arc::new(
        Scheduler::builder()
            .with_config(config)
            .with_clock(Arc::clone(&clock))
            .with_event_log(events.clone())
            .spawn()?,
    );

    // Snapshot subscriber feeds the metric aggregator
    let aggregator = Arc::new(Mutex::new(MetricAggregator::new(clock.now())));
    {
        let aggregator = Arc::clone(&aggregator);
        scheduler.subscribe(move |snapshot| {
            aggregator.lock().record(&snapshot);

            if json_snapshots {
                match serde_json::to_string(&snapshot) {
                    Ok(json) => println!("{}", json),
                    Err(e) => warn!(error = %e, "Failed to serialize snapshot"),
                }
                return;
            }

            info!(
                running = ?snapshot.running_process.as_ref().map(|p| p.id),
                ready = snapshot.ready_queue.len(),
                swapped = snapshot.swapped_queue.len(),
                archived = snapshot.completed_processes.len(),
                memory = %format!("{}/{} MB", snapshot.memory_used, snapshot.max_memory),
                swap = %format!("{}/{} MB", snapshot.swap_used, snapshot.max_swap),
                cpu = snapshot.cpu_used(),
                "Snapshot"
            );
        });
    }

    let reporter = spawn_reporter(
        Arc::clone(&aggregator),
        Arc::clone(&clock),
        METRIC_INTERVAL,
        |report| {
            info!(
                avg_tat = %format!("{:.2}s", report.avg_tat),
                avg_wt = %format!("{:.2}s", report.avg_wt),
                throughput = %format!("{:.2}/min", report.throughput),
                avg_io_wait = %format!("{:.2}s", report.avg_io_wait),
                starvation = %format!("{:.2}s", report.starvation_time),
                "Metrics"
            );
        },
    );

    let generator = spawn_auto_generator(
        Arc::clone(&scheduler),
        WorkloadGenerator::new(Arc::clone(&clock), seed.map(|s| s.wrapping_add(1))),
        None,
    );

    info!("================================================");
    info!("Simulator ready (Ctrl+C to stop)");

    match run_for {
        Some(duration) => {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    info!("Interrupt received");
                }
                _ = tokio::time::sleep(duration) => info!(secs = duration.as_secs(), "Run time elapsed"),
            }
        }
        None => {
            tokio::signal::ctrl_c().await?;
            info!("Interrupt received");
        }
    }

    // Graceful shutdown: producers first, then the scheduler
    generator.shutdown().await;
    reporter.shutdown().await;
    match Arc::try_unwrap(scheduler) {
        Ok(scheduler) => scheduler.shutdown().await,
        Err(_) => warn!("Scheduler still shared at shutdown; tasks will be aborted"),
    }

    let final_report = aggregator.lock().report(clock.now());
    if let Some(report) = final_report {
        info!(
            completed = aggregator.lock().completed(),
            avg_tat = report.avg_tat,
            avg_wt = report.avg_wt,
            throughput = report.throughput,
            "Final metrics"
        );
    }
    info!(events = events.len(), "Simulator stopped");

    Ok(())
}

/// `RESALLOC_RUN_SECS`: stop after this many seconds instead of waiting for Ctrl+C
fn run_duration() -> std::result::Result<Option<Duration>, ConfigError> {
    match std::env::var("RESALLOC_RUN_SECS") {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| ConfigError::Env {
                var: "RESALLOC_RUN_SECS".to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}
