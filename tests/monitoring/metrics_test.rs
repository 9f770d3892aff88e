/*!
 * Metric Aggregator Tests
 * Metrics derived from snapshots of a single-stepped engine
 */

use pretty_assertions::assert_eq;
use resalloc::monitoring::NullLog;
use resalloc::{
    ManualClock, MetricAggregator, ProcessClass, ProcessSpec, SchedulerConfig, SchedulerCore,
    StepOutcome,
};
use std::sync::Arc;
use std::time::Duration;

fn engine(clock: Arc<ManualClock>) -> SchedulerCore {
    let mut config = SchedulerConfig::with_capacity(1000, 500);
    config.quantum_min = 5;
    config.quantum_max = 5;
    SchedulerCore::new(config, clock, Arc::new(NullLog)).unwrap()
}

fn run_until_idle(core: &mut SchedulerCore, clock: &ManualClock) {
    loop {
        clock.advance(Duration::from_millis(1_000));
        if core.step() == StepOutcome::Idle {
            break;
        }
    }
}

#[test]
fn test_metrics_from_engine_snapshots() {
    let clock = Arc::new(ManualClock::new(0));
    let mut core = engine(clock.clone());
    let mut metrics = MetricAggregator::new(0);

    assert!(core.admit(
        ProcessSpec::new("first", 2, 100)
            .with_class(ProcessClass::System)
            .with_priority(90)
    ));
    assert!(core.admit(ProcessSpec::new("second", 2, 100).with_priority(10)));

    run_until_idle(&mut core, &clock);
    metrics.record(&core.snapshot());
    // Recording the same archive again is a no-op
    metrics.record(&core.snapshot());
    assert_eq!(metrics.completed(), 2);

    // first: ends at 2s, tat 2s, wt 0s; second: ends at 4s, tat 4s, wt 2s
    let report = metrics.report(60_000).unwrap();
    assert_eq!(report.avg_tat, 3.0);
    assert_eq!(report.avg_wt, 1.0);
    assert_eq!(report.throughput, 2.0);
    assert_eq!(report.avg_io_wait, 0.0);
    assert_eq!(report.starvation_time, 2.0);
}

#[test]
fn test_terminated_processes_do_not_count() {
    let clock = Arc::new(ManualClock::new(0));
    let mut core = engine(clock.clone());
    let mut metrics = MetricAggregator::new(0);

    // The evicted resident cannot fit in swap and is terminated
    assert!(core.admit(ProcessSpec::new("victim", 2, 600).with_class(ProcessClass::Background)));
    assert!(core.admit(
        ProcessSpec::new("winner", 1, 600)
            .with_class(ProcessClass::System)
            .with_priority(50)
    ));
    run_until_idle(&mut core, &clock);

    let snapshot = core.snapshot();
    assert_eq!(snapshot.completed_processes.len(), 2);
    metrics.record(&snapshot);
    assert_eq!(metrics.completed(), 1);
    assert_eq!(metrics.report(60_000).unwrap().avg_tat, 1.0);
}

#[test]
fn test_report_serializes_camel_case() {
    let mut metrics = MetricAggregator::new(0);
    let clock = Arc::new(ManualClock::new(0));
    let mut core = engine(clock.clone());
    assert!(core.admit(ProcessSpec::new("p", 1, 10)));
    run_until_idle(&mut core, &clock);
    metrics.record(&core.snapshot());

    let json = serde_json::to_value(metrics.report(30_000).unwrap()).unwrap();
    assert_eq!(json["avgTat"], 1.0);
    assert_eq!(json["throughput"], 2.0);
    assert!(json.get("starvationTime").is_some());
    assert!(json.get("avgIoWait").is_some());
}
