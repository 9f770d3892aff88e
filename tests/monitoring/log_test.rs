/*!
 * Event Log Tests
 * Domain events recorded by an injected log buffer
 */

use pretty_assertions::assert_eq;
use resalloc::{
    LogBuffer, LogLevel, ManualClock, ProcessClass, ProcessSpec, SchedulerConfig, SchedulerCore,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn engine_with_log() -> (SchedulerCore, Arc<LogBuffer>) {
    let clock = Arc::new(ManualClock::new(0));
    let log = Arc::new(LogBuffer::new(clock.clone()));
    let core = SchedulerCore::new(
        SchedulerConfig::with_capacity(1000, 500),
        clock,
        log.clone(),
    )
    .unwrap();
    (core, log)
}

#[test]
fn test_admission_events_are_logged() {
    let (mut core, log) = engine_with_log();

    assert!(core.admit(ProcessSpec::new("resident", 5, 600)));
    assert!(!core.admit(ProcessSpec::new("rejected", 5, 600)));

    let entries = log.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].level, LogLevel::Info);
    assert!(entries[0].message.contains("resident"));
    assert_eq!(entries[1].level, LogLevel::Error);
    assert!(entries[1].message.contains("rejected"));
    assert_eq!(entries[0].timestamp, "00:00:00");
    assert!(entries[0].id < entries[1].id);
}

#[test]
fn test_eviction_logs_termination() {
    let (mut core, log) = engine_with_log();
    let errors = Arc::new(AtomicUsize::new(0));
    {
        let errors = Arc::clone(&errors);
        log.on_log(move |entry| {
            if entry.level == LogLevel::Error {
                errors.fetch_add(1, Ordering::SeqCst);
            }
        });
    }

    assert!(core.admit(ProcessSpec::new("low", 5, 600).with_class(ProcessClass::Background)));
    assert!(core.admit(
        ProcessSpec::new("high", 5, 600)
            .with_class(ProcessClass::System)
            .with_priority(10)
    ));

    assert_eq!(errors.load(Ordering::SeqCst), 1);
    assert!(log
        .entries()
        .iter()
        .any(|e| e.message.contains("Terminated low")));
}
