/*!
 * Execution Driver Tests
 * Async scheduler handle under paused tokio time
 */

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use resalloc::{ProcessClass, ProcessSpec, ProcessStatus, Scheduler, SchedulerConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn seeded(max_memory: i64, max_swap: i64) -> Scheduler {
    let mut config = SchedulerConfig::with_capacity(max_memory, max_swap);
    config.seed = Some(7);
    Scheduler::builder().with_config(config).spawn().unwrap()
}

fn done_of(scheduler: &Scheduler, pid: u64) -> u64 {
    scheduler.with_core(|core| core.find(pid).map(|p| p.done).unwrap_or(0))
}

#[tokio::test(start_paused = true)]
async fn test_invalid_capacity_fails_to_start() {
    assert!(Scheduler::new(0, 0).is_err());
    assert!(Scheduler::new(100, 200).is_err());
}

#[tokio::test(start_paused = true)]
async fn test_pause_freezes_progress() {
    let scheduler = seeded(1000, 500);

    assert!(scheduler.admit("A", 5, 600, Some(10), Some(ProcessClass::User), Some(50)));
    assert!(!scheduler.admit("B", 5, 600, Some(10), Some(ProcessClass::User), Some(40)));
    assert!(scheduler.admit("C", 5, 600, Some(10), Some(ProcessClass::System), Some(90)));

    // One tick period after admission C is on the execution unit
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    let before = done_of(&scheduler, 1);
    assert!(before >= 1);

    scheduler.set_paused(true);
    assert!(scheduler.is_paused());
    let frozen = done_of(&scheduler, 1);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(done_of(&scheduler, 1), frozen);
    assert!(scheduler.snapshot().is_paused);

    scheduler.set_paused(false);
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    let resumed = done_of(&scheduler, 1);
    assert!(resumed > frozen, "done {} did not advance past {}", resumed, frozen);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_process_runs_to_completion() {
    let scheduler = seeded(1000, 500);
    assert!(scheduler.admit("job", 3, 200, None, None, None));

    tokio::time::sleep(Duration::from_millis(4_500)).await;

    let snapshot = scheduler.snapshot();
    assert!(snapshot.running_process.is_none());
    assert!(snapshot.ready_queue.is_empty());
    assert_eq!(snapshot.memory_used, 0);
    assert_eq!(snapshot.completed_processes.len(), 1);
    let job = &snapshot.completed_processes[0];
    assert_eq!(job.status, ProcessStatus::Completed);
    assert_eq!(job.done, 3);
    assert!(job.ended_at.is_some());

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_speed_shortens_ticks() {
    let scheduler = seeded(1000, 500);
    assert_eq!(scheduler.set_simulation_speed(5.0), 5.0);
    assert_eq!(scheduler.set_simulation_speed(50.0), 5.0);

    assert!(scheduler.submit(ProcessSpec::new("fast", 5, 100)).is_ok());

    // Five ticks at 200ms each
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    let snapshot = scheduler.snapshot();
    assert_eq!(snapshot.simulation_speed, 5.0);
    assert_eq!(snapshot.completed_processes.len(), 1);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_cadence_and_unsubscribe() {
    let scheduler = seeded(1000, 500);
    let count = Arc::new(AtomicUsize::new(0));
    let last = Arc::new(Mutex::new(None));

    {
        let count = Arc::clone(&count);
        let last = Arc::clone(&last);
        scheduler.subscribe(move |snapshot| {
            count.fetch_add(1, Ordering::SeqCst);
            *last.lock() = Some(snapshot);
        });
    }
    assert!(scheduler.admit("watched", 9, 250, Some(40), None, Some(5)));

    // Published every 500ms regardless of speed
    tokio::time::sleep(Duration::from_millis(2_600)).await;
    let published = count.load(Ordering::SeqCst);
    assert!((5..=6).contains(&published), "published {}", published);

    let snapshot = last.lock().clone().unwrap();
    assert_eq!(snapshot.max_memory, 1000);
    assert_eq!(snapshot.max_swap, 500);
    assert_eq!(snapshot.memory_used, 250);

    scheduler.unsubscribe();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(count.load(Ordering::SeqCst), published);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_callback_can_unsubscribe_itself() {
    let scheduler = Arc::new(seeded(1000, 500));
    let count = Arc::new(AtomicUsize::new(0));

    {
        let count = Arc::clone(&count);
        let handle = Arc::downgrade(&scheduler);
        scheduler.subscribe(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
            if let Some(scheduler) = handle.upgrade() {
                scheduler.unsubscribe();
            }
        });
    }
    assert!(scheduler.admit("job", 3, 200, None, None, None));

    tokio::time::sleep(Duration::from_millis(4_500)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);

    // Publisher and driver both kept running
    let snapshot = scheduler.snapshot();
    assert_eq!(snapshot.completed_processes.len(), 1);

    let scheduler = Arc::try_unwrap(scheduler).unwrap();
    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_callback_can_replace_itself() {
    let scheduler = Arc::new(seeded(1000, 500));
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    {
        let first = Arc::clone(&first);
        let second = Arc::clone(&second);
        let handle = Arc::downgrade(&scheduler);
        scheduler.subscribe(move |_| {
            first.fetch_add(1, Ordering::SeqCst);
            if let Some(scheduler) = handle.upgrade() {
                let second = Arc::clone(&second);
                scheduler.subscribe(move |_| {
                    second.fetch_add(1, Ordering::SeqCst);
                });
            }
        });
    }

    // Publishes at 0, 500, 1000, 1500ms
    tokio::time::sleep(Duration::from_millis(1_700)).await;
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 3);

    let scheduler = Arc::try_unwrap(scheduler).unwrap();
    scheduler.shutdown().await;
}
