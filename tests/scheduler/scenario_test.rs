/*!
 * Scheduler Scenario Tests
 * Admission, eviction, swap and completion on a single-stepped engine
 */

use pretty_assertions::assert_eq;
use resalloc::monitoring::NullLog;
use resalloc::{
    ManualClock, Placement, ProcessClass, ProcessSpec, ProcessStatus, SchedulerConfig,
    SchedulerCore, StepOutcome,
};
use std::sync::Arc;
use std::time::Duration;

fn engine(clock: Arc<ManualClock>, quantum: u32) -> SchedulerCore {
    let mut config = SchedulerConfig::with_capacity(1000, 500);
    config.quantum_min = quantum;
    config.quantum_max = quantum;
    config.seed = Some(42);
    SchedulerCore::new(config, clock, Arc::new(NullLog)).unwrap()
}

fn request(name: &str, mem: u64, class: ProcessClass, priority: i64) -> ProcessSpec {
    ProcessSpec::new(name, 5, mem)
        .with_cpu_demand(10)
        .with_class(class)
        .with_priority(priority)
}

#[test]
fn test_admission_eviction_sequence() {
    let clock = Arc::new(ManualClock::new(0));
    let mut core = engine(clock, 5);

    // Fits outright
    assert!(core.admit(request("A", 600, ProcessClass::User, 50)));
    assert_eq!(core.memory_used(), 600);

    // 600 + 600 > 1000, 600 > swap, A is not lower weighted (80 < 100)
    assert!(!core.admit(request("B", 600, ProcessClass::User, 40)));
    assert_eq!(core.memory_used(), 600);
    assert_eq!(core.swap_used(), 0);

    // A: 50 * 2 = 100 < 90 * 3 = 270; A cannot fit in swap either
    let admission = core
        .submit(request("C", 600, ProcessClass::System, 90))
        .unwrap();
    assert_eq!(admission.placement, Placement::Ready);
    assert_eq!(admission.pid, 1);
    assert_eq!(admission.terminated, vec![0]);
    assert!(admission.swapped_out.is_empty());

    assert_eq!(core.memory_used(), 600);
    assert_eq!(core.swap_used(), 0);
    let a = core.find(0).unwrap();
    assert_eq!(a.status, ProcessStatus::Terminated);
    assert!(a.ended_at.is_some());
    assert_eq!(core.archive().len(), 1);
    core.check_invariants().unwrap();
}

#[test]
fn test_completion_archives_once_and_swaps_in() {
    let clock = Arc::new(ManualClock::new(0));
    let mut core = engine(clock.clone(), 5);

    assert!(core.admit(
        ProcessSpec::new("A", 2, 900)
            .with_class(ProcessClass::System)
            .with_priority(99)
    ));
    let swapped = core
        .submit(request("B", 300, ProcessClass::User, 10))
        .unwrap();
    assert_eq!(swapped.placement, Placement::Swap);

    clock.advance(Duration::from_millis(1_000));
    assert_eq!(core.step(), StepOutcome::Ticked { pid: 0, done: 1 });
    clock.advance(Duration::from_millis(1_000));
    assert_eq!(
        core.step(),
        StepOutcome::Completed {
            pid: 0,
            swapped_in: vec![1]
        }
    );

    assert!(core.running().is_none());
    let archived: Vec<_> = core.archive().iter().filter(|p| p.id() == 0).collect();
    assert_eq!(archived.len(), 1);
    let a = core.find(0).unwrap();
    assert_eq!(a.status, ProcessStatus::Completed);
    assert_eq!(a.done, a.cpu_time);
    assert_eq!(a.ended_at, Some(2_000));

    assert_eq!(core.swap_used(), 0);
    assert_eq!(core.memory_used(), 300);
    assert!(core.ready_queue().contains(1));
    core.check_invariants().unwrap();
}

#[test]
fn test_swap_in_stops_at_first_misfit() {
    let clock = Arc::new(ManualClock::new(0));
    let mut core = engine(clock, 5);

    let system = |name: &str, cpu: u64, mem: u64, priority: i64| {
        ProcessSpec::new(name, cpu, mem)
            .with_class(ProcessClass::System)
            .with_priority(priority)
    };
    assert!(core.admit(system("hog", 1, 400, 99)));
    assert!(core.admit(system("resident", 5, 600, 98)));

    // Main memory is full and both residents outrank every newcomer
    for (name, mem, priority) in [("a", 200, 60), ("b", 250, 30), ("c", 50, 20)] {
        let admission = core
            .submit(request(name, mem, ProcessClass::User, priority))
            .unwrap();
        assert_eq!(admission.placement, Placement::Swap);
    }
    assert_eq!(core.swap_used(), 500);

    // Free budget is 400: a (200) fits, b (250) does not; c is never considered
    assert_eq!(
        core.step(),
        StepOutcome::Completed {
            pid: 0,
            swapped_in: vec![2]
        }
    );
    assert_eq!(core.memory_used(), 800);
    assert_eq!(core.swap_used(), 300);
    assert!(core.swap_queue().contains(4));
    core.check_invariants().unwrap();
}

#[test]
fn test_swap_aging_reorders_before_swap_in() {
    let clock = Arc::new(ManualClock::new(0));
    let mut core = engine(clock.clone(), 5);

    let system = |name: &str, cpu: u64, mem: u64, priority: i64| {
        ProcessSpec::new(name, cpu, mem)
            .with_class(ProcessClass::System)
            .with_priority(priority)
    };
    assert!(core.admit(system("hog", 1, 400, 99)));
    assert!(core.admit(system("resident", 5, 600, 98)));

    // Swap order by raw priority: bg (14) ahead of sys (13)
    let bg = core
        .submit(request("bg", 250, ProcessClass::Background, 14))
        .unwrap();
    let sys = core
        .submit(request("sys", 250, ProcessClass::System, 13))
        .unwrap();
    assert_eq!(bg.placement, Placement::Swap);
    assert_eq!(sys.placement, Placement::Swap);
    let order: Vec<_> = core.swap_queue().iter().map(|p| p.id()).collect();
    assert_eq!(order, vec![2, 3]);

    // 5s in swap: bg 14 + 1 = 15, sys 13 + 3 = 16; budget 400 takes one
    clock.advance(Duration::from_millis(5_000));
    assert_eq!(
        core.step(),
        StepOutcome::Completed {
            pid: 0,
            swapped_in: vec![3]
        }
    );

    let left: Vec<_> = core
        .swap_queue()
        .iter()
        .map(|p| (p.id(), p.priority()))
        .collect();
    assert_eq!(left, vec![(2, 15)]);
    assert!(core.ready_queue().contains(3));
    assert_eq!(core.memory_used(), 850);
    assert_eq!(core.swap_used(), 250);
    core.check_invariants().unwrap();
}

#[test]
fn test_eviction_to_swap_terminates_swap_resident() {
    let clock = Arc::new(ManualClock::new(0));
    let mut core = engine(clock, 5);

    assert!(core.admit(request("big", 600, ProcessClass::System, 99)));
    assert!(core.admit(request("victim", 400, ProcessClass::User, 10)));

    // victim (20) outranks low (1), so low goes to swap
    let low = core
        .submit(request("low", 400, ProcessClass::Background, 1))
        .unwrap();
    assert_eq!(low.placement, Placement::Swap);
    assert_eq!(core.swap_used(), 400);

    // victim (20) < 60 leaves main memory; 400 + 400 > 500 so low (1) dies
    let admission = core
        .submit(request("incoming", 400, ProcessClass::System, 20))
        .unwrap();
    assert_eq!(admission.pid, 3);
    assert_eq!(admission.placement, Placement::Ready);
    assert_eq!(admission.swapped_out, vec![1]);
    assert_eq!(admission.terminated, vec![2]);

    assert_eq!(core.memory_used(), 1000);
    assert_eq!(core.swap_used(), 400);
    assert!(core.swap_queue().contains(1));
    assert_eq!(core.find(1).unwrap().status, ProcessStatus::Waiting);
    assert_eq!(core.find(2).unwrap().status, ProcessStatus::Terminated);

    let archived: Vec<_> = core.archive().iter().map(|p| p.id()).collect();
    assert_eq!(archived, vec![2]);
    core.check_invariants().unwrap();
}

#[test]
fn test_aging_promotes_waiting_process() {
    let clock = Arc::new(ManualClock::new(0));
    let mut core = engine(clock.clone(), 1);

    assert!(core.admit(request("sys", 100, ProcessClass::System, 20)));
    assert!(core.admit(request("usr", 100, ProcessClass::User, 19)));

    // sys runs one tick; slice ends after 10s, usr waited 10s -> +2 * 2
    clock.advance(Duration::from_millis(10_000));
    assert_eq!(core.step(), StepOutcome::Preempted { pid: 0 });

    let order: Vec<_> = core
        .ready_queue()
        .iter()
        .map(|p| (p.id(), p.priority()))
        .collect();
    // sys also waited since admission: 20 + 2 * 3
    assert_eq!(order, vec![(0, 26), (1, 23)]);
}

#[test]
fn test_priority_ceiling_caps_aging() {
    let clock = Arc::new(ManualClock::new(0));
    let mut config = SchedulerConfig::with_capacity(1000, 500);
    config.quantum_min = 1;
    config.quantum_max = 1;
    config.priority_ceiling = Some(25);
    let mut core = SchedulerCore::new(config, clock.clone(), Arc::new(NullLog)).unwrap();

    assert!(core.admit(request("high", 100, ProcessClass::User, 40)));
    assert!(core.admit(request("low", 100, ProcessClass::System, 20)));

    clock.advance(Duration::from_millis(60_000));
    assert_eq!(core.step(), StepOutcome::Preempted { pid: 0 });

    let priorities: Vec<_> = core.ready_queue().iter().map(|p| p.priority()).collect();
    // Already above the ceiling: unchanged; below: capped
    assert_eq!(priorities, vec![40, 25]);
}

#[test]
fn test_zero_and_negative_capacity_rejected() {
    let clock = Arc::new(ManualClock::new(0));
    for (memory, swap) in [(0, 100), (-1, 0), (1000, -1), (500, 600)] {
        let config = SchedulerConfig::with_capacity(memory, swap);
        assert!(
            SchedulerCore::new(config, clock.clone(), Arc::new(NullLog)).is_err(),
            "({}, {}) accepted",
            memory,
            swap
        );
    }
}
