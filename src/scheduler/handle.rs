/*!
 * Scheduler Handle
 *
 * Thread-safe front of the engine. Every mutation and every snapshot goes
 * through one exclusive lock around [`SchedulerCore`], so admissions,
 * evictions, ticks and aging form a single serialized sequence and readers
 * never observe a half-applied change.
 *
 * Owns two background tasks:
 * - the execution driver, which steps the core once per tick and sleeps
 *   `base_tick / speed` between ticks (`idle_wait` when idle or paused)
 * - the snapshot publisher, on a fixed period independent of speed
 */

use super::config::SchedulerConfig;
use super::engine::{Admission, SchedulerCore};
use super::execution::StepOutcome;
use super::snapshot::{spawn_publisher, Snapshot, SubscriberSlot, Subscription};
use crate::core::clock::{Clock, SystemClock};
use crate::core::errors::{AdmissionResult, ConfigResult};
use crate::core::task::BackgroundTask;
use crate::core::types::Priority;
use crate::monitoring::log::{EventLog, TracingLog};
use crate::process::{ProcessClass, ProcessSpec};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::info;

/// Builder for [`Scheduler`]
#[derive(Debug, Default)]
pub struct SchedulerBuilder {
    config: Option<SchedulerConfig>,
    clock: Option<Arc<dyn Clock>>,
    log: Option<Arc<dyn EventLog>>,
}

impl SchedulerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Shorthand for a default config with the given capacities
    pub fn with_capacity(self, max_memory: i64, max_swap: i64) -> Self {
        self.with_config(SchedulerConfig::with_capacity(max_memory, max_swap))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_event_log(mut self, log: Arc<dyn EventLog>) -> Self {
        self.log = Some(log);
        self
    }

    /// Build the engine without starting any task
    pub fn build_core(self) -> ConfigResult<SchedulerCore> {
        let config = self.config.unwrap_or_default();
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let log = self.log.unwrap_or_else(|| Arc::new(TracingLog));
        SchedulerCore::new(config, clock, log)
    }

    /// Build and start the execution driver and snapshot publisher
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self) -> ConfigResult<Scheduler> {
        let core = self.build_core()?;
        Ok(Scheduler::start(core))
    }
}

/// Running scheduler
pub struct Scheduler {
    core: Arc<Mutex<SchedulerCore>>,
    wake: Arc<Notify>,
    subscriber: SubscriberSlot,
    driver: BackgroundTask,
    publisher: BackgroundTask,
}

impl Scheduler {
    /// Start a scheduler with default policy and the given capacities
    pub fn new(max_memory: i64, max_swap: i64) -> ConfigResult<Self> {
        Self::builder().with_capacity(max_memory, max_swap).spawn()
    }

    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    fn start(core: SchedulerCore) -> Self {
        let snapshot_period = core.config().snapshot_interval();
        info!(
            max_memory = core.max_memory(),
            max_swap = core.max_swap(),
            "Scheduler starting"
        );

        let core = Arc::new(Mutex::new(core));
        let wake = Arc::new(Notify::new());
        let subscriber: SubscriberSlot = Arc::new(Mutex::new(Subscription::default()));

        let driver = spawn_driver(Arc::clone(&core), Arc::clone(&wake));
        let publisher = spawn_publisher(Arc::clone(&core), Arc::clone(&subscriber), snapshot_period);

        Self {
            core,
            wake,
            subscriber,
            driver,
            publisher,
        }
    }

    /// Admit a process; `false` when memory and swap are exhausted
    pub fn admit(
        &self,
        name: impl Into<String>,
        cpu_time: u64,
        mem_need: u64,
        cpu_demand: Option<i64>,
        class: Option<ProcessClass>,
        priority: Option<Priority>,
    ) -> bool {
        let mut spec = ProcessSpec::new(name, cpu_time, mem_need);
        if let Some(d) = cpu_demand {
            spec = spec.with_cpu_demand(d);
        }
        if let Some(c) = class {
            spec = spec.with_class(c);
        }
        if let Some(p) = priority {
            spec = spec.with_priority(p);
        }
        self.submit(spec).is_ok()
    }

    /// Admit a process with a typed outcome
    pub fn submit(&self, spec: ProcessSpec) -> AdmissionResult<Admission> {
        let result = self.core.lock().submit(spec);
        if result.is_ok() {
            self.wake.notify_one();
        }
        result
    }

    pub fn set_paused(&self, paused: bool) {
        self.core.lock().set_paused(paused);
        if !paused {
            self.wake.notify_one();
        }
    }

    /// Returns the applied (clamped) speed
    pub fn set_simulation_speed(&self, speed: f64) -> f64 {
        self.core.lock().set_simulation_speed(speed)
    }

    pub fn is_paused(&self) -> bool {
        self.core.lock().is_paused()
    }

    /// Register the periodic snapshot subscriber, replacing any previous one
    pub fn subscribe<F>(&self, callback: F)
    where
        F: FnMut(Snapshot) + Send + 'static,
    {
        self.subscriber.lock().replace(Some(Box::new(callback)));
    }

    pub fn unsubscribe(&self) {
        self.subscriber.lock().replace(None);
    }

    /// Snapshot on demand
    pub fn snapshot(&self) -> Snapshot {
        self.core.lock().snapshot()
    }

    /// Run `f` with exclusive access to the engine
    pub fn with_core<R>(&self, f: impl FnOnce(&mut SchedulerCore) -> R) -> R {
        f(&mut self.core.lock())
    }

    /// Stop both tasks and wait for them
    pub async fn shutdown(self) {
        info!("Scheduler shutting down");
        self.driver.shutdown().await;
        self.publisher.shutdown().await;
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("core", &self.core)
            .field("has_subscriber", &self.subscriber.lock().is_active())
            .field("driver", &self.driver)
            .field("publisher", &self.publisher)
            .finish()
    }
}

/// Time to wait after a step before the next one
fn pause_after(outcome: &StepOutcome, core: &SchedulerCore) -> (Duration, bool) {
    match outcome {
        StepOutcome::Paused | StepOutcome::Idle => (core.config().idle_wait(), true),
        _ if core.has_work() => (core.tick_duration(), false),
        _ => (core.config().idle_wait(), true),
    }
}

fn spawn_driver(core: Arc<Mutex<SchedulerCore>>, wake: Arc<Notify>) -> BackgroundTask {
    BackgroundTask::spawn("execution-driver", move |mut shutdown| async move {
        info!("Execution loop started");

        // A tick is only taken after a full tick period of waiting
        let mut wait = {
            let guard = core.lock();
            if guard.has_work() && !guard.is_paused() {
                (guard.tick_duration(), false)
            } else {
                (guard.config().idle_wait(), true)
            }
        };

        loop {
            let (duration, wakeable) = wait;
            let woken = tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(duration) => false,
                _ = wake.notified(), if wakeable => true,
            };

            wait = {
                let mut guard = core.lock();
                if woken {
                    // New work or resume: wait one full tick before progressing
                    if guard.has_work() && !guard.is_paused() {
                        (guard.tick_duration(), false)
                    } else {
                        (guard.config().idle_wait(), true)
                    }
                } else {
                    let outcome = guard.step();
                    pause_after(&outcome, &guard)
                }
            };
        }

        info!("Execution loop stopped");
    })
}
