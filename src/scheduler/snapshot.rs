/*!
 * Snapshots
 * Immutable, fully materialized views of engine state and the periodic
 * publisher that delivers them to a single subscriber
 */

use super::engine::SchedulerCore;
use crate::core::task::BackgroundTask;
use crate::core::types::{Megabytes, Millis};
use crate::process::ProcessInfo;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Consistent projection of the engine at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub taken_at: Millis,
    pub ready_queue: Vec<ProcessInfo>,
    pub swapped_queue: Vec<ProcessInfo>,
    pub running_process: Option<ProcessInfo>,
    /// Oldest first, at most the archive capacity
    pub completed_processes: Vec<ProcessInfo>,
    pub memory_used: Megabytes,
    pub swap_used: Megabytes,
    pub max_memory: Megabytes,
    pub max_swap: Megabytes,
    pub is_paused: bool,
    pub simulation_speed: f64,
}

impl Snapshot {
    /// CPU demand of the running process, 0 when idle
    pub fn cpu_used(&self) -> u8 {
        self.running_process.as_ref().map_or(0, |p| p.cpu_demand)
    }
}

impl SchedulerCore {
    /// Materialize a snapshot
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            taken_at: self.clock.now(),
            ready_queue: self.ready.infos(),
            swapped_queue: self.swap.infos(),
            running_process: self.running(),
            completed_processes: self.archive.infos(),
            memory_used: self.memory_used(),
            swap_used: self.swap_used(),
            max_memory: self.max_memory,
            max_swap: self.max_swap,
            is_paused: self.paused,
            simulation_speed: self.speed,
        }
    }
}

/// Snapshot consumer callback
pub type SnapshotCallback = Box<dyn FnMut(Snapshot) + Send>;

/// Registered subscriber plus a generation bumped on every (un)subscribe
#[derive(Default)]
pub(crate) struct Subscription {
    callback: Option<SnapshotCallback>,
    generation: u64,
}

impl Subscription {
    /// Install or clear the subscriber
    pub(crate) fn replace(&mut self, callback: Option<SnapshotCallback>) {
        self.callback = callback;
        self.generation = self.generation.wrapping_add(1);
    }

    pub(crate) fn is_active(&self) -> bool {
        self.callback.is_some()
    }
}

/// Single-subscriber slot shared with the publisher task
pub(crate) type SubscriberSlot = Arc<Mutex<Subscription>>;

/// Spawn the fixed-period publisher
///
/// The callback is taken out of the slot and invoked with no lock held, so
/// it may call `subscribe`/`unsubscribe` itself. It is put back afterwards
/// only if no (un)subscribe happened in the meantime. The snapshot is taken
/// under the engine lock and delivered after it is released.
pub(crate) fn spawn_publisher(
    core: Arc<Mutex<SchedulerCore>>,
    subscriber: SubscriberSlot,
    period: Duration,
) -> BackgroundTask {
    BackgroundTask::spawn("snapshot-publisher", move |mut shutdown| async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_ms = period.as_millis() as u64, "Snapshot publisher started");

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    let taken = {
                        let mut slot = subscriber.lock();
                        let generation = slot.generation;
                        slot.callback.take().map(|callback| (callback, generation))
                    };
                    let Some((mut callback, generation)) = taken else {
                        continue;
                    };

                    let snapshot = core.lock().snapshot();
                    callback(snapshot);

                    let mut slot = subscriber.lock();
                    if slot.generation == generation {
                        slot.callback = Some(callback);
                    }
                }
            }
        }

        info!("Snapshot publisher stopped");
    })
}
