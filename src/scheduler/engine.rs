/*!
 * Scheduler Engine
 *
 * Deterministic core: owns both queues, the running slot and the archive,
 * and implements admission, class-weighted eviction and swap admission.
 * Time comes from an injected [`Clock`] and randomness from a seedable RNG,
 * so a test harness can single-step it without a runtime.
 *
 * The core is not synchronized; the async [`Scheduler`](super::Scheduler)
 * handle serializes every call under one lock.
 */

use super::archive::Archive;
use super::config::SchedulerConfig;
use super::queue::ProcessQueue;
use crate::core::clock::Clock;
use crate::core::errors::{AdmissionError, AdmissionResult, ConfigResult};
use crate::core::types::{Megabytes, Millis, Pid};
use crate::monitoring::log::EventLog;
use crate::process::{Process, ProcessInfo, ProcessSpec, ProcessStatus};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Where an admitted process landed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Ready,
    Swap,
}

/// Successful admission outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
    pub pid: Pid,
    pub placement: Placement,
    /// Ready-queue residents moved to swap to make room
    pub swapped_out: Vec<Pid>,
    /// Residents terminated to make room (ready or swap)
    pub terminated: Vec<Pid>,
}

impl Admission {
    fn new(pid: Pid, placement: Placement) -> Self {
        Self {
            pid,
            placement,
            swapped_out: Vec::new(),
            terminated: Vec::new(),
        }
    }
}

/// Process occupying the single execution unit
#[derive(Debug, Clone)]
pub(crate) struct RunningSlot {
    pub process: Process,
    pub quantum: u32,
    pub ticks_run: u32,
    /// Remaining I/O ticks while blocked
    pub io_ticks_left: Option<u32>,
}

/// Scheduler state machine
#[derive(Debug)]
pub struct SchedulerCore {
    pub(crate) config: SchedulerConfig,
    pub(crate) max_memory: Megabytes,
    pub(crate) max_swap: Megabytes,
    pub(crate) ready: ProcessQueue,
    pub(crate) swap: ProcessQueue,
    pub(crate) running: Option<RunningSlot>,
    pub(crate) archive: Archive,
    pub(crate) next_pid: Pid,
    pub(crate) paused: bool,
    pub(crate) speed: f64,
    pub(crate) rng: StdRng,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) log: Arc<dyn EventLog>,
}

impl SchedulerCore {
    /// Validate `config` and build an empty engine
    pub fn new(
        config: SchedulerConfig,
        clock: Arc<dyn Clock>,
        log: Arc<dyn EventLog>,
    ) -> ConfigResult<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let speed = config.clamp_speed(config.initial_speed);

        debug!(
            max_memory = config.max_memory,
            max_swap = config.max_swap,
            speed,
            "Scheduler core initialized"
        );

        Ok(Self {
            max_memory: config.max_memory as Megabytes,
            max_swap: config.max_swap as Megabytes,
            ready: ProcessQueue::new(),
            swap: ProcessQueue::new(),
            running: None,
            archive: Archive::with_capacity(config.archive_capacity),
            next_pid: 0,
            paused: false,
            speed,
            rng,
            clock,
            log,
            config,
        })
    }

    // =========================================================================
    // Admission
    // =========================================================================

    /// Admit a process; `false` means no memory, swap or reclaimable occupant
    pub fn admit(&mut self, spec: ProcessSpec) -> bool {
        self.submit(spec).is_ok()
    }

    /// Admit a process, reporting where it landed and who was displaced
    #[tracing::instrument(level = "debug", skip(self, spec), fields(name = %spec.name, mem = spec.mem_need))]
    pub fn submit(&mut self, spec: ProcessSpec) -> AdmissionResult<Admission> {
        if spec.cpu_time == 0 || spec.mem_need == 0 {
            return Err(AdmissionError::InvalidRequest(format!(
                "'{}' needs cpu_time > 0 and mem_need > 0",
                spec.name
            )));
        }

        let now = self.clock.now();
        let process = Process::from_spec(self.next_pid, spec, now);
        let pid = process.id;
        let need = process.mem_need;

        // Fits in main memory outright
        if self.memory_used() + need <= self.max_memory {
            self.log.info(format!(
                "Admitted {} (PID {}) to main memory ({} MB)",
                process.name, pid, need
            ));
            self.ready.insert(process);
            self.next_pid += 1;
            return Ok(Admission::new(pid, Placement::Ready));
        }

        // Reclaim main memory from lower weighted-priority residents
        if let Some(count) = self
            .ready
            .reclaimable_tail(process.weighted_priority(), need)
        {
            let mut admission = Admission::new(pid, Placement::Ready);

            for victim in self.ready.take_tail(count) {
                let victim_id = victim.id;
                let victim_name = victim.name.clone();
                match self.admit_to_swap(victim) {
                    Ok(killed) => {
                        self.log.warn(format!(
                            "Preempted {} (PID {}) to swap for {} (PID {})",
                            victim_name, victim_id, process.name, pid
                        ));
                        admission.swapped_out.push(victim_id);
                        admission.terminated.extend(killed);
                    }
                    Err(victim) => {
                        self.terminate(victim, now, "no swap space after eviction");
                        admission.terminated.push(victim_id);
                    }
                }
            }

            self.log.info(format!(
                "Admitted {} (PID {}) to main memory after eviction ({} MB)",
                process.name, pid, need
            ));
            self.ready.insert(process);
            self.next_pid += 1;
            return Ok(admission);
        }

        // Fall back to swap
        let name = process.name.clone();
        match self.admit_to_swap(process) {
            Ok(killed) => {
                self.log.info(format!(
                    "Admitted {} (PID {}) to swap ({} MB)",
                    name, pid, need
                ));
                self.next_pid += 1;
                let mut admission = Admission::new(pid, Placement::Swap);
                admission.terminated = killed;
                Ok(admission)
            }
            Err(_) => {
                self.log.error(format!(
                    "Rejected {}: insufficient memory and swap ({} MB)",
                    name, need
                ));
                Err(AdmissionError::InsufficientCapacity {
                    name,
                    mem_need: need,
                })
            }
        }
    }

    /// Place a process in swap, terminating lower weighted-priority swap
    /// residents if needed. Hands the process back when it cannot fit.
    pub(crate) fn admit_to_swap(&mut self, process: Process) -> Result<Vec<Pid>, Process> {
        let need = process.mem_need;

        if self.swap_used() + need <= self.max_swap {
            self.swap.insert(process);
            return Ok(Vec::new());
        }

        let Some(count) = self
            .swap
            .reclaimable_tail(process.weighted_priority(), need)
        else {
            return Err(process);
        };

        let now = self.clock.now();
        let mut killed = Vec::with_capacity(count);
        for victim in self.swap.take_tail(count) {
            killed.push(victim.id);
            self.terminate(victim, now, "evicted from swap");
        }

        self.swap.insert(process);
        Ok(killed)
    }

    /// Terminate a waiting process and archive it
    pub(crate) fn terminate(&mut self, mut process: Process, now: Millis, reason: &str) {
        self.set_status(&mut process, ProcessStatus::Terminated, now);
        self.log.error(format!(
            "Terminated {} (PID {}): {}",
            process.name, process.id, reason
        ));
        self.archive.push(process);
    }

    /// Apply a state-machine transition; illegal edges are reported, not applied
    pub(crate) fn set_status(&self, process: &mut Process, next: ProcessStatus, now: Millis) {
        if let Err(e) = process.transition(next, now) {
            error!(pid = process.id, error = %e, "Rejected process transition");
            self.log.error(format!("PID {}: {}", process.id, e));
        }
    }

    // =========================================================================
    // Control
    // =========================================================================

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            self.paused = paused;
            self.log.info(if paused {
                "Simulation paused".to_string()
            } else {
                "Simulation resumed".to_string()
            });
        }
    }

    /// Set the speed multiplier, clamped to the configured bounds
    pub fn set_simulation_speed(&mut self, speed: f64) -> f64 {
        let clamped = self.config.clamp_speed(speed);
        if clamped != self.speed {
            self.speed = clamped;
            self.log.info(format!("Simulation speed set to {}x", clamped));
        }
        clamped
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn simulation_speed(&self) -> f64 {
        self.speed
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn max_memory(&self) -> Megabytes {
        self.max_memory
    }

    pub fn max_swap(&self) -> Megabytes {
        self.max_swap
    }

    /// Memory of the ready queue plus the running process
    pub fn memory_used(&self) -> Megabytes {
        self.ready.memory() + self.running.as_ref().map_or(0, |r| r.process.mem_need)
    }

    pub fn swap_used(&self) -> Megabytes {
        self.swap.memory()
    }

    pub fn ready_queue(&self) -> &ProcessQueue {
        &self.ready
    }

    pub fn swap_queue(&self) -> &ProcessQueue {
        &self.swap
    }

    pub fn archive(&self) -> &super::archive::Archive {
        &self.archive
    }

    pub fn running(&self) -> Option<ProcessInfo> {
        self.running.as_ref().map(|r| r.process.info())
    }

    /// Whether a tick would make progress (ignoring pause)
    pub fn has_work(&self) -> bool {
        self.running.is_some() || !self.ready.is_empty()
    }

    /// Wall-clock duration of one tick at the current speed
    pub fn tick_duration(&self) -> Duration {
        self.config.base_tick().div_f64(self.speed)
    }

    /// Look up any tracked process by id
    pub fn find(&self, pid: Pid) -> Option<ProcessInfo> {
        self.running
            .as_ref()
            .map(|r| &r.process)
            .into_iter()
            .chain(self.ready.iter())
            .chain(self.swap.iter())
            .chain(self.archive.iter())
            .find(|p| p.id == pid)
            .map(Process::info)
    }

    /// Check the structural invariants; returns the first violation
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.memory_used() > self.max_memory {
            return Err(format!(
                "memory {} exceeds {}",
                self.memory_used(),
                self.max_memory
            ));
        }
        if self.swap_used() > self.max_swap {
            return Err(format!("swap {} exceeds {}", self.swap_used(), self.max_swap));
        }
        if !self.ready.is_priority_ordered() {
            return Err("ready queue out of priority order".into());
        }
        if !self.swap.is_priority_ordered() {
            return Err("swap queue out of priority order".into());
        }
        if self.archive.len() > self.archive.capacity() {
            return Err("archive over capacity".into());
        }

        let queued = self.ready.iter().chain(self.swap.iter());
        for p in queued {
            if p.status != ProcessStatus::Waiting {
                return Err(format!("queued PID {} has status {}", p.id, p.status));
            }
        }
        let mut live = self
            .running
            .as_ref()
            .map(|r| &r.process)
            .into_iter()
            .chain(self.ready.iter())
            .chain(self.swap.iter());
        if let Some(p) = live.find(|p| p.done > p.cpu_time) {
            return Err(format!("PID {} done {} > cpu_time {}", p.id, p.done, p.cpu_time));
        }
        if let Some(r) = &self.running {
            if !matches!(r.process.status, ProcessStatus::Running | ProcessStatus::Io) {
                return Err(format!("running slot holds {}", r.process.status));
            }
        }
        if self.archive.iter().any(|p| !p.status.is_terminal()) {
            return Err("non-terminal process archived".into());
        }

        Ok(())
    }
}
