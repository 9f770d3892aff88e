/*!
 * Execution Step
 *
 * One call to [`SchedulerCore::step`] is one compute tick of the single
 * execution unit. Timing lives in the caller: the async driver sleeps
 * `tick_duration()` between steps, a test harness just calls `step()`.
 *
 * Slice lifecycle:
 * - No running process: pop the ready head, mark Running, draw a quantum
 * - Each tick: `done += 1`; completion archives the process and triggers
 *   swap-in reclamation; reaching the quantum preempts and re-queues it
 * - Optional I/O: a tick may block the process for a few ticks; it keeps the
 *   execution unit, then is preempted and re-queued
 * - Every slice end (completion, preemption, I/O return) ages the ready queue
 */

use super::engine::{RunningSlot, SchedulerCore};
use crate::core::types::Pid;
use crate::process::ProcessStatus;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Result of a single step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Paused: nothing advanced
    Paused,
    /// No running process and an empty ready queue
    Idle,
    /// Progress made, slice continues
    Ticked { pid: Pid, done: u64 },
    /// Quantum exhausted; process re-queued
    Preempted { pid: Pid },
    /// Process finished; `swapped_in` were promoted from swap
    Completed { pid: Pid, swapped_in: Vec<Pid> },
    /// Process blocked on I/O
    IoStarted { pid: Pid },
    /// Process still blocked on I/O
    IoWaiting { pid: Pid },
    /// I/O finished; process re-queued
    IoFinished { pid: Pid },
}

impl StepOutcome {
    /// Whether this step ended the current slice
    pub fn ends_slice(&self) -> bool {
        matches!(
            self,
            Self::Preempted { .. } | Self::Completed { .. } | Self::IoFinished { .. }
        )
    }
}

impl SchedulerCore {
    /// Advance the execution unit by one tick
    pub fn step(&mut self) -> StepOutcome {
        if self.paused {
            return StepOutcome::Paused;
        }

        let mut slot = match self.running.take() {
            Some(slot) => slot,
            None => match self.dispatch() {
                Some(slot) => slot,
                None => return StepOutcome::Idle,
            },
        };
        let pid = slot.process.id;
        let now = self.clock.now();

        // Blocked on I/O: the unit is held, no progress
        if let Some(left) = slot.io_ticks_left {
            if left > 1 {
                slot.io_ticks_left = Some(left - 1);
                self.running = Some(slot);
                return StepOutcome::IoWaiting { pid };
            }

            let mut process = slot.process;
            self.set_status(&mut process, ProcessStatus::Preempted, now);
            self.set_status(&mut process, ProcessStatus::Waiting, now);
            self.log.info(format!(
                "{} (PID {}) returned from I/O",
                process.name, pid
            ));
            self.ready.insert(process);
            self.age_ready();
            return StepOutcome::IoFinished { pid };
        }

        slot.process.done += 1;
        slot.ticks_run += 1;
        trace!(pid, done = slot.process.done, tick = slot.ticks_run, "tick");

        if slot.process.is_finished() {
            let mut process = slot.process;
            self.set_status(&mut process, ProcessStatus::Completed, now);
            self.log.success(format!(
                "{} (PID {}) completed",
                process.name, pid
            ));
            self.archive.push(process);
            let swapped_in = self.swap_in();
            self.age_ready();
            return StepOutcome::Completed { pid, swapped_in };
        }

        let io_probability = self.config.io_probability;
        if io_probability > 0.0 && self.rng.gen_bool(io_probability) {
            let io_ticks = self.rng.gen_range(1..=self.config.io_ticks_max);
            self.set_status(&mut slot.process, ProcessStatus::Io, now);
            self.log.info(format!(
                "{} (PID {}) waiting on I/O for {} ticks",
                slot.process.name, pid, io_ticks
            ));
            slot.io_ticks_left = Some(io_ticks);
            self.running = Some(slot);
            return StepOutcome::IoStarted { pid };
        }

        if slot.ticks_run >= slot.quantum {
            let mut process = slot.process;
            self.set_status(&mut process, ProcessStatus::Preempted, now);
            self.set_status(&mut process, ProcessStatus::Waiting, now);
            self.ready.insert(process);
            self.age_ready();
            return StepOutcome::Preempted { pid };
        }

        let done = slot.process.done;
        self.running = Some(slot);
        StepOutcome::Ticked { pid, done }
    }

    /// Pop the highest-priority ready process into the execution unit
    fn dispatch(&mut self) -> Option<RunningSlot> {
        let mut process = self.ready.pop_front()?;
        let now = self.clock.now();
        self.set_status(&mut process, ProcessStatus::Running, now);

        let quantum = self
            .rng
            .gen_range(self.config.quantum_min..=self.config.quantum_max);
        trace!(pid = process.id, quantum, "dispatch");

        Some(RunningSlot {
            process,
            quantum,
            ticks_run: 0,
            io_ticks_left: None,
        })
    }

    /// Promote the longest priority-ordered swap prefix that fits in main memory
    pub(crate) fn swap_in(&mut self) -> Vec<Pid> {
        self.age_swap();

        let budget = self.max_memory.saturating_sub(self.memory_used());
        let promoted = self.swap.take_prefix_within(budget);

        let mut ids = Vec::with_capacity(promoted.len());
        for process in promoted {
            self.log.info(format!(
                "Swapped in {} (PID {}) to main memory",
                process.name, process.id
            ));
            ids.push(process.id);
            self.ready.insert(process);
        }
        ids
    }
}
