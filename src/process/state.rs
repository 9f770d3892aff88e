/*!
 * Process State Machine
 *
 * Waiting -> Running -> {Completed | Preempted | IO}
 * IO -> Preempted -> Waiting
 * Waiting -> Terminated (forced eviction, resident or swapped)
 *
 * Completed and Terminated are terminal.
 */

use super::types::{Process, ProcessStatus};
use crate::core::errors::{ProcessError, ProcessResult};
use crate::core::types::Millis;

impl ProcessStatus {
    /// Whether `self -> next` is an edge of the state machine
    pub const fn can_transition_to(self, next: ProcessStatus) -> bool {
        use ProcessStatus::*;
        matches!(
            (self, next),
            (Waiting, Running)
                | (Waiting, Terminated)
                | (Running, Completed)
                | (Running, Preempted)
                | (Running, Io)
                | (Io, Preempted)
                | (Preempted, Waiting)
        )
    }
}

impl Process {
    /// Move to `next`, stamping the timestamps the new state implies
    pub(crate) fn transition(&mut self, next: ProcessStatus, now: Millis) -> ProcessResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(ProcessError::InvalidStateTransition {
                from: self.status,
                to: next,
            });
        }

        match next {
            ProcessStatus::Io => {
                self.io_start_time = Some(now);
            }
            ProcessStatus::Preempted if self.status == ProcessStatus::Io => {
                let started = self.io_start_time.take().unwrap_or(now);
                let waited = now.saturating_sub(started);
                self.io_time = Some(self.io_time.unwrap_or(0) + waited);
            }
            ProcessStatus::Completed | ProcessStatus::Terminated => {
                self.ended_at = Some(now);
            }
            _ => {}
        }

        self.status = next;
        Ok(())
    }
}
