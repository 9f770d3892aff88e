/*!
 * Process Archive
 * Bounded trailing history of Completed and Terminated processes
 */

use crate::process::{Process, ProcessInfo};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct Archive {
    entries: VecDeque<Process>,
    capacity: usize,
    total: u64,
}

impl Archive {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            total: 0,
        }
    }

    /// Append a terminal process, dropping the oldest entry when full
    pub(crate) fn push(&mut self, process: Process) {
        debug_assert!(process.status.is_terminal());
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(process);
        self.total += 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Processes archived since start, including ones already dropped
    pub fn total_archived(&self) -> u64 {
        self.total
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.entries.iter()
    }

    /// Oldest-first projections
    pub fn infos(&self) -> Vec<ProcessInfo> {
        self.entries.iter().map(Process::info).collect()
    }
}
