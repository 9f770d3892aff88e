/*!
 * Priority Queue
 * Resident or swapped processes kept in non-increasing priority order
 */

use crate::core::types::{Megabytes, Pid};
use crate::process::{Process, ProcessInfo};
use std::collections::VecDeque;

/// Queue of processes ordered by priority, highest first
///
/// Equal priorities keep arrival order. Memory usage is always recomputed
/// from contents, never patched incrementally.
#[derive(Debug, Default, Clone)]
pub struct ProcessQueue {
    items: VecDeque<Process>,
}

impl ProcessQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.items.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Process> {
        self.items.iter_mut()
    }

    /// Sum of memory needs of every queued process
    pub fn memory(&self) -> Megabytes {
        self.items.iter().map(|p| p.mem_need).sum()
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.items.iter().any(|p| p.id == pid)
    }

    /// Insert before the first strictly lower priority entry
    pub(crate) fn insert(&mut self, process: Process) {
        let pos = self
            .items
            .iter()
            .position(|p| p.priority < process.priority)
            .unwrap_or(self.items.len());
        self.items.insert(pos, process);
    }

    /// Remove the highest-priority process
    pub(crate) fn pop_front(&mut self) -> Option<Process> {
        self.items.pop_front()
    }

    /// Greedy tail scan for reclaimable memory
    ///
    /// Walks from the lowest-priority end, accumulating memory of entries whose
    /// class-weighted priority is strictly below `weighted`, and stops at the
    /// first entry that is not, or once `need` is covered. Returns how many
    /// tail entries must be evicted, or `None` if `need` cannot be met.
    pub(crate) fn reclaimable_tail(&self, weighted: i64, need: Megabytes) -> Option<usize> {
        let mut reclaimed: Megabytes = 0;
        let mut count = 0;

        for candidate in self.items.iter().rev() {
            if candidate.weighted_priority() >= weighted {
                break;
            }
            reclaimed += candidate.mem_need;
            count += 1;
            if reclaimed >= need {
                return Some(count);
            }
        }

        None
    }

    /// Remove `count` entries from the tail, lowest priority first
    pub(crate) fn take_tail(&mut self, count: usize) -> Vec<Process> {
        let keep = self.items.len().saturating_sub(count);
        let mut tail: Vec<Process> = self.items.drain(keep..).collect();
        tail.reverse();
        tail
    }

    /// Remove the longest head prefix whose total memory fits in `budget`
    pub(crate) fn take_prefix_within(&mut self, budget: Megabytes) -> Vec<Process> {
        let mut used: Megabytes = 0;
        let mut count = 0;

        for p in self.items.iter() {
            if used + p.mem_need > budget {
                break;
            }
            used += p.mem_need;
            count += 1;
        }

        self.items.drain(..count).collect()
    }

    /// Restore non-increasing priority order (stable)
    pub(crate) fn resort(&mut self) {
        self.items
            .make_contiguous()
            .sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// Whether the queue is in non-increasing priority order
    pub fn is_priority_ordered(&self) -> bool {
        self.items
            .iter()
            .zip(self.items.iter().skip(1))
            .all(|(a, b)| a.priority >= b.priority)
    }

    /// Read-only projections in queue order
    pub fn infos(&self) -> Vec<ProcessInfo> {
        self.items.iter().map(Process::info).collect()
    }
}
