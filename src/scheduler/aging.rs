/*!
 * Priority Aging
 * Starvation avoidance: waiting processes gain class-weighted priority
 */

use super::engine::SchedulerCore;
use super::queue::ProcessQueue;
use crate::core::types::{Millis, Priority};

/// Age every process in `queue`, then restore priority order
///
/// `priority += floor((now - updated_at) / interval) * class_weight`, with
/// `updated_at` reset to `now`. A ceiling caps growth but never lowers a
/// priority that is already above it.
pub(crate) fn age_queue(
    queue: &mut ProcessQueue,
    now: Millis,
    interval_ms: u64,
    ceiling: Option<Priority>,
) {
    for process in queue.iter_mut() {
        let waited = now.saturating_sub(process.updated_at);
        process.updated_at = now;

        let steps = (waited / interval_ms) as i64;
        if steps == 0 {
            continue;
        }

        let boosted = process
            .priority
            .saturating_add(steps.saturating_mul(process.class.weight()));
        process.priority = match ceiling {
            Some(cap) if process.priority >= cap => process.priority,
            Some(cap) => boosted.min(cap),
            None => boosted,
        };
    }

    queue.resort();
}

impl SchedulerCore {
    /// Age the ready queue (after every execution slice)
    pub(crate) fn age_ready(&mut self) {
        let now = self.clock.now();
        age_queue(
            &mut self.ready,
            now,
            self.config.aging_interval_ms,
            self.config.priority_ceiling,
        );
    }

    /// Age the swap queue (before every swap-in attempt)
    pub(crate) fn age_swap(&mut self) {
        let now = self.clock.now();
        age_queue(
            &mut self.swap,
            now,
            self.config.aging_interval_ms,
            self.config.priority_ceiling,
        );
    }
}
