/*!
 * Metric Aggregator
 *
 * Consumes the archived-process tail of each snapshot and maintains rolling
 * turnaround, waiting and I/O statistics plus throughput and the longest
 * observed wait ("starvation time"). Times are reported in seconds.
 */

use crate::core::clock::Clock;
use crate::core::limits::METRIC_WINDOW;
use crate::core::task::BackgroundTask;
use crate::core::types::{Millis, Pid};
use crate::process::ProcessStatus;
use crate::scheduler::Snapshot;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Aggregated scheduling metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    /// Average turnaround time (s)
    pub avg_tat: f64,
    /// Average waiting time (s)
    pub avg_wt: f64,
    /// Completions per minute since the aggregator started
    pub throughput: f64,
    /// Average I/O time (s)
    pub avg_io_wait: f64,
    /// Longest waiting time seen so far (s)
    pub starvation_time: f64,
}

/// Fixed-size window with running average
#[derive(Debug, Clone)]
struct Window {
    values: VecDeque<f64>,
    size: usize,
}

impl Window {
    fn new(size: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(size),
            size,
        }
    }

    fn push(&mut self, value: f64) {
        if self.values.len() == self.size {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    fn average(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
        }
    }
}

/// Rolling statistics over completed processes
#[derive(Debug, Clone)]
pub struct MetricAggregator {
    last_pid: Option<Pid>,
    started_at: Millis,
    completed: u64,
    longest_wait: f64,
    turnaround: Window,
    waiting: Window,
    io: Window,
}

impl MetricAggregator {
    pub fn new(started_at: Millis) -> Self {
        Self::with_window(started_at, METRIC_WINDOW)
    }

    pub fn with_window(started_at: Millis, window: usize) -> Self {
        Self {
            last_pid: None,
            started_at,
            completed: 0,
            longest_wait: 0.0,
            turnaround: Window::new(window),
            waiting: Window::new(window),
            io: Window::new(window),
        }
    }

    /// Fold newly archived processes from a snapshot
    ///
    /// Walks the archive tail newest-first until the last id seen on the
    /// previous call, so repeated snapshots never double count.
    pub fn record(&mut self, snapshot: &Snapshot) {
        let archive = &snapshot.completed_processes;
        let Some(newest) = archive.last() else {
            return;
        };
        if Some(newest.id) == self.last_pid {
            return;
        }

        for process in archive.iter().rev() {
            if Some(process.id) == self.last_pid {
                break;
            }
            if process.status == ProcessStatus::Terminated {
                continue;
            }

            let ended_at = process.ended_at.unwrap_or(snapshot.taken_at);
            let turnaround = ended_at.saturating_sub(process.created_at) as f64 / 1000.0;
            let io_time = process.io_time.unwrap_or(0) as f64 / 1000.0;
            let waiting = turnaround - process.cpu_time as f64 - io_time;

            self.turnaround.push(turnaround);
            self.waiting.push(waiting.max(0.0));
            self.io.push(io_time);
            self.completed += 1;
            if waiting > self.longest_wait {
                self.longest_wait = waiting;
            }
        }

        debug!(completed = self.completed, "Metrics updated");
        self.last_pid = Some(newest.id);
    }

    /// Completed (non-terminated) processes counted so far
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Current statistics; `None` before the first completion
    pub fn report(&self, now: Millis) -> Option<MetricsReport> {
        let avg_tat = self.turnaround.average()?;
        let avg_wt = self.waiting.average().unwrap_or(0.0);
        let avg_io_wait = self.io.average().unwrap_or(0.0);

        let elapsed_minutes = now.saturating_sub(self.started_at) as f64 / 60_000.0;
        let throughput = if elapsed_minutes > 0.0 {
            self.completed as f64 / elapsed_minutes
        } else {
            0.0
        };

        Some(MetricsReport {
            avg_tat,
            avg_wt,
            throughput,
            avg_io_wait,
            starvation_time: self.longest_wait,
        })
    }
}

/// Spawn the fixed-period metric reporter
pub fn spawn_reporter<F>(
    aggregator: Arc<Mutex<MetricAggregator>>,
    clock: Arc<dyn Clock>,
    period: Duration,
    mut callback: F,
) -> BackgroundTask
where
    F: FnMut(MetricsReport) + Send + 'static,
{
    BackgroundTask::spawn("metric-reporter", move |mut shutdown| async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_ms = period.as_millis() as u64, "Metric reporter started");

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    let report = aggregator.lock().report(clock.now());
                    if let Some(report) = report {
                        callback(report);
                    }
                }
            }
        }
    })
}
