/*!
 * Resource Allocation Simulator Library
 * Preemptive priority scheduling of a single execution unit over bounded
 * main memory and swap, exposed as a library
 */

pub mod core;
pub mod monitoring;
pub mod process;
pub mod scheduler;
pub mod workload;

// Re-exports
pub use crate::core::errors::*;
pub use crate::core::{Clock, ManualClock, SystemClock};
pub use monitoring::{
    init_tracing, EventLog, LogBuffer, LogEntry, LogLevel, MetricAggregator, MetricsReport,
};
pub use process::{ProcessClass, ProcessInfo, ProcessSpec, ProcessStatus};
pub use scheduler::{
    Admission, Placement, Scheduler, SchedulerBuilder, SchedulerConfig, SchedulerCore, Snapshot,
    StepOutcome,
};
pub use workload::{spawn_auto_generator, WorkloadGenerator};
