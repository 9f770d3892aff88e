/*!
 * Monitoring Module
 * Tracing setup, the injected event log and the metric aggregator
 */

pub mod log;
pub mod metrics;
pub mod tracer;

pub use log::{EventLog, LogBuffer, LogEntry, LogLevel, NullLog, TracingLog};
pub use metrics::{spawn_reporter, MetricAggregator, MetricsReport};
pub use tracer::init_tracing;
