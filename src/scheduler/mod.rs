/*!
 * Scheduler Module
 * Admission, eviction, swap, aging and the single-core execution loop
 */

mod aging;
pub mod archive;
pub mod config;
pub mod engine;
pub mod execution;
pub mod handle;
pub mod queue;
pub mod snapshot;

// Re-export public API
pub use archive::Archive;
pub use config::SchedulerConfig;
pub use engine::{Admission, Placement, SchedulerCore};
pub use execution::StepOutcome;
pub use handle::{Scheduler, SchedulerBuilder};
pub use queue::ProcessQueue;
pub use snapshot::{Snapshot, SnapshotCallback};
