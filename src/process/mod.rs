/*!
 * Process Module
 * Process records, classes and the status state machine
 */

mod state;
pub mod types;

// Re-export for convenience
pub use types::{Process, ProcessClass, ProcessInfo, ProcessSpec, ProcessStatus};
