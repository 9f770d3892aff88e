/*!
 * Core Module
 * Fundamental simulator types, limits, time and error handling
 */

pub mod clock;
pub mod errors;
pub mod limits;
pub mod task;
pub mod types;

// Re-export for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::*;
pub use task::BackgroundTask;
pub use types::*;
