/*!
 * Core Types
 * Common types used across the simulator
 */

/// Process ID type (assigned monotonically, never reused)
pub type Pid = u64;

/// Priority level (higher is more important, unbounded above)
pub type Priority = i64;

/// Wall-clock timestamp in milliseconds since the Unix epoch
pub type Millis = u64;

/// Memory size in megabytes
pub type Megabytes = u64;
