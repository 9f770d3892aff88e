/*!
 * System Limits and Constants
 *
 * Centralized location for all simulator-wide limits, cadences and defaults.
 * Grouped by domain.
 *
 * ## Conventions
 * - Durations are expressed as `Duration` unless they feed priority arithmetic
 * - Memory sizes are in megabytes
 */

use std::time::Duration;

// =============================================================================
// MEMORY
// =============================================================================

/// Default main memory capacity (16 GB)
pub const DEFAULT_MAX_MEMORY: u64 = 16_384;

/// Default swap capacity (8 GB)
pub const DEFAULT_MAX_SWAP: u64 = 8_192;

// =============================================================================
// PROCESS DEFAULTS
// =============================================================================

/// Lowest accepted CPU demand percentage
pub const MIN_CPU_DEMAND: u8 = 1;

/// Highest accepted CPU demand percentage
pub const MAX_CPU_DEMAND: u8 = 100;

/// Priority assigned when the caller does not provide one
pub const DEFAULT_PRIORITY: i64 = 0;

// =============================================================================
// EXECUTION
// =============================================================================

/// Wall-clock length of one compute tick at speed 1.0
pub const BASE_TICK_DURATION: Duration = Duration::from_millis(1_000);

/// Wait between polls when paused or when there is no work
pub const IDLE_WAIT: Duration = Duration::from_millis(1_000);

/// Smallest quantum (ticks) drawn for a slice
pub const QUANTUM_MIN: u32 = 1;

/// Largest quantum (ticks) drawn for a slice
pub const QUANTUM_MAX: u32 = 5;

/// Longest simulated I/O wait, in ticks
pub const IO_TICKS_MAX: u32 = 3;

// =============================================================================
// SIMULATION SPEED
// =============================================================================

pub const DEFAULT_SIMULATION_SPEED: f64 = 1.0;
pub const MIN_SIMULATION_SPEED: f64 = 0.5;
pub const MAX_SIMULATION_SPEED: f64 = 5.0;

// =============================================================================
// AGING
// =============================================================================

/// Waiting time that earns one class-weighted priority step (ms)
pub const AGING_INTERVAL_MS: u64 = 5_000;

// =============================================================================
// REPORTING
// =============================================================================

/// Archived processes kept for reporting
pub const ARCHIVE_CAPACITY: usize = 150;

/// Snapshot publish period (not scaled by simulation speed)
pub const SNAPSHOT_INTERVAL: Duration = Duration::from_millis(500);

/// Completed processes averaged by the metric aggregator
pub const METRIC_WINDOW: usize = 20;

/// Metric report period (not scaled by simulation speed)
pub const METRIC_INTERVAL: Duration = Duration::from_millis(1_000);

/// Entries retained by the event log buffer
pub const LOG_CAPACITY: usize = 500;

// =============================================================================
// WORKLOAD GENERATION
// =============================================================================

/// Period of the automatic workload generator
pub const AUTO_GENERATE_INTERVAL: Duration = Duration::from_millis(1_500);
