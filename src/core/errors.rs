/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::process::ProcessStatus;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Admission result type
///
/// # Must Use
/// A rejected admission means the process was never created
pub type AdmissionResult<T> = Result<T, AdmissionError>;

/// Process operation result
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Result type for the simulator binary
pub type SimResult<T> = Result<T, SimError>;

/// Invalid scheduler configuration. Always fatal at construction time.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("Main memory must be > 0 (got {0})")]
    #[diagnostic(
        code(config::invalid_memory),
        help("Provide a positive main memory capacity in MB.")
    )]
    InvalidMemory(i64),

    #[error("Swap must be >= 0 (got {0})")]
    #[diagnostic(
        code(config::invalid_swap),
        help("Provide a non-negative swap capacity in MB.")
    )]
    InvalidSwap(i64),

    #[error("Swap ({swap} MB) exceeds main memory ({memory} MB)")]
    #[diagnostic(
        code(config::swap_exceeds_memory),
        help("Main memory must be at least as large as swap.")
    )]
    SwapExceedsMemory { memory: i64, swap: i64 },

    #[error("Invalid simulation speed bounds: min {min}, max {max}")]
    #[diagnostic(
        code(config::invalid_speed_bounds),
        help("Speed bounds must be finite, positive and min <= max.")
    )]
    InvalidSpeedBounds { min: f64, max: f64 },

    #[error("Invalid quantum range: {min}..={max}")]
    #[diagnostic(
        code(config::invalid_quantum),
        help("Quantum bounds must satisfy 1 <= min <= max.")
    )]
    InvalidQuantum { min: u32, max: u32 },

    #[error("Invalid {name}: {value}")]
    #[diagnostic(
        code(config::invalid_probability),
        help("Probabilities must lie in [0, 1].")
    )]
    InvalidProbability { name: String, value: f64 },

    #[error("Invalid {field}: {reason}")]
    #[diagnostic(code(config::invalid_field))]
    InvalidField { field: String, reason: String },

    #[error("Environment variable {var} has invalid value '{value}'")]
    #[diagnostic(
        code(config::env),
        help("Unset the variable or provide a value of the expected type.")
    )]
    Env { var: String, value: String },
}

/// Admission failures. Soft: the caller decides whether to retry.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum AdmissionError {
    #[error("Insufficient memory and swap for '{name}' ({mem_need} MB)")]
    #[diagnostic(
        code(admission::insufficient_capacity),
        help("No lower weighted-priority occupant could be reclaimed. Retry later or lower the footprint.")
    )]
    InsufficientCapacity { name: String, mem_need: u64 },

    #[error("Invalid request: {0}")]
    #[diagnostic(
        code(admission::invalid_request),
        help("cpu_time and mem_need must both be positive.")
    )]
    InvalidRequest(String),
}

/// Process state machine errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ProcessError {
    #[error("Invalid state transition: {from:?} -> {to:?}")]
    #[diagnostic(code(process::invalid_transition))]
    InvalidStateTransition {
        from: ProcessStatus,
        to: ProcessStatus,
    },
}

/// Unified simulator error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("Admission error: {0}")]
    #[diagnostic(transparent)]
    Admission(#[from] AdmissionError),

    #[error("Process error: {0}")]
    #[diagnostic(transparent)]
    Process(#[from] ProcessError),

    #[error("I/O error: {0}")]
    #[diagnostic(code(sim::io_error))]
    Io(#[from] std::io::Error),
}
