/*!
 * Scheduler Configuration
 * Capacities, cadences and policy parameters with validation
 */

use crate::core::errors::{ConfigError, ConfigResult};
use crate::core::limits::{
    AGING_INTERVAL_MS, ARCHIVE_CAPACITY, BASE_TICK_DURATION, DEFAULT_MAX_MEMORY,
    DEFAULT_MAX_SWAP, DEFAULT_SIMULATION_SPEED, IDLE_WAIT, IO_TICKS_MAX, MAX_SIMULATION_SPEED,
    MIN_SIMULATION_SPEED, QUANTUM_MAX, QUANTUM_MIN, SNAPSHOT_INTERVAL,
};
use crate::core::types::Priority;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Scheduler configuration
///
/// Capacities are signed so invalid (negative) input can be reported rather
/// than wrapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Main memory capacity (MB)
    pub max_memory: i64,
    /// Swap capacity (MB)
    pub max_swap: i64,
    /// Tick length at speed 1.0 (ms)
    pub base_tick_ms: u64,
    /// Poll period while paused or idle (ms)
    pub idle_wait_ms: u64,
    /// Snapshot publish period (ms)
    pub snapshot_interval_ms: u64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub initial_speed: f64,
    pub quantum_min: u32,
    pub quantum_max: u32,
    /// Wait that earns one class-weighted aging step (ms)
    pub aging_interval_ms: u64,
    /// Upper bound for aging; `None` lets priority grow without limit
    pub priority_ceiling: Option<Priority>,
    /// Per-tick probability that a running process blocks on I/O
    pub io_probability: f64,
    pub io_ticks_max: u32,
    pub archive_capacity: usize,
    /// RNG seed; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_memory: DEFAULT_MAX_MEMORY as i64,
            max_swap: DEFAULT_MAX_SWAP as i64,
            base_tick_ms: BASE_TICK_DURATION.as_millis() as u64,
            idle_wait_ms: IDLE_WAIT.as_millis() as u64,
            snapshot_interval_ms: SNAPSHOT_INTERVAL.as_millis() as u64,
            min_speed: MIN_SIMULATION_SPEED,
            max_speed: MAX_SIMULATION_SPEED,
            initial_speed: DEFAULT_SIMULATION_SPEED,
            quantum_min: QUANTUM_MIN,
            quantum_max: QUANTUM_MAX,
            aging_interval_ms: AGING_INTERVAL_MS,
            priority_ceiling: None,
            io_probability: 0.0,
            io_ticks_max: IO_TICKS_MAX,
            archive_capacity: ARCHIVE_CAPACITY,
            seed: None,
        }
    }
}

impl SchedulerConfig {
    /// Default configuration with the given capacities
    pub fn with_capacity(max_memory: i64, max_swap: i64) -> Self {
        Self {
            max_memory,
            max_swap,
            ..Self::default()
        }
    }

    /// Overlay `RESALLOC_*` environment variables on the defaults
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(v) = env_var("RESALLOC_MAX_MEMORY")? {
            config.max_memory = v;
        }
        if let Some(v) = env_var("RESALLOC_MAX_SWAP")? {
            config.max_swap = v;
        }
        if let Some(v) = env_var("RESALLOC_SPEED")? {
            config.initial_speed = v;
        }
        if let Some(v) = env_var("RESALLOC_SEED")? {
            config.seed = Some(v);
        }
        if let Some(v) = env_var("RESALLOC_IO_PROBABILITY")? {
            config.io_probability = v;
        }
        if let Some(v) = env_var("RESALLOC_PRIORITY_CEILING")? {
            config.priority_ceiling = Some(v);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a consistent engine
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_memory <= 0 {
            return Err(ConfigError::InvalidMemory(self.max_memory));
        }
        if self.max_swap < 0 {
            return Err(ConfigError::InvalidSwap(self.max_swap));
        }
        if self.max_memory < self.max_swap {
            return Err(ConfigError::SwapExceedsMemory {
                memory: self.max_memory,
                swap: self.max_swap,
            });
        }

        let speeds_ok = self.min_speed.is_finite()
            && self.max_speed.is_finite()
            && self.min_speed > 0.0
            && self.min_speed <= self.max_speed;
        if !speeds_ok {
            return Err(ConfigError::InvalidSpeedBounds {
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        if !self.initial_speed.is_finite() {
            return Err(ConfigError::InvalidField {
                field: "initial_speed".into(),
                reason: "must be finite".into(),
            });
        }

        if self.quantum_min == 0 || self.quantum_min > self.quantum_max {
            return Err(ConfigError::InvalidQuantum {
                min: self.quantum_min,
                max: self.quantum_max,
            });
        }

        if !(0.0..=1.0).contains(&self.io_probability) {
            return Err(ConfigError::InvalidProbability {
                name: "io_probability".into(),
                value: self.io_probability,
            });
        }
        if self.io_probability > 0.0 && self.io_ticks_max == 0 {
            return Err(ConfigError::InvalidField {
                field: "io_ticks_max".into(),
                reason: "must be >= 1 when I/O is enabled".into(),
            });
        }

        for (field, value) in [
            ("base_tick_ms", self.base_tick_ms),
            ("idle_wait_ms", self.idle_wait_ms),
            ("snapshot_interval_ms", self.snapshot_interval_ms),
            ("aging_interval_ms", self.aging_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidField {
                    field: field.into(),
                    reason: "must be > 0".into(),
                });
            }
        }

        if self.archive_capacity == 0 {
            return Err(ConfigError::InvalidField {
                field: "archive_capacity".into(),
                reason: "must be > 0".into(),
            });
        }

        Ok(())
    }

    /// Clamp a requested speed into the configured bounds
    #[inline]
    pub fn clamp_speed(&self, speed: f64) -> f64 {
        if speed.is_nan() {
            return self.min_speed;
        }
        speed.clamp(self.min_speed, self.max_speed)
    }

    #[inline]
    pub fn base_tick(&self) -> Duration {
        Duration::from_millis(self.base_tick_ms)
    }

    #[inline]
    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }

    #[inline]
    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_millis(self.snapshot_interval_ms)
    }
}

fn env_var<T: FromStr>(var: &str) -> ConfigResult<Option<T>> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env {
                var: var.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}
