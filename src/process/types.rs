/*!
 * Process Types
 * Process record, class weights, status and read-only projections
 */

use crate::core::limits::{DEFAULT_PRIORITY, MAX_CPU_DEMAND, MIN_CPU_DEMAND};
use crate::core::types::{Megabytes, Millis, Pid, Priority};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Process class
///
/// The discriminant is an ordinal weight: it scales priority in eviction
/// comparisons and the aging step, so it is more than a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessClass {
    Background = 1,
    #[default]
    User = 2,
    System = 3,
}

impl ProcessClass {
    pub const ALL: [ProcessClass; 3] = [Self::Background, Self::User, Self::System];

    /// Ordinal weight used by eviction and aging
    #[inline(always)]
    pub const fn weight(self) -> i64 {
        self as i64
    }

    /// Short label used for generated process names
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Background => "BG",
            Self::User => "USR",
            Self::System => "SYS",
        }
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "background" | "bg" | "1" => Some(Self::Background),
            "user" | "usr" | "2" => Some(Self::User),
            "system" | "sys" | "3" => Some(Self::System),
            _ => None,
        }
    }
}

/// Process status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessStatus {
    Waiting,
    Running,
    #[serde(rename = "IO")]
    Io,
    Preempted,
    Completed,
    Terminated,
}

impl ProcessStatus {
    /// Completed and Terminated processes never re-enter a queue
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Terminated)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "Waiting",
            Self::Running => "Running",
            Self::Io => "IO",
            Self::Preempted => "Preempted",
            Self::Completed => "Completed",
            Self::Terminated => "Terminated",
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admission request
///
/// Mirrors `admit(name, cpuTime, memNeed, cpuDemand?, class?, priority?)`;
/// optional fields fall back to demand 1, class User and priority 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    pub name: String,
    pub cpu_time: u64,
    pub mem_need: Megabytes,
    #[serde(default = "default_cpu_demand")]
    pub cpu_demand: i64,
    #[serde(default)]
    pub class: ProcessClass,
    #[serde(default)]
    pub priority: Priority,
}

fn default_cpu_demand() -> i64 {
    MIN_CPU_DEMAND as i64
}

impl ProcessSpec {
    pub fn new(name: impl Into<String>, cpu_time: u64, mem_need: Megabytes) -> Self {
        Self {
            name: name.into(),
            cpu_time,
            mem_need,
            cpu_demand: default_cpu_demand(),
            class: ProcessClass::default(),
            priority: DEFAULT_PRIORITY,
        }
    }

    pub fn with_cpu_demand(mut self, cpu_demand: i64) -> Self {
        self.cpu_demand = cpu_demand;
        self
    }

    pub fn with_class(mut self, class: ProcessClass) -> Self {
        self.class = class;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Class-weighted priority of the request
    #[inline]
    pub fn weighted_priority(&self) -> i64 {
        self.priority.saturating_mul(self.class.weight())
    }
}

/// Process record owned exclusively by the scheduler engine
#[derive(Debug, Clone)]
pub struct Process {
    pub(crate) id: Pid,
    pub(crate) name: String,
    pub(crate) class: ProcessClass,
    pub(crate) priority: Priority,
    pub(crate) cpu_demand: u8,
    pub(crate) cpu_time: u64,
    pub(crate) done: u64,
    pub(crate) mem_need: Megabytes,
    pub(crate) status: ProcessStatus,
    pub(crate) created_at: Millis,
    pub(crate) updated_at: Millis,
    pub(crate) ended_at: Option<Millis>,
    pub(crate) io_start_time: Option<Millis>,
    pub(crate) io_time: Option<Millis>,
}

impl Process {
    /// Build a Waiting process from an admission request; demand is clamped to [1, 100]
    pub(crate) fn from_spec(id: Pid, spec: ProcessSpec, now: Millis) -> Self {
        let cpu_demand = spec
            .cpu_demand
            .clamp(MIN_CPU_DEMAND as i64, MAX_CPU_DEMAND as i64) as u8;

        Self {
            id,
            name: spec.name,
            class: spec.class,
            priority: spec.priority,
            cpu_demand,
            cpu_time: spec.cpu_time,
            done: 0,
            mem_need: spec.mem_need,
            status: ProcessStatus::Waiting,
            created_at: now,
            updated_at: now,
            ended_at: None,
            io_start_time: None,
            io_time: None,
        }
    }

    #[inline]
    pub fn id(&self) -> Pid {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn class(&self) -> ProcessClass {
        self.class
    }

    #[inline]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    #[inline]
    pub fn status(&self) -> ProcessStatus {
        self.status
    }

    #[inline]
    pub fn done(&self) -> u64 {
        self.done
    }

    #[inline]
    pub fn mem_need(&self) -> Megabytes {
        self.mem_need
    }

    /// Class-weighted priority used only for eviction eligibility
    #[inline]
    pub fn weighted_priority(&self) -> i64 {
        self.priority.saturating_mul(self.class.weight())
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.done >= self.cpu_time
    }

    /// Read-only projection for snapshots
    pub fn info(&self) -> ProcessInfo {
        ProcessInfo {
            id: self.id,
            name: self.name.clone(),
            class: self.class,
            priority: self.priority,
            cpu_demand: self.cpu_demand,
            cpu_time: self.cpu_time,
            done: self.done,
            mem_need: self.mem_need,
            status: self.status,
            created_at: self.created_at,
            ended_at: self.ended_at,
            io_time: self.io_time,
        }
    }
}

/// Immutable projection of a process delivered to external consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInfo {
    pub id: Pid,
    pub name: String,
    pub class: ProcessClass,
    pub priority: Priority,
    pub cpu_demand: u8,
    pub cpu_time: u64,
    pub done: u64,
    pub mem_need: Megabytes,
    pub status: ProcessStatus,
    pub created_at: Millis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<Millis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub io_time: Option<Millis>,
}
