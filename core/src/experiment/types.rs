//! Experiment record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Target common to every injector. Immutable once an experiment starts.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TargetInfo {
    /// Experiment id; generated when the caller supplies none.
    pub uid: String,
    /// Container runtime kind; empty means the host itself.
    #[serde(default)]
    pub container_runtime: String,
    #[serde(default)]
    pub container_id: String,
    /// Requested timeout string ("30s", "2m", ...); empty means none.
    #[serde(default)]
    pub timeout: String,
}

/// Experiment lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentPhase {
    Created,
    Validated,
    ValidationFailed,
    Injected,
    PartiallyRecovered,
    Recovered,
}

/// Durable serialized experiment state: caller-supplied Args plus the
/// Runtime facts discovered during Inject. Persisted after every phase
/// transition so a crash leaves the most recent committed phase
/// recoverable; Recover relies on nothing outside this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentRecord {
    pub uid: String,
    /// Target kind, e.g. "jvm".
    pub target: String,
    /// Fault kind, e.g. "methodexception".
    pub fault: String,
    pub info: TargetInfo,
    /// Fault-specific input parameters, supplied once, never mutated.
    pub args: serde_json::Value,
    /// Fault-specific discovered state; empty until Inject runs.
    pub runtime: serde_json::Value,
    pub phase: ExperimentPhase,
    /// Last error text, if the most recent transition failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExperimentRecord {
    pub fn new(target: &str, fault: &str, info: TargetInfo, args: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            uid: info.uid.clone(),
            target: target.to_string(),
            fault: fault.to_string(),
            info,
            args,
            runtime: serde_json::Value::Null,
            phase: ExperimentPhase::Created,
            message: None,
            created_at: now,
            updated_at: now,
        }
    }
}
