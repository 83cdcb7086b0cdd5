use thiserror::Error;

/// A single failed cleanup target inside an aggregate recovery error.
#[derive(Debug, Clone)]
pub struct RecoveryFailure {
    /// Identifies the target that could not be cleaned, e.g. "pid 4242".
    pub target: String,
    pub reason: String,
}

impl std::fmt::Display for RecoveryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.target, self.reason)
    }
}

/// Failures from a single container-runtime call. The adapter never rolls
/// back partial side effects; compensation belongs to the caller.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("exec `{cmd}` failed: {reason}")]
    Exec { cmd: String, reason: String },
    #[error("exec `{cmd}` exited with code {code}: {stderr}")]
    ExitStatus {
        cmd: String,
        code: i32,
        stderr: String,
    },
    #[error("copy {from} -> {to} failed: {reason}")]
    Copy {
        from: String,
        to: String,
        reason: String,
    },
    #[error("remove {path} failed: {reason}")]
    Remove { path: String, reason: String },
    #[error("list processes failed: {0}")]
    ListProcesses(String),
    #[error("container [{container_id}] not reachable via {kind}: {reason}")]
    Unreachable {
        kind: String,
        container_id: String,
        reason: String,
    },
    #[error("unknown container runtime: {0}")]
    UnknownRuntime(String),
}

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("no target process found: {0}")]
    TargetNotFound(String),

    #[error("container runtime call failed: {0}")]
    Adapter(#[from] AdapterError),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("recover left {} target(s) uncleaned: {}", .0.len(), format_failures(.0))]
    PartialRecovery(Vec<RecoveryFailure>),

    #[error("inject failed: {inject}; compensating recover also failed: {recover}")]
    InjectCompensated { inject: String, recover: String },

    #[error("no injector registered for target [{target}] fault [{fault}]")]
    UnknownInjector { target: String, fault: String },

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

fn format_failures(failures: &[RecoveryFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl AgentError {
    /// Map the taxonomy to a process exit code for the CLI surface.
    pub fn exit_code(&self) -> i32 {
        // 0: success
        // 11: validation / unknown injector (bad request)
        // 12: target resolution
        // 20: container runtime call
        // 21: persistence
        // 30: partial or failed recovery
        // 50: internal/uncategorized
        match self {
            Self::Validation(_) => 11,
            Self::UnknownInjector { .. } => 11,
            Self::TargetNotFound(_) => 12,
            Self::Adapter(_) => 20,
            Self::Persistence(_) => 21,
            Self::PartialRecovery(_) => 30,
            Self::InjectCompensated { .. } => 30,
            Self::Internal(_) => 50,
        }
    }
}
