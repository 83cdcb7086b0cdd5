//! Container runtime adapter: executes commands and moves files inside a
//! container's namespaces, or directly on the host when no runtime is named.

pub mod docker;
pub mod host;

use async_trait::async_trait;
use std::path::Path;

use crate::error::AdapterError;

pub use docker::DockerRuntime;
pub use host::HostRuntime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeKind {
    Host,
    Docker,
}

impl RuntimeKind {
    /// Parse the user-facing runtime name. Empty means host.
    pub fn parse(s: &str) -> Result<Self, AdapterError> {
        match s.trim() {
            "" | "host" => Ok(Self::Host),
            "docker" => Ok(Self::Docker),
            other => Err(AdapterError::UnknownRuntime(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Docker => "docker",
        }
    }
}

/// Captured output of one exec call.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// One row of the target's process table.
#[derive(Debug, Clone)]
pub struct ProcessEntry {
    pub pid: u32,
    /// Full command line as enumerated (host: argv joined; container: ps args).
    pub command: String,
}

/// Polymorphic handle over {host, docker, ...}. Every operation is awaited
/// to completion and returns a wrapped failure naming the failing call; the
/// adapter never rolls back partial side effects of a failed call.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    fn kind(&self) -> RuntimeKind;

    /// Cheap probe that the (runtime, container) pair is usable.
    async fn reachable(&self) -> Result<(), AdapterError>;

    /// Run `cmd` through `sh -c` inside the target and capture its output.
    async fn exec(&self, cmd: &str) -> Result<ExecOutput, AdapterError>;

    /// Copy a host file into the target's filesystem view.
    async fn copy_in(&self, host_path: &Path, target_path: &str) -> Result<(), AdapterError>;

    /// Copy a file out of the target's filesystem view onto the host.
    async fn copy_out(&self, target_path: &str, host_path: &Path) -> Result<(), AdapterError>;

    /// Remove a file inside the target. Missing files are not an error.
    async fn remove_file(&self, path: &str) -> Result<(), AdapterError>;

    /// Enumerate the target's process table. Order is the underlying
    /// table's enumeration order and is not stable across calls.
    async fn list_processes(&self) -> Result<Vec<ProcessEntry>, AdapterError>;

    /// `exec` that treats a nonzero exit status as a failure.
    async fn exec_ok(&self, cmd: &str) -> Result<ExecOutput, AdapterError> {
        let out = self.exec(cmd).await?;
        if out.code != 0 {
            return Err(AdapterError::ExitStatus {
                cmd: cmd.to_string(),
                code: out.code,
                stderr: out.stderr.trim().to_string(),
            });
        }
        Ok(out)
    }
}

/// Build the adapter for a runtime kind string. Empty kind short-circuits
/// every operation to its direct host-local equivalent.
pub fn build_runtime(
    kind: &str,
    container_id: &str,
) -> Result<Box<dyn ContainerRuntime>, AdapterError> {
    match RuntimeKind::parse(kind)? {
        RuntimeKind::Host => Ok(Box::new(HostRuntime::new())),
        RuntimeKind::Docker => Ok(Box::new(DockerRuntime::new(container_id))),
    }
}

/// Parse `ps -eo pid,args` style output into process entries.
pub(crate) fn parse_ps_output(out: &str) -> Vec<ProcessEntry> {
    out.lines()
        .skip(1) // header
        .filter_map(|line| {
            let line = line.trim();
            let (pid_str, rest) = line.split_once(char::is_whitespace)?;
            let pid: u32 = pid_str.parse().ok()?;
            Some(ProcessEntry {
                pid,
                command: rest.trim().to_string(),
            })
        })
        .collect()
}
