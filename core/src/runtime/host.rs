//! Direct host-local adapter: no container boundary, every operation maps
//! onto the local shell, filesystem, and process table.

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

use super::{ContainerRuntime, ExecOutput, ProcessEntry, RuntimeKind};
use crate::error::AdapterError;

pub struct HostRuntime;

impl HostRuntime {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HostRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerRuntime for HostRuntime {
    fn kind(&self) -> RuntimeKind {
        RuntimeKind::Host
    }

    async fn reachable(&self) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn exec(&self, cmd: &str) -> Result<ExecOutput, AdapterError> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .output()
            .await
            .map_err(|e| AdapterError::Exec {
                cmd: cmd.to_string(),
                reason: e.to_string(),
            })?;

        Ok(ExecOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    async fn copy_in(&self, host_path: &Path, target_path: &str) -> Result<(), AdapterError> {
        tokio::fs::copy(host_path, target_path)
            .await
            .map_err(|e| AdapterError::Copy {
                from: host_path.to_string_lossy().to_string(),
                to: target_path.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn copy_out(&self, target_path: &str, host_path: &Path) -> Result<(), AdapterError> {
        tokio::fs::copy(target_path, host_path)
            .await
            .map_err(|e| AdapterError::Copy {
                from: target_path.to_string(),
                to: host_path.to_string_lossy().to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn remove_file(&self, path: &str) -> Result<(), AdapterError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AdapterError::Remove {
                path: path.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn list_processes(&self) -> Result<Vec<ProcessEntry>, AdapterError> {
        let entries = tokio::task::spawn_blocking(|| {
            let mut sys = sysinfo::System::new();
            sys.refresh_processes();
            sys.processes()
                .iter()
                .map(|(pid, proc_)| {
                    let command = if proc_.cmd().is_empty() {
                        proc_.name().to_string()
                    } else {
                        proc_.cmd().join(" ")
                    };
                    ProcessEntry {
                        pid: pid.as_u32(),
                        command,
                    }
                })
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| AdapterError::ListProcesses(e.to_string()))?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exec_captures_stdout_and_code() {
        let rt = HostRuntime::new();
        let out = rt.exec("echo hello && exit 0").await.unwrap();
        assert_eq!(out.code, 0);
        assert_eq!(out.stdout.trim(), "hello");

        let out = rt.exec("exit 3").await.unwrap();
        assert_eq!(out.code, 3);
    }

    #[tokio::test]
    async fn exec_ok_rejects_nonzero() {
        let rt = HostRuntime::new();
        let err = rt.exec_ok("echo oops >&2; exit 1").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("exited with code 1"));
        assert!(msg.contains("oops"));
    }

    #[tokio::test]
    async fn remove_file_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.json");
        std::fs::write(&path, "{}").unwrap();

        let rt = HostRuntime::new();
        rt.remove_file(path.to_str().unwrap()).await.unwrap();
        assert!(!path.exists());
        // second removal: missing file is not an error
        rt.remove_file(path.to_str().unwrap()).await.unwrap();
    }

    #[tokio::test]
    async fn own_process_is_listed() {
        let rt = HostRuntime::new();
        let entries = rt.list_processes().await.unwrap();
        let me = std::process::id();
        assert!(entries.iter().any(|e| e.pid == me));
    }
}
