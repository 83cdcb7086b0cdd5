//! Docker adapter: shells out to the `docker` binary (`exec`, `cp`,
//! `inspect`) against one container id.

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

use super::{parse_ps_output, ContainerRuntime, ExecOutput, ProcessEntry, RuntimeKind};
use crate::error::AdapterError;

pub struct DockerRuntime {
    container_id: String,
}

impl DockerRuntime {
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
        }
    }

    async fn docker(&self, args: &[&str]) -> Result<ExecOutput, AdapterError> {
        let output = Command::new("docker")
            .args(args)
            .output()
            .await
            .map_err(|e| AdapterError::Exec {
                cmd: format!("docker {}", args.join(" ")),
                reason: e.to_string(),
            })?;

        Ok(ExecOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    async fn docker_ok(&self, args: &[&str]) -> Result<ExecOutput, AdapterError> {
        let out = self.docker(args).await?;
        if out.code != 0 {
            return Err(AdapterError::ExitStatus {
                cmd: format!("docker {}", args.join(" ")),
                code: out.code,
                stderr: out.stderr.trim().to_string(),
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    fn kind(&self) -> RuntimeKind {
        RuntimeKind::Docker
    }

    async fn reachable(&self) -> Result<(), AdapterError> {
        let out = self
            .docker(&[
                "inspect",
                "-f",
                "{{.State.Running}}",
                self.container_id.as_str(),
            ])
            .await?;
        if out.code != 0 || out.stdout.trim() != "true" {
            return Err(AdapterError::Unreachable {
                kind: "docker".to_string(),
                container_id: self.container_id.clone(),
                reason: if out.code != 0 {
                    out.stderr.trim().to_string()
                } else {
                    format!("container state: {}", out.stdout.trim())
                },
            });
        }
        Ok(())
    }

    async fn exec(&self, cmd: &str) -> Result<ExecOutput, AdapterError> {
        self.docker(&["exec", self.container_id.as_str(), "sh", "-c", cmd])
            .await
    }

    async fn copy_in(&self, host_path: &Path, target_path: &str) -> Result<(), AdapterError> {
        let from = host_path.to_string_lossy().to_string();
        let to = format!("{}:{}", self.container_id, target_path);
        self.docker_ok(&["cp", from.as_str(), to.as_str()])
            .await
            .map_err(|e| AdapterError::Copy {
                from,
                to,
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn copy_out(&self, target_path: &str, host_path: &Path) -> Result<(), AdapterError> {
        let from = format!("{}:{}", self.container_id, target_path);
        let to = host_path.to_string_lossy().to_string();
        self.docker_ok(&["cp", from.as_str(), to.as_str()])
            .await
            .map_err(|e| AdapterError::Copy {
                from,
                to,
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn remove_file(&self, path: &str) -> Result<(), AdapterError> {
        self.exec_ok(&format!("rm -f {path}"))
            .await
            .map_err(|e| AdapterError::Remove {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn list_processes(&self) -> Result<Vec<ProcessEntry>, AdapterError> {
        let out = self
            .exec_ok("ps -eo pid,args")
            .await
            .map_err(|e| AdapterError::ListProcesses(e.to_string()))?;
        Ok(parse_ps_output(&out.stdout))
    }
}
