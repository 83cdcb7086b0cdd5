//! Rule store: per-target on-disk artifacts describing an active experiment.
//!
//! Existence of a rule file for a (container, pid) key is the single source
//! of truth for "an experiment is active here": Validate's duplicate check
//! reads it, the companion agent inside the target reads the in-container
//! copy. The agent is the sole writer and the sole deleter.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::types::RuleDocument;
use crate::error::AgentError;
use crate::runtime::{ContainerRuntime, RuntimeKind};

/// Store for one fault family (file-name prefix), e.g. "jvm".
pub struct RuleStore {
    family: String,
    host_dir: PathBuf,
    container_dir: String,
}

impl RuleStore {
    pub fn new(
        family: impl Into<String>,
        host_dir: impl Into<PathBuf>,
        container_dir: impl Into<String>,
    ) -> Self {
        Self {
            family: family.into(),
            host_dir: host_dir.into(),
            container_dir: container_dir.into(),
        }
    }

    /// Host-side path for a (container, pid) key. Deterministic and
    /// collision-free across distinct keys; the empty container id (host
    /// targets) gets its own namespace.
    pub fn derive_path(&self, container_id: &str, pid: u32) -> PathBuf {
        let scope = if container_id.is_empty() {
            "host"
        } else {
            container_id
        };
        self.host_dir
            .join(format!("{}_rule_{}_{}.json", self.family, scope, pid))
    }

    /// Fixed in-container path the companion agent watches.
    pub fn container_path(&self, pid: u32) -> String {
        format!("{}/{}_rule_{}.json", self.container_dir, self.family, pid)
    }

    /// Duplicate-experiment guard. Two concurrent Validates can both see
    /// "absent" before either writes; that narrow race is accepted, this is
    /// not a mutual-exclusion primitive.
    pub fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    pub fn read(&self, path: &Path) -> Result<RuleDocument, AgentError> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read rule file {path:?}"))
            .map_err(|e| AgentError::Persistence(e.to_string()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("parse rule file {path:?}"))
            .map_err(|e| AgentError::Persistence(e.to_string()))
    }

    /// Marshal the document to its host-side path, then copy it into the
    /// container when the target lives in one. A failed copy leaves the
    /// host file in place; compensation is the caller's job.
    pub async fn write(
        &self,
        rt: &dyn ContainerRuntime,
        container_id: &str,
        pid: u32,
        doc: &RuleDocument,
    ) -> Result<PathBuf, AgentError> {
        let path = self.derive_path(container_id, pid);

        tokio::fs::create_dir_all(&self.host_dir)
            .await
            .map_err(|e| {
                AgentError::Persistence(format!("create rule dir {:?}: {e}", self.host_dir))
            })?;

        let json = serde_json::to_string_pretty(doc)
            .map_err(|e| AgentError::Persistence(format!("serialize rule document: {e}")))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| AgentError::Persistence(format!("write rule file {path:?}: {e}")))?;
        tracing::debug!(path = ?path, pid, "rule file written");

        if rt.kind() != RuntimeKind::Host {
            rt.copy_in(&path, &self.container_path(pid)).await?;
        }

        Ok(path)
    }

    /// Delete both copies of the rule file for a key, in-container copy
    /// first so the companion stops applying the fault as early as
    /// possible. A failed in-container deletion keeps the host copy in
    /// place: its existence is what makes a later recover retry this key,
    /// so it must outlive the live fault.
    pub async fn remove(
        &self,
        rt: &dyn ContainerRuntime,
        container_id: &str,
        pid: u32,
    ) -> Result<(), AgentError> {
        if rt.kind() != RuntimeKind::Host {
            rt.remove_file(&self.container_path(pid)).await.map_err(|e| {
                AgentError::Persistence(format!(
                    "remove rule for pid [{pid}] failed: in-container copy: {e}"
                ))
            })?;
        }

        let host_path = self.derive_path(container_id, pid);
        if host_path.exists() {
            tokio::fs::remove_file(&host_path).await.map_err(|e| {
                AgentError::Persistence(format!(
                    "remove rule for pid [{pid}] failed: host copy {host_path:?}: {e}"
                ))
            })?;
        }

        Ok(())
    }
}
