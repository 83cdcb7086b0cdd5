//! Durable experiment record persistence.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

use super::transitions::PhaseTransition;
use super::types::{ExperimentPhase, ExperimentRecord};
use crate::error::AgentError;

/// Directory-scoped store of experiment records, one JSON file per uid.
/// Written immediately after each phase transition so a crash leaves the
/// most recent committed phase on disk.
pub struct ExperimentStore {
    record_dir: PathBuf,
}

impl ExperimentStore {
    pub fn new<P: Into<PathBuf>>(record_dir: P) -> Result<Self, AgentError> {
        let record_dir = record_dir.into();
        if !record_dir.exists() {
            std::fs::create_dir_all(&record_dir)
                .with_context(|| format!("create record directory {record_dir:?}"))
                .map_err(|e| AgentError::Persistence(e.to_string()))?;
        }
        Ok(Self { record_dir })
    }

    fn record_path(&self, uid: &str) -> PathBuf {
        self.record_dir.join(format!("experiment_{uid}.json"))
    }

    pub fn save(&self, record: &ExperimentRecord) -> Result<PathBuf, AgentError> {
        let path = self.record_path(&record.uid);
        let json = serde_json::to_string_pretty(record)
            .context("serialize experiment record")
            .map_err(|e| AgentError::Persistence(e.to_string()))?;
        std::fs::write(&path, json)
            .with_context(|| format!("write experiment record to {path:?}"))
            .map_err(|e| AgentError::Persistence(e.to_string()))?;
        Ok(path)
    }

    /// Validate and apply a phase transition, then persist the record.
    pub fn transition(
        &self,
        record: &mut ExperimentRecord,
        to: ExperimentPhase,
        message: Option<String>,
    ) -> Result<(), AgentError> {
        PhaseTransition::validate(record.phase, to)
            .map_err(|e| AgentError::Internal(anyhow::anyhow!(e)))?;
        record.phase = to;
        record.message = message;
        record.updated_at = Utc::now();
        self.save(record)?;
        tracing::debug!(uid = %record.uid, phase = ?to, "experiment phase persisted");
        Ok(())
    }

    pub fn load(&self, uid: &str) -> Result<ExperimentRecord, AgentError> {
        let path = self.record_path(uid);
        Self::load_from_file(&path)
    }

    fn load_from_file(path: &Path) -> Result<ExperimentRecord, AgentError> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read experiment record from {path:?}"))
            .map_err(|e| AgentError::Persistence(e.to_string()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("parse experiment record {path:?}"))
            .map_err(|e| AgentError::Persistence(e.to_string()))
    }

    /// List all records, newest first.
    pub fn list(&self) -> Result<Vec<ExperimentRecord>, AgentError> {
        let mut records = Vec::new();

        let entries = std::fs::read_dir(&self.record_dir)
            .with_context(|| format!("read record directory {:?}", self.record_dir))
            .map_err(|e| AgentError::Persistence(e.to_string()))?;

        for entry in entries {
            let entry = entry.map_err(|e| AgentError::Persistence(e.to_string()))?;
            let path = entry.path();
            let is_record = path.is_file()
                && path
                    .file_name()
                    .and_then(|s| s.to_str())
                    .map(|n| n.starts_with("experiment_") && n.ends_with(".json"))
                    .unwrap_or(false);
            if is_record {
                records.push(Self::load_from_file(&path)?);
            }
        }

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}
