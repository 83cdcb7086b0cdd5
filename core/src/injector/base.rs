//! Shared validation skeleton and adapter plumbing for concrete injectors.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::error::AgentError;
use crate::experiment::TargetInfo;
use crate::runtime::{build_runtime, ContainerRuntime, RuntimeKind};
use crate::util::parse_timeout_secs;

/// Common state every concrete injector composes: the immutable target
/// info plus a lazily built runtime adapter handle. The adapter can be
/// swapped before use, which is how callers bind a preconfigured or
/// instrumented runtime.
#[derive(Default)]
pub struct BaseInjector {
    pub info: TargetInfo,
    adapter: Option<Arc<dyn ContainerRuntime>>,
}

impl BaseInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_adapter(&mut self, adapter: Arc<dyn ContainerRuntime>) {
        self.adapter = Some(adapter);
    }

    /// The runtime adapter for this target, built from the info on first
    /// use unless one was bound explicitly.
    pub fn adapter(&mut self) -> Result<Arc<dyn ContainerRuntime>, AgentError> {
        if let Some(rt) = &self.adapter {
            return Ok(Arc::clone(rt));
        }
        let rt: Arc<dyn ContainerRuntime> = Arc::from(build_runtime(
            &self.info.container_runtime,
            &self.info.container_id,
        )?);
        self.adapter = Some(Arc::clone(&rt));
        Ok(rt)
    }

    /// Common validation: timeout well-formedness, coherent
    /// (runtime kind, container id) pairing, and target reachability.
    /// Concrete injectors call this first, then add fault-specific checks.
    pub async fn validate(&mut self) -> Result<(), AgentError> {
        if !self.info.timeout.is_empty() {
            parse_timeout_secs(&self.info.timeout)?;
        }

        let kind = RuntimeKind::parse(&self.info.container_runtime)
            .map_err(|e| AgentError::Validation(e.to_string()))?;
        match kind {
            RuntimeKind::Host => {
                if !self.info.container_id.is_empty() {
                    return Err(AgentError::Validation(
                        "container id given without a container runtime".into(),
                    ));
                }
            }
            _ => {
                if self.info.container_id.is_empty() {
                    return Err(AgentError::Validation(format!(
                        "container runtime [{}] requires a container id",
                        kind.as_str()
                    )));
                }
            }
        }

        self.adapter()?.reachable().await?;
        Ok(())
    }

    /// Parsed timeout in seconds; `None` when the experiment has none.
    pub fn timeout_secs(&self) -> Result<Option<u64>, AgentError> {
        if self.info.timeout.is_empty() {
            return Ok(None);
        }
        parse_timeout_secs(&self.info.timeout).map(Some)
    }

    /// Absolute expiry for rule units, computed from now; `None` when the
    /// experiment never self-expires.
    pub fn expire_at(&self) -> Result<Option<DateTime<Utc>>, AgentError> {
        Ok(self
            .timeout_secs()?
            .map(|secs| Utc::now() + Duration::seconds(secs as i64)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(timeout: &str, runtime: &str, container: &str) -> BaseInjector {
        BaseInjector {
            info: TargetInfo {
                uid: "t".into(),
                container_runtime: runtime.into(),
                container_id: container.into(),
                timeout: timeout.into(),
            },
            adapter: None,
        }
    }

    #[tokio::test]
    async fn host_target_validates() {
        let mut b = base("30s", "", "");
        b.validate().await.unwrap();
    }

    #[tokio::test]
    async fn malformed_timeout_is_rejected() {
        let mut b = base("banana", "", "");
        let err = b.validate().await.unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
    }

    #[tokio::test]
    async fn container_runtime_requires_id() {
        let mut b = base("", "docker", "");
        let err = b.validate().await.unwrap_err();
        assert!(err.to_string().contains("requires a container id"));
    }

    #[tokio::test]
    async fn container_id_requires_runtime() {
        let mut b = base("", "", "c1");
        let err = b.validate().await.unwrap_err();
        assert!(err.to_string().contains("without a container runtime"));
    }

    #[test]
    fn empty_timeout_means_no_expiry() {
        let b = base("", "", "");
        assert!(b.expire_at().unwrap().is_none());

        let b = base("30s", "", "");
        let at = b.expire_at().unwrap().unwrap();
        let delta = at - Utc::now();
        assert!(delta.num_seconds() >= 29 && delta.num_seconds() <= 31);
    }
}
