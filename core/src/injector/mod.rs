//! Injector capability contract and registry.
//!
//! One injector implementation exists per (target kind, fault kind) pair.
//! The generic surface (`get_args`/`get_runtime` as JSON values) lets the
//! dispatch layer serialize, persist and re-bind any injector without
//! knowing its concrete shape.

pub mod base;
pub mod registry;

use async_trait::async_trait;

use crate::context::AgentContext;
use crate::error::AgentError;
use crate::experiment::TargetInfo;

pub use base::BaseInjector;
pub use registry::{InjectorFactory, InjectorRegistry};

#[async_trait]
pub trait Injector: Send + Sync {
    fn target(&self) -> &'static str;
    fn fault(&self) -> &'static str;

    fn info(&self) -> &TargetInfo;
    fn set_info(&mut self, info: TargetInfo);

    /// Caller-supplied input parameters as a serializable document.
    fn get_args(&self) -> Result<serde_json::Value, AgentError>;
    fn set_args(&mut self, args: serde_json::Value) -> Result<(), AgentError>;

    /// State discovered during inject; the only state recover may rely on
    /// besides the args. Empty until inject runs.
    fn get_runtime(&self) -> Result<serde_json::Value, AgentError>;
    fn set_runtime(&mut self, runtime: serde_json::Value) -> Result<(), AgentError>;

    /// Read-only; safe to call repeatedly; no persisted side effects.
    async fn validate(&mut self) -> Result<(), AgentError>;

    /// Resolves targets, performs the side effect and records the runtime.
    /// A partial failure triggers a compensating recover before the error
    /// is surfaced; when compensation itself fails both errors are kept.
    async fn inject(&mut self) -> Result<(), AgentError>;

    /// Undoes every runtime entry, best effort, aggregating per-target
    /// failures. Idempotent: with nothing left to clean it succeeds.
    async fn recover(&mut self) -> Result<(), AgentError>;
}

/// Helper for `set_args`/`set_runtime` impls: bind a JSON document onto a
/// concrete shape with a uniform error.
pub fn bind_value<T: serde::de::DeserializeOwned>(
    what: &str,
    value: serde_json::Value,
) -> Result<T, AgentError> {
    serde_json::from_value(value)
        .map_err(|e| AgentError::Validation(format!("bind {what} failed: {e}")))
}

/// Helper for `get_args`/`get_runtime` impls.
pub fn to_value<T: serde::Serialize>(what: &str, value: &T) -> Result<serde_json::Value, AgentError> {
    serde_json::to_value(value)
        .map_err(|e| AgentError::Persistence(format!("serialize {what} failed: {e}")))
}

/// Construct an injector for an incoming (target, fault) request.
pub fn instantiate(
    registry: &InjectorRegistry,
    ctx: &AgentContext,
    target: &str,
    fault: &str,
) -> Result<Box<dyn Injector>, AgentError> {
    let factory = registry.lookup(target, fault)?;
    Ok(factory(ctx))
}
