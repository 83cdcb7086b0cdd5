//! Stable re-exports for consumers (`cli`, `injectors`, and external crates).
//!
//! Prefer importing from `faultd_core::api` instead of reaching into internal modules.

pub use crate::config::{load_default, get_faultd_data_dir, AgentConfig, LoggingConfig, RuleStoreConfig};
pub use crate::context::AgentContext;
pub use crate::error::{AdapterError, AgentError, RecoveryFailure};
pub use crate::experiment::{
    ExperimentPhase, ExperimentRecord, ExperimentStore, PhaseTransition, TargetInfo,
};
pub use crate::injector::{
    bind_value, instantiate, to_value, BaseInjector, Injector, InjectorFactory, InjectorRegistry,
};
pub use crate::process::resolve_pids;
pub use crate::rule::{RuleDocument, RuleFault, RuleStore, RuleUnit};
pub use crate::runtime::{
    build_runtime, ContainerRuntime, DockerRuntime, ExecOutput, HostRuntime, ProcessEntry,
    RuntimeKind,
};
pub use crate::util::parse_timeout_secs;
