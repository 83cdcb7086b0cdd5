//! Explicit registry assembly, called once from the CLI at startup.

use faultd_core::api::{AgentError, InjectorRegistry};

use crate::jvm::method_exception::MethodExceptionInjector;
use crate::jvm::{FAULT_METHOD_EXCEPTION, TARGET_JVM};

/// Build the registry of every supported (target, fault) pair. A duplicate
/// registration surfaces here and aborts startup.
pub fn builtin_registry() -> Result<InjectorRegistry, AgentError> {
    let mut registry = InjectorRegistry::new();

    registry.register(
        TARGET_JVM,
        FAULT_METHOD_EXCEPTION,
        MethodExceptionInjector::factory(),
    )?;

    Ok(registry)
}
