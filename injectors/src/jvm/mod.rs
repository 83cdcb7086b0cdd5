//! JVM fault family: faults applied to a separate, already-running JVM
//! process through rule files its embedded companion agent consumes.

pub mod method_exception;

use faultd_core::api::{AgentError, ContainerRuntime};

pub const TARGET_JVM: &str = "jvm";
pub const FAULT_METHOD_EXCEPTION: &str = "methodexception";

/// One parsed `class@method@payload` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpec {
    pub class: String,
    pub method: String,
    pub payload: String,
}

impl MethodSpec {
    /// Rule selector: "class@method".
    pub fn selector(&self) -> String {
        format!("{}@{}", self.class, self.method)
    }
}

/// Parse a comma-separated method list, e.g.
/// `com.test.Client@sayHello@boom,com.test.Client@bye@oops`.
pub fn parse_method_list(list: &str) -> Result<Vec<MethodSpec>, AgentError> {
    let list = list.trim();
    if list.is_empty() {
        return Err(AgentError::Validation("\"method\" must not be empty".into()));
    }

    let mut specs = Vec::new();
    for entry in list.split(',') {
        let parts: Vec<&str> = entry.trim().split('@').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(AgentError::Validation(format!(
                "\"method\" entry [{entry}] is invalid, expected class@method@payload"
            )));
        }
        specs.push(MethodSpec {
            class: parts[0].to_string(),
            method: parts[1].to_string(),
            payload: parts[2].to_string(),
        });
    }
    Ok(specs)
}

/// Verify `java` is executable inside the target. JVM faults require the
/// target runtime's tooling to attach the companion agent.
pub async fn check_java(rt: &dyn ContainerRuntime) -> Result<(), AgentError> {
    rt.exec_ok("command -v java").await.map_err(|e| {
        AgentError::Validation(format!("java executable not found in target: {e}"))
    })?;
    Ok(())
}
