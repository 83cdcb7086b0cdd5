//! Process-wide injector table, built explicitly by a startup routine and
//! read-mostly afterwards. No import-time side effects: every supported
//! fault family is registered by one call from the assembly layer.

use std::collections::HashMap;

use anyhow::anyhow;

use super::Injector;
use crate::context::AgentContext;
use crate::error::AgentError;

pub type InjectorFactory = Box<dyn Fn(&AgentContext) -> Box<dyn Injector> + Send + Sync>;

#[derive(Default)]
pub struct InjectorRegistry {
    table: HashMap<(String, String), InjectorFactory>,
}

impl InjectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for a (target, fault) pair. A duplicate pair is
    /// a programming error and aborts startup.
    pub fn register(
        &mut self,
        target: &str,
        fault: &str,
        factory: InjectorFactory,
    ) -> Result<(), AgentError> {
        let key = (target.to_string(), fault.to_string());
        if self.table.contains_key(&key) {
            return Err(AgentError::Internal(anyhow!(
                "duplicate injector registration for target [{target}] fault [{fault}]"
            )));
        }
        self.table.insert(key, factory);
        Ok(())
    }

    pub fn lookup(&self, target: &str, fault: &str) -> Result<&InjectorFactory, AgentError> {
        self.table
            .get(&(target.to_string(), fault.to_string()))
            .ok_or_else(|| AgentError::UnknownInjector {
                target: target.to_string(),
                fault: fault.to_string(),
            })
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::TargetInfo;
    use async_trait::async_trait;

    struct NoopInjector {
        info: TargetInfo,
    }

    #[async_trait]
    impl Injector for NoopInjector {
        fn target(&self) -> &'static str {
            "demo"
        }
        fn fault(&self) -> &'static str {
            "noop"
        }
        fn info(&self) -> &TargetInfo {
            &self.info
        }
        fn set_info(&mut self, info: TargetInfo) {
            self.info = info;
        }
        fn get_args(&self) -> Result<serde_json::Value, AgentError> {
            Ok(serde_json::Value::Null)
        }
        fn set_args(&mut self, _: serde_json::Value) -> Result<(), AgentError> {
            Ok(())
        }
        fn get_runtime(&self) -> Result<serde_json::Value, AgentError> {
            Ok(serde_json::Value::Null)
        }
        fn set_runtime(&mut self, _: serde_json::Value) -> Result<(), AgentError> {
            Ok(())
        }
        async fn validate(&mut self) -> Result<(), AgentError> {
            Ok(())
        }
        async fn inject(&mut self) -> Result<(), AgentError> {
            Ok(())
        }
        async fn recover(&mut self) -> Result<(), AgentError> {
            Ok(())
        }
    }

    fn noop_factory() -> InjectorFactory {
        Box::new(|_ctx| {
            Box::new(NoopInjector {
                info: TargetInfo::default(),
            })
        })
    }

    #[test]
    fn duplicate_registration_fails_fast() {
        let mut reg = InjectorRegistry::new();
        reg.register("demo", "noop", noop_factory()).unwrap();
        let err = reg.register("demo", "noop", noop_factory()).unwrap_err();
        assert!(err.to_string().contains("duplicate injector registration"));
    }

    #[test]
    fn lookup_unknown_pair_is_an_error() {
        let reg = InjectorRegistry::new();
        let err = reg.lookup("demo", "missing").err().unwrap();
        assert!(matches!(err, AgentError::UnknownInjector { .. }));
    }
}
