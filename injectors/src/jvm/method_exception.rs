//! (jvm, methodexception): make selected methods of a running JVM process
//! throw, by writing a rule file the in-process companion agent applies.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use faultd_core::api::{
    bind_value, resolve_pids, to_value, AgentContext, AgentError, BaseInjector, Injector,
    InjectorFactory, RecoveryFailure, RuleDocument, RuleFault, RuleStore, RuleUnit, TargetInfo,
};

use super::{check_java, parse_method_list, MethodSpec, FAULT_METHOD_EXCEPTION, TARGET_JVM};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MethodExceptionArgs {
    /// Target process pid; 0 means "resolve by key".
    #[serde(default)]
    pub pid: u32,
    /// Search key over the process table when no pid is given.
    #[serde(default)]
    pub key: String,
    /// Method list: "class@method@message,class@method@message".
    #[serde(default)]
    pub method: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MethodExceptionRuntime {
    /// Pids a rule file was (or was being) written for. Recover iterates
    /// exactly this set.
    #[serde(default)]
    pub attack_pids: Vec<u32>,
}

pub struct MethodExceptionInjector {
    base: BaseInjector,
    store: RuleStore,
    args: MethodExceptionArgs,
    runtime: MethodExceptionRuntime,
}

impl MethodExceptionInjector {
    pub fn new(ctx: &AgentContext) -> Self {
        Self::with_store(ctx.rule_store(TARGET_JVM))
    }

    pub fn with_store(store: RuleStore) -> Self {
        Self {
            base: BaseInjector::new(),
            store,
            args: MethodExceptionArgs::default(),
            runtime: MethodExceptionRuntime::default(),
        }
    }

    pub fn factory() -> InjectorFactory {
        Box::new(|ctx| Box::new(Self::new(ctx)))
    }

    /// Bind a preconfigured runtime adapter instead of building one from
    /// the target info.
    pub fn set_adapter(&mut self, rt: std::sync::Arc<dyn faultd_core::api::ContainerRuntime>) {
        self.base.set_adapter(rt);
    }

    fn rule_document(
        &self,
        specs: &[MethodSpec],
        expire_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> RuleDocument {
        RuleDocument::new(
            specs
                .iter()
                .map(|spec| RuleUnit {
                    selector: spec.selector(),
                    fault: RuleFault::Exception,
                    content: format!("throw new Exception(\"{}\");", spec.payload),
                    line_num: 0,
                    expire_at,
                })
                .collect(),
        )
    }

    async fn do_inject(&mut self) -> Result<(), AgentError> {
        let rt = self.base.adapter()?;
        let pids = resolve_pids(rt.as_ref(), self.args.pid, &self.args.key).await?;
        tracing::debug!(pids = ?pids, "target pid list");

        // Committed before the side effect: recover iterates this set even
        // if a crash or failure leaves only some rule files written.
        self.runtime.attack_pids = pids.clone();

        let specs = parse_method_list(&self.args.method)?;
        let doc = self.rule_document(&specs, self.base.expire_at()?);

        for pid in pids {
            self.store
                .write(rt.as_ref(), &self.base.info.container_id, pid, &doc)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Injector for MethodExceptionInjector {
    fn target(&self) -> &'static str {
        TARGET_JVM
    }

    fn fault(&self) -> &'static str {
        FAULT_METHOD_EXCEPTION
    }

    fn info(&self) -> &TargetInfo {
        &self.base.info
    }

    fn set_info(&mut self, info: TargetInfo) {
        self.base.info = info;
    }

    fn get_args(&self) -> Result<serde_json::Value, AgentError> {
        to_value("args", &self.args)
    }

    fn set_args(&mut self, args: serde_json::Value) -> Result<(), AgentError> {
        self.args = bind_value("args", args)?;
        Ok(())
    }

    fn get_runtime(&self) -> Result<serde_json::Value, AgentError> {
        to_value("runtime", &self.runtime)
    }

    fn set_runtime(&mut self, runtime: serde_json::Value) -> Result<(), AgentError> {
        if runtime.is_null() {
            self.runtime = MethodExceptionRuntime::default();
            return Ok(());
        }
        self.runtime = bind_value("runtime", runtime)?;
        Ok(())
    }

    async fn validate(&mut self) -> Result<(), AgentError> {
        self.base.validate().await?;

        let rt = self.base.adapter()?;
        let pids = resolve_pids(rt.as_ref(), self.args.pid, &self.args.key)
            .await
            .map_err(|e| match e {
                AgentError::TargetNotFound(_) => e,
                other => AgentError::Validation(format!("get target pid failed: {other}")),
            })?;

        for pid in pids {
            let path = self.store.derive_path(&self.base.info.container_id, pid);
            if self.store.exists(&path) {
                return Err(AgentError::Validation(format!(
                    "a jvm experiment is already running in process [{pid}]"
                )));
            }
        }

        parse_method_list(&self.args.method)?;
        check_java(rt.as_ref()).await?;
        Ok(())
    }

    async fn inject(&mut self) -> Result<(), AgentError> {
        match self.do_inject().await {
            Ok(()) => Ok(()),
            Err(inject_err) => {
                // Compensate before surfacing the original failure.
                tracing::warn!(error = %inject_err, "inject failed, compensating");
                match self.recover().await {
                    Ok(()) => Err(inject_err),
                    Err(recover_err) => Err(AgentError::InjectCompensated {
                        inject: inject_err.to_string(),
                        recover: recover_err.to_string(),
                    }),
                }
            }
        }
    }

    async fn recover(&mut self) -> Result<(), AgentError> {
        // An empty pid set is a legitimate no-op: a crash between resolving
        // targets and writing rules leaves nothing to clean.
        if self.runtime.attack_pids.is_empty() {
            return Ok(());
        }

        let rt = self.base.adapter()?;
        let mut failures: Vec<RecoveryFailure> = Vec::new();

        for pid in &self.runtime.attack_pids {
            let path = self.store.derive_path(&self.base.info.container_id, *pid);
            if !self.store.exists(&path) {
                continue;
            }
            if let Err(e) = self
                .store
                .remove(rt.as_ref(), &self.base.info.container_id, *pid)
                .await
            {
                failures.push(RecoveryFailure {
                    target: format!("pid {pid}"),
                    reason: e.to_string(),
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AgentError::PartialRecovery(failures))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultd_core::api::{AdapterError, ContainerRuntime, ExecOutput, ProcessEntry, RuntimeKind};
    use std::path::Path;
    use std::sync::Arc;

    use std::sync::atomic::{AtomicUsize, Ordering};

    // Scriptable adapter: fixed process table, optional copy_in and
    // remove_file failures.
    struct FakeRuntime {
        kind: RuntimeKind,
        table: Vec<ProcessEntry>,
        fail_copy_in: bool,
        fail_remove: bool,
        remove_calls: AtomicUsize,
    }

    impl FakeRuntime {
        fn table_for(pids: &[u32]) -> Vec<ProcessEntry> {
            pids.iter()
                .map(|p| ProcessEntry {
                    pid: *p,
                    command: format!("java -jar app-{p}.jar"),
                })
                .collect()
        }

        fn host(pids: &[u32]) -> Self {
            Self {
                kind: RuntimeKind::Host,
                table: Self::table_for(pids),
                fail_copy_in: false,
                fail_remove: false,
                remove_calls: AtomicUsize::new(0),
            }
        }

        fn docker_failing_copy(pids: &[u32]) -> Self {
            Self {
                kind: RuntimeKind::Docker,
                table: Self::table_for(pids),
                fail_copy_in: true,
                fail_remove: false,
                remove_calls: AtomicUsize::new(0),
            }
        }

        fn docker_failing_remove(pids: &[u32]) -> Self {
            Self {
                kind: RuntimeKind::Docker,
                table: Self::table_for(pids),
                fail_copy_in: false,
                fail_remove: true,
                remove_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ContainerRuntime for FakeRuntime {
        fn kind(&self) -> RuntimeKind {
            self.kind
        }
        async fn reachable(&self) -> Result<(), AdapterError> {
            Ok(())
        }
        async fn exec(&self, cmd: &str) -> Result<ExecOutput, AdapterError> {
            // only the java probe runs through exec here
            Ok(ExecOutput {
                code: 0,
                stdout: format!("ok: {cmd}"),
                stderr: String::new(),
            })
        }
        async fn copy_in(&self, host: &Path, target: &str) -> Result<(), AdapterError> {
            if self.fail_copy_in {
                return Err(AdapterError::Copy {
                    from: host.to_string_lossy().to_string(),
                    to: target.to_string(),
                    reason: "forced failure".into(),
                });
            }
            Ok(())
        }
        async fn copy_out(&self, _t: &str, _h: &Path) -> Result<(), AdapterError> {
            Ok(())
        }
        async fn remove_file(&self, p: &str) -> Result<(), AdapterError> {
            self.remove_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_remove {
                return Err(AdapterError::Remove {
                    path: p.to_string(),
                    reason: "device busy".into(),
                });
            }
            Ok(())
        }
        async fn list_processes(&self) -> Result<Vec<ProcessEntry>, AdapterError> {
            Ok(self.table.clone())
        }
    }

    fn host_injector(
        dir: &tempfile::TempDir,
        pids: &[u32],
        args: MethodExceptionArgs,
        timeout: &str,
    ) -> MethodExceptionInjector {
        let store = RuleStore::new(TARGET_JVM, dir.path(), "/tmp");
        let mut inj = MethodExceptionInjector::with_store(store);
        inj.set_info(TargetInfo {
            uid: "test-uid".into(),
            container_runtime: String::new(),
            container_id: String::new(),
            timeout: timeout.into(),
        });
        inj.set_adapter(Arc::new(FakeRuntime::host(pids)));
        inj.set_args(serde_json::to_value(args).unwrap()).unwrap();
        inj
    }

    fn method_args(pid: u32, method: &str) -> MethodExceptionArgs {
        MethodExceptionArgs {
            pid,
            key: String::new(),
            method: method.into(),
        }
    }

    #[tokio::test]
    async fn inject_writes_one_unit_with_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let mut inj = host_injector(
            &dir,
            &[4242],
            method_args(4242, "com.test.Client@sayHello@boom"),
            "30s",
        );

        inj.validate().await.unwrap();
        inj.inject().await.unwrap();

        let store = RuleStore::new(TARGET_JVM, dir.path(), "/tmp");
        let doc = store.read(&store.derive_path("", 4242)).unwrap();
        assert_eq!(doc.rules.len(), 1);
        let unit = &doc.rules[0];
        assert_eq!(unit.selector, "com.test.Client@sayHello");
        assert_eq!(unit.fault, RuleFault::Exception);
        assert!(unit.content.contains("boom"));
        assert_eq!(unit.line_num, 0);

        let expire = unit.expire_at.expect("expiry set for 30s timeout");
        let delta = expire - chrono::Utc::now();
        assert!(delta.num_seconds() >= 28 && delta.num_seconds() <= 31);
    }

    #[tokio::test]
    async fn empty_timeout_writes_no_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let mut inj = host_injector(&dir, &[1], method_args(1, "a@b@c"), "");

        inj.validate().await.unwrap();
        inj.inject().await.unwrap();

        let store = RuleStore::new(TARGET_JVM, dir.path(), "/tmp");
        let json = std::fs::read_to_string(store.derive_path("", 1)).unwrap();
        assert!(!json.contains("expire_at"));
    }

    #[tokio::test]
    async fn duplicate_rule_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let store = RuleStore::new(TARGET_JVM, dir.path(), "/tmp");
        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(store.derive_path("", 123), "{\"rules\":[]}").unwrap();

        let mut inj = host_injector(&dir, &[123], method_args(123, "a@b@c"), "");
        let err = inj.validate().await.unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
        assert!(err.to_string().contains("already running"));
        assert!(err.to_string().contains("123"));
    }

    #[tokio::test]
    async fn key_resolution_targets_every_match() {
        let dir = tempfile::tempdir().unwrap();
        let mut inj = host_injector(
            &dir,
            &[10, 11],
            MethodExceptionArgs {
                pid: 0,
                key: "java".into(),
                method: "a@b@c".into(),
            },
            "",
        );

        inj.validate().await.unwrap();
        inj.inject().await.unwrap();

        let rt_state: MethodExceptionRuntime =
            serde_json::from_value(inj.get_runtime().unwrap()).unwrap();
        assert_eq!(rt_state.attack_pids, vec![10, 11]);

        let store = RuleStore::new(TARGET_JVM, dir.path(), "/tmp");
        assert!(store.exists(&store.derive_path("", 10)));
        assert!(store.exists(&store.derive_path("", 11)));
    }

    #[tokio::test]
    async fn recover_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut inj = host_injector(&dir, &[7], method_args(7, "a@b@c"), "");

        inj.validate().await.unwrap();
        inj.inject().await.unwrap();

        inj.recover().await.unwrap();
        let store = RuleStore::new(TARGET_JVM, dir.path(), "/tmp");
        assert!(!store.exists(&store.derive_path("", 7)));

        // nothing remains: the second call succeeds trivially
        inj.recover().await.unwrap();
    }

    #[tokio::test]
    async fn partial_remove_is_retried_until_the_container_copy_is_gone() {
        let dir = tempfile::tempdir().unwrap();
        let store = RuleStore::new(TARGET_JVM, dir.path(), "/tmp");
        let mut inj = MethodExceptionInjector::with_store(store);
        inj.set_info(TargetInfo {
            uid: "test-uid".into(),
            container_runtime: "docker".into(),
            container_id: "c1".into(),
            timeout: String::new(),
        });
        let rt = Arc::new(FakeRuntime::docker_failing_remove(&[4242]));
        inj.set_adapter(rt.clone());
        inj.set_args(serde_json::to_value(method_args(4242, "a@b@c")).unwrap())
            .unwrap();

        inj.inject().await.unwrap();

        let err = inj.recover().await.unwrap_err();
        assert!(matches!(err, AgentError::PartialRecovery(_)));
        let attempts_after_first = rt.remove_calls.load(Ordering::SeqCst);

        // the live in-container fault is still there, so a retry must
        // attempt the deletion again instead of reporting success
        let err = inj.recover().await.unwrap_err();
        assert!(matches!(err, AgentError::PartialRecovery(_)));
        assert!(rt.remove_calls.load(Ordering::SeqCst) > attempts_after_first);

        let store = RuleStore::new(TARGET_JVM, dir.path(), "/tmp");
        assert!(store.exists(&store.derive_path("c1", 4242)));
    }

    #[tokio::test]
    async fn recover_with_empty_runtime_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut inj = host_injector(&dir, &[7], method_args(7, "a@b@c"), "");
        inj.set_runtime(serde_json::Value::Null).unwrap();
        inj.recover().await.unwrap();
    }

    #[tokio::test]
    async fn failed_copy_triggers_compensation() {
        let dir = tempfile::tempdir().unwrap();
        let store = RuleStore::new(TARGET_JVM, dir.path(), "/tmp");
        let mut inj = MethodExceptionInjector::with_store(store);
        inj.set_info(TargetInfo {
            uid: "test-uid".into(),
            container_runtime: "docker".into(),
            container_id: "c1".into(),
            timeout: String::new(),
        });
        inj.set_adapter(Arc::new(FakeRuntime::docker_failing_copy(&[4242])));
        inj.set_args(serde_json::to_value(method_args(4242, "a@b@c")).unwrap())
            .unwrap();

        let err = inj.inject().await.unwrap_err();
        assert!(err.to_string().contains("forced failure"));

        // compensation removed the host-side rule file
        let store = RuleStore::new(TARGET_JVM, dir.path(), "/tmp");
        assert!(!store.exists(&store.derive_path("c1", 4242)));
    }

    #[tokio::test]
    async fn runtime_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut inj = host_injector(&dir, &[5], method_args(5, "a@b@c"), "");
        inj.set_runtime(serde_json::json!({"attack_pids": [5, 6]}))
            .unwrap();
        let back = inj.get_runtime().unwrap();
        assert_eq!(back["attack_pids"], serde_json::json!([5, 6]));
    }
}
