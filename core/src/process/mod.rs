//! Target resolver: turns a loose target specification (explicit pid or a
//! textual search key) into the concrete set of pids it names, scoped to
//! whatever process table the adapter exposes.

use crate::error::AgentError;
use crate::runtime::ContainerRuntime;

/// Resolve target pids for one experiment.
///
/// A nonzero `explicit_pid` wins: it is confirmed against the adapter's
/// process table and returned alone. Otherwise every process whose command
/// line contains `search_key` is returned; more than one match is a valid
/// candidate set, not an error. Match order follows the table's enumeration
/// order and is not stable across calls.
pub async fn resolve_pids(
    rt: &dyn ContainerRuntime,
    explicit_pid: u32,
    search_key: &str,
) -> Result<Vec<u32>, AgentError> {
    if explicit_pid == 0 && search_key.trim().is_empty() {
        return Err(AgentError::Validation(
            "either a pid or a search key must be provided".into(),
        ));
    }

    let table = rt.list_processes().await?;

    if explicit_pid != 0 {
        if table.iter().any(|e| e.pid == explicit_pid) {
            return Ok(vec![explicit_pid]);
        }
        return Err(AgentError::TargetNotFound(format!(
            "process [{explicit_pid}] does not exist"
        )));
    }

    let own_pid = std::process::id();
    let key = search_key.trim();
    let matches: Vec<u32> = table
        .iter()
        .filter(|e| e.pid != own_pid)
        // skip the `ps` helper the container adapters spawn to read the table
        .filter(|e| !e.command.starts_with("ps "))
        .filter(|e| e.command.contains(key))
        .map(|e| e.pid)
        .collect();

    if matches.is_empty() {
        return Err(AgentError::TargetNotFound(format!(
            "no process matches key [{key}]"
        )));
    }

    tracing::debug!(key = %key, pids = ?matches, "resolved target processes");
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdapterError;
    use crate::runtime::{ExecOutput, ProcessEntry, RuntimeKind};
    use async_trait::async_trait;
    use std::path::Path;

    struct TableRuntime {
        entries: Vec<ProcessEntry>,
    }

    impl TableRuntime {
        fn new(rows: &[(u32, &str)]) -> Self {
            Self {
                entries: rows
                    .iter()
                    .map(|(pid, cmd)| ProcessEntry {
                        pid: *pid,
                        command: cmd.to_string(),
                    })
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl ContainerRuntime for TableRuntime {
        fn kind(&self) -> RuntimeKind {
            RuntimeKind::Host
        }
        async fn reachable(&self) -> Result<(), AdapterError> {
            Ok(())
        }
        async fn exec(&self, _cmd: &str) -> Result<ExecOutput, AdapterError> {
            unimplemented!("not used by the resolver")
        }
        async fn copy_in(&self, _h: &Path, _t: &str) -> Result<(), AdapterError> {
            unimplemented!("not used by the resolver")
        }
        async fn copy_out(&self, _t: &str, _h: &Path) -> Result<(), AdapterError> {
            unimplemented!("not used by the resolver")
        }
        async fn remove_file(&self, _p: &str) -> Result<(), AdapterError> {
            unimplemented!("not used by the resolver")
        }
        async fn list_processes(&self) -> Result<Vec<ProcessEntry>, AdapterError> {
            Ok(self.entries.clone())
        }
    }

    #[tokio::test]
    async fn explicit_pid_resolves_to_exactly_that_pid() {
        let rt = TableRuntime::new(&[(1, "/sbin/init"), (4242, "java -jar app.jar")]);
        let pids = resolve_pids(&rt, 4242, "").await.unwrap();
        assert_eq!(pids, vec![4242]);
    }

    #[tokio::test]
    async fn explicit_pid_must_exist() {
        let rt = TableRuntime::new(&[(1, "/sbin/init")]);
        let err = resolve_pids(&rt, 4242, "ignored-key").await.unwrap_err();
        assert!(matches!(err, AgentError::TargetNotFound(_)));
    }

    #[tokio::test]
    async fn search_key_returns_every_match() {
        let rt = TableRuntime::new(&[
            (10, "java -jar a.jar"),
            (11, "java -jar b.jar"),
            (12, "nginx: worker"),
        ]);
        let pids = resolve_pids(&rt, 0, "java").await.unwrap();
        assert_eq!(pids, vec![10, 11]);
    }

    #[tokio::test]
    async fn no_match_is_target_not_found() {
        let rt = TableRuntime::new(&[(12, "nginx: worker")]);
        let err = resolve_pids(&rt, 0, "java").await.unwrap_err();
        assert!(matches!(err, AgentError::TargetNotFound(_)));
        assert!(err.to_string().contains("java"));
    }

    #[tokio::test]
    async fn missing_pid_and_key_is_a_validation_error() {
        let rt = TableRuntime::new(&[]);
        let err = resolve_pids(&rt, 0, "  ").await.unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
    }

    #[tokio::test]
    async fn ps_helper_rows_are_skipped() {
        let rt = TableRuntime::new(&[(99, "ps -eo pid,args"), (100, "java server")]);
        let pids = resolve_pids(&rt, 0, "s").await.unwrap();
        assert_eq!(pids, vec![100]);
    }
}
