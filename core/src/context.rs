//! Agent assembly context: configuration plus store construction helpers
//! shared by the dispatch layer and the injector factories.

use std::path::PathBuf;

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::experiment::ExperimentStore;
use crate::rule::RuleStore;

pub struct AgentContext {
    cfg: AgentConfig,
}

impl AgentContext {
    pub fn new(cfg: AgentConfig) -> Self {
        Self { cfg }
    }

    pub fn cfg(&self) -> &AgentConfig {
        &self.cfg
    }

    pub fn experiment_store(&self) -> Result<ExperimentStore, AgentError> {
        ExperimentStore::new(PathBuf::from(&self.cfg.data_dir).join("experiments"))
    }

    /// Rule store scoped to one fault family prefix.
    pub fn rule_store(&self, family: &str) -> RuleStore {
        RuleStore::new(
            family,
            self.cfg.rule_store.host_dir.as_str(),
            self.cfg.rule_store.container_dir.as_str(),
        )
    }
}
