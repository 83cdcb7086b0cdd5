use serde::{Deserialize, Serialize};

/// Agent-wide configuration, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AgentConfig {
    /// Root directory for agent state (experiment records, rule files, logs).
    /// Empty means "resolve at load time" (~/.faultd or FAULTD_DATA_DIR).
    pub data_dir: String,
    pub logging: LoggingConfig,
    pub rule_store: RuleStoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub level: String,
    pub console: bool,
    pub file: bool,
    /// Log directory; empty means `<data_dir>/logs`.
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            console: true,
            file: false,
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleStoreConfig {
    /// Host-side directory for rule files; empty means `<data_dir>/rules`.
    pub host_dir: String,
    /// In-container directory the companion agent watches.
    pub container_dir: String,
}

impl Default for RuleStoreConfig {
    fn default() -> Self {
        Self {
            host_dir: String::new(),
            container_dir: "/tmp".to_string(),
        }
    }
}
