use std::path::{Path, PathBuf};

use super::types::AgentConfig;

/// Get the default faultd data directory: ~/.faultd (or FAULTD_DATA_DIR).
pub fn get_faultd_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(v) = std::env::var("FAULTD_DATA_DIR") {
        if !v.trim().is_empty() {
            return Ok(PathBuf::from(v));
        }
    }
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".faultd"))
}

pub fn load_default() -> anyhow::Result<AgentConfig> {
    // Priority 1: <data_dir>/config.toml (highest)
    let data_dir = get_faultd_data_dir()?;
    let agent_config = data_dir.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let mut cfg: AgentConfig = if agent_config.exists() {
        let s = std::fs::read_to_string(&agent_config)?;
        toml::from_str::<AgentConfig>(&s)?
    } else if local_config.exists() {
        let s = std::fs::read_to_string(local_config)?;
        toml::from_str::<AgentConfig>(&s)?
    } else {
        AgentConfig::default()
    };

    if cfg.data_dir.trim().is_empty() {
        cfg.data_dir = data_dir.to_string_lossy().to_string();
    }

    if cfg.rule_store.host_dir.trim().is_empty() {
        cfg.rule_store.host_dir = PathBuf::from(&cfg.data_dir)
            .join("rules")
            .to_string_lossy()
            .to_string();
    }

    if cfg
        .logging
        .directory
        .as_deref()
        .map(str::trim)
        .map(str::is_empty)
        .unwrap_or(true)
    {
        cfg.logging.directory = Some(
            PathBuf::from(&cfg.data_dir)
                .join("logs")
                .to_string_lossy()
                .to_string(),
        );
    }

    // Environment overrides (Priority 0: highest)
    if let Ok(v) = std::env::var("FAULTD_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.logging.level = v;
        }
    }

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_derived_dirs() {
        let cfg: AgentConfig = toml::from_str("").unwrap();
        assert!(cfg.data_dir.is_empty());
        assert_eq!(cfg.rule_store.container_dir, "/tmp");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn parses_partial_toml() {
        let cfg: AgentConfig = toml::from_str(
            r#"
            data_dir = "/var/lib/faultd"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.data_dir, "/var/lib/faultd");
        assert_eq!(cfg.logging.level, "debug");
        assert!(cfg.logging.console);
    }
}
