use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use appreg::RegistryConfig;
use appreg_memory::Collation;
use serde::{Deserialize, Serialize};

/// Snapshot file used when neither `--store` nor the config names one.
pub const DEFAULT_SNAPSHOT: &str = "appreg.json";

/// CLI configuration file.
///
/// ```toml
/// [registry.secrets]
/// iterations = 3
///
/// [store]
/// snapshot = "apps.json"
/// collation = "case_insensitive"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub registry: RegistryConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub snapshot: Option<PathBuf>,
    pub collation: Collation,
}

impl CliConfig {
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid configuration file")?;
        config.registry.validate()?;
        Ok(config)
    }
}

pub fn load(path: Option<&Path>) -> Result<CliConfig> {
    let Some(path) = path else {
        return Ok(CliConfig::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    CliConfig::parse(&content)
}

pub fn resolve_snapshot(cli_store: Option<&Path>, config: &CliConfig) -> PathBuf {
    // 1. --store flag / APPREG_STORE env
    if let Some(path) = cli_store {
        return path.to_path_buf();
    }
    // 2. [store] section
    if let Some(path) = &config.store.snapshot {
        return path.clone();
    }
    PathBuf::from(DEFAULT_SNAPSHOT)
}
