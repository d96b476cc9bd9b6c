//! `config.toml` loader.

use std::path::Path;

use behavior_tree::{NodeBinding, NodeRegistry, RegistryConfig, SchedulerConfig};
use serde::Deserialize;

use crate::{LoadResult, read_file};

/// Contents of `config.toml`. Every table is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ContentConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub nodes: Vec<NodeBinding>,
}

impl ContentConfig {
    /// Builds the node registry described by `[[nodes]]`, or the default
    /// registry when no bindings are configured.
    pub fn registry(&self) -> LoadResult<NodeRegistry> {
        if self.nodes.is_empty() {
            return Ok(NodeRegistry::with_defaults());
        }
        let config = RegistryConfig {
            nodes: self.nodes.clone(),
        };
        Ok(NodeRegistry::from_config(&config)?)
    }
}

/// Loader for content configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> LoadResult<ContentConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<ContentConfig> {
        toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))
    }
}
