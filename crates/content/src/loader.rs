//! Content loader for a behavior tree data directory.

use std::path::{Path, PathBuf};

use anyhow::Context;
use behavior_tree::{Compiled, Issue, NodeRegistry, Scheduler, compile};

use crate::{ConfigLoader, ContentConfig, LoadResult, read_file};

/// File extension of tree scripts.
pub const TREE_EXTENSION: &str = "bt";

/// Loads configuration and tree scripts from a data directory.
pub struct ContentLoader {
    data_dir: PathBuf,
}

impl ContentLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load `config.toml`, falling back to defaults when it does not exist.
    pub fn load_config(&self) -> LoadResult<ContentConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(ContentConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Path of `trees/{name}.bt`.
    pub fn tree_path(&self, name: &str) -> PathBuf {
        self.data_dir
            .join("trees")
            .join(format!("{name}.{TREE_EXTENSION}"))
    }

    /// Load the DSL text of `trees/{name}.bt`.
    pub fn load_tree_source(&self, name: &str) -> LoadResult<String> {
        read_file(&self.tree_path(name))
    }

    /// Compile `trees/{name}.bt` against `registry`.
    ///
    /// Malformed lines do not fail the load; they are reported in
    /// [`Compiled::issues`].
    pub fn compile_tree(&self, name: &str, registry: &NodeRegistry) -> LoadResult<Compiled> {
        let source = self
            .load_tree_source(name)
            .with_context(|| format!("Failed to load tree `{name}`"))?;
        let compiled = compile(&source, registry);
        for issue in &compiled.issues {
            tracing::warn!(tree = name, line = issue.line, error = %issue.error, "tree issue");
        }
        Ok(compiled)
    }

    /// Configure a scheduler and load `trees/{name}.bt` into it.
    ///
    /// Returns the scheduler along with the compiler's issues.
    pub fn load_scheduler(&self, name: &str) -> LoadResult<(Scheduler, Vec<Issue>)> {
        let config = self.load_config()?;
        let registry = config.registry()?;
        let Compiled { tree, issues } = self.compile_tree(name, &registry)?;

        let mut scheduler = Scheduler::new(config.scheduler);
        scheduler.load(tree);
        Ok((scheduler, issues))
    }

    /// Names of every tree script in `trees/`, sorted.
    pub fn tree_names(&self) -> LoadResult<Vec<String>> {
        let dir = self.data_dir.join("trees");
        let entries = std::fs::read_dir(&dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()))?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(TREE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
