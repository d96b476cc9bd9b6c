//! Data-driven behavior tree content.
//!
//! Trees and node configuration live in a data directory:
//!
//! ```text
//! data_dir/
//! ├── config.toml
//! └── trees/
//!     ├── guard.bt
//!     └── patrol.bt
//! ```
//!
//! `config.toml` is optional. Its `[scheduler]` table feeds
//! [`SchedulerConfig`](behavior_tree::SchedulerConfig) and its `[[nodes]]`
//! entries bind DSL tokens to built-in implementations. Without `[[nodes]]`
//! every built-in is available under its default token.

pub mod config;
pub mod loader;

pub use config::{ConfigLoader, ContentConfig};
pub use loader::ContentLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
