//! Environment configuration for the `bt` binary.
use std::env;
use std::path::PathBuf;

/// Defaults taken from the environment (and `.env`).
///
/// Command-line arguments override every field.
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub data_dir: PathBuf,
    pub tick_period: Option<f32>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            tick_period: None,
        }
    }
}

impl CliConfig {
    /// Construct configuration from environment variables.
    ///
    /// Environment variables:
    /// - `BT_DATA_DIR` - Data directory holding `config.toml` and `trees/` (default: `data`)
    /// - `BT_TICK_PERIOD` - Seconds between traversals, overriding `config.toml`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = read_env::<PathBuf>("BT_DATA_DIR") {
            config.data_dir = dir;
        }
        if let Some(period) = read_env::<f32>("BT_TICK_PERIOD") {
            config.tick_period = Some(period);
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
