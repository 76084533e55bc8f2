//! Store configuration: where the state blob lives and how eagerly it is flushed.

use crate::error::Result;
use crate::persistence::{SledPersistence, DEFAULT_STATE_KEY};
use crate::store::ApplicationStore;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_true() -> bool {
    true
}

/// | Key / Env | Default | Description |
/// |-----------|---------|-------------|
/// | storage_path / CYBERDECK__STORAGE_PATH | ./data/cyberdeck_store | Sled directory. |
/// | state_key / CYBERDECK__STATE_KEY | cyberdeck_os_state | Key of the state blob. |
/// | flush_on_write / CYBERDECK__FLUSH_ON_WRITE | true | Flush sled after every write. |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub storage_path: String,
    pub state_key: String,
    #[serde(default = "default_true")]
    pub flush_on_write: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_path: "./data/cyberdeck_store".to_string(),
            state_key: DEFAULT_STATE_KEY.to_string(),
            flush_on_write: true,
        }
    }
}

impl StoreConfig {
    /// Precedence: `CYBERDECK__*` env > file at `CYBERDECK_CONFIG` (default `config/cyberdeck`) > defaults.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("CYBERDECK_CONFIG").unwrap_or_else(|_| "config/cyberdeck".to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Same as [`Self::load`] with an explicit file path. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let defaults = Self::default();
        let builder = config::Config::builder()
            .set_default("storage_path", defaults.storage_path)?
            .set_default("state_key", defaults.state_key)?
            .set_default("flush_on_write", defaults.flush_on_write)?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("CYBERDECK").separator("__"))
            .build()?;

        Ok(built.try_deserialize()?)
    }

    /// Opens the configured sled medium without loading state.
    pub fn open_persistence(&self) -> Result<SledPersistence> {
        Ok(SledPersistence::open(Some(&self.storage_path))?
            .with_key(self.state_key.clone())
            .with_flush_on_write(self.flush_on_write))
    }

    /// Opens the configured medium and rehydrates a store from it.
    pub fn open(&self) -> Result<ApplicationStore<SledPersistence>> {
        tracing::info!(path = %self.storage_path, key = %self.state_key, "opening application store");
        Ok(ApplicationStore::init(self.open_persistence()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = StoreConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.state_key, DEFAULT_STATE_KEY);
        assert!(cfg.flush_on_write);
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cyberdeck.toml");
        std::fs::write(&path, "storage_path = \"/tmp/deck\"\nflush_on_write = false\n").unwrap();
        let cfg = StoreConfig::load_from(&path).unwrap();
        assert_eq!(cfg.storage_path, "/tmp/deck");
        assert_eq!(cfg.state_key, DEFAULT_STATE_KEY);
        assert!(!cfg.flush_on_write);
    }
}
