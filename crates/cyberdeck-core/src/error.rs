//! Error type shared by the persistence adapters and configuration loader.

use thiserror::Error;

/// Errors raised while reading, writing or configuring the persisted store.
///
/// None of these are fatal to the application store itself: writes that fail are
/// logged and counted, reads that fail fall back to the seed state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("state codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("storage quota exceeded: blob is {needed} bytes, quota is {quota} bytes")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
