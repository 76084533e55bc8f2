//! Persistence adapters: where the serialized [`AppState`] blob lives between runs.
//!
//! The whole state is one JSON document under one fixed key. Adapters only move bytes;
//! encoding lives in [`encode_state`] / [`decode_state`].

use crate::error::{Result, StoreError};
use crate::state::AppState;
use parking_lot::Mutex;
use std::path::Path;

/// Storage key of the state blob.
pub const DEFAULT_STATE_KEY: &str = "cyberdeck_os_state";

const DEFAULT_STORAGE_PATH: &str = "./data/cyberdeck_store";

/// A durable (or test) medium holding a single state blob.
pub trait StatePersistence {
    /// Returns the stored blob, or `None` when nothing has been written yet.
    fn load(&self) -> Result<Option<Vec<u8>>>;

    /// Replaces the stored blob.
    fn save(&self, blob: &[u8]) -> Result<()>;

    /// Removes the stored blob.
    fn clear(&self) -> Result<()>;
}

pub fn encode_state(state: &AppState) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(state)?)
}

pub fn decode_state(blob: &[u8]) -> Result<AppState> {
    Ok(serde_json::from_slice(blob)?)
}

/// Sled-backed medium on the local filesystem.
pub struct SledPersistence {
    db: sled::Db,
    key: String,
    flush_on_write: bool,
}

impl SledPersistence {
    /// Opens (or creates) the database at `path`; `None` uses `./data/cyberdeck_store`.
    pub fn open(path: Option<impl AsRef<Path>>) -> Result<Self> {
        let p = path
            .map(|x| x.as_ref().to_path_buf())
            .unwrap_or_else(|| Path::new(DEFAULT_STORAGE_PATH).to_path_buf());
        let db = sled::open(p)?;
        Ok(Self {
            db,
            key: DEFAULT_STATE_KEY.to_string(),
            flush_on_write: true,
        })
    }

    /// Uses a different storage key (e.g. one blob per profile in a shared database).
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// When false, writes reach sled's page cache and are flushed on sled's own schedule.
    pub fn with_flush_on_write(mut self, flush: bool) -> Self {
        self.flush_on_write = flush;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl StatePersistence for SledPersistence {
    fn load(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(self.key.as_bytes())?.map(|iv| iv.to_vec()))
    }

    fn save(&self, blob: &[u8]) -> Result<()> {
        self.db.insert(self.key.as_bytes(), blob)?;
        if self.flush_on_write {
            self.db.flush()?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.db.remove(self.key.as_bytes())?;
        if self.flush_on_write {
            self.db.flush()?;
        }
        Ok(())
    }
}

/// In-process medium with an optional byte quota, the way browser local storage behaves.
#[derive(Default)]
pub struct MemoryPersistence {
    blob: Mutex<Option<Vec<u8>>>,
    quota: Option<usize>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects writes larger than `quota` bytes with [`StoreError::QuotaExceeded`].
    pub fn with_quota(quota: usize) -> Self {
        Self {
            blob: Mutex::new(None),
            quota: Some(quota),
        }
    }

    /// Starts with `blob` already stored (e.g. a blob left by an earlier run).
    pub fn with_blob(blob: impl Into<Vec<u8>>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
            quota: None,
        }
    }

    /// Copy of the currently stored blob.
    pub fn snapshot(&self) -> Option<Vec<u8>> {
        self.blob.lock().clone()
    }
}

impl StatePersistence for MemoryPersistence {
    fn load(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.snapshot())
    }

    fn save(&self, blob: &[u8]) -> Result<()> {
        if let Some(quota) = self.quota {
            if blob.len() > quota {
                return Err(StoreError::QuotaExceeded {
                    needed: blob.len(),
                    quota,
                });
            }
        }
        *self.blob.lock() = Some(blob.to_vec());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.blob.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_quota_rejects_large_blob_and_keeps_previous() {
        let medium = MemoryPersistence::with_quota(8);
        medium.save(b"small").unwrap();
        let err = medium.save(b"much too large").unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { needed: 14, quota: 8 }));
        assert_eq!(medium.snapshot().as_deref(), Some(&b"small"[..]));
    }

    #[test]
    fn sled_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let medium = SledPersistence::open(Some(dir.path())).unwrap();
        assert!(medium.load().unwrap().is_none());

        medium.save(b"{}").unwrap();
        assert_eq!(medium.load().unwrap().as_deref(), Some(&b"{}"[..]));

        medium.clear().unwrap();
        assert!(medium.load().unwrap().is_none());
    }

    #[test]
    fn sled_keys_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let a = SledPersistence::open(Some(dir.path())).unwrap();
        let blob = encode_state(&AppState::seed()).unwrap();
        a.save(&blob).unwrap();
        let b = a.with_key("profile_two");
        assert_eq!(b.key(), "profile_two");
        assert!(b.load().unwrap().is_none());
    }

    #[test]
    fn codec_round_trip() {
        let state = AppState::seed();
        let decoded = decode_state(&encode_state(&state).unwrap()).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode_state(b"{not json"), Err(StoreError::Codec(_))));
    }
}
