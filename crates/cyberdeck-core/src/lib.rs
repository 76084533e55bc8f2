//! Cyberdeck OS — core library.
//! The persisted application store shared by every dashboard hub: navigation, intel feed,
//! mission log, game saves, skill mastery, discovered hotspots, presence and health sync.

pub mod config;
pub mod error;
pub mod model;
pub mod persistence;
pub mod state;
pub mod store;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use model::{
    GameSaves, HealthData, IntelBrief, MasteredSkills, MissionKind, MissionLogEntry, MissionStatus,
    Presence, PresenceStatus, SavedHotspot, Severity,
};
pub use persistence::{
    decode_state, encode_state, MemoryPersistence, SledPersistence, StatePersistence, DEFAULT_STATE_KEY,
};
pub use state::{
    Action, AppState, Outcome, Stamp, DEFAULT_VIEW, HOTSPOT_CAPACITY, INTEL_BRIEF_CAPACITY,
    MISSION_LOG_CAPACITY, PRESENCE_SEEN_NOW,
};
pub use store::{ApplicationStore, SharedStore};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
