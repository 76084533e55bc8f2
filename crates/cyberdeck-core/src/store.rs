//! ApplicationStore: the single source of truth shared by every hub.
//!
//! Each mutation runs the pure transition on the in-memory snapshot, then writes the
//! whole snapshot through the persistence adapter. A failed write is logged and counted
//! but never rolls the snapshot back; a missing or corrupt blob at startup falls back to
//! the seed state.

use crate::model::{
    HealthData, IntelBrief, MasteredSkills, MissionLogEntry, Presence, PresenceStatus, SavedHotspot,
};
use crate::persistence::{decode_state, encode_state, StatePersistence};
use crate::state::{Action, AppState, Outcome, Stamp};
use parking_lot::Mutex;
use std::sync::Arc;

/// One store handed to many panels.
pub type SharedStore<P> = Arc<Mutex<ApplicationStore<P>>>;

pub struct ApplicationStore<P: StatePersistence> {
    state: AppState,
    persistence: P,
    persist_failures: u64,
}

impl<P: StatePersistence> ApplicationStore<P> {
    /// Rehydrates from `persistence`, or starts from [`AppState::seed`] when there is
    /// nothing usable stored.
    pub fn init(persistence: P) -> Self {
        let state = match persistence.load() {
            Ok(Some(blob)) => match decode_state(&blob) {
                Ok(state) => {
                    tracing::debug!(bytes = blob.len(), "store rehydrated from persisted state");
                    state
                }
                Err(e) => {
                    tracing::error!(error = %e, "persisted state is corrupt; starting from seed");
                    AppState::seed()
                }
            },
            Ok(None) => {
                tracing::debug!("no persisted state; starting from seed");
                AppState::seed()
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to read persisted state; starting from seed");
                AppState::seed()
            }
        };
        Self::with_state(state, persistence)
    }

    /// Starts from an explicit snapshot. Nothing is written until the first mutation.
    pub fn with_state(state: AppState, persistence: P) -> Self {
        Self {
            state,
            persistence,
            persist_failures: 0,
        }
    }

    pub fn into_shared(self) -> SharedStore<P> {
        Arc::new(Mutex::new(self))
    }

    /// Applies `action` and persists the result. Use the named methods below in panel code.
    pub fn dispatch(&mut self, action: Action) -> Outcome {
        self.dispatch_stamped(action, &Stamp::now())
    }

    /// Same as [`Self::dispatch`] with caller-supplied id and time.
    pub fn dispatch_stamped(&mut self, action: Action, stamp: &Stamp) -> Outcome {
        let name = action.name();
        let outcome = self.state.apply(action, stamp);
        tracing::debug!(action = name, ?outcome, "store transition");
        if outcome.changed() {
            self.persist();
        }
        outcome
    }

    pub fn set_active_view(&mut self, view_id: impl Into<String>) -> Outcome {
        self.dispatch(Action::SetActiveView(view_id.into()))
    }

    pub fn add_intel_brief(&mut self, brief: IntelBrief) -> Outcome {
        self.dispatch(Action::AddIntelBrief(brief))
    }

    pub fn add_mission_log(&mut self, entry: MissionLogEntry) -> Outcome {
        self.dispatch(Action::AddMissionLog(entry))
    }

    pub fn unlock_achievement(&mut self, text: impl Into<String>, xp: u32) -> Outcome {
        let text = text.into();
        tracing::info!(achievement = %text, xp, "achievement unlocked");
        self.dispatch(Action::UnlockAchievement { text, xp })
    }

    pub fn save_game_progress(&mut self, game_id: impl Into<String>, data: serde_json::Value) -> Outcome {
        self.dispatch(Action::SaveGameProgress {
            game_id: game_id.into(),
            data,
        })
    }

    pub fn toggle_skill_mastery(&mut self, skill_id: impl Into<String>, xp: u32) -> Outcome {
        self.dispatch(Action::ToggleSkillMastery {
            skill_id: skill_id.into(),
            xp,
        })
    }

    pub fn save_hotspot(&mut self, hotspot: SavedHotspot) -> Outcome {
        self.dispatch(Action::SaveHotspot(hotspot))
    }

    pub fn update_presence(&mut self, id: impl Into<String>, status: PresenceStatus) -> Outcome {
        self.dispatch(Action::UpdatePresence { id: id.into(), status })
    }

    pub fn sync_health_data(&mut self, steps: u32, heart_rate: u32) -> Outcome {
        self.dispatch(Action::SyncHealthData { steps, heart_rate })
    }

    /// Drops all state back to the seed and persists it.
    pub fn reset(&mut self) {
        self.state = AppState::seed();
        tracing::info!("store reset to seed state");
        self.persist();
    }

    /// Final write, then hands back the snapshot. The adapter is dropped.
    pub fn teardown(mut self) -> AppState {
        self.persist();
        tracing::debug!(failures = self.persist_failures, "store torn down");
        self.state
    }

    fn persist(&mut self) {
        let written = encode_state(&self.state).and_then(|blob| self.persistence.save(&blob));
        if let Err(e) = written {
            self.persist_failures += 1;
            tracing::warn!(error = %e, failures = self.persist_failures, "failed to persist store state; keeping in-memory state");
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Writes that failed since this store was created.
    pub fn persist_failures(&self) -> u64 {
        self.persist_failures
    }

    pub fn active_view(&self) -> &str {
        &self.state.active_view
    }

    pub fn intel_briefs(&self) -> &[IntelBrief] {
        &self.state.intel_briefs
    }

    pub fn mission_logs(&self) -> &[MissionLogEntry] {
        &self.state.mission_logs
    }

    pub fn game_save(&self, game_id: &str) -> Option<&serde_json::Value> {
        self.state.game_saves.get(game_id)
    }

    pub fn mastered_skills(&self) -> &MasteredSkills {
        &self.state.mastered_skills
    }

    pub fn saved_hotspots(&self) -> &[SavedHotspot] {
        &self.state.saved_hotspots
    }

    pub fn presence(&self) -> &[Presence] {
        &self.state.presence
    }

    pub fn health_data(&self) -> Option<&HealthData> {
        self.state.health_data.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, StoreError};
    use crate::persistence::MemoryPersistence;

    /// Medium whose reads always fail, as with an unreadable storage directory.
    struct UnreadablePersistence;

    impl StatePersistence for UnreadablePersistence {
        fn load(&self) -> Result<Option<Vec<u8>>> {
            Err(StoreError::Storage(sled::Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "storage directory unreadable",
            ))))
        }

        fn save(&self, _blob: &[u8]) -> Result<()> {
            Ok(())
        }

        fn clear(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn every_change_is_written_through() {
        let mut store = ApplicationStore::init(MemoryPersistence::new());
        store.set_active_view("netrunner");
        let blob = store.persistence().snapshot().expect("blob written");
        assert_eq!(decode_state(&blob).unwrap().active_view, "netrunner");
    }

    #[test]
    fn no_op_outcomes_skip_the_write() {
        let mut store = ApplicationStore::init(MemoryPersistence::new());
        assert_eq!(store.update_presence("nobody", PresenceStatus::Away), Outcome::NotFound);
        assert!(store.persistence().snapshot().is_none());
    }

    #[test]
    fn quota_failure_keeps_memory_state() {
        let mut store = ApplicationStore::init(MemoryPersistence::with_quota(16));
        let outcome = store.unlock_achievement("Found secret", 250);
        assert_eq!(outcome, Outcome::Inserted);
        assert_eq!(store.mission_logs()[0].text, "Found secret");
        assert_eq!(store.persist_failures(), 1);
        assert!(store.persistence().snapshot().is_none());
    }

    #[test]
    fn corrupt_blob_falls_back_to_seed() {
        let store = ApplicationStore::init(MemoryPersistence::with_blob(&b"\x00\x01garbage"[..]));
        assert_eq!(store.state(), &AppState::seed());
    }

    #[test]
    fn read_error_falls_back_to_seed() {
        let mut store = ApplicationStore::init(UnreadablePersistence);
        assert_eq!(store.state(), &AppState::seed());
        assert_eq!(store.persist_failures(), 0);

        store.set_active_view("netrunner");
        assert_eq!(store.active_view(), "netrunner");
        assert_eq!(store.persist_failures(), 0);
    }

    #[test]
    fn reset_restores_seed() {
        let mut store = ApplicationStore::init(MemoryPersistence::new());
        store.save_game_progress("tetris", serde_json::json!({"score": 9000}));
        store.reset();
        assert_eq!(store.state(), &AppState::seed());
        let blob = store.persistence().snapshot().unwrap();
        assert_eq!(decode_state(&blob).unwrap(), AppState::seed());
    }
}
