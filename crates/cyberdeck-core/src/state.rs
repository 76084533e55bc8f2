//! In-memory snapshot of the application store and the pure transition function over it.
//!
//! `AppState::apply` never touches storage; the store layer calls it and then hands the
//! new snapshot to a persistence adapter. Every transition reports an [`Outcome`] so
//! callers and tests can tell an insert from an eviction or a duplicate.

use crate::model::{
    lenient, GameSaves, HealthData, IntelBrief, MasteredSkills, MissionKind, MissionLogEntry, MissionStatus,
    Presence, PresenceStatus, SavedHotspot, Severity,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const INTEL_BRIEF_CAPACITY: usize = 50;
pub const MISSION_LOG_CAPACITY: usize = 100;
pub const HOTSPOT_CAPACITY: usize = 500;

/// View shown on a fresh install.
pub const DEFAULT_VIEW: &str = "dashboard";

/// `lastSeen` label written by a presence update.
pub const PRESENCE_SEEN_NOW: &str = "NOW";

/// Whole persisted state. Missing fields in an older blob read as their defaults, and a
/// field whose stored shape no longer decodes is reset on its own without touching the rest.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    #[serde(deserialize_with = "lenient")]
    pub active_view: String,
    #[serde(deserialize_with = "lenient")]
    pub intel_briefs: Vec<IntelBrief>,
    #[serde(deserialize_with = "lenient")]
    pub mission_logs: Vec<MissionLogEntry>,
    #[serde(deserialize_with = "lenient")]
    pub game_saves: GameSaves,
    #[serde(deserialize_with = "lenient")]
    pub mastered_skills: MasteredSkills,
    #[serde(deserialize_with = "lenient")]
    pub saved_hotspots: Vec<SavedHotspot>,
    #[serde(deserialize_with = "lenient")]
    pub presence: Vec<Presence>,
    #[serde(deserialize_with = "lenient")]
    pub health_data: Option<HealthData>,
}

/// Generated values an action may need (entry id, display time, sync timestamp).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    pub id: String,
    pub time_label: String,
    pub at: DateTime<Utc>,
}

impl Stamp {
    pub fn now() -> Self {
        Self::at(Uuid::new_v4().to_string(), Utc::now())
    }

    pub fn at(id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            time_label: at.format("%H:%M:%S").to_string(),
            at,
        }
    }
}

/// One state transition requested by a panel.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetActiveView(String),
    AddIntelBrief(IntelBrief),
    AddMissionLog(MissionLogEntry),
    UnlockAchievement { text: String, xp: u32 },
    SaveGameProgress { game_id: String, data: serde_json::Value },
    ToggleSkillMastery { skill_id: String, xp: u32 },
    SaveHotspot(SavedHotspot),
    UpdatePresence { id: String, status: PresenceStatus },
    SyncHealthData { steps: u32, heart_rate: u32 },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetActiveView(_) => "set_active_view",
            Self::AddIntelBrief(_) => "add_intel_brief",
            Self::AddMissionLog(_) => "add_mission_log",
            Self::UnlockAchievement { .. } => "unlock_achievement",
            Self::SaveGameProgress { .. } => "save_game_progress",
            Self::ToggleSkillMastery { .. } => "toggle_skill_mastery",
            Self::SaveHotspot(_) => "save_hotspot",
            Self::UpdatePresence { .. } => "update_presence",
            Self::SyncHealthData { .. } => "sync_health_data",
        }
    }
}

/// What a transition did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Field overwritten (view, game save, presence, health).
    Applied,
    /// Entry prepended, collection still within capacity.
    Inserted,
    /// Entry prepended and `evicted` oldest entries dropped to stay within capacity.
    EvictedOldest { evicted: usize },
    /// A hotspot with the same BSSID is already stored; nothing changed.
    DuplicateIgnored,
    /// No presence record with that id; nothing changed.
    NotFound,
    /// Skill added to the mastered set and a mission log entry appended.
    Mastered { evicted: usize },
    /// Skill removed from the mastered set. Not logged.
    Unmastered,
}

impl Outcome {
    /// True when the transition changed the snapshot.
    pub fn changed(&self) -> bool {
        !matches!(self, Self::DuplicateIgnored | Self::NotFound)
    }
}

/// Prepends `item` and truncates to `capacity`. Returns how many entries fell off the end.
fn prepend_bounded<T>(items: &mut Vec<T>, item: T, capacity: usize) -> usize {
    items.insert(0, item);
    let evicted = items.len().saturating_sub(capacity);
    items.truncate(capacity);
    evicted
}

fn inserted_or_evicted(evicted: usize) -> Outcome {
    if evicted == 0 {
        Outcome::Inserted
    } else {
        Outcome::EvictedOldest { evicted }
    }
}

impl AppState {
    /// Fixed first-run state.
    pub fn seed() -> Self {
        Self {
            active_view: DEFAULT_VIEW.to_string(),
            intel_briefs: vec![
                IntelBrief::new("intel-boot", "SYSTEM", "Kernel handshake complete. All hubs online.", Severity::Info)
                    .with_timestamp("00:00:00"),
                IntelBrief::new("intel-grid", "NETWORK", "Anomalous traffic detected on sector 7 uplink.", Severity::Medium)
                    .with_timestamp("00:00:00"),
            ],
            mission_logs: vec![
                MissionLogEntry::task("mission-calibrate", "Calibrate neural interface", "00:00:00", 100)
                    .with_status(MissionStatus::Complete),
                MissionLogEntry::task("mission-recon", "Map the local wireless grid", "00:00:00", 150)
                    .with_status(MissionStatus::Pending),
            ],
            game_saves: GameSaves::new(),
            mastered_skills: MasteredSkills::new(),
            saved_hotspots: Vec::new(),
            presence: vec![
                Presence::new("op-1", "Ghost", PresenceStatus::Online, "NOW"),
                Presence::new("op-2", "Cipher", PresenceStatus::Away, "5m ago"),
                Presence::new("op-3", "Vector", PresenceStatus::Offline, "2h ago"),
                Presence::new("op-4", "Nyx", PresenceStatus::Online, "NOW"),
            ],
            health_data: None,
        }
    }

    /// Applies one action in place. Never fails; no-op conditions come back as outcomes.
    pub fn apply(&mut self, action: Action, stamp: &Stamp) -> Outcome {
        match action {
            Action::SetActiveView(view) => {
                self.active_view = view;
                Outcome::Applied
            }
            Action::AddIntelBrief(brief) => {
                inserted_or_evicted(prepend_bounded(&mut self.intel_briefs, brief, INTEL_BRIEF_CAPACITY))
            }
            Action::AddMissionLog(entry) => self.push_mission_log(entry),
            Action::UnlockAchievement { text, xp } => {
                let entry = MissionLogEntry::achievement(stamp.id.clone(), text, stamp.time_label.clone(), xp);
                self.push_mission_log(entry)
            }
            Action::SaveGameProgress { game_id, data } => {
                self.game_saves.insert(game_id, data);
                Outcome::Applied
            }
            Action::ToggleSkillMastery { skill_id, xp } => {
                if self.mastered_skills.remove(&skill_id) {
                    return Outcome::Unmastered;
                }
                let entry = MissionLogEntry::task(
                    stamp.id.clone(),
                    format!("SKILL MASTERED: {}", skill_id),
                    stamp.time_label.clone(),
                    xp,
                )
                .with_status(MissionStatus::Complete);
                self.mastered_skills.insert(skill_id);
                let evicted = prepend_bounded(&mut self.mission_logs, entry, MISSION_LOG_CAPACITY);
                Outcome::Mastered { evicted }
            }
            Action::SaveHotspot(mut hotspot) => {
                if self.saved_hotspots.iter().any(|h| h.bssid == hotspot.bssid) {
                    return Outcome::DuplicateIgnored;
                }
                hotspot.strip_shadowed_extra();
                inserted_or_evicted(prepend_bounded(&mut self.saved_hotspots, hotspot, HOTSPOT_CAPACITY))
            }
            Action::UpdatePresence { id, status } => {
                match self.presence.iter_mut().find(|p| p.id == id) {
                    Some(record) => {
                        record.status = status;
                        record.last_seen = PRESENCE_SEEN_NOW.to_string();
                        Outcome::Applied
                    }
                    None => Outcome::NotFound,
                }
            }
            Action::SyncHealthData { steps, heart_rate } => {
                self.health_data = Some(HealthData {
                    steps,
                    heart_rate,
                    last_sync: stamp.at,
                });
                Outcome::Applied
            }
        }
    }

    fn push_mission_log(&mut self, entry: MissionLogEntry) -> Outcome {
        inserted_or_evicted(prepend_bounded(&mut self.mission_logs, entry, MISSION_LOG_CAPACITY))
    }

    /// XP carried by the retained mission log. Entries evicted by capacity no longer count.
    pub fn total_xp(&self) -> u64 {
        self.mission_logs.iter().map(|e| u64::from(e.xp)).sum()
    }

    pub fn achievements(&self) -> impl Iterator<Item = &MissionLogEntry> {
        self.mission_logs
            .iter()
            .filter(|e| e.kind == MissionKind::Achievement)
    }

    pub fn is_mastered(&self, skill_id: &str) -> bool {
        self.mastered_skills.contains(skill_id)
    }

    pub fn hotspot(&self, bssid: &str) -> Option<&SavedHotspot> {
        self.saved_hotspots.iter().find(|h| h.bssid == bssid)
    }

    pub fn presence_of(&self, id: &str) -> Option<&Presence> {
        self.presence.iter().find(|p| p.id == id)
    }
}
