//! Record types held by the application store.
//!
//! Field names serialize in camelCase so the persisted blob keeps the layout panels
//! already read (`missionLogs`, `savedHotspots`, `heartRate`, ...).

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Opaque per-game save blobs keyed by game identifier. Last write wins per key.
pub type GameSaves = BTreeMap<String, serde_json::Value>;

/// Skill ids the operator has mastered.
pub type MasteredSkills = BTreeSet<String>;

/// Hotspot keys stored as named fields; never kept in [`SavedHotspot::extra`].
pub const HOTSPOT_FIELDS: [&str; 5] = ["bssid", "ssid", "lat", "lng", "security"];

/// Decodes `T`, or yields `T::default()` when the stored value has the wrong shape
/// (unknown enum variant, wrong type). Keeps one bad value from discarding a whole blob.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Severity of an intel brief.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
    #[default]
    Info,
}

/// One notification shown in the intel feed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntelBrief {
    pub id: String,
    pub timestamp: String,
    /// Free-form category label (`type` in the persisted blob).
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    #[serde(deserialize_with = "lenient")]
    pub severity: Severity,
}

impl IntelBrief {
    pub fn new(
        id: impl Into<String>,
        kind: impl Into<String>,
        content: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp: Utc::now().to_rfc3339(),
            kind: kind.into(),
            content: content.into(),
            severity,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MissionKind {
    #[default]
    Task,
    Achievement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionStatus {
    Complete,
    Unlocked,
    Active,
    #[default]
    Pending,
}

/// One line of the mission log: a user action or an unlocked achievement, with its XP.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MissionLogEntry {
    pub id: String,
    #[serde(rename = "type", deserialize_with = "lenient")]
    pub kind: MissionKind,
    #[serde(deserialize_with = "lenient")]
    pub status: MissionStatus,
    pub text: String,
    pub time: String,
    #[serde(deserialize_with = "lenient")]
    pub xp: u32,
}

impl MissionLogEntry {
    /// A task entry; status defaults to `active` until changed with [`Self::with_status`].
    pub fn task(id: impl Into<String>, text: impl Into<String>, time: impl Into<String>, xp: u32) -> Self {
        Self {
            id: id.into(),
            kind: MissionKind::Task,
            status: MissionStatus::Active,
            text: text.into(),
            time: time.into(),
            xp,
        }
    }

    pub fn achievement(id: impl Into<String>, text: impl Into<String>, time: impl Into<String>, xp: u32) -> Self {
        Self {
            id: id.into(),
            kind: MissionKind::Achievement,
            status: MissionStatus::Unlocked,
            text: text.into(),
            time: time.into(),
            xp,
        }
    }

    pub fn with_status(mut self, status: MissionStatus) -> Self {
        self.status = status;
        self
    }
}

/// A discovered wireless network. Identity is the `bssid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedHotspot {
    #[serde(default)]
    pub bssid: String,
    #[serde(default, deserialize_with = "lenient")]
    pub ssid: String,
    #[serde(default, deserialize_with = "lenient")]
    pub lat: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub lng: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub security: String,
    /// Scanner-specific fields (channel, signal, vendor, ...) kept verbatim.
    /// Never holds a key from [`HOTSPOT_FIELDS`].
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SavedHotspot {
    pub fn new(bssid: impl Into<String>, ssid: impl Into<String>) -> Self {
        Self {
            bssid: bssid.into(),
            ssid: ssid.into(),
            lat: 0.0,
            lng: 0.0,
            security: String::new(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_position(mut self, lat: f64, lng: f64) -> Self {
        self.lat = lat;
        self.lng = lng;
        self
    }

    pub fn with_security(mut self, security: impl Into<String>) -> Self {
        self.security = security.into();
        self
    }

    /// Adds a scanner field. Keys naming a built-in field are dropped; set those directly.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        let key = key.into();
        if HOTSPOT_FIELDS.contains(&key.as_str()) {
            tracing::debug!(key = %key, "ignoring extra hotspot field that shadows a named field");
            return self;
        }
        self.extra.insert(key, value);
        self
    }

    /// Removes `extra` keys that would serialize twice next to the named fields.
    /// Returns how many were dropped.
    pub fn strip_shadowed_extra(&mut self) -> usize {
        let before = self.extra.len();
        self.extra.retain(|k, _| !HOTSPOT_FIELDS.contains(&k.as_str()));
        before - self.extra.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Away,
    #[default]
    Offline,
}

/// Simulated presence of one operator on the fixed roster.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Presence {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "lenient")]
    pub status: PresenceStatus,
    pub last_seen: String,
}

impl Presence {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        status: PresenceStatus,
        last_seen: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status,
            last_seen: last_seen.into(),
        }
    }
}

/// Last biometric sync. Replaced wholesale on every sync, never merged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthData {
    #[serde(deserialize_with = "lenient")]
    pub steps: u32,
    #[serde(deserialize_with = "lenient")]
    pub heart_rate: u32,
    #[serde(deserialize_with = "lenient")]
    pub last_sync: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mission_entry_uses_wire_names() {
        let entry = MissionLogEntry::achievement("m1", "Found secret", "12:00:00", 250);
        let v = serde_json::to_value(&entry).unwrap();
        assert_eq!(v["type"], "ACHIEVEMENT");
        assert_eq!(v["status"], "unlocked");
        assert_eq!(v["xp"], 250);
    }

    #[test]
    fn hotspot_keeps_unknown_fields() {
        let raw = r#"{"bssid":"AA:BB","ssid":"X","lat":1.5,"lng":2.5,"security":"WPA2","channel":6}"#;
        let hotspot: SavedHotspot = serde_json::from_str(raw).unwrap();
        assert_eq!(hotspot.extra.get("channel"), Some(&serde_json::json!(6)));

        let back = serde_json::to_value(&hotspot).unwrap();
        assert_eq!(back["channel"], 6);
        assert_eq!(back["security"], "WPA2");
    }

    #[test]
    fn intel_brief_severity_defaults_to_info() {
        let raw = r#"{"id":"b1","timestamp":"t","type":"SYS","content":"boot"}"#;
        let brief: IntelBrief = serde_json::from_str(raw).unwrap();
        assert_eq!(brief.severity, Severity::Info);
        assert_eq!(brief.kind, "SYS");
    }

    #[test]
    fn extra_cannot_shadow_named_fields() {
        let hotspot = SavedHotspot::new("AA:BB", "X")
            .with_extra("ssid", serde_json::json!("Y"))
            .with_extra("vendor", serde_json::json!("Acme"));
        assert!(!hotspot.extra.contains_key("ssid"));
        let blob = serde_json::to_string(&hotspot).unwrap();
        let back: SavedHotspot = serde_json::from_str(&blob).unwrap();
        assert_eq!(back.ssid, "X");
        assert_eq!(back.extra.get("vendor"), Some(&serde_json::json!("Acme")));
    }

    #[test]
    fn strip_removes_keys_inserted_directly() {
        let mut hotspot = SavedHotspot::new("AA:BB", "X");
        hotspot.extra.insert("lat".into(), serde_json::json!(9.0));
        hotspot.extra.insert("channel".into(), serde_json::json!(6));
        assert_eq!(hotspot.strip_shadowed_extra(), 1);
        assert_eq!(hotspot.extra.len(), 1);
    }

    #[test]
    fn partial_records_fill_defaults() {
        let brief: IntelBrief = serde_json::from_str(r#"{"id":"x","type":"SYS","content":"c"}"#).unwrap();
        assert_eq!(brief.timestamp, "");
        assert_eq!(brief.content, "c");

        let entry: MissionLogEntry = serde_json::from_str(r#"{"id":"m","text":"t","xp":5}"#).unwrap();
        assert_eq!(entry.kind, MissionKind::Task);
        assert_eq!(entry.status, MissionStatus::Pending);
        assert_eq!(entry.time, "");
        assert_eq!(entry.xp, 5);

        let op: Presence = serde_json::from_str(r#"{"id":"op-9","name":"Zero"}"#).unwrap();
        assert_eq!(op.status, PresenceStatus::Offline);
        assert_eq!(op.last_seen, "");
    }

    #[test]
    fn unknown_enum_values_fall_back_to_default() {
        let brief: IntelBrief =
            serde_json::from_str(r#"{"id":"x","type":"SYS","content":"c","severity":"critical"}"#).unwrap();
        assert_eq!(brief.severity, Severity::Info);

        let entry: MissionLogEntry =
            serde_json::from_str(r#"{"id":"m","type":"BOUNTY","status":"archived","text":"t","time":"now"}"#)
                .unwrap();
        assert_eq!((entry.kind, entry.status), (MissionKind::Task, MissionStatus::Pending));

        let op: Presence =
            serde_json::from_str(r#"{"id":"op-1","name":"Ghost","status":"invisible","lastSeen":"NOW"}"#).unwrap();
        assert_eq!(op.status, PresenceStatus::Offline);
    }

    #[test]
    fn health_data_serializes_camel_case() {
        let health = HealthData {
            steps: 1200,
            heart_rate: 72,
            last_sync: Utc::now(),
        };
        let v = serde_json::to_value(&health).unwrap();
        assert_eq!(v["heartRate"], 72);
        assert!(v.get("lastSync").is_some());
    }
}
