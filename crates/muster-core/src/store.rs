//! Promotion record persistence
//!
//! Maps member ids to the moment they entered probation. The file form is a
//! single JSON object `{ "<member id>": "<ISO-8601 timestamp>" }`, rewritten
//! in full on every save.

use crate::error::StoreError;
use crate::types::MemberId;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A member's probation entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionRecord {
    /// Member on probation
    pub member_id: MemberId,
    /// When the probation role was granted
    pub promoted_at: DateTime<Utc>,
}

/// Storage seam for promotion records
///
/// Writes are persist-on-write: callers `set` and then `save_all`.
#[cfg_attr(test, mockall::automock)]
pub trait PromotionStore: Send + Sync {
    /// Timestamp recorded for a member
    fn get(&self, member: &MemberId) -> Option<DateTime<Utc>>;

    /// Record (or overwrite) a member's timestamp in memory
    fn set(&self, member: MemberId, promoted_at: DateTime<Utc>);

    /// Persist every record
    ///
    /// # Errors
    /// Returns `StoreError` if the records cannot be written.
    fn save_all(&self) -> Result<(), StoreError>;

    /// Snapshot of all records, ordered by member id
    fn records(&self) -> Vec<PromotionRecord>;
}

/// Format a timestamp the way the store file holds it
#[inline]
#[must_use]
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Promotion records mirrored to a JSON file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<BTreeMap<MemberId, DateTime<Utc>>>,
}

impl JsonFileStore {
    /// Open the store at `path`
    ///
    /// A missing, empty or unparsable file yields an empty store; the file
    /// itself is left untouched until the next save.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = load_records(&path);
        Self {
            path,
            records: Mutex::new(records),
        }
    }

    /// File backing this store
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load_records(path: &Path) -> BTreeMap<MemberId, DateTime<Utc>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "promotion store not found, starting fresh");
            return BTreeMap::new();
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to read promotion store");
            return BTreeMap::new();
        }
    };

    if text.trim().is_empty() {
        tracing::info!(path = %path.display(), "promotion store is empty, starting fresh");
        return BTreeMap::new();
    }

    match parse_records(&text) {
        Ok(records) => {
            tracing::debug!(path = %path.display(), count = records.len(), "loaded promotion records");
            records
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to parse promotion store");
            BTreeMap::new()
        }
    }
}

fn parse_records(text: &str) -> Result<BTreeMap<MemberId, DateTime<Utc>>, serde_json::Error> {
    let raw: BTreeMap<MemberId, serde_json::Value> = serde_json::from_str(text)?;
    let mut records = BTreeMap::new();
    for (member, value) in raw {
        let parsed = value
            .as_str()
            .ok_or_else(|| format!("expected a timestamp string, found {value}"))
            .and_then(|stamp| DateTime::parse_from_rfc3339(stamp).map_err(|e| e.to_string()));
        match parsed {
            Ok(at) => {
                records.insert(member, at.with_timezone(&Utc));
            }
            Err(e) => {
                tracing::warn!(member = %member, error = %e, "skipping unreadable promotion record");
            }
        }
    }
    Ok(records)
}

fn encode_records(records: &BTreeMap<MemberId, DateTime<Utc>>) -> Result<String, StoreError> {
    let raw: BTreeMap<&MemberId, String> = records
        .iter()
        .map(|(member, at)| (member, format_timestamp(at)))
        .collect();
    Ok(serde_json::to_string_pretty(&raw)?)
}

impl PromotionStore for JsonFileStore {
    fn get(&self, member: &MemberId) -> Option<DateTime<Utc>> {
        self.records.lock().get(member).copied()
    }

    fn set(&self, member: MemberId, promoted_at: DateTime<Utc>) {
        self.records.lock().insert(member, promoted_at);
    }

    fn save_all(&self) -> Result<(), StoreError> {
        let encoded = encode_records(&self.records.lock())?;
        std::fs::write(&self.path, encoded).map_err(|e| StoreError::io_error(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), "saved promotion records");
        Ok(())
    }

    fn records(&self) -> Vec<PromotionRecord> {
        snapshot(&self.records.lock())
    }
}

fn snapshot(records: &BTreeMap<MemberId, DateTime<Utc>>) -> Vec<PromotionRecord> {
    records
        .iter()
        .map(|(member_id, promoted_at)| PromotionRecord {
            member_id: member_id.clone(),
            promoted_at: *promoted_at,
        })
        .collect()
}

/// In-memory store; `save_all` only counts calls
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<MemberId, DateTime<Utc>>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `save_all` calls so far
    #[inline]
    #[must_use]
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }
}

impl PromotionStore for MemoryStore {
    fn get(&self, member: &MemberId) -> Option<DateTime<Utc>> {
        self.records.lock().get(member).copied()
    }

    fn set(&self, member: MemberId, promoted_at: DateTime<Utc>) {
        self.records.lock().insert(member, promoted_at);
    }

    fn save_all(&self) -> Result<(), StoreError> {
        *self.saves.lock() += 1;
        Ok(())
    }

    fn records(&self) -> Vec<PromotionRecord> {
        snapshot(&self.records.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trip_keeps_exact_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("promotions.json");
        std::fs::write(&path, r#"{ "123": "2024-01-01T00:00:00.000Z" }"#).unwrap();

        let store = JsonFileStore::open(&path);
        let at = store.get(&MemberId::from("123")).unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        store.save_all().unwrap();
        let reopened = JsonFileStore::open(&path);
        let at = reopened.get(&MemberId::from("123")).unwrap();
        assert_eq!(format_timestamp(&at), "2024-01-01T00:00:00.000Z");
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains(r#""123": "2024-01-01T00:00:00.000Z""#));
    }

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("absent.json"));
        assert!(store.records().is_empty());
    }

    #[test]
    fn whitespace_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("promotions.json");
        std::fs::write(&path, "  \n").unwrap();
        assert!(JsonFileStore::open(&path).records().is_empty());
    }

    #[test]
    fn corrupt_file_falls_back_and_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("promotions.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::open(&path);
        assert!(store.records().is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");

        store.set(MemberId::from("7"), Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        store.save_all().unwrap();
        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.records().len(), 1);
    }

    #[test]
    fn unreadable_entries_are_skipped_individually() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("promotions.json");
        std::fs::write(
            &path,
            r#"{ "1": "2024-01-01T00:00:00.000Z", "2": "last tuesday", "3": 42 }"#,
        )
        .unwrap();

        let store = JsonFileStore::open(&path);
        let kept: Vec<String> = store
            .records()
            .into_iter()
            .map(|r| r.member_id.as_str().to_string())
            .collect();
        assert_eq!(kept, vec!["1".to_string()]);
        assert_eq!(
            store.get(&MemberId::from("1")),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(store.get(&MemberId::from("2")), None);
    }

    #[test]
    fn set_overwrites_existing_entry() {
        let store = MemoryStore::new();
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        store.set(MemberId::from("1"), first);
        store.set(MemberId::from("1"), second);
        assert_eq!(store.get(&MemberId::from("1")), Some(second));
        assert_eq!(store.records().len(), 1);
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("nested/promotions.json"));
        store.set(MemberId::from("1"), Utc::now());
        assert!(matches!(store.save_all(), Err(StoreError::Io { .. })));
    }
}
