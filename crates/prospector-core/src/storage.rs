//! Durable storage of the active mission set.
//!
//! The record is a versioned bincode payload, base64-encoded and written as
//! text. Absolute deadlines are clock-relative and meaningless across a
//! restart, so each entry carries the seconds left in its phase instead;
//! deadlines are rebuilt from them against the clock at load time.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entry::{MissionEntry, Phase};

/// Version number of the record format (increment when it changes).
const SAVE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SaveData {
    version: u32,
    active: Vec<MissionEntry>,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("mission record encoding error: {0}")]
    Encoding(#[from] bincode::Error),
    #[error("mission record is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("mission record version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Where the encoded record lives.
pub trait MissionStore {
    /// The stored payload, or `None` when nothing was ever written.
    fn read(&mut self) -> Result<Option<String>, StorageError>;

    /// Replace the stored payload.
    fn write(&mut self, payload: &str) -> Result<(), StorageError>;
}

/// A record in a single file, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `file_name` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>, file_name: &str) -> Self {
        Self::new(dir.as_ref().join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MissionStore for FileStore {
    fn read(&mut self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, payload: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp_path = self.path.with_extension("tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(payload.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

/// In-memory store. Clones share the same slot, so a caller can keep a
/// handle to inspect what the scheduler wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(payload.into()))),
        }
    }

    pub fn payload(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl MissionStore for MemoryStore {
    fn read(&mut self) -> Result<Option<String>, StorageError> {
        Ok(self.payload())
    }

    fn write(&mut self, payload: &str) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(payload.to_string());
        Ok(())
    }
}

/// Encode `entries` as of `now_tick`, converting deadlines to remaining
/// seconds.
pub fn encode(entries: &[MissionEntry], now_tick: u64, ticks_per_second: u32) -> Result<String, StorageError> {
    let tps = f64::from(ticks_per_second.max(1));
    let active = entries
        .iter()
        .map(|entry| {
            let mut saved = entry.clone();
            saved.remaining_seconds = entry.deadline_tick.saturating_sub(now_tick) as f64 / tps;
            saved
        })
        .collect();
    let bytes = bincode::serialize(&SaveData {
        version: SAVE_VERSION,
        active,
    })?;
    Ok(STANDARD.encode(bytes))
}

/// Decode a record, rebuilding deadlines against `now_tick`.
///
/// An empty payload is an empty set. Entries that cannot be resumed (already
/// complete, or missing the snapshot their phase needs) are skipped.
pub fn decode(payload: &str, now_tick: u64, ticks_per_second: u32) -> Result<Vec<MissionEntry>, StorageError> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Ok(Vec::new());
    }
    let bytes = STANDARD.decode(payload)?;
    let data: SaveData = bincode::deserialize(&bytes)?;
    if data.version != SAVE_VERSION {
        return Err(StorageError::VersionMismatch {
            expected: SAVE_VERSION,
            found: data.version,
        });
    }

    let tps = f64::from(ticks_per_second.max(1));
    let mut entries = Vec::with_capacity(data.active.len());
    for mut entry in data.active {
        if entry.phase == Phase::Complete || !entry.is_consistent() {
            log::warn!(
                "Skipping unresumable mission for {} in phase {}",
                entry.origin,
                entry.phase
            );
            continue;
        }
        let remaining = if entry.remaining_seconds.is_finite() {
            entry.remaining_seconds.max(0.0)
        } else {
            0.0
        };
        entry.remaining_seconds = remaining;
        entry.deadline_tick = now_tick.saturating_add((remaining * tps) as u64);
        entries.push(entry);
    }
    Ok(entries)
}

/// Write the active set to `store`.
pub fn save(
    store: &mut (impl MissionStore + ?Sized),
    entries: &[MissionEntry],
    now_tick: u64,
    ticks_per_second: u32,
) -> Result<(), StorageError> {
    let payload = encode(entries, now_tick, ticks_per_second)?;
    store.write(&payload)
}

/// Read the active set from `store`. A missing or unreadable record is an
/// empty set.
pub fn load(store: &mut (impl MissionStore + ?Sized), now_tick: u64, ticks_per_second: u32) -> Vec<MissionEntry> {
    let payload = match store.read() {
        Ok(Some(payload)) => payload,
        Ok(None) => return Vec::new(),
        Err(e) => {
            log::warn!("Could not read mission record, starting empty: {}", e);
            return Vec::new();
        }
    };
    match decode(&payload, now_tick, ticks_per_second) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Discarding malformed mission record: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{IdentityId, OriginId, Placement};

    fn entry(origin: i64, phase: Phase, deadline_tick: u64) -> MissionEntry {
        MissionEntry {
            origin: OriginId(origin),
            snapshot: if phase.holds_snapshot() { vec![9; 16] } else { Vec::new() },
            return_placement: Placement::default(),
            phase,
            deadline_tick,
            remaining_seconds: 0.0,
            ore: "Gold".into(),
            planned_duration_seconds: 900.0,
            mission_duration_seconds: 540.0,
            length_scale: 1.5,
            yield_units: 321.5,
            failed: true,
            operator_skill: 3,
            charge_identity: IdentityId(77),
            full_mission_cost: 4567,
        }
    }

    #[test]
    fn test_roundtrip_rebuilds_deadlines() {
        let entries = vec![entry(1, Phase::Countdown, 1_600), entry(2, Phase::Stored, 40_000)];
        let payload = encode(&entries, 1_000, 60).unwrap();

        // Reload on a fresh clock.
        let loaded = decode(&payload, 0, 60).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].deadline_tick, 600);
        assert_eq!(loaded[1].deadline_tick, 39_000);
        assert_eq!(loaded[1].snapshot, vec![9; 16]);
        assert_eq!(loaded[1].charge_identity, IdentityId(77));
        assert_eq!(loaded[1].yield_units, 321.5);
    }

    #[test]
    fn test_overdue_entries_resume_immediately() {
        let payload = encode(&[entry(1, Phase::Stored, 100)], 500, 60).unwrap();
        let loaded = decode(&payload, 2_000, 60).unwrap();
        assert_eq!(loaded[0].remaining_seconds, 0.0);
        assert_eq!(loaded[0].deadline_tick, 2_000);
    }

    #[test]
    fn test_garbage_reads_as_empty() {
        let mut store = MemoryStore::with_payload("definitely not base64 !!");
        assert!(load(&mut store, 0, 60).is_empty());

        let mut store = MemoryStore::with_payload(STANDARD.encode([1u8, 2, 3]));
        assert!(load(&mut store, 0, 60).is_empty());

        let mut store = MemoryStore::with_payload("   ");
        assert!(load(&mut store, 0, 60).is_empty());

        let mut store = MemoryStore::new();
        assert!(load(&mut store, 0, 60).is_empty());
    }

    #[test]
    fn test_version_mismatch() {
        let bytes = bincode::serialize(&SaveData {
            version: SAVE_VERSION + 1,
            active: Vec::new(),
        })
        .unwrap();
        let err = decode(&STANDARD.encode(bytes), 0, 60).unwrap_err();
        assert!(matches!(err, StorageError::VersionMismatch { .. }));
    }

    #[test]
    fn test_skips_inconsistent_entries() {
        let mut broken = entry(3, Phase::Stored, 10);
        broken.snapshot.clear();
        let payload = encode(&[broken, entry(4, Phase::Returning, 10)], 0, 60).unwrap();
        let loaded = decode(&payload, 0, 60).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].origin, OriginId(4));
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::in_dir(dir.path().join("world"), "missions.bin");
        assert!(store.read().unwrap().is_none());

        save(&mut store, &[entry(5, Phase::Countdown, 600)], 0, 60).unwrap();
        assert!(store.path().exists());
        assert!(!store.path().with_extension("tmp").exists());

        let loaded = load(&mut store, 60, 60);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].deadline_tick, 660);
    }

    #[test]
    fn test_memory_store_handles_share_slot() {
        let store = MemoryStore::new();
        let mut writer = store.clone();
        writer.write("abc").unwrap();
        assert_eq!(store.payload().as_deref(), Some("abc"));
    }
}
