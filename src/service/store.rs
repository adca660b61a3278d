//! Backing stores for the completion registry
//!
//! Every store answers the same two questions: what is the status of this
//! credential, and mark it used (idempotently). A roster, when present,
//! limits which credentials exist at all.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::StoreError;

/// Status of a credential as seen by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UidStatus {
    /// Not on the roster
    Unknown,
    Available,
    Used,
}

/// Result of marking a credential used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    Inserted,
    AlreadyRecorded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEntry {
    pub uid: String,
    pub recorded_at: DateTime<Utc>,
}

pub trait UidStore: Send + Sync {
    fn status(&self, uid: &str) -> Result<UidStatus, StoreError>;

    /// Upsert that keeps the first record
    fn mark_used(&self, uid: &str) -> Result<MarkOutcome, StoreError>;

    fn completion_count(&self) -> Result<usize, StoreError>;
}

/// Allow-list of known credentials
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    uids: HashSet<String>,
}

#[derive(Debug, Deserialize)]
struct RosterEntry {
    uid: String,
}

impl Roster {
    pub fn from_uids<I, S>(uids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { uids: uids.into_iter().map(Into::into).collect() }
    }

    /// Load a JSON array of `{"uid": "..."}` objects
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: Vec<RosterEntry> =
            serde_json::from_str(&raw).map_err(|e| StoreError::Roster {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?;
        Ok(Self::from_uids(entries.into_iter().map(|entry| entry.uid)))
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.uids.contains(uid)
    }

    pub fn len(&self) -> usize {
        self.uids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uids.is_empty()
    }
}

fn status_of(roster: Option<&Roster>, used: bool, uid: &str) -> UidStatus {
    if used {
        UidStatus::Used
    } else if roster.is_some_and(|roster| !roster.contains(uid)) {
        UidStatus::Unknown
    } else {
        UidStatus::Available
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// In-memory
// ═══════════════════════════════════════════════════════════════════════════════

/// Completions held for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryUidStore {
    roster: Option<Roster>,
    used: Mutex<HashMap<String, CompletionEntry>>,
}

impl MemoryUidStore {
    pub fn new(roster: Option<Roster>) -> Self {
        Self { roster, used: Mutex::new(HashMap::new()) }
    }
}

impl UidStore for MemoryUidStore {
    fn status(&self, uid: &str) -> Result<UidStatus, StoreError> {
        let used = self.used.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(status_of(self.roster.as_ref(), used.contains_key(uid), uid))
    }

    fn mark_used(&self, uid: &str) -> Result<MarkOutcome, StoreError> {
        let mut used = self.used.lock().map_err(|_| StoreError::Poisoned)?;
        if used.contains_key(uid) {
            return Ok(MarkOutcome::AlreadyRecorded);
        }
        used.insert(
            uid.to_string(),
            CompletionEntry { uid: uid.to_string(), recorded_at: Utc::now() },
        );
        Ok(MarkOutcome::Inserted)
    }

    fn completion_count(&self) -> Result<usize, StoreError> {
        Ok(self.used.lock().map_err(|_| StoreError::Poisoned)?.len())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Flat file
// ═══════════════════════════════════════════════════════════════════════════════

const STORE_FILE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    completions: BTreeMap<String, CompletionEntry>,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self { version: STORE_FILE_VERSION, completions: BTreeMap::new() }
    }
}

/// Completions in one JSON file, rewritten atomically on every insert.
/// The mutex serializes read-modify-write cycles within this process.
#[derive(Debug)]
pub struct FileUidStore {
    path: PathBuf,
    roster: Option<Roster>,
    lock: Mutex<()>,
}

impl FileUidStore {
    pub fn new(path: PathBuf, roster: Option<Roster>) -> Self {
        Self { path, roster, lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<StoreFile, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StoreFile::default()),
            Err(source) => return Err(StoreError::Io { path: self.path.clone(), source }),
        };
        if raw.trim().is_empty() {
            return Ok(StoreFile::default());
        }
        let file: StoreFile = serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            details: e.to_string(),
        })?;
        if file.version != STORE_FILE_VERSION {
            return Err(StoreError::Corrupt {
                path: self.path.clone(),
                details: format!("unsupported version {}", file.version),
            });
        }
        Ok(file)
    }

    fn write(&self, file: &StoreFile) -> Result<(), StoreError> {
        let io_err = |source: std::io::Error| StoreError::Io { path: self.path.clone(), source };
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(io_err)?;

        let json = serde_json::to_string_pretty(file).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            details: e.to_string(),
        })?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

impl UidStore for FileUidStore {
    fn status(&self, uid: &str) -> Result<UidStatus, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let file = self.read()?;
        Ok(status_of(self.roster.as_ref(), file.completions.contains_key(uid), uid))
    }

    fn mark_used(&self, uid: &str) -> Result<MarkOutcome, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut file = self.read()?;
        if file.completions.contains_key(uid) {
            return Ok(MarkOutcome::AlreadyRecorded);
        }
        file.completions.insert(
            uid.to_string(),
            CompletionEntry { uid: uid.to_string(), recorded_at: Utc::now() },
        );
        self.write(&file)?;
        Ok(MarkOutcome::Inserted)
    }

    fn completion_count(&self) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(self.read()?.completions.len())
    }
}
