//! Termination record persistence
//!
//! One namespace key holds `{"reason": "..."}`. A record present at start-up
//! forces the `terminated` phase. Anything that fails to parse is treated as
//! no record at all, so a corrupt value fails open to `login`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::StorageError;
use crate::DEFAULT_TERMINATION_REASON;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationRecord {
    #[serde(default)]
    pub reason: String,
}

/// Durable, synchronous key-value slot for the termination record
pub trait TerminationStore {
    fn save(&mut self, reason: &str) -> Result<(), StorageError>;
    fn load(&self) -> Option<TerminationRecord>;
    fn clear(&mut self) -> Result<(), StorageError>;
}

/// Decode a stored value; `None` for anything malformed
pub fn parse_record(raw: &str) -> Option<TerminationRecord> {
    match serde_json::from_str::<TerminationRecord>(raw) {
        Ok(mut record) => {
            if record.reason.trim().is_empty() {
                record.reason = DEFAULT_TERMINATION_REASON.to_string();
            }
            Some(record)
        }
        Err(e) => {
            warn!(error = %e, "Ignoring malformed termination record");
            None
        }
    }
}

fn encode_record(reason: &str) -> Result<String, StorageError> {
    Ok(serde_json::to_string(&TerminationRecord { reason: reason.to_string() })?)
}

// ═══════════════════════════════════════════════════════════════════════════════
// File-backed
// ═══════════════════════════════════════════════════════════════════════════════

/// Stores the record as `<dir>/<namespace>.json`
#[derive(Debug, Clone)]
pub struct FileTerminationStore {
    path: PathBuf,
}

impl FileTerminationStore {
    pub fn new(dir: &Path, namespace: &str) -> Self {
        Self { path: dir.join(format!("{}.json", namespace)) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io { path: self.path.clone(), source }
    }
}

impl TerminationStore for FileTerminationStore {
    fn save(&mut self, reason: &str) -> Result<(), StorageError> {
        let json = encode_record(reason)?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;

        // Temp file + rename so a crash never leaves a half-written record
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(json.as_bytes()).map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        Ok(())
    }

    fn load(&self) -> Option<TerminationRecord> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => parse_record(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Termination record unreadable");
                None
            }
        }
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// In-memory
// ═══════════════════════════════════════════════════════════════════════════════

/// Process-local slot. Clones share the same slot, so a "reloaded"
/// controller built from a clone sees what the previous one wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryTerminationStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryTerminationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the slot with an arbitrary raw value
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self { slot: Arc::new(Mutex::new(Some(raw.into()))) }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    fn write(&self, value: Option<String>) {
        match self.slot.lock() {
            Ok(mut slot) => *slot = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }
}

impl TerminationStore for MemoryTerminationStore {
    fn save(&mut self, reason: &str) -> Result<(), StorageError> {
        self.write(Some(encode_record(reason)?));
        Ok(())
    }

    fn load(&self) -> Option<TerminationRecord> {
        self.raw().as_deref().and_then(parse_record)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.write(None);
        Ok(())
    }
}
