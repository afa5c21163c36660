//! Atomic JSON State Persistence
//!
//! `StateManager<T>` owns one local JSON document shaped
//! `{"data": {...}, "metadata": {"created_at", "last_updated", "version"}}`
//! and guarantees crash-safe writes via backup-on-write:
//!
//! 1. rename the current file to `<file>.backup` (if present)
//! 2. write the new content to the primary path
//! 3. delete the backup on success
//! 4. on any failure, rename the backup back over the primary path
//!
//! A reader therefore never observes a truncated or partially-written file:
//! a crash mid-write leaves either the old or the new state intact, never a
//! corrupt hybrid. One writer at a time per manager (process-wide mutex);
//! concurrent managers in different processes get corruption protection from
//! the rename discipline but last-writer-wins semantics.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{ForgeError, Result};

/// Document format version
const STATE_VERSION: &str = "1.0";

/// Bookkeeping stored alongside the data payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateMetadata {
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub version: String,
}

impl StateMetadata {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            last_updated: now,
            version: STATE_VERSION.to_string(),
        }
    }
}

/// The full persisted document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedState<T> {
    pub data: T,
    pub metadata: StateMetadata,
}

/// Atomic, crash-safe load/save of a typed JSON document
pub struct StateManager<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> StateManager<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Open a manager for `path`, writing an empty well-formed document if
    /// the file does not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let manager = Self {
            path: path.into(),
            lock: Mutex::new(()),
            _marker: PhantomData,
        };
        manager.ensure_state_file()?;
        Ok(manager)
    }

    fn ensure_state_file(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| ForgeError::state(format!("Failed to create state dir: {e}")))?;
        }
        debug!(path = %self.path.display(), "Initializing empty state file");
        let document = PersistedState {
            data: T::default(),
            metadata: StateMetadata::new(),
        };
        let content = serde_json::to_string_pretty(&document)
            .map_err(|e| ForgeError::state(format!("Failed to serialize initial state: {e}")))?;
        std::fs::write(&self.path, content)
            .map_err(|e| ForgeError::state(format!("Failed to write initial state: {e}")))?;
        Ok(())
    }

    /// Load and validate the document. Errors are returned, never raised
    /// past the caller.
    pub fn load(&self) -> Result<PersistedState<T>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| ForgeError::state(format!("Failed to read state file: {e}")))?;

        // Validate top-level shape before typed deserialization so a
        // structurally foreign file is reported as a state error, not a
        // field-by-field parse error.
        let value: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| ForgeError::state(format!("State file is not valid JSON: {e}")))?;
        if value.get("data").is_none() {
            return Err(ForgeError::state(
                "Invalid state structure: missing 'data' key",
            ));
        }

        serde_json::from_value(value)
            .map_err(|e| ForgeError::state(format!("State file has unexpected shape: {e}")))
    }

    /// Save atomically with backup. On failure the prior state is restored
    /// and a `StateError` is surfaced.
    pub fn save(&self, data: &T) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let backup = self.backup_path();

        // Preserve created_at/version across saves
        let metadata = self
            .read_metadata()
            .map(|mut m| {
                m.last_updated = Utc::now();
                m
            })
            .unwrap_or_else(StateMetadata::new);

        if self.path.exists() {
            std::fs::rename(&self.path, &backup)
                .map_err(|e| ForgeError::state(format!("Failed to create backup: {e}")))?;
        }

        match self.write_document(data, metadata) {
            Ok(()) => {
                if backup.exists() {
                    // Backup removal failing leaves a stale file behind but
                    // the primary is already consistent
                    if let Err(e) = std::fs::remove_file(&backup) {
                        warn!(path = %backup.display(), error = %e, "Failed to remove backup");
                    }
                }
                Ok(())
            }
            Err(e) => {
                if backup.exists() {
                    if let Err(restore_err) = std::fs::rename(&backup, &self.path) {
                        warn!(
                            path = %self.path.display(),
                            error = %restore_err,
                            "Failed to restore backup after save failure"
                        );
                    }
                }
                Err(ForgeError::state(format!("Failed to save state: {e}")))
            }
        }
    }

    fn write_document(&self, data: &T, metadata: StateMetadata) -> std::io::Result<()> {
        let document = PersistedState {
            // Serialize a borrowed view to avoid cloning the payload
            data: DataRef(data),
            metadata,
        };
        let content = serde_json::to_string_pretty(&document).map_err(std::io::Error::other)?;
        std::fs::write(&self.path, content)
    }

    fn read_metadata(&self) -> Option<StateMetadata> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let value: serde_json::Value = serde_json::from_str(&content).ok()?;
        serde_json::from_value(value.get("metadata")?.clone()).ok()
    }

    fn backup_path(&self) -> PathBuf {
        let mut os = self.path.clone().into_os_string();
        os.push(".backup");
        PathBuf::from(os)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Serialize-only wrapper so `save` can borrow the payload
struct DataRef<'a, T>(&'a T);

impl<T: Serialize> Serialize for DataRef<'_, T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Doc {
        entries: BTreeMap<String, u32>,
        label: String,
    }

    fn manager(dir: &TempDir) -> StateManager<Doc> {
        StateManager::new(dir.path().join("state.json")).unwrap()
    }

    #[test]
    fn test_creates_empty_well_formed_document() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        let state = manager.load().unwrap();
        assert_eq!(state.data, Doc::default());
        assert_eq!(state.metadata.version, "1.0");
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        let doc = Doc {
            entries: BTreeMap::from([("python".to_string(), 3)]),
            label: "keywords".to_string(),
        };
        manager.save(&doc).unwrap();
        assert_eq!(manager.load().unwrap().data, doc);
    }

    #[test]
    fn test_save_removes_backup_on_success() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        manager.save(&Doc::default()).unwrap();
        assert!(!dir.path().join("state.json.backup").exists());
        assert!(dir.path().join("state.json").exists());
    }

    #[test]
    fn test_save_preserves_created_at() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        let created = manager.load().unwrap().metadata.created_at;
        manager.save(&Doc::default()).unwrap();
        let after = manager.load().unwrap().metadata;
        assert_eq!(after.created_at, created);
        assert!(after.last_updated >= created);
    }

    #[test]
    fn test_load_rejects_document_without_data_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"metadata": {}}"#).unwrap();
        let manager: StateManager<Doc> = StateManager::new(&path).unwrap();
        let err = manager.load().unwrap_err();
        assert_eq!(err.error_type(), "StateError");
        assert!(err.to_string().contains("data"));
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ truncated").unwrap();
        let manager: StateManager<Doc> = StateManager::new(&path).unwrap();
        assert_eq!(manager.load().unwrap_err().error_type(), "StateError");
    }

    // Payload whose serialization can be made to fail, to exercise the
    // backup-restore path of `save`.
    #[derive(Debug, Default, Deserialize)]
    struct Flaky {
        value: u32,
        #[serde(skip)]
        fail_serialization: bool,
    }

    impl Serialize for Flaky {
        fn serialize<S: serde::Serializer>(
            &self,
            serializer: S,
        ) -> std::result::Result<S::Ok, S::Error> {
            if self.fail_serialization {
                return Err(serde::ser::Error::custom("injected write failure"));
            }
            use serde::ser::SerializeStruct;
            let mut s = serializer.serialize_struct("Flaky", 1)?;
            s.serialize_field("value", &self.value)?;
            s.end()
        }
    }

    #[test]
    fn test_failed_save_restores_previous_state() {
        let dir = TempDir::new().unwrap();
        let manager: StateManager<Flaky> =
            StateManager::new(dir.path().join("state.json")).unwrap();

        manager
            .save(&Flaky {
                value: 42,
                fail_serialization: false,
            })
            .unwrap();

        let err = manager
            .save(&Flaky {
                value: 99,
                fail_serialization: true,
            })
            .unwrap_err();
        assert_eq!(err.error_type(), "StateError");

        // The pre-save state is intact and no backup is left behind
        assert_eq!(manager.load().unwrap().data.value, 42);
        assert!(!dir.path().join("state.json.backup").exists());
    }

    proptest! {
        #[test]
        fn prop_round_trip_preserves_state(
            entries in proptest::collection::btree_map("[a-z]{1,8}", 0u32..10_000, 0..16),
            label in "[ -~]{0,32}",
        ) {
            let dir = TempDir::new().unwrap();
            let manager: StateManager<Doc> =
                StateManager::new(dir.path().join("state.json")).unwrap();
            let doc = Doc { entries, label };
            manager.save(&doc).unwrap();
            prop_assert_eq!(manager.load().unwrap().data, doc);
        }
    }
}
