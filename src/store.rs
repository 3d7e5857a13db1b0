//! Best-effort persistence of the channel counter.
//!
//! The channel counter survives restarts by being written to a small JSON
//! file after every change. Persistence is never allowed to fail or stall a
//! caller: [`JsonFileStore`] hands each snapshot to a background writer
//! thread over a channel, and the writer logs (and otherwise ignores) any
//! I/O error.
//!
//! # File Format
//!
//! ```json
//! {
//!   "current_value": 5,
//!   "max_value": 15,
//!   "timestamp": "2024-05-01T12:00:00Z"
//! }
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::StoreError;

/// Contents of the state file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Channel the remote was last known to be on.
    pub current_value: u8,
    /// Highest channel at the time of writing.
    pub max_value: u8,
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,
}

impl PersistedState {
    /// Snapshot `value` now.
    pub fn now(current_value: u8, max_value: u8) -> Self {
        Self {
            current_value,
            max_value,
            timestamp: Utc::now(),
        }
    }
}

/// Storage backend for the channel counter.
///
/// `save` must not block on slow storage and must not fail; implementations
/// log problems themselves.
pub trait Persist: Send + Sync {
    /// Load the last saved state, if any.
    fn load(&self) -> Option<PersistedState>;

    /// Queue `state` for saving.
    fn save(&self, state: PersistedState);
}

/// Persistence disabled: nothing is loaded, saves are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPersist;

impl Persist for NoPersist {
    fn load(&self) -> Option<PersistedState> {
        None
    }

    fn save(&self, _state: PersistedState) {}
}

/// JSON state file written by a background thread.
///
/// Dropping the store flushes any queued snapshot and joins the writer.
///
/// # Example
///
/// ```rust
/// use rs_aluprof::store::{JsonFileStore, Persist, PersistedState};
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("state.json");
///
/// let store = JsonFileStore::open(&path);
/// assert!(store.load().is_none());
///
/// store.save(PersistedState::now(5, 15));
/// drop(store); // flush
///
/// let store = JsonFileStore::open(&path);
/// assert_eq!(store.load().unwrap().current_value, 5);
/// ```
pub struct JsonFileStore {
    path: PathBuf,
    tx: Option<Sender<PersistedState>>,
    writer: Option<JoinHandle<()>>,
}

impl JsonFileStore {
    /// Create a store for `path` and start its writer thread.
    ///
    /// The file does not need to exist. If the writer thread cannot be
    /// spawned the store degrades to writing on the caller's thread.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (tx, rx) = mpsc::channel();
        let writer_path = path.clone();

        let writer = thread::Builder::new()
            .name("state-writer".into())
            .spawn(move || run_writer(&writer_path, rx));

        match writer {
            Ok(handle) => Self {
                path,
                tx: Some(tx),
                writer: Some(handle),
            },
            Err(e) => {
                tracing::warn!(error = %e, "could not spawn state writer, saving inline");
                Self {
                    path,
                    tx: None,
                    writer: None,
                }
            }
        }
    }

    /// Path of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persist for JsonFileStore {
    fn load(&self) -> Option<PersistedState> {
        match read_state(&self.path) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable state file");
                None
            }
        }
    }

    fn save(&self, state: PersistedState) {
        match &self.tx {
            Some(tx) => {
                // Only fails if the writer thread died; fall back to an inline write.
                if let Err(mpsc::SendError(state)) = tx.send(state) {
                    write_logged(&self.path, &state);
                }
            }
            None => write_logged(&self.path, &state),
        }
    }
}

impl Drop for JsonFileStore {
    fn drop(&mut self) {
        // Closing the channel ends the writer loop after it drains.
        self.tx.take();
        if let Some(writer) = self.writer.take() {
            if writer.join().is_err() {
                tracing::warn!("state writer panicked");
            }
        }
    }
}

fn run_writer(path: &Path, rx: Receiver<PersistedState>) {
    while let Ok(mut state) = rx.recv() {
        // Coalesce a burst of step updates into the newest one.
        for newer in rx.try_iter() {
            state = newer;
        }
        write_logged(path, &state);
    }
}

fn write_logged(path: &Path, state: &PersistedState) {
    match write_state(path, state) {
        Ok(()) => tracing::trace!(path = %path.display(), value = state.current_value, "state saved"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not save state"),
    }
}

fn read_state(path: &Path) -> Result<Option<PersistedState>, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&text)?))
}

/// Replace the state file atomically through a temp file in the same directory.
fn write_state(path: &Path, state: &PersistedState) -> Result<(), StoreError> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };
    let json = serde_json::to_vec_pretty(state)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&json)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("absent.json"));
        assert!(store.load().is_none());
    }

    #[test]
    fn corrupt_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::open(&path);
        assert!(store.load().is_none());
    }

    #[test]
    fn save_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = JsonFileStore::open(&path);
        store.save(PersistedState::now(3, 15));
        store.save(PersistedState::now(4, 15));
        drop(store);

        let reloaded = JsonFileStore::open(&path).load().unwrap();
        assert_eq!(reloaded.current_value, 4);
        assert_eq!(reloaded.max_value, 15);
    }

    #[test]
    fn file_has_expected_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = JsonFileStore::open(&path);
        store.save(PersistedState::now(9, 15));
        drop(store);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["current_value"], 9);
        assert_eq!(json["max_value"], 15);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn unwritable_path_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes every write fail.
        let path = dir.path().join("blocked");
        fs::create_dir(&path).unwrap();

        let store = JsonFileStore::open(&path);
        store.save(PersistedState::now(1, 15));
        drop(store);

        assert!(path.is_dir());
    }

    #[test]
    fn write_leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        for value in 0..5 {
            write_state(&path, &PersistedState::now(value, 15)).unwrap();
        }

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("state.json")]);
        assert_eq!(read_state(&path).unwrap().unwrap().current_value, 4);
    }

    #[test]
    fn inline_and_background_writes_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = JsonFileStore::open(&path);
        let writers: Vec<_> = (0..4u8)
            .map(|value| {
                let path = path.clone();
                thread::spawn(move || write_state(&path, &PersistedState::now(value, 15)))
            })
            .collect();
        store.save(PersistedState::now(9, 15));
        for writer in writers {
            writer.join().unwrap().unwrap();
        }
        drop(store);

        assert!(read_state(&path).unwrap().is_some());
    }

    #[test]
    fn no_persist_is_inert() {
        let store = NoPersist;
        store.save(PersistedState::now(1, 15));
        assert!(store.load().is_none());
    }
}
