#![deny(warnings)]

//! Persistence layer: the versioned save envelope and pluggable stores.
//!
//! Saves are one self-describing JSON record wrapping the whole state
//! aggregate. Loading tolerates schema drift in one direction only:
//! unknown fields are ignored and missing fields default; a blob older
//! than the compatibility floor starts a fresh game instead of
//! migrating. A store failure is reported, never fatal: the in-memory
//! simulation keeps running and the next scheduled save retries.

use egg_core::GameState;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Current save-format version. Incremented on breaking changes.
pub const SAVE_VERSION: u32 = 1;

/// Oldest version this build still reads. Field additions alone do not
/// raise it; only a change in the meaning of existing fields does.
pub const MIN_COMPATIBLE_VERSION: u32 = 1;

/// Errors from the durable store or blob encoding.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Encoding failure.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize)]
struct SaveFile {
    version: u32,
    state: GameState,
}

/// Encode the state aggregate into a versioned blob.
pub fn encode_state(state: &GameState) -> Result<String, StoreError> {
    let file = SaveFile {
        version: SAVE_VERSION,
        state: state.clone(),
    };
    Ok(serde_json::to_string(&file)?)
}

/// Decode a blob back into state. Unreadable or incompatible blobs
/// yield `None` (fresh game), never an error.
pub fn decode_state(blob: &str) -> Option<GameState> {
    let file: SaveFile = match serde_json::from_str(blob) {
        Ok(f) => f,
        Err(e) => {
            warn!(error = %e, "discarding unreadable save");
            return None;
        }
    };
    if file.version < MIN_COMPATIBLE_VERSION {
        warn!(
            saved = file.version,
            floor = MIN_COMPATIBLE_VERSION,
            "discarding save older than the compatibility floor"
        );
        return None;
    }
    Some(file.state)
}

/// Abstract durable store for one save blob.
pub trait SaveStore {
    /// Read the stored blob, if any.
    fn load(&self) -> Result<Option<String>, StoreError>;
    /// Replace the stored blob.
    fn save(&self, blob: &str) -> Result<(), StoreError>;
    /// Discard the stored blob.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Load and decode the saved state in one step.
pub fn load_state<S: SaveStore>(store: &S) -> Result<Option<GameState>, StoreError> {
    Ok(store.load()?.as_deref().and_then(decode_state))
}

/// Encode and store the state in one step.
pub fn save_state<S: SaveStore>(store: &S, state: &GameState) -> Result<(), StoreError> {
    store.save(&encode_state(state)?)
}

/// File-backed store. Writes land in a sibling temp file first and are
/// renamed into place, so an interrupted write cannot truncate the
/// previous save.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl SaveStore for FileStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&self.path)?))
    }

    fn save(&self, blob: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.tmp_path();
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// In-memory store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemStore {
    blob: RefCell<Option<String>>,
}

impl MemStore {
    /// Empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStore for MemStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.blob.borrow().clone())
    }

    fn save(&self, blob: &str) -> Result<(), StoreError> {
        *self.blob.borrow_mut() = Some(blob.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.blob.borrow_mut() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egg_core::{Catalog, UpgradeId};
    use proptest::prelude::*;

    fn sample_state() -> GameState {
        let catalog = Catalog::builtin();
        let mut state = GameState::new(&catalog, 123_456);
        state.balance = 987.5;
        state.upgrades.insert(UpgradeId("u3".to_string()), 4);
        state.themes.push(2);
        state.equipped_theme = Some(2);
        state
    }

    #[test]
    fn encode_decode_roundtrip() {
        let state = sample_state();
        let blob = encode_state(&state).unwrap();
        let back = decode_state(&blob).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn version_below_floor_starts_fresh() {
        let blob = r#"{"version": 0, "state": {"balance": 5.0}}"#;
        assert!(decode_state(blob).is_none());
    }

    #[test]
    fn unreadable_blob_starts_fresh() {
        assert!(decode_state("not json at all").is_none());
        assert!(decode_state(r#"{"version": "one"}"#).is_none());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let blob = r#"{"version": 1, "state": {"balance": 7.0, "future_field": true}}"#;
        let state = decode_state(blob).unwrap();
        assert_eq!(state.balance, 7.0);
    }

    #[test]
    fn missing_fields_default() {
        let blob = r#"{"version": 1, "state": {"balance": 7.0}}"#;
        let state = decode_state(blob).unwrap();
        assert_eq!(state.balance, 7.0);
        assert_eq!(state.per_action_rate, 1.0);
        assert!(state.upgrades.is_empty());
        assert_eq!(state.last_tick_ms, 0);
    }

    #[test]
    fn mem_store_roundtrip() {
        let store = MemStore::new();
        assert!(load_state(&store).unwrap().is_none());
        let state = sample_state();
        save_state(&store, &state).unwrap();
        assert_eq!(load_state(&store).unwrap().unwrap(), state);
        store.clear().unwrap();
        assert!(load_state(&store).unwrap().is_none());
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = std::env::temp_dir().join(format!("egg-clicker-test-{}", std::process::id()));
        let store = FileStore::new(dir.join("save.json"));
        let _ = store.clear();
        assert!(load_state(&store).unwrap().is_none());
        let state = sample_state();
        save_state(&store, &state).unwrap();
        assert_eq!(load_state(&store).unwrap().unwrap(), state);
        // Overwrite keeps the newest blob.
        let mut newer = state.clone();
        newer.balance = 1.0;
        save_state(&store, &newer).unwrap();
        assert_eq!(load_state(&store).unwrap().unwrap().balance, 1.0);
        store.clear().unwrap();
        assert!(load_state(&store).unwrap().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    proptest! {
        #[test]
        fn prop_decode_never_panics(blob in ".{0,256}") {
            let _ = decode_state(&blob);
        }

        #[test]
        fn prop_roundtrip_preserves_balance(balance in 0.0f64..1e12) {
            let mut state = sample_state();
            state.balance = balance;
            let blob = encode_state(&state).unwrap();
            prop_assert_eq!(decode_state(&blob).unwrap().balance, balance);
        }
    }
}
