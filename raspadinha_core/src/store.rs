use crate::{error::StoreError, state::GameState};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Key of the single persisted record.
pub const GAME_STATE_KEY: &str = "raspadinha_game_state";

/// One durable slot holding the serialized `GameState`.
///
/// `load` never fails: an unreadable or malformed record is reported as absent so
/// the caller falls back to defaults.
pub trait GameStore {
    fn load(&self) -> Option<GameState>;
    fn save(&self, state: &GameState) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

fn decode(raw: &str) -> Option<GameState> {
    match serde_json::from_str(raw) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(error = %e, "discarding malformed game state record");
            None
        }
    }
}

/// Stores the record as `<dir>/raspadinha_game_state.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{GAME_STATE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GameStore for FileStore {
    fn load(&self) -> Option<GameState> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => decode(&raw),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "cannot read game state");
                None
            }
        }
    }

    fn save(&self, state: &GameState) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let raw = serde_json::to_string(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "game state saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-process slot; keeps the serialized form so it behaves like `FileStore`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the slot with a raw record, valid or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|s| s.clone())
    }
}

impl GameStore for MemoryStore {
    fn load(&self) -> Option<GameState> {
        let slot = self.slot.lock().ok()?;
        slot.as_deref().and_then(decode)
    }

    fn save(&self, state: &GameState) -> Result<(), StoreError> {
        let raw = serde_json::to_string(state)?;
        *self.slot.lock().map_err(|_| StoreError::Poisoned)? = Some(raw);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().map_err(|_| StoreError::Poisoned)? = None;
        Ok(())
    }
}

impl<T: GameStore + ?Sized> GameStore for &T {
    fn load(&self) -> Option<GameState> {
        (**self).load()
    }

    fn save(&self, state: &GameState) -> Result<(), StoreError> {
        (**self).save(state)
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

impl<T: GameStore + ?Sized> GameStore for Box<T> {
    fn load(&self) -> Option<GameState> {
        (**self).load()
    }

    fn save(&self, state: &GameState) -> Result<(), StoreError> {
        (**self).save(state)
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}
