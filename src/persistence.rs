//! Session snapshot persisted between runs.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::PersistenceError;
use crate::play_queue::{RepeatMode, ShuffleMode};
use crate::track_list::SortOrder;

/// Play queue contents and sequencing modes.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PlayQueuePersistentState {
    #[serde(default)]
    pub tracks: Vec<PathBuf>,
    #[serde(default)]
    pub current_track_index: Option<usize>,
    #[serde(default)]
    pub repeat_mode: RepeatMode,
    #[serde(default)]
    pub shuffle_mode: ShuffleMode,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LibraryPersistentState {
    /// Folders the library is built from; rescanned at startup.
    #[serde(default)]
    pub source_folders: Vec<PathBuf>,
    #[serde(default)]
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AppPersistentState {
    #[serde(default)]
    pub play_queue: PlayQueuePersistentState,
    #[serde(default)]
    pub library: LibraryPersistentState,
}

/// `<data dir>/trackdeck/state.json`, if the platform has a data dir.
pub fn default_state_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("trackdeck").join("state.json"))
}

pub fn persist_state_file(state: &AppPersistentState, path: &Path) -> Result<(), PersistenceError> {
    let serialized = serde_json::to_string_pretty(state)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, serialized).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Persisted session state. path={}", path.display());
    Ok(())
}

/// Reads a snapshot. A missing file is a fresh start, not an error.
pub fn load_state_file(path: &Path) -> Result<AppPersistentState, PersistenceError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!(
                "State file not found. Starting with empty state. path={}",
                path.display()
            );
            return Ok(AppPersistentState::default());
        }
        Err(source) => {
            warn!("Failed to read state file {}: {}", path.display(), source);
            return Err(PersistenceError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::{load_state_file, persist_state_file, AppPersistentState};
    use crate::error::PersistenceError;
    use crate::play_queue::{RepeatMode, ShuffleMode};
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(name: &str) -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be valid")
            .as_nanos();
        std::env::temp_dir().join(format!("trackdeck_{name}_{nonce}"))
    }

    #[test]
    fn test_state_file_round_trip_creates_parent_dirs() {
        let dir = unique_temp_dir("state_round_trip");
        let path = dir.join("nested").join("state.json");

        let mut state = AppPersistentState::default();
        state.play_queue.tracks = vec![PathBuf::from("/music/a.mp3")];
        state.play_queue.current_track_index = Some(0);
        state.play_queue.repeat_mode = RepeatMode::All;
        state.play_queue.shuffle_mode = ShuffleMode::On;
        state.library.source_folders = vec![PathBuf::from("/music")];

        persist_state_file(&state, &path).expect("state should persist");
        let loaded = load_state_file(&path).expect("state should load");
        assert_eq!(loaded, state);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_missing_state_file_is_a_fresh_start() {
        let path = unique_temp_dir("state_missing").join("state.json");
        let loaded = load_state_file(&path).expect("missing file should not fail");
        assert_eq!(loaded, AppPersistentState::default());
    }

    #[test]
    fn test_partial_state_uses_defaults() {
        let dir = unique_temp_dir("state_partial");
        fs::create_dir_all(&dir).expect("should create temp dir");
        let path = dir.join("state.json");
        fs::write(&path, r#"{"play_queue":{"repeat_mode":"one"}}"#).expect("write state");

        let loaded = load_state_file(&path).expect("partial state should load");
        assert_eq!(loaded.play_queue.repeat_mode, RepeatMode::One);
        assert!(loaded.play_queue.tracks.is_empty());
        assert!(loaded.library.source_folders.is_empty());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_corrupt_state_file_is_an_error() {
        let dir = unique_temp_dir("state_corrupt");
        fs::create_dir_all(&dir).expect("should create temp dir");
        let path = dir.join("state.json");
        fs::write(&path, "{not json").expect("write state");

        assert!(matches!(
            load_state_file(&path),
            Err(PersistenceError::Json(_))
        ));

        let _ = fs::remove_dir_all(dir);
    }
}
