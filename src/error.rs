//! Error types.

use std::path::PathBuf;

/// Caller-side precondition violations on track lists.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TrackListError {
    #[error("index {index} is out of range for a list of {len} track(s)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("track file does not exist: {0}")]
    TrackFileMissing(PathBuf),
}

/// Per-file failures recorded by a load. These are reported as data, never raised.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum FileReadError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read metadata from {path}: {reason}")]
    MetadataRead { path: PathBuf, reason: String },
    #[error("failed to parse playlist {path}: {reason}")]
    PlaylistParse { path: PathBuf, reason: String },
    #[error("playlist {playlist} references a missing file: {entry}")]
    BrokenPlaylistEntry { playlist: PathBuf, entry: PathBuf },
}

impl FileReadError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            FileReadError::NotFound(path) => path,
            FileReadError::MetadataRead { path, .. } => path,
            FileReadError::PlaylistParse { path, .. } => path,
            FileReadError::BrokenPlaylistEntry { entry, .. } => entry,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to access state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid state file: {0}")]
    Json(#[from] serde_json::Error),
}
