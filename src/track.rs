//! Track model and the shared track registry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Normalized metadata read from a file's tags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub genre: Option<String>,
    pub year: Option<u32>,
    pub track_number: Option<u32>,
    pub disc_number: Option<u32>,
    pub duration: Option<Duration>,
}

impl TrackMetadata {
    /// Decade bucket derived from the release year, e.g. 1994 → 1990.
    pub fn decade(&self) -> Option<u32> {
        self.year.map(|year| year - year % 10)
    }
}

/// A playable file. Two tracks are the same logical track iff their paths match.
///
/// Tracks are immutable once built: the loader only constructs them after the
/// metadata read for their batch has finished.
#[derive(Debug, Clone)]
pub struct Track {
    path: PathBuf,
    metadata: TrackMetadata,
    validation_error: Option<String>,
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Track {}

impl Track {
    pub fn new(path: impl Into<PathBuf>, metadata: TrackMetadata) -> Self {
        Self {
            path: path.into(),
            metadata,
            validation_error: None,
        }
    }

    /// Builds a track whose metadata could not be read.
    pub fn with_validation_error(path: impl Into<PathBuf>, error: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            metadata: TrackMetadata::default(),
            validation_error: Some(error.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata(&self) -> &TrackMetadata {
        &self.metadata
    }

    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Title when tagged, otherwise the file stem.
    pub fn display_name(&self) -> String {
        if let Some(title) = self.metadata.title.as_deref() {
            if !title.trim().is_empty() {
                return title.to_string();
            }
        }
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.trim().is_empty())
            .unwrap_or_else(|| "Unknown Title".to_string())
    }
}

/// Shared arena of tracks keyed by path.
///
/// Library, play queue and any other list hold `Arc<Track>` handles resolved
/// through the same registry, so one file maps to one shared instance.
#[derive(Debug, Default)]
pub struct TrackRegistry {
    tracks: Mutex<HashMap<PathBuf, Arc<Track>>>,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<Track>>> {
        self.tracks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, path: &Path) -> Option<Arc<Track>> {
        self.lock().get(path).cloned()
    }

    /// Returns the registered instance for the track's path, registering `track`
    /// if the path is new.
    pub fn intern(&self, track: Track) -> Arc<Track> {
        self.lock()
            .entry(track.path.clone())
            .or_insert_with(|| Arc::new(track))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops registry entries no list holds a handle to anymore.
    pub fn purge_unreferenced(&self) -> usize {
        let mut tracks = self.lock();
        let before = tracks.len();
        tracks.retain(|_, track| Arc::strong_count(track) > 1);
        before - tracks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{Track, TrackMetadata, TrackRegistry};
    use std::sync::Arc;

    #[test]
    fn test_display_name_falls_back_to_file_stem() {
        let track = Track::new("/music/Artist - Song.flac", TrackMetadata::default());
        assert_eq!(track.display_name(), "Artist - Song");
        assert_eq!(track.file_name(), "Artist - Song.flac");
    }

    #[test]
    fn test_decade_is_derived_from_year() {
        let metadata = TrackMetadata {
            year: Some(1994),
            ..TrackMetadata::default()
        };
        assert_eq!(metadata.decade(), Some(1990));
    }

    #[test]
    fn test_registry_interns_one_instance_per_path() {
        let registry = TrackRegistry::new();
        let first = registry.intern(Track::new("/a.mp3", TrackMetadata::default()));
        let second = registry.intern(Track::with_validation_error("/a.mp3", "corrupt"));
        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.validation_error().is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_purge_unreferenced_keeps_tracks_held_by_lists() {
        let registry = TrackRegistry::new();
        let held = registry.intern(Track::new("/held.mp3", TrackMetadata::default()));
        registry.intern(Track::new("/dropped.mp3", TrackMetadata::default()));
        assert_eq!(registry.purge_unreferenced(), 1);
        assert!(registry.get(held.path()).is_some());
    }
}
