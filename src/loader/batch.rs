//! Fixed-capacity unit of metadata reads.
//!
//! Files are pushed in discovery order. A flush reads metadata for every file
//! on the worker pool, waits for all of them, then resolves each pending entry
//! into an immutable [`Track`].

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, warn};
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::collections::{AtomicCounter, ConcurrentMap};
use crate::error::FileReadError;
use crate::metadata_tags::MetadataReader;
use crate::track::{Track, TrackMetadata, TrackRegistry};

#[derive(Debug)]
struct PendingFile {
    path: PathBuf,
    /// Registry instance when another list already loaded this file.
    known: Option<Arc<Track>>,
}

#[derive(Debug)]
pub struct FileMetadataBatch {
    capacity: usize,
    entries: Vec<PendingFile>,
    results: ConcurrentMap<PathBuf, Result<TrackMetadata, String>>,
    insertion_index: Option<usize>,
    flush_count: usize,
}

impl FileMetadataBatch {
    pub fn new(capacity: usize, insertion_index: Option<usize>) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Vec::new(),
            results: ConcurrentMap::new(),
            insertion_index,
            flush_count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn flush_count(&self) -> usize {
        self.flush_count
    }

    /// Where the next batch goes, or `None` to append.
    pub fn insertion_index(&self) -> Option<usize> {
        self.insertion_index
    }

    pub fn push(&mut self, path: PathBuf, known: Option<Arc<Track>>) {
        self.entries.push(PendingFile { path, known });
    }

    /// Reads metadata for every unknown file on `pool` and blocks until the
    /// whole batch finished.
    pub fn read_metadata(
        &self,
        pool: &ThreadPool,
        reader: &dyn MetadataReader,
        files_read: &AtomicCounter,
    ) {
        pool.install(|| {
            self.entries
                .par_iter()
                .filter(|entry| entry.known.is_none())
                .for_each(|entry| {
                    let result = reader.read_primary_metadata(&entry.path);
                    self.results.insert(entry.path.clone(), result);
                    files_read.increment();
                });
        });
    }

    /// Turns the pending entries into tracks, in discovery order. Unreadable
    /// files still become tracks, flagged with a validation error.
    pub fn resolve(
        &mut self,
        registry: &TrackRegistry,
        errors: &mut Vec<FileReadError>,
    ) -> Vec<Arc<Track>> {
        self.flush_count += 1;
        let mut results = self.results.drain();
        let tracks = self
            .entries
            .drain(..)
            .map(|entry| {
                if let Some(track) = entry.known {
                    if let Some(reason) = track.validation_error() {
                        errors.push(FileReadError::MetadataRead {
                            path: entry.path,
                            reason: reason.to_string(),
                        });
                    }
                    return track;
                }
                let result = results.remove(&entry.path).unwrap_or_else(|| {
                    Err("metadata read did not complete".to_string())
                });
                match result {
                    Ok(metadata) => registry.intern(Track::new(entry.path, metadata)),
                    Err(reason) => {
                        warn!(
                            "FileMetadataBatch: failed to read metadata from {}: {}",
                            entry.path.display(),
                            reason
                        );
                        errors.push(FileReadError::MetadataRead {
                            path: entry.path.clone(),
                            reason: reason.clone(),
                        });
                        registry.intern(Track::with_validation_error(entry.path, reason))
                    }
                }
            })
            .collect::<Vec<_>>();
        debug!(
            "FileMetadataBatch: flush #{} resolved {} track(s)",
            self.flush_count,
            tracks.len()
        );
        tracks
    }

    /// Moves the running insertion point past what the last flush inserted.
    pub fn advance_insertion_index(&mut self, inserted: &[usize]) {
        if let (Some(_), Some(&last)) = (self.insertion_index, inserted.last()) {
            self.insertion_index = Some(last + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FileMetadataBatch;
    use crate::collections::AtomicCounter;
    use crate::metadata_tags::MetadataReader;
    use crate::track::{Track, TrackMetadata, TrackRegistry};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    struct NameReader;

    impl MetadataReader for NameReader {
        fn read_primary_metadata(&self, path: &Path) -> Result<TrackMetadata, String> {
            let stem = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default();
            if stem.starts_with("corrupt") {
                return Err("not an audio file".to_string());
            }
            Ok(TrackMetadata {
                title: Some(stem.to_uppercase()),
                ..TrackMetadata::default()
            })
        }
    }

    fn pool() -> rayon::ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(2)
            .build()
            .expect("pool")
    }

    #[test]
    fn test_flush_keeps_discovery_order_and_flags_failures() {
        let registry = TrackRegistry::new();
        let counter = AtomicCounter::new();
        let mut batch = FileMetadataBatch::new(3, None);
        for name in ["b", "corrupt", "a"] {
            batch.push(PathBuf::from(format!("/music/{name}.mp3")), None);
        }
        assert!(batch.is_full());

        batch.read_metadata(&pool(), &NameReader, &counter);
        let mut errors = Vec::new();
        let tracks = batch.resolve(&registry, &mut errors);

        let titles: Vec<String> = tracks.iter().map(|track| track.display_name()).collect();
        assert_eq!(titles, vec!["B", "corrupt", "A"]);
        assert!(tracks[1].validation_error().is_some());
        assert!(tracks[0].validation_error().is_none());
        assert_eq!(errors.len(), 1);
        assert_eq!(counter.value(), 3);
        assert!(batch.is_empty());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_known_tracks_are_not_reread() {
        let registry = TrackRegistry::new();
        let known = registry.intern(Track::new("/music/known.mp3", TrackMetadata::default()));
        let counter = AtomicCounter::new();
        let mut batch = FileMetadataBatch::new(4, None);
        batch.push(PathBuf::from("/music/known.mp3"), Some(Arc::clone(&known)));

        batch.read_metadata(&pool(), &NameReader, &counter);
        let tracks = batch.resolve(&registry, &mut Vec::new());
        assert_eq!(counter.value(), 0);
        assert!(Arc::ptr_eq(&tracks[0], &known));
    }

    #[test]
    fn test_insertion_index_advances_only_when_inserting() {
        let mut appending = FileMetadataBatch::new(2, None);
        appending.advance_insertion_index(&[4, 5]);
        assert_eq!(appending.insertion_index(), None);

        let mut inserting = FileMetadataBatch::new(2, Some(1));
        inserting.advance_insertion_index(&[1, 2]);
        assert_eq!(inserting.insertion_index(), Some(3));
        inserting.advance_insertion_index(&[]);
        assert_eq!(inserting.insertion_index(), Some(3));
    }
}
