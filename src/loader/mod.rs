//! Background loading of files, folders and playlists into track lists.
//!
//! A load runs on its own thread so the caller returns immediately. The scan is
//! depth-first with directory children sorted by name, which makes insertion
//! order reproducible. Discovered files are collected into a
//! [`FileMetadataBatch`] sized to the worker pool; each full batch is read on
//! the pool and joined before scanning continues, which bounds in-flight work
//! and keeps progress reporting batch-granular.
//!
//! Nothing fails out of a load: missing inputs, unreadable tags and broken
//! playlist entries are collected into the [`LoadReport`].

pub mod batch;
pub mod session;
pub mod worker_pool;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use rayon::ThreadPool;
use uuid::Uuid;

use crate::error::FileReadError;
use crate::library::ImportedPlaylist;
use crate::media_file_discovery::{
    is_supported_audio_file, resolve_path, sorted_directory_children, PathKind,
};
use crate::metadata_tags::MetadataReader;
use crate::playlist_file::load_playlist;
use crate::track::{Track, TrackRegistry};
use crate::track_list::{
    GroupedSortedTrackList, GroupedTrackList, SortedTrackList, TrackCollection, TrackList,
};

pub use batch::FileMetadataBatch;
pub use session::{FileReadSession, HistoryItem};
pub use worker_pool::{ConcurrencyTier, WorkerPools};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTargetKind {
    TrackList,
    PlayQueue,
    Library,
}

/// A collection a load can write into.
pub trait LoadTarget: TrackCollection + Send {
    fn kind(&self) -> LoadTargetKind {
        LoadTargetKind::TrackList
    }

    /// Inserts one resolved batch and returns the indices it landed at.
    fn accept_batch(
        &mut self,
        tracks: Vec<Arc<Track>>,
        insertion_index: Option<usize>,
    ) -> Vec<usize> {
        match insertion_index {
            Some(at) => self.insert_tracks(tracks, at),
            None => self.add_tracks(tracks),
        }
    }

    /// Called once per autoplay load with the first readable file's index.
    fn first_file_ready(&mut self, _index: usize) {}

    fn register_playlist(&mut self, _playlist: ImportedPlaylist) {}
}

impl LoadTarget for TrackList {}
impl LoadTarget for SortedTrackList {}
impl LoadTarget for GroupedTrackList {}
impl LoadTarget for GroupedSortedTrackList {}

/// Progress callbacks. Invoked on the loader thread, never with the target locked.
pub trait LoadObserver: Send + Sync {
    fn before_load_starts(&self, _session_id: Uuid, _target: LoadTargetKind) {}

    fn batch_inserted(&self, _session_id: Uuid, _indices: &[usize]) {}

    fn after_load_completes(&self, _report: &LoadReport) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLoadObserver;

impl LoadObserver for NoopLoadObserver {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadRequest {
    /// Insert at this index instead of appending; later batches follow the earlier ones.
    pub insertion_index: Option<usize>,
    /// Tell the target once the first readable file is in, e.g. to start playback.
    pub autoplay: bool,
}

impl LoadRequest {
    pub fn append() -> Self {
        Self::default()
    }

    pub fn insert_at(index: usize) -> Self {
        Self {
            insertion_index: Some(index),
            autoplay: false,
        }
    }

    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }
}

/// Outcome of a finished load. Indices refer to the target at completion time.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub session_id: Uuid,
    pub target: LoadTargetKind,
    /// Indices of the tracks this load inserted, ascending.
    pub loaded: Vec<usize>,
    /// Files the target already contained, with their index.
    pub already_present: Vec<(PathBuf, usize)>,
    pub errors: Vec<FileReadError>,
    pub history: Vec<HistoryItem>,
    pub files_read: usize,
    pub playlists_read: usize,
    pub batches_flushed: usize,
    /// The target was cleared while loading; the rest of the scan was dropped.
    pub cleared_during_load: bool,
}

fn lock_target<T>(target: &Mutex<T>) -> MutexGuard<'_, T> {
    target
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaylistPolicy {
    /// Load entries where the playlist was found.
    Inline,
    /// Import after the whole tree was read and register the playlist.
    SecondPass,
    Skip,
}

/// Shared plumbing of [`TrackLoader`] and [`LibraryLoader`].
#[derive(Clone)]
struct LoaderCore {
    registry: Arc<TrackRegistry>,
    reader: Arc<dyn MetadataReader>,
    pool: Arc<ThreadPool>,
}

impl LoaderCore {
    fn spawn<T: LoadTarget + 'static>(
        &self,
        name: &'static str,
        paths: Vec<PathBuf>,
        target: Arc<Mutex<T>>,
        request: LoadRequest,
        playlist_policy: PlaylistPolicy,
        observer: Arc<dyn LoadObserver>,
    ) -> JoinHandle<LoadReport> {
        let core = self.clone();
        thread::spawn(move || {
            let run = LoadRun::new(name, core, target, request, playlist_policy, observer);
            run.execute(paths)
        })
    }
}

/// State of one load on the loader thread.
struct LoadRun<T: LoadTarget> {
    name: &'static str,
    core: LoaderCore,
    target: Arc<Mutex<T>>,
    observer: Arc<dyn LoadObserver>,
    session: FileReadSession,
    batch: FileMetadataBatch,
    kind: LoadTargetKind,
    generation: u64,
    autoplay: bool,
    first_file_notified: bool,
    cleared: bool,
    playlist_policy: PlaylistPolicy,
    deferred_playlists: Vec<PathBuf>,
    visited_directories: HashSet<PathBuf>,
    loaded_paths: Vec<PathBuf>,
}

impl<T: LoadTarget> LoadRun<T> {
    fn new(
        name: &'static str,
        core: LoaderCore,
        target: Arc<Mutex<T>>,
        request: LoadRequest,
        playlist_policy: PlaylistPolicy,
        observer: Arc<dyn LoadObserver>,
    ) -> Self {
        let capacity = core.pool.current_num_threads();
        let (kind, generation) = {
            let mut guard = lock_target(&target);
            guard.set_being_modified(true);
            (guard.kind(), guard.track_list().generation())
        };
        Self {
            name,
            core,
            target,
            observer,
            session: FileReadSession::new(),
            batch: FileMetadataBatch::new(capacity, request.insertion_index),
            kind,
            generation,
            autoplay: request.autoplay,
            first_file_notified: false,
            cleared: false,
            playlist_policy,
            deferred_playlists: Vec::new(),
            visited_directories: HashSet::new(),
            loaded_paths: Vec::new(),
        }
    }

    fn execute(mut self, paths: Vec<PathBuf>) -> LoadReport {
        info!(
            "{}: load {} started for {} input(s)",
            self.name,
            self.session.id(),
            paths.len()
        );
        self.observer
            .before_load_starts(self.session.id(), self.kind);

        for path in paths {
            if self.cleared {
                break;
            }
            self.visit_input(path);
        }
        self.flush();

        if self.playlist_policy == PlaylistPolicy::SecondPass {
            self.import_deferred_playlists();
        }

        let name = self.name;
        let observer = Arc::clone(&self.observer);
        let report = self.finish();
        info!(
            "{}: load {} completed. loaded={} already_present={} errors={} batches={}",
            name,
            report.session_id,
            report.loaded.len(),
            report.already_present.len(),
            report.errors.len(),
            report.batches_flushed
        );
        observer.after_load_completes(&report);
        report
    }

    fn visit_input(&mut self, path: PathBuf) {
        let Some((resolved, kind)) = resolve_path(&path) else {
            warn!("{}: input not found: {}", self.name, path.display());
            self.session.record_error(FileReadError::NotFound(path));
            return;
        };
        match kind {
            PathKind::Directory => self.session.record_history(HistoryItem::Folder(path)),
            PathKind::PlaylistFile => self
                .session
                .record_history(HistoryItem::PlaylistFile(path)),
            PathKind::AudioFile => self.session.record_history(HistoryItem::Track(path)),
            PathKind::Unsupported => {}
        }
        self.visit(resolved, kind);
    }

    fn visit(&mut self, path: PathBuf, kind: PathKind) {
        match kind {
            PathKind::Directory => self.visit_directory(path),
            PathKind::PlaylistFile => match self.playlist_policy {
                PlaylistPolicy::Inline => self.enqueue_playlist_entries(&path),
                PlaylistPolicy::SecondPass => self.deferred_playlists.push(path),
                PlaylistPolicy::Skip => {
                    debug!("{}: skipping playlist {}", self.name, path.display())
                }
            },
            PathKind::AudioFile => self.enqueue(path),
            PathKind::Unsupported => {}
        }
    }

    fn enqueue_playlist_entries(&mut self, path: &Path) {
        for entry in self.playlist_entries(path).unwrap_or_default() {
            if self.cleared {
                return;
            }
            self.enqueue(entry);
        }
    }

    fn visit_directory(&mut self, directory: PathBuf) {
        if !self.visited_directories.insert(directory.clone()) {
            debug!(
                "{}: skipping already visited directory {}",
                self.name,
                directory.display()
            );
            return;
        }
        for child in sorted_directory_children(&directory) {
            if self.cleared {
                return;
            }
            if let Some((resolved, kind)) = resolve_path(&child) {
                self.visit(resolved, kind);
            }
        }
    }

    /// Parses a playlist into existing, supported audio files. Parse failures and
    /// missing entries are recorded on the session.
    fn playlist_entries(&mut self, playlist: &Path) -> Option<Vec<PathBuf>> {
        let entries = match load_playlist(playlist) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("{}: {}", self.name, err);
                self.session.record_error(err);
                return None;
            }
        };
        self.session.playlists_read.increment();

        let mut files = Vec::with_capacity(entries.len());
        for entry in entries {
            if !entry.exists() {
                self.session.record_error(FileReadError::BrokenPlaylistEntry {
                    playlist: playlist.to_path_buf(),
                    entry,
                });
                continue;
            }
            if is_supported_audio_file(&entry) {
                files.push(std::fs::canonicalize(&entry).unwrap_or(entry));
            }
        }
        Some(files)
    }

    fn enqueue(&mut self, path: PathBuf) {
        if !self.session.claim(&path) {
            return;
        }
        {
            let target = lock_target(&self.target);
            if target.track_list().generation() != self.generation {
                self.cleared = true;
                return;
            }
            if target.contains_path(&path) {
                self.session.record_already_present(path);
                return;
            }
        }
        let known = self.core.registry.get(&path);
        self.batch.push(path, known);
        if self.batch.is_full() {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if self.batch.is_empty() || self.cleared {
            return;
        }
        self.batch.read_metadata(
            &self.core.pool,
            self.core.reader.as_ref(),
            &self.session.files_read,
        );
        let mut errors = Vec::new();
        let tracks = self.batch.resolve(&self.core.registry, &mut errors);
        for error in errors {
            self.session.record_error(error);
        }

        let inserted = {
            let mut target = lock_target(&self.target);
            if target.track_list().generation() != self.generation {
                info!(
                    "{}: target cleared during load {}; discarding {} track(s)",
                    self.name,
                    self.session.id(),
                    tracks.len()
                );
                self.cleared = true;
                return;
            }
            let paths: Vec<PathBuf> = tracks
                .iter()
                .map(|track| track.path().to_path_buf())
                .collect();
            let inserted = target.accept_batch(tracks, self.batch.insertion_index());
            self.batch.advance_insertion_index(&inserted);
            self.loaded_paths.extend(paths);

            if self.autoplay && !self.first_file_notified {
                let first_readable = inserted.iter().copied().find(|&index| {
                    target
                        .track(index)
                        .is_some_and(|track| track.validation_error().is_none())
                });
                if let Some(index) = first_readable {
                    target.first_file_ready(index);
                    self.first_file_notified = true;
                }
            }
            inserted
        };

        debug!(
            "{}: flushed batch #{} with {} new track(s)",
            self.name,
            self.batch.flush_count(),
            inserted.len()
        );
        if !inserted.is_empty() {
            self.observer.batch_inserted(self.session.id(), &inserted);
        }
    }

    /// Second pass of a library scan: read what playlists reference and
    /// register each playlist with the target.
    fn import_deferred_playlists(&mut self) {
        for playlist in std::mem::take(&mut self.deferred_playlists) {
            if self.cleared {
                return;
            }
            let Some(entries) = self.playlist_entries(&playlist) else {
                continue;
            };
            for entry in &entries {
                self.enqueue(entry.clone());
            }
            self.flush();
            if self.cleared {
                return;
            }

            let mut target = lock_target(&self.target);
            let tracks: Vec<Arc<Track>> = entries
                .iter()
                .filter_map(|entry| target.track_list().track_for_path(entry).cloned())
                .collect();
            debug!(
                "{}: registering playlist {} with {} track(s)",
                self.name,
                playlist.display(),
                tracks.len()
            );
            target.register_playlist(ImportedPlaylist::new(playlist, tracks));
        }
    }

    fn finish(self) -> LoadReport {
        let mut target = lock_target(&self.target);
        target.set_being_modified(false);

        let mut loaded: Vec<usize> = self
            .loaded_paths
            .iter()
            .filter_map(|path| target.index_of_path(path))
            .collect();
        loaded.sort_unstable();
        loaded.dedup();

        let files_read = self.session.files_read();
        let playlists_read = self.session.playlists_read();
        let session_id = self.session.id();
        let (already_present, errors, history) = self.session.into_parts();
        let already_present = already_present
            .into_iter()
            .filter_map(|path| target.index_of_path(&path).map(|index| (path, index)))
            .collect();

        LoadReport {
            session_id,
            target: self.kind,
            loaded,
            already_present,
            errors,
            history,
            files_read,
            playlists_read,
            batches_flushed: self.batch.flush_count(),
            cleared_during_load: self.cleared,
        }
    }
}

/// Loads user-selected files and folders on the interactive pool.
#[derive(Clone)]
pub struct TrackLoader {
    core: LoaderCore,
}

impl TrackLoader {
    pub fn new(
        registry: Arc<TrackRegistry>,
        reader: Arc<dyn MetadataReader>,
        pool: Arc<ThreadPool>,
    ) -> Self {
        Self {
            core: LoaderCore {
                registry,
                reader,
                pool,
            },
        }
    }

    pub fn batch_capacity(&self) -> usize {
        self.core.pool.current_num_threads()
    }

    /// Starts loading `paths` into `target` and returns at once. Callers should
    /// check `is_being_modified` on the target before starting a second load.
    pub fn load_tracks<T: LoadTarget + 'static>(
        &self,
        paths: Vec<PathBuf>,
        target: Arc<Mutex<T>>,
        request: LoadRequest,
        observer: Arc<dyn LoadObserver>,
    ) -> JoinHandle<LoadReport> {
        self.core
            .spawn("TrackLoader", paths, target, request, PlaylistPolicy::Inline, observer)
    }
}

/// Bulk library scans on the background pool. Playlist files found during the
/// scan are imported after every audio file of the tree was read.
#[derive(Clone)]
pub struct LibraryLoader {
    core: LoaderCore,
    import_playlists: bool,
}

impl LibraryLoader {
    pub fn new(
        registry: Arc<TrackRegistry>,
        reader: Arc<dyn MetadataReader>,
        pool: Arc<ThreadPool>,
        import_playlists: bool,
    ) -> Self {
        Self {
            core: LoaderCore {
                registry,
                reader,
                pool,
            },
            import_playlists,
        }
    }

    pub fn load_library<T: LoadTarget + 'static>(
        &self,
        folders: Vec<PathBuf>,
        target: Arc<Mutex<T>>,
        observer: Arc<dyn LoadObserver>,
    ) -> JoinHandle<LoadReport> {
        let playlist_policy = if self.import_playlists {
            PlaylistPolicy::SecondPass
        } else {
            PlaylistPolicy::Skip
        };
        self.core.spawn(
            "LibraryLoader",
            folders,
            target,
            LoadRequest::append(),
            playlist_policy,
            observer,
        )
    }
}
