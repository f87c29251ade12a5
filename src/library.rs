//! The user's music library: every track under the configured source folders,
//! kept sorted and grouped, plus the playlists found while scanning.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};

use crate::collections::{IndexSet, OrderedUniqueMap};
use crate::loader::{LoadTarget, LoadTargetKind};
use crate::persistence::LibraryPersistentState;
use crate::track::Track;
use crate::track_list::{
    GroupedSortedTrackList, Grouping, GroupingKind, SortOrder, TrackCollection, TrackList,
};

/// A playlist file found in a source folder, resolved against library tracks.
#[derive(Debug, Clone)]
pub struct ImportedPlaylist {
    path: PathBuf,
    name: String,
    tracks: Vec<Arc<Track>>,
}

impl ImportedPlaylist {
    pub fn new(path: PathBuf, tracks: Vec<Arc<Track>>) -> Self {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "Untitled Playlist".to_string());
        Self { path, name, tracks }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tracks(&self) -> &[Arc<Track>] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// Resolves a source folder the way the loader resolves track paths, so folder
/// prefixes match the tracks scanned from them. Unresolvable folders are kept as given.
pub fn resolve_source_folder(folder: &Path) -> PathBuf {
    std::fs::canonicalize(folder).unwrap_or_else(|_| folder.to_path_buf())
}

#[derive(Debug, Default)]
pub struct Library {
    tracks: GroupedSortedTrackList,
    source_folders: Vec<PathBuf>,
    playlists: OrderedUniqueMap<PathBuf, ImportedPlaylist>,
}

impl Library {
    pub fn new(sort_order: SortOrder) -> Self {
        Self {
            tracks: GroupedSortedTrackList::new(sort_order, &GroupingKind::ALL),
            source_folders: Vec::new(),
            playlists: OrderedUniqueMap::new(),
        }
    }

    pub fn source_folders(&self) -> &[PathBuf] {
        &self.source_folders
    }

    /// Returns false if the folder was already a source.
    pub fn add_source_folder(&mut self, folder: PathBuf) -> bool {
        let folder = resolve_source_folder(&folder);
        if self.source_folders.contains(&folder) {
            return false;
        }
        info!("Library: added source folder {}", folder.display());
        self.source_folders.push(folder);
        true
    }

    /// Forgets a source folder and removes every track and playlist under it.
    pub fn remove_source_folder(&mut self, folder: &Path) -> Vec<Arc<Track>> {
        let resolved = resolve_source_folder(folder);
        let folder = resolved.as_path();
        let before = self.source_folders.len();
        self.source_folders.retain(|source| source != folder);
        if self.source_folders.len() == before {
            return Vec::new();
        }
        let indices: IndexSet = self
            .tracks
            .track_list()
            .tracks()
            .enumerate()
            .filter(|(_, track)| track.path().starts_with(folder))
            .map(|(index, _)| index)
            .collect();
        let playlist_paths: Vec<PathBuf> = self
            .playlists
            .keys()
            .filter(|path| path.starts_with(folder))
            .cloned()
            .collect();
        self.playlists.remove_keys(playlist_paths.iter());
        let removed = self.remove_tracks(&indices);
        info!(
            "Library: removed source folder {} with {} track(s)",
            folder.display(),
            removed.len()
        );
        removed
    }

    pub fn playlists(&self) -> impl Iterator<Item = &ImportedPlaylist> {
        self.playlists.values()
    }

    pub fn playlist(&self, path: &Path) -> Option<&ImportedPlaylist> {
        self.playlists.get_by_key(&path.to_path_buf())
    }

    pub fn grouping(&self, kind: GroupingKind) -> Option<&Grouping> {
        self.tracks.grouping(kind)
    }

    pub fn sort_order(&self) -> &SortOrder {
        self.tracks.sort_order()
    }

    pub fn set_sort_order(&mut self, sort_order: SortOrder) {
        self.tracks.set_sort_order(sort_order);
    }

    fn prune_playlists(&mut self, removed: &[Arc<Track>]) {
        if removed.is_empty() || self.playlists.is_empty() {
            return;
        }
        let removed_paths: Vec<&Path> = removed.iter().map(|track| track.path()).collect();
        let updated: Vec<ImportedPlaylist> = self
            .playlists
            .values()
            .map(|playlist| {
                let tracks = playlist
                    .tracks
                    .iter()
                    .filter(|track| !removed_paths.contains(&track.path()))
                    .cloned()
                    .collect();
                ImportedPlaylist::new(playlist.path.clone(), tracks)
            })
            .collect();
        self.playlists.remove_all();
        self.playlists.append(
            updated
                .into_iter()
                .map(|playlist| (playlist.path.clone(), playlist)),
        );
    }

    pub fn persistent_state(&self) -> LibraryPersistentState {
        LibraryPersistentState {
            source_folders: self.source_folders.clone(),
            sort_order: self.sort_order().clone(),
        }
    }

    /// Seeds folders and sort order from a snapshot and returns the folders to scan.
    pub fn initialize(&mut self, state: &LibraryPersistentState) -> Vec<PathBuf> {
        for folder in &state.source_folders {
            self.add_source_folder(folder.clone());
        }
        self.set_sort_order(state.sort_order.clone());
        self.source_folders.clone()
    }
}

impl TrackCollection for Library {
    fn track_list(&self) -> &TrackList {
        self.tracks.track_list()
    }

    fn add_tracks(&mut self, tracks: Vec<Arc<Track>>) -> Vec<usize> {
        self.tracks.add_tracks(tracks)
    }

    fn insert_tracks(&mut self, tracks: Vec<Arc<Track>>, at: usize) -> Vec<usize> {
        self.tracks.insert_tracks(tracks, at)
    }

    fn remove_tracks(&mut self, indices: &IndexSet) -> Vec<Arc<Track>> {
        let removed = self.tracks.remove_tracks(indices);
        self.prune_playlists(&removed);
        removed
    }

    fn remove_all_tracks(&mut self) -> Vec<Arc<Track>> {
        self.playlists.remove_all();
        self.tracks.remove_all_tracks()
    }

    fn set_being_modified(&mut self, modified: bool) {
        self.tracks.set_being_modified(modified);
    }
}

impl LoadTarget for Library {
    fn kind(&self) -> LoadTargetKind {
        LoadTargetKind::Library
    }

    /// A re-imported playlist replaces the earlier import of the same file.
    fn register_playlist(&mut self, playlist: ImportedPlaylist) {
        debug!(
            "Library: registered playlist {} ({} track(s))",
            playlist.name(),
            playlist.len()
        );
        let key = playlist.path.clone();
        self.playlists.remove_keys([&key]);
        self.playlists.append([(key, playlist)]);
    }
}
