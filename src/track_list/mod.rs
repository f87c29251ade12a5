//! Ordered, de-duplicated track collections.
//!
//! [`TrackList`] is the base collection. Sorted and grouped variants wrap it and
//! re-establish their invariants after every mutation; all of them implement
//! [`TrackCollection`] so the loader can feed any of them.
//!
//! Operations are tolerant: unknown indices or tracks are ignored and left out of
//! results, since UI selections may race with background removals.

pub mod grouped;
pub mod grouping;
pub mod search;
pub mod sort;
pub mod sorted;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use crate::collections::{IndexMove, IndexSet, OrderedUniqueMap};
use crate::track::Track;

pub use grouped::{GroupedSortedTrackList, GroupedTrackList};
pub use grouping::{Group, Grouping, GroupingKind, Groupings};
pub use search::{MatchType, SearchField, SearchQuery, SearchResult};
pub use sort::{SortDirection, SortField, SortOrder};
pub use sorted::SortedTrackList;

/// Shared contract of every track collection.
pub trait TrackCollection {
    fn track_list(&self) -> &TrackList;

    /// Appends tracks not already present and returns their final indices.
    fn add_tracks(&mut self, tracks: Vec<Arc<Track>>) -> Vec<usize>;

    /// Inserts tracks not already present at `at` and returns their final indices.
    fn insert_tracks(&mut self, tracks: Vec<Arc<Track>>, at: usize) -> Vec<usize>;

    fn remove_tracks(&mut self, indices: &IndexSet) -> Vec<Arc<Track>>;

    fn remove_all_tracks(&mut self) -> Vec<Arc<Track>>;

    fn set_being_modified(&mut self, modified: bool);

    /// Removes the given tracks by resolving them to the same index set
    /// [`TrackCollection::remove_tracks`] would receive.
    fn remove_tracks_by_value(&mut self, tracks: &[Arc<Track>]) -> Vec<Arc<Track>> {
        let indices = self.track_list().indices_of_tracks(tracks);
        self.remove_tracks(&indices)
    }

    /// Removes every track not in `keep` as a single removal.
    fn crop_tracks(&mut self, keep: &IndexSet) -> Vec<Arc<Track>> {
        let complement = self.track_list().tracks.complement(keep);
        self.remove_tracks(&complement)
    }

    fn len(&self) -> usize {
        self.track_list().len()
    }

    fn is_empty(&self) -> bool {
        self.track_list().is_empty()
    }

    fn track(&self, index: usize) -> Option<Arc<Track>> {
        self.track_list().track(index).cloned()
    }

    fn contains_path(&self, path: &Path) -> bool {
        self.track_list().contains_path(path)
    }

    fn index_of_path(&self, path: &Path) -> Option<usize> {
        self.track_list().index_of_path(path)
    }

    fn search(&self, query: &SearchQuery) -> Vec<SearchResult> {
        self.track_list().search(query)
    }
}

/// Base ordered collection keyed by file path.
#[derive(Debug, Clone, Default)]
pub struct TrackList {
    tracks: OrderedUniqueMap<PathBuf, Arc<Track>>,
    active_loads: usize,
    generation: u64,
}

fn keyed(tracks: Vec<Arc<Track>>) -> impl Iterator<Item = (PathBuf, Arc<Track>)> {
    tracks
        .into_iter()
        .map(|track| (track.path().to_path_buf(), track))
}

fn values(entries: Vec<(PathBuf, Arc<Track>)>) -> Vec<Arc<Track>> {
    entries.into_iter().map(|(_, track)| track).collect()
}

impl TrackList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn track(&self, index: usize) -> Option<&Arc<Track>> {
        self.tracks.get(index)
    }

    pub fn track_for_path(&self, path: &Path) -> Option<&Arc<Track>> {
        self.tracks.get_by_key(&path.to_path_buf())
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Arc<Track>> {
        self.tracks.values()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.tracks.keys().cloned().collect()
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.tracks.contains_key(&path.to_path_buf())
    }

    pub fn index_of_path(&self, path: &Path) -> Option<usize> {
        self.tracks.index_of(&path.to_path_buf())
    }

    pub fn indices_of_tracks(&self, tracks: &[Arc<Track>]) -> IndexSet {
        tracks
            .iter()
            .filter_map(|track| self.index_of_path(track.path()))
            .collect()
    }

    /// True while at least one load is writing into this list. Advisory only:
    /// callers should expect the size to change underneath them while it is set.
    pub fn is_being_modified(&self) -> bool {
        self.active_loads > 0
    }

    /// Each load marks the list once when it starts and once when it ends, so
    /// overlapping loads keep the flag set until the last one finished.
    pub fn set_being_modified(&mut self, modified: bool) {
        if modified {
            self.active_loads += 1;
        } else {
            self.active_loads = self.active_loads.saturating_sub(1);
        }
    }

    /// Bumped by [`TrackList::remove_all_tracks`]. Loads compare it against the
    /// value seen when they started to detect that the list was cleared.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn add_tracks(&mut self, tracks: Vec<Arc<Track>>) -> Vec<usize> {
        self.tracks.append(keyed(tracks))
    }

    pub fn insert_tracks(&mut self, tracks: Vec<Arc<Track>>, at: usize) -> Vec<usize> {
        self.tracks.insert(keyed(tracks), at)
    }

    pub fn remove_tracks(&mut self, indices: &IndexSet) -> Vec<Arc<Track>> {
        values(self.tracks.remove_at(indices))
    }

    pub fn remove_tracks_by_value(&mut self, tracks: &[Arc<Track>]) -> Vec<Arc<Track>> {
        let indices = self.indices_of_tracks(tracks);
        self.remove_tracks(&indices)
    }

    pub fn remove_all_tracks(&mut self) -> Vec<Arc<Track>> {
        self.generation = self.generation.wrapping_add(1);
        debug!(
            "TrackList: cleared {} track(s), generation {}",
            self.tracks.len(),
            self.generation
        );
        values(self.tracks.remove_all())
    }

    pub fn crop_tracks(&mut self, keep: &IndexSet) -> Vec<Arc<Track>> {
        let complement = self.tracks.complement(keep);
        self.remove_tracks(&complement)
    }

    pub fn move_tracks_up(&mut self, indices: &IndexSet) -> Vec<IndexMove> {
        self.tracks.move_up(indices)
    }

    pub fn move_tracks_down(&mut self, indices: &IndexSet) -> Vec<IndexMove> {
        self.tracks.move_down(indices)
    }

    pub fn move_tracks_to_top(&mut self, indices: &IndexSet) -> Vec<IndexMove> {
        self.tracks.move_to_top(indices)
    }

    pub fn move_tracks_to_bottom(&mut self, indices: &IndexSet) -> Vec<IndexMove> {
        self.tracks.move_to_bottom(indices)
    }

    /// Drag-and-drop move; `to` is a gap index in pre-move coordinates.
    pub fn drop_tracks(&mut self, indices: &IndexSet, to: usize) -> Vec<IndexMove> {
        self.tracks.move_to(indices, to)
    }

    /// Stable in-place sort.
    pub fn sort(&mut self, order: &SortOrder) {
        self.tracks.sort_by(|left, right| order.compare(left, right));
    }

    pub fn search(&self, query: &SearchQuery) -> Vec<SearchResult> {
        if query.text.is_empty() {
            return Vec::new();
        }
        self.tracks
            .values()
            .enumerate()
            .filter_map(|(index, track)| {
                query
                    .first_match(track)
                    .map(|(field, matched_value)| SearchResult {
                        index,
                        track: Arc::clone(track),
                        field,
                        matched_value,
                    })
            })
            .collect()
    }
}

impl TrackCollection for TrackList {
    fn track_list(&self) -> &TrackList {
        self
    }

    fn add_tracks(&mut self, tracks: Vec<Arc<Track>>) -> Vec<usize> {
        TrackList::add_tracks(self, tracks)
    }

    fn insert_tracks(&mut self, tracks: Vec<Arc<Track>>, at: usize) -> Vec<usize> {
        TrackList::insert_tracks(self, tracks, at)
    }

    fn remove_tracks(&mut self, indices: &IndexSet) -> Vec<Arc<Track>> {
        TrackList::remove_tracks(self, indices)
    }

    fn remove_all_tracks(&mut self) -> Vec<Arc<Track>> {
        TrackList::remove_all_tracks(self)
    }

    fn set_being_modified(&mut self, modified: bool) {
        TrackList::set_being_modified(self, modified)
    }
}
