use std::sync::Arc;

use crate::collections::IndexSet;
use crate::track::Track;

use super::{SortOrder, TrackCollection, TrackList};

/// A track list that keeps itself sorted by a [`SortOrder`].
///
/// Positional inserts are accepted for interface compatibility but the position is
/// ignored: the list is re-sorted before any mutation returns.
#[derive(Debug, Clone, Default)]
pub struct SortedTrackList {
    list: TrackList,
    sort_order: SortOrder,
}

impl SortedTrackList {
    pub fn new(sort_order: SortOrder) -> Self {
        Self {
            list: TrackList::new(),
            sort_order,
        }
    }

    pub fn sort_order(&self) -> &SortOrder {
        &self.sort_order
    }

    /// Replaces the sort order and re-sorts immediately.
    pub fn set_sort_order(&mut self, sort_order: SortOrder) {
        self.sort_order = sort_order;
        self.list.sort(&self.sort_order);
    }

    fn add_and_resort(&mut self, tracks: Vec<Arc<Track>>) -> Vec<usize> {
        let added = self.list.add_tracks(tracks);
        if added.is_empty() {
            return added;
        }
        let added_tracks: Vec<Arc<Track>> = added
            .iter()
            .filter_map(|&index| self.list.track(index).cloned())
            .collect();
        self.list.sort(&self.sort_order);
        let mut indices: Vec<usize> = added_tracks
            .iter()
            .filter_map(|track| self.list.index_of_path(track.path()))
            .collect();
        indices.sort_unstable();
        indices
    }
}

impl TrackCollection for SortedTrackList {
    fn track_list(&self) -> &TrackList {
        &self.list
    }

    fn add_tracks(&mut self, tracks: Vec<Arc<Track>>) -> Vec<usize> {
        self.add_and_resort(tracks)
    }

    fn insert_tracks(&mut self, tracks: Vec<Arc<Track>>, _at: usize) -> Vec<usize> {
        self.add_and_resort(tracks)
    }

    fn remove_tracks(&mut self, indices: &IndexSet) -> Vec<Arc<Track>> {
        self.list.remove_tracks(indices)
    }

    fn remove_all_tracks(&mut self) -> Vec<Arc<Track>> {
        self.list.remove_all_tracks()
    }

    fn set_being_modified(&mut self, modified: bool) {
        self.list.set_being_modified(modified);
    }
}
