use std::sync::Arc;

use crate::collections::{IndexMove, IndexSet};
use crate::track::Track;

use super::{
    Grouping, GroupingKind, Groupings, SortOrder, SortedTrackList, TrackCollection, TrackList,
};

/// A track list that replays every add and removal through its groupings.
#[derive(Debug, Clone, Default)]
pub struct GroupedTrackList {
    list: TrackList,
    groupings: Groupings,
}

impl GroupedTrackList {
    pub fn new(kinds: &[GroupingKind]) -> Self {
        Self {
            list: TrackList::new(),
            groupings: Groupings::new(kinds),
        }
    }

    pub fn grouping(&self, kind: GroupingKind) -> Option<&Grouping> {
        self.groupings.get(kind)
    }

    fn group_added(&mut self, indices: &[usize]) {
        let added: Vec<Arc<Track>> = indices
            .iter()
            .filter_map(|&index| self.list.track(index).cloned())
            .collect();
        self.groupings.add_tracks(&added);
    }

    /// Reordering does not change group membership.
    pub fn move_tracks_up(&mut self, indices: &IndexSet) -> Vec<IndexMove> {
        self.list.move_tracks_up(indices)
    }

    pub fn move_tracks_down(&mut self, indices: &IndexSet) -> Vec<IndexMove> {
        self.list.move_tracks_down(indices)
    }

    pub fn move_tracks_to_top(&mut self, indices: &IndexSet) -> Vec<IndexMove> {
        self.list.move_tracks_to_top(indices)
    }

    pub fn move_tracks_to_bottom(&mut self, indices: &IndexSet) -> Vec<IndexMove> {
        self.list.move_tracks_to_bottom(indices)
    }

    pub fn drop_tracks(&mut self, indices: &IndexSet, to: usize) -> Vec<IndexMove> {
        self.list.drop_tracks(indices, to)
    }
}

impl TrackCollection for GroupedTrackList {
    fn track_list(&self) -> &TrackList {
        &self.list
    }

    fn add_tracks(&mut self, tracks: Vec<Arc<Track>>) -> Vec<usize> {
        let indices = self.list.add_tracks(tracks);
        self.group_added(&indices);
        indices
    }

    fn insert_tracks(&mut self, tracks: Vec<Arc<Track>>, at: usize) -> Vec<usize> {
        let indices = self.list.insert_tracks(tracks, at);
        self.group_added(&indices);
        indices
    }

    fn remove_tracks(&mut self, indices: &IndexSet) -> Vec<Arc<Track>> {
        let removed = self.list.remove_tracks(indices);
        self.groupings.remove_tracks(&removed);
        removed
    }

    fn remove_all_tracks(&mut self) -> Vec<Arc<Track>> {
        self.groupings.clear();
        self.list.remove_all_tracks()
    }

    fn set_being_modified(&mut self, modified: bool) {
        self.list.set_being_modified(modified);
    }
}

/// A sorted track list with groupings; group members follow the list's sort order.
#[derive(Debug, Clone, Default)]
pub struct GroupedSortedTrackList {
    sorted: SortedTrackList,
    groupings: Groupings,
}

impl GroupedSortedTrackList {
    pub fn new(sort_order: SortOrder, kinds: &[GroupingKind]) -> Self {
        Self {
            sorted: SortedTrackList::new(sort_order),
            groupings: Groupings::new(kinds),
        }
    }

    pub fn grouping(&self, kind: GroupingKind) -> Option<&Grouping> {
        self.groupings.get(kind)
    }

    pub fn sort_order(&self) -> &SortOrder {
        self.sorted.sort_order()
    }

    pub fn set_sort_order(&mut self, sort_order: SortOrder) {
        self.sorted.set_sort_order(sort_order);
        self.groupings.sort_groups(self.sorted.sort_order());
    }

    fn group_added(&mut self, indices: &[usize]) {
        if indices.is_empty() {
            return;
        }
        let added: Vec<Arc<Track>> = indices
            .iter()
            .filter_map(|&index| self.sorted.track(index))
            .collect();
        self.groupings.add_tracks(&added);
        self.groupings.sort_groups(self.sorted.sort_order());
    }
}

impl TrackCollection for GroupedSortedTrackList {
    fn track_list(&self) -> &TrackList {
        self.sorted.track_list()
    }

    fn add_tracks(&mut self, tracks: Vec<Arc<Track>>) -> Vec<usize> {
        let indices = self.sorted.add_tracks(tracks);
        self.group_added(&indices);
        indices
    }

    fn insert_tracks(&mut self, tracks: Vec<Arc<Track>>, at: usize) -> Vec<usize> {
        let indices = self.sorted.insert_tracks(tracks, at);
        self.group_added(&indices);
        indices
    }

    fn remove_tracks(&mut self, indices: &IndexSet) -> Vec<Arc<Track>> {
        let removed = self.sorted.remove_tracks(indices);
        self.groupings.remove_tracks(&removed);
        removed
    }

    fn remove_all_tracks(&mut self) -> Vec<Arc<Track>> {
        self.groupings.clear();
        self.sorted.remove_all_tracks()
    }

    fn set_being_modified(&mut self, modified: bool) {
        self.sorted.set_being_modified(modified);
    }
}
