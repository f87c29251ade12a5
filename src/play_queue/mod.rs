//! The track list that drives playback.
//!
//! [`PlayQueue`] layers a current-track cursor, repeat/shuffle modes and a
//! [`ShuffleSequence`] over a [`TrackList`]. Every list mutation translates the
//! cursor so it keeps pointing at the same logical track.

mod sequencer;
pub mod shuffle;

use std::path::PathBuf;
use std::sync::Arc;

use log::debug;

use crate::collections::{IndexMove, IndexSet};
use crate::error::TrackListError;
use crate::loader::{LoadTarget, LoadTargetKind};
use crate::persistence::PlayQueuePersistentState;
use crate::track::Track;
use crate::track_list::{SortOrder, TrackCollection, TrackList};

pub use shuffle::ShuffleSequence;

/// Repeat behavior applied when playback runs past the current track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    #[default]
    Off, // Stop after reaching the end of the queue
    All, // Repeat the queue from the beginning
    One, // Repeat the current track
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShuffleMode {
    #[default]
    Off,
    On,
}

#[derive(Debug, Default)]
pub struct PlayQueue {
    list: TrackList,
    current_track_index: Option<usize>,
    repeat_mode: RepeatMode,
    shuffle_mode: ShuffleMode,
    shuffle_sequence: ShuffleSequence,
    /// Path that was current when the persisted state was captured; re-selected
    /// once a load inserts it again.
    pending_restore: Option<PathBuf>,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue whose shuffle order is reproducible.
    pub fn with_shuffle_sequence(shuffle_sequence: ShuffleSequence) -> Self {
        Self {
            shuffle_sequence,
            ..Self::default()
        }
    }

    pub fn current_track_index(&self) -> Option<usize> {
        self.current_track_index
    }

    pub fn current_track(&self) -> Option<Arc<Track>> {
        self.current_track_index
            .and_then(|index| self.list.track(index).cloned())
    }

    pub fn repeat_and_shuffle_modes(&self) -> (RepeatMode, ShuffleMode) {
        (self.repeat_mode, self.shuffle_mode)
    }

    /// Checks that the track at `index` can be handed to the audio engine.
    pub fn prepare_for_playback(&self, index: usize) -> Result<Arc<Track>, TrackListError> {
        let track = self
            .list
            .track(index)
            .cloned()
            .ok_or(TrackListError::IndexOutOfRange {
                index,
                len: self.list.len(),
            })?;
        if !track.path().is_file() {
            return Err(TrackListError::TrackFileMissing(track.path().to_path_buf()));
        }
        Ok(track)
    }

    /// Rebuilds the shuffle order after the queue changed size or order,
    /// continuing from the current track.
    fn refresh_shuffle_sequence(&mut self) {
        if self.shuffle_mode == ShuffleMode::On {
            self.shuffle_sequence
                .resize_and_reshuffle(self.list.len(), self.current_track_index);
        }
    }

    fn adopt_index_of(&mut self, current: Option<Arc<Track>>) {
        self.current_track_index =
            current.and_then(|track| self.list.index_of_path(track.path()));
        self.refresh_shuffle_sequence();
    }

    fn translate_after_insert(&mut self, inserted: &[usize]) {
        let Some(&first) = inserted.first() else {
            return;
        };
        if let Some(current) = self.current_track_index {
            if first <= current {
                self.current_track_index = Some(current + inserted.len());
            }
        }
        self.try_restore_current();
        self.refresh_shuffle_sequence();
    }

    fn try_restore_current(&mut self) {
        let Some(path) = self.pending_restore.as_ref() else {
            return;
        };
        if let Some(index) = self.list.index_of_path(path) {
            debug!("PlayQueue: restored current track at index {}", index);
            self.current_track_index = Some(index);
            self.pending_restore = None;
        }
    }

    pub fn move_tracks_up(&mut self, indices: &IndexSet) -> Vec<IndexMove> {
        let current = self.current_track();
        let moves = self.list.move_tracks_up(indices);
        self.adopt_index_of(current);
        moves
    }

    pub fn move_tracks_down(&mut self, indices: &IndexSet) -> Vec<IndexMove> {
        let current = self.current_track();
        let moves = self.list.move_tracks_down(indices);
        self.adopt_index_of(current);
        moves
    }

    pub fn move_tracks_to_top(&mut self, indices: &IndexSet) -> Vec<IndexMove> {
        let current = self.current_track();
        let moves = self.list.move_tracks_to_top(indices);
        self.adopt_index_of(current);
        moves
    }

    pub fn move_tracks_to_bottom(&mut self, indices: &IndexSet) -> Vec<IndexMove> {
        let current = self.current_track();
        let moves = self.list.move_tracks_to_bottom(indices);
        self.adopt_index_of(current);
        moves
    }

    pub fn drop_tracks(&mut self, indices: &IndexSet, to: usize) -> Vec<IndexMove> {
        let current = self.current_track();
        let moves = self.list.drop_tracks(indices, to);
        self.adopt_index_of(current);
        moves
    }

    pub fn sort(&mut self, order: &SortOrder) {
        let current = self.current_track();
        self.list.sort(order);
        self.adopt_index_of(current);
    }

    /// Snapshot handed to the persistence layer at shutdown.
    pub fn persistent_state(&self) -> PlayQueuePersistentState {
        PlayQueuePersistentState {
            tracks: self.list.paths(),
            current_track_index: self.current_track_index,
            repeat_mode: self.repeat_mode,
            shuffle_mode: self.shuffle_mode,
        }
    }

    /// Seeds modes from a snapshot and returns the track paths to load. The
    /// persisted current track becomes current again once a load inserts it.
    pub fn initialize(&mut self, state: &PlayQueuePersistentState) -> Vec<PathBuf> {
        self.set_repeat_mode(state.repeat_mode);
        self.set_shuffle_mode(state.shuffle_mode);
        self.pending_restore = state
            .current_track_index
            .and_then(|index| state.tracks.get(index))
            .cloned();
        self.try_restore_current();
        state.tracks.clone()
    }
}

impl TrackCollection for PlayQueue {
    fn track_list(&self) -> &TrackList {
        &self.list
    }

    fn add_tracks(&mut self, tracks: Vec<Arc<Track>>) -> Vec<usize> {
        let inserted = self.list.add_tracks(tracks);
        self.translate_after_insert(&inserted);
        inserted
    }

    fn insert_tracks(&mut self, tracks: Vec<Arc<Track>>, at: usize) -> Vec<usize> {
        let inserted = self.list.insert_tracks(tracks, at);
        self.translate_after_insert(&inserted);
        inserted
    }

    fn remove_tracks(&mut self, indices: &IndexSet) -> Vec<Arc<Track>> {
        let removed = self.list.remove_tracks(indices);
        if removed.is_empty() {
            return removed;
        }
        if let Some(current) = self.current_track_index {
            if indices.contains(&current) {
                self.stop();
            } else {
                let shift = indices.range(..current).count();
                self.current_track_index = Some(current - shift);
            }
        }
        self.refresh_shuffle_sequence();
        removed
    }

    fn remove_all_tracks(&mut self) -> Vec<Arc<Track>> {
        self.stop();
        self.shuffle_sequence.clear();
        self.list.remove_all_tracks()
    }

    fn set_being_modified(&mut self, modified: bool) {
        self.list.set_being_modified(modified);
    }
}

impl LoadTarget for PlayQueue {
    fn kind(&self) -> LoadTargetKind {
        LoadTargetKind::PlayQueue
    }

    /// Starts with the first loaded file unless something is already playing.
    fn first_file_ready(&mut self, index: usize) {
        if self.current_track_index.is_none() {
            self.select(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PlayQueue, RepeatMode, ShuffleMode, ShuffleSequence};
    use crate::error::TrackListError;
    use crate::track_list::test_support::track;
    use crate::track_list::TrackCollection;

    fn queue_of(count: usize) -> PlayQueue {
        let mut queue = PlayQueue::with_shuffle_sequence(ShuffleSequence::from_seed([3u8; 32]));
        queue.add_tracks((0..count).map(|index| track(&format!("t{index}"))).collect());
        queue
    }

    fn set(indices: &[usize]) -> crate::collections::IndexSet {
        indices.iter().copied().collect()
    }

    #[test]
    fn test_insert_at_or_before_current_shifts_current() {
        let mut queue = queue_of(5);
        queue.select(2);
        let playing = queue.current_track();

        queue.insert_tracks(vec![track("x"), track("y")], 2);
        assert_eq!(queue.current_track_index(), Some(4));
        assert_eq!(queue.current_track(), playing);

        queue.insert_tracks(vec![track("z")], 5);
        assert_eq!(queue.current_track_index(), Some(4));
        queue.add_tracks(vec![track("w")]);
        assert_eq!(queue.current_track_index(), Some(4));
    }

    #[test]
    fn test_removal_shifts_or_clears_current() {
        let mut queue = queue_of(6);
        queue.select(3);
        let playing = queue.current_track();

        queue.remove_tracks(&set(&[0, 2, 5]));
        assert_eq!(queue.current_track_index(), Some(1));
        assert_eq!(queue.current_track(), playing);

        queue.remove_tracks(&set(&[1]));
        assert_eq!(queue.current_track_index(), None);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_moves_follow_the_current_track() {
        let mut queue = queue_of(5);
        queue.select(1);
        let playing = queue.current_track();

        queue.move_tracks_to_bottom(&set(&[1]));
        assert_eq!(queue.current_track_index(), Some(4));

        queue.move_tracks_up(&set(&[3]));
        assert_eq!(queue.current_track_index(), Some(4));

        queue.move_tracks_to_top(&set(&[2]));
        assert_eq!(queue.current_track_index(), Some(4));
        assert_eq!(queue.current_track(), playing);
    }

    #[test]
    fn test_remove_all_stops_playback() {
        let mut queue = queue_of(3);
        queue.select(1);
        queue.remove_all_tracks();
        assert_eq!(queue.current_track_index(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_prepare_for_playback_fails_fast() {
        let queue = queue_of(1);
        assert_eq!(
            queue.prepare_for_playback(4).map(|_| ()),
            Err(TrackListError::IndexOutOfRange { index: 4, len: 1 })
        );
        assert!(matches!(
            queue.prepare_for_playback(0),
            Err(TrackListError::TrackFileMissing(_))
        ));
    }

    #[test]
    fn test_persistent_state_round_trip_restores_current_after_load() {
        let mut queue = queue_of(3);
        queue.select(2);
        queue.set_repeat_mode(RepeatMode::All);
        let state = queue.persistent_state();

        let mut restored = PlayQueue::new();
        let paths = restored.initialize(&state);
        assert_eq!(paths.len(), 3);
        assert_eq!(
            restored.repeat_and_shuffle_modes(),
            (RepeatMode::All, ShuffleMode::Off)
        );
        assert_eq!(restored.current_track_index(), None);

        restored.add_tracks(vec![track("t0"), track("t1")]);
        assert_eq!(restored.current_track_index(), None);
        restored.add_tracks(vec![track("t2")]);
        assert_eq!(restored.current_track_index(), Some(2));
    }
}
