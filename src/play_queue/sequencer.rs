//! Playback order: which track plays next under each repeat/shuffle combination.
//!
//! `subsequent` is the automatic transition when a track ends; `next`/`previous`
//! are explicit user requests. The `peek_*` variants compute the same index
//! without touching the cursor or the shuffle sequence.

use std::sync::Arc;

use log::{debug, trace};

use crate::track::Track;

use super::{PlayQueue, RepeatMode, ShuffleMode};

impl PlayQueue {
    fn track_at(&self, index: Option<usize>) -> Option<Arc<Track>> {
        index.and_then(|index| self.list.track(index).cloned())
    }

    fn ensure_shuffle_sequence_sized(&mut self) {
        if self.shuffle_sequence.len() != self.list.len() {
            self.shuffle_sequence
                .resize_and_reshuffle(self.list.len(), self.current_track_index);
        }
    }

    fn sequential_subsequent_index(&self) -> Option<usize> {
        let size = self.list.len();
        if size == 0 {
            return None;
        }
        match (self.repeat_mode, self.current_track_index) {
            (RepeatMode::One, current) => Some(current.unwrap_or(0)),
            (_, Some(current)) if current + 1 < size => Some(current + 1),
            (RepeatMode::All, _) => Some(0),
            (_, None) => Some(0),
            (_, Some(_)) => None,
        }
    }

    fn sequential_next_index(&self) -> Option<usize> {
        let size = self.list.len();
        let current = self.current_track_index?;
        if current + 1 < size {
            Some(current + 1)
        } else if self.repeat_mode == RepeatMode::All {
            Some(0)
        } else {
            None
        }
    }

    fn sequential_previous_index(&self) -> Option<usize> {
        let size = self.list.len();
        let current = self.current_track_index?;
        if current > 0 {
            Some(current - 1)
        } else if self.repeat_mode == RepeatMode::All {
            Some(size - 1)
        } else {
            None
        }
    }

    fn can_step(&self) -> bool {
        self.list.len() > 1 && self.current_track_index.is_some()
    }

    fn shuffle_active(&self) -> bool {
        self.shuffle_mode == ShuffleMode::On && self.repeat_mode != RepeatMode::One
    }

    /// Begins playback of the queue.
    pub fn start(&mut self) -> Option<Arc<Track>> {
        if self.shuffle_mode == ShuffleMode::On {
            self.shuffle_sequence
                .resize_and_reshuffle(self.list.len(), None);
        }
        self.subsequent()
    }

    /// Ends the sequence. Tracks stay in the queue.
    pub fn stop(&mut self) {
        if self.current_track_index.take().is_some() {
            debug!("PlayQueue: playback sequence stopped");
        }
    }

    /// Makes `index` current. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> Option<Arc<Track>> {
        let track = self.list.track(index).cloned()?;
        self.current_track_index = Some(index);
        if self.shuffle_mode == ShuffleMode::On {
            self.shuffle_sequence
                .resize_and_reshuffle(self.list.len(), Some(index));
        }
        Some(track)
    }

    /// Makes `track` current if it is part of the queue.
    pub fn select_track(&mut self, track: &Track) -> Option<Arc<Track>> {
        let index = self.list.index_of_path(track.path())?;
        self.select(index)
    }

    /// Advances automatically after the current track finished. Returns `None`
    /// and clears the cursor once the sequence is complete.
    pub fn subsequent(&mut self) -> Option<Arc<Track>> {
        let index = if self.shuffle_active() {
            self.ensure_shuffle_sequence_sized();
            self.shuffle_sequence.next(self.repeat_mode)
        } else {
            self.sequential_subsequent_index()
        };
        trace!(
            "PlayQueue: subsequent {:?} -> {:?}",
            self.current_track_index,
            index
        );
        self.current_track_index = index;
        self.track_at(index)
    }

    /// User-requested advance. A lone track or an idle queue cannot advance, and
    /// running off the end without repeat-all leaves the cursor unchanged.
    pub fn next(&mut self) -> Option<Arc<Track>> {
        if !self.can_step() {
            return None;
        }
        let index = if self.shuffle_active() {
            self.ensure_shuffle_sequence_sized();
            self.shuffle_sequence.next(self.repeat_mode)
        } else {
            self.sequential_next_index()
        }?;
        self.current_track_index = Some(index);
        self.track_at(Some(index))
    }

    pub fn previous(&mut self) -> Option<Arc<Track>> {
        if !self.can_step() {
            return None;
        }
        let index = if self.shuffle_active() {
            self.ensure_shuffle_sequence_sized();
            self.shuffle_sequence.previous()
        } else {
            self.sequential_previous_index()
        }?;
        self.current_track_index = Some(index);
        self.track_at(Some(index))
    }

    fn shuffle_peekable(&self) -> bool {
        self.shuffle_active() && self.shuffle_sequence.len() == self.list.len()
    }

    /// Track [`PlayQueue::subsequent`] would return. Under shuffle with repeat-all,
    /// a finished pass has no determined successor yet and peeks as `None`.
    pub fn peek_subsequent(&self) -> Option<Arc<Track>> {
        let index = if self.shuffle_active() {
            self.shuffle_peekable()
                .then(|| self.shuffle_sequence.peek_next())
                .flatten()
        } else {
            self.sequential_subsequent_index()
        };
        self.track_at(index)
    }

    pub fn peek_next(&self) -> Option<Arc<Track>> {
        if !self.can_step() {
            return None;
        }
        let index = if self.shuffle_active() {
            self.shuffle_peekable()
                .then(|| self.shuffle_sequence.peek_next())
                .flatten()
        } else {
            self.sequential_next_index()
        };
        self.track_at(index)
    }

    pub fn peek_previous(&self) -> Option<Arc<Track>> {
        if !self.can_step() {
            return None;
        }
        let index = if self.shuffle_active() {
            self.shuffle_peekable()
                .then(|| self.shuffle_sequence.peek_previous())
                .flatten()
        } else {
            self.sequential_previous_index()
        };
        self.track_at(index)
    }

    /// Repeat-one and shuffle are mutually exclusive: choosing repeat-one turns
    /// shuffle off.
    pub fn set_repeat_mode(&mut self, mode: RepeatMode) -> (RepeatMode, ShuffleMode) {
        self.repeat_mode = mode;
        if mode == RepeatMode::One && self.shuffle_mode == ShuffleMode::On {
            self.shuffle_mode = ShuffleMode::Off;
            self.shuffle_sequence.clear();
        }
        debug!(
            "PlayQueue: modes now {:?}",
            self.repeat_and_shuffle_modes()
        );
        self.repeat_and_shuffle_modes()
    }

    /// Turning shuffle on drops repeat-one and builds a sequence that continues
    /// from the current track.
    pub fn set_shuffle_mode(&mut self, mode: ShuffleMode) -> (RepeatMode, ShuffleMode) {
        if mode == self.shuffle_mode {
            return self.repeat_and_shuffle_modes();
        }
        self.shuffle_mode = mode;
        match mode {
            ShuffleMode::On => {
                if self.repeat_mode == RepeatMode::One {
                    self.repeat_mode = RepeatMode::Off;
                }
                self.shuffle_sequence
                    .resize_and_reshuffle(self.list.len(), self.current_track_index);
            }
            ShuffleMode::Off => self.shuffle_sequence.clear(),
        }
        debug!(
            "PlayQueue: modes now {:?}",
            self.repeat_and_shuffle_modes()
        );
        self.repeat_and_shuffle_modes()
    }
}

#[cfg(test)]
mod tests {
    use crate::play_queue::{PlayQueue, RepeatMode, ShuffleMode, ShuffleSequence};
    use crate::track_list::test_support::track;
    use crate::track_list::TrackCollection;
    use std::collections::HashSet;

    fn queue_of(count: usize) -> PlayQueue {
        let mut queue = PlayQueue::with_shuffle_sequence(ShuffleSequence::from_seed([9u8; 32]));
        queue.add_tracks((0..count).map(|index| track(&format!("t{index}"))).collect());
        queue
    }

    #[test]
    fn test_subsequent_sequential_runs_to_completion() {
        let mut queue = queue_of(3);
        assert_eq!(queue.subsequent().map(|t| t.display_name()), Some("t0".into()));
        assert_eq!(queue.subsequent().map(|t| t.display_name()), Some("t1".into()));
        assert_eq!(queue.subsequent().map(|t| t.display_name()), Some("t2".into()));
        assert!(queue.subsequent().is_none());
        assert_eq!(queue.current_track_index(), None);
        assert_eq!(queue.subsequent().map(|t| t.display_name()), Some("t0".into()));
    }

    #[test]
    fn test_subsequent_repeat_all_wraps_and_repeat_one_replays() {
        let mut queue = queue_of(2);
        queue.set_repeat_mode(RepeatMode::All);
        queue.select(1);
        assert_eq!(queue.peek_subsequent(), queue.track(0));
        queue.subsequent();
        assert_eq!(queue.current_track_index(), Some(0));

        queue.set_repeat_mode(RepeatMode::One);
        queue.subsequent();
        queue.subsequent();
        assert_eq!(queue.current_track_index(), Some(0));
    }

    #[test]
    fn test_repeat_one_with_idle_queue_starts_at_first() {
        let mut queue = queue_of(2);
        queue.set_repeat_mode(RepeatMode::One);
        queue.subsequent();
        assert_eq!(queue.current_track_index(), Some(0));
    }

    #[test]
    fn test_next_and_previous_respect_boundaries() {
        let mut queue = queue_of(3);
        assert!(queue.next().is_none(), "idle queue cannot advance");

        queue.select(2);
        assert!(queue.next().is_none());
        assert_eq!(queue.current_track_index(), Some(2));

        queue.select(0);
        assert!(queue.previous().is_none());
        assert_eq!(queue.current_track_index(), Some(0));

        queue.set_repeat_mode(RepeatMode::All);
        queue.previous();
        assert_eq!(queue.current_track_index(), Some(2));
        queue.next();
        assert_eq!(queue.current_track_index(), Some(0));
    }

    #[test]
    fn test_single_track_cannot_step() {
        let mut queue = queue_of(1);
        queue.set_repeat_mode(RepeatMode::All);
        queue.select(0);
        assert!(queue.next().is_none());
        assert!(queue.previous().is_none());
        assert!(queue.peek_next().is_none());
    }

    #[test]
    fn test_peeks_never_mutate() {
        let mut queue = queue_of(4);
        queue.select(1);
        assert_eq!(queue.peek_next(), queue.track(2));
        assert_eq!(queue.peek_previous(), queue.track(0));
        assert_eq!(queue.peek_subsequent(), queue.track(2));
        assert_eq!(queue.current_track_index(), Some(1));

        queue.set_shuffle_mode(ShuffleMode::On);
        let peeked = queue.peek_next();
        assert_eq!(queue.peek_next(), peeked);
        assert_eq!(queue.peek_subsequent(), peeked);
        assert_eq!(queue.current_track_index(), Some(1));
        assert_eq!(queue.next(), peeked);
    }

    #[test]
    fn test_shuffle_round_trip_visits_each_track_then_ends() {
        let mut queue = PlayQueue::with_shuffle_sequence(ShuffleSequence::from_seed([5u8; 32]));
        let added = queue.add_tracks(vec![track("a"), track("b"), track("c")]);
        assert_eq!(added, vec![0, 1, 2]);
        queue.set_shuffle_mode(ShuffleMode::On);

        let first = queue.start().expect("start should pick a track");
        let second = queue.next().expect("second track");
        let third = queue.next().expect("third track");
        assert!(queue.next().is_none(), "sequence should be exhausted");

        let played: HashSet<String> = [first, second, third.clone()]
            .iter()
            .map(|track| track.display_name())
            .collect();
        assert_eq!(played.len(), 3);
        assert_eq!(queue.current_track(), Some(third));
    }

    #[test]
    fn test_shuffle_previous_retraces_history() {
        let mut queue = queue_of(5);
        queue.set_shuffle_mode(ShuffleMode::On);
        let first = queue.start();
        let _second = queue.next();
        assert_eq!(queue.previous(), first);
        assert!(queue.previous().is_none());
    }

    #[test]
    fn test_repeat_one_and_shuffle_are_exclusive() {
        let mut queue = queue_of(3);
        queue.set_shuffle_mode(ShuffleMode::On);
        assert_eq!(
            queue.set_repeat_mode(RepeatMode::One),
            (RepeatMode::One, ShuffleMode::Off)
        );
        assert_eq!(
            queue.repeat_and_shuffle_modes(),
            (RepeatMode::One, ShuffleMode::Off)
        );
        assert_eq!(
            queue.set_shuffle_mode(ShuffleMode::On),
            (RepeatMode::Off, ShuffleMode::On)
        );
        assert_eq!(
            queue.set_shuffle_mode(ShuffleMode::On),
            (RepeatMode::Off, ShuffleMode::On)
        );
    }

    #[test]
    fn test_shuffle_subsequent_with_repeat_all_keeps_going() {
        let mut queue = queue_of(3);
        queue.set_repeat_mode(RepeatMode::All);
        queue.set_shuffle_mode(ShuffleMode::On);
        let visited: HashSet<usize> = (0..3)
            .map(|_| {
                queue.subsequent();
                queue.current_track_index().expect("index")
            })
            .collect();
        assert_eq!(visited.len(), 3);
        assert!(queue.subsequent().is_some());
    }

    #[test]
    fn test_select_track_requires_membership() {
        let mut queue = queue_of(2);
        assert!(queue.select_track(&track("nope")).is_none());
        assert!(queue.select(7).is_none());
        assert_eq!(queue.current_track_index(), None);
        assert!(queue.select_track(&track("t1")).is_some());
        assert_eq!(queue.current_track_index(), Some(1));
    }
}
