//! Precomputed shuffle order consumed one step at a time.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use super::RepeatMode;

/// A permutation of queue indices with a cursor.
///
/// `sequence[..=cursor]` has been played; `sequence[cursor + 1..]` is still to
/// come. Each pass visits every index exactly once. Peeking never moves the cursor.
pub struct ShuffleSequence {
    sequence: Vec<usize>,
    cursor: Option<usize>,
    rng: StdRng,
}

impl std::fmt::Debug for ShuffleSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShuffleSequence")
            .field("sequence", &self.sequence)
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl Default for ShuffleSequence {
    fn default() -> Self {
        Self::new()
    }
}

fn random_seed() -> [u8; 32] {
    let mut seed = [0u8; 32];
    if let Err(err) = getrandom::fill(&mut seed) {
        log::warn!("ShuffleSequence: falling back to time-based seed: {}", err);
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|duration| duration.as_nanos())
            .unwrap_or(0);
        for (slot, byte) in seed.iter_mut().zip(nanos.to_le_bytes().iter().cycle()) {
            *slot = *byte;
        }
    }
    seed
}

impl ShuffleSequence {
    pub fn new() -> Self {
        Self::from_seed(random_seed())
    }

    /// Deterministic sequence, used to make shuffle behavior reproducible.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            sequence: Vec::new(),
            cursor: None,
            rng: StdRng::from_seed(seed),
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn clear(&mut self) {
        self.sequence.clear();
        self.cursor = None;
    }

    /// Index under the cursor, i.e. the most recently consumed one.
    pub fn current(&self) -> Option<usize> {
        self.cursor.map(|cursor| self.sequence[cursor])
    }

    /// Builds a fresh permutation of `0..size`. When `start_with` is given it is
    /// placed first and counted as already played.
    pub fn resize_and_reshuffle(&mut self, size: usize, start_with: Option<usize>) {
        let start_with = start_with.filter(|&index| index < size);
        let mut remainder: Vec<usize> = (0..size)
            .filter(|&index| Some(index) != start_with)
            .collect();
        remainder.shuffle(&mut self.rng);

        self.sequence = start_with.into_iter().chain(remainder).collect();
        self.cursor = start_with.map(|_| 0);
    }

    /// Reshuffles for a new pass, avoiding an immediate repeat of the last index.
    fn reshuffle_for_new_pass(&mut self) {
        let size = self.sequence.len();
        let last_played = self.current();
        self.resize_and_reshuffle(size, None);
        if size > 1 && self.sequence.first().copied() == last_played {
            self.sequence.swap(0, size - 1);
        }
    }

    fn has_next(&self) -> bool {
        match self.cursor {
            Some(cursor) => cursor + 1 < self.sequence.len(),
            None => !self.sequence.is_empty(),
        }
    }

    fn next_position(&self) -> usize {
        self.cursor.map_or(0, |cursor| cursor + 1)
    }

    /// Consumes the next unplayed index. When the pass is exhausted, repeat-all
    /// starts a new pass; any other mode returns `None` and leaves the cursor alone.
    pub fn next(&mut self, repeat_mode: RepeatMode) -> Option<usize> {
        if self.sequence.is_empty() {
            return None;
        }
        if !self.has_next() {
            if repeat_mode != RepeatMode::All {
                return None;
            }
            self.reshuffle_for_new_pass();
        }
        let position = self.next_position();
        self.cursor = Some(position);
        Some(self.sequence[position])
    }

    /// Steps back through already played history. Never invents new randomness.
    pub fn previous(&mut self) -> Option<usize> {
        let cursor = self.cursor.filter(|&cursor| cursor > 0)?;
        self.cursor = Some(cursor - 1);
        Some(self.sequence[cursor - 1])
    }

    /// Index [`ShuffleSequence::next`] would return, if it is already determined.
    /// An exhausted pass under repeat-all has no determined next index yet.
    pub fn peek_next(&self) -> Option<usize> {
        if self.has_next() {
            self.sequence.get(self.next_position()).copied()
        } else {
            None
        }
    }

    pub fn peek_previous(&self) -> Option<usize> {
        let cursor = self.cursor.filter(|&cursor| cursor > 0)?;
        self.sequence.get(cursor - 1).copied()
    }

    /// Whether every index of the current pass has been consumed.
    pub fn is_exhausted(&self) -> bool {
        !self.has_next()
    }
}

#[cfg(test)]
mod tests {
    use super::ShuffleSequence;
    use crate::play_queue::RepeatMode;
    use std::collections::HashSet;

    fn seeded() -> ShuffleSequence {
        ShuffleSequence::from_seed([7u8; 32])
    }

    #[test]
    fn test_fresh_sequence_visits_every_index_once_before_repeating() {
        let mut sequence = seeded();
        sequence.resize_and_reshuffle(25, None);
        let visited: HashSet<usize> = (0..25)
            .map(|_| sequence.next(RepeatMode::All).expect("index"))
            .collect();
        assert_eq!(visited, (0..25).collect());
        assert!(sequence.is_exhausted());
    }

    #[test]
    fn test_start_with_counts_as_played() {
        let mut sequence = seeded();
        sequence.resize_and_reshuffle(5, Some(3));
        assert_eq!(sequence.current(), Some(3));
        let rest: Vec<usize> = (0..4)
            .map(|_| sequence.next(RepeatMode::Off).expect("index"))
            .collect();
        assert!(!rest.contains(&3));
        assert_eq!(sequence.next(RepeatMode::Off), None);
        assert_eq!(sequence.current(), rest.last().copied());
    }

    #[test]
    fn test_repeat_all_starts_a_new_pass_after_exhaustion() {
        let mut sequence = seeded();
        sequence.resize_and_reshuffle(3, None);
        let first_pass: Vec<usize> = (0..3)
            .map(|_| sequence.next(RepeatMode::All).expect("index"))
            .collect();
        assert_eq!(sequence.peek_next(), None);
        let next = sequence.next(RepeatMode::All).expect("new pass");
        assert_ne!(Some(next), first_pass.last().copied());
        assert_eq!(sequence.len(), 3);
    }

    #[test]
    fn test_peeking_does_not_consume() {
        let mut sequence = seeded();
        sequence.resize_and_reshuffle(4, None);
        let peeked = sequence.peek_next();
        assert_eq!(sequence.peek_next(), peeked);
        assert_eq!(sequence.next(RepeatMode::Off), peeked);
        assert_eq!(sequence.peek_previous(), None);

        let second = sequence.next(RepeatMode::Off);
        assert_eq!(sequence.peek_previous(), peeked);
        assert_eq!(sequence.current(), second);
    }

    #[test]
    fn test_previous_walks_back_through_history_only() {
        let mut sequence = seeded();
        sequence.resize_and_reshuffle(4, None);
        let first = sequence.next(RepeatMode::Off);
        let second = sequence.next(RepeatMode::Off);
        assert_eq!(sequence.previous(), first);
        assert_eq!(sequence.previous(), None);
        assert_eq!(sequence.next(RepeatMode::Off), second);
    }
}
