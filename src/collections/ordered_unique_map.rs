//! Insertion-ordered associative container with unique keys.
//!
//! Every track list stores its entries here. Lookups by key are O(1); structural
//! edits are O(n) and re-derive the key→position index for the affected tail.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;

/// Sorted set of positional indices used by every multi-select operation.
pub type IndexSet = BTreeSet<usize>;

/// Old and new position of one entry relocated by a move operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexMove {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone)]
pub struct OrderedUniqueMap<K, V> {
    entries: Vec<(K, V)>,
    positions: HashMap<K, usize>,
}

impl<K, V> Default for OrderedUniqueMap<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V> OrderedUniqueMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&V> {
        self.entries.get(index).map(|(_, value)| value)
    }

    pub fn key_at(&self, index: usize) -> Option<&K> {
        self.entries.get(index).map(|(key, _)| key)
    }

    pub fn get_by_key(&self, key: &K) -> Option<&V> {
        self.index_of(key).and_then(|index| self.get(index))
    }

    pub fn index_of(&self, key: &K) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    /// Resolves keys to their current positions. Unknown keys are skipped.
    pub fn indices_of<'a>(&self, keys: impl IntoIterator<Item = &'a K>) -> IndexSet
    where
        K: 'a,
    {
        keys.into_iter()
            .filter_map(|key| self.index_of(key))
            .collect()
    }

    /// Every valid index that is not part of `indices`.
    pub fn complement(&self, indices: &IndexSet) -> IndexSet {
        (0..self.len())
            .filter(|index| !indices.contains(index))
            .collect()
    }

    fn reindex_from(&mut self, start: usize) {
        for (offset, (key, _)) in self.entries[start..].iter().enumerate() {
            self.positions.insert(key.clone(), start + offset);
        }
    }

    fn retain_new_items(&self, items: impl IntoIterator<Item = (K, V)>) -> Vec<(K, V)> {
        let mut seen = HashSet::new();
        items
            .into_iter()
            .filter(|(key, _)| !self.contains_key(key) && seen.insert(key.clone()))
            .collect()
    }

    /// Appends entries whose keys are not present yet and returns their indices.
    pub fn append(&mut self, items: impl IntoIterator<Item = (K, V)>) -> Vec<usize> {
        let at = self.len();
        self.insert(items, at)
    }

    /// Inserts entries at `at` (clamped to the length), preserving their relative
    /// order and shifting later entries right. Keys already present, or repeated
    /// within `items`, are dropped silently.
    pub fn insert(&mut self, items: impl IntoIterator<Item = (K, V)>, at: usize) -> Vec<usize> {
        let fresh = self.retain_new_items(items);
        if fresh.is_empty() {
            return Vec::new();
        }
        let at = at.min(self.len());
        let count = fresh.len();
        self.entries.splice(at..at, fresh);
        self.reindex_from(at);
        (at..at + count).collect()
    }

    /// Removes the entries at `indices` and returns them in ascending index order.
    /// Out-of-range indices are ignored.
    pub fn remove_at(&mut self, indices: &IndexSet) -> Vec<(K, V)> {
        let len = self.len();
        let Some(&first) = indices.iter().find(|&&index| index < len) else {
            return Vec::new();
        };

        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(len);
        for (index, entry) in std::mem::take(&mut self.entries).into_iter().enumerate() {
            if indices.contains(&index) {
                removed.push(entry);
            } else {
                kept.push(entry);
            }
        }
        self.entries = kept;
        for (key, _) in &removed {
            self.positions.remove(key);
        }
        self.reindex_from(first);
        removed
    }

    pub fn remove_keys<'a>(&mut self, keys: impl IntoIterator<Item = &'a K>) -> Vec<(K, V)>
    where
        K: 'a,
    {
        let indices = self.indices_of(keys);
        self.remove_at(&indices)
    }

    pub fn remove_all(&mut self) -> Vec<(K, V)> {
        self.positions.clear();
        std::mem::take(&mut self.entries)
    }

    fn valid_indices(&self, indices: &IndexSet) -> Vec<usize> {
        indices.range(..self.len()).copied().collect()
    }

    /// Moves each selected entry one position towards the start. A selected entry
    /// blocked by the start of the list, or by a selected entry that could not move,
    /// stays in place, so contiguous selections travel as a block.
    pub fn move_up(&mut self, indices: &IndexSet) -> Vec<IndexMove> {
        let mut moves = Vec::new();
        let mut pinned = HashSet::new();
        for index in self.valid_indices(indices) {
            if index == 0 || pinned.contains(&(index - 1)) {
                pinned.insert(index);
                continue;
            }
            self.entries.swap(index, index - 1);
            pinned.insert(index - 1);
            moves.push(IndexMove {
                from: index,
                to: index - 1,
            });
        }
        if let Some(first) = moves.iter().map(|change| change.to).min() {
            self.reindex_from(first);
        }
        moves
    }

    /// Mirror image of [`OrderedUniqueMap::move_up`].
    pub fn move_down(&mut self, indices: &IndexSet) -> Vec<IndexMove> {
        let last = self.len().saturating_sub(1);
        let mut moves = Vec::new();
        let mut pinned = HashSet::new();
        for index in self.valid_indices(indices).into_iter().rev() {
            if index == last || pinned.contains(&(index + 1)) {
                pinned.insert(index);
                continue;
            }
            self.entries.swap(index, index + 1);
            pinned.insert(index + 1);
            moves.push(IndexMove {
                from: index,
                to: index + 1,
            });
        }
        moves.reverse();
        if let Some(first) = moves.iter().map(|change| change.from).min() {
            self.reindex_from(first);
        }
        moves
    }

    pub fn move_to_top(&mut self, indices: &IndexSet) -> Vec<IndexMove> {
        self.move_to(indices, 0)
    }

    pub fn move_to_bottom(&mut self, indices: &IndexSet) -> Vec<IndexMove> {
        let len = self.len();
        self.move_to(indices, len)
    }

    /// Drag-and-drop relocation: the selected entries land contiguously starting
    /// at the gap `to`, expressed in positions before the move. Returns a move for
    /// every selected entry whose index changed.
    pub fn move_to(&mut self, indices: &IndexSet, to: usize) -> Vec<IndexMove> {
        let selected = self.valid_indices(indices);
        if selected.is_empty() {
            return Vec::new();
        }
        let to = to.min(self.len());
        let removed_above = selected.iter().filter(|&&index| index < to).count();
        let destination = to - removed_above;

        let mut picked = Vec::with_capacity(selected.len());
        let mut rest = Vec::with_capacity(self.len() - selected.len());
        for (index, entry) in std::mem::take(&mut self.entries).into_iter().enumerate() {
            if indices.contains(&index) {
                picked.push(entry);
            } else {
                rest.push(entry);
            }
        }
        rest.splice(destination..destination, picked);
        self.entries = rest;

        let moves: Vec<IndexMove> = selected
            .iter()
            .enumerate()
            .map(|(offset, &from)| IndexMove {
                from,
                to: destination + offset,
            })
            .filter(|change| change.from != change.to)
            .collect();
        let first_touched = selected[0].min(destination);
        self.reindex_from(first_touched);
        moves
    }

    /// Stable in-place sort by value.
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&V, &V) -> Ordering,
    {
        self.entries.sort_by(|left, right| compare(&left.1, &right.1));
        self.reindex_from(0);
    }
}
