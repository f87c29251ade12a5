//! Secondary indices over a track list keyed by a metadata dimension.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::collections::OrderedUniqueMap;
use crate::track::Track;

use super::SortOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupingKind {
    Artists,
    Albums,
    Genres,
    Decades,
}

impl GroupingKind {
    pub const ALL: [GroupingKind; 4] = [
        GroupingKind::Artists,
        GroupingKind::Albums,
        GroupingKind::Genres,
        GroupingKind::Decades,
    ];

    /// Bucket for tracks without the relevant metadata.
    pub fn unknown_group_name(self) -> &'static str {
        match self {
            GroupingKind::Artists => "Unknown Artist",
            GroupingKind::Albums => "Unknown Album",
            GroupingKind::Genres => "Unknown Genre",
            GroupingKind::Decades => "Unknown Decade",
        }
    }

    pub fn group_name_for(self, track: &Track) -> String {
        let metadata = track.metadata();
        let value = match self {
            GroupingKind::Artists => metadata.artist.clone(),
            GroupingKind::Albums => metadata.album.clone(),
            GroupingKind::Genres => metadata.genre.clone(),
            GroupingKind::Decades => metadata.decade().map(|decade| format!("{decade}s")),
        };
        value
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| self.unknown_group_name().to_string())
    }
}

/// Tracks sharing one group key, in the order they were grouped.
#[derive(Debug, Clone, Default)]
pub struct Group {
    tracks: OrderedUniqueMap<PathBuf, Arc<Track>>,
}

impl Group {
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Arc<Track>> {
        self.tracks.values()
    }

    pub fn contains(&self, track: &Track) -> bool {
        self.tracks.contains_key(&track.path().to_path_buf())
    }
}

/// One grouping dimension. Every track of the owning list sits in exactly one group.
#[derive(Debug, Clone)]
pub struct Grouping {
    kind: GroupingKind,
    groups: BTreeMap<String, Group>,
}

impl Grouping {
    pub fn new(kind: GroupingKind) -> Self {
        Self {
            kind,
            groups: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> GroupingKind {
        self.kind
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn add_tracks(&mut self, tracks: &[Arc<Track>]) {
        for track in tracks {
            let name = self.kind.group_name_for(track);
            self.groups
                .entry(name)
                .or_default()
                .tracks
                .append([(track.path().to_path_buf(), Arc::clone(track))]);
        }
    }

    /// Removes tracks from their groups and drops groups left empty.
    pub fn remove_tracks(&mut self, tracks: &[Arc<Track>]) {
        for track in tracks {
            let name = self.kind.group_name_for(track);
            let Some(group) = self.groups.get_mut(&name) else {
                continue;
            };
            group.tracks.remove_keys([&track.path().to_path_buf()]);
            if group.is_empty() {
                self.groups.remove(&name);
            }
        }
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    pub fn sort_groups(&mut self, order: &SortOrder) {
        for group in self.groups.values_mut() {
            group
                .tracks
                .sort_by(|left, right| order.compare(left, right));
        }
    }
}

/// The set of groupings maintained by a grouped list.
#[derive(Debug, Clone)]
pub struct Groupings {
    groupings: Vec<Grouping>,
}

impl Default for Groupings {
    fn default() -> Self {
        Self::new(&GroupingKind::ALL)
    }
}

impl Groupings {
    pub fn new(kinds: &[GroupingKind]) -> Self {
        Self {
            groupings: kinds.iter().map(|&kind| Grouping::new(kind)).collect(),
        }
    }

    pub fn get(&self, kind: GroupingKind) -> Option<&Grouping> {
        self.groupings.iter().find(|grouping| grouping.kind == kind)
    }

    pub fn add_tracks(&mut self, tracks: &[Arc<Track>]) {
        for grouping in &mut self.groupings {
            grouping.add_tracks(tracks);
        }
    }

    pub fn remove_tracks(&mut self, tracks: &[Arc<Track>]) {
        for grouping in &mut self.groupings {
            grouping.remove_tracks(tracks);
        }
    }

    pub fn clear(&mut self) {
        for grouping in &mut self.groupings {
            grouping.clear();
        }
    }

    pub fn sort_groups(&mut self, order: &SortOrder) {
        for grouping in &mut self.groupings {
            grouping.sort_groups(order);
        }
    }
}
