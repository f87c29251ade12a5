//! Sort orders used by sorted lists and one-off `sort` requests.

use std::cmp::Ordering;

use crate::track::Track;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// File name including extension.
    Name,
    /// Tagged title, falling back to the file stem.
    Title,
    Artist,
    AlbumArtist,
    Album,
    /// Disc number, then track number.
    DiscAndTrack,
    Genre,
    Year,
    Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Ordered sequence of sort fields plus a direction.
///
/// Ties on every field keep their existing relative order since sorting is stable.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct SortOrder {
    pub fields: Vec<SortField>,
    #[serde(default)]
    pub direction: SortDirection,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self {
            fields: vec![
                SortField::Artist,
                SortField::Album,
                SortField::DiscAndTrack,
                SortField::Title,
            ],
            direction: SortDirection::Ascending,
        }
    }
}

fn compare_text(left: Option<&str>, right: Option<&str>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => left
            .to_lowercase()
            .cmp(&right.to_lowercase())
            .then_with(|| left.cmp(right)),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl SortField {
    fn compare(self, left: &Track, right: &Track) -> Ordering {
        let (lm, rm) = (left.metadata(), right.metadata());
        match self {
            SortField::Name => compare_text(Some(&left.file_name()), Some(&right.file_name())),
            SortField::Title => {
                compare_text(Some(&left.display_name()), Some(&right.display_name()))
            }
            SortField::Artist => compare_text(lm.artist.as_deref(), rm.artist.as_deref()),
            SortField::AlbumArtist => compare_text(
                lm.album_artist.as_deref().or(lm.artist.as_deref()),
                rm.album_artist.as_deref().or(rm.artist.as_deref()),
            ),
            SortField::Album => compare_text(lm.album.as_deref(), rm.album.as_deref()),
            SortField::DiscAndTrack => lm
                .disc_number
                .cmp(&rm.disc_number)
                .then_with(|| lm.track_number.cmp(&rm.track_number)),
            SortField::Genre => compare_text(lm.genre.as_deref(), rm.genre.as_deref()),
            SortField::Year => lm.year.cmp(&rm.year),
            SortField::Duration => lm.duration.cmp(&rm.duration),
        }
    }
}

impl SortOrder {
    pub fn new(fields: Vec<SortField>, direction: SortDirection) -> Self {
        Self { fields, direction }
    }

    pub fn compare(&self, left: &Track, right: &Track) -> Ordering {
        let ordering = self
            .fields
            .iter()
            .map(|field| field.compare(left, right))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal);
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}
