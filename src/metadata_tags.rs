//! Tag readers backed by `lofty`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use lofty::config::{ParseOptions, ParsingMode};
use lofty::file::{AudioFile, TaggedFile, TaggedFileExt};
use lofty::prelude::Accessor;
use lofty::probe::Probe;
use lofty::tag::{ItemKey, Tag};
use log::debug;

use crate::track::TrackMetadata;

/// Reads primary metadata for one file. Implementations run on loader worker
/// threads, so they must be shareable across threads.
pub trait MetadataReader: Send + Sync {
    /// Returns the file's metadata, or a human-readable reason it could not be read.
    fn read_primary_metadata(&self, path: &Path) -> Result<TrackMetadata, String>;
}

/// Production reader using `lofty` with a relaxed content-sniffing fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyMetadataReader;

impl MetadataReader for LoftyMetadataReader {
    fn read_primary_metadata(&self, path: &Path) -> Result<TrackMetadata, String> {
        let tagged_file = read_tagged_file(path)?;
        Ok(metadata_from_tagged_file(&tagged_file))
    }
}

fn first_non_empty_value<F>(
    primary_tag: Option<&Tag>,
    tags: &[Tag],
    mut extractor: F,
) -> Option<String>
where
    F: FnMut(&Tag) -> Option<String>,
{
    primary_tag
        .into_iter()
        .chain(tags.iter())
        .filter_map(|tag| extractor(tag))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

fn derive_year_from_date(date: &str) -> Option<u32> {
    let mut consecutive_digits = String::with_capacity(4);
    for ch in date.chars() {
        if ch.is_ascii_digit() {
            consecutive_digits.push(ch);
            if consecutive_digits.len() == 4 {
                return consecutive_digits.parse().ok();
            }
        } else {
            consecutive_digits.clear();
        }
    }
    None
}

/// Parses "3" and "3/12" style position values.
fn parse_position(value: &str) -> Option<u32> {
    value
        .split('/')
        .next()
        .and_then(|number| number.trim().parse().ok())
}

fn parse_options(parsing_mode: ParsingMode, max_junk_bytes: usize) -> ParseOptions {
    ParseOptions::new()
        .read_properties(true)
        .read_cover_art(false)
        .parsing_mode(parsing_mode)
        .max_junk_bytes(max_junk_bytes)
}

fn read_tagged_file(path: &Path) -> Result<TaggedFile, String> {
    let primary_error = match Probe::open(path) {
        Ok(probe) => match probe
            .options(parse_options(ParsingMode::BestAttempt, 1024))
            .read()
        {
            Ok(tagged_file) => return Ok(tagged_file),
            Err(error) => error.to_string(),
        },
        Err(error) => error.to_string(),
    };
    debug!(
        "Metadata read primary parse failed for {}: {}",
        path.display(),
        primary_error
    );

    let file = File::open(path).map_err(|error| error.to_string())?;
    let tagged_file = Probe::new(BufReader::new(file))
        .options(parse_options(ParsingMode::Relaxed, 64 * 1024))
        .guess_file_type()
        .map_err(|error| error.to_string())?
        .read()
        .map_err(|error| format!("{primary_error}; relaxed parse: {error}"))?;
    debug!(
        "Metadata read recovered via relaxed parsing for {}",
        path.display()
    );
    Ok(tagged_file)
}

fn metadata_from_tagged_file(tagged_file: &TaggedFile) -> TrackMetadata {
    let primary_tag = tagged_file.primary_tag();
    let tags = tagged_file.tags();

    let date = first_non_empty_value(primary_tag, tags, |tag| {
        tag.get_string(ItemKey::RecordingDate)
            .or_else(|| tag.get_string(ItemKey::Year))
            .map(str::to_string)
    });
    let year = first_non_empty_value(primary_tag, tags, |tag| {
        tag.get_string(ItemKey::Year).map(str::to_string)
    })
    .and_then(|year| derive_year_from_date(&year))
    .or_else(|| date.as_deref().and_then(derive_year_from_date));

    let duration = tagged_file.properties().duration();

    TrackMetadata {
        title: first_non_empty_value(primary_tag, tags, |tag| {
            tag.title().map(|value| value.into_owned())
        }),
        artist: first_non_empty_value(primary_tag, tags, |tag| {
            tag.artist().map(|value| value.into_owned())
        }),
        album: first_non_empty_value(primary_tag, tags, |tag| {
            tag.album().map(|value| value.into_owned())
        }),
        album_artist: first_non_empty_value(primary_tag, tags, |tag| {
            tag.get_string(ItemKey::AlbumArtist).map(str::to_string)
        }),
        genre: first_non_empty_value(primary_tag, tags, |tag| {
            tag.genre().map(|value| value.into_owned())
        }),
        year,
        track_number: first_non_empty_value(primary_tag, tags, |tag| {
            tag.get_string(ItemKey::TrackNumber)
                .map(str::to_string)
                .or_else(|| tag.track().map(|value| value.to_string()))
        })
        .and_then(|value| parse_position(&value)),
        disc_number: first_non_empty_value(primary_tag, tags, |tag| {
            tag.get_string(ItemKey::DiscNumber)
                .map(str::to_string)
                .or_else(|| tag.disk().map(|value| value.to_string()))
        })
        .and_then(|value| parse_position(&value)),
        duration: (!duration.is_zero()).then_some(duration),
    }
}
