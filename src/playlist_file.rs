//! M3U / M3U8 playlist file parsing.

use std::path::{Path, PathBuf};

use crate::error::FileReadError;

/// Parses a playlist file into its ordered file references.
///
/// Relative entries are resolved against the playlist's directory and
/// `file://` URIs are reduced to paths. Entries are not checked for existence.
/// A file that cannot be read is an error; a readable file without entries is
/// an empty playlist.
pub fn load_playlist(path: &Path) -> Result<Vec<PathBuf>, FileReadError> {
    let bytes = std::fs::read(path).map_err(|err| FileReadError::PlaylistParse {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    let contents = String::from_utf8_lossy(&bytes);
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

    Ok(contents
        .lines()
        .map(|line| line.trim_start_matches('\u{feff}').trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| parse_entry(line, base_dir))
        .collect())
}

fn parse_entry(line: &str, base_dir: &Path) -> Option<PathBuf> {
    let raw = match line.strip_prefix("file://") {
        Some(uri_path) => uri_path,
        None if line.contains("://") => return None,
        None => line,
    };
    let entry = PathBuf::from(raw);
    if entry.is_absolute() {
        Some(entry)
    } else {
        Some(base_dir.join(entry))
    }
}
