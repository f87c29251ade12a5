use std::path::{Path, PathBuf};

use log::debug;

pub const SUPPORTED_AUDIO_EXTENSIONS: [&str; 10] = [
    "mp3", "wav", "ogg", "opus", "flac", "aac", "m4a", "mp4", "aiff", "wma",
];

pub const SUPPORTED_PLAYLIST_EXTENSIONS: [&str; 2] = ["m3u", "m3u8"];

fn has_extension_in(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            extensions
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

pub fn is_supported_audio_file(path: &Path) -> bool {
    has_extension_in(path, &SUPPORTED_AUDIO_EXTENSIONS)
}

pub fn is_supported_playlist_file(path: &Path) -> bool {
    has_extension_in(path, &SUPPORTED_PLAYLIST_EXTENSIONS)
}

/// What a resolved path turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Directory,
    PlaylistFile,
    AudioFile,
    Unsupported,
}

/// Follows symlinks and returns the absolute path together with its kind.
/// `None` means the path does not exist or cannot be inspected.
pub fn resolve_path(path: &Path) -> Option<(PathBuf, PathKind)> {
    let resolved = match std::fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(err) => {
            debug!("Failed to resolve {}: {}", path.display(), err);
            return None;
        }
    };
    let kind = classify_resolved_path(&resolved);
    Some((resolved, kind))
}

pub fn classify_resolved_path(path: &Path) -> PathKind {
    if path.is_dir() {
        PathKind::Directory
    } else if is_supported_playlist_file(path) {
        PathKind::PlaylistFile
    } else if is_supported_audio_file(path) {
        PathKind::AudioFile
    } else {
        PathKind::Unsupported
    }
}

/// Lists a directory's entries sorted by file name. Unreadable directories and
/// entries are logged and skipped.
pub fn sorted_directory_children(directory: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(err) => {
            debug!("Failed to read directory {}: {}", directory.display(), err);
            return Vec::new();
        }
    };

    let mut children = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => children.push(entry.path()),
            Err(err) => {
                debug!(
                    "Failed to read a directory entry in {}: {}",
                    directory.display(),
                    err
                );
            }
        }
    }
    children.sort_unstable_by(|left, right| left.file_name().cmp(&right.file_name()));
    children
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(name: &str) -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be valid")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("trackdeck_{name}_{nonce}"));
        fs::create_dir_all(&dir).expect("should create temp dir");
        dir
    }

    #[test]
    fn test_supported_extensions_are_case_insensitive() {
        assert!(is_supported_audio_file(Path::new("/a/b.FLAC")));
        assert!(is_supported_playlist_file(Path::new("/a/list.M3U8")));
        assert!(!is_supported_audio_file(Path::new("/a/cover.jpg")));
        assert!(!is_supported_audio_file(Path::new("/a/no_extension")));
    }

    #[test]
    fn test_sorted_children_and_classification() {
        let dir = unique_temp_dir("discovery");
        fs::write(dir.join("b.mp3"), b"").expect("write");
        fs::write(dir.join("a.m3u"), b"").expect("write");
        fs::write(dir.join("c.txt"), b"").expect("write");
        fs::create_dir(dir.join("d")).expect("mkdir");

        let children = sorted_directory_children(&dir);
        let names: Vec<_> = children
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.m3u", "b.mp3", "c.txt", "d"]);

        let kinds: Vec<_> = children
            .iter()
            .map(|path| classify_resolved_path(path))
            .collect();
        assert_eq!(
            kinds,
            vec![
                PathKind::PlaylistFile,
                PathKind::AudioFile,
                PathKind::Unsupported,
                PathKind::Directory
            ]
        );

        fs::remove_dir_all(dir).expect("temp dir should be removable");
    }

    #[test]
    fn test_resolve_missing_path_returns_none() {
        assert!(resolve_path(Path::new("/definitely/not/here.mp3")).is_none());
    }
}
