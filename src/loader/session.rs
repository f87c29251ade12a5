//! Per-load bookkeeping shared by the scan and its batches.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::collections::AtomicCounter;
use crate::error::FileReadError;

/// One top-level input of a load, as the user supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryItem {
    Track(PathBuf),
    PlaylistFile(PathBuf),
    Folder(PathBuf),
}

impl HistoryItem {
    pub fn path(&self) -> &Path {
        match self {
            HistoryItem::Track(path)
            | HistoryItem::PlaylistFile(path)
            | HistoryItem::Folder(path) => path,
        }
    }
}

/// State of one load from start to completion.
#[derive(Debug)]
pub struct FileReadSession {
    id: Uuid,
    pub(crate) files_read: AtomicCounter,
    pub(crate) playlists_read: AtomicCounter,
    queued: HashSet<PathBuf>,
    already_present: Vec<PathBuf>,
    errors: Vec<FileReadError>,
    history: Vec<HistoryItem>,
}

impl Default for FileReadSession {
    fn default() -> Self {
        Self::new()
    }
}

impl FileReadSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            files_read: AtomicCounter::new(),
            playlists_read: AtomicCounter::new(),
            queued: HashSet::new(),
            already_present: Vec::new(),
            errors: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn files_read(&self) -> usize {
        self.files_read.value()
    }

    pub fn playlists_read(&self) -> usize {
        self.playlists_read.value()
    }

    /// Claims `path` for this load. Returns false if it was already queued,
    /// so a file reachable through several inputs is read once.
    pub fn claim(&mut self, path: &Path) -> bool {
        self.queued.insert(path.to_path_buf())
    }

    pub fn record_already_present(&mut self, path: PathBuf) {
        if !self.already_present.contains(&path) {
            self.already_present.push(path);
        }
    }

    pub fn record_error(&mut self, error: FileReadError) {
        self.errors.push(error);
    }

    pub fn record_history(&mut self, item: HistoryItem) {
        self.history.push(item);
    }

    pub fn already_present(&self) -> &[PathBuf] {
        &self.already_present
    }

    pub fn errors(&self) -> &[FileReadError] {
        &self.errors
    }

    pub fn history(&self) -> &[HistoryItem] {
        &self.history
    }

    pub(crate) fn into_parts(self) -> (Vec<PathBuf>, Vec<FileReadError>, Vec<HistoryItem>) {
        (self.already_present, self.errors, self.history)
    }
}

#[cfg(test)]
mod tests {
    use super::{FileReadSession, HistoryItem};
    use crate::error::FileReadError;
    use std::path::{Path, PathBuf};

    #[test]
    fn test_claim_is_once_per_path() {
        let mut session = FileReadSession::new();
        assert!(session.claim(Path::new("/music/a.mp3")));
        assert!(!session.claim(Path::new("/music/a.mp3")));
        assert!(session.claim(Path::new("/music/b.mp3")));
    }

    #[test]
    fn test_records_are_kept_in_order() {
        let mut session = FileReadSession::new();
        session.record_history(HistoryItem::Folder(PathBuf::from("/music")));
        session.record_history(HistoryItem::Track(PathBuf::from("/x.mp3")));
        session.record_already_present(PathBuf::from("/music/a.mp3"));
        session.record_already_present(PathBuf::from("/music/a.mp3"));
        session.record_error(FileReadError::NotFound(PathBuf::from("/gone")));

        assert_eq!(session.history()[1].path(), Path::new("/x.mp3"));
        assert_eq!(session.already_present().len(), 1);
        assert_eq!(session.errors().len(), 1);
        assert_ne!(session.id(), FileReadSession::new().id());
    }
}
