//! Track lists, a music library and a play queue fed by a batched background loader.
//!
//! Collections live in [`track_list`], [`library`] and [`play_queue`]. The
//! [`loader`] turns files, folders and playlists into tracks on bounded worker
//! pools, and [`app_context::AppContext`] wires everything together.

pub mod app_context;
pub mod collections;
pub mod config;
pub mod error;
pub mod library;
pub mod loader;
pub mod media_file_discovery;
pub mod metadata_tags;
pub mod persistence;
pub mod play_queue;
pub mod playlist_file;
pub mod protocol;
pub mod track;
pub mod track_list;

pub use app_context::AppContext;
pub use library::Library;
pub use play_queue::{PlayQueue, RepeatMode, ShuffleMode};
pub use track::{Track, TrackMetadata, TrackRegistry};
pub use track_list::{TrackCollection, TrackList};

/// Installs the colored terminal logger at `level`. Returns false if a logger
/// was already installed, e.g. by the embedding application.
pub fn init_logging(level: log::LevelFilter) -> bool {
    let mut clog = colog::default_builder();
    clog.filter(None, level);
    match clog.try_init() {
        Ok(()) => true,
        Err(err) => {
            log::debug!("Logger already installed: {}", err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::init_logging;

    #[test]
    fn test_init_logging_tolerates_repeated_calls() {
        init_logging(log::LevelFilter::Debug);
        assert!(!init_logging(log::LevelFilter::Info));
    }
}
