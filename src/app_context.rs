//! Explicit assembly of the shared collections, loaders and event bus.
//!
//! The embedding application constructs one [`AppContext`] at startup and hands
//! clones of it to whatever needs the library or the play queue.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use log::info;
use rayon::ThreadPoolBuildError;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::library::{resolve_source_folder, Library};
use crate::loader::{
    LibraryLoader, LoadObserver, LoadReport, LoadRequest, TrackLoader, WorkerPools,
};
use crate::metadata_tags::{LoftyMetadataReader, MetadataReader};
use crate::persistence::AppPersistentState;
use crate::play_queue::PlayQueue;
use crate::protocol::{BusLoadObserver, Message};
use crate::track::TrackRegistry;

const BUS_CAPACITY: usize = 256;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Mutex<Config>>,
    pub bus_sender: broadcast::Sender<Message>,
    pub registry: Arc<TrackRegistry>,
    pub library: Arc<Mutex<Library>>,
    pub play_queue: Arc<Mutex<PlayQueue>>,
    track_loader: TrackLoader,
    library_loader: LibraryLoader,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self, ThreadPoolBuildError> {
        Self::with_metadata_reader(config, Arc::new(LoftyMetadataReader))
    }

    pub fn with_metadata_reader(
        config: Config,
        reader: Arc<dyn MetadataReader>,
    ) -> Result<Self, ThreadPoolBuildError> {
        let pools = WorkerPools::new(&config.loader)?;
        let registry = Arc::new(TrackRegistry::new());
        let (bus_sender, _) = broadcast::channel(BUS_CAPACITY);

        let mut play_queue = PlayQueue::new();
        play_queue.set_repeat_mode(config.playback.repeat_mode);
        play_queue.set_shuffle_mode(config.playback.shuffle_mode);
        let mut library = Library::new(config.library.sort_order.clone());
        for folder in &config.library.folders {
            library.add_source_folder(folder.clone());
        }

        Ok(Self {
            track_loader: TrackLoader::new(
                Arc::clone(&registry),
                Arc::clone(&reader),
                pools.interactive(),
            ),
            library_loader: LibraryLoader::new(
                Arc::clone(&registry),
                reader,
                pools.background(),
                config.library.import_playlists,
            ),
            config: Arc::new(Mutex::new(config)),
            bus_sender,
            registry,
            library: Arc::new(Mutex::new(library)),
            play_queue: Arc::new(Mutex::new(play_queue)),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.bus_sender.subscribe()
    }

    fn bus_observer(&self) -> Arc<dyn LoadObserver> {
        Arc::new(BusLoadObserver::new(self.bus_sender.clone()))
    }

    /// Loads user-selected files, folders or playlists into the play queue.
    /// `None` appends.
    pub fn add_to_play_queue(
        &self,
        paths: Vec<PathBuf>,
        insertion_index: Option<usize>,
    ) -> JoinHandle<LoadReport> {
        let autoplay = lock(&self.config).playback.autoplay_on_add;
        let request = LoadRequest {
            insertion_index,
            autoplay,
        };
        self.track_loader.load_tracks(
            paths,
            Arc::clone(&self.play_queue),
            request,
            self.bus_observer(),
        )
    }

    /// Rescans every library source folder on the background pool.
    pub fn scan_library(&self) -> JoinHandle<LoadReport> {
        let folders = lock(&self.library).source_folders().to_vec();
        info!("AppContext: scanning {} library folder(s)", folders.len());
        self.library_loader.load_library(
            folders,
            Arc::clone(&self.library),
            self.bus_observer(),
        )
    }

    /// Adds a library source folder, records it in the config and scans it.
    /// Returns `None` if the folder was already a source.
    pub fn add_library_folder(&self, folder: PathBuf) -> Option<JoinHandle<LoadReport>> {
        let folder = resolve_source_folder(&folder);
        if !lock(&self.library).add_source_folder(folder.clone()) {
            return None;
        }
        {
            let mut config = lock(&self.config);
            if !config.library.folders.contains(&folder) {
                config.library.folders.push(folder.clone());
            }
        }
        Some(self.library_loader.load_library(
            vec![folder],
            Arc::clone(&self.library),
            self.bus_observer(),
        ))
    }

    /// Shutdown snapshot of the play queue and library.
    pub fn persistent_state(&self) -> AppPersistentState {
        AppPersistentState {
            play_queue: lock(&self.play_queue).persistent_state(),
            library: lock(&self.library).persistent_state(),
        }
    }

    /// Restores a snapshot and starts loading its play queue and library.
    /// Returns the handles of both loads, play queue first.
    pub fn initialize(&self, state: &AppPersistentState) -> Vec<JoinHandle<LoadReport>> {
        let queue_paths = lock(&self.play_queue).initialize(&state.play_queue);
        let library_folders = lock(&self.library).initialize(&state.library);
        info!(
            "AppContext: restoring {} queued track(s) and {} library folder(s)",
            queue_paths.len(),
            library_folders.len()
        );

        let mut handles = Vec::with_capacity(2);
        if !queue_paths.is_empty() {
            handles.push(self.track_loader.load_tracks(
                queue_paths,
                Arc::clone(&self.play_queue),
                LoadRequest::append(),
                self.bus_observer(),
            ));
        }
        if !library_folders.is_empty() {
            handles.push(self.library_loader.load_library(
                library_folders,
                Arc::clone(&self.library),
                self.bus_observer(),
            ));
        }
        handles
    }

    /// Drops tracks no list refers to anymore.
    pub fn purge_unused_tracks(&self) -> usize {
        self.registry.purge_unreferenced()
    }
}

#[cfg(test)]
mod tests {
    use super::AppContext;
    use crate::config::Config;
    use crate::loader::test_support::{touch, unique_temp_dir, StemReader};
    use crate::play_queue::{RepeatMode, ShuffleMode};
    use crate::protocol::{LoadMessage, Message};
    use crate::track_list::TrackCollection;
    use std::fs;
    use std::sync::Arc;

    fn context(config: Config) -> AppContext {
        AppContext::with_metadata_reader(config, Arc::new(StemReader)).expect("context")
    }

    #[test]
    fn test_adding_to_play_queue_autoplays_and_publishes() {
        let dir = unique_temp_dir("context_add");
        touch(&dir, "a.mp3");
        touch(&dir, "b.mp3");
        let context = context(Config::default());
        let mut receiver = context.subscribe();

        let report = context
            .add_to_play_queue(vec![dir.clone()], None)
            .join()
            .expect("loader thread should not panic");

        let queue = context.play_queue.lock().expect("queue");
        assert_eq!(report.loaded, vec![0, 1]);
        assert_eq!(queue.current_track_index(), Some(0));
        assert!(matches!(
            receiver.try_recv(),
            Ok(Message::Load(LoadMessage::LoadStarted { .. }))
        ));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_config_seeds_modes_and_autoplay() {
        let mut config = Config::default();
        config.playback.repeat_mode = RepeatMode::All;
        config.playback.shuffle_mode = ShuffleMode::On;
        config.playback.autoplay_on_add = false;
        let dir = unique_temp_dir("context_no_autoplay");
        touch(&dir, "a.mp3");
        let context = context(config);

        context
            .add_to_play_queue(vec![dir.clone()], None)
            .join()
            .expect("loader thread should not panic");

        let queue = context.play_queue.lock().expect("queue");
        assert_eq!(
            queue.repeat_and_shuffle_modes(),
            (RepeatMode::All, ShuffleMode::On)
        );
        assert_eq!(queue.current_track_index(), None);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_snapshot_restores_queue_and_library() {
        let dir = unique_temp_dir("context_restore");
        let songs = dir.join("songs");
        touch(&songs, "a.mp3");
        touch(&songs, "b.mp3");
        touch(&songs, "c.mp3");
        let songs = fs::canonicalize(songs).expect("resolve");

        let original = context(Config::default());
        original
            .add_library_folder(songs.clone())
            .expect("new folder")
            .join()
            .expect("library scan");
        assert!(original.add_library_folder(songs.clone()).is_none());
        original
            .add_to_play_queue(vec![songs.clone()], None)
            .join()
            .expect("queue load");
        original.play_queue.lock().expect("queue").select(2);
        let state = original.persistent_state();
        assert_eq!(
            original.config.lock().expect("config").library.folders,
            vec![songs.clone()]
        );

        let restored = context(Config::default());
        for handle in restored.initialize(&state) {
            handle.join().expect("restore load");
        }

        {
            let queue = restored.play_queue.lock().expect("queue");
            assert_eq!(queue.len(), 3);
            assert_eq!(queue.current_track_index(), Some(2));
        }
        assert_eq!(restored.library.lock().expect("library").len(), 3);
        assert_eq!(restored.persistent_state(), state);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_purging_keeps_tracks_still_in_lists() {
        let dir = unique_temp_dir("context_purge");
        touch(&dir, "a.mp3");
        touch(&dir, "b.mp3");
        let context = context(Config::default());
        context
            .add_to_play_queue(vec![dir.clone()], None)
            .join()
            .expect("queue load");
        assert_eq!(context.registry.len(), 2);

        context
            .play_queue
            .lock()
            .expect("queue")
            .remove_tracks(&[0].into_iter().collect());
        assert_eq!(context.purge_unused_tracks(), 1);
        assert_eq!(context.registry.len(), 1);

        let _ = fs::remove_dir_all(dir);
    }
}
