//! Persistent configuration model and defaults.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::ConfigError;
use crate::loader::ConcurrencyTier;
use crate::play_queue::{RepeatMode, ShuffleMode};
use crate::track_list::SortOrder;

/// Root configuration persisted to `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    #[serde(default)]
    /// Worker pool sizing.
    pub loader: LoaderConfig,
    #[serde(default)]
    /// Default sequencing modes and add behavior.
    pub playback: PlaybackConfig,
    #[serde(default)]
    /// Library sources and ordering.
    pub library: LibraryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct LoaderConfig {
    /// Pool for loads the user started.
    #[serde(default = "default_interactive_tier")]
    pub interactive_tier: ConcurrencyTier,
    /// Pool for library scans.
    #[serde(default = "default_background_tier")]
    pub background_tier: ConcurrencyTier,
    #[serde(default = "default_minimum_workers")]
    pub minimum_workers: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            interactive_tier: default_interactive_tier(),
            background_tier: default_background_tier(),
            minimum_workers: default_minimum_workers(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct PlaybackConfig {
    #[serde(default)]
    pub repeat_mode: RepeatMode,
    #[serde(default)]
    pub shuffle_mode: ShuffleMode,
    /// Start the first added file when nothing is playing.
    #[serde(default = "default_true")]
    pub autoplay_on_add: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            repeat_mode: RepeatMode::Off,
            shuffle_mode: ShuffleMode::Off,
            autoplay_on_add: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct LibraryConfig {
    #[serde(default)]
    pub folders: Vec<PathBuf>,
    /// Import playlist files found while scanning library folders.
    #[serde(default = "default_true")]
    pub import_playlists: bool,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            folders: Vec::new(),
            import_playlists: true,
            sort_order: SortOrder::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_interactive_tier() -> ConcurrencyTier {
    ConcurrencyTier::High
}

fn default_background_tier() -> ConcurrencyTier {
    ConcurrencyTier::Low
}

fn default_minimum_workers() -> usize {
    4
}

/// Clamps values the loader cannot work with and drops repeated folders.
pub fn sanitize_config(config: Config) -> Config {
    let mut folders: Vec<PathBuf> = Vec::with_capacity(config.library.folders.len());
    for folder in config.library.folders {
        if !folders.contains(&folder) {
            folders.push(folder);
        }
    }
    let sort_order = if config.library.sort_order.fields.is_empty() {
        SortOrder::default()
    } else {
        config.library.sort_order
    };

    Config {
        loader: LoaderConfig {
            minimum_workers: config.loader.minimum_workers.clamp(1, 64),
            ..config.loader
        },
        playback: config.playback,
        library: LibraryConfig {
            folders,
            sort_order,
            ..config.library
        },
    }
}

/// `<config dir>/trackdeck/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("trackdeck").join("config.toml"))
}

/// Reads and sanitizes a config file. A missing file yields the defaults.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!(
                "Config file not found. Using default config. path={}",
                path.display()
            );
            return Ok(Config::default());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let config = toml::from_str::<Config>(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(sanitize_config(config))
}

/// Like [`load_config_file`], but an unreadable or invalid file only logs a
/// warning and falls back to the defaults.
pub fn load_config_or_default(path: &Path) -> Config {
    load_config_file(path).unwrap_or_else(|err| {
        warn!("{}. Falling back to default config", err);
        Config::default()
    })
}

pub fn persist_config_file(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let serialized = toml::to_string(config)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, serialized).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
