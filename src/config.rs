//! Panel configuration loading: catalog sources and game defaults.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the panel looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/panel.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SOUNDBEATS_PANEL_CONFIG_PATH";

const DEFAULT_SONGS_PATH: &str = "data/songs.json";
const DEFAULT_PLAYLISTS_PATH: &str = "data/playlists.json";

/// Where a catalog document is read from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    /// Local JSON file.
    Path(PathBuf),
    /// JSON document served over HTTP.
    Url(String),
}

/// Sources of the song and playlist catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogConfig {
    pub songs: CatalogSource,
    pub playlists: CatalogSource,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            songs: CatalogSource::Path(PathBuf::from(DEFAULT_SONGS_PATH)),
            playlists: CatalogSource::Path(PathBuf::from(DEFAULT_PLAYLISTS_PATH)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
/// Immutable runtime configuration of a panel session.
pub struct PanelConfig {
    /// Catalog sources.
    pub catalog: CatalogConfig,
    /// Playlist preselected when starting a game.
    pub default_playlist_id: String,
    /// Round duration preselected when starting a game.
    pub default_timer_seconds: u32,
    /// Lowest year offered by the guess slider.
    pub guess_min_year: i32,
    /// Highest year offered by the guess slider.
    pub guess_max_year: i32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            default_playlist_id: "default".into(),
            default_timer_seconds: 30,
            guess_min_year: 1950,
            guess_max_year: 2030,
        }
    }
}

impl PanelConfig {
    /// Load the panel configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        Self::load_from(resolve_config_path())
    }

    /// Load the configuration at `path`, falling back to built-in defaults.
    pub fn load_from(path: PathBuf) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(config) if config.guess_min_year > config.guess_max_year => {
                    warn!(
                        path = %path.display(),
                        min = config.guess_min_year,
                        max = config.guess_max_year,
                        "guess year bounds are inverted; falling back to defaults"
                    );
                    Self::default()
                }
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        playlist = %config.default_playlist_id,
                        "loaded panel config"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
