use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::state::game::{SongId, SongRef};

/// Playlist catalog keyed by playlist identifier, in file order.
pub type PlaylistCatalog = IndexMap<String, Playlist>;

/// Song entry of the static catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    /// Stable identifier.
    pub id: SongId,
    /// URL of the track handed to the media player.
    pub url: String,
    /// Release year to guess.
    pub year: i32,
    /// Song title.
    pub song: String,
    /// Performing artist.
    pub artist: String,
    /// Playlists the song belongs to.
    #[serde(default)]
    pub playlist_ids: Vec<String>,
    /// Cover artwork.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Song {
    /// Whether the song is tagged with `playlist_id`.
    pub fn in_playlist(&self, playlist_id: &str) -> bool {
        self.playlist_ids.iter().any(|id| id == playlist_id)
    }
}

/// Playlist entry of the static catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    /// Stable identifier, also the catalog key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short blurb shown in the admin flow.
    #[serde(default)]
    pub description: String,
    /// Cover artwork.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl From<&Song> for SongRef {
    fn from(song: &Song) -> Self {
        Self {
            id: song.id,
            song: song.song.clone(),
            artist: song.artist.clone(),
            year: song.year,
            image_url: song.image_url.clone(),
            url: Some(song.url.clone()),
        }
    }
}
