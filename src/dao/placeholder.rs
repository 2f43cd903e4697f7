//! Minimal catalog served when the real one cannot be loaded.

use crate::dao::models::{Playlist, PlaylistCatalog, Song};

const PLAYLIST_IMAGE_ROOT: &str = "/soundbeats_files/src/data/playlist-images";

fn song(id: u32, url: &str, year: i32, title: &str, artist: &str, playlists: &[&str]) -> Song {
    Song {
        id,
        url: url.to_string(),
        year,
        song: title.to_string(),
        artist: artist.to_string(),
        playlist_ids: playlists.iter().map(|id| id.to_string()).collect(),
        image_url: None,
    }
}

fn playlist(id: &str, name: &str, description: &str) -> (String, Playlist) {
    (
        id.to_string(),
        Playlist {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            image_url: Some(format!("{PLAYLIST_IMAGE_ROOT}/{id}.jpg")),
        },
    )
}

/// Three well-known songs spread over the placeholder playlists.
pub fn placeholder_songs() -> Vec<Song> {
    vec![
        song(
            1,
            "https://open.spotify.com/track/4u7EnebtmKWzUH433cf5Qv",
            1975,
            "Bohemian Rhapsody",
            "Queen",
            &["default", "rock"],
        ),
        song(
            2,
            "https://open.spotify.com/track/5ChkMS8OtdzJeqyybCc9R5",
            1982,
            "Billie Jean",
            "Michael Jackson",
            &["default", "80s", "pop"],
        ),
        song(
            3,
            "https://open.spotify.com/track/4VqPOruhp5EdPBeR92t6lQ",
            1991,
            "Smells Like Teen Spirit",
            "Nirvana",
            &["default", "90s", "rock"],
        ),
    ]
}

/// The five stock playlists.
pub fn placeholder_playlists() -> PlaylistCatalog {
    [
        playlist(
            "default",
            "Default Mix",
            "A mix of popular songs from all eras",
        ),
        playlist("80s", "80s Hits", "Greatest hits from the 1980s"),
        playlist("90s", "90s Classics", "Iconic songs from the 1990s"),
        playlist(
            "rock",
            "Rock Anthems",
            "Classic rock songs across all decades",
        ),
        playlist("pop", "Pop Favorites", "Popular mainstream hits"),
    ]
    .into_iter()
    .collect()
}
