use std::collections::BTreeSet;

use rand::{Rng, seq::IndexedRandom};
use tracing::debug;

use crate::{
    dao::models::{PlaylistCatalog, Song},
    error::ServiceError,
    state::game::SongId,
};

/// Playlist id meaning "the whole catalog".
pub const DEFAULT_PLAYLIST_ID: &str = "default";

/// Songs of `playlist_id` that were not played yet.
///
/// The default playlist, and any playlist missing from `playlists`, draw from the whole
/// catalog.
pub fn candidate_pool<'a>(
    songs: &'a [Song],
    playlists: &PlaylistCatalog,
    playlist_id: &str,
    played: &BTreeSet<SongId>,
) -> Vec<&'a Song> {
    let whole_catalog = playlist_id == DEFAULT_PLAYLIST_ID || !playlists.contains_key(playlist_id);

    songs
        .iter()
        .filter(|song| whole_catalog || song.in_playlist(playlist_id))
        .filter(|song| !played.contains(&song.id))
        .collect()
}

/// Pick an unplayed song of `playlist_id` uniformly at random.
pub fn pick_song<R: Rng + ?Sized>(
    songs: &[Song],
    playlists: &PlaylistCatalog,
    playlist_id: &str,
    played: &BTreeSet<SongId>,
    rng: &mut R,
) -> Result<Song, ServiceError> {
    let pool = candidate_pool(songs, playlists, playlist_id, played);
    debug!(playlist_id, candidates = pool.len(), "picking song");

    pool.choose(rng)
        .map(|song| (*song).clone())
        .ok_or_else(|| ServiceError::NoSongsAvailable {
            playlist_id: playlist_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::dao::models::Playlist;

    fn song(id: SongId, playlists: &[&str]) -> Song {
        Song {
            id,
            url: format!("media://{id}"),
            year: 1980 + id as i32,
            song: format!("Song {id}"),
            artist: "Artist".into(),
            playlist_ids: playlists.iter().map(|p| p.to_string()).collect(),
            image_url: None,
        }
    }

    fn playlists(ids: &[&str]) -> PlaylistCatalog {
        ids.iter()
            .map(|id| {
                (
                    id.to_string(),
                    Playlist {
                        id: id.to_string(),
                        name: id.to_uppercase(),
                        description: String::new(),
                        image_url: None,
                    },
                )
            })
            .collect()
    }

    fn ids(pool: Vec<&Song>) -> Vec<SongId> {
        pool.into_iter().map(|song| song.id).collect()
    }

    #[test]
    fn known_playlist_filters_by_tag() {
        let songs = [song(1, &["x"]), song(2, &["y"]), song(3, &["x", "y"])];
        let pool = candidate_pool(&songs, &playlists(&["x", "y"]), "x", &BTreeSet::new());
        assert_eq!(ids(pool), vec![1, 3]);
    }

    #[test]
    fn default_and_unknown_playlists_use_whole_catalog() {
        let songs = [song(1, &["x"]), song(2, &[])];
        let catalog = playlists(&["x"]);

        assert_eq!(
            ids(candidate_pool(&songs, &catalog, DEFAULT_PLAYLIST_ID, &BTreeSet::new())),
            vec![1, 2]
        );
        assert_eq!(
            ids(candidate_pool(&songs, &catalog, "missing", &BTreeSet::new())),
            vec![1, 2]
        );
    }

    #[test]
    fn played_songs_are_excluded() {
        let songs = [song(1, &["x"]), song(2, &["x"]), song(3, &["x"])];
        let played = BTreeSet::from([1, 3]);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..10 {
            let picked = pick_song(&songs, &playlists(&["x"]), "x", &played, &mut rng).unwrap();
            assert_eq!(picked.id, 2);
        }
    }

    #[test]
    fn exhausted_playlist_is_reported() {
        let songs = [song(1, &["x"]), song(2, &["x"]), song(3, &["y"])];
        let played = BTreeSet::from([1, 2]);
        let mut rng = StdRng::seed_from_u64(1);

        let err = pick_song(&songs, &playlists(&["x", "y"]), "x", &played, &mut rng).unwrap_err();
        assert!(matches!(err, ServiceError::NoSongsAvailable { playlist_id } if playlist_id == "x"));
    }

    #[test]
    fn every_candidate_can_be_picked() {
        let songs = [song(1, &[]), song(2, &[]), song(3, &[])];
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = BTreeSet::new();

        for _ in 0..200 {
            let picked = pick_song(
                &songs,
                &PlaylistCatalog::default(),
                DEFAULT_PLAYLIST_ID,
                &BTreeSet::new(),
                &mut rng,
            )
            .unwrap();
            seen.insert(picked.id);
        }
        assert_eq!(seen, BTreeSet::from([1, 2, 3]));
    }
}
