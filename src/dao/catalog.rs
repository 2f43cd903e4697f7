use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::dao::{
    catalog_store::CatalogStore,
    error::CatalogError,
    models::{PlaylistCatalog, Song},
    placeholder::{placeholder_playlists, placeholder_songs},
};

/// Song and playlist catalogs, loaded lazily from a [`CatalogStore`].
///
/// A successful load is cached for the lifetime of the catalog. A failed load yields the
/// placeholder catalog without caching it, so the next call tries the store again.
pub struct Catalog {
    store: Arc<dyn CatalogStore>,
    songs: OnceCell<Arc<Vec<Song>>>,
    playlists: OnceCell<Arc<PlaylistCatalog>>,
}

impl Catalog {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self {
            store,
            songs: OnceCell::new(),
            playlists: OnceCell::new(),
        }
    }

    /// Every song of the catalog.
    pub async fn songs(&self) -> Arc<Vec<Song>> {
        let loaded = self
            .songs
            .get_or_try_init(|| async {
                let songs = self.store.load_songs().await?;
                debug!(count = songs.len(), "song catalog loaded");
                Ok::<_, CatalogError>(Arc::new(songs))
            })
            .await;

        match loaded {
            Ok(songs) => Arc::clone(songs),
            Err(err) => {
                warn!(error = %err, "failed to load song catalog; using placeholder songs");
                Arc::new(placeholder_songs())
            }
        }
    }

    /// Every playlist of the catalog, keyed by identifier.
    pub async fn playlists(&self) -> Arc<PlaylistCatalog> {
        let loaded = self
            .playlists
            .get_or_try_init(|| async {
                let playlists = self.store.load_playlists().await?;
                debug!(count = playlists.len(), "playlist catalog loaded");
                Ok::<_, CatalogError>(Arc::new(playlists))
            })
            .await;

        match loaded {
            Ok(playlists) => Arc::clone(playlists),
            Err(err) => {
                warn!(
                    error = %err,
                    "failed to load playlist catalog; using placeholder playlists"
                );
                Arc::new(placeholder_playlists())
            }
        }
    }
}
