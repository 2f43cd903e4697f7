/// Catalog read from JSON files on disk.
pub mod file;
/// Catalog fetched over HTTP.
#[cfg(feature = "http-catalog")]
pub mod http;
/// Catalog held in memory.
pub mod memory;

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::{
    config::{CatalogConfig, CatalogSource},
    dao::{
        error::CatalogResult,
        models::{PlaylistCatalog, Song},
    },
};

pub use self::{file::FileCatalogStore, memory::MemoryCatalogStore};
#[cfg(feature = "http-catalog")]
pub use self::http::HttpCatalogStore;

/// Abstraction over where the static song and playlist catalogs come from.
pub trait CatalogStore: Send + Sync {
    fn load_songs(&self) -> BoxFuture<'static, CatalogResult<Vec<Song>>>;
    fn load_playlists(&self) -> BoxFuture<'static, CatalogResult<PlaylistCatalog>>;
}

/// Build the store matching the configured source.
pub fn store_for(config: &CatalogConfig) -> CatalogResult<Arc<dyn CatalogStore>> {
    match (&config.songs, &config.playlists) {
        (CatalogSource::Path(songs), CatalogSource::Path(playlists)) => Ok(Arc::new(
            FileCatalogStore::new(songs.clone(), playlists.clone()),
        )),
        #[cfg(feature = "http-catalog")]
        (CatalogSource::Url(songs), CatalogSource::Url(playlists)) => Ok(Arc::new(
            HttpCatalogStore::new(songs.clone(), playlists.clone())?,
        )),
        #[cfg(feature = "http-catalog")]
        (songs, playlists) => Ok(Arc::new(MixedCatalogStore {
            songs: single_source(songs)?,
            playlists: single_source(playlists)?,
        })),
        #[cfg(not(feature = "http-catalog"))]
        (CatalogSource::Url(url), _) | (_, CatalogSource::Url(url)) => {
            Err(crate::dao::error::CatalogError::HttpDisabled { url: url.clone() })
        }
    }
}

#[cfg(feature = "http-catalog")]
fn single_source(source: &CatalogSource) -> CatalogResult<Arc<dyn CatalogStore>> {
    Ok(match source {
        CatalogSource::Path(path) => Arc::new(FileCatalogStore::new(path.clone(), path.clone())),
        CatalogSource::Url(url) => Arc::new(HttpCatalogStore::new(url.clone(), url.clone())?),
    })
}

/// Songs and playlists coming from different kinds of source.
#[cfg(feature = "http-catalog")]
struct MixedCatalogStore {
    songs: Arc<dyn CatalogStore>,
    playlists: Arc<dyn CatalogStore>,
}

#[cfg(feature = "http-catalog")]
impl CatalogStore for MixedCatalogStore {
    fn load_songs(&self) -> BoxFuture<'static, CatalogResult<Vec<Song>>> {
        self.songs.load_songs()
    }

    fn load_playlists(&self) -> BoxFuture<'static, CatalogResult<PlaylistCatalog>> {
        self.playlists.load_playlists()
    }
}
