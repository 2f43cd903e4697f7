use std::{path::PathBuf, sync::Arc};

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;

use crate::dao::{
    catalog_store::CatalogStore,
    error::{CatalogError, CatalogResult},
    models::{PlaylistCatalog, Song},
};

/// Catalog stored as two JSON documents: an array of songs and an object of playlists.
#[derive(Debug, Clone)]
pub struct FileCatalogStore {
    songs_path: Arc<PathBuf>,
    playlists_path: Arc<PathBuf>,
}

impl FileCatalogStore {
    pub fn new(songs_path: PathBuf, playlists_path: PathBuf) -> Self {
        Self {
            songs_path: Arc::new(songs_path),
            playlists_path: Arc::new(playlists_path),
        }
    }
}

async fn read_json<T: DeserializeOwned>(path: &PathBuf) -> CatalogResult<T> {
    let contents = tokio::fs::read(path)
        .await
        .map_err(|source| CatalogError::Read {
            path: path.clone(),
            source,
        })?;
    serde_json::from_slice(&contents).map_err(|source| CatalogError::Decode {
        location: path.display().to_string(),
        source,
    })
}

impl CatalogStore for FileCatalogStore {
    fn load_songs(&self) -> BoxFuture<'static, CatalogResult<Vec<Song>>> {
        let path = Arc::clone(&self.songs_path);
        Box::pin(async move { read_json(&path).await })
    }

    fn load_playlists(&self) -> BoxFuture<'static, CatalogResult<PlaylistCatalog>> {
        let path = Arc::clone(&self.playlists_path);
        Box::pin(async move { read_json(&path).await })
    }
}
