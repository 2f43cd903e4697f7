use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::dao::{
    catalog_store::CatalogStore,
    error::{CatalogError, CatalogResult},
    models::{PlaylistCatalog, Song},
};

/// Catalog served as static JSON documents by the home-automation frontend.
#[derive(Clone)]
pub struct HttpCatalogStore {
    client: Client,
    songs_url: Arc<str>,
    playlists_url: Arc<str>,
}

impl HttpCatalogStore {
    pub fn new(songs_url: String, playlists_url: String) -> CatalogResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CatalogError::Fetch {
                url: songs_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            songs_url: Arc::from(songs_url),
            playlists_url: Arc::from(playlists_url),
        })
    }
}

async fn fetch_json<T: DeserializeOwned>(client: Client, url: Arc<str>) -> CatalogResult<T> {
    let response = client
        .get(url.as_ref())
        .send()
        .await
        .map_err(|source| CatalogError::Fetch {
            url: url.to_string(),
            source,
        })?;

    if !response.status().is_success() {
        return Err(CatalogError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|source| CatalogError::Fetch {
            url: url.to_string(),
            source,
        })?;
    serde_json::from_slice(&bytes).map_err(|source| CatalogError::Decode {
        location: url.to_string(),
        source,
    })
}

impl CatalogStore for HttpCatalogStore {
    fn load_songs(&self) -> BoxFuture<'static, CatalogResult<Vec<Song>>> {
        Box::pin(fetch_json(self.client.clone(), Arc::clone(&self.songs_url)))
    }

    fn load_playlists(&self) -> BoxFuture<'static, CatalogResult<PlaylistCatalog>> {
        Box::pin(fetch_json(
            self.client.clone(),
            Arc::clone(&self.playlists_url),
        ))
    }
}
