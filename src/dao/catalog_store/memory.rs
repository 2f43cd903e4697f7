use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use futures::future::BoxFuture;

use crate::dao::{
    catalog_store::CatalogStore,
    error::{CatalogError, CatalogResult},
    models::{PlaylistCatalog, Song},
};

/// Fixed in-memory catalog, optionally failing a number of times before answering.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalogStore {
    songs: Arc<Vec<Song>>,
    playlists: Arc<PlaylistCatalog>,
    failures_left: Arc<AtomicUsize>,
    loads: Arc<AtomicUsize>,
}

impl MemoryCatalogStore {
    pub fn new(songs: Vec<Song>, playlists: PlaylistCatalog) -> Self {
        Self {
            songs: Arc::new(songs),
            playlists: Arc::new(playlists),
            ..Self::default()
        }
    }

    /// Fail the next `count` loads (songs and playlists alike) with [`CatalogError::Unavailable`].
    pub fn failing(self, count: usize) -> Self {
        self.failures_left.store(count, Ordering::SeqCst);
        self
    }

    /// Number of load calls served so far, failed ones included.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn check(&self) -> CatalogResult<()> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failed {
            return Err(CatalogError::Unavailable("memory".into()));
        }
        Ok(())
    }
}

impl CatalogStore for MemoryCatalogStore {
    fn load_songs(&self) -> BoxFuture<'static, CatalogResult<Vec<Song>>> {
        let result = self.check().map(|()| self.songs.as_ref().clone());
        Box::pin(async move { result })
    }

    fn load_playlists(&self) -> BoxFuture<'static, CatalogResult<PlaylistCatalog>> {
        let result = self.check().map(|()| self.playlists.as_ref().clone());
        Box::pin(async move { result })
    }
}
