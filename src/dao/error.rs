//! Error types shared by the catalog stores.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Failures while loading the static song or playlist catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Reading a catalog file failed.
    #[error("failed to read catalog file `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A catalog document could not be decoded.
    #[error("failed to decode catalog `{location}`")]
    Decode {
        location: String,
        #[source]
        source: serde_json::Error,
    },
    /// The source is currently not answering.
    #[error("catalog `{0}` is unavailable")]
    Unavailable(String),
    /// Fetching a catalog over HTTP failed.
    #[cfg(feature = "http-catalog")]
    #[error("failed to fetch catalog `{url}`")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The catalog server answered with a non-success status.
    #[cfg(feature = "http-catalog")]
    #[error("unexpected status {status} fetching catalog `{url}`")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    /// A URL source was configured but HTTP support is compiled out.
    #[cfg(not(feature = "http-catalog"))]
    #[error("catalog `{url}` requires the `http-catalog` feature")]
    HttpDisabled { url: String },
}
