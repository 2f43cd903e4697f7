/// Cached access to the song and playlist catalogs.
pub mod catalog;
/// Backends the catalogs are read from.
pub mod catalog_store;
/// Catalog error types.
pub mod error;
/// Catalog model definitions.
pub mod models;
/// Built-in catalog used when loading fails.
pub mod placeholder;
