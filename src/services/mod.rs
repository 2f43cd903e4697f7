/// State synchronizer owning the session's game state.
pub mod game_service;
/// Merging of push events into the state store.
pub mod push_events;
/// Round scoring rules and result preview.
pub mod scoring;
/// Random song selection from the catalog.
pub mod song_service;
/// Read-only projections for presentation.
pub mod views;
