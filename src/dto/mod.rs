/// Outbound commands and their acknowledgment.
pub mod command;
/// Game state snapshots and partial state pushes.
pub mod game;
/// Inbound push events.
pub mod push;
/// Custom validators for command payloads.
pub mod validation;
