//! Client-side state synchronizer for the Soundbeats music-trivia panel, exposing modules
//! for the replay binary and embedding applications.

pub mod config;
pub mod connection;
pub mod dao;
pub mod dto;
pub mod error;
pub mod services;
pub mod state;
