//! Merging of inbound push events into the state store.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
    dto::{
        game::GameStatePayload,
        push::{PushEvent, RoundEnded, TimerUpdate},
    },
    state::{
        GameNotification, StateStore,
        game::{GameState, RoundSummary},
    },
};

/// Merge `event` into `store`. Returns the installed state, or `None` when the event was
/// discarded.
pub fn apply_push(store: &StateStore, event: &PushEvent) -> Option<Arc<GameState>> {
    match event {
        PushEvent::StateChanged(payload) => apply_state_changed(store, payload),
        PushEvent::TimerUpdate(update) => apply_timer_update(store, update),
        PushEvent::RoundEnded(ended) => apply_round_ended(store, ended),
    }
}

/// Overlay the payload's fields on the current state.
///
/// State-changed pushes are never filtered by game: they carry the game identity
/// themselves, which is how a viewer adopts a newly started game.
pub fn apply_state_changed(
    store: &StateStore,
    payload: &GameStatePayload,
) -> Option<Arc<GameState>> {
    debug!(
        action = payload.action.as_deref().unwrap_or("unknown"),
        "merging state change"
    );
    store.update(|state| Some(payload.apply_to(state)))
}

/// Set the remaining time when the tick belongs to the current game.
pub fn apply_timer_update(store: &StateStore, update: &TimerUpdate) -> Option<Arc<GameState>> {
    store.update_with(
        |state| {
            if !state.is_current_game(update.game_id.as_deref()) {
                debug!(
                    game_id = update.game_id.as_deref().unwrap_or("none"),
                    "discarding timer update from another game"
                );
                return None;
            }
            trace!(remaining = update.time_remaining, "timer update");
            Some(state.with_timer_remaining(update.time_remaining))
        },
        |_| {
            Some(GameNotification::TimerUpdated {
                time_remaining: update.time_remaining,
            })
        },
    )
}

/// Close the round and reveal the song when the result belongs to the current game, then
/// announce the round summary.
pub fn apply_round_ended(store: &StateStore, ended: &RoundEnded) -> Option<Arc<GameState>> {
    store.update_with(
        |state| {
            if !state.is_current_game(ended.game_id.as_deref()) {
                debug!(
                    game_id = ended.game_id.as_deref().unwrap_or("none"),
                    round = ended.round,
                    "discarding round result from another game"
                );
                return None;
            }
            debug!(round = ended.round, year = ended.actual_year, "round ended");
            Some(state.with_round_revealed(ended.song_info.clone()))
        },
        |_| {
            let summary = RoundSummary::from(ended.clone());
            Some(GameNotification::RoundEnded(Arc::new(summary)))
        },
    )
}
