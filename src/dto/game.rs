use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;

use crate::state::game::{GameState, HighscoreEntry, SongId, SongRef, Team, TeamId};

/// Game state fields as sent by the backend, either as a full `get_game_state` response or
/// as a partial state-changed push.
///
/// Absent fields are `None`. Nullable fields use a double option so an explicit `null`
/// (`Some(None)`) can clear a value while an absent key leaves it alone.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameStatePayload {
    /// Backend-side reason for the broadcast (`round_started`, `guess_submitted`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(
        default,
        with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub game_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_round: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_active: Option<bool>,
    #[serde(
        default,
        with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_song: Option<Option<SongRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_remaining: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub played_song_ids: Option<Vec<SongId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teams: Option<Vec<Team>>,
    #[serde(
        default,
        with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub highscore_current_round: Option<Option<HighscoreEntry>>,
    #[serde(
        default,
        with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_team_id: Option<Option<TeamId>>,
    #[serde(
        default,
        with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub can_control_teams: Option<Option<Vec<TeamId>>>,
}

impl GameStatePayload {
    /// Overlay the present fields on `base`, preserving everything else.
    pub fn apply_to(&self, base: &GameState) -> GameState {
        let mut next = base.clone();

        if let Some(active) = self.active {
            next.active = active;
        }
        if let Some(game_id) = &self.game_id {
            next.game_id = game_id.clone();
        }
        if let Some(current_round) = self.current_round {
            next.current_round = current_round;
        }
        if let Some(round_active) = self.round_active {
            next.round_active = round_active;
        }
        if let Some(current_song) = &self.current_song {
            next.current_song = current_song.clone();
        }
        if let Some(timer_seconds) = self.timer_seconds {
            next.timer_seconds = timer_seconds;
        }
        if let Some(timer_remaining) = self.timer_remaining {
            next.timer_remaining = timer_remaining;
        }
        if let Some(playlist_id) = &self.playlist_id {
            next.playlist_id = playlist_id.clone();
        }
        if let Some(played) = &self.played_song_ids {
            next.played_song_ids = played.iter().copied().collect::<BTreeSet<_>>();
        }
        if let Some(teams) = &self.teams {
            next.teams = teams.clone();
        }
        if let Some(highscore) = &self.highscore_current_round {
            next.highscore_current_round = highscore.clone();
        }
        if let Some(user_team_id) = &self.user_team_id {
            next.user_team_id = user_team_id.clone();
        }
        if let Some(can_control_teams) = &self.can_control_teams {
            next.can_control_teams = can_control_teams.clone();
        }

        next
    }
}

impl From<GameStatePayload> for GameState {
    /// Full replacement: fields missing from the payload take their inactive defaults.
    fn from(payload: GameStatePayload) -> Self {
        payload.apply_to(&GameState::inactive())
    }
}

impl From<&GameState> for GameStatePayload {
    fn from(state: &GameState) -> Self {
        Self {
            action: None,
            active: Some(state.active),
            game_id: Some(state.game_id.clone()),
            current_round: Some(state.current_round),
            round_active: Some(state.round_active),
            current_song: Some(state.current_song.clone()),
            timer_seconds: Some(state.timer_seconds),
            timer_remaining: Some(state.timer_remaining),
            playlist_id: Some(state.playlist_id.clone()),
            played_song_ids: Some(state.played_song_ids.iter().copied().collect()),
            teams: Some(state.teams.clone()),
            highscore_current_round: Some(state.highscore_current_round.clone()),
            user_team_id: Some(state.user_team_id.clone()),
            can_control_teams: Some(state.can_control_teams.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn base() -> GameState {
        GameState {
            active: true,
            game_id: Some("g-1".into()),
            current_round: 3,
            timer_seconds: 30,
            playlist_id: "rock".into(),
            teams: vec![Team::new("team_0", "Team 1"), Team::new("team_1", "Team 2")],
            current_song: Some(SongRef {
                id: 4,
                song: "Song".into(),
                artist: "Artist".into(),
                year: 1999,
                image_url: None,
                url: None,
            }),
            ..GameState::inactive()
        }
    }

    #[test]
    fn absent_fields_are_preserved() {
        let payload: GameStatePayload =
            serde_json::from_value(json!({ "action": "round_started", "round_active": true }))
                .unwrap();

        let next = payload.apply_to(&base());

        assert!(next.round_active);
        assert_eq!(next.teams, base().teams);
        assert_eq!(next.current_song, base().current_song);
        assert_eq!(next.current_round, 3);
    }

    #[test]
    fn explicit_null_clears_nullable_fields() {
        let payload: GameStatePayload =
            serde_json::from_value(json!({ "current_song": null })).unwrap();

        assert_eq!(payload.current_song, Some(None));
        assert_eq!(payload.apply_to(&base()).current_song, None);
    }

    #[test]
    fn inactive_response_becomes_inactive_state() {
        let payload: GameStatePayload =
            serde_json::from_value(json!({ "active": false, "game_id": null })).unwrap();

        assert_eq!(GameState::from(payload), GameState::inactive());
    }

    #[test]
    fn full_response_is_decoded() {
        let payload: GameStatePayload = serde_json::from_value(json!({
            "active": true,
            "game_id": "g-2",
            "teams": [
                { "id": "team_0", "name": "Team 1", "score": 12, "current_guess": 1984,
                  "has_bet": true, "assigned_user": "user-a" }
            ],
            "current_round": 1,
            "round_active": false,
            "timer_remaining": 0,
            "timer_seconds": 45,
            "playlist_id": "80s",
            "current_song": null,
            "highscore_current_round": { "team_name": "Team 1", "score_per_round": 12.0,
                                         "rounds_played": 1 },
            "media_player": { "state": "idle" }
        }))
        .unwrap();

        let state = GameState::from(payload);

        assert_eq!(state.game_id.as_deref(), Some("g-2"));
        assert_eq!(state.timer_seconds, 45);
        assert_eq!(state.teams[0].score, 12);
        assert_eq!(state.teams[0].assigned_user.as_deref(), Some("user-a"));
        assert_eq!(
            state.highscore_current_round.map(|entry| entry.rounds_played),
            Some(1)
        );
    }

    #[test]
    fn state_round_trips_through_payload() {
        let state = base();
        assert_eq!(GameState::from(GameStatePayload::from(&state)), state);
    }
}
