//! Inbound push events broadcast by the backend.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    dto::game::GameStatePayload,
    state::game::{RoundSummary, SongRef, TeamId},
};

/// Bus event carrying state-changed pushes.
pub const EVENT_GAME_STATE_CHANGED: &str = "soundbeats_game_state_changed";
/// Bus event carrying timer ticks.
pub const EVENT_TIMER_UPDATE: &str = "soundbeats_timer_update";
/// Bus event carrying round results.
pub const EVENT_ROUND_ENDED: &str = "soundbeats_round_ended";

/// Subscription kinds a connection can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PushKind {
    /// Partial or full state fields.
    StateChanged,
    /// Remaining time of the running round.
    TimerUpdate,
    /// Round results and revealed song.
    RoundEnded,
}

impl PushKind {
    /// Every kind, in the order the synchronizer subscribes to them.
    pub const ALL: [PushKind; 3] = [
        PushKind::StateChanged,
        PushKind::TimerUpdate,
        PushKind::RoundEnded,
    ];

    /// Bus event name carrying this kind.
    pub fn event_name(self) -> &'static str {
        match self {
            PushKind::StateChanged => EVENT_GAME_STATE_CHANGED,
            PushKind::TimerUpdate => EVENT_TIMER_UPDATE,
            PushKind::RoundEnded => EVENT_ROUND_ENDED,
        }
    }

    /// Kind carried by a bus event name, if any.
    pub fn from_event_name(name: &str) -> Option<Self> {
        PushKind::ALL
            .into_iter()
            .find(|kind| kind.event_name() == name)
    }
}

/// A decoded push event; one payload type per kind.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// State fields to merge.
    StateChanged(GameStatePayload),
    /// New remaining time.
    TimerUpdate(TimerUpdate),
    /// Round results.
    RoundEnded(RoundEnded),
}

impl PushEvent {
    /// Kind of this event.
    pub fn kind(&self) -> PushKind {
        match self {
            PushEvent::StateChanged(_) => PushKind::StateChanged,
            PushEvent::TimerUpdate(_) => PushKind::TimerUpdate,
            PushEvent::RoundEnded(_) => PushKind::RoundEnded,
        }
    }

    /// Decode the raw `data` of a bus event named `event`.
    pub fn decode(event: &str, data: Value) -> Result<Self, PushDecodeError> {
        let kind = PushKind::from_event_name(event)
            .ok_or_else(|| PushDecodeError::UnknownEvent(event.to_string()))?;

        let decoded = match kind {
            PushKind::StateChanged => serde_json::from_value(data).map(PushEvent::StateChanged),
            PushKind::TimerUpdate => serde_json::from_value(data).map(PushEvent::TimerUpdate),
            PushKind::RoundEnded => serde_json::from_value(data).map(PushEvent::RoundEnded),
        };
        decoded.map_err(|source| PushDecodeError::InvalidPayload {
            event: kind.event_name(),
            source,
        })
    }
}

/// Failure to turn a bus event into a [`PushEvent`].
#[derive(Debug, Error)]
pub enum PushDecodeError {
    /// The event name is not one of the game's events.
    #[error("unknown push event `{0}`")]
    UnknownEvent(String),
    /// The payload does not match the event's shape.
    #[error("malformed `{event}` payload")]
    InvalidPayload {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Timer tick for a given game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerUpdate {
    /// Game the tick belongs to.
    #[serde(default, alias = "gameId")]
    pub game_id: Option<String>,
    /// Seconds left in the round.
    #[serde(rename = "timer_remaining", alias = "timeRemaining")]
    pub time_remaining: u32,
}

/// Results of a round for a given game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundEnded {
    /// Game the round belongs to.
    #[serde(default, alias = "gameId")]
    pub game_id: Option<String>,
    /// Round that ended.
    #[serde(rename = "current_round", alias = "round")]
    pub round: u32,
    /// True release year.
    #[serde(alias = "actualYear")]
    pub actual_year: i32,
    /// Revealed song, including artwork.
    #[serde(alias = "songInfo")]
    pub song_info: SongRef,
    /// Server-computed points per team; teams without a guess are absent.
    #[serde(default, alias = "roundScores")]
    pub round_scores: IndexMap<TeamId, u32>,
}

impl From<RoundEnded> for RoundSummary {
    fn from(event: RoundEnded) -> Self {
        Self {
            round: event.round,
            actual_year: event.actual_year,
            song: event.song_info,
            round_scores: event.round_scores,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_backend_timer_payload() {
        let event = PushEvent::decode(
            EVENT_TIMER_UPDATE,
            json!({ "game_id": "g-1", "timer_remaining": 17 }),
        )
        .unwrap();

        assert_eq!(
            event,
            PushEvent::TimerUpdate(TimerUpdate {
                game_id: Some("g-1".into()),
                time_remaining: 17,
            })
        );
    }

    #[test]
    fn accepts_translated_camel_case_names() {
        let event = PushEvent::decode(
            EVENT_ROUND_ENDED,
            json!({
                "gameId": "g-1",
                "round": 2,
                "actualYear": 1982,
                "songInfo": { "id": 2, "song": "Billie Jean", "artist": "Michael Jackson",
                              "year": 1982, "image_url": "cover.jpg" },
                "roundScores": { "team_0": 10, "team_1": 0 }
            }),
        )
        .unwrap();

        let PushEvent::RoundEnded(ended) = event else {
            panic!("expected round ended");
        };
        assert_eq!(ended.round, 2);
        assert_eq!(ended.song_info.image_url.as_deref(), Some("cover.jpg"));
        assert_eq!(
            ended.round_scores.keys().collect::<Vec<_>>(),
            vec!["team_0", "team_1"]
        );
    }

    #[test]
    fn unknown_event_is_rejected() {
        let err = PushEvent::decode("soundbeats_game_ended", json!({})).unwrap_err();
        assert!(matches!(err, PushDecodeError::UnknownEvent(name) if name == "soundbeats_game_ended"));
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let err = PushEvent::decode(EVENT_TIMER_UPDATE, json!({ "game_id": "g-1" })).unwrap_err();
        assert!(matches!(
            err,
            PushDecodeError::InvalidPayload {
                event: EVENT_TIMER_UPDATE,
                ..
            }
        ));
    }

    #[test]
    fn kinds_map_to_event_names() {
        for kind in PushKind::ALL {
            assert_eq!(PushKind::from_event_name(kind.event_name()), Some(kind));
        }
    }
}
