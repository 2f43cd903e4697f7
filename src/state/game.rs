use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Identifier of a song in the static catalog.
pub type SongId = u32;

/// Identifier of a team, stable for the lifetime of a game (e.g. `team_0`).
pub type TeamId = String;

/// Client-side view of the game, owned by the synchronizer and replaced on every change.
///
/// None of the `with_*` helpers mutate `self`: each one returns a fresh value so the
/// container can install it behind a new [`std::sync::Arc`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameState {
    /// Whether a game is in progress.
    pub active: bool,
    /// Identity of the current game, used to discard pushes from a superseded game.
    pub game_id: Option<String>,
    /// Number of the current (or last) round.
    pub current_round: u32,
    /// Whether guessing is currently open.
    pub round_active: bool,
    /// Revealed song, populated once the round ends.
    pub current_song: Option<SongRef>,
    /// Configured round duration.
    pub timer_seconds: u32,
    /// Seconds left in the round, as reported by the backend.
    pub timer_remaining: u32,
    /// Playlist the game draws its songs from.
    pub playlist_id: String,
    /// Songs already used this game.
    pub played_song_ids: BTreeSet<SongId>,
    /// Teams in creation order.
    pub teams: Vec<Team>,
    /// Best historical score-per-round for the current round number.
    pub highscore_current_round: Option<HighscoreEntry>,
    /// Team assigned to the viewing user, when the backend filtered the state for them.
    pub user_team_id: Option<TeamId>,
    /// Teams the viewing user may control, when the backend filtered the state for them.
    pub can_control_teams: Option<Vec<TeamId>>,
}

/// A competing team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Stable identifier.
    pub id: TeamId,
    /// Display name, editable by the admin or the team itself.
    pub name: String,
    /// Cumulative score across rounds.
    #[serde(default)]
    pub score: u32,
    /// Year guessed this round.
    #[serde(default)]
    pub current_guess: Option<i32>,
    /// Whether the team bet on its guess this round.
    #[serde(default)]
    pub has_bet: bool,
    /// Home-automation user controlling this team.
    #[serde(default)]
    pub assigned_user: Option<String>,
}

/// Song reference carried by the game state once revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRef {
    /// Catalog identifier.
    pub id: SongId,
    /// Song title.
    pub song: String,
    /// Performing artist.
    pub artist: String,
    /// Release year to guess.
    pub year: i32,
    /// Cover artwork.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Media reference used for playback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Best score-per-round record shown for context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighscoreEntry {
    /// Name of the team that set the record.
    pub team_name: String,
    /// Average points per round.
    pub score_per_round: f64,
    /// Rounds played when the record was set.
    pub rounds_played: u32,
    /// Timestamp of the record as reported by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Playlist used when the record was set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<String>,
}

/// Highscore table returned by the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Highscores {
    /// Best entry over every round count.
    #[serde(default)]
    pub all_time_best: Option<HighscoreEntry>,
    /// Top entries keyed by the number of rounds played.
    #[serde(default)]
    pub by_round: IndexMap<u32, Vec<HighscoreEntry>>,
}

/// Authoritative results of a finished round, emitted separately from the state change.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSummary {
    /// Round that just ended.
    pub round: u32,
    /// True release year of the song.
    pub actual_year: i32,
    /// Revealed song, including artwork.
    pub song: SongRef,
    /// Server-computed points earned this round, keyed by team.
    pub round_scores: IndexMap<TeamId, u32>,
}

impl GameState {
    /// Empty state used before the first load and after a disconnect.
    pub fn inactive() -> Self {
        Self::default()
    }

    /// Look up a team by identifier.
    pub fn team(&self, team_id: &str) -> Option<&Team> {
        self.teams.iter().find(|team| team.id == team_id)
    }

    /// Whether a push tagged with `game_id` belongs to the current game.
    pub fn is_current_game(&self, game_id: Option<&str>) -> bool {
        match (self.game_id.as_deref(), game_id) {
            (Some(current), Some(incoming)) => current == incoming,
            _ => false,
        }
    }

    /// Copy with only the remaining time replaced.
    pub fn with_timer_remaining(&self, remaining: u32) -> Self {
        Self {
            timer_remaining: remaining,
            ..self.clone()
        }
    }

    /// Copy with the round closed and the song revealed.
    pub fn with_round_revealed(&self, song: SongRef) -> Self {
        Self {
            round_active: false,
            current_song: Some(song),
            ..self.clone()
        }
    }

    /// Copy with a new round opened on `song`.
    ///
    /// Guesses and bets are cleared and the song is recorded as played. The round counter
    /// is left to the backend.
    pub fn with_round_started(&self, song: SongRef) -> Self {
        let mut played_song_ids = self.played_song_ids.clone();
        played_song_ids.insert(song.id);

        Self {
            round_active: true,
            timer_remaining: self.timer_seconds,
            current_song: Some(song),
            played_song_ids,
            teams: self.teams.iter().map(Team::with_round_reset).collect(),
            ..self.clone()
        }
    }

    /// Copy prepared for the next round: closed, song cleared, guesses reset.
    pub fn with_round_advanced(&self) -> Self {
        Self {
            round_active: false,
            current_song: None,
            timer_remaining: 0,
            teams: self.teams.iter().map(Team::with_round_reset).collect(),
            ..self.clone()
        }
    }

    /// Copy with `team_id`'s guess set. Other teams are untouched.
    pub fn with_guess(&self, team_id: &str, year: i32, has_bet: bool) -> Self {
        self.with_team(team_id, |team| Team {
            current_guess: Some(year),
            has_bet,
            ..team.clone()
        })
    }

    /// Copy with `team_id` renamed.
    pub fn with_team_name(&self, team_id: &str, name: &str) -> Self {
        self.with_team(team_id, |team| Team {
            name: name.to_string(),
            ..team.clone()
        })
    }

    fn with_team(&self, team_id: &str, update: impl Fn(&Team) -> Team) -> Self {
        Self {
            teams: self
                .teams
                .iter()
                .map(|team| {
                    if team.id == team_id {
                        update(team)
                    } else {
                        team.clone()
                    }
                })
                .collect(),
            ..self.clone()
        }
    }
}

impl Team {
    /// Fresh team with no score, as created by the backend.
    pub fn new(id: impl Into<TeamId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            score: 0,
            current_guess: None,
            has_bet: false,
            assigned_user: None,
        }
    }

    /// Whether a guess has been submitted this round.
    pub fn has_guessed(&self) -> bool {
        self.current_guess.is_some()
    }

    fn with_round_reset(&self) -> Self {
        Self {
            current_guess: None,
            has_bet: false,
            ..self.clone()
        }
    }
}
