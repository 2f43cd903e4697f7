//! Outbound commands sent over the request/response channel.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::Song,
    dto::validation::{validate_identifier, validate_team_name},
};

/// Inclusive bounds accepted by the backend for a guessed year.
pub const MIN_GUESS_YEAR: i32 = 1900;
/// See [`MIN_GUESS_YEAR`].
pub const MAX_GUESS_YEAR: i32 = 2030;

/// Commands understood by the backend, tagged by their wire `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Fetch the full (possibly user-filtered) game state.
    #[serde(rename = "soundbeatsv2/get_game_state")]
    GetGameState,
    /// Start a new game, replacing any running one.
    #[serde(rename = "soundbeatsv2/new_game")]
    NewGame(NewGameRequest),
    /// Open a round on the given song.
    #[serde(rename = "soundbeatsv2/start_round")]
    StartRound {
        /// Catalog song selected by the admin.
        song: Song,
    },
    /// Clear the revealed song and prepare the next round.
    #[serde(rename = "soundbeatsv2/next_round")]
    NextRound,
    /// Record a team's guess for the running round.
    #[serde(rename = "soundbeatsv2/submit_guess")]
    SubmitGuess(GuessRequest),
    /// Rename a team.
    #[serde(rename = "soundbeatsv2/update_team_name")]
    UpdateTeamName(RenameTeamRequest),
    /// Give a user control of a team.
    #[serde(rename = "soundbeatsv2/assign_user_to_team")]
    AssignUserToTeam(AssignUserRequest),
    /// Fetch the highscore table.
    #[serde(rename = "soundbeatsv2/get_highscores")]
    GetHighscores,
    /// Drive the configured media player.
    #[serde(rename = "soundbeatsv2/media_control")]
    MediaControl(MediaAction),
}

impl Command {
    /// Wire name of the command, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::GetGameState => "soundbeatsv2/get_game_state",
            Command::NewGame(_) => "soundbeatsv2/new_game",
            Command::StartRound { .. } => "soundbeatsv2/start_round",
            Command::NextRound => "soundbeatsv2/next_round",
            Command::SubmitGuess(_) => "soundbeatsv2/submit_guess",
            Command::UpdateTeamName(_) => "soundbeatsv2/update_team_name",
            Command::AssignUserToTeam(_) => "soundbeatsv2/assign_user_to_team",
            Command::GetHighscores => "soundbeatsv2/get_highscores",
            Command::MediaControl(_) => "soundbeatsv2/media_control",
        }
    }
}

/// Parameters of a new game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewGameRequest {
    /// Number of teams the backend should create.
    #[validate(range(min = 1, max = 5))]
    pub team_count: u8,
    /// Playlist to draw songs from.
    #[validate(custom(function = "validate_identifier"))]
    pub playlist_id: String,
    /// Round duration.
    #[validate(range(min = 5, max = 300))]
    pub timer_seconds: u32,
}

/// A team's guess for the running round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GuessRequest {
    /// Team submitting the guess.
    #[validate(custom(function = "validate_identifier"))]
    pub team_id: String,
    /// Guessed release year.
    #[validate(range(min = 1900, max = 2030))]
    pub year: i32,
    /// All-or-nothing bet toggle.
    pub has_bet: bool,
}

/// New display name for a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RenameTeamRequest {
    /// Team to rename.
    #[validate(custom(function = "validate_identifier"))]
    pub team_id: String,
    /// Name to apply, already trimmed.
    #[validate(custom(function = "validate_team_name"))]
    pub name: String,
}

/// Assignment of a home-automation user to a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AssignUserRequest {
    /// Team receiving the user.
    #[validate(custom(function = "validate_identifier"))]
    pub team_id: String,
    /// User to assign.
    #[validate(custom(function = "validate_identifier"))]
    pub user_id: String,
}

/// Playback actions forwarded to the media player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MediaAction {
    /// Resume playback.
    Play,
    /// Pause playback.
    Pause,
    /// Stop playback.
    Stop,
    /// Set the output volume.
    Volume {
        /// Level between 0.0 and 1.0.
        volume_level: f64,
    },
}

impl Validate for MediaAction {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let MediaAction::Volume { volume_level } = self
            && !(0.0..=1.0).contains(volume_level)
        {
            let mut err = ValidationError::new("volume_level_range");
            err.message =
                Some(format!("Volume must be between 0.0 and 1.0 (got {volume_level})").into());
            errors.add("volume_level", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Acknowledgment returned by the backend for a successful command.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandAck(pub Value);

impl CommandAck {
    /// Value of the conventional `success` flag; absent counts as success.
    pub fn success(&self) -> bool {
        self.0
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    /// Game identifier echoed by `new_game`.
    pub fn game_id(&self) -> Option<&str> {
        self.0.get("game_id").and_then(Value::as_str)
    }
}
