//! Read-only projections of the game state for presentation.
//!
//! Nothing here mutates the state it is given; every function borrows and returns fresh
//! values or borrowed slices of the input.

use serde::Serialize;

use crate::{
    config::PanelConfig,
    state::game::{GameState, HighscoreEntry, Team, TeamId},
};

/// Year the guess slider starts on before a team has guessed.
pub const DEFAULT_GUESS_YEAR: i32 = 2000;

/// Who is looking at the panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewer {
    /// Admins control every team and the game flow.
    pub is_admin: bool,
    /// Team assigned to the viewer, if any.
    pub team_id: Option<TeamId>,
}

impl Viewer {
    pub fn admin() -> Self {
        Self {
            is_admin: true,
            team_id: None,
        }
    }

    pub fn player(team_id: impl Into<TeamId>) -> Self {
        Self {
            is_admin: false,
            team_id: Some(team_id.into()),
        }
    }

    /// Viewer as reported by a user-filtered state.
    pub fn from_state(is_admin: bool, state: &GameState) -> Self {
        Self {
            is_admin,
            team_id: state.user_team_id.clone(),
        }
    }

    /// Whether this viewer may act for `team_id`.
    pub fn can_control(&self, team_id: &str) -> bool {
        self.is_admin || self.team_id.as_deref() == Some(team_id)
    }
}

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing<'a> {
    /// 1-based position.
    pub rank: usize,
    pub team: &'a Team,
    /// Average points per played round, one decimal.
    pub average: String,
}

/// Teams ordered by score descending, ties by name ascending.
pub fn standings(teams: &[Team]) -> Vec<&Team> {
    let mut sorted: Vec<&Team> = teams.iter().collect();
    sorted.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
    sorted
}

/// Leaderboard rows for `state`, with ranks and per-round averages.
pub fn leaderboard(state: &GameState) -> Vec<Standing<'_>> {
    standings(&state.teams)
        .into_iter()
        .enumerate()
        .map(|(index, team)| Standing {
            rank: index + 1,
            team,
            average: average_per_round(team.score, state.current_round),
        })
        .collect()
}

/// `score / rounds` with one decimal; `0.0` before the first round.
pub fn average_per_round(score: u32, rounds: u32) -> String {
    if rounds == 0 {
        return "0.0".into();
    }
    format!("{:.1}", f64::from(score) / f64::from(rounds))
}

/// Teams shown to `viewer`.
///
/// Admins see every team; an assigned player sees only their team; an unassigned viewer
/// sees every team, read-only.
pub fn visible_teams<'a>(state: &'a GameState, viewer: &Viewer) -> Vec<&'a Team> {
    match (viewer.is_admin, viewer.team_id.as_deref()) {
        (false, Some(team_id)) => state.team(team_id).into_iter().collect(),
        _ => state.teams.iter().collect(),
    }
}

/// Teams `viewer` may act for.
pub fn controllable_teams<'a>(state: &'a GameState, viewer: &Viewer) -> Vec<&'a Team> {
    state
        .teams
        .iter()
        .filter(|team| viewer.can_control(&team.id))
        .collect()
}

/// Phase of the round as shown in the status banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    InProgress,
    Complete,
    NotStarted,
    AwaitingNext,
}

impl RoundStatus {
    pub fn of(state: &GameState) -> Self {
        if state.round_active {
            RoundStatus::InProgress
        } else if state.current_song.is_some() {
            RoundStatus::Complete
        } else if state.current_round == 0 {
            RoundStatus::NotStarted
        } else {
            RoundStatus::AwaitingNext
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            RoundStatus::InProgress => "Round in progress - Make your guesses!",
            RoundStatus::Complete => "Round complete - Waiting for next round",
            RoundStatus::NotStarted => "Game ready - Waiting for first round to start",
            RoundStatus::AwaitingNext => "Waiting for next round to start",
        }
    }

    /// Style tag of the banner.
    pub fn css_class(self) -> &'static str {
        match self {
            RoundStatus::InProgress => "active",
            RoundStatus::Complete => "ended",
            RoundStatus::NotStarted | RoundStatus::AwaitingNext => "waiting",
        }
    }
}

/// Status line of the admin controls.
pub fn admin_status(state: &GameState) -> String {
    if state.round_active {
        let guessed = state.teams.iter().filter(|team| team.has_guessed()).count();
        format!(
            "Round in progress. {guessed}/{} teams have submitted guesses.",
            state.teams.len()
        )
    } else if state.current_song.is_some() {
        "Round completed. Ready to advance to next round.".into()
    } else {
        "Ready to start next round.".into()
    }
}

/// What a viewer may do on one team card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TeamCardPermissions {
    /// Guess and bet inputs are enabled.
    pub can_interact: bool,
    /// The team name can be edited in place.
    pub name_editable: bool,
}

pub fn team_card_permissions(
    state: &GameState,
    viewer: &Viewer,
    team_id: &str,
) -> TeamCardPermissions {
    let can_control = viewer.can_control(team_id);
    TeamCardPermissions {
        can_interact: can_control && state.round_active,
        name_editable: can_control
            && viewer.is_admin
            && (!state.active || state.current_round == 0),
    }
}

/// Urgency of the countdown display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerLevel {
    Normal,
    Warning,
    Danger,
}

/// Countdown display derived from the server-driven timer fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerView {
    /// `m:ss`.
    pub display: String,
    /// Remaining share of the round, `0.0` when the duration is unknown.
    pub progress: f64,
    pub level: TimerLevel,
}

impl TimerView {
    pub fn of(state: &GameState) -> Self {
        let remaining = state.timer_remaining;
        let total = state.timer_seconds;

        let progress = if total > 0 {
            f64::from(remaining) / f64::from(total)
        } else {
            0.0
        };

        let danger = (f64::from(total) * 0.1).max(5.0);
        let warning = (f64::from(total) * 0.2).max(10.0);
        let level = if !state.round_active || remaining == 0 {
            TimerLevel::Normal
        } else if f64::from(remaining) <= danger {
            TimerLevel::Danger
        } else if f64::from(remaining) <= warning {
            TimerLevel::Warning
        } else {
            TimerLevel::Normal
        };

        Self {
            display: format!("{}:{:02}", remaining / 60, remaining % 60),
            progress,
            level,
        }
    }
}

/// Year picker of a team card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GuessSlider {
    pub min: i32,
    pub max: i32,
    pub value: i32,
}

impl GuessSlider {
    /// Slider bounded by the configured years, starting on the team's current guess.
    pub fn new(config: &PanelConfig, team: &Team) -> Self {
        let (min, max) = (
            config.guess_min_year.min(config.guess_max_year),
            config.guess_max_year.max(config.guess_min_year),
        );
        Self {
            min,
            max,
            value: team.current_guess.unwrap_or(DEFAULT_GUESS_YEAR).clamp(min, max),
        }
    }

    /// Slider moved by `delta` years, clamped to its bounds.
    pub fn nudge(self, delta: i32) -> Self {
        Self {
            value: self.value.saturating_add(delta).clamp(self.min, self.max),
            ..self
        }
    }
}

/// `"<team>: <x.y> pts/round (<n> rounds)"`.
pub fn highscore_line(entry: &HighscoreEntry) -> String {
    format!(
        "{}: {:.1} pts/round ({} rounds)",
        entry.team_name, entry.score_per_round, entry.rounds_played
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game::SongRef;

    fn team(id: &str, name: &str, score: u32) -> Team {
        Team {
            score,
            ..Team::new(id, name)
        }
    }

    fn state() -> GameState {
        GameState {
            active: true,
            game_id: Some("g".into()),
            current_round: 2,
            timer_seconds: 30,
            teams: vec![
                team("team_0", "B", 10),
                team("team_1", "A", 10),
                team("team_2", "C", 20),
            ],
            ..GameState::inactive()
        }
    }

    fn revealed() -> SongRef {
        SongRef {
            id: 1,
            song: "Song".into(),
            artist: "Artist".into(),
            year: 1975,
            image_url: None,
            url: None,
        }
    }

    #[test]
    fn standings_sort_by_score_then_name() {
        let state = state();
        let names: Vec<_> = standings(&state.teams)
            .into_iter()
            .map(|team| (team.name.as_str(), team.score))
            .collect();

        assert_eq!(names, vec![("C", 20), ("A", 10), ("B", 10)]);
        assert_eq!(state.teams[0].name, "B");
    }

    #[test]
    fn leaderboard_ranks_and_averages() {
        let state = state();
        let rows = leaderboard(&state);

        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].average, "10.0");
        assert_eq!(rows[2].average, "5.0");
        assert_eq!(average_per_round(7, 0), "0.0");
    }

    #[test]
    fn admin_controls_every_team() {
        let state = state();
        assert_eq!(visible_teams(&state, &Viewer::admin()).len(), 3);
        assert_eq!(controllable_teams(&state, &Viewer::admin()).len(), 3);
    }

    #[test]
    fn player_sees_and_controls_only_their_team() {
        let state = state();
        let viewer = Viewer::player("team_1");

        let visible: Vec<_> = visible_teams(&state, &viewer)
            .into_iter()
            .map(|team| team.id.as_str())
            .collect();
        assert_eq!(visible, vec!["team_1"]);
        assert_eq!(controllable_teams(&state, &viewer).len(), 1);
    }

    #[test]
    fn unassigned_viewer_sees_everything_read_only() {
        let state = state();
        let viewer = Viewer::default();

        assert_eq!(visible_teams(&state, &viewer).len(), 3);
        assert!(controllable_teams(&state, &viewer).is_empty());
    }

    #[test]
    fn viewer_follows_filtered_state() {
        let state = GameState {
            user_team_id: Some("team_2".into()),
            ..state()
        };
        let viewer = Viewer::from_state(false, &state);
        assert!(viewer.can_control("team_2"));
        assert!(!viewer.can_control("team_0"));
    }

    #[test]
    fn round_status_decision_table() {
        let base = state();

        let active = GameState {
            round_active: true,
            ..base.clone()
        };
        assert_eq!(RoundStatus::of(&active), RoundStatus::InProgress);
        assert_eq!(RoundStatus::of(&active).css_class(), "active");

        let complete = GameState {
            current_song: Some(revealed()),
            ..base.clone()
        };
        assert_eq!(RoundStatus::of(&complete), RoundStatus::Complete);
        assert_eq!(
            RoundStatus::of(&complete).text(),
            "Round complete - Waiting for next round"
        );

        let fresh = GameState {
            current_round: 0,
            ..base.clone()
        };
        assert_eq!(RoundStatus::of(&fresh), RoundStatus::NotStarted);

        assert_eq!(RoundStatus::of(&base), RoundStatus::AwaitingNext);
        assert_eq!(RoundStatus::of(&base).css_class(), "waiting");
    }

    #[test]
    fn admin_status_counts_guesses() {
        let mut state = GameState {
            round_active: true,
            ..state()
        };
        state.teams[1].current_guess = Some(1990);

        assert_eq!(
            admin_status(&state),
            "Round in progress. 1/3 teams have submitted guesses."
        );

        state.round_active = false;
        state.current_song = Some(revealed());
        assert_eq!(
            admin_status(&state),
            "Round completed. Ready to advance to next round."
        );
    }

    #[test]
    fn team_names_are_editable_only_before_play() {
        let running = state();
        let admin = Viewer::admin();

        assert!(!team_card_permissions(&running, &admin, "team_0").name_editable);

        let lobby = GameState {
            current_round: 0,
            ..running.clone()
        };
        assert!(team_card_permissions(&lobby, &admin, "team_0").name_editable);
        let player = Viewer::player("team_0");
        assert!(!team_card_permissions(&lobby, &player, "team_0").name_editable);
    }

    #[test]
    fn interaction_requires_an_open_round() {
        let viewer = Viewer::player("team_0");
        let closed = state();
        let open = GameState {
            round_active: true,
            ..state()
        };

        assert!(!team_card_permissions(&closed, &viewer, "team_0").can_interact);
        assert!(team_card_permissions(&open, &viewer, "team_0").can_interact);
        assert!(!team_card_permissions(&open, &viewer, "team_1").can_interact);
    }

    #[test]
    fn timer_levels_follow_thresholds() {
        let at = |remaining, total, active| {
            TimerView::of(&GameState {
                timer_remaining: remaining,
                timer_seconds: total,
                round_active: active,
                ..GameState::inactive()
            })
        };

        assert_eq!(at(75, 120, true).display, "1:15");
        assert_eq!(at(20, 30, true).level, TimerLevel::Normal);
        assert_eq!(at(10, 30, true).level, TimerLevel::Warning);
        assert_eq!(at(5, 30, true).level, TimerLevel::Danger);
        assert_eq!(at(12, 120, true).level, TimerLevel::Danger);
        assert_eq!(at(24, 120, true).level, TimerLevel::Warning);
        assert_eq!(at(5, 30, false).level, TimerLevel::Normal);
        assert_eq!(at(0, 30, true).level, TimerLevel::Normal);
        assert_eq!(at(15, 30, true).progress, 0.5);
        assert_eq!(at(3, 0, true).progress, 0.0);
    }

    #[test]
    fn guess_slider_starts_on_guess_and_stays_in_bounds() {
        let config = PanelConfig::default();
        let fresh = GuessSlider::new(&config, &Team::new("team_0", "A"));
        assert_eq!(fresh.value, DEFAULT_GUESS_YEAR);

        let guessed = Team {
            current_guess: Some(1962),
            ..Team::new("team_1", "B")
        };
        let slider = GuessSlider::new(&config, &guessed);
        assert_eq!(slider.value, 1962);
        assert_eq!(slider.nudge(-10).value, 1952);
        assert_eq!(slider.nudge(-50).value, 1950);
        assert_eq!(slider.nudge(100).value, 2030);
    }

    #[test]
    fn guess_slider_orders_swapped_bounds() {
        let config = PanelConfig {
            guess_min_year: 2030,
            guess_max_year: 1950,
            ..PanelConfig::default()
        };

        let slider = GuessSlider::new(&config, &Team::new("team_0", "A"));

        assert_eq!((slider.min, slider.max), (1950, 2030));
        assert_eq!(slider.value, DEFAULT_GUESS_YEAR);
        assert_eq!(slider.nudge(-200).value, 1950);
    }

    #[test]
    fn highscore_line_uses_one_decimal() {
        let entry = HighscoreEntry {
            team_name: "Quizzers".into(),
            score_per_round: 7.5,
            rounds_played: 4,
            date: None,
            playlist_id: None,
        };
        assert_eq!(highscore_line(&entry), "Quizzers: 7.5 pts/round (4 rounds)");
    }
}
