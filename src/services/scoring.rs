//! Round scoring rules, shared by the result preview and the round summary display.

use serde::Serialize;

use crate::state::game::{Team, TeamId};

/// Points for an exact guess without a bet.
pub const EXACT_POINTS: u32 = 10;
/// Points for a guess within [`CLOSE_DISTANCE`] years.
pub const CLOSE_POINTS: u32 = 5;
/// Points for a guess within [`NEAR_DISTANCE`] years.
pub const NEAR_POINTS: u32 = 2;
/// Points for an exact guess with a bet.
pub const BET_POINTS: u32 = 20;

/// Largest distance still worth [`CLOSE_POINTS`].
pub const CLOSE_DISTANCE: u32 = 3;
/// Largest distance still worth [`NEAR_POINTS`], and still classified as close.
pub const NEAR_DISTANCE: u32 = 5;

/// How close a guess came to the actual year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Accuracy {
    Exact,
    Close,
    Wrong,
}

/// Points earned by `guess_year` for a song released in `actual_year`.
///
/// A bet turns graduated scoring into all-or-nothing.
pub fn compute_score(guess_year: i32, actual_year: i32, has_bet: bool) -> u32 {
    let distance = guess_year.abs_diff(actual_year);

    if has_bet {
        return if distance == 0 { BET_POINTS } else { 0 };
    }

    match distance {
        0 => EXACT_POINTS,
        d if d <= CLOSE_DISTANCE => CLOSE_POINTS,
        d if d <= NEAR_DISTANCE => NEAR_POINTS,
        _ => 0,
    }
}

/// Accuracy class of a guess `distance` years off.
pub fn classify(distance: u32) -> Accuracy {
    match distance {
        0 => Accuracy::Exact,
        d if d <= NEAR_DISTANCE => Accuracy::Close,
        _ => Accuracy::Wrong,
    }
}

/// Predicted outcome of a round for one team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamResultPreview {
    pub team_id: TeamId,
    pub team_name: String,
    pub guess: Option<i32>,
    pub has_bet: bool,
    /// Years between guess and actual year; `None` without a guess.
    pub distance: Option<u32>,
    pub accuracy: Accuracy,
    pub points: u32,
}

/// Client-side prediction of every team's round result, in team order.
///
/// Teams without a guess score nothing and count as wrong. The backend's round summary
/// supersedes this once it arrives.
pub fn preview_round(teams: &[Team], actual_year: i32) -> Vec<TeamResultPreview> {
    teams
        .iter()
        .map(|team| {
            let distance = team
                .current_guess
                .map(|guess| guess.abs_diff(actual_year));
            TeamResultPreview {
                team_id: team.id.clone(),
                team_name: team.name.clone(),
                guess: team.current_guess,
                has_bet: team.has_bet,
                distance,
                accuracy: distance.map_or(Accuracy::Wrong, classify),
                points: team
                    .current_guess
                    .map_or(0, |guess| compute_score(guess, actual_year, team.has_bet)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graduated_points_without_bet() {
        assert_eq!(compute_score(1985, 1985, false), 10);
        assert_eq!(compute_score(1983, 1985, false), 5);
        assert_eq!(compute_score(1988, 1985, false), 5);
        assert_eq!(compute_score(1980, 1985, false), 2);
        assert_eq!(compute_score(1979, 1985, false), 0);
        assert_eq!(compute_score(1970, 1985, false), 0);
    }

    #[test]
    fn bet_is_all_or_nothing() {
        assert_eq!(compute_score(1985, 1985, true), 20);
        assert_eq!(compute_score(1984, 1985, true), 0);
        assert_eq!(compute_score(2020, 1985, true), 0);
    }

    #[test]
    fn classification_boundaries() {
        assert_eq!(classify(0), Accuracy::Exact);
        assert_eq!(classify(1), Accuracy::Close);
        assert_eq!(classify(5), Accuracy::Close);
        assert_eq!(classify(6), Accuracy::Wrong);
    }

    #[test]
    fn preview_covers_every_team_in_order() {
        let mut exact = Team::new("team_0", "Exact");
        exact.current_guess = Some(1991);
        exact.has_bet = true;
        let mut close = Team::new("team_1", "Close");
        close.current_guess = Some(1994);
        let silent = Team::new("team_2", "Silent");

        let preview = preview_round(&[exact, close, silent], 1991);

        let summary: Vec<_> = preview
            .iter()
            .map(|result| (result.team_id.as_str(), result.accuracy, result.points))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("team_0", Accuracy::Exact, 20),
                ("team_1", Accuracy::Close, 5),
                ("team_2", Accuracy::Wrong, 0),
            ]
        );
        assert_eq!(preview[2].distance, None);
    }
}
