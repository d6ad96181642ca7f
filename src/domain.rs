//! Records shared by every stage of the simulation: leagues, teams, matches and their
//! cumulative statistics.

use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use ordinalizer::Ordinal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumCount, EnumIter};

/// Permissible team strength ratings.
pub const STRENGTH_RANGE: RangeInclusive<u32> = 1000..=3000;

pub const POINTS_FOR_WIN: u32 = 3;
pub const POINTS_FOR_DRAW: u32 = 1;

macro_rules! id_type {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

id_type!(LeagueId, "l");
id_type!(TeamId, "t");
id_type!(MatchId, "m");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub id: LeagueId,
    pub name: String,
    pub team_count: u32,
    pub max_weeks: u32,
    pub current_week: u32,
}
impl League {
    /// Number of weeks in a double round-robin season for `team_count` teams.
    pub fn max_weeks_for(team_count: u32) -> u32 {
        2 * team_count.saturating_sub(1)
    }

    pub fn is_complete(&self) -> bool {
        self.current_week > self.max_weeks
    }

    pub fn half_season(&self) -> u32 {
        self.max_weeks / 2
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub league_id: LeagueId,
    pub name: String,
    pub strength: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStats {
    pub team_id: TeamId,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_diff: i32,
    pub points: u32,
    pub championship_estimation: f64,
}
impl TeamStats {
    pub fn new(team_id: TeamId) -> Self {
        Self {
            team_id,
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            goal_diff: 0,
            points: 0,
            championship_estimation: 0.0,
        }
    }

    /// Fraction of played matches that were won, or `None` before the first match.
    pub fn win_rate(&self) -> Option<f64> {
        if self.played == 0 {
            None
        } else {
            Some(self.won as f64 / self.played as f64)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}
impl Score {
    pub fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }

    pub fn outcome(&self) -> Outcome {
        match self.home.cmp(&self.away) {
            std::cmp::Ordering::Greater => Outcome::HomeWin,
            std::cmp::Ordering::Equal => Outcome::Draw,
            std::cmp::Ordering::Less => Outcome::AwayWin,
        }
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Ordinal, EnumCount, EnumIter, Display, Serialize, Deserialize,
)]
pub enum Outcome {
    HomeWin,
    Draw,
    AwayWin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub league_id: LeagueId,
    pub week: u32,
    pub home: TeamId,
    pub away: TeamId,
    pub home_score: u32,
    pub away_score: u32,
    pub played: bool,
    /// The winning team, or `None` for a draw or an unplayed match.
    pub result: Option<TeamId>,
}
impl Match {
    pub fn score(&self) -> Option<Score> {
        self.played.then(|| Score::new(self.home_score, self.away_score))
    }

    pub fn involves(&self, team: TeamId) -> bool {
        self.home == team || self.away == team
    }

    pub(crate) fn settle(&mut self, score: Score) {
        self.home_score = score.home;
        self.away_score = score.away;
        self.played = true;
        self.result = match score.outcome() {
            Outcome::HomeWin => Some(self.home),
            Outcome::Draw => None,
            Outcome::AwayWin => Some(self.away),
        };
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionshipEstimation {
    pub league_id: LeagueId,
    pub week: u32,
    pub team_id: TeamId,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyLog {
    pub league_id: LeagueId,
    pub week: u32,
    pub team_stats_json: String,
    pub recorded_at: DateTime<Utc>,
}

/// An isolated copy of a league's state, handed to the estimator. Nothing in here aliases the
/// live records.
#[derive(Debug, Clone, PartialEq)]
pub struct LeagueState {
    pub league_id: LeagueId,
    pub week: u32,
    pub teams: Vec<Team>,
    pub remaining_matches: Vec<Match>,
    pub team_stats: Vec<TeamStats>,
}
