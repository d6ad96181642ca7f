//! Failure taxonomy. Every core operation returns a [LeagueError] whose variant names the kind of
//! failure; the more specific enums are lifted into it with `?`.

use std::time::Duration;

use thiserror::Error;

use crate::domain::{LeagueId, MatchId, TeamId};

#[derive(Debug, Error)]
pub enum LeagueError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(#[from] NotFound),

    #[error("{0}")]
    Scheduling(#[from] SchedulingFailure),

    #[error("{0}")]
    EstimationUnavailable(#[from] EstimationUnavailable),

    #[error("{0}")]
    AlreadyPlayed(#[from] AlreadyPlayed),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<StorageError> for LeagueError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(not_found) => LeagueError::NotFound(not_found),
            StorageError::Backend(message) => LeagueError::Storage(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("league name cannot be empty")]
    EmptyLeagueName,

    #[error("team count must be at least 2, got {0}")]
    TooFewTeams(u32),

    #[error("team count must be even, got {0}")]
    OddTeamCount(u32),

    #[error("expected {expected} teams, got {actual}")]
    TeamCountMismatch { expected: u32, actual: usize },

    #[error("team name cannot be empty")]
    EmptyTeamName,

    #[error("duplicate team name: {0}")]
    DuplicateTeamName(String),

    #[error("strength {strength} for team {team} must be in the range {min}..={max}")]
    StrengthOutOfRange {
        team: String,
        strength: i64,
        min: u32,
        max: u32,
    },

    #[error("scores cannot be negative (match {match_id}: {home}-{away})")]
    NegativeScore { match_id: MatchId, home: i64, away: i64 },

    #[error("home and away teams cannot be the same (match {match_id}, team {team})")]
    SelfMatch { match_id: MatchId, team: TeamId },

    #[error("match {match_id} is {actual_home} vs {actual_away}, not {home} vs {away}")]
    FixtureMismatch {
        match_id: MatchId,
        home: TeamId,
        away: TeamId,
        actual_home: TeamId,
        actual_away: TeamId,
    },

    #[error("results span several leagues ({0} and {1})")]
    MixedLeagues(LeagueId, LeagueId),

    #[error("match {match_id} is scheduled for week {week}, but league is in week {current_week}")]
    WrongWeek {
        match_id: MatchId,
        week: u32,
        current_week: u32,
    },

    #[error("match {0} appears more than once in the submission")]
    DuplicateResult(MatchId),

    #[error("no results submitted")]
    NoResults,

    #[error("season of league {league_id} is complete ({max_weeks} weeks played)")]
    SeasonComplete { league_id: LeagueId, max_weeks: u32 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NotFound {
    #[error("league {0} not found")]
    League(LeagueId),

    #[error("team {0} not found")]
    Team(TeamId),

    #[error("match {0} not found")]
    Match(MatchId),

    #[error("no matches found for league {0} in week {1}")]
    Week(LeagueId, u32),

    #[error("no weekly log found for league {0} in week {1}")]
    WeeklyLog(LeagueId, u32),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulingFailure {
    #[error("a round-robin schedule needs an even number of teams, got {0}")]
    OddTeams(usize),

    #[error("a round-robin schedule needs at least 2 teams, got {0}")]
    TooFewTeams(usize),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimationUnavailable {
    #[error("championship estimation is only available after week {threshold} (league is in week {week})")]
    TooEarly { week: u32, threshold: u32 },

    #[error("no team stats present for league {0}")]
    NoTeamStats(LeagueId),

    #[error("no championship estimation has been computed for league {0}")]
    NotComputed(LeagueId),

    #[error("estimation deadline of {deadline:?} exceeded after {completed} of {trials} trials")]
    DeadlineExceeded {
        deadline: Duration,
        completed: u64,
        trials: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("match {0} has already been played")]
pub struct AlreadyPlayed(pub MatchId);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    #[error("{0}")]
    NotFound(#[from] NotFound),

    #[error("storage failure: {0}")]
    Backend(String),
}

impl LeagueError {
    /// An HTTP-style status code for the failure kind.
    pub fn status(&self) -> u16 {
        match self {
            LeagueError::Validation(_) => 400,
            LeagueError::NotFound(_) => 404,
            LeagueError::AlreadyPlayed(_) => 409,
            LeagueError::Scheduling(_) => 422,
            LeagueError::EstimationUnavailable(_) => 503,
            LeagueError::Storage(_) => 500,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LeagueError::Validation(_) => "validation",
            LeagueError::NotFound(_) => "not_found",
            LeagueError::AlreadyPlayed(_) => "already_played",
            LeagueError::Scheduling(_) => "scheduling_failure",
            LeagueError::EstimationUnavailable(_) => "estimation_unavailable",
            LeagueError::Storage(_) => "storage",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_not_found_lifts_verbatim() {
        let err = LeagueError::from(StorageError::NotFound(NotFound::League(LeagueId(9))));
        assert!(matches!(err, LeagueError::NotFound(NotFound::League(LeagueId(9)))));
        assert_eq!("league l9 not found", err.to_string());
        assert_eq!(404, err.status());
    }

    #[test]
    fn backend_failure_is_internal() {
        let err = LeagueError::from(StorageError::Backend("disk full".into()));
        assert_eq!(500, err.status());
        assert_eq!("storage", err.kind());
    }
}
