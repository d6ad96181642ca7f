//! Request and response shapes exchanged with the presentation layer.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::domain::{ChampionshipEstimation, League, LeagueId, Match, MatchId, Team, TeamId, TeamStats};
use crate::error::LeagueError;
use crate::season::{LeagueOverview, WeekReport};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueCreateRequest {
    pub name: String,
    pub team_count: u32,
    pub teams: Vec<TeamRequest>,
}

/// Strength is signed so that out-of-range input, negative values included, reaches validation
/// rather than failing to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRequest {
    pub name: String,
    pub strength: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPlayedMatch {
    pub league_id: LeagueId,
    pub week: u32,
    pub match_id: MatchId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub home_score: i64,
    pub away_score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueResponse {
    pub id: LeagueId,
    pub name: String,
    pub team_count: u32,
    pub max_weeks: u32,
    pub curr_week: u32,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub teams: Vec<TeamResponse>,
}
impl LeagueResponse {
    pub fn new(league: League, teams: Vec<TeamResponse>) -> Self {
        Self {
            id: league.id,
            name: league.name,
            team_count: league.team_count,
            max_weeks: league.max_weeks,
            curr_week: league.current_week,
            teams,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamResponse {
    pub id: TeamId,
    pub league_id: LeagueId,
    pub name: String,
    pub strength: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stats: Option<TeamStats>,
}
impl TeamResponse {
    pub fn new(team: Team, stats: Option<TeamStats>) -> Self {
        Self {
            id: team.id,
            league_id: team.league_id,
            name: team.name,
            strength: team.strength,
            stats,
        }
    }
}

impl From<LeagueOverview> for LeagueResponse {
    fn from(overview: LeagueOverview) -> Self {
        let mut stats: FxHashMap<_, _> = overview
            .standings
            .into_iter()
            .map(|stats| (stats.team_id, stats))
            .collect();
        let teams = overview
            .teams
            .into_iter()
            .map(|team| {
                let stats = stats.remove(&team.id);
                TeamResponse::new(team, stats)
            })
            .collect();
        LeagueResponse::new(overview.league, teams)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResponse {
    pub league_id: LeagueId,
    pub week: u32,
    pub team_id: TeamId,
    pub team_name: String,
    pub estimation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionResponse {
    pub team_id: TeamId,
    pub league_id: LeagueId,
    pub team_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekResponse {
    pub league_id: LeagueId,
    pub week: u32,
    pub matches: Vec<Match>,
    pub team_stats: Vec<TeamStats>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub estimations: Option<Vec<EstimationResponse>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub champion: Option<ChampionResponse>,
}

/// Resolves team ids to names for the response shapes that carry both.
pub struct TeamNames(FxHashMap<TeamId, String>);
impl TeamNames {
    pub fn new(teams: &[Team]) -> Self {
        Self(teams.iter().map(|team| (team.id, team.name.clone())).collect())
    }

    pub fn get(&self, team: TeamId) -> String {
        self.0
            .get(&team)
            .cloned()
            .unwrap_or_else(|| team.to_string())
    }

    pub fn estimations(&self, estimations: Vec<ChampionshipEstimation>) -> Vec<EstimationResponse> {
        estimations
            .into_iter()
            .map(|estimation| EstimationResponse {
                league_id: estimation.league_id,
                week: estimation.week,
                team_id: estimation.team_id,
                team_name: self.get(estimation.team_id),
                estimation: estimation.probability,
            })
            .collect()
    }

    pub fn week(&self, report: WeekReport) -> WeekResponse {
        WeekResponse {
            league_id: report.league_id,
            week: report.week,
            matches: report.matches,
            team_stats: report.standings,
            estimations: report.estimations.map(|estimations| self.estimations(estimations)),
            champion: report.champion.map(|team_id| ChampionResponse {
                team_id,
                league_id: report.league_id,
                team_name: self.get(team_id),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub kind: String,
    pub message: String,
}
impl From<&LeagueError> for ErrorResponse {
    fn from(err: &LeagueError) -> Self {
        Self {
            status: err.status(),
            kind: err.kind().into(),
            message: err.to_string(),
        }
    }
}
