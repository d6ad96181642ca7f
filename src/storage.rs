//! Durable records of leagues, teams, matches, statistics, estimations and weekly logs.
//!
//! [Storage] is the seam between the simulation and whatever holds its records. [MemoryStore]
//! keeps everything in memory behind a single lock, and can be exported to and restored from a
//! serialisable [StoreSnapshot].

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::domain::{
    ChampionshipEstimation, League, LeagueId, Match, MatchId, Team, TeamId, TeamStats, WeeklyLog,
};
use crate::error::{NotFound, StorageError};
use crate::fixture::Fixture;

/// Everything needed to create a league in one step. Fixtures refer to teams by their position
/// in `teams`.
#[derive(Debug, Clone, PartialEq)]
pub struct LeagueDraft {
    pub name: String,
    pub teams: Vec<TeamDraft>,
    pub fixtures: Vec<Fixture<usize>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamDraft {
    pub name: String,
    pub strength: u32,
}

pub trait Storage: Send + Sync {
    /// Creates the league together with its teams, zeroed team stats and full fixture list.
    /// Either everything is written or nothing is.
    fn create_league(&self, draft: LeagueDraft) -> Result<League, StorageError>;

    fn league(&self, id: LeagueId) -> Result<League, StorageError>;

    fn leagues(&self) -> Result<Vec<League>, StorageError>;

    fn matches_by_week(&self, league: LeagueId, week: u32) -> Result<Vec<Match>, StorageError>;

    fn matches_by_league(&self, league: LeagueId) -> Result<Vec<Match>, StorageError>;

    fn match_by_id(&self, id: MatchId) -> Result<Match, StorageError>;

    fn teams_by_league(&self, league: LeagueId) -> Result<Vec<Team>, StorageError>;

    fn team(&self, id: TeamId) -> Result<Team, StorageError>;

    fn team_stats_by_league(&self, league: LeagueId) -> Result<Vec<TeamStats>, StorageError>;

    fn save_match_result(&self, played: &Match) -> Result<(), StorageError>;

    fn update_team_stats(&self, stats: &[TeamStats]) -> Result<(), StorageError>;

    /// Replaces the league's estimation set, and mirrors each probability onto the team's stats.
    fn update_championship_estimations(
        &self,
        league: LeagueId,
        estimations: &[ChampionshipEstimation],
    ) -> Result<(), StorageError>;

    /// The most recently stored estimation set, if any.
    fn championship_estimations(
        &self,
        league: LeagueId,
    ) -> Result<Option<Vec<ChampionshipEstimation>>, StorageError>;

    fn increment_league_week(&self, league: LeagueId) -> Result<League, StorageError>;

    fn save_weekly_snapshot(
        &self,
        league: LeagueId,
        week: u32,
        team_stats_json: String,
    ) -> Result<WeeklyLog, StorageError>;

    fn weekly_snapshot(&self, league: LeagueId, week: u32) -> Result<WeeklyLog, StorageError>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub leagues: Vec<League>,
    pub teams: Vec<Team>,
    pub team_stats: Vec<TeamStats>,
    pub matches: Vec<Match>,
    pub estimations: Vec<ChampionshipEstimation>,
    pub weekly_logs: Vec<WeeklyLog>,
}

#[derive(Debug, Default)]
struct Tables {
    leagues: FxHashMap<LeagueId, League>,
    teams: FxHashMap<TeamId, Team>,
    team_stats: FxHashMap<TeamId, TeamStats>,
    matches: FxHashMap<MatchId, Match>,
    estimations: FxHashMap<LeagueId, Vec<ChampionshipEstimation>>,
    weekly_logs: FxHashMap<(LeagueId, u32), WeeklyLog>,
    last_league: u32,
    last_team: u32,
    last_match: u32,
}
impl Tables {
    fn league_mut(&mut self, id: LeagueId) -> Result<&mut League, StorageError> {
        Ok(self.leagues.get_mut(&id).ok_or(NotFound::League(id))?)
    }

    fn require_league(&self, id: LeagueId) -> Result<&League, StorageError> {
        Ok(self.leagues.get(&id).ok_or(NotFound::League(id))?)
    }

    fn team_ids(&self, league: LeagueId) -> Vec<TeamId> {
        let mut ids: Vec<_> = self
            .teams
            .values()
            .filter(|team| team.league_id == league)
            .map(|team| team.id)
            .collect();
        ids.sort();
        ids
    }

    fn sorted_matches(&self, mut filter: impl FnMut(&Match) -> bool) -> Vec<Match> {
        let mut matches: Vec<_> = self
            .matches
            .values()
            .filter(|m| filter(m))
            .cloned()
            .collect();
        matches.sort_by_key(|m| (m.week, m.id));
        matches
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}
impl MemoryStore {
    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables
            .lock()
            .map_err(|_| StorageError::Backend("store lock poisoned".into()))
    }

    pub fn snapshot(&self) -> Result<StoreSnapshot, StorageError> {
        let tables = self.tables()?;
        let mut snapshot = StoreSnapshot {
            leagues: tables.leagues.values().cloned().collect(),
            teams: tables.teams.values().cloned().collect(),
            team_stats: tables.team_stats.values().cloned().collect(),
            matches: tables.matches.values().cloned().collect(),
            estimations: tables.estimations.values().flatten().cloned().collect(),
            weekly_logs: tables.weekly_logs.values().cloned().collect(),
        };
        snapshot.leagues.sort_by_key(|league| league.id);
        snapshot.teams.sort_by_key(|team| team.id);
        snapshot.team_stats.sort_by_key(|stats| stats.team_id);
        snapshot.matches.sort_by_key(|m| m.id);
        snapshot
            .estimations
            .sort_by_key(|estimation| (estimation.league_id, estimation.team_id));
        snapshot
            .weekly_logs
            .sort_by_key(|log| (log.league_id, log.week));
        Ok(snapshot)
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let mut tables = Tables {
            last_league: last_id(snapshot.leagues.iter().map(|league| league.id.0)),
            last_team: last_id(snapshot.teams.iter().map(|team| team.id.0)),
            last_match: last_id(snapshot.matches.iter().map(|m| m.id.0)),
            ..Tables::default()
        };
        tables.leagues = snapshot.leagues.into_iter().map(|league| (league.id, league)).collect();
        tables.teams = snapshot.teams.into_iter().map(|team| (team.id, team)).collect();
        tables.team_stats = snapshot
            .team_stats
            .into_iter()
            .map(|stats| (stats.team_id, stats))
            .collect();
        tables.matches = snapshot.matches.into_iter().map(|m| (m.id, m)).collect();
        for estimation in snapshot.estimations {
            tables
                .estimations
                .entry(estimation.league_id)
                .or_default()
                .push(estimation);
        }
        tables.weekly_logs = snapshot
            .weekly_logs
            .into_iter()
            .map(|log| ((log.league_id, log.week), log))
            .collect();
        Self {
            tables: Mutex::new(tables),
        }
    }
}

fn last_id(ids: impl Iterator<Item = u32>) -> u32 {
    ids.max().unwrap_or(0)
}

impl Storage for MemoryStore {
    fn create_league(&self, draft: LeagueDraft) -> Result<League, StorageError> {
        let team_count = draft.teams.len();
        if let Some(stray) = draft
            .fixtures
            .iter()
            .flat_map(|fixture| [fixture.home, fixture.away])
            .find(|&position| position >= team_count)
        {
            return Err(StorageError::Backend(format!(
                "fixture refers to team {stray} of {team_count}"
            )));
        }

        let mut tables = self.tables()?;
        tables.last_league += 1;
        let league_id = LeagueId(tables.last_league);
        let league = League {
            id: league_id,
            name: draft.name,
            team_count: team_count as u32,
            max_weeks: League::max_weeks_for(team_count as u32),
            current_week: 1,
        };

        let mut team_ids = Vec::with_capacity(team_count);
        for team in draft.teams {
            tables.last_team += 1;
            let id = TeamId(tables.last_team);
            team_ids.push(id);
            tables.teams.insert(
                id,
                Team {
                    id,
                    league_id,
                    name: team.name,
                    strength: team.strength,
                },
            );
            tables.team_stats.insert(id, TeamStats::new(id));
        }

        for fixture in draft.fixtures {
            tables.last_match += 1;
            let id = MatchId(tables.last_match);
            tables.matches.insert(
                id,
                Match {
                    id,
                    league_id,
                    week: fixture.week,
                    home: team_ids[fixture.home],
                    away: team_ids[fixture.away],
                    home_score: 0,
                    away_score: 0,
                    played: false,
                    result: None,
                },
            );
        }

        tables.leagues.insert(league_id, league.clone());
        Ok(league)
    }

    fn league(&self, id: LeagueId) -> Result<League, StorageError> {
        Ok(self.tables()?.require_league(id)?.clone())
    }

    fn leagues(&self) -> Result<Vec<League>, StorageError> {
        let mut leagues: Vec<_> = self.tables()?.leagues.values().cloned().collect();
        leagues.sort_by_key(|league| league.id);
        Ok(leagues)
    }

    fn matches_by_week(&self, league: LeagueId, week: u32) -> Result<Vec<Match>, StorageError> {
        let tables = self.tables()?;
        tables.require_league(league)?;
        Ok(tables.sorted_matches(|m| m.league_id == league && m.week == week))
    }

    fn matches_by_league(&self, league: LeagueId) -> Result<Vec<Match>, StorageError> {
        let tables = self.tables()?;
        tables.require_league(league)?;
        Ok(tables.sorted_matches(|m| m.league_id == league))
    }

    fn match_by_id(&self, id: MatchId) -> Result<Match, StorageError> {
        let tables = self.tables()?;
        Ok(tables.matches.get(&id).cloned().ok_or(NotFound::Match(id))?)
    }

    fn teams_by_league(&self, league: LeagueId) -> Result<Vec<Team>, StorageError> {
        let tables = self.tables()?;
        tables.require_league(league)?;
        Ok(tables
            .team_ids(league)
            .into_iter()
            .filter_map(|id| tables.teams.get(&id).cloned())
            .collect())
    }

    fn team(&self, id: TeamId) -> Result<Team, StorageError> {
        let tables = self.tables()?;
        Ok(tables.teams.get(&id).cloned().ok_or(NotFound::Team(id))?)
    }

    fn team_stats_by_league(&self, league: LeagueId) -> Result<Vec<TeamStats>, StorageError> {
        let tables = self.tables()?;
        tables.require_league(league)?;
        Ok(tables
            .team_ids(league)
            .into_iter()
            .filter_map(|id| tables.team_stats.get(&id).cloned())
            .collect())
    }

    fn save_match_result(&self, played: &Match) -> Result<(), StorageError> {
        let mut tables = self.tables()?;
        let stored = tables
            .matches
            .get_mut(&played.id)
            .ok_or(NotFound::Match(played.id))?;
        stored.home_score = played.home_score;
        stored.away_score = played.away_score;
        stored.played = played.played;
        stored.result = played.result;
        Ok(())
    }

    fn update_team_stats(&self, stats: &[TeamStats]) -> Result<(), StorageError> {
        let mut tables = self.tables()?;
        if let Some(unknown) = stats
            .iter()
            .find(|stats| !tables.team_stats.contains_key(&stats.team_id))
        {
            return Err(NotFound::Team(unknown.team_id).into());
        }
        for stats in stats {
            tables.team_stats.insert(stats.team_id, stats.clone());
        }
        Ok(())
    }

    fn update_championship_estimations(
        &self,
        league: LeagueId,
        estimations: &[ChampionshipEstimation],
    ) -> Result<(), StorageError> {
        let mut tables = self.tables()?;
        tables.require_league(league)?;
        for estimation in estimations {
            if let Some(stats) = tables.team_stats.get_mut(&estimation.team_id) {
                stats.championship_estimation = estimation.probability;
            }
        }
        tables.estimations.insert(league, estimations.to_vec());
        Ok(())
    }

    fn championship_estimations(
        &self,
        league: LeagueId,
    ) -> Result<Option<Vec<ChampionshipEstimation>>, StorageError> {
        let tables = self.tables()?;
        tables.require_league(league)?;
        Ok(tables.estimations.get(&league).cloned())
    }

    fn increment_league_week(&self, league: LeagueId) -> Result<League, StorageError> {
        let mut tables = self.tables()?;
        let league = tables.league_mut(league)?;
        league.current_week += 1;
        Ok(league.clone())
    }

    fn save_weekly_snapshot(
        &self,
        league: LeagueId,
        week: u32,
        team_stats_json: String,
    ) -> Result<WeeklyLog, StorageError> {
        let mut tables = self.tables()?;
        tables.require_league(league)?;
        let log = WeeklyLog {
            league_id: league,
            week,
            team_stats_json,
            recorded_at: Utc::now(),
        };
        tables.weekly_logs.insert((league, week), log.clone());
        Ok(log)
    }

    fn weekly_snapshot(&self, league: LeagueId, week: u32) -> Result<WeeklyLog, StorageError> {
        let tables = self.tables()?;
        tables.require_league(league)?;
        Ok(tables
            .weekly_logs
            .get(&(league, week))
            .cloned()
            .ok_or(NotFound::WeeklyLog(league, week))?)
    }
}

#[cfg(test)]
mod tests;
