//! Week-by-week progression of a league.
//!
//! [SeasonOrchestrator] is the only writer of live league state. Every mutating operation runs
//! under a per-league lock, so results for the same league are never applied concurrently, while
//! separate leagues progress independently.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use rayon::ThreadPoolBuildError;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use tinyrand::{Rand, Seeded, StdRand};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::{
    ChampionshipEstimation, League, LeagueId, LeagueState, Match, MatchId, Score, Team, TeamId,
    TeamStats, WeeklyLog, STRENGTH_RANGE,
};
use crate::dto::{LeagueCreateRequest, UserPlayedMatch};
use crate::error::{AlreadyPlayed, EstimationUnavailable, LeagueError, NotFound, ValidationError};
use crate::estimator::ChampionshipEstimator;
use crate::fixture;
use crate::outcome;
use crate::standings::{self, Standings};
use crate::storage::{LeagueDraft, Storage, TeamDraft};
use crate::timed::Timed;

/// The outcome of resolving one week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekReport {
    pub league_id: LeagueId,
    pub week: u32,
    pub matches: Vec<Match>,
    /// Team stats after the week, in table order.
    pub standings: Vec<TeamStats>,
    /// Present when an estimate was computed for this week.
    pub estimations: Option<Vec<ChampionshipEstimation>>,
    /// Present once the final week has been resolved.
    pub champion: Option<TeamId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueOverview {
    pub league: League,
    pub teams: Vec<Team>,
    pub standings: Vec<TeamStats>,
}

pub struct SeasonOrchestrator<S: Storage> {
    store: S,
    config: Config,
    estimator: ChampionshipEstimator,
    rand: Mutex<StdRand>,
    locks: Mutex<FxHashMap<LeagueId, Arc<Mutex<()>>>>,
}

impl<S: Storage> SeasonOrchestrator<S> {
    pub fn new(store: S, config: Config) -> Result<Self, ThreadPoolBuildError> {
        let seed = config.seed.unwrap_or_else(clock_seed);
        debug!("master seed {seed}");
        let estimator = ChampionshipEstimator::new(config.estimator.clone())?;
        Ok(Self {
            store,
            config,
            estimator,
            rand: Mutex::new(StdRand::seed(seed)),
            locks: Mutex::default(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn create_league(&self, request: &LeagueCreateRequest) -> Result<League, LeagueError> {
        let teams = validate_league_request(request)?;
        let positions: Vec<_> = (0..teams.len()).collect();
        let fixtures = fixture::generate(&positions)?;
        let league = self.store.create_league(LeagueDraft {
            name: request.name.trim().to_string(),
            teams,
            fixtures,
        })?;
        info!(
            "created league {} '{}' with {} teams over {} weeks",
            league.id, league.name, league.team_count, league.max_weeks
        );
        Ok(league)
    }

    /// Resolves every unplayed match of the league's current week, then advances the week.
    pub fn simulate_week(&self, league_id: LeagueId) -> Result<WeekReport, LeagueError> {
        let lock = self.league_lock(league_id)?;
        let _guard = lock.lock().map_err(|_| poisoned())?;
        let league = self.open_league(league_id)?;
        self.resolve_week(&league, &FxHashMap::default())
    }

    /// Resolves weeks until the season is complete, returning one report per week.
    pub fn play_remaining_weeks(&self, league_id: LeagueId) -> Result<Vec<WeekReport>, LeagueError> {
        let lock = self.league_lock(league_id)?;
        let _guard = lock.lock().map_err(|_| poisoned())?;
        let mut league = self.open_league(league_id)?;
        let mut reports = Vec::with_capacity((league.max_weeks + 1 - league.current_week) as usize);
        loop {
            reports.push(self.resolve_week(&league, &FxHashMap::default())?);
            league = self.store.league(league_id)?;
            if league.is_complete() {
                break;
            }
        }
        Ok(reports)
    }

    /// Applies user-supplied scores to matches of a league's current week. Matches of that week
    /// left without a result are simulated, after which the week closes as usual. Every entry is
    /// validated before anything is written.
    pub fn record_user_results(
        &self,
        results: &[UserPlayedMatch],
    ) -> Result<WeekReport, LeagueError> {
        let Some(first) = results.first() else {
            return Err(ValidationError::NoResults.into());
        };
        let league_id = first.league_id;
        let mut seen = FxHashSet::default();
        for result in results {
            if result.league_id != league_id {
                return Err(ValidationError::MixedLeagues(league_id, result.league_id).into());
            }
            if result.home_score < 0 || result.away_score < 0 {
                return Err(ValidationError::NegativeScore {
                    match_id: result.match_id,
                    home: result.home_score,
                    away: result.away_score,
                }
                .into());
            }
            if result.home_team_id == result.away_team_id {
                return Err(ValidationError::SelfMatch {
                    match_id: result.match_id,
                    team: result.home_team_id,
                }
                .into());
            }
            if !seen.insert(result.match_id) {
                return Err(ValidationError::DuplicateResult(result.match_id).into());
            }
        }

        let lock = self.league_lock(league_id)?;
        let _guard = lock.lock().map_err(|_| poisoned())?;
        let league = self.open_league(league_id)?;
        let mut scores = FxHashMap::default();
        for result in results {
            let fixture = self.store.match_by_id(result.match_id)?;
            if fixture.league_id != league_id {
                return Err(ValidationError::MixedLeagues(league_id, fixture.league_id).into());
            }
            if fixture.week != league.current_week || result.week != league.current_week {
                return Err(ValidationError::WrongWeek {
                    match_id: fixture.id,
                    week: fixture.week,
                    current_week: league.current_week,
                }
                .into());
            }
            if fixture.home != result.home_team_id || fixture.away != result.away_team_id {
                return Err(ValidationError::FixtureMismatch {
                    match_id: fixture.id,
                    home: result.home_team_id,
                    away: result.away_team_id,
                    actual_home: fixture.home,
                    actual_away: fixture.away,
                }
                .into());
            }
            if fixture.played {
                return Err(AlreadyPlayed(fixture.id).into());
            }
            // non-negative by the checks above
            let score = Score::new(result.home_score as u32, result.away_score as u32);
            scores.insert(fixture.id, score);
        }
        info!(
            "recording {} user results for league {league_id} week {}",
            scores.len(),
            league.current_week
        );
        self.resolve_week(&league, &scores)
    }

    /// The most recently computed estimation set.
    pub fn championship_estimations(
        &self,
        league_id: LeagueId,
    ) -> Result<Vec<ChampionshipEstimation>, LeagueError> {
        let league = self.store.league(league_id)?;
        let threshold = self.config.estimation_after_week;
        if league.current_week <= threshold {
            return Err(EstimationUnavailable::TooEarly {
                week: league.current_week,
                threshold,
            }
            .into());
        }
        Ok(self
            .store
            .championship_estimations(league_id)?
            .ok_or(EstimationUnavailable::NotComputed(league_id))?)
    }

    pub fn league_overview(&self, league_id: LeagueId) -> Result<LeagueOverview, LeagueError> {
        Ok(LeagueOverview {
            league: self.store.league(league_id)?,
            teams: self.store.teams_by_league(league_id)?,
            standings: self.standings(league_id)?,
        })
    }

    pub fn leagues(&self) -> Result<Vec<League>, LeagueError> {
        Ok(self.store.leagues()?)
    }

    pub fn teams(&self, league_id: LeagueId) -> Result<Vec<Team>, LeagueError> {
        Ok(self.store.teams_by_league(league_id)?)
    }

    /// Matches of the league, optionally restricted to one week.
    pub fn matches(&self, league_id: LeagueId, week: Option<u32>) -> Result<Vec<Match>, LeagueError> {
        Ok(match week {
            Some(week) => self.store.matches_by_week(league_id, week)?,
            None => self.store.matches_by_league(league_id)?,
        })
    }

    pub fn weekly_log(&self, league_id: LeagueId, week: u32) -> Result<WeeklyLog, LeagueError> {
        Ok(self.store.weekly_snapshot(league_id, week)?)
    }

    /// Team stats in table order.
    pub fn standings(&self, league_id: LeagueId) -> Result<Vec<TeamStats>, LeagueError> {
        Ok(standings::rank(&self.store.team_stats_by_league(league_id)?))
    }

    fn open_league(&self, league_id: LeagueId) -> Result<League, LeagueError> {
        let league = self.store.league(league_id)?;
        if league.is_complete() {
            return Err(ValidationError::SeasonComplete {
                league_id,
                max_weeks: league.max_weeks,
            }
            .into());
        }
        Ok(league)
    }

    /// Plays the current week, taking scores from `supplied` where present and simulating the
    /// rest, then runs the closing sequence: stats, estimation, weekly log, week advance. The
    /// caller holds the league lock.
    fn resolve_week(
        &self,
        league: &League,
        supplied: &FxHashMap<MatchId, Score>,
    ) -> Result<WeekReport, LeagueError> {
        let week = league.current_week;
        let teams = self.store.teams_by_league(league.id)?;
        let strengths: FxHashMap<_, _> = teams.iter().map(|team| (team.id, team.strength)).collect();
        let mut standings = Standings::new(self.store.team_stats_by_league(league.id)?);
        let mut matches = self.store.matches_by_week(league.id, week)?;
        let mut rand = StdRand::seed(self.next_seed()?);

        for fixture in matches.iter_mut().filter(|fixture| !fixture.played) {
            let score = match supplied.get(&fixture.id) {
                Some(&score) => score,
                None => {
                    let form_factor = standings
                        .get(fixture.home)
                        .zip(standings.get(fixture.away))
                        .map_or(1.0, |(home, away)| outcome::form_factor(home, away));
                    outcome::simulate(
                        strength_of(&strengths, fixture.home)?,
                        strength_of(&strengths, fixture.away)?,
                        form_factor,
                        &mut rand,
                    )
                }
            };
            standings.apply_result(fixture, score)?;
            debug!(
                "week {week}: {} {} {} ({})",
                fixture.home,
                score,
                fixture.away,
                fixture.id
            );
        }
        debug_assert_eq!(Ok(()), standings.validate());

        for fixture in &matches {
            self.store.save_match_result(fixture)?;
        }
        self.store.update_team_stats(standings.stats())?;
        info!("league {} week {week}: resolved {} matches", league.id, matches.len());

        let estimations = if week > self.config.estimation_after_week {
            self.estimate(league, teams, standings.into_stats())?
        } else {
            None
        };

        let stats = self.store.team_stats_by_league(league.id)?;
        let stats_json = serde_json::to_string(&stats)
            .map_err(|err| LeagueError::Storage(format!("serialising weekly log: {err}")))?;
        self.store.save_weekly_snapshot(league.id, week, stats_json)?;

        let advanced = self.store.increment_league_week(league.id)?;
        let standings = standings::rank(&stats);
        let champion = if advanced.is_complete() {
            let champion = standings.first().map(|stats| stats.team_id);
            if let Some(champion) = champion {
                info!("league {} complete: champion {champion}", league.id);
            }
            champion
        } else {
            None
        };

        Ok(WeekReport {
            league_id: league.id,
            week,
            matches,
            standings,
            estimations,
            champion,
        })
    }

    /// Runs the estimator over the remaining schedule and stores the result. An unavailable
    /// estimate leaves the previous set in place.
    fn estimate(
        &self,
        league: &League,
        teams: Vec<Team>,
        team_stats: Vec<TeamStats>,
    ) -> Result<Option<Vec<ChampionshipEstimation>>, LeagueError> {
        let remaining_matches: Vec<_> = self
            .store
            .matches_by_league(league.id)?
            .into_iter()
            .filter(|fixture| !fixture.played)
            .collect();
        let state = LeagueState {
            league_id: league.id,
            week: league.current_week,
            teams,
            remaining_matches,
            team_stats,
        };
        let seed = self.next_seed()?;
        match Timed::result(|| self.estimator.estimate(&state, seed)) {
            Ok(timed) => {
                info!(
                    "league {} week {}: estimated championship over {} remaining matches in {:.3}ms",
                    league.id,
                    league.current_week,
                    state.remaining_matches.len(),
                    timed.elapsed_ms()
                );
                self.store
                    .update_championship_estimations(league.id, &timed.value)?;
                Ok(Some(timed.value))
            }
            Err(err) => {
                warn!("league {}: estimation skipped: {err}", league.id);
                Ok(None)
            }
        }
    }

    fn next_seed(&self) -> Result<u64, LeagueError> {
        let mut rand = self.rand.lock().map_err(|_| poisoned())?;
        Ok(rand.next_u64())
    }

    /// The lock serialising writes to `league_id`. Only existing leagues acquire an entry; leagues
    /// are never removed, so the map is bounded by the number of leagues created.
    fn league_lock(&self, league_id: LeagueId) -> Result<Arc<Mutex<()>>, LeagueError> {
        self.store.league(league_id)?;
        let mut locks = self.locks.lock().map_err(|_| poisoned())?;
        Ok(locks.entry(league_id).or_default().clone())
    }
}

fn validate_league_request(request: &LeagueCreateRequest) -> Result<Vec<TeamDraft>, ValidationError> {
    if request.name.trim().is_empty() {
        return Err(ValidationError::EmptyLeagueName);
    }
    if request.team_count < 2 {
        return Err(ValidationError::TooFewTeams(request.team_count));
    }
    if request.team_count % 2 != 0 {
        return Err(ValidationError::OddTeamCount(request.team_count));
    }
    if request.teams.len() != request.team_count as usize {
        return Err(ValidationError::TeamCountMismatch {
            expected: request.team_count,
            actual: request.teams.len(),
        });
    }

    let mut names = FxHashSet::default();
    let mut teams = Vec::with_capacity(request.teams.len());
    for team in &request.teams {
        let name = team.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyTeamName);
        }
        if !names.insert(name.to_lowercase()) {
            return Err(ValidationError::DuplicateTeamName(name.to_string()));
        }
        let strength = u32::try_from(team.strength)
            .ok()
            .filter(|strength| STRENGTH_RANGE.contains(strength))
            .ok_or_else(|| ValidationError::StrengthOutOfRange {
                team: name.to_string(),
                strength: team.strength,
                min: *STRENGTH_RANGE.start(),
                max: *STRENGTH_RANGE.end(),
            })?;
        teams.push(TeamDraft {
            name: name.to_string(),
            strength,
        });
    }
    Ok(teams)
}

fn strength_of(strengths: &FxHashMap<TeamId, u32>, team: TeamId) -> Result<u32, LeagueError> {
    strengths
        .get(&team)
        .copied()
        .ok_or_else(|| NotFound::Team(team).into())
}

fn clock_seed() -> u64 {
    let now = Utc::now();
    now.timestamp_nanos_opt()
        .map(|nanos| nanos as u64)
        .unwrap_or_else(|| now.timestamp_micros() as u64)
}

fn poisoned() -> LeagueError {
    LeagueError::Storage("league lock poisoned".into())
}
