//! Monte Carlo estimation of championship probabilities.
//!
//! Each trial plays out the remaining schedule against its own copy of the standings, driven by
//! its own generator, and votes for the team that tops the resulting table. A team's probability
//! is the share of votes it receives. Trial seeds are drawn up front from a single master
//! generator, so a fixed master seed reproduces the estimate regardless of how many workers
//! share the trials.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tinyrand::{Rand, Seeded, StdRand};
use tracing::debug;

use crate::domain::{ChampionshipEstimation, LeagueState, TeamId, TeamStats};
use crate::error::EstimationUnavailable;
use crate::outcome;
use crate::standings;

pub const DEFAULT_TRIALS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub trials: u64,

    /// Worker threads; the available parallelism when unset.
    pub threads: Option<usize>,

    /// Master seed for trial seeds. When unset, the caller supplies one per run.
    pub seed: Option<u64>,

    pub deadline_ms: Option<u64>,
}
impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            threads: None,
            seed: None,
            deadline_ms: None,
        }
    }
}

/// A remaining match, resolved to standings positions and strengths.
#[derive(Debug, Clone, Copy)]
struct Pairing {
    home: usize,
    away: usize,
    home_strength: u32,
    away_strength: u32,
}

pub struct ChampionshipEstimator {
    config: EstimatorConfig,
    pool: ThreadPool,
}
impl ChampionshipEstimator {
    pub fn new(config: EstimatorConfig) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads.unwrap_or(0))
            .thread_name(|index| format!("estimator-{index}"))
            .build()?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Estimates every team's championship probability from `state`. The configured seed, when
    /// present, takes precedence over `master_seed`.
    pub fn estimate(
        &self,
        state: &LeagueState,
        master_seed: u64,
    ) -> Result<Vec<ChampionshipEstimation>, EstimationUnavailable> {
        if state.team_stats.is_empty() {
            return Err(EstimationUnavailable::NoTeamStats(state.league_id));
        }
        let base = &state.team_stats;
        let pairings = resolve_pairings(state)?;

        let votes = if pairings.is_empty() {
            let mut votes = vec![0; base.len()];
            if let Some(leader) = leader_position(base) {
                votes[leader] = 1;
            }
            votes
        } else {
            let seed = self.config.seed.unwrap_or(master_seed);
            self.run_trials(base, &pairings, seed)?
        };

        let total: u64 = votes.iter().sum();
        Ok(base
            .iter()
            .zip(votes)
            .map(|(stats, votes)| ChampionshipEstimation {
                league_id: state.league_id,
                week: state.week,
                team_id: stats.team_id,
                probability: votes as f64 / total as f64,
            })
            .collect())
    }

    fn run_trials(
        &self,
        base: &[TeamStats],
        pairings: &[Pairing],
        master_seed: u64,
    ) -> Result<Vec<u64>, EstimationUnavailable> {
        let trials = self.config.trials.max(1);
        let mut master = StdRand::seed(master_seed);
        let seeds: Vec<u64> = (0..trials).map(|_| master.next_u64()).collect();
        let deadline = self.config.deadline_ms.map(Duration::from_millis);
        let expired = AtomicBool::new(false);
        let teams = base.len();
        debug!(
            "running {trials} trials over {} remaining matches on {} threads",
            pairings.len(),
            self.threads()
        );

        let start_time = Instant::now();
        let votes = self.pool.install(|| {
            seeds
                .par_iter()
                .fold(
                    || vec![0u64; teams],
                    |mut votes, &seed| {
                        if expired.load(Ordering::Relaxed) {
                            return votes;
                        }
                        if let Some(deadline) = deadline {
                            if start_time.elapsed() >= deadline {
                                expired.store(true, Ordering::Relaxed);
                                return votes;
                            }
                        }
                        if let Some(champion) = run_trial(base, pairings, seed) {
                            votes[champion] += 1;
                        }
                        votes
                    },
                )
                .reduce(
                    || vec![0u64; teams],
                    |mut left, right| {
                        for (left, right) in left.iter_mut().zip(right) {
                            *left += right;
                        }
                        left
                    },
                )
        });
        let elapsed = start_time.elapsed();

        let completed: u64 = votes.iter().sum();
        if let (true, Some(deadline)) = (expired.load(Ordering::Relaxed), deadline) {
            return Err(EstimationUnavailable::DeadlineExceeded {
                deadline,
                completed,
                trials,
            });
        }
        debug!("completed {completed} trials in {elapsed:?}");
        Ok(votes)
    }
}

/// Plays out one trial, returning the position of its champion.
fn run_trial(base: &[TeamStats], pairings: &[Pairing], seed: u64) -> Option<usize> {
    let mut rand = StdRand::seed(seed);
    let mut stats = base.to_vec();
    for pairing in pairings {
        let form_factor = outcome::form_factor(&stats[pairing.home], &stats[pairing.away]);
        let score = outcome::simulate(
            pairing.home_strength,
            pairing.away_strength,
            form_factor,
            &mut rand,
        );
        standings::apply_to(&mut stats, pairing.home, pairing.away, score);
    }
    leader_position(&stats)
}

fn leader_position(stats: &[TeamStats]) -> Option<usize> {
    stats
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| standings::table_order(a, b))
        .map(|(position, _)| position)
}

fn resolve_pairings(state: &LeagueState) -> Result<Vec<Pairing>, EstimationUnavailable> {
    let positions: FxHashMap<TeamId, usize> = state
        .team_stats
        .iter()
        .enumerate()
        .map(|(position, stats)| (stats.team_id, position))
        .collect();
    let strengths: FxHashMap<TeamId, u32> = state
        .teams
        .iter()
        .map(|team| (team.id, team.strength))
        .collect();
    let missing = || EstimationUnavailable::NoTeamStats(state.league_id);

    state
        .remaining_matches
        .iter()
        .filter(|fixture| !fixture.played)
        .map(|fixture| -> Result<Pairing, EstimationUnavailable> {
            Ok(Pairing {
                home: *positions.get(&fixture.home).ok_or_else(missing)?,
                away: *positions.get(&fixture.away).ok_or_else(missing)?,
                home_strength: *strengths.get(&fixture.home).ok_or_else(missing)?,
                away_strength: *strengths.get(&fixture.away).ok_or_else(missing)?,
            })
        })
        .collect()
}
