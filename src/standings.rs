//! Folding of match results into cumulative team statistics, and ranking of the resulting table.

use std::cmp::Ordering;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::domain::{Match, Score, TeamId, TeamStats, POINTS_FOR_DRAW, POINTS_FOR_WIN};
use crate::error::{AlreadyPlayed, LeagueError, NotFound};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("team {0}: played does not equal won + drawn + lost")]
    Played(TeamId),

    #[error("team {0}: points do not equal 3 × won + drawn")]
    Points(TeamId),

    #[error("team {0}: goal difference does not equal goals for less goals against")]
    GoalDiff(TeamId),

    #[error("goal differences sum to {0} across the league")]
    NetGoalDiff(i64),
}

/// The stats of every team in a league, addressable by team id.
#[derive(Debug, Clone, PartialEq)]
pub struct Standings {
    stats: Vec<TeamStats>,
    index: FxHashMap<TeamId, usize>,
}
impl Standings {
    pub fn new(stats: Vec<TeamStats>) -> Self {
        let index = stats
            .iter()
            .enumerate()
            .map(|(position, stats)| (stats.team_id, position))
            .collect();
        Self { stats, index }
    }

    pub fn stats(&self) -> &[TeamStats] {
        &self.stats
    }

    pub fn into_stats(self) -> Vec<TeamStats> {
        self.stats
    }

    pub fn get(&self, team: TeamId) -> Option<&TeamStats> {
        self.index_of(team).map(|position| &self.stats[position])
    }

    #[inline]
    pub fn index_of(&self, team: TeamId) -> Option<usize> {
        self.index.get(&team).copied()
    }

    /// Applies a result to an unplayed match, settling the match and updating both teams. A match
    /// that has already been played is rejected without touching any counter.
    pub fn apply_result(&mut self, fixture: &mut Match, score: Score) -> Result<(), LeagueError> {
        if fixture.played {
            return Err(AlreadyPlayed(fixture.id).into());
        }
        let home = self.index_of(fixture.home).ok_or(NotFound::Team(fixture.home))?;
        let away = self.index_of(fixture.away).ok_or(NotFound::Team(fixture.away))?;
        self.apply_indexed(home, away, score);
        fixture.settle(score);
        Ok(())
    }

    /// Updates the teams at the given positions. Positions are those reported by [Self::index_of].
    #[inline]
    pub fn apply_indexed(&mut self, home: usize, away: usize, score: Score) {
        apply_to(&mut self.stats, home, away, score);
    }

    pub fn champion(&self) -> Option<&TeamStats> {
        champion(&self.stats)
    }

    pub fn validate(&self) -> Result<(), InvariantViolation> {
        validate(&self.stats)
    }
}

/// Positional form of [Standings::apply_indexed] for callers holding a bare slice of stats.
#[inline]
pub fn apply_to(stats: &mut [TeamStats], home: usize, away: usize, score: Score) {
    tally(&mut stats[home], score.home, score.away);
    tally(&mut stats[away], score.away, score.home);
}

fn tally(stats: &mut TeamStats, scored: u32, conceded: u32) {
    stats.played += 1;
    match scored.cmp(&conceded) {
        Ordering::Greater => {
            stats.won += 1;
            stats.points += POINTS_FOR_WIN;
        }
        Ordering::Equal => {
            stats.drawn += 1;
            stats.points += POINTS_FOR_DRAW;
        }
        Ordering::Less => stats.lost += 1,
    }
    stats.goals_for += scored;
    stats.goals_against += conceded;
    stats.goal_diff += scored as i32 - conceded as i32;
}

/// Table order: points, then goal difference, then goals scored, all descending. Exact ties fall
/// back to ascending team id, so the order is total.
pub fn table_order(a: &TeamStats, b: &TeamStats) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.goal_diff.cmp(&a.goal_diff))
        .then_with(|| b.goals_for.cmp(&a.goals_for))
        .then_with(|| a.team_id.cmp(&b.team_id))
}

pub fn rank(stats: &[TeamStats]) -> Vec<TeamStats> {
    let mut ranked = stats.to_vec();
    ranked.sort_by(table_order);
    ranked
}

/// The first-ranked team, found without sorting.
pub fn champion(stats: &[TeamStats]) -> Option<&TeamStats> {
    stats.iter().min_by(|a, b| table_order(a, b))
}

pub fn validate(stats: &[TeamStats]) -> Result<(), InvariantViolation> {
    let mut net_goal_diff = 0i64;
    for team in stats {
        if team.played != team.won + team.drawn + team.lost {
            return Err(InvariantViolation::Played(team.team_id));
        }
        if team.points != POINTS_FOR_WIN * team.won + POINTS_FOR_DRAW * team.drawn {
            return Err(InvariantViolation::Points(team.team_id));
        }
        if team.goal_diff as i64 != team.goals_for as i64 - team.goals_against as i64 {
            return Err(InvariantViolation::GoalDiff(team.team_id));
        }
        net_goal_diff += team.goal_diff as i64;
    }
    if net_goal_diff != 0 {
        return Err(InvariantViolation::NetGoalDiff(net_goal_diff));
    }
    Ok(())
}
