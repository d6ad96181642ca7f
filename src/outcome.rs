//! The match outcome model. Converts team strengths, home advantage and form into a three-way
//! probability split, samples an [Outcome] from it and generates a scoreline consistent with
//! that outcome.

use strum::EnumCount;
use tinyrand::Rand;

use crate::domain::{Outcome, Score, TeamStats};

pub const HOME_ADVANTAGE: f64 = 1.1;

/// Weight applied to the home side's share of the combined strength.
pub const HOME_WIN_WEIGHT: f64 = 0.8;

pub const DRAW_PROB: f64 = 0.2;

const MAX_WINNER_GOALS: u32 = 3;
const MAX_LOSER_GOALS: u32 = 2;
const MAX_DRAW_GOALS: u32 = 2;

/// Ratio of the home side's win rate to the away side's. Falls back to 1 when either side has yet
/// to play, or when the ratio is not a positive finite number.
pub fn form_factor(home: &TeamStats, away: &TeamStats) -> f64 {
    match (home.win_rate(), away.win_rate()) {
        (Some(home_rate), Some(away_rate)) => {
            let ratio = home_rate / away_rate;
            if ratio.is_finite() && ratio > 0.0 {
                ratio
            } else {
                1.0
            }
        }
        _ => 1.0,
    }
}

/// Probabilities of each [Outcome], indexed by its ordinal.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeProbs([f64; Outcome::COUNT]);
impl OutcomeProbs {
    pub fn new(home_strength: u32, away_strength: u32, form_factor: f64) -> Self {
        let home_strength = home_strength as f64;
        let home_effective = home_strength * HOME_ADVANTAGE * form_factor;
        let total = home_effective + away_strength as f64;
        let home_win = home_strength / total * HOME_WIN_WEIGHT;
        let away_win = 1.0 - home_win - DRAW_PROB;
        let mut probs = [0.0; Outcome::COUNT];
        probs[Outcome::HomeWin.ordinal()] = home_win;
        probs[Outcome::Draw.ordinal()] = DRAW_PROB;
        probs[Outcome::AwayWin.ordinal()] = away_win;
        Self(probs)
    }

    #[inline]
    pub fn get(&self, outcome: Outcome) -> f64 {
        self.0[outcome.ordinal()]
    }

    /// Maps a uniform variate in `[0, 1)` onto an outcome: home win below the home threshold,
    /// draw within the next `DRAW_PROB`, away win otherwise.
    pub fn classify(&self, random: f64) -> Outcome {
        let home_win = self.get(Outcome::HomeWin);
        if random < home_win {
            Outcome::HomeWin
        } else if random < home_win + self.get(Outcome::Draw) {
            Outcome::Draw
        } else {
            Outcome::AwayWin
        }
    }

    pub fn sample(&self, rand: &mut impl Rand) -> Outcome {
        self.classify(random_f64(rand))
    }
}

/// Draws a scoreline for a known outcome. The winner scores 1 to 3; the loser scores 0 to 2 but
/// always fewer than the winner; a draw is 0-0 through 2-2.
pub fn scoreline(outcome: Outcome, rand: &mut impl Rand) -> Score {
    match outcome {
        Outcome::HomeWin => {
            let (winner, loser) = winning_margin(rand);
            Score::new(winner, loser)
        }
        Outcome::AwayWin => {
            let (winner, loser) = winning_margin(rand);
            Score::new(loser, winner)
        }
        Outcome::Draw => {
            let goals = random_below(rand, MAX_DRAW_GOALS + 1);
            Score::new(goals, goals)
        }
    }
}

fn winning_margin(rand: &mut impl Rand) -> (u32, u32) {
    let winner = 1 + random_below(rand, MAX_WINNER_GOALS);
    let loser = random_below(rand, u32::min(MAX_LOSER_GOALS, winner - 1) + 1);
    (winner, loser)
}

/// Resolves a single match end to end.
pub fn simulate(
    home_strength: u32,
    away_strength: u32,
    form_factor: f64,
    rand: &mut impl Rand,
) -> Score {
    let outcome = OutcomeProbs::new(home_strength, away_strength, form_factor).sample(rand);
    scoreline(outcome, rand)
}

/// A uniform variate in `[0, 1)` built from the top 53 bits of the generator's output.
#[inline]
pub fn random_f64(rand: &mut impl Rand) -> f64 {
    (rand.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

#[inline]
fn random_below(rand: &mut impl Rand, bound: u32) -> u32 {
    rand.next_lim_u32(bound)
}

#[cfg(test)]
mod tests;
