use assert_float_eq::*;
use strum::IntoEnumIterator;
use tinyrand::{Seeded, StdRand};

use super::*;
use crate::domain::TeamId;

fn stats(played: u32, won: u32) -> TeamStats {
    let mut stats = TeamStats::new(TeamId(1));
    stats.played = played;
    stats.won = won;
    stats
}

#[test]
fn probs_for_uneven_strengths() {
    let probs = OutcomeProbs::new(2500, 1500, 1.0);
    assert_float_absolute_eq!(0.470588, probs.get(Outcome::HomeWin), 1e-6);
    assert_float_absolute_eq!(0.2, probs.get(Outcome::Draw), 1e-12);
    assert_float_absolute_eq!(0.329412, probs.get(Outcome::AwayWin), 1e-6);
}

#[test]
fn probs_sum_to_one() {
    for (home, away, form) in [(1000, 3000, 1.0), (3000, 1000, 1.0), (2000, 2000, 0.25), (1500, 2500, 4.0)] {
        let probs = OutcomeProbs::new(home, away, form);
        let sum: f64 = Outcome::iter().map(|outcome| probs.get(outcome)).sum();
        assert_float_absolute_eq!(1.0, sum, 1e-12);
        for outcome in Outcome::iter() {
            assert!(probs.get(outcome) >= 0.0, "{outcome} for {home} v {away}");
        }
    }
}

#[test]
fn classify_boundaries() {
    let probs = OutcomeProbs::new(2500, 1500, 1.0);
    let home_win = probs.get(Outcome::HomeWin);
    assert_eq!(Outcome::HomeWin, probs.classify(0.0));
    assert_eq!(Outcome::HomeWin, probs.classify(home_win - 1e-9));
    assert_eq!(Outcome::Draw, probs.classify(home_win));
    assert_eq!(Outcome::Draw, probs.classify(home_win + 0.2 - 1e-9));
    assert_eq!(Outcome::AwayWin, probs.classify(home_win + 0.2));
    assert_eq!(Outcome::AwayWin, probs.classify(0.999999));
}

#[test]
fn form_factor_defaults() {
    assert_eq!(1.0, form_factor(&stats(0, 0), &stats(3, 2)));
    assert_eq!(1.0, form_factor(&stats(3, 2), &stats(0, 0)));
    assert_eq!(1.0, form_factor(&stats(3, 0), &stats(3, 2)));
    assert_eq!(1.0, form_factor(&stats(3, 2), &stats(3, 0)));
    assert_float_absolute_eq!(2.0, form_factor(&stats(4, 2), &stats(4, 1)), 1e-12);
}

#[test]
fn scoreline_agrees_with_outcome() {
    let mut rand = StdRand::seed(42);
    for outcome in Outcome::iter() {
        for _ in 0..1_000 {
            let score = scoreline(outcome, &mut rand);
            assert_eq!(outcome, score.outcome(), "{score}");
            assert!(score.home <= 3 && score.away <= 3, "{score}");
            match outcome {
                Outcome::HomeWin => assert!(score.home >= 1 && score.away <= 2),
                Outcome::AwayWin => assert!(score.away >= 1 && score.home <= 2),
                Outcome::Draw => assert!(score.home <= 2),
            }
        }
    }
}

#[test]
fn scorelines_cover_their_ranges() {
    let mut rand = StdRand::seed(5);
    let mut draws = [0u32; 3];
    let mut winners = [0u32; 3];
    for _ in 0..3_000 {
        draws[scoreline(Outcome::Draw, &mut rand).home as usize] += 1;
        winners[scoreline(Outcome::HomeWin, &mut rand).home as usize - 1] += 1;
    }
    for count in draws.iter().chain(&winners) {
        assert!(*count > 800, "draws {draws:?}, winners {winners:?}");
    }
}

#[test]
fn sampled_frequencies_track_probs() {
    const TRIALS: usize = 100_000;
    let probs = OutcomeProbs::new(2500, 1500, 1.0);
    let mut rand = StdRand::seed(7);
    let mut counts = [0usize; Outcome::COUNT];
    for _ in 0..TRIALS {
        counts[probs.sample(&mut rand).ordinal()] += 1;
    }
    for outcome in Outcome::iter() {
        let frequency = counts[outcome.ordinal()] as f64 / TRIALS as f64;
        assert_float_absolute_eq!(probs.get(outcome), frequency, 0.01);
    }
}

#[test]
fn simulate_is_reproducible() {
    let run = |seed| {
        let mut rand = StdRand::seed(seed);
        (0..50).map(|_| simulate(2200, 1800, 1.0, &mut rand)).collect::<Vec<_>>()
    };
    assert_eq!(run(99), run(99));
}

#[test]
fn random_f64_in_unit_interval() {
    let mut rand = StdRand::seed(3);
    for _ in 0..10_000 {
        let value = random_f64(&mut rand);
        assert!((0.0..1.0).contains(&value), "{value}");
    }
}
