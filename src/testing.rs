//! Testing helpers.

use assert_float_eq::*;

use crate::domain::ChampionshipEstimation;

pub fn assert_slice_f64_near(expected: &[f64], actual: &[f64], distance: u32) {
    assert_eq!(
        expected.len(),
        actual.len(),
        "lengths do not match: {} ≠ {}",
        expected.len(),
        actual.len()
    );
    for (index, &expected) in expected.iter().enumerate() {
        let actual = actual[index];
        if actual != expected {
            assert_f64_near!(expected, actual, distance);
        }
    }
}

/// Asserts that every probability lies in `[0, 1]` and that the set sums to 1.
pub fn assert_estimations_valid(estimations: &[ChampionshipEstimation]) {
    for estimation in estimations {
        assert!(
            (0.0..=1.0).contains(&estimation.probability),
            "probability {} for {} out of range",
            estimation.probability,
            estimation.team_id
        );
    }
    let sum: f64 = estimations.iter().map(|estimation| estimation.probability).sum();
    assert_float_absolute_eq!(1.0, sum, 1e-9);
}
