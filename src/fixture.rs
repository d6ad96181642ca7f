//! Double round-robin scheduling by the circle method.
//!
//! One team keeps its seat while the others rotate one seat per round, which pairs every team with
//! every other exactly once in `n - 1` rounds. The second half of the season replays the first
//! with the venues swapped.

use crate::error::SchedulingFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fixture<T> {
    pub week: u32,
    pub home: T,
    pub away: T,
}

/// Builds the full season for `teams`. Fixtures are ordered by week; the first `n - 1` weeks hold
/// the first half and the remaining weeks its mirror.
pub fn generate<T: Copy>(teams: &[T]) -> Result<Vec<Fixture<T>>, SchedulingFailure> {
    let n = teams.len();
    if n < 2 {
        return Err(SchedulingFailure::TooFewTeams(n));
    }
    if n % 2 != 0 {
        return Err(SchedulingFailure::OddTeams(n));
    }

    let rounds = n - 1;
    let pairs_per_round = n / 2;
    let mut seats: Vec<usize> = (0..n).collect();
    let mut fixtures = Vec::with_capacity(2 * rounds * pairs_per_round);

    for round in 0..rounds {
        let week = round as u32 + 1;
        for slot in 0..pairs_per_round {
            let (left, right) = (seats[slot], seats[n - 1 - slot]);
            let (home, away) = if home_on_left(round, slot) {
                (left, right)
            } else {
                (right, left)
            };
            fixtures.push(Fixture {
                week,
                home: teams[home],
                away: teams[away],
            });
        }
        seats[1..].rotate_right(1);
    }

    let half_season = rounds as u32;
    let mirrored: Vec<_> = fixtures
        .iter()
        .map(|fixture| Fixture {
            week: fixture.week + half_season,
            home: fixture.away,
            away: fixture.home,
        })
        .collect();
    fixtures.extend(mirrored);
    Ok(fixtures)
}

/// Venue assignment. The anchored seat alternates with the round; every other slot keeps a fixed
/// orientation, which leaves each team within one home match of an even split per half.
#[inline]
fn home_on_left(round: usize, slot: usize) -> bool {
    if slot == 0 {
        round % 2 == 0
    } else {
        slot % 2 == 0
    }
}
