use super::*;
use crate::domain::Score;
use crate::fixture;

fn draft(name: &str, teams: usize) -> LeagueDraft {
    let positions: Vec<_> = (0..teams).collect();
    LeagueDraft {
        name: name.into(),
        teams: (0..teams)
            .map(|index| TeamDraft {
                name: format!("Team {}", index + 1),
                strength: 2000,
            })
            .collect(),
        fixtures: fixture::generate(&positions).unwrap(),
    }
}

#[test]
fn create_league_writes_everything() {
    let store = MemoryStore::default();
    let league = store.create_league(draft("Premier", 4)).unwrap();
    assert_eq!(LeagueId(1), league.id);
    assert_eq!((4, 6, 1), (league.team_count, league.max_weeks, league.current_week));

    let teams = store.teams_by_league(league.id).unwrap();
    assert_eq!(4, teams.len());
    assert_eq!("Team 1", teams[0].name);

    let stats = store.team_stats_by_league(league.id).unwrap();
    assert_eq!(4, stats.len());
    assert!(stats.iter().all(|stats| *stats == TeamStats::new(stats.team_id)));

    let matches = store.matches_by_league(league.id).unwrap();
    assert_eq!(12, matches.len());
    assert!(matches.windows(2).all(|pair| pair[0].week <= pair[1].week));
    assert!(matches.iter().all(|m| !m.played && m.league_id == league.id));
    assert_eq!(2, store.matches_by_week(league.id, 3).unwrap().len());
}

#[test]
fn ids_are_sequential_across_leagues() {
    let store = MemoryStore::default();
    store.create_league(draft("First", 2)).unwrap();
    let second = store.create_league(draft("Second", 2)).unwrap();
    assert_eq!(LeagueId(2), second.id);
    let teams = store.teams_by_league(second.id).unwrap();
    assert_eq!(vec![TeamId(3), TeamId(4)], teams.iter().map(|team| team.id).collect::<Vec<_>>());
    let matches = store.matches_by_league(second.id).unwrap();
    assert_eq!(MatchId(3), matches[0].id);
}

#[test]
fn create_league_is_atomic() {
    let store = MemoryStore::default();
    let mut bad = draft("Broken", 4);
    bad.fixtures[11].away = 7;
    assert!(matches!(store.create_league(bad), Err(StorageError::Backend(_))));
    assert!(store.leagues().unwrap().is_empty());
    assert_eq!(StoreSnapshot::default(), store.snapshot().unwrap());
}

#[test]
fn unknown_records_are_not_found() {
    let store = MemoryStore::default();
    assert_eq!(
        Err(StorageError::NotFound(NotFound::League(LeagueId(3)))),
        store.league(LeagueId(3))
    );
    assert_eq!(
        Err(StorageError::NotFound(NotFound::Match(MatchId(1)))),
        store.match_by_id(MatchId(1))
    );
    assert_eq!(
        Err(StorageError::NotFound(NotFound::Team(TeamId(1)))),
        store.team(TeamId(1))
    );
    store.create_league(draft("Any", 2)).unwrap();
    assert_eq!(
        Err(StorageError::NotFound(NotFound::WeeklyLog(LeagueId(1), 1))),
        store.weekly_snapshot(LeagueId(1), 1)
    );
}

#[test]
fn match_results_and_stats_persist() {
    let store = MemoryStore::default();
    let league = store.create_league(draft("Cup", 2)).unwrap();
    let mut m = store.matches_by_week(league.id, 1).unwrap().remove(0);
    m.settle(Score::new(2, 1));
    store.save_match_result(&m).unwrap();
    assert_eq!(m, store.match_by_id(m.id).unwrap());

    let mut stats = store.team_stats_by_league(league.id).unwrap();
    stats[0].played = 1;
    store.update_team_stats(&stats).unwrap();
    assert_eq!(stats, store.team_stats_by_league(league.id).unwrap());

    let stray = TeamStats::new(TeamId(99));
    assert_eq!(
        Err(StorageError::NotFound(NotFound::Team(TeamId(99)))),
        store.update_team_stats(&[stats[1].clone(), stray])
    );
}

#[test]
fn estimations_overwrite_and_mirror_onto_stats() {
    let store = MemoryStore::default();
    let league = store.create_league(draft("Cup", 2)).unwrap();
    assert_eq!(None, store.championship_estimations(league.id).unwrap());

    let estimation = |team, probability| ChampionshipEstimation {
        league_id: league.id,
        week: 4,
        team_id: TeamId(team),
        probability,
    };
    store
        .update_championship_estimations(league.id, &[estimation(1, 0.5), estimation(2, 0.5)])
        .unwrap();
    let latest = vec![estimation(1, 0.25), estimation(2, 0.75)];
    store.update_championship_estimations(league.id, &latest).unwrap();

    assert_eq!(Some(latest), store.championship_estimations(league.id).unwrap());
    let stats = store.team_stats_by_league(league.id).unwrap();
    assert_eq!(0.25, stats[0].championship_estimation);
    assert_eq!(0.75, stats[1].championship_estimation);
}

#[test]
fn week_increments() {
    let store = MemoryStore::default();
    let league = store.create_league(draft("Cup", 2)).unwrap();
    assert_eq!(2, store.increment_league_week(league.id).unwrap().current_week);
    assert_eq!(2, store.league(league.id).unwrap().current_week);
}

#[test]
fn weekly_snapshot_round_trip() {
    let store = MemoryStore::default();
    let league = store.create_league(draft("Cup", 2)).unwrap();
    let saved = store
        .save_weekly_snapshot(league.id, 1, "[]".into())
        .unwrap();
    assert_eq!(saved, store.weekly_snapshot(league.id, 1).unwrap());
}

#[test]
fn restored_store_continues_id_sequence() {
    let store = MemoryStore::default();
    store.create_league(draft("First", 4)).unwrap();
    store
        .update_championship_estimations(
            LeagueId(1),
            &[ChampionshipEstimation {
                league_id: LeagueId(1),
                week: 4,
                team_id: TeamId(2),
                probability: 1.0,
            }],
        )
        .unwrap();
    let snapshot = store.snapshot().unwrap();
    let json = serde_json::to_string(&snapshot).unwrap();
    let restored = MemoryStore::from_snapshot(serde_json::from_str(&json).unwrap());
    assert_eq!(snapshot, restored.snapshot().unwrap());

    let second = restored.create_league(draft("Second", 2)).unwrap();
    assert_eq!(LeagueId(2), second.id);
    assert_eq!(TeamId(5), restored.teams_by_league(second.id).unwrap()[0].id);
    assert_eq!(MatchId(13), restored.matches_by_league(second.id).unwrap()[0].id);
}
