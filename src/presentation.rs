//! Request/response facade over the [SeasonOrchestrator]. Each [Command] maps to one orchestrator
//! call, and every outcome, success or failure, is marshalled into a status code and a JSON body.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::domain::LeagueId;
use crate::dto::{
    ErrorResponse, LeagueCreateRequest, LeagueResponse, TeamNames, TeamResponse, UserPlayedMatch,
};
use crate::error::LeagueError;
use crate::season::SeasonOrchestrator;
use crate::storage::Storage;

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;
pub const STATUS_INTERNAL: u16 = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    CreateLeague { request: LeagueCreateRequest },
    SimulateWeek { league_id: LeagueId },
    PlayRemainingWeeks { league_id: LeagueId },
    SubmitResults { results: Vec<UserPlayedMatch> },
    Estimations { league_id: LeagueId },
    League { league_id: LeagueId },
    Teams { league_id: LeagueId },
    Matches { league_id: LeagueId, week: Option<u32> },
    Standings { league_id: LeagueId },
    WeeklyLog { league_id: LeagueId, week: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}
impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub fn handle<S: Storage>(season: &SeasonOrchestrator<S>, command: Command) -> Response {
    debug!("handling {command:?}");
    match command {
        Command::CreateLeague { request } => respond(
            STATUS_CREATED,
            season.create_league(&request).and_then(|league| {
                let teams = season
                    .teams(league.id)?
                    .into_iter()
                    .map(|team| TeamResponse::new(team, None))
                    .collect();
                Ok(LeagueResponse::new(league, teams))
            }),
        ),
        Command::SimulateWeek { league_id } => respond(
            STATUS_OK,
            season.simulate_week(league_id).and_then(|report| {
                let names = TeamNames::new(&season.teams(league_id)?);
                Ok(names.week(report))
            }),
        ),
        Command::PlayRemainingWeeks { league_id } => respond(
            STATUS_OK,
            season.play_remaining_weeks(league_id).and_then(|reports| {
                let names = TeamNames::new(&season.teams(league_id)?);
                Ok(reports
                    .into_iter()
                    .map(|report| names.week(report))
                    .collect::<Vec<_>>())
            }),
        ),
        Command::SubmitResults { results } => respond(
            STATUS_OK,
            season.record_user_results(&results).and_then(|report| {
                let names = TeamNames::new(&season.teams(report.league_id)?);
                Ok(names.week(report))
            }),
        ),
        Command::Estimations { league_id } => respond(
            STATUS_OK,
            season.championship_estimations(league_id).and_then(|estimations| {
                let names = TeamNames::new(&season.teams(league_id)?);
                Ok(names.estimations(estimations))
            }),
        ),
        Command::League { league_id } => respond(
            STATUS_OK,
            season.league_overview(league_id).map(LeagueResponse::from),
        ),
        Command::Teams { league_id } => respond(STATUS_OK, season.teams(league_id)),
        Command::Matches { league_id, week } => respond(STATUS_OK, season.matches(league_id, week)),
        Command::Standings { league_id } => respond(STATUS_OK, season.standings(league_id)),
        Command::WeeklyLog { league_id, week } => {
            respond(STATUS_OK, season.weekly_log(league_id, week))
        }
    }
}

fn respond<T: Serialize>(status: u16, result: Result<T, LeagueError>) -> Response {
    match result {
        Ok(value) => match serde_json::to_value(value) {
            Ok(body) => Response { status, body },
            Err(err) => {
                warn!("failed to serialise response: {err}");
                Response {
                    status: STATUS_INTERNAL,
                    body: json!({"status": STATUS_INTERNAL, "kind": "serialisation", "message": err.to_string()}),
                }
            }
        },
        Err(err) => error_response(&err),
    }
}

pub fn error_response(err: &LeagueError) -> Response {
    let body = ErrorResponse::from(err);
    if body.status >= STATUS_INTERNAL {
        warn!("{err}");
    } else {
        debug!("{err}");
    }
    Response {
        status: body.status,
        body: json!(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dto::TeamRequest;
    use crate::storage::MemoryStore;

    fn season() -> SeasonOrchestrator<MemoryStore> {
        let mut config = Config::default();
        config.seed = Some(21);
        config.estimator.trials = 200;
        config.estimator.threads = Some(1);
        SeasonOrchestrator::new(MemoryStore::default(), config).unwrap()
    }

    fn create(season: &SeasonOrchestrator<MemoryStore>) -> Response {
        handle(
            season,
            Command::CreateLeague {
                request: LeagueCreateRequest {
                    name: "Premier".into(),
                    team_count: 4,
                    teams: ["Reds", "Blues", "Greens", "Golds"]
                        .into_iter()
                        .zip([2500, 2000, 1800, 1500])
                        .map(|(name, strength)| TeamRequest {
                            name: name.into(),
                            strength,
                        })
                        .collect(),
                },
            },
        )
    }

    #[test]
    fn create_returns_league_with_teams() {
        let season = season();
        let response = create(&season);
        assert_eq!(STATUS_CREATED, response.status);
        assert_eq!(1, response.body["id"]);
        assert_eq!(6, response.body["max_weeks"]);
        assert_eq!(1, response.body["curr_week"]);
        assert_eq!("Reds", response.body["teams"][0]["name"]);
    }

    #[test]
    fn commands_parse_from_json() {
        let command: Command =
            serde_json::from_value(json!({"command": "matches", "league_id": 3, "week": 2})).unwrap();
        assert_eq!(
            Command::Matches {
                league_id: LeagueId(3),
                week: Some(2)
            },
            command
        );
        let command: Command = serde_json::from_value(json!({"command": "simulate_week", "league_id": 1})).unwrap();
        assert_eq!(Command::SimulateWeek { league_id: LeagueId(1) }, command);
    }

    #[test]
    fn week_then_estimations() {
        let season = season();
        create(&season);
        let early = handle(&season, Command::Estimations { league_id: LeagueId(1) });
        assert_eq!(503, early.status);
        assert_eq!("estimation_unavailable", early.body["kind"]);

        let week = handle(&season, Command::SimulateWeek { league_id: LeagueId(1) });
        assert!(week.is_success());
        assert_eq!(1, week.body["week"]);
        assert_eq!(2, week.body["matches"].as_array().unwrap().len());
        assert!(week.body.get("champion").is_none());

        let remaining = handle(&season, Command::PlayRemainingWeeks { league_id: LeagueId(1) });
        assert_eq!(5, remaining.body.as_array().unwrap().len());
        assert!(remaining.body[4]["champion"]["team_name"].is_string());

        let estimations = handle(&season, Command::Estimations { league_id: LeagueId(1) });
        assert_eq!(STATUS_OK, estimations.status);
        assert_eq!(4, estimations.body.as_array().unwrap().len());
        assert!(estimations.body[0]["team_name"].is_string());
    }

    #[test]
    fn errors_marshal_with_status() {
        let season = season();
        let missing = handle(&season, Command::Standings { league_id: LeagueId(9) });
        assert_eq!(404, missing.status);
        assert_eq!(
            json!({"status": 404, "kind": "not_found", "message": "league l9 not found"}),
            missing.body
        );

        let invalid = handle(&season, Command::SubmitResults { results: vec![] });
        assert_eq!(400, invalid.status);
        assert_eq!("validation", invalid.body["kind"]);
    }

    #[test]
    fn league_overview_carries_stats() {
        let season = season();
        create(&season);
        handle(&season, Command::SimulateWeek { league_id: LeagueId(1) });
        let league = handle(&season, Command::League { league_id: LeagueId(1) });
        assert_eq!(2, league.body["curr_week"]);
        assert_eq!(1, league.body["teams"][0]["stats"]["played"]);

        let log = handle(&season, Command::WeeklyLog { league_id: LeagueId(1), week: 1 });
        assert!(log.is_success());
        assert!(log.body["team_stats_json"].is_string());
    }
}
