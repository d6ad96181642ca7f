use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use serde_json::Value;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info};

use leaguesim::config::Config;
use leaguesim::domain::LeagueId;
use leaguesim::dto::{LeagueCreateRequest, TeamNames, UserPlayedMatch, WeekResponse};
use leaguesim::file::{self, FromJsonFile};
use leaguesim::presentation::{self, Command, Response};
use leaguesim::print;
use leaguesim::season::SeasonOrchestrator;
use leaguesim::storage::{MemoryStore, StoreSnapshot};

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// JSON file holding the leagues; created on first use
    #[clap(short = 's', long)]
    store: Option<PathBuf>,

    /// JSON configuration file
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// render console tables instead of JSON
    #[clap(short = 't', long)]
    tables: bool,

    #[clap(subcommand)]
    action: Action,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        if let Some(config) = &self.config {
            if !config.is_file() {
                bail!("config file {} does not exist", config.display());
            }
        }
        match &self.action {
            Action::Create { file } | Action::Submit { file } if !file.is_file() => {
                bail!("request file {} does not exist", file.display())
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, clap::Subcommand, Clone)]
enum Action {
    /// create a league from a JSON request
    Create {
        #[clap(short = 'f', long)]
        file: PathBuf,
    },

    /// simulate the current week
    Week {
        #[clap(short = 'l', long)]
        league: u32,
    },

    /// simulate every remaining week
    Remaining {
        #[clap(short = 'l', long)]
        league: u32,
    },

    /// submit results for the current week from a JSON array
    Submit {
        #[clap(short = 'f', long)]
        file: PathBuf,
    },

    /// latest championship estimations
    Estimations {
        #[clap(short = 'l', long)]
        league: u32,
    },

    /// the league table
    Standings {
        #[clap(short = 'l', long)]
        league: u32,
    },

    /// fixtures and results, optionally for one week
    Matches {
        #[clap(short = 'l', long)]
        league: u32,

        #[clap(short = 'w', long)]
        week: Option<u32>,
    },
}
impl Action {
    fn to_command(&self) -> anyhow::Result<Command> {
        Ok(match self {
            Action::Create { file } => Command::CreateLeague {
                request: LeagueCreateRequest::from_json_file(file)
                    .with_context(|| format!("reading league request from {}", file.display()))?,
            },
            Action::Week { league } => Command::SimulateWeek {
                league_id: LeagueId(*league),
            },
            Action::Remaining { league } => Command::PlayRemainingWeeks {
                league_id: LeagueId(*league),
            },
            Action::Submit { file } => Command::SubmitResults {
                results: Vec::<UserPlayedMatch>::from_json_file(file)
                    .with_context(|| format!("reading results from {}", file.display()))?,
            },
            Action::Estimations { league } => Command::Estimations {
                league_id: LeagueId(*league),
            },
            Action::Standings { league } => Command::Standings {
                league_id: LeagueId(*league),
            },
            Action::Matches { league, week } => Command::Matches {
                league_id: LeagueId(*league),
                week: *week,
            },
        })
    }

    fn mutates(&self) -> bool {
        matches!(
            self,
            Action::Create { .. } | Action::Week { .. } | Action::Remaining { .. } | Action::Submit { .. }
        )
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    if env::var("RUST_BACKTRACE").is_err() {
        env::set_var("RUST_BACKTRACE", "full")
    }
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info")
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    args.validate()?;
    debug!("args: {args:?}");

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let store = match &args.store {
        Some(path) if path.exists() => {
            let snapshot = StoreSnapshot::from_json_file(path)
                .with_context(|| format!("reading store from {}", path.display()))?;
            info!("loaded {} leagues from {}", snapshot.leagues.len(), path.display());
            MemoryStore::from_snapshot(snapshot)
        }
        _ => MemoryStore::default(),
    };
    let season = Arc::new(SeasonOrchestrator::new(store, config)?);

    let command = args.action.to_command()?;
    let response = {
        let season = season.clone();
        tokio::task::spawn_blocking(move || presentation::handle(&season, command)).await?
    };

    if response.is_success() && args.action.mutates() {
        if let Some(path) = &args.store {
            let snapshot = season.store().snapshot()?;
            file::write_json(path, &snapshot)
                .with_context(|| format!("writing store to {}", path.display()))?;
            debug!("saved store to {}", path.display());
        }
    }

    if args.tables && response.is_success() {
        print_tables(&season, &args.action, &response)?;
    } else {
        println!("{}", serde_json::to_string_pretty(&response.body)?);
    }

    if !response.is_success() {
        return Err(anyhow!("request failed with status {}", response.status).into());
    }
    Ok(())
}

fn print_tables(
    season: &SeasonOrchestrator<MemoryStore>,
    action: &Action,
    response: &Response,
) -> anyhow::Result<()> {
    let league_id = match action {
        Action::Create { .. } => league_id_of(&response.body, "id")?,
        Action::Submit { .. } => league_id_of(&response.body, "league_id")?,
        Action::Week { league }
        | Action::Remaining { league }
        | Action::Estimations { league }
        | Action::Standings { league }
        | Action::Matches { league, .. } => LeagueId(*league),
    };
    let names = TeamNames::new(&season.teams(league_id)?);

    match action {
        Action::Week { .. } | Action::Submit { .. } | Action::Remaining { .. } => {
            let weeks: Vec<WeekResponse> = match &response.body {
                Value::Array(_) => serde_json::from_value(response.body.clone())?,
                _ => vec![serde_json::from_value(response.body.clone())?],
            };
            for week in &weeks {
                println!(
                    "Week {}:\n{}",
                    week.week,
                    Console::default().render(&print::tabulate_matches(&week.matches, &names))
                );
            }
            if let Some(champion) = weeks.last().and_then(|week| week.champion.as_ref()) {
                println!("Champion: {}", champion.team_name);
            }
            let standings = season.standings(league_id)?;
            println!(
                "{}",
                Console::default().render(&print::tabulate_standings(&standings, &names))
            );
        }
        Action::Create { .. } | Action::Matches { .. } => {
            let week = match action {
                Action::Matches { week, .. } => *week,
                _ => None,
            };
            let matches = season.matches(league_id, week)?;
            println!(
                "{}",
                Console::default().render(&print::tabulate_matches(&matches, &names))
            );
        }
        Action::Estimations { .. } => {
            let estimations = season.championship_estimations(league_id)?;
            println!(
                "{}",
                Console::default().render(&print::tabulate_estimations(&estimations, &names))
            );
        }
        Action::Standings { .. } => {
            let standings = season.standings(league_id)?;
            println!(
                "{}",
                Console::default().render(&print::tabulate_standings(&standings, &names))
            );
        }
    }
    Ok(())
}

fn league_id_of(body: &Value, field: &str) -> anyhow::Result<LeagueId> {
    body.get(field)
        .and_then(Value::as_u64)
        .and_then(|id| u32::try_from(id).ok())
        .map(LeagueId)
        .ok_or_else(|| anyhow!("response carries no {field}"))
}
