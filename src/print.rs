//! Console tables for standings, fixtures and championship estimations.

use stanza::style::HAlign::Left;
use stanza::style::{HAlign, Header, MinWidth, Separator, Styles};
use stanza::table::{Col, Row, Table};

use crate::domain::{ChampionshipEstimation, Match, TeamStats};
use crate::dto::TeamNames;

/// Renders `stats`, which are expected to be in table order.
pub fn tabulate_standings(stats: &[TeamStats], names: &TeamNames) -> Table {
    let mut table = Table::default()
        .with_cols({
            let mut cols = vec![
                Col::new(Styles::default().with(MinWidth(4)).with(HAlign::Right)),
                Col::new(Styles::default().with(MinWidth(16)).with(Left)),
            ];
            for _ in 0..8 {
                cols.push(Col::new(Styles::default().with(MinWidth(4)).with(HAlign::Right)));
            }
            cols.push(Col::new(
                Styles::default()
                    .with(Separator(true))
                    .with(MinWidth(8))
                    .with(HAlign::Right),
            ));
            cols
        })
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec![
                "Pos".into(),
                "Team".into(),
                "P".into(),
                "W".into(),
                "D".into(),
                "L".into(),
                "GF".into(),
                "GA".into(),
                "GD".into(),
                "Pts".into(),
                "Title".into(),
            ],
        ));
    for (index, stats) in stats.iter().enumerate() {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                format!("{}", index + 1).into(),
                names.get(stats.team_id).into(),
                format!("{}", stats.played).into(),
                format!("{}", stats.won).into(),
                format!("{}", stats.drawn).into(),
                format!("{}", stats.lost).into(),
                format!("{}", stats.goals_for).into(),
                format!("{}", stats.goals_against).into(),
                format!("{:+}", stats.goal_diff).into(),
                format!("{}", stats.points).into(),
                format!("{:.1}%", stats.championship_estimation * 100.0).into(),
            ],
        ));
    }
    table
}

pub fn tabulate_matches(matches: &[Match], names: &TeamNames) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(4)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(16)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(7)).with(HAlign::Centred)),
            Col::new(Styles::default().with(MinWidth(16)).with(Left)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec!["Week".into(), "Home".into(), "".into(), "Away".into()],
        ));
    for m in matches {
        let score = match m.score() {
            Some(score) => score.to_string(),
            None => "v".into(),
        };
        table.push_row(Row::new(
            Styles::default(),
            vec![
                format!("{}", m.week).into(),
                names.get(m.home).into(),
                score.into(),
                names.get(m.away).into(),
            ],
        ));
    }
    table
}

pub fn tabulate_estimations(estimations: &[ChampionshipEstimation], names: &TeamNames) -> Table {
    let mut sorted = estimations.to_vec();
    sorted.sort_by(|a, b| {
        b.probability
            .total_cmp(&a.probability)
            .then_with(|| a.team_id.cmp(&b.team_id))
    });
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(16)).with(Left)),
            Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec!["Team".into(), "Title".into()],
        ));
    for estimation in sorted {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                names.get(estimation.team_id).into(),
                format!("{:.2}%", estimation.probability * 100.0).into(),
            ],
        ));
    }
    table
}
