//! A double round-robin league simulator. Schedules fixtures, resolves matches from a
//! strength-based outcome model, maintains standings and estimates each team's championship
//! probability by Monte Carlo playouts of the remaining season.

pub mod config;
pub mod domain;
pub mod dto;
pub mod error;
pub mod estimator;
pub mod file;
pub mod fixture;
pub mod outcome;
pub mod presentation;
pub mod print;
pub mod season;
pub mod standings;
pub mod storage;
pub mod timed;

#[cfg(test)]
pub(crate) mod testing;

#[doc = include_str!("../README.md")]
#[cfg(doc)]
fn readme() {}
