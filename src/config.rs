//! Tunable parameters of a simulation run, loadable from a JSON file. Every field has a default,
//! so a partial file (or none at all) is valid.

use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::estimator::EstimatorConfig;
use crate::file;

pub const DEFAULT_ESTIMATION_AFTER_WEEK: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Championship estimation runs once the league's current week exceeds this value.
    pub estimation_after_week: u32,

    /// Master seed for live match resolution; taken from the clock when unset.
    pub seed: Option<u64>,

    pub estimator: EstimatorConfig,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            estimation_after_week: DEFAULT_ESTIMATION_AFTER_WEEK,
            seed: None,
            estimator: EstimatorConfig::default(),
        }
    }
}
impl Config {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let config: Config = file::read_json(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.estimator.trials == 0 {
            bail!("estimator trials must be positive");
        }
        if self.estimator.threads == Some(0) {
            bail!("estimator threads must be positive when specified");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_takes_defaults() {
        let config: Config = serde_json::from_str(r#"{"estimator": {"trials": 500}}"#).unwrap();
        assert_eq!(3, config.estimation_after_week);
        assert_eq!(None, config.seed);
        assert_eq!(500, config.estimator.trials);
        assert_eq!(None, config.estimator.threads);
        config.validate().unwrap();
    }

    #[test]
    fn default_is_valid() {
        let config = Config::default();
        assert_eq!(10_000, config.estimator.trials);
        config.validate().unwrap();
    }

    #[test]
    fn rejects_zero_trials_and_threads() {
        let mut config = Config::default();
        config.estimator.trials = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.estimator.threads = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let path = std::env::temp_dir().join(format!("leaguesim-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"seed": 42, "estimation_after_week": 5}"#).unwrap();
        let config = Config::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(Some(42), config.seed);
        assert_eq!(5, config.estimation_after_week);
    }
}
