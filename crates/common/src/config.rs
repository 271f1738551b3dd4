use crate::filters::PickFinderFilters;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub general: General,
    pub database: Database,
    pub store: Store,
    pub finder: Finder,
    #[serde(default)]
    pub filters: PickFinderFilters,
    #[serde(default)]
    pub observability: Observability,
}

#[derive(Debug, Deserialize)]
pub struct General {
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    pub path: String,
}

/// Query sizing for the tabular store.
#[derive(Debug, Clone, Deserialize)]
pub struct Store {
    pub upcoming_games_limit: u32,
    pub player_batch_size: usize,
    pub game_batch_size: usize,
    pub stats_page_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Finder {
    pub model_versions: Vec<String>,
    pub completion_delay_ms: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct Observability {
    pub prometheus_port: Option<u16>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let content = std::fs::read_to_string("config/default.toml")
            .context("reading config/default.toml")?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.store.player_batch_size == 0 || self.store.game_batch_size == 0 {
            anyhow::bail!("store batch sizes must be positive");
        }
        if self.store.stats_page_size == 0 {
            anyhow::bail!("store.stats_page_size must be positive");
        }
        let f = &self.filters;
        for (name, window) in [
            ("time_window", f.time_window),
            ("context_time_window", f.context_time_window),
            ("h2h_time_window", f.h2h_time_window),
            ("minutes_window", f.minutes_window),
        ] {
            if window == 0 {
                anyhow::bail!("filters.{name} must be positive");
            }
        }
        Ok(())
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_toml_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{DirectionSelection, StatSelection};

    #[test]
    fn test_load_default_config() {
        let config = Config::from_toml_str(include_str!("../../../config/default.toml")).unwrap();
        assert_eq!(config.general.log_level, "info");
        assert!(config.store.player_batch_size > 0);
        assert!(!config.finder.model_versions.is_empty());
        assert_eq!(config.filters.time_window, 10);
    }

    #[test]
    fn test_minimal_config_uses_filter_defaults() {
        let toml = r#"
[general]
log_level = "debug"

[database]
path = "data/pickfinder.db"

[store]
upcoming_games_limit = 50
player_batch_size = 100
game_batch_size = 100
stats_page_size = 1000

[finder]
model_versions = ["v1"]
completion_delay_ms = 0
"#;
        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.general.log_format, LogFormat::Json);
        assert!(config.observability.prometheus_port.is_none());
        assert_eq!(config.filters.over_under, DirectionSelection::Over);
        assert!(matches!(config.filters.stat_type, StatSelection::Single(_)));
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let toml = r#"
[general]
log_level = "info"

[database]
path = "x.db"

[store]
upcoming_games_limit = 50
player_batch_size = 0
game_batch_size = 100
stats_page_size = 1000

[finder]
model_versions = []
completion_delay_ms = 0
"#;
        assert!(Config::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_zero_filter_window_is_rejected() {
        let base = include_str!("../../../config/default.toml");
        for window in [
            "time_window",
            "context_time_window",
            "h2h_time_window",
            "minutes_window",
        ] {
            let mut config = Config::from_toml_str(base).unwrap();
            match window {
                "time_window" => config.filters.time_window = 0,
                "context_time_window" => config.filters.context_time_window = 0,
                "h2h_time_window" => config.filters.h2h_time_window = 0,
                _ => config.filters.minutes_window = 0,
            }
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains(window), "{err}");
        }
    }
}
