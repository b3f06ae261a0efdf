use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::filter::FilterEngine;
use crate::data::loader::LoadOptions;
use crate::data::summary::SummarySettings;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "BRFSS_DASHBOARD_CONFIG";
/// Environment variable overriding `data_path`.
pub const DATA_PATH_ENV: &str = "BRFSS_DATA_PATH";
/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "brfss-dashboard.toml";

const DEFAULT_DATA_PATH: &str = "data/sample.csv";

/// Dashboard settings. Every field has a default, so an empty file is valid.
///
/// ```toml
/// data_path = "data/sample.csv"
///
/// [loader]
/// class_allow_list = ["Mental Health", "Cognitive Decline"]
/// relabel = [{ column = "AgeGroup", from = "Overall", to = "Overall (Aggregate)" }]
///
/// [filter]
/// outlier_measure = "auto"  # or "value", "confidence_width"
/// outlier_quantile = 0.99
///
/// [summary]
/// demographic_categories = ["Sex"]
/// correlation_a = { values = ["Smoking and Alcohol Use"] }
/// correlation_b = { values = ["Mental Health", "Cognitive Decline"] }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Dataset opened at startup.
    pub data_path: PathBuf,
    pub loader: LoadOptions,
    pub filter: FilterEngine,
    pub summary: SummarySettings,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            loader: LoadOptions::default(),
            filter: FilterEngine::default(),
            summary: SummarySettings::default(),
        }
    }
}

impl DashboardConfig {
    /// Resolve the config from the environment and working directory.
    ///
    /// `$BRFSS_DASHBOARD_CONFIG` wins, then `brfss-dashboard.toml`, then the
    /// built-in defaults. `$BRFSS_DATA_PATH` overrides `data_path` last.
    pub fn load() -> Result<Self> {
        let mut config = match env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        if let Some(path) = env::var_os(DATA_PATH_ENV) {
            config.data_path = PathBuf::from(path);
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config =
            Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        anyhow::ensure!(
            (0.0..=1.0).contains(&config.filter.outlier_quantile),
            "filter.outlier_quantile must be within 0..=1, got {}",
            config.filter.outlier_quantile
        );
        Ok(config)
    }
}
