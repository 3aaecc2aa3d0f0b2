//! Run configuration: source URLs, file locations, the expiry year and the
//! chart window. Every field has a default; an optional YAML file overrides
//! any subset of them.

use anyhow::{ensure, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::process::SourceRegistry;

/// Environment variable naming the YAML config file.
pub const CONFIG_ENV: &str = "REOPENING_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "reopening.yaml";

pub const DAILY_URL: &str = "https://api.covidtracking.com/v1/states/daily.csv";
pub const PARTY_URL: &str = "https://raw.githubusercontent.com/CivilServiceUSA/us-governors/master/us-governors/data/us-governors.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Download the daily case CSV before running; off for repeated local runs.
    pub go_online: bool,
    pub daily_url: String,
    pub party_url: String,

    /// Directory holding the input tables (and receiving the download).
    pub data_dir: PathBuf,
    pub expire_file: String,
    pub nga_file: String,
    pub daily_file: String,

    /// Year appended to the year-less expiry dates.
    pub policy_year: i32,

    pub output_dir: PathBuf,
    pub reopening_out: String,
    pub party_out: String,
    pub data_out: String,
    pub policy_summary_out: String,
    pub timeseries_png: String,
    pub top_states_png: String,

    pub chart_start: NaiveDate,
    pub chart_end: NaiveDate,
    pub top_n: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            go_online: true,
            daily_url: DAILY_URL.to_string(),
            party_url: PARTY_URL.to_string(),
            data_dir: PathBuf::from("."),
            expire_file: "state_expire_multistate.csv".to_string(),
            nga_file: "table.csv".to_string(),
            daily_file: "daily.csv".to_string(),
            policy_year: 2020,
            output_dir: PathBuf::from("."),
            reopening_out: "state_reopeningdate.csv".to_string(),
            party_out: "us_party.csv".to_string(),
            data_out: "data.csv".to_string(),
            policy_summary_out: "policy_date_by_party.csv".to_string(),
            timeseries_png: "average_by_party.png".to_string(),
            top_states_png: "top25_states_highest_cases.png".to_string(),
            chart_start: NaiveDate::from_ymd_opt(2020, 4, 1).expect("valid date"),
            chart_end: NaiveDate::from_ymd_opt(2020, 11, 30).expect("valid date"),
            top_n: 25,
        }
    }
}

impl Config {
    /// Load from `$REOPENING_CONFIG`, else `reopening.yaml` if it exists,
    /// else defaults.
    pub fn from_env() -> Result<Self> {
        match env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(Path::new(&path)),
            Err(_) => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::from_file(path)
                } else {
                    info!("no {} found; using defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        let cfg = Self::from_yaml(&text).with_context(|| format!("parsing config {:?}", path))?;
        info!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.chart_start < self.chart_end,
            "chart_start {} must be before chart_end {}",
            self.chart_start,
            self.chart_end
        );
        ensure!(self.top_n > 0, "top_n must be positive");
        Ok(())
    }

    pub fn registry(&self) -> SourceRegistry {
        SourceRegistry::new(
            &self.data_dir,
            &self.expire_file,
            &self.nga_file,
            &self.daily_file,
        )
    }

    pub fn output(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }
}
