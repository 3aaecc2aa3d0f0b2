//! Row types for every table the pipeline reads or writes.
//!
//! Input rows deserialize straight from the source CSVs by header name, so
//! extra columns in the feeds are ignored. Numeric cells that fail to parse
//! become `None` via `csv::invalid_option`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the case-tracking feed (`daily.csv`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailyCaseRecord {
    /// `YYYYMMDD`, parsed later so bad cells coerce to null.
    #[serde(rename = "date", default)]
    pub date_raw: Option<String>,
    #[serde(rename = "state", default)]
    pub state_abbr: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub positive: Option<f64>,
    #[serde(rename = "probableCases", default, deserialize_with = "csv::invalid_option")]
    pub probable_cases: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub negative: Option<f64>,
}

/// One row of the state policy expiry table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PolicyExpiryRecord {
    pub state: String,
    /// `"Month Day"` with no year.
    #[serde(rename = "expire_date", default)]
    pub expire_date_raw: Option<String>,
}

/// One row of the NGA reopening table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NgaReopenRecord {
    pub state: String,
    #[serde(rename = "Reopen date", default)]
    pub reopen_date_raw: Option<String>,
}

/// Effective policy date per state; persisted as `state_reopeningdate.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledPolicy {
    pub state: String,
    pub policy_date: Option<NaiveDate>,
}

/// Governor party per state; persisted as `us_party.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyRecord {
    pub state_name: String,
    pub state_code: String,
    pub party: String,
}

/// The joined table, persisted as `data.csv` before any derivation.
///
/// Field order is the persisted column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedRecord {
    pub date: Option<NaiveDate>,
    pub positive: Option<f64>,
    #[serde(rename = "probableCases")]
    pub probable_cases: Option<f64>,
    pub negative: Option<f64>,
    pub policy_date: Option<NaiveDate>,
    pub state_name: Option<String>,
    pub state_code: Option<String>,
    pub party: Option<String>,
}

/// A unified row plus the derived columns used by the charts.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRecord {
    pub record: UnifiedRecord,
    /// Mean `positive` per (date, party).
    pub tot_avg_party: Option<f64>,
    pub new_cases: Option<f64>,
    /// Mean `new_cases` per (date, party).
    pub new_case_mean_party: Option<f64>,
    /// Mean `new_cases` per date.
    pub new_case_total: Option<f64>,
    pub after_policy: bool,
    /// Mean `new_cases` per (state_name, after_policy).
    pub new_case_after: Option<f64>,
}

/// Party buckets used for coloring and legends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Party {
    Republican,
    Democrat,
    Other,
}

impl Party {
    /// Case-insensitive; anything that is not one of the two main parties is `Other`.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("republican") => Party::Republican,
            Some("democrat") | Some("democratic") => Party::Democrat,
            _ => Party::Other,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Party::Republican => "Republican",
            Party::Democrat => "Democrat",
            Party::Other => "Other",
        }
    }
}
