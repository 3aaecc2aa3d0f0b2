//! Join case rows with state names, policy dates and governor party.
//!
//! Join keys per step:
//! 1. cases.state_abbr ⟗ lookup.abbr        (full outer)
//! 2. lookup.name      ⟗ policy.state       (full outer)
//! 3. lookup.name      ⟕ party.state_name   (left)
//!
//! The abbreviation, the lookup name and the policy state are join keys only
//! and never reach [`UnifiedRecord`]. Null keys never match.

use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use super::{
    date_parser::parse_compact_date,
    records::{DailyCaseRecord, PartyRecord, ReconciledPolicy, UnifiedRecord},
    states::StateLookup,
    utils::clean_opt,
};

/// Case columns plus the join key carried between steps.
#[derive(Debug, Clone, Default)]
struct Joined {
    date: Option<NaiveDate>,
    positive: Option<f64>,
    probable_cases: Option<f64>,
    negative: Option<f64>,
    policy_date: Option<NaiveDate>,
    /// Full state name from the lookup; dropped after the last join.
    key: Option<String>,
}

/// Counters reported after a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub case_rows: usize,
    pub unknown_abbr_rows: usize,
    pub states_without_cases: usize,
    pub policies_without_cases: usize,
    pub rows_without_party: usize,
}

/// Build the unified table. Every case row survives; unmatched lookup rows
/// are appended with null case columns.
#[tracing::instrument(level = "info", skip_all, fields(cases = cases.len()))]
pub fn build(
    cases: &[DailyCaseRecord],
    lookup: &StateLookup,
    policies: &[ReconciledPolicy],
    parties: &[PartyRecord],
) -> (Vec<UnifiedRecord>, JoinStats) {
    let mut stats = JoinStats {
        case_rows: cases.len(),
        ..Default::default()
    };

    // 1) cases ⟗ state lookup
    let mut rows: Vec<Joined> = Vec::with_capacity(cases.len() + lookup.len());
    let mut matched_abbr = HashSet::new();
    for c in cases {
        let abbr = clean_opt(c.state_abbr.as_deref());
        let key = abbr.as_deref().and_then(|a| lookup.name(a));
        match key {
            Some(name) => {
                matched_abbr.insert(name);
            }
            None => stats.unknown_abbr_rows += 1,
        }
        rows.push(Joined {
            date: c.date_raw.as_deref().and_then(parse_compact_date),
            positive: c.positive,
            probable_cases: c.probable_cases,
            negative: c.negative,
            policy_date: None,
            key: key.map(String::from),
        });
    }
    for (_, name) in lookup.entries() {
        if !matched_abbr.contains(name) {
            stats.states_without_cases += 1;
            rows.push(Joined {
                key: Some(name.to_string()),
                ..Default::default()
            });
        }
    }

    // 2) ⟗ reconciled policy on full name
    let policy_by_state: HashMap<&str, Option<NaiveDate>> = policies
        .iter()
        .map(|p| (p.state.trim(), p.policy_date))
        .collect();
    let mut matched_policy = HashSet::new();
    for row in rows.iter_mut() {
        if let Some(key) = row.key.as_deref() {
            if let Some((&state, &date)) = policy_by_state.get_key_value(key) {
                row.policy_date = date;
                matched_policy.insert(state);
            }
        }
    }
    for p in policies {
        if !matched_policy.contains(p.state.trim()) {
            stats.policies_without_cases += 1;
            rows.push(Joined {
                policy_date: p.policy_date,
                ..Default::default()
            });
        }
    }

    // 3) ⟕ governor party on full name
    let mut party_by_state: HashMap<&str, Vec<&PartyRecord>> = HashMap::new();
    for p in parties {
        party_by_state.entry(p.state_name.trim()).or_default().push(p);
    }
    if let Some((state, dupes)) = party_by_state.iter().find(|(_, v)| v.len() > 1) {
        warn!(state = %state, rows = dupes.len(), "multiple party rows for state");
    }

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let matches = row
            .key
            .as_deref()
            .and_then(|k| party_by_state.get(k))
            .filter(|m| !m.is_empty());
        match matches {
            Some(matches) => {
                for p in matches {
                    out.push(UnifiedRecord {
                        date: row.date,
                        positive: row.positive,
                        probable_cases: row.probable_cases,
                        negative: row.negative,
                        policy_date: row.policy_date,
                        state_name: Some(p.state_name.clone()),
                        state_code: Some(p.state_code.clone()),
                        party: Some(p.party.clone()),
                    });
                }
            }
            None => {
                stats.rows_without_party += 1;
                out.push(UnifiedRecord {
                    date: row.date,
                    positive: row.positive,
                    probable_cases: row.probable_cases,
                    negative: row.negative,
                    policy_date: row.policy_date,
                    state_name: None,
                    state_code: None,
                    party: None,
                });
            }
        }
    }

    info!(rows = out.len(), ?stats, "unified dataset built");
    (out, stats)
}
