//! Reconcile the two reopening sources into one policy date per state.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

use super::{
    date_parser::{later_of, parse_flexible_date, parse_month_day},
    records::{NgaReopenRecord, PartyRecord, Party, PolicyExpiryRecord, ReconciledPolicy},
    utils::{clean_opt, clean_str},
    SourceRegistry, TableKey,
};

/// Load the expiry and NGA tables from the registry and reconcile them.
#[tracing::instrument(level = "info", skip(registry))]
pub fn load_and_reconcile(registry: &SourceRegistry, year: i32) -> Result<Vec<ReconciledPolicy>> {
    let expiry: Vec<PolicyExpiryRecord> = registry.load(TableKey::Expire)?;
    let reopen: Vec<NgaReopenRecord> = registry.load(TableKey::Nga)?;
    info!(
        expiry_rows = expiry.len(),
        reopen_rows = reopen.len(),
        "loaded policy sources"
    );
    Ok(reconcile(&expiry, &reopen, year))
}

/// Left-join `reopen` onto `expiry` by state and keep the later of the two
/// dates. Unparseable dates count as unknown; the first row per state wins.
pub fn reconcile(
    expiry: &[PolicyExpiryRecord],
    reopen: &[NgaReopenRecord],
    year: i32,
) -> Vec<ReconciledPolicy> {
    let mut reopen_by_state: HashMap<String, Vec<Option<NaiveDate>>> = HashMap::new();
    for r in reopen {
        let date = clean_opt(r.reopen_date_raw.as_deref())
            .as_deref()
            .and_then(parse_flexible_date);
        reopen_by_state
            .entry(clean_str(&r.state))
            .or_default()
            .push(date);
    }

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(expiry.len());
    for e in expiry {
        let state = clean_str(&e.state);
        let expire_date = clean_opt(e.expire_date_raw.as_deref())
            .as_deref()
            .and_then(|raw| parse_month_day(raw, year));

        // no match leaves the reopen side null
        let candidates: &[Option<NaiveDate>] = reopen_by_state
            .get(&state)
            .map(Vec::as_slice)
            .unwrap_or(&[None]);

        for &reopen_date in candidates {
            let policy_date = later_of(reopen_date, expire_date);
            if seen.insert(state.clone()) {
                out.push(ReconciledPolicy {
                    state: state.clone(),
                    policy_date,
                });
            } else {
                debug!(state = %state, "dropping duplicate policy row");
            }
        }
    }
    out
}

/// Policy-date comparison between party buckets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyPolicySummary {
    pub party: String,
    pub states: usize,
    pub states_with_date: usize,
    pub mean_policy_date: Option<NaiveDate>,
    pub earliest_policy_date: Option<NaiveDate>,
    pub latest_policy_date: Option<NaiveDate>,
}

/// Group reconciled policy dates by the governor's party.
///
/// States without a party row are left out.
pub fn policy_party_summary(
    policies: &[ReconciledPolicy],
    parties: &[PartyRecord],
) -> Vec<PartyPolicySummary> {
    let party_of: HashMap<&str, Party> = parties
        .iter()
        .map(|p| (p.state_name.trim(), Party::from_label(Some(&p.party))))
        .collect();

    let mut groups: BTreeMap<Party, Vec<Option<NaiveDate>>> = BTreeMap::new();
    for p in policies {
        if let Some(&party) = party_of.get(p.state.trim()) {
            groups.entry(party).or_default().push(p.policy_date);
        }
    }

    groups
        .into_iter()
        .map(|(party, dates)| {
            let known: Vec<NaiveDate> = dates.iter().flatten().copied().collect();
            let mean_policy_date = if known.is_empty() {
                None
            } else {
                let total: i64 = known.iter().map(|d| d.num_days_from_ce() as i64).sum();
                let avg = (total as f64 / known.len() as f64).round() as i32;
                NaiveDate::from_num_days_from_ce_opt(avg)
            };
            PartyPolicySummary {
                party: party.name().to_string(),
                states: dates.len(),
                states_with_date: known.len(),
                mean_policy_date,
                earliest_policy_date: known.iter().min().copied(),
                latest_policy_date: known.iter().max().copied(),
            }
        })
        .collect()
}
