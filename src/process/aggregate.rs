//! Derived per-row columns computed over the unified table.

use chrono::NaiveDate;
use std::{
    cmp::{Ordering, Reverse},
    collections::HashMap,
    hash::Hash,
};
use tracing::debug;

use super::{
    records::{AnalysisRecord, UnifiedRecord},
    utils::mean,
};

/// Group-wise mean broadcast back to every row of the group.
/// Rows with a `None` key get `None`.
fn group_mean<K: Hash + Eq>(keys: &[Option<K>], values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut groups: HashMap<&K, Vec<Option<f64>>> = HashMap::new();
    for (key, value) in keys.iter().zip(values) {
        if let Some(k) = key {
            groups.entry(k).or_default().push(*value);
        }
    }
    let means: HashMap<&K, Option<f64>> = groups
        .into_iter()
        .map(|(k, vals)| (k, mean(vals)))
        .collect();
    keys.iter()
        .map(|key| key.as_ref().and_then(|k| means.get(k).copied().flatten()))
        .collect()
}

/// Newest first; undated rows sort last and keep their relative order.
fn newest_first(a: &Option<NaiveDate>, b: &Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Day-over-day change in `positive` per state: each row minus the
/// previous day's row of the same state. Each state's rows are sorted by
/// date (newest first) before differencing, so input order does not matter.
/// The oldest row of each state, and any pair with a null count, yields `None`.
pub fn new_cases(records: &[UnifiedRecord]) -> Vec<Option<f64>> {
    let mut by_state: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, r) in records.iter().enumerate() {
        if let Some(state) = r.state_name.as_deref() {
            by_state.entry(state).or_default().push(idx);
        }
    }

    let mut out = vec![None; records.len()];
    for (state, mut idxs) in by_state {
        idxs.sort_by(|&a, &b| newest_first(&records[a].date, &records[b].date));
        for pair in idxs.windows(2) {
            let (cur, prev) = (&records[pair[0]], &records[pair[1]]);
            out[pair[0]] = match (cur.positive, prev.positive) {
                (Some(c), Some(p)) => Some(c - p),
                _ => None,
            };
        }
        debug!(state = %state, rows = idxs.len(), "differenced state series");
    }
    out
}

/// Strictly after the policy date; unknown dates are never "after".
pub fn is_after_policy(date: Option<NaiveDate>, policy_date: Option<NaiveDate>) -> bool {
    matches!((date, policy_date), (Some(d), Some(p)) if d > p)
}

/// Add every derived column. Row order and all existing columns are kept.
#[tracing::instrument(level = "info", skip_all, fields(rows = records.len()))]
pub fn derive(records: Vec<UnifiedRecord>) -> Vec<AnalysisRecord> {
    let date_party: Vec<Option<(NaiveDate, &str)>> = records
        .iter()
        .map(|r| Some((r.date?, r.party.as_deref()?)))
        .collect();
    let dates: Vec<Option<NaiveDate>> = records.iter().map(|r| r.date).collect();
    let positives: Vec<Option<f64>> = records.iter().map(|r| r.positive).collect();

    let tot_avg_party = group_mean(&date_party, &positives);
    let new_cases = new_cases(&records);
    let new_case_mean_party = group_mean(&date_party, &new_cases);
    let new_case_total = group_mean(&dates, &new_cases);

    let after_policy: Vec<bool> = records
        .iter()
        .map(|r| is_after_policy(r.date, r.policy_date))
        .collect();
    let state_after: Vec<Option<(&str, bool)>> = records
        .iter()
        .zip(&after_policy)
        .map(|(r, &after)| r.state_name.as_deref().map(|s| (s, after)))
        .collect();
    let new_case_after = group_mean(&state_after, &new_cases);

    let derived: Vec<_> = (0..records.len())
        .map(|i| {
            (
                tot_avg_party[i],
                new_cases[i],
                new_case_mean_party[i],
                new_case_total[i],
                after_policy[i],
                new_case_after[i],
            )
        })
        .collect();

    records
        .into_iter()
        .zip(derived)
        .map(
            |(record, (tot_avg_party, new_cases, mean_party, total, after_policy, after))| {
                AnalysisRecord {
                    record,
                    tot_avg_party,
                    new_cases,
                    new_case_mean_party: mean_party,
                    new_case_total: total,
                    after_policy,
                    new_case_after: after,
                }
            },
        )
        .collect()
}

/// Distinct (state, mean after policy, party) rows for states past their
/// reopening date, highest mean first. Ties keep input order.
pub fn top_states_after_policy(rows: &[AnalysisRecord], n: usize) -> Vec<StateAverage> {
    let mut seen: Vec<StateAverage> = Vec::new();
    for r in rows.iter().filter(|r| r.after_policy) {
        let (Some(state), Some(value)) = (r.record.state_name.as_deref(), r.new_case_after) else {
            continue;
        };
        if value.is_nan() {
            continue;
        }
        let candidate = StateAverage {
            state_name: state.to_string(),
            new_case_after: value,
            party: r.record.party.clone(),
        };
        if !seen.contains(&candidate) {
            seen.push(candidate);
        }
    }
    // stable sort keeps first-seen order among equal values
    seen.sort_by_key(|s| Reverse(OrdF64(s.new_case_after)));
    seen.truncate(n);
    seen
}

/// One bar of the top-states chart.
#[derive(Debug, Clone, PartialEq)]
pub struct StateAverage {
    pub state_name: String,
    pub new_case_after: f64,
    pub party: Option<String>,
}

/// Total order over non-NaN floats for sorting.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OrdF64(f64);

impl Eq for OrdF64 {}

impl PartialOrd for OrdF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrdF64 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rec(state: &str, party: &str, date: NaiveDate, positive: f64, policy: Option<NaiveDate>) -> UnifiedRecord {
        UnifiedRecord {
            date: Some(date),
            positive: Some(positive),
            probable_cases: None,
            negative: None,
            policy_date: policy,
            state_name: Some(state.into()),
            state_code: None,
            party: Some(party.into()),
        }
    }

    #[test]
    fn new_cases_difference_newest_first_regardless_of_input_order() {
        let p = Some(d(2020, 5, 1));
        // deliberately shuffled
        let records = vec![
            rec("California", "democrat", d(2020, 5, 2), 15.0, p),
            rec("California", "democrat", d(2020, 4, 30), 4.0, p),
            rec("California", "democrat", d(2020, 5, 3), 25.0, p),
            rec("California", "democrat", d(2020, 5, 1), 10.0, p),
        ];
        let nc = new_cases(&records);
        assert_eq!(nc, vec![Some(5.0), None, Some(10.0), Some(6.0)]);
    }

    #[test]
    fn new_cases_null_for_missing_state_or_count() {
        let mut records = vec![
            rec("Ohio", "republican", d(2020, 5, 2), 10.0, None),
            rec("Ohio", "republican", d(2020, 5, 1), 4.0, None),
        ];
        records[1].positive = None;
        let mut orphan = rec("x", "republican", d(2020, 5, 2), 1.0, None);
        orphan.state_name = None;
        records.push(orphan);
        assert_eq!(new_cases(&records), vec![None, None, None]);
    }

    #[test]
    fn after_policy_is_strict() {
        let policy = Some(d(2020, 5, 1));
        assert!(!is_after_policy(Some(d(2020, 4, 30)), policy));
        assert!(!is_after_policy(Some(d(2020, 5, 1)), policy));
        assert!(is_after_policy(Some(d(2020, 5, 2)), policy));
        assert!(!is_after_policy(Some(d(2020, 5, 2)), None));
        assert!(!is_after_policy(None, policy));
    }

    #[test]
    fn end_to_end_boundary_and_group_means() {
        let ca = Some(d(2020, 5, 1));
        let tx = Some(d(2020, 5, 5));
        let records = vec![
            rec("California", "democrat", d(2020, 5, 3), 40.0, ca),
            rec("California", "democrat", d(2020, 5, 2), 30.0, ca),
            rec("California", "democrat", d(2020, 5, 1), 10.0, ca),
            rec("California", "democrat", d(2020, 4, 30), 4.0, ca),
            rec("Texas", "republican", d(2020, 5, 3), 9.0, tx),
            rec("Texas", "republican", d(2020, 5, 2), 5.0, tx),
            rec("Texas", "republican", d(2020, 5, 1), 1.0, tx),
        ];
        let rows = derive(records.clone());
        assert_eq!(rows.len(), records.len());
        for (row, original) in rows.iter().zip(&records) {
            assert_eq!(&row.record, original);
        }

        let flags: Vec<bool> = rows.iter().map(|r| r.after_policy).collect();
        assert_eq!(flags, vec![true, true, false, false, false, false, false]);

        let nc: Vec<Option<f64>> = rows.iter().map(|r| r.new_cases).collect();
        assert_eq!(
            nc,
            vec![Some(10.0), Some(20.0), Some(6.0), None, Some(4.0), Some(4.0), None]
        );

        // (California, after) = mean(10, 20); (California, before) = mean(6)
        assert_eq!(rows[0].new_case_after, Some(15.0));
        assert_eq!(rows[1].new_case_after, Some(15.0));
        assert_eq!(rows[2].new_case_after, Some(6.0));
        assert_eq!(rows[3].new_case_after, Some(6.0));
        assert_eq!(rows[4].new_case_after, Some(4.0));

        // per date: 2020-05-02 → mean(20, 4)
        assert_eq!(rows[1].new_case_total, Some(12.0));
        assert_eq!(rows[5].new_case_total, Some(12.0));
        // per (date, party)
        assert_eq!(rows[1].new_case_mean_party, Some(20.0));
        assert_eq!(rows[5].new_case_mean_party, Some(4.0));
        assert_eq!(rows[0].tot_avg_party, Some(40.0));
        // 2020-04-30 has no democrat new_cases at all
        assert_eq!(rows[3].new_case_mean_party, None);
    }

    #[test]
    fn new_case_after_matches_manual_mean() {
        let p = Some(d(2020, 5, 2));
        let records: Vec<UnifiedRecord> = (1..=10)
            .map(|day| rec("Iowa", "republican", d(2020, 5, day), (day * day) as f64, p))
            .collect();
        let rows = derive(records);
        let after: Vec<f64> = rows
            .iter()
            .filter(|r| r.after_policy)
            .filter_map(|r| r.new_cases)
            .collect();
        let expected = after.iter().sum::<f64>() / after.len() as f64;
        for r in rows.iter().filter(|r| r.after_policy) {
            assert_eq!(r.new_case_after, Some(expected));
        }
    }

    fn analysis(state: &str, party: &str, value: Option<f64>, after: bool) -> AnalysisRecord {
        let mut record = rec(state, party, d(2020, 6, 1), 0.0, None);
        record.state_code = Some(state.chars().take(2).collect());
        AnalysisRecord {
            record,
            tot_avg_party: None,
            new_cases: None,
            new_case_mean_party: None,
            new_case_total: None,
            after_policy: after,
            new_case_after: value,
        }
    }

    #[test]
    fn top_states_keeps_25_highest_descending() {
        let mut rows = Vec::new();
        for i in 0..30 {
            let party = if i % 2 == 0 { "republican" } else { "democrat" };
            // two rows per state to exercise de-duplication
            rows.push(analysis(&format!("S{:02}", i), party, Some(i as f64), true));
            rows.push(analysis(&format!("S{:02}", i), party, Some(i as f64), true));
            rows.push(analysis(&format!("S{:02}", i), party, Some(1000.0), false));
        }
        let top = top_states_after_policy(&rows, 25);
        assert_eq!(top.len(), 25);
        let values: Vec<f64> = top.iter().map(|s| s.new_case_after).collect();
        let expected: Vec<f64> = (5..30).rev().map(|i| i as f64).collect();
        assert_eq!(values, expected);
        assert_eq!(top[0].state_name, "S29");
        assert_eq!(top[0].party.as_deref(), Some("democrat"));
    }

    #[test]
    fn top_states_ties_keep_input_order_and_skip_nulls() {
        let rows = vec![
            analysis("Bravo", "democrat", Some(5.0), true),
            analysis("Alpha", "republican", Some(5.0), true),
            analysis("Charlie", "republican", Some(9.0), true),
            analysis("Delta", "republican", None, true),
        ];
        let top = top_states_after_policy(&rows, 3);
        let names: Vec<&str> = top.iter().map(|s| s.state_name.as_str()).collect();
        assert_eq!(names, vec!["Charlie", "Bravo", "Alpha"]);
    }
}
