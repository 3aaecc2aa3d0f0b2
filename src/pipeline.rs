//! The run as an ordered list of named stages.
//!
//! fetch → reconcile → parties → build → derive → render

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::time::Instant;
use tracing::info;

use crate::{
    chart,
    config::Config,
    fetch,
    process::{
        aggregate,
        dataset::{self, JoinStats},
        policy::{self, PartyPolicySummary},
        read_csv_file,
        records::{AnalysisRecord, DailyCaseRecord, PartyRecord, ReconciledPolicy, UnifiedRecord},
        states::StateLookup,
        write_csv_file, TableKey,
    },
};

/// Everything the charts need, plus what was persisted along the way.
#[derive(Debug)]
pub struct Prepared {
    pub policies: Vec<ReconciledPolicy>,
    pub parties: Vec<PartyRecord>,
    pub policy_summary: Vec<PartyPolicySummary>,
    pub join_stats: JoinStats,
    pub rows: Vec<AnalysisRecord>,
}

/// Stage 1: download the daily case table to the registry's daily path,
/// whatever the URL's own file name.
#[tracing::instrument(level = "info", skip_all, fields(url = %cfg.daily_url))]
pub fn fetch_daily(cfg: &Config, client: &Client) -> Result<()> {
    let dest = cfg.registry().path(TableKey::Daily);
    fetch::download_csv(client, &cfg.daily_url, &dest)
}

/// Stage 2: reconcile policy dates and persist them.
#[tracing::instrument(level = "info", skip_all, fields(year = cfg.policy_year))]
pub fn reconcile(cfg: &Config) -> Result<Vec<ReconciledPolicy>> {
    let policies = policy::load_and_reconcile(&cfg.registry(), cfg.policy_year)?;
    let out = cfg.output(&cfg.reopening_out);
    write_csv_file(&out, &policies)?;
    info!(states = policies.len(), path = %out.display(), "policy dates saved");
    Ok(policies)
}

/// Governor party table: remote when online, else the copy saved by an
/// earlier online run.
#[tracing::instrument(level = "info", skip_all, fields(online = client.is_some()))]
pub fn load_parties(cfg: &Config, client: Option<&Client>) -> Result<Vec<PartyRecord>> {
    let out = cfg.output(&cfg.party_out);
    match client {
        Some(client) => {
            let parties: Vec<PartyRecord> = fetch::fetch_csv(client, &cfg.party_url)?;
            write_csv_file(&out, &parties)?;
            info!(rows = parties.len(), path = %out.display(), "party table saved");
            Ok(parties)
        }
        None => read_csv_file(&out).with_context(|| {
            format!("offline run needs a saved party table at {:?}", out)
        }),
    }
}

/// Stage 3: join everything and checkpoint the result before derivation.
#[tracing::instrument(level = "info", skip_all)]
pub fn build(
    cfg: &Config,
    policies: &[ReconciledPolicy],
    parties: &[PartyRecord],
) -> Result<(Vec<UnifiedRecord>, JoinStats)> {
    let cases: Vec<DailyCaseRecord> = cfg.registry().load(TableKey::Daily)?;
    let (records, stats) = dataset::build(&cases, StateLookup::get(), policies, parties);
    let out = cfg.output(&cfg.data_out);
    write_csv_file(&out, &records)?;
    info!(rows = records.len(), path = %out.display(), "unified dataset saved");
    Ok((records, stats))
}

/// Policy-date comparison between parties, persisted alongside the data.
#[tracing::instrument(level = "info", skip_all)]
pub fn summarize_policy(
    cfg: &Config,
    policies: &[ReconciledPolicy],
    parties: &[PartyRecord],
) -> Result<Vec<PartyPolicySummary>> {
    let summary = policy::policy_party_summary(policies, parties);
    for s in &summary {
        info!(
            party = %s.party,
            states = s.states,
            mean_policy_date = ?s.mean_policy_date,
            "policy date by party"
        );
    }
    write_csv_file(&cfg.output(&cfg.policy_summary_out), &summary)?;
    Ok(summary)
}

/// Every stage up to (not including) chart rendering.
pub fn prepare(cfg: &Config, client: Option<&Client>) -> Result<Prepared> {
    if let Some(client) = client {
        fetch_daily(cfg, client)?;
    } else {
        info!("offline run; using local daily table");
    }

    let policies = reconcile(cfg)?;
    let parties = load_parties(cfg, client)?;
    let policy_summary = summarize_policy(cfg, &policies, &parties)?;
    let (records, join_stats) = build(cfg, &policies, &parties)?;
    let rows = aggregate::derive(records);

    Ok(Prepared {
        policies,
        parties,
        policy_summary,
        join_stats,
        rows,
    })
}

/// Stage 4: both charts.
#[tracing::instrument(level = "info", skip_all)]
pub fn render(cfg: &Config, rows: &[AnalysisRecord]) -> Result<()> {
    chart::render_timeseries(
        rows,
        (cfg.chart_start, cfg.chart_end),
        &cfg.output(&cfg.timeseries_png),
    )?;
    chart::render_top_states(rows, cfg.top_n, &cfg.output(&cfg.top_states_png))?;
    Ok(())
}

/// The whole run.
#[tracing::instrument(level = "info", skip(cfg), fields(online = cfg.go_online))]
pub fn run(cfg: &Config) -> Result<Prepared> {
    let start = Instant::now();
    let client = if cfg.go_online {
        Some(fetch::client()?)
    } else {
        None
    };
    let prepared = prepare(cfg, client.as_ref())?;
    render(cfg, &prepared.rows)?;
    info!(elapsed = ?start.elapsed(), rows = prepared.rows.len(), "run complete");
    Ok(prepared)
}
