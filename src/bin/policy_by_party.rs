//! Print the policy-date comparison between parties from a previous run's
//! `state_reopeningdate.csv` and `us_party.csv`.

use anyhow::Result;
use reopening::{
    config::Config,
    process::{
        policy::policy_party_summary,
        read_csv_file,
        records::{PartyRecord, ReconciledPolicy},
    },
};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cfg = Config::from_env()?;
    let policies: Vec<ReconciledPolicy> = read_csv_file(&cfg.output(&cfg.reopening_out))?;
    let parties: Vec<PartyRecord> = read_csv_file(&cfg.output(&cfg.party_out))?;

    let fmt_date = |d: Option<chrono::NaiveDate>| {
        d.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
    };

    println!(
        "{:<12} {:>6} {:>10} {:>12} {:>12} {:>12}",
        "party", "states", "with_date", "mean", "earliest", "latest"
    );
    for s in policy_party_summary(&policies, &parties) {
        println!(
            "{:<12} {:>6} {:>10} {:>12} {:>12} {:>12}",
            s.party,
            s.states,
            s.states_with_date,
            fmt_date(s.mean_policy_date),
            fmt_date(s.earliest_policy_date),
            fmt_date(s.latest_policy_date),
        );
    }
    Ok(())
}
