use anyhow::Result;
use reopening::{config::Config, pipeline};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reopening=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let cfg = Config::from_env()?;
    info!(
        online = cfg.go_online,
        data_dir = %cfg.data_dir.display(),
        output_dir = %cfg.output_dir.display(),
        "configured"
    );

    // ─── 3) fetch → reconcile → build → derive → render ─────────────
    match pipeline::run(&cfg) {
        Ok(prepared) => {
            info!(
                rows = prepared.rows.len(),
                states_with_policy = prepared.policies.len(),
                "all done"
            );
            Ok(())
        }
        Err(e) => {
            error!("run failed: {:#}", e);
            Err(e)
        }
    }
}
