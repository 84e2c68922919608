use std::path::Path;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{error, info};

use redwatch_alerts::NoticeQueue;
use redwatch_core::RedwatchConfig;
use redwatch_scheduler::{Schedule, SchedulerEngine};
use redwatch_worker::{dispatch_job, run_pipeline_job, PIPELINE_JOB, RETENTION_JOB};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "redwatch=info".into()),
        )
        .init();

    // Config: explicit path > REDWATCH_CONFIG env > ~/.redwatch/redwatch.toml.
    // A config the pipeline cannot run with aborts startup here.
    let config_path = std::env::var("REDWATCH_CONFIG").ok();
    let config = RedwatchConfig::load(config_path.as_deref())?;

    if let Some(parent) = Path::new(&config.database.path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    info!(
        interval_minutes = config.poll.interval_minutes,
        retention_days = config.poll.retention_days,
        "starting worker"
    );

    let notices = Arc::new(NoticeQueue::new());

    // One immediate pipeline run before the schedule takes over.
    info!("running initial pipeline");
    run_pipeline_job(&config, notices.clone()).await;

    let (fired_tx, mut fired_rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler_conn = rusqlite::Connection::open(&config.database.path)?;
    let engine = SchedulerEngine::new(scheduler_conn, fired_tx)?;
    engine.clear_jobs()?;
    engine.add_job(
        PIPELINE_JOB,
        Schedule::Interval {
            every_secs: config.poll.interval_minutes * 60,
        },
        "{}",
    )?;
    engine.add_job(RETENTION_JOB, Schedule::Daily { hour: 3, minute: 0 }, "{}")?;
    tokio::spawn(engine.run(shutdown_rx));

    // Fired jobs run one at a time, so a pipeline tick always finishes
    // before the next starts. Each handler runs in its own task so a
    // panic is contained, logged, and the loop keeps going.
    loop {
        tokio::select! {
            Some(job) = fired_rx.recv() => {
                let config = config.clone();
                let notices = notices.clone();
                let handle = tokio::spawn(async move {
                    dispatch_job(&job, &config, notices).await;
                });
                if let Err(e) = handle.await {
                    error!(error = %e, "scheduled job panicked");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                let _ = shutdown_tx.send(true);
                break;
            }
        }
    }

    Ok(())
}
