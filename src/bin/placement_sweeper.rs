//! Runs the internship sweep against `PostgreSQL` until interrupted.
//!
//! Usage:
//!
//! ```text
//! placement-sweeper
//! ```
//!
//! Settings are read from the environment (and `.env` when present);
//! `DATABASE_URL` is required. The sweep runs once at start and then every
//! `PLACEMENT_SWEEP_INTERVAL_SECS` seconds. Ctrl-C stops the scheduler after
//! the pass in progress finishes.

use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use mockable::DefaultClock;
use placement_engine::config::{ConfigError, EngineConfig};
use placement_engine::placement::{
    adapters::{postgres::PostgresPlacementStore, tracing_queue::TracingNotificationQueue},
    services::{InternshipSweep, SweepScheduler, TransitionPipeline},
};
use placement_engine::telemetry::{self, TelemetryError};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Builder;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that stop the sweeper before or while it runs.
#[derive(Debug, Error)]
enum SweeperError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to build connection pool: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to build tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("failed to wait for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),
}

fn build_runtime() -> Result<tokio::runtime::Runtime, SweeperError> {
    Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(SweeperError::Runtime)
}

async fn run(config: &EngineConfig) -> Result<(), SweeperError> {
    let url = config.database.require_url()?;
    let pool = Pool::builder()
        .max_size(config.database.pool_size)
        .build(ConnectionManager::<PgConnection>::new(url))?;

    let store = Arc::new(PostgresPlacementStore::new(pool));
    let queue = Arc::new(TracingNotificationQueue::new());
    let clock = Arc::new(DefaultClock);
    let pipeline = TransitionPipeline::new(
        Arc::clone(&store),
        Arc::clone(&queue),
        Arc::clone(&clock),
    )
    .with_retry_backoff(config.workflow.retry_backoff);
    let sweep = InternshipSweep::new(store, queue, clock).with_pipeline(pipeline);
    let scheduler = SweepScheduler::new(sweep, config.workflow.sweep_interval);

    scheduler.start();
    let signal = tokio::signal::ctrl_c().await;
    scheduler.stop().await;
    signal.map_err(SweeperError::Signal)
}

fn main() -> Result<(), BoxError> {
    let config = EngineConfig::load().map_err(SweeperError::from)?;
    telemetry::init(&config.telemetry).map_err(SweeperError::from)?;
    tracing::info!(environment = ?config.environment, "placement sweeper starting");

    let runtime = build_runtime()?;
    runtime.block_on(run(&config))?;
    tracing::info!("placement sweeper exited");
    Ok(())
}
