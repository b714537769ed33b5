//! Recurring driver for the internship sweep.

use super::{
    error::WorkflowResult,
    sweep::{InternshipSweep, SweepReport},
};
use crate::placement::ports::{NotificationQueue, PlacementStore};
use mockable::Clock;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as RunGuard, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Default interval between sweep passes.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

struct RunningLoop {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Runs the sweep once at start and then on a fixed interval.
///
/// Scheduled passes and [`SweepScheduler::run_now`] share one guard, so
/// passes never overlap. Ticks missed while a pass runs are skipped.
pub struct SweepScheduler<S, N, C>
where
    S: PlacementStore + 'static,
    N: NotificationQueue + 'static,
    C: Clock + Send + Sync + 'static,
{
    sweep: Arc<InternshipSweep<S, N, C>>,
    interval: Duration,
    run_guard: Arc<RunGuard<()>>,
    running: Mutex<Option<RunningLoop>>,
}

impl<S, N, C> SweepScheduler<S, N, C>
where
    S: PlacementStore + 'static,
    N: NotificationQueue + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a stopped scheduler.
    #[must_use]
    pub fn new(sweep: InternshipSweep<S, N, C>, interval: Duration) -> Self {
        Self {
            sweep: Arc::new(sweep),
            interval,
            run_guard: Arc::new(RunGuard::new(())),
            running: Mutex::new(None),
        }
    }

    /// Starts the recurring loop on the current tokio runtime.
    ///
    /// Returns `false` without doing anything when the loop is already
    /// running.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
        {
            return false;
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.sweep),
            Arc::clone(&self.run_guard),
            self.interval,
            shutdown_rx,
        ));
        *running = Some(RunningLoop { shutdown, handle });
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "sweep scheduler started"
        );
        true
    }

    /// Signals the loop to stop and waits for it to finish its current pass.
    ///
    /// Returns `false` when the loop was not running.
    pub async fn stop(&self) -> bool {
        let active = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(RunningLoop { shutdown, handle }) = active else {
            return false;
        };
        if shutdown.send(true).is_err() {
            tracing::debug!("sweep loop already gone");
        }
        if let Err(err) = handle.await {
            tracing::warn!(error = %err, "sweep loop ended abnormally");
        }
        tracing::info!("sweep scheduler stopped");
        true
    }

    /// Returns `true` while the recurring loop runs.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }

    /// Runs one pass now, waiting for any pass in progress to finish first.
    ///
    /// # Errors
    ///
    /// Returns the sweep error when due internships cannot be selected.
    pub async fn run_now(&self) -> WorkflowResult<SweepReport> {
        let _pass = self.run_guard.lock().await;
        self.sweep.run_once().await
    }
}

impl<S, N, C> Drop for SweepScheduler<S, N, C>
where
    S: PlacementStore + 'static,
    N: NotificationQueue + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn drop(&mut self) {
        let active = self
            .running
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(active) = active {
            active.handle.abort();
        }
    }
}

async fn run_loop<S, N, C>(
    sweep: Arc<InternshipSweep<S, N, C>>,
    run_guard: Arc<RunGuard<()>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) where
    S: PlacementStore + 'static,
    N: NotificationQueue + 'static,
    C: Clock + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let _pass = run_guard.lock().await;
                if let Err(err) = sweep.run_once().await {
                    tracing::warn!(error = %err, "scheduled sweep failed");
                }
            }
        }
    }
}
