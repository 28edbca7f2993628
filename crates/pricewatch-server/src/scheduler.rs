//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring watch cycle.

use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::watch::{CycleReport, Orchestrator};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    orchestrator: Arc<Orchestrator>,
    interval: Duration,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_watch_job(&scheduler, orchestrator, interval).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the fixed-interval watch cycle. A tick that fires while the
/// previous cycle is still running is skipped by the orchestrator.
async fn register_watch_job(
    scheduler: &JobScheduler,
    orchestrator: Arc<Orchestrator>,
    interval: Duration,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
        let orchestrator = Arc::clone(&orchestrator);

        Box::pin(async move {
            tracing::info!("scheduler: starting watch cycle");
            match orchestrator.run_cycle().await {
                CycleReport::Completed(stats) => {
                    tracing::debug!(?stats, "scheduler: watch cycle finished");
                }
                CycleReport::Skipped => {
                    tracing::info!("scheduler: previous watch cycle still running");
                }
                CycleReport::StoreUnavailable => {
                    tracing::error!("scheduler: watch cycle aborted, store unavailable");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(interval_secs = interval.as_secs(), "scheduler: watch job registered");
    Ok(())
}
