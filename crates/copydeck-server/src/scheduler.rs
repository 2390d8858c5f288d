//! Background job scheduler.
//!
//! Registers the recurring cache sweep. The durable store expires keys on its
//! own, so the sweep only does work for the in-memory backend.

use copydeck_analytics::AnalysisOrchestrator;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the cron expression is invalid or the
/// scheduler cannot be started.
pub async fn build_scheduler(
    orchestrator: AnalysisOrchestrator,
    sweep_cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_cache_sweep_job(&scheduler, orchestrator, sweep_cron).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_cache_sweep_job(
    scheduler: &JobScheduler,
    orchestrator: AnalysisOrchestrator,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let orchestrator = orchestrator.clone();
        Box::pin(async move {
            run_cache_sweep(&orchestrator).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: registered cache sweep job");
    Ok(())
}

async fn run_cache_sweep(orchestrator: &AnalysisOrchestrator) -> usize {
    let removed = orchestrator.purge_expired_cache().await;
    if removed > 0 {
        tracing::info!(removed, "scheduler: swept expired cache entries");
    } else {
        tracing::debug!("scheduler: cache sweep found nothing to remove");
    }
    removed
}
