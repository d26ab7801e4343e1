pub mod nightly_export;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Utc};
use tokio::sync::broadcast;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::config::{SchedulerConfig, TriggerConfig};
use crate::gate::WindowGate;

/// Drain period before scheduler shutdown to let an in-flight export finish.
#[cfg(test)]
const DRAIN_TIMEOUT: Duration = Duration::from_millis(10);
#[cfg(not(test))]
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerName {
    NightlyExport,
}

impl WorkerName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NightlyExport => "nightly_export",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: WorkerName,
    /// Six-field cron expression, evaluated in UTC.
    pub cron: String,
    pub enabled: bool,
}

pub struct WorkerManager {
    trigger: TriggerConfig,
    shutdown_rx: broadcast::Receiver<()>,
    config: SchedulerConfig,
}

impl WorkerManager {
    pub fn new(
        trigger: &TriggerConfig,
        shutdown_rx: broadcast::Receiver<()>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            trigger: trigger.clone(),
            shutdown_rx,
            config: config.clone(),
        }
    }

    /// One export job per UTC hour the target local hour can fall on.
    ///
    /// The gate inside each run drops firings that land outside the window.
    /// See `WindowGate::utc_trigger_hours` for the DST edge days.
    pub fn planned_jobs(&self) -> Vec<JobSpec> {
        if !self.config.enabled {
            return Vec::new();
        }

        WindowGate::from_config(&self.trigger)
            .utc_trigger_hours(Utc::now().year())
            .into_iter()
            .map(|hour| JobSpec {
                name: WorkerName::NightlyExport,
                cron: format!("0 0 {hour} * * *"),
                enabled: true,
            })
            .collect()
    }

    /// Run the scheduler until a shutdown signal arrives.
    pub async fn start(mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if !self.config.enabled {
            tracing::info!("Scheduler disabled; skipping worker startup");
            return Ok(());
        }

        let mut scheduler = JobScheduler::new().await?;

        self.register_jobs(&scheduler).await;

        scheduler.start().await?;

        tracing::info!("Worker manager started");
        let _ = self.shutdown_rx.recv().await;

        tracing::info!(
            "Worker manager shutting down, draining for {}s",
            DRAIN_TIMEOUT.as_secs()
        );
        tokio::time::sleep(DRAIN_TIMEOUT).await;
        let _ = scheduler.shutdown().await;
        Ok(())
    }

    async fn register_jobs(&self, scheduler: &JobScheduler) {
        let timeout = Duration::from_secs(self.config.job_timeout_secs);
        // All cron entries share one guard so overlapping firings never run twice.
        let running = Arc::new(AtomicBool::new(false));

        for spec in self.planned_jobs() {
            if !spec.enabled {
                tracing::info!(name = spec.name.as_str(), "Skipping disabled worker");
                continue;
            }

            let name_str = spec.name.as_str();
            match spec.name {
                WorkerName::NightlyExport => {
                    let trigger = self.trigger.clone();
                    add_job(
                        scheduler,
                        &spec.cron,
                        name_str,
                        running.clone(),
                        timeout,
                        move || {
                            let trigger = trigger.clone();
                            async move {
                                nightly_export::run(&trigger).await;
                            }
                        },
                    )
                    .await;
                }
            }
            tracing::info!(name = name_str, cron = %spec.cron, "Registered worker");
        }
    }
}

/// Holds the shared in-progress flag; dropping it clears the flag, including
/// when the job panics and its future unwinds.
struct RunningGuard(Arc<AtomicBool>);

impl RunningGuard {
    fn acquire(running: &Arc<AtomicBool>) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(running.clone()))
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

async fn run_bounded<Fut>(_guard: RunningGuard, name: &'static str, timeout: Duration, fut: Fut)
where
    Fut: std::future::Future<Output = ()>,
{
    if tokio::time::timeout(timeout, fut).await.is_err() {
        tracing::error!(
            worker = name,
            timeout_secs = timeout.as_secs(),
            "Worker timed out"
        );
    }
}

/// Add a job to the scheduler with an overlap guard and timeout wrapper.
async fn add_job<Fut, F>(
    scheduler: &JobScheduler,
    cron: &str,
    name: &'static str,
    running: Arc<AtomicBool>,
    timeout: Duration,
    mut run: F,
) where
    F: FnMut() -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let Some(guard) = RunningGuard::acquire(&running) else {
            tracing::warn!(
                worker = name,
                "Skipping worker invocation: previous run still in progress"
            );
            return Box::pin(async {});
        };

        Box::pin(run_bounded(guard, name, timeout, run()))
    });

    match job {
        Ok(job) => {
            if let Err(err) = scheduler.add(job).await {
                tracing::error!(error=%err, cron, worker = name, "Failed to add worker job");
            }
        }
        Err(err) => tracing::error!(error=%err, cron, worker = name, "Failed to create worker job"),
    }
}
