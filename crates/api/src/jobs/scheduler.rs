//! Periodic background jobs and the shutdown signal they share.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// How often a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFrequency {
    Seconds(u64),
    Minutes(u64),
}

impl JobFrequency {
    pub fn duration(&self) -> Duration {
        match *self {
            JobFrequency::Seconds(secs) => Duration::from_secs(secs),
            JobFrequency::Minutes(mins) => Duration::from_secs(mins.saturating_mul(60)),
        }
    }
}

/// A unit of periodic background work.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    /// Stable name, used as the `job` label in logs and metrics.
    fn name(&self) -> &'static str;

    fn frequency(&self) -> JobFrequency;

    /// One run. An `Err` is logged and counted; the job keeps its schedule.
    async fn execute(&self) -> Result<(), String>;
}

/// Owns the periodic jobs plus any task that should stop with them.
///
/// A run that overruns its interval delays the next one instead of queueing
/// extra runs. The first run happens one interval after `start`.
pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    stop: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    pub fn new() -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            stop,
            tasks: Vec::new(),
        }
    }

    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    /// A receiver that flips to `true` on shutdown.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.stop.subscribe()
    }

    /// Adopts an externally spawned task so shutdown waits for it.
    pub fn track(&mut self, handle: JoinHandle<()>) {
        self.tasks.push(handle);
    }

    pub fn start(&mut self) {
        info!(jobs = self.jobs.len(), "Starting job scheduler");

        let spawned: Vec<_> = self
            .jobs
            .iter()
            .map(|job| tokio::spawn(run_periodically(Arc::clone(job), self.stop.subscribe())))
            .collect();
        self.tasks.extend(spawned);
    }

    /// Signals every job and tracked task to stop. Returns immediately.
    pub fn shutdown(&self) {
        info!("Stopping job scheduler");
        self.stop.send_replace(true);
    }

    /// Waits for every job and tracked task, giving up after `timeout`.
    pub async fn wait_for_shutdown(self, timeout: Duration) {
        let pending = self.tasks.len();
        match tokio::time::timeout(timeout, join_all(self.tasks)).await {
            Ok(results) => {
                for err in results.into_iter().filter_map(Result::err) {
                    warn!(error = %err, "Background task panicked");
                }
                info!(tasks = pending, "Background tasks stopped");
            }
            Err(_) => warn!(?timeout, "Background tasks did not stop in time"),
        }
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_periodically(job: Arc<dyn Job>, mut stop: watch::Receiver<bool>) {
    let name = job.name();
    let frequency = job.frequency();

    let mut interval = tokio::time::interval(frequency.duration());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;
    info!(job = name, ?frequency, "Job scheduled");

    loop {
        tokio::select! {
            _ = interval.tick() => run_once(job.as_ref()).await,
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
        }
    }
    info!(job = name, "Job stopped");
}

/// Runs one execution, logging and counting the result.
pub async fn run_once(job: &dyn Job) {
    let name = job.name();
    let start = Instant::now();
    let result = job.execute().await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    let outcome = match result {
        Ok(()) => {
            info!(job = name, elapsed_ms, "Job run completed");
            "success"
        }
        Err(e) => {
            error!(job = name, elapsed_ms, error = %e, "Job run failed");
            "failure"
        }
    };
    metrics::counter!("job_runs_total", "job" => name, "outcome" => outcome).increment(1);
}
