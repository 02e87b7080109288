//! Background search jobs with poll-able progress.
//!
//! [`JobRegistry::submit`] validates a request synchronously, then runs the
//! search on a worker thread. Each job gets its own [`ProgressRecord`],
//! keyed by [`JobId`], so concurrent searches never overwrite each other's
//! progress.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::JoinHandle;

use crate::catalog::CatalogLookup;
use crate::error::{JobError, SearchError};
use crate::report::SearchResult;
use crate::search::{
    ItemRequest, Optimizer, PfcTriple, SearchConfig, SearchOutcome, SearchProblem,
};

/// Identifier handed out by [`JobRegistry::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JobStatus {
    Running,
    Done,
    Cancelled,
    Failed,
}

impl JobStatus {
    /// Whether the job will publish no further updates.
    pub fn is_finished(self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

/// Latest observable state of one job.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressRecord {
    /// 0–100, never decreasing over the life of a job.
    pub percent_complete: u8,
    pub status: JobStatus,
    pub status_text: String,
    /// Present once the job is `Done` or `Cancelled`.
    pub result: Option<SearchResult>,
}

impl ProgressRecord {
    fn starting() -> Self {
        Self {
            percent_complete: 0,
            status: JobStatus::Running,
            status_text: "starting".into(),
            result: None,
        }
    }
}

struct JobEntry {
    record: ProgressRecord,
    cancel: Arc<AtomicBool>,
}

type JobTable = Arc<RwLock<HashMap<JobId, JobEntry>>>;

/// Accepts search requests and tracks their progress.
///
/// # Usage
///
/// ```ignore
/// let registry = JobRegistry::new(Arc::new(catalog), SearchConfig::default())?;
/// let id = registry.submit(&requests, target)?;
/// let record = registry.poll(id)?;
/// println!("{}% {}", record.percent_complete, record.status_text);
/// ```
pub struct JobRegistry<C: CatalogLookup> {
    catalog: Arc<C>,
    config: SearchConfig,
    jobs: JobTable,
    handles: Mutex<HashMap<JobId, JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl<C: CatalogLookup> JobRegistry<C> {
    /// Creates a registry that runs every job with `config`.
    ///
    /// # Errors
    /// Returns [`SearchError::InvalidConfig`] if `config` does not validate.
    pub fn new(catalog: Arc<C>, config: SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self {
            catalog,
            config,
            jobs: Arc::new(RwLock::new(HashMap::new())),
            handles: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Validates a request and starts it on a background worker.
    ///
    /// Validation errors are returned before any search work begins.
    pub fn submit(&self, requests: &[ItemRequest], target: PfcTriple) -> Result<JobId, JobError> {
        let problem = SearchProblem::build(self.catalog.as_ref(), requests, target)?;
        let id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let cancel = Arc::new(AtomicBool::new(false));

        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id,
                JobEntry {
                    record: ProgressRecord::starting(),
                    cancel: Arc::clone(&cancel),
                },
            );
        log::info!("job {id} accepted: {} items", problem.dims());

        let jobs = Arc::clone(&self.jobs);
        let config = self.config.clone();
        let handle = std::thread::spawn(move || run_job(id, &problem, &config, &jobs, cancel));
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, handle);
        Ok(id)
    }

    /// Returns the latest progress record of a job.
    pub fn poll(&self, id: JobId) -> Result<ProgressRecord, JobError> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .map(|entry| entry.record.clone())
            .ok_or(JobError::UnknownJob(id))
    }

    /// Asks a running job to stop after its current generation.
    ///
    /// Cancelling a finished job is a no-op.
    pub fn cancel(&self, id: JobId) -> Result<(), JobError> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        let entry = jobs.get(&id).ok_or(JobError::UnknownJob(id))?;
        entry.cancel.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Blocks until a job's worker exits, then returns its final record.
    pub fn wait(&self, id: JobId) -> Result<ProgressRecord, JobError> {
        let handle = self
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::error!("job {id} worker panicked");
                update(&self.jobs, id, |record| {
                    record.status = JobStatus::Failed;
                    record.status_text = "worker panicked".into();
                });
            }
        }
        self.poll(id)
    }

    /// Drops a finished job's record. Running jobs are kept.
    ///
    /// Returns the removed record, if any.
    pub fn forget(&self, id: JobId) -> Result<Option<ProgressRecord>, JobError> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let entry = jobs.get(&id).ok_or(JobError::UnknownJob(id))?;
        if !entry.record.status.is_finished() {
            return Ok(None);
        }
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        Ok(jobs.remove(&id).map(|entry| entry.record))
    }

    /// Ids of all tracked jobs, ascending.
    pub fn job_ids(&self) -> Vec<JobId> {
        let mut ids: Vec<JobId> = self
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        ids.sort();
        ids
    }
}

fn run_job(
    id: JobId,
    problem: &SearchProblem,
    config: &SearchConfig,
    jobs: &JobTable,
    cancel: Arc<AtomicBool>,
) {
    run_guarded(id, jobs, || {
        Optimizer::run_with_progress(
            problem,
            config,
            |progress| {
                update(jobs, id, |record| {
                    record.percent_complete =
                        record.percent_complete.max(progress.percent_complete);
                    record.status_text = progress.status_text.clone();
                });
            },
            Some(cancel),
        )
    });
}

/// Runs `work` and publishes its terminal status. A panic inside `work` is
/// caught and published as [`JobStatus::Failed`], so pollers never see a
/// dead job stuck at `Running`.
fn run_guarded<F>(id: JobId, jobs: &JobTable, work: F)
where
    F: FnOnce() -> Result<SearchOutcome, SearchError>,
{
    let outcome = match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let reason = panic_message(&*payload);
            log::error!("job {id} worker panicked: {reason}");
            update(jobs, id, |record| {
                record.status = JobStatus::Failed;
                record.status_text = format!("worker panicked: {reason}");
            });
            return;
        }
    };

    match outcome {
        Ok(outcome) if outcome.stats.cancelled => {
            log::info!(
                "job {id} cancelled after {} generations",
                outcome.stats.generations
            );
            update(jobs, id, |record| {
                record.status = JobStatus::Cancelled;
                record.status_text = "cancelled".into();
                record.result = Some(outcome.result);
            });
        }
        Ok(outcome) => {
            let best = outcome
                .result
                .best()
                .map_or(f64::NAN, |r| r.total_absolute_delta);
            log::info!("job {id} done: total deviation {best:.3}");
            update(jobs, id, |record| {
                record.percent_complete = 100;
                record.status = JobStatus::Done;
                record.status_text = "done".into();
                record.result = Some(outcome.result);
            });
        }
        Err(e) => {
            log::error!("job {id} failed: {e}");
            update(jobs, id, |record| {
                record.status = JobStatus::Failed;
                record.status_text = e.to_string();
            });
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

fn update<F: FnOnce(&mut ProgressRecord)>(jobs: &JobTable, id: JobId, f: F) {
    let mut jobs = jobs.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(entry) = jobs.get_mut(&id) {
        f(&mut entry.record);
    }
}
