//! Background processing of form jobs.
//!
//! One worker thread drains a FIFO channel, so at most one job runs at a
//! time. Status lives in a shared map that callers can poll while the worker
//! makes progress.

use crate::collaborators::{Binarizer, OcrEngine, SpeechToText};
use crate::config::schema::EngineConfig;
use crate::error::FormBindError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{info, warn};
use uuid::Uuid;

pub type JobId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    /// Terminal; the record carries the message.
    Error,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// Inputs of one job: the scanned page, the recorded conversation, and where
/// the result JSON goes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub image: PathBuf,
    pub media: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub request: JobRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobOutcome {
    pub output: PathBuf,
    pub bound_fields: usize,
    pub total_fields: usize,
    pub confidence_score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub id: JobId,
    pub status: JobStatus,
    pub request: JobRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<JobOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Submission order.
    #[serde(skip)]
    seq: u64,
}

/// Does the actual work of a job on the worker thread.
pub trait JobProcessor: Send + 'static {
    fn process(&self, job: &Job) -> Result<JobOutcome, FormBindError>;
}

type StatusMap = Arc<Mutex<HashMap<JobId, JobRecord>>>;

fn lock(statuses: &StatusMap) -> MutexGuard<'_, HashMap<JobId, JobRecord>> {
    statuses.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run one job, turning a panic inside the processor into a job error.
fn run_job<P: JobProcessor>(processor: &P, job: &Job) -> Result<JobOutcome, FormBindError> {
    panic::catch_unwind(AssertUnwindSafe(|| processor.process(job))).unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        Err(FormBindError::Job(format!("processor panicked: {message}")))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

fn set_status(statuses: &StatusMap, id: JobId, update: impl FnOnce(&mut JobRecord)) {
    if let Some(record) = lock(statuses).get_mut(&id) {
        update(record);
    }
}

/// FIFO job queue with a single worker thread.
pub struct JobQueue {
    sender: Option<Sender<Job>>,
    statuses: StatusMap,
    worker: Option<JoinHandle<()>>,
    next_seq: AtomicU64,
}

impl JobQueue {
    /// Spawn the worker thread.
    pub fn start<P: JobProcessor>(processor: P) -> Self {
        let (sender, receiver) = channel::<Job>();
        let statuses: StatusMap = Arc::new(Mutex::new(HashMap::new()));
        let worker_statuses = Arc::clone(&statuses);

        let worker = thread::spawn(move || {
            for job in receiver {
                set_status(&worker_statuses, job.id, |r| r.status = JobStatus::Processing);
                info!(job = %job.id, image = %job.request.image.display(), "job started");

                match run_job(&processor, &job) {
                    Ok(outcome) => {
                        info!(
                            job = %job.id,
                            bound = outcome.bound_fields,
                            fields = outcome.total_fields,
                            "job completed"
                        );
                        set_status(&worker_statuses, job.id, |r| {
                            r.status = JobStatus::Completed;
                            r.outcome = Some(outcome);
                        });
                    }
                    Err(e) => {
                        warn!(job = %job.id, error = %e, "job failed");
                        set_status(&worker_statuses, job.id, |r| {
                            r.status = JobStatus::Error;
                            r.error = Some(e.to_string());
                        });
                    }
                }
            }
        });

        Self {
            sender: Some(sender),
            statuses,
            worker: Some(worker),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Queue a job and return its id. The job is visible as `queued` at once.
    pub fn submit(&self, request: JobRequest) -> Result<JobId, FormBindError> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| FormBindError::Job("queue is shut down".into()))?;

        let id = Uuid::new_v4();
        lock(&self.statuses).insert(
            id,
            JobRecord {
                id,
                status: JobStatus::Queued,
                request: request.clone(),
                outcome: None,
                error: None,
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            },
        );

        if sender.send(Job { id, request }).is_err() {
            lock(&self.statuses).remove(&id);
            return Err(FormBindError::Job("worker thread has stopped".into()));
        }
        info!(job = %id, "job queued");
        Ok(id)
    }

    pub fn status(&self, id: JobId) -> Option<JobRecord> {
        lock(&self.statuses).get(&id).cloned()
    }

    /// All known jobs in submission order.
    pub fn jobs(&self) -> Vec<JobRecord> {
        let mut records: Vec<JobRecord> = lock(&self.statuses).values().cloned().collect();
        records.sort_by_key(|r| r.seq);
        records
    }

    /// Stop accepting work, wait for queued jobs to drain, and return the
    /// final records.
    pub fn shutdown(mut self) -> Result<Vec<JobRecord>, FormBindError> {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|_| FormBindError::Job("worker thread panicked".into()))?;
        }
        Ok(self.jobs())
    }
}

impl Drop for JobQueue {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Runs the full pipeline through external engines and writes the
/// [`FormResult`](crate::FormResult) as JSON to the job's output path.
pub struct EngineJobProcessor {
    config: EngineConfig,
    binarizer: Box<dyn Binarizer>,
    ocr: Box<dyn OcrEngine>,
    speech: Box<dyn SpeechToText>,
}

impl EngineJobProcessor {
    pub fn new(
        config: EngineConfig,
        binarizer: Box<dyn Binarizer>,
        ocr: Box<dyn OcrEngine>,
        speech: Box<dyn SpeechToText>,
    ) -> Self {
        Self {
            config,
            binarizer,
            ocr,
            speech,
        }
    }
}

impl JobProcessor for EngineJobProcessor {
    fn process(&self, job: &Job) -> Result<JobOutcome, FormBindError> {
        let page = image::open(&job.request.image)?;
        let result = crate::process_form_with(
            &page,
            &job.request.media,
            self.binarizer.as_ref(),
            self.ocr.as_ref(),
            self.speech.as_ref(),
            &self.config,
        )?;

        // Output only appears for jobs that succeeded end to end.
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(&job.request.output, json)?;

        Ok(JobOutcome {
            output: job.request.output.clone(),
            bound_fields: result.report.bindings.len(),
            total_fields: result.report.total_fields(),
            confidence_score: result.report.confidence_score(),
        })
    }
}
