use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::matcher::{AlignmentRegion, CancelToken, Cancelled, LineMatcher, Window};
use crate::model::RevisionPair;

/// One recompute handed to the worker thread, with its own copy of the
/// buffer lines.
pub(crate) struct Job {
    pub id: u64,
    pub matcher: LineMatcher,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub window: Window,
    pub scoped: bool,
    pub revisions: RevisionPair,
    pub cancel: CancelToken,
}

pub(crate) struct JobResult {
    pub id: u64,
    pub revisions: RevisionPair,
    pub left_len: usize,
    pub right_len: usize,
    pub window: Window,
    pub scoped: bool,
    pub outcome: std::result::Result<Vec<AlignmentRegion>, Cancelled>,
    pub elapsed: Duration,
}

/// Background recompute thread. At most one job is current; submitting a
/// new one cancels the previous.
pub(crate) struct Worker {
    job_tx: Option<Sender<Job>>,
    result_rx: Receiver<JobResult>,
    handle: Option<JoinHandle<()>>,
    next_id: u64,
    in_flight: Option<(u64, RevisionPair, CancelToken)>,
}

impl Worker {
    pub fn spawn() -> Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (result_tx, result_rx) = mpsc::channel::<JobResult>();

        let handle = thread::Builder::new()
            .name("diffsync-recompute".to_string())
            .spawn(move || {
                while let Ok(job) = job_rx.recv() {
                    let started = Instant::now();
                    let outcome = if job.cancel.is_cancelled() {
                        Err(Cancelled)
                    } else {
                        job.matcher.match_window(
                            job.left.as_slice(),
                            job.right.as_slice(),
                            job.window,
                            Some(&job.cancel),
                        )
                    };
                    let result = JobResult {
                        id: job.id,
                        revisions: job.revisions,
                        left_len: job.left.len(),
                        right_len: job.right.len(),
                        window: job.window,
                        scoped: job.scoped,
                        outcome,
                        elapsed: started.elapsed(),
                    };
                    if result_tx.send(result).is_err() {
                        break; // Controller dropped
                    }
                }
            })
            .context("Failed to spawn recompute worker")?;

        Ok(Self {
            job_tx: Some(job_tx),
            result_rx,
            handle: Some(handle),
            next_id: 0,
            in_flight: None,
        })
    }

    /// Id the next submitted job will get.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Queues a job, cancelling whatever was in flight. Returns `false` if
    /// the worker thread is gone.
    pub fn submit(&mut self, job: Job) -> bool {
        self.cancel();
        let Some(tx) = &self.job_tx else {
            return false;
        };
        let entry = (job.id, job.revisions, job.cancel.clone());
        self.next_id = job.id + 1;
        if tx.send(job).is_err() {
            return false;
        }
        self.in_flight = Some(entry);
        true
    }

    pub fn cancel(&mut self) {
        if let Some((id, revisions, token)) = self.in_flight.take() {
            tracing::debug!(id, %revisions, "cancelling in-flight recompute");
            token.cancel();
        }
    }

    /// Revisions of the job still running, if any.
    pub fn in_flight(&self) -> Option<RevisionPair> {
        self.in_flight.as_ref().map(|(_, revisions, _)| *revisions)
    }

    /// Whether `result` belongs to the job currently in flight.
    pub fn is_current(&self, result: &JobResult) -> bool {
        matches!(self.in_flight, Some((id, _, _)) if id == result.id)
    }

    fn settle(&mut self, result: &JobResult) {
        if self.is_current(result) {
            self.in_flight = None;
        }
    }

    /// Next finished job without blocking, and whether it was the one in
    /// flight.
    pub fn try_recv(&mut self) -> Option<(JobResult, bool)> {
        let result = self.result_rx.try_recv().ok()?;
        let current = self.is_current(&result);
        self.settle(&result);
        Some((result, current))
    }

    /// Blocks until the in-flight job finishes, dropping older results.
    pub fn wait(&mut self) -> Option<JobResult> {
        while self.in_flight.is_some() {
            match self.result_rx.recv() {
                Ok(result) if self.is_current(&result) => {
                    self.settle(&result);
                    return Some(result);
                }
                Ok(_) => continue,
                Err(_) => {
                    tracing::warn!("recompute worker exited with a job in flight");
                    self.in_flight = None;
                }
            }
        }
        None
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.cancel();
        self.job_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("recompute worker panicked");
            }
        }
    }
}
