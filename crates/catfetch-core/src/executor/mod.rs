//! Bounded download executor.
//!
//! Each queued resource waits for an admission slot, downloads its body with
//! retries, gives the slot back, then normalizes the body into its destination
//! table. At most `ceiling` body transfers are in flight at any moment.
//! Normalization runs outside the slot so a slow parse never holds back a
//! transfer. A second gate of `ceiling * BUFFERED_PER_SLOT` permits is held
//! from before the transfer until normalization ends, so downloaded bodies
//! waiting for the normalizer stay bounded when parsing is slower than the
//! network.

mod gate;
mod outcome;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::normalize::Normalizer;
use crate::remote::Remote;
use crate::retry::{run_with_retry, FetchError, RetryPolicy};
use crate::store::Identity;

pub use gate::{AdmissionGate, Slot};
pub use outcome::{FailureKind, FetchJob, FetchOutcome, FetchReport};

/// Bodies held in memory (in transfer or awaiting normalization) per transfer slot.
pub const BUFFERED_PER_SLOT: usize = 2;

struct Shared<R, N> {
    remote: Arc<R>,
    normalizer: Arc<N>,
    gate: AdmissionGate,
    buffered: AdmissionGate,
    retry: RetryPolicy,
}

/// Runs fetch jobs against a remote under a fixed concurrency ceiling.
pub struct Executor<R, N> {
    shared: Arc<Shared<R, N>>,
}

impl<R: Remote, N: Normalizer> Executor<R, N> {
    pub fn new(remote: Arc<R>, normalizer: Arc<N>, max_concurrent: usize, retry: RetryPolicy) -> Self {
        let gate = AdmissionGate::new(max_concurrent);
        let buffered = AdmissionGate::new(gate.ceiling() * BUFFERED_PER_SLOT);
        Self {
            shared: Arc::new(Shared {
                remote,
                normalizer,
                gate,
                buffered,
                retry,
            }),
        }
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.shared.gate
    }

    /// Gate over bodies held between transfer start and normalization end.
    pub fn buffer_gate(&self) -> &AdmissionGate {
        &self.shared.buffered
    }

    /// Start every job. Reports are pulled from the returned batch in
    /// completion order.
    pub fn spawn(&self, jobs: Vec<FetchJob>) -> FetchBatch {
        let mut join_set = JoinSet::new();
        let mut outstanding = HashMap::with_capacity(jobs.len());
        for job in jobs {
            outstanding.insert(job.candidate.identity.clone(), job.clone());
            let shared = Arc::clone(&self.shared);
            join_set.spawn(fetch_one(shared, job));
        }
        FetchBatch {
            join_set,
            outstanding,
        }
    }

    /// Run all jobs to completion and collect their reports.
    pub async fn run_all(&self, jobs: Vec<FetchJob>) -> Vec<FetchReport> {
        let mut batch = self.spawn(jobs);
        let mut reports = Vec::with_capacity(batch.remaining());
        while let Some(report) = batch.next().await {
            reports.push(report);
        }
        reports
    }
}

/// In-flight jobs started by [`Executor::spawn`].
pub struct FetchBatch {
    join_set: JoinSet<FetchReport>,
    outstanding: HashMap<Identity, FetchJob>,
}

impl FetchBatch {
    /// Jobs that have not produced a report yet.
    pub fn remaining(&self) -> usize {
        self.outstanding.len()
    }

    /// Next finished report, or `None` once every job has reported.
    /// A job whose task panicked is reported as an internal failure.
    pub async fn next(&mut self) -> Option<FetchReport> {
        loop {
            match self.join_set.join_next().await {
                Some(Ok(report)) => {
                    self.outstanding.remove(&report.job.candidate.identity);
                    return Some(report);
                }
                Some(Err(e)) => {
                    tracing::error!("fetch task failed: {}", e);
                }
                None => {
                    let identity = self.outstanding.keys().next().cloned()?;
                    let job = self.outstanding.remove(&identity)?;
                    return Some(FetchReport::failed(
                        job,
                        FailureKind::Internal,
                        "fetch task ended without a result",
                    ));
                }
            }
        }
    }

    /// Abort everything still running and wait for the tasks to stop.
    pub async fn shutdown(mut self) {
        self.join_set.shutdown().await;
        self.outstanding.clear();
    }
}

async fn fetch_one<R: Remote, N: Normalizer>(shared: Arc<Shared<R, N>>, job: FetchJob) -> FetchReport {
    let identity = job.candidate.identity.clone();

    // Taken before the transfer slot and held until normalization returns.
    let _buffered = match shared.buffered.acquire().await {
        Ok(permit) => permit,
        Err(e) => return FetchReport::failed(job, FailureKind::Internal, e.to_string()),
    };

    let body = {
        let slot = match shared.gate.acquire().await {
            Ok(slot) => slot,
            Err(e) => return FetchReport::failed(job, FailureKind::Internal, e.to_string()),
        };
        tracing::debug!(identity = %identity, in_flight = shared.gate.in_flight(), "fetching");
        let url = job.candidate.url.as_str();
        let result = run_with_retry(&shared.retry, |attempt| {
            let remote = Arc::clone(&shared.remote);
            let url = url.to_string();
            async move {
                if attempt > 1 {
                    tracing::debug!(url = %url, attempt, "retrying fetch");
                }
                match tokio::task::spawn_blocking(move || remote.get(&url)).await {
                    Ok(res) => res,
                    // A panicking remote fails the whole task; FetchBatch reports it as Internal.
                    Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                    Err(e) => Err(FetchError::Io(std::io::Error::other(format!(
                        "fetch worker: {}",
                        e
                    )))),
                }
            }
        })
        .await;
        drop(slot);
        result
    };

    let body = match body {
        Ok(body) => body,
        Err(exhausted) => {
            let kind = FailureKind::from_exhausted(&exhausted);
            tracing::warn!(identity = %identity, kind = %kind, "fetch failed: {}", exhausted.error);
            let detail = exhausted.error.to_string();
            return FetchReport::failed(job, kind, detail);
        }
    };

    let bytes = body.len() as u64;
    let destination = job.destination.clone();
    let normalizer = Arc::clone(&shared.normalizer);
    let normalized =
        tokio::task::spawn_blocking(move || normalizer.normalize(&body, &destination)).await;

    match normalized {
        Ok(Ok(stats)) => {
            tracing::info!(
                identity = %identity,
                bytes,
                rows = stats.row_count,
                columns = stats.column_count,
                path = %job.destination.display(),
                "downloaded"
            );
            FetchReport {
                job,
                outcome: FetchOutcome::Downloaded {
                    bytes,
                    row_count: stats.row_count,
                    column_count: stats.column_count,
                },
                detail: None,
            }
        }
        Ok(Err(e)) => {
            tracing::warn!(identity = %identity, "normalization failed: {}", e);
            FetchReport::failed(job, FailureKind::Normalization, e.to_string())
        }
        Err(e) => {
            tracing::error!(identity = %identity, "normalization worker failed: {}", e);
            FetchReport::failed(job, FailureKind::Internal, e.to_string())
        }
    }
}
