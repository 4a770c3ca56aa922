//! Run orchestrator: probe, classify, fetch and record every candidate.
//!
//! The in-memory store is mutated only here, as reports come back from the
//! executor. Store I/O errors abort the run; every other failure is confined
//! to its resource and reported in the [`RunSummary`].

mod state;
mod summary;


use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;

use crate::catalog::{self, CandidateResource, CatalogError};
use crate::config::{FetchConfig, PersistCadence};
use crate::decision::{classify, Classification};
use crate::executor::{Executor, FetchJob, FetchOutcome, FetchReport};
use crate::normalize::{CsvNormalizer, Normalizer};
use crate::probe::probe_all;
use crate::remote::{CurlRemote, HttpSettings, Remote};
use crate::retry::RetryPolicy;
use crate::store::{MetadataStore, ResourceRecord, StoreError};

pub use state::ResourceState;
pub use summary::{Failure, RunStatus, RunSummary};

use state::transition;

/// Records shown in the closing log sample.
const SAMPLE_RECORDS: usize = 10;

/// Errors that end a run early.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("metadata store: {0}")]
    Store(#[from] StoreError),
    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),
}

pub struct Orchestrator<R, N> {
    remote: Arc<R>,
    executor: Executor<R, N>,
    data_dir: PathBuf,
    store_path: PathBuf,
    catalog_url: String,
    theme: String,
    max_concurrent_probes: usize,
    persist: PersistCadence,
}

impl Orchestrator<CurlRemote, CsvNormalizer> {
    /// Orchestrator over HTTP with the CSV normalizer.
    pub fn from_config(cfg: &FetchConfig) -> Self {
        let remote = Arc::new(CurlRemote::new(HttpSettings::from_config(cfg)));
        Self::new(cfg, remote, Arc::new(CsvNormalizer))
    }
}

impl<R: Remote, N: Normalizer> Orchestrator<R, N> {
    pub fn new(cfg: &FetchConfig, remote: Arc<R>, normalizer: Arc<N>) -> Self {
        let retry = RetryPolicy::from_config(&cfg.retry_config());
        let executor = Executor::new(
            Arc::clone(&remote),
            normalizer,
            cfg.max_concurrent_downloads,
            retry,
        );
        Self {
            remote,
            executor,
            data_dir: cfg.data_dir.clone(),
            store_path: cfg.store_path.clone(),
            catalog_url: cfg.catalog_url.clone(),
            theme: cfg.theme.clone(),
            max_concurrent_probes: cfg.max_concurrent_probes.max(1),
            persist: cfg.persist,
        }
    }

    pub fn executor(&self) -> &Executor<R, N> {
        &self.executor
    }

    /// Discover candidates from the configured catalog, then [`run`](Self::run) them.
    pub async fn discover_and_run(&self) -> Result<RunSummary, RunError> {
        // Fail on an unreadable store before touching the network.
        let store = MetadataStore::load(&self.store_path)?;
        let candidates =
            catalog::discover(Arc::clone(&self.remote), &self.catalog_url, &self.theme).await?;
        let (_, summary) = self.reconcile(store, candidates).await?;
        Ok(summary)
    }

    /// Load the store, bring every candidate up to date and persist.
    pub async fn run(&self, candidates: Vec<CandidateResource>) -> Result<RunSummary, RunError> {
        let store = MetadataStore::load(&self.store_path)?;
        let (_, summary) = self.reconcile(store, candidates).await?;
        Ok(summary)
    }

    /// Run the candidates against an already loaded store and return the
    /// updated store with the summary. The store is persisted per the
    /// configured cadence.
    pub async fn reconcile(
        &self,
        mut store: MetadataStore,
        candidates: Vec<CandidateResource>,
    ) -> Result<(MetadataStore, RunSummary), RunError> {
        let mut candidates = dedupe(candidates);
        catalog::assign_unique_filenames(&mut candidates);
        tracing::info!(
            candidates = candidates.len(),
            known = store.len(),
            "starting run"
        );
        for c in &candidates {
            tracing::debug!(identity = %c.identity, state = %ResourceState::Pending, "state");
        }

        let probes = probe_all(
            Arc::clone(&self.remote),
            &candidates,
            self.max_concurrent_probes,
        )
        .await;

        let mut summary = RunSummary::default();
        let mut jobs = Vec::new();
        for (candidate, probe) in candidates.into_iter().zip(probes) {
            transition(&candidate.identity, ResourceState::Pending, ResourceState::Probed);
            let class = classify(store.get(&candidate.identity), &probe);
            let job = FetchJob {
                destination: candidate.destination(&self.data_dir),
                candidate,
                probe,
            };
            match class {
                Classification::Unchanged(reason) => {
                    let skipped = FetchReport {
                        job,
                        outcome: FetchOutcome::Skipped { reason },
                        detail: None,
                    };
                    self.record(&mut store, &mut summary, skipped);
                }
                class => {
                    transition(&job.candidate.identity, ResourceState::Probed, ResourceState::Fetching);
                    tracing::info!(identity = %job.candidate.identity, class = ?class, "queued for download");
                    jobs.push(job);
                }
            }
        }

        let mut batch = self.executor.spawn(jobs);
        while let Some(report) = batch.next().await {
            if self.record(&mut store, &mut summary, report) && self.persist == PersistCadence::EachSuccess {
                if let Err(e) = store.persist() {
                    tracing::error!("persist failed, aborting run: {}", e);
                    batch.shutdown().await;
                    return Err(e.into());
                }
            }
        }

        if self.persist == PersistCadence::EndOfRun {
            store.persist()?;
        }

        tracing::info!(
            skipped = summary.skipped,
            downloaded = summary.downloaded,
            failed = summary.failed,
            bytes = summary.bytes,
            "run finished: {}",
            summary
        );
        log_sample(&store);
        Ok((store, summary))
    }

    /// Fold one terminal outcome (a skip, or an executor report) into the
    /// store and summary. Returns true when a record was upserted.
    fn record(&self, store: &mut MetadataStore, summary: &mut RunSummary, report: FetchReport) -> bool {
        let FetchReport {
            job,
            outcome,
            detail,
        } = report;
        let identity = job.candidate.identity;
        match outcome {
            FetchOutcome::Downloaded {
                bytes,
                row_count,
                column_count,
            } => {
                transition(&identity, ResourceState::Fetching, ResourceState::Recorded);
                store.upsert(ResourceRecord {
                    identity,
                    url: job.candidate.url,
                    local_filename: job.candidate.suggested_filename,
                    change_tag: job.probe.observed_change_tag,
                    modified_at: job.probe.observed_modified_at,
                    fetched_at: Utc::now(),
                    row_count,
                    column_count,
                });
                summary.downloaded += 1;
                summary.bytes += bytes;
                true
            }
            FetchOutcome::Failed { error_kind } => {
                transition(&identity, ResourceState::Fetching, ResourceState::Failed);
                let detail = detail.unwrap_or_else(|| error_kind.to_string());
                tracing::warn!(identity = %identity, kind = %error_kind, "failed: {}", detail);
                summary.push_failure(Failure {
                    identity,
                    url: job.candidate.url,
                    kind: error_kind,
                    detail,
                });
                false
            }
            FetchOutcome::Skipped { reason } => {
                transition(&identity, ResourceState::Probed, ResourceState::Skipped);
                tracing::info!(identity = %identity, "skipped: {}", reason);
                summary.skipped += 1;
                false
            }
        }
    }
}

/// Drop repeated identities, keeping the first occurrence.
fn dedupe(candidates: Vec<CandidateResource>) -> Vec<CandidateResource> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| {
            let fresh = seen.insert(c.identity.clone());
            if !fresh {
                tracing::debug!(identity = %c.identity, "duplicate candidate dropped");
            }
            fresh
        })
        .collect()
}

fn log_sample(store: &MetadataStore) {
    for record in store.records().take(SAMPLE_RECORDS) {
        tracing::info!(
            identity = %record.identity,
            filename = %record.local_filename,
            rows = record.row_count,
            cols = record.column_count,
            modified_at = record.modified_at.as_deref().unwrap_or("-"),
            "stored"
        );
    }
}
