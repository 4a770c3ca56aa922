//! Per-resource fetch outcomes and failure kinds.

use std::fmt;

use crate::catalog::CandidateResource;
use crate::decision::SkipReason;
use crate::probe::ProbeResult;
use crate::retry::{Exhausted, FetchError};

use std::path::PathBuf;

/// Why a resource ended FAILED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transient errors (timeout, reset, 5xx, throttling) on every attempt.
    RetriesExhausted { attempts: u32 },
    /// The server answered with a non-retryable status (typically 4xx).
    HttpStatus(u32),
    /// Non-retryable transport or local receive failure.
    Transport,
    /// The body could not be normalized or the table could not be written.
    Normalization,
    /// The worker task panicked or vanished.
    Internal,
}

impl FailureKind {
    pub fn from_exhausted(e: &Exhausted) -> Self {
        if e.kind.is_transient() {
            return FailureKind::RetriesExhausted {
                attempts: e.attempts,
            };
        }
        match e.error {
            FetchError::Http(code) => FailureKind::HttpStatus(code),
            FetchError::Curl(_) | FetchError::Io(_) => FailureKind::Transport,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::RetriesExhausted { attempts } => {
                write!(f, "retries exhausted after {} attempt(s)", attempts)
            }
            FailureKind::HttpStatus(code) => write!(f, "HTTP {}", code),
            FailureKind::Transport => f.write_str("transport error"),
            FailureKind::Normalization => f.write_str("normalization failed"),
            FailureKind::Internal => f.write_str("internal error"),
        }
    }
}

/// Result of handling one resource in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Skipped { reason: SkipReason },
    Downloaded {
        bytes: u64,
        row_count: u64,
        column_count: u64,
    },
    Failed { error_kind: FailureKind },
}

/// A resource classified NEW or CHANGED, queued for download.
#[derive(Debug, Clone)]
pub struct FetchJob {
    pub candidate: CandidateResource,
    pub destination: PathBuf,
    /// Identifiers observed this run; recorded with the download on success.
    pub probe: ProbeResult,
}

/// What the executor returns for each job.
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub job: FetchJob,
    pub outcome: FetchOutcome,
    /// Human-readable cause for failed outcomes.
    pub detail: Option<String>,
}

impl FetchReport {
    pub fn failed(job: FetchJob, error_kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            job,
            outcome: FetchOutcome::Failed { error_kind },
            detail: Some(detail.into()),
        }
    }
}
