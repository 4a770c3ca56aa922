use std::fmt;

use crate::executor::FailureKind;
use crate::store::Identity;

/// One resource that ended FAILED.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub identity: Identity,
    pub url: String,
    pub kind: FailureKind,
    pub detail: String,
}

/// Overall result of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    PartialFailure,
}

/// Counts and failures for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub skipped: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub failures: Vec<Failure>,
    /// Body bytes received by successful downloads.
    pub bytes: u64,
}

impl RunSummary {
    pub(crate) fn push_failure(&mut self, failure: Failure) {
        self.failed += 1;
        self.failures.push(failure);
    }

    pub fn total(&self) -> usize {
        self.skipped + self.downloaded + self.failed
    }

    pub fn status(&self) -> RunStatus {
        if self.failed == 0 {
            RunStatus::Success
        } else {
            RunStatus::PartialFailure
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} resources: {} skipped, {} downloaded, {} failed",
            self.total(),
            self.skipped,
            self.downloaded,
            self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_failures() {
        let mut s = RunSummary {
            skipped: 2,
            downloaded: 1,
            ..RunSummary::default()
        };
        assert_eq!(s.status(), RunStatus::Success);
        s.push_failure(Failure {
            identity: "x::u".into(),
            url: "u".into(),
            kind: FailureKind::HttpStatus(404),
            detail: "HTTP 404".into(),
        });
        assert_eq!(s.status(), RunStatus::PartialFailure);
        assert_eq!(s.to_string(), "4 resources: 2 skipped, 1 downloaded, 1 failed");
    }
}
