//! Revalidation probe: header-only request per candidate resource.
//!
//! A probe never fails the run. Any network error or non-2xx status yields a
//! `ProbeResult` with `probe_succeeded = false` and no identifiers, which the
//! decision engine treats as CHANGED.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::catalog::CandidateResource;
use crate::remote::{ChangeIdentifiers, Remote};
use crate::store::Identity;

/// Change identifiers observed for one resource during this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub identity: Identity,
    pub observed_change_tag: Option<String>,
    pub observed_modified_at: Option<String>,
    pub probe_succeeded: bool,
}

impl ProbeResult {
    pub fn succeeded(identity: impl Into<Identity>, ids: ChangeIdentifiers) -> Self {
        Self {
            identity: identity.into(),
            observed_change_tag: ids.etag,
            observed_modified_at: ids.last_modified,
            probe_succeeded: true,
        }
    }

    pub fn failed(identity: impl Into<Identity>) -> Self {
        Self {
            identity: identity.into(),
            observed_change_tag: None,
            observed_modified_at: None,
            probe_succeeded: false,
        }
    }
}

/// Probe one resource. Blocking; runs the remote's HEAD request.
pub fn probe_resource<R: Remote + ?Sized>(remote: &R, identity: &str, url: &str) -> ProbeResult {
    match remote.head(url) {
        Ok(ids) => {
            tracing::debug!(identity, etag = ?ids.etag, last_modified = ?ids.last_modified, "probed");
            ProbeResult::succeeded(identity, ids)
        }
        Err(e) => {
            tracing::warn!(identity, url, "probe failed, treating as changed: {}", e);
            ProbeResult::failed(identity)
        }
    }
}

/// Probe every candidate with at most `max_concurrent` requests in flight.
/// Results come back in the same order as `candidates`.
pub async fn probe_all<R: Remote>(
    remote: Arc<R>,
    candidates: &[CandidateResource],
    max_concurrent: usize,
) -> Vec<ProbeResult> {
    let gate = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let mut join_set = JoinSet::new();

    for (index, candidate) in candidates.iter().enumerate() {
        let remote = Arc::clone(&remote);
        let gate = Arc::clone(&gate);
        let identity = candidate.identity.clone();
        let url = candidate.url.clone();
        join_set.spawn(async move {
            let result = match gate.acquire_owned().await {
                Ok(_permit) => {
                    let id = identity.clone();
                    tokio::task::spawn_blocking(move || probe_resource(remote.as_ref(), &id, &url))
                        .await
                        .unwrap_or_else(|e| {
                            tracing::warn!(identity = %identity, "probe task failed: {}", e);
                            ProbeResult::failed(identity.clone())
                        })
                }
                Err(_) => ProbeResult::failed(identity),
            };
            (index, result)
        });
    }

    let mut slots: Vec<Option<ProbeResult>> = vec![None; candidates.len()];
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(e) => tracing::warn!("probe task join: {}", e),
        }
    }

    slots
        .into_iter()
        .zip(candidates)
        .map(|(slot, c)| slot.unwrap_or_else(|| ProbeResult::failed(c.identity.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::FetchError;

    struct Fixed;

    impl Remote for Fixed {
        fn head(&self, url: &str) -> Result<ChangeIdentifiers, FetchError> {
            if url.ends_with("missing.csv") {
                return Err(FetchError::Http(404));
            }
            Ok(ChangeIdentifiers {
                etag: Some(format!("tag-{}", url.len())),
                last_modified: None,
            })
        }

        fn get(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            panic!("probe must not fetch bodies");
        }
    }

    fn candidate(name: &str) -> CandidateResource {
        CandidateResource::new("ds", format!("https://example.com/{}", name), None)
    }

    #[test]
    fn failed_probe_has_no_identifiers() {
        let r = probe_resource(&Fixed, "ds::x", "https://example.com/missing.csv");
        assert!(!r.probe_succeeded);
        assert!(r.observed_change_tag.is_none());
        assert!(r.observed_modified_at.is_none());
    }

    #[tokio::test]
    async fn probe_all_keeps_candidate_order() {
        let candidates = vec![
            candidate("a.csv"),
            candidate("missing.csv"),
            candidate("longer-name.csv"),
        ];
        let results = probe_all(Arc::new(Fixed), &candidates, 2).await;
        assert_eq!(results.len(), 3);
        for (r, c) in results.iter().zip(&candidates) {
            assert_eq!(r.identity, c.identity);
        }
        assert!(results[0].probe_succeeded);
        assert!(!results[1].probe_succeeded);
        assert_eq!(
            results[2].observed_change_tag,
            Some(format!("tag-{}", candidates[2].url.len()))
        );
    }
}
