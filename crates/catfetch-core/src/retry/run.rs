//! Retry loop: run an async operation until success or policy says stop.

use std::future::Future;

use super::classify;
use super::error::FetchError;
use super::policy::{ErrorKind, RetryDecision, RetryPolicy};

/// Final error of a retried operation, with the attempt count and last classification.
#[derive(Debug)]
pub struct Exhausted {
    pub error: FetchError,
    pub kind: ErrorKind,
    pub attempts: u32,
}

/// Runs `f` until it succeeds or the retry policy says to stop.
/// On retryable failure, waits for the backoff duration (without blocking a thread) and tries again.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, mut f: F) -> Result<T, Exhausted>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 1u32;
    loop {
        match f(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => {
                        return Err(Exhausted {
                            error: e,
                            kind,
                            attempts: attempt,
                        })
                    }
                    RetryDecision::RetryAfter(d) => {
                        tracing::debug!(attempt, delay_ms = d.as_millis() as u64, "retrying after {}", e);
                        tokio::time::sleep(d).await;
                        attempt += 1;
                    }
                }
            }
        }
    }
}
