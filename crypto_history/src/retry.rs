//! Retry policy for transport-level failures.
//!
//! Only failures the caller classifies as [`Failure::Transient`] are retried;
//! [`Failure::Fatal`] errors are returned on the spot. The default policy
//! retries forever with a fixed one second pause, so callers that need a
//! bounded latency should either configure `max_attempts` or wrap the fetch
//! in `tokio::time::timeout`.

use std::{future::Future, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Outcome of a single failed attempt.
#[derive(Debug)]
pub enum Failure<E> {
    /// Connection refused, timeout, DNS failure: worth another try.
    Transient(E),
    /// Anything else. Never retried.
    Fatal(E),
}

#[derive(Debug)]
pub enum RetryError<E> {
    Fatal(E),
    Exhausted { attempts: u32, last: E },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one. `None` retries without limit.
    pub max_attempts: Option<u32>,
    /// Fixed pause between attempts, in milliseconds.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            backoff_ms: 1_000,
        }
    }
}

impl RetryPolicy {
    pub fn unlimited(backoff: Duration) -> Self {
        Self {
            max_attempts: None,
            backoff_ms: backoff.as_millis() as u64,
        }
    }

    pub fn bounded(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            backoff_ms: backoff.as_millis() as u64,
        }
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// Whether another attempt may follow `attempts` completed ones.
    /// At least one attempt is always made, even with `max_attempts = 0`.
    fn allows_another(&self, attempts: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts < max.max(1))
    }

    /// Runs `op` until it succeeds, fails fatally, or the policy gives up.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure<E>>>,
        E: std::fmt::Display,
    {
        let mut attempts = 0u32;
        loop {
            attempts = attempts.saturating_add(1);
            match op().await {
                Ok(value) => return Ok(value),
                Err(Failure::Fatal(e)) => return Err(RetryError::Fatal(e)),
                Err(Failure::Transient(e)) => {
                    if !self.allows_another(attempts) {
                        return Err(RetryError::Exhausted { attempts, last: e });
                    }
                    warn!(attempt = attempts, error = %e, "Connection failed, reconnecting");
                    tokio::time::sleep(self.backoff()).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn bounded_policy_gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::bounded(3, Duration::ZERO);

        let result: Result<(), _> = policy
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Failure::Transient("refused"))
            })
            .await;

        assert!(matches!(
            result,
            Err(RetryError::Exhausted {
                attempts: 3,
                last: "refused"
            })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::unlimited(Duration::ZERO);

        let result: Result<(), _> = policy
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Failure::Fatal("bad request"))
            })
            .await;

        assert!(matches!(result, Err(RetryError::Fatal("bad request"))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unlimited_policy_keeps_going_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::unlimited(Duration::ZERO);

        let result = policy
            .run(move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 25 {
                    Err(Failure::Transient("timeout"))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 25);
    }

    #[tokio::test]
    async fn zero_max_attempts_still_tries_once() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::bounded(0, Duration::ZERO);
        let _: Result<(), _> = policy
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Failure::Transient("refused"))
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn default_matches_fixed_one_second_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, None);
        assert_eq!(policy.backoff(), Duration::from_secs(1));
    }
}
