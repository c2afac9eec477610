//! Poll loop: run an operation until it succeeds or the retry budget is spent.

use std::future::Future;
use std::time::Duration;

use super::policy::RetryPolicy;

/// Failure reported by a single attempt.
///
/// The operation decides which failures are worth another attempt. A bare
/// error converts into `Transient` so `?` keeps polling by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retry<E> {
    Transient(E),
    Permanent(E),
}

impl<E> Retry<E> {
    pub fn into_inner(self) -> E {
        match self {
            Retry::Transient(e) | Retry::Permanent(e) => e,
        }
    }
}

impl<E> From<E> for Retry<E> {
    fn from(err: E) -> Self {
        Retry::Transient(err)
    }
}

/// Result of one poll. The last error is carried unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum PollOutcome<T, E> {
    Success(T),
    ExhaustedRetries(E),
    FatalError(E),
}

impl<T, E> PollOutcome<T, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, PollOutcome::Success(_))
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            PollOutcome::Success(value) => Ok(value),
            PollOutcome::ExhaustedRetries(e) | PollOutcome::FatalError(e) => Err(e),
        }
    }
}

// Attempt bookkeeping owned by one poll call.
struct Attempts<'a> {
    policy: &'a RetryPolicy,
    attempt: u64,
}

impl<'a> Attempts<'a> {
    fn new(policy: &'a RetryPolicy) -> Self {
        Self { policy, attempt: 1 }
    }

    /// Delay before the next attempt, or `None` once the budget is spent.
    fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt > u64::from(self.policy.max_retries()) {
            return None;
        }
        let retry = u32::try_from(self.attempt).unwrap_or(u32::MAX);
        self.attempt += 1;
        Some(self.policy.delay_for(retry))
    }
}

/// Runs `operation` until it succeeds, blocking the calling thread between
/// attempts.
pub fn poll<T, E, F>(policy: &RetryPolicy, operation: F) -> PollOutcome<T, E>
where
    F: FnMut() -> Result<T, Retry<E>>,
{
    poll_with_sleep(policy, operation, std::thread::sleep)
}

/// Same as [`poll`] with the sleep supplied by the caller.
pub fn poll_with_sleep<T, E, F, S>(
    policy: &RetryPolicy,
    mut operation: F,
    mut sleep: S,
) -> PollOutcome<T, E>
where
    F: FnMut() -> Result<T, Retry<E>>,
    S: FnMut(Duration),
{
    let mut attempts = Attempts::new(policy);

    loop {
        match operation() {
            Ok(value) => {
                tracing::debug!(attempt = attempts.attempt, "poll succeeded");
                return PollOutcome::Success(value);
            }
            Err(Retry::Permanent(err)) => {
                tracing::debug!(attempt = attempts.attempt, "poll aborted by operation");
                return PollOutcome::FatalError(err);
            }
            Err(Retry::Transient(err)) => match attempts.next_delay() {
                Some(delay) => {
                    tracing::debug!(
                        attempt = attempts.attempt - 1,
                        delay_ms = delay.as_millis() as u64,
                        "attempt failed, retrying"
                    );
                    sleep(delay);
                }
                None => {
                    tracing::warn!(attempts = attempts.attempt, "retries exhausted");
                    return PollOutcome::ExhaustedRetries(err);
                }
            },
        }
    }
}

/// Async counterpart of [`poll`] for operations backed by the HTTP client.
pub async fn poll_async<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> PollOutcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Retry<E>>>,
{
    let mut attempts = Attempts::new(policy);

    loop {
        match operation().await {
            Ok(value) => {
                tracing::debug!(attempt = attempts.attempt, "poll succeeded");
                return PollOutcome::Success(value);
            }
            Err(Retry::Permanent(err)) => {
                tracing::debug!(attempt = attempts.attempt, "poll aborted by operation");
                return PollOutcome::FatalError(err);
            }
            Err(Retry::Transient(err)) => match attempts.next_delay() {
                Some(delay) => {
                    tracing::debug!(
                        attempt = attempts.attempt - 1,
                        delay_ms = delay.as_millis() as u64,
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    tracing::warn!(attempts = attempts.attempt, "retries exhausted");
                    return PollOutcome::ExhaustedRetries(err);
                }
            },
        }
    }
}
