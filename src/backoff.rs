//! Bounded polling with backoff.
//!
//! Used to ride out read-after-write lag in the Prisma Cloud API: a freshly
//! created object may 404 for a short while before it becomes readable.
//! The poller only counts attempts and sleeps; the operation decides which
//! of its failures deserve another attempt.

mod policy;
mod run;

pub use policy::{
    DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY, DEFAULT_MAX_RETRIES, Growth, PolicyError, RetryPolicy,
};
pub use run::{PollOutcome, Retry, poll, poll_async, poll_with_sleep};
