use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_MAX_RETRIES: u32 = 10;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

// NOTE: Caps the exponential shift so the multiplier stays well inside u32
const MAX_EXPONENT: u32 = 16;

/// Rejected retry settings. Reported before any attempt is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("invalid retry configuration: max_retries must be >= 0, got {0}")]
    NegativeRetries(i64),

    #[error("invalid retry configuration: max_retries {0} is too large")]
    TooManyRetries(i64),

    #[error("invalid retry configuration: base delay must be positive")]
    NonPositiveDelay,

    #[error("invalid retry configuration: max delay {max:?} is below base delay {base:?}")]
    MaxBelowBase { base: Duration, max: Duration },
}

/// How the delay grows between consecutive retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Growth {
    Fixed,
    Linear,
    #[default]
    Exponential,
}

/// Retry budget and delay schedule for a single poll.
///
/// `max_retries` counts retries after the initial try, so a policy allows
/// `max_retries + 1` attempts in total. Delays never shrink from one retry
/// to the next and are capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    growth: Growth,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            growth: Growth::default(),
        }
    }
}

impl RetryPolicy {
    /// `max_retries` is signed because it usually comes straight from user
    /// configuration; negative values are an error, not clamped.
    pub fn new(max_retries: i64, base_delay: Duration) -> Result<Self, PolicyError> {
        if max_retries < 0 {
            return Err(PolicyError::NegativeRetries(max_retries));
        }
        let max_retries =
            u32::try_from(max_retries).map_err(|_| PolicyError::TooManyRetries(max_retries))?;

        if base_delay.is_zero() {
            return Err(PolicyError::NonPositiveDelay);
        }

        Ok(Self {
            max_retries,
            base_delay,
            max_delay: base_delay.max(DEFAULT_MAX_DELAY),
            growth: Growth::default(),
        })
    }

    /// Exactly one attempt, never sleeps.
    pub fn single_attempt() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Result<Self, PolicyError> {
        if max_delay < self.base_delay {
            return Err(PolicyError::MaxBelowBase {
                base: self.base_delay,
                max: max_delay,
            });
        }
        self.max_delay = max_delay;
        Ok(self)
    }

    pub fn with_growth(mut self, growth: Growth) -> Self {
        self.growth = growth;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn max_attempts(&self) -> u64 {
        u64::from(self.max_retries) + 1
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn growth(&self) -> Growth {
        self.growth
    }

    /// Delay to wait before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let retry = retry.max(1);
        let raw = match self.growth {
            Growth::Fixed => self.base_delay,
            Growth::Linear => self.base_delay.saturating_mul(retry),
            Growth::Exponential => {
                let exp = (retry - 1).min(MAX_EXPONENT);
                self.base_delay.saturating_mul(1u32 << exp)
            }
        };
        raw.min(self.max_delay)
    }

    /// Upper bound on the time a poll can spend sleeping.
    pub fn worst_case_wait(&self) -> Duration {
        self.max_delay.saturating_mul(self.max_retries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_retries_rejected() {
        let err = RetryPolicy::new(-1, Duration::from_millis(10)).unwrap_err();
        assert_eq!(err, PolicyError::NegativeRetries(-1));
        assert_eq!(
            err.to_string(),
            "invalid retry configuration: max_retries must be >= 0, got -1"
        );
    }

    #[test]
    fn test_oversized_retries_rejected() {
        let err = RetryPolicy::new(i64::MAX, Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, PolicyError::TooManyRetries(_)));
    }

    #[test]
    fn test_zero_delay_rejected() {
        let err = RetryPolicy::new(3, Duration::ZERO).unwrap_err();
        assert_eq!(err, PolicyError::NonPositiveDelay);
    }

    #[test]
    fn test_max_delay_below_base_rejected() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2)).unwrap();
        let err = policy.with_max_delay(Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, PolicyError::MaxBelowBase { .. }));
    }

    #[test]
    fn test_zero_retries_means_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10)).unwrap();
        assert_eq!(policy.max_retries(), 0);
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(RetryPolicy::single_attempt().max_attempts(), 1);
    }

    #[test]
    fn test_exponential_delays_grow_and_cap() {
        let policy = RetryPolicy::new(20, Duration::from_millis(100))
            .unwrap()
            .with_max_delay(Duration::from_secs(1))
            .unwrap();

        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for(5), Duration::from_secs(1));
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn test_delays_non_decreasing_for_every_growth() {
        for growth in [Growth::Fixed, Growth::Linear, Growth::Exponential] {
            let policy = RetryPolicy::new(50, Duration::from_millis(7))
                .unwrap()
                .with_max_delay(Duration::from_millis(900))
                .unwrap()
                .with_growth(growth);

            let delays: Vec<Duration> = (1..=50).map(|n| policy.delay_for(n)).collect();
            assert!(
                delays.windows(2).all(|w| w[0] <= w[1]),
                "{:?} schedule decreased: {:?}",
                growth,
                delays
            );
        }
    }

    #[test]
    fn test_linear_and_fixed_schedules() {
        let base = Duration::from_millis(50);
        let linear = RetryPolicy::new(5, base).unwrap().with_growth(Growth::Linear);
        assert_eq!(linear.delay_for(3), Duration::from_millis(150));

        let fixed = RetryPolicy::new(5, base).unwrap().with_growth(Growth::Fixed);
        assert_eq!(fixed.delay_for(1), base);
        assert_eq!(fixed.delay_for(4), base);
    }

    #[test]
    fn test_worst_case_wait() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100))
            .unwrap()
            .with_max_delay(Duration::from_millis(500))
            .unwrap();
        assert_eq!(policy.worst_case_wait(), Duration::from_secs(2));
    }
}
