//! Request pacing for domain checks.
//!
//! WHOIS servers throttle clients that query too fast, often by answering
//! with an error text instead of refusing the connection. Every check passes
//! through a [`Pacer`] so the request rate stays bounded whether checks run
//! one at a time or concurrently.

use crate::types::PacingPolicy;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::sync::Arc;
use std::time::Duration;

/// Spacing applied around each domain check.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Wait until a new check may start.
    async fn before_check(&self) {}

    /// Called once a check has completed.
    async fn after_check(&self) {}
}

/// Sleeps for a fixed duration after every check, the last one included.
#[derive(Debug, Clone)]
pub struct FixedDelayPacer {
    delay: Duration,
}

impl FixedDelayPacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Pacer for FixedDelayPacer {
    async fn after_check(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

/// Admits one check per period across all concurrent callers.
pub struct TokenBucketPacer {
    limiter: DefaultDirectRateLimiter,
}

impl TokenBucketPacer {
    /// Returns `None` for a zero period.
    pub fn new(period: Duration) -> Option<Self> {
        let quota = Quota::with_period(period)?;
        Some(Self {
            limiter: RateLimiter::direct(quota),
        })
    }
}

#[async_trait]
impl Pacer for TokenBucketPacer {
    async fn before_check(&self) {
        self.limiter.until_ready().await;
    }
}

/// No pacing at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacing;

impl Pacer for NoPacing {}

/// Build the pacer for a policy.
pub fn pacer_for(policy: PacingPolicy) -> Arc<dyn Pacer> {
    match policy {
        PacingPolicy::FixedDelay(delay) if !delay.is_zero() => Arc::new(FixedDelayPacer::new(delay)),
        PacingPolicy::TokenBucket(period) => match TokenBucketPacer::new(period) {
            Some(pacer) => Arc::new(pacer),
            None => Arc::new(NoPacing),
        },
        PacingPolicy::FixedDelay(_) | PacingPolicy::Disabled => Arc::new(NoPacing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_sleeps_after_check() {
        let pacer = FixedDelayPacer::new(Duration::from_millis(300));
        let started = tokio::time::Instant::now();

        pacer.before_check().await;
        assert_eq!(started.elapsed(), Duration::ZERO);

        pacer.after_check().await;
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_token_bucket_spaces_admissions() {
        let pacer = TokenBucketPacer::new(Duration::from_millis(50)).unwrap();
        let started = Instant::now();

        pacer.before_check().await;
        pacer.before_check().await;
        pacer.before_check().await;

        // First admission is immediate, the next two wait one period each.
        assert!(started.elapsed() >= Duration::from_millis(90));
    }

    #[test]
    fn test_zero_period_has_no_bucket() {
        assert!(TokenBucketPacer::new(Duration::ZERO).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacer_for_disabled_and_zero_delay() {
        for policy in [PacingPolicy::Disabled, PacingPolicy::FixedDelay(Duration::ZERO)] {
            let pacer = pacer_for(policy);
            let started = tokio::time::Instant::now();
            pacer.before_check().await;
            pacer.after_check().await;
            assert_eq!(started.elapsed(), Duration::ZERO);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacer_for_fixed_delay() {
        let pacer = pacer_for(PacingPolicy::FixedDelay(Duration::from_secs(1)));
        let started = tokio::time::Instant::now();
        pacer.after_check().await;
        assert!(started.elapsed() >= Duration::from_secs(1));
    }
}
