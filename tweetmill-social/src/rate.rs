//! Pacing for sequential API calls.
//!
//! The fetcher consults a [`RateGate`] around every request: `acquire` before
//! sending and `cooldown` once the request has finished, whether it succeeded
//! or not. Neither hook looks at response codes or headers.
use anyhow::{Result, ensure};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{Instant, sleep};

#[async_trait]
pub trait RateGate: Send {
    /// Wait until the next request may be sent.
    async fn acquire(&mut self) {}

    /// Called after each request completes.
    async fn cooldown(&mut self) {}
}

#[async_trait]
impl<G: RateGate + ?Sized> RateGate for Box<G> {
    async fn acquire(&mut self) {
        (**self).acquire().await
    }

    async fn cooldown(&mut self) {
        (**self).cooldown().await
    }
}

/// Never waits. Used when pacing is disabled and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay;

#[async_trait]
impl RateGate for NoDelay {}

/// Sleeps a fixed interval after every request.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    interval: Duration,
}

impl FixedDelay {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[async_trait]
impl RateGate for FixedDelay {
    async fn cooldown(&mut self) {
        if !self.interval.is_zero() {
            sleep(self.interval).await;
        }
    }
}

/// Token bucket: refills at `qps` tokens per second up to `burst`, each
/// request costs one token.
#[derive(Debug)]
pub struct TokenBucket {
    qps: f64,
    burst: f64,
    tokens: f64,
    last: Instant,
}

impl TokenBucket {
    pub fn new(qps: f64, burst: u32) -> Result<Self> {
        ensure!(qps.is_finite() && qps > 0.0, "token bucket qps must be > 0, got {qps}");
        ensure!(burst >= 1, "token bucket burst must be >= 1");
        Ok(Self {
            qps,
            burst: burst as f64,
            tokens: burst as f64,
            last: Instant::now(),
        })
    }

    /// Returns wait time needed to have `need` tokens available (0 if ready).
    fn needed_wait(&mut self, need: f64, now: Instant) -> Duration {
        let dt = now.saturating_duration_since(self.last).as_secs_f64();
        self.last = now;
        self.tokens = (self.tokens + dt * self.qps).min(self.burst);

        if self.tokens >= need {
            self.tokens -= need;
            Duration::ZERO
        } else {
            let deficit = need - self.tokens;
            // the balance goes negative; the refill during the wait pays it back
            self.tokens -= need;
            Duration::from_secs_f64(deficit / self.qps)
        }
    }
}

#[async_trait]
impl RateGate for TokenBucket {
    async fn acquire(&mut self) {
        let wait = self.needed_wait(1.0, Instant::now());
        if !wait.is_zero() {
            tracing::trace!(target: "rate", waited_ms = wait.as_millis() as u64, "rate.acquire.wait");
            sleep(wait).await;
        }
    }
}
