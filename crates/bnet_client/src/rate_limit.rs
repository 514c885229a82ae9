//! Request pacing for the Battle.net API.
//!
//! Two layers: an optional per-second request quota, and a per-batch window
//! that keeps consecutive batches at least `spacing` apart.

use governor::{Quota, RateLimiter as GovLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

type DirectLimiter =
    GovLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>;

/// Global request quota shared by every in-flight request.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    limiter: Option<Arc<DirectLimiter>>,
}

impl RateLimiter {
    /// Create with a per-second limit. Zero disables the quota.
    pub fn per_second(requests_per_sec: u32) -> Self {
        let limiter = NonZeroU32::new(requests_per_sec)
            .map(|n| Arc::new(GovLimiter::direct(Quota::per_second(n))));
        Self { limiter }
    }

    /// Wait until a request slot is available.
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

/// Pacing window for one batch of requests.
///
/// The window opens at the batch's first completion; closing it sleeps for
/// whatever is left of `spacing`.
#[derive(Debug)]
pub struct BatchWindow {
    spacing: Duration,
    first_completion: Option<Instant>,
}

impl BatchWindow {
    pub fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            first_completion: None,
        }
    }

    /// Note a completed request. Only the first one matters.
    pub fn record_completion(&mut self) {
        if self.first_completion.is_none() {
            self.first_completion = Some(Instant::now());
        }
    }

    /// Time still to wait before the next batch may start.
    pub fn remaining(&self) -> Duration {
        match self.first_completion {
            Some(start) => self.spacing.saturating_sub(start.elapsed()),
            None => Duration::ZERO,
        }
    }

    pub async fn close(self) {
        let remaining = self.remaining();
        if !remaining.is_zero() {
            debug!("Batch pacing: waiting {:?}", remaining);
            tokio::time::sleep(remaining).await;
        }
    }
}
