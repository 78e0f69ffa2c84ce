//! Time source and backoff schedule.

use std::time::{Duration, Instant};

use async_trait::async_trait;

/// Injectable sleep/now so waits can be virtualized in tests.
#[async_trait]
pub trait Clock: Send + Sync {
	async fn sleep(&self, duration: Duration);
	fn now(&self) -> Instant;
}

/// Wall-clock implementation backed by tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
	async fn sleep(&self, duration: Duration) {
		tokio::time::sleep(duration).await;
	}

	fn now(&self) -> Instant {
		Instant::now()
	}
}

/// `base * 2^attempt`, capped at `cap`.
pub fn backoff(attempt: u32, base: Duration, cap: Duration) -> Duration {
	let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
	base.checked_mul(factor).map_or(cap, |d| d.min(cap))
}
