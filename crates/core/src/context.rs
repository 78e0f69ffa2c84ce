//! Shared pacing and identifiers for the UI-facing components.

use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, TokioClock};
use crate::profile::{AppProfile, Timings};

/// App profile, timings and clock shared by session, discovery and workflow.
#[derive(Clone)]
pub struct EngineContext {
	pub profile: Arc<AppProfile>,
	pub timings: Timings,
	pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for EngineContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EngineContext")
			.field("package", &self.profile.package)
			.field("timings", &self.timings)
			.finish_non_exhaustive()
	}
}

impl Default for EngineContext {
	fn default() -> Self {
		Self::new(AppProfile::default(), Timings::default(), Arc::new(TokioClock))
	}
}

impl EngineContext {
	pub fn new(profile: AppProfile, timings: Timings, clock: Arc<dyn Clock>) -> Self {
		Self {
			profile: Arc::new(profile),
			timings,
			clock,
		}
	}

	pub async fn sleep(&self, duration: Duration) {
		self.clock.sleep(duration).await;
	}

	/// Wait for the UI to settle after an interaction.
	pub async fn settle(&self) {
		self.clock.sleep(self.timings.settle).await;
	}
}
