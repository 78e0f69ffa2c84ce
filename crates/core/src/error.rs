//! Error types for the export engine.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// Device bridge, server, or wire failure.
	#[error(transparent)]
	Runtime(#[from] chatex_runtime::Error),

	/// The automation session is gone and has to be re-established.
	#[error("Session lost: {0}")]
	SessionLost(String),

	/// The device transport is down; reconnecting is pointless.
	#[error("Device unreachable: {0}")]
	DeviceUnreachable(String),

	/// The foreground surface is not the target app.
	#[error("Target app not in the foreground: {0}")]
	NotInApp(String),

	/// A UI element could not be resolved through any strategy.
	#[error("Element not found: {0}")]
	ElementNotFound(String),

	/// An export step did not reach its next state.
	#[error("Export step '{step}' failed: {reason}")]
	StepFailed { step: &'static str, reason: String },

	/// The chat list scan budget ran out before the name was seen.
	#[error("Chat not found: '{0}'")]
	ChatNotFound(String),

	/// Timeout waiting for a UI condition.
	#[error("Timeout: {0}")]
	Timeout(String),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// Invalid argument provided to a method.
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
}

impl Error {
	pub(crate) fn step(step: &'static str, reason: impl Into<String>) -> Self {
		Error::StepFailed { step, reason: reason.into() }
	}

	/// Returns the runtime error this wraps, if any.
	pub fn runtime(&self) -> Option<&chatex_runtime::Error> {
		match self {
			Error::Runtime(err) => Some(err),
			_ => None,
		}
	}
}
