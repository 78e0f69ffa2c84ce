//! Error classification for retry decisions.
//!
//! Typed errors are classified structurally; anything else falls through to a
//! keyword table over the lower-cased message.

use crate::error::Error;

/// How the orchestrator should react to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
	/// Session is gone; reconnect and retry.
	SessionLoss,
	/// Momentary UI churn; the step itself may retry.
	Transient,
	/// Nothing to retry; stop the batch.
	Fatal,
	/// Per-item failure; the batch continues.
	Unclassified,
}

/// Lower-cased substrings that mark a lost automation session.
pub const SESSION_LOSS_KEYWORDS: &[&str] = &[
	"session is either terminated",
	"nosuchdrivererror",
	"invalidsessionid",
	"invalid session id",
	"session",
	"terminated",
	"not started",
	"connection refused",
	"socket hang up",
];

/// Lower-cased substrings that mark a transient UI condition.
pub const TRANSIENT_KEYWORDS: &[&str] = &["stale element", "element is not attached", "timed out", "timeout"];

/// Lower-cased substrings that mark an unrecoverable device condition.
pub const FATAL_KEYWORDS: &[&str] = &["device offline", "device not found", "no devices/emulators found", "device unauthorized"];

pub fn classify(err: &Error) -> ErrorClass {
	match err {
		Error::SessionLost(_) => return ErrorClass::SessionLoss,
		Error::DeviceUnreachable(_) => return ErrorClass::Fatal,
		Error::ElementNotFound(_) | Error::StepFailed { .. } | Error::ChatNotFound(_) | Error::InvalidArgument(_) => {
			return ErrorClass::Unclassified;
		}
		Error::Runtime(inner) => {
			use chatex_runtime::Error as R;
			match inner {
				R::DeviceUnreachable(_) | R::ToolNotFound { .. } => return ErrorClass::Fatal,
				R::ConnectionFailed(_) => return ErrorClass::SessionLoss,
				_ if inner.is_invalid_session() => return ErrorClass::SessionLoss,
				_ if inner.is_stale_element() => return ErrorClass::Transient,
				_ if inner.is_no_such_element() => return ErrorClass::Unclassified,
				_ => {}
			}
		}
		_ => {}
	}
	classify_message(&err.to_string())
}

/// Keyword-table classification of a raw message.
pub fn classify_message(message: &str) -> ErrorClass {
	let lower = message.to_lowercase();
	let hit = |table: &[&str]| table.iter().any(|k| lower.contains(k));

	if hit(FATAL_KEYWORDS) {
		ErrorClass::Fatal
	} else if hit(SESSION_LOSS_KEYWORDS) {
		ErrorClass::SessionLoss
	} else if hit(TRANSIENT_KEYWORDS) {
		ErrorClass::Transient
	} else {
		ErrorClass::Unclassified
	}
}

#[cfg(test)]
mod tests {
	use chatex_runtime::Error as R;

	use super::*;

	fn remote(name: &str, message: &str) -> Error {
		Error::Runtime(R::Remote {
			name: name.into(),
			message: message.into(),
			stack: None,
		})
	}

	#[test]
	fn server_session_errors_are_session_loss() {
		assert_eq!(classify(&remote("invalid session id", "A session is either terminated or not started")), ErrorClass::SessionLoss);
		assert_eq!(classify(&remote("unknown error", "NoSuchDriverError: gone")), ErrorClass::SessionLoss);
		assert_eq!(classify(&Error::Runtime(R::ConnectionFailed("refused".into()))), ErrorClass::SessionLoss);
		assert_eq!(classify(&Error::SessionLost("x".into())), ErrorClass::SessionLoss);
	}

	#[test]
	fn element_errors_are_not_session_loss() {
		assert_eq!(classify(&remote("no such element", "could not be located")), ErrorClass::Unclassified);
		assert_eq!(classify(&remote("stale element reference", "element is not attached")), ErrorClass::Transient);
		assert_eq!(classify(&Error::ElementNotFound("menu".into())), ErrorClass::Unclassified);
	}

	#[test]
	fn device_errors_are_fatal() {
		assert_eq!(classify(&Error::DeviceUnreachable("adb".into())), ErrorClass::Fatal);
		assert_eq!(classify_message("error: device offline"), ErrorClass::Fatal);
	}

	#[test]
	fn unknown_messages_are_unclassified() {
		assert_eq!(classify_message("something odd happened"), ErrorClass::Unclassified);
		assert_eq!(classify_message("Request timed out"), ErrorClass::Transient);
	}
}
