//! Errors raised by tool discovery, the device bridge and the server connection.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the device or automation server.
#[derive(Debug, Error)]
pub enum Error {
	/// A required executable could not be located.
	#[error("{tool} not found. {hint}")]
	ToolNotFound { tool: &'static str, hint: &'static str },

	/// Failed to launch the automation server process.
	#[error("Failed to launch automation server: {0}")]
	LaunchFailed(String),

	/// Server process started but never reported ready.
	#[error("Automation server at {url} not ready after {waited_secs}s")]
	ServerNotReady { url: String, waited_secs: u64 },

	/// Failed to reach the automation server.
	#[error("Failed to connect to automation server: {0}")]
	ConnectionFailed(String),

	/// HTTP-level failure after a connection was established.
	#[error("Transport error: {0}")]
	TransportError(String),

	/// Response did not match the expected protocol shape.
	#[error("Protocol error: {0}")]
	ProtocolError(String),

	/// Error reported by the automation server.
	#[error("{name}: {message}")]
	Remote {
		/// W3C error code (e.g., "no such element", "invalid session id")
		name: String,
		/// Human-readable error message
		message: String,
		/// Server-side stack trace (if available)
		stack: Option<String>,
	},

	/// A device bridge command exited unsuccessfully.
	#[error("`adb {command}` failed (exit {code}): {stderr}")]
	CommandFailed { command: String, code: i32, stderr: String },

	/// Device transport is down or the device is not attached.
	#[error("Device unreachable: {0}")]
	DeviceUnreachable(String),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// Timeout waiting for an operation.
	#[error("Timeout: {0}")]
	Timeout(String),

	/// Invalid argument provided to a method.
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
}

impl Error {
	/// W3C error code of a server-reported failure.
	fn remote_name(&self) -> Option<&str> {
		match self {
			Error::Remote { name, .. } => Some(name),
			_ => None,
		}
	}

	/// Local timeouts and the server's own `timeout` code.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout(_) | Error::ServerNotReady { .. }) || self.remote_name() == Some("timeout")
	}

	/// The server no longer knows the session.
	pub fn is_invalid_session(&self) -> bool {
		self.remote_name() == Some("invalid session id")
	}

	pub fn is_no_such_element(&self) -> bool {
		self.remote_name() == Some("no such element")
	}

	/// An element handle outlived the view it came from.
	pub fn is_stale_element(&self) -> bool {
		self.remote_name() == Some("stale element reference")
	}
}

impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		if err.is_timeout() {
			Error::Timeout(err.to_string())
		} else if err.is_connect() {
			Error::ConnectionFailed(err.to_string())
		} else if err.is_decode() {
			Error::ProtocolError(err.to_string())
		} else {
			Error::TransportError(err.to_string())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn remote(name: &str) -> Error {
		Error::Remote {
			name: name.into(),
			message: "boom".into(),
			stack: Some("at server".into()),
		}
	}

	#[test]
	fn remote_predicates_match_w3c_codes() {
		assert!(remote("invalid session id").is_invalid_session());
		assert!(remote("no such element").is_no_such_element());
		assert!(remote("stale element reference").is_stale_element());
		assert!(remote("timeout").is_timeout());
		assert!(!remote("unknown error").is_invalid_session());
	}

	#[test]
	fn remote_display_keeps_server_message() {
		assert_eq!(remote("invalid session id").to_string(), "invalid session id: boom");
		assert!(!Error::Timeout("x".into()).is_invalid_session());
		assert!(Error::ServerNotReady { url: "http://127.0.0.1:4723".into(), waited_secs: 30 }.is_timeout());
	}
}
