use std::path::PathBuf;

use serde_json::json;
use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	/// Failure already reported on stdout; exit non-zero without more output.
	#[error("")]
	OutputAlreadyPrinted,

	#[error("no devices attached")]
	NoDevices,

	#[error("device {serial} is not ready ({state})")]
	DeviceNotReady { serial: String, state: String },

	#[error("automation server unavailable at {url}")]
	ServerUnavailable {
		url: String,
		#[source]
		source: Option<chatex_runtime::Error>,
	},

	#[error("invalid selection: {0}")]
	Selection(String),

	#[error("cancelled")]
	Cancelled,

	#[error("config file {path}: {message}")]
	Config { path: PathBuf, message: String },

	#[error(transparent)]
	Engine(#[from] chatex::Error),

	#[error(transparent)]
	Runtime(#[from] chatex_runtime::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

fn runtime_code(err: &chatex_runtime::Error) -> ErrorCode {
	use chatex_runtime::Error as E;
	match err {
		E::ToolNotFound { .. } | E::LaunchFailed(_) | E::ServerNotReady { .. } | E::ConnectionFailed(_) => ErrorCode::ServerUnavailable,
		E::CommandFailed { .. } | E::DeviceUnreachable(_) => ErrorCode::DeviceUnavailable,
		E::Timeout(_) => ErrorCode::Timeout,
		E::InvalidArgument(_) => ErrorCode::InvalidInput,
		E::Io(_) => ErrorCode::IoError,
		_ if err.is_invalid_session() => ErrorCode::SessionError,
		_ if err.is_no_such_element() => ErrorCode::NotFound,
		_ => ErrorCode::InternalError,
	}
}

fn engine_code(err: &chatex::Error) -> ErrorCode {
	use chatex::Error as E;
	match err {
		E::Runtime(inner) => runtime_code(inner),
		E::SessionLost(_) => ErrorCode::SessionError,
		E::DeviceUnreachable(_) => ErrorCode::DeviceUnavailable,
		E::NotInApp(_) => ErrorCode::AppNotReady,
		E::ElementNotFound(_) | E::ChatNotFound(_) => ErrorCode::NotFound,
		E::Timeout(_) => ErrorCode::Timeout,
		E::Io(_) => ErrorCode::IoError,
		E::InvalidArgument(_) => ErrorCode::InvalidInput,
		_ => ErrorCode::InternalError,
	}
}

impl CliError {
	pub fn is_output_already_printed(&self) -> bool {
		matches!(self, CliError::OutputAlreadyPrinted)
	}

	pub fn code(&self) -> ErrorCode {
		match self {
			CliError::OutputAlreadyPrinted => ErrorCode::InternalError,
			CliError::NoDevices | CliError::DeviceNotReady { .. } => ErrorCode::DeviceUnavailable,
			CliError::ServerUnavailable { .. } => ErrorCode::ServerUnavailable,
			CliError::Selection(_) | CliError::Config { .. } => ErrorCode::InvalidInput,
			CliError::Cancelled => ErrorCode::Cancelled,
			CliError::Engine(err) => engine_code(err),
			CliError::Runtime(err) => runtime_code(err),
			CliError::Io(_) => ErrorCode::IoError,
			CliError::Json(_) => ErrorCode::InternalError,
		}
	}

	/// What the user can do about it, when there is something obvious.
	pub fn hint(&self) -> Option<&'static str> {
		match self.code() {
			ErrorCode::DeviceUnavailable => Some("check `adb devices`, accept the USB debugging prompt, or pass --wireless-adb"),
			ErrorCode::ServerUnavailable => Some("install the server with `npm install -g appium`, or start it yourself and pass --skip-server"),
			ErrorCode::AppNotReady => Some("unlock the phone and open the chat list, then run again"),
			ErrorCode::SessionError => Some("the session dropped; rerun with --resume-checkpoint to continue where it stopped"),
			_ => None,
		}
	}

	pub fn to_command_error(&self) -> CommandError {
		CommandError {
			code: self.code(),
			message: self.to_string(),
			details: self.hint().map(|hint| json!({ "hint": hint })),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn engine_errors_map_to_codes() {
		let err = CliError::from(chatex::Error::NotInApp("com.android.systemui".into()));
		assert_eq!(err.code(), ErrorCode::AppNotReady);
		assert!(err.hint().is_some());

		let err = CliError::from(chatex::Error::ChatNotFound("Bob".into()));
		assert_eq!(err.code(), ErrorCode::NotFound);
		assert_eq!(err.hint(), None);
	}

	#[test]
	fn runtime_errors_map_through_engine() {
		let err = CliError::from(chatex::Error::Runtime(chatex_runtime::Error::DeviceUnreachable("usb".into())));
		assert_eq!(err.code(), ErrorCode::DeviceUnavailable);

		let err = CliError::from(chatex_runtime::Error::ToolNotFound { tool: "appium", hint: "" });
		assert_eq!(err.code(), ErrorCode::ServerUnavailable);
	}

	#[test]
	fn command_error_carries_hint() {
		let cmd = CliError::NoDevices.to_command_error();
		assert_eq!(cmd.code, ErrorCode::DeviceUnavailable);
		assert_eq!(cmd.message, "no devices attached");
		assert!(cmd.details.unwrap()["hint"].as_str().unwrap().contains("adb devices"));

		assert!(CliError::Cancelled.to_command_error().details.is_none());
	}
}
