//! Result envelope for machine consumers and text rendering for people.
//!
//! With `--format json` every command writes one envelope to stdout:
//!
//! ```json
//! {
//!   "schemaVersion": 1,
//!   "ok": true,
//!   "command": "export",
//!   "data": { ... },
//!   "timings": { "durationMs": 1234 }
//! }
//! ```
//!
//! On failure `data` is absent and `error` carries a code and message.

mod report;

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

pub use report::{format_elapsed, render_chat_list, render_report};

/// Bumped on breaking changes to the envelope.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// Coloured text for a terminal
	#[default]
	Text,
	/// One JSON envelope on stdout
	Json,
}

/// Envelope written by every command under `--format json`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	pub schema_version: u32,
	pub ok: bool,
	/// Subcommand path, e.g. `"checkpoint show"`
	pub command: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
	pub timings: Timings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandError {
	pub code: ErrorCode,
	pub message: String,
	/// `{"hint": ...}` when the failure has an obvious remedy.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

impl CommandError {
	pub fn hint(&self) -> Option<&str> {
		self.details.as_ref()?.get("hint")?.as_str()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// Automation server could not be started or reached
	ServerUnavailable,
	/// No usable device, or the device bridge failed
	DeviceUnavailable,
	/// Session could not be established or was lost for good
	SessionError,
	/// Target app is not in the foreground
	AppNotReady,
	NotFound,
	Timeout,
	IoError,
	InvalidInput,
	/// The user quit at a prompt or pressed Ctrl-C
	Cancelled,
	InternalError,
}

impl ErrorCode {
	pub fn as_str(self) -> &'static str {
		match self {
			ErrorCode::ServerUnavailable => "SERVER_UNAVAILABLE",
			ErrorCode::DeviceUnavailable => "DEVICE_UNAVAILABLE",
			ErrorCode::SessionError => "SESSION_ERROR",
			ErrorCode::AppNotReady => "APP_NOT_READY",
			ErrorCode::NotFound => "NOT_FOUND",
			ErrorCode::Timeout => "TIMEOUT",
			ErrorCode::IoError => "IO_ERROR",
			ErrorCode::InvalidInput => "INVALID_INPUT",
			ErrorCode::Cancelled => "CANCELLED",
			ErrorCode::InternalError => "INTERNAL_ERROR",
		}
	}
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
	pub duration_ms: u64,
}

/// Accumulates one command's envelope; the clock starts at [`ResultBuilder::new`].
pub struct ResultBuilder<T: Serialize> {
	command: String,
	started: Instant,
	data: Option<T>,
	error: Option<CommandError>,
}

impl<T: Serialize> ResultBuilder<T> {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			started: Instant::now(),
			data: None,
			error: None,
		}
	}

	pub fn data(self, data: T) -> Self {
		Self { data: Some(data), ..self }
	}

	pub fn command_error(self, error: CommandError) -> Self {
		Self { error: Some(error), ..self }
	}

	pub fn build(self) -> CommandResult<T> {
		CommandResult {
			schema_version: SCHEMA_VERSION,
			ok: self.error.is_none() && self.data.is_some(),
			command: self.command,
			data: self.data,
			error: self.error,
			timings: Timings {
				duration_ms: u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX),
			},
		}
	}
}

/// Write `result` to stdout as pretty JSON.
pub fn print_json<T: Serialize>(result: &CommandResult<T>) {
	match serde_json::to_string_pretty(result) {
		Ok(json) => println!("{json}"),
		Err(err) => eprintln!("failed to encode result: {err}"),
	}
}

/// Print an error to stderr, followed by its hint.
pub fn print_error_stderr(error: &CommandError) {
	eprintln!("Error [{}]: {}", error.code, error.message);
	if let Some(hint) = error.hint() {
		eprintln!("hint: {hint}");
	}
}
