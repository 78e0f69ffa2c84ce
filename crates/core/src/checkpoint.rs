//! Resumable batch progress.
//!
//! One JSON record per run, rewritten after every successful export and removed
//! once the whole batch completes. Failed exports never touch it, so resuming
//! from [`Checkpoint::resume_index`] cannot skip an item that was not exported.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;

/// File name used under the home directory when no path is configured.
pub const DEFAULT_FILE_NAME: &str = ".chatex_checkpoint.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
	/// Zero-based index of the last exported chat in the batch selection.
	pub last_completed_index: usize,
	pub last_chat_name: String,
	pub total_chats: usize,
	pub timestamp: DateTime<Utc>,
	pub session_start: DateTime<Utc>,
}

impl Checkpoint {
	/// Index of the first chat still to do.
	pub fn resume_index(&self) -> usize {
		self.last_completed_index + 1
	}

	/// True when this checkpoint was written for a selection like `chats`.
	pub fn matches(&self, chats: &[String]) -> bool {
		self.total_chats == chats.len() && chats.get(self.last_completed_index).is_some_and(|c| c == &self.last_chat_name)
	}

	pub fn describe(&self) -> String {
		format!(
			"Found checkpoint at chat {}/{}\nLast completed: '{}'\nTimestamp: {}",
			self.last_completed_index + 1,
			self.total_chats,
			self.last_chat_name,
			self.timestamp.to_rfc3339(),
		)
	}
}

/// Reads and writes the checkpoint file.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
	path: PathBuf,
	session_start: DateTime<Utc>,
}

impl CheckpointStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			session_start: Utc::now(),
		}
	}

	/// `~/.chatex_checkpoint.json`, or the working directory when there is no home.
	pub fn default_path() -> PathBuf {
		dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(DEFAULT_FILE_NAME)
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn session_start(&self) -> DateTime<Utc> {
		self.session_start
	}

	/// Record `chat_name` at `index` as done. Does nothing unless `success`.
	pub fn save(&self, index: usize, chat_name: &str, total: usize, success: bool) -> Result<()> {
		if !success {
			debug!(target = "chatex.batch", chat = %chat_name, "export not successful; checkpoint unchanged");
			return Ok(());
		}
		let checkpoint = Checkpoint {
			last_completed_index: index,
			last_chat_name: chat_name.to_string(),
			total_chats: total,
			timestamp: Utc::now(),
			session_start: self.session_start,
		};
		if let Some(parent) = self.path.parent() {
			if !parent.as_os_str().is_empty() {
				fs::create_dir_all(parent)?;
			}
		}
		fs::write(&self.path, serde_json::to_string_pretty(&checkpoint)?)?;
		debug!(target = "chatex.batch", index, chat = %chat_name, total, "checkpoint saved");
		Ok(())
	}

	/// The stored checkpoint. Missing or unreadable files yield `None`.
	pub fn load(&self) -> Option<Checkpoint> {
		let content = fs::read_to_string(&self.path).ok()?;
		match serde_json::from_str(&content) {
			Ok(checkpoint) => Some(checkpoint),
			Err(err) => {
				warn!(target = "chatex.batch", path = %self.path.display(), error = %err, "ignoring corrupt checkpoint");
				None
			}
		}
	}

	pub fn exists(&self) -> bool {
		self.path.is_file()
	}

	/// Remove the checkpoint; a missing file is not an error.
	pub fn clear(&self) -> Result<()> {
		match fs::remove_file(&self.path) {
			Ok(()) => {
				info!(target = "chatex.batch", path = %self.path.display(), "checkpoint cleared");
				Ok(())
			}
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(err) => Err(err.into()),
		}
	}
}
