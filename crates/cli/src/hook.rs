//! Post-export processing by an external program.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use chatex::{HookOutcome, PostExportHook};
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs `<program> <chat> [folder]` after every successful export.
///
/// The last non-empty stdout line, if any, is taken as the output path.
#[derive(Debug, Clone)]
pub struct CommandHook {
	program: PathBuf,
}

impl CommandHook {
	pub fn new(program: impl Into<PathBuf>) -> Self {
		Self { program: program.into() }
	}
}

fn last_line(text: &str) -> Option<&str> {
	text.lines().rev().map(str::trim).find(|l| !l.is_empty())
}

#[async_trait]
impl PostExportHook for CommandHook {
	async fn process(&self, chat: &str, folder: Option<&str>) -> HookOutcome {
		let mut command = Command::new(&self.program);
		command.arg(chat).args(folder).stdin(Stdio::null()).kill_on_drop(true);
		debug!(target = "chatex.cli", program = %self.program.display(), chat = %chat, "running post-export command");

		let output = match command.output().await {
			Ok(output) => output,
			Err(err) => {
				warn!(target = "chatex.cli", program = %self.program.display(), error = %err, "post-export command did not start");
				return HookOutcome::failed(vec![format!("{}: {err}", self.program.display())]);
			}
		};

		let stdout = String::from_utf8_lossy(&output.stdout);
		if output.status.success() {
			return HookOutcome::ok(last_line(&stdout).map(PathBuf::from));
		}

		let stderr = String::from_utf8_lossy(&output.stderr);
		let mut errors: Vec<String> = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect();
		if errors.is_empty() {
			errors.push(format!("exited with {}", output.status));
		}
		warn!(target = "chatex.cli", chat = %chat, status = %output.status, "post-export command failed");
		HookOutcome::failed(errors)
	}
}
