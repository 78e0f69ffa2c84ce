//! Sequential batch export with checkpointing.
//!
//! Each chat is driven to completion and the app returned to its conversation
//! list before the next one starts. A per-item failure is recorded and the
//! batch moves on; a foreground check failure, a fatal error or a session loss
//! that survives every reconnect stops the remaining batch.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Serialize, Serializer};
use tracing::{error, info, warn};

use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::classify::{ErrorClass, classify};
use crate::discovery::ChatList;
use crate::error::Error;
use crate::hook::{HookOutcome, PostExportHook};
use crate::navigation;
use crate::resume::ResumeFolder;
use crate::session::{DEFAULT_MAX_RETRIES, SessionManager};
use crate::workflow::{ExportTask, ExportWorkflow, SkipReason, Terminal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
	Exported,
	SkippedAlreadyExists,
	SkippedNoExportOption,
	SkippedPrivacyRestricted,
	Failed,
}

impl ExportStatus {
	pub fn label(&self) -> &'static str {
		match self {
			ExportStatus::Exported => "exported",
			ExportStatus::SkippedAlreadyExists => "skipped (already exists)",
			ExportStatus::SkippedNoExportOption => "skipped (no export option)",
			ExportStatus::SkippedPrivacyRestricted => "skipped (privacy restricted)",
			ExportStatus::Failed => "failed",
		}
	}
}

impl From<Terminal> for ExportStatus {
	fn from(terminal: Terminal) -> Self {
		match terminal {
			Terminal::Exported => ExportStatus::Exported,
			Terminal::Skipped(SkipReason::NoExportOption) => ExportStatus::SkippedNoExportOption,
			Terminal::Skipped(SkipReason::PrivacyRestricted) => ExportStatus::SkippedPrivacyRestricted,
		}
	}
}

fn as_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
	serializer.serialize_f64(duration.as_secs_f64())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportOutcome {
	pub chat: String,
	pub status: ExportStatus,
	#[serde(rename = "elapsed_secs", serialize_with = "as_secs")]
	pub elapsed: Duration,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub hook: Option<HookOutcome>,
}

/// Timing over exported items only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimingStats {
	#[serde(serialize_with = "as_secs")]
	pub total: Duration,
	#[serde(serialize_with = "as_secs")]
	pub average: Duration,
	#[serde(serialize_with = "as_secs")]
	pub fastest: Duration,
	#[serde(serialize_with = "as_secs")]
	pub slowest: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
	pub outcomes: Vec<ExportOutcome>,
	#[serde(rename = "elapsed_secs", serialize_with = "as_secs")]
	pub elapsed: Duration,
	/// Why the batch stopped early, if it did.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub aborted: Option<String>,
	/// Last checkpoint written during the run.
	#[serde(skip)]
	pub checkpoint: Option<Checkpoint>,
}

impl BatchReport {
	pub fn count(&self, status: ExportStatus) -> usize {
		self.outcomes.iter().filter(|o| o.status == status).count()
	}

	pub fn status_of(&self, chat: &str) -> Option<ExportStatus> {
		self.outcomes.iter().find(|o| o.chat == chat).map(|o| o.status)
	}

	pub fn statuses(&self) -> Vec<ExportStatus> {
		self.outcomes.iter().map(|o| o.status).collect()
	}

	pub fn is_complete(&self) -> bool {
		self.aborted.is_none()
	}

	pub fn summary(&self) -> BatchSummary {
		BatchSummary {
			exported: self.count(ExportStatus::Exported),
			skipped_already_exists: self.count(ExportStatus::SkippedAlreadyExists),
			skipped_no_export_option: self.count(ExportStatus::SkippedNoExportOption),
			skipped_privacy_restricted: self.count(ExportStatus::SkippedPrivacyRestricted),
			failed: self.count(ExportStatus::Failed),
			timing: self.exported_timing(),
		}
	}

	/// Total/average/fastest/slowest over exported items; `None` if nothing was exported.
	pub fn exported_timing(&self) -> Option<TimingStats> {
		let times: Vec<Duration> = self.outcomes.iter().filter(|o| o.status == ExportStatus::Exported).map(|o| o.elapsed).collect();
		let fastest = times.iter().min().copied()?;
		let slowest = times.iter().max().copied()?;
		let total: Duration = times.iter().sum();
		Some(TimingStats {
			total,
			average: total / times.len() as u32,
			fastest,
			slowest,
		})
	}
}

/// Per-status counts and exported-item timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatchSummary {
	pub exported: usize,
	pub skipped_already_exists: usize,
	pub skipped_no_export_option: usize,
	pub skipped_privacy_restricted: usize,
	pub failed: usize,
	pub timing: Option<TimingStats>,
}

/// Drives a list of [`ExportTask`]s through one session.
pub struct BatchRunner {
	chats: ChatList,
	workflow: ExportWorkflow,
	checkpoint: Option<CheckpointStore>,
	hook: Option<Box<dyn PostExportHook>>,
	resume: Option<ResumeFolder>,
	max_retries: u32,
}

impl std::fmt::Debug for BatchRunner {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BatchRunner")
			.field("checkpoint", &self.checkpoint.as_ref().map(|c| c.path().to_path_buf()))
			.field("resume", &self.resume.as_ref().map(|r| r.root().to_path_buf()))
			.field("hook", &self.hook.is_some())
			.field("max_retries", &self.max_retries)
			.finish_non_exhaustive()
	}
}

impl BatchRunner {
	pub fn new(chats: ChatList, workflow: ExportWorkflow) -> Self {
		Self {
			chats,
			workflow,
			checkpoint: None,
			hook: None,
			resume: None,
			max_retries: DEFAULT_MAX_RETRIES,
		}
	}

	pub fn with_checkpoint(mut self, store: Option<CheckpointStore>) -> Self {
		self.checkpoint = store;
		self
	}

	pub fn with_hook(mut self, hook: Option<Box<dyn PostExportHook>>) -> Self {
		self.hook = hook;
		self
	}

	pub fn with_resume_folder(mut self, folder: Option<ResumeFolder>) -> Self {
		self.resume = folder;
		self
	}

	pub fn with_max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = max_retries;
		self
	}

	pub fn workflow(&self) -> &ExportWorkflow {
		&self.workflow
	}

	/// Export `tasks[start_index..]`. Indices in checkpoints refer to `tasks`.
	pub async fn run(&self, session: &mut SessionManager, tasks: &[ExportTask], start_index: usize) -> BatchReport {
		let clock = session.context().clock.clone();
		let batch_start = clock.now();
		let total = tasks.len();
		let mut report = BatchReport::default();

		for (index, task) in tasks.iter().enumerate().skip(start_index) {
			info!(target = "chatex.batch", "processing chat {}/{}: '{}'", index + 1, total, task.chat);
			let item_start = clock.now();

			if let Err(err) = session.ensure_open(self.max_retries).await {
				let reason = format!("target app not accessible before '{}': {err}", task.chat);
				error!(target = "chatex.batch", %reason, "stopping batch");
				report.outcomes.push(failed(task, clock.now() - item_start, reason.clone()));
				report.aborted = Some(reason);
				break;
			}

			if let Some(folder) = &self.resume {
				let (exists, entries) = folder.check(&task.chat);
				if exists {
					info!(target = "chatex.batch", chat = %task.chat, ?entries, "already exported; skipping");
					report.outcomes.push(ExportOutcome {
						chat: task.chat.clone(),
						status: ExportStatus::SkippedAlreadyExists,
						elapsed: clock.now() - item_start,
						error: None,
						hook: None,
					});
					continue;
				}
			}

			let result = self.export_one(session, task).await;

			if let Err(err) = session.navigate_back_to_main().await {
				warn!(target = "chatex.batch", error = %err, "could not return to conversation list");
			}

			let mut outcome = match result {
				Ok(terminal) => ExportOutcome {
					chat: task.chat.clone(),
					status: terminal.into(),
					elapsed: Duration::ZERO,
					error: None,
					hook: None,
				},
				Err(err) => {
					let class = classify(&err);
					let outcome = failed(task, Duration::ZERO, err.to_string());
					if matches!(class, ErrorClass::SessionLoss | ErrorClass::Fatal) {
						error!(target = "chatex.batch", chat = %task.chat, error = %err, ?class, "unrecoverable; stopping batch");
						report.aborted = Some(err.to_string());
						report.outcomes.push(ExportOutcome {
							elapsed: clock.now() - item_start,
							..outcome
						});
						break;
					}
					error!(target = "chatex.batch", chat = %task.chat, error = %err, "export failed");
					outcome
				}
			};

			if outcome.status == ExportStatus::Exported {
				if let Some(store) = &self.checkpoint {
					match store.save(index, &task.chat, total, true) {
						Ok(()) => report.checkpoint = store.load(),
						Err(err) => warn!(target = "chatex.batch", error = %err, "could not save checkpoint"),
					}
				}
				if let Some(hook) = &self.hook {
					outcome.hook = Some(self.run_hook(hook.as_ref(), task).await);
				}
			}

			outcome.elapsed = clock.now() - item_start;
			info!(
				target = "chatex.batch",
				chat = %task.chat,
				status = outcome.status.label(),
				elapsed_ms = outcome.elapsed.as_millis() as u64,
				total_ms = (clock.now() - batch_start).as_millis() as u64,
				"chat done"
			);
			report.outcomes.push(outcome);
		}

		report.elapsed = clock.now() - batch_start;
		if report.is_complete() {
			if let Some(store) = &self.checkpoint {
				if let Err(err) = store.clear() {
					warn!(target = "chatex.batch", error = %err, "could not clear checkpoint");
				}
			}
		}
		report
	}

	async fn export_one(&self, session: &mut SessionManager, task: &ExportTask) -> crate::error::Result<Terminal> {
		let ctx = session.context().clone();
		let (ctx, chats, workflow) = (&ctx, &self.chats, &self.workflow);
		session
			.safe_call(&task.chat, self.max_retries, |ui| {
				Box::pin(async move {
					if !navigation::to_main(ui.as_ref(), ctx).await? {
						return Err(Error::NotInApp(format!("cannot reach the conversation list to open '{}'", task.chat)));
					}
					chats.open(ui.as_ref(), &task.chat).await?;
					workflow.run(ui.as_ref(), task).await
				})
			})
			.await
	}

	async fn run_hook(&self, hook: &dyn PostExportHook, task: &ExportTask) -> HookOutcome {
		info!(target = "chatex.batch", chat = %task.chat, "running post-export hook");
		let outcome = hook.process(&task.chat, task.folder.as_deref()).await;
		if outcome.success {
			info!(target = "chatex.batch", chat = %task.chat, output = ?outcome.output_path.as_ref().map(PathBuf::as_path), "post-export hook done");
		} else {
			for err in &outcome.errors {
				warn!(target = "chatex.batch", chat = %task.chat, error = %err, "post-export hook failed");
			}
			if outcome.errors.is_empty() {
				warn!(target = "chatex.batch", chat = %task.chat, "post-export hook failed");
			}
		}
		outcome
	}
}

fn failed(task: &ExportTask, elapsed: Duration, error: String) -> ExportOutcome {
	ExportOutcome {
		chat: task.chat.clone(),
		status: ExportStatus::Failed,
		elapsed,
		error: Some(error),
		hook: None,
	}
}
