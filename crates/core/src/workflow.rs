//! Per-chat export state machine.
//!
//! ```text
//! Idle -> MenuOpened -> MoreOpened -> ExportRequested -> MediaOptionResolved
//!      -> DestinationReady -> DestinationSelected -> Committed
//! ```
//!
//! A missing "More" or "Export" entry ends the run as
//! [`Terminal::Skipped`]`(`[`SkipReason::NoExportOption`]`)`; the
//! privacy-restriction dialog is dismissed and ends it as
//! [`SkipReason::PrivacyRestricted`] from whichever state it appears in. Any
//! other failure is an error and the UI tree is captured when a diagnostics
//! directory is configured.

use std::path::PathBuf;

use chatex_protocol::keycode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::automation::{Automation, Query, TextMatch, click_or_tap, is_present, widget};
use crate::classify::{ErrorClass, classify};
use crate::clock::backoff;
use crate::context::EngineContext;
use crate::error::{Error, Result};
use crate::resolver::{Locator, Positional, Resolved, Resolver, Role};
use crate::session::capture_ui_tree;

/// One chat to export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTask {
	pub chat: String,
	pub include_media: bool,
	/// Destination folder label handed to the downstream hook.
	pub folder: Option<String>,
}

impl ExportTask {
	pub fn new(chat: impl Into<String>, include_media: bool) -> Self {
		Self {
			chat: chat.into(),
			include_media,
			folder: None,
		}
	}

	pub fn with_folder(mut self, folder: Option<String>) -> Self {
		self.folder = folder;
		self
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportState {
	Idle,
	MenuOpened,
	MoreOpened,
	ExportRequested,
	MediaOptionResolved,
	DestinationReady,
	DestinationSelected,
	Committed,
}

impl ExportState {
	pub fn name(&self) -> &'static str {
		match self {
			ExportState::Idle => "idle",
			ExportState::MenuOpened => "menu_opened",
			ExportState::MoreOpened => "more_opened",
			ExportState::ExportRequested => "export_requested",
			ExportState::MediaOptionResolved => "media_option_resolved",
			ExportState::DestinationReady => "destination_ready",
			ExportState::DestinationSelected => "destination_selected",
			ExportState::Committed => "committed",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
	/// No "More" or "Export" entry (community and similar chats).
	NoExportOption,
	/// The app refused with its privacy-restriction dialog.
	PrivacyRestricted,
}

/// How a workflow run ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
	Exported,
	Skipped(SkipReason),
}

#[derive(Debug, PartialEq)]
enum Step {
	Next(ExportState),
	Done(Terminal),
}

/// Drives one chat through the export flow. Owns the locator cache.
#[derive(Debug)]
pub struct ExportWorkflow {
	ctx: EngineContext,
	resolver: Resolver,
	diagnostics: Option<PathBuf>,
}

impl ExportWorkflow {
	pub fn new(ctx: EngineContext) -> Self {
		Self {
			ctx,
			resolver: Resolver::new(),
			diagnostics: None,
		}
	}

	/// Capture the UI tree here when a step fails.
	pub fn with_diagnostics(mut self, dir: Option<PathBuf>) -> Self {
		self.diagnostics = dir;
		self
	}

	pub fn resolver(&self) -> &Resolver {
		&self.resolver
	}

	/// Run the flow for `task`; the conversation must already be open.
	pub async fn run(&self, ui: &dyn Automation, task: &ExportTask) -> Result<Terminal> {
		let mut state = ExportState::Idle;
		info!(target = "chatex.workflow", chat = %task.chat, media = task.include_media, "export started");

		loop {
			let step = match self.advance(ui, task, state).await {
				Ok(step) => step,
				Err(err) => {
					self.capture_failure(ui, task, state, &err).await;
					return Err(err);
				}
			};
			match step {
				Step::Next(next) => {
					debug!(target = "chatex.workflow", chat = %task.chat, from = state.name(), to = next.name(), "transition");
					state = next;
				}
				Step::Done(terminal) => {
					info!(target = "chatex.workflow", chat = %task.chat, ?terminal, at = state.name(), "export finished");
					return Ok(terminal);
				}
			}
		}
	}

	async fn advance(&self, ui: &dyn Automation, task: &ExportTask, state: ExportState) -> Result<Step> {
		if !matches!(state, ExportState::Idle | ExportState::Committed) && self.privacy_dialog_present(ui).await?
		{
			self.dismiss_privacy(ui).await?;
			return Ok(Step::Done(Terminal::Skipped(SkipReason::PrivacyRestricted)));
		}

		match state {
			ExportState::Idle => self.open_menu(ui).await,
			ExportState::MenuOpened => self.open_more(ui).await,
			ExportState::MoreOpened => self.request_export(ui).await,
			ExportState::ExportRequested => self.choose_media(ui, task.include_media).await,
			ExportState::MediaOptionResolved => self.await_share_surface(ui).await,
			ExportState::DestinationReady => self.select_destination(ui).await,
			ExportState::DestinationSelected => self.commit(ui).await,
			ExportState::Committed => Ok(Step::Done(Terminal::Exported)),
		}
	}

	async fn click(&self, ui: &dyn Automation, resolved: &Resolved) -> Result<()> {
		click_or_tap(ui, &resolved.target).await?;
		self.ctx.settle().await;
		Ok(())
	}

	async fn press_back(&self, ui: &dyn Automation, times: usize) -> Result<()> {
		for _ in 0..times {
			ui.press_key(keycode::BACK).await?;
			self.ctx.sleep(self.ctx.timings.poll).await;
		}
		Ok(())
	}

	async fn open_menu(&self, ui: &dyn Automation) -> Result<Step> {
		let profile = &self.ctx.profile;
		let chain = [
			Locator::id(&profile.menu_id),
			Locator::Query(Query::Description(TextMatch::exact(&profile.menu_label))),
			Locator::accessibility(&profile.menu_label),
			Locator::Positional(Positional::TopRightIcon {
				right_margin: 200,
				max_y: 400,
			}),
		];
		let menu = self
			.resolver
			.resolve(ui, Role::Menu, &chain)
			.await?
			.ok_or_else(|| Error::step("open_menu", "overflow menu not found"))?;
		self.click(ui, &menu).await?;
		Ok(Step::Next(ExportState::MenuOpened))
	}

	async fn open_more(&self, ui: &dyn Automation) -> Result<Step> {
		let label = TextMatch::exact(&self.ctx.profile.more_label);
		let chain = [Locator::text_in(widget::TEXT_VIEW, label.clone()), Locator::Container(label)];
		match self.resolver.resolve(ui, Role::More, &chain).await? {
			Some(more) => {
				self.click(ui, &more).await?;
				Ok(Step::Next(ExportState::MoreOpened))
			}
			None => {
				info!(target = "chatex.workflow", "no 'More' entry; skipping");
				self.press_back(ui, 1).await?;
				Ok(Step::Done(Terminal::Skipped(SkipReason::NoExportOption)))
			}
		}
	}

	async fn request_export(&self, ui: &dyn Automation) -> Result<Step> {
		let label = TextMatch::contains(&self.ctx.profile.export_label);
		let chain = [Locator::text_in(widget::TEXT_VIEW, label.clone()), Locator::Container(label)];
		match self.resolver.resolve(ui, Role::Export, &chain).await? {
			Some(export) => {
				self.click(ui, &export).await?;
				Ok(Step::Next(ExportState::ExportRequested))
			}
			None => {
				info!(target = "chatex.workflow", "no 'Export' entry; skipping");
				self.press_back(ui, 2).await?;
				Ok(Step::Done(Terminal::Skipped(SkipReason::NoExportOption)))
			}
		}
	}

	async fn privacy_dialog_present(&self, ui: &dyn Automation) -> Result<bool> {
		for phrase in &self.ctx.profile.privacy_phrases {
			if is_present(ui, &Query::text(TextMatch::contains(phrase))).await? {
				debug!(target = "chatex.workflow", %phrase, "privacy restriction dialog");
				return Ok(true);
			}
		}
		Ok(false)
	}

	async fn dismiss_privacy(&self, ui: &dyn Automation) -> Result<()> {
		let label = TextMatch::exact(&self.ctx.profile.dismiss_label);
		let chain = [
			Locator::text_in(widget::BUTTON, label.clone()),
			Locator::Container(label.clone()),
			Locator::text(label),
		];
		match self.resolver.resolve(ui, Role::PrivacyDismiss, &chain).await? {
			Some(ok) => self.click(ui, &ok).await?,
			None => self.press_back(ui, 1).await?,
		}
		warn!(target = "chatex.workflow", "export blocked by chat privacy setting");
		Ok(())
	}

	/// Whether the system share sheet (or the destination list) is showing.
	async fn share_surface_present(&self, ui: &dyn Automation) -> Result<bool> {
		let profile = &self.ctx.profile;
		if ui.current_package().await? == profile.share_package {
			return Ok(true);
		}

		if let Some((first, rest)) = profile.share_text_hints.split_first() {
			for element in ui.find_all(&Query::text(TextMatch::contains(first))).await? {
				let text = element.text.to_lowercase();
				if element.displayed && rest.iter().all(|hint| text.contains(&hint.to_lowercase())) {
					return Ok(true);
				}
			}
		}
		if let Some(last) = profile.destination_labels.last() {
			if is_present(ui, &Query::text(TextMatch::exact(last))).await? {
				return Ok(true);
			}
		}
		for id in &profile.share_container_ids {
			if is_present(ui, &Query::id(id)).await? {
				return Ok(true);
			}
		}
		Ok(false)
	}

	async fn choose_media(&self, ui: &dyn Automation, include: bool) -> Result<Step> {
		if self.share_surface_present(ui).await? {
			debug!(target = "chatex.workflow", "share surface already showing; no media prompt");
			return Ok(Step::Next(ExportState::DestinationReady));
		}

		let profile = &self.ctx.profile;
		let (role, label, index) = if include {
			(Role::IncludeMedia, &profile.include_media_label, 1)
		} else {
			(Role::ExcludeMedia, &profile.exclude_media_label, 0)
		};
		let chain = [
			Locator::text_in(widget::BUTTON, TextMatch::exact(label)),
			Locator::Container(TextMatch::exact(label)),
			Locator::Positional(Positional::NthContainer {
				matcher: TextMatch::contains("media"),
				index,
			}),
		];

		match self.resolver.resolve(ui, role, &chain).await? {
			Some(option) => {
				info!(target = "chatex.workflow", option = %option.label, "media option");
				self.click(ui, &option).await?;
				Ok(Step::Next(ExportState::MediaOptionResolved))
			}
			None if self.share_surface_present(ui).await? => Ok(Step::Next(ExportState::DestinationReady)),
			None => Err(Error::step("choose_media", format!("media option '{label}' not found"))),
		}
	}

	async fn await_share_surface(&self, ui: &dyn Automation) -> Result<Step> {
		let timings = &self.ctx.timings;
		for attempt in 0..timings.backoff_attempts {
			if self.share_surface_present(ui).await? {
				return Ok(Step::Next(ExportState::DestinationReady));
			}
			let wait = backoff(attempt, timings.backoff_base, timings.backoff_cap);
			debug!(target = "chatex.workflow", attempt, wait_ms = wait.as_millis() as u64, "share surface not yet visible");
			self.ctx.sleep(wait).await;
		}
		warn!(target = "chatex.workflow", "share surface never observed; continuing");
		Ok(Step::Next(ExportState::DestinationReady))
	}

	async fn select_destination(&self, ui: &dyn Automation) -> Result<Step> {
		let profile = &self.ctx.profile;
		let chain: Vec<Locator> = profile
			.destination_labels
			.iter()
			.flat_map(|label| {
				[
					Locator::text_in(widget::TEXT_VIEW, TextMatch::exact(label)),
					Locator::Container(TextMatch::exact(label)),
				]
			})
			.collect();

		let mut swipes = 0;
		let destination = loop {
			if let Some(found) = self.resolver.resolve(ui, Role::Destination, &chain).await? {
				if profile.accepts_destination(&found.label) {
					break found;
				}
				warn!(target = "chatex.workflow", label = %found.label, "rejected destination candidate");
				self.resolver.evict(Role::Destination);
			}
			if swipes >= self.ctx.timings.destination_swipes {
				return Err(Error::step("select_destination", "cloud destination not found in share sheet"));
			}
			swipes += 1;
			let size = ui.window_size().await?;
			ui.swipe(size.at(0.5, 0.85), size.at(0.5, 0.35), self.ctx.timings.swipe).await?;
			self.ctx.sleep(self.ctx.timings.poll).await;
		};

		info!(target = "chatex.workflow", destination = %destination.label, "destination");
		self.click(ui, &destination).await?;
		Ok(Step::Next(ExportState::DestinationSelected))
	}

	async fn commit(&self, ui: &dyn Automation) -> Result<Step> {
		let profile = &self.ctx.profile;
		let label = TextMatch::exact(&profile.commit_label);
		let chain = [
			Locator::id(&profile.commit_id),
			Locator::text_in(widget::BUTTON, label.clone()),
			Locator::text(label.clone()),
			Locator::Container(label.clone()),
			Locator::Query(Query::Description(label.clone())),
			Locator::Positional(Positional::TopRightText {
				matcher: label,
				min_x: 0.7,
				max_y: 0.15,
			}),
		];
		let commit = self
			.resolver
			.resolve(ui, Role::Commit, &chain)
			.await?
			.ok_or_else(|| Error::step("commit", "upload button not found"))?;

		let text = if commit.label.is_empty() { commit.target.content_desc.clone() } else { commit.label.clone() };
		let by_id = commit.target.resource_id == profile.commit_id;
		if !text.is_empty() && !by_id && !text.to_lowercase().contains(&profile.commit_label.to_lowercase()) {
			return Err(Error::step("commit", format!("button reads '{text}', not '{}'", profile.commit_label)));
		}
		if text.is_empty() && !by_id {
			debug!(target = "chatex.workflow", "commit label unreadable; proceeding");
		}

		self.click(ui, &commit).await?;
		Ok(Step::Next(ExportState::Committed))
	}

	async fn capture_failure(&self, ui: &dyn Automation, task: &ExportTask, state: ExportState, err: &Error) {
		warn!(target = "chatex.workflow", chat = %task.chat, at = state.name(), error = %err, "export step failed");
		if matches!(classify(err), ErrorClass::SessionLoss | ErrorClass::Fatal) {
			return;
		}
		let Some(dir) = &self.diagnostics else {
			return;
		};
		let label = format!("{}-{}", task.chat, state.name());
		match capture_ui_tree(ui, dir, &label).await {
			Ok(path) => info!(target = "chatex.workflow", path = %path.display(), "UI tree saved"),
			Err(capture_err) => debug!(target = "chatex.workflow", error = %capture_err, "could not capture UI tree"),
		}
	}
}
