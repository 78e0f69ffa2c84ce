//! Session supervision: connect, verify, reconnect, retry.
//!
//! [`SessionManager`] owns the one live automation session. Every UI-driving
//! call that may outlive a dropped connection goes through
//! [`SessionManager::safe_call`], which reconnects on session loss and retries.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chatex_protocol::{Capabilities, keycode};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::automation::{Automation, BoxFut, Query, SessionFactory, is_present};
use crate::classify::{ErrorClass, classify};
use crate::context::EngineContext;
use crate::device::{Device, Transport};
use crate::error::{Error, Result};
use crate::navigation;

/// Retries allowed by default after a session loss.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
	Healthy,
	Lost,
	Recovering,
}

/// Lock-screen assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum LockState {
	Unlocked,
	Locked(String),
}

/// Coarse description of the foreground surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
	pub package: String,
	pub activity: String,
	pub in_app: bool,
	pub on_chat_list: bool,
	pub visible_chats: usize,
	pub lock: LockState,
}

/// Why the foreground check did not pass.
enum Rejection {
	/// The surface was read and is not safe to drive.
	Surface(String),
	/// Reading the surface failed.
	Call(Error),
}

impl From<Error> for Rejection {
	fn from(err: Error) -> Self {
		Rejection::Call(err)
	}
}

impl std::fmt::Display for Rejection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Rejection::Surface(reason) => f.write_str(reason),
			Rejection::Call(err) => write!(f, "{err}"),
		}
	}
}

pub struct SessionManager {
	factory: Box<dyn SessionFactory>,
	device: Box<dyn Device>,
	ctx: EngineContext,
	ui: Option<Arc<dyn Automation>>,
	health: Health,
	reconnects: u32,
}

impl std::fmt::Debug for SessionManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionManager")
			.field("serial", &self.device.serial())
			.field("transport", &self.device.transport())
			.field("connected", &self.ui.is_some())
			.field("health", &self.health)
			.field("reconnects", &self.reconnects)
			.finish()
	}
}

impl SessionManager {
	pub fn new(factory: Box<dyn SessionFactory>, device: Box<dyn Device>, ctx: EngineContext) -> Self {
		Self {
			factory,
			device,
			ctx,
			ui: None,
			health: Health::Lost,
			reconnects: 0,
		}
	}

	pub fn health(&self) -> Health {
		self.health
	}

	pub fn reconnects(&self) -> u32 {
		self.reconnects
	}

	pub fn transport(&self) -> Transport {
		self.device.transport()
	}

	pub fn context(&self) -> &EngineContext {
		&self.ctx
	}

	/// The live session, or [`Error::SessionLost`] when there is none.
	pub fn automation(&self) -> Result<Arc<dyn Automation>> {
		self.ui.clone().ok_or_else(|| Error::SessionLost("no active session".into()))
	}

	/// Capabilities for the target app; timeouts scale with the transport.
	pub fn capabilities(&self) -> Capabilities {
		let profile = &self.ctx.profile;
		Capabilities::android(&profile.package, &profile.main_activity)
			.with_udid(self.device.serial())
			.with_adb_exec_timeout(self.transport().bridge_timeout().as_millis() as u64)
	}

	/// Open a session and bring the target app to its conversation list.
	///
	/// Fails if the session cannot be opened or if [`Self::verify_open`] rejects
	/// the resulting foreground surface.
	pub async fn connect(&mut self) -> Result<()> {
		let profile = self.ctx.profile.clone();
		let transport = self.transport();
		info!(target = "chatex.session", serial = self.device.serial(), %transport, "connecting");

		if let Err(err) = self.device.force_stop(&profile.package).await {
			warn!(target = "chatex.session", error = %err, "force-stop failed; continuing");
		}
		if let Err(err) = self.device.keep_awake().await {
			warn!(target = "chatex.session", error = %err, "could not keep screen awake");
		}

		let ui = self.factory.open(&self.capabilities()).await?;
		let stabilize = match transport {
			Transport::Local => self.ctx.timings.stabilize_local,
			Transport::Wireless => self.ctx.timings.stabilize_wireless,
		};
		self.ctx.sleep(stabilize).await;

		let package = ui.current_package().await?;
		if package != profile.package {
			info!(target = "chatex.session", %package, "target app not in front; launching");
			ui.press_key(keycode::HOME).await?;
			self.device.launch(&profile.package, &profile.launch_activity).await?;
			self.ctx.sleep(stabilize).await;
		}

		self.ui = Some(ui);
		if !self.verify_open().await {
			self.health = Health::Lost;
			return Err(Error::NotInApp("foreground surface failed verification after connect".into()));
		}
		self.health = Health::Healthy;
		info!(target = "chatex.session", "session ready");
		Ok(())
	}

	/// Confirm the foreground surface is the target app and safe to drive.
	///
	/// Fails closed: any error or ambiguity yields `false`.
	pub async fn verify_open(&self) -> bool {
		match self.check_open().await {
			Ok(()) => true,
			Err(rejection) => {
				warn!(target = "chatex.session", reason = %rejection, "foreground verification failed");
				false
			}
		}
	}

	/// [`Self::verify_open`] that survives a dropped session.
	///
	/// A session loss while checking triggers up to `max_retries` reconnects,
	/// each followed by a fresh check. A surface that is readable but wrong
	/// (other app, lock screen, no in-app marker) is [`Error::NotInApp`]
	/// without any reconnect.
	pub async fn ensure_open(&mut self, max_retries: u32) -> Result<()> {
		let mut retries = 0;
		loop {
			let err = match self.check_open().await {
				Ok(()) => return Ok(()),
				Err(Rejection::Surface(reason)) => {
					warn!(target = "chatex.session", %reason, "foreground verification failed");
					return Err(Error::NotInApp(reason));
				}
				Err(Rejection::Call(err)) => err,
			};
			if classify(&err) != ErrorClass::SessionLoss || retries >= max_retries {
				warn!(target = "chatex.session", retries, error = %err, "foreground verification failed");
				return Err(err);
			}
			retries += 1;
			warn!(target = "chatex.session", attempt = retries, error = %err, "session lost before verification; reconnecting");
			self.reconnect().await?;
		}
	}

	async fn check_open(&self) -> std::result::Result<(), Rejection> {
		let ui = self.automation().map_err(Rejection::Call)?;
		self.check_foreground(ui.as_ref()).await
	}

	async fn check_foreground(&self, ui: &dyn Automation) -> std::result::Result<(), Rejection> {
		let profile = &self.ctx.profile;
		let package = ui.current_package().await?;
		if package != profile.package {
			return Err(Rejection::Surface(format!("foreground package is {package}")));
		}

		let activity = ui.current_activity().await?;
		if let Some(denied) = profile.denied_match(&activity) {
			return Err(Rejection::Surface(format!("foreground activity {activity} matches {denied}")));
		}

		let mut marker_found = false;
		for marker in &profile.marker_ids {
			if is_present(ui, &Query::id(marker)).await? {
				marker_found = true;
				break;
			}
		}
		if !marker_found {
			return Err(Rejection::Surface("no in-app marker visible".into()));
		}

		match lock_state(ui, &self.ctx).await? {
			LockState::Unlocked => Ok(()),
			LockState::Locked(reason) => Err(Rejection::Surface(format!("device locked: {reason}"))),
		}
	}

	/// Re-establish the session after a loss.
	///
	/// Refuses with [`Error::DeviceUnreachable`] when the device transport is down.
	pub async fn reconnect(&mut self) -> Result<()> {
		self.health = Health::Recovering;
		warn!(target = "chatex.session", serial = self.device.serial(), "reconnecting");

		if !self.device.is_alive().await {
			self.health = Health::Lost;
			return Err(Error::DeviceUnreachable(format!(
				"{} did not answer; check the cable or wireless debugging",
				self.device.serial()
			)));
		}

		if let Some(stale) = self.ui.take() {
			if let Err(err) = stale.quit().await {
				debug!(target = "chatex.session", error = %err, "closing stale session");
			}
		}
		self.ctx.sleep(self.ctx.timings.reconnect_pause).await;

		self.reconnects += 1;
		match self.connect().await {
			Ok(()) => Ok(()),
			Err(err) => {
				self.health = Health::Lost;
				Err(err)
			}
		}
	}

	/// Run `op` against the live session, reconnecting and retrying on session loss.
	///
	/// Errors that are not session loss propagate on first occurrence. After
	/// `max_retries` reconnects the last session-loss error is returned.
	pub async fn safe_call<'f, T, F>(&mut self, name: &str, max_retries: u32, mut op: F) -> Result<T>
	where
		F: FnMut(Arc<dyn Automation>) -> BoxFut<'f, Result<T>>,
	{
		let mut retries = 0;
		loop {
			let outcome = match self.automation() {
				Ok(ui) => op(ui).await,
				Err(err) => Err(err),
			};
			let err = match outcome {
				Ok(value) => return Ok(value),
				Err(err) => err,
			};

			if classify(&err) != ErrorClass::SessionLoss {
				return Err(err);
			}
			if retries >= max_retries {
				self.health = Health::Lost;
				warn!(target = "chatex.session", op = name, retries, error = %err, "session lost; retries exhausted");
				return Err(err);
			}
			retries += 1;
			warn!(target = "chatex.session", op = name, attempt = retries, error = %err, "session lost; reconnecting");
			self.reconnect().await?;
			self.ctx.sleep(self.ctx.timings.retry_pause).await;
		}
	}

	/// Return to the conversation list from inside the target app.
	pub async fn navigate_to_main(&self) -> Result<bool> {
		navigation::to_main(self.automation()?.as_ref(), &self.ctx).await
	}

	/// Press back until the conversation list shows.
	pub async fn navigate_back_to_main(&self) -> Result<bool> {
		navigation::back_to_main(self.automation()?.as_ref(), &self.ctx).await
	}

	pub async fn lock_state(&self) -> Result<LockState> {
		lock_state(self.automation()?.as_ref(), &self.ctx).await
	}

	pub async fn status(&self) -> Result<SessionStatus> {
		let ui = self.automation()?;
		let profile = &self.ctx.profile;
		let package = ui.current_package().await?;
		let activity = ui.current_activity().await?;
		let visible_chats = ui.find_all(&Query::id(&profile.chat_row_id)).await?.iter().filter(|e| e.displayed).count();
		Ok(SessionStatus {
			in_app: package == profile.package,
			on_chat_list: package == profile.package && profile.is_home_activity(&activity),
			lock: lock_state(ui.as_ref(), &self.ctx).await?,
			package,
			activity,
			visible_chats,
		})
	}

	/// Write the current UI tree to `dir/<label>.xml`.
	pub async fn capture_ui_tree(&self, dir: &Path, label: &str) -> Result<PathBuf> {
		capture_ui_tree(self.automation()?.as_ref(), dir, label).await
	}

	/// Close the session. Already-closed sessions are not an error.
	pub async fn quit(&mut self) {
		if let Some(ui) = self.ui.take() {
			if let Err(err) = ui.quit().await {
				debug!(target = "chatex.session", error = %err, "session already closed");
			}
		}
		self.health = Health::Lost;
	}
}

/// Heuristic lock-screen detection.
pub async fn lock_state(ui: &dyn Automation, ctx: &EngineContext) -> Result<LockState> {
	let profile = &ctx.profile;
	let package = ui.current_package().await?;
	if package == profile.system_ui_package {
		return Ok(LockState::Locked(format!("{package} in foreground")));
	}
	let activity = ui.current_activity().await?;
	let lower = activity.to_lowercase();
	if lower.contains("keyguard") || lower.contains("lockscreen") {
		return Ok(LockState::Locked(format!("activity {activity}")));
	}
	if is_present(ui, &Query::id(&profile.lock_icon_id)).await? {
		return Ok(LockState::Locked("lock icon visible".into()));
	}
	Ok(LockState::Unlocked)
}

/// Dump the page source for post-mortem inspection.
pub async fn capture_ui_tree(ui: &dyn Automation, dir: &Path, label: &str) -> Result<PathBuf> {
	let source = ui.page_source().await?;
	std::fs::create_dir_all(dir)?;
	let safe: String = label.chars().map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' }).collect();
	let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S");
	let path = dir.join(format!("{stamp}-{safe}.xml"));
	std::fs::write(&path, source)?;
	debug!(target = "chatex.session", path = %path.display(), "UI tree captured");
	Ok(path)
}
