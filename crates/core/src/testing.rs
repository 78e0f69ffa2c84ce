//! In-memory doubles for the automation seam.
//!
//! [`FakeUi`] simulates the chat app closely enough to drive the real export
//! flow: a virtualized conversation list, per-chat menus, the media dialog,
//! the system share sheet and the upload screen. A `Custom` view holds an
//! arbitrary node list for resolver-level tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chatex_protocol::{Capabilities, Point, Rect, Size, keycode};

use crate::automation::{Automation, Query, SessionFactory, UiElement, widget};
use crate::clock::Clock;
use crate::device::{Device, Transport};
use crate::error::{Error, Result};
use crate::profile::AppProfile;

const LAUNCHER_PACKAGE: &str = "com.google.android.apps.nexuslauncher";
const DRIVE_PACKAGE: &str = "com.google.android.apps.docs";

/// Error injected into the next fake calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailKind {
	SessionLost,
	Unclassified,
}

impl FailKind {
	fn to_error(self) -> Error {
		match self {
			FailKind::SessionLost => Error::Runtime(chatex_runtime::Error::Remote {
				name: "invalid session id".into(),
				message: "A session is either terminated or not started".into(),
				stack: None,
			}),
			FailKind::Unclassified => Error::Runtime(chatex_runtime::Error::Remote {
				name: "unknown error".into(),
				message: "An unknown server-side error occurred".into(),
				stack: None,
			}),
		}
	}
}

/// What a click on a node does.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
	Push(View),
	/// Pop back until `View` is current.
	ReturnTo(View),
	ChooseMedia(bool),
	Commit,
}

#[derive(Debug, Clone, Default)]
pub struct Node {
	pub class: String,
	pub text: String,
	pub desc: String,
	pub id: String,
	pub rect: Rect,
	pub clickable: bool,
	pub enabled: bool,
	pub displayed: bool,
	pub parent: Option<usize>,
	pub on_click: Option<Action>,
}

impl Node {
	pub fn new(class: &str) -> Self {
		Self {
			class: class.to_string(),
			enabled: true,
			displayed: true,
			..Default::default()
		}
	}

	pub fn text(mut self, text: &str) -> Self {
		self.text = text.to_string();
		self
	}

	pub fn desc(mut self, desc: &str) -> Self {
		self.desc = desc.to_string();
		self
	}

	pub fn id(mut self, id: &str) -> Self {
		self.id = id.to_string();
		self
	}

	pub fn at(mut self, x: i64, y: i64, w: i64, h: i64) -> Self {
		self.rect = Rect::new(x as f64, y as f64, w as f64, h as f64);
		self
	}

	pub fn clickable(mut self) -> Self {
		self.clickable = true;
		self
	}

	pub fn hidden(mut self) -> Self {
		self.displayed = false;
		self
	}

	pub fn disabled(mut self) -> Self {
		self.enabled = false;
		self
	}

	pub fn child_of(mut self, parent: usize) -> Self {
		self.parent = Some(parent);
		self
	}

	pub fn on_click(mut self, action: Action) -> Self {
		self.on_click = Some(action);
		self
	}

	fn matches(&self, query: &Query) -> bool {
		match query {
			Query::Id(id) => &self.id == id,
			Query::AccessibilityId(label) => &self.desc == label,
			Query::Class(class) => &self.class == class,
			Query::Text { matcher, class } => {
				!self.text.is_empty() && matcher.matches(&self.text) && class.as_ref().is_none_or(|c| c == &self.class)
			}
			Query::Description(matcher) => !self.desc.is_empty() && matcher.matches(&self.desc),
		}
	}
}

/// Screens of the simulated app.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
	Launcher,
	Home,
	Conversation(String),
	Menu(String),
	MoreMenu(String),
	Privacy(String),
	MediaDialog(String),
	ShareSheet(String),
	Upload(String),
	Lock,
	Custom,
}

/// Per-chat behaviour of the simulated app.
#[derive(Debug, Clone)]
pub struct ChatSpec {
	pub name: String,
	pub has_more: bool,
	pub has_export: bool,
	pub restricted: bool,
}

impl ChatSpec {
	pub fn plain(name: &str) -> Self {
		Self {
			name: name.to_string(),
			has_more: true,
			has_export: true,
			restricted: false,
		}
	}

	/// Community chats have no "More" entry.
	pub fn community(name: &str) -> Self {
		Self {
			has_more: false,
			..Self::plain(name)
		}
	}

	pub fn without_export(name: &str) -> Self {
		Self {
			has_export: false,
			..Self::plain(name)
		}
	}

	pub fn restricted(name: &str) -> Self {
		Self {
			restricted: true,
			..Self::plain(name)
		}
	}
}

#[derive(Debug)]
struct State {
	view: View,
	stack: Vec<View>,
	chats: Vec<ChatSpec>,
	custom: Vec<Node>,
	top: usize,
	page: usize,
	step: usize,
	generation: u64,
	size: Size,
	hidden_destination_swipes: u32,
	share_sheet_delay: u32,
	failures: VecDeque<FailKind>,
	drop_on_open: Option<(String, usize)>,
	exported: Vec<(String, bool)>,
	swipes: usize,
	keys: Vec<u32>,
	quits: usize,
	ops: usize,
}

impl State {
	fn set_view(&mut self, view: View) {
		self.view = view;
		self.generation += 1;
	}

	fn push(&mut self, view: View) {
		let current = std::mem::replace(&mut self.view, View::Home);
		self.stack.push(current);
		self.set_view(view);
	}

	fn back(&mut self) {
		let previous = self.stack.pop().unwrap_or(View::Launcher);
		self.set_view(previous);
	}

	fn chat(&self, name: &str) -> ChatSpec {
		self.chats.iter().find(|c| c.name == name).cloned().unwrap_or_else(|| ChatSpec::plain(name))
	}

	fn package(&self) -> String {
		let profile = AppProfile::default();
		match &self.view {
			View::Launcher => LAUNCHER_PACKAGE.into(),
			View::Lock => profile.system_ui_package,
			View::ShareSheet(_) if self.share_sheet_delay == 0 => profile.share_package,
			View::Upload(_) => DRIVE_PACKAGE.into(),
			_ => profile.package,
		}
	}

	fn activity(&self) -> String {
		match &self.view {
			View::Launcher => ".NexusLauncherActivity".into(),
			View::Home | View::Custom => ".home.HomeActivity".into(),
			View::Conversation(_) | View::Menu(_) | View::MoreMenu(_) | View::Privacy(_) | View::MediaDialog(_) => ".Conversation".into(),
			View::ShareSheet(_) => "com.android.intentresolver.ChooserActivity".into(),
			View::Upload(_) => ".UploadMenuActivity".into(),
			View::Lock => "com.android.systemui.keyguard.KeyguardActivity".into(),
		}
	}

	fn render(&self) -> Vec<Node> {
		let profile = AppProfile::default();
		let toolbar = || Node::new(widget::FRAME_LAYOUT).id("com.whatsapp:id/toolbar").at(0, 60, 1080, 160);
		match &self.view {
			View::Launcher => vec![Node::new(widget::TEXT_VIEW).text("WhatsApp").at(100, 1800, 200, 80).clickable()],
			View::Lock => vec![Node::new(widget::IMAGE_VIEW).id(&profile.lock_icon_id).at(500, 2000, 80, 80)],
			View::Custom => self.custom.clone(),
			View::Home => {
				let mut nodes = vec![toolbar()];
				let end = (self.top + self.page).min(self.chats.len());
				for (row, chat) in self.chats[self.top..end].iter().enumerate() {
					let y = 300 + row as i64 * 200;
					let container = nodes.len();
					nodes.push(
						Node::new(widget::LINEAR_LAYOUT)
							.at(0, y, 1080, 180)
							.clickable()
							.on_click(Action::Push(View::Conversation(chat.name.clone()))),
					);
					nodes.push(Node::new(widget::TEXT_VIEW).id(&profile.chat_row_id).text(&chat.name).at(200, y + 20, 600, 60).child_of(container));
				}
				nodes
			}
			View::Conversation(name) => vec![
				toolbar(),
				Node::new(widget::TEXT_VIEW).text(name).at(200, 100, 500, 60),
				Node::new(widget::IMAGE_BUTTON)
					.id(&profile.menu_id)
					.desc("More options")
					.at(990, 100, 80, 80)
					.clickable()
					.on_click(Action::Push(View::Menu(name.clone()))),
			],
			View::Menu(name) => {
				let chat = self.chat(name);
				let mut items = vec![("View contact", None), ("Search", None), ("Mute notifications", None)];
				if chat.has_more {
					items.push(("More", Some(Action::Push(View::MoreMenu(name.clone())))));
				}
				menu(items)
			}
			View::MoreMenu(name) => {
				let chat = self.chat(name);
				let mut items = vec![("Report", None), ("Block", None), ("Clear chat", None)];
				if chat.has_export {
					let next = if chat.restricted { View::Privacy(name.clone()) } else { View::MediaDialog(name.clone()) };
					items.push(("Export chat", Some(Action::Push(next))));
				}
				menu(items)
			}
			View::Privacy(name) => vec![
				Node::new(widget::TEXT_VIEW)
					.text("Advanced chat privacy is on. This setting prevents the exporting of chats.")
					.at(100, 1000, 880, 200),
				Node::new(widget::BUTTON)
					.text("OK")
					.at(800, 1300, 180, 100)
					.clickable()
					.on_click(Action::ReturnTo(View::Conversation(name.clone()))),
			],
			View::MediaDialog(_) => vec![
				Node::new(widget::TEXT_VIEW).text("Export chat?").at(100, 900, 880, 100),
				Node::new(widget::BUTTON).text("Without media").at(100, 1300, 400, 100).clickable().on_click(Action::ChooseMedia(false)),
				Node::new(widget::BUTTON).text("Include media").at(580, 1300, 400, 100).clickable().on_click(Action::ChooseMedia(true)),
			],
			View::ShareSheet(name) => {
				if self.share_sheet_delay > 0 {
					return vec![Node::new(widget::FRAME_LAYOUT).at(0, 0, 1080, 2400)];
				}
				let mut nodes = vec![
					Node::new(widget::FRAME_LAYOUT).id(&profile.share_container_ids[0]).at(0, 1200, 1080, 1200),
					Node::new(widget::TEXT_VIEW).text("Sharing 1 file").at(60, 1220, 600, 60).child_of(0),
				];
				let mut targets = vec!["Gmail", "Bluetooth", "USB drive"];
				if self.hidden_destination_swipes == 0 {
					targets.push("Drive");
				}
				for (i, label) in targets.into_iter().enumerate() {
					let container = nodes.len();
					let mut target = Node::new(widget::LINEAR_LAYOUT).at(60 + i as i64 * 250, 1400, 220, 220).clickable().child_of(0);
					if label == "Drive" {
						target = target.on_click(Action::Push(View::Upload(name.clone())));
					}
					nodes.push(target);
					nodes.push(Node::new(widget::TEXT_VIEW).text(label).at(70 + i as i64 * 250, 1560, 200, 50).child_of(container));
				}
				nodes
			}
			View::Upload(_) => vec![
				Node::new(widget::FRAME_LAYOUT).at(0, 60, 1080, 160),
				Node::new(widget::TEXT_VIEW).text("Upload to Drive").at(60, 100, 500, 60),
				Node::new(widget::BUTTON)
					.id(&profile.commit_id)
					.text("Upload")
					.at(860, 90, 180, 90)
					.clickable()
					.on_click(Action::Commit),
			],
		}
	}
}

fn menu(items: Vec<(&str, Option<Action>)>) -> Vec<Node> {
	let mut nodes = vec![Node::new(widget::FRAME_LAYOUT).at(500, 80, 560, 800)];
	for (i, (label, action)) in items.into_iter().enumerate() {
		let y = 100 + i as i64 * 130;
		let row = nodes.len();
		let mut container = Node::new(widget::LINEAR_LAYOUT).at(500, y, 560, 120).clickable().child_of(0);
		if let Some(action) = action {
			container = container.on_click(action);
		}
		nodes.push(container);
		nodes.push(Node::new(widget::TEXT_VIEW).text(label).at(540, y + 30, 400, 60).child_of(row));
	}
	nodes
}

/// Scripted device UI; clones share state.
#[derive(Debug, Clone)]
pub struct FakeUi {
	state: Arc<Mutex<State>>,
}

impl FakeUi {
	fn with_state(view: View, chats: Vec<ChatSpec>, custom: Vec<Node>) -> Self {
		Self {
			state: Arc::new(Mutex::new(State {
				view,
				stack: Vec::new(),
				chats,
				custom,
				top: 0,
				page: 8,
				step: 5,
				generation: 0,
				size: Size::new(1080, 2400),
				hidden_destination_swipes: 0,
				share_sheet_delay: 0,
				failures: VecDeque::new(),
				drop_on_open: None,
				exported: Vec::new(),
				swipes: 0,
				keys: Vec::new(),
				quits: 0,
				ops: 0,
			})),
		}
	}

	/// App on its conversation list with these chats.
	pub fn app(chats: Vec<ChatSpec>) -> Self {
		Self::with_state(View::Home, chats, Vec::new())
	}

	pub fn app_with_names(names: &[&str]) -> Self {
		Self::app(names.iter().map(|n| ChatSpec::plain(n)).collect())
	}

	/// A single static screen inside the app package.
	pub fn custom(nodes: Vec<Node>) -> Self {
		Self::with_state(View::Custom, Vec::new(), nodes)
	}

	fn lock(&self) -> MutexGuard<'_, State> {
		self.state.lock().unwrap()
	}

	pub fn set_custom(&self, nodes: Vec<Node>) {
		let mut state = self.lock();
		state.custom = nodes;
		state.set_view(View::Custom);
	}

	pub fn set_view(&self, view: View) {
		let mut state = self.lock();
		state.stack.clear();
		state.set_view(view);
	}

	pub fn view(&self) -> View {
		self.lock().view.clone()
	}

	/// Restart the app on its conversation list.
	pub fn relaunch(&self) {
		let mut state = self.lock();
		state.stack = vec![View::Launcher];
		state.top = 0;
		state.set_view(View::Home);
	}

	pub fn scroll_to(&self, top: usize) {
		let mut state = self.lock();
		state.top = top;
		state.generation += 1;
	}

	pub fn top(&self) -> usize {
		self.lock().top
	}

	/// The destination only appears after this many swipes on the share sheet.
	pub fn hide_destination(&self, swipes: u32) {
		self.lock().hidden_destination_swipes = swipes;
	}

	/// The share sheet takes this many probes before it renders.
	pub fn delay_share_sheet(&self, probes: u32) {
		self.lock().share_sheet_delay = probes;
	}

	pub fn fail_next(&self, kind: FailKind, count: usize) {
		self.lock().failures.extend(std::iter::repeat_n(kind, count));
	}

	/// Fail the next `count` calls once the conversation with `chat` opens.
	pub fn drop_session_on_open(&self, chat: &str, count: usize) {
		self.lock().drop_on_open = Some((chat.to_string(), count));
	}

	pub fn exported(&self) -> Vec<(String, bool)> {
		self.lock().exported.clone()
	}

	pub fn swipes(&self) -> usize {
		self.lock().swipes
	}

	pub fn keys(&self) -> Vec<u32> {
		self.lock().keys.clone()
	}

	pub fn quits(&self) -> usize {
		self.lock().quits
	}

	/// Number of automation calls made so far.
	pub fn ops(&self) -> usize {
		self.lock().ops
	}

	fn enter(&self) -> Result<MutexGuard<'_, State>> {
		let mut state = self.lock();
		state.ops += 1;
		match state.failures.pop_front() {
			Some(kind) => Err(kind.to_error()),
			None => Ok(state),
		}
	}

	fn snapshot(state: &State, nodes: &[Node], idx: usize) -> UiElement {
		let node = &nodes[idx];
		UiElement {
			handle: format!("{}:{}", state.generation, idx),
			class: node.class.clone(),
			text: node.text.clone(),
			content_desc: node.desc.clone(),
			resource_id: node.id.clone(),
			rect: node.rect,
			displayed: node.displayed,
			enabled: node.enabled,
			clickable: node.clickable,
		}
	}

	fn index_of(state: &State, element: &UiElement) -> Result<usize> {
		let stale = || {
			Error::Runtime(chatex_runtime::Error::Remote {
				name: "stale element reference".into(),
				message: format!("element {} is not attached to the page", element.handle),
				stack: None,
			})
		};
		let (generation, idx) = element.handle.split_once(':').ok_or_else(stale)?;
		if generation.parse::<u64>().ok() != Some(state.generation) {
			return Err(stale());
		}
		idx.parse().map_err(|_| stale())
	}

	fn is_descendant(nodes: &[Node], mut idx: usize, ancestor: usize) -> bool {
		while let Some(parent) = nodes[idx].parent {
			if parent == ancestor {
				return true;
			}
			idx = parent;
		}
		false
	}

	fn apply(state: &mut State, action: Action) {
		match action {
			Action::Push(view) => {
				if let View::Conversation(name) = &view {
					if let Some((_, count)) = state.drop_on_open.take_if(|(chat, _)| chat == name) {
						state.failures.extend(std::iter::repeat_n(FailKind::SessionLost, count));
					}
				}
				state.push(view);
			}
			Action::ReturnTo(target) => {
				while state.view != target && !state.stack.is_empty() {
					state.back();
				}
			}
			Action::ChooseMedia(include) => {
				if let View::MediaDialog(name) = state.view.clone() {
					state.exported.push((name.clone(), include));
					state.set_view(View::ShareSheet(name));
				}
			}
			Action::Commit => {
				if let View::Upload(name) = state.view.clone() {
					state.stack = vec![View::Launcher, View::Home];
					state.set_view(View::Conversation(name));
				}
			}
		}
	}
}

#[async_trait]
impl Automation for FakeUi {
	async fn find_all(&self, query: &Query) -> Result<Vec<UiElement>> {
		let mut state = self.enter()?;
		if let View::ShareSheet(_) = state.view {
			if state.share_sheet_delay > 0 && matches!(query, Query::Id(_)) {
				state.share_sheet_delay -= 1;
			}
		}
		let nodes = state.render();
		Ok((0..nodes.len()).filter(|&i| nodes[i].matches(query)).map(|i| Self::snapshot(&state, &nodes, i)).collect())
	}

	async fn find_children(&self, parent: &UiElement, query: &Query) -> Result<Vec<UiElement>> {
		let state = self.enter()?;
		let ancestor = Self::index_of(&state, parent)?;
		let nodes = state.render();
		Ok((0..nodes.len())
			.filter(|&i| Self::is_descendant(&nodes, i, ancestor) && nodes[i].matches(query))
			.map(|i| Self::snapshot(&state, &nodes, i))
			.collect())
	}

	async fn parent(&self, element: &UiElement) -> Result<Option<UiElement>> {
		let state = self.enter()?;
		let idx = Self::index_of(&state, element)?;
		let nodes = state.render();
		Ok(nodes[idx].parent.map(|p| Self::snapshot(&state, &nodes, p)))
	}

	async fn click(&self, element: &UiElement) -> Result<()> {
		let mut state = self.enter()?;
		let mut idx = Self::index_of(&state, element)?;
		let nodes = state.render();
		let action = loop {
			if let Some(action) = nodes[idx].on_click.clone() {
				break Some(action);
			}
			match nodes[idx].parent {
				Some(parent) => idx = parent,
				None => break None,
			}
		};
		if let Some(action) = action {
			Self::apply(&mut state, action);
		}
		Ok(())
	}

	async fn tap(&self, at: Point) -> Result<()> {
		let mut state = self.enter()?;
		let nodes = state.render();
		let hit = (0..nodes.len()).rev().find(|&i| nodes[i].on_click.is_some() && nodes[i].rect.contains(at));
		if let Some(idx) = hit {
			if let Some(action) = nodes[idx].on_click.clone() {
				Self::apply(&mut state, action);
			}
		}
		Ok(())
	}

	async fn swipe(&self, from: Point, to: Point, _duration: Duration) -> Result<()> {
		let mut state = self.enter()?;
		state.swipes += 1;
		match state.view {
			View::Home => {
				let max_top = state.chats.len().saturating_sub(state.page);
				if from.y > to.y {
					state.top = (state.top + state.step).min(max_top);
				} else {
					state.top = state.top.saturating_sub(state.step);
				}
				state.generation += 1;
			}
			View::ShareSheet(_) => {
				state.hidden_destination_swipes = state.hidden_destination_swipes.saturating_sub(1);
				state.generation += 1;
			}
			_ => {}
		}
		Ok(())
	}

	async fn press_key(&self, code: u32) -> Result<()> {
		let mut state = self.enter()?;
		state.keys.push(code);
		match code {
			keycode::BACK => state.back(),
			keycode::HOME => {
				state.stack.clear();
				state.set_view(View::Launcher);
			}
			_ => {}
		}
		Ok(())
	}

	async fn current_package(&self) -> Result<String> {
		Ok(self.enter()?.package())
	}

	async fn current_activity(&self) -> Result<String> {
		Ok(self.enter()?.activity())
	}

	async fn window_size(&self) -> Result<Size> {
		Ok(self.enter()?.size)
	}

	async fn page_source(&self) -> Result<String> {
		let state = self.enter()?;
		let body: String = state
			.render()
			.iter()
			.map(|n| format!("  <node class=\"{}\" text=\"{}\" resource-id=\"{}\"/>\n", n.class, n.text, n.id))
			.collect();
		Ok(format!("<hierarchy>\n{body}</hierarchy>\n"))
	}

	async fn quit(&self) -> Result<()> {
		self.lock().quits += 1;
		Ok(())
	}
}

/// Session factory handing out views of one [`FakeUi`].
#[derive(Debug, Clone)]
pub struct FakeFactory {
	pub ui: FakeUi,
	opens: Arc<AtomicUsize>,
	refuse: Arc<AtomicBool>,
}

impl FakeFactory {
	pub fn new(ui: FakeUi) -> Self {
		Self {
			ui,
			opens: Arc::new(AtomicUsize::new(0)),
			refuse: Arc::new(AtomicBool::new(false)),
		}
	}

	pub fn opens(&self) -> usize {
		self.opens.load(Ordering::SeqCst)
	}

	pub fn refuse(&self, refuse: bool) {
		self.refuse.store(refuse, Ordering::SeqCst);
	}
}

#[async_trait]
impl SessionFactory for FakeFactory {
	async fn open(&self, _capabilities: &Capabilities) -> Result<Arc<dyn Automation>> {
		if self.refuse.load(Ordering::SeqCst) {
			return Err(Error::Runtime(chatex_runtime::Error::ConnectionFailed("connection refused".into())));
		}
		self.opens.fetch_add(1, Ordering::SeqCst);
		if self.ui.view() != View::Custom {
			self.ui.relaunch();
		}
		Ok(Arc::new(self.ui.clone()))
	}
}

/// Device double recording bridge commands.
#[derive(Debug, Clone)]
pub struct FakeDevice {
	ui: FakeUi,
	alive: Arc<AtomicBool>,
	commands: Arc<Mutex<Vec<String>>>,
}

impl FakeDevice {
	pub fn new(ui: FakeUi) -> Self {
		Self {
			ui,
			alive: Arc::new(AtomicBool::new(true)),
			commands: Arc::new(Mutex::new(Vec::new())),
		}
	}

	pub fn set_alive(&self, alive: bool) {
		self.alive.store(alive, Ordering::SeqCst);
	}

	pub fn commands(&self) -> Vec<String> {
		self.commands.lock().unwrap().clone()
	}

	fn record(&self, command: String) {
		self.commands.lock().unwrap().push(command);
	}
}

#[async_trait]
impl Device for FakeDevice {
	fn serial(&self) -> &str {
		"FAKE123"
	}

	fn transport(&self) -> Transport {
		Transport::Local
	}

	async fn is_alive(&self) -> bool {
		self.alive.load(Ordering::SeqCst)
	}

	async fn force_stop(&self, package: &str) -> Result<()> {
		self.record(format!("force-stop {package}"));
		Ok(())
	}

	async fn launch(&self, package: &str, activity: &str) -> Result<()> {
		self.record(format!("start {package}/{activity}"));
		if self.ui.view() != View::Custom {
			self.ui.relaunch();
		}
		Ok(())
	}

	async fn keep_awake(&self) -> Result<()> {
		self.record("keep-awake".into());
		Ok(())
	}
}

/// Virtual clock; sleeping advances time instantly.
#[derive(Debug)]
pub struct TestClock {
	start: Instant,
	elapsed: Mutex<Duration>,
	sleeps: Mutex<Vec<Duration>>,
}

impl TestClock {
	pub fn new() -> Arc<Self> {
		Arc::new(Self {
			start: Instant::now(),
			elapsed: Mutex::new(Duration::ZERO),
			sleeps: Mutex::new(Vec::new()),
		})
	}

	pub fn sleeps(&self) -> Vec<Duration> {
		self.sleeps.lock().unwrap().clone()
	}

	pub fn elapsed(&self) -> Duration {
		*self.elapsed.lock().unwrap()
	}
}

#[async_trait]
impl Clock for TestClock {
	async fn sleep(&self, duration: Duration) {
		*self.elapsed.lock().unwrap() += duration;
		self.sleeps.lock().unwrap().push(duration);
	}

	fn now(&self) -> Instant {
		self.start + *self.elapsed.lock().unwrap()
	}
}
