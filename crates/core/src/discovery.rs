//! Conversation-list discovery over a virtualized scroll view.
//!
//! Only the rows on screen exist in the UI tree, so the full list is built by
//! scrolling and merging what each viewport shows. Every scan is bounded and
//! re-homes to the top of the list afterwards.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::automation::{Automation, Query, UiElement, click_or_tap, clickable_ancestor};
use crate::context::EngineContext;
use crate::error::{Error, Result};
use crate::navigation::wait_for_activity;

/// Scroll budgets for scanning and locating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanLimits {
	/// Scroll ceiling for a full scan.
	pub max_scrolls: u32,
	/// Consecutive no-gain scrolls that end a full scan.
	pub stale_rounds: u32,
	/// Total scrolls `locate` may spend across both directions.
	pub locate_budget: u32,
	/// Unchanged head observations before `locate` gives up on a direction.
	pub edge_patience: u32,
	/// Scroll-up swipes allowed when returning to the top.
	pub home_swipes: u32,
}

impl Default for ScanLimits {
	fn default() -> Self {
		Self {
			max_scrolls: 50,
			stale_rounds: 3,
			locate_budget: 240,
			edge_patience: 2,
			home_swipes: 5,
		}
	}
}

/// Ordering of a scan result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
	/// Order of appearance, top to bottom.
	Original,
	#[default]
	Alphabetical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
	Up,
	Down,
}

/// Names seen so far mapped to their last vertical position, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct ChatListSnapshot {
	entries: IndexMap<String, i64>,
}

impl ChatListSnapshot {
	/// Record a sighting; returns true if the name is new.
	pub fn observe(&mut self, name: &str, y: i64) -> bool {
		match self.entries.get_mut(name) {
			Some(pos) => {
				*pos = y;
				false
			}
			None => {
				self.entries.insert(name.to_string(), y);
				true
			}
		}
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn position(&self, name: &str) -> Option<i64> {
		self.entries.get(name).copied()
	}

	pub fn into_names(self, order: SortOrder) -> Vec<String> {
		let mut names: Vec<String> = self.entries.into_keys().collect();
		if order == SortOrder::Alphabetical {
			names.sort_by_key(|n| n.to_lowercase());
		}
		names
	}
}

/// Scans and navigates the conversation list.
#[derive(Debug, Clone)]
pub struct ChatList {
	ctx: EngineContext,
	limits: ScanLimits,
}

impl ChatList {
	pub fn new(ctx: EngineContext, limits: ScanLimits) -> Self {
		Self { ctx, limits }
	}

	pub fn limits(&self) -> &ScanLimits {
		&self.limits
	}

	/// Visible rows as `(name, y, element)`, top to bottom.
	async fn visible(&self, ui: &dyn Automation) -> Result<Vec<(String, i64, UiElement)>> {
		let mut rows: Vec<_> = ui
			.find_all(&Query::id(&self.ctx.profile.chat_row_id))
			.await?
			.into_iter()
			.filter(|e| e.displayed && !e.text.trim().is_empty())
			.map(|e| (e.text.trim().to_string(), e.rect.y as i64, e))
			.collect();
		rows.sort_by_key(|(_, y, _)| *y);
		Ok(rows)
	}

	async fn head(&self, ui: &dyn Automation) -> Result<Option<String>> {
		Ok(self.visible(ui).await?.into_iter().next().map(|(name, _, _)| name))
	}

	async fn scroll(&self, ui: &dyn Automation, direction: Direction) -> Result<()> {
		let size = ui.window_size().await?;
		let (low, high) = (size.at(0.5, 0.75), size.at(0.5, 0.30));
		let (from, to) = match direction {
			Direction::Down => (low, high),
			Direction::Up => (high, low),
		};
		ui.swipe(from, to, self.ctx.timings.swipe).await?;
		self.ctx.sleep(self.ctx.timings.poll).await;
		Ok(())
	}

	/// Scroll up until the head row stops changing.
	pub async fn scroll_to_top(&self, ui: &dyn Automation) -> Result<()> {
		let mut head = self.head(ui).await?;
		for _ in 0..self.limits.home_swipes {
			self.scroll(ui, Direction::Up).await?;
			let next = self.head(ui).await?;
			if next == head {
				break;
			}
			head = next;
		}
		Ok(())
	}

	/// Collect every distinct chat name, up to `limit`.
	pub async fn full_scan(&self, ui: &dyn Automation, limit: Option<usize>, order: SortOrder) -> Result<Vec<String>> {
		self.scroll_to_top(ui).await?;
		let scanned = self.collect(ui, limit).await;
		if let Err(err) = self.scroll_to_top(ui).await {
			warn!(target = "chatex.discovery", error = %err, "could not return to top of list");
		}

		let mut names = scanned?.into_names(order);
		if let Some(limit) = limit {
			names.truncate(limit);
		}
		info!(target = "chatex.discovery", found = names.len(), ?limit, "chat list scanned");
		Ok(names)
	}

	async fn collect(&self, ui: &dyn Automation, limit: Option<usize>) -> Result<ChatListSnapshot> {
		let mut snapshot = ChatListSnapshot::default();
		let full = |s: &ChatListSnapshot| limit.is_some_and(|l| s.len() >= l);
		let mut stale = 0;

		for round in 0..self.limits.max_scrolls {
			let before = snapshot.len();
			for (name, y, _) in self.visible(ui).await? {
				if full(&snapshot) {
					break;
				}
				snapshot.observe(&name, y);
			}
			if full(&snapshot) {
				break;
			}

			if snapshot.len() == before {
				stale += 1;
				if stale >= self.limits.stale_rounds {
					debug!(target = "chatex.discovery", round, "no new chats; end of list");
					break;
				}
			} else {
				stale = 0;
			}
			self.scroll(ui, Direction::Down).await?;
		}
		Ok(snapshot)
	}

	async fn find_visible(&self, ui: &dyn Automation, name: &str) -> Result<Option<UiElement>> {
		Ok(self.visible(ui).await?.into_iter().find(|(n, _, _)| n == name).map(|(_, _, e)| e))
	}

	/// Bring `name` on screen and return its row label element.
	///
	/// Checks the viewport, then one forward scroll, then sweeps up and down
	/// within the locate budget, abandoning a direction once the list edge is hit.
	pub async fn locate(&self, ui: &dyn Automation, name: &str) -> Result<Option<UiElement>> {
		if let Some(found) = self.find_visible(ui, name).await? {
			return Ok(Some(found));
		}
		self.scroll(ui, Direction::Down).await?;
		if let Some(found) = self.find_visible(ui, name).await? {
			return Ok(Some(found));
		}

		let per_direction = self.limits.locate_budget / 2;
		for direction in [Direction::Up, Direction::Down] {
			let mut head = self.head(ui).await?;
			let mut unchanged = 0;
			for _ in 0..per_direction {
				self.scroll(ui, direction).await?;
				if let Some(found) = self.find_visible(ui, name).await? {
					return Ok(Some(found));
				}
				let next = self.head(ui).await?;
				if next == head {
					unchanged += 1;
					if unchanged >= self.limits.edge_patience {
						debug!(target = "chatex.discovery", ?direction, "list edge reached");
						break;
					}
				} else {
					unchanged = 0;
					head = next;
				}
			}
		}
		debug!(target = "chatex.discovery", chat = %name, "not found within scan budget");
		Ok(None)
	}

	/// Locate `name`, open it, and wait for the conversation screen.
	pub async fn open(&self, ui: &dyn Automation, name: &str) -> Result<()> {
		let label = self.locate(ui, name).await?.ok_or_else(|| Error::ChatNotFound(name.to_string()))?;
		let target = clickable_ancestor(ui, &label, 2).await?.unwrap_or(label);
		click_or_tap(ui, &target).await?;

		let profile = &self.ctx.profile;
		if wait_for_activity(ui, &self.ctx, |a| profile.is_conversation_activity(a)).await? {
			debug!(target = "chatex.discovery", chat = %name, "conversation open");
			Ok(())
		} else {
			Err(Error::step("open_chat", format!("conversation for '{name}' did not open")))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{FakeUi, TestClock, View};

	fn chat_list() -> ChatList {
		ChatList::new(EngineContext::new(Default::default(), Default::default(), TestClock::new()), ScanLimits::default())
	}

	fn names(n: usize) -> Vec<String> {
		(0..n).map(|i| format!("Chat {i:02}")).collect()
	}

	fn ui_with(n: usize) -> FakeUi {
		let names = names(n);
		let refs: Vec<&str> = names.iter().map(String::as_str).collect();
		FakeUi::app_with_names(&refs)
	}

	#[test]
	fn snapshot_deduplicates_and_keeps_order() {
		let mut snapshot = ChatListSnapshot::default();
		assert!(snapshot.observe("Zed", 300));
		assert!(snapshot.observe("alice", 500));
		assert!(!snapshot.observe("Zed", 100));
		assert_eq!(snapshot.position("Zed"), Some(100));

		assert_eq!(snapshot.clone().into_names(SortOrder::Original), vec!["Zed", "alice"]);
		assert_eq!(snapshot.into_names(SortOrder::Alphabetical), vec!["alice", "Zed"]);
	}

	#[tokio::test]
	async fn full_scan_collects_overlapping_pages_without_duplicates() {
		let ui = ui_with(23);
		let found = chat_list().full_scan(&ui, None, SortOrder::Original).await.unwrap();

		assert_eq!(found, names(23));
		assert_eq!(ui.top(), 0);
	}

	#[tokio::test]
	async fn full_scan_honours_limit_exactly() {
		let ui = ui_with(30);
		let found = chat_list().full_scan(&ui, Some(12), SortOrder::Original).await.unwrap();
		assert_eq!(found, names(12));

		let few = ui_with(4);
		let found = chat_list().full_scan(&few, Some(10), SortOrder::Original).await.unwrap();
		assert_eq!(found.len(), 4);
	}

	#[tokio::test]
	async fn full_scan_rehomes_from_middle_of_list() {
		let ui = ui_with(20);
		ui.scroll_to(10);
		let found = chat_list().full_scan(&ui, None, SortOrder::Alphabetical).await.unwrap();
		assert_eq!(found.len(), 20);
		assert_eq!(ui.top(), 0);
	}

	#[tokio::test]
	async fn full_scan_stops_at_scroll_ceiling() {
		let ui = ui_with(200);
		let list = ChatList::new(
			EngineContext::new(Default::default(), Default::default(), TestClock::new()),
			ScanLimits {
				max_scrolls: 3,
				..Default::default()
			},
		);
		let found = list.full_scan(&ui, None, SortOrder::Original).await.unwrap();
		assert_eq!(found.len(), 8 + 5 * 2);
	}

	#[tokio::test]
	async fn locate_finds_rows_below_and_above() {
		let ui = ui_with(40);
		let list = chat_list();

		let below = list.locate(&ui, "Chat 33").await.unwrap().unwrap();
		assert_eq!(below.text, "Chat 33");

		let above = list.locate(&ui, "Chat 01").await.unwrap().unwrap();
		assert_eq!(above.text, "Chat 01");
	}

	#[tokio::test]
	async fn locate_absent_name_terminates_within_budget() {
		let ui = ui_with(40);
		let list = chat_list();

		assert!(list.locate(&ui, "Nobody").await.unwrap().is_none());
		assert!(ui.swipes() as u32 <= 1 + list.limits().locate_budget);
		assert!(ui.swipes() < 30, "edge detection should stop early, took {}", ui.swipes());
	}

	#[tokio::test]
	async fn open_enters_conversation() {
		let ui = ui_with(15);
		chat_list().open(&ui, "Chat 12").await.unwrap();
		assert_eq!(ui.view(), View::Conversation("Chat 12".into()));

		let err = chat_list().open(&ui, "Missing").await.unwrap_err();
		assert!(matches!(err, Error::ChatNotFound(_)));
	}
}
