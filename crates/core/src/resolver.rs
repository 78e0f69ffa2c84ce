//! Element resolution with a per-role locator cache.
//!
//! Each [`Role`] is resolved through an ordered chain of [`Locator`]s. The first
//! visible, enabled match wins and, unless it came from a positional heuristic,
//! its locator is remembered for the role. A cached locator is always tried
//! first; when it (or the whole chain) fails, the role's entry is evicted.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use crate::automation::{Automation, Query, TextMatch, UiElement, clickable_ancestor, widget};
use crate::classify::{ErrorClass, classify};
use crate::error::Result;

/// How far up the tree to look for a clickable container.
const ANCESTOR_DEPTH: usize = 3;

/// Logical UI targets of the export flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
	Menu,
	More,
	Export,
	IncludeMedia,
	ExcludeMedia,
	PrivacyDismiss,
	Destination,
	Commit,
}

impl Role {
	pub fn name(&self) -> &'static str {
		match self {
			Role::Menu => "menu",
			Role::More => "more",
			Role::Export => "export",
			Role::IncludeMedia => "include-media",
			Role::ExcludeMedia => "exclude-media",
			Role::PrivacyDismiss => "privacy-dismiss",
			Role::Destination => "destination",
			Role::Commit => "commit",
		}
	}
}

/// Layout heuristics used when nothing stable matches.
#[derive(Debug, Clone, PartialEq)]
pub enum Positional {
	/// Icon near the top-right corner (overflow menus).
	TopRightIcon { right_margin: i64, max_y: i64 },
	/// The `index`-th clickable container, top to bottom, holding matching text.
	NthContainer { matcher: TextMatch, index: usize },
	/// Matching text inside the top-right region, as fractions of the viewport.
	TopRightText { matcher: TextMatch, min_x: f64, max_y: f64 },
}

/// One strategy in a fallback chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Locator {
	/// Direct query: stable id, accessibility label or visible text.
	Query(Query),
	/// Clickable container whose descendant text matches.
	Container(TextMatch),
	/// Layout heuristic; never cached.
	Positional(Positional),
}

impl Locator {
	pub fn id(id: impl Into<String>) -> Self {
		Locator::Query(Query::Id(id.into()))
	}

	pub fn accessibility(label: impl Into<String>) -> Self {
		Locator::Query(Query::AccessibilityId(label.into()))
	}

	pub fn text(matcher: TextMatch) -> Self {
		Locator::Query(Query::text(matcher))
	}

	pub fn text_in(class: &str, matcher: TextMatch) -> Self {
		Locator::Query(Query::text_in(class, matcher))
	}

	pub fn is_cacheable(&self) -> bool {
		!matches!(self, Locator::Positional(_))
	}

	pub fn kind(&self) -> &'static str {
		match self {
			Locator::Query(Query::Id(_)) => "id",
			Locator::Query(Query::AccessibilityId(_) | Query::Description(_)) => "accessibility",
			Locator::Query(Query::Class(_)) => "class",
			Locator::Query(Query::Text { .. }) => "text",
			Locator::Container(_) => "container",
			Locator::Positional(_) => "positional",
		}
	}
}

/// A resolved element plus the text that identified it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
	/// Element to click.
	pub target: UiElement,
	/// Text of the matched element, which may differ from the click target's.
	pub label: String,
	pub kind: &'static str,
}

/// Ordered-fallback resolver owning the locator cache.
#[derive(Debug, Default)]
pub struct Resolver {
	cache: Mutex<HashMap<Role, Locator>>,
}

impl Resolver {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cached(&self, role: Role) -> Option<Locator> {
		self.cache.lock().get(&role).cloned()
	}

	pub fn evict(&self, role: Role) {
		if self.cache.lock().remove(&role).is_some() {
			debug!(target = "chatex.resolver", role = role.name(), "evicted cached locator");
		}
	}

	pub fn clear(&self) {
		self.cache.lock().clear();
	}

	pub fn cached_roles(&self) -> usize {
		self.cache.lock().len()
	}

	/// Resolve `role`, trying the cached locator before `chain`.
	///
	/// Session-loss and fatal errors propagate; any other lookup error counts as
	/// a miss for that locator.
	pub async fn resolve(&self, ui: &dyn Automation, role: Role, chain: &[Locator]) -> Result<Option<Resolved>> {
		if let Some(cached) = self.cached(role) {
			match self.attempt(ui, role, &cached).await {
				Ok(Some(found)) => {
					debug!(target = "chatex.resolver", role = role.name(), kind = found.kind, "cache hit");
					return Ok(Some(found));
				}
				Ok(None) => self.evict(role),
				Err(err) => {
					self.evict(role);
					return Err(err);
				}
			}
		}

		for locator in chain {
			match self.attempt(ui, role, locator).await {
				Ok(Some(found)) => {
					if locator.is_cacheable() {
						self.cache.lock().insert(role, locator.clone());
					}
					debug!(target = "chatex.resolver", role = role.name(), kind = found.kind, label = %found.label, "resolved");
					return Ok(Some(found));
				}
				Ok(None) => {}
				Err(err) => {
					self.evict(role);
					return Err(err);
				}
			}
		}

		self.evict(role);
		debug!(target = "chatex.resolver", role = role.name(), strategies = chain.len(), "no strategy matched");
		Ok(None)
	}

	async fn attempt(&self, ui: &dyn Automation, role: Role, locator: &Locator) -> Result<Option<Resolved>> {
		match evaluate(ui, locator).await {
			Ok(found) => {
				if found.is_none() {
					debug!(target = "chatex.resolver", role = role.name(), kind = locator.kind(), ?locator, "miss");
				}
				Ok(found)
			}
			Err(err) => match classify(&err) {
				ErrorClass::SessionLoss | ErrorClass::Fatal => Err(err),
				_ => {
					debug!(target = "chatex.resolver", role = role.name(), kind = locator.kind(), error = %err, "lookup error treated as miss");
					Ok(None)
				}
			},
		}
	}
}

async fn evaluate(ui: &dyn Automation, locator: &Locator) -> Result<Option<Resolved>> {
	let kind = locator.kind();
	match locator {
		Locator::Query(query) => Ok(ui
			.find_all(query)
			.await?
			.into_iter()
			.find(UiElement::is_interactable)
			.map(|target| Resolved {
				label: target.label().to_string(),
				target,
				kind,
			})),
		Locator::Container(matcher) => {
			for text in ui.find_all(&Query::text(matcher.clone())).await? {
				if !text.displayed {
					continue;
				}
				if let Some(container) = clickable_ancestor(ui, &text, ANCESTOR_DEPTH).await? {
					if container.is_interactable() {
						return Ok(Some(Resolved {
							label: text.text.trim().to_string(),
							target: container,
							kind,
						}));
					}
				}
			}
			Ok(None)
		}
		Locator::Positional(positional) => evaluate_positional(ui, positional).await,
	}
}

async fn evaluate_positional(ui: &dyn Automation, positional: &Positional) -> Result<Option<Resolved>> {
	let kind = "positional";
	match positional {
		Positional::TopRightIcon { right_margin, max_y } => {
			let size = ui.window_size().await?;
			for class in [widget::IMAGE_VIEW, widget::IMAGE_BUTTON] {
				let hit = ui.find_all(&Query::Class(class.to_string())).await?.into_iter().find(|e| {
					e.is_interactable() && (e.rect.x as i64) > size.width - *right_margin && (e.rect.y as i64) < *max_y
				});
				if let Some(target) = hit {
					return Ok(Some(Resolved {
						label: target.label().to_string(),
						target,
						kind,
					}));
				}
			}
			Ok(None)
		}
		Positional::NthContainer { matcher, index } => {
			let mut containers = Vec::new();
			for text in ui.find_all(&Query::text(matcher.clone())).await? {
				if !text.displayed {
					continue;
				}
				let target = clickable_ancestor(ui, &text, ANCESTOR_DEPTH).await?.unwrap_or_else(|| text.clone());
				containers.push(Resolved {
					label: text.text.trim().to_string(),
					target,
					kind,
				});
			}
			containers.sort_by(|a, b| a.target.rect.y.total_cmp(&b.target.rect.y));
			Ok(containers.into_iter().nth(*index))
		}
		Positional::TopRightText { matcher, min_x, max_y } => {
			let size = ui.window_size().await?;
			let (min_x, max_y) = (size.width as f64 * min_x, size.height as f64 * max_y);
			for text in ui.find_all(&Query::text(matcher.clone())).await? {
				if !text.displayed || text.rect.x < min_x || text.rect.y > max_y {
					continue;
				}
				let target = clickable_ancestor(ui, &text, ANCESTOR_DEPTH).await?.unwrap_or_else(|| text.clone());
				return Ok(Some(Resolved {
					label: text.text.trim().to_string(),
					target,
					kind,
				}));
			}
			Ok(None)
		}
	}
}
