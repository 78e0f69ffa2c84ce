//! The seam between the engine and a live device UI.
//!
//! Everything above this module talks to [`Automation`]; the remote adapter in
//! [`crate::remote`] implements it over the HTTP session, and tests implement it
//! with a scripted in-memory UI.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chatex_protocol::{Capabilities, Point, Rect, Size};

use crate::error::Result;

/// Android widget class names.
pub mod widget {
	pub const TEXT_VIEW: &str = "android.widget.TextView";
	pub const BUTTON: &str = "android.widget.Button";
	pub const IMAGE_VIEW: &str = "android.widget.ImageView";
	pub const IMAGE_BUTTON: &str = "android.widget.ImageButton";
	pub const LINEAR_LAYOUT: &str = "android.widget.LinearLayout";
	pub const FRAME_LAYOUT: &str = "android.widget.FrameLayout";
}

/// Boxed future used for retryable session operations.
pub type BoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Case-insensitive text predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TextMatch {
	Exact(String),
	Contains(String),
}

impl TextMatch {
	pub fn exact(text: impl Into<String>) -> Self {
		TextMatch::Exact(text.into())
	}

	pub fn contains(text: impl Into<String>) -> Self {
		TextMatch::Contains(text.into())
	}

	pub fn needle(&self) -> &str {
		match self {
			TextMatch::Exact(s) | TextMatch::Contains(s) => s,
		}
	}

	pub fn matches(&self, text: &str) -> bool {
		let text = text.trim().to_lowercase();
		match self {
			TextMatch::Exact(s) => text == s.to_lowercase(),
			TextMatch::Contains(s) => text.contains(&s.to_lowercase()),
		}
	}
}

/// Element query, independent of how the backend evaluates it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
	/// Stable resource id, e.g. `com.whatsapp:id/toolbar`.
	Id(String),
	/// Accessibility label (content description).
	AccessibilityId(String),
	/// Widget class, e.g. `android.widget.ImageButton`.
	Class(String),
	/// Visible text, optionally restricted to one widget class.
	Text { matcher: TextMatch, class: Option<String> },
	/// Content description containing the needle.
	Description(TextMatch),
}

impl Query {
	pub fn id(id: impl Into<String>) -> Self {
		Query::Id(id.into())
	}

	pub fn text(matcher: TextMatch) -> Self {
		Query::Text { matcher, class: None }
	}

	pub fn text_in(class: impl Into<String>, matcher: TextMatch) -> Self {
		Query::Text {
			matcher,
			class: Some(class.into()),
		}
	}
}

/// Snapshot of one on-screen element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiElement {
	/// Backend handle, only valid until the view changes.
	pub handle: String,
	pub class: String,
	pub text: String,
	pub content_desc: String,
	pub resource_id: String,
	pub rect: Rect,
	pub displayed: bool,
	pub enabled: bool,
	pub clickable: bool,
}

impl UiElement {
	/// Visible and enabled.
	pub fn is_interactable(&self) -> bool {
		self.displayed && self.enabled
	}

	/// Text if present, else the content description.
	pub fn label(&self) -> &str {
		if self.text.trim().is_empty() { self.content_desc.trim() } else { self.text.trim() }
	}
}

/// Operations the engine needs from a UI automation session.
#[async_trait]
pub trait Automation: Send + Sync {
	/// All elements matching `query`, in document order. No match is an empty vec.
	async fn find_all(&self, query: &Query) -> Result<Vec<UiElement>>;

	/// Descendants of `parent` matching `query`.
	async fn find_children(&self, parent: &UiElement, query: &Query) -> Result<Vec<UiElement>>;

	/// Direct parent of `element`, if any.
	async fn parent(&self, element: &UiElement) -> Result<Option<UiElement>>;

	async fn click(&self, element: &UiElement) -> Result<()>;

	async fn tap(&self, at: Point) -> Result<()>;

	async fn swipe(&self, from: Point, to: Point, duration: Duration) -> Result<()>;

	async fn press_key(&self, keycode: u32) -> Result<()>;

	async fn current_package(&self) -> Result<String>;

	async fn current_activity(&self) -> Result<String>;

	async fn window_size(&self) -> Result<Size>;

	/// Serialized UI tree for diagnostics.
	async fn page_source(&self) -> Result<String>;

	/// End the session. Errors for an already-closed session are not reported.
	async fn quit(&self) -> Result<()>;
}

/// Opens automation sessions.
#[async_trait]
pub trait SessionFactory: Send + Sync {
	async fn open(&self, capabilities: &Capabilities) -> Result<Arc<dyn Automation>>;
}

/// First match for `query` that is visible and enabled.
pub async fn find_interactable(ui: &dyn Automation, query: &Query) -> Result<Option<UiElement>> {
	Ok(ui.find_all(query).await?.into_iter().find(UiElement::is_interactable))
}

/// Any displayed match for `query`.
pub async fn is_present(ui: &dyn Automation, query: &Query) -> Result<bool> {
	Ok(ui.find_all(query).await?.iter().any(|e| e.displayed))
}

/// Walks up from `element` to the nearest clickable ancestor, at most `max_depth` levels.
pub async fn clickable_ancestor(ui: &dyn Automation, element: &UiElement, max_depth: usize) -> Result<Option<UiElement>> {
	if element.clickable {
		return Ok(Some(element.clone()));
	}
	let mut current = element.clone();
	for _ in 0..max_depth {
		match ui.parent(&current).await? {
			Some(parent) if parent.clickable => return Ok(Some(parent)),
			Some(parent) => current = parent,
			None => break,
		}
	}
	Ok(None)
}

/// Click `element`, falling back to a tap at its centre when the click is rejected.
pub async fn click_or_tap(ui: &dyn Automation, element: &UiElement) -> Result<()> {
	match ui.click(element).await {
		Ok(()) => Ok(()),
		Err(err) if crate::classify::classify(&err) == crate::classify::ErrorClass::SessionLoss => Err(err),
		Err(err) => {
			tracing::debug!(target = "chatex.resolver", error = %err, "click rejected; tapping centre");
			ui.tap(element.rect.center()).await
		}
	}
}
