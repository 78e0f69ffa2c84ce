//! [`Automation`] over a live automation-server session.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chatex_protocol::{Actions, Capabilities, ElementId, Point, Size, Using};
use chatex_runtime::{Connection, RemoteSession};
use futures_util::future::try_join_all;
use tracing::debug;

use crate::automation::{Automation, Query, SessionFactory, TextMatch, UiElement};
use crate::error::{Error, Result};

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";

/// Quote `value` as an XPath 1.0 string literal.
pub fn xpath_literal(value: &str) -> String {
	if !value.contains('\'') {
		return format!("'{value}'");
	}
	if !value.contains('"') {
		return format!("\"{value}\"");
	}
	let parts: Vec<String> = value.split('\'').map(|part| format!("'{part}'")).collect();
	format!("concat({})", parts.join(", \"'\", "))
}

fn text_predicate(attribute: &str, matcher: &TextMatch) -> String {
	let folded = format!("translate(normalize-space(@{attribute}), '{UPPER}', '{LOWER}')");
	let needle = xpath_literal(&matcher.needle().trim().to_lowercase());
	match matcher {
		TextMatch::Exact(_) => format!("{folded}={needle}"),
		TextMatch::Contains(_) => format!("contains({folded}, {needle})"),
	}
}

/// Locator strategy and value for `query`. XPath values are rooted at the document.
pub fn wire_query(query: &Query) -> (Using, String) {
	match query {
		Query::Id(id) => (Using::Id, id.clone()),
		Query::AccessibilityId(label) => (Using::AccessibilityId, label.clone()),
		Query::Class(class) => (Using::ClassName, class.clone()),
		Query::Text { matcher, class } => {
			let node = class.as_deref().unwrap_or("*");
			(Using::XPath, format!("//{node}[{}]", text_predicate("text", matcher)))
		}
		Query::Description(matcher) => (Using::XPath, format!("//*[{}]", text_predicate("content-desc", matcher)))
	}
}

/// Remote session adapter. Element handles are server element ids.
#[derive(Debug, Clone)]
pub struct RemoteAutomation {
	session: RemoteSession,
}

impl RemoteAutomation {
	pub fn new(session: RemoteSession) -> Self {
		Self { session }
	}

	pub fn session(&self) -> &RemoteSession {
		&self.session
	}

	async fn snapshot(&self, id: ElementId) -> Result<UiElement> {
		let s = &self.session;
		let (text, class, desc, resource_id, clickable, rect, displayed, enabled) = futures_util::try_join!(
			s.element_text(&id),
			s.element_attribute(&id, "class"),
			s.element_attribute(&id, "content-desc"),
			s.element_attribute(&id, "resource-id"),
			s.element_attribute(&id, "clickable"),
			s.element_rect(&id),
			s.element_displayed(&id),
			s.element_enabled(&id),
		)?;
		Ok(UiElement {
			handle: id.0,
			class: class.unwrap_or_default(),
			text,
			content_desc: desc.unwrap_or_default(),
			resource_id: resource_id.unwrap_or_default(),
			rect,
			displayed,
			enabled,
			clickable: clickable.is_some_and(|v| v == "true"),
		})
	}

	/// Snapshot every id, dropping elements that vanished in the meantime.
	async fn snapshot_all(&self, ids: Vec<ElementId>) -> Result<Vec<UiElement>> {
		let snapshots = try_join_all(ids.into_iter().map(|id| async move {
			match self.snapshot(id).await {
				Ok(element) => Ok(Some(element)),
				Err(Error::Runtime(err)) if err.is_stale_element() || err.is_no_such_element() => {
					debug!(target = "chatex.runtime", error = %err, "element vanished during snapshot");
					Ok(None)
				}
				Err(err) => Err(err),
			}
		}))
		.await?;
		Ok(snapshots.into_iter().flatten().collect())
	}

	fn element_id(element: &UiElement) -> ElementId {
		ElementId(element.handle.clone())
	}
}

#[async_trait]
impl Automation for RemoteAutomation {
	async fn find_all(&self, query: &Query) -> Result<Vec<UiElement>> {
		let (using, value) = wire_query(query);
		let ids = self.session.find_elements(using, &value).await?;
		self.snapshot_all(ids).await
	}

	async fn find_children(&self, parent: &UiElement, query: &Query) -> Result<Vec<UiElement>> {
		let (using, mut value) = wire_query(query);
		if using == Using::XPath {
			value.insert(0, '.');
		}
		let ids = self.session.find_child_elements(&Self::element_id(parent), using, &value).await?;
		self.snapshot_all(ids).await
	}

	async fn parent(&self, element: &UiElement) -> Result<Option<UiElement>> {
		let ids = self.session.find_child_elements(&Self::element_id(element), Using::XPath, "..").await?;
		Ok(self.snapshot_all(ids).await?.into_iter().next())
	}

	async fn click(&self, element: &UiElement) -> Result<()> {
		Ok(self.session.click(&Self::element_id(element)).await?)
	}

	async fn tap(&self, at: Point) -> Result<()> {
		Ok(self.session.perform_actions(&Actions::tap(at)).await?)
	}

	async fn swipe(&self, from: Point, to: Point, duration: Duration) -> Result<()> {
		Ok(self.session.perform_actions(&Actions::swipe(from, to, duration.as_millis() as u64)).await?)
	}

	async fn press_key(&self, keycode: u32) -> Result<()> {
		Ok(self.session.press_keycode(keycode).await?)
	}

	async fn current_package(&self) -> Result<String> {
		Ok(self.session.current_package().await?)
	}

	async fn current_activity(&self) -> Result<String> {
		Ok(self.session.current_activity().await?)
	}

	async fn window_size(&self) -> Result<Size> {
		Ok(Size::from(self.session.window_rect().await?))
	}

	async fn page_source(&self) -> Result<String> {
		Ok(self.session.page_source().await?)
	}

	async fn quit(&self) -> Result<()> {
		match self.session.delete().await {
			Ok(()) => Ok(()),
			Err(err) if err.is_invalid_session() => {
				debug!(target = "chatex.session", "session already closed");
				Ok(())
			}
			Err(err) => Err(err.into()),
		}
	}
}

/// Opens sessions on an automation server.
#[derive(Debug, Clone)]
pub struct RemoteSessionFactory {
	connection: Connection,
}

impl RemoteSessionFactory {
	pub fn new(connection: Connection) -> Self {
		Self { connection }
	}
}

#[async_trait]
impl SessionFactory for RemoteSessionFactory {
	async fn open(&self, capabilities: &Capabilities) -> Result<Arc<dyn Automation>> {
		let session = self.connection.new_session(capabilities).await?;
		Ok(Arc::new(RemoteAutomation::new(session)))
	}
}
