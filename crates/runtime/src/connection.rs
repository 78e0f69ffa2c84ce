//! HTTP connection to the automation server
//!
//! [`Connection`] owns the HTTP client and server base URL; [`RemoteSession`] is
//! one open automation session on top of it. Every response is unwrapped from
//! the `{"value": ...}` envelope, and error payloads become [`Error::Remote`].

use std::time::Duration;

use chatex_protocol::{
	Actions, Capabilities, ElementId, FindElement, KeyEvent, NewSessionRequest, NewSessionResponse, Rect, ServerStatus, Using, WireError,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};

/// Status paths probed in order (current server layout first, legacy `/wd/hub` second).
const STATUS_PATHS: [&str; 2] = ["status", "wd/hub/status"];

/// HTTP client bound to one automation server.
#[derive(Debug, Clone)]
pub struct Connection {
	client: reqwest::Client,
	base: Url,
}

impl Connection {
	/// Creates a connection with a per-request timeout.
	pub fn new(base: Url, request_timeout: Duration) -> Result<Self> {
		let client = reqwest::Client::builder()
			.timeout(request_timeout)
			.build()
			.map_err(|e| Error::ConnectionFailed(format!("Failed to create HTTP client: {}", e)))?;
		Ok(Self { client, base: with_trailing_slash(base) })
	}

	pub fn base_url(&self) -> &Url {
		&self.base
	}

	fn url(&self, path: &str) -> Result<Url> {
		self.base
			.join(path.trim_start_matches('/'))
			.map_err(|e| Error::InvalidArgument(format!("bad request path {path}: {e}")))
	}

	async fn send<T: DeserializeOwned>(&self, method: Method, path: &str, body: Option<&Value>) -> Result<T> {
		let url = self.url(path)?;
		trace!(target = "chatex.runtime", %method, %url, "request");

		let mut request = self.client.request(method, url);
		if let Some(body) = body {
			request = request.json(body);
		}
		let response = request.send().await?;
		let status = response.status();
		let text = response.text().await?;

		let envelope: Value = serde_json::from_str(&text)
			.map_err(|_| Error::ProtocolError(format!("non-JSON response (HTTP {status}): {}", truncate(&text, 200))))?;
		let value = envelope.get("value").cloned().unwrap_or(Value::Null);

		if let Some(err) = WireError::from_value(&value) {
			return Err(Error::Remote {
				name: err.error,
				message: err.message,
				stack: err.stacktrace,
			});
		}
		if !status.is_success() {
			return Err(Error::TransportError(format!("unexpected status {status}")));
		}

		serde_json::from_value(value).map_err(Error::from)
	}

	/// Queries server readiness, falling back to the legacy status path.
	pub async fn status(&self) -> Result<ServerStatus> {
		let mut last_error = Error::ConnectionFailed("no response".into());
		for path in STATUS_PATHS {
			match self.send::<ServerStatus>(Method::GET, path, None).await {
				Ok(status) => return Ok(status),
				Err(err) => last_error = err,
			}
		}
		Err(last_error)
	}

	/// Opens a new automation session.
	pub async fn new_session(&self, capabilities: &Capabilities) -> Result<RemoteSession> {
		let body = serde_json::to_value(NewSessionRequest::new(capabilities.clone()))?;
		let response: NewSessionResponse = self.send(Method::POST, "session", Some(&body)).await?;
		debug!(target = "chatex.runtime", session = %response.session_id, "session opened");
		Ok(RemoteSession {
			connection: self.clone(),
			id: response.session_id,
		})
	}
}

/// One open automation session.
#[derive(Debug, Clone)]
pub struct RemoteSession {
	connection: Connection,
	id: String,
}

impl RemoteSession {
	pub fn id(&self) -> &str {
		&self.id
	}

	async fn call<T: DeserializeOwned>(&self, method: Method, path: &str, body: Option<&Value>) -> Result<T> {
		let full = format!("session/{}/{}", self.id, path);
		self.connection.send(method, &full, body).await
	}

	async fn call_unit(&self, method: Method, path: &str, body: Option<&Value>) -> Result<()> {
		self.call::<Value>(method, path, body).await.map(drop)
	}

	pub async fn find_elements(&self, using: Using, value: &str) -> Result<Vec<ElementId>> {
		let body = serde_json::to_value(FindElement { using, value: value.to_string() })?;
		let values: Vec<Value> = self.call(Method::POST, "elements", Some(&body)).await?;
		element_ids(&values)
	}

	pub async fn find_child_elements(&self, parent: &ElementId, using: Using, value: &str) -> Result<Vec<ElementId>> {
		let body = serde_json::to_value(FindElement { using, value: value.to_string() })?;
		let path = format!("element/{}/elements", parent.as_str());
		let values: Vec<Value> = self.call(Method::POST, &path, Some(&body)).await?;
		element_ids(&values)
	}

	pub async fn element_text(&self, element: &ElementId) -> Result<String> {
		let text: Option<String> = self.call(Method::GET, &format!("element/{}/text", element.as_str()), None).await?;
		Ok(text.unwrap_or_default())
	}

	pub async fn element_attribute(&self, element: &ElementId, name: &str) -> Result<Option<String>> {
		let path = format!("element/{}/attribute/{}", element.as_str(), name);
		let value: Value = self.call(Method::GET, &path, None).await?;
		Ok(match value {
			Value::Null => None,
			Value::String(s) => Some(s),
			other => Some(other.to_string()),
		})
	}

	pub async fn element_rect(&self, element: &ElementId) -> Result<Rect> {
		self.call(Method::GET, &format!("element/{}/rect", element.as_str()), None).await
	}

	pub async fn element_displayed(&self, element: &ElementId) -> Result<bool> {
		self.call(Method::GET, &format!("element/{}/displayed", element.as_str()), None).await
	}

	pub async fn element_enabled(&self, element: &ElementId) -> Result<bool> {
		self.call(Method::GET, &format!("element/{}/enabled", element.as_str()), None).await
	}

	pub async fn click(&self, element: &ElementId) -> Result<()> {
		self.call_unit(Method::POST, &format!("element/{}/click", element.as_str()), Some(&json!({}))).await
	}

	pub async fn current_package(&self) -> Result<String> {
		self.call(Method::GET, "appium/device/current_package", None).await
	}

	pub async fn current_activity(&self) -> Result<String> {
		self.call(Method::GET, "appium/device/current_activity", None).await
	}

	pub async fn window_rect(&self) -> Result<Rect> {
		self.call(Method::GET, "window/rect", None).await
	}

	pub async fn page_source(&self) -> Result<String> {
		self.call(Method::GET, "source", None).await
	}

	pub async fn press_keycode(&self, keycode: u32) -> Result<()> {
		let body = serde_json::to_value(KeyEvent { keycode })?;
		self.call_unit(Method::POST, "appium/device/press_keycode", Some(&body)).await
	}

	pub async fn perform_actions(&self, actions: &Actions) -> Result<()> {
		let body = serde_json::to_value(actions)?;
		self.call_unit(Method::POST, "actions", Some(&body)).await
	}

	/// Ends the session on the server.
	pub async fn delete(&self) -> Result<()> {
		let path = format!("session/{}", self.id);
		self.connection.send::<Value>(Method::DELETE, &path, None).await.map(drop)
	}
}

fn element_ids(values: &[Value]) -> Result<Vec<ElementId>> {
	values
		.iter()
		.map(|v| ElementId::from_value(v).ok_or_else(|| Error::ProtocolError(format!("missing element reference in {v}"))))
		.collect()
}

fn with_trailing_slash(mut url: Url) -> Url {
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());
		url.set_path(&path);
	}
	url
}

fn truncate(text: &str, max: usize) -> &str {
	match text.char_indices().nth(max) {
		Some((idx, _)) => &text[..idx],
		None => text,
	}
}
