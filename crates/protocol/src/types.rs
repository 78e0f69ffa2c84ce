//! Core protocol value types.

use serde::{Deserialize, Serialize};

/// W3C key under which servers return element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52f-4f735466cecf";

/// Pre-W3C key still emitted by some server builds.
pub const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

/// Android key codes used by the engine.
pub mod keycode {
	pub const HOME: u32 = 3;
	pub const BACK: u32 = 4;
}

/// Element lookup strategy (`using` field of a find request).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Using {
	#[serde(rename = "id")]
	Id,
	#[serde(rename = "accessibility id")]
	AccessibilityId,
	#[serde(rename = "xpath")]
	XPath,
	#[serde(rename = "class name")]
	ClassName,
}

impl Using {
	pub fn as_str(&self) -> &'static str {
		match self {
			Using::Id => "id",
			Using::AccessibilityId => "accessibility id",
			Using::XPath => "xpath",
			Using::ClassName => "class name",
		}
	}
}

/// Body of a find-element(s) request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindElement {
	pub using: Using,
	pub value: String,
}

/// Opaque server-side element handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub String);

impl ElementId {
	/// Extracts an element handle from a find response entry.
	pub fn from_value(value: &serde_json::Value) -> Option<Self> {
		value
			.get(ELEMENT_KEY)
			.or_else(|| value.get(LEGACY_ELEMENT_KEY))
			.and_then(|v| v.as_str())
			.map(|s| ElementId(s.to_string()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

/// Screen coordinate in device pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
	pub x: i64,
	pub y: i64,
}

impl Point {
	pub fn new(x: i64, y: i64) -> Self {
		Self { x, y }
	}
}

/// Element or window rectangle as reported by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
	#[serde(default)]
	pub x: f64,
	#[serde(default)]
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
		Self { x, y, width, height }
	}

	pub fn center(&self) -> Point {
		Point::new((self.x + self.width / 2.0) as i64, (self.y + self.height / 2.0) as i64)
	}

	pub fn contains(&self, point: Point) -> bool {
		let (px, py) = (point.x as f64, point.y as f64);
		px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
	}
}

/// Device viewport size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
	pub width: i64,
	pub height: i64,
}

impl Size {
	pub fn new(width: i64, height: i64) -> Self {
		Self { width, height }
	}

	/// Point at the given fractions of the viewport.
	pub fn at(&self, x_ratio: f64, y_ratio: f64) -> Point {
		Point::new((self.width as f64 * x_ratio) as i64, (self.height as f64 * y_ratio) as i64)
	}
}

impl From<Rect> for Size {
	fn from(rect: Rect) -> Self {
		Size::new(rect.width as i64, rect.height as i64)
	}
}

/// Generic `{"value": ...}` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct WireResponse<T> {
	pub value: T,
}

/// Error payload carried in the `value` of a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
	/// W3C error code, e.g. `"no such element"` or `"invalid session id"`.
	pub error: String,
	#[serde(default)]
	pub message: String,
	#[serde(default)]
	pub stacktrace: Option<String>,
}

impl WireError {
	/// Parses a response `value` as an error payload if it carries one.
	pub fn from_value(value: &serde_json::Value) -> Option<Self> {
		value.get("error").and_then(|e| e.as_str())?;
		serde_json::from_value(value.clone()).ok()
	}
}

/// Body of `press_keycode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
	pub keycode: u32,
}

/// `value` of `GET /status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
	#[serde(default)]
	pub ready: bool,
	#[serde(default)]
	pub message: String,
}
