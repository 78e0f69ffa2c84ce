//! W3C pointer action payloads for swipes and taps.

use serde::Serialize;

use crate::types::Point;

/// Body of `POST /session/{id}/actions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Actions {
	pub actions: Vec<InputSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSource {
	#[serde(rename = "type")]
	pub kind: &'static str,
	pub id: String,
	pub parameters: PointerParameters,
	pub actions: Vec<PointerStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerParameters {
	pub pointer_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PointerStep {
	PointerMove { duration: u64, x: i64, y: i64, origin: &'static str },
	PointerDown { button: u8 },
	PointerUp { button: u8 },
	Pause { duration: u64 },
}

impl PointerStep {
	fn move_to(point: Point, duration_ms: u64) -> Self {
		PointerStep::PointerMove {
			duration: duration_ms,
			x: point.x,
			y: point.y,
			origin: "viewport",
		}
	}
}

impl Actions {
	fn touch(steps: Vec<PointerStep>) -> Self {
		Self {
			actions: vec![InputSource {
				kind: "pointer",
				id: "finger1".into(),
				parameters: PointerParameters { pointer_type: "touch" },
				actions: steps,
			}],
		}
	}

	/// Press at `from`, drag to `to` over `duration_ms`, release.
	pub fn swipe(from: Point, to: Point, duration_ms: u64) -> Self {
		Self::touch(vec![
			PointerStep::move_to(from, 0),
			PointerStep::PointerDown { button: 0 },
			PointerStep::Pause { duration: 100 },
			PointerStep::move_to(to, duration_ms),
			PointerStep::PointerUp { button: 0 },
		])
	}

	pub fn tap(at: Point) -> Self {
		Self::touch(vec![
			PointerStep::move_to(at, 0),
			PointerStep::PointerDown { button: 0 },
			PointerStep::Pause { duration: 50 },
			PointerStep::PointerUp { button: 0 },
		])
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn swipe_serializes_as_touch_pointer() {
		let actions = Actions::swipe(Point::new(540, 1700), Point::new(540, 700), 400);
		let value = serde_json::to_value(&actions).unwrap();
		let source = &value["actions"][0];

		assert_eq!(source["type"], "pointer");
		assert_eq!(source["parameters"], json!({ "pointerType": "touch" }));
		assert_eq!(source["actions"][0], json!({ "type": "pointerMove", "duration": 0, "x": 540, "y": 1700, "origin": "viewport" }));
		assert_eq!(source["actions"][3]["duration"], 400);
		assert_eq!(source["actions"][4], json!({ "type": "pointerUp", "button": 0 }));
	}

	#[test]
	fn tap_presses_and_releases_in_place() {
		let actions = Actions::tap(Point::new(10, 20));
		let steps = &actions.actions[0].actions;
		assert_eq!(steps.len(), 4);
		assert!(matches!(steps[1], PointerStep::PointerDown { button: 0 }));
		assert!(matches!(steps[3], PointerStep::PointerUp { button: 0 }));
	}
}
