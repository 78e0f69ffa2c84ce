//! Target-app identifiers, labels and timing knobs.
//!
//! Everything the engine matches against on screen lives here as data so a
//! different app build (or locale) is a config change rather than a code
//! change. Defaults target WhatsApp on Android exporting to Google Drive.

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn strings(items: &[&str]) -> Vec<String> {
	items.iter().map(|s| s.to_string()).collect()
}

/// On-screen identifiers and phrases for the target app and its share flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AppProfile {
	/// Package id the session must stay inside.
	pub package: String,
	/// Fully qualified activity used in session capabilities.
	pub main_activity: String,
	/// Component suffix passed to `am start -n <package>/<suffix>`.
	pub launch_activity: String,
	/// Resource id of a chat name in the conversation list.
	pub chat_row_id: String,
	/// Any of these being visible proves the app UI is up.
	pub marker_ids: Vec<String>,
	/// Foreground activities matching any of these are never driven.
	pub denied_activities: Vec<String>,
	/// Lock-screen indicators.
	pub lock_icon_id: String,
	pub system_ui_package: String,
	/// Activity substrings meaning the conversation list is showing.
	pub home_activity_hints: Vec<String>,
	/// Activity substring meaning a single conversation is open.
	pub conversation_activity_hint: String,

	pub menu_id: String,
	pub menu_label: String,
	pub more_label: String,
	pub export_label: String,
	pub privacy_phrases: Vec<String>,
	pub dismiss_label: String,
	pub include_media_label: String,
	pub exclude_media_label: String,

	/// Share-sheet detection.
	pub share_package: String,
	pub share_container_ids: Vec<String>,
	pub share_text_hints: Vec<String>,

	/// Destination labels tried in order.
	pub destination_labels: Vec<String>,
	/// Substring every accepted destination label must contain.
	pub destination_required: String,
	/// Destination labels containing any of these are rejected.
	pub destination_rejects: Vec<String>,

	pub commit_id: String,
	pub commit_label: String,

	/// Archive names in the resume folder are `"<prefix> <chat name>[<suffix>]"`.
	pub export_prefix: String,
	pub archive_suffix: String,
}

impl Default for AppProfile {
	fn default() -> Self {
		Self {
			package: "com.whatsapp".into(),
			main_activity: "com.whatsapp.Main".into(),
			launch_activity: ".Main".into(),
			chat_row_id: "com.whatsapp:id/conversations_row_contact_name".into(),
			marker_ids: strings(&[
				"com.whatsapp:id/conversations_row_contact_name",
				"com.whatsapp:id/toolbar",
				"com.whatsapp:id/action_bar",
				"com.whatsapp:id/menuitem_search",
			]),
			denied_activities: strings(&["Keyguard", "LockScreen", "lockscreen", "StatusBar", "systemui", "Settings"]),
			lock_icon_id: "com.android.systemui:id/lock_icon".into(),
			system_ui_package: "com.android.systemui".into(),
			home_activity_hints: strings(&[".home", "HomeActivity"]),
			conversation_activity_hint: "Conversation".into(),

			menu_id: "com.whatsapp:id/menuitem_overflow".into(),
			menu_label: "More options".into(),
			more_label: "more".into(),
			export_label: "export".into(),
			privacy_phrases: strings(&["advanced chat privacy", "can't export chats", "prevents the exporting", "cannot export"]),
			dismiss_label: "ok".into(),
			include_media_label: "include media".into(),
			exclude_media_label: "without media".into(),

			share_package: "com.android.intentresolver".into(),
			share_container_ids: strings(&["com.android.intentresolver:id/chooser_scrollable_container", "android:id/resolver_list"]),
			share_text_hints: strings(&["sharing", "file"]),

			destination_labels: strings(&["drive", "my drive"]),
			destination_required: "drive".into(),
			destination_rejects: strings(&["external", "usb", "sd card"]),

			commit_id: "com.google.android.apps.docs:id/save_button".into(),
			commit_label: "upload".into(),

			export_prefix: "WhatsApp Chat with".into(),
			archive_suffix: ".zip".into(),
		}
	}
}

impl AppProfile {
	pub fn is_home_activity(&self, activity: &str) -> bool {
		self.home_activity_hints.iter().any(|h| activity.contains(h.as_str()))
	}

	pub fn is_conversation_activity(&self, activity: &str) -> bool {
		activity.contains(&self.conversation_activity_hint)
	}

	/// First deny-list entry the activity matches.
	pub fn denied_match(&self, activity: &str) -> Option<&str> {
		self.denied_activities.iter().map(String::as_str).find(|d| activity.contains(d))
	}

	/// True if `text` is one of the privacy-restriction messages.
	pub fn is_privacy_message(&self, text: &str) -> bool {
		let lower = text.to_lowercase();
		self.privacy_phrases.iter().any(|p| lower.contains(&p.to_lowercase()))
	}

	/// Accepts a destination label if it names the cloud target and nothing disqualifying.
	pub fn accepts_destination(&self, label: &str) -> bool {
		let lower = label.to_lowercase();
		lower.contains(&self.destination_required.to_lowercase()) && !self.destination_rejects.iter().any(|r| lower.contains(&r.to_lowercase()))
	}
}

/// Waits and budgets for UI interaction, all in milliseconds when serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
	/// Pause after a click for the next surface to render.
	#[serde(with = "millis")]
	pub settle: Duration,
	/// Interval between activity polls.
	#[serde(with = "millis")]
	pub poll: Duration,
	/// Number of activity polls before giving up.
	pub poll_attempts: u32,
	/// First share-surface backoff step.
	#[serde(with = "millis")]
	pub backoff_base: Duration,
	/// Largest single share-surface wait.
	#[serde(with = "millis")]
	pub backoff_cap: Duration,
	pub backoff_attempts: u32,
	/// Swipes allowed while searching for the destination.
	pub destination_swipes: u32,
	/// Duration of a scroll gesture.
	#[serde(with = "millis")]
	pub swipe: Duration,
	/// Pause between tearing down a session and reconnecting.
	#[serde(with = "millis")]
	pub reconnect_pause: Duration,
	/// Pause before retrying an operation after reconnecting.
	#[serde(with = "millis")]
	pub retry_pause: Duration,
	/// Post-connect stabilization on a local (USB) transport.
	#[serde(with = "millis")]
	pub stabilize_local: Duration,
	/// Post-connect stabilization on a wireless transport.
	#[serde(with = "millis")]
	pub stabilize_wireless: Duration,
}

impl Default for Timings {
	fn default() -> Self {
		Self {
			settle: Duration::from_millis(1500),
			poll: Duration::from_millis(500),
			poll_attempts: 10,
			backoff_base: Duration::from_secs(2),
			backoff_cap: Duration::from_secs(90),
			backoff_attempts: 7,
			destination_swipes: 3,
			swipe: Duration::from_millis(400),
			reconnect_pause: Duration::from_secs(2),
			retry_pause: Duration::from_secs(1),
			stabilize_local: Duration::from_secs(3),
			stabilize_wireless: Duration::from_secs(5),
		}
	}
}

mod millis {
	use std::time::Duration;

	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_u64(value.as_millis() as u64)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
		u64::deserialize(deserializer).map(Duration::from_millis)
	}
}
