//! Session capabilities for the UiAutomator2 driver.

use serde::{Deserialize, Serialize};

/// Capabilities sent in `alwaysMatch` when opening a session.
///
/// Vendor keys carry the `appium:` prefix required by W3C-compliant servers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
	#[serde(rename = "platformName")]
	pub platform_name: String,
	#[serde(rename = "appium:automationName")]
	pub automation_name: String,
	#[serde(rename = "appium:udid", skip_serializing_if = "Option::is_none")]
	pub udid: Option<String>,
	#[serde(rename = "appium:appPackage")]
	pub app_package: String,
	#[serde(rename = "appium:appActivity")]
	pub app_activity: String,
	#[serde(rename = "appium:noReset")]
	pub no_reset: bool,
	#[serde(rename = "appium:fullReset")]
	pub full_reset: bool,
	/// Seconds the server waits for a command before ending the session.
	#[serde(rename = "appium:newCommandTimeout")]
	pub new_command_timeout: u64,
	#[serde(rename = "appium:uiautomator2ServerLaunchTimeout")]
	pub server_launch_timeout_ms: u64,
	#[serde(rename = "appium:uiautomator2ServerInstallTimeout")]
	pub server_install_timeout_ms: u64,
	#[serde(rename = "appium:adbExecTimeout")]
	pub adb_exec_timeout_ms: u64,
}

impl Capabilities {
	/// Android capabilities that attach to an installed app without resetting its data.
	pub fn android(app_package: impl Into<String>, app_activity: impl Into<String>) -> Self {
		Self {
			platform_name: "Android".into(),
			automation_name: "UiAutomator2".into(),
			udid: None,
			app_package: app_package.into(),
			app_activity: app_activity.into(),
			no_reset: true,
			full_reset: false,
			new_command_timeout: 3600,
			server_launch_timeout_ms: 60_000,
			server_install_timeout_ms: 60_000,
			adb_exec_timeout_ms: 60_000,
		}
	}

	pub fn with_udid(mut self, udid: impl Into<String>) -> Self {
		self.udid = Some(udid.into());
		self
	}

	pub fn with_adb_exec_timeout(mut self, timeout_ms: u64) -> Self {
		self.adb_exec_timeout_ms = timeout_ms;
		self
	}
}

/// Body of `POST /session`.
#[derive(Debug, Clone, Serialize)]
pub struct NewSessionRequest {
	pub capabilities: CapabilityRequest,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityRequest {
	pub always_match: Capabilities,
	pub first_match: Vec<serde_json::Value>,
}

impl NewSessionRequest {
	pub fn new(capabilities: Capabilities) -> Self {
		Self {
			capabilities: CapabilityRequest {
				always_match: capabilities,
				first_match: vec![serde_json::json!({})],
			},
		}
	}
}

/// `value` of a successful `POST /session`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionResponse {
	pub session_id: String,
	#[serde(default)]
	pub capabilities: serde_json::Value,
}
