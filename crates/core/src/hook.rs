//! Downstream processing invoked after each successful export.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;

/// What the downstream processor reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HookOutcome {
	pub success: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub output_path: Option<PathBuf>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub errors: Vec<String>,
}

impl HookOutcome {
	pub fn ok(output_path: Option<PathBuf>) -> Self {
		Self {
			success: true,
			output_path,
			errors: Vec::new(),
		}
	}

	pub fn failed(errors: Vec<String>) -> Self {
		Self {
			success: false,
			output_path: None,
			errors,
		}
	}
}

/// Best-effort processing of an exported chat. Failures never undo the export.
#[async_trait]
pub trait PostExportHook: Send + Sync {
	async fn process(&self, chat: &str, folder: Option<&str>) -> HookOutcome;
}
