//! External tool discovery
//!
//! Locates the `adb` device bridge and the `appium` server executable. Both are
//! resolved in the same order:
//! 1. An explicit environment variable override (`ADB`, `APPIUM_BIN`)
//! 2. SDK/tool-specific install roots (`ANDROID_HOME`, `ANDROID_SDK_ROOT`)
//! 3. `PATH` lookup
//! 4. Common per-user and system install locations

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Description of an executable to locate.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
	/// Binary name as found on `PATH`.
	pub name: &'static str,
	/// Environment variable holding an explicit path.
	pub env_override: &'static str,
	/// SDK root variables whose subdirectory holds the binary.
	pub sdk_roots: &'static [&'static str],
	/// Subdirectory of an SDK root.
	pub sdk_subdir: &'static str,
	/// Paths relative to the home directory.
	pub home_candidates: &'static [&'static str],
	/// Absolute fallback paths.
	pub system_candidates: &'static [&'static str],
	/// Remediation shown when nothing is found.
	pub hint: &'static str,
}

pub const ADB: ToolSpec = ToolSpec {
	name: "adb",
	env_override: "ADB",
	sdk_roots: &["ANDROID_HOME", "ANDROID_SDK_ROOT"],
	sdk_subdir: "platform-tools",
	home_candidates: &["Android/Sdk/platform-tools", "Library/Android/sdk/platform-tools"],
	system_candidates: &["/usr/bin", "/usr/local/bin", "/opt/homebrew/bin"],
	hint: "Install Android platform-tools and make sure `adb` is on PATH (or set ADB).",
};

pub const APPIUM: ToolSpec = ToolSpec {
	name: "appium",
	env_override: "APPIUM_BIN",
	sdk_roots: &[],
	sdk_subdir: "",
	home_candidates: &[".npm-global/bin", ".local/bin"],
	system_candidates: &["/usr/local/bin", "/opt/homebrew/bin", "/usr/bin"],
	hint: "Install with: npm install -g appium && appium driver install uiautomator2",
};

/// Locate `adb`.
pub fn find_adb() -> Result<PathBuf> {
	locate(&ADB)
}

/// Locate the `appium` server launcher.
pub fn find_appium() -> Result<PathBuf> {
	locate(&APPIUM)
}

/// Locate a tool using the process environment.
pub fn locate(spec: &ToolSpec) -> Result<PathBuf> {
	let home = dirs::home_dir();
	locate_with(spec, |key| std::env::var_os(key), home.as_deref(), |name| which::which(name).ok())
}

/// Locate a tool with injectable environment, home and `PATH` lookup.
pub fn locate_with<E, W>(spec: &ToolSpec, env: E, home: Option<&Path>, path_lookup: W) -> Result<PathBuf>
where
	E: Fn(&str) -> Option<OsString>,
	W: Fn(&str) -> Option<PathBuf>,
{
	if let Some(explicit) = env(spec.env_override).map(PathBuf::from) {
		if is_executable(&explicit) {
			debug!(target = "chatex.runtime", tool = spec.name, source = spec.env_override, path = %explicit.display(), "using tool override");
			return Ok(explicit);
		}
		debug!(target = "chatex.runtime", tool = spec.name, path = %explicit.display(), "override does not point to a file; ignoring");
	}

	for root in spec.sdk_roots {
		if let Some(root) = env(root) {
			let candidate = PathBuf::from(root).join(spec.sdk_subdir).join(binary_name(spec.name));
			if is_executable(&candidate) {
				return Ok(candidate);
			}
		}
	}

	if let Some(found) = path_lookup(spec.name) {
		return Ok(found);
	}

	let home_paths = home
		.into_iter()
		.flat_map(|home| spec.home_candidates.iter().map(move |dir| home.join(dir)));
	let system_paths = spec.system_candidates.iter().map(PathBuf::from);

	home_paths
		.chain(system_paths)
		.map(|dir| dir.join(binary_name(spec.name)))
		.find(|candidate| is_executable(candidate))
		.ok_or(Error::ToolNotFound {
			tool: spec.name,
			hint: spec.hint,
		})
}

fn binary_name(name: &str) -> String {
	if cfg!(windows) { format!("{name}.exe") } else { name.to_string() }
}

fn is_executable(path: &Path) -> bool {
	path.is_file()
}
