//! Optional JSON config file and flag merging.
//!
//! A flag beats the config file, which beats the built-in default.

use std::fs;
use std::path::{Path, PathBuf};

use chatex::{AppProfile, CheckpointStore, ScanLimits, Timings};
use chatex_runtime::ServerEndpoint;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::cli::ConnectArgs;
use crate::error::{CliError, Result};

/// Where chatex keeps its files.
#[derive(Debug, Clone)]
pub struct StatePaths {
	pub config: PathBuf,
}

impl StatePaths {
	pub fn new() -> Self {
		let config_home = std::env::var_os("XDG_CONFIG_HOME")
			.map(PathBuf::from)
			.or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
			.unwrap_or_else(|| PathBuf::from("."));

		Self {
			config: config_home.join("chatex").join("config.json"),
		}
	}
}

impl Default for StatePaths {
	fn default() -> Self {
		Self::new()
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatexConfig {
	pub server_url: Option<String>,
	pub server_host: Option<String>,
	pub server_port: Option<u16>,
	/// Device serial to use without prompting.
	pub device: Option<String>,
	pub app: AppProfile,
	pub timings: Timings,
	pub scan: ScanLimits,
	pub checkpoint_path: Option<PathBuf>,
	pub diagnostics_dir: Option<PathBuf>,
	pub max_retries: Option<u32>,
	/// File this config was read from.
	#[serde(skip)]
	pub source: Option<PathBuf>,
}

impl ChatexConfig {
	/// Load `explicit`, or the default location if it exists.
	///
	/// A missing default file is an empty config; a missing explicit file or
	/// malformed JSON is an error.
	pub fn load(explicit: Option<&Path>) -> Result<Self> {
		let (path, required) = match explicit {
			Some(path) => (path.to_path_buf(), true),
			None => (StatePaths::new().config, false),
		};
		if !path.exists() {
			if required {
				return Err(CliError::Config {
					path,
					message: "file not found".into(),
				});
			}
			debug!(target = "chatex.cli", path = %path.display(), "no config file");
			return Ok(Self::default());
		}
		let content = fs::read_to_string(&path)?;
		let mut config: Self = serde_json::from_str(&content).map_err(|e| CliError::Config {
			path: path.clone(),
			message: e.to_string(),
		})?;
		debug!(target = "chatex.cli", path = %path.display(), "loaded config");
		config.source = Some(path);
		Ok(config)
	}

	/// Server URL: `--server-url`, then `--host`/`--port`, then the config file.
	pub fn server_url(&self, args: &ConnectArgs) -> Result<Url> {
		if let Some(url) = &args.server_url {
			return Ok(url.clone());
		}
		if args.host.is_none() && args.port.is_none() {
			if let Some(raw) = &self.server_url {
				return Url::parse(raw).map_err(|e| CliError::Config {
					path: self.source.clone().unwrap_or_default(),
					message: format!("server_url: {e}"),
				});
			}
		}
		Ok(self.endpoint(args).url()?)
	}

	/// Host and port for a locally launched server.
	pub fn endpoint(&self, args: &ConnectArgs) -> ServerEndpoint {
		let defaults = ServerEndpoint::default();
		ServerEndpoint::new(
			args.host.clone().or_else(|| self.server_host.clone()).unwrap_or(defaults.host),
			args.port.or(self.server_port).unwrap_or(defaults.port),
		)
	}

	pub fn device(&self, args: &ConnectArgs) -> Option<String> {
		args.device.clone().or_else(|| self.device.clone())
	}

	pub fn diagnostics_dir(&self, args: &ConnectArgs) -> Option<PathBuf> {
		args.diagnostics_dir.clone().or_else(|| self.diagnostics_dir.clone())
	}

	pub fn checkpoint_store(&self, flag: Option<&Path>) -> CheckpointStore {
		let path = flag
			.map(Path::to_path_buf)
			.or_else(|| self.checkpoint_path.clone())
			.unwrap_or_else(CheckpointStore::default_path);
		CheckpointStore::new(path)
	}
}
