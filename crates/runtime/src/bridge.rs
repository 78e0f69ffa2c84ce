//! Out-of-band device commands through `adb`.
//!
//! Every invocation is a child process with a hard timeout; output is captured
//! as exit code plus stdout/stderr and never interpreted beyond what the caller
//! asks for.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::tools;

/// Default timeout for short shell commands.
pub const SHELL_TIMEOUT: Duration = Duration::from_secs(15);
/// Liveness probe timeout.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
/// `adb pair` timeout.
pub const PAIR_TIMEOUT: Duration = Duration::from_secs(30);
/// `adb connect` timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Captured result of a bridge command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
	pub code: i32,
	pub stdout: String,
	pub stderr: String,
}

impl CommandOutput {
	pub fn success(&self) -> bool {
		self.code == 0
	}
}

/// One line of `adb devices`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
	pub serial: String,
	pub state: String,
}

impl DeviceEntry {
	/// Ready for commands (not `offline` or `unauthorized`).
	pub fn is_ready(&self) -> bool {
		self.state == "device"
	}

	/// Wireless serials are `host:port`.
	pub fn is_wireless(&self) -> bool {
		self.serial.contains(':')
	}
}

/// Parses `adb devices` output, skipping the header and blank lines.
pub fn parse_devices(stdout: &str) -> Vec<DeviceEntry> {
	stdout
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty() && !line.starts_with("List of devices") && !line.starts_with('*'))
		.filter_map(|line| {
			let mut parts = line.split_whitespace();
			let serial = parts.next()?;
			let state = parts.next()?;
			Some(DeviceEntry {
				serial: serial.to_string(),
				state: state.to_string(),
			})
		})
		.collect()
}

/// A wireless pairing code is exactly six ASCII digits.
pub fn validate_pairing_code(code: &str) -> bool {
	code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit())
}

/// Host part of a `host:port` address.
pub fn host_of(address: &str) -> &str {
	address.rsplit_once(':').map_or(address, |(host, _)| host)
}

/// Handle to the `adb` executable, optionally bound to one device serial.
#[derive(Debug, Clone)]
pub struct Adb {
	exe: PathBuf,
	serial: Option<String>,
}

impl Adb {
	pub fn new(exe: impl Into<PathBuf>) -> Self {
		Self { exe: exe.into(), serial: None }
	}

	/// Locate `adb` on this machine.
	pub fn locate() -> Result<Self> {
		Ok(Self::new(tools::find_adb()?))
	}

	/// Same executable, commands targeted at `serial` via `-s`.
	pub fn for_device(&self, serial: impl Into<String>) -> Self {
		Self {
			exe: self.exe.clone(),
			serial: Some(serial.into()),
		}
	}

	pub fn exe(&self) -> &Path {
		&self.exe
	}

	pub fn serial(&self) -> Option<&str> {
		self.serial.as_deref()
	}

	fn argv<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
		let mut argv = Vec::with_capacity(args.len() + 2);
		if let Some(serial) = &self.serial {
			argv.push("-s");
			argv.push(serial.as_str());
		}
		argv.extend_from_slice(args);
		argv
	}

	/// Runs `adb <args>` and captures its output. Non-zero exit is not an error here.
	pub async fn run(&self, args: &[&str], timeout: Duration) -> Result<CommandOutput> {
		let argv = self.argv(args);
		let rendered = argv.join(" ");
		debug!(target = "chatex.runtime", command = %rendered, "adb");

		let child = Command::new(&self.exe)
			.args(&argv)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true)
			.spawn()?;

		let output = tokio::time::timeout(timeout, child.wait_with_output())
			.await
			.map_err(|_| Error::Timeout(format!("`adb {rendered}` after {}s", timeout.as_secs_f32())))??;

		Ok(CommandOutput {
			code: output.status.code().unwrap_or(-1),
			stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
			stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
		})
	}

	/// Like [`Adb::run`], but a non-zero exit becomes [`Error::CommandFailed`].
	pub async fn run_checked(&self, args: &[&str], timeout: Duration) -> Result<CommandOutput> {
		let output = self.run(args, timeout).await?;
		if output.success() {
			Ok(output)
		} else {
			Err(Error::CommandFailed {
				command: self.argv(args).join(" "),
				code: output.code,
				stderr: output.stderr.trim().to_string(),
			})
		}
	}

	pub async fn shell(&self, args: &[&str]) -> Result<CommandOutput> {
		let mut full = vec!["shell"];
		full.extend_from_slice(args);
		self.run_checked(&full, SHELL_TIMEOUT).await
	}

	/// Every attached device, including `offline` and `unauthorized` ones.
	pub async fn all_devices(&self) -> Result<Vec<DeviceEntry>> {
		let output = Self::new(&self.exe).run_checked(&["devices"], SHELL_TIMEOUT).await?;
		Ok(parse_devices(&output.stdout))
	}

	/// Attached devices that are ready for commands.
	pub async fn devices(&self) -> Result<Vec<DeviceEntry>> {
		Ok(self.all_devices().await?.into_iter().filter(DeviceEntry::is_ready).collect())
	}

	/// `adb get-state`, bounded by [`PROBE_TIMEOUT`].
	pub async fn get_state(&self) -> Result<String> {
		let output = self.run(&["get-state"], PROBE_TIMEOUT).await?;
		if output.success() {
			Ok(output.stdout.trim().to_string())
		} else {
			Err(Error::DeviceUnreachable(output.stderr.trim().to_string()))
		}
	}

	/// Device transport answers and reports `device` state.
	pub async fn is_alive(&self) -> bool {
		match self.get_state().await {
			Ok(state) => state.contains("device"),
			Err(err) => {
				debug!(target = "chatex.runtime", error = %err, "liveness probe failed");
				false
			}
		}
	}

	pub async fn force_stop(&self, package: &str) -> Result<()> {
		self.shell(&["am", "force-stop", package]).await.map(drop)
	}

	/// `am start -n <package>/<activity>`.
	pub async fn start_activity(&self, package: &str, activity: &str) -> Result<()> {
		let component = format!("{package}/{activity}");
		self.shell(&["am", "start", "-n", &component]).await.map(drop)
	}

	/// Keep the screen on while plugged in (USB, AC and wireless charging).
	pub async fn keep_awake(&self) -> Result<()> {
		self.shell(&["settings", "put", "global", "stay_on_while_plugged_in", "7"]).await.map(drop)
	}

	/// `adb pair <address> <code>`.
	pub async fn pair(&self, address: &str, code: &str) -> Result<()> {
		if !validate_pairing_code(code) {
			return Err(Error::InvalidArgument("pairing code must be exactly 6 digits".into()));
		}
		info!(target = "chatex.runtime", address, "pairing wireless device");
		let output = Self::new(&self.exe).run(&["pair", address, code], PAIR_TIMEOUT).await?;
		let combined = format!("{}{}", output.stdout, output.stderr).to_lowercase();
		if output.success() && combined.contains("successfully paired") {
			Ok(())
		} else {
			Err(Error::CommandFailed {
				command: format!("pair {address}"),
				code: output.code,
				stderr: combined.trim().to_string(),
			})
		}
	}

	/// `adb connect <address>`, then confirm the device shows up as ready.
	pub async fn connect(&self, address: &str) -> Result<Adb> {
		info!(target = "chatex.runtime", address, "connecting wireless device");
		let output = Self::new(&self.exe).run(&["connect", address], CONNECT_TIMEOUT).await?;
		let text = output.stdout.to_lowercase();
		if !(text.contains("connected to") || text.contains("already connected")) {
			return Err(Error::CommandFailed {
				command: format!("connect {address}"),
				code: output.code,
				stderr: format!("{}{}", output.stdout.trim(), output.stderr.trim()),
			});
		}

		let devices = self.devices().await?;
		if devices.iter().any(|d| d.serial == address) {
			Ok(self.for_device(address))
		} else {
			Err(Error::DeviceUnreachable(format!("{address} connected but is not ready (check the authorization prompt)")))
		}
	}
}
