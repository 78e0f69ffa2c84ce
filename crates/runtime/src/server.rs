//! Automation server management
//!
//! Launches a local `appium` process, waits for it to report ready, and stops
//! it on teardown. A server that is already listening is used as-is and never
//! stopped by us.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};
use url::Url;

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::tools::find_appium;

/// Default server host.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default server port.
pub const DEFAULT_PORT: u16 = 4723;

/// Where the automation server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
	pub host: String,
	pub port: u16,
}

impl Default for ServerEndpoint {
	fn default() -> Self {
		Self {
			host: DEFAULT_HOST.to_string(),
			port: DEFAULT_PORT,
		}
	}
}

impl ServerEndpoint {
	pub fn new(host: impl Into<String>, port: u16) -> Self {
		Self { host: host.into(), port }
	}

	pub fn url(&self) -> Result<Url> {
		Url::parse(&format!("http://{}:{}/", self.host, self.port)).map_err(|e| Error::InvalidArgument(format!("bad server address: {e}")))
	}
}

/// Returns true if a server answers the status probe at `url`.
pub async fn is_running(url: &Url) -> bool {
	match Connection::new(url.clone(), Duration::from_secs(2)) {
		Ok(conn) => conn.status().await.is_ok(),
		Err(_) => false,
	}
}

/// Manages a locally launched automation server process.
#[derive(Debug)]
pub struct AutomationServer {
	process: Child,
	url: Url,
}

impl AutomationServer {
	/// Launch `appium -a <host> -p <port>` and wait until it reports ready.
	///
	/// # Errors
	///
	/// Returns `Error::ToolNotFound` if `appium` cannot be located,
	/// `Error::LaunchFailed` if the process exits immediately, and
	/// `Error::ServerNotReady` if it does not answer within `ready_timeout`.
	pub async fn launch(endpoint: &ServerEndpoint, ready_timeout: Duration) -> Result<Self> {
		let exe = find_appium()?;
		let url = endpoint.url()?;
		info!(target = "chatex.runtime", exe = %exe.display(), %url, "starting automation server");

		let mut child = Command::new(&exe)
			.args(["-a", &endpoint.host, "-p", &endpoint.port.to_string()])
			.stdin(Stdio::null())
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.kill_on_drop(true)
			.spawn()
			.map_err(|e| Error::LaunchFailed(format!("Failed to spawn process: {}", e)))?;

		tokio::time::sleep(Duration::from_millis(100)).await;
		if let Some(status) = child
			.try_wait()
			.map_err(|e| Error::LaunchFailed(format!("Failed to check process status: {}", e)))?
		{
			return Err(Error::LaunchFailed(format!("Server process exited immediately with status: {}", status)));
		}

		let mut server = Self { process: child, url };
		if let Err(err) = server.wait_ready(ready_timeout).await {
			let _ = server.process.start_kill();
			return Err(err);
		}
		Ok(server)
	}

	pub fn url(&self) -> &Url {
		&self.url
	}

	async fn wait_ready(&mut self, timeout: Duration) -> Result<()> {
		let started = Instant::now();
		while started.elapsed() < timeout {
			if let Ok(Some(status)) = self.process.try_wait() {
				return Err(Error::LaunchFailed(format!("Server process exited with status: {}", status)));
			}
			if is_running(&self.url).await {
				debug!(target = "chatex.runtime", waited_ms = started.elapsed().as_millis() as u64, "automation server ready");
				return Ok(());
			}
			tokio::time::sleep(Duration::from_millis(500)).await;
		}
		Err(Error::ServerNotReady {
			url: self.url.to_string(),
			waited_secs: timeout.as_secs(),
		})
	}

	/// Terminate the server, waiting up to five seconds for it to exit.
	pub async fn shutdown(mut self) -> Result<()> {
		info!(target = "chatex.runtime", url = %self.url, "stopping automation server");
		self.process
			.start_kill()
			.map_err(|e| Error::LaunchFailed(format!("Failed to kill process: {}", e)))?;

		match tokio::time::timeout(Duration::from_secs(5), self.process.wait()).await {
			Ok(Ok(_)) => Ok(()),
			Ok(Err(e)) => Err(Error::LaunchFailed(format!("Failed to wait for process: {}", e))),
			Err(_) => {
				warn!(target = "chatex.runtime", "automation server did not exit within 5s");
				Err(Error::Timeout("automation server shutdown after 5 seconds".to_string()))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn endpoint_url_defaults_to_loopback() {
		let url = ServerEndpoint::default().url().unwrap();
		assert_eq!(url.as_str(), "http://127.0.0.1:4723/");
	}

	#[test]
	fn endpoint_rejects_garbage_host() {
		assert!(ServerEndpoint::new("bad host", 1).url().is_err());
	}

	#[tokio::test]
	async fn nothing_listening_is_not_running() {
		let url = ServerEndpoint::new("127.0.0.1", 9).url().unwrap();
		assert!(!is_running(&url).await);
	}
}
