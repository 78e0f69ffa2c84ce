//! Out-of-band device control used by the session manager.

use std::time::Duration;

use async_trait::async_trait;
use chatex_runtime::Adb;
use tracing::debug;

use crate::error::Result;

/// How the device is attached; wireless links get longer timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
	Local,
	Wireless,
}

impl Transport {
	/// Wireless serials are `host:port`.
	pub fn from_serial(serial: &str) -> Self {
		if serial.contains(':') { Transport::Wireless } else { Transport::Local }
	}

	/// Budget for a single device-bridge call made by the automation server.
	pub fn bridge_timeout(&self) -> Duration {
		match self {
			Transport::Local => Duration::from_secs(60),
			Transport::Wireless => Duration::from_secs(120),
		}
	}
}

impl std::fmt::Display for Transport {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Transport::Local => write!(f, "usb"),
			Transport::Wireless => write!(f, "wireless"),
		}
	}
}

#[async_trait]
pub trait Device: Send + Sync {
	fn serial(&self) -> &str;

	fn transport(&self) -> Transport;

	/// Short liveness probe of the device transport.
	async fn is_alive(&self) -> bool;

	async fn force_stop(&self, package: &str) -> Result<()>;

	async fn launch(&self, package: &str, activity: &str) -> Result<()>;

	/// Keep the screen from sleeping for the length of the run.
	async fn keep_awake(&self) -> Result<()>;
}

/// [`Device`] backed by `adb -s <serial>`.
#[derive(Debug, Clone)]
pub struct AdbDevice {
	adb: Adb,
	serial: String,
	transport: Transport,
}

impl AdbDevice {
	pub fn new(adb: &Adb, serial: impl Into<String>) -> Self {
		let serial = serial.into();
		Self {
			adb: adb.for_device(serial.clone()),
			transport: Transport::from_serial(&serial),
			serial,
		}
	}

	pub fn adb(&self) -> &Adb {
		&self.adb
	}
}

#[async_trait]
impl Device for AdbDevice {
	fn serial(&self) -> &str {
		&self.serial
	}

	fn transport(&self) -> Transport {
		self.transport
	}

	async fn is_alive(&self) -> bool {
		let alive = self.adb.is_alive().await;
		debug!(target = "chatex.session", serial = %self.serial, alive, "device probe");
		alive
	}

	async fn force_stop(&self, package: &str) -> Result<()> {
		Ok(self.adb.force_stop(package).await?)
	}

	async fn launch(&self, package: &str, activity: &str) -> Result<()> {
		Ok(self.adb.start_activity(package, activity).await?)
	}

	async fn keep_awake(&self) -> Result<()> {
		Ok(self.adb.keep_awake().await?)
	}
}
