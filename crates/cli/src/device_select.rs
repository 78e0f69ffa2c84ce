//! Choosing the device to drive, pairing a wireless one if asked.

use async_trait::async_trait;
use chatex_runtime::bridge::{host_of, validate_pairing_code};
use chatex_runtime::{Adb, DeviceEntry};
use tracing::{info, warn};

use crate::error::{CliError, Result};
use crate::prompt::Prompter;

const DEFAULT_CONNECT_PORT: &str = "5555";

/// The parts of the device bridge device selection needs.
#[async_trait]
pub trait DeviceBridge: Send + Sync {
	/// Every attached device, whatever its state.
	async fn list(&self) -> chatex_runtime::Result<Vec<DeviceEntry>>;

	async fn pair(&self, address: &str, code: &str) -> chatex_runtime::Result<()>;

	/// Connect `address` and return the serial it is listed under.
	async fn connect(&self, address: &str) -> chatex_runtime::Result<String>;
}

#[async_trait]
impl DeviceBridge for Adb {
	async fn list(&self) -> chatex_runtime::Result<Vec<DeviceEntry>> {
		self.all_devices().await
	}

	async fn pair(&self, address: &str, code: &str) -> chatex_runtime::Result<()> {
		Adb::pair(self, address, code).await
	}

	async fn connect(&self, address: &str) -> chatex_runtime::Result<String> {
		let device = Adb::connect(self, address).await?;
		Ok(device.serial().unwrap_or(address).to_string())
	}
}

/// Pick a device serial.
///
/// `requested` skips every prompt. Otherwise one ready device is confirmed,
/// several are offered as a numbered list, and none is an error unless
/// `wireless` allows pairing a new one.
pub async fn select_device(bridge: &dyn DeviceBridge, prompter: &mut Prompter, requested: Option<&str>, wireless: bool) -> Result<String> {
	let devices = bridge.list().await?;

	if let Some(serial) = requested {
		return match devices.iter().find(|d| d.serial == serial) {
			Some(d) if d.is_ready() => Ok(serial.to_string()),
			Some(d) => Err(CliError::DeviceNotReady {
				serial: serial.to_string(),
				state: d.state.clone(),
			}),
			None if wireless && serial.contains(':') => Ok(bridge.connect(serial).await?),
			None => Err(CliError::DeviceNotReady {
				serial: serial.to_string(),
				state: "not attached".into(),
			}),
		};
	}

	for d in devices.iter().filter(|d| !d.is_ready()) {
		warn!(target = "chatex.cli", serial = %d.serial, state = %d.state, "ignoring device");
	}
	let ready: Vec<&DeviceEntry> = devices.iter().filter(|d| d.is_ready()).collect();

	match ready.as_slice() {
		[] if wireless => pair_wireless(bridge, prompter).await,
		[] => Err(CliError::NoDevices),
		[only] => {
			info!(target = "chatex.cli", serial = %only.serial, "device attached");
			if wireless {
				let question = format!("Device {} already connected. Still connect a wireless device?", only.serial);
				if prompter.confirm(&question, false).await {
					return pair_wireless(bridge, prompter).await;
				}
				Ok(only.serial.clone())
			} else if prompter.confirm(&format!("Use device {}?", only.serial), true).await {
				Ok(only.serial.clone())
			} else {
				Err(CliError::Cancelled)
			}
		}
		many => {
			prompter.say(&format!("Found {} devices:", many.len()));
			for (i, d) in many.iter().enumerate() {
				let kind = if d.is_wireless() { "wireless" } else { "usb" };
				prompter.say(&format!("  {}. {} ({kind})", i + 1, d.serial));
			}
			let new_choice = many.len() + 1;
			prompter.say(&format!("  {new_choice}. Connect a new wireless device"));
			loop {
				let answer = prompter.ask(&format!("Select device [1-{new_choice}]: ")).await.ok_or(CliError::Cancelled)?;
				match answer.parse::<usize>() {
					Ok(n) if n == new_choice => return pair_wireless(bridge, prompter).await,
					Ok(n) if (1..new_choice).contains(&n) => return Ok(many[n - 1].serial.clone()),
					_ => prompter.say(&format!("Enter a number between 1 and {new_choice}.")),
				}
			}
		}
	}
}

async fn ask_pairing(prompter: &mut Prompter) -> Result<(String, String)> {
	let address = prompter.ask("Enter pairing address (IP:PORT): ").await.ok_or(CliError::Cancelled)?;
	loop {
		let code = prompter.ask("Enter 6-digit pairing code: ").await.ok_or(CliError::Cancelled)?;
		if validate_pairing_code(&code) {
			return Ok((address, code));
		}
		prompter.say("Pairing code must be exactly 6 digits.");
	}
}

/// Pair, then connect on the port the user gives, retrying while they agree.
async fn pair_wireless(bridge: &dyn DeviceBridge, prompter: &mut Prompter) -> Result<String> {
	prompter.say("Wireless pairing: on the phone open Developer options > Wireless debugging > Pair device with pairing code.");
	loop {
		let (address, code) = ask_pairing(prompter).await?;
		if let Err(err) = bridge.pair(&address, &code).await {
			prompter.say(&format!("Pairing failed: {err}"));
			if prompter.confirm("Retry?", true).await {
				continue;
			}
			return Err(CliError::Cancelled);
		}

		let port = prompter
			.ask(&format!("Enter connect port shown under Wireless debugging [{DEFAULT_CONNECT_PORT}]: "))
			.await
			.ok_or(CliError::Cancelled)?;
		let port = if port.is_empty() { DEFAULT_CONNECT_PORT } else { port.as_str() };
		let target = format!("{}:{port}", host_of(&address));

		match bridge.connect(&target).await {
			Ok(serial) => {
				info!(target = "chatex.cli", serial = %serial, "wireless device connected");
				return Ok(serial);
			}
			Err(err) => {
				prompter.say(&format!("Connection failed: {err}"));
				if !prompter.confirm("Retry?", true).await {
					return Err(CliError::Cancelled);
				}
			}
		}
	}
}
