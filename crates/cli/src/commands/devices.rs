use chatex_runtime::{Adb, DeviceEntry};
use colored::Colorize;
use serde::Serialize;

use crate::error::Result;
use crate::output::{self, OutputFormat, ResultBuilder};

#[derive(Debug, Serialize)]
struct DeviceRow {
	serial: String,
	state: String,
	ready: bool,
	wireless: bool,
}

impl From<DeviceEntry> for DeviceRow {
	fn from(entry: DeviceEntry) -> Self {
		Self {
			ready: entry.is_ready(),
			wireless: entry.is_wireless(),
			serial: entry.serial,
			state: entry.state,
		}
	}
}

pub async fn run(format: OutputFormat) -> Result<()> {
	let builder = ResultBuilder::new("devices");
	let adb = Adb::locate()?;
	let rows: Vec<DeviceRow> = adb.all_devices().await?.into_iter().map(DeviceRow::from).collect();

	match format {
		OutputFormat::Text => {
			if rows.is_empty() {
				println!("No devices attached.");
			}
			for row in &rows {
				let kind = if row.wireless { "wireless" } else { "usb" };
				let state = if row.ready { row.state.green() } else { row.state.yellow() };
				println!("{:<28} {:<14} {kind}", row.serial, state);
			}
		}
		OutputFormat::Json => output::print_json(&builder.data(rows).build()),
	}
	Ok(())
}
