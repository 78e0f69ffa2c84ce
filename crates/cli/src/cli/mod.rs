#[cfg(test)]
mod tests;

use std::path::PathBuf;

use chatex::SortOrder;
use clap::{Args, Parser, Subcommand, ValueEnum};
use url::Url;

use crate::output::OutputFormat;
use crate::styles::cli_styles;

/// Export chats from an Android device to cloud storage, one conversation at a time.
#[derive(Parser, Debug)]
#[command(name = "chatex")]
#[command(about = "Batch chat exports driven through the device UI")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v debug, -vv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: text (default) or json
	#[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Config file (default: ~/.config/chatex/config.json)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Scan the chat list, pick chats and export them.
	Export(ExportArgs),
	/// List devices known to the device bridge.
	Devices,
	/// Connect and describe the foreground screen.
	Status(ConnectArgs),
	/// Inspect or remove the saved batch checkpoint.
	Checkpoint(CheckpointArgs),
}

/// How to reach the automation server and the device.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectArgs {
	/// Device serial; skips the device prompt.
	#[arg(long, value_name = "SERIAL")]
	pub device: Option<String>,

	/// Pair and connect a wireless device when none is attached.
	#[arg(long)]
	pub wireless_adb: bool,

	/// Automation server URL (overrides --host/--port).
	#[arg(long, value_name = "URL")]
	pub server_url: Option<Url>,

	/// Automation server host.
	#[arg(long, value_name = "HOST")]
	pub host: Option<String>,

	/// Automation server port.
	#[arg(long, value_name = "PORT")]
	pub port: Option<u16>,

	/// Assume the automation server is already running.
	#[arg(long)]
	pub skip_server: bool,

	/// Write UI trees here when a step fails.
	#[arg(long, value_name = "DIR")]
	pub diagnostics_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
	#[command(flatten)]
	pub connect: ConnectArgs,

	/// Stop the scan after N chats (bare flag: 10).
	#[arg(long, value_name = "N", num_args = 0..=1, default_missing_value = "10")]
	pub limit: Option<usize>,

	/// Order of the scanned list.
	#[arg(long, value_enum, default_value = "alphabetical")]
	pub sort: SortArg,

	/// Default the selection to every chat after the countdown.
	#[arg(long, conflicts_with = "range")]
	pub all: bool,

	/// Default the selection to these chats, e.g. "1-20" or "1,5,10-20".
	#[arg(long, value_name = "SPEC")]
	pub range: Option<String>,

	/// Export without media.
	#[arg(long)]
	pub without_media: bool,

	/// Skip chats whose export already exists in DIR.
	#[arg(long, value_name = "DIR")]
	pub resume: Option<String>,

	/// Destination folder passed to the post-export command.
	#[arg(long, value_name = "NAME")]
	pub folder: Option<String>,

	/// Run PROGRAM with `<chat> [folder]` after each successful export.
	#[arg(long, value_name = "PROGRAM")]
	pub post_export_cmd: Option<PathBuf>,

	/// Resume from a matching checkpoint without asking.
	#[arg(long, conflicts_with = "fresh")]
	pub resume_checkpoint: bool,

	/// Ignore and delete any saved checkpoint.
	#[arg(long)]
	pub fresh: bool,

	/// Reconnects allowed per operation after a session loss.
	#[arg(long, value_name = "N")]
	pub max_retries: Option<u32>,

	/// Checkpoint file location.
	#[arg(long, value_name = "FILE")]
	pub checkpoint: Option<PathBuf>,

	/// Seconds to wait for a selection before applying --all/--range.
	#[arg(long, value_name = "SECS", default_value_t = 30)]
	pub countdown: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
	#[default]
	Alphabetical,
	Original,
}

impl From<SortArg> for SortOrder {
	fn from(sort: SortArg) -> Self {
		match sort {
			SortArg::Alphabetical => SortOrder::Alphabetical,
			SortArg::Original => SortOrder::Original,
		}
	}
}

#[derive(Args, Debug, Clone)]
pub struct CheckpointArgs {
	/// Checkpoint file location.
	#[arg(long, global = true, value_name = "FILE")]
	pub path: Option<PathBuf>,

	#[command(subcommand)]
	pub action: CheckpointAction,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointAction {
	/// Print the saved checkpoint.
	Show,
	/// Delete the saved checkpoint.
	Clear,
}
