//! Subcommand implementations.

mod checkpoint;
mod devices;
mod export;
mod stack;
mod status;

use crate::cli::{Cli, Commands};
use crate::config::ChatexConfig;
use crate::error::Result;
use crate::output::OutputFormat;

pub async fn dispatch(cli: Cli, format: OutputFormat) -> Result<()> {
	let config = ChatexConfig::load(cli.config.as_deref())?;

	match cli.command {
		Commands::Export(args) => export::run(args, &config, format).await,
		Commands::Devices => devices::run(format).await,
		Commands::Status(args) => status::run(args, &config, format).await,
		Commands::Checkpoint(args) => checkpoint::run(args, &config, format),
	}
}
