use chatex::{LockState, SessionStatus};

use super::stack::Stack;
use crate::cli::ConnectArgs;
use crate::config::ChatexConfig;
use crate::error::{CliError, Result};
use crate::output::{self, OutputFormat, ResultBuilder};
use crate::prompt::Prompter;

fn describe(status: &SessionStatus) -> String {
	let screen = if status.on_chat_list {
		"chat list"
	} else if status.in_app {
		"inside the app"
	} else {
		"outside the app"
	};
	let lock = match &status.lock {
		LockState::Unlocked => "unlocked".to_string(),
		LockState::Locked(reason) => format!("locked ({reason})"),
	};
	format!(
		"package:  {}\nactivity: {}\nscreen:   {screen}\nchats:    {} visible\ndevice:   {lock}",
		status.package, status.activity, status.visible_chats
	)
}

pub async fn run(args: ConnectArgs, config: &ChatexConfig, format: OutputFormat) -> Result<()> {
	let builder = ResultBuilder::new("status");
	let mut prompter = Prompter::terminal();
	let stack = Stack::open(config, &args, &mut prompter).await?;

	let status = tokio::select! {
		status = stack.session.status() => status.map_err(CliError::from),
		_ = tokio::signal::ctrl_c() => Err(CliError::Cancelled),
	};
	let capture = match (&status, config.diagnostics_dir(&args)) {
		(Ok(_), Some(dir)) => Some(stack.session.capture_ui_tree(&dir, "status").await),
		_ => None,
	};
	stack.close().await;

	let status = status?;
	match format {
		OutputFormat::Text => {
			println!("{}", describe(&status));
			if let Some(capture) = capture {
				println!("ui tree:  {}", capture?.display());
			}
		}
		OutputFormat::Json => output::print_json(&builder.data(status).build()),
	}
	Ok(())
}
