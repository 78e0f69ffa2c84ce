//! `chatex export`: scan, select, export, report.

use chatex::{
	BatchReport, BatchRunner, ChatList, CheckpointStore, DEFAULT_MAX_RETRIES, ExportTask, ExportWorkflow, PostExportHook, ResumeFolder,
	SortOrder, validate_resume_dir,
};
use tracing::{info, warn};

use super::stack::Stack;
use crate::cli::ExportArgs;
use crate::config::ChatexConfig;
use crate::error::{CliError, Result};
use crate::hook::CommandHook;
use crate::output::{self, OutputFormat, ResultBuilder, render_chat_list, render_report};
use crate::prompt::{Answer, Prompter};
use crate::selection::{Selection, parse_selection, range_max_index};

/// Scan limit after reconciling `--limit` with `--range`.
///
/// A range needs the list scanned at least up to its highest index, so it wins.
pub fn effective_limit(limit: Option<usize>, range: Option<&str>) -> Option<usize> {
	match range.and_then(range_max_index) {
		Some(max) => {
			if let Some(limit) = limit {
				warn!(target = "chatex.cli", limit, range_max = max, "--limit ignored because --range was given");
			}
			Some(max)
		}
		None => limit,
	}
}

/// Ask which chats to export. `None` means the user quit.
pub async fn choose_chats(prompter: &mut Prompter, chats: &[String], args: &ExportArgs) -> Result<Option<Vec<String>>> {
	prompter.say("Enter chat numbers (e.g. 1,5,10-20), 'all', or 'q' to quit.");
	let default = if args.all { Some("all") } else { args.range.as_deref() };

	let input = match default {
		Some(default) => match prompter.ask_with_countdown("Selection:", args.countdown, default).await {
			Answer::Line(line) if !line.is_empty() => line,
			Answer::Line(_) | Answer::TimedOut | Answer::Closed => {
				info!(target = "chatex.cli", default, "no selection typed; using default");
				default.to_string()
			}
		},
		None => prompter.ask("Selection: ").await.unwrap_or_default(),
	};

	let parsed = parse_selection(&input, chats.len())?;
	for warning in &parsed.warnings {
		warn!(target = "chatex.cli", "{warning}");
	}
	if parsed.selection == Selection::Quit {
		return Ok(None);
	}
	let picked = parsed.selection.pick(chats);
	if picked.is_empty() {
		return Err(CliError::Selection("no chats selected".into()));
	}
	Ok(Some(picked))
}

/// Index to start from, honouring `--fresh` and `--resume-checkpoint`.
pub async fn resume_point(store: &CheckpointStore, selected: &[String], args: &ExportArgs, prompter: &mut Prompter) -> Result<usize> {
	if args.fresh {
		store.clear()?;
		return Ok(0);
	}
	let Some(checkpoint) = store.load() else {
		return Ok(0);
	};
	if !checkpoint.matches(selected) {
		warn!(target = "chatex.cli", path = %store.path().display(), "checkpoint belongs to a different selection; starting over");
		return Ok(0);
	}

	prompter.say(&checkpoint.describe());
	let resume = args.resume_checkpoint || prompter.confirm(&format!("Resume from chat {}?", checkpoint.resume_index() + 1), true).await;
	if resume {
		info!(target = "chatex.cli", index = checkpoint.resume_index(), "resuming from checkpoint");
		Ok(checkpoint.resume_index())
	} else {
		Ok(0)
	}
}

pub async fn run(args: ExportArgs, config: &ChatexConfig, format: OutputFormat) -> Result<()> {
	let builder = ResultBuilder::new("export");
	let resume_folder = match args.resume.as_deref() {
		Some(raw) => Some(ResumeFolder::new(validate_resume_dir(raw)?, &config.app)),
		None => None,
	};

	let mut prompter = Prompter::terminal();
	let mut stack = Stack::open(config, &args.connect, &mut prompter).await?;
	let report = tokio::select! {
		report = export(&mut stack, &args, config, resume_folder, &mut prompter) => report,
		_ = tokio::signal::ctrl_c() => {
			warn!(target = "chatex.cli", "interrupted; progress up to the last exported chat is in the checkpoint");
			Err(CliError::Cancelled)
		}
	};
	stack.close().await;

	let Some(report) = report? else {
		return Ok(());
	};
	match format {
		OutputFormat::Text => print!("{}", render_report(&report)),
		OutputFormat::Json => {
			let data = serde_json::json!({ "summary": report.summary(), "report": &report });
			output::print_json(&builder.data(data).build());
		}
	}
	if report.is_complete() {
		Ok(())
	} else {
		Err(CliError::OutputAlreadyPrinted)
	}
}

async fn export(
	stack: &mut Stack,
	args: &ExportArgs,
	config: &ChatexConfig,
	resume_folder: Option<ResumeFolder>,
	prompter: &mut Prompter,
) -> Result<Option<BatchReport>> {
	let max_retries = args.max_retries.or(config.max_retries).unwrap_or(DEFAULT_MAX_RETRIES);
	let limit = effective_limit(args.limit, args.range.as_deref());
	let order = SortOrder::from(args.sort);
	let chats = ChatList::new(stack.ctx.clone(), config.scan);

	info!(target = "chatex.cli", ?limit, ?order, "scanning chat list");
	let names = stack
		.session
		.safe_call("scan", max_retries, |ui| {
			let chats = &chats;
			Box::pin(async move { chats.full_scan(ui.as_ref(), limit, order).await })
		})
		.await?;
	if names.is_empty() {
		warn!(target = "chatex.cli", "no chats found");
		return Ok(None);
	}
	prompter.say(&render_chat_list(&names));

	let Some(selected) = choose_chats(prompter, &names, args).await? else {
		info!(target = "chatex.cli", "quit at selection");
		return Ok(None);
	};

	let store = config.checkpoint_store(args.checkpoint.as_deref());
	let start = resume_point(&store, &selected, args, prompter).await?;

	let include_media = !args.without_media;
	let tasks: Vec<ExportTask> = selected
		.iter()
		.map(|chat| ExportTask::new(chat.clone(), include_media).with_folder(args.folder.clone()))
		.collect();
	info!(
		target = "chatex.cli",
		count = tasks.len() - start.min(tasks.len()),
		media = include_media,
		"exporting {} chat(s)",
		tasks.len()
	);

	let hook = args.post_export_cmd.as_ref().map(|p| Box::new(CommandHook::new(p)) as Box<dyn PostExportHook>);
	let workflow = ExportWorkflow::new(stack.ctx.clone()).with_diagnostics(config.diagnostics_dir(&args.connect));
	let runner = BatchRunner::new(chats, workflow)
		.with_checkpoint(Some(store))
		.with_hook(hook)
		.with_resume_folder(resume_folder)
		.with_max_retries(max_retries);

	Ok(Some(runner.run(&mut stack.session, &tasks, start).await))
}
