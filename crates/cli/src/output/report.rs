use std::fmt::Write;
use std::time::Duration;

use chatex::{BatchReport, ExportStatus};
use colored::{ColoredString, Colorize};

const RULE: &str = "============================================================";

/// `12.3s`, `4m 5.0s` or `1h 2m 3.0s`.
pub fn format_elapsed(duration: Duration) -> String {
	let seconds = duration.as_secs_f64();
	if seconds < 60.0 {
		format!("{seconds:.1}s")
	} else if seconds < 3600.0 {
		let minutes = (seconds / 60.0) as u64;
		format!("{minutes}m {:.1}s", seconds % 60.0)
	} else {
		let hours = (seconds / 3600.0) as u64;
		let minutes = ((seconds % 3600.0) / 60.0) as u64;
		format!("{hours}h {minutes}m {:.1}s", seconds % 60.0)
	}
}

/// Numbered listing shown before the selection prompt.
pub fn render_chat_list(names: &[String]) -> String {
	let mut out = String::new();
	let _ = writeln!(out, "\nFound {} chats:", names.len());
	let width = names.len().to_string().len();
	for (i, name) in names.iter().enumerate() {
		let _ = writeln!(out, "  {:>width$}. {name}", i + 1);
	}
	out
}

fn paint(status: ExportStatus, text: &str) -> ColoredString {
	match status {
		ExportStatus::Exported => text.green(),
		ExportStatus::Failed => text.red(),
		_ => text.yellow(),
	}
}

fn heading(out: &mut String, title: &str) {
	let _ = writeln!(out, "\n{RULE}\n{}\n{RULE}", title.bold());
}

/// Final statistics, timing summary and per-chat results (sorted by name).
pub fn render_report(report: &BatchReport) -> String {
	let summary = report.summary();
	let mut out = String::new();

	heading(&mut out, "FINAL STATISTICS");
	let rows = [
		(ExportStatus::Exported, "Exported", summary.exported),
		(ExportStatus::SkippedAlreadyExists, "Skipped (already exists)", summary.skipped_already_exists),
		(ExportStatus::SkippedNoExportOption, "Skipped (no export option)", summary.skipped_no_export_option),
		(ExportStatus::SkippedPrivacyRestricted, "Skipped (privacy restricted)", summary.skipped_privacy_restricted),
		(ExportStatus::Failed, "Failed", summary.failed),
	];
	for (status, label, count) in rows {
		let _ = writeln!(out, "{:<30}{}", format!("{label}:"), paint(status, &count.to_string()));
	}
	let _ = writeln!(out, "{:<30}{}", "Total processed:", report.outcomes.len());
	if let Some(reason) = &report.aborted {
		let _ = writeln!(out, "{} {reason}", "Stopped early:".red().bold());
	}

	heading(&mut out, "TIMING SUMMARY");
	let _ = writeln!(out, "{:<30}{}", "Total time:", format_elapsed(report.elapsed));
	if let Some(timing) = summary.timing {
		let _ = writeln!(out, "{:<30}{}", "Export time:", format_elapsed(timing.total));
		let _ = writeln!(out, "{:<30}{}", "Average per chat:", format_elapsed(timing.average));
		if summary.exported > 1 {
			let _ = writeln!(out, "{:<30}{}", "Fastest:", format_elapsed(timing.fastest));
			let _ = writeln!(out, "{:<30}{}", "Slowest:", format_elapsed(timing.slowest));
		}
	}

	if !report.outcomes.is_empty() {
		heading(&mut out, "RESULTS BY CHAT");
		let mut outcomes: Vec<_> = report.outcomes.iter().collect();
		outcomes.sort_by(|a, b| a.chat.cmp(&b.chat));
		for outcome in outcomes {
			let mark = match outcome.status {
				ExportStatus::Exported => "✓",
				ExportStatus::Failed => "✗",
				_ => "-",
			};
			let _ = write!(
				out,
				"{} {} {}",
				paint(outcome.status, mark),
				outcome.chat,
				paint(outcome.status, outcome.status.label()),
			);
			if outcome.status == ExportStatus::Exported {
				let _ = write!(out, " ({})", format_elapsed(outcome.elapsed));
			}
			let _ = writeln!(out);
			if let Some(error) = &outcome.error {
				let _ = writeln!(out, "    {}", error.dimmed());
			}
			if let Some(hook) = &outcome.hook {
				match (&hook.output_path, hook.success) {
					(Some(path), true) => {
						let _ = writeln!(out, "    processed: {}", path.display());
					}
					(None, true) => {}
					(_, false) => {
						let _ = writeln!(out, "    {} {}", "post-export failed:".red(), hook.errors.join("; "));
					}
				}
			}
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use std::path::PathBuf;

	use chatex::{ExportOutcome, HookOutcome};

	use super::*;

	fn outcome(chat: &str, status: ExportStatus, secs: u64) -> ExportOutcome {
		ExportOutcome {
			chat: chat.into(),
			status,
			elapsed: Duration::from_secs(secs),
			error: None,
			hook: None,
		}
	}

	#[test]
	fn elapsed_formats() {
		assert_eq!(format_elapsed(Duration::from_millis(12_340)), "12.3s");
		assert_eq!(format_elapsed(Duration::from_secs(245)), "4m 5.0s");
		assert_eq!(format_elapsed(Duration::from_secs(3723)), "1h 2m 3.0s");
		assert_eq!(format_elapsed(Duration::ZERO), "0.0s");
	}

	#[test]
	fn chat_list_is_numbered_from_one() {
		let text = render_chat_list(&["Alice".into(), "Bob".into()]);
		assert!(text.contains("Found 2 chats"));
		assert!(text.contains("1. Alice"));
		assert!(text.contains("2. Bob"));
	}

	#[test]
	fn report_sections_and_order() {
		let mut failed = outcome("Carol", ExportStatus::Failed, 0);
		failed.error = Some("Export step 'open_menu' failed: no menu".into());
		let mut bob = outcome("Bob", ExportStatus::Exported, 20);
		bob.hook = Some(HookOutcome::ok(Some(PathBuf::from("/out/Bob"))));
		let report = BatchReport {
			outcomes: vec![failed, bob, outcome("Alice", ExportStatus::Exported, 10), outcome("Dave", ExportStatus::SkippedAlreadyExists, 0)],
			elapsed: Duration::from_secs(95),
			aborted: None,
			checkpoint: None,
		};

		let text = render_report(&report);
		assert!(text.contains("FINAL STATISTICS"));
		assert!(text.contains("TIMING SUMMARY"));
		assert!(text.contains("Total time:"));
		assert!(text.contains("1m 35.0s"));
		assert!(text.contains("Average per chat:"));
		assert!(text.contains("15.0s"));
		assert!(text.contains("Fastest:"));
		assert!(text.contains("open_menu"));
		assert!(text.contains("processed: /out/Bob"));

		let alice = text.find("Alice").unwrap();
		let bob = text.rfind("Bob").unwrap();
		let carol = text.find("Carol").unwrap();
		assert!(alice < bob && bob < carol);
	}

	#[test]
	fn single_export_has_no_fastest_line() {
		let report = BatchReport {
			outcomes: vec![outcome("Alice", ExportStatus::Exported, 10)],
			elapsed: Duration::from_secs(12),
			aborted: Some("device locked".into()),
			checkpoint: None,
		};
		let text = render_report(&report);
		assert!(!text.contains("Fastest:"));
		assert!(text.contains("device locked"));
	}
}
