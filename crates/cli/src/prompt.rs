//! Line prompts on the terminal, optionally racing a countdown.
//!
//! Stdin is read on a dedicated thread and handed over a channel so a prompt
//! can be abandoned when its countdown runs out.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use tokio::sync::mpsc;

/// How a countdown prompt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
	Line(String),
	TimedOut,
	/// Input closed (EOF).
	Closed,
}

pub struct Prompter {
	lines: mpsc::UnboundedReceiver<String>,
	out: Box<dyn Write + Send>,
	tick: Duration,
}

impl std::fmt::Debug for Prompter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Prompter").field("tick", &self.tick).finish_non_exhaustive()
	}
}

impl Prompter {
	/// Prompts on stderr, answers from stdin.
	pub fn terminal() -> Self {
		let (tx, rx) = mpsc::unbounded_channel();
		std::thread::spawn(move || {
			for line in io::stdin().lock().lines() {
				let Ok(line) = line else { break };
				if tx.send(line).is_err() {
					break;
				}
			}
		});
		Self::with_channel(rx, Box::new(io::stderr()))
	}

	pub fn with_channel(lines: mpsc::UnboundedReceiver<String>, out: Box<dyn Write + Send>) -> Self {
		Self {
			lines,
			out,
			tick: Duration::from_secs(1),
		}
	}

	/// Answers `lines` in order, then reports EOF.
	pub fn scripted<I, S>(lines: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let (tx, rx) = mpsc::unbounded_channel();
		for line in lines {
			let _ = tx.send(line.into());
		}
		Self::with_channel(rx, Box::new(io::sink()))
	}

	/// Length of one countdown step.
	pub fn with_tick(mut self, tick: Duration) -> Self {
		self.tick = tick;
		self
	}

	/// Print without a prompt.
	pub fn say(&mut self, text: &str) {
		let _ = writeln!(self.out, "{text}");
	}

	/// Ask and wait for one line; `None` on EOF.
	pub async fn ask(&mut self, question: &str) -> Option<String> {
		let _ = write!(self.out, "{question}");
		let _ = self.out.flush();
		self.lines.recv().await.map(|line| line.trim().to_string())
	}

	/// Yes/no question; empty input or EOF means `default`.
	pub async fn confirm(&mut self, question: &str, default: bool) -> bool {
		let suffix = if default { "[Y/n]" } else { "[y/N]" };
		match self.ask(&format!("{question} {suffix}: ")).await {
			Some(answer) => match answer.to_lowercase().as_str() {
				"y" | "yes" => true,
				"n" | "no" => false,
				_ => default,
			},
			None => default,
		}
	}

	/// Ask, redrawing the seconds left until `default_label` applies.
	pub async fn ask_with_countdown(&mut self, question: &str, seconds: u64, default_label: &str) -> Answer {
		let _ = writeln!(self.out, "{question}");
		let mut remaining = seconds;
		let mut ticker = tokio::time::interval(self.tick);
		ticker.tick().await;
		loop {
			let _ = write!(self.out, "\r{remaining:2}s remaining (will default to {default_label} if no input)... ");
			let _ = self.out.flush();
			if remaining == 0 {
				let _ = writeln!(self.out);
				return Answer::TimedOut;
			}
			tokio::select! {
				line = self.lines.recv() => {
					let _ = writeln!(self.out);
					return match line {
						Some(line) => Answer::Line(line.trim().to_string()),
						None => Answer::Closed,
					};
				}
				_ = ticker.tick() => remaining -= 1,
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn scripted_answers_then_eof() {
		let mut prompter = Prompter::scripted(["  3-5 ", "y"]);
		assert_eq!(prompter.ask("pick: ").await.as_deref(), Some("3-5"));
		assert!(prompter.confirm("resume?", false).await);
		assert_eq!(prompter.ask("again: ").await, None);
		assert!(!prompter.confirm("resume?", false).await);
		assert!(prompter.confirm("use it?", true).await);
	}

	#[tokio::test]
	async fn countdown_returns_typed_line() {
		let mut prompter = Prompter::scripted(["all"]).with_tick(Duration::from_millis(5));
		assert_eq!(prompter.ask_with_countdown("pick", 30, "all").await, Answer::Line("all".into()));
	}

	#[tokio::test]
	async fn countdown_expires_without_input() {
		let (tx, rx) = mpsc::unbounded_channel::<String>();
		let mut prompter = Prompter::with_channel(rx, Box::new(io::sink())).with_tick(Duration::from_millis(5));
		assert_eq!(prompter.ask_with_countdown("pick", 3, "1-5").await, Answer::TimedOut);
		drop(tx);
	}

	#[tokio::test]
	async fn countdown_reports_closed_input() {
		let mut prompter = Prompter::scripted(Vec::<String>::new()).with_tick(Duration::from_millis(5));
		assert_eq!(prompter.ask_with_countdown("pick", 30, "all").await, Answer::Closed);
	}
}
