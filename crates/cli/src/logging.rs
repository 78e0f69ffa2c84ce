use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Filter directive for a `-v` count. `RUST_LOG` takes precedence.
pub fn default_filter(verbosity: u8) -> &'static str {
	// 0 = progress lines from the engine only
	// 1 (-v) = debug for the engine, including resolver strategy attempts
	// 2+ (-vv) = everything, wire traffic included
	match verbosity {
		0 => "warn,chatex=info,chatex_cli=info",
		1 => "info,chatex=debug,chatex_cli=debug",
		_ => "trace",
	}
}

pub fn init_logging(verbosity: u8) {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn verbosity_widens_filter() {
		assert!(default_filter(0).starts_with("warn"));
		assert!(default_filter(1).contains("chatex=debug"));
		assert_eq!(default_filter(2), "trace");
		assert_eq!(default_filter(9), "trace");
	}
}
