use std::path::PathBuf;

use clap::Parser;

use super::*;

#[test]
fn parse_export_defaults() {
	let cli = Cli::try_parse_from(["chatex", "export"]).unwrap();

	assert_eq!(cli.verbose, 0);
	assert_eq!(cli.format, OutputFormat::Text);
	match cli.command {
		Commands::Export(args) => {
			assert_eq!(args.limit, None);
			assert_eq!(args.sort, SortArg::Alphabetical);
			assert!(!args.all);
			assert!(!args.without_media);
			assert_eq!(args.countdown, 30);
			assert!(!args.connect.skip_server);
		}
		_ => panic!("Expected Export command"),
	}
}

#[test]
fn bare_limit_defaults_to_ten() {
	let cli = Cli::try_parse_from(["chatex", "export", "--limit"]).unwrap();
	match cli.command {
		Commands::Export(args) => assert_eq!(args.limit, Some(10)),
		_ => panic!("Expected Export command"),
	}

	let cli = Cli::try_parse_from(["chatex", "export", "--limit", "25", "--sort", "original"]).unwrap();
	match cli.command {
		Commands::Export(args) => {
			assert_eq!(args.limit, Some(25));
			assert_eq!(SortOrder::from(args.sort), SortOrder::Original);
		}
		_ => panic!("Expected Export command"),
	}
}

#[test]
fn parse_export_connection_and_hooks() {
	let cli = Cli::try_parse_from([
		"chatex",
		"-vv",
		"-f",
		"json",
		"export",
		"--device",
		"192.168.1.20:5555",
		"--server-url",
		"http://10.0.0.2:4723/",
		"--skip-server",
		"--range",
		"1-5",
		"--resume",
		"~/Drive/exports",
		"--post-export-cmd",
		"/usr/local/bin/process-export",
		"--folder",
		"Archive",
		"--max-retries",
		"4",
	])
	.unwrap();

	assert_eq!(cli.verbose, 2);
	assert_eq!(cli.format, OutputFormat::Json);
	match cli.command {
		Commands::Export(args) => {
			assert_eq!(args.connect.device.as_deref(), Some("192.168.1.20:5555"));
			assert_eq!(args.connect.server_url.as_ref().map(Url::as_str), Some("http://10.0.0.2:4723/"));
			assert!(args.connect.skip_server);
			assert_eq!(args.range.as_deref(), Some("1-5"));
			assert_eq!(args.resume.as_deref(), Some("~/Drive/exports"));
			assert_eq!(args.post_export_cmd, Some(PathBuf::from("/usr/local/bin/process-export")));
			assert_eq!(args.folder.as_deref(), Some("Archive"));
			assert_eq!(args.max_retries, Some(4));
		}
		_ => panic!("Expected Export command"),
	}
}

#[test]
fn all_conflicts_with_range() {
	assert!(Cli::try_parse_from(["chatex", "export", "--all", "--range", "1-3"]).is_err());
}

#[test]
fn resume_checkpoint_conflicts_with_fresh() {
	assert!(Cli::try_parse_from(["chatex", "export", "--resume-checkpoint", "--fresh"]).is_err());
	assert!(Cli::try_parse_from(["chatex", "export", "--fresh"]).is_ok());
}

#[test]
fn invalid_server_url_rejected() {
	assert!(Cli::try_parse_from(["chatex", "status", "--server-url", "not a url"]).is_err());
}

#[test]
fn parse_checkpoint_subcommands() {
	let cli = Cli::try_parse_from(["chatex", "checkpoint", "show"]).unwrap();
	match cli.command {
		Commands::Checkpoint(args) => {
			assert_eq!(args.action, CheckpointAction::Show);
			assert_eq!(args.path, None);
		}
		_ => panic!("Expected Checkpoint command"),
	}

	let cli = Cli::try_parse_from(["chatex", "checkpoint", "clear", "--path", "/tmp/cp.json"]).unwrap();
	match cli.command {
		Commands::Checkpoint(args) => {
			assert_eq!(args.action, CheckpointAction::Clear);
			assert_eq!(args.path, Some(PathBuf::from("/tmp/cp.json")));
		}
		_ => panic!("Expected Checkpoint command"),
	}
}

#[test]
fn global_flags_after_subcommand() {
	let cli = Cli::try_parse_from(["chatex", "devices", "-v", "--config", "/tmp/chatex.json"]).unwrap();
	assert!(matches!(cli.command, Commands::Devices));
	assert_eq!(cli.verbose, 1);
	assert_eq!(cli.config, Some(PathBuf::from("/tmp/chatex.json")));
}
