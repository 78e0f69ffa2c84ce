//! Resume-folder lookups: has this chat already been exported?

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::profile::AppProfile;

/// Normalize and validate a user-supplied resume directory.
///
/// Trims whitespace and surrounding quotes and expands a leading `~`.
pub fn validate_resume_dir(raw: &str) -> Result<PathBuf> {
	let trimmed = raw.trim().trim_matches(|c| c == '"' || c == '\'');
	if trimmed.is_empty() {
		return Err(Error::InvalidArgument("resume directory is empty".into()));
	}
	let path = expand_home(trimmed);
	if !path.exists() {
		return Err(Error::InvalidArgument(format!("resume directory {} does not exist", path.display())));
	}
	if !path.is_dir() {
		return Err(Error::InvalidArgument(format!("{} is not a directory", path.display())));
	}
	fs::read_dir(&path).map_err(|err| Error::InvalidArgument(format!("{} is not readable: {err}", path.display())))?;
	Ok(path)
}

fn expand_home(path: &str) -> PathBuf {
	match path.strip_prefix('~') {
		Some(rest) if rest.is_empty() || rest.starts_with('/') => match dirs::home_dir() {
			Some(home) => home.join(rest.trim_start_matches('/')),
			None => PathBuf::from(path),
		},
		_ => PathBuf::from(path),
	}
}

/// Entries of `listing` naming an export of `chat`: `"<prefix> <chat>"`, bare or with `suffix`.
pub fn matching_entries<'a, I>(listing: I, prefix: &str, chat: &str, suffix: &str) -> Vec<String>
where
	I: IntoIterator<Item = &'a str>,
{
	let base = format!("{prefix} {chat}");
	let archive = format!("{base}{suffix}");
	listing.into_iter().filter(|entry| *entry == base || *entry == archive).map(str::to_string).collect()
}

/// A directory holding previously exported archives.
#[derive(Debug, Clone)]
pub struct ResumeFolder {
	root: PathBuf,
	prefix: String,
	suffix: String,
}

impl ResumeFolder {
	pub fn new(root: impl Into<PathBuf>, profile: &AppProfile) -> Self {
		Self {
			root: root.into(),
			prefix: profile.export_prefix.clone(),
			suffix: profile.archive_suffix.clone(),
		}
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Whether `chat` was already exported, and the entries that say so.
	///
	/// An unreadable folder counts as "not exported".
	pub fn check(&self, chat: &str) -> (bool, Vec<String>) {
		let entries = match fs::read_dir(&self.root) {
			Ok(entries) => entries,
			Err(err) => {
				warn!(target = "chatex.batch", root = %self.root.display(), error = %err, "resume folder unreadable");
				return (false, Vec::new());
			}
		};
		let names: Vec<String> = entries.filter_map(|e| e.ok()).filter_map(|e| e.file_name().into_string().ok()).collect();
		let mut found = matching_entries(names.iter().map(String::as_str), &self.prefix, chat, &self.suffix);
		found.sort();
		if !found.is_empty() {
			debug!(target = "chatex.batch", chat = %chat, entries = ?found, "already exported");
		}
		(!found.is_empty(), found)
	}
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn matches_bare_and_archived_names_only() {
		let listing = ["Export prefix Bob", "Export prefix Bob.zip", "Export prefix Bobby.zip", "Bob.zip"];
		assert_eq!(matching_entries(listing, "Export prefix", "Bob", ".zip"), vec!["Export prefix Bob", "Export prefix Bob.zip"]);
		assert!(matching_entries(listing, "Export prefix", "Alice", ".zip").is_empty());
	}

	#[test]
	fn folder_check_reports_entries() {
		let dir = TempDir::new().unwrap();
		fs::create_dir(dir.path().join("WhatsApp Chat with Bob")).unwrap();
		fs::write(dir.path().join("WhatsApp Chat with Bob.zip"), b"").unwrap();
		let folder = ResumeFolder::new(dir.path(), &AppProfile::default());

		assert_eq!(folder.check("Bob"), (true, vec!["WhatsApp Chat with Bob".to_string(), "WhatsApp Chat with Bob.zip".to_string()]));
		assert_eq!(folder.check("Alice"), (false, vec![]));
	}

	#[test]
	fn missing_folder_is_not_exported() {
		let folder = ResumeFolder::new("/nonexistent/chatex-resume", &AppProfile::default());
		assert_eq!(folder.check("Bob"), (false, vec![]));
	}

	#[test]
	fn validate_strips_quotes_and_rejects_files() {
		let dir = TempDir::new().unwrap();
		let quoted = format!("  \"{}\"  ", dir.path().display());
		assert_eq!(validate_resume_dir(&quoted).unwrap(), dir.path());

		let file = dir.path().join("file.txt");
		fs::write(&file, b"x").unwrap();
		assert!(validate_resume_dir(file.to_str().unwrap()).is_err());
		assert!(validate_resume_dir("   ").is_err());
		assert!(validate_resume_dir("/nonexistent/chatex-resume").is_err());
	}
}
