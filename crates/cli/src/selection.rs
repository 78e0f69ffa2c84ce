//! Parsing of chat selections like `all`, `3`, `1,5,10-20`.

use crate::error::{CliError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
	All,
	Quit,
	/// Zero-based indices into the scanned list, in the order given.
	Indices(Vec<usize>),
}

impl Selection {
	/// Names picked from `chats`.
	pub fn pick(&self, chats: &[String]) -> Vec<String> {
		match self {
			Selection::All => chats.to_vec(),
			Selection::Quit => Vec::new(),
			Selection::Indices(indices) => indices.iter().filter_map(|&i| chats.get(i).cloned()).collect(),
		}
	}
}

/// A parsed selection plus warnings about ignored parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
	pub selection: Selection,
	pub warnings: Vec<String>,
}

fn number(raw: &str) -> Result<usize> {
	raw.trim().parse().map_err(|_| CliError::Selection(format!("'{}' is not a number", raw.trim())))
}

/// Parse `input` against a list of `total` chats (1-based on input).
///
/// Duplicates collapse to their first occurrence and out-of-range indices are
/// dropped with a warning. Empty input quits.
pub fn parse_selection(input: &str, total: usize) -> Result<Parsed> {
	let input = input.trim().to_lowercase();
	let mut warnings = Vec::new();
	match input.as_str() {
		"" => {
			warnings.push("No selection entered".to_string());
			return Ok(Parsed {
				selection: Selection::Quit,
				warnings,
			});
		}
		"q" | "quit" | "exit" => {
			return Ok(Parsed {
				selection: Selection::Quit,
				warnings,
			});
		}
		"all" => {
			return Ok(Parsed {
				selection: Selection::All,
				warnings,
			});
		}
		_ => {}
	}

	let mut wanted = Vec::new();
	for part in input.split(',').map(str::trim) {
		if part.contains('-') {
			let bounds: Vec<&str> = part.split('-').collect();
			let [start, end] = bounds.as_slice() else {
				return Err(CliError::Selection(format!("invalid range format: {part}")));
			};
			let (start, end) = (number(start)?, number(end)?);
			if start > end {
				return Err(CliError::Selection(format!("invalid range: start ({start}) must be <= end ({end})")));
			}
			wanted.extend(start..=end);
		} else {
			wanted.push(number(part)?);
		}
	}

	let mut seen = Vec::with_capacity(wanted.len());
	let mut indices = Vec::new();
	for idx in wanted {
		if seen.contains(&idx) {
			continue;
		}
		seen.push(idx);
		if (1..=total).contains(&idx) {
			indices.push(idx - 1);
		} else {
			warnings.push(format!("Invalid index: {idx}"));
		}
	}

	Ok(Parsed {
		selection: Selection::Indices(indices),
		warnings,
	})
}

/// Largest 1-based index a range string refers to, for widening `--limit`.
pub fn range_max_index(spec: &str) -> Option<usize> {
	let spec = spec.trim();
	if spec.is_empty() || spec.eq_ignore_ascii_case("all") {
		return None;
	}
	let mut max = 0;
	for part in spec.split(',').map(str::trim) {
		let last = match part.split_once('-') {
			Some((_, end)) => end,
			None => part,
		};
		max = max.max(last.trim().parse::<usize>().ok()?);
	}
	(max > 0).then_some(max)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn indices(input: &str, total: usize) -> Vec<usize> {
		match parse_selection(input, total).unwrap().selection {
			Selection::Indices(i) => i,
			other => panic!("expected indices, got {other:?}"),
		}
	}

	#[test]
	fn keywords() {
		assert_eq!(parse_selection(" ALL ", 3).unwrap().selection, Selection::All);
		for quit in ["q", "quit", "Exit"] {
			assert_eq!(parse_selection(quit, 3).unwrap().selection, Selection::Quit);
		}
		let empty = parse_selection("   ", 3).unwrap();
		assert_eq!(empty.selection, Selection::Quit);
		assert_eq!(empty.warnings.len(), 1);
	}

	#[test]
	fn ranges_and_singles_keep_order_without_duplicates() {
		assert_eq!(indices("3, 1-2, 2, 3", 5), vec![2, 0, 1]);
		assert_eq!(indices("10-12", 20), vec![9, 10, 11]);
	}

	#[test]
	fn out_of_range_is_warned_and_dropped() {
		let parsed = parse_selection("0,2,9", 3).unwrap();
		assert_eq!(parsed.selection, Selection::Indices(vec![1]));
		assert_eq!(parsed.warnings, vec!["Invalid index: 0", "Invalid index: 9"]);
	}

	#[test]
	fn malformed_input_is_an_error() {
		assert!(parse_selection("5-2", 10).is_err());
		assert!(parse_selection("1-2-3", 10).is_err());
		assert!(parse_selection("one", 10).is_err());
		assert!(parse_selection("1,,2", 10).is_err());
	}

	#[test]
	fn pick_maps_indices_to_names() {
		let chats: Vec<String> = ["Alice", "Bob", "Carol"].map(String::from).to_vec();
		assert_eq!(Selection::Indices(vec![2, 0]).pick(&chats), vec!["Carol", "Alice"]);
		assert_eq!(Selection::All.pick(&chats), chats);
		assert!(Selection::Quit.pick(&chats).is_empty());
	}

	#[test]
	fn max_index_of_ranges() {
		assert_eq!(range_max_index("3"), Some(3));
		assert_eq!(range_max_index("1,5,10-20,30"), Some(30));
		assert_eq!(range_max_index("100-200"), Some(200));
		assert_eq!(range_max_index("all"), None);
		assert_eq!(range_max_index(""), None);
		assert_eq!(range_max_index("x-y"), None);
		assert_eq!(range_max_index("0"), None);
	}
}
