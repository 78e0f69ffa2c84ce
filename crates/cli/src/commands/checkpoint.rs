use serde_json::json;

use crate::cli::{CheckpointAction, CheckpointArgs};
use crate::config::ChatexConfig;
use crate::error::Result;
use crate::output::{self, OutputFormat, ResultBuilder};

pub fn run(args: CheckpointArgs, config: &ChatexConfig, format: OutputFormat) -> Result<()> {
	let store = config.checkpoint_store(args.path.as_deref());

	match args.action {
		CheckpointAction::Show => {
			let checkpoint = store.load();
			match format {
				OutputFormat::Text => match &checkpoint {
					Some(cp) => println!("{}\nResume at chat {}\nFile: {}", cp.describe(), cp.resume_index() + 1, store.path().display()),
					None => println!("No checkpoint at {}", store.path().display()),
				},
				OutputFormat::Json => {
					let data = json!({ "path": store.path(), "checkpoint": checkpoint });
					output::print_json(&ResultBuilder::new("checkpoint show").data(data).build());
				}
			}
		}
		CheckpointAction::Clear => {
			let existed = store.exists();
			store.clear()?;
			match format {
				OutputFormat::Text if existed => println!("Removed {}", store.path().display()),
				OutputFormat::Text => println!("No checkpoint at {}", store.path().display()),
				OutputFormat::Json => {
					let data = json!({ "path": store.path(), "removed": existed });
					output::print_json(&ResultBuilder::new("checkpoint clear").data(data).build());
				}
			}
		}
	}
	Ok(())
}
