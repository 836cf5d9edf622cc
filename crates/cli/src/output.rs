//! Rendering of command results and operation outcomes.

use colored::Colorize;
use sufm::CommandResult;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::ops::{ItemizedOutcome, OperationOutcome};

/// Prints the result of a raw `run` command.
pub fn render_run(result: &CommandResult, format: OutputFormat) -> Result<()> {
	match format {
		OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
		OutputFormat::Text => {
			for line in &result.stdout_lines {
				println!("{line}");
			}
			for line in &result.stderr_lines {
				eprintln!("{}", line.red());
			}
			if !result.success() {
				eprintln!("{}", format!("exit status {}", result.exit_status).yellow());
			}
		}
	}
	Ok(())
}

/// Prints an operation outcome.
pub fn render_outcome(outcome: &OperationOutcome, format: OutputFormat) -> Result<()> {
	match format {
		OutputFormat::Json => println!("{}", serde_json::to_string_pretty(outcome)?),
		OutputFormat::Text => match outcome {
			OperationOutcome::Delete(items) => report_items("deleted", items),
			OperationOutcome::Paste(items) => report_items("transferred", items),
			OperationOutcome::Rename(rename) => {
				println!("renamed {} -> {}", rename.from.display(), rename.to.display());
			}
			OperationOutcome::CreateFile(created) => {
				println!("created {}", created.path.display());
			}
			OperationOutcome::CreateDirectory(created) => {
				println!("created {}", created.path.display());
			}
		},
	}
	Ok(())
}

fn report_items(verb: &str, items: &ItemizedOutcome) {
	println!("{verb} {} item(s)", items.completed);
	for path in &items.failed {
		eprintln!("{}", format!("failed: {}", path.display()).red());
	}
	if !items.failed.is_empty() {
		eprintln!("{}", format!("{} item(s) failed", items.failed.len()).yellow());
	}
}
