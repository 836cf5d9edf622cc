//! Shell-backed executor: file operations expressed as toolbox commands
//! run inside the shared session.

use std::path::Path;

use anyhow::anyhow;
use sufm::{CommandRequest, CommandResult, SessionLease};
use tracing::debug;

use super::{FileOperation, ItemizedOutcome, OperationOutcome, PasteMode, PathOutcome, RenameOutcome};
use crate::error::{CliError, Result};

/// Executes `op` inside the leased session.
///
/// Session-level failures propagate so the caller can decide about retry
/// and fallback; a command that merely exits non-zero is recorded against
/// its item (multi-item operations) or reported as the operation's error
/// (single-item ones).
pub async fn execute(
	lease: &SessionLease,
	prefix: Option<&Path>,
	op: &FileOperation,
) -> Result<OperationOutcome> {
	match op {
		FileOperation::Delete { targets } => {
			let mut outcome = ItemizedOutcome::default();
			for target in targets {
				let ok = run_item(lease, argv(prefix, &["rm", "-rf", "--"], &[target])).await?;
				outcome.record(target, ok);
			}
			Ok(OperationOutcome::Delete(outcome))
		}
		FileOperation::Paste { sources, destination, mode } => {
			let parts: &[&str] = match mode {
				PasteMode::Copy => &["cp", "-rf", "--"],
				PasteMode::Move => &["mv", "-f", "--"],
			};
			let mut outcome = ItemizedOutcome::default();
			for source in sources {
				let ok = run_item(lease, argv(prefix, parts, &[source, destination])).await?;
				outcome.record(source, ok);
			}
			Ok(OperationOutcome::Paste(outcome))
		}
		FileOperation::Rename { source, new_name } => {
			let to = super::rename_target(source, new_name)?;
			let result = run_command(lease, argv(prefix, &["mv", "-f", "--"], &[source, &to])).await?;
			ensure_success("rename", &result)?;
			Ok(OperationOutcome::Rename(RenameOutcome { from: source.clone(), to }))
		}
		FileOperation::CreateFile { path } => {
			let result = run_command(lease, argv(prefix, &["touch", "--"], &[path])).await?;
			ensure_success("create file", &result)?;
			Ok(OperationOutcome::CreateFile(PathOutcome { path: path.clone() }))
		}
		FileOperation::CreateDirectory { path } => {
			let result = run_command(lease, argv(prefix, &["mkdir", "--"], &[path])).await?;
			ensure_success("create directory", &result)?;
			Ok(OperationOutcome::CreateDirectory(PathOutcome { path: path.clone() }))
		}
	}
}

/// Builds the argv for one command: optional toolset prefix, the fixed
/// parts, then the paths rendered lossily (the shell line is text).
fn argv<P: AsRef<Path>>(prefix: Option<&Path>, parts: &[&str], paths: &[P]) -> Vec<String> {
	let mut argv = Vec::with_capacity(1 + parts.len() + paths.len());
	if let Some(prefix) = prefix {
		argv.push(prefix.to_string_lossy().into_owned());
	}
	argv.extend(parts.iter().map(|part| (*part).to_string()));
	argv.extend(paths.iter().map(|path| path.as_ref().to_string_lossy().into_owned()));
	argv
}

async fn run_command(lease: &SessionLease, argv: Vec<String>) -> Result<CommandResult> {
	let request = CommandRequest::from_argv(argv.iter().map(String::as_str))?;
	debug!(target = "sufm.ops", line = request.line(), "running");
	Ok(lease.execute(request).await?)
}

/// Runs one item's command; `Ok(false)` means the command itself failed.
async fn run_item(lease: &SessionLease, argv: Vec<String>) -> Result<bool> {
	let result = run_command(lease, argv).await?;
	if !result.success() {
		debug!(
			target = "sufm.ops",
			status = result.exit_status,
			detail = result.stderr_lines.last().map(String::as_str).unwrap_or(""),
			"item failed"
		);
	}
	Ok(result.success())
}

fn ensure_success(what: &str, result: &CommandResult) -> Result<()> {
	if result.success() {
		return Ok(());
	}
	let detail = result
		.stderr_lines
		.last()
		.map(String::as_str)
		.unwrap_or("no diagnostic output");
	Err(CliError::Anyhow(anyhow!(
		"{what} failed with status {}: {detail}",
		result.exit_status
	)))
}
