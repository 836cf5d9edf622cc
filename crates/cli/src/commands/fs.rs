//! File-operation commands: validate input, build the operation, run it,
//! render the outcome.

use std::path::PathBuf;

use anyhow::anyhow;

use crate::context::CommandContext;
use crate::error::{CliError, Result};
use crate::ops::{self, FileOperation, PasteMode};
use crate::output;

pub async fn delete(paths: Vec<PathBuf>, ctx: &CommandContext) -> Result<()> {
	run(FileOperation::Delete { targets: paths }, ctx).await
}

pub async fn paste(mut paths: Vec<PathBuf>, mode: PasteMode, ctx: &CommandContext) -> Result<()> {
	// clap enforces two or more paths; the last one is the destination.
	let Some(destination) = paths.pop() else {
		return Err(CliError::input("missing destination directory"));
	};
	run(FileOperation::Paste { sources: paths, destination, mode }, ctx).await
}

pub async fn rename(path: PathBuf, new_name: String, ctx: &CommandContext) -> Result<()> {
	validate_new_name(&new_name)?;
	run(FileOperation::Rename { source: path, new_name }, ctx).await
}

pub async fn create_file(path: PathBuf, ctx: &CommandContext) -> Result<()> {
	run(FileOperation::CreateFile { path }, ctx).await
}

pub async fn create_directory(path: PathBuf, ctx: &CommandContext) -> Result<()> {
	run(FileOperation::CreateDirectory { path }, ctx).await
}

async fn run(op: FileOperation, ctx: &CommandContext) -> Result<()> {
	let outcome = ops::run_operation(ctx, &op).await?;
	output::render_outcome(&outcome, ctx.format)?;

	if outcome.fully_succeeded() {
		Ok(())
	} else {
		Err(CliError::Anyhow(anyhow!("{} finished with failed items", op.kind())))
	}
}

fn validate_new_name(name: &str) -> Result<()> {
	if name.is_empty() || name == "." || name == ".." || name.contains('/') {
		return Err(CliError::input(format!("invalid new name: {name:?}")));
	}
	Ok(())
}
