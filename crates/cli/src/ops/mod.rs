//! File operations, their typed outcomes, and the dispatch between the
//! shell-backed and direct executors.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sufm::ShellError;
use tokio::fs;
use tracing::{debug, warn};

use crate::context::CommandContext;
use crate::error::{CliError, Result};

pub mod direct;
pub mod shell;

/// Whether a paste copies its sources or moves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PasteMode {
	Copy,
	Move,
}

/// One user-visible file operation.
///
/// The set is closed on purpose: both executors match exhaustively, so a
/// new operation refuses to compile until every execution path handles it.
#[derive(Debug, Clone)]
pub enum FileOperation {
	Delete { targets: Vec<PathBuf> },
	Paste { sources: Vec<PathBuf>, destination: PathBuf, mode: PasteMode },
	Rename { source: PathBuf, new_name: String },
	CreateFile { path: PathBuf },
	CreateDirectory { path: PathBuf },
}

impl FileOperation {
	/// Short name used in log lines.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Delete { .. } => "delete",
			Self::Paste { mode: PasteMode::Copy, .. } => "copy",
			Self::Paste { mode: PasteMode::Move, .. } => "move",
			Self::Rename { .. } => "rename",
			Self::CreateFile { .. } => "create-file",
			Self::CreateDirectory { .. } => "create-directory",
		}
	}

	/// Whether re-running the whole operation is harmless after a first
	/// attempt died partway through. Holds exactly when every underlying
	/// command is idempotent: `rm -rf`, `cp -rf`, and `touch` are, `mv`
	/// and `mkdir` are not.
	pub fn retry_safe(&self) -> bool {
		match self {
			Self::Delete { .. } | Self::CreateFile { .. } => true,
			Self::Paste { mode, .. } => *mode == PasteMode::Copy,
			Self::Rename { .. } | Self::CreateDirectory { .. } => false,
		}
	}
}

/// Typed result payload, tagged by operation for JSON output.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum OperationOutcome {
	Delete(ItemizedOutcome),
	Paste(ItemizedOutcome),
	Rename(RenameOutcome),
	CreateFile(PathOutcome),
	CreateDirectory(PathOutcome),
}

impl OperationOutcome {
	/// False when any item of a multi-item operation failed. Single-item
	/// operations report failure through an error instead.
	pub fn fully_succeeded(&self) -> bool {
		match self {
			Self::Delete(items) | Self::Paste(items) => items.failed.is_empty(),
			_ => true,
		}
	}
}

/// Outcome of an operation over many items; failures are tracked per item
/// so one bad path never hides progress on the rest.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemizedOutcome {
	pub completed: usize,
	pub failed: Vec<PathBuf>,
}

impl ItemizedOutcome {
	pub fn record(&mut self, item: &Path, ok: bool) {
		if ok {
			self.completed += 1;
		} else {
			self.failed.push(item.to_path_buf());
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct RenameOutcome {
	pub from: PathBuf,
	pub to: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct PathOutcome {
	pub path: PathBuf,
}

/// Resolves the rename destination inside the source's parent directory.
pub(crate) fn rename_target(source: &Path, new_name: &str) -> Result<PathBuf> {
	let Some(parent) = source.parent() else {
		return Err(CliError::input(format!(
			"cannot rename {}: no parent directory",
			source.display()
		)));
	};
	Ok(parent.join(new_name))
}

/// A paste lands inside an existing directory; both executors assume it.
/// Only a definite mismatch is rejected here: a destination this process
/// cannot stat is left for the session to judge, since a privileged
/// interpreter may reach directories this process cannot.
async fn ensure_destination_directory(destination: &Path) -> Result<()> {
	match fs::metadata(destination).await {
		Ok(meta) if meta.is_dir() => Ok(()),
		Ok(_) => Err(CliError::input(format!(
			"destination {} is not a directory",
			destination.display()
		))),
		Err(err) if err.kind() == io::ErrorKind::NotFound => Err(CliError::input(format!(
			"destination {} does not exist",
			destination.display()
		))),
		Err(_) => Ok(()),
	}
}

/// Runs `op` through the shared session when one can be had, retrying once
/// on a fresh session if the first one dies underneath a repeatable
/// operation, and falling back to direct filesystem calls when no session
/// is available at all.
pub async fn run_operation(ctx: &CommandContext, op: &FileOperation) -> Result<OperationOutcome> {
	if let FileOperation::Paste { destination, .. } = op {
		ensure_destination_directory(destination).await?;
	}

	if !ctx.shell_enabled {
		return direct::execute(op).await;
	}

	let Some(lease) = ctx.registry.acquire(ctx.prefer_privileged).await else {
		debug!(target = "sufm.ops", op = op.kind(), "no session available; using direct filesystem");
		return direct::execute(op).await;
	};

	match shell::execute(&lease, ctx.toolset_prefix(), op).await {
		Ok(outcome) => Ok(outcome),
		Err(CliError::Shell(err)) if is_session_failure(&err) => {
			ctx.registry.evict(lease.session()).await;
			drop(lease);

			if !op.retry_safe() {
				warn!(
					target = "sufm.ops",
					op = op.kind(),
					error = %err,
					"session died during a non-repeatable operation; not retrying"
				);
				return Err(CliError::Shell(err));
			}

			warn!(
				target = "sufm.ops",
				op = op.kind(),
				error = %err,
				"session died mid-operation; retrying on a fresh one"
			);
			let Some(retry) = ctx.registry.acquire(ctx.prefer_privileged).await else {
				return direct::execute(op).await;
			};

			match shell::execute(&retry, ctx.toolset_prefix(), op).await {
				Ok(outcome) => Ok(outcome),
				Err(CliError::Shell(err)) if is_session_failure(&err) => {
					ctx.registry.evict(retry.session()).await;
					warn!(
						target = "sufm.ops",
						op = op.kind(),
						error = %err,
						"retry failed too; using direct filesystem"
					);
					direct::execute(op).await
				}
				Err(other) => Err(other),
			}
		}
		Err(other) => Err(other),
	}
}

fn is_session_failure(err: &ShellError) -> bool {
	matches!(err, ShellError::SessionDead | ShellError::SessionIo(_))
}
