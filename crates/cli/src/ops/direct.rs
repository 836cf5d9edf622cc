//! Direct filesystem executor: the degraded path used when no shell
//! session can be had, and the only path under `--no-shell`.

use std::future::Future;
use std::io;
use std::path::Path;
use std::pin::Pin;

use tokio::fs;
use tracing::{debug, warn};

use super::{FileOperation, ItemizedOutcome, OperationOutcome, PasteMode, PathOutcome, RenameOutcome};
use crate::error::Result;

/// Executes `op` with ordinary filesystem calls under this process's own
/// privileges.
pub async fn execute(op: &FileOperation) -> Result<OperationOutcome> {
	debug!(target = "sufm.ops", op = op.kind(), "executing directly");
	match op {
		FileOperation::Delete { targets } => {
			let mut outcome = ItemizedOutcome::default();
			for target in targets {
				let ok = report_item(target, remove_path(target).await);
				outcome.record(target, ok);
			}
			Ok(OperationOutcome::Delete(outcome))
		}
		FileOperation::Paste { sources, destination, mode } => {
			let mut outcome = ItemizedOutcome::default();
			for source in sources {
				let attempt = match mode {
					PasteMode::Copy => copy_into(source, destination).await,
					PasteMode::Move => move_into(source, destination).await,
				};
				let ok = report_item(source, attempt);
				outcome.record(source, ok);
			}
			Ok(OperationOutcome::Paste(outcome))
		}
		FileOperation::Rename { source, new_name } => {
			let to = super::rename_target(source, new_name)?;
			fs::rename(source, &to).await?;
			Ok(OperationOutcome::Rename(RenameOutcome { from: source.clone(), to }))
		}
		FileOperation::CreateFile { path } => {
			fs::OpenOptions::new()
				.create(true)
				.write(true)
				.open(path)
				.await?;
			Ok(OperationOutcome::CreateFile(PathOutcome { path: path.clone() }))
		}
		FileOperation::CreateDirectory { path } => {
			fs::create_dir(path).await?;
			Ok(OperationOutcome::CreateDirectory(PathOutcome { path: path.clone() }))
		}
	}
}

fn report_item(item: &Path, attempt: io::Result<()>) -> bool {
	match attempt {
		Ok(()) => true,
		Err(err) => {
			warn!(target = "sufm.ops", item = %item.display(), error = %err, "item failed");
			false
		}
	}
}

/// Removes a path of any kind. Symlinks are removed themselves, never
/// followed.
async fn remove_path(path: &Path) -> io::Result<()> {
	let meta = fs::symlink_metadata(path).await?;
	if meta.is_dir() {
		fs::remove_dir_all(path).await
	} else {
		fs::remove_file(path).await
	}
}

async fn copy_into(source: &Path, destination: &Path) -> io::Result<()> {
	copy_tree(source, &target_in(source, destination)?).await
}

async fn move_into(source: &Path, destination: &Path) -> io::Result<()> {
	let target = target_in(source, destination)?;
	match fs::rename(source, &target).await {
		Ok(()) => Ok(()),
		Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
			copy_tree(source, &target).await?;
			remove_path(source).await
		}
		Err(err) => Err(err),
	}
}

fn target_in(source: &Path, destination: &Path) -> io::Result<std::path::PathBuf> {
	let Some(name) = source.file_name() else {
		return Err(io::Error::other(format!(
			"{} has no file name to paste under",
			source.display()
		)));
	};
	Ok(destination.join(name))
}

/// Copies a file, symlink, or directory tree. Existing files are
/// overwritten and existing directories merged into, matching `cp -rf`.
/// Symlinks are recreated, never followed, so a link cycle cannot recurse.
fn copy_tree<'a>(
	source: &'a Path,
	target: &'a Path,
) -> Pin<Box<dyn Future<Output = io::Result<()>> + Send + 'a>> {
	Box::pin(async move {
		let meta = fs::symlink_metadata(source).await?;
		if meta.is_symlink() {
			return copy_link(source, target).await;
		}
		if !meta.is_dir() {
			fs::copy(source, target).await?;
			return Ok(());
		}

		match fs::create_dir(target).await {
			Ok(()) => {}
			Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
			Err(err) => return Err(err),
		}

		let mut entries = fs::read_dir(source).await?;
		while let Some(entry) = entries.next_entry().await? {
			copy_tree(&entry.path(), &target.join(entry.file_name())).await?;
		}
		Ok(())
	})
}

#[cfg(unix)]
async fn copy_link(source: &Path, target: &Path) -> io::Result<()> {
	let original = fs::read_link(source).await?;
	match fs::symlink(&original, target).await {
		Ok(()) => Ok(()),
		Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
			fs::remove_file(target).await?;
			fs::symlink(&original, target).await
		}
		Err(err) => Err(err),
	}
}

#[cfg(not(unix))]
async fn copy_link(source: &Path, target: &Path) -> io::Result<()> {
	// No portable symlink creation; copy what the link points at instead.
	fs::copy(source, target).await.map(|_| ())
}
