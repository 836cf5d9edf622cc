//! Direct-executor behavior over a real (temporary) filesystem.

use std::path::Path;

use sufm_cli::ops::{FileOperation, OperationOutcome, PasteMode, direct};
use tempfile::TempDir;

fn write_file(path: &Path, contents: &str) {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap();
	}
	std::fs::write(path, contents).unwrap();
}

#[tokio::test]
async fn create_file_and_directory() {
	let dir = TempDir::new().unwrap();
	let file = dir.path().join("notes.txt");
	let sub = dir.path().join("archive");

	direct::execute(&FileOperation::CreateFile { path: file.clone() })
		.await
		.unwrap();
	direct::execute(&FileOperation::CreateDirectory { path: sub.clone() })
		.await
		.unwrap();

	assert!(file.is_file());
	assert!(sub.is_dir());
}

#[tokio::test]
async fn create_directory_fails_when_it_already_exists() {
	let dir = TempDir::new().unwrap();
	let sub = dir.path().join("archive");
	std::fs::create_dir(&sub).unwrap();

	let result = direct::execute(&FileOperation::CreateDirectory { path: sub }).await;
	assert!(result.is_err());
}

#[tokio::test]
async fn touch_of_an_existing_file_keeps_its_contents() {
	let dir = TempDir::new().unwrap();
	let file = dir.path().join("kept.txt");
	write_file(&file, "original");

	direct::execute(&FileOperation::CreateFile { path: file.clone() })
		.await
		.unwrap();

	assert_eq!(std::fs::read_to_string(&file).unwrap(), "original");
}

#[tokio::test]
async fn delete_removes_files_and_trees() {
	let dir = TempDir::new().unwrap();
	let file = dir.path().join("single.txt");
	let tree = dir.path().join("tree");
	write_file(&file, "x");
	write_file(&tree.join("deep/nested.txt"), "y");

	let outcome = direct::execute(&FileOperation::Delete {
		targets: vec![file.clone(), tree.clone()],
	})
	.await
	.unwrap();

	let OperationOutcome::Delete(items) = outcome else {
		panic!("wrong outcome variant");
	};
	assert_eq!(items.completed, 2);
	assert!(items.failed.is_empty());
	assert!(!file.exists());
	assert!(!tree.exists());
}

#[tokio::test]
async fn delete_reports_missing_targets_per_item() {
	let dir = TempDir::new().unwrap();
	let real = dir.path().join("real.txt");
	let missing = dir.path().join("missing.txt");
	write_file(&real, "x");

	let outcome = direct::execute(&FileOperation::Delete {
		targets: vec![real.clone(), missing.clone()],
	})
	.await
	.unwrap();

	let OperationOutcome::Delete(items) = outcome else {
		panic!("wrong outcome variant");
	};
	assert_eq!(items.completed, 1);
	assert_eq!(items.failed, vec![missing]);
	assert!(!real.exists());
}

#[cfg(unix)]
#[tokio::test]
async fn delete_removes_a_symlink_without_following_it() {
	let dir = TempDir::new().unwrap();
	let target = dir.path().join("target.txt");
	let link = dir.path().join("link");
	write_file(&target, "kept");
	std::os::unix::fs::symlink(&target, &link).unwrap();

	direct::execute(&FileOperation::Delete { targets: vec![link.clone()] })
		.await
		.unwrap();

	assert!(!link.exists());
	assert!(target.exists());
}

#[tokio::test]
async fn copy_replicates_a_tree_into_the_destination() {
	let dir = TempDir::new().unwrap();
	let source = dir.path().join("src");
	let dest = dir.path().join("dst");
	write_file(&source.join("a.txt"), "alpha");
	write_file(&source.join("inner/b.txt"), "beta");
	std::fs::create_dir(&dest).unwrap();

	let outcome = direct::execute(&FileOperation::Paste {
		sources: vec![source.clone()],
		destination: dest.clone(),
		mode: PasteMode::Copy,
	})
	.await
	.unwrap();

	let OperationOutcome::Paste(items) = outcome else {
		panic!("wrong outcome variant");
	};
	assert_eq!(items.completed, 1);
	assert!(source.exists());
	assert_eq!(
		std::fs::read_to_string(dest.join("src/a.txt")).unwrap(),
		"alpha"
	);
	assert_eq!(
		std::fs::read_to_string(dest.join("src/inner/b.txt")).unwrap(),
		"beta"
	);
}

#[tokio::test]
async fn copy_overwrites_files_already_in_the_destination() {
	let dir = TempDir::new().unwrap();
	let source = dir.path().join("src");
	let dest = dir.path().join("dst");
	write_file(&source.join("a.txt"), "new");
	write_file(&dest.join("src/a.txt"), "old");

	direct::execute(&FileOperation::Paste {
		sources: vec![source],
		destination: dest.clone(),
		mode: PasteMode::Copy,
	})
	.await
	.unwrap();

	assert_eq!(std::fs::read_to_string(dest.join("src/a.txt")).unwrap(), "new");
}

#[cfg(unix)]
#[tokio::test]
async fn copy_recreates_symlinks_without_following_them() {
	let dir = TempDir::new().unwrap();
	let source = dir.path().join("src");
	let dest = dir.path().join("dst");
	write_file(&source.join("real.txt"), "data");
	std::os::unix::fs::symlink("real.txt", source.join("link")).unwrap();
	// A link back into the tree itself must not recurse.
	std::os::unix::fs::symlink(".", source.join("loop")).unwrap();
	std::fs::create_dir(&dest).unwrap();

	let outcome = direct::execute(&FileOperation::Paste {
		sources: vec![source.clone()],
		destination: dest.clone(),
		mode: PasteMode::Copy,
	})
	.await
	.unwrap();

	let OperationOutcome::Paste(items) = outcome else {
		panic!("wrong outcome variant");
	};
	assert_eq!(items.completed, 1);

	let copied = dest.join("src/link");
	assert!(std::fs::symlink_metadata(&copied).unwrap().is_symlink());
	assert_eq!(std::fs::read_link(&copied).unwrap(), Path::new("real.txt"));
	assert!(std::fs::symlink_metadata(dest.join("src/loop")).unwrap().is_symlink());
}

#[tokio::test]
async fn move_transfers_and_removes_the_source() {
	let dir = TempDir::new().unwrap();
	let source = dir.path().join("moved");
	let dest = dir.path().join("dst");
	write_file(&source.join("payload.txt"), "cargo");
	std::fs::create_dir(&dest).unwrap();

	direct::execute(&FileOperation::Paste {
		sources: vec![source.clone()],
		destination: dest.clone(),
		mode: PasteMode::Move,
	})
	.await
	.unwrap();

	assert!(!source.exists());
	assert_eq!(
		std::fs::read_to_string(dest.join("moved/payload.txt")).unwrap(),
		"cargo"
	);
}

#[tokio::test]
async fn paste_records_missing_sources_per_item() {
	let dir = TempDir::new().unwrap();
	let good = dir.path().join("good.txt");
	let missing = dir.path().join("missing.txt");
	let dest = dir.path().join("dst");
	write_file(&good, "x");
	std::fs::create_dir(&dest).unwrap();

	let outcome = direct::execute(&FileOperation::Paste {
		sources: vec![good, missing.clone()],
		destination: dest.clone(),
		mode: PasteMode::Copy,
	})
	.await
	.unwrap();

	let OperationOutcome::Paste(items) = outcome else {
		panic!("wrong outcome variant");
	};
	assert_eq!(items.completed, 1);
	assert_eq!(items.failed, vec![missing]);
	assert!(dest.join("good.txt").is_file());
}

#[tokio::test]
async fn rename_stays_within_the_parent_directory() {
	let dir = TempDir::new().unwrap();
	let from = dir.path().join("draft.txt");
	write_file(&from, "text");

	let outcome = direct::execute(&FileOperation::Rename {
		source: from.clone(),
		new_name: "final.txt".into(),
	})
	.await
	.unwrap();

	let OperationOutcome::Rename(rename) = outcome else {
		panic!("wrong outcome variant");
	};
	assert_eq!(rename.to, dir.path().join("final.txt"));
	assert!(!from.exists());
	assert_eq!(
		std::fs::read_to_string(dir.path().join("final.txt")).unwrap(),
		"text"
	);
}

#[tokio::test]
async fn rename_of_a_missing_path_is_an_error() {
	let dir = TempDir::new().unwrap();
	let result = direct::execute(&FileOperation::Rename {
		source: dir.path().join("ghost.txt"),
		new_name: "renamed.txt".into(),
	})
	.await;

	assert!(result.is_err());
	assert!(!dir.path().join("renamed.txt").exists());
}

#[tokio::test]
async fn delete_of_nothing_completes_with_empty_outcome() {
	let outcome = direct::execute(&FileOperation::Delete { targets: Vec::new() })
		.await
		.unwrap();

	let OperationOutcome::Delete(items) = outcome else {
		panic!("wrong outcome variant");
	};
	assert_eq!(items.completed, 0);
	assert!(items.failed.is_empty());
}
