//! Starting interpreter sessions in the best available mode.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use sufm_runtime::process::spawn_interpreter;

use crate::command::{CaptureMode, CommandRequest};
use crate::error::{Result, ShellError};
use crate::session::{SessionMode, ShellSession};
use crate::toolset::ToolsetAvailability;

/// Default bound on the creation-time verification round trip.
///
/// Elevation helpers can block on an interactive grant prompt, so the
/// window is generous; established sessions have no per-command timeout.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Creates interpreter sessions on demand.
///
/// The registry holds a factory and calls it at most once per live session.
/// Implementations decide how a session comes to exist: spawning system
/// shells in production, in-memory interpreters in tests.
#[async_trait]
pub trait SessionFactory: Send + Sync {
	async fn create(&self, prefer_privileged: bool) -> Result<ShellSession>;
}

/// Factory spawning real interpreters found on the host.
///
/// With privilege requested and an elevation helper present, the helper is
/// started first; when it cannot be spawned, exits immediately, or fails
/// the handshake, creation falls back to the plain shell. Creation fails
/// only when no mode works.
pub struct SystemShellFactory {
	elevation_helper: Option<PathBuf>,
	shell_program: PathBuf,
	handshake_timeout: Duration,
}

impl SystemShellFactory {
	pub fn new(toolset: &ToolsetAvailability) -> Self {
		Self {
			elevation_helper: toolset.elevation_helper.clone(),
			shell_program: PathBuf::from("sh"),
			handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
		}
	}

	/// Overrides the unprivileged interpreter; defaults to `sh` on `PATH`.
	pub fn with_shell_program(mut self, program: impl Into<PathBuf>) -> Self {
		self.shell_program = program.into();
		self
	}

	/// Uses `helper` for privileged sessions instead of the probed one.
	pub fn with_elevation_helper(mut self, helper: impl Into<PathBuf>) -> Self {
		self.elevation_helper = Some(helper.into());
		self
	}

	/// Bounds the verification round trip for a new session.
	pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
		self.handshake_timeout = timeout;
		self
	}

	async fn start(&self, program: &Path, mode: SessionMode) -> Result<ShellSession> {
		let mut piped = spawn_interpreter(program, &[]).map_err(|err| {
			ShellError::creation(format!("failed to spawn {}: {err}", program.display()))
		})?;

		// Catch interpreters that bail out right away (an elevation helper
		// denying access, typically) before paying the handshake wait.
		tokio::time::sleep(Duration::from_millis(50)).await;
		if let Ok(Some(status)) = piped.child.try_wait() {
			return Err(ShellError::creation(format!(
				"{} exited immediately with {status}",
				program.display()
			)));
		}

		let session = ShellSession::from_child(mode, piped);
		match self.verify(&session).await {
			Ok(()) => Ok(session),
			Err(err) => {
				session.close().await;
				Err(err)
			}
		}
	}

	/// Round-trips a no-op through the framing protocol to prove the
	/// interpreter answers. Also drains any startup banner the interpreter
	/// prints before its first result.
	async fn verify(&self, session: &ShellSession) -> Result<()> {
		let probe = CommandRequest::new(":")?.with_capture(CaptureMode::StatusOnly);
		match tokio::time::timeout(self.handshake_timeout, session.execute(probe)).await {
			Ok(Ok(result)) if result.success() => Ok(()),
			Ok(Ok(result)) => Err(ShellError::creation(format!(
				"handshake exited with status {}",
				result.exit_status
			))),
			Ok(Err(err)) => Err(ShellError::creation(format!("handshake failed: {err}"))),
			Err(_) => Err(ShellError::creation(format!(
				"handshake timed out after {:?}",
				self.handshake_timeout
			))),
		}
	}
}

#[async_trait]
impl SessionFactory for SystemShellFactory {
	async fn create(&self, prefer_privileged: bool) -> Result<ShellSession> {
		if prefer_privileged {
			if let Some(helper) = self.elevation_helper.as_deref() {
				match self.start(helper, SessionMode::Privileged).await {
					Ok(session) => {
						info!(
							target = "sufm.shell",
							session = session.id(),
							pid = session.pid(),
							"privileged session ready"
						);
						return Ok(session);
					}
					Err(err) => {
						warn!(
							target = "sufm.shell",
							error = %err,
							"elevation helper failed; falling back to unprivileged"
						);
					}
				}
			} else {
				debug!(target = "sufm.shell", "no elevation helper present; starting unprivileged");
			}
		}

		let session = self.start(&self.shell_program, SessionMode::Unprivileged).await?;
		info!(
			target = "sufm.shell",
			session = session.id(),
			pid = session.pid(),
			"unprivileged session ready"
		);
		Ok(session)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn creation_fails_when_no_interpreter_exists() {
		let factory = SystemShellFactory::new(&ToolsetAvailability::default())
			.with_elevation_helper("/nonexistent/elevate")
			.with_shell_program("/nonexistent/shell");

		let err = factory.create(true).await.unwrap_err();
		assert!(matches!(err, ShellError::Creation { .. }));
	}

	#[cfg(unix)]
	mod unix {
		use std::fs;
		use std::os::unix::fs::PermissionsExt;

		use tempfile::TempDir;

		use super::super::*;

		fn script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
			let path = dir.path().join(name);
			fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
			fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
			path
		}

		#[tokio::test]
		async fn unprivileged_session_runs_commands() {
			let factory = SystemShellFactory::new(&ToolsetAvailability::default());

			let session = factory.create(false).await.unwrap();
			assert_eq!(session.mode(), SessionMode::Unprivileged);

			let result = session.execute(CommandRequest::new("echo hello").unwrap()).await.unwrap();
			assert_eq!(result.stdout_lines, vec!["hello"]);
			session.close().await;
		}

		#[tokio::test]
		async fn failing_elevation_helper_falls_back_to_unprivileged() {
			let dir = TempDir::new().unwrap();
			let helper = script(&dir, "elevate", "exit 1");
			let factory = SystemShellFactory::new(&ToolsetAvailability::default())
				.with_elevation_helper(helper);

			let session = factory.create(true).await.unwrap();
			assert_eq!(session.mode(), SessionMode::Unprivileged);
			session.close().await;
		}

		#[tokio::test]
		async fn working_elevation_helper_yields_privileged_session() {
			let dir = TempDir::new().unwrap();
			let helper = script(&dir, "elevate", "exec sh");
			let factory = SystemShellFactory::new(&ToolsetAvailability::default())
				.with_elevation_helper(helper);

			let session = factory.create(true).await.unwrap();
			assert_eq!(session.mode(), SessionMode::Privileged);
			assert!(session.mode().is_privileged());

			let result = session.execute(CommandRequest::new("echo up").unwrap()).await.unwrap();
			assert_eq!(result.stdout_lines, vec!["up"]);
			session.close().await;
		}

		#[tokio::test]
		async fn unresponsive_helper_times_out_and_falls_back() {
			let dir = TempDir::new().unwrap();
			let helper = script(&dir, "elevate", "sleep 30");
			let factory = SystemShellFactory::new(&ToolsetAvailability::default())
				.with_elevation_helper(helper)
				.with_handshake_timeout(Duration::from_millis(200));

			let session = factory.create(true).await.unwrap();
			assert_eq!(session.mode(), SessionMode::Unprivileged);
			session.close().await;
		}

		#[tokio::test]
		async fn privilege_not_requested_skips_the_helper() {
			let dir = TempDir::new().unwrap();
			// Would succeed if consulted; the request says unprivileged.
			let helper = script(&dir, "elevate", "exec sh");
			let factory = SystemShellFactory::new(&ToolsetAvailability::default())
				.with_elevation_helper(helper);

			let session = factory.create(false).await.unwrap();
			assert_eq!(session.mode(), SessionMode::Unprivileged);
			session.close().await;
		}
	}
}
