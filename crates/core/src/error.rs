//! Error taxonomy for the shell core.

use std::io;

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, ShellError>;

/// Failures surfaced by session creation and command execution.
///
/// A binary that is simply absent is not an error: the locator reports
/// `None`/`false` and callers degrade. Everything here is a runtime failure
/// of something that was expected to work.
#[derive(Debug, Error)]
pub enum ShellError {
	/// No interpreter could be started in any requested mode.
	#[error("failed to create shell session: {reason}")]
	Creation { reason: String },

	/// The session's interpreter exited or stopped responding.
	///
	/// The session is unusable; holders should evict it from the registry
	/// and decide whether to retry on a fresh one.
	#[error("shell session is no longer alive")]
	SessionDead,

	/// A read or write on the session's streams failed mid-command.
	///
	/// Partial output from the failed command is discarded; it cannot be
	/// distinguished from a truncated frame.
	#[error("shell session I/O failed: {0}")]
	SessionIo(#[from] io::Error),

	/// The request was rejected before anything was written to the session.
	#[error("invalid command: {0}")]
	InvalidCommand(String),
}

impl ShellError {
	pub fn creation(reason: impl Into<String>) -> Self {
		Self::Creation { reason: reason.into() }
	}
}
