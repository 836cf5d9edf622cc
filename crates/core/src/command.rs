//! Command requests submitted to a session and their structured results.

use serde::Serialize;

use crate::error::{Result, ShellError};

/// How a command's output should be handled while waiting for completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureMode {
	/// Collect stdout and stderr text lines into the result.
	#[default]
	Lines,
	/// Discard output; only the exit status matters.
	StatusOnly,
}

/// A single command line to run in a session.
///
/// The line must be a single interpreter statement: embedded newlines would
/// submit extra commands and desynchronize result framing, so they are
/// rejected at construction.
#[derive(Debug, Clone)]
pub struct CommandRequest {
	line: String,
	capture: CaptureMode,
}

impl CommandRequest {
	/// Creates a request from a raw command line.
	pub fn new(line: impl Into<String>) -> Result<Self> {
		let line = line.into();
		if line.contains('\n') || line.contains('\r') {
			return Err(ShellError::InvalidCommand("command line contains a line break".into()));
		}
		if line.contains('\0') {
			return Err(ShellError::InvalidCommand("command line contains a NUL byte".into()));
		}

		Ok(Self { line, capture: CaptureMode::default() })
	}

	/// Creates a request from an argv slice, quoting each argument so the
	/// interpreter sees it verbatim.
	pub fn from_argv<I, S>(argv: I) -> Result<Self>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let args: Vec<String> = argv.into_iter().map(|a| a.as_ref().to_string()).collect();
		if args.is_empty() {
			return Err(ShellError::InvalidCommand("empty argv".into()));
		}

		let line = shlex::try_join(args.iter().map(String::as_str))
			.map_err(|_| ShellError::InvalidCommand("argument contains a NUL byte".into()))?;
		Self::new(line)
	}

	/// Sets how output is handled; defaults to [`CaptureMode::Lines`].
	pub fn with_capture(mut self, capture: CaptureMode) -> Self {
		self.capture = capture;
		self
	}

	pub fn line(&self) -> &str {
		&self.line
	}

	pub fn capture(&self) -> CaptureMode {
		self.capture
	}
}

/// Outcome of one command, immutable once the frame completes.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
	/// Interpreter exit status of the command.
	pub exit_status: i32,
	/// Captured stdout lines; empty under [`CaptureMode::StatusOnly`].
	pub stdout_lines: Vec<String>,
	/// Captured stderr lines; empty under [`CaptureMode::StatusOnly`].
	pub stderr_lines: Vec<String>,
}

impl CommandResult {
	pub fn success(&self) -> bool {
		self.exit_status == 0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_embedded_line_breaks() {
		assert!(matches!(CommandRequest::new("ls\nrm -rf /"), Err(ShellError::InvalidCommand(_))));
		assert!(matches!(CommandRequest::new("ls\r"), Err(ShellError::InvalidCommand(_))));
	}

	#[test]
	fn rejects_nul_bytes() {
		assert!(matches!(CommandRequest::new("ls\0x"), Err(ShellError::InvalidCommand(_))));
	}

	#[test]
	fn argv_is_quoted_for_the_interpreter() {
		let argv = ["rm", "-rf", "a file", "plain"];
		let request = CommandRequest::from_argv(argv).unwrap();
		// The quote style is shlex's to choose; the line must parse back.
		assert_eq!(shlex::split(request.line()), Some(argv.map(String::from).to_vec()));
	}

	#[test]
	fn empty_argv_is_invalid() {
		assert!(CommandRequest::from_argv(Vec::<String>::new()).is_err());
	}

	#[test]
	fn capture_mode_defaults_to_lines() {
		let request = CommandRequest::new("true").unwrap();
		assert_eq!(request.capture(), CaptureMode::Lines);

		let request = request.with_capture(CaptureMode::StatusOnly);
		assert_eq!(request.capture(), CaptureMode::StatusOnly);
	}
}
