//! Sentinel framing for commands multiplexed over a long-lived interpreter.
//!
//! The interpreter gives no structured signal that a command finished, so
//! every submitted command is followed by two `echo` sentinels carrying a
//! token generated for that command alone: one on stdout reporting `$?`, one
//! on stderr marking that stream drained. A frame is complete when both
//! sentinels have been observed.

use uuid::Uuid;

use crate::command::{CaptureMode, CommandRequest, CommandResult};

/// Progress of one command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
	/// Nothing read yet; a pty-backed interpreter may echo the line back.
	AwaitingEcho,
	/// Collecting output; neither stream has reached its sentinel.
	AccumulatingOutput,
	/// One stream's sentinel seen; waiting for the other stream.
	AwaitingSentinel,
	/// Both sentinels seen; the result is complete.
	Done,
}

/// Incremental parser for a single command frame.
///
/// Fed one line at a time from whichever stream produced it; the two streams
/// arrive independently and in any relative order. The sentinel token is
/// random per command, so a stale sentinel from a previous, interrupted
/// frame can never complete this one.
#[derive(Debug)]
pub struct FrameParser {
	token: String,
	line: String,
	capture: CaptureMode,
	echo_pending: bool,
	stdout_sentinel_seen: bool,
	stderr_sentinel_seen: bool,
	exit_status: Option<i32>,
	stdout_lines: Vec<String>,
	stderr_lines: Vec<String>,
}

impl FrameParser {
	pub fn new(request: &CommandRequest) -> Self {
		Self {
			token: format!("__sufm_{}__", Uuid::new_v4().simple()),
			line: request.line().to_string(),
			capture: request.capture(),
			echo_pending: true,
			stdout_sentinel_seen: false,
			stderr_sentinel_seen: false,
			exit_status: None,
			stdout_lines: Vec::new(),
			stderr_lines: Vec::new(),
		}
	}

	/// Byte payload submitted to the interpreter for this frame.
	///
	/// The stdout sentinel must run directly after the command so `$?` still
	/// refers to it; the stderr sentinel runs last.
	pub fn wire_bytes(&self) -> Vec<u8> {
		format!("{}\necho {} $?\necho {} 1>&2\n", self.line, self.token, self.token).into_bytes()
	}

	/// Feeds one line read from the interpreter's stdout.
	pub fn on_stdout(&mut self, line: &str) {
		if let Some(rest) = line.strip_prefix(self.token.as_str()) {
			self.exit_status = Some(rest.trim().parse().unwrap_or(-1));
			self.stdout_sentinel_seen = true;
			return;
		}

		let echo_pending = std::mem::replace(&mut self.echo_pending, false);
		if echo_pending && line == self.line {
			// The interpreter echoed the submitted line back; not output.
			return;
		}

		if !self.stdout_sentinel_seen {
			self.push_stdout(line);
		}
	}

	/// Feeds one line read from the interpreter's stderr.
	pub fn on_stderr(&mut self, line: &str) {
		if line == self.token {
			self.stderr_sentinel_seen = true;
			return;
		}

		if !self.stderr_sentinel_seen {
			self.push_stderr(line);
		}
	}

	pub fn phase(&self) -> FramePhase {
		match (self.stdout_sentinel_seen, self.stderr_sentinel_seen) {
			(true, true) => FramePhase::Done,
			(true, false) | (false, true) => FramePhase::AwaitingSentinel,
			(false, false) if self.echo_pending => FramePhase::AwaitingEcho,
			(false, false) => FramePhase::AccumulatingOutput,
		}
	}

	pub fn is_done(&self) -> bool {
		self.phase() == FramePhase::Done
	}

	/// Consumes the parser into the command's result.
	///
	/// Meaningful only once [`FrameParser::is_done`] reports `true`; an
	/// incomplete frame reports exit status `-1`.
	pub fn into_result(self) -> CommandResult {
		CommandResult {
			exit_status: self.exit_status.unwrap_or(-1),
			stdout_lines: self.stdout_lines,
			stderr_lines: self.stderr_lines,
		}
	}

	fn push_stdout(&mut self, line: &str) {
		if self.capture == CaptureMode::Lines {
			self.stdout_lines.push(line.to_string());
		}
	}

	fn push_stderr(&mut self, line: &str) {
		if self.capture == CaptureMode::Lines {
			self.stderr_lines.push(line.to_string());
		}
	}
}
