//! A live handle to one running interactive interpreter.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::debug;

use sufm_runtime::process::{self, PipedInterpreter};

use crate::command::{CommandRequest, CommandResult};
use crate::error::{Result, ShellError};
use crate::framing::FrameParser;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Privilege mode a session was started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
	Unprivileged,
	Privileged,
}

impl SessionMode {
	pub fn is_privileged(self) -> bool {
		self == Self::Privileged
	}
}

impl fmt::Display for SessionMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Unprivileged => f.write_str("unprivileged"),
			Self::Privileged => f.write_str("privileged"),
		}
	}
}

struct SessionIo {
	stdin: Box<dyn AsyncWrite + Send + Unpin>,
	stdout: UnboundedReceiver<io::Result<String>>,
	stderr: UnboundedReceiver<io::Result<String>>,
}

/// An open, stateful session with a running interpreter.
///
/// Commands are submitted with [`ShellSession::execute`]; concurrent callers
/// are serialized on the session's own I/O lock, so a frame in flight is
/// never interleaved with another. The session stays usable until its
/// interpreter goes away or [`ShellSession::close`] is called, after which
/// every `execute` fails with [`ShellError::SessionDead`].
pub struct ShellSession {
	id: u64,
	mode: SessionMode,
	pid: Option<u32>,
	alive: Arc<AtomicBool>,
	closed: AtomicBool,
	child: Mutex<Option<Child>>,
	io: Mutex<SessionIo>,
}

impl ShellSession {
	/// Wraps a freshly spawned interpreter process.
	pub(crate) fn from_child(mode: SessionMode, piped: PipedInterpreter) -> Self {
		let alive = Arc::new(AtomicBool::new(true));
		let stdout = spawn_line_reader(piped.stdout, alive.clone());
		let stderr = spawn_line_reader(piped.stderr, alive.clone());

		Self {
			id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
			mode,
			pid: piped.child.id(),
			alive,
			closed: AtomicBool::new(false),
			child: Mutex::new(Some(piped.child)),
			io: Mutex::new(SessionIo { stdin: Box::new(piped.stdin), stdout, stderr }),
		}
	}

	/// Builds a session over arbitrary byte streams instead of a spawned
	/// process. Framing is identical; liveness follows stream EOF.
	pub fn over_streams<W, O, E>(mode: SessionMode, stdin: W, stdout: O, stderr: E) -> Self
	where
		W: AsyncWrite + Send + Unpin + 'static,
		O: AsyncRead + Send + Unpin + 'static,
		E: AsyncRead + Send + Unpin + 'static,
	{
		let alive = Arc::new(AtomicBool::new(true));
		let stdout = spawn_line_reader(stdout, alive.clone());
		let stderr = spawn_line_reader(stderr, alive.clone());

		Self {
			id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
			mode,
			pid: None,
			alive,
			closed: AtomicBool::new(false),
			child: Mutex::new(None),
			io: Mutex::new(SessionIo { stdin: Box::new(stdin), stdout, stderr }),
		}
	}

	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn mode(&self) -> SessionMode {
		self.mode
	}

	/// OS pid of the interpreter; `None` for stream-backed sessions.
	pub fn pid(&self) -> Option<u32> {
		self.pid
	}

	/// `true` while the interpreter is running and the session has not been
	/// closed. Flips permanently on EOF, I/O failure, or close.
	pub fn is_alive(&self) -> bool {
		self.alive.load(Ordering::SeqCst) && !self.closed.load(Ordering::SeqCst)
	}

	/// Runs one command to completion and returns its framed result.
	///
	/// Suspends the caller until both sentinel lines are observed. Fails
	/// with [`ShellError::SessionDead`] when the interpreter is gone (any
	/// partial output is discarded, it cannot be told apart from a
	/// truncated frame) and [`ShellError::SessionIo`] when a stream
	/// operation itself fails.
	pub async fn execute(&self, request: CommandRequest) -> Result<CommandResult> {
		if !self.is_alive() {
			return Err(ShellError::SessionDead);
		}

		let mut io = self.io.lock().await;
		// The interpreter may have died while we waited for the lock.
		if !self.is_alive() {
			return Err(ShellError::SessionDead);
		}
		// Reborrow so the select below can split the stream fields.
		let io = &mut *io;

		let mut parser = FrameParser::new(&request);
		debug!(target = "sufm.shell", session = self.id, line = request.line(), "submitting command");

		if let Err(err) = io.stdin.write_all(&parser.wire_bytes()).await {
			return Err(self.stream_failed(err));
		}
		if let Err(err) = io.stdin.flush().await {
			return Err(self.stream_failed(err));
		}

		// An interpreter exiting right after the final sentinel can close one
		// stream while the other still buffers a line, so a closed stream only
		// stops being polled; the frame fails once nothing is left to drain.
		let mut stdout_open = true;
		let mut stderr_open = true;
		while !parser.is_done() {
			tokio::select! {
				line = io.stdout.recv(), if stdout_open => match line {
					Some(Ok(line)) => parser.on_stdout(&line),
					Some(Err(err)) => return Err(self.stream_failed(err)),
					None => stdout_open = false,
				},
				line = io.stderr.recv(), if stderr_open => match line {
					Some(Ok(line)) => parser.on_stderr(&line),
					Some(Err(err)) => return Err(self.stream_failed(err)),
					None => stderr_open = false,
				},
				else => return Err(self.stream_ended()),
			}
		}

		let result = parser.into_result();
		debug!(
			target = "sufm.shell",
			session = self.id,
			exit_status = result.exit_status,
			"command completed"
		);
		Ok(result)
	}

	/// Shuts the session down; calling it again is a no-op.
	///
	/// Asks the interpreter to exit, then terminates and reaps the process
	/// so teardown is deterministic even when the interpreter ignores the
	/// request.
	pub async fn close(&self) {
		if self.closed.swap(true, Ordering::SeqCst) {
			return;
		}
		self.alive.store(false, Ordering::SeqCst);

		// Best effort; skipped when a command still holds the I/O lock.
		if let Ok(mut io) = self.io.try_lock() {
			let _ = io.stdin.write_all(b"exit\n").await;
			let _ = io.stdin.flush().await;
		}

		let mut slot = self.child.lock().await;
		if let Some(mut child) = slot.take() {
			let status = process::terminate_and_reap(&mut child).await;
			debug!(target = "sufm.shell", session = self.id, status = ?status, "interpreter reaped");
		}
	}

	fn stream_failed(&self, err: io::Error) -> ShellError {
		self.alive.store(false, Ordering::SeqCst);
		ShellError::SessionIo(err)
	}

	fn stream_ended(&self) -> ShellError {
		self.alive.store(false, Ordering::SeqCst);
		ShellError::SessionDead
	}
}

impl fmt::Debug for ShellSession {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ShellSession")
			.field("id", &self.id)
			.field("mode", &self.mode)
			.field("pid", &self.pid)
			.field("alive", &self.is_alive())
			.finish()
	}
}

/// Pumps lines from one output stream into a channel, flipping the shared
/// liveness flag once the stream ends or fails.
fn spawn_line_reader<R>(reader: R, alive: Arc<AtomicBool>) -> UnboundedReceiver<io::Result<String>>
where
	R: AsyncRead + Send + Unpin + 'static,
{
	let (tx, rx) = mpsc::unbounded_channel();
	tokio::spawn(async move {
		let mut lines = BufReader::new(reader).lines();
		loop {
			match lines.next_line().await {
				Ok(Some(line)) => {
					if tx.send(Ok(line)).is_err() {
						break;
					}
				}
				Ok(None) => break,
				Err(err) => {
					let _ = tx.send(Err(err));
					break;
				}
			}
		}
		alive.store(false, Ordering::SeqCst);
	});
	rx
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;
	use std::time::Duration;

	use tokio::io::DuplexStream;

	use crate::command::CaptureMode;

	use super::*;

	struct ScriptedResponse {
		stdout: Vec<&'static str>,
		stderr: Vec<&'static str>,
		status: i32,
	}

	fn respond(stdout: Vec<&'static str>, stderr: Vec<&'static str>, status: i32) -> ScriptedResponse {
		ScriptedResponse { stdout, stderr, status }
	}

	/// Minimal interpreter emulation: handles `echo` (including `$?` and
	/// `1>&2` redirection), `exit`, and a scripted response per command
	/// line. `die` ends the streams mid-frame; `die-politely` ends them
	/// right after the frame's closing sentinel.
	async fn fake_interpreter(
		stdin: DuplexStream,
		mut stdout: DuplexStream,
		mut stderr: DuplexStream,
		responses: HashMap<String, ScriptedResponse>,
	) {
		let mut lines = BufReader::new(stdin).lines();
		let mut last_status = 0i32;
		let mut hang_up = false;

		while let Ok(Some(line)) = lines.next_line().await {
			if line == "exit" {
				break;
			}
			if line == "die" {
				stdout.write_all(b"partial output\n").await.unwrap();
				return;
			}
			if line == "die-politely" {
				hang_up = true;
				last_status = 0;
				continue;
			}
			if let Some(args) = line.strip_prefix("echo ") {
				let (args, redirected) = match args.strip_suffix(" 1>&2") {
					Some(rest) => (rest, true),
					None => (args, false),
				};
				let text = format!("{}\n", args.replace("$?", &last_status.to_string()));
				if redirected {
					stderr.write_all(text.as_bytes()).await.unwrap();
					if hang_up {
						return;
					}
				} else {
					stdout.write_all(text.as_bytes()).await.unwrap();
				}
				continue;
			}

			match responses.get(&line) {
				Some(response) => {
					for out in &response.stdout {
						stdout.write_all(format!("{out}\n").as_bytes()).await.unwrap();
					}
					for err in &response.stderr {
						stderr.write_all(format!("{err}\n").as_bytes()).await.unwrap();
					}
					last_status = response.status;
				}
				None => {
					stderr.write_all(format!("sh: {line}: not found\n").as_bytes()).await.unwrap();
					last_status = 127;
				}
			}
		}
	}

	fn session_over(responses: HashMap<String, ScriptedResponse>) -> ShellSession {
		let (stdin, fake_stdin) = tokio::io::duplex(4096);
		let (fake_stdout, stdout) = tokio::io::duplex(4096);
		let (fake_stderr, stderr) = tokio::io::duplex(4096);
		tokio::spawn(fake_interpreter(fake_stdin, fake_stdout, fake_stderr, responses));
		ShellSession::over_streams(SessionMode::Unprivileged, stdin, stdout, stderr)
	}

	#[tokio::test]
	async fn execute_round_trips_one_command() {
		let mut responses = HashMap::new();
		responses.insert("ls /tmp".to_string(), respond(vec!["a", "b"], vec![], 0));
		let session = session_over(responses);

		let result = session.execute(CommandRequest::new("ls /tmp").unwrap()).await.unwrap();
		assert_eq!(result.exit_status, 0);
		assert!(result.success());
		assert_eq!(result.stdout_lines, vec!["a", "b"]);
		assert!(result.stderr_lines.is_empty());
	}

	#[tokio::test]
	async fn sequential_commands_do_not_share_output() {
		let mut responses = HashMap::new();
		responses.insert("first".to_string(), respond(vec!["from-first"], vec!["warn-first"], 0));
		responses.insert("second".to_string(), respond(vec!["from-second"], vec![], 1));
		let session = session_over(responses);

		let first = session.execute(CommandRequest::new("first").unwrap()).await.unwrap();
		let second = session.execute(CommandRequest::new("second").unwrap()).await.unwrap();

		assert_eq!(first.stdout_lines, vec!["from-first"]);
		assert_eq!(first.stderr_lines, vec!["warn-first"]);
		assert_eq!(second.stdout_lines, vec!["from-second"]);
		assert!(second.stderr_lines.is_empty());
		assert_eq!(second.exit_status, 1);
	}

	#[tokio::test]
	async fn concurrent_executes_serialize_cleanly() {
		let mut responses = HashMap::new();
		responses.insert("alpha".to_string(), respond(vec!["A"], vec![], 0));
		responses.insert("beta".to_string(), respond(vec!["B"], vec![], 0));
		let session = Arc::new(session_over(responses));

		let a = tokio::spawn({
			let session = session.clone();
			async move { session.execute(CommandRequest::new("alpha").unwrap()).await.unwrap() }
		});
		let b = tokio::spawn({
			let session = session.clone();
			async move { session.execute(CommandRequest::new("beta").unwrap()).await.unwrap() }
		});

		assert_eq!(a.await.unwrap().stdout_lines, vec!["A"]);
		assert_eq!(b.await.unwrap().stdout_lines, vec!["B"]);
	}

	#[tokio::test]
	async fn unknown_command_reports_interpreter_status() {
		let session = session_over(HashMap::new());

		let result = session.execute(CommandRequest::new("frobnicate").unwrap()).await.unwrap();
		assert_eq!(result.exit_status, 127);
		assert_eq!(result.stderr_lines, vec!["sh: frobnicate: not found"]);
	}

	#[tokio::test]
	async fn interpreter_death_mid_frame_is_session_dead() {
		let session = session_over(HashMap::new());

		let err = session.execute(CommandRequest::new("die").unwrap()).await.unwrap_err();
		assert!(matches!(err, ShellError::SessionDead));
		assert!(!session.is_alive());
	}

	#[tokio::test]
	async fn frame_finished_at_interpreter_exit_still_reports() {
		let session = session_over(HashMap::new());

		let result = session
			.execute(CommandRequest::new("die-politely").unwrap())
			.await
			.unwrap();
		assert_eq!(result.exit_status, 0);

		tokio::time::sleep(Duration::from_millis(50)).await;
		assert!(!session.is_alive());
	}

	#[tokio::test]
	async fn execute_after_close_is_session_dead() {
		let session = session_over(HashMap::new());
		session.close().await;

		let err = session.execute(CommandRequest::new("true").unwrap()).await.unwrap_err();
		assert!(matches!(err, ShellError::SessionDead));
	}

	#[tokio::test]
	async fn close_twice_is_a_no_op() {
		let session = session_over(HashMap::new());
		session.close().await;
		session.close().await;
		assert!(!session.is_alive());
	}

	#[tokio::test]
	async fn status_only_requests_discard_output() {
		let mut responses = HashMap::new();
		responses.insert("noisy".to_string(), respond(vec!["x", "y"], vec!["z"], 0));
		let session = session_over(responses);

		let request = CommandRequest::new("noisy").unwrap().with_capture(CaptureMode::StatusOnly);
		let result = session.execute(request).await.unwrap();
		assert_eq!(result.exit_status, 0);
		assert!(result.stdout_lines.is_empty());
		assert!(result.stderr_lines.is_empty());
	}

	#[tokio::test]
	async fn session_ids_are_unique() {
		let first = session_over(HashMap::new());
		let second = session_over(HashMap::new());
		assert_ne!(first.id(), second.id());
	}
}
