//! Interpreter process lifecycle helpers shared by the shell core and CLI.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

/// A spawned command interpreter with all three standard streams piped.
pub struct PipedInterpreter {
	pub child: Child,
	pub stdin: ChildStdin,
	pub stdout: ChildStdout,
	pub stderr: ChildStderr,
}

/// Spawns `program` with `args`, wiring stdin, stdout, and stderr as pipes.
///
/// The child is killed on drop so an abandoned handle cannot leak an
/// interpreter process.
pub fn spawn_interpreter(program: &Path, args: &[&str]) -> io::Result<PipedInterpreter> {
	let mut child = Command::new(program)
		.args(args)
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.kill_on_drop(true)
		.spawn()?;

	let stdin = child.stdin.take().ok_or_else(|| io::Error::other("interpreter stdin was not piped"))?;
	let stdout = child.stdout.take().ok_or_else(|| io::Error::other("interpreter stdout was not piped"))?;
	let stderr = child.stderr.take().ok_or_else(|| io::Error::other("interpreter stderr was not piped"))?;

	Ok(PipedInterpreter { child, stdin, stdout, stderr })
}

/// Terminates `child` if it is still running, then waits so the OS process
/// entry is reaped rather than left as a zombie.
pub async fn terminate_and_reap(child: &mut Child) -> Option<ExitStatus> {
	if let Ok(Some(status)) = child.try_wait() {
		return Some(status);
	}

	let _ = child.start_kill();
	child.wait().await.ok()
}

/// Returns `true` when a process with `pid` appears alive on this platform.
pub fn pid_is_alive(pid: u32) -> bool {
	#[cfg(unix)]
	{
		if pid == 0 {
			return false;
		}

		if PathBuf::from("/proc").join(pid.to_string()).exists() {
			return true;
		}

		std::process::Command::new("kill")
			.arg("-0")
			.arg(pid.to_string())
			.status()
			.map(|status| status.success())
			.unwrap_or(pid == std::process::id())
	}

	#[cfg(not(unix))]
	{
		pid == std::process::id()
	}
}
