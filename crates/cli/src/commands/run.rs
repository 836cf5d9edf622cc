//! `sufm run`: a raw command line in the shared session.

use anyhow::anyhow;
use sufm::{CaptureMode, CommandRequest};
use tracing::info;

use crate::context::CommandContext;
use crate::error::{CliError, Result};
use crate::output;

pub async fn execute(line: &str, status_only: bool, ctx: &CommandContext) -> Result<()> {
	if !ctx.shell_enabled {
		return Err(CliError::input("run needs the shell; drop --no-shell"));
	}

	let Some(lease) = ctx.registry.acquire(ctx.prefer_privileged).await else {
		return Err(CliError::Anyhow(anyhow!("no shell session could be started on this host")));
	};

	let mut request = CommandRequest::new(line)?;
	if status_only {
		request = request.with_capture(CaptureMode::StatusOnly);
	}

	info!(target = "sufm", mode = %lease.mode(), "running command");
	let result = lease.execute(request).await?;
	output::render_run(&result, ctx.format)?;

	if result.success() {
		Ok(())
	} else {
		Err(CliError::Anyhow(anyhow!("command exited with status {}", result.exit_status)))
	}
}
