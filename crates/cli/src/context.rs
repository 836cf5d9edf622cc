//! Shared state threaded through command execution.

use std::path::Path;
use std::time::Duration;

use sufm::{ShellRegistry, SystemShellFactory, ToolsetAvailability};

use crate::cli::OutputFormat;
use crate::config::Settings;

/// Everything a command handler needs: the probe result, the session
/// registry, and the effective settings after flags are applied.
pub struct CommandContext {
	pub toolset: ToolsetAvailability,
	pub registry: ShellRegistry,
	pub settings: Settings,
	pub format: OutputFormat,
	/// Request a privileged session on acquire.
	pub prefer_privileged: bool,
	/// When false, operations skip the shell and go straight to the
	/// filesystem.
	pub shell_enabled: bool,
}

impl CommandContext {
	pub fn new(
		toolset: ToolsetAvailability,
		settings: Settings,
		format: OutputFormat,
		no_root: bool,
		no_shell: bool,
	) -> Self {
		let factory = SystemShellFactory::new(&toolset)
			.with_handshake_timeout(Duration::from_millis(settings.handshake_timeout_ms));
		let prefer_privileged = settings.prefer_root && !no_root;

		Self {
			registry: ShellRegistry::new(factory),
			toolset,
			settings,
			format,
			prefer_privileged,
			shell_enabled: !no_shell,
		}
	}

	/// Utility toolset to prefix operation commands with, when enabled and
	/// present on this host.
	pub fn toolset_prefix(&self) -> Option<&Path> {
		if self.settings.use_toolset {
			self.toolset.utility_toolset.as_deref()
		} else {
			None
		}
	}

	/// Releases the shared session. Called once, after the command returns
	/// and every lease is dropped.
	pub async fn shutdown(&self) {
		self.registry.release().await;
	}
}
