//! Persisted settings layered under command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Settings document stored at `<config dir>/sufm/config.json`.
///
/// Every field has a default, so a partial document is valid and a missing
/// one means "all defaults".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// Ask for a privileged session when an elevation helper is present.
	pub prefer_root: bool,
	/// Prefix operation commands with the utility toolset when present.
	pub use_toolset: bool,
	/// Bound on the session verification round trip, in milliseconds.
	pub handshake_timeout_ms: u64,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			prefer_root: true,
			use_toolset: true,
			handshake_timeout_ms: 10_000,
		}
	}
}

impl Settings {
	/// Loads settings from `override_path`, or from the default location
	/// when `None`. A missing file yields defaults; an explicitly named
	/// file that cannot be read, or a malformed document, is reported and
	/// ignored rather than aborting the command.
	pub fn load(override_path: Option<&Path>) -> Self {
		let explicit = override_path.is_some();
		let Some(path) = override_path.map(Path::to_path_buf).or_else(default_path) else {
			return Self::default();
		};

		let raw = match fs::read_to_string(&path) {
			Ok(raw) => raw,
			Err(err) => {
				// The default location is routinely absent; only a file the
				// user named warrants a warning.
				if explicit {
					warn!(
						target = "sufm",
						path = %path.display(),
						error = %err,
						"cannot read settings file"
					);
				}
				return Self::default();
			}
		};

		match serde_json::from_str(&raw) {
			Ok(settings) => {
				debug!(target = "sufm", path = %path.display(), "settings loaded");
				settings
			}
			Err(err) => {
				warn!(
					target = "sufm",
					path = %path.display(),
					error = %err,
					"ignoring malformed settings file"
				);
				Self::default()
			}
		}
	}
}

fn default_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("sufm").join("config.json"))
}
