//! Discovery of elevation and utility binaries on the host.
//!
//! The targeted systems expose no structured discovery API, so the scan
//! simply walks a fixed, ordered list of well-known install directories and
//! reports the first entry whose file name matches. Earlier directories win;
//! unreadable or missing directories are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Privilege-elevation helper binary.
pub const ELEVATION_HELPER: &str = "su";
/// Multi-call utility toolset binary.
pub const UTILITY_TOOLSET: &str = "busybox";
/// Alternate toolset name used by some third-party installers.
pub const UTILITY_TOOLSET_ALT: &str = "busybox-ba";

/// Directories scanned for known binaries, in precedence order.
pub const SEARCH_DIRS: &[&str] = &[
	"/sbin/",
	"/system/bin/",
	"/system/xbin/",
	"/data/local/xbin/",
	"/data/local/bin/",
	"/system/sd/xbin/",
	"/system/bin/failsafe/",
	"/data/local/",
	"/data/data/burrows.apps.busybox/app_busybox/",
	"/data/data/burrows.apps.busybox.paid/app_busybox/",
];

/// Returns the full path of `name` in the first search directory containing
/// it, or `None` when no directory does.
pub fn locate_tool(name: &str) -> Option<PathBuf> {
	locate_in(SEARCH_DIRS.iter().map(Path::new), name)
}

/// Returns `true` when `name` exists in any search directory.
pub fn tool_is_available(name: &str) -> bool {
	locate_tool(name).is_some()
}

/// Scans `dirs` in order for an immediate entry named `name`.
///
/// The scan is non-recursive and compares file names case-sensitively. It
/// never fails: a directory that does not exist or cannot be listed
/// contributes no matches.
pub fn locate_in<'a, I>(dirs: I, name: &str) -> Option<PathBuf>
where
	I: IntoIterator<Item = &'a Path>,
{
	for dir in dirs {
		let Ok(entries) = fs::read_dir(dir) else {
			continue;
		};

		for entry in entries.flatten() {
			if entry.file_name().to_str() == Some(name) {
				return Some(entry.path());
			}
		}
	}

	None
}

/// Snapshot of which well-known binaries are present on this host.
///
/// Computed once at startup by [`probe`] and immutable afterwards. Presence
/// means "on disk in a search directory"; whether a present elevation helper
/// actually grants privileges is only discovered when a session is created.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolsetAvailability {
	/// Location of the elevation helper, if any.
	pub elevation_helper: Option<PathBuf>,
	/// Location of the utility toolset, if any.
	pub utility_toolset: Option<PathBuf>,
}

impl ToolsetAvailability {
	pub fn has_elevation(&self) -> bool {
		self.elevation_helper.is_some()
	}

	pub fn has_toolset(&self) -> bool {
		self.utility_toolset.is_some()
	}
}

/// Probes the search directories for the elevation helper and the utility
/// toolset (primary name first, then the installer alternate).
pub fn probe() -> ToolsetAvailability {
	availability_from(locate_tool)
}

/// [`probe`] over an explicit directory list.
pub fn probe_in(dirs: &[&Path]) -> ToolsetAvailability {
	availability_from(|name: &str| locate_in(dirs.iter().copied(), name))
}

fn availability_from(lookup: impl Fn(&str) -> Option<PathBuf>) -> ToolsetAvailability {
	ToolsetAvailability {
		elevation_helper: lookup(ELEVATION_HELPER),
		utility_toolset: lookup(UTILITY_TOOLSET).or_else(|| lookup(UTILITY_TOOLSET_ALT)),
	}
}
