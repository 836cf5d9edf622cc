//! Tracing setup for the CLI.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `-v` raises the default level one step
/// per occurrence; `RUST_LOG` overrides the computed filter entirely.
/// Diagnostics go to stderr so stdout stays parseable under `--format json`.
pub fn init_logging(verbose: u8) {
	let level = match verbose {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	};

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		EnvFilter::new(format!(
			"warn,sufm={level},sufm_cli={level},sufm_runtime={level}"
		))
	});

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}
