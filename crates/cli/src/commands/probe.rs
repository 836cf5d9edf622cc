//! `sufm probe`: report which well-known binaries this host provides.

use std::path::Path;

use colored::Colorize;

use crate::cli::OutputFormat;
use crate::context::CommandContext;
use crate::error::Result;

pub fn execute(ctx: &CommandContext) -> Result<()> {
	let interpreter = which::which("sh").ok();

	match ctx.format {
		OutputFormat::Json => {
			let report = serde_json::json!({
				"elevation_helper": ctx.toolset.elevation_helper,
				"utility_toolset": ctx.toolset.utility_toolset,
				"interpreter": interpreter,
			});
			println!("{}", serde_json::to_string_pretty(&report)?);
		}
		OutputFormat::Text => {
			print_finding("elevation helper", ctx.toolset.elevation_helper.as_deref());
			print_finding("utility toolset", ctx.toolset.utility_toolset.as_deref());
			print_finding("interpreter", interpreter.as_deref());
		}
	}
	Ok(())
}

fn print_finding(label: &str, path: Option<&Path>) {
	match path {
		Some(path) => println!("{label}: {}", path.display().to_string().green()),
		None => println!("{label}: {}", "not found".dimmed()),
	}
}
