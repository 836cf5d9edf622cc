//! Command handlers and dispatch.

mod fs;
mod probe;
mod run;

use crate::cli::Commands;
use crate::context::CommandContext;
use crate::error::Result;
use crate::ops::PasteMode;

pub async fn dispatch(command: Commands, ctx: &CommandContext) -> Result<()> {
	match command {
		Commands::Probe => probe::execute(ctx),
		Commands::Run { line, status_only } => run::execute(&line, status_only, ctx).await,
		Commands::Delete { paths } => fs::delete(paths, ctx).await,
		Commands::Copy { paths } => fs::paste(paths, PasteMode::Copy, ctx).await,
		Commands::Move { paths } => fs::paste(paths, PasteMode::Move, ctx).await,
		Commands::Rename { path, new_name } => fs::rename(path, new_name, ctx).await,
		Commands::Touch { path } => fs::create_file(path, ctx).await,
		Commands::Mkdir { path } => fs::create_directory(path, ctx).await,
	}
}
