use clap::Parser;
use sufm_cli::{cli::Cli, commands, config::Settings, context::CommandContext, logging};
use tracing::error;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let settings = Settings::load(cli.config.as_deref());
	let ctx = CommandContext::new(sufm::probe(), settings, cli.format, cli.no_root, cli.no_shell);

	let outcome = commands::dispatch(cli.command, &ctx).await;
	ctx.shutdown().await;

	if let Err(err) = outcome {
		error!(target = "sufm", error = %err, "command failed");
		std::process::exit(1);
	}
}
