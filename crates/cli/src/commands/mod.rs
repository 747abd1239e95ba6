mod check;
mod frame_url;
pub mod simulate;

use anyhow::Result;

use crate::cli::{Cli, Commands};
use crate::context::CommandContext;

pub async fn dispatch(cli: Cli) -> Result<()> {
	let ctx = CommandContext::load(cli.env_file.as_deref())?;
	let mut stdout = std::io::stdout().lock();

	match cli.command {
		Commands::Check => check::execute(&ctx, &mut stdout),
		Commands::FrameUrl { path } => frame_url::execute(&ctx, &path, &mut stdout),
		Commands::Simulate(args) => {
			let config = ctx.bridge_config()?;
			let stdin = tokio::io::BufReader::new(tokio::io::stdin());
			simulate::execute(config, &args, stdin, &mut stdout).await
		}
	}
}
