use std::io::Write;

use anyhow::Result;
use bridge::EnvSource;

use crate::context::CommandContext;

pub fn execute<E: EnvSource>(ctx: &CommandContext<E>, path: &str, out: &mut impl Write) -> Result<()> {
	let url = ctx.bridge_config()?.child_url(path)?;
	writeln!(out, "{url}")?;
	Ok(())
}
