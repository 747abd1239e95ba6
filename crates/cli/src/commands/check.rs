use std::io::Write;

use anyhow::Result;
use bridge::EnvSource;
use tracing::info;

use crate::context::CommandContext;

pub fn execute<E: EnvSource>(ctx: &CommandContext<E>, out: &mut impl Write) -> Result<()> {
	let config = ctx.bridge_config()?;
	let auth = ctx.auth_service()?;
	info!(target = "edwix", origin = config.origin(), "configuration is valid");

	writeln!(out, "app url:      {}", config.app_url())?;
	writeln!(out, "origin:       {}", config.origin())?;
	writeln!(out, "locales:      {}", config.locales().join(", "))?;
	writeln!(out, "login path:   {}", config.login_path())?;
	writeln!(out, "root path:    {}", config.root_path())?;
	match auth {
		Some(auth) => writeln!(out, "auth service: {}", auth.url)?,
		None => writeln!(out, "auth service: not configured")?,
	}
	Ok(())
}
