use std::path::Path;

use anyhow::{Context, Result};
use bridge::config::AUTH_URL_VAR;
use bridge::{AuthServiceConfig, BridgeConfig, ConfigError, EnvSource, SystemEnv};
use tracing::debug;

/// Environment shared by every command.
pub struct CommandContext<E = SystemEnv> {
	env: E,
}

impl CommandContext<SystemEnv> {
	/// Loads `env_file` (or `.env` when present) into the process
	/// environment. Variables already set are not overridden.
	pub fn load(env_file: Option<&Path>) -> Result<Self> {
		match env_file {
			Some(path) => {
				dotenvy::from_path(path).with_context(|| format!("cannot read env file {}", path.display()))?;
				debug!(target = "edwix", path = %path.display(), "loaded env file");
			}
			None => {
				if let Ok(path) = dotenvy::dotenv() {
					debug!(target = "edwix", path = %path.display(), "loaded .env");
				}
			}
		}
		Ok(Self { env: SystemEnv })
	}
}

impl<E: EnvSource> CommandContext<E> {
	pub fn with_env(env: E) -> Self {
		Self { env }
	}

	pub fn bridge_config(&self) -> Result<BridgeConfig, ConfigError> {
		BridgeConfig::from_env(&self.env)
	}

	/// Auth service settings, or `None` when `SUPABASE_URL` is not set.
	pub fn auth_service(&self) -> Result<Option<AuthServiceConfig>, ConfigError> {
		match AuthServiceConfig::from_env(&self.env) {
			Ok(config) => Ok(Some(config)),
			Err(ConfigError::MissingAuthSetting(var)) if var == AUTH_URL_VAR => Ok(None),
			Err(err) => Err(err),
		}
	}
}
