//! Bridge and auth-service configuration.
//!
//! The embedded application's base URL is mandatory. A host that cannot
//! build a [`BridgeConfig`] must show the error instead of a frame.

use url::Url;

use crate::env::EnvSource;
use crate::error::{BridgeError, ConfigError};
use crate::location;

/// Primary variable holding the embedded application's base URL.
pub const APP_URL_VAR: &str = "EDWIX_APP_URL";
/// Legacy name of [`APP_URL_VAR`] kept for existing deployments.
pub const PUBLIC_APP_URL_VAR: &str = "NEXT_PUBLIC_EDWIX_APP_URL";
pub const LOCALES_VAR: &str = "EDWIX_LOCALES";
pub const LOGIN_PATH_VAR: &str = "EDWIX_LOGIN_PATH";
pub const ROOT_PATH_VAR: &str = "EDWIX_ROOT_PATH";

pub const AUTH_URL_VAR: &str = "SUPABASE_URL";
pub const AUTH_ANON_KEY_VAR: &str = "SUPABASE_ANON_KEY";
pub const AUTH_BASE_KEY_VAR: &str = "SUPABASE_BASE_KEY";

pub const DEFAULT_LOCALES: &[&str] = &["en", "fr"];
pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";
pub const DEFAULT_ROOT_PATH: &str = "/";

/// Resolved bridge settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
	app_url: Url,
	origin: String,
	locales: Vec<String>,
	login_path: String,
	root_path: String,
}

impl BridgeConfig {
	/// Builds a config for `app_url` with default locales and redirect paths.
	pub fn new(app_url: &str) -> Result<Self, ConfigError> {
		let trimmed = app_url.trim();
		if trimmed.is_empty() {
			return Err(ConfigError::MissingAppUrl);
		}
		let invalid = || ConfigError::InvalidAppUrl { value: trimmed.to_string() };
		let app_url = Url::parse(trimmed).map_err(|_| invalid())?;
		if !matches!(app_url.scheme(), "http" | "https") || app_url.host_str().is_none() {
			return Err(invalid());
		}

		Ok(Self {
			origin: app_url.origin().ascii_serialization(),
			app_url,
			locales: DEFAULT_LOCALES.iter().map(|code| code.to_string()).collect(),
			login_path: DEFAULT_LOGIN_PATH.to_string(),
			root_path: DEFAULT_ROOT_PATH.to_string(),
		})
	}

	/// Loads the config from `EDWIX_*` variables.
	pub fn from_env(env: &impl EnvSource) -> Result<Self, ConfigError> {
		let app_url = env.var(APP_URL_VAR).or_else(|| env.var(PUBLIC_APP_URL_VAR)).ok_or(ConfigError::MissingAppUrl)?;
		let mut config = Self::new(&app_url)?;

		if let Some(raw) = env.var(LOCALES_VAR) {
			config = config.with_locales(raw.split(',').map(str::trim).filter(|code| !code.is_empty()))?;
		}
		if let Some(path) = env.var(LOGIN_PATH_VAR) {
			config = config.with_login_path(path)?;
		}
		if let Some(path) = env.var(ROOT_PATH_VAR) {
			config = config.with_root_path(path)?;
		}

		Ok(config)
	}

	/// Replaces the locale codes stripped from child-reported paths.
	pub fn with_locales<I, S>(mut self, locales: I) -> Result<Self, ConfigError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut codes = Vec::new();
		for code in locales {
			let code = code.into();
			if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_lowercase()) {
				return Err(ConfigError::InvalidLocale { code });
			}
			codes.push(code);
		}
		self.locales = codes;
		Ok(self)
	}

	/// Sets where the host goes after the child signs out.
	pub fn with_login_path(mut self, path: impl Into<String>) -> Result<Self, ConfigError> {
		self.login_path = absolute_path(LOGIN_PATH_VAR, path.into())?;
		Ok(self)
	}

	/// Sets where the host goes after the child signs in.
	pub fn with_root_path(mut self, path: impl Into<String>) -> Result<Self, ConfigError> {
		self.root_path = absolute_path(ROOT_PATH_VAR, path.into())?;
		Ok(self)
	}

	pub fn app_url(&self) -> &Url {
		&self.app_url
	}

	/// ASCII origin of the embedded application, as browsers report it in
	/// `MessageEvent.origin` and expect as a `postMessage` target.
	pub fn origin(&self) -> &str {
		&self.origin
	}

	pub fn locales(&self) -> &[String] {
		&self.locales
	}

	pub fn login_path(&self) -> &str {
		&self.login_path
	}

	pub fn root_path(&self) -> &str {
		&self.root_path
	}

	/// Returns `true` only for the exact origin of the embedded application.
	pub fn is_trusted_origin(&self, origin: &str) -> bool {
		origin == self.origin
	}

	/// Child-frame document URL for a host path.
	pub fn child_url(&self, path: &str) -> Result<Url, BridgeError> {
		location::child_url(&self.app_url, path)
	}
}

fn absolute_path(key: &'static str, value: String) -> Result<String, ConfigError> {
	if value.starts_with('/') {
		Ok(value)
	} else {
		Err(ConfigError::InvalidPath { key, value })
	}
}

/// Connection settings for the hosted auth REST service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthServiceConfig {
	pub url: Url,
	pub api_key: String,
}

impl AuthServiceConfig {
	pub fn new(url: &str, api_key: impl Into<String>) -> Result<Self, ConfigError> {
		let url = Url::parse(url.trim()).map_err(|_| ConfigError::InvalidAuthUrl { value: url.to_string() })?;
		Ok(Self { url, api_key: api_key.into() })
	}

	/// Loads `SUPABASE_URL` and the api key; `SUPABASE_BASE_KEY` wins over
	/// `SUPABASE_ANON_KEY` when both are set.
	pub fn from_env(env: &impl EnvSource) -> Result<Self, ConfigError> {
		let url = env.var(AUTH_URL_VAR).ok_or(ConfigError::MissingAuthSetting(AUTH_URL_VAR))?;
		let api_key = env
			.var(AUTH_BASE_KEY_VAR)
			.or_else(|| env.var(AUTH_ANON_KEY_VAR))
			.ok_or(ConfigError::MissingAuthSetting(AUTH_ANON_KEY_VAR))?;
		Self::new(&url, api_key)
	}

	/// Resolves an endpoint path such as `auth/v1/user` against the service URL.
	pub fn endpoint(&self, path: &str) -> Url {
		let mut url = self.url.clone();
		let base = url.path().trim_end_matches('/').to_string();
		url.set_path(&format!("{base}/{}", path.trim_start_matches('/')));
		url
	}
}
