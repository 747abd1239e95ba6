//! Error types for the bridge and its ports.

use std::fmt;

/// Result alias for fallible bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Configuration problems. These are fatal: the host shows the message
/// instead of rendering a frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
	#[error("EDWIX_APP_URL is not configured")]
	MissingAppUrl,
	#[error("EDWIX_APP_URL is not an absolute http(s) URL: {value}")]
	InvalidAppUrl { value: String },
	#[error("invalid locale code {code:?}; expected a two-letter lowercase code")]
	InvalidLocale { code: String },
	#[error("{key} must be an absolute path starting with '/', got {value:?}")]
	InvalidPath { key: &'static str, value: String },
	#[error("{0} is not configured")]
	MissingAuthSetting(&'static str),
	#[error("SUPABASE_URL is not a valid URL: {value}")]
	InvalidAuthUrl { value: String },
}

/// Failures reported by an [`AuthSessionPort`](crate::ports::AuthSessionPort).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
	#[error("auth service unreachable: {0}")]
	Transport(String),
	#[error("auth service returned {status}: {message}")]
	Status { status: u16, message: String },
	#[error("unexpected auth service response: {0}")]
	Decode(String),
	#[error("no active session")]
	NoSession,
	#[error("{0}")]
	Provider(String),
}

/// Session mutation requested by the child frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOperation {
	SetSession,
	SignOut,
}

impl fmt::Display for SessionOperation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::SetSession => f.write_str("set-session"),
			Self::SignOut => f.write_str("sign-out"),
		}
	}
}

/// Errors surfaced by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error("cannot build frame URL for path {path:?}: {reason}")]
	InvalidPath { path: String, reason: String },
	#[error("{operation} rejected by auth provider: {source}")]
	SessionMutation {
		operation: SessionOperation,
		#[source]
		source: AuthError,
	},
}
