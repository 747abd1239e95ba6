//! Event tags carried in the `event` field of every frame message.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Event tag for a route change reported by the embedded application.
pub const URL_CHANGED: &str = "URL_CHANGED";
/// Event tag for a property context pushed by the host.
pub const PROPERTY_CHANGED: &str = "PROPERTY_CHANGED";

/// Auth lifecycle event emitted by the session provider.
///
/// Unknown tags are preserved in [`AuthEvent::Other`] so they can be
/// forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuthEvent {
	InitialSession,
	SignedIn,
	SignedOut,
	TokenRefreshed,
	UserUpdated,
	PasswordRecovery,
	MfaChallengeVerified,
	Other(String),
}

impl AuthEvent {
	pub fn as_str(&self) -> &str {
		match self {
			Self::InitialSession => "INITIAL_SESSION",
			Self::SignedIn => "SIGNED_IN",
			Self::SignedOut => "SIGNED_OUT",
			Self::TokenRefreshed => "TOKEN_REFRESHED",
			Self::UserUpdated => "USER_UPDATED",
			Self::PasswordRecovery => "PASSWORD_RECOVERY",
			Self::MfaChallengeVerified => "MFA_CHALLENGE_VERIFIED",
			Self::Other(tag) => tag,
		}
	}
}

impl From<&str> for AuthEvent {
	fn from(tag: &str) -> Self {
		match tag {
			"INITIAL_SESSION" => Self::InitialSession,
			"SIGNED_IN" => Self::SignedIn,
			"SIGNED_OUT" => Self::SignedOut,
			"TOKEN_REFRESHED" => Self::TokenRefreshed,
			"USER_UPDATED" => Self::UserUpdated,
			"PASSWORD_RECOVERY" => Self::PasswordRecovery,
			"MFA_CHALLENGE_VERIFIED" => Self::MfaChallengeVerified,
			other => Self::Other(other.to_string()),
		}
	}
}

impl From<String> for AuthEvent {
	fn from(tag: String) -> Self {
		Self::from(tag.as_str())
	}
}

impl From<AuthEvent> for String {
	fn from(event: AuthEvent) -> Self {
		match event {
			AuthEvent::Other(tag) => tag,
			known => known.as_str().to_string(),
		}
	}
}

impl fmt::Display for AuthEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
