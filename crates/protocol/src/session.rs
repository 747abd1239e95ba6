//! Session credential bundle issued by the auth provider.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Authenticated session as issued by the auth provider.
///
/// Only the two tokens are interpreted by the bridge. Everything else the
/// provider attaches is carried along untouched so forwarded sessions are
/// byte-for-byte what the provider produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
	/// Opaque bearer credential.
	pub access_token: String,
	/// Opaque credential used to mint a new access token.
	pub refresh_token: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_in: Option<u64>,
	/// Expiry as unix seconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user: Option<Value>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Session {
	/// Creates a session holding only the two tokens.
	pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		Self {
			access_token: access_token.into(),
			refresh_token: refresh_token.into(),
			expires_in: None,
			expires_at: None,
			token_type: None,
			user: None,
			extra: Map::new(),
		}
	}

	/// Returns the token pair used to install this session elsewhere.
	pub fn tokens(&self) -> SessionTokens {
		SessionTokens {
			access_token: self.access_token.clone(),
			refresh_token: self.refresh_token.clone(),
		}
	}

	/// Returns `true` when `expires_at` is known and at or before `now + margin_secs`.
	pub fn expires_within(&self, now: u64, margin_secs: u64) -> bool {
		self.expires_at.is_some_and(|at| at <= now.saturating_add(margin_secs))
	}
}

/// Token pair accepted by the provider's set-session operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
	pub access_token: String,
	pub refresh_token: String,
}
