//! Auth session provider backed by the hosted GoTrue-compatible REST API.
//!
//! The session lives in memory. Endpoints used:
//!
//! - `GET  /auth/v1/user` validates an access token handed over by the frame
//! - `POST /auth/v1/token?grant_type=refresh_token` mints a new access token
//! - `POST /auth/v1/logout` revokes the refresh token
//!
//! Refreshes, installs and sign-outs run one at a time, so a slow
//! `set_session` cannot land after a `sign_out` that was issued later.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use edwix_protocol::{AuthEvent, Session, SessionTokens};
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::config::AuthServiceConfig;
use crate::error::AuthError;
use crate::ports::{AuthListener, AuthSessionPort, ListenerSet, Subscription};

/// Sessions this close to expiry are refreshed before being handed out.
pub const EXPIRY_MARGIN_SECS: u64 = 60;

/// [`AuthSessionPort`] talking to the hosted auth service over HTTP.
pub struct GoTrueAuth {
	http: reqwest::Client,
	config: AuthServiceConfig,
	session: Mutex<Option<Session>>,
	listeners: ListenerSet,
	/// Held across every request that replaces the session.
	ops: tokio::sync::Mutex<()>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
	#[serde(alias = "error_description", alias = "msg", alias = "message")]
	error: Option<String>,
}

impl GoTrueAuth {
	pub fn new(config: AuthServiceConfig) -> Self {
		Self::with_client(reqwest::Client::new(), config)
	}

	pub fn with_client(http: reqwest::Client, config: AuthServiceConfig) -> Self {
		Self {
			http,
			config,
			session: Mutex::new(None),
			listeners: ListenerSet::new(),
			ops: tokio::sync::Mutex::new(()),
		}
	}

	/// Current session without refreshing it.
	pub fn cached_session(&self) -> Option<Session> {
		self.session.lock().clone()
	}

	/// `Some` when the cached state can be handed out as is: no session, or
	/// one that is not about to expire.
	fn fresh_session(&self) -> Option<Option<Session>> {
		match self.cached_session() {
			None => Some(None),
			Some(session) if !session.expires_within(now_ts(), EXPIRY_MARGIN_SECS) => Some(Some(session)),
			Some(_) => None,
		}
	}

	fn store(&self, event: AuthEvent, session: Option<Session>) {
		*self.session.lock() = session.clone();
		self.listeners.emit(&event, session.as_ref());
	}

	async fn fetch_user(&self, access_token: &str) -> Result<Value, AuthError> {
		let response = self
			.http
			.get(self.config.endpoint("auth/v1/user"))
			.header("apikey", &self.config.api_key)
			.bearer_auth(access_token)
			.send()
			.await
			.map_err(transport)?;
		decode(response).await
	}

	async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
		let mut url = self.config.endpoint("auth/v1/token");
		url.query_pairs_mut().append_pair("grant_type", "refresh_token");

		let response = self
			.http
			.post(url)
			.header("apikey", &self.config.api_key)
			.json(&json!({ "refresh_token": refresh_token }))
			.send()
			.await
			.map_err(transport)?;

		let mut session: Session = serde_json::from_value(decode(response).await?).map_err(|err| AuthError::Decode(err.to_string()))?;
		if session.expires_at.is_none() {
			session.expires_at = session.expires_in.map(|secs| now_ts() + secs);
		}
		debug!(target = "edwix.auth", expires_at = session.expires_at, "session refreshed");
		Ok(session)
	}
}

#[async_trait]
impl AuthSessionPort for GoTrueAuth {
	async fn get_session(&self) -> Result<Option<Session>, AuthError> {
		if let Some(session) = self.fresh_session() {
			return Ok(session);
		}

		let _op = self.ops.lock().await;
		// Whoever held the guard may already have refreshed or cleared it.
		let session = match self.fresh_session() {
			Some(session) => return Ok(session),
			None => self.cached_session(),
		};
		let Some(session) = session else {
			return Ok(None);
		};

		let refreshed = self.refresh(&session.refresh_token).await?;
		self.store(AuthEvent::TokenRefreshed, Some(refreshed.clone()));
		Ok(Some(refreshed))
	}

	async fn set_session(&self, tokens: SessionTokens) -> Result<Session, AuthError> {
		let _op = self.ops.lock().await;
		let expires_at = jwt_expiry(&tokens.access_token);
		if expires_at.is_some_and(|at| at <= now_ts()) {
			let refreshed = self.refresh(&tokens.refresh_token).await?;
			self.store(AuthEvent::TokenRefreshed, Some(refreshed.clone()));
			return Ok(refreshed);
		}

		let user = self.fetch_user(&tokens.access_token).await?;
		let mut session = Session::new(tokens.access_token, tokens.refresh_token);
		session.expires_at = expires_at;
		session.expires_in = expires_at.map(|at| at.saturating_sub(now_ts()));
		session.token_type = Some("bearer".to_string());
		session.user = Some(user);

		info!(target = "edwix.auth", "session installed");
		self.store(AuthEvent::SignedIn, Some(session.clone()));
		Ok(session)
	}

	async fn sign_out(&self) -> Result<(), AuthError> {
		let _op = self.ops.lock().await;
		if let Some(session) = self.cached_session() {
			let mut url = self.config.endpoint("auth/v1/logout");
			url.query_pairs_mut().append_pair("scope", "global");
			let response = self
				.http
				.post(url)
				.header("apikey", &self.config.api_key)
				.bearer_auth(&session.access_token)
				.send()
				.await
				.map_err(transport)?;

			let status = response.status();
			if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND) {
				warn!(target = "edwix.auth", %status, "session already revoked");
			} else if !status.is_success() {
				return Err(status_error(response).await);
			}
		}

		info!(target = "edwix.auth", "signed out");
		self.store(AuthEvent::SignedOut, None);
		Ok(())
	}

	fn on_change(&self, listener: AuthListener) -> Subscription {
		let subscription = self.listeners.add(listener.clone());
		let session = self.cached_session();
		listener(&AuthEvent::InitialSession, session.as_ref());
		subscription
	}
}

fn transport(err: reqwest::Error) -> AuthError {
	AuthError::Transport(err.to_string())
}

async fn decode(response: reqwest::Response) -> Result<Value, AuthError> {
	if !response.status().is_success() {
		return Err(status_error(response).await);
	}
	response.json::<Value>().await.map_err(|err| AuthError::Decode(err.to_string()))
}

async fn status_error(response: reqwest::Response) -> AuthError {
	let status = response.status().as_u16();
	let body = response.text().await.unwrap_or_default();
	let message = serde_json::from_str::<ErrorBody>(&body).ok().and_then(|body| body.error).unwrap_or(body);
	AuthError::Status { status, message }
}

/// Reads the `exp` claim of a JWT without verifying it.
pub fn jwt_expiry(token: &str) -> Option<u64> {
	let payload = token.split('.').nth(1)?;
	let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
	let claims: Value = serde_json::from_slice(&bytes).ok()?;
	claims.get("exp")?.as_u64()
}

pub(crate) fn now_ts() -> u64 {
	SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default()
}
