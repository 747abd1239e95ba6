//! Child → host direction.
//!
//! Handling an inbound message is a transducer over
//! `(message, current session, current path)` that yields at most one
//! provider mutation and at most one navigation. [`decide`] is the pure
//! part; [`InboundTask`] fetches fresh state, applies the decision, and
//! checks liveness after every suspension point.

use std::sync::Arc;

use edwix_protocol::{AuthEvent, BridgeMessage, Session, SessionTokens};
use tracing::{debug, info};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result, SessionOperation};
use crate::liveness::Ticket;
use crate::location::host_path_for;
use crate::ports::{AuthSessionPort, RouterPort};

/// What an inbound message asks the host to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundAction {
	/// Follow the child's route.
	Navigate(String),
	/// Install the child's session, then optionally navigate.
	Adopt {
		tokens: SessionTokens,
		then_navigate: Option<String>,
	},
	/// Sign the host out, then navigate.
	Teardown { then_navigate: String },
	Ignore,
}

impl InboundAction {
	/// Short label for logs; never includes credentials.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Navigate(_) => "navigate",
			Self::Adopt { .. } => "adopt",
			Self::Teardown { .. } => "teardown",
			Self::Ignore => "ignore",
		}
	}
}

/// Result of handling one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
	Ignored,
	/// Child reported the path the host is already on.
	InSync,
	Navigated(String),
	SessionAdopted { navigated_to: Option<String> },
	SignedOut { navigated_to: Option<String> },
	/// The session fetch failed; nothing was changed.
	Aborted,
	/// The bridge was torn down or the frame replaced while the handler was
	/// suspended; remaining effects were skipped.
	Discarded,
}

/// Maps an admitted message to an action. Branches are checked in priority
/// order: route change, session adoption, session teardown.
pub fn decide(message: &BridgeMessage, current: Option<&Session>, current_path: &str, config: &BridgeConfig) -> InboundAction {
	let (event, session) = match message {
		BridgeMessage::UrlChanged { href } => {
			return match host_path_for(href, config.locales()) {
				Some(path) if path != current_path => InboundAction::Navigate(path),
				_ => InboundAction::Ignore,
			};
		}
		BridgeMessage::PropertyChanged { .. } => return InboundAction::Ignore,
		BridgeMessage::Auth { event, session } => (event, session.as_ref()),
	};

	let token_changed = matches!(event, AuthEvent::TokenRefreshed | AuthEvent::SignedIn)
		&& session.is_some_and(|incoming| current.is_none_or(|host| host.access_token != incoming.access_token));
	let initial_with_session = *event == AuthEvent::InitialSession && session.is_some();

	if let Some(incoming) = session.filter(|_| token_changed || initial_with_session) {
		return InboundAction::Adopt {
			tokens: incoming.tokens(),
			then_navigate: (*event == AuthEvent::SignedIn).then(|| config.root_path().to_string()),
		};
	}

	let signing_out = *event == AuthEvent::SignedOut && current.is_some();
	let initial_without_session = *event == AuthEvent::InitialSession && session.is_none();

	if signing_out || initial_without_session {
		return InboundAction::Teardown {
			then_navigate: config.login_path().to_string(),
		};
	}

	InboundAction::Ignore
}

/// One admitted inbound message, ready to be handled.
///
/// Tasks for different messages may run interleaved; each one re-reads the
/// session and path it needs instead of trusting state captured earlier.
pub struct InboundTask<A, R> {
	message: BridgeMessage,
	config: Arc<BridgeConfig>,
	auth: Arc<A>,
	router: Arc<R>,
	ticket: Ticket,
}

impl<A: AuthSessionPort, R: RouterPort> InboundTask<A, R> {
	pub(crate) fn new(message: BridgeMessage, config: Arc<BridgeConfig>, auth: Arc<A>, router: Arc<R>, ticket: Ticket) -> Self {
		Self {
			message,
			config,
			auth,
			router,
			ticket,
		}
	}

	pub fn message(&self) -> &BridgeMessage {
		&self.message
	}

	/// Handles the message.
	///
	/// The session is fetched before any branch is chosen; if that fails the
	/// message is dropped quietly with no effects. A rejected mutation is
	/// returned as [`BridgeError::SessionMutation`] so the host can surface it.
	pub async fn run(self) -> Result<InboundOutcome> {
		let current = match self.auth.get_session().await {
			Ok(session) => session,
			Err(err) => {
				debug!(target = "edwix.bridge", event = self.message.event_name(), error = %err, "session fetch failed; message dropped");
				return Ok(InboundOutcome::Aborted);
			}
		};

		if !self.ticket.is_current() {
			return Ok(self.discarded());
		}

		let action = decide(&self.message, current.as_ref(), &self.router.current_path(), &self.config);
		debug!(target = "edwix.bridge", event = self.message.event_name(), action = action.kind(), "inbound message");

		match action {
			InboundAction::Ignore => Ok(match &self.message {
				BridgeMessage::UrlChanged { href } if host_path_for(href, self.config.locales()).is_some() => InboundOutcome::InSync,
				_ => InboundOutcome::Ignored,
			}),
			InboundAction::Navigate(path) => Ok(match self.navigate(&path) {
				Some(path) => InboundOutcome::Navigated(path),
				None => InboundOutcome::InSync,
			}),
			InboundAction::Adopt { tokens, then_navigate } => {
				self.auth.set_session(tokens).await.map_err(|source| BridgeError::SessionMutation {
					operation: SessionOperation::SetSession,
					source,
				})?;
				info!(target = "edwix.bridge", event = self.message.event_name(), "adopted session from frame");

				if !self.ticket.is_current() {
					return Ok(self.discarded());
				}
				let navigated_to = then_navigate.and_then(|path| self.navigate(&path));
				Ok(InboundOutcome::SessionAdopted { navigated_to })
			}
			InboundAction::Teardown { then_navigate } => {
				self.auth.sign_out().await.map_err(|source| BridgeError::SessionMutation {
					operation: SessionOperation::SignOut,
					source,
				})?;
				info!(target = "edwix.bridge", event = self.message.event_name(), "signed out on frame request");

				if !self.ticket.is_current() {
					return Ok(self.discarded());
				}
				let navigated_to = self.navigate(&then_navigate);
				Ok(InboundOutcome::SignedOut { navigated_to })
			}
		}
	}

	/// Navigates unless the router is already at `path`.
	fn navigate(&self, path: &str) -> Option<String> {
		if self.router.current_path() == path {
			return None;
		}
		self.router.navigate(path);
		Some(path.to_string())
	}

	fn discarded(&self) -> InboundOutcome {
		debug!(
			target = "edwix.bridge",
			event = self.message.event_name(),
			epoch = self.ticket.epoch(),
			"bridge moved on while handling message; result discarded"
		);
		InboundOutcome::Discarded
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config() -> BridgeConfig {
		BridgeConfig::new("https://app.edwix.test").unwrap()
	}

	fn session(token: &str) -> Session {
		Session::new(token, format!("{token}-refresh"))
	}

	fn auth(event: AuthEvent, session: Option<Session>) -> BridgeMessage {
		BridgeMessage::auth(event, session)
	}

	#[test]
	fn url_change_navigates_to_stripped_path() {
		let msg = BridgeMessage::url_changed("https://app.edwix.test/en/documents/42");
		assert_eq!(decide(&msg, None, "/", &config()), InboundAction::Navigate("/documents/42".into()));
	}

	#[test]
	fn url_change_to_current_path_is_ignored() {
		let msg = BridgeMessage::url_changed("https://app.edwix.test/fr/documents/42");
		assert_eq!(decide(&msg, None, "/documents/42", &config()), InboundAction::Ignore);
	}

	#[test]
	fn unparsable_href_is_ignored() {
		let msg = BridgeMessage::url_changed("documents/42");
		assert_eq!(decide(&msg, None, "/", &config()), InboundAction::Ignore);
	}

	#[test]
	fn refreshed_token_equal_to_host_is_ignored() {
		let msg = auth(AuthEvent::TokenRefreshed, Some(session("t1")));
		assert_eq!(decide(&msg, Some(&session("t1")), "/", &config()), InboundAction::Ignore);
	}

	#[test]
	fn refreshed_token_different_from_host_is_adopted() {
		let msg = auth(AuthEvent::TokenRefreshed, Some(session("t2")));
		assert_eq!(
			decide(&msg, Some(&session("t1")), "/", &config()),
			InboundAction::Adopt {
				tokens: session("t2").tokens(),
				then_navigate: None,
			}
		);
	}

	#[test]
	fn signed_in_without_host_session_adopts_and_goes_home() {
		let msg = auth(AuthEvent::SignedIn, Some(session("t1")));
		assert_eq!(
			decide(&msg, None, "/documents", &config()),
			InboundAction::Adopt {
				tokens: session("t1").tokens(),
				then_navigate: Some("/".into()),
			}
		);
	}

	#[test]
	fn signed_in_without_session_payload_is_ignored() {
		let msg = auth(AuthEvent::SignedIn, None);
		assert_eq!(decide(&msg, Some(&session("t1")), "/", &config()), InboundAction::Ignore);
	}

	#[test]
	fn initial_session_adopts_even_when_tokens_match() {
		let msg = auth(AuthEvent::InitialSession, Some(session("t1")));
		assert!(matches!(decide(&msg, Some(&session("t1")), "/", &config()), InboundAction::Adopt { then_navigate: None, .. }));
	}

	#[test]
	fn initial_session_without_session_tears_down() {
		let msg = auth(AuthEvent::InitialSession, None);
		assert_eq!(
			decide(&msg, None, "/", &config()),
			InboundAction::Teardown {
				then_navigate: "/auth/login".into()
			}
		);
	}

	#[test]
	fn signed_out_requires_host_session() {
		let msg = auth(AuthEvent::SignedOut, None);
		assert_eq!(decide(&msg, None, "/", &config()), InboundAction::Ignore);
		assert!(matches!(decide(&msg, Some(&session("t1")), "/", &config()), InboundAction::Teardown { .. }));
	}

	#[test]
	fn other_events_are_ignored() {
		let msg = auth(AuthEvent::UserUpdated, Some(session("t9")));
		assert_eq!(decide(&msg, Some(&session("t1")), "/", &config()), InboundAction::Ignore);
		let msg = BridgeMessage::property_changed(None);
		assert_eq!(decide(&msg, None, "/", &config()), InboundAction::Ignore);
	}
}
