//! Collaborator interfaces injected into the bridge.
//!
//! The bridge never reaches for ambient state. The host hands it an auth
//! session provider, a router, and a handle on the child frame.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use edwix_protocol::{AuthEvent, BridgeMessage, Session, SessionTokens};
use parking_lot::Mutex;
use url::Url;

use crate::error::AuthError;

/// Callback invoked for every auth state change.
pub type AuthListener = Arc<dyn Fn(&AuthEvent, Option<&Session>) + Send + Sync>;

/// Auth session provider owning the host's session.
///
/// Mutations are expected to be serialized by the provider itself.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait AuthSessionPort: Send + Sync {
	/// Fetches the current session, refreshing it if the provider needs to.
	async fn get_session(&self) -> Result<Option<Session>, AuthError>;

	/// Replaces the current session with one built from `tokens`.
	async fn set_session(&self, tokens: SessionTokens) -> Result<Session, AuthError>;

	/// Ends the current session.
	async fn sign_out(&self) -> Result<(), AuthError>;

	/// Registers `listener` for change notifications until the returned
	/// subscription is released.
	fn on_change(&self, listener: AuthListener) -> Subscription;
}

/// Host router.
pub trait RouterPort: Send + Sync {
	fn current_path(&self) -> String;

	fn navigate(&self, path: &str);
}

/// Handle on the embedded application's frame element.
pub trait FramePort: Send + Sync {
	/// Posts `message` to the frame's content window restricted to
	/// `target_origin`. Returns `false` when no frame is mounted.
	fn post(&self, message: &BridgeMessage, target_origin: &str) -> bool;

	/// Destroys the current frame element and creates a new one at `url`.
	fn recreate(&self, url: &Url);
}

type Unsubscribe = Box<dyn FnOnce() + Send + Sync>;

/// Scoped registration with an event source.
///
/// The release callback runs exactly once: on [`Subscription::unsubscribe`]
/// or when the guard is dropped, whichever comes first.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
	unsubscribe: Option<Unsubscribe>,
}

impl Subscription {
	pub fn new(unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Self {
		Self {
			unsubscribe: Some(Box::new(unsubscribe)),
		}
	}

	/// A subscription with nothing to release.
	pub fn noop() -> Self {
		Self { unsubscribe: None }
	}

	pub fn unsubscribe(mut self) {
		self.release();
	}

	fn release(&mut self) {
		if let Some(unsubscribe) = self.unsubscribe.take() {
			unsubscribe();
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		self.release();
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription").field("active", &self.unsubscribe.is_some()).finish()
	}
}

/// Listener registry shared by auth provider implementations.
#[derive(Clone, Default)]
pub struct ListenerSet {
	inner: Arc<Mutex<ListenerRegistry>>,
}

#[derive(Default)]
struct ListenerRegistry {
	next_id: u64,
	listeners: BTreeMap<u64, AuthListener>,
}

impl ListenerSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `listener`; dropping the returned subscription removes it.
	pub fn add(&self, listener: AuthListener) -> Subscription {
		let id = {
			let mut registry = self.inner.lock();
			let id = registry.next_id;
			registry.next_id += 1;
			registry.listeners.insert(id, listener);
			id
		};

		let weak = Arc::downgrade(&self.inner);
		Subscription::new(move || {
			if let Some(inner) = weak.upgrade() {
				inner.lock().listeners.remove(&id);
			}
		})
	}

	/// Delivers a notification to every registered listener.
	///
	/// Listeners run outside the registry lock so they may subscribe or
	/// unsubscribe re-entrantly.
	pub fn emit(&self, event: &AuthEvent, session: Option<&Session>) {
		let listeners: Vec<AuthListener> = self.inner.lock().listeners.values().cloned().collect();
		for listener in listeners {
			listener(event, session);
		}
	}

	pub fn len(&self) -> usize {
		self.inner.lock().listeners.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
