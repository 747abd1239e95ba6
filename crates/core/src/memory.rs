//! In-memory ports for tests and the CLI simulator.
//!
//! Each type records what the bridge asked of it so callers can inspect the
//! effects afterwards, and exposes knobs to inject failures or hold a
//! session fetch or mutation pending.
//!
//! # Example
//!
//! ```ignore
//! let auth = Arc::new(MemoryAuth::new());
//! let router = Arc::new(MemoryRouter::new("/"));
//! let frame = Arc::new(MemoryFrame::new());
//! let bridge = Bridge::mount(config, BridgePorts::new(auth.clone(), router.clone(), frame.clone()), None)?;
//!
//! let task = bridge.receive("https://app.edwix.test", json!({"event": "SIGNED_OUT"})).unwrap();
//! task.run().await?;
//! assert!(auth.mutations().is_empty());
//! assert!(router.navigations().is_empty());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use edwix_protocol::{AuthEvent, BridgeMessage, Session, SessionTokens};
use futures::channel::oneshot;
use parking_lot::Mutex;
use url::Url;

use crate::error::AuthError;
use crate::ports::{AuthListener, AuthSessionPort, FramePort, ListenerSet, RouterPort, Subscription};

/// Call made against [`MemoryAuth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthCall {
	GetSession,
	SetSession(SessionTokens),
	SignOut,
}

/// Session provider holding its session in memory.
///
/// Behaves like the hosted provider: new subscribers receive
/// `INITIAL_SESSION`, `set_session` emits `SIGNED_IN`, and `sign_out` emits
/// `SIGNED_OUT`.
#[derive(Default)]
pub struct MemoryAuth {
	session: Mutex<Option<Session>>,
	listeners: ListenerSet,
	calls: Mutex<Vec<AuthCall>>,
	fail_get_session: AtomicBool,
	fail_mutations: AtomicBool,
	held_fetch: Mutex<Option<oneshot::Receiver<()>>>,
	held_mutation: Mutex<Option<oneshot::Receiver<()>>>,
}

impl MemoryAuth {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_session(session: Session) -> Self {
		let auth = Self::new();
		*auth.session.lock() = Some(session);
		auth
	}

	pub fn session(&self) -> Option<Session> {
		self.session.lock().clone()
	}

	/// Replaces the session without notifying anyone.
	pub fn replace_session(&self, session: Option<Session>) {
		*self.session.lock() = session;
	}

	/// Simulates a provider-side change: stores `session` and notifies listeners.
	pub fn emit(&self, event: AuthEvent, session: Option<Session>) {
		*self.session.lock() = session.clone();
		self.listeners.emit(&event, session.as_ref());
	}

	pub fn fail_get_session(&self, fail: bool) {
		self.fail_get_session.store(fail, Ordering::SeqCst);
	}

	pub fn fail_mutations(&self, fail: bool) {
		self.fail_mutations.store(fail, Ordering::SeqCst);
	}

	/// Makes the next `get_session` wait until the returned gate is released.
	pub fn hold_next_fetch(&self) -> CallGate {
		CallGate::hold(&self.held_fetch)
	}

	/// Makes the next `set_session` or `sign_out` wait, after being recorded
	/// and before taking effect, until the returned gate is released.
	pub fn hold_next_mutation(&self) -> CallGate {
		CallGate::hold(&self.held_mutation)
	}

	pub fn calls(&self) -> Vec<AuthCall> {
		self.calls.lock().clone()
	}

	/// Calls that change the session (everything except `GetSession`).
	pub fn mutations(&self) -> Vec<AuthCall> {
		self.calls().into_iter().filter(|call| *call != AuthCall::GetSession).collect()
	}

	pub fn take_calls(&self) -> Vec<AuthCall> {
		std::mem::take(&mut *self.calls.lock())
	}

	pub fn subscriber_count(&self) -> usize {
		self.listeners.len()
	}

	fn record(&self, call: AuthCall) {
		self.calls.lock().push(call);
	}

	async fn check_mutation(&self) -> Result<(), AuthError> {
		let held = self.held_mutation.lock().take();
		if let Some(gate) = held {
			let _ = gate.await;
		}
		if self.fail_mutations.load(Ordering::SeqCst) {
			return Err(AuthError::Provider("mutation rejected".into()));
		}
		Ok(())
	}
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl AuthSessionPort for MemoryAuth {
	async fn get_session(&self) -> Result<Option<Session>, AuthError> {
		self.record(AuthCall::GetSession);
		let held = self.held_fetch.lock().take();
		if let Some(gate) = held {
			let _ = gate.await;
		}
		if self.fail_get_session.load(Ordering::SeqCst) {
			return Err(AuthError::Transport("session storage unavailable".into()));
		}
		Ok(self.session())
	}

	async fn set_session(&self, tokens: SessionTokens) -> Result<Session, AuthError> {
		self.record(AuthCall::SetSession(tokens.clone()));
		self.check_mutation().await?;
		let session = Session::new(tokens.access_token, tokens.refresh_token);
		self.emit(AuthEvent::SignedIn, Some(session.clone()));
		Ok(session)
	}

	async fn sign_out(&self) -> Result<(), AuthError> {
		self.record(AuthCall::SignOut);
		self.check_mutation().await?;
		self.emit(AuthEvent::SignedOut, None);
		Ok(())
	}

	fn on_change(&self, listener: AuthListener) -> Subscription {
		let subscription = self.listeners.add(listener.clone());
		let session = self.session();
		listener(&AuthEvent::InitialSession, session.as_ref());
		subscription
	}
}

/// Releases a call held by [`MemoryAuth::hold_next_fetch`] or
/// [`MemoryAuth::hold_next_mutation`].
pub struct CallGate {
	release: Option<oneshot::Sender<()>>,
}

impl CallGate {
	fn hold(slot: &Mutex<Option<oneshot::Receiver<()>>>) -> Self {
		let (tx, rx) = oneshot::channel();
		*slot.lock() = Some(rx);
		Self { release: Some(tx) }
	}

	pub fn release(mut self) {
		if let Some(tx) = self.release.take() {
			let _ = tx.send(());
		}
	}
}

/// Router that records navigations.
pub struct MemoryRouter {
	path: Mutex<String>,
	navigations: Mutex<Vec<String>>,
}

impl MemoryRouter {
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: Mutex::new(path.into()),
			navigations: Mutex::new(Vec::new()),
		}
	}

	/// Moves the router without recording a navigation, as a user click would.
	pub fn set_path(&self, path: impl Into<String>) {
		*self.path.lock() = path.into();
	}

	pub fn navigations(&self) -> Vec<String> {
		self.navigations.lock().clone()
	}

	pub fn take_navigations(&self) -> Vec<String> {
		std::mem::take(&mut *self.navigations.lock())
	}
}

impl RouterPort for MemoryRouter {
	fn current_path(&self) -> String {
		self.path.lock().clone()
	}

	fn navigate(&self, path: &str) {
		*self.path.lock() = path.to_string();
		self.navigations.lock().push(path.to_string());
	}
}

/// Message posted through [`MemoryFrame`].
#[derive(Debug, Clone, PartialEq)]
pub struct PostedMessage {
	pub message: BridgeMessage,
	pub target_origin: String,
}

/// Frame that records posted messages and recreations.
pub struct MemoryFrame {
	attached: AtomicBool,
	posted: Mutex<Vec<PostedMessage>>,
	loads: Mutex<Vec<Url>>,
}

impl MemoryFrame {
	pub fn new() -> Self {
		Self {
			attached: AtomicBool::new(true),
			posted: Mutex::new(Vec::new()),
			loads: Mutex::new(Vec::new()),
		}
	}

	/// Simulates the frame element being absent from the document.
	pub fn detach(&self) {
		self.attached.store(false, Ordering::SeqCst);
	}

	pub fn posted(&self) -> Vec<PostedMessage> {
		self.posted.lock().clone()
	}

	pub fn messages(&self) -> Vec<BridgeMessage> {
		self.posted.lock().iter().map(|posted| posted.message.clone()).collect()
	}

	pub fn take_posted(&self) -> Vec<PostedMessage> {
		std::mem::take(&mut *self.posted.lock())
	}

	pub fn loads(&self) -> Vec<Url> {
		self.loads.lock().clone()
	}

	pub fn take_loads(&self) -> Vec<Url> {
		std::mem::take(&mut *self.loads.lock())
	}
}

impl Default for MemoryFrame {
	fn default() -> Self {
		Self::new()
	}
}

impl FramePort for MemoryFrame {
	fn post(&self, message: &BridgeMessage, target_origin: &str) -> bool {
		if !self.attached.load(Ordering::SeqCst) {
			return false;
		}
		self.posted.lock().push(PostedMessage {
			message: message.clone(),
			target_origin: target_origin.to_string(),
		});
		true
	}

	fn recreate(&self, url: &Url) {
		self.attached.store(true, Ordering::SeqCst);
		self.loads.lock().push(url.clone());
	}
}
