//! Auth session port over the page's supabase-js client.
//!
//! JS handles cannot cross threads, so the client and the live listener
//! closures sit in thread-local slots and [`JsAuth`] is a plain token.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use async_trait::async_trait;
use bridge::protocol::{AuthEvent, Session, SessionTokens};
use bridge::{AuthError, AuthListener, AuthSessionPort, Subscription};
use js_sys::{Function, Promise, Reflect};
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
	/// `supabase.auth` from supabase-js.
	#[derive(Clone)]
	pub type SupabaseAuth;

	#[wasm_bindgen(method, js_name = getSession)]
	fn get_session(this: &SupabaseAuth) -> Promise;

	#[wasm_bindgen(method, js_name = setSession)]
	fn set_session(this: &SupabaseAuth, tokens: &JsValue) -> Promise;

	#[wasm_bindgen(method, js_name = signOut)]
	fn sign_out(this: &SupabaseAuth) -> Promise;

	#[wasm_bindgen(method, js_name = onAuthStateChange)]
	fn on_auth_state_change(this: &SupabaseAuth, callback: &Function) -> JsValue;
}

struct Registration {
	_callback: Closure<dyn FnMut(String, JsValue)>,
	handle: JsValue,
}

thread_local! {
	static CLIENT: RefCell<Option<SupabaseAuth>> = const { RefCell::new(None) };
	static REGISTRATIONS: RefCell<HashMap<u64, Registration>> = RefCell::new(HashMap::new());
	static NEXT_REGISTRATION: Cell<u64> = const { Cell::new(0) };
}

/// [`AuthSessionPort`] backed by the installed [`SupabaseAuth`] client.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsAuth;

impl JsAuth {
	/// Installs `client` as the page's session provider.
	pub fn install(client: SupabaseAuth) -> Self {
		CLIENT.with(|slot| *slot.borrow_mut() = Some(client));
		Self
	}

	fn client() -> Result<SupabaseAuth, AuthError> {
		CLIENT
			.with(|slot| slot.borrow().clone())
			.ok_or_else(|| AuthError::Provider("auth client not installed".into()))
	}
}

#[async_trait(?Send)]
impl AuthSessionPort for JsAuth {
	async fn get_session(&self) -> Result<Option<Session>, AuthError> {
		let response = settle(Self::client()?.get_session()).await?;
		decode_session(field(&response, "data").and_then(|data| field(&data, "session")))
	}

	async fn set_session(&self, tokens: SessionTokens) -> Result<Session, AuthError> {
		let tokens = serde_wasm_bindgen::to_value(&tokens).map_err(|err| AuthError::Decode(err.to_string()))?;
		let response = settle(Self::client()?.set_session(&tokens)).await?;
		decode_session(field(&response, "data").and_then(|data| field(&data, "session")))?.ok_or(AuthError::NoSession)
	}

	async fn sign_out(&self) -> Result<(), AuthError> {
		settle(Self::client()?.sign_out()).await?;
		Ok(())
	}

	fn on_change(&self, listener: AuthListener) -> Subscription {
		let client = match Self::client() {
			Ok(client) => client,
			Err(err) => {
				warn!(target = "edwix.auth", error = %err, "cannot subscribe to auth changes");
				return Subscription::noop();
			}
		};

		let callback = Closure::<dyn FnMut(String, JsValue)>::new(move |event: String, session: JsValue| {
			let session = decode_session(Some(session)).unwrap_or_else(|err| {
				debug!(target = "edwix.auth", %event, error = %err, "undecodable session in auth notification");
				None
			});
			listener(&AuthEvent::from(event), session.as_ref());
		});
		let handle = client.on_auth_state_change(callback.as_ref().unchecked_ref());

		let id = NEXT_REGISTRATION.with(|next| {
			let id = next.get();
			next.set(id + 1);
			id
		});
		REGISTRATIONS.with(|registrations| {
			registrations.borrow_mut().insert(
				id,
				Registration {
					_callback: callback,
					handle,
				},
			)
		});

		Subscription::new(move || release(id))
	}
}

fn release(id: u64) {
	let Some(registration) = REGISTRATIONS.with(|registrations| registrations.borrow_mut().remove(&id)) else {
		return;
	};
	let Some(subscription) = field(&registration.handle, "data").and_then(|data| field(&data, "subscription")) else {
		return;
	};
	let unsubscribe = field(&subscription, "unsubscribe").and_then(|value| value.dyn_into::<Function>().ok());
	if let Some(unsubscribe) = unsubscribe {
		let _ = unsubscribe.call0(&subscription);
	}
}

/// Awaits a supabase-js call and turns a populated `error` field into `Err`.
async fn settle(promise: Promise) -> Result<JsValue, AuthError> {
	let response = JsFuture::from(promise).await.map_err(|err| AuthError::Transport(describe(&err)))?;
	match field(&response, "error") {
		Some(error) => Err(AuthError::Provider(describe(&error))),
		None => Ok(response),
	}
}

/// Reads `key`, treating `null` and `undefined` as absent.
fn field(value: &JsValue, key: &str) -> Option<JsValue> {
	Reflect::get(value, &JsValue::from_str(key))
		.ok()
		.filter(|value| !value.is_null() && !value.is_undefined())
}

fn decode_session(value: Option<JsValue>) -> Result<Option<Session>, AuthError> {
	let Some(value) = value.filter(|value| !value.is_null() && !value.is_undefined()) else {
		return Ok(None);
	};
	serde_wasm_bindgen::from_value(value)
		.map(Some)
		.map_err(|err| AuthError::Decode(err.to_string()))
}

fn describe(value: &JsValue) -> String {
	field(value, "message")
		.and_then(|message| message.as_string())
		.or_else(|| value.as_string())
		.unwrap_or_else(|| format!("{value:?}"))
}
