use std::rc::{Rc, Weak};
use std::sync::Arc;

use bridge::protocol::Property;
use bridge::{Bridge, BridgeConfig, BridgeError, BridgePorts, RouterPort};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{CustomEvent, CustomEventInit, MessageEvent};

use crate::auth::{JsAuth, SupabaseAuth};
use crate::frame::WebFrame;
use crate::listener::{MessageListener, WindowListener};
use crate::router::WebRouter;

/// Window event carrying a rejected session change in `detail`.
pub const ALERT_EVENT: &str = "edwix:bridge-alert";

const DEFAULT_FRAME_SELECTOR: &str = "iframe[data-edwix-app]";

type WebBridge = Bridge<JsAuth, WebRouter, WebFrame>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MountOptions {
	app_url: String,
	#[serde(default)]
	frame_selector: Option<String>,
	#[serde(default)]
	locales: Option<Vec<String>>,
	#[serde(default)]
	login_path: Option<String>,
	#[serde(default)]
	root_path: Option<String>,
	#[serde(default)]
	property: Option<Property>,
}

impl MountOptions {
	fn config(&self) -> Result<BridgeConfig, BridgeError> {
		let mut config = BridgeConfig::new(&self.app_url)?;
		if let Some(locales) = &self.locales {
			config = config.with_locales(locales.iter().map(String::as_str))?;
		}
		if let Some(path) = &self.login_path {
			config = config.with_login_path(path.as_str())?;
		}
		if let Some(path) = &self.root_path {
			config = config.with_root_path(path.as_str())?;
		}
		Ok(config)
	}
}

#[derive(Serialize)]
struct AlertDetail {
	operation: String,
	reason: String,
}

/// Bridge mounted on the current page.
#[wasm_bindgen]
pub struct ShellBridge {
	bridge: Rc<WebBridge>,
	_messages: MessageListener,
	_history: WindowListener,
}

#[wasm_bindgen]
impl ShellBridge {
	/// Mounts the bridge: recreates the frame for the current path,
	/// subscribes to `auth`, and starts listening for frame messages.
	#[wasm_bindgen(constructor)]
	pub fn new(options: JsValue, auth: SupabaseAuth) -> Result<ShellBridge, JsValue> {
		let options: MountOptions = serde_wasm_bindgen::from_value(options)?;
		let config = options.config().map_err(js_error)?;
		let window = web_sys::window().ok_or_else(|| js_error("no window"))?;

		let frame = WebFrame::new(options.frame_selector.as_deref().unwrap_or(DEFAULT_FRAME_SELECTOR));
		let ports = BridgePorts::new(Arc::new(JsAuth::install(auth)), Arc::new(WebRouter), Arc::new(frame));
		let bridge = Rc::new(Bridge::mount(config, ports, options.property).map_err(js_error)?);

		let messages = MessageListener::new(&window, {
			let bridge = Rc::downgrade(&bridge);
			move |event| on_message(&bridge, event)
		})?;
		let history = WindowListener::new(&window, "popstate", {
			let bridge = Rc::downgrade(&bridge);
			move |_| follow_location(&bridge)
		})?;

		Ok(Self {
			bridge,
			_messages: messages,
			_history: history,
		})
	}

	/// Pushes the active property (`{ id, name }` or `null`) to the frame.
	#[wasm_bindgen(js_name = setProperty)]
	pub fn set_property(&self, property: JsValue) -> Result<bool, JsValue> {
		let property: Option<Property> = serde_wasm_bindgen::from_value(property)?;
		Ok(self.bridge.set_property(property))
	}

	/// Tells the bridge the shell route changed.
	#[wasm_bindgen(js_name = pathChanged)]
	pub fn path_changed(&self, path: &str) -> Result<bool, JsValue> {
		self.bridge.path_changed(path).map_err(js_error)
	}

	#[wasm_bindgen(getter, js_name = frameUrl)]
	pub fn frame_url(&self) -> String {
		self.bridge.frame_url().to_string()
	}

	/// Removes the listeners and tears the bridge down.
	pub fn unmount(self) {}
}

fn on_message(bridge: &Weak<WebBridge>, event: MessageEvent) {
	let Some(bridge) = bridge.upgrade() else {
		return;
	};
	let origin = event.origin();
	if !bridge.config().is_trusted_origin(&origin) {
		return;
	}
	let Ok(data) = serde_wasm_bindgen::from_value::<Value>(event.data()) else {
		debug!(target = "edwix.bridge", "ignoring message with non-JSON payload");
		return;
	};
	let Some(task) = bridge.receive(&origin, data) else {
		return;
	};

	let bridge = Rc::downgrade(&bridge);
	spawn_local(async move {
		match task.run().await {
			Ok(outcome) => debug!(target = "edwix.bridge", ?outcome, "inbound message handled"),
			Err(err) => {
				warn!(target = "edwix.bridge", error = %err, "inbound message failed");
				raise_alert(&err);
			}
		}
		follow_location(&bridge);
	});
}

/// Recreates the frame when the window location no longer matches it.
fn follow_location(bridge: &Weak<WebBridge>) {
	let Some(bridge) = bridge.upgrade() else {
		return;
	};
	let path = WebRouter.current_path();
	if let Err(err) = bridge.path_changed(&path) {
		warn!(target = "edwix.bridge", %path, error = %err, "cannot follow location");
	}
}

fn raise_alert(err: &BridgeError) {
	let BridgeError::SessionMutation { operation, source } = err else {
		return;
	};
	let detail = AlertDetail {
		operation: operation.to_string(),
		reason: source.to_string(),
	};
	let Some(window) = web_sys::window() else {
		return;
	};
	let Ok(detail) = serde_wasm_bindgen::to_value(&detail) else {
		return;
	};

	let init = CustomEventInit::new();
	init.set_detail(&detail);
	if let Ok(event) = CustomEvent::new_with_event_init_dict(ALERT_EVENT, &init) {
		let _ = window.dispatch_event(&event);
	}
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
	js_sys::Error::new(&err.to_string()).into()
}
