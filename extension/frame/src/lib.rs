//! Browser binding of the shell bridge.
//!
//! Implements the bridge ports on top of the DOM and exports
//! [`ShellBridge`] to JavaScript:
//!
//! ```text
//! import init, { ShellBridge } from "edwix-frame";
//! await init();
//! const bridge = new ShellBridge({ appUrl, frameSelector: "#edwix-app" }, supabase.auth);
//! bridge.setProperty({ id, name });
//! bridge.unmount();
//! ```

#![cfg(target_arch = "wasm32")]

mod auth;
mod frame;
mod listener;
mod mount;
mod router;

use wasm_bindgen::prelude::*;

pub use auth::{JsAuth, SupabaseAuth};
pub use frame::WebFrame;
pub use listener::{MessageListener, WindowListener};
pub use mount::{ALERT_EVENT, ShellBridge};
pub use router::WebRouter;

#[wasm_bindgen(start)]
pub fn start() {
	console_error_panic_hook::set_once();
	tracing_wasm::set_as_global_default();
}
