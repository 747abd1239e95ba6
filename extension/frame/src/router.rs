use bridge::RouterPort;
use tracing::warn;
use wasm_bindgen::JsValue;

/// Router over the window's history and location.
///
/// Navigation pushes a history entry; the shell listens for it through
/// [`crate::ShellBridge`] and re-renders the frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebRouter;

impl RouterPort for WebRouter {
	fn current_path(&self) -> String {
		web_sys::window()
			.and_then(|window| window.location().pathname().ok())
			.unwrap_or_else(|| "/".to_string())
	}

	fn navigate(&self, path: &str) {
		let Some(window) = web_sys::window() else {
			return;
		};
		let pushed = window
			.history()
			.and_then(|history| history.push_state_with_url(&JsValue::NULL, "", Some(path)));
		if let Err(err) = pushed {
			warn!(target = "edwix.bridge", path, error = ?err, "history.pushState failed");
		}
	}
}
