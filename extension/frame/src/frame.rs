use bridge::FramePort;
use bridge::protocol::BridgeMessage;
use serde::Serialize;
use tracing::{trace, warn};
use url::Url;
use wasm_bindgen::JsCast;
use web_sys::HtmlIFrameElement;

/// Frame port over the first `<iframe>` matching a CSS selector.
///
/// The element is looked up on every call, so the shell may re-render it
/// freely.
#[derive(Debug, Clone)]
pub struct WebFrame {
	selector: String,
}

impl WebFrame {
	pub fn new(selector: impl Into<String>) -> Self {
		Self { selector: selector.into() }
	}

	fn element(&self) -> Option<HtmlIFrameElement> {
		let document = web_sys::window()?.document()?;
		let element = document.query_selector(&self.selector).ok()??;
		element.dyn_into::<HtmlIFrameElement>().ok()
	}
}

impl FramePort for WebFrame {
	fn post(&self, message: &BridgeMessage, target_origin: &str) -> bool {
		let Some(target) = self.element().and_then(|frame| frame.content_window()) else {
			return false;
		};
		let data = match message.to_value().serialize(&serde_wasm_bindgen::Serializer::json_compatible()) {
			Ok(data) => data,
			Err(err) => {
				warn!(target = "edwix.bridge", event = message.event_name(), error = %err, "cannot encode message");
				return false;
			}
		};
		target.post_message(&data, target_origin).is_ok()
	}

	/// Swaps the element for a shallow clone pointing at `url`, which
	/// discards the old document together with its message channel.
	fn recreate(&self, url: &Url) {
		let Some(current) = self.element() else {
			warn!(target = "edwix.bridge", selector = %self.selector, "no frame element to recreate");
			return;
		};
		let fresh = match current.clone_node().map(|node| node.unchecked_into::<HtmlIFrameElement>()) {
			Ok(fresh) => fresh,
			Err(err) => {
				warn!(target = "edwix.bridge", error = ?err, "cannot clone frame element");
				return;
			}
		};
		fresh.set_src(url.as_str());
		if let Err(err) = current.replace_with_with_node_1(&fresh) {
			warn!(target = "edwix.bridge", error = ?err, "cannot replace frame element");
			return;
		}
		trace!(target = "edwix.bridge", %url, "frame element replaced");
	}
}
