use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, MessageEvent, Window};

/// Event listener on the window, removed when dropped.
pub struct WindowListener {
	window: Window,
	event: &'static str,
	callback: Closure<dyn FnMut(Event)>,
}

impl WindowListener {
	pub fn new(window: &Window, event: &'static str, handler: impl FnMut(Event) + 'static) -> Result<Self, JsValue> {
		let callback = Closure::<dyn FnMut(Event)>::new(handler);
		window.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
		Ok(Self {
			window: window.clone(),
			event,
			callback,
		})
	}
}

impl Drop for WindowListener {
	fn drop(&mut self) {
		let _ = self
			.window
			.remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
	}
}

/// Scoped `message` listener.
pub struct MessageListener {
	_inner: WindowListener,
}

impl MessageListener {
	pub fn new(window: &Window, mut handler: impl FnMut(MessageEvent) + 'static) -> Result<Self, JsValue> {
		let inner = WindowListener::new(window, "message", move |event: Event| {
			if let Ok(event) = event.dyn_into::<MessageEvent>() {
				handler(event);
			}
		})?;
		Ok(Self { _inner: inner })
	}
}
