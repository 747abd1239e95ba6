//! Host → child direction.

use std::sync::Arc;

use edwix_protocol::{AuthEvent, BridgeMessage, Property, Session};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::ports::FramePort;

/// Posts messages into the child frame, restricted to the embedded origin.
pub struct Outbound<F> {
	frame: Arc<F>,
	target_origin: String,
}

impl<F> Clone for Outbound<F> {
	fn clone(&self) -> Self {
		Self {
			frame: Arc::clone(&self.frame),
			target_origin: self.target_origin.clone(),
		}
	}
}

impl<F: FramePort> Outbound<F> {
	pub fn new(frame: Arc<F>, target_origin: impl Into<String>) -> Self {
		Self {
			frame,
			target_origin: target_origin.into(),
		}
	}

	/// Sends `message`. A missing frame drops it silently.
	pub fn send(&self, message: &BridgeMessage) -> bool {
		let delivered = self.frame.post(message, &self.target_origin);
		if delivered {
			debug!(target = "edwix.bridge", event = message.event_name(), "posted message to frame");
		} else {
			trace!(target = "edwix.bridge", event = message.event_name(), "no frame mounted; message dropped");
		}
		delivered
	}

	/// Mirrors an auth provider notification verbatim.
	pub fn forward_auth(&self, event: &AuthEvent, session: Option<&Session>) -> bool {
		self.send(&BridgeMessage::auth(event.clone(), session.cloned()))
	}
}

/// Remembers the last property pushed so unchanged values are not resent.
#[derive(Debug, Default)]
pub struct PropertyTracker {
	last: Mutex<Option<Option<Property>>>,
}

impl PropertyTracker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records `value` and returns `true` if it differs from the previous
	/// observation. The first observation always counts as a change.
	pub fn observe(&self, value: Option<&Property>) -> bool {
		let mut last = self.last.lock();
		if last.as_ref().is_some_and(|previous| previous.as_ref() == value) {
			return false;
		}
		*last = Some(value.cloned());
		true
	}

	pub fn current(&self) -> Option<Property> {
		self.last.lock().clone().flatten()
	}
}
