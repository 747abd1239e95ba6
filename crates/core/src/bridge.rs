//! The mounted bridge between the host shell and the embedded frame.

use std::sync::Arc;

use edwix_protocol::{AuthEvent, BridgeMessage, Property, Session};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::config::BridgeConfig;
use crate::error::Result;
use crate::inbound::InboundTask;
use crate::liveness::Liveness;
use crate::outbound::{Outbound, PropertyTracker};
use crate::ports::{AuthSessionPort, FramePort, RouterPort, Subscription};

/// Collaborators handed to [`Bridge::mount`].
pub struct BridgePorts<A, R, F> {
	pub auth: Arc<A>,
	pub router: Arc<R>,
	pub frame: Arc<F>,
}

impl<A, R, F> BridgePorts<A, R, F> {
	pub fn new(auth: Arc<A>, router: Arc<R>, frame: Arc<F>) -> Self {
		Self { auth, router, frame }
	}
}

/// A mounted bridge instance.
///
/// Mounting subscribes to the auth provider, creates the child frame, and
/// pushes the initial property. Dropping the bridge (or calling
/// [`Bridge::unmount`]) releases the subscription and invalidates every
/// in-flight inbound handler.
pub struct Bridge<A, R, F> {
	config: Arc<BridgeConfig>,
	auth: Arc<A>,
	router: Arc<R>,
	frame: Arc<F>,
	outbound: Outbound<F>,
	liveness: Liveness,
	property: PropertyTracker,
	frame_url: Mutex<Url>,
	auth_subscription: Option<Subscription>,
}

impl<A, R, F> Bridge<A, R, F>
where
	A: AuthSessionPort + 'static,
	R: RouterPort + 'static,
	F: FramePort + 'static,
{
	pub fn mount(config: BridgeConfig, ports: BridgePorts<A, R, F>, initial_property: Option<Property>) -> Result<Self> {
		let BridgePorts { auth, router, frame } = ports;
		let config = Arc::new(config);
		let outbound = Outbound::new(Arc::clone(&frame), config.origin());

		let path = router.current_path();
		let frame_url = config.child_url(&path)?;
		frame.recreate(&frame_url);
		info!(target = "edwix.bridge", origin = config.origin(), url = %frame_url, "bridge mounted");

		let auth_subscription = {
			let outbound = outbound.clone();
			auth.on_change(Arc::new(move |event: &AuthEvent, session: Option<&Session>| {
				outbound.forward_auth(event, session);
			}))
		};

		let bridge = Self {
			config,
			auth,
			router,
			frame,
			outbound,
			liveness: Liveness::new(),
			property: PropertyTracker::new(),
			frame_url: Mutex::new(frame_url),
			auth_subscription: Some(auth_subscription),
		};
		bridge.set_property(initial_property);
		Ok(bridge)
	}

	pub fn config(&self) -> &BridgeConfig {
		&self.config
	}

	pub fn liveness(&self) -> &Liveness {
		&self.liveness
	}

	/// URL the child frame was last created at.
	pub fn frame_url(&self) -> Url {
		self.frame_url.lock().clone()
	}

	/// Recomputes the child URL for a new host path.
	///
	/// A different URL replaces the frame and starts a new epoch, so results
	/// from handlers that began under the old document are dropped. Returns
	/// `true` when the frame was recreated.
	pub fn path_changed(&self, path: &str) -> Result<bool> {
		let url = self.config.child_url(path)?;
		{
			let mut current = self.frame_url.lock();
			if *current == url {
				return Ok(false);
			}
			*current = url.clone();
		}

		let epoch = self.liveness.advance();
		self.frame.recreate(&url);
		debug!(target = "edwix.bridge", %url, epoch, "frame recreated for new path");
		Ok(true)
	}

	/// Pushes the active property to the child when it changed.
	pub fn set_property(&self, property: Option<Property>) -> bool {
		if !self.property.observe(property.as_ref()) {
			return false;
		}
		self.outbound.send(&BridgeMessage::property_changed(property));
		true
	}

	/// Admits a message posted by another frame.
	///
	/// Returns `None` when `origin` is not the embedded application's origin
	/// or the payload is not a bridge message. The origin is checked before
	/// the payload is looked at.
	pub fn receive(&self, origin: &str, data: Value) -> Option<InboundTask<A, R>> {
		if !self.config.is_trusted_origin(origin) {
			debug!(target = "edwix.bridge", %origin, "ignoring message from untrusted origin");
			return None;
		}

		let message = match BridgeMessage::decode(data) {
			Ok(message) => message,
			Err(err) => {
				debug!(target = "edwix.bridge", error = %err, "ignoring undecodable frame message");
				return None;
			}
		};

		Some(InboundTask::new(
			message,
			Arc::clone(&self.config),
			Arc::clone(&self.auth),
			Arc::clone(&self.router),
			self.liveness.ticket(),
		))
	}

	/// Tears the bridge down. Equivalent to dropping it.
	pub fn unmount(self) {}
}

impl<A, R, F> Drop for Bridge<A, R, F> {
	fn drop(&mut self) {
		self.liveness.shutdown();
		if let Some(subscription) = self.auth_subscription.take() {
			subscription.unsubscribe();
		}
		debug!(target = "edwix.bridge", "bridge unmounted");
	}
}
