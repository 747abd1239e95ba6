//! Tokio event loop owning a mounted [`Bridge`].
//!
//! Host events arrive over a channel. Each inbound message runs in its own
//! task, so a slow session fetch never blocks later messages. Rejected
//! session mutations are logged and forwarded as [`BridgeAlert`]s for the
//! host to display. The alert queue is bounded; when the host does not keep
//! up, further alerts are dropped rather than queued.

use edwix_protocol::Property;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

use crate::bridge::Bridge;
use crate::error::{BridgeError, SessionOperation};
use crate::ports::{AuthSessionPort, FramePort, RouterPort};

/// Alerts buffered for the host before new ones are dropped.
pub const ALERT_CAPACITY: usize = 16;

/// Something that happened in the host shell.
#[derive(Debug, Clone)]
pub enum HostEvent {
	/// A `message` event delivered to the host window.
	Message { origin: String, data: Value },
	PathChanged(String),
	PropertyChanged(Option<Property>),
}

/// User-facing notice that a frame-requested session change failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeAlert {
	pub operation: SessionOperation,
	pub reason: String,
}

impl BridgeAlert {
	fn from_error(err: &BridgeError) -> Option<Self> {
		match err {
			BridgeError::SessionMutation { operation, source } => Some(Self {
				operation: *operation,
				reason: source.to_string(),
			}),
			_ => None,
		}
	}
}

/// Sender half used by the host to feed the driver.
#[derive(Debug, Clone)]
pub struct DriverHandle {
	events: mpsc::UnboundedSender<HostEvent>,
}

impl DriverHandle {
	/// Queues an event. Returns `false` once the driver has stopped.
	pub fn send(&self, event: HostEvent) -> bool {
		self.events.send(event).is_ok()
	}

	pub fn message(&self, origin: impl Into<String>, data: Value) -> bool {
		self.send(HostEvent::Message {
			origin: origin.into(),
			data,
		})
	}

	pub fn path_changed(&self, path: impl Into<String>) -> bool {
		self.send(HostEvent::PathChanged(path.into()))
	}

	pub fn property_changed(&self, property: Option<Property>) -> bool {
		self.send(HostEvent::PropertyChanged(property))
	}
}

/// Running driver.
pub struct BridgeDriver {
	pub handle: DriverHandle,
	/// Holds at most [`ALERT_CAPACITY`] undelivered alerts. Hosts that never
	/// read it lose alerts, not memory.
	pub alerts: mpsc::Receiver<BridgeAlert>,
	pub task: JoinHandle<()>,
}

impl BridgeDriver {
	/// Spawns the event loop. It stops, unmounting the bridge, once every
	/// [`DriverHandle`] is dropped.
	pub fn spawn<A, R, F>(bridge: Bridge<A, R, F>) -> Self
	where
		A: AuthSessionPort + 'static,
		R: RouterPort + 'static,
		F: FramePort + 'static,
	{
		let (event_tx, event_rx) = mpsc::unbounded_channel();
		let (alert_tx, alert_rx) = mpsc::channel(ALERT_CAPACITY);
		let task = tokio::spawn(run(bridge, event_rx, alert_tx));

		Self {
			handle: DriverHandle { events: event_tx },
			alerts: alert_rx,
			task,
		}
	}
}

async fn run<A, R, F>(bridge: Bridge<A, R, F>, mut events: mpsc::UnboundedReceiver<HostEvent>, alerts: mpsc::Sender<BridgeAlert>)
where
	A: AuthSessionPort + 'static,
	R: RouterPort + 'static,
	F: FramePort + 'static,
{
	let mut handlers = JoinSet::new();

	loop {
		tokio::select! {
			event = events.recv() => {
				let Some(event) = event else { break };
				match event {
					HostEvent::Message { origin, data } => {
						let Some(task) = bridge.receive(&origin, data) else { continue };
						let alerts = alerts.clone();
						handlers.spawn(async move {
							match task.run().await {
								Ok(outcome) => debug!(target = "edwix.bridge", ?outcome, "inbound message handled"),
								Err(err) => {
									warn!(target = "edwix.bridge", error = %err, "inbound message failed");
									let full = BridgeAlert::from_error(&err).and_then(|alert| match alerts.try_send(alert) {
										Err(mpsc::error::TrySendError::Full(alert)) => Some(alert),
										_ => None,
									});
									if let Some(alert) = full {
										debug!(target = "edwix.bridge", operation = %alert.operation, "alert queue full; alert dropped");
									}
								}
							}
						});
					}
					HostEvent::PathChanged(path) => {
						if let Err(err) = bridge.path_changed(&path) {
							warn!(target = "edwix.bridge", %path, error = %err, "cannot follow host path");
						}
					}
					HostEvent::PropertyChanged(property) => {
						bridge.set_property(property);
					}
				}
			}
			Some(_) = handlers.join_next(), if !handlers.is_empty() => {}
		}
	}

	bridge.unmount();
	handlers.shutdown().await;
}
