//! Guards against applying late results to a frame that no longer exists.
//!
//! Every inbound handler takes a [`Ticket`] when its message arrives. The
//! ticket goes stale when the child frame is recreated (the epoch moves) or
//! when the bridge is torn down.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug)]
struct State {
	alive: AtomicBool,
	epoch: AtomicU64,
}

/// Shared liveness state of one bridge instance.
#[derive(Debug, Clone)]
pub struct Liveness {
	state: Arc<State>,
}

impl Liveness {
	pub fn new() -> Self {
		Self {
			state: Arc::new(State {
				alive: AtomicBool::new(true),
				epoch: AtomicU64::new(0),
			}),
		}
	}

	/// Captures the current epoch.
	pub fn ticket(&self) -> Ticket {
		Ticket {
			epoch: self.epoch(),
			state: Arc::clone(&self.state),
		}
	}

	pub fn epoch(&self) -> u64 {
		self.state.epoch.load(Ordering::Acquire)
	}

	/// Moves to a new epoch, invalidating every outstanding ticket.
	pub fn advance(&self) -> u64 {
		self.state.epoch.fetch_add(1, Ordering::AcqRel) + 1
	}

	pub fn is_alive(&self) -> bool {
		self.state.alive.load(Ordering::Acquire)
	}

	/// Marks the bridge as torn down. Idempotent.
	pub fn shutdown(&self) {
		if self.state.alive.swap(false, Ordering::AcqRel) {
			self.advance();
		}
	}
}

impl Default for Liveness {
	fn default() -> Self {
		Self::new()
	}
}

/// Epoch snapshot held by an in-flight handler.
#[derive(Debug, Clone)]
pub struct Ticket {
	epoch: u64,
	state: Arc<State>,
}

impl Ticket {
	pub fn epoch(&self) -> u64 {
		self.epoch
	}

	/// `true` while the bridge is mounted and the frame has not been replaced.
	pub fn is_current(&self) -> bool {
		self.state.alive.load(Ordering::Acquire) && self.state.epoch.load(Ordering::Acquire) == self.epoch
	}
}
