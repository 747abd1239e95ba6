//! Session and navigation bridge between the host shell and the embedded
//! application frame.
//!
//! The host mounts a [`Bridge`] with three injected ports:
//!
//! * [`AuthSessionPort`]: owns the session; the bridge reads it, forwards its
//!   change notifications into the frame, and asks it to adopt or drop
//!   sessions the frame reports.
//! * [`RouterPort`]: the host route, kept in step with the frame's route.
//! * [`FramePort`]: the frame element; messages are posted to it and it is
//!   recreated whenever the host path maps to a new document URL.
//!
//! Inbound messages are admitted only from the configured origin and
//! handled by [`InboundTask`]s that re-read state after every await and drop
//! their results once the bridge has moved on.

pub mod bridge;
pub mod config;
#[cfg(not(target_arch = "wasm32"))]
pub mod driver;
pub mod env;
pub mod error;
#[cfg(not(target_arch = "wasm32"))]
pub mod gotrue;
pub mod inbound;
pub mod liveness;
pub mod location;
pub mod memory;
pub mod outbound;
pub mod ports;

pub use bridge::{Bridge, BridgePorts};
pub use config::{AuthServiceConfig, BridgeConfig};
#[cfg(not(target_arch = "wasm32"))]
pub use driver::{BridgeAlert, BridgeDriver, DriverHandle, HostEvent};
pub use env::{EnvSource, MemoryEnv, SystemEnv};
pub use error::{AuthError, BridgeError, ConfigError, Result, SessionOperation};
#[cfg(not(target_arch = "wasm32"))]
pub use gotrue::GoTrueAuth;
pub use inbound::{InboundAction, InboundOutcome, InboundTask, decide};
pub use liveness::{Liveness, Ticket};
pub use ports::{AuthListener, AuthSessionPort, FramePort, ListenerSet, RouterPort, Subscription};

pub use edwix_protocol as protocol;
