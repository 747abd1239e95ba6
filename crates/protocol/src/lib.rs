//! Wire types for the host/child frame bridge protocol.
//!
//! This crate contains the serde-serializable types exchanged between the
//! host shell and the embedded application over the cross-frame message
//! channel. These types represent the "protocol layer" - the shapes of data
//! as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization
//! * 1:1 with the wire: one JSON object per message, keyed by `event`
//! * Stable: Changes only when the frame protocol changes
//!
//! Session synchronization and navigation logic live in `edwix-bridge`.

pub mod event;
pub mod message;
pub mod property;
pub mod session;

pub use event::*;
pub use message::*;
pub use property::*;
pub use session::*;
