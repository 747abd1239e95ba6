//! The bridge message exchanged across the frame boundary.
//!
//! On the wire every message is a flat JSON object with an `event` key and a
//! single payload key chosen by the event:
//!
//! ```json
//! { "event": "TOKEN_REFRESHED", "session": { "access_token": "...", "refresh_token": "..." } }
//! { "event": "URL_CHANGED", "href": "https://app.example.com/en/documents/42" }
//! { "event": "PROPERTY_CHANGED", "property": { "id": "p1", "name": "Acme" } }
//! ```

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::event::{AuthEvent, PROPERTY_CHANGED, URL_CHANGED};
use crate::property::Property;
use crate::session::Session;

/// Errors raised while decoding an inbound frame message.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
	#[error("URL_CHANGED message carries neither `href` nor `url`")]
	MissingHref,
	#[error("malformed frame message: {0}")]
	Json(#[from] serde_json::Error),
}

/// One message on the cross-frame channel.
///
/// Exactly one payload exists per message and the variant fixes which one.
/// Messages carry no id or sequence number; delivery is at-most-once and
/// unordered.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawMessage")]
pub enum BridgeMessage {
	/// Auth lifecycle notification, with the session it produced (if any).
	Auth { event: AuthEvent, session: Option<Session> },
	/// The embedded application moved to `href` (absolute URL).
	UrlChanged { href: String },
	/// The host's active property changed.
	PropertyChanged { property: Option<Property> },
}

impl BridgeMessage {
	pub fn auth(event: AuthEvent, session: Option<Session>) -> Self {
		Self::Auth { event, session }
	}

	pub fn url_changed(href: impl Into<String>) -> Self {
		Self::UrlChanged { href: href.into() }
	}

	pub fn property_changed(property: Option<Property>) -> Self {
		Self::PropertyChanged { property }
	}

	/// Returns the wire `event` tag.
	pub fn event_name(&self) -> &str {
		match self {
			Self::Auth { event, .. } => event.as_str(),
			Self::UrlChanged { .. } => URL_CHANGED,
			Self::PropertyChanged { .. } => PROPERTY_CHANGED,
		}
	}

	/// Decodes an untyped payload received from the other frame.
	pub fn decode(value: Value) -> Result<Self, DecodeError> {
		Ok(serde_json::from_value(value)?)
	}

	/// Encodes the message into the JSON shape posted across the frame boundary.
	pub fn to_value(&self) -> Value {
		serde_json::to_value(self).unwrap_or(Value::Null)
	}
}

impl Serialize for BridgeMessage {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(2))?;
		map.serialize_entry("event", self.event_name())?;
		match self {
			Self::Auth { session, .. } => map.serialize_entry("session", session)?,
			Self::UrlChanged { href } => map.serialize_entry("href", href)?,
			Self::PropertyChanged { property } => map.serialize_entry("property", property)?,
		}
		map.end()
	}
}

#[derive(Deserialize)]
struct RawMessage {
	event: String,
	#[serde(default)]
	session: Option<Session>,
	#[serde(default, alias = "url")]
	href: Option<String>,
	#[serde(default)]
	property: Option<Property>,
}

impl TryFrom<RawMessage> for BridgeMessage {
	type Error = DecodeError;

	fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
		match raw.event.as_str() {
			URL_CHANGED => raw.href.map(|href| Self::UrlChanged { href }).ok_or(DecodeError::MissingHref),
			PROPERTY_CHANGED => Ok(Self::PropertyChanged { property: raw.property }),
			_ => Ok(Self::Auth {
				event: AuthEvent::from(raw.event),
				session: raw.session,
			}),
		}
	}
}
