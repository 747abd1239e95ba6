//! Drives a bridge over in-memory ports from JSON lines.
//!
//! Each input line is one of:
//!
//! ```text
//! {"origin": "https://app.edwix.test", "data": {"event": "URL_CHANGED", "href": "..."}}
//! {"path": "/documents/42"}
//! {"property": {"id": "p1", "name": "Main street"}}
//! {"auth": {"event": "SIGNED_OUT", "session": null}}
//! ```
//!
//! After every line the effects it caused are written as JSON lines tagged
//! with `kind`: session mutations first, then navigations, frame loads, and
//! posted messages.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use bridge::memory::{AuthCall, MemoryAuth, MemoryFrame, MemoryRouter};
use bridge::protocol::{AuthEvent, BridgeMessage, Property, Session};
use bridge::{Bridge, BridgeConfig, BridgeError, BridgePorts, InboundOutcome, RouterPort};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::cli::SimulateArgs;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InputLine {
	Message { origin: String, data: Value },
	Host(HostInput),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum HostInput {
	Path(String),
	Property(Option<Property>),
	Auth(AuthNotice),
}

#[derive(Debug, Deserialize)]
struct AuthNotice {
	event: AuthEvent,
	#[serde(default)]
	session: Option<Session>,
}

/// One observable effect, printed as a JSON line.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
	SetSession { access_token: String },
	SignOut,
	Navigate { path: String },
	Load { url: String },
	Post { target_origin: String, message: BridgeMessage },
	Outcome { event: String, outcome: &'static str },
	Dropped { origin: String },
	Alert { operation: String, reason: String },
	Error { message: String },
}

type MemoryBridge = Bridge<MemoryAuth, MemoryRouter, MemoryFrame>;

struct Simulator {
	auth: Arc<MemoryAuth>,
	router: Arc<MemoryRouter>,
	frame: Arc<MemoryFrame>,
	bridge: MemoryBridge,
}

impl Simulator {
	fn mount(config: BridgeConfig, args: &SimulateArgs) -> Result<Self> {
		let auth = Arc::new(match &args.session_token {
			Some(token) => MemoryAuth::with_session(Session::new(token.as_str(), args.refresh_token.as_str())),
			None => MemoryAuth::new(),
		});
		let router = Arc::new(MemoryRouter::new(args.path.as_str()));
		let frame = Arc::new(MemoryFrame::new());
		let property = match (&args.property_id, &args.property_name) {
			(Some(id), Some(name)) => Some(Property::new(id.as_str(), name.as_str())),
			_ => None,
		};

		let ports = BridgePorts::new(Arc::clone(&auth), Arc::clone(&router), Arc::clone(&frame));
		let bridge = Bridge::mount(config, ports, property)?;
		Ok(Self { auth, router, frame, bridge })
	}

	async fn apply(&self, line: InputLine) -> Vec<Record> {
		let mut records = Vec::new();
		match line {
			InputLine::Message { origin, data } => self.deliver(origin, data, &mut records).await,
			InputLine::Host(HostInput::Path(path)) => {
				self.router.set_path(path.as_str());
				self.follow_router(&mut records);
			}
			InputLine::Host(HostInput::Property(property)) => {
				self.bridge.set_property(property);
			}
			InputLine::Host(HostInput::Auth(notice)) => self.auth.emit(notice.event, notice.session),
		}
		records.extend(self.drain());
		records
	}

	async fn deliver(&self, origin: String, data: Value, records: &mut Vec<Record>) {
		let Some(task) = self.bridge.receive(&origin, data) else {
			records.push(Record::Dropped { origin });
			return;
		};

		let event = task.message().event_name().to_string();
		match task.run().await {
			Ok(outcome) => records.push(Record::Outcome {
				event,
				outcome: outcome_label(&outcome),
			}),
			Err(err) => {
				warn!(target = "edwix", error = %err, "inbound message failed");
				records.push(match err {
					BridgeError::SessionMutation { operation, source } => Record::Alert {
						operation: operation.to_string(),
						reason: source.to_string(),
					},
					other => Record::Error { message: other.to_string() },
				});
			}
		}
		// The host re-renders the frame whenever its route moves.
		self.follow_router(records);
	}

	fn follow_router(&self, records: &mut Vec<Record>) {
		let path = self.router.current_path();
		if let Err(err) = self.bridge.path_changed(&path) {
			records.push(Record::Error { message: err.to_string() });
		}
	}

	fn drain(&self) -> Vec<Record> {
		let mut records = Vec::new();
		for call in self.auth.take_calls() {
			match call {
				AuthCall::GetSession => {}
				AuthCall::SetSession(tokens) => records.push(Record::SetSession {
					access_token: tokens.access_token,
				}),
				AuthCall::SignOut => records.push(Record::SignOut),
			}
		}
		records.extend(self.router.take_navigations().into_iter().map(|path| Record::Navigate { path }));
		records.extend(self.frame.take_loads().into_iter().map(|url| Record::Load { url: url.to_string() }));
		records.extend(self.frame.take_posted().into_iter().map(|posted| Record::Post {
			target_origin: posted.target_origin,
			message: posted.message,
		}));
		records
	}
}

fn outcome_label(outcome: &InboundOutcome) -> &'static str {
	match outcome {
		InboundOutcome::Ignored => "ignored",
		InboundOutcome::InSync => "in_sync",
		InboundOutcome::Navigated(_) => "navigated",
		InboundOutcome::SessionAdopted { .. } => "session_adopted",
		InboundOutcome::SignedOut { .. } => "signed_out",
		InboundOutcome::Aborted => "aborted",
		InboundOutcome::Discarded => "discarded",
	}
}

fn emit(out: &mut impl Write, records: &[Record]) -> Result<()> {
	for record in records {
		serde_json::to_writer(&mut *out, record)?;
		writeln!(out)?;
	}
	out.flush()?;
	Ok(())
}

/// Mounts a simulated bridge and feeds it `input` until end of stream.
pub async fn execute<R, W>(config: BridgeConfig, args: &SimulateArgs, input: R, out: &mut W) -> Result<()>
where
	R: AsyncBufRead + Unpin,
	W: Write,
{
	let simulator = Simulator::mount(config, args)?;
	emit(out, &simulator.drain())?;

	let mut lines = input.lines();
	while let Some(line) = lines.next_line().await? {
		let line = line.trim();
		if line.is_empty() {
			continue;
		}
		let records = match serde_json::from_str::<InputLine>(line) {
			Ok(parsed) => {
				debug!(target = "edwix", input = line, "simulating");
				simulator.apply(parsed).await
			}
			Err(err) => vec![Record::Error {
				message: format!("unrecognized input: {err}"),
			}],
		};
		emit(out, &records)?;
	}

	simulator.bridge.unmount();
	Ok(())
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn config() -> BridgeConfig {
		BridgeConfig::new("https://app.edwix.test").unwrap()
	}

	async fn run(args: SimulateArgs, input: &str) -> Vec<Value> {
		let mut out = Vec::new();
		execute(config(), &args, input.as_bytes(), &mut out).await.unwrap();
		String::from_utf8(out)
			.unwrap()
			.lines()
			.map(|line| serde_json::from_str(line).unwrap())
			.collect()
	}

	fn kinds(records: &[Value]) -> Vec<&str> {
		records.iter().map(|record| record["kind"].as_str().unwrap()).collect()
	}

	#[tokio::test]
	async fn mount_loads_frame_and_pushes_initial_state() {
		let args = SimulateArgs {
			path: "/documents".into(),
			property_id: Some("p1".into()),
			property_name: Some("Main street".into()),
			..SimulateArgs::default()
		};
		let records = run(args, "").await;

		assert_eq!(kinds(&records), vec!["load", "post", "post"]);
		assert_eq!(records[0]["url"], "https://app.edwix.test/documents?hideMenu=");
		assert_eq!(records[1]["message"], json!({ "event": "INITIAL_SESSION", "session": null }));
		assert_eq!(
			records[2]["message"],
			json!({ "event": "PROPERTY_CHANGED", "property": { "id": "p1", "name": "Main street" } })
		);
	}

	#[tokio::test]
	async fn child_navigation_moves_host_and_reloads_frame() {
		let input = r#"{"origin": "https://app.edwix.test", "data": {"event": "URL_CHANGED", "href": "https://app.edwix.test/en/settings"}}"#;
		let records = run(SimulateArgs::default(), input).await;
		let tail = &records[3..];

		assert_eq!(kinds(tail), vec!["outcome", "navigate", "load"]);
		assert_eq!(tail[0]["outcome"], "navigated");
		assert_eq!(tail[1]["path"], "/settings");
		assert_eq!(tail[2]["url"], "https://app.edwix.test/settings?hideMenu=");
	}

	#[tokio::test]
	async fn foreign_origin_and_garbage_are_reported() {
		let input = concat!(
			r#"{"origin": "https://evil.test", "data": {"event": "SIGNED_OUT", "session": null}}"#,
			"\n",
			"not json\n",
		);
		let records = run(SimulateArgs::default(), input).await;
		let tail = &records[3..];

		assert_eq!(kinds(tail), vec!["dropped", "error"]);
		assert_eq!(tail[0]["origin"], "https://evil.test");
	}

	#[tokio::test]
	async fn frame_sign_out_tears_down_host_session() {
		let args = SimulateArgs {
			path: "/documents".into(),
			session_token: Some("t1".into()),
			..SimulateArgs::default()
		};
		let input = r#"{"origin": "https://app.edwix.test", "data": {"event": "SIGNED_OUT", "session": null}}"#;
		let records = run(args, input).await;
		let tail = &records[3..];

		assert_eq!(kinds(tail), vec!["outcome", "sign_out", "navigate", "load", "post"]);
		assert_eq!(tail[0]["outcome"], "signed_out");
		assert_eq!(tail[2]["path"], "/auth/login");
		assert_eq!(tail[4]["message"], json!({ "event": "SIGNED_OUT", "session": null }));
	}

	#[tokio::test]
	async fn host_inputs_reach_the_frame() {
		let input = concat!(
			r#"{"property": {"id": "p2", "name": "Harbour view"}}"#,
			"\n",
			r#"{"property": {"id": "p2", "name": "Harbour view"}}"#,
			"\n",
			r#"{"auth": {"event": "TOKEN_REFRESHED", "session": {"access_token": "t2", "refresh_token": "r2"}}}"#,
			"\n",
			r#"{"path": "/reports"}"#,
			"\n",
		);
		let records = run(SimulateArgs::default(), input).await;
		let tail = &records[3..];

		assert_eq!(kinds(tail), vec!["post", "post", "load"]);
		assert_eq!(tail[0]["message"]["property"]["id"], "p2");
		assert_eq!(tail[1]["message"]["event"], "TOKEN_REFRESHED");
		assert_eq!(tail[2]["url"], "https://app.edwix.test/reports?hideMenu=");
	}
}
