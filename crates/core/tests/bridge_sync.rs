use std::sync::Arc;

use bridge::memory::{AuthCall, MemoryAuth, MemoryFrame, MemoryRouter};
use bridge::protocol::{AuthEvent, BridgeMessage, PROPERTY_CHANGED, Property, Session, SessionTokens};
use bridge::{Bridge, BridgeConfig, BridgeError, BridgePorts, InboundOutcome, RouterPort, SessionOperation};
use serde_json::{Value, json};

const APP: &str = "https://app.edwix.test";

type TestBridge = Bridge<MemoryAuth, MemoryRouter, MemoryFrame>;

struct Harness {
	auth: Arc<MemoryAuth>,
	router: Arc<MemoryRouter>,
	frame: Arc<MemoryFrame>,
	bridge: TestBridge,
}

impl Harness {
	fn mount(auth: MemoryAuth, path: &str, property: Option<Property>) -> Self {
		let auth = Arc::new(auth);
		let router = Arc::new(MemoryRouter::new(path));
		let frame = Arc::new(MemoryFrame::new());
		let config = BridgeConfig::new(APP).unwrap();
		let bridge = Bridge::mount(
			config,
			BridgePorts::new(Arc::clone(&auth), Arc::clone(&router), Arc::clone(&frame)),
			property,
		)
		.unwrap();
		Self { auth, router, frame, bridge }
	}

	fn signed_in(token: &str, path: &str) -> Self {
		Self::mount(MemoryAuth::with_session(session(token)), path, None)
	}

	async fn deliver(&self, data: Value) -> Option<bridge::Result<InboundOutcome>> {
		let task = self.bridge.receive(APP, data)?;
		Some(task.run().await)
	}

	fn property_messages(&self) -> Vec<BridgeMessage> {
		self.frame
			.messages()
			.into_iter()
			.filter(|message| message.event_name() == PROPERTY_CHANGED)
			.collect()
	}
}

fn session(token: &str) -> Session {
	Session::new(token, format!("{token}-refresh"))
}

fn auth_message(event: &str, session: Option<Session>) -> Value {
	json!({ "event": event, "session": session })
}

#[tokio::test]
async fn mount_creates_frame_at_child_url() {
	let harness = Harness::mount(MemoryAuth::new(), "/documents/42", None);
	let loads = harness.frame.loads();
	assert_eq!(loads.len(), 1);
	assert_eq!(loads[0].as_str(), "https://app.edwix.test/documents/42?hideMenu=");
	assert_eq!(harness.bridge.frame_url(), loads[0]);
}

#[tokio::test]
async fn auth_changes_are_forwarded_verbatim() {
	let harness = Harness::mount(MemoryAuth::new(), "/", None);
	harness.frame.take_posted();

	harness.auth.emit(AuthEvent::TokenRefreshed, Some(session("t2")));

	let posted = harness.frame.take_posted();
	assert_eq!(posted.len(), 1);
	assert_eq!(posted[0].target_origin, APP);
	assert_eq!(posted[0].message, BridgeMessage::auth(AuthEvent::TokenRefreshed, Some(session("t2"))));
}

#[tokio::test]
async fn untrusted_origin_is_rejected_before_decoding() {
	let harness = Harness::signed_in("t1", "/");

	for origin in ["https://evil.test", "https://app.edwix.test.evil.test", "http://app.edwix.test", ""] {
		assert!(harness.bridge.receive(origin, auth_message("SIGNED_OUT", None)).is_none());
	}
	assert!(harness.auth.calls().is_empty());
	assert!(harness.router.navigations().is_empty());
}

#[tokio::test]
async fn malformed_payloads_are_ignored() {
	let harness = Harness::signed_in("t1", "/");

	assert!(harness.bridge.receive(APP, json!("hello")).is_none());
	assert!(harness.bridge.receive(APP, json!({ "event": "URL_CHANGED" })).is_none());
	assert!(harness.auth.calls().is_empty());
}

#[tokio::test]
async fn url_change_follows_child_route_once() {
	let harness = Harness::mount(MemoryAuth::new(), "/", None);

	let outcome = harness.deliver(json!({ "event": "URL_CHANGED", "href": "https://app.edwix.test/en/documents/42" })).await;
	assert_eq!(outcome, Some(Ok(InboundOutcome::Navigated("/documents/42".into()))));

	let outcome = harness.deliver(json!({ "event": "URL_CHANGED", "href": "https://app.edwix.test/fr/documents/42" })).await;
	assert_eq!(outcome, Some(Ok(InboundOutcome::InSync)));

	assert_eq!(harness.router.navigations(), vec!["/documents/42".to_string()]);
	assert_eq!(harness.auth.calls(), vec![AuthCall::GetSession, AuthCall::GetSession]);
	assert!(harness.auth.mutations().is_empty());
}

#[tokio::test]
async fn unlocalized_path_is_kept_as_is() {
	let harness = Harness::mount(MemoryAuth::new(), "/", None);

	let outcome = harness.deliver(json!({ "event": "URL_CHANGED", "href": "https://app.edwix.test/entities/7" })).await;
	assert_eq!(outcome, Some(Ok(InboundOutcome::Navigated("/entities/7".into()))));
}

#[tokio::test]
async fn new_token_from_frame_is_adopted() {
	let harness = Harness::signed_in("t1", "/documents");

	let outcome = harness.deliver(auth_message("TOKEN_REFRESHED", Some(session("t2")))).await;

	assert_eq!(outcome, Some(Ok(InboundOutcome::SessionAdopted { navigated_to: None })));
	assert_eq!(
		harness.auth.mutations(),
		vec![AuthCall::SetSession(SessionTokens {
			access_token: "t2".into(),
			refresh_token: "t2-refresh".into(),
		})]
	);
	assert!(harness.router.navigations().is_empty());
}

#[tokio::test]
async fn same_token_from_frame_changes_nothing() {
	let harness = Harness::signed_in("t1", "/documents");

	let outcome = harness.deliver(auth_message("TOKEN_REFRESHED", Some(session("t1")))).await;

	assert_eq!(outcome, Some(Ok(InboundOutcome::Ignored)));
	assert!(harness.auth.mutations().is_empty());
}

#[tokio::test]
async fn sign_in_from_frame_adopts_and_goes_home() {
	let harness = Harness::mount(MemoryAuth::new(), "/auth/login", None);

	let outcome = harness.deliver(auth_message("SIGNED_IN", Some(session("t1")))).await;
	assert_eq!(outcome, Some(Ok(InboundOutcome::SessionAdopted { navigated_to: Some("/".into()) })));

	let outcome = harness.deliver(auth_message("SIGNED_IN", Some(session("t1")))).await;
	assert_eq!(outcome, Some(Ok(InboundOutcome::Ignored)));

	assert_eq!(harness.router.navigations(), vec!["/".to_string()]);
	assert_eq!(harness.auth.mutations().len(), 1);
}

#[tokio::test]
async fn initial_session_from_frame_is_adopted() {
	let harness = Harness::mount(MemoryAuth::new(), "/documents", None);

	let outcome = harness.deliver(auth_message("INITIAL_SESSION", Some(session("t1")))).await;

	assert_eq!(outcome, Some(Ok(InboundOutcome::SessionAdopted { navigated_to: None })));
	assert_eq!(harness.auth.session().map(|s| s.access_token), Some("t1".to_string()));
}

#[tokio::test]
async fn sign_out_requires_a_host_session() {
	let harness = Harness::mount(MemoryAuth::new(), "/documents", None);

	let outcome = harness.deliver(auth_message("SIGNED_OUT", None)).await;

	assert_eq!(outcome, Some(Ok(InboundOutcome::Ignored)));
	assert!(harness.auth.mutations().is_empty());
	assert!(harness.router.navigations().is_empty());
}

#[tokio::test]
async fn sign_out_from_frame_tears_down_host_session() {
	let harness = Harness::signed_in("t1", "/documents");

	let outcome = harness.deliver(auth_message("SIGNED_OUT", None)).await;

	assert_eq!(outcome, Some(Ok(InboundOutcome::SignedOut { navigated_to: Some("/auth/login".into()) })));
	assert_eq!(harness.auth.mutations(), vec![AuthCall::SignOut]);
	assert_eq!(harness.router.navigations(), vec!["/auth/login".to_string()]);
	assert!(harness.auth.session().is_none());
}

#[tokio::test]
async fn empty_initial_session_signs_host_out() {
	let harness = Harness::signed_in("t1", "/documents");

	let outcome = harness.deliver(auth_message("INITIAL_SESSION", None)).await;

	assert_eq!(outcome, Some(Ok(InboundOutcome::SignedOut { navigated_to: Some("/auth/login".into()) })));
	assert_eq!(harness.auth.mutations(), vec![AuthCall::SignOut]);
}

#[tokio::test]
async fn failed_session_fetch_aborts_without_effects() {
	let harness = Harness::signed_in("t1", "/documents");
	harness.auth.fail_get_session(true);

	let outcome = harness.deliver(auth_message("SIGNED_OUT", None)).await;

	assert_eq!(outcome, Some(Ok(InboundOutcome::Aborted)));
	assert!(harness.auth.mutations().is_empty());
	assert!(harness.router.navigations().is_empty());
}

#[tokio::test]
async fn failed_session_fetch_blocks_route_sync() {
	let harness = Harness::signed_in("t1", "/documents");
	harness.auth.fail_get_session(true);

	let outcome = harness.deliver(json!({ "event": "URL_CHANGED", "href": "https://app.edwix.test/en/documents/42" })).await;

	assert_eq!(outcome, Some(Ok(InboundOutcome::Aborted)));
	assert!(harness.router.navigations().is_empty());
	assert_eq!(harness.router.current_path(), "/documents");
}

#[tokio::test]
async fn rejected_mutation_is_reported() {
	let harness = Harness::signed_in("t1", "/documents");
	harness.auth.fail_mutations(true);

	let outcome = harness.deliver(auth_message("TOKEN_REFRESHED", Some(session("t2")))).await;

	match outcome {
		Some(Err(BridgeError::SessionMutation { operation, .. })) => assert_eq!(operation, SessionOperation::SetSession),
		other => panic!("expected a session mutation error, got {other:?}"),
	}
	assert!(harness.router.navigations().is_empty());
}

#[tokio::test]
async fn initial_property_is_posted_on_mount() {
	let property = Property::new("p1", "Main street");
	let harness = Harness::mount(MemoryAuth::new(), "/", Some(property.clone()));

	assert_eq!(harness.property_messages(), vec![BridgeMessage::property_changed(Some(property))]);
}

#[tokio::test]
async fn property_changes_are_posted_once_each() {
	let first = Property::new("p1", "Main street");
	let second = Property::new("p2", "Harbour view");
	let harness = Harness::mount(MemoryAuth::new(), "/", Some(first.clone()));

	assert!(!harness.bridge.set_property(Some(first.clone())));
	assert!(harness.bridge.set_property(Some(second.clone())));
	assert!(harness.bridge.set_property(None));
	assert!(!harness.bridge.set_property(None));

	assert_eq!(
		harness.property_messages(),
		vec![
			BridgeMessage::property_changed(Some(first)),
			BridgeMessage::property_changed(Some(second)),
			BridgeMessage::property_changed(None),
		]
	);
}

#[tokio::test]
async fn messages_without_a_frame_are_dropped() {
	let harness = Harness::mount(MemoryAuth::new(), "/", None);
	harness.frame.detach();
	harness.frame.take_posted();

	assert!(harness.bridge.set_property(Some(Property::new("p1", "Main street"))));
	harness.auth.emit(AuthEvent::SignedOut, None);

	assert!(harness.frame.posted().is_empty());
}

#[tokio::test]
async fn path_change_recreates_frame_only_when_url_differs() {
	let harness = Harness::mount(MemoryAuth::new(), "/", None);
	harness.frame.take_loads();

	assert!(!harness.bridge.path_changed("/").unwrap());
	assert!(harness.bridge.path_changed("/documents/42").unwrap());

	let loads = harness.frame.take_loads();
	assert_eq!(loads.len(), 1);
	assert_eq!(loads[0].as_str(), "https://app.edwix.test/documents/42?hideMenu=");
}

#[tokio::test]
async fn frame_recreation_discards_inflight_handlers() {
	let harness = Harness::signed_in("t1", "/documents");
	let gate = harness.auth.hold_next_fetch();

	let task = harness.bridge.receive(APP, auth_message("SIGNED_OUT", None)).unwrap();
	let pending = tokio::spawn(task.run());
	tokio::task::yield_now().await;

	harness.bridge.path_changed("/settings").unwrap();
	gate.release();

	assert_eq!(pending.await.unwrap(), Ok(InboundOutcome::Discarded));
	assert!(harness.auth.mutations().is_empty());
	assert!(harness.router.navigations().is_empty());
}

#[tokio::test]
async fn teardown_discards_inflight_handlers() {
	let Harness { auth, router, bridge, .. } = Harness::signed_in("t1", "/documents");
	let gate = auth.hold_next_fetch();

	let task = bridge.receive(APP, auth_message("SIGNED_OUT", None)).unwrap();
	let pending = tokio::spawn(task.run());
	tokio::task::yield_now().await;

	bridge.unmount();
	gate.release();

	assert_eq!(pending.await.unwrap(), Ok(InboundOutcome::Discarded));
	assert!(auth.mutations().is_empty());
	assert!(router.navigations().is_empty());
}

#[tokio::test]
async fn teardown_during_adoption_skips_navigation() {
	let Harness { auth, router, bridge, .. } = Harness::mount(MemoryAuth::new(), "/auth/login", None);
	let gate = auth.hold_next_mutation();

	let task = bridge.receive(APP, auth_message("SIGNED_IN", Some(session("t1")))).unwrap();
	let pending = tokio::spawn(task.run());
	tokio::task::yield_now().await;
	assert_eq!(auth.mutations().len(), 1);

	bridge.unmount();
	gate.release();

	assert_eq!(pending.await.unwrap(), Ok(InboundOutcome::Discarded));
	assert!(router.navigations().is_empty());
	assert_eq!(router.current_path(), "/auth/login");
}

#[tokio::test]
async fn teardown_during_sign_out_skips_navigation() {
	let Harness { auth, router, bridge, .. } = Harness::signed_in("t1", "/documents");
	let gate = auth.hold_next_mutation();

	let task = bridge.receive(APP, auth_message("SIGNED_OUT", None)).unwrap();
	let pending = tokio::spawn(task.run());
	tokio::task::yield_now().await;
	assert_eq!(auth.mutations(), vec![AuthCall::SignOut]);

	bridge.unmount();
	gate.release();

	assert_eq!(pending.await.unwrap(), Ok(InboundOutcome::Discarded));
	assert!(router.navigations().is_empty());
}

#[tokio::test]
async fn unmount_releases_auth_subscription() {
	let Harness { auth, frame, bridge, .. } = Harness::mount(MemoryAuth::new(), "/", None);
	assert_eq!(auth.subscriber_count(), 1);

	bridge.unmount();
	frame.take_posted();

	assert_eq!(auth.subscriber_count(), 0);
	auth.emit(AuthEvent::SignedIn, Some(session("t1")));
	assert!(frame.posted().is_empty());
}

#[tokio::test]
async fn interleaved_handlers_apply_independently() {
	let harness = Harness::signed_in("t1", "/documents");

	let url = harness
		.bridge
		.receive(APP, json!({ "event": "URL_CHANGED", "href": "https://app.edwix.test/en/settings" }))
		.unwrap();
	let refresh = harness.bridge.receive(APP, auth_message("TOKEN_REFRESHED", Some(session("t2")))).unwrap();

	let (refreshed, navigated) = tokio::join!(refresh.run(), url.run());

	assert_eq!(refreshed, Ok(InboundOutcome::SessionAdopted { navigated_to: None }));
	assert_eq!(navigated, Ok(InboundOutcome::Navigated("/settings".into())));
	assert_eq!(harness.auth.mutations().len(), 1);
}
