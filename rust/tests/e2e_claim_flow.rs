//! E2E claim-flow tests: token intake, identity exchange, account resolution,
//! airdrop dispatch. Uses claimhub for the local backend stub.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use claim_core::{
    ClaimAction, ClaimApp, ClaimPhase, ClaimReconciler, ClaimUpdate, SessionStore,
};
use serde_json::json;
use tempfile::tempdir;

#[path = "support/mod.rs"]
mod support;

use support::TestBackend;

fn wait_until(what: &str, timeout: Duration, mut f: impl FnMut() -> bool) {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if f() {
            return;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    panic!("{what}: condition not met within {timeout:?}");
}

fn landing_url(token: Option<&str>) -> String {
    match token {
        Some(t) => format!("https://claim.example/claim/tok-1/success?token={t}"),
        None => "https://claim.example/claim/tok-1/success".to_string(),
    }
}

fn make_app(backend: &TestBackend, landing: &str) -> Arc<ClaimApp> {
    let dir = tempdir().unwrap();
    let data_dir = dir.path().to_string_lossy().into_owned();
    // Leak the tempdir so the config stays readable for the app's lifetime.
    std::mem::forget(dir);
    backend.write_config(&data_dir);
    ClaimApp::new(data_dir, "tok-1".into(), landing.to_string())
}

#[derive(Clone)]
struct Collector {
    updates: Arc<Mutex<Vec<ClaimUpdate>>>,
}

impl ClaimReconciler for Collector {
    fn reconcile(&self, update: ClaimUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}

struct RecordingStore {
    writes: Arc<Mutex<Vec<(String, String)>>>,
}

impl SessionStore for RecordingStore {
    fn put(&self, key: &str, value: &str) {
        self.writes.lock().unwrap().push((key.into(), value.into()));
    }
}

#[test]
fn missing_token_is_fatal_without_any_request() {
    let backend = TestBackend::start();
    let app = make_app(&backend, &landing_url(None));

    app.dispatch(ClaimAction::Start);

    wait_until("flow failed", Duration::from_secs(5), || {
        app.state().phase == ClaimPhase::Failed
    });

    let state = app.state();
    assert_eq!(state.error.as_deref(), Some("No token provided"));
    assert!(state.profile.is_none());
    assert!(backend.hub.requests().is_empty(), "no request may be issued");
}

#[test]
fn identity_exchange_mirrors_profile() {
    let backend = TestBackend::start();
    let app = make_app(&backend, &landing_url(Some("abc123")));

    let updates = Arc::new(Mutex::new(Vec::<ClaimUpdate>::new()));
    app.listen_for_updates(Box::new(Collector {
        updates: updates.clone(),
    }));

    app.dispatch(ClaimAction::Start);

    wait_until("identity ready", Duration::from_secs(10), || {
        app.state().phase == ClaimPhase::IdentityReady
    });

    let state = app.state();
    assert!(state.error.is_none());
    let profile = state.profile.expect("profile stored");
    assert_eq!(profile.data.id, "u1");
    assert_eq!(profile.data.name, "Alice");
    assert_eq!(profile.data.username, "alice");
    assert_eq!(state.busy, claim_core::BusyState::idle());

    // The stub saw exactly the token from the landing URL.
    assert_eq!(backend.hub.requests(), vec!["success token=abc123"]);

    // Snapshot revs are strictly increasing on the update stream.
    let revs: Vec<u64> = updates.lock().unwrap().iter().map(|u| u.rev()).collect();
    assert!(!revs.is_empty());
    assert!(revs.windows(2).all(|w| w[0] < w[1]), "revs not monotonic: {revs:?}");
}

#[test]
fn identity_exchange_failure_is_terminal() {
    let backend = TestBackend::start();
    backend
        .hub
        .set_profile_response(500, json!({ "error": "boom" }));
    let app = make_app(&backend, &landing_url(Some("abc123")));

    app.dispatch(ClaimAction::Start);

    wait_until("flow failed", Duration::from_secs(10), || {
        app.state().phase == ClaimPhase::Failed
    });

    let state = app.state();
    assert_eq!(state.error.as_deref(), Some("Failed to fetch profile"));
    assert!(state.profile.is_none());
}

#[test]
fn account_resolution_stores_address_verbatim() {
    let backend = TestBackend::start();
    backend
        .hub
        .set_account_response(200, json!({ "account": "0xDEADBEEF" }));
    let app = make_app(&backend, &landing_url(Some("abc123")));

    app.dispatch(ClaimAction::Start);
    wait_until("identity ready", Duration::from_secs(10), || {
        app.state().phase == ClaimPhase::IdentityReady
    });

    app.dispatch(ClaimAction::ResolveAccount);
    wait_until("account ready", Duration::from_secs(10), || {
        app.state().phase == ClaimPhase::AccountReady
    });

    let state = app.state();
    assert_eq!(state.account_address.as_deref(), Some("0xDEADBEEF"));
    assert!(state.error.is_none());
    assert!(state
        .address_explorer_url
        .as_deref()
        .unwrap()
        .ends_with("0xDEADBEEF"));
    assert!(backend
        .hub
        .requests()
        .contains(&"getAccountAddress userId=u1".to_string()));
}

#[test]
fn airdrop_failure_keeps_retry_available() {
    let backend = TestBackend::start();
    backend.hub.set_airdrop_status(500);
    let app = make_app(&backend, &landing_url(Some("abc123")));

    app.dispatch(ClaimAction::Start);
    wait_until("identity ready", Duration::from_secs(10), || {
        app.state().phase == ClaimPhase::IdentityReady
    });
    app.dispatch(ClaimAction::ResolveAccount);
    wait_until("account ready", Duration::from_secs(10), || {
        app.state().phase == ClaimPhase::AccountReady
    });

    app.dispatch(ClaimAction::SendAirdrop);
    wait_until("dispatch failed", Duration::from_secs(10), || {
        app.state().error.is_some()
    });

    let state = app.state();
    assert_eq!(state.error.as_deref(), Some("Failed to send airdrop"));
    assert_eq!(state.phase, ClaimPhase::AccountReady);
    assert_eq!(
        state.account_address.as_deref(),
        Some("0xDEAD000000000000000000000000000000000000"),
        "address must be retained for retry"
    );
    assert!(state.can_send_airdrop());

    // Manual retry succeeds once the backend recovers.
    backend.hub.set_airdrop_status(200);
    app.dispatch(ClaimAction::SendAirdrop);
    wait_until("dispatch complete", Duration::from_secs(10), || {
        app.state().phase == ClaimPhase::Complete
    });

    let state = app.state();
    assert!(state.error.is_none());
    assert_eq!(state.toast.as_deref(), Some("Airdrop sent successfully!"));
    assert!(!state.can_send_airdrop());

    let requests = backend.hub.requests();
    let dispatches = requests
        .iter()
        .filter(|r| r.starts_with("sendAirdrop"))
        .count();
    assert_eq!(dispatches, 2);
    assert!(requests.contains(
        &"sendAirdrop subject=tok-1 address=0xDEAD000000000000000000000000000000000000"
            .to_string()
    ));
}

#[test]
fn token_is_cached_even_when_exchange_fails() {
    let backend = TestBackend::start();
    backend
        .hub
        .set_profile_response(500, json!({ "error": "boom" }));
    let app = make_app(&backend, &landing_url(Some("abc123")));

    let writes = Arc::new(Mutex::new(Vec::new()));
    app.set_session_store(Box::new(RecordingStore {
        writes: writes.clone(),
    }));

    app.dispatch(ClaimAction::Start);
    wait_until("flow failed", Duration::from_secs(10), || {
        app.state().phase == ClaimPhase::Failed
    });

    let writes = writes.lock().unwrap();
    assert_eq!(
        writes.as_slice(),
        &[("twitter_token".to_string(), "abc123".to_string())]
    );
}
