//! Scriptable stub of the claim backend.
//!
//! Serves the three endpoints the claim flow talks to, with per-endpoint
//! response overrides so tests can force failures. E2E tests embed it
//! in-process on an ephemeral port; the `claimhub` binary runs it standalone
//! for manual poking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

#[derive(Clone)]
pub struct HubState {
    inner: Arc<HubInner>,
}

struct HubInner {
    profile_status: AtomicU16,
    profile_body: Mutex<Value>,
    account_status: AtomicU16,
    account_body: Mutex<Value>,
    airdrop_status: AtomicU16,
    requests: Mutex<Vec<String>>,
}

impl Default for HubState {
    fn default() -> Self {
        Self {
            inner: Arc::new(HubInner {
                profile_status: AtomicU16::new(200),
                profile_body: Mutex::new(json!({
                    "profile": { "data": { "id": "u1", "name": "Alice", "username": "alice" } }
                })),
                account_status: AtomicU16::new(200),
                account_body: Mutex::new(json!({
                    "account": "0xDEAD000000000000000000000000000000000000"
                })),
                airdrop_status: AtomicU16::new(200),
                requests: Mutex::new(Vec::new()),
            }),
        }
    }
}

impl HubState {
    pub fn set_profile_response(&self, status: u16, body: Value) {
        self.inner.profile_status.store(status, Ordering::SeqCst);
        set_value(&self.inner.profile_body, body);
    }

    pub fn set_account_response(&self, status: u16, body: Value) {
        self.inner.account_status.store(status, Ordering::SeqCst);
        set_value(&self.inner.account_body, body);
    }

    pub fn set_airdrop_status(&self, status: u16) {
        self.inner.airdrop_status.store(status, Ordering::SeqCst);
    }

    /// One line per request received, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        match self.inner.requests.lock() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }

    fn record(&self, line: String) {
        match self.inner.requests.lock() {
            Ok(mut g) => g.push(line),
            Err(poison) => poison.into_inner().push(line),
        }
    }
}

fn set_value(slot: &Mutex<Value>, value: Value) {
    match slot.lock() {
        Ok(mut g) => *g = value,
        Err(poison) => *poison.into_inner() = value,
    }
}

fn get_value(slot: &Mutex<Value>) -> Value {
    match slot.lock() {
        Ok(g) => g.clone(),
        Err(poison) => poison.into_inner().clone(),
    }
}

fn status_from(status: &AtomicU16) -> StatusCode {
    StatusCode::from_u16(status.load(Ordering::SeqCst)).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

pub fn router(state: HubState) -> Router {
    Router::new()
        .route("/api/auth/twitter/success", get(success))
        .route("/api/auth/twitter/getAccountAddress", get(account_address))
        .route(
            "/api/auth/twitter/sendAirdrop/:subject/:address",
            get(send_airdrop),
        )
        .with_state(state)
}

async fn success(
    State(hub): State<HubState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let token = params.get("token").cloned().unwrap_or_default();
    hub.record(format!("success token={token}"));
    (
        status_from(&hub.inner.profile_status),
        Json(get_value(&hub.inner.profile_body)),
    )
}

async fn account_address(
    State(hub): State<HubState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let user_id = params.get("userId").cloned().unwrap_or_default();
    hub.record(format!("getAccountAddress userId={user_id}"));
    (
        status_from(&hub.inner.account_status),
        Json(get_value(&hub.inner.account_body)),
    )
}

async fn send_airdrop(
    State(hub): State<HubState>,
    Path((subject, address)): Path<(String, String)>,
) -> impl IntoResponse {
    hub.record(format!("sendAirdrop subject={subject} address={address}"));
    let status = status_from(&hub.inner.airdrop_status);
    if status.is_success() {
        (status, Json(json!({ "ok": true })))
    } else {
        (status, Json(json!({ "error": "airdrop failed" })))
    }
}

/// A hub serving on an ephemeral local port. Dropping it shuts the server down.
pub struct ClaimHub {
    pub base_url: String,
    state: HubState,
    _runtime: tokio::runtime::Runtime,
}

impl ClaimHub {
    pub fn start() -> anyhow::Result<Self> {
        let state = HubState::default();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;
        let listener = runtime.block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))?;
        let addr = listener.local_addr()?;

        let app = router(state.clone());
        runtime.spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::warn!(%e, "claimhub server exited");
            }
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
            state,
            _runtime: runtime,
        })
    }

    pub fn set_profile_response(&self, status: u16, body: Value) {
        self.state.set_profile_response(status, body);
    }

    pub fn set_account_response(&self, status: u16, body: Value) {
        self.state.set_account_response(status, body);
    }

    pub fn set_airdrop_status(&self, status: u16) {
        self.state.set_airdrop_status(status);
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.requests()
    }
}
