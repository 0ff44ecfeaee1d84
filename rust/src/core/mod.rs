mod config;
mod session;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use flume::Sender;

use crate::actions::ClaimAction;
use crate::errors::{ClaimFlowError, GENERIC_ERROR_MESSAGE};
use crate::session_store::{SharedSessionStore, SESSION_TOKEN_KEY};
use crate::state::{BusyState, ClaimPhase, ClaimState, SocialProfile};
use crate::updates::{ClaimUpdate, CoreMsg, InternalEvent};

use session::Session;

pub struct ClaimCore {
    pub state: ClaimState,
    rev: u64,

    update_sender: Sender<ClaimUpdate>,
    core_sender: Sender<CoreMsg>,
    shared_state: Arc<RwLock<ClaimState>>,
    session_store: SharedSessionStore,

    landing_url: String,
    config: config::ClaimConfig,
    runtime: tokio::runtime::Runtime,

    session: Option<Session>,

    // Shared HTTP client for all three flow steps.
    http_client: reqwest::Client,
    toast_dismiss_token: u64,
}

impl ClaimCore {
    pub fn new(
        update_sender: Sender<ClaimUpdate>,
        core_sender: Sender<CoreMsg>,
        data_dir: String,
        claim_subject: String,
        landing_url: String,
        shared_state: Arc<RwLock<ClaimState>>,
        session_store: SharedSessionStore,
    ) -> Self {
        let config = config::load_claim_config(&data_dir);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .enable_io()
            .build()
            .expect("tokio runtime");

        let mut state = ClaimState::empty();
        state.claim_subject = claim_subject;

        let mut this = Self {
            state,
            rev: 0,
            update_sender,
            core_sender,
            shared_state,
            session_store,
            landing_url,
            config,
            runtime,
            session: None,
            http_client: reqwest::Client::new(),
            toast_dismiss_token: 0,
        };
        this.state.token_explorer_url = this.token_explorer_link(&this.state.claim_subject);

        // Ensure ClaimApp::state() has an immediately-available snapshot.
        let snapshot = this.state.clone();
        this.commit_state_snapshot(&snapshot);
        this
    }

    pub fn handle_message(&mut self, msg: CoreMsg) {
        match msg {
            CoreMsg::Action(ref action) => {
                // Never log the landing URL: its query string carries the one-time token.
                tracing::info!(action = action.tag(), "dispatch");
                self.handle_action(action.clone());
            }
            CoreMsg::Internal(internal) => self.handle_internal(*internal),
        }
    }

    fn handle_action(&mut self, action: ClaimAction) {
        match action {
            ClaimAction::Start => self.start_session(),
            ClaimAction::ResolveAccount => self.resolve_account(),
            ClaimAction::SendAirdrop => self.send_airdrop(),
            ClaimAction::Stop => self.stop_session(),
        }
    }

    fn handle_internal(&mut self, internal: InternalEvent) {
        match internal {
            InternalEvent::ToastAutoDismiss { token } => self.handle_toast_auto_dismiss(token),
            // A completion that arrives after Stop belongs to a torn-down
            // session and must not mutate state.
            _ if self.session.is_none() => {
                tracing::warn!("completion for a defunct session, dropping");
            }
            InternalEvent::ProfileFetched { profile, error } => {
                self.handle_profile_fetched(profile, error)
            }
            InternalEvent::AccountFetched { account, error } => {
                self.handle_account_fetched(account, error)
            }
            InternalEvent::AirdropDispatched { ok, error } => {
                self.handle_airdrop_dispatched(ok, error)
            }
        }
    }

    fn handle_profile_fetched(&mut self, profile: Option<SocialProfile>, error: Option<String>) {
        self.state.busy.resolving_identity = false;
        match profile {
            Some(profile) => {
                self.state.profile = Some(profile);
                self.state.error = None;
                self.state.phase = ClaimPhase::IdentityReady;
            }
            None => {
                // Identity failures are terminal for the session.
                self.set_error(error);
                self.state.phase = ClaimPhase::Failed;
            }
        }
        self.emit_state();
    }

    fn handle_account_fetched(&mut self, account: Option<String>, error: Option<String>) {
        self.state.busy.resolving_account = false;
        match account {
            Some(account) => {
                self.state.address_explorer_url = Some(self.address_explorer_link(&account));
                self.state.account_address = Some(account);
                self.state.error = None;
                self.state.phase = ClaimPhase::AccountReady;
            }
            None => {
                // Identity is retained; the resolve action stays available.
                self.set_error(error);
                self.state.phase = ClaimPhase::IdentityReady;
            }
        }
        self.emit_state();
    }

    fn handle_airdrop_dispatched(&mut self, ok: bool, error: Option<String>) {
        self.state.busy.sending_airdrop = false;
        if ok {
            self.state.error = None;
            self.state.phase = ClaimPhase::Complete;
            self.toast("Airdrop sent successfully!");
            return;
        }
        // The address is retained; the dispatch action stays available.
        self.set_error(error);
        self.state.phase = ClaimPhase::AccountReady;
        self.emit_state();
    }

    /// Replace the active flow error. Failures without a recognizable message
    /// normalize to a generic one.
    fn set_error(&mut self, error: Option<String>) {
        self.state.error = Some(error.unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()));
    }

    fn next_rev(&mut self) -> u64 {
        self.rev = self.rev.wrapping_add(1);
        self.state.rev = self.rev;
        self.rev
    }

    fn commit_state_snapshot(&self, snapshot: &ClaimState) {
        match self.shared_state.write() {
            Ok(mut g) => *g = snapshot.clone(),
            Err(poison) => *poison.into_inner() = snapshot.clone(),
        }
    }

    fn emit_state(&mut self) {
        self.next_rev();
        let snapshot = self.state.clone();
        self.commit_state_snapshot(&snapshot);
        let _ = self.update_sender.send(ClaimUpdate::FullState(snapshot));
    }

    fn set_busy(&mut self, f: impl FnOnce(&mut BusyState)) {
        let mut next = self.state.busy.clone();
        f(&mut next);
        if next != self.state.busy {
            self.state.busy = next;
            self.emit_state();
        }
    }

    fn clear_busy(&mut self) {
        self.set_busy(|b| *b = BusyState::idle());
    }

    fn toast(&mut self, msg: impl Into<String>) {
        self.state.toast = Some(msg.into());
        self.toast_dismiss_token = self.toast_dismiss_token.saturating_add(1);
        self.schedule_toast_auto_dismiss(self.toast_dismiss_token);
        self.emit_state();
    }

    fn schedule_toast_auto_dismiss(&self, token: u64) {
        let tx = self.core_sender.clone();
        self.runtime.spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            let _ = tx.send(CoreMsg::Internal(Box::new(InternalEvent::ToastAutoDismiss {
                token,
            })));
        });
    }

    fn handle_toast_auto_dismiss(&mut self, token: u64) {
        if token != self.toast_dismiss_token {
            // A newer toast superseded this timer.
            return;
        }
        if self.state.toast.take().is_some() {
            self.emit_state();
        }
    }

    fn api_base_url(&self) -> String {
        if let Some(url) = &self.config.api_base_url {
            if !url.is_empty() {
                return url.trim_end_matches('/').to_string();
            }
        }
        if let Ok(url) = std::env::var("CLAIM_API_BASE_URL") {
            if !url.is_empty() {
                return url.trim_end_matches('/').to_string();
            }
        }
        config::DEFAULT_API_BASE_URL.to_string()
    }

    fn token_explorer_link(&self, subject: &str) -> String {
        let base = self
            .config
            .token_explorer_base_url
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(config::DEFAULT_TOKEN_EXPLORER_BASE_URL);
        format!("{}/{}", base.trim_end_matches('/'), subject)
    }

    fn address_explorer_link(&self, address: &str) -> String {
        let base = self
            .config
            .address_explorer_base_url
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(config::DEFAULT_ADDRESS_EXPLORER_BASE_URL);
        format!("{}/{}", base.trim_end_matches('/'), address)
    }
}
