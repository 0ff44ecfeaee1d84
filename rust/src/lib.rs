mod actions;
mod core;
mod errors;
mod logging;
mod session_store;
mod state;
mod updates;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;

use flume::{Receiver, Sender};

pub use actions::ClaimAction;
pub use errors::ClaimFlowError;
pub use session_store::{
    InMemorySessionStore, SessionStore, SharedSessionStore, SESSION_TOKEN_KEY,
};
pub use state::*;
pub use updates::*;

/// Consumes state snapshots on behalf of the presentation layer.
pub trait ClaimReconciler: Send + Sync + 'static {
    fn reconcile(&self, update: ClaimUpdate);
}

/// Handle to one claim session. Owns the actor thread that runs the flow;
/// all state mutation happens there.
pub struct ClaimApp {
    core_tx: Sender<CoreMsg>,
    update_rx: Receiver<ClaimUpdate>,
    listening: AtomicBool,
    shared_state: Arc<RwLock<ClaimState>>,
    session_store: SharedSessionStore,
}

impl ClaimApp {
    /// `claim_subject` is the route parameter naming the claimable item;
    /// `landing_url` is the URL the user arrived on, whose query string
    /// carries the one-time token.
    pub fn new(data_dir: String, claim_subject: String, landing_url: String) -> Arc<Self> {
        logging::init_logging();
        tracing::info!(claim_subject = %claim_subject, "ClaimApp::new() starting");

        let (update_tx, update_rx) = flume::unbounded();
        let (core_tx, core_rx) = flume::unbounded::<CoreMsg>();
        let shared_state = Arc::new(RwLock::new(ClaimState::empty()));
        let session_store: SharedSessionStore =
            Arc::new(RwLock::new(Arc::new(InMemorySessionStore::default())));

        // Actor loop thread (single threaded "claim actor").
        let core_tx_for_core = core_tx.clone();
        let shared_for_core = shared_state.clone();
        let store_for_core = session_store.clone();
        thread::spawn(move || {
            let mut core = crate::core::ClaimCore::new(
                update_tx,
                core_tx_for_core,
                data_dir,
                claim_subject,
                landing_url,
                shared_for_core,
                store_for_core,
            );
            while let Ok(msg) = core_rx.recv() {
                core.handle_message(msg);
            }
        });

        Arc::new(Self {
            core_tx,
            update_rx,
            listening: AtomicBool::new(false),
            shared_state,
            session_store,
        })
    }

    pub fn state(&self) -> ClaimState {
        match self.shared_state.read() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }

    pub fn dispatch(&self, action: ClaimAction) {
        // Contract: never block caller.
        let _ = self.core_tx.send(CoreMsg::Action(action));
    }

    pub fn listen_for_updates(&self, reconciler: Box<dyn ClaimReconciler>) {
        if self
            .listening
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // Avoid multiple listeners that would split messages.
            return;
        }

        let rx = self.update_rx.clone();
        thread::spawn(move || {
            while let Ok(update) = rx.recv() {
                reconciler.reconcile(update);
            }
        });
    }

    /// Replace the session-scoped token cache. The default keeps values in
    /// memory; hosts with a real per-tab store install their own here.
    pub fn set_session_store(&self, store: Box<dyn SessionStore>) {
        let store: Arc<dyn SessionStore> = Arc::from(store);
        match self.session_store.write() {
            Ok(mut slot) => {
                *slot = store;
            }
            Err(poison) => {
                *poison.into_inner() = store;
            }
        }
    }
}
