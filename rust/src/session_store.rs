use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Fixed key under which the raw one-time token is cached for the session.
pub const SESSION_TOKEN_KEY: &str = "twitter_token";

/// Session-scoped key/value cache. The core only writes (best effort, before
/// the identity exchange); reading the value back — e.g. to recover the token
/// across a reload of the same tab — is the embedder's concern.
pub trait SessionStore: Send + Sync + 'static {
    fn put(&self, key: &str, value: &str);
}

/// Slot holding the installed store; swappable via `ClaimApp::set_session_store`.
pub type SharedSessionStore = Arc<RwLock<Arc<dyn SessionStore>>>;

/// Default store: keeps values in memory for the lifetime of the process.
#[derive(Default)]
pub struct InMemorySessionStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemorySessionStore {
    pub fn get(&self, key: &str) -> Option<String> {
        match self.values.read() {
            Ok(g) => g.get(key).cloned(),
            Err(poison) => poison.into_inner().get(key).cloned(),
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn put(&self, key: &str, value: &str) {
        match self.values.write() {
            Ok(mut g) => {
                g.insert(key.to_string(), value.to_string());
            }
            Err(poison) => {
                poison.into_inner().insert(key.to_string(), value.to_string());
            }
        }
    }
}
