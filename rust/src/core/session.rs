// Session lifecycle + networking side effects.

use super::*;

/// One claim session. `alive` is flipped off on Stop so that in-flight
/// completions can tell they belong to a torn-down session.
pub(super) struct Session {
    pub alive: Arc<AtomicBool>,
}

impl ClaimCore {
    pub(super) fn start_session(&mut self) {
        if self.session.is_some() {
            tracing::warn!("start on a live session, ignoring");
            return;
        }
        if self.state.phase != ClaimPhase::Init {
            // A missing-token failure is terminal; only a fresh controller retries.
            tracing::warn!(phase = ?self.state.phase, "start after the session already ran, ignoring");
            return;
        }

        let Some(token) = extract_claim_token(&self.landing_url) else {
            self.set_error(Some(ClaimFlowError::MissingToken.to_string()));
            self.state.phase = ClaimPhase::Failed;
            self.emit_state();
            return;
        };

        // Cache the raw token before the exchange so a reload within the same
        // tab can recover it. Best effort; the flow never reads it back.
        self.store_session_token(&token);

        let session = Session {
            alive: Arc::new(AtomicBool::new(true)),
        };
        let alive = session.alive.clone();
        self.session = Some(session);

        let url = format!("{}/api/auth/twitter/success", self.api_base_url());
        let client = self.http_client.clone();
        let tx = self.core_sender.clone();

        self.state.phase = ClaimPhase::ResolvingIdentity;
        self.set_busy(|b| b.resolving_identity = true);

        self.runtime.spawn(async move {
            let result = fetch_profile(&client, &url, &token).await;
            // Session lifecycle guard: never report into a torn-down session.
            if !alive.load(Ordering::SeqCst) {
                return;
            }
            let event = match result {
                Ok(profile) => InternalEvent::ProfileFetched {
                    profile: Some(profile),
                    error: None,
                },
                Err(msg) => InternalEvent::ProfileFetched {
                    profile: None,
                    error: Some(msg),
                },
            };
            let _ = tx.send(CoreMsg::Internal(Box::new(event)));
        });
    }

    pub(super) fn stop_session(&mut self) {
        if let Some(sess) = self.session.take() {
            sess.alive.store(false, Ordering::SeqCst);
        }
        // In-flight completions will never be applied; leave no busy flag stuck.
        self.clear_busy();
    }

    pub(super) fn resolve_account(&mut self) {
        if self.state.busy.resolving_account {
            tracing::warn!("account resolution already in flight, ignoring");
            return;
        }
        if self.state.account_address.is_some() {
            tracing::warn!("account already resolved, ignoring");
            return;
        }
        let Some(user_id) = self.state.profile.as_ref().map(|p| p.data.id.clone()) else {
            tracing::warn!("account resolution before identity is ready, ignoring");
            return;
        };
        let Some(sess) = self.session.as_ref() else {
            tracing::warn!("account resolution without a live session, ignoring");
            return;
        };
        let alive = sess.alive.clone();

        let url = format!("{}/api/auth/twitter/getAccountAddress", self.api_base_url());
        let client = self.http_client.clone();
        let tx = self.core_sender.clone();

        self.state.phase = ClaimPhase::ResolvingAccount;
        self.set_busy(|b| b.resolving_account = true);

        self.runtime.spawn(async move {
            let result = fetch_account(&client, &url, &user_id).await;
            if !alive.load(Ordering::SeqCst) {
                return;
            }
            let event = match result {
                Ok(account) => InternalEvent::AccountFetched {
                    account: Some(account),
                    error: None,
                },
                Err(msg) => InternalEvent::AccountFetched {
                    account: None,
                    error: Some(msg),
                },
            };
            let _ = tx.send(CoreMsg::Internal(Box::new(event)));
        });
    }

    pub(super) fn send_airdrop(&mut self) {
        if self.state.busy.sending_airdrop {
            tracing::warn!("airdrop dispatch already in flight, ignoring");
            return;
        }
        if self.state.phase == ClaimPhase::Complete {
            tracing::warn!("airdrop already dispatched, ignoring");
            return;
        }
        let Some(address) = self.state.account_address.clone() else {
            tracing::warn!("airdrop dispatch before an address is resolved, ignoring");
            return;
        };
        let Some(sess) = self.session.as_ref() else {
            tracing::warn!("airdrop dispatch without a live session, ignoring");
            return;
        };
        let alive = sess.alive.clone();

        let url = format!(
            "{}/api/auth/twitter/sendAirdrop/{}/{}",
            self.api_base_url(),
            self.state.claim_subject,
            address
        );
        let client = self.http_client.clone();
        let tx = self.core_sender.clone();

        self.state.phase = ClaimPhase::DispatchingTransfer;
        self.set_busy(|b| b.sending_airdrop = true);

        self.runtime.spawn(async move {
            let result = dispatch_airdrop(&client, &url).await;
            if !alive.load(Ordering::SeqCst) {
                return;
            }
            let event = match result {
                Ok(()) => InternalEvent::AirdropDispatched {
                    ok: true,
                    error: None,
                },
                Err(msg) => InternalEvent::AirdropDispatched {
                    ok: false,
                    error: Some(msg),
                },
            };
            let _ = tx.send(CoreMsg::Internal(Box::new(event)));
        });
    }

    fn store_session_token(&self, token: &str) {
        let store = match self.session_store.read() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        };
        store.put(SESSION_TOKEN_KEY, token);
    }
}

fn extract_claim_token(landing_url: &str) -> Option<String> {
    let parsed = url::Url::parse(landing_url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key.as_ref() == "token")
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.is_empty())
}

async fn fetch_profile(
    client: &reqwest::Client,
    url: &str,
    token: &str,
) -> Result<SocialProfile, String> {
    #[derive(serde::Deserialize)]
    struct ProfileEnvelope {
        profile: SocialProfile,
    }

    let resp = match client.get(url).query(&[("token", token)]).send().await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::warn!(%e, "profile exchange request failed");
            return Err(ClaimFlowError::ProfileFetch.to_string());
        }
    };
    if !resp.status().is_success() {
        tracing::warn!(status = %resp.status(), "profile exchange rejected");
        return Err(ClaimFlowError::ProfileFetch.to_string());
    }
    match resp.json::<ProfileEnvelope>().await {
        Ok(body) => Ok(body.profile),
        Err(e) => {
            tracing::warn!(%e, "profile exchange body malformed");
            Err(ClaimFlowError::ProfileFetch.to_string())
        }
    }
}

async fn fetch_account(
    client: &reqwest::Client,
    url: &str,
    user_id: &str,
) -> Result<String, String> {
    #[derive(serde::Deserialize)]
    struct AccountEnvelope {
        account: String,
    }

    let resp = match client.get(url).query(&[("userId", user_id)]).send().await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::warn!(%e, "account resolution request failed");
            return Err(ClaimFlowError::AccountFetch.to_string());
        }
    };
    if !resp.status().is_success() {
        tracing::warn!(status = %resp.status(), "account resolution rejected");
        return Err(ClaimFlowError::AccountFetch.to_string());
    }
    match resp.json::<AccountEnvelope>().await {
        Ok(body) => Ok(body.account),
        Err(e) => {
            tracing::warn!(%e, "account resolution body malformed");
            Err(ClaimFlowError::AccountFetch.to_string())
        }
    }
}

async fn dispatch_airdrop(client: &reqwest::Client, url: &str) -> Result<(), String> {
    match client.get(url).send().await {
        // Success is judged on status alone; this endpoint's body carries nothing we use.
        Ok(resp) if resp.status().is_success() => Ok(()),
        Ok(resp) => {
            tracing::warn!(status = %resp.status(), "airdrop dispatch rejected");
            Err(ClaimFlowError::TransferDispatch.to_string())
        }
        Err(e) => {
            tracing::warn!(%e, "airdrop dispatch request failed");
            Err(ClaimFlowError::TransferDispatch.to_string())
        }
    }
}
