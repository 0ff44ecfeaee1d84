use serde::{Deserialize, Serialize};

/// Where the session is in the claim flow. Failures of the account or
/// transfer steps fall back to the phase whose data is still retained;
/// `Failed` is reserved for the unrecoverable token/identity failures.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ClaimPhase {
    Init,
    ResolvingIdentity,
    IdentityReady,
    ResolvingAccount,
    AccountReady,
    DispatchingTransfer,
    Complete,
    Failed,
}

/// Per-step in-flight flags. Each step is single-flight: its action is
/// rejected while its own flag is set.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct BusyState {
    pub resolving_identity: bool,
    pub resolving_account: bool,
    pub sending_airdrop: bool,
}

impl BusyState {
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Social profile as returned by the identity exchange. Stored verbatim and
/// treated as read-only once set.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SocialProfile {
    pub data: ProfileData,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ProfileData {
    pub id: String,
    pub name: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_metrics: Option<PublicMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PublicMetrics {
    pub followers_count: u64,
    pub following_count: u64,
    pub tweet_count: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ClaimState {
    pub rev: u64,
    pub phase: ClaimPhase,

    /// Route parameter naming the claimable item.
    pub claim_subject: String,

    pub profile: Option<SocialProfile>,

    /// Never cleared or replaced once set within a session.
    pub account_address: Option<String>,

    /// At most one active message; a new error replaces the old one.
    pub error: Option<String>,

    pub busy: BusyState,

    /// Transient confirmation, auto-dismissed by the core.
    pub toast: Option<String>,

    /// Informational outbound link for the claim subject.
    pub token_explorer_url: String,

    /// Informational outbound link for the resolved address.
    pub address_explorer_url: Option<String>,
}

impl ClaimState {
    pub fn empty() -> Self {
        Self {
            rev: 0,
            phase: ClaimPhase::Init,
            claim_subject: String::new(),
            profile: None,
            account_address: None,
            error: None,
            busy: BusyState::idle(),
            toast: None,
            token_explorer_url: String::new(),
            address_explorer_url: None,
        }
    }

    /// Whether the resolve-account action is currently offered. The action is
    /// withdrawn once an address exists.
    pub fn can_resolve_account(&self) -> bool {
        self.profile.is_some() && self.account_address.is_none() && !self.busy.resolving_account
    }

    /// Whether the send-airdrop action is currently offered.
    pub fn can_send_airdrop(&self) -> bool {
        self.account_address.is_some()
            && self.phase != ClaimPhase::Complete
            && !self.busy.sending_airdrop
    }
}
