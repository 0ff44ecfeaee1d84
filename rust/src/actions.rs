#[derive(Debug, Clone)]
pub enum ClaimAction {
    /// Begin the session: read the one-time token off the landing URL and
    /// start the identity exchange. Dispatched once by whoever owns the
    /// controller's lifetime.
    Start,

    /// Resolve the smart-account address for the verified identity.
    ResolveAccount,

    /// Ask the backend to send the airdrop to the resolved address.
    SendAirdrop,

    /// Tear the session down. Completions that arrive afterwards are
    /// discarded instead of mutating a defunct session.
    Stop,
}

impl ClaimAction {
    /// Log-safe action tag (the landing URL query carries the one-time token,
    /// so actions are never logged via Debug).
    pub fn tag(&self) -> &'static str {
        match self {
            ClaimAction::Start => "Start",
            ClaimAction::ResolveAccount => "ResolveAccount",
            ClaimAction::SendAirdrop => "SendAirdrop",
            ClaimAction::Stop => "Stop",
        }
    }
}
