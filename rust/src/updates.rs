use crate::state::{ClaimState, SocialProfile};
use crate::ClaimAction;

#[derive(Clone, Debug)]
pub enum ClaimUpdate {
    /// Primary update stream: always send a full state snapshot.
    ///
    /// Simplest reconciliation story for the presentation layer; can be made
    /// more granular later.
    FullState(ClaimState),
}

impl ClaimUpdate {
    pub fn rev(&self) -> u64 {
        match self {
            ClaimUpdate::FullState(s) => s.rev,
        }
    }
}

#[derive(Debug)]
pub enum CoreMsg {
    Action(ClaimAction),
    Internal(Box<InternalEvent>),
}

/// Results of spawned network work, delivered back into the actor. Each
/// carries either the parsed payload or the user-visible error message.
#[derive(Debug)]
pub enum InternalEvent {
    ProfileFetched {
        profile: Option<SocialProfile>,
        error: Option<String>,
    },
    AccountFetched {
        account: Option<String>,
        error: Option<String>,
    },
    AirdropDispatched {
        ok: bool,
        error: Option<String>,
    },
    ToastAutoDismiss {
        token: u64,
    },
}
