use thiserror::Error;

/// Failure taxonomy for the claim flow. The display string of each variant is
/// the message surfaced to the user; at most one message is active at a time.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum ClaimFlowError {
    /// No token in the landing URL. Fatal for the session.
    #[error("No token provided")]
    MissingToken,

    /// Identity exchange failed (transport error or non-success status).
    /// Fatal for the session; there is no retry affordance for this step.
    #[error("Failed to fetch profile")]
    ProfileFetch,

    /// Account resolution failed. Recoverable: the identity is retained and
    /// the action stays available.
    #[error("Failed to get account")]
    AccountFetch,

    /// Transfer dispatch failed. Recoverable: the address is retained and the
    /// action stays available.
    #[error("Failed to send airdrop")]
    TransferDispatch,
}

/// Fallback for failures that carry no recognizable message.
pub(crate) const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";
