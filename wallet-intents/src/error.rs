//! Error types for payment-request resolution and session dispatch.
//!
//! Classification has no error type: every input maps to some payload.

use crate::chain::ChainId;

/// Errors produced while parsing or resolving a payment request.
///
/// Each error terminates exactly one resolution attempt; it never affects the
/// classifier or other in-flight resolutions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The URI does not have a usable payment-request shape.
    #[error("Invalid payment request: {0}")]
    ConfigurationInvalid(String),
    /// The referenced contract cannot be used as a transferable asset.
    #[error("Invalid contract: {0}")]
    ContractInvalid(String),
    /// A parameter (amount, recipient, name) is malformed or unresolvable.
    #[error("Invalid parameter: {0}")]
    ParameterInvalid(String),
    /// No configured chain matches the resolved chain id.
    #[error("No endpoint configured for chain {0}")]
    MissingChainEndpoint(ChainId),
}

/// Errors that terminate a single remote RPC action with a rejection.
///
/// None of these close the session: a rejected action leaves the session
/// connected and able to receive further requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The session's account is watch-only and cannot sign or send.
    #[error("Account cannot sign: watch-only session")]
    CapabilityDenied,
    /// The user declined the confirmation.
    #[error("User cancelled")]
    UserCancelled,
    /// The signed transaction could not be broadcast.
    #[error("Broadcast failed: {0}")]
    BroadcastFailed(String),
    /// The action kind is not handled.
    #[error("Unsupported action: {0}")]
    UnsupportedAction(String),
    /// The signer could not produce a signature.
    #[error("Signing failed: {0}")]
    SigningFailed(String),
    /// A dispatch hook aborted the action before it ran.
    #[error("Aborted: {0}")]
    Aborted(String),
}

impl DispatchError {
    /// Returns `true` if the rejection belongs on the user-visible error
    /// channel rather than being a silent, normal outcome.
    #[must_use]
    pub const fn is_surfaced(&self) -> bool {
        matches!(self, Self::BroadcastFailed(_) | Self::SigningFailed(_))
    }
}

/// Errors from the session lifecycle manager.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A request arrived while no session is connected.
    #[error("No session connected")]
    NotConnected,
    /// The handshake URI was rejected by the transport.
    #[error("Handshake failed: {0}")]
    Handshake(String),
    /// The transport failed to deliver a response.
    #[error("Transport error: {0}")]
    Transport(String),
    /// The persisted session record could not be read or written.
    #[error("Session store error: {0}")]
    Store(String),
}
