//! Remote peer sessions.
//!
//! - [`rpc`] - Inbound requests, results and response envelopes
//! - [`message`] - Display and hashing of sign-message requests
//! - [`dispatcher`] - Routes one request to its handler
//! - [`hooks`] - Lifecycle hooks around each dispatch
//! - [`lifecycle`] - Owns the single live session of a wallet

pub mod dispatcher;
pub mod hooks;
pub mod lifecycle;
pub mod message;
pub mod rpc;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::chain::ChainId;

/// Self-description of the remote peer (a dapp).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerMetadata {
    /// Display name.
    pub name: String,
    /// Home page.
    #[serde(default)]
    pub url: String,
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Icon URLs.
    #[serde(default)]
    pub icons: Vec<String>,
}

/// Whether the session's account can sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountCapability {
    /// The wallet holds the key.
    Signing,
    /// The account is watched only; nothing may be signed or sent.
    WatchOnly,
}

/// A connected peer session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session id assigned by the transport.
    pub id: String,
    /// Who is on the other end.
    pub peer: PeerMetadata,
    /// Chain the session operates on.
    pub chain_id: ChainId,
    /// Account exposed to the peer.
    pub account: Address,
    /// What the account may do.
    pub capability: AccountCapability,
}

impl Session {
    /// Returns `true` if the account can sign.
    #[must_use]
    pub fn can_sign(&self) -> bool {
        self.capability == AccountCapability::Signing
    }
}
