//! Follow-up actions for a scanned address.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::chain::ChainId;

/// Something the user may do with a scanned address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AddressAction {
    /// Start a transfer to the address.
    SendToAddress,
    /// Register the address as a custom token contract.
    AddCustomToken,
    /// Import the address as a watch-only wallet.
    WatchWallet,
    /// Show the address in a block explorer.
    OpenInExplorer,
}

/// Lists the actions available for `address`.
///
/// The order is fixed: send, add token, watch, explorer. `AddCustomToken` is
/// left out when `known_asset` is `true`. Without a chain there is nothing to
/// offer and the result is empty; callers then use [`fallback_actions`].
#[must_use]
pub fn actions(_address: Address, chain_id: Option<ChainId>, known_asset: bool) -> Vec<AddressAction> {
    if chain_id.is_none() {
        return Vec::new();
    }
    let mut actions = Vec::with_capacity(4);
    actions.push(AddressAction::SendToAddress);
    if !known_asset {
        actions.push(AddressAction::AddCustomToken);
    }
    actions.push(AddressAction::WatchWallet);
    actions.push(AddressAction::OpenInExplorer);
    actions
}

/// Actions offered when [`actions`] returned nothing.
#[must_use]
pub fn fallback_actions() -> Vec<AddressAction> {
    vec![AddressAction::WatchWallet]
}
