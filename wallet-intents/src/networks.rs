//! Network identification and the set of chains the wallet can reach.
//!
//! This module provides abstract types for mapping human-readable network
//! names (e.g., `"polygon"`) to EIP-155 chain ids and for describing the
//! block explorer of each network.
//!
//! Concrete network data lives in chain-specific crates:
//!
//! - `wallet-intents-evm` provides `EVM_NETWORKS` for EIP-155 chains
//!
//! Applications assemble a [`NetworkRegistry`] at startup from the networks
//! they have endpoints for. Payment-request resolution treats the registry as
//! the set of configured chains: a request for a chain that is not registered
//! fails with `MissingChainEndpoint`.

use std::collections::HashMap;

use alloy_primitives::Address;
use url::Url;

use crate::chain::ChainId;

/// A known network definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Human-readable network name (e.g., "base-sepolia", "polygon")
    pub name: &'static str,
    /// EIP-155 chain id.
    pub chain_id: ChainId,
    /// Symbol of the native currency (e.g., "ETH", "POL").
    pub native_symbol: &'static str,
    /// Block explorer base URL, without a trailing slash.
    pub explorer: &'static str,
}

impl NetworkInfo {
    /// Returns the explorer page for `address` on this network.
    #[must_use]
    pub fn address_url(&self, address: &Address) -> Option<Url> {
        Url::parse(&format!("{}/address/{address}", self.explorer)).ok()
    }
}

/// Registry of reachable networks, indexed by chain id and by name.
///
/// # Example
///
/// ```ignore
/// use wallet_intents::networks::NetworkRegistry;
///
/// let registry = NetworkRegistry::from_networks(wallet_intents_evm::EVM_NETWORKS);
/// let polygon = registry.chain_id_by_name("polygon").unwrap();
/// assert!(registry.contains(polygon));
/// ```
#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
    by_chain_id: HashMap<ChainId, NetworkInfo>,
    name_to_chain_id: HashMap<&'static str, ChainId>,
}

impl NetworkRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated from a network info slice.
    #[must_use]
    pub fn from_networks(networks: &[NetworkInfo]) -> Self {
        let mut registry = Self::new();
        registry.register(networks);
        registry
    }

    /// Registers additional networks into this registry.
    pub fn register(&mut self, networks: &[NetworkInfo]) {
        for info in networks {
            self.name_to_chain_id.insert(info.name, info.chain_id);
            self.by_chain_id.insert(info.chain_id, *info);
        }
    }

    /// Keeps only the networks whose chain id satisfies `keep`.
    #[must_use]
    pub fn retain(mut self, mut keep: impl FnMut(ChainId) -> bool) -> Self {
        self.by_chain_id.retain(|chain_id, _| keep(*chain_id));
        let by_chain_id = &self.by_chain_id;
        self.name_to_chain_id
            .retain(|_, chain_id| by_chain_id.contains_key(chain_id));
        self
    }

    /// Looks up a chain id by its human-readable network name.
    #[must_use]
    pub fn chain_id_by_name(&self, name: &str) -> Option<ChainId> {
        self.name_to_chain_id.get(name).copied()
    }

    /// Looks up the network registered for `chain_id`.
    #[must_use]
    pub fn network(&self, chain_id: ChainId) -> Option<&NetworkInfo> {
        self.by_chain_id.get(&chain_id)
    }

    /// Returns `true` if the chain is registered.
    #[must_use]
    pub fn contains(&self, chain_id: ChainId) -> bool {
        self.by_chain_id.contains_key(&chain_id)
    }

    /// Returns the number of registered networks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_chain_id.len()
    }

    /// Returns `true` if no networks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_chain_id.is_empty()
    }
}
