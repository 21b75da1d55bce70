//! Assets and the local asset store.
//!
//! An asset is identified by its [`AssetKey`]: the contract address together
//! with the chain id. The same address on two chains names two different
//! assets.
//!
//! The store itself belongs to the embedding wallet and is consumed through
//! the [`AssetStore`] trait. [`InMemoryAssetStore`] is a concurrent map
//! implementation used by tests and the CLI.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, address};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::chain::ChainId;

/// Placeholder contract address used for a chain's native currency.
pub const NATIVE_CURRENCY: Address = address!("0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// Decimal precision of native EVM currencies.
pub const NATIVE_DECIMALS: u8 = 18;

/// Unique identity of an asset within one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetKey {
    /// Contract address.
    pub contract: Address,
    /// Chain the contract is deployed on.
    pub chain_id: ChainId,
}

impl AssetKey {
    /// Creates a new asset key.
    #[must_use]
    pub const fn new(contract: Address, chain_id: ChainId) -> Self {
        Self { contract, chain_id }
    }

    /// Key of the native currency on `chain_id`.
    #[must_use]
    pub const fn native(chain_id: ChainId) -> Self {
        Self::new(NATIVE_CURRENCY, chain_id)
    }

    /// Returns `true` if the key designates a native currency.
    #[must_use]
    pub fn is_native(&self) -> bool {
        self.contract == NATIVE_CURRENCY
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.contract, self.chain_id)
    }
}

/// A fungible asset known to the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Contract address.
    pub contract: Address,
    /// Chain the contract is deployed on.
    pub chain_id: ChainId,
    /// Token name (e.g., "USD Coin").
    pub name: String,
    /// Ticker symbol (e.g., "USDC").
    pub symbol: String,
    /// Number of decimals (e.g., 6 for USDC).
    pub decimals: u8,
}

impl Asset {
    /// Returns the key identifying this asset.
    #[must_use]
    pub const fn key(&self) -> AssetKey {
        AssetKey::new(self.contract, self.chain_id)
    }
}

/// Lookup/insert interface over the wallet's persistent asset storage.
///
/// Implementations must be safe to call from concurrent resolutions.
pub trait AssetStore: Send + Sync {
    /// Returns the asset registered under `key`, if any.
    fn lookup(&self, key: &AssetKey) -> Option<Asset>;

    /// Inserts or overwrites the asset and returns the stored entry.
    ///
    /// Registering an already known key never creates a second entry; the
    /// latest registration wins.
    fn register(&self, asset: Asset) -> Asset;

    /// Removes the asset registered under `key`, returning it.
    fn delete(&self, key: &AssetKey) -> Option<Asset>;
}

impl<T: AssetStore + ?Sized> AssetStore for Arc<T> {
    fn lookup(&self, key: &AssetKey) -> Option<Asset> {
        (**self).lookup(key)
    }
    fn register(&self, asset: Asset) -> Asset {
        (**self).register(asset)
    }
    fn delete(&self, key: &AssetKey) -> Option<Asset> {
        (**self).delete(key)
    }
}

/// Concurrent in-memory [`AssetStore`].
#[derive(Debug, Default)]
pub struct InMemoryAssetStore {
    assets: DashMap<AssetKey, Asset>,
}

impl InMemoryAssetStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `assets`.
    #[must_use]
    pub fn with_assets(assets: impl IntoIterator<Item = Asset>) -> Self {
        let store = Self::new();
        for asset in assets {
            store.assets.insert(asset.key(), asset);
        }
        store
    }

    /// Returns the number of stored assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Returns `true` if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetStore for InMemoryAssetStore {
    fn lookup(&self, key: &AssetKey) -> Option<Asset> {
        self.assets.get(key).map(|entry| entry.value().clone())
    }

    fn register(&self, asset: Asset) -> Asset {
        self.assets.insert(asset.key(), asset.clone());
        asset
    }

    fn delete(&self, key: &AssetKey) -> Option<Asset> {
        self.assets.remove(key).map(|(_, asset)| asset)
    }
}
