//! Resolution of payment requests into transfer intents.
//!
//! [`AssetResolver`] looks the requested asset up in the wallet's
//! [`AssetStore`]. Unknown contracts are fetched through the
//! [`MetadataFetcher`] and registered when they turn out to be complete
//! fungible tokens. Native-currency requests never touch the store.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::amount::to_smallest_unit;
use crate::asset::{Asset, AssetKey, AssetStore, NATIVE_DECIMALS};
use crate::eip681::{AddressOrName, TransferRequest};
use crate::error::ParseError;
use crate::metadata::{ContractMetadata, MetadataFetcher};
use crate::networks::NetworkRegistry;

/// A fully parametrized transfer, ready for a confirmation screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferIntent {
    /// The asset being sent.
    pub asset: AssetKey,
    /// Who receives it.
    pub recipient: AddressOrName,
    /// Requested amount as a plain decimal string.
    pub amount: Option<String>,
    /// `amount` in the asset's smallest unit.
    pub value: Option<U256>,
    /// Ticker symbol of the asset.
    pub symbol: String,
    /// Decimal precision of the asset.
    pub decimals: u8,
}

/// Turns [`TransferRequest`]s into [`TransferIntent`]s.
///
/// Concurrent resolutions of the same unknown key each perform their own
/// fetch; the store keeps the last registration.
#[derive(Clone)]
pub struct AssetResolver {
    store: Arc<dyn AssetStore>,
    fetcher: Arc<dyn MetadataFetcher>,
    networks: NetworkRegistry,
}

impl fmt::Debug for AssetResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetResolver")
            .field("store", &"<AssetStore>")
            .field("fetcher", &"<MetadataFetcher>")
            .field("networks", &self.networks.len())
            .finish()
    }
}

impl AssetResolver {
    /// Creates a resolver over `store` and `fetcher`.
    ///
    /// `networks` supplies the native currency symbol of each chain.
    pub fn new(
        store: Arc<dyn AssetStore>,
        fetcher: Arc<dyn MetadataFetcher>,
        networks: NetworkRegistry,
    ) -> Self {
        Self {
            store,
            fetcher,
            networks,
        }
    }

    /// Returns the asset store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn AssetStore> {
        &self.store
    }

    /// Resolves `request` into a [`TransferIntent`].
    ///
    /// A known asset resolves without any network call.
    ///
    /// # Errors
    ///
    /// - [`ParseError::ContractInvalid`] if the contract is not a complete
    ///   fungible token
    /// - [`ParseError::ParameterInvalid`] if the amount does not fit the
    ///   asset's precision
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "asset.resolve", skip_all, err, fields(asset = %request.asset_key()))
    )]
    pub async fn resolve(&self, request: &TransferRequest) -> Result<TransferIntent, ParseError> {
        let key = request.asset_key();
        let (symbol, decimals) = if key.is_native() {
            let symbol = self
                .networks
                .network(key.chain_id)
                .map_or("ETH", |network| network.native_symbol);
            (symbol.to_owned(), NATIVE_DECIMALS)
        } else {
            let asset = match self.store.lookup(&key) {
                Some(asset) => asset,
                None => self.fetch_and_register(key).await?,
            };
            (asset.symbol, asset.decimals)
        };

        let value = request
            .amount
            .as_deref()
            .map(|amount| {
                to_smallest_unit(amount, decimals)
                    .map_err(|e| ParseError::ParameterInvalid(e.to_string()))
            })
            .transpose()?;

        Ok(TransferIntent {
            asset: key,
            recipient: request.recipient.clone(),
            amount: request.amount.clone(),
            value,
            symbol,
            decimals,
        })
    }

    async fn fetch_and_register(&self, key: AssetKey) -> Result<Asset, ParseError> {
        match self.fetcher.fetch(key.chain_id, key.contract).await {
            ContractMetadata::FungibleComplete {
                name,
                symbol,
                decimals,
            } => {
                let stored = self.store.register(Asset {
                    contract: key.contract,
                    chain_id: key.chain_id,
                    name,
                    symbol,
                    decimals,
                });
                #[cfg(feature = "telemetry")]
                tracing::info!(
                    asset = %key,
                    symbol = %stored.symbol,
                    decimals = stored.decimals,
                    "Registered asset"
                );
                Ok(stored)
            }
            other => Err(ParseError::ContractInvalid(format!(
                "{key} is not a fungible token ({})",
                other.kind()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{InMemoryAssetStore, NATIVE_CURRENCY};
    use crate::chain::ChainId;
    use crate::networks::NetworkInfo;
    use alloy_primitives::{Address, address};
    use futures_util::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const USDC: Address = address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");
    const BOB: Address = address!("0x036CbD53842c5426634e7929541eC2318f3dCF7e");

    const NETWORKS: &[NetworkInfo] = &[NetworkInfo {
        name: "polygon",
        chain_id: 137,
        native_symbol: "POL",
        explorer: "https://polygonscan.com",
    }];

    struct SpyFetcher {
        answer: ContractMetadata,
        calls: AtomicUsize,
    }

    impl SpyFetcher {
        fn new(answer: ContractMetadata) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl MetadataFetcher for SpyFetcher {
        fn fetch(&self, _chain_id: ChainId, _contract: Address) -> BoxFuture<'_, ContractMetadata> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { self.answer.clone() })
        }
    }

    fn usdc_complete() -> ContractMetadata {
        ContractMetadata::FungibleComplete {
            name: "USD Coin".into(),
            symbol: "USDC".into(),
            decimals: 6,
        }
    }

    fn request(contract: Address, amount: Option<&str>) -> TransferRequest {
        TransferRequest {
            contract,
            chain_id: 137,
            recipient: AddressOrName::Address(BOB),
            amount: amount.map(str::to_owned),
        }
    }

    fn resolver(store: &Arc<InMemoryAssetStore>, fetcher: &Arc<SpyFetcher>) -> AssetResolver {
        AssetResolver::new(
            store.clone(),
            fetcher.clone(),
            NetworkRegistry::from_networks(NETWORKS),
        )
    }

    #[tokio::test]
    async fn test_unknown_asset_is_fetched_then_cached() {
        let store = Arc::new(InMemoryAssetStore::new());
        let fetcher = SpyFetcher::new(usdc_complete());
        let resolver = resolver(&store, &fetcher);

        let intent = resolver.resolve(&request(USDC, Some("1.5"))).await.unwrap();
        assert_eq!(intent.symbol, "USDC");
        assert_eq!(intent.value, Some(U256::from(1_500_000u64)));
        assert_eq!(store.len(), 1);

        resolver.resolve(&request(USDC, Some("2"))).await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_fungible_outcomes_are_contract_invalid() {
        for answer in [
            ContractMetadata::NameOnly("Half".into()),
            ContractMetadata::DecimalsOnly(6),
            ContractMetadata::NonFungibleComplete {
                name: Some("Punks".into()),
                symbol: None,
                standard: "ERC721".into(),
            },
            ContractMetadata::DelegateComplete,
            ContractMetadata::Failed {
                network_reachable: Some(false),
            },
        ] {
            let store = Arc::new(InMemoryAssetStore::new());
            let fetcher = SpyFetcher::new(answer);
            let result = resolver(&store, &fetcher).resolve(&request(USDC, None)).await;
            assert!(matches!(result, Err(ParseError::ContractInvalid(_))));
            assert!(store.is_empty());
        }
    }

    #[tokio::test]
    async fn test_native_transfer_skips_store() {
        let store = Arc::new(InMemoryAssetStore::new());
        let fetcher = SpyFetcher::new(usdc_complete());
        let intent = resolver(&store, &fetcher)
            .resolve(&request(NATIVE_CURRENCY, Some("0.25")))
            .await
            .unwrap();
        assert_eq!(intent.symbol, "POL");
        assert_eq!(intent.decimals, 18);
        assert_eq!(intent.value, Some(U256::from(250_000_000_000_000_000u128)));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_amount_too_precise_for_asset() {
        let store = Arc::new(InMemoryAssetStore::new());
        let fetcher = SpyFetcher::new(usdc_complete());
        let result = resolver(&store, &fetcher)
            .resolve(&request(USDC, Some("0.0000001")))
            .await;
        assert!(matches!(result, Err(ParseError::ParameterInvalid(_))));
    }
}
