//! Token metadata read from contracts over JSON-RPC.
//!
//! [`Erc20MetadataFetcher`] calls the ERC-20 metadata getters concurrently
//! and classifies the result:
//!
//! 1. `name`, `symbol` and `decimals` all answered: a fungible token.
//! 2. ERC-165 reports ERC-721 or ERC-1155: a non-fungible token contract.
//! 3. Some getters answered: the first partial result (name, symbol, decimals).
//! 4. The account code is an EIP-7702 delegation designator: a delegate.
//! 5. Only `balanceOf` answered: balance only.
//! 6. Otherwise the fetch failed, noting whether the node answered at all.

use alloy_primitives::{Address, FixedBytes};
use alloy_provider::Provider;
use futures_util::future::{BoxFuture, join3};
#[cfg(feature = "telemetry")]
use tracing::instrument;
use wallet_intents::chain::ChainId;
use wallet_intents::metadata::{ContractMetadata, MetadataFetcher};

use crate::contract::{
    DELEGATION_PREFIX, ERC721_INTERFACE_ID, ERC1155_INTERFACE_ID, IERC165, IERC20Metadata,
};
use crate::provider::EvmProviders;

/// Awaits a future, optionally instrumenting it with a tracing span.
macro_rules! traced {
    ($fut:expr, $span:expr) => {{
        #[cfg(feature = "telemetry")]
        {
            use tracing::Instrument;
            $fut.instrument($span).await
        }
        #[cfg(not(feature = "telemetry"))]
        {
            $fut.await
        }
    }};
}

/// [`MetadataFetcher`] backed by per-chain JSON-RPC providers.
#[derive(Debug, Clone)]
pub struct Erc20MetadataFetcher {
    providers: EvmProviders,
}

impl Erc20MetadataFetcher {
    /// Creates a fetcher over `providers`.
    #[must_use]
    pub const fn new(providers: EvmProviders) -> Self {
        Self { providers }
    }
}

impl MetadataFetcher for Erc20MetadataFetcher {
    fn fetch(&self, chain_id: ChainId, contract: Address) -> BoxFuture<'_, ContractMetadata> {
        Box::pin(async move {
            let Some(provider) = self.providers.provider(chain_id) else {
                #[cfg(feature = "telemetry")]
                tracing::warn!(chain_id, %contract, "No provider for chain");
                return ContractMetadata::Failed {
                    network_reachable: None,
                };
            };
            fetch_metadata(provider, contract).await
        })
    }
}

/// Whether the node itself answered, even if with an error.
fn answered(error: &alloy_contract::Error) -> bool {
    match error {
        alloy_contract::Error::TransportError(e) => e.is_error_resp(),
        _ => true,
    }
}

/// Reads and classifies the metadata of `contract`.
#[cfg_attr(feature = "telemetry", instrument(skip_all, fields(contract = %contract)))]
pub async fn fetch_metadata<P: Provider>(provider: &P, contract: Address) -> ContractMetadata {
    let token = IERC20Metadata::new(contract, provider);
    let name_b = token.name();
    let symbol_b = token.symbol();
    let decimals_b = token.decimals();
    let (name, symbol, decimals) = traced!(
        join3(
            name_b.call().into_future(),
            symbol_b.call().into_future(),
            decimals_b.call().into_future(),
        ),
        tracing::info_span!("fetch_token_metadata", otel.kind = "client")
    );

    let mut reachable = false;
    let name = name.map_err(|e| reachable |= answered(&e)).ok();
    let symbol = symbol.map_err(|e| reachable |= answered(&e)).ok();
    let decimals = decimals.map_err(|e| reachable |= answered(&e)).ok();

    match (name, symbol, decimals) {
        (Some(name), Some(symbol), Some(decimals)) => {
            ContractMetadata::FungibleComplete {
                name,
                symbol,
                decimals,
            }
        }
        (name, symbol, decimals) => {
            if let Some(standard) = detect_nft(provider, contract).await {
                return ContractMetadata::NonFungibleComplete {
                    name,
                    symbol,
                    standard: standard.to_owned(),
                };
            }
            if let Some(name) = name {
                return ContractMetadata::NameOnly(name);
            }
            if let Some(symbol) = symbol {
                return ContractMetadata::SymbolOnly(symbol);
            }
            if let Some(decimals) = decimals {
                return ContractMetadata::DecimalsOnly(decimals);
            }
            probe_account(provider, contract, reachable).await
        }
    }
}

/// Asks ERC-165 for the NFT interfaces, ERC-721 first.
async fn detect_nft<P: Provider>(provider: &P, contract: Address) -> Option<&'static str> {
    let introspection = IERC165::new(contract, provider);
    for (interface, standard) in [
        (ERC721_INTERFACE_ID, "ERC721"),
        (ERC1155_INTERFACE_ID, "ERC1155"),
    ] {
        if supports(&introspection, interface).await {
            return Some(standard);
        }
    }
    None
}

async fn supports<P: Provider>(introspection: &IERC165::IERC165Instance<P>, interface: FixedBytes<4>) -> bool {
    let supports_b = introspection.supportsInterface(interface);
    let supports_fut = supports_b.call().into_future();
    traced!(
        supports_fut,
        tracing::info_span!("supports_interface", interface = %interface, otel.kind = "client")
    )
    .unwrap_or(false)
}

/// Falls back to the account code and a `balanceOf` probe.
async fn probe_account<P: Provider>(
    provider: &P,
    contract: Address,
    mut reachable: bool,
) -> ContractMetadata {
    match provider.get_code_at(contract).await {
        Ok(code) if code.starts_with(&DELEGATION_PREFIX) => return ContractMetadata::DelegateComplete,
        Ok(_) => reachable = true,
        Err(e) => reachable |= e.is_error_resp(),
    }

    let token = IERC20Metadata::new(contract, provider);
    let balance_b = token.balanceOf(Address::ZERO);
    let balance_fut = balance_b.call().into_future();
    match traced!(
        balance_fut,
        tracing::info_span!("fetch_token_balance", otel.kind = "client")
    ) {
        Ok(balance) => ContractMetadata::BalanceOnly(balance),
        Err(e) => {
            reachable |= answered(&e);
            #[cfg(feature = "telemetry")]
            tracing::debug!(%contract, reachable, error = %e, "Contract metadata unavailable");
            ContractMetadata::Failed {
                network_reachable: Some(reachable),
            }
        }
    }
}
