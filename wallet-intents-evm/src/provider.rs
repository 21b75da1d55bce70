//! JSON-RPC providers, one per configured chain.
//!
//! Each chain gets a [`RootProvider`] over a fallback of throttled HTTP
//! transports. Requests go to the first healthy endpoint; a failing endpoint
//! is skipped until it recovers.

use std::num::NonZeroUsize;

use alloy_provider::RootProvider;
use alloy_rpc_client::RpcClient;
use alloy_transport::layers::{FallbackLayer, ThrottleLayer};
use alloy_transport_http::Http;
use tower::ServiceBuilder;
use url::Url;
use wallet_intents::chain::{ChainId, ChainRegistry};

/// One RPC endpoint with an optional requests-per-second limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcEndpoint {
    /// HTTP(S) URL of the node.
    pub url: Url,
    /// Maximum requests per second, unlimited if `None`.
    pub rate_limit: Option<u32>,
}

impl RpcEndpoint {
    /// An endpoint without rate limit.
    #[must_use]
    pub const fn new(url: Url) -> Self {
        Self {
            url,
            rate_limit: None,
        }
    }
}

/// Errors building providers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// None of the chain's endpoints is an HTTP(S) URL.
    #[error("No HTTP endpoint configured for chain {0}")]
    NoHttpEndpoint(ChainId),
}

/// Creates an RPC client over `endpoints`.
///
/// Non-HTTP(S) URLs are skipped.
///
/// # Errors
///
/// Returns [`ProviderError::NoHttpEndpoint`] if no HTTP transport remains.
#[allow(unused_variables)] // chain_id is needed for tracing only
pub fn rpc_client(chain_id: ChainId, endpoints: &[RpcEndpoint]) -> Result<RpcClient, ProviderError> {
    let transports = endpoints
        .iter()
        .filter(|endpoint| matches!(endpoint.url.scheme(), "http" | "https"))
        .map(|endpoint| {
            #[cfg(feature = "telemetry")]
            tracing::info!(chain_id, rpc_url = %endpoint.url, rate_limit = ?endpoint.rate_limit, "Using HTTP transport");
            ServiceBuilder::new()
                .layer(ThrottleLayer::new(endpoint.rate_limit.unwrap_or(u32::MAX)))
                .service(Http::new(endpoint.url.clone()))
        })
        .collect::<Vec<_>>();
    let count = NonZeroUsize::new(transports.len()).ok_or(ProviderError::NoHttpEndpoint(chain_id))?;
    let fallback = ServiceBuilder::new()
        .layer(FallbackLayer::default().with_active_transport_count(count))
        .service(transports);
    Ok(RpcClient::new(fallback, false))
}

/// Read-only providers for every configured chain.
#[derive(Debug, Clone, Default)]
pub struct EvmProviders(ChainRegistry<RootProvider>);

impl EvmProviders {
    /// Builds providers for each `(chain, endpoints)` pair.
    ///
    /// # Errors
    ///
    /// Fails on the first chain without a usable HTTP endpoint.
    pub fn from_endpoints<'a>(
        chains: impl IntoIterator<Item = (ChainId, &'a [RpcEndpoint])>,
    ) -> Result<Self, ProviderError> {
        let mut registry = ChainRegistry::default();
        for (chain_id, endpoints) in chains {
            let client = rpc_client(chain_id, endpoints)?;
            registry.insert(chain_id, RootProvider::new(client));
        }
        Ok(Self(registry))
    }

    /// Returns the provider for `chain_id`.
    #[must_use]
    pub fn provider(&self, chain_id: ChainId) -> Option<&RootProvider> {
        self.0.by_chain_id(chain_id)
    }

    /// Chain ids with a provider, sorted.
    #[must_use]
    pub fn chain_ids(&self) -> Vec<ChainId> {
        self.0.chain_ids()
    }
}
