//! Raw transaction broadcast over JSON-RPC.

use alloy_primitives::{B256, Bytes};
use alloy_provider::Provider;
use futures_util::future::BoxFuture;
use wallet_intents::chain::ChainId;
use wallet_intents::session::dispatcher::{BroadcastError, Broadcaster};

use crate::provider::EvmProviders;

/// [`Broadcaster`] sending `eth_sendRawTransaction` to the chain's provider.
///
/// Returns as soon as the node accepts the transaction; inclusion is not awaited.
#[derive(Debug, Clone)]
pub struct RpcBroadcaster {
    providers: EvmProviders,
}

impl RpcBroadcaster {
    /// Creates a broadcaster over `providers`.
    #[must_use]
    pub const fn new(providers: EvmProviders) -> Self {
        Self { providers }
    }
}

impl Broadcaster for RpcBroadcaster {
    fn broadcast<'a>(&'a self, chain_id: ChainId, raw: &'a Bytes) -> BoxFuture<'a, Result<B256, BroadcastError>> {
        Box::pin(async move {
            let provider = self
                .providers
                .provider(chain_id)
                .ok_or_else(|| BroadcastError(format!("no provider for chain {chain_id}")))?;
            let pending = provider
                .send_raw_transaction(raw)
                .await
                .map_err(|e| BroadcastError(e.to_string()))?;
            let tx_hash = *pending.tx_hash();
            #[cfg(feature = "telemetry")]
            tracing::info!(chain_id, %tx_hash, "Transaction broadcast");
            Ok(tx_hash)
        })
    }
}
