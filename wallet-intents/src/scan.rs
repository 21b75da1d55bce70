//! The scan flow: classify, then route or resolve.
//!
//! [`Scanner`] owns a [`ScanLatch`] so that only one scan is resolved at a
//! time. A second scan that arrives while the first is still resolving is
//! suppressed. The latch is held by a [`ScanGuard`] and released when the
//! guard drops, which happens exactly once whether the scan succeeds, fails
//! or is cancelled by dropping its future.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use alloy_primitives::Address;
use serde::Serialize;
use url::Url;

use crate::actions::{AddressAction, actions, fallback_actions};
use crate::asset::AssetKey;
use crate::chain::ChainId;
use crate::eip681::ResolutionContext;
use crate::error::ParseError;
use crate::metadata::NameResolver;
use crate::networks::NetworkRegistry;
use crate::payload::{ScannedPayload, classify};
use crate::resolver::{AssetResolver, TransferIntent};

/// Single in-flight scan latch.
#[derive(Debug, Clone, Default)]
pub struct ScanLatch {
    busy: Arc<AtomicBool>,
}

impl ScanLatch {
    /// Creates an idle latch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the latch, or returns `None` if a scan is already in flight.
    #[must_use]
    pub fn try_acquire(&self) -> Option<ScanGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ScanGuard {
                busy: Arc::clone(&self.busy),
            })
    }

    /// Returns `true` while a scan holds the latch.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of holding the [`ScanLatch`]. Releases it on drop.
#[derive(Debug)]
pub struct ScanGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for ScanGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// What a scan produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "camelCase")]
pub enum ScanOutcome {
    /// A bare address and what can be done with it.
    Address {
        /// The scanned address.
        address: Address,
        /// Chain the actions refer to, if any.
        chain_id: Option<ChainId>,
        /// Available actions, never empty.
        actions: Vec<AddressAction>,
        /// Explorer page for the address on `chain_id`.
        explorer: Option<Url>,
    },
    /// A resolved payment request.
    Transfer(TransferIntent),
    /// Any other payload, passed through unchanged.
    Payload(ScannedPayload),
}

/// Classifies scanned text and resolves what needs resolving.
pub struct Scanner {
    latch: ScanLatch,
    resolver: AssetResolver,
    names: Arc<dyn NameResolver>,
    networks: NetworkRegistry,
    active_chain: ChainId,
}

impl fmt::Debug for Scanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("latch", &self.latch)
            .field("resolver", &self.resolver)
            .field("active_chain", &self.active_chain)
            .finish_non_exhaustive()
    }
}

impl Scanner {
    /// Creates a scanner for a wallet whose selected chain is `active_chain`.
    pub fn new(
        resolver: AssetResolver,
        names: Arc<dyn NameResolver>,
        networks: NetworkRegistry,
        active_chain: ChainId,
    ) -> Self {
        Self {
            latch: ScanLatch::new(),
            resolver,
            names,
            networks,
            active_chain,
        }
    }

    /// Returns the scanner's latch.
    #[must_use]
    pub const fn latch(&self) -> &ScanLatch {
        &self.latch
    }

    /// Scans `input`.
    ///
    /// Returns `None` if another scan is still in flight.
    ///
    /// # Errors
    ///
    /// Payment requests that fail to resolve yield the [`ParseError`]. Every
    /// other payload succeeds.
    pub async fn scan(&self, input: &str) -> Option<Result<ScanOutcome, ParseError>> {
        let Some(_guard) = self.latch.try_acquire() else {
            #[cfg(feature = "telemetry")]
            tracing::debug!("Scan suppressed, another scan is in flight");
            return None;
        };
        Some(self.process(classify(input)).await)
    }

    async fn process(&self, payload: ScannedPayload) -> Result<ScanOutcome, ParseError> {
        match payload {
            ScannedPayload::Address(address) => Ok(self.address_outcome(address)),
            ScannedPayload::PaymentRequest(uri) => {
                let ctx = ResolutionContext {
                    active_chain: self.active_chain,
                    networks: &self.networks,
                    names: self.names.as_ref(),
                };
                let request = uri.prepare(&ctx).await?;
                self.resolver.resolve(&request).await.map(ScanOutcome::Transfer)
            }
            other => Ok(ScanOutcome::Payload(other)),
        }
    }

    fn address_outcome(&self, address: Address) -> ScanOutcome {
        let network = self.networks.network(self.active_chain);
        let chain_id = network.map(|n| n.chain_id);
        let known = chain_id.is_some_and(|chain_id| {
            self.resolver
                .store()
                .lookup(&AssetKey::new(address, chain_id))
                .is_some()
        });
        let mut list = actions(address, chain_id, known);
        if list.is_empty() {
            list = fallback_actions();
        }
        ScanOutcome::Address {
            address,
            chain_id,
            actions: list,
            explorer: network.and_then(|n| n.address_url(&address)),
        }
    }
}
