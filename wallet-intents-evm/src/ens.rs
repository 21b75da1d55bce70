//! ENS name resolution.
//!
//! Names are hashed with the EIP-137 namehash, then resolved in two calls:
//! the registry's `resolver(node)` followed by the resolver's `addr(node)`.
//! Labels are lowercased; full UTS-46 normalization is not applied.

use alloy_primitives::{Address, B256, keccak256};
use alloy_provider::Provider;
use futures_util::future::BoxFuture;
#[cfg(feature = "telemetry")]
use tracing::instrument;
use wallet_intents::chain::ChainId;
use wallet_intents::metadata::{NameResolutionError, NameResolver};

use crate::contract::{ENS_REGISTRY, IEnsRegistry, IEnsResolver};
use crate::provider::EvmProviders;

/// Computes the EIP-137 namehash of `name`.
#[must_use]
pub fn namehash(name: &str) -> B256 {
    let name = name.to_lowercase();
    name.rsplit('.')
        .filter(|label| !label.is_empty())
        .fold(B256::ZERO, |node, label| {
            let mut buf = [0u8; 64];
            buf[..32].copy_from_slice(node.as_slice());
            buf[32..].copy_from_slice(keccak256(label.as_bytes()).as_slice());
            keccak256(buf)
        })
}

/// [`NameResolver`] that queries the ENS registry on the requested chain.
#[derive(Debug, Clone)]
pub struct EnsResolver {
    providers: EvmProviders,
    registry: Address,
}

impl EnsResolver {
    /// Creates a resolver using the canonical ENS registry.
    #[must_use]
    pub const fn new(providers: EvmProviders) -> Self {
        Self {
            providers,
            registry: ENS_REGISTRY,
        }
    }

    /// Overrides the registry address (for chains with their own deployment).
    #[must_use]
    pub const fn with_registry(mut self, registry: Address) -> Self {
        self.registry = registry;
        self
    }
}

impl NameResolver for EnsResolver {
    fn resolve<'a>(
        &'a self,
        chain_id: ChainId,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Address, NameResolutionError>> {
        Box::pin(async move {
            let provider = self
                .providers
                .provider(chain_id)
                .ok_or_else(|| NameResolutionError::new(name, format!("no provider for chain {chain_id}")))?;
            resolve_name(provider, self.registry, name).await
        })
    }
}

/// Resolves `name` against the registry at `registry`.
///
/// # Errors
///
/// Fails if either call fails, or if the name has no resolver or no address.
#[cfg_attr(feature = "telemetry", instrument(skip(provider), err))]
pub async fn resolve_name<P: Provider>(
    provider: &P,
    registry: Address,
    name: &str,
) -> Result<Address, NameResolutionError> {
    let node = namehash(name);
    let registry = IEnsRegistry::new(registry, provider);
    let resolver_b = registry.resolver(node);
    let resolver = resolver_b
        .call()
        .await
        .map_err(|e| NameResolutionError::new(name, e.to_string()))?;
    if resolver.is_zero() {
        return Err(NameResolutionError::new(name, "no resolver set"));
    }
    let resolver = IEnsResolver::new(resolver, provider);
    let addr_b = resolver.addr(node);
    let address = addr_b
        .call()
        .await
        .map_err(|e| NameResolutionError::new(name, e.to_string()))?;
    if address.is_zero() {
        return Err(NameResolutionError::new(name, "no address record"));
    }
    Ok(address)
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, b256};
    use alloy_sol_types::SolCall;

    use super::*;
    use crate::provider::RpcEndpoint;
    use crate::test_rpc::{RpcMock, encoded};

    const RESOLVER: Address = address!("0x231b0Ee14048e9dCcD1d247744d114a4EB5E8E63");
    const OWNER: Address = address!("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045");

    fn resolver(url: &str) -> EnsResolver {
        let endpoints = [RpcEndpoint::new(url.parse().unwrap())];
        EnsResolver::new(EvmProviders::from_endpoints([(1, &endpoints[..])]).unwrap())
    }

    #[test]
    fn test_namehash_vectors() {
        assert_eq!(namehash(""), B256::ZERO);
        assert_eq!(
            namehash("eth"),
            b256!("0x93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae")
        );
        assert_eq!(
            namehash("foo.eth"),
            b256!("0xde9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f")
        );
        assert_eq!(namehash("Foo.ETH"), namehash("foo.eth"));
    }

    #[tokio::test]
    async fn test_resolves_through_registry() {
        let server = RpcMock::default()
            .answer(ENS_REGISTRY, IEnsRegistry::resolverCall::SELECTOR, encoded(RESOLVER))
            .answer(RESOLVER, IEnsResolver::addrCall::SELECTOR, encoded(OWNER))
            .serve()
            .await;
        let address = resolver(&server.uri()).resolve(1, "vitalik.eth").await.unwrap();
        assert_eq!(address, OWNER);
    }

    #[tokio::test]
    async fn test_missing_resolver() {
        let server = RpcMock::default()
            .answer(ENS_REGISTRY, IEnsRegistry::resolverCall::SELECTOR, encoded(Address::ZERO))
            .serve()
            .await;
        let err = resolver(&server.uri()).resolve(1, "nobody.eth").await.unwrap_err();
        assert_eq!(err.name, "nobody.eth");
        assert_eq!(err.reason, "no resolver set");
    }

    #[tokio::test]
    async fn test_chain_without_provider() {
        let err = resolver("http://127.0.0.1:1").resolve(137, "vitalik.eth").await.unwrap_err();
        assert!(err.reason.contains("137"));
    }
}
