//! Wires configuration into the core components.

use std::sync::Arc;

use alloy_primitives::{Address, B256, Bytes};
use futures_util::future::BoxFuture;
use wallet_intents::asset::InMemoryAssetStore;
use wallet_intents::chain::{ChainId, caip2};
use wallet_intents::networks::NetworkRegistry;
use wallet_intents::resolver::AssetResolver;
use wallet_intents::scan::Scanner;
use wallet_intents::session::AccountCapability;
use wallet_intents::session::dispatcher::{Confirmer, RequestDispatcher, SignerError, WalletSigner};
use wallet_intents::session::lifecycle::{SessionManager, SessionTransport, WalletAccount};
use wallet_intents::session::rpc::TransactionPayload;
use wallet_intents_evm::provider::ProviderError;
use wallet_intents_evm::{EVM_NETWORKS, EnsResolver, Erc20MetadataFetcher, EvmProviders, RpcBroadcaster};

use crate::config::{AccountSetup, ConfigError, WalletConfig};
use crate::store::JsonFileSessionStore;

/// Errors assembling the wallet.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// The configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A provider could not be built.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// [`WalletSigner`] for watch-only accounts. Never reached through the
/// dispatcher, which rejects watch-only sessions first.
#[derive(Debug, Clone, Copy)]
pub struct NoKeySigner;

impl WalletSigner for NoKeySigner {
    fn sign_hash(&self, account: Address, _hash: B256) -> BoxFuture<'_, Result<Bytes, SignerError>> {
        Box::pin(async move { Err(SignerError(format!("no key for {account}"))) })
    }

    fn sign_transaction<'a>(
        &'a self,
        account: Address,
        _chain_id: ChainId,
        _tx: &'a TransactionPayload,
    ) -> BoxFuture<'a, Result<Bytes, SignerError>> {
        Box::pin(async move { Err(SignerError(format!("no key for {account}"))) })
    }
}

/// Providers and networks for the configured chains.
#[derive(Debug, Clone)]
pub struct Wallet {
    config: WalletConfig,
    providers: EvmProviders,
    networks: NetworkRegistry,
}

impl Wallet {
    /// Builds providers for every configured chain.
    ///
    /// Chains outside the known network list get a provider but no network
    /// entry, so payment requests for them fail with a missing endpoint.
    ///
    /// # Errors
    ///
    /// Fails on an invalid chain key or a chain without HTTP endpoint.
    pub fn from_config(config: WalletConfig) -> Result<Self, WalletError> {
        let endpoints = config.endpoints()?;
        let providers = EvmProviders::from_endpoints(
            endpoints
                .iter()
                .map(|(chain_id, endpoints)| (*chain_id, endpoints.as_slice())),
        )?;
        let networks = NetworkRegistry::from_networks(EVM_NETWORKS).retain(|chain_id| providers.provider(chain_id).is_some());
        for chain_id in providers.chain_ids() {
            if !networks.contains(chain_id) {
                tracing::warn!(chain = %caip2(chain_id), "Chain is not a known network; payment requests for it are refused");
            }
        }
        let chains: Vec<String> = providers.chain_ids().into_iter().map(caip2).collect();
        tracing::info!(?chains, "Configured providers");
        Ok(Self {
            config,
            providers,
            networks,
        })
    }

    /// The loaded configuration.
    #[must_use]
    pub const fn config(&self) -> &WalletConfig {
        &self.config
    }

    /// The networks payment requests may target.
    #[must_use]
    pub const fn networks(&self) -> &NetworkRegistry {
        &self.networks
    }

    /// A scanner seeded with the configured tokens.
    #[must_use]
    pub fn scanner(&self) -> Scanner {
        let store = Arc::new(InMemoryAssetStore::with_assets(self.config.assets()));
        let fetcher = Arc::new(Erc20MetadataFetcher::new(self.providers.clone()));
        let resolver = AssetResolver::new(store, fetcher, self.networks.clone());
        let names = Arc::new(EnsResolver::new(self.providers.clone()));
        Scanner::new(resolver, names, self.networks.clone(), self.config.active_chain)
    }

    /// A session manager for the configured account.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Account`] if no usable account is configured.
    pub fn session_manager(
        &self,
        transport: Arc<dyn SessionTransport>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Result<SessionManager, WalletError> {
        let setup = self
            .config
            .account
            .clone()
            .unwrap_or_default()
            .setup()?;
        let (account, signer): (WalletAccount, Arc<dyn WalletSigner>) = match setup {
            AccountSetup::Signing(signer) => (
                WalletAccount {
                    address: signer.address(),
                    capability: AccountCapability::Signing,
                },
                Arc::new(signer),
            ),
            AccountSetup::WatchOnly(address) => (
                WalletAccount {
                    address,
                    capability: AccountCapability::WatchOnly,
                },
                Arc::new(NoKeySigner),
            ),
        };
        tracing::info!(account = %account.address, capability = ?account.capability, "Using account");
        let broadcaster = Arc::new(RpcBroadcaster::new(self.providers.clone()));
        let dispatcher = RequestDispatcher::new(confirmer, signer, broadcaster);
        let store = Arc::new(JsonFileSessionStore::new(&self.config.session_store));
        Ok(SessionManager::new(transport, store, dispatcher, account))
    }
}
