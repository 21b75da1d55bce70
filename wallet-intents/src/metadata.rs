//! Network-facing collaborators used during payment-request resolution.
//!
//! - [`MetadataFetcher`] - Reads token metadata from a contract
//! - [`NameResolver`] - Turns a human-readable name (e.g., ENS) into an address
//!
//! Both take the chain id explicitly; neither consults an ambient "current
//! chain".

use alloy_primitives::{Address, U256};
use futures_util::future::BoxFuture;

use crate::chain::ChainId;

/// Outcome of a contract metadata fetch.
///
/// Only [`ContractMetadata::FungibleComplete`] describes an asset that can be
/// used for a payment request. The partial variants are produced when only
/// some of the token getters answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractMetadata {
    /// Only `name()` answered.
    NameOnly(String),
    /// Only `symbol()` answered.
    SymbolOnly(String),
    /// Only `balanceOf()` answered.
    BalanceOnly(U256),
    /// Only `decimals()` answered.
    DecimalsOnly(u8),
    /// A complete fungible (ERC-20 style) token.
    FungibleComplete {
        /// Token name.
        name: String,
        /// Ticker symbol.
        symbol: String,
        /// Decimal precision.
        decimals: u8,
    },
    /// A complete non-fungible token contract.
    NonFungibleComplete {
        /// Collection name, if the contract exposes one.
        name: Option<String>,
        /// Collection symbol, if the contract exposes one.
        symbol: Option<String>,
        /// Detected token standard (e.g., `"ERC721"`).
        standard: String,
    },
    /// The address is a delegate or proxy with no token metadata of its own.
    DelegateComplete,
    /// The fetch failed.
    Failed {
        /// `Some(false)` when the chain could not be reached at all,
        /// `Some(true)` when it answered with errors, `None` if unknown.
        network_reachable: Option<bool>,
    },
}

impl ContractMetadata {
    /// Short label of the outcome, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NameOnly(_) => "name_only",
            Self::SymbolOnly(_) => "symbol_only",
            Self::BalanceOnly(_) => "balance_only",
            Self::DecimalsOnly(_) => "decimals_only",
            Self::FungibleComplete { .. } => "fungible",
            Self::NonFungibleComplete { .. } => "non_fungible",
            Self::DelegateComplete => "delegate",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Fetches token metadata for a contract on a given chain.
///
/// Each call resolves exactly once. Implementations must not panic on
/// network failure; they report it as [`ContractMetadata::Failed`].
pub trait MetadataFetcher: Send + Sync {
    /// Fetches metadata for `contract` on `chain_id`.
    fn fetch(&self, chain_id: ChainId, contract: Address) -> BoxFuture<'_, ContractMetadata>;
}

/// Error returned by a [`NameResolver`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Could not resolve {name}: {reason}")]
pub struct NameResolutionError {
    /// The name that failed to resolve.
    pub name: String,
    /// Why resolution failed.
    pub reason: String,
}

impl NameResolutionError {
    /// Creates a new resolution error.
    #[must_use]
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Resolves human-readable names to addresses.
pub trait NameResolver: Send + Sync {
    /// Resolves `name` on `chain_id`.
    fn resolve<'a>(
        &'a self,
        chain_id: ChainId,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Address, NameResolutionError>>;
}

/// A [`NameResolver`] that rejects every name.
///
/// Useful where no name service is configured: name targets then fail with
/// `ParameterInvalid` instead of silently passing through.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNameResolver;

impl NameResolver for NoNameResolver {
    fn resolve<'a>(
        &'a self,
        _chain_id: ChainId,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Address, NameResolutionError>> {
        Box::pin(async move { Err(NameResolutionError::new(name, "no name service configured")) })
    }
}
