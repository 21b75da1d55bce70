#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EIP-155 (EVM) adapters for `wallet-intents`.
//!
//! The core crate consumes the network, keys and name services through
//! traits. This crate implements them over JSON-RPC with alloy:
//!
//! - [`Erc20MetadataFetcher`] - ERC-20 / ERC-165 metadata probing
//! - [`EnsResolver`] - ENS names through the registry and public resolver
//! - [`RpcBroadcaster`] - `eth_sendRawTransaction`
//! - [`LocalKeySigner`] - Digest and transaction signing with a local key
//!
//! # Modules
//!
//! - [`contract`] - Solidity interfaces used by the adapters
//! - [`provider`] - Per-chain providers with fallback and rate limiting
//! - [`networks`] - Well-known EVM networks
//!
//! # Feature Flags
//!
//! - `telemetry` - Tracing of RPC calls and adapter decisions

pub mod broadcast;
pub mod contract;
pub mod ens;
pub mod metadata;
pub mod networks;
pub mod provider;
pub mod signer;

#[cfg(test)]
mod test_rpc;

pub use broadcast::RpcBroadcaster;
pub use ens::EnsResolver;
pub use metadata::Erc20MetadataFetcher;
pub use networks::EVM_NETWORKS;
pub use provider::{EvmProviders, RpcEndpoint};
pub use signer::LocalKeySigner;
