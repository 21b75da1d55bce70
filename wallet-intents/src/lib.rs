#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Typed wallet intents from untyped input.
//!
//! This crate turns two kinds of untrusted input into precisely typed intents
//! for a cryptocurrency wallet:
//!
//! - **Scanned text** (a QR code or a pasted string) is classified into one
//!   of a closed set of payloads. Payment-request URIs are resolved into a
//!   transfer of a concrete asset, fetching token metadata when the asset is
//!   not yet known.
//! - **Remote session requests** from a connected dapp are routed to signing
//!   and sending handlers, with watch-only accounts refused up front.
//!
//! Everything that touches a network, a key or a screen is consumed through
//! a trait, so the decision logic here is chain-agnostic and testable.
//! EVM implementations of those traits live in `wallet-intents-evm`.
//!
//! # Modules
//!
//! - [`actions`] - Follow-up actions for a scanned address
//! - [`amount`] - Decimal amount normalization and scaling
//! - [`asset`] - Asset identity and the asset store
//! - [`chain`] - Chain ids and per-chain registries
//! - [`eip681`] - Payment-request URI parsing and preparation
//! - [`error`] - Error types
//! - [`metadata`] - Contract metadata and name resolution interfaces
//! - [`networks`] - Registry of reachable networks
//! - [`payload`] - Classification of scanned text
//! - [`resolver`] - Asset resolution into transfer intents
//! - [`scan`] - The scan flow and its in-flight latch
//! - [`session`] - Peer sessions: requests, dispatch and lifecycle
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod actions;
pub mod amount;
pub mod asset;
pub mod chain;
pub mod eip681;
pub mod error;
pub mod metadata;
pub mod networks;
pub mod payload;
pub mod resolver;
pub mod scan;
pub mod session;

pub use error::{DispatchError, ParseError, SessionError};
pub use payload::{ScannedPayload, classify};
