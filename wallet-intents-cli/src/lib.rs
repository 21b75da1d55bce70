//! Command-line front end for `wallet-intents`.
//!
//! Provides the pieces the `wallet-intents` binary wires together: the
//! configuration file, a JSON file session store, an offline replay
//! transport with its request loop and terminal confirmation prompts.
//!
//! # Modules
//!
//! - [`config`] - Wallet configuration with environment variable expansion
//! - [`confirm`] - Terminal confirmation prompts
//! - [`replay`] - Replay of recorded peer requests
//! - [`store`] - JSON file session store
//! - [`transport`] - Offline replay transport
//! - [`wallet`] - Assembly of scanner and session manager from config

pub mod config;
pub mod confirm;
pub mod replay;
pub mod store;
pub mod transport;
pub mod wallet;

pub use config::WalletConfig;
pub use wallet::Wallet;
