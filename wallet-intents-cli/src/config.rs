//! Wallet configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! active_chain = 8453
//! session_store = "session.json"
//!
//! [account]
//! signer_private_key = "$WALLET_KEY"
//!
//! [chains."8453"]
//! rpc_url = "https://mainnet.base.org"
//! fallback_urls = ["https://base.llamarpc.com"]
//! rate_limit = 20
//!
//! [[tokens]]
//! contract = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"
//! chain_id = 8453
//! name = "USD Coin"
//! symbol = "USDC"
//! decimals = 6
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to configuration file (default: `wallet-intents.toml`)
//! - Keys and URLs referenced by `$VAR` in the config file

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use alloy_primitives::Address;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use url::Url;
use wallet_intents::asset::Asset;
use wallet_intents::chain::{ChainId, parse_chain_id};
use wallet_intents::networks::NetworkRegistry;
use wallet_intents_evm::{EVM_NETWORKS, LocalKeySigner, RpcEndpoint};

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").expect("valid env var regex")
});

/// Errors loading or interpreting the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("Cannot read {path}: {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for [`WalletConfig`].
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// A `[chains]` key is not a chain id.
    #[error("Invalid chain id: {0}")]
    InvalidChain(String),
    /// The `[account]` section is unusable.
    #[error("Invalid account: {0}")]
    Account(String),
}

/// Top-level wallet configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Chain selected in the wallet (default: `1`).
    #[serde(default = "default_active_chain")]
    pub active_chain: ChainId,

    /// The wallet account.
    #[serde(default)]
    pub account: Option<AccountConfig>,

    /// Where the last session record is kept (default: `session.json`).
    #[serde(default = "default_session_store")]
    pub session_store: PathBuf,

    /// RPC configuration keyed by chain id (`"8453"`, `"0x2105"` or `"eip155:8453"`)
    /// or by network name (`"base"`).
    #[serde(default)]
    pub chains: HashMap<String, ChainConfig>,

    /// Assets known before any resolution.
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
}

/// The wallet account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Account address. Derived from the key when omitted.
    #[serde(default)]
    pub address: Option<Address>,

    /// Private key (hex, with or without `0x` prefix).
    /// Supports `$VAR` / `${VAR}` for environment variable expansion.
    #[serde(default)]
    pub signer_private_key: Option<String>,

    /// Never sign, even if a key is configured.
    #[serde(default)]
    pub watch_only: bool,
}

/// How the account participates in sessions.
#[derive(Debug, Clone)]
pub enum AccountSetup {
    /// A key is available.
    Signing(LocalKeySigner),
    /// Only the address is known.
    WatchOnly(Address),
}

impl AccountConfig {
    fn resolved_key(&self) -> Option<&str> {
        self.signer_private_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && !key.starts_with('$'))
    }

    /// Decides between signing and watch-only.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Account`] if the key is invalid, if it does not
    /// match `address`, or if neither a key nor an address is given.
    pub fn setup(&self) -> Result<AccountSetup, ConfigError> {
        let signer = self
            .resolved_key()
            .map(|key| {
                key.parse::<LocalKeySigner>()
                    .map_err(|e| ConfigError::Account(e.to_string()))
            })
            .transpose()?;
        if let (Some(signer), Some(address)) = (&signer, self.address) {
            if signer.address() != address {
                return Err(ConfigError::Account(format!(
                    "key belongs to {}, not {address}",
                    signer.address()
                )));
            }
        }
        match (signer, self.address) {
            (Some(signer), _) if !self.watch_only => Ok(AccountSetup::Signing(signer)),
            (Some(signer), _) => Ok(AccountSetup::WatchOnly(signer.address())),
            (None, Some(address)) => Ok(AccountSetup::WatchOnly(address)),
            (None, None) => Err(ConfigError::Account(
                "either address or signer_private_key is required".to_owned(),
            )),
        }
    }
}

/// RPC configuration of one chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Primary HTTP RPC endpoint URL.
    pub rpc_url: Url,

    /// Further endpoints used when the primary fails.
    #[serde(default)]
    pub fallback_urls: Vec<Url>,

    /// Requests per second allowed on each endpoint.
    #[serde(default)]
    pub rate_limit: Option<u32>,
}

impl ChainConfig {
    /// Primary endpoint followed by the fallbacks.
    #[must_use]
    pub fn endpoints(&self) -> Vec<RpcEndpoint> {
        std::iter::once(&self.rpc_url)
            .chain(&self.fallback_urls)
            .map(|url| RpcEndpoint {
                url: url.clone(),
                rate_limit: self.rate_limit,
            })
            .collect()
    }
}

/// A seeded asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Contract address.
    pub contract: Address,
    /// Chain id.
    pub chain_id: ChainId,
    /// Token name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Decimal precision.
    pub decimals: u8,
}

impl From<&TokenConfig> for Asset {
    fn from(token: &TokenConfig) -> Self {
        Self {
            contract: token.contract,
            chain_id: token.chain_id,
            name: token.name.clone(),
            symbol: token.symbol.clone(),
            decimals: token.decimals,
        }
    }
}

const fn default_active_chain() -> ChainId {
    1
}

fn default_session_store() -> PathBuf {
    PathBuf::from("session.json")
}

impl WalletConfig {
    /// Loads configuration from the path given by the `CONFIG` environment
    /// variable, falling back to `wallet-intents.toml` in the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| "wallet-intents.toml".to_owned());
        Self::load_from(Path::new(&path))
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = if path.exists() {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_owned(),
                source,
            })?
        } else {
            String::new()
        };
        Self::parse(&content, |name| std::env::var(name).ok())
    }

    /// Parses TOML `content`, expanding variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on invalid TOML.
    pub fn parse(content: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let expanded = expand_vars(content, lookup);
        Ok(toml::from_str(&expanded)?)
    }

    /// RPC endpoints per chain.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidChain`] for a key that is neither a chain
    /// id nor a known network name.
    pub fn endpoints(&self) -> Result<Vec<(ChainId, Vec<RpcEndpoint>)>, ConfigError> {
        let names = NetworkRegistry::from_networks(EVM_NETWORKS);
        self.chains
            .iter()
            .map(|(key, chain)| {
                let chain_id = parse_chain_id(key)
                    .or_else(|| names.chain_id_by_name(key))
                    .ok_or_else(|| ConfigError::InvalidChain(key.clone()))?;
                Ok((chain_id, chain.endpoints()))
            })
            .collect()
    }

    /// Seeded assets.
    #[must_use]
    pub fn assets(&self) -> Vec<Asset> {
        self.tokens.iter().map(Asset::from).collect()
    }
}

/// Replaces `$VAR` and `${VAR}` with `lookup(VAR)`.
///
/// Unresolved variables are left as-is.
fn expand_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    ENV_VAR
        .replace_all(input, |caps: &Captures<'_>| {
            let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            lookup(name).unwrap_or_else(|| caps[0].to_owned())
        })
        .into_owned()
}
