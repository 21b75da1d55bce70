//! EIP-681 payment-request URIs.
//!
//! Grammar accepted by [`PaymentRequestUri::parse`]:
//!
//! ```text
//! <protocol>:[pay-]<target>[@<chain_id>][/<function>][?<query>]
//! ```
//!
//! `target` is either a `0x`-prefixed address or a dotted name ending in an
//! alphabetic TLD (e.g., an ENS name). The query is `application/x-www-form-urlencoded` and its order is
//! preserved. Parsing is pure; [`PaymentRequestUri::prepare`] performs the
//! asynchronous part (name resolution, chain selection, amount normalization)
//! and yields a [`TransferRequest`].

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use alloy_primitives::Address;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::amount::normalize_amount;
use crate::asset::{AssetKey, NATIVE_CURRENCY};
use crate::chain::{ChainId, parse_chain_id};
use crate::error::ParseError;
use crate::metadata::NameResolver;
use crate::networks::NetworkRegistry;

static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*$").expect("valid scheme regex"));

/// Dotted name whose last label (the TLD) is letters only.
static NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s./:?@#&=]+(\.[^\s./:?@#&=]+)*\.[A-Za-z]{2,}$").expect("valid name regex")
});

/// Schemes that belong to other payload kinds.
const RESERVED_SCHEMES: &[&str] = &["http", "https", "wc"];

/// Query key carrying the recipient of a token transfer.
pub const PARAM_ADDRESS: &str = "address";
/// Query key carrying a token amount.
pub const PARAM_UINT256: &str = "uint256";
/// Query key carrying a human-readable amount.
pub const PARAM_AMOUNT: &str = "amount";
/// Query key carrying a native-currency amount.
pub const PARAM_VALUE: &str = "value";
/// Query key carrying a chain id override.
pub const PARAM_CHAIN_ID: &str = "chainId";

/// Function name of an ERC-20 token transfer.
pub const FUNCTION_TRANSFER: &str = "transfer";

/// Parses a strict `0x`-prefixed, 40 hex digit address.
#[must_use]
pub fn parse_address(value: &str) -> Option<Address> {
    if value.len() != 42 || !(value.starts_with("0x") || value.starts_with("0X")) {
        return None;
    }
    Address::from_str(&value[2..]).ok()
}

/// An address, or a name that still has to be resolved to one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AddressOrName {
    /// A literal address.
    Address(Address),
    /// A human-readable name such as `vitalik.eth`.
    Name(String),
}

impl AddressOrName {
    /// Parses an address or a dotted name. Returns `None` for anything else.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        if let Some(address) = parse_address(value) {
            return Some(Self::Address(address));
        }
        NAME.is_match(value).then(|| Self::Name(value.to_owned()))
    }

}

impl fmt::Display for AddressOrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(address) => write!(f, "{address}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// A decoded payment-request URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestUri {
    /// URI scheme, e.g. `ethereum`.
    pub protocol: String,
    /// The contract (token transfer) or recipient (native transfer).
    pub target: AddressOrName,
    /// Chain id given with `@<id>` after the target.
    pub chain_id: Option<ChainId>,
    /// Function name after the `/`, e.g. `transfer`.
    pub function: Option<String>,
    /// Query parameters in URI order.
    pub params: Vec<(String, String)>,
}

impl PaymentRequestUri {
    /// Parses `uri` with the grammar described in the module docs.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::ConfigurationInvalid`] if the URI does not have
    /// the payment-request shape.
    pub fn parse(uri: &str) -> Result<Self, ParseError> {
        let invalid = |reason: &str| ParseError::ConfigurationInvalid(format!("{reason}: {uri}"));

        let (protocol, rest) = uri.split_once(':').ok_or_else(|| invalid("missing scheme"))?;
        if !SCHEME.is_match(protocol) || RESERVED_SCHEMES.contains(&protocol) {
            return Err(invalid("bad scheme"));
        }
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };
        let (target_part, function) = match path.split_once('/') {
            Some((target, function)) => (target, Some(function)),
            None => (path, None),
        };
        let (target, chain_id) = match target_part.split_once('@') {
            Some((target, chain)) => {
                let chain_id = parse_chain_id(chain).ok_or_else(|| invalid("bad chain id"))?;
                (target, Some(chain_id))
            }
            None => (target_part, None),
        };
        let target = target.strip_prefix("pay-").unwrap_or(target);
        let target = AddressOrName::parse(target).ok_or_else(|| invalid("bad target"))?;

        let function = match function {
            Some(name) if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => {
                return Err(invalid("bad function name"));
            }
            other => other.map(str::to_owned),
        };

        let params = query
            .map(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .map(|(key, value)| (key.into_owned(), value.into_owned()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            protocol: protocol.to_owned(),
            target,
            chain_id,
            function,
            params,
        })
    }

    /// Returns the first value for `key`.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn raw_amount(&self) -> Option<&str> {
        if self.function.is_some() {
            self.param(PARAM_UINT256).or_else(|| self.param(PARAM_AMOUNT))
        } else {
            self.param(PARAM_VALUE).or_else(|| self.param(PARAM_AMOUNT))
        }
    }

    /// Returns the requested amount as a plain decimal string.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::ParameterInvalid`] if the amount is present but
    /// not a decimal number.
    pub fn normalized_amount(&self) -> Result<Option<String>, ParseError> {
        self.raw_amount()
            .map(|raw| {
                normalize_amount(raw).map_err(|e| ParseError::ParameterInvalid(e.to_string()))
            })
            .transpose()
    }

    /// Chain id requested by the URI, `@<id>` first, then the `chainId` key.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::ParameterInvalid`] if the `chainId` parameter is
    /// present but malformed.
    pub fn requested_chain_id(&self) -> Result<Option<ChainId>, ParseError> {
        if let Some(chain_id) = self.chain_id {
            return Ok(Some(chain_id));
        }
        self.param(PARAM_CHAIN_ID)
            .map(|raw| {
                parse_chain_id(raw)
                    .ok_or_else(|| ParseError::ParameterInvalid(format!("chainId {raw}")))
            })
            .transpose()
    }

    /// Resolves the URI into a [`TransferRequest`].
    ///
    /// The requested chain overrides `ctx.active_chain`. A name target is
    /// resolved through `ctx.names`.
    ///
    /// # Errors
    ///
    /// - [`ParseError::MissingChainEndpoint`] if the chain is not in `ctx.networks`
    /// - [`ParseError::ParameterInvalid`] for a bad amount, chain id, recipient
    ///   or an unresolvable name
    /// - [`ParseError::ContractInvalid`] for the zero address as token contract
    /// - [`ParseError::ConfigurationInvalid`] for an unsupported function
    pub async fn prepare(&self, ctx: &ResolutionContext<'_>) -> Result<TransferRequest, ParseError> {
        let chain_id = self.requested_chain_id()?.unwrap_or(ctx.active_chain);
        if !ctx.networks.contains(chain_id) {
            return Err(ParseError::MissingChainEndpoint(chain_id));
        }
        let amount = self.normalized_amount()?;
        let target = match &self.target {
            AddressOrName::Address(address) => *address,
            AddressOrName::Name(name) => ctx
                .names
                .resolve(chain_id, name)
                .await
                .map_err(|e| ParseError::ParameterInvalid(e.to_string()))?,
        };

        match self.function.as_deref() {
            None => Ok(TransferRequest {
                contract: NATIVE_CURRENCY,
                chain_id,
                recipient: AddressOrName::Address(target),
                amount,
            }),
            Some(FUNCTION_TRANSFER) => {
                if target == Address::ZERO {
                    return Err(ParseError::ContractInvalid(
                        "zero address is not a token contract".to_owned(),
                    ));
                }
                let raw_recipient = self.param(PARAM_ADDRESS).ok_or_else(|| {
                    ParseError::ParameterInvalid("transfer without recipient address".to_owned())
                })?;
                let recipient = AddressOrName::parse(raw_recipient).ok_or_else(|| {
                    ParseError::ParameterInvalid(format!("recipient {raw_recipient}"))
                })?;
                Ok(TransferRequest {
                    contract: target,
                    chain_id,
                    recipient,
                    amount,
                })
            }
            Some(other) => Err(ParseError::ConfigurationInvalid(format!(
                "unsupported function {other}"
            ))),
        }
    }
}

impl FromStr for PaymentRequestUri {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Inputs that [`PaymentRequestUri::prepare`] needs from the wallet.
///
/// Every field is explicit: there is no ambient "current server".
#[derive(Clone, Copy)]
pub struct ResolutionContext<'a> {
    /// Chain used when the URI names none.
    pub active_chain: ChainId,
    /// Chains the wallet has endpoints for.
    pub networks: &'a NetworkRegistry,
    /// Name service for name targets.
    pub names: &'a dyn NameResolver,
}

impl fmt::Debug for ResolutionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionContext")
            .field("active_chain", &self.active_chain)
            .field("networks", &self.networks.len())
            .finish_non_exhaustive()
    }
}

/// A payment request with its chain and contract fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Token contract, or [`NATIVE_CURRENCY`] for a native transfer.
    pub contract: Address,
    /// Chain the transfer happens on.
    pub chain_id: ChainId,
    /// Who receives the funds.
    pub recipient: AddressOrName,
    /// Requested amount as a plain decimal string.
    pub amount: Option<String>,
}

impl TransferRequest {
    /// Key of the asset being transferred.
    #[must_use]
    pub const fn asset_key(&self) -> AssetKey {
        AssetKey::new(self.contract, self.chain_id)
    }
}
