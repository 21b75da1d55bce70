//! EVM chain identifiers and per-chain registries.
//!
//! - [`ChainId`] - A numeric EIP-155 chain id (e.g., `1` for Ethereum, `8453` for Base)
//! - [`parse_chain_id`] - Lenient parsing of decimal, hex and CAIP-2 forms
//! - [`ChainRegistry`] - Values keyed by chain id, with explicit lookups only

use std::collections::HashMap;

/// An EIP-155 chain ID (e.g., 8453 for Base, 137 for Polygon).
pub type ChainId = u64;

/// Formats a chain ID as a CAIP-2 identifier.
///
/// Example: `caip2(8453)` returns `"eip155:8453"`.
#[must_use]
pub fn caip2(chain_id: ChainId) -> String {
    format!("eip155:{chain_id}")
}

/// Parses a CAIP-2 identifier into an EIP-155 chain ID.
///
/// Returns `None` if the input is not a valid `eip155:` prefixed string.
#[must_use]
pub fn parse_caip2(caip: &str) -> Option<ChainId> {
    caip.strip_prefix("eip155:").and_then(|s| s.parse().ok())
}

/// Parses a chain id written as decimal (`137`), hex quantity (`0x89`) or
/// CAIP-2 (`eip155:137`).
#[must_use]
pub fn parse_chain_id(value: &str) -> Option<ChainId> {
    let value = value.trim();
    if let Some(id) = parse_caip2(value) {
        return Some(id);
    }
    if let Some(hex) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        return ChainId::from_str_radix(hex, 16).ok();
    }
    value.parse().ok()
}

/// Registry of per-chain values (RPC providers, endpoints) indexed by chain ID.
///
/// Lookups always take the chain id explicitly; there is no notion of a
/// "current" chain inside the registry.
///
/// # Type Parameters
///
/// - `P` - The per-chain value (e.g., an RPC provider)
#[derive(Debug, Clone)]
pub struct ChainRegistry<P>(HashMap<ChainId, P>);

impl<P> Default for ChainRegistry<P> {
    fn default() -> Self {
        Self(HashMap::new())
    }
}

impl<P> ChainRegistry<P> {
    /// Creates a new registry from the given map.
    #[must_use]
    pub const fn new(entries: HashMap<ChainId, P>) -> Self {
        Self(entries)
    }

    /// Adds or replaces the value for `chain_id`.
    pub fn insert(&mut self, chain_id: ChainId, value: P) -> Option<P> {
        self.0.insert(chain_id, value)
    }

    /// Looks up a value by exact chain ID.
    ///
    /// Returns `None` if nothing is configured for the given chain.
    #[must_use]
    pub fn by_chain_id(&self, chain_id: ChainId) -> Option<&P> {
        self.0.get(&chain_id)
    }

    /// Returns `true` if the chain has a configured value.
    #[must_use]
    pub fn contains(&self, chain_id: ChainId) -> bool {
        self.0.contains_key(&chain_id)
    }

    /// Returns the configured chain ids in ascending order.
    #[must_use]
    pub fn chain_ids(&self) -> Vec<ChainId> {
        let mut ids: Vec<ChainId> = self.0.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the number of configured chains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no chain is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<P> FromIterator<(ChainId, P)> for ChainRegistry<P> {
    fn from_iter<T: IntoIterator<Item = (ChainId, P)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caip2_roundtrip() {
        assert_eq!(caip2(8453), "eip155:8453");
        assert_eq!(parse_caip2("eip155:8453"), Some(8453));
        assert_eq!(parse_caip2("solana:mainnet"), None);
    }

    #[test]
    fn test_parse_chain_id_forms() {
        assert_eq!(parse_chain_id("137"), Some(137));
        assert_eq!(parse_chain_id("0x89"), Some(137));
        assert_eq!(parse_chain_id("eip155:137"), Some(137));
        assert_eq!(parse_chain_id(" 1 "), Some(1));
        assert_eq!(parse_chain_id("polygon"), None);
        assert_eq!(parse_chain_id(""), None);
    }

    #[test]
    fn test_registry_lookup_is_explicit() {
        let registry: ChainRegistry<&str> =
            [(1, "https://eth.example"), (137, "https://polygon.example")]
                .into_iter()
                .collect();
        assert_eq!(registry.by_chain_id(137), Some(&"https://polygon.example"));
        assert!(registry.by_chain_id(8453).is_none());
        assert_eq!(registry.chain_ids(), vec![1, 137]);
        assert!(!registry.is_empty());
    }
}
