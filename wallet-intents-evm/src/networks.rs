//! Known EVM networks.

use wallet_intents::chain::ChainId;
use wallet_intents::networks::NetworkInfo;

/// Ethereum Mainnet chain ID.
pub const ETHEREUM_MAINNET: ChainId = 1;

/// Ethereum Sepolia (testnet) chain ID.
pub const ETHEREUM_SEPOLIA: ChainId = 11_155_111;

/// Base Mainnet chain ID.
pub const BASE_MAINNET: ChainId = 8453;

/// Base Sepolia (testnet) chain ID.
pub const BASE_SEPOLIA: ChainId = 84532;

/// Polygon Mainnet chain ID.
pub const POLYGON_MAINNET: ChainId = 137;

/// Polygon Amoy (testnet) chain ID.
pub const POLYGON_AMOY: ChainId = 80002;

/// Avalanche C-Chain chain ID.
pub const AVALANCHE_MAINNET: ChainId = 43114;

/// Avalanche Fuji (testnet) chain ID.
pub const AVALANCHE_FUJI: ChainId = 43113;

/// Arbitrum One chain ID.
pub const ARBITRUM_ONE: ChainId = 42161;

/// OP Mainnet chain ID.
pub const OPTIMISM_MAINNET: ChainId = 10;

/// Celo Mainnet chain ID.
pub const CELO_MAINNET: ChainId = 42220;

/// Well-known EVM networks with their native symbol and block explorer.
///
/// Pass to [`NetworkRegistry::from_networks`](wallet_intents::networks::NetworkRegistry::from_networks)
/// and narrow it down to the chains that have endpoints.
pub const EVM_NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        name: "ethereum",
        chain_id: ETHEREUM_MAINNET,
        native_symbol: "ETH",
        explorer: "https://etherscan.io",
    },
    NetworkInfo {
        name: "sepolia",
        chain_id: ETHEREUM_SEPOLIA,
        native_symbol: "ETH",
        explorer: "https://sepolia.etherscan.io",
    },
    NetworkInfo {
        name: "base",
        chain_id: BASE_MAINNET,
        native_symbol: "ETH",
        explorer: "https://basescan.org",
    },
    NetworkInfo {
        name: "base-sepolia",
        chain_id: BASE_SEPOLIA,
        native_symbol: "ETH",
        explorer: "https://sepolia.basescan.org",
    },
    NetworkInfo {
        name: "polygon",
        chain_id: POLYGON_MAINNET,
        native_symbol: "POL",
        explorer: "https://polygonscan.com",
    },
    NetworkInfo {
        name: "polygon-amoy",
        chain_id: POLYGON_AMOY,
        native_symbol: "POL",
        explorer: "https://amoy.polygonscan.com",
    },
    NetworkInfo {
        name: "avalanche",
        chain_id: AVALANCHE_MAINNET,
        native_symbol: "AVAX",
        explorer: "https://snowtrace.io",
    },
    NetworkInfo {
        name: "avalanche-fuji",
        chain_id: AVALANCHE_FUJI,
        native_symbol: "AVAX",
        explorer: "https://testnet.snowtrace.io",
    },
    NetworkInfo {
        name: "arbitrum",
        chain_id: ARBITRUM_ONE,
        native_symbol: "ETH",
        explorer: "https://arbiscan.io",
    },
    NetworkInfo {
        name: "optimism",
        chain_id: OPTIMISM_MAINNET,
        native_symbol: "ETH",
        explorer: "https://optimistic.etherscan.io",
    },
    NetworkInfo {
        name: "celo",
        chain_id: CELO_MAINNET,
        native_symbol: "CELO",
        explorer: "https://celoscan.io",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use wallet_intents::networks::NetworkRegistry;

    #[test]
    fn test_chain_ids_and_names_unique() {
        let ids: HashSet<_> = EVM_NETWORKS.iter().map(|n| n.chain_id).collect();
        let names: HashSet<_> = EVM_NETWORKS.iter().map(|n| n.name).collect();
        assert_eq!(ids.len(), EVM_NETWORKS.len());
        assert_eq!(names.len(), EVM_NETWORKS.len());
    }

    #[test]
    fn test_registry_lookup() {
        let registry = NetworkRegistry::from_networks(EVM_NETWORKS);
        assert_eq!(registry.chain_id_by_name("polygon"), Some(POLYGON_MAINNET));
        assert_eq!(registry.network(CELO_MAINNET).unwrap().native_symbol, "CELO");
    }
}
