//! Solidity interfaces the adapters call.
//!
//! - [`IERC20Metadata`] - ERC-20 metadata getters and `balanceOf`
//! - [`IERC165`] - Interface detection for ERC-721 / ERC-1155
//! - [`IEnsRegistry`] - ENS registry `resolver(node)`
//! - [`IEnsResolver`] - ENS public resolver `addr(node)`

use alloy_primitives::{Address, FixedBytes, address, fixed_bytes};
use alloy_sol_types::sol;

/// ERC-165 interface id of ERC-721.
pub const ERC721_INTERFACE_ID: FixedBytes<4> = fixed_bytes!("0x80ac58cd");

/// ERC-165 interface id of ERC-1155.
pub const ERC1155_INTERFACE_ID: FixedBytes<4> = fixed_bytes!("0xd9b67a26");

/// ENS registry, same address on mainnet and Sepolia.
pub const ENS_REGISTRY: Address = address!("0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

/// Prefix of an EIP-7702 delegation designator in account code.
pub const DELEGATION_PREFIX: [u8; 3] = [0xef, 0x01, 0x00];

sol! {
    /// ERC-20 metadata extension plus `balanceOf`.
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IERC20Metadata {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
    }
}

sol! {
    /// ERC-165 standard interface detection.
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IERC165 {
        function supportsInterface(bytes4 interfaceId) external view returns (bool);
    }
}

sol! {
    /// ENS registry (EIP-137).
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IEnsRegistry {
        function resolver(bytes32 node) external view returns (address);
    }
}

sol! {
    /// ENS resolver address record.
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IEnsResolver {
        function addr(bytes32 node) external view returns (address);
    }
}
