//! Framing of the three message-signing requests.
//!
//! All three share one confirmation flow and differ only in how the payload
//! is shown to the user and hashed for signing:
//!
//! | Request         | Display                   | Hash                              |
//! |-----------------|---------------------------|-----------------------------------|
//! | `eth_sign`      | hex                       | raw if 32 bytes, else EIP-191     |
//! | `personal_sign` | UTF-8 if valid, else hex  | EIP-191                           |
//! | typed data      | pretty JSON               | EIP-712 with domain separator     |

use alloy_dyn_abi::TypedData;
use alloy_primitives::{B256, Bytes, eip191_hash_message};

use super::rpc::RpcResult;

/// A message awaiting confirmation and signature.
#[derive(Debug, Clone)]
pub enum SignableMessage {
    /// `eth_sign` payload.
    EthSign(Bytes),
    /// `personal_sign` payload.
    Personal(Bytes),
    /// EIP-712 typed data.
    Typed(Box<TypedData>),
}

impl SignableMessage {
    /// Text shown on the confirmation screen.
    #[must_use]
    pub fn display_text(&self) -> String {
        match self {
            Self::EthSign(bytes) => bytes.to_string(),
            Self::Personal(bytes) => std::str::from_utf8(bytes)
                .map_or_else(|_| bytes.to_string(), str::to_owned),
            Self::Typed(typed) => {
                serde_json::to_string_pretty(typed.as_ref()).unwrap_or_else(|_| typed.primary_type.clone())
            }
        }
    }

    /// Digest the signer signs.
    ///
    /// # Errors
    ///
    /// Returns an error message if typed data cannot be encoded.
    pub fn signing_hash(&self) -> Result<B256, String> {
        match self {
            Self::EthSign(bytes) if bytes.len() == 32 => Ok(B256::from_slice(bytes)),
            Self::EthSign(bytes) | Self::Personal(bytes) => Ok(eip191_hash_message(bytes)),
            Self::Typed(typed) => typed.eip712_signing_hash().map_err(|e| e.to_string()),
        }
    }

    /// Wraps `signature` in the result variant matching this message kind.
    #[must_use]
    pub fn wrap_signature(&self, signature: Bytes) -> RpcResult {
        match self {
            Self::EthSign(_) => RpcResult::MessageSignature(signature),
            Self::Personal(_) => RpcResult::PersonalMessageSignature(signature),
            Self::Typed(_) => RpcResult::TypedMessageSignature(signature),
        }
    }
}
