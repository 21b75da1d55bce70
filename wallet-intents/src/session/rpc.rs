//! Remote RPC requests and the envelopes sent back for them.
//!
//! Requests arrive as JSON-RPC 2.0 calls ([`JsonRpcCall`]) and are decoded
//! into a closed set of [`RpcAction`]s. Every request produces exactly one
//! [`DispatchOutcome`]: a [`ResponseEnvelope`] or a [`Rejection`], both echoing
//! the request id and origin unchanged.

use std::fmt;

use alloy_dyn_abi::TypedData;
use alloy_primitives::{Address, B256, Bytes, U256, hex};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DispatchError;

/// Opaque request identifier, echoed back in the response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric id.
    Number(u64),
    /// String id.
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<u64> for RequestId {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

/// Transaction fields as sent by a dapp (`eth_sendTransaction` params).
///
/// Quantities are hex strings on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    /// Sender account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Recipient; `None` for contract creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// Value in wei.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    /// Call data.
    #[serde(default, alias = "input", skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    /// Gas limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<U256>,
    /// Legacy gas price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    /// EIP-1559 fee cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    /// EIP-1559 priority fee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    /// Sender nonce.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U256>,
    /// Chain id the dapp expects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<U256>,
}

/// What a remote peer asks the wallet to do.
#[derive(Debug, Clone)]
pub enum RpcAction {
    /// Sign a transaction without sending it.
    SignTransaction(TransactionPayload),
    /// Sign and broadcast a transaction.
    SendTransaction(TransactionPayload),
    /// `eth_sign` over raw bytes.
    SignMessage(Bytes),
    /// `personal_sign` over raw bytes.
    SignPersonalMessage(Bytes),
    /// EIP-712 structured data.
    SignTypedMessage(Box<TypedData>),
    /// Broadcast an already signed transaction.
    SendRawTransaction(Bytes),
    /// Query the account nonce.
    GetTransactionCount,
    /// Any method the wallet does not handle.
    Unknown(String),
}

impl RpcAction {
    /// JSON-RPC method family of the action, safe to log.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::SignTransaction(_) => "eth_signTransaction",
            Self::SendTransaction(_) => "eth_sendTransaction",
            Self::SignMessage(_) => "eth_sign",
            Self::SignPersonalMessage(_) => "personal_sign",
            Self::SignTypedMessage(_) => "eth_signTypedData",
            Self::SendRawTransaction(_) => "eth_sendRawTransaction",
            Self::GetTransactionCount => "eth_getTransactionCount",
            Self::Unknown(method) => method,
        }
    }
}

/// An inbound request with its routing information.
#[derive(Debug, Clone)]
pub struct RpcRequest {
    /// Echoed back unchanged.
    pub id: RequestId,
    /// Origin (dapp URL or peer name), echoed back unchanged.
    pub origin: String,
    /// The requested action.
    pub action: RpcAction,
}

/// A raw JSON-RPC 2.0 call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcCall {
    /// Request id.
    pub id: RequestId,
    /// Method name.
    pub method: String,
    /// Positional parameters.
    #[serde(default)]
    pub params: Value,
}

/// A call whose parameters do not fit its method.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid params for {method}: {reason}")]
pub struct RpcDecodeError {
    /// The method that was called.
    pub method: String,
    /// What was wrong.
    pub reason: String,
}

fn param<'a>(call: &'a JsonRpcCall, index: usize) -> Result<&'a Value, RpcDecodeError> {
    call.params.get(index).ok_or_else(|| RpcDecodeError {
        method: call.method.clone(),
        reason: format!("missing parameter {index}"),
    })
}

fn decode<T: serde::de::DeserializeOwned>(call: &JsonRpcCall, value: &Value) -> Result<T, RpcDecodeError> {
    serde_json::from_value(value.clone()).map_err(|e| RpcDecodeError {
        method: call.method.clone(),
        reason: e.to_string(),
    })
}

/// Reads a data parameter: `0x` hex, or plain text taken as UTF-8 bytes.
fn data_param(call: &JsonRpcCall, value: &Value) -> Result<Bytes, RpcDecodeError> {
    let text = value.as_str().ok_or_else(|| RpcDecodeError {
        method: call.method.clone(),
        reason: "data must be a string".to_owned(),
    })?;
    if text.starts_with("0x") {
        if let Ok(bytes) = hex::decode(text) {
            return Ok(bytes.into());
        }
    }
    Ok(Bytes::copy_from_slice(text.as_bytes()))
}

fn is_address(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| s.len() == 42 && s.parse::<Address>().is_ok())
}

impl RpcRequest {
    /// Decodes a JSON-RPC call from `origin`.
    ///
    /// Unrecognized methods decode to [`RpcAction::Unknown`].
    ///
    /// # Errors
    ///
    /// Returns [`RpcDecodeError`] if a recognized method has malformed params.
    pub fn from_call(call: &JsonRpcCall, origin: impl Into<String>) -> Result<Self, RpcDecodeError> {
        let action = match call.method.as_str() {
            "eth_signTransaction" => RpcAction::SignTransaction(decode(call, param(call, 0)?)?),
            "eth_sendTransaction" => RpcAction::SendTransaction(decode(call, param(call, 0)?)?),
            "eth_sign" => RpcAction::SignMessage(data_param(call, param(call, 1)?)?),
            "personal_sign" => {
                // some dapps send [address, data] instead of [data, address]
                let first = param(call, 0)?;
                let data = match call.params.get(1) {
                    Some(second) if is_address(first) && !is_address(second) => second,
                    _ => first,
                };
                RpcAction::SignPersonalMessage(data_param(call, data)?)
            }
            "eth_signTypedData" | "eth_signTypedData_v3" | "eth_signTypedData_v4" => {
                let raw = param(call, 1)?;
                let typed: TypedData = match raw {
                    Value::String(json) => serde_json::from_str(json).map_err(|e| RpcDecodeError {
                        method: call.method.clone(),
                        reason: e.to_string(),
                    })?,
                    other => decode(call, other)?,
                };
                RpcAction::SignTypedMessage(Box::new(typed))
            }
            "eth_sendRawTransaction" => RpcAction::SendRawTransaction(decode(call, param(call, 0)?)?),
            "eth_getTransactionCount" => RpcAction::GetTransactionCount,
            other => RpcAction::Unknown(other.to_owned()),
        };
        Ok(Self {
            id: call.id.clone(),
            origin: origin.into(),
            action,
        })
    }
}

/// Success payload of a request, tagged by what produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum RpcResult {
    /// Signed, RLP/EIP-2718 encoded transaction.
    SignedTransaction(Bytes),
    /// Hash of a broadcast transaction.
    TransactionHash(B256),
    /// `eth_sign` signature.
    MessageSignature(Bytes),
    /// `personal_sign` signature.
    PersonalMessageSignature(Bytes),
    /// EIP-712 signature.
    TypedMessageSignature(Bytes),
    /// Account nonce.
    TransactionCount(U256),
}

impl RpcResult {
    /// JSON-RPC `result` value sent to the peer.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        match self {
            Self::SignedTransaction(bytes)
            | Self::MessageSignature(bytes)
            | Self::PersonalMessageSignature(bytes)
            | Self::TypedMessageSignature(bytes) => Value::String(bytes.to_string()),
            Self::TransactionHash(hash) => Value::String(hash.to_string()),
            Self::TransactionCount(count) => Value::String(format!("{count:#x}")),
        }
    }
}

/// A successful response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    /// Id of the answered request.
    pub request_id: RequestId,
    /// Origin of the answered request.
    pub origin: String,
    /// The result.
    pub result: RpcResult,
}

/// A rejected request. Nothing but the id reaches the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Id of the rejected request.
    pub request_id: RequestId,
    /// Origin of the rejected request.
    pub origin: String,
    /// Local reason, never sent to the peer.
    pub reason: DispatchError,
}

/// The one outcome of a dispatched request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The request succeeded.
    Fulfil(ResponseEnvelope),
    /// The request was rejected.
    Reject(Rejection),
}

impl DispatchOutcome {
    /// Id of the request this outcome answers.
    #[must_use]
    pub const fn request_id(&self) -> &RequestId {
        match self {
            Self::Fulfil(envelope) => &envelope.request_id,
            Self::Reject(rejection) => &rejection.request_id,
        }
    }

    /// Origin of the request this outcome answers.
    #[must_use]
    pub fn origin(&self) -> &str {
        match self {
            Self::Fulfil(envelope) => &envelope.origin,
            Self::Reject(rejection) => &rejection.origin,
        }
    }

    /// Returns the rejection reason, if rejected.
    #[must_use]
    pub const fn rejection(&self) -> Option<&DispatchError> {
        match self {
            Self::Fulfil(_) => None,
            Self::Reject(rejection) => Some(&rejection.reason),
        }
    }
}
