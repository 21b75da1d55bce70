//! Scripted JSON-RPC node for tests.

use std::collections::HashMap;

use alloy_primitives::{Address, B256, Bytes, FixedBytes};
use alloy_sol_types::SolValue;
use serde_json::{Value, json};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// ABI-encodes a single return value.
pub(crate) fn encoded<T: SolValue>(value: T) -> Bytes {
    (value,).abi_encode_params().into()
}

/// Answers `eth_call` by `(to, selector)`, `eth_getCode` by address and
/// `eth_sendRawTransaction` with a fixed hash. Anything else reverts.
#[derive(Debug, Clone, Default)]
pub(crate) struct RpcMock {
    calls: HashMap<(Address, FixedBytes<4>), Bytes>,
    code: HashMap<Address, Bytes>,
    tx_hash: Option<B256>,
}

impl RpcMock {
    pub(crate) fn answer(mut self, to: Address, selector: [u8; 4], output: Bytes) -> Self {
        self.calls.insert((to, selector.into()), output);
        self
    }

    pub(crate) fn code(mut self, at: Address, code: Bytes) -> Self {
        self.code.insert(at, code);
        self
    }

    pub(crate) const fn tx_hash(mut self, hash: B256) -> Self {
        self.tx_hash = Some(hash);
        self
    }

    pub(crate) async fn serve(self) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(self)
            .mount(&server)
            .await;
        server
    }

    fn eth_call(&self, params: &Value) -> Option<Value> {
        let tx = params.get(0)?;
        let to: Address = tx.get("to")?.as_str()?.parse().ok()?;
        let input: Bytes = tx
            .get("input")
            .or_else(|| tx.get("data"))?
            .as_str()?
            .parse()
            .ok()?;
        let selector = FixedBytes::<4>::try_from(input.get(..4)?).ok()?;
        self.calls.get(&(to, selector)).map(|output| json!(output))
    }

    fn get_code(&self, params: &Value) -> Value {
        let code = params
            .get(0)
            .and_then(Value::as_str)
            .and_then(|at| at.parse::<Address>().ok())
            .and_then(|at| self.code.get(&at).cloned())
            .unwrap_or_default();
        json!(code)
    }
}

impl Respond for RpcMock {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let id = body.get("id").cloned().unwrap_or(Value::Null);
        let params = body.get("params").cloned().unwrap_or(Value::Null);
        let result = match body.get("method").and_then(Value::as_str) {
            Some("eth_call") => self.eth_call(&params),
            Some("eth_getCode") => Some(self.get_code(&params)),
            Some("eth_sendRawTransaction") => self.tx_hash.map(|hash| json!(hash)),
            _ => None,
        };
        let reply = match result {
            Some(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
            None => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {"code": -32000, "message": "execution reverted"}
            }),
        };
        ResponseTemplate::new(200).set_body_json(reply)
    }
}
