//! Offline session transport that writes responses as JSON-RPC lines.
//!
//! Used to replay recorded peer requests against the dispatcher without a
//! relay. Handshakes always succeed; the session id is the URI topic.

use std::io::Write;
use std::sync::Mutex;

use futures_util::future::BoxFuture;
use serde_json::{Value, json};
use wallet_intents::SessionError;
use wallet_intents::chain::ChainId;
use wallet_intents::payload::RemoteSessionUri;
use wallet_intents::session::lifecycle::{Handshake, SessionRecord, SessionTransport};
use wallet_intents::session::rpc::{Rejection, RequestId, ResponseEnvelope};
use wallet_intents::session::{PeerMetadata, Session};

/// EIP-1193 "user rejected request".
const USER_REJECTED: i64 = 4001;

/// [`SessionTransport`] writing one JSON-RPC response per line to `W`.
#[derive(Debug)]
pub struct ReplayTransport<W> {
    out: Mutex<W>,
    chain_id: ChainId,
    peer: PeerMetadata,
}

impl<W: Write + Send> ReplayTransport<W> {
    /// Creates a transport whose sessions run on `chain_id` with `peer`.
    pub const fn new(out: W, chain_id: ChainId, peer: PeerMetadata) -> Self {
        Self {
            out: Mutex::new(out),
            chain_id,
            peer,
        }
    }

    /// Returns the writer.
    ///
    /// # Errors
    ///
    /// Fails if a writer panicked while holding the lock.
    pub fn into_inner(self) -> Result<W, SessionError> {
        self.out
            .into_inner()
            .map_err(|_| SessionError::Transport("output lock poisoned".to_owned()))
    }

    fn write_line(&self, id: &RequestId, body: (&str, Value)) -> Result<(), SessionError> {
        let mut line = json!({ "jsonrpc": "2.0", "id": id });
        line[body.0] = body.1;
        let mut out = self
            .out
            .lock()
            .map_err(|_| SessionError::Transport("output lock poisoned".to_owned()))?;
        writeln!(out, "{line}").map_err(|e| SessionError::Transport(e.to_string()))
    }
}

impl<W: Write + Send> SessionTransport for ReplayTransport<W> {
    fn handshake<'a>(&'a self, uri: &'a RemoteSessionUri) -> BoxFuture<'a, Result<Handshake, SessionError>> {
        Box::pin(async move {
            Ok(Handshake {
                session_id: uri.topic.clone(),
                peer: self.peer.clone(),
                chain_id: self.chain_id,
            })
        })
    }

    fn resume<'a>(&'a self, record: &'a SessionRecord) -> BoxFuture<'a, Result<Handshake, SessionError>> {
        Box::pin(async move {
            if RemoteSessionUri::parse(&record.uri).is_none() {
                return Err(SessionError::Handshake(format!("stored URI is not a session URI: {}", record.uri)));
            }
            Ok(Handshake {
                session_id: record.session_id.clone(),
                peer: record.peer.clone(),
                chain_id: record.chain_id,
            })
        })
    }

    fn close<'a>(&'a self, session: &'a Session) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            tracing::info!(session_id = %session.id, "Session closed");
        })
    }

    fn fulfil<'a>(
        &'a self,
        _session: &'a Session,
        response: &'a ResponseEnvelope,
    ) -> BoxFuture<'a, Result<(), SessionError>> {
        Box::pin(async move { self.write_line(&response.request_id, ("result", response.result.to_wire())) })
    }

    fn reject<'a>(&'a self, _session: &'a Session, rejection: &'a Rejection) -> BoxFuture<'a, Result<(), SessionError>> {
        Box::pin(async move {
            let error = json!({ "code": USER_REJECTED, "message": "Request rejected" });
            self.write_line(&rejection.request_id, ("error", error))
        })
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, B256};
    use wallet_intents::DispatchError;
    use wallet_intents::session::AccountCapability;
    use wallet_intents::session::rpc::RpcResult;

    use super::*;

    fn session() -> Session {
        Session {
            id: "topic".into(),
            peer: PeerMetadata::default(),
            chain_id: 1,
            account: Address::ZERO,
            capability: AccountCapability::Signing,
        }
    }

    #[tokio::test]
    async fn test_handshake_uses_topic() {
        let transport = ReplayTransport::new(Vec::new(), 10, PeerMetadata::default());
        let uri = RemoteSessionUri::parse("wc:a1b2@2?relay-protocol=irn&symKey=ff").unwrap();
        let handshake = transport.handshake(&uri).await.unwrap();
        assert_eq!(handshake.session_id, "a1b2");
        assert_eq!(handshake.chain_id, 10);
    }

    #[tokio::test]
    async fn test_writes_result_and_generic_rejection() {
        let transport = ReplayTransport::new(Vec::new(), 1, PeerMetadata::default());
        let session = session();
        transport
            .fulfil(
                &session,
                &ResponseEnvelope {
                    request_id: RequestId::Number(1),
                    origin: "https://dapp.example".into(),
                    result: RpcResult::TransactionHash(B256::ZERO),
                },
            )
            .await
            .unwrap();
        transport
            .reject(
                &session,
                &Rejection {
                    request_id: RequestId::String("two".into()),
                    origin: "https://dapp.example".into(),
                    reason: DispatchError::CapabilityDenied,
                },
            )
            .await
            .unwrap();

        let out = String::from_utf8(transport.into_inner().unwrap()).unwrap();
        let lines: Vec<Value> = out.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[0]["result"], B256::ZERO.to_string());
        assert_eq!(lines[1]["id"], "two");
        assert_eq!(lines[1]["error"]["code"], USER_REJECTED);
        assert!(!out.contains("watch-only"));
    }
}
