//! The single live session of a wallet.
//!
//! [`SessionManager`] moves through
//! `Disconnected -> Connecting -> Connected -> Disconnected`. Lifecycle
//! operations serialize on one async mutex. Request handling only takes the
//! lock long enough to snapshot the current session, so responses may
//! complete out of order while a handler waits for the user.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use alloy_primitives::Address;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use super::dispatcher::RequestDispatcher;
use super::rpc::{DispatchOutcome, JsonRpcCall, Rejection, ResponseEnvelope, RpcRequest};
use super::{AccountCapability, PeerMetadata, Session};
use crate::chain::ChainId;
use crate::error::{DispatchError, SessionError};
use crate::payload::RemoteSessionUri;

/// What the transport reports after a handshake or resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    /// Session id.
    pub session_id: String,
    /// Peer self-description.
    pub peer: PeerMetadata,
    /// Chain agreed with the peer.
    pub chain_id: ChainId,
}

/// Persisted descriptor of the last session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Session id to resume.
    pub session_id: String,
    /// Peer self-description.
    pub peer: PeerMetadata,
    /// Chain of the session.
    pub chain_id: ChainId,
    /// The handshake URI the session was created from.
    pub uri: String,
}

/// Peer-to-peer session transport.
pub trait SessionTransport: Send + Sync {
    /// Performs the handshake described by `uri`.
    fn handshake<'a>(&'a self, uri: &'a RemoteSessionUri) -> BoxFuture<'a, Result<Handshake, SessionError>>;

    /// Re-establishes a persisted session.
    fn resume<'a>(&'a self, record: &'a SessionRecord) -> BoxFuture<'a, Result<Handshake, SessionError>>;

    /// Closes `session`. Never fails.
    fn close<'a>(&'a self, session: &'a Session) -> BoxFuture<'a, ()>;

    /// Sends a successful response.
    fn fulfil<'a>(
        &'a self,
        session: &'a Session,
        response: &'a ResponseEnvelope,
    ) -> BoxFuture<'a, Result<(), SessionError>>;

    /// Tells the peer the request was rejected.
    fn reject<'a>(&'a self, session: &'a Session, rejection: &'a Rejection) -> BoxFuture<'a, Result<(), SessionError>>;
}

/// Storage for the one persisted [`SessionRecord`].
pub trait SessionStore: Send + Sync {
    /// Loads the record, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] if the record exists but cannot be read.
    fn load(&self) -> Result<Option<SessionRecord>, SessionError>;

    /// Replaces the record.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] on write failure.
    fn save(&self, record: &SessionRecord) -> Result<(), SessionError>;

    /// Removes the record. Removing a missing record succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] on write failure.
    fn clear(&self) -> Result<(), SessionError>;
}

/// In-memory [`SessionStore`].
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    record: std::sync::Mutex<Option<SessionRecord>>,
}

impl MemorySessionStore {
    /// Creates a store holding `record`.
    #[must_use]
    pub fn with_record(record: SessionRecord) -> Self {
        Self {
            record: std::sync::Mutex::new(Some(record)),
        }
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<SessionRecord>>, SessionError> {
        self.record
            .lock()
            .map_err(|_| SessionError::Store("session store lock poisoned".to_owned()))
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<SessionRecord>, SessionError> {
        Ok(self.slot()?.clone())
    }

    fn save(&self, record: &SessionRecord) -> Result<(), SessionError> {
        *self.slot()? = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.slot()? = None;
        Ok(())
    }
}

/// Observable connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No session.
    Disconnected,
    /// A handshake is in progress.
    Connecting,
    /// A session is live.
    Connected,
}

#[derive(Debug)]
enum ConnectionState {
    Disconnected,
    Connecting,
    Connected(Arc<Session>),
}

/// The wallet account exposed to peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletAccount {
    /// Account address.
    pub address: Address,
    /// Whether the wallet can sign for it.
    pub capability: AccountCapability,
}

/// Owns the wallet's single peer session.
pub struct SessionManager {
    state: Mutex<ConnectionState>,
    transport: Arc<dyn SessionTransport>,
    store: Arc<dyn SessionStore>,
    dispatcher: RequestDispatcher,
    account: WalletAccount,
    restored: AtomicBool,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("dispatcher", &self.dispatcher)
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a disconnected manager.
    pub fn new(
        transport: Arc<dyn SessionTransport>,
        store: Arc<dyn SessionStore>,
        dispatcher: RequestDispatcher,
        account: WalletAccount,
    ) -> Self {
        Self {
            state: Mutex::new(ConnectionState::Disconnected),
            transport,
            store,
            dispatcher,
            account,
            restored: AtomicBool::new(false),
        }
    }

    /// Returns the current connection status.
    pub async fn status(&self) -> ConnectionStatus {
        match &*self.state.lock().await {
            ConnectionState::Disconnected => ConnectionStatus::Disconnected,
            ConnectionState::Connecting => ConnectionStatus::Connecting,
            ConnectionState::Connected(_) => ConnectionStatus::Connected,
        }
    }

    /// Returns the live session, if any.
    pub async fn current(&self) -> Option<Arc<Session>> {
        match &*self.state.lock().await {
            ConnectionState::Connected(session) => Some(Arc::clone(session)),
            _ => None,
        }
    }

    fn session_from(&self, handshake: Handshake) -> Session {
        Session {
            id: handshake.session_id,
            peer: handshake.peer,
            chain_id: handshake.chain_id,
            account: self.account.address,
            capability: self.account.capability,
        }
    }

    /// Connects to the peer behind `uri`.
    ///
    /// A live session is closed first. On success the new session is
    /// persisted.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if the handshake fails; the manager is
    /// then disconnected.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "session.connect", skip_all, err, fields(topic = %uri.topic))
    )]
    #[allow(unused_variables)] // store errors are only logged
    pub async fn connect(&self, uri: &RemoteSessionUri) -> Result<Arc<Session>, SessionError> {
        let mut state = self.state.lock().await;
        if let ConnectionState::Connected(old) = std::mem::replace(&mut *state, ConnectionState::Connecting) {
            #[cfg(feature = "telemetry")]
            tracing::info!(session = %old.id, "Closing previous session");
            self.transport.close(&old).await;
        }

        match self.transport.handshake(uri).await {
            Ok(handshake) => {
                let session = Arc::new(self.session_from(handshake));
                let record = SessionRecord {
                    session_id: session.id.clone(),
                    peer: session.peer.clone(),
                    chain_id: session.chain_id,
                    uri: uri.uri.clone(),
                };
                if let Err(e) = self.store.save(&record) {
                    #[cfg(feature = "telemetry")]
                    tracing::warn!(error = %e, "Could not persist session");
                }
                #[cfg(feature = "telemetry")]
                tracing::info!(session = %session.id, peer = %session.peer.name, chain_id = session.chain_id, "Session connected");
                *state = ConnectionState::Connected(Arc::clone(&session));
                Ok(session)
            }
            Err(e) => {
                *state = ConnectionState::Disconnected;
                Err(e)
            }
        }
    }

    /// Resumes the persisted session. Runs at most once per manager.
    ///
    /// A live session is returned as is, without resuming. Failures are
    /// logged and ignored; a record that fails to resume is cleared.
    #[allow(unused_variables)] // errors are only logged
    pub async fn restore(&self) -> Option<Arc<Session>> {
        if self.restored.swap(true, Ordering::AcqRel) {
            return self.current().await;
        }
        let mut state = self.state.lock().await;
        if let ConnectionState::Connected(session) = &*state {
            return Some(Arc::clone(session));
        }
        let record = match self.store.load() {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(error = %e, "Could not read persisted session");
                return None;
            }
        };
        *state = ConnectionState::Connecting;
        match self.transport.resume(&record).await {
            Ok(handshake) => {
                let session = Arc::new(self.session_from(handshake));
                #[cfg(feature = "telemetry")]
                tracing::info!(session = %session.id, "Session restored");
                *state = ConnectionState::Connected(Arc::clone(&session));
                Some(session)
            }
            Err(e) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(error = %e, session = %record.session_id, "Reconnect failed");
                if let Err(e) = self.store.clear() {
                    #[cfg(feature = "telemetry")]
                    tracing::warn!(error = %e, "Could not clear persisted session");
                }
                *state = ConnectionState::Disconnected;
                None
            }
        }
    }

    /// Closes the live session, if any, and forgets the persisted record.
    #[allow(unused_variables)] // store errors are only logged
    pub async fn disconnect(&self) {
        let mut state = self.state.lock().await;
        if let ConnectionState::Connected(session) = std::mem::replace(&mut *state, ConnectionState::Disconnected) {
            self.transport.close(&session).await;
            #[cfg(feature = "telemetry")]
            tracing::info!(session = %session.id, "Session disconnected");
        }
        if let Err(e) = self.store.clear() {
            #[cfg(feature = "telemetry")]
            tracing::warn!(error = %e, "Could not clear persisted session");
        }
    }

    /// Dispatches `request` on the live session and delivers the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotConnected`] without a live session and the
    /// transport's error if delivery fails.
    pub async fn handle(&self, request: RpcRequest) -> Result<DispatchOutcome, SessionError> {
        let session = self.current().await.ok_or(SessionError::NotConnected)?;
        let outcome = self.dispatcher.dispatch(&session, request).await;
        self.deliver(&session, &outcome).await?;
        Ok(outcome)
    }

    /// Decodes and handles a raw JSON-RPC call.
    ///
    /// A call with malformed parameters is rejected as unsupported.
    ///
    /// # Errors
    ///
    /// Same as [`SessionManager::handle`].
    pub async fn handle_call(&self, call: &JsonRpcCall, origin: &str) -> Result<DispatchOutcome, SessionError> {
        match RpcRequest::from_call(call, origin) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                let session = self.current().await.ok_or(SessionError::NotConnected)?;
                let outcome = DispatchOutcome::Reject(Rejection {
                    request_id: call.id.clone(),
                    origin: origin.to_owned(),
                    reason: DispatchError::UnsupportedAction(e.to_string()),
                });
                self.deliver(&session, &outcome).await?;
                Ok(outcome)
            }
        }
    }

    async fn deliver(&self, session: &Session, outcome: &DispatchOutcome) -> Result<(), SessionError> {
        match outcome {
            DispatchOutcome::Fulfil(envelope) => self.transport.fulfil(session, envelope).await,
            DispatchOutcome::Reject(rejection) => self.transport.reject(session, rejection).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::RemoteSessionUri;
    use crate::session::dispatcher::tests::{Spy, dispatcher};
    use crate::session::rpc::{RequestId, RpcAction};
    use alloy_primitives::address;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct SpyTransport {
        events: StdMutex<Vec<String>>,
        fail_resume: bool,
        fail_handshake: bool,
    }

    impl SpyTransport {
        fn record(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl SessionTransport for SpyTransport {
        fn handshake<'a>(&'a self, uri: &'a RemoteSessionUri) -> BoxFuture<'a, Result<Handshake, SessionError>> {
            self.record(format!("handshake({})", uri.topic));
            Box::pin(async move {
                if self.fail_handshake {
                    return Err(SessionError::Handshake("expired pairing".into()));
                }
                Ok(Handshake {
                    session_id: uri.topic.clone(),
                    peer: PeerMetadata {
                        name: "Example Dapp".into(),
                        ..PeerMetadata::default()
                    },
                    chain_id: 1,
                })
            })
        }

        fn resume<'a>(&'a self, record: &'a SessionRecord) -> BoxFuture<'a, Result<Handshake, SessionError>> {
            self.record(format!("resume({})", record.session_id));
            Box::pin(async move {
                if self.fail_resume {
                    return Err(SessionError::Transport("relay unreachable".into()));
                }
                Ok(Handshake {
                    session_id: record.session_id.clone(),
                    peer: record.peer.clone(),
                    chain_id: record.chain_id,
                })
            })
        }

        fn close<'a>(&'a self, session: &'a Session) -> BoxFuture<'a, ()> {
            self.record(format!("close({})", session.id));
            Box::pin(async {})
        }

        fn fulfil<'a>(
            &'a self,
            _session: &'a Session,
            response: &'a ResponseEnvelope,
        ) -> BoxFuture<'a, Result<(), SessionError>> {
            self.record(format!("fulfil({})", response.request_id));
            Box::pin(async { Ok(()) })
        }

        fn reject<'a>(&'a self, _session: &'a Session, rejection: &'a Rejection) -> BoxFuture<'a, Result<(), SessionError>> {
            self.record(format!("reject({})", rejection.request_id));
            Box::pin(async { Ok(()) })
        }
    }

    fn uri(topic: &str) -> RemoteSessionUri {
        RemoteSessionUri::parse(&format!("wc:{topic}@2?relay-protocol=irn&symKey=00ff")).unwrap()
    }

    fn manager(transport: Arc<SpyTransport>, store: Arc<MemorySessionStore>, capability: AccountCapability) -> SessionManager {
        SessionManager::new(
            transport,
            store,
            dispatcher(&Spy::approving()),
            WalletAccount {
                address: address!("0x036CbD53842c5426634e7929541eC2318f3dCF7e"),
                capability,
            },
        )
    }

    fn record(session_id: &str) -> SessionRecord {
        SessionRecord {
            session_id: session_id.into(),
            peer: PeerMetadata::default(),
            chain_id: 1,
            uri: format!("wc:{session_id}@2?symKey=00"),
        }
    }

    #[tokio::test]
    async fn test_connect_while_connected_tears_down_once_then_handshakes_once() {
        let transport = Arc::new(SpyTransport::default());
        let store = Arc::new(MemorySessionStore::default());
        let manager = manager(transport.clone(), store.clone(), AccountCapability::Signing);

        manager.connect(&uri("aaaa")).await.unwrap();
        transport.events.lock().unwrap().clear();

        let session = manager.connect(&uri("bbbb")).await.unwrap();
        assert_eq!(transport.events(), vec!["close(aaaa)", "handshake(bbbb)"]);
        assert_eq!(session.id, "bbbb");
        assert_eq!(manager.status().await, ConnectionStatus::Connected);
        assert_eq!(store.load().unwrap().unwrap().session_id, "bbbb");
    }

    #[tokio::test]
    async fn test_failed_handshake_leaves_disconnected() {
        let transport = Arc::new(SpyTransport {
            fail_handshake: true,
            ..SpyTransport::default()
        });
        let store = Arc::new(MemorySessionStore::default());
        let manager = manager(transport, store.clone(), AccountCapability::Signing);
        assert!(matches!(
            manager.connect(&uri("aaaa")).await,
            Err(SessionError::Handshake(_))
        ));
        assert_eq!(manager.status().await, ConnectionStatus::Disconnected);
        assert!(store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_once() {
        let transport = Arc::new(SpyTransport::default());
        let store = Arc::new(MemorySessionStore::with_record(record("cccc")));
        let manager = manager(transport.clone(), store, AccountCapability::Signing);

        let session = manager.restore().await.unwrap();
        assert_eq!(session.id, "cccc");
        assert!(manager.restore().await.is_some());
        assert_eq!(transport.events(), vec!["resume(cccc)"]);
    }

    #[tokio::test]
    async fn test_failed_restore_is_ignored_and_clears_record() {
        let transport = Arc::new(SpyTransport {
            fail_resume: true,
            ..SpyTransport::default()
        });
        let store = Arc::new(MemorySessionStore::with_record(record("cccc")));
        let manager = manager(transport, store.clone(), AccountCapability::Signing);

        assert!(manager.restore().await.is_none());
        assert_eq!(manager.status().await, ConnectionStatus::Disconnected);
        assert!(store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_after_connect_keeps_live_session() {
        let transport = Arc::new(SpyTransport::default());
        let store = Arc::new(MemorySessionStore::default());
        let manager = manager(transport.clone(), store.clone(), AccountCapability::Signing);

        let live = manager.connect(&uri("aaaa")).await.unwrap();
        let restored = manager.restore().await.unwrap();
        assert!(Arc::ptr_eq(&live, &restored));
        assert_eq!(transport.events(), vec!["handshake(aaaa)"]);
        assert_eq!(manager.status().await, ConnectionStatus::Connected);
        assert_eq!(store.load().unwrap().unwrap().session_id, "aaaa");
    }

    struct StuckStore(SessionRecord);

    impl SessionStore for StuckStore {
        fn load(&self) -> Result<Option<SessionRecord>, SessionError> {
            Ok(Some(self.0.clone()))
        }

        fn save(&self, _record: &SessionRecord) -> Result<(), SessionError> {
            Ok(())
        }

        fn clear(&self) -> Result<(), SessionError> {
            Err(SessionError::Store("read-only".into()))
        }
    }

    #[tokio::test]
    async fn test_failed_restore_survives_store_clear_error() {
        let transport = Arc::new(SpyTransport {
            fail_resume: true,
            ..SpyTransport::default()
        });
        let manager = SessionManager::new(
            transport.clone(),
            Arc::new(StuckStore(record("cccc"))),
            dispatcher(&Spy::approving()),
            WalletAccount {
                address: Address::ZERO,
                capability: AccountCapability::Signing,
            },
        );
        assert!(manager.restore().await.is_none());
        assert_eq!(manager.status().await, ConnectionStatus::Disconnected);
        assert_eq!(transport.events(), vec!["resume(cccc)"]);
    }

    #[tokio::test]
    async fn test_disconnect_is_always_safe() {
        let transport = Arc::new(SpyTransport::default());
        let store = Arc::new(MemorySessionStore::default());
        let manager = manager(transport.clone(), store.clone(), AccountCapability::Signing);

        manager.disconnect().await;
        manager.connect(&uri("dddd")).await.unwrap();
        manager.disconnect().await;
        manager.disconnect().await;
        assert_eq!(transport.events(), vec!["handshake(dddd)", "close(dddd)"]);
        assert!(store.load().unwrap().is_none());
        assert!(manager.current().await.is_none());
    }

    #[tokio::test]
    async fn test_handle_requires_session_and_delivers_outcome() {
        let transport = Arc::new(SpyTransport::default());
        let manager = manager(transport.clone(), Arc::default(), AccountCapability::WatchOnly);
        let request = RpcRequest {
            id: RequestId::Number(9),
            origin: "https://app.example".into(),
            action: RpcAction::GetTransactionCount,
        };
        assert!(matches!(
            manager.handle(request.clone()).await,
            Err(SessionError::NotConnected)
        ));

        manager.connect(&uri("eeee")).await.unwrap();
        let outcome = manager.handle(request).await.unwrap();
        assert_eq!(outcome.rejection(), Some(&DispatchError::CapabilityDenied));
        // a rejection keeps the session alive
        assert_eq!(manager.status().await, ConnectionStatus::Connected);
        assert_eq!(transport.events(), vec!["handshake(eeee)", "reject(9)"]);
    }

    #[tokio::test]
    async fn test_handle_call_rejects_malformed_params() {
        let transport = Arc::new(SpyTransport::default());
        let manager = manager(transport.clone(), Arc::default(), AccountCapability::Signing);
        manager.connect(&uri("ffff")).await.unwrap();

        let call: JsonRpcCall =
            serde_json::from_value(json!({ "id": "x1", "method": "eth_sendRawTransaction", "params": [] })).unwrap();
        let outcome = manager.handle_call(&call, "https://app.example").await.unwrap();
        assert!(matches!(outcome.rejection(), Some(DispatchError::UnsupportedAction(_))));

        let call: JsonRpcCall =
            serde_json::from_value(json!({ "id": 2, "method": "eth_getTransactionCount", "params": [] })).unwrap();
        let outcome = manager.handle_call(&call, "https://app.example").await.unwrap();
        assert!(matches!(outcome, DispatchOutcome::Fulfil(_)));
        assert_eq!(
            transport.events(),
            vec!["handshake(ffff)", "reject(x1)", "fulfil(2)"]
        );
    }
}
