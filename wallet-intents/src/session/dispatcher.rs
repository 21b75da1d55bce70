//! Routing of one inbound request to its handler.
//!
//! [`RequestDispatcher::dispatch`] is the per-request state machine:
//!
//! 1. Capability gate: a watch-only session rejects everything with
//!    [`DispatchError::CapabilityDenied`] before any hook or handler runs.
//! 2. `before_dispatch` hooks, first abort wins.
//! 3. The handler for the action kind, which may suspend on user
//!    confirmation, signing or broadcast.
//! 4. `after_fulfil` or `on_reject` hooks.
//!
//! Every request yields exactly one [`DispatchOutcome`] carrying the
//! request's id and origin. No outcome closes the session.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, B256, Bytes, U256};
use futures_util::future::BoxFuture;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use super::Session;
use super::hooks::{DispatchContext, DispatchHooks, HookDecision};
use super::message::SignableMessage;
use super::rpc::{
    DispatchOutcome, Rejection, ResponseEnvelope, RpcAction, RpcRequest, RpcResult, TransactionPayload,
};
use crate::chain::ChainId;
use crate::error::DispatchError;

/// The user's answer to a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The user approved.
    Approved,
    /// The user declined or dismissed the prompt.
    Cancelled,
}

/// Confirmation UI. Prompts have no timeout.
pub trait Confirmer: Send + Sync {
    /// Asks to sign (and, if `send` is set, broadcast) a transaction.
    fn confirm_transaction<'a>(
        &'a self,
        session: &'a Session,
        tx: &'a TransactionPayload,
        send: bool,
    ) -> BoxFuture<'a, Decision>;

    /// Asks to sign a message.
    fn confirm_message<'a>(&'a self, session: &'a Session, message: &'a SignableMessage) -> BoxFuture<'a, Decision>;

    /// Free-text approval for broadcasting a pre-signed transaction.
    fn confirm_raw_transaction<'a>(&'a self, session: &'a Session, raw: &'a Bytes) -> BoxFuture<'a, Decision>;

    /// Shows a transient notice to the user.
    fn notify<'a>(&'a self, message: &'a str) -> BoxFuture<'a, ()>;
}

/// Error from a [`WalletSigner`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct SignerError(pub String);

/// Access to the wallet's keys.
pub trait WalletSigner: Send + Sync {
    /// Signs a 32-byte digest with `account`'s key. Returns the 65-byte signature.
    fn sign_hash(&self, account: Address, hash: B256) -> BoxFuture<'_, Result<Bytes, SignerError>>;

    /// Signs `tx` for `chain_id`. Returns the EIP-2718 encoded transaction.
    fn sign_transaction<'a>(
        &'a self,
        account: Address,
        chain_id: ChainId,
        tx: &'a TransactionPayload,
    ) -> BoxFuture<'a, Result<Bytes, SignerError>>;
}

/// Error from a [`Broadcaster`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct BroadcastError(pub String);

/// Sends signed transactions to a chain.
pub trait Broadcaster: Send + Sync {
    /// Broadcasts `raw` on `chain_id` and returns the transaction hash.
    fn broadcast<'a>(&'a self, chain_id: ChainId, raw: &'a Bytes) -> BoxFuture<'a, Result<B256, BroadcastError>>;
}

/// Routes requests to handlers for one wallet.
pub struct RequestDispatcher {
    confirmer: Arc<dyn Confirmer>,
    signer: Arc<dyn WalletSigner>,
    broadcaster: Arc<dyn Broadcaster>,
    hooks: Vec<Box<dyn DispatchHooks>>,
}

impl fmt::Debug for RequestDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("hooks", &format!("[{} hooks]", self.hooks.len()))
            .finish_non_exhaustive()
    }
}

impl RequestDispatcher {
    /// Creates a dispatcher without hooks.
    pub fn new(
        confirmer: Arc<dyn Confirmer>,
        signer: Arc<dyn WalletSigner>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self {
            confirmer,
            signer,
            broadcaster,
            hooks: Vec::new(),
        }
    }

    /// Registers a hook. Hooks execute in registration order.
    #[must_use]
    pub fn with_hook(mut self, hook: impl DispatchHooks + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Returns the number of registered hooks.
    #[must_use]
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Dispatches `request` received on `session`.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "session.dispatch", skip_all, fields(
            session = %session.id,
            request_id = %request.id,
            action = request.action.name(),
        ))
    )]
    pub async fn dispatch(&self, session: &Session, request: RpcRequest) -> DispatchOutcome {
        let ctx = DispatchContext {
            session,
            request: &request,
        };

        if !session.can_sign() {
            return self.reject(&ctx, DispatchError::CapabilityDenied).await;
        }

        for hook in &self.hooks {
            if let HookDecision::Abort { reason, message } = hook.before_dispatch(&ctx).await {
                return self
                    .reject(&ctx, DispatchError::Aborted(format!("{reason}: {message}")))
                    .await;
            }
        }

        match self.route(session, &request.action).await {
            Ok(result) => {
                let envelope = ResponseEnvelope {
                    request_id: request.id.clone(),
                    origin: request.origin.clone(),
                    result,
                };
                for hook in &self.hooks {
                    hook.after_fulfil(&ctx, &envelope).await;
                }
                DispatchOutcome::Fulfil(envelope)
            }
            Err(error) => self.reject(&ctx, error).await,
        }
    }

    async fn reject(&self, ctx: &DispatchContext<'_>, reason: DispatchError) -> DispatchOutcome {
        #[cfg(feature = "telemetry")]
        match &reason {
            DispatchError::UserCancelled => tracing::debug!("Request cancelled by user"),
            DispatchError::BroadcastFailed(e) => tracing::error!(error = %e, "Broadcast failed"),
            DispatchError::SigningFailed(e) => tracing::error!(error = %e, "Signing failed"),
            other => tracing::warn!(reason = %other, "Request rejected"),
        }
        let rejection = Rejection {
            request_id: ctx.request.id.clone(),
            origin: ctx.request.origin.clone(),
            reason,
        };
        for hook in &self.hooks {
            hook.on_reject(ctx, &rejection).await;
        }
        DispatchOutcome::Reject(rejection)
    }

    async fn route(&self, session: &Session, action: &RpcAction) -> Result<RpcResult, DispatchError> {
        match action {
            RpcAction::SignTransaction(tx) => {
                self.confirm_tx(session, tx, false).await?;
                self.sign_tx(session, tx).await.map(RpcResult::SignedTransaction)
            }
            RpcAction::SendTransaction(tx) => {
                self.confirm_tx(session, tx, true).await?;
                let raw = self.sign_tx(session, tx).await?;
                self.broadcast(tx_chain_id(session, tx), &raw)
                    .await
                    .map(RpcResult::TransactionHash)
            }
            RpcAction::SignMessage(data) => {
                self.sign_message(session, SignableMessage::EthSign(data.clone()))
                    .await
            }
            RpcAction::SignPersonalMessage(data) => {
                self.sign_message(session, SignableMessage::Personal(data.clone()))
                    .await
            }
            RpcAction::SignTypedMessage(typed) => {
                self.sign_message(session, SignableMessage::Typed(typed.clone()))
                    .await
            }
            RpcAction::SendRawTransaction(raw) => {
                if self.confirmer.confirm_raw_transaction(session, raw).await == Decision::Cancelled {
                    return Err(DispatchError::UserCancelled);
                }
                let hash = self.broadcast(session.chain_id, raw).await?;
                self.confirmer
                    .notify(&format!("Transaction sent: {hash}"))
                    .await;
                Ok(RpcResult::TransactionHash(hash))
            }
            // TODO: read the pending nonce once a chain reader is wired into the dispatcher.
            RpcAction::GetTransactionCount => Ok(RpcResult::TransactionCount(U256::ZERO)),
            RpcAction::Unknown(method) => Err(DispatchError::UnsupportedAction(method.clone())),
        }
    }

    async fn confirm_tx(&self, session: &Session, tx: &TransactionPayload, send: bool) -> Result<(), DispatchError> {
        match self.confirmer.confirm_transaction(session, tx, send).await {
            Decision::Approved => Ok(()),
            Decision::Cancelled => Err(DispatchError::UserCancelled),
        }
    }

    async fn sign_tx(&self, session: &Session, tx: &TransactionPayload) -> Result<Bytes, DispatchError> {
        self.signer
            .sign_transaction(session.account, tx_chain_id(session, tx), tx)
            .await
            .map_err(|e| DispatchError::SigningFailed(e.0))
    }

    async fn broadcast(&self, chain_id: ChainId, raw: &Bytes) -> Result<B256, DispatchError> {
        self.broadcaster
            .broadcast(chain_id, raw)
            .await
            .map_err(|e| DispatchError::BroadcastFailed(e.0))
    }

    async fn sign_message(&self, session: &Session, message: SignableMessage) -> Result<RpcResult, DispatchError> {
        if self.confirmer.confirm_message(session, &message).await == Decision::Cancelled {
            return Err(DispatchError::UserCancelled);
        }
        let hash = message
            .signing_hash()
            .map_err(DispatchError::SigningFailed)?;
        let signature = self
            .signer
            .sign_hash(session.account, hash)
            .await
            .map_err(|e| DispatchError::SigningFailed(e.0))?;
        Ok(message.wrap_signature(signature))
    }
}

/// Chain a transaction targets: its own `chainId` if set, else the session's.
fn tx_chain_id(session: &Session, tx: &TransactionPayload) -> ChainId {
    tx.chain_id
        .and_then(|id| u64::try_from(id).ok())
        .unwrap_or(session.chain_id)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::session::rpc::RequestId;
    use crate::session::{AccountCapability, PeerMetadata};
    use alloy_dyn_abi::TypedData;
    use alloy_primitives::{address, b256};
    use std::sync::Mutex;

    /// Records every collaborator call as a string.
    #[derive(Default)]
    pub(crate) struct Spy {
        pub calls: Mutex<Vec<String>>,
        pub decision: Mutex<Option<Decision>>,
        pub broadcast_error: Mutex<Option<String>>,
        pub signed_hashes: Mutex<Vec<B256>>,
    }

    impl Spy {
        pub(crate) fn approving() -> Arc<Self> {
            let spy = Self::default();
            *spy.decision.lock().unwrap() = Some(Decision::Approved);
            Arc::new(spy)
        }

        pub(crate) fn declining() -> Arc<Self> {
            let spy = Self::default();
            *spy.decision.lock().unwrap() = Some(Decision::Cancelled);
            Arc::new(spy)
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn decision(&self) -> Decision {
            self.decision.lock().unwrap().unwrap_or(Decision::Cancelled)
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Confirmer for Spy {
        fn confirm_transaction<'a>(
            &'a self,
            _session: &'a Session,
            _tx: &'a TransactionPayload,
            send: bool,
        ) -> BoxFuture<'a, Decision> {
            self.record(format!("confirm_transaction(send={send})"));
            Box::pin(async move { self.decision() })
        }

        fn confirm_message<'a>(&'a self, _session: &'a Session, message: &'a SignableMessage) -> BoxFuture<'a, Decision> {
            self.record(format!("confirm_message({})", message.display_text()));
            Box::pin(async move { self.decision() })
        }

        fn confirm_raw_transaction<'a>(&'a self, _session: &'a Session, _raw: &'a Bytes) -> BoxFuture<'a, Decision> {
            self.record("confirm_raw_transaction");
            Box::pin(async move { self.decision() })
        }

        fn notify<'a>(&'a self, message: &'a str) -> BoxFuture<'a, ()> {
            self.record(format!("notify({message})"));
            Box::pin(async {})
        }
    }

    impl WalletSigner for Spy {
        fn sign_hash(&self, _account: Address, hash: B256) -> BoxFuture<'_, Result<Bytes, SignerError>> {
            self.record("sign_hash");
            self.signed_hashes.lock().unwrap().push(hash);
            Box::pin(async { Ok(Bytes::from_static(&[0x5a; 65])) })
        }

        fn sign_transaction<'a>(
            &'a self,
            _account: Address,
            chain_id: ChainId,
            _tx: &'a TransactionPayload,
        ) -> BoxFuture<'a, Result<Bytes, SignerError>> {
            self.record(format!("sign_transaction({chain_id})"));
            Box::pin(async { Ok(Bytes::from_static(&[0x02, 0xf8])) })
        }
    }

    pub(crate) const TX_HASH: B256 = b256!("0x1111111111111111111111111111111111111111111111111111111111111111");

    impl Broadcaster for Spy {
        fn broadcast<'a>(&'a self, chain_id: ChainId, _raw: &'a Bytes) -> BoxFuture<'a, Result<B256, BroadcastError>> {
            self.record(format!("broadcast({chain_id})"));
            Box::pin(async move {
                match self.broadcast_error.lock().unwrap().clone() {
                    Some(e) => Err(BroadcastError(e)),
                    None => Ok(TX_HASH),
                }
            })
        }
    }

    pub(crate) fn dispatcher(spy: &Arc<Spy>) -> RequestDispatcher {
        RequestDispatcher::new(spy.clone(), spy.clone(), spy.clone())
    }

    pub(crate) fn session(capability: AccountCapability) -> Session {
        Session {
            id: "topic-1".into(),
            peer: PeerMetadata {
                name: "Example Dapp".into(),
                url: "https://app.example".into(),
                ..PeerMetadata::default()
            },
            chain_id: 8453,
            account: address!("0x036CbD53842c5426634e7929541eC2318f3dCF7e"),
            capability,
        }
    }

    pub(crate) fn request(id: u64, action: RpcAction) -> RpcRequest {
        RpcRequest {
            id: RequestId::Number(id),
            origin: "https://app.example".into(),
            action,
        }
    }

    /// The `Mail` example from EIP-712.
    fn mail() -> TypedData {
        serde_json::from_value(serde_json::json!({
            "types": {
                "EIP712Domain": [
                    { "name": "name", "type": "string" },
                    { "name": "version", "type": "string" },
                    { "name": "chainId", "type": "uint256" },
                    { "name": "verifyingContract", "type": "address" }
                ],
                "Person": [
                    { "name": "name", "type": "string" },
                    { "name": "wallet", "type": "address" }
                ],
                "Mail": [
                    { "name": "from", "type": "Person" },
                    { "name": "to", "type": "Person" },
                    { "name": "contents", "type": "string" }
                ]
            },
            "primaryType": "Mail",
            "domain": {
                "name": "Ether Mail",
                "version": "1",
                "chainId": 1,
                "verifyingContract": "0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC"
            },
            "message": {
                "from": { "name": "Cow", "wallet": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826" },
                "to": { "name": "Bob", "wallet": "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB" },
                "contents": "Hello, Bob!"
            }
        }))
        .unwrap()
    }

    fn all_actions() -> Vec<RpcAction> {
        vec![
            RpcAction::SignTransaction(TransactionPayload::default()),
            RpcAction::SendTransaction(TransactionPayload::default()),
            RpcAction::SignMessage(Bytes::from_static(b"hi")),
            RpcAction::SignPersonalMessage(Bytes::from_static(b"hi")),
            RpcAction::SignTypedMessage(Box::new(mail())),
            RpcAction::SendRawTransaction(Bytes::from_static(&[0x02])),
            RpcAction::GetTransactionCount,
            RpcAction::Unknown("wallet_switchEthereumChain".into()),
        ]
    }

    #[tokio::test]
    async fn test_watch_only_rejects_without_calling_handlers() {
        let spy = Spy::approving();
        let dispatcher = dispatcher(&spy);
        let session = session(AccountCapability::WatchOnly);
        for action in all_actions() {
            let outcome = dispatcher.dispatch(&session, request(1, action)).await;
            assert_eq!(outcome.rejection(), Some(&DispatchError::CapabilityDenied));
        }
        assert!(spy.calls().is_empty());
    }

    #[tokio::test]
    async fn test_every_outcome_echoes_id_and_origin() {
        for spy in [Spy::approving(), Spy::declining()] {
            let dispatcher = dispatcher(&spy);
            let session = session(AccountCapability::Signing);
            for (i, action) in all_actions().into_iter().enumerate() {
                let id = 100 + i as u64;
                let outcome = dispatcher.dispatch(&session, request(id, action)).await;
                assert_eq!(outcome.request_id(), &RequestId::Number(id));
                assert_eq!(outcome.origin(), "https://app.example");
            }
        }
    }

    #[tokio::test]
    async fn test_sign_transaction_approved_and_cancelled() {
        let spy = Spy::approving();
        let outcome = dispatcher(&spy)
            .dispatch(
                &session(AccountCapability::Signing),
                request(1, RpcAction::SignTransaction(TransactionPayload::default())),
            )
            .await;
        let DispatchOutcome::Fulfil(envelope) = outcome else {
            panic!("expected fulfil");
        };
        assert_eq!(envelope.result, RpcResult::SignedTransaction(Bytes::from_static(&[0x02, 0xf8])));
        assert_eq!(spy.calls(), vec!["confirm_transaction(send=false)", "sign_transaction(8453)"]);

        let spy = Spy::declining();
        let outcome = dispatcher(&spy)
            .dispatch(
                &session(AccountCapability::Signing),
                request(2, RpcAction::SignTransaction(TransactionPayload::default())),
            )
            .await;
        assert_eq!(outcome.rejection(), Some(&DispatchError::UserCancelled));
        assert!(!outcome.rejection().unwrap().is_surfaced());
        assert_eq!(spy.calls(), vec!["confirm_transaction(send=false)"]);
    }

    #[tokio::test]
    async fn test_send_transaction_uses_tx_chain_and_reports_broadcast_failure() {
        let spy = Spy::approving();
        let tx = TransactionPayload {
            chain_id: Some(U256::from(10u8)),
            ..TransactionPayload::default()
        };
        let outcome = dispatcher(&spy)
            .dispatch(&session(AccountCapability::Signing), request(1, RpcAction::SendTransaction(tx.clone())))
            .await;
        assert!(matches!(
            outcome,
            DispatchOutcome::Fulfil(ResponseEnvelope { result: RpcResult::TransactionHash(h), .. }) if h == TX_HASH
        ));
        assert_eq!(
            spy.calls(),
            vec!["confirm_transaction(send=true)", "sign_transaction(10)", "broadcast(10)"]
        );

        *spy.broadcast_error.lock().unwrap() = Some("nonce too low".into());
        let outcome = dispatcher(&spy)
            .dispatch(&session(AccountCapability::Signing), request(2, RpcAction::SendTransaction(tx)))
            .await;
        let reason = outcome.rejection().unwrap();
        assert_eq!(reason, &DispatchError::BroadcastFailed("nonce too low".into()));
        assert!(reason.is_surfaced());
    }

    #[tokio::test]
    async fn test_message_results_are_tagged_per_kind() {
        let spy = Spy::approving();
        let dispatcher = dispatcher(&spy);
        let session = session(AccountCapability::Signing);

        let eth_sign = dispatcher
            .dispatch(&session, request(1, RpcAction::SignMessage(Bytes::from_static(b"hi"))))
            .await;
        assert!(matches!(
            eth_sign,
            DispatchOutcome::Fulfil(ResponseEnvelope { result: RpcResult::MessageSignature(_), .. })
        ));
        let personal = dispatcher
            .dispatch(&session, request(2, RpcAction::SignPersonalMessage(Bytes::from_static(b"hi"))))
            .await;
        assert!(matches!(
            personal,
            DispatchOutcome::Fulfil(ResponseEnvelope { result: RpcResult::PersonalMessageSignature(_), .. })
        ));
        assert_eq!(
            spy.calls(),
            vec!["confirm_message(0x6869)", "sign_hash", "confirm_message(hi)", "sign_hash"]
        );
    }

    #[tokio::test]
    async fn test_typed_data_signs_eip712_digest() {
        let spy = Spy::approving();
        let outcome = dispatcher(&spy)
            .dispatch(
                &session(AccountCapability::Signing),
                request(1, RpcAction::SignTypedMessage(Box::new(mail()))),
            )
            .await;
        let DispatchOutcome::Fulfil(envelope) = outcome else {
            panic!("expected fulfil");
        };
        assert_eq!(envelope.result, RpcResult::TypedMessageSignature(Bytes::from_static(&[0x5a; 65])));
        assert_eq!(
            spy.signed_hashes.lock().unwrap().clone(),
            vec![b256!("0xbe609aee343fb3c4b28e1df9e632fca64fcfaede20f02e86244efddf30957bd2")]
        );
        let calls = spy.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].starts_with("confirm_message(") && calls[0].contains("Hello, Bob!"));
        assert_eq!(calls[1], "sign_hash");
    }

    #[tokio::test]
    async fn test_typed_data_cancelled_is_not_signed() {
        let spy = Spy::declining();
        let outcome = dispatcher(&spy)
            .dispatch(
                &session(AccountCapability::Signing),
                request(2, RpcAction::SignTypedMessage(Box::new(mail()))),
            )
            .await;
        assert_eq!(outcome.rejection(), Some(&DispatchError::UserCancelled));
        assert!(spy.signed_hashes.lock().unwrap().is_empty());
        assert_eq!(spy.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_raw_transaction_flow() {
        let spy = Spy::approving();
        let outcome = dispatcher(&spy)
            .dispatch(
                &session(AccountCapability::Signing),
                request(1, RpcAction::SendRawTransaction(Bytes::from_static(&[0x02]))),
            )
            .await;
        assert!(matches!(outcome, DispatchOutcome::Fulfil(_)));
        assert_eq!(
            spy.calls(),
            vec![
                "confirm_raw_transaction".to_owned(),
                "broadcast(8453)".to_owned(),
                format!("notify(Transaction sent: {TX_HASH})"),
            ]
        );

        let spy = Spy::declining();
        let outcome = dispatcher(&spy)
            .dispatch(
                &session(AccountCapability::Signing),
                request(2, RpcAction::SendRawTransaction(Bytes::from_static(&[0x02]))),
            )
            .await;
        assert_eq!(outcome.rejection(), Some(&DispatchError::UserCancelled));
    }

    #[tokio::test]
    async fn test_placeholder_count_and_unknown() {
        let spy = Spy::approving();
        let dispatcher = dispatcher(&spy);
        let session = session(AccountCapability::Signing);
        let count = dispatcher
            .dispatch(&session, request(1, RpcAction::GetTransactionCount))
            .await;
        assert!(matches!(
            count,
            DispatchOutcome::Fulfil(ResponseEnvelope { result: RpcResult::TransactionCount(c), .. }) if c.is_zero()
        ));
        let unknown = dispatcher
            .dispatch(&session, request(2, RpcAction::Unknown("wallet_watchAsset".into())))
            .await;
        assert_eq!(
            unknown.rejection(),
            Some(&DispatchError::UnsupportedAction("wallet_watchAsset".into()))
        );
        assert!(spy.calls().is_empty());
    }

    struct BlockOrigin;

    impl DispatchHooks for BlockOrigin {
        fn before_dispatch<'a>(
            &'a self,
            ctx: &'a DispatchContext<'a>,
        ) -> std::pin::Pin<Box<dyn std::future::Future<Output = HookDecision> + Send + 'a>> {
            Box::pin(async move {
                if ctx.request.origin.contains("app.example") {
                    HookDecision::Abort {
                        reason: "origin_blocked".into(),
                        message: "denylisted".into(),
                    }
                } else {
                    HookDecision::Continue
                }
            })
        }
    }

    #[derive(Clone, Default)]
    struct CountRejections(Arc<Mutex<Vec<DispatchError>>>);

    impl DispatchHooks for CountRejections {
        fn on_reject<'a>(
            &'a self,
            _ctx: &'a DispatchContext<'a>,
            rejection: &'a Rejection,
        ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
            Box::pin(async move {
                self.0.lock().unwrap().push(rejection.reason.clone());
            })
        }
    }

    #[tokio::test]
    async fn test_before_hook_aborts_and_reject_hook_observes() {
        let spy = Spy::approving();
        let seen = CountRejections::default();
        let dispatcher = dispatcher(&spy).with_hook(BlockOrigin).with_hook(seen.clone());
        assert_eq!(dispatcher.hook_count(), 2);

        let outcome = dispatcher
            .dispatch(
                &session(AccountCapability::Signing),
                request(1, RpcAction::SignMessage(Bytes::from_static(b"hi"))),
            )
            .await;
        assert_eq!(
            outcome.rejection(),
            Some(&DispatchError::Aborted("origin_blocked: denylisted".into()))
        );
        assert!(spy.calls().is_empty());

        // capability denials skip before hooks but are still observed
        dispatcher
            .dispatch(&session(AccountCapability::WatchOnly), request(2, RpcAction::GetTransactionCount))
            .await;
        assert_eq!(
            seen.0.lock().unwrap().clone(),
            vec![
                DispatchError::Aborted("origin_blocked: denylisted".into()),
                DispatchError::CapabilityDenied
            ]
        );
    }
}
