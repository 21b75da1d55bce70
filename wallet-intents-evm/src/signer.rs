//! Local private-key signing.
//!
//! [`LocalKeySigner`] signs for a single account held in memory. Transactions
//! must arrive complete: nonce, gas limit and fees are not filled in.

use alloy_eips::eip2718::Encodable2718;
use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use futures_util::future::BoxFuture;
use wallet_intents::chain::ChainId;
use wallet_intents::session::dispatcher::{SignerError, WalletSigner};
use wallet_intents::session::rpc::TransactionPayload;

/// [`WalletSigner`] over one in-memory private key.
#[derive(Debug, Clone)]
pub struct LocalKeySigner(PrivateKeySigner);

impl LocalKeySigner {
    /// Wraps `signer`.
    #[must_use]
    pub const fn new(signer: PrivateKeySigner) -> Self {
        Self(signer)
    }

    /// The account this signer signs for.
    #[must_use]
    pub fn address(&self) -> Address {
        self.0.address()
    }

    fn check_account(&self, account: Address) -> Result<(), SignerError> {
        if account == self.address() {
            Ok(())
        } else {
            Err(SignerError(format!("no key for account {account}")))
        }
    }
}

impl std::str::FromStr for LocalKeySigner {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<PrivateKeySigner>()
            .map(Self)
            .map_err(|e| SignerError(format!("invalid private key: {e}")))
    }
}

fn narrow<T: TryFrom<U256>>(field: &str, value: U256) -> Result<T, SignerError> {
    T::try_from(value).map_err(|_| SignerError(format!("{field} out of range: {value}")))
}

/// Converts a peer's transaction into a request ready to sign on `chain_id`.
///
/// # Errors
///
/// Fails if a quantity does not fit its field or if nonce or gas limit is missing.
pub fn transaction_request(
    account: Address,
    chain_id: ChainId,
    tx: &TransactionPayload,
) -> Result<TransactionRequest, SignerError> {
    let nonce = tx.nonce.ok_or_else(|| SignerError("transaction has no nonce".into()))?;
    let gas = tx.gas.ok_or_else(|| SignerError("transaction has no gas limit".into()))?;

    let mut request = TransactionRequest::default()
        .with_from(account)
        .with_chain_id(chain_id)
        .with_nonce(narrow("nonce", nonce)?)
        .with_gas_limit(narrow("gas", gas)?)
        .with_value(tx.value.unwrap_or_default())
        .with_input(tx.data.clone().unwrap_or_default());
    request = match tx.to {
        Some(to) => request.with_to(to),
        None => request.into_create(),
    };
    request = match (tx.max_fee_per_gas, tx.gas_price) {
        (Some(max_fee), _) => {
            let priority = tx.max_priority_fee_per_gas.unwrap_or_default();
            request
                .with_max_fee_per_gas(narrow("maxFeePerGas", max_fee)?)
                .with_max_priority_fee_per_gas(narrow("maxPriorityFeePerGas", priority)?)
        }
        (None, Some(gas_price)) => request.with_gas_price(narrow("gasPrice", gas_price)?),
        (None, None) => return Err(SignerError("transaction has no fee fields".into())),
    };
    Ok(request)
}

impl WalletSigner for LocalKeySigner {
    fn sign_hash(&self, account: Address, hash: B256) -> BoxFuture<'_, Result<Bytes, SignerError>> {
        Box::pin(async move {
            self.check_account(account)?;
            let signature = self
                .0
                .sign_hash(&hash)
                .await
                .map_err(|e| SignerError(e.to_string()))?;
            Ok(Bytes::from(signature.as_bytes()))
        })
    }

    fn sign_transaction<'a>(
        &'a self,
        account: Address,
        chain_id: ChainId,
        tx: &'a TransactionPayload,
    ) -> BoxFuture<'a, Result<Bytes, SignerError>> {
        Box::pin(async move {
            self.check_account(account)?;
            let request = transaction_request(account, chain_id, tx)?;
            let wallet = EthereumWallet::from(self.0.clone());
            let envelope = request
                .build(&wallet)
                .await
                .map_err(|e| SignerError(e.to_string()))?;
            #[cfg(feature = "telemetry")]
            tracing::debug!(chain_id, tx_hash = %envelope.tx_hash(), "Signed transaction");
            Ok(Bytes::from(envelope.encoded_2718()))
        })
    }
}
