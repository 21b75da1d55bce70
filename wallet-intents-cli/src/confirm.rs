//! Confirmation prompts on the terminal.

use std::io::Write;

use alloy_primitives::Bytes;
use futures_util::future::BoxFuture;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Mutex;
use wallet_intents::session::Session;
use wallet_intents::session::dispatcher::{Confirmer, Decision};
use wallet_intents::session::message::SignableMessage;
use wallet_intents::session::rpc::TransactionPayload;

/// Word the user must type to broadcast a pre-signed transaction.
const SEND_WORD: &str = "send";

/// [`Confirmer`] that prompts on stderr and reads answers from `R`.
///
/// With `auto_approve` every prompt is answered with approval without reading.
#[derive(Debug)]
pub struct TerminalConfirmer<R> {
    input: Mutex<R>,
    auto_approve: bool,
}

impl<R: AsyncBufRead + Unpin + Send> TerminalConfirmer<R> {
    /// Creates a confirmer reading from `input`.
    pub fn new(input: R, auto_approve: bool) -> Self {
        Self {
            input: Mutex::new(input),
            auto_approve,
        }
    }

    async fn ask(&self, prompt: &str, accept: &[&str]) -> Decision {
        if self.auto_approve {
            tracing::info!("Auto-approved: {prompt}");
            return Decision::Approved;
        }
        show(prompt);

        let mut answer = String::new();
        let read = self.input.lock().await.read_line(&mut answer).await;
        match read {
            Ok(0) | Err(_) => Decision::Cancelled,
            Ok(_) if accept.contains(&answer.trim().to_lowercase().as_str()) => Decision::Approved,
            Ok(_) => Decision::Cancelled,
        }
    }
}

fn show(prompt: &str) {
    let mut stderr = std::io::stderr().lock();
    let _ = write!(stderr, "{prompt} ");
    let _ = stderr.flush();
}

fn describe_transaction(session: &Session, tx: &TransactionPayload, send: bool) -> String {
    let verb = if send { "Sign and send" } else { "Sign" };
    let to = tx.to.map_or_else(|| "contract creation".to_owned(), |to| to.to_string());
    let value = tx.value.unwrap_or_default();
    format!(
        "{verb} transaction requested by {} on chain {}: to {to}, value {value} wei? [y/N]",
        session.peer.name,
        session.chain_id
    )
}

impl<R: AsyncBufRead + Unpin + Send> Confirmer for TerminalConfirmer<R> {
    fn confirm_transaction<'a>(
        &'a self,
        session: &'a Session,
        tx: &'a TransactionPayload,
        send: bool,
    ) -> BoxFuture<'a, Decision> {
        Box::pin(async move { self.ask(&describe_transaction(session, tx, send), &["y", "yes"]).await })
    }

    fn confirm_message<'a>(&'a self, session: &'a Session, message: &'a SignableMessage) -> BoxFuture<'a, Decision> {
        Box::pin(async move {
            let prompt = format!(
                "Sign message requested by {}:\n{}\n[y/N]",
                session.peer.name,
                message.display_text()
            );
            self.ask(&prompt, &["y", "yes"]).await
        })
    }

    fn confirm_raw_transaction<'a>(&'a self, session: &'a Session, raw: &'a Bytes) -> BoxFuture<'a, Decision> {
        Box::pin(async move {
            let prompt = format!(
                "Broadcast pre-signed transaction from {} on chain {}:\n{raw}\nType '{SEND_WORD}' to confirm:",
                session.peer.name,
                session.chain_id
            );
            self.ask(&prompt, &[SEND_WORD]).await
        })
    }

    fn notify<'a>(&'a self, message: &'a str) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            tracing::info!("{message}");
        })
    }
}
