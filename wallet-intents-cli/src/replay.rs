//! Replay of recorded peer requests through a live session.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use wallet_intents::SessionError;
use wallet_intents::session::lifecycle::SessionManager;
use wallet_intents::session::rpc::JsonRpcCall;

/// Errors that stop a replay.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// The input could not be read.
    #[error("Failed to read calls: {0}")]
    Io(#[from] std::io::Error),
    /// The session could not deliver a response.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// What happened to the replayed calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Calls answered with a result.
    pub fulfilled: usize,
    /// Calls rejected quietly: cancelled, denied or unsupported.
    pub rejected: usize,
    /// Calls rejected by a signing or broadcast failure.
    pub failed: usize,
    /// Lines that were not JSON-RPC calls.
    pub skipped: usize,
}

/// Feeds every JSON-RPC call in `input`, one per line, to `manager`.
///
/// Blank lines are ignored and malformed lines are skipped with a warning.
/// Signing and broadcast failures are logged at error level; other
/// rejections stay at info.
///
/// # Errors
///
/// Stops on a read error or when a response cannot be delivered.
pub async fn replay<R: AsyncBufRead + Unpin>(
    manager: &SessionManager,
    input: R,
    origin: &str,
) -> Result<ReplaySummary, ReplayError> {
    let mut summary = ReplaySummary::default();
    let mut lines = input.lines();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let call: JsonRpcCall = match serde_json::from_str(&line) {
            Ok(call) => call,
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "Skipping malformed call");
                summary.skipped += 1;
                continue;
            }
        };
        let outcome = manager.handle_call(&call, origin).await?;
        match outcome.rejection() {
            None => summary.fulfilled += 1,
            Some(reason) if reason.is_surfaced() => {
                tracing::error!(request_id = %outcome.request_id(), %reason, "Request failed");
                summary.failed += 1;
            }
            Some(reason) => {
                tracing::info!(request_id = %outcome.request_id(), %reason, "Request rejected");
                summary.rejected += 1;
            }
        }
    }
    Ok(summary)
}
