//! `wallet-intents` command-line tool.
//!
//! # Usage
//!
//! ```bash
//! # Classify scanned text (no network access)
//! wallet-intents classify "ethereum:0xA0b8...eB48/transfer?address=0x...&uint256=1.5"
//!
//! # Classify and resolve against the configured chains
//! CONFIG=/path/to/wallet-intents.toml wallet-intents resolve "ethereum:..."
//!
//! # Replay recorded peer requests through a session
//! wallet-intents replay requests.jsonl --uri "wc:topic@2?relay-protocol=irn&symKey=..."
//!
//! # Configure logging level
//! RUST_LOG=debug wallet-intents resolve "0x..."
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to TOML configuration file (default: `wallet-intents.toml`)
//! - `RUST_LOG` - Log level filter (default: `info`)

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;
use wallet_intents::classify;
use wallet_intents::payload::RemoteSessionUri;
use wallet_intents::session::PeerMetadata;
use wallet_intents::session::lifecycle::SessionManager;
use wallet_intents_cli::confirm::TerminalConfirmer;
use wallet_intents_cli::replay::replay;
use wallet_intents_cli::transport::ReplayTransport;
use wallet_intents_cli::{Wallet, WalletConfig};

#[derive(Debug, Parser)]
#[command(name = "wallet-intents", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify scanned text without network access.
    Classify {
        /// The scanned text.
        text: String,
    },
    /// Classify scanned text and resolve payment requests.
    Resolve {
        /// The scanned text.
        text: String,
    },
    /// Replay peer requests, one JSON-RPC call per line, through a session.
    Replay {
        /// File with the recorded calls.
        file: PathBuf,
        /// Session URI to connect with. Without it the stored session is resumed.
        #[arg(long)]
        uri: Option<String>,
        /// Origin reported for every request.
        #[arg(long, default_value = "replay")]
        origin: String,
        /// Approve every prompt without asking.
        #[arg(long)]
        yes: bool,
    },
    /// Close the stored session.
    Disconnect,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!("wallet-intents failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Classify { text } => emit(&classify(&text)),
        Command::Resolve { text } => {
            let wallet = Wallet::from_config(WalletConfig::load()?)?;
            let outcome = wallet
                .scanner()
                .scan(&text)
                .await
                .ok_or("another scan is in progress")??;
            emit(&outcome)
        }
        Command::Replay {
            file,
            uri,
            origin,
            yes,
        } => {
            let wallet = Wallet::from_config(WalletConfig::load()?)?;
            let manager = session_manager(&wallet, &origin, yes)?;
            match uri {
                Some(uri) => {
                    let uri = RemoteSessionUri::parse(&uri).ok_or("not a session URI")?;
                    manager.connect(&uri).await?;
                }
                None => {
                    manager
                        .restore()
                        .await
                        .ok_or("no stored session, pass --uri to connect")?;
                }
            }
            let input = BufReader::new(tokio::fs::File::open(&file).await?);
            let summary = replay(&manager, input, &origin).await?;
            tracing::info!(
                fulfilled = summary.fulfilled,
                rejected = summary.rejected,
                failed = summary.failed,
                skipped = summary.skipped,
                "Replay finished"
            );
            if summary.failed > 0 {
                return Err(format!("{} request(s) failed to sign or broadcast", summary.failed).into());
            }
            Ok(())
        }
        Command::Disconnect => {
            let wallet = Wallet::from_config(WalletConfig::load()?)?;
            let manager = session_manager(&wallet, "replay", true)?;
            manager.restore().await;
            manager.disconnect().await;
            Ok(())
        }
    }
}

fn session_manager(wallet: &Wallet, origin: &str, yes: bool) -> Result<SessionManager, Box<dyn std::error::Error>> {
    let peer = PeerMetadata {
        name: origin.to_owned(),
        url: origin.to_owned(),
        ..Default::default()
    };
    let transport = Arc::new(ReplayTransport::new(
        std::io::stdout(),
        wallet.config().active_chain,
        peer,
    ));
    let confirmer = Arc::new(TerminalConfirmer::new(BufReader::new(tokio::io::stdin()), yes));
    Ok(wallet.session_manager(transport, confirmer)?)
}

fn emit(value: &impl Serialize) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(value)?;
    writeln!(std::io::stdout().lock(), "{json}")?;
    Ok(())
}
