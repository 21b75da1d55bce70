//! Classification of scanned or pasted text.
//!
//! [`classify`] maps any string to exactly one [`ScannedPayload`]. It is a
//! pure function and never fails: text that matches no structured shape ends
//! up as [`ScannedPayload::SeedPhrase`] or [`ScannedPayload::PlainText`].
//!
//! Shapes are tried in this order, first match wins:
//!
//! 1. bare address, then payment-request URI
//! 2. remote-session handshake URI (`wc:`)
//! 3. `http`/`https` link (or bare `www.` host)
//! 4. JSON object or array
//! 5. private key (64 hex digits, optional `0x`)
//! 6. space-separated words

use std::fmt;
use std::sync::LazyLock;

use alloy_primitives::Address;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::eip681::{PaymentRequestUri, parse_address};

static PRIVATE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[xX])?[0-9a-fA-F]{64}$").expect("valid private key regex"));

static SESSION_TOPIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\-]+$").expect("valid topic regex"));

/// Protocol version specific part of a remote-session URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "version", rename_all = "camelCase")]
pub enum SessionProtocol {
    /// Version 1: bridge server plus symmetric key.
    #[serde(rename = "1")]
    V1 {
        /// Bridge server URL.
        bridge: Url,
        /// Hex symmetric key.
        key: String,
    },
    /// Version 2: relay protocol plus symmetric key.
    #[serde(rename = "2")]
    V2 {
        /// Relay protocol name (e.g., `irn`).
        relay_protocol: Option<String>,
        /// Hex symmetric key.
        sym_key: String,
    },
}

/// A remote-session handshake URI (`wc:<topic>@<version>?...`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSessionUri {
    /// The URI exactly as scanned.
    pub uri: String,
    /// Pairing topic.
    pub topic: String,
    /// Version specific parameters.
    pub protocol: SessionProtocol,
}

impl RemoteSessionUri {
    /// Parses a handshake URI, returning `None` if it does not have the shape.
    #[must_use]
    pub fn parse(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix("wc:")?;
        let (head, query) = rest.split_once('?')?;
        let (topic, version) = head.split_once('@')?;
        if !SESSION_TOPIC.is_match(topic) {
            return None;
        }
        let params: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let param = |key: &str| {
            params
                .iter()
                .find(|(k, v)| k == key && !v.is_empty())
                .map(|(_, v)| v.clone())
        };
        let protocol = match version {
            "1" => SessionProtocol::V1 {
                bridge: Url::parse(&param("bridge")?).ok()?,
                key: param("key")?,
            },
            "2" => SessionProtocol::V2 {
                relay_protocol: param("relay-protocol"),
                sym_key: param("symKey")?,
            },
            _ => return None,
        };
        Some(Self {
            uri: uri.to_owned(),
            topic: topic.to_owned(),
            protocol,
        })
    }
}

impl fmt::Display for RemoteSessionUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// The semantic type of a scanned string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ScannedPayload {
    /// A bare wallet or contract address.
    Address(Address),
    /// A payment-request URI.
    PaymentRequest(PaymentRequestUri),
    /// A remote-session handshake URI.
    RemoteSession(RemoteSessionUri),
    /// A web link.
    Url(Url),
    /// A JSON document (e.g., an encrypted keystore).
    Json(String),
    /// A raw private key.
    PrivateKey(String),
    /// Two or more space-separated words.
    SeedPhrase(Vec<String>),
    /// Anything else.
    PlainText(String),
}

impl ScannedPayload {
    /// Short label of the variant, safe to log.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Address(_) => "address",
            Self::PaymentRequest(_) => "payment_request",
            Self::RemoteSession(_) => "remote_session",
            Self::Url(_) => "url",
            Self::Json(_) => "json",
            Self::PrivateKey(_) => "private_key",
            Self::SeedPhrase(_) => "seed_phrase",
            Self::PlainText(_) => "plain_text",
        }
    }
}

fn parse_link(text: &str) -> Option<Url> {
    if text.chars().any(char::is_whitespace) {
        return None;
    }
    let url = if text.starts_with("www.") {
        Url::parse(&format!("https://{text}")).ok()?
    } else {
        Url::parse(text).ok()?
    };
    let web = matches!(url.scheme(), "http" | "https");
    (web && url.host_str().is_some_and(|host| !host.is_empty())).then_some(url)
}

fn parse_json(text: &str) -> Option<String> {
    if !(text.starts_with('{') || text.starts_with('[')) {
        return None;
    }
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .map(|_| text.to_owned())
}

/// Classifies `input` into exactly one [`ScannedPayload`].
///
/// Leading and trailing whitespace is ignored. An empty input is
/// `PlainText("")`.
#[must_use]
pub fn classify(input: &str) -> ScannedPayload {
    let text = input.trim();
    let payload = classify_trimmed(text);
    #[cfg(feature = "telemetry")]
    tracing::debug!(kind = payload.kind(), len = text.len(), "Classified payload");
    payload
}

fn classify_trimmed(text: &str) -> ScannedPayload {
    if let Some(address) = parse_address(text) {
        return ScannedPayload::Address(address);
    }
    if let Ok(uri) = PaymentRequestUri::parse(text) {
        return ScannedPayload::PaymentRequest(uri);
    }
    if let Some(session) = RemoteSessionUri::parse(text) {
        return ScannedPayload::RemoteSession(session);
    }
    if let Some(url) = parse_link(text) {
        return ScannedPayload::Url(url);
    }
    if let Some(json) = parse_json(text) {
        return ScannedPayload::Json(json);
    }
    if PRIVATE_KEY.is_match(text) {
        return ScannedPayload::PrivateKey(text.to_owned());
    }
    let words: Vec<String> = text
        .split(' ')
        .filter(|word| !word.is_empty())
        .map(str::to_owned)
        .collect();
    if words.len() >= 2 {
        ScannedPayload::SeedPhrase(words)
    } else {
        ScannedPayload::PlainText(text.to_owned())
    }
}
