//! Issuance envelope parsing and chain extraction.
//!
//! The sandcats agent stores each issued certificate as JSON:
//!
//! ```json
//! {"cert": "-----BEGIN CERTIFICATE-----\r\n...", "ca": ["...", "..."]}
//! ```
//!
//! The reverse proxy wants a single PEM file with the leaf first and the whole
//! CA chain after it, in order.

use sandcert_core::{Result, SandcertError};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;

/// Parsed `<id>.response-json` document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssuanceEnvelope {
    /// Leaf certificate
    pub cert: String,
    /// CA chain, leaf issuer first. Missing and `null` both mean no chain.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ca: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl IssuanceEnvelope {
    /// Parse an envelope from JSON text. `path` only labels errors.
    pub fn from_json(json: &str, path: &Path) -> Result<Self> {
        let envelope: Self = serde_json::from_str(json)
            .map_err(|e| SandcertError::invalid_envelope(path, e.to_string()))?;

        if envelope.cert.trim().is_empty() {
            return Err(SandcertError::invalid_envelope(path, "empty 'cert' field"));
        }

        Ok(envelope)
    }

    /// Read and parse an envelope file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .map_err(|e| SandcertError::invalid_envelope(path, e.to_string()))?;
        Self::from_json(&json, path)
    }

    /// Leaf certificate followed by every CA entry, LF line endings.
    pub fn chain_text(&self) -> String {
        let cert = normalize_newlines(&self.cert);

        if self.ca.is_empty() {
            return cert;
        }

        let chain = self
            .ca
            .iter()
            .map(|entry| normalize_newlines(entry))
            .collect::<Vec<_>>()
            .join("\n");

        format!("{}\n{}", cert, chain)
    }
}

/// Read an envelope and return the text to install as the certificate file.
pub fn extract_certificate_text(envelope_path: &Path) -> Result<String> {
    Ok(IssuanceEnvelope::from_file(envelope_path)?.chain_text())
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}
