//! Sandcats artifact files and how they are recognized from their names.

use sandcert_core::{Result, SandcertError};
use std::path::{Path, PathBuf};

/// Suffix of the JSON envelope written by the issuance agent.
pub const JSON_CERT_SUFFIX: &str = ".response-json";

/// Suffix of the certificate signing request, never installed.
pub const CSR_SUFFIX: &str = ".csr";

/// Kind of a file found in the sandcats directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Certificate signing request (`<id>.csr`)
    Csr,
    /// JSON envelope with the certificate and CA chain (`<id>.response-json`)
    JsonCert,
    /// Private key (`<id>`, no extension)
    PrivateKey,
    /// Anything else
    Unknown,
}

impl ArtifactKind {
    /// Determine the artifact kind from a file name (not a full path)
    pub fn from_file_name(file_name: &str) -> Self {
        if file_name.ends_with(CSR_SUFFIX) {
            return Self::Csr;
        }

        if file_name.ends_with(JSON_CERT_SUFFIX) {
            return Self::JsonCert;
        }

        if !file_name.contains('.') {
            return Self::PrivateKey;
        }

        Self::Unknown
    }
}

/// A file from the sandcats directory with its identifier and kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub path: PathBuf,
    pub identifier: u64,
    pub kind: ArtifactKind,
}

impl ArtifactFile {
    /// Classify a path.
    ///
    /// Fails with [`SandcertError::MalformedIdentifier`] when the stem is not
    /// a decimal number: the directory then holds files from some other
    /// naming scheme and nothing in it can be trusted.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SandcertError::MalformedIdentifier {
                path: path.to_path_buf(),
            })?;

        let identifier =
            parse_identifier(file_name).ok_or_else(|| SandcertError::MalformedIdentifier {
                path: path.to_path_buf(),
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            identifier,
            kind: ArtifactKind::from_file_name(file_name),
        })
    }
}

/// Parse the identifier from the part of a file name before the first `.`.
pub fn parse_identifier(file_name: &str) -> Option<u64> {
    let stem = file_name.split('.').next().unwrap_or(file_name);

    // u64::from_str would also take a leading '+'
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    stem.parse().ok()
}
