//! Newest certificate/key pair selection.
//!
//! The issuance agent names every artifact after a monotonically increasing
//! identifier:
//!
//! ```text
//! 1496436123                 private key
//! 1496436123.csr             signing request (ignored)
//! 1496436123.response-json   certificate envelope
//! ```
//!
//! Files are grouped by identifier and the highest identifier with both an
//! envelope and a key wins. Modification times are never consulted, copies
//! and backups change them.

use sandcert_core::{Result, SandcertError};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::artifact::{ArtifactFile, ArtifactKind};
use crate::report::Reporter;

/// Artifacts sharing one identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateGroup {
    pub json_cert: Option<PathBuf>,
    pub private_key: Option<PathBuf>,
}

impl CertificateGroup {
    /// Both an envelope and a key are present.
    pub fn is_complete(&self) -> bool {
        self.json_cert.is_some() && self.private_key.is_some()
    }
}

/// The envelope and key of one complete group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificatePair {
    pub identifier: u64,
    pub json_cert: PathBuf,
    pub private_key: PathBuf,
}

/// List the regular files directly inside `source_dir`, sorted by name.
///
/// Entries that cannot be resolved (dangling or looping symlinks) are not
/// regular files and are skipped. Only an unreadable `source_dir` is an error.
fn list_files(source_dir: &Path, reporter: &dyn Reporter) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(source_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() >= 1 => {
                match e.path() {
                    Some(path) => reporter.file_ignored(path),
                    None => debug!("Skipping unreadable entry: {}", e),
                }
                continue;
            }
            Err(e) => return Err(SandcertError::io(source_dir, io::Error::from(e))),
        };

        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Group the artifacts of `source_dir` by identifier.
///
/// Envelopes that are not valid JSON are reported and left out. A file whose
/// name has no numeric stem aborts the scan.
pub fn collect_groups(
    source_dir: &Path,
    reporter: &dyn Reporter,
) -> Result<BTreeMap<u64, CertificateGroup>> {
    if !source_dir.is_dir() {
        return Err(SandcertError::SourceUnavailable {
            path: source_dir.to_path_buf(),
        });
    }

    let mut groups: BTreeMap<u64, CertificateGroup> = BTreeMap::new();

    for path in list_files(source_dir, reporter)? {
        let artifact = ArtifactFile::from_path(&path)?;

        match artifact.kind {
            ArtifactKind::JsonCert => {
                if let Err(reason) = check_json(&artifact.path) {
                    reporter.envelope_skipped(&artifact.path, &reason);
                    continue;
                }
                groups.entry(artifact.identifier).or_default().json_cert = Some(artifact.path);
            }
            ArtifactKind::PrivateKey => {
                groups.entry(artifact.identifier).or_default().private_key = Some(artifact.path);
            }
            ArtifactKind::Csr | ArtifactKind::Unknown => reporter.file_ignored(&artifact.path),
        }
    }

    debug!("Found {} identifier group(s) in {}", groups.len(), source_dir.display());

    Ok(groups)
}

/// Envelopes may be half-written while the agent is renewing, so any read or
/// parse failure only disqualifies this one file.
fn check_json(path: &Path) -> std::result::Result<(), String> {
    let contents = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str::<serde_json::Value>(&contents).map_err(|e| e.to_string())?;
    Ok(())
}

/// Find the complete group with the highest identifier in `source_dir`.
///
/// # Errors
///
/// - [`SandcertError::SourceUnavailable`] if `source_dir` is not a directory
/// - [`SandcertError::MalformedIdentifier`] for a file with a non-numeric stem
/// - [`SandcertError::NoValidPairFound`] if no identifier has both files
pub fn select_newest_pair(source_dir: &Path, reporter: &dyn Reporter) -> Result<CertificatePair> {
    let groups = collect_groups(source_dir, reporter)?;

    let pair = groups
        .into_iter()
        .filter_map(|(identifier, group)| match group {
            CertificateGroup {
                json_cert: Some(json_cert),
                private_key: Some(private_key),
            } => Some(CertificatePair {
                identifier,
                json_cert,
                private_key,
            }),
            _ => None,
        })
        .max_by_key(|pair| pair.identifier)
        .ok_or_else(|| SandcertError::NoValidPairFound {
            path: source_dir.to_path_buf(),
        })?;

    reporter.pair_selected(&pair);

    Ok(pair)
}
