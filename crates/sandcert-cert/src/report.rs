//! Reporting capability handed to the selector.
//!
//! The selector never logs directly. Callers pass a [`Reporter`], which lets
//! tests observe skipped envelopes without capturing process output.

use std::path::Path;
use tracing::{debug, info, warn};

use crate::selector::CertificatePair;

/// Receives the notable events of a selection run
pub trait Reporter {
    /// A JSON envelope was unreadable or malformed and was left out of its group.
    fn envelope_skipped(&self, path: &Path, reason: &str);

    /// A file that is neither an envelope nor a key was ignored.
    fn file_ignored(&self, _path: &Path) {}

    /// The newest complete pair was chosen.
    fn pair_selected(&self, _pair: &CertificatePair) {}
}

/// Forwards every event to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn envelope_skipped(&self, path: &Path, reason: &str) {
        warn!("JSON file has wrong format, ignoring: {} ({})", path.display(), reason);
    }

    fn file_ignored(&self, path: &Path) {
        debug!("Ignoring {}", path.display());
    }

    fn pair_selected(&self, pair: &CertificatePair) {
        info!(
            identifier = pair.identifier,
            "Selected certificate {} with key {}",
            pair.json_cert.display(),
            pair.private_key.display()
        );
    }
}
