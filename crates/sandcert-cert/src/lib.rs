//! Sandcats certificate discovery and extraction
//!
//! This crate finds the newest complete certificate/key pair that the
//! sandcats.io agent of a Sandstorm server left in its certificate directory,
//! and turns the JSON envelope of that certificate into PEM text with the full
//! CA chain.
//!
//! ```no_run
//! use sandcert_cert::{extract_certificate_text, select_newest_pair, TracingReporter};
//! use std::path::Path;
//!
//! let pair = select_newest_pair(
//!     Path::new("/opt/sandstorm/var/sandcats/https/box.sandcats.io"),
//!     &TracingReporter,
//! )?;
//! let pem = extract_certificate_text(&pair.json_cert)?;
//! # Ok::<(), sandcert_core::SandcertError>(())
//! ```

pub mod artifact;
pub mod envelope;
pub mod report;
pub mod selector;

pub use artifact::{ArtifactFile, ArtifactKind};
pub use envelope::{extract_certificate_text, IssuanceEnvelope};
pub use report::{Reporter, TracingReporter};
pub use selector::{collect_groups, select_newest_pair, CertificateGroup, CertificatePair};
