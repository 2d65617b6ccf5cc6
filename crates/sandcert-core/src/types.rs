//! Core types shared across the sandcert crates.

use std::fmt;
use std::path::PathBuf;

/// Exit code when a new certificate was installed.
pub const EXIT_INSTALLED: i32 = 0;

/// Exit code for any fatal error.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code when the installed certificate is already current.
pub const EXIT_UNCHANGED: i32 = 3;

/// Where the sandcats artifacts are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A directory on the local filesystem
    Local(PathBuf),
    /// A `container/path` locator pulled out of an LXD container
    Lxd(String),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Local(path) => write!(f, "{}", path.display()),
            Source::Lxd(locator) => write!(f, "lxd:{}", locator),
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Certificate and key were written to the destination
    Installed,
    /// The destination already holds the same certificate
    Unchanged,
}

impl InstallOutcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            InstallOutcome::Installed => EXIT_INSTALLED,
            InstallOutcome::Unchanged => EXIT_UNCHANGED,
        }
    }
}
