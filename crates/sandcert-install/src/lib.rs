//! Installing sandcats certificates for a reverse proxy
//!
//! Ties the pieces together: the source directory (local, or staged out of an
//! LXD container), selection and extraction from `sandcert-cert`, the
//! change-only install into the destination directory and the optional proxy
//! restart.

pub mod installer;
pub mod restart;
pub mod run;

pub use installer::{install, Destination};
pub use restart::RestartCommand;
pub use run::{run, RunOptions};
