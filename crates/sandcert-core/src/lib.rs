//! # sandcert core
//!
//! Shared building blocks for sandcert, the tool that installs the newest
//! sandcats.io certificate issued to a Sandstorm server into a reverse proxy.
//!
//! - **Errors**: [`SandcertError`], one variant per failure mode of the pipeline.
//! - **Configuration**: [`AppConfig`], loaded from YAML and `SANDCERT__*`
//!   environment variables.
//! - **Types**: the certificate [`Source`] and the [`InstallOutcome`] with its
//!   process exit code.

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{ConfigError, Result, SandcertError};
pub use types::{InstallOutcome, Source, EXIT_FAILURE, EXIT_INSTALLED, EXIT_UNCHANGED};
