//! One complete run: resolve the source, select, extract, install, restart.

use sandcert_cert::{extract_certificate_text, select_newest_pair, Reporter};
use sandcert_core::{AppConfig, InstallOutcome, Result, Source};
use sandcert_lxd::Stager;
use std::path::Path;
use tracing::{info, warn};

use crate::installer::{install, Destination};
use crate::restart::RestartCommand;

/// Everything a run needs, resolved from configuration
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub source: Source,
    pub destination: Destination,
    pub restart: RestartCommand,
}

impl RunOptions {
    /// Resolve run options from a loaded configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            source: config.source.resolve()?,
            destination: Destination::from(&config.destination),
            restart: RestartCommand::from(&config.restart),
        })
    }
}

/// Install the newest sandcats certificate from `options.source`.
///
/// A staged copy of a remote source is removed before returning, on success
/// and on every error.
pub fn run(
    options: &RunOptions,
    stager: &dyn Stager,
    reporter: &dyn Reporter,
) -> Result<InstallOutcome> {
    match &options.source {
        Source::Local(dir) => install_from(dir, options, reporter),
        Source::Lxd(locator) => {
            let staged = stager.stage(locator)?;
            let result = install_from(staged.path(), options, reporter);

            if let Err(e) = staged.close() {
                warn!("Failed to remove staging directory: {}", e);
            }

            result
        }
    }
}

fn install_from(
    source_dir: &Path,
    options: &RunOptions,
    reporter: &dyn Reporter,
) -> Result<InstallOutcome> {
    info!("Looking for certificates in {}", source_dir.display());

    let pair = select_newest_pair(source_dir, reporter)?;
    let cert_text = extract_certificate_text(&pair.json_cert)?;

    let outcome = install(&options.destination, &cert_text, &pair.private_key)?;

    if outcome == InstallOutcome::Installed {
        options.restart.run()?;
    }

    Ok(outcome)
}
