//! Reverse proxy restart command.

use sandcert_core::config::{RestartConfig, RESTART_DISABLED};
use sandcert_core::{Result, SandcertError};
use std::process::Command;
use tracing::{debug, info};

/// How to restart the reverse proxy after a new certificate is installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartCommand {
    /// Restart is handled externally
    Disabled,
    /// Shell command run through `sh -c`
    Shell(String),
}

impl RestartCommand {
    /// Parse a command string. `None` or an empty string disables restarting.
    pub fn parse(command: &str) -> Self {
        let command = command.trim();
        if command.is_empty() || command == RESTART_DISABLED {
            Self::Disabled
        } else {
            Self::Shell(command.to_string())
        }
    }

    /// Run the command, failing on spawn errors or a non-zero exit status.
    pub fn run(&self) -> Result<()> {
        let Self::Shell(command) = self else {
            debug!("Restart command disabled, skipping");
            return Ok(());
        };

        info!("Restarting reverse proxy: {}", command);

        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .map_err(|e| SandcertError::restart_failed(command.as_str(), e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SandcertError::restart_failed(
                command.as_str(),
                format!("{} ({})", stderr.trim(), output.status),
            ));
        }

        Ok(())
    }
}

impl From<&RestartConfig> for RestartCommand {
    fn from(config: &RestartConfig) -> Self {
        Self::parse(&config.command)
    }
}
