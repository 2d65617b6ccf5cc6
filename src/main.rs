//! sandcert - install Sandstorm's sandcats.io certificates into a reverse proxy
//!
//! Finds the newest certificate and private key issued by sandcats.io to a
//! Sandstorm server, writes them where the reverse proxy expects them and
//! restarts the proxy, but only when the certificate actually changed.
//!
//! # Usage
//!
//! ```bash
//! # Sandstorm on the same host
//! sandcert -o /opt/sandstorm/var/sandcats/https/box.sandcats.io
//!
//! # Sandstorm inside an LXD container
//! sandcert -x sandstorm/opt/sandstorm/var/sandcats/https
//!
//! # Restart handled by someone else
//! sandcert -o /opt/sandstorm/var/sandcats/https/box.sandcats.io -r None
//! ```
//!
//! Exit status is 0 when a new certificate was installed, 3 when the installed
//! one is already current and 1 on any error, so cron jobs can tell them apart.

use anyhow::{Context, Result};
use clap::Parser;
use sandcert_cert::TracingReporter;
use sandcert_core::config::{LogFormat, LoggingConfig, SourceConfig};
use sandcert_core::{AppConfig, InstallOutcome, Source, EXIT_FAILURE};
use sandcert_install::{run, Destination, RunOptions};
use sandcert_lxd::LxdClient;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Fetch Sandstorm's sandcats.io certificates and install them for a reverse proxy
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Origin directory in an LXD container, as container_name/path/to/directory
    #[arg(short = 'x', long)]
    lxd_certs_origin_dir: Option<String>,

    /// Origin directory holding the sandcats.io certificates and private keys
    #[arg(short = 'o', long)]
    certs_origin_dir: Option<PathBuf>,

    /// Where to copy the certificates [default: /etc/nginx/ssl]
    #[arg(short = 'd', long)]
    certs_dest_dir: Option<PathBuf>,

    /// File name (without directory) of the private key on the destination [default: sandstorm.key]
    #[arg(short = 'k', long)]
    key_filename: Option<String>,

    /// File name (without directory) of the certificate on the destination [default: sandstorm.pem]
    #[arg(short = 'c', long)]
    cert_filename: Option<String>,

    /// Command restarting the reverse proxy, "None" to handle it externally
    /// [default: sudo systemctl restart nginx]
    #[arg(short = 'r', long)]
    restart_command: Option<String>,

    /// YAML configuration file, overridden by SANDCERT__* variables and flags
    #[arg(long, env = "SANDCERT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Command line flags win over file and environment settings.
    fn apply(&self, config: &mut AppConfig) {
        // An origin flag replaces the configured origin; both flags still conflict
        if self.lxd_certs_origin_dir.is_some() || self.certs_origin_dir.is_some() {
            config.source = SourceConfig {
                local_dir: self.certs_origin_dir.clone(),
                lxd_dir: self.lxd_certs_origin_dir.clone(),
            };
        }
        if let Some(dir) = &self.certs_dest_dir {
            config.destination.dir = dir.clone();
        }
        if let Some(name) = &self.key_filename {
            config.destination.key_filename = name.clone();
        }
        if let Some(name) = &self.cert_filename {
            config.destination.cert_filename = name.clone();
        }
        if let Some(command) = &self.restart_command {
            config.restart.command = command.clone();
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            init_logging(&LoggingConfig::default(), args.verbose);
            error!("{:#}", e);
            return ExitCode::from(EXIT_FAILURE as u8);
        }
    };

    init_logging(&config.logging, args.verbose);
    debug!("sandcert v{}", env!("CARGO_PKG_VERSION"));

    match execute(&config) {
        Ok(outcome) => {
            if outcome == InstallOutcome::Unchanged {
                info!("Certificate unchanged, nothing to do");
            }
            ExitCode::from(outcome.exit_code() as u8)
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_FAILURE as u8)
        }
    }
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = AppConfig::from_config_builder(args.config.as_deref())
        .context("Failed to load configuration")?;
    args.apply(&mut config);

    Ok(config)
}

fn execute(config: &AppConfig) -> Result<InstallOutcome> {
    config.validate().context("Invalid options")?;

    // Only a warning: the directory may be mounted by the time we write
    Destination::from(&config.destination).check();

    let options = RunOptions::from_config(config)?;
    let lxd = LxdClient::new();

    if let Source::Lxd(_) = options.source {
        let version = lxd
            .version()
            .context("Failed to execute 'lxc'. Make sure the LXD client is installed and in your PATH")?;
        debug!("Found lxc: {}", version);
    }

    let outcome = run(&options, &lxd, &TracingReporter)
        .with_context(|| format!("Failed to install certificates from {}", options.source))?;

    Ok(outcome)
}

fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        logging
            .parse_level()
            .map(LevelFilter::from_level)
            .unwrap_or(LevelFilter::INFO)
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }
}
