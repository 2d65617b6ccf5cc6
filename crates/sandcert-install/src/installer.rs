//! Installing the certificate and key where the reverse proxy reads them.

use sandcert_core::config::DestinationConfig;
use sandcert_core::{InstallOutcome, Result, SandcertError};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Destination directory and the two fixed file names inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub dir: PathBuf,
    pub cert_filename: String,
    pub key_filename: String,
}

impl From<&DestinationConfig> for Destination {
    fn from(config: &DestinationConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            cert_filename: config.cert_filename.clone(),
            key_filename: config.key_filename.clone(),
        }
    }
}

impl Destination {
    pub fn new(dir: impl Into<PathBuf>, cert_filename: &str, key_filename: &str) -> Self {
        Self {
            dir: dir.into(),
            cert_filename: cert_filename.to_string(),
            key_filename: key_filename.to_string(),
        }
    }

    pub fn cert_path(&self) -> PathBuf {
        self.dir.join(&self.cert_filename)
    }

    pub fn key_path(&self) -> PathBuf {
        self.dir.join(&self.key_filename)
    }

    /// Startup check. A missing directory is only worth a warning here, the
    /// write will fail later if it is still missing by then.
    pub fn check(&self) -> Option<SandcertError> {
        if self.dir.is_dir() {
            return None;
        }

        let err = SandcertError::DestinationUnavailable {
            path: self.dir.clone(),
        };
        warn!("{}", err);
        Some(err)
    }

    /// Returns true if the installed certificate equals `cert_text`, ignoring
    /// leading and trailing whitespace.
    pub fn is_current(&self, cert_text: &str) -> Result<bool> {
        let cert_path = self.cert_path();

        match fs::read(&cert_path) {
            Ok(installed) => Ok(String::from_utf8_lossy(&installed).trim() == cert_text.trim()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SandcertError::io(cert_path, e)),
        }
    }
}

/// Install `cert_text` and a verbatim copy of `private_key` unless the
/// destination already holds this certificate.
///
/// The key is read before anything is written, and each file is replaced
/// atomically, so the proxy never sees a half-written file.
pub fn install(
    destination: &Destination,
    cert_text: &str,
    private_key: &Path,
) -> Result<InstallOutcome> {
    let key = fs::read(private_key).map_err(|e| SandcertError::io(private_key, e))?;

    if !destination.dir.is_dir() {
        return Err(SandcertError::DestinationUnavailable {
            path: destination.dir.clone(),
        });
    }

    if destination.is_current(cert_text)? {
        info!(
            "Certificate unchanged, keeping {}",
            destination.cert_path().display()
        );
        return Ok(InstallOutcome::Unchanged);
    }

    info!("Certificates changed, installing new certificates");

    write_atomic(&destination.cert_path(), cert_text.as_bytes(), 0o644)?;
    write_atomic(&destination.key_path(), &key, 0o600)?;

    info!(
        "Installed {} and {}",
        destination.cert_path().display(),
        destination.key_path().display()
    );

    Ok(InstallOutcome::Installed)
}

/// Write through a temp file in the same directory, then rename over `path`.
///
/// An existing file keeps its permissions; a new one gets `new_mode` on unix.
fn write_atomic(path: &Path, contents: &[u8], new_mode: u32) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let io_err = |e: io::Error| SandcertError::io(path, e);

    let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
    file.write_all(contents).map_err(io_err)?;
    file.as_file().sync_all().map_err(io_err)?;

    match fs::metadata(path) {
        Ok(existing) => {
            fs::set_permissions(file.path(), existing.permissions()).map_err(io_err)?;
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => set_mode(file.path(), new_mode)?,
        Err(e) => return Err(io_err(e)),
    }

    file.persist(path).map_err(|e| io_err(e.error))?;
    debug!("Wrote {} bytes to {}", contents.len(), path.display());

    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| SandcertError::io(path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
