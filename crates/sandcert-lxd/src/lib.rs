//! sandcert LXD integration
//!
//! Sandstorm often runs inside an LXD container while the reverse proxy runs
//! on the host. This crate pulls the sandcats certificate directory out of the
//! container into a temporary staging directory that is removed when dropped.

use sandcert_core::{Result, SandcertError};
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

pub mod staging;

pub use staging::{flatten_single_subdir, StagedDir};

/// Produces a local copy of a remote certificate directory
pub trait Stager {
    /// Copy the directory named by `locator` into a fresh staging directory.
    fn stage(&self, locator: &str) -> Result<StagedDir>;
}

/// A `container/path` locator split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LxdLocator<'a> {
    pub container: &'a str,
    pub path: &'a str,
}

/// Split `container_name/path/to/directory`.
pub fn parse_locator(locator: &str) -> Result<LxdLocator<'_>> {
    let invalid = |reason: &str| SandcertError::InvalidLocator {
        locator: locator.to_string(),
        reason: reason.to_string(),
    };

    let (container, path) = locator
        .split_once('/')
        .ok_or_else(|| invalid("expected container_name/path/to/directory"))?;

    if container.is_empty() {
        return Err(invalid("missing container name"));
    }
    if path.trim_matches('/').is_empty() {
        return Err(invalid("missing directory inside the container"));
    }

    Ok(LxdLocator { container, path })
}

/// LXD client wrapping the `lxc` command line tool
#[derive(Debug, Clone)]
pub struct LxdClient {
    /// lxc executable path (defaults to "lxc")
    pub lxc_path: String,
}

impl Default for LxdClient {
    fn default() -> Self {
        Self {
            lxc_path: "lxc".to_string(),
        }
    }
}

impl LxdClient {
    /// Create a new LXD client
    pub fn new() -> Self {
        Self::default()
    }

    /// Get lxc client version
    pub fn version(&self) -> Result<String> {
        let output = Command::new(&self.lxc_path)
            .arg("version")
            .output()
            .map_err(|e| SandcertError::remote_pull("version", e.to_string()))?;

        if !output.status.success() {
            return Err(SandcertError::remote_pull(
                "version",
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let version = String::from_utf8_lossy(&output.stdout);
        Ok(version
            .lines()
            .next()
            .unwrap_or("Unknown")
            .trim()
            .to_string())
    }

    /// Recursively pull a container directory into `local_dir`
    pub fn pull_recursive(&self, locator: &str, local_dir: &Path) -> Result<()> {
        parse_locator(locator)?;

        debug!("Pulling: {} -> {}", locator, local_dir.display());

        let output = Command::new(&self.lxc_path)
            .args(["file", "pull", "--recursive", locator])
            .arg(local_dir)
            .output()
            .map_err(|e| {
                SandcertError::remote_pull(locator, format!("failed to execute {}: {}", self.lxc_path, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SandcertError::remote_pull(
                locator,
                format!("{} ({})", stderr.trim(), output.status),
            ));
        }

        Ok(())
    }
}

impl Stager for LxdClient {
    fn stage(&self, locator: &str) -> Result<StagedDir> {
        let staged = StagedDir::new()?;

        info!("Pulling certificates from LXD container: {}", locator);
        self.pull_recursive(locator, staged.path())?;

        // `lxc file pull --recursive c/a/b dest` creates dest/b
        flatten_single_subdir(staged.path())?;

        Ok(staged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locator() {
        let locator = parse_locator("sandstorm/opt/sandstorm/var/sandcats/https").unwrap();
        assert_eq!(locator.container, "sandstorm");
        assert_eq!(locator.path, "opt/sandstorm/var/sandcats/https");
    }

    #[test]
    fn test_parse_locator_rejects_malformed() {
        for locator in ["sandstorm", "/opt/sandstorm", "sandstorm/", "sandstorm//", ""] {
            let err = parse_locator(locator).unwrap_err();
            assert!(
                matches!(err, SandcertError::InvalidLocator { .. }),
                "{locator:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_missing_lxc_binary() {
        let client = LxdClient {
            lxc_path: "/nonexistent/lxc".to_string(),
        };
        assert!(client.version().is_err());

        let err = client.stage("sandstorm/var/sandcats").unwrap_err();
        assert!(matches!(err, SandcertError::RemotePull { .. }));
    }

    #[test]
    fn test_stage_rejects_invalid_locator_before_running_lxc() {
        let client = LxdClient {
            lxc_path: "/nonexistent/lxc".to_string(),
        };
        let err = client.stage("no-path").unwrap_err();
        assert!(matches!(err, SandcertError::InvalidLocator { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_stage_with_scripted_lxc() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        let fixture = TempDir::new().unwrap();
        let remote = fixture.path().join("https");
        fs::create_dir(&remote).unwrap();
        fs::write(remote.join("5"), "KEY").unwrap();
        fs::write(remote.join("5.response-json"), r#"{"cert": "A"}"#).unwrap();

        // Stands in for `lxc file pull --recursive <locator> <dest>`
        let script = fixture.path().join("lxc");
        fs::write(
            &script,
            format!("#!/bin/sh\ncp -R \"{}\" \"$5\"\n", remote.display()),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let client = LxdClient {
            lxc_path: script.display().to_string(),
        };
        let staged = client.stage("sandstorm/var/sandcats/https").unwrap();
        let staged_path = staged.path().to_path_buf();

        assert!(staged_path.join("5").is_file());
        assert!(staged_path.join("5.response-json").is_file());
        assert!(!staged_path.join("https").exists());

        drop(staged);
        assert!(!staged_path.exists());

        let failing = fixture.path().join("lxc-fail");
        fs::write(&failing, "#!/bin/sh\necho 'Error: not found' >&2\nexit 1\n").unwrap();
        fs::set_permissions(&failing, fs::Permissions::from_mode(0o755)).unwrap();

        let client = LxdClient {
            lxc_path: failing.display().to_string(),
        };
        let err = client.stage("sandstorm/var/sandcats/https").unwrap_err();
        match err {
            SandcertError::RemotePull { reason, .. } => assert!(reason.contains("not found")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
