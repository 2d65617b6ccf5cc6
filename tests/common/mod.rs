//! Common test utilities and helpers for integration tests
#![allow(dead_code)]

use sandcert_core::{Result, Source};
use sandcert_install::{Destination, RestartCommand, RunOptions};
use sandcert_lxd::{StagedDir, Stager};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const LEAF: &str = "-----BEGIN CERTIFICATE-----\r\nLEAF\r\n-----END CERTIFICATE-----\r\n";
pub const INTERMEDIATE: &str = "-----BEGIN CERTIFICATE-----\r\nR3\r\n-----END CERTIFICATE-----\r\n";
pub const ROOT: &str = "-----BEGIN CERTIFICATE-----\r\nX1\r\n-----END CERTIFICATE-----\r\n";

/// Envelope JSON as written by the sandcats agent
pub fn envelope_json(cert: &str, ca: &[&str]) -> String {
    serde_json::json!({ "cert": cert, "ca": ca }).to_string()
}

/// A sandcats source directory and a reverse proxy destination directory
pub struct Fixture {
    temp: TempDir,
    pub source: PathBuf,
    pub dest: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let source = temp.path().join("sandcats");
        let dest = temp.path().join("ssl");
        fs::create_dir(&source).unwrap();
        fs::create_dir(&dest).unwrap();

        Self { temp, source, dest }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.source.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    /// Key, CSR and envelope for one issuance
    pub fn issue(&self, id: u64, cert: &str, ca: &[&str]) {
        self.write(&id.to_string(), &format!("KEY-{id}"));
        self.write(&format!("{id}.csr"), "CSR");
        self.write(&format!("{id}.response-json"), &envelope_json(cert, ca));
    }

    pub fn destination(&self) -> Destination {
        Destination::new(&self.dest, "sandstorm.pem", "sandstorm.key")
    }

    pub fn options(&self, source: Source, restart: RestartCommand) -> RunOptions {
        RunOptions {
            source,
            destination: self.destination(),
            restart,
        }
    }

    pub fn installed_cert(&self) -> Option<String> {
        fs::read_to_string(self.dest.join("sandstorm.pem")).ok()
    }

    pub fn installed_key(&self) -> Option<String> {
        fs::read_to_string(self.dest.join("sandstorm.key")).ok()
    }

    /// Restart command leaving a marker file behind, and the marker path
    pub fn marker_restart(&self) -> (RestartCommand, PathBuf) {
        let marker = self.root().join("restarted");
        let command = RestartCommand::Shell(format!("touch '{}'", marker.display()));
        (command, marker)
    }
}

/// Stager copying a local directory, the way `lxc file pull --recursive`
/// would, and remembering where it staged it
pub struct CopyStager {
    pub remote: PathBuf,
    pub staged_at: RefCell<Option<PathBuf>>,
}

impl CopyStager {
    pub fn new(remote: &Path) -> Self {
        Self {
            remote: remote.to_path_buf(),
            staged_at: RefCell::new(None),
        }
    }

    pub fn staged_path(&self) -> PathBuf {
        self.staged_at
            .borrow()
            .clone()
            .expect("stage() was never called")
    }
}

impl Stager for CopyStager {
    fn stage(&self, _locator: &str) -> Result<StagedDir> {
        let staged = StagedDir::new()?;
        let nested = staged.path().join("https");
        fs::create_dir(&nested).unwrap();

        for entry in fs::read_dir(&self.remote).unwrap() {
            let entry = entry.unwrap();
            fs::copy(entry.path(), nested.join(entry.file_name())).unwrap();
        }

        sandcert_lxd::flatten_single_subdir(staged.path())?;
        *self.staged_at.borrow_mut() = Some(staged.path().to_path_buf());

        Ok(staged)
    }
}
