//! The credential store: find or create the node's TLS identity.

use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::material::{self, DEFAULT_KEY_BITS};
use super::persist::{self, CERT_FILE_MODE, KEY_FILE_MODE};
use super::{CredentialPaths, CredentialProvider};
use crate::{FlyError, Result};

/// Certificate file name inside the configuration directory.
pub const CERT_FILE_NAME: &str = "cert.pem";

/// Private key file name inside the configuration directory.
pub const KEY_FILE_NAME: &str = "key.pem";

/// Owns the certificate/key pair stored in one directory.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    dir: PathBuf,
    key_bits: usize,
}

impl CredentialStore {
    /// Create a store rooted at `dir`. Nothing is touched until [`ensure`](Self::ensure).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            key_bits: DEFAULT_KEY_BITS,
        }
    }

    /// Set the RSA modulus size used when a new identity is generated.
    #[must_use]
    pub const fn with_key_bits(mut self, bits: usize) -> Self {
        self.key_bits = bits;
        self
    }

    /// Canonical certificate and key paths (may not exist yet).
    pub fn paths(&self) -> CredentialPaths {
        CredentialPaths {
            certificate: self.dir.join(CERT_FILE_NAME),
            private_key: self.dir.join(KEY_FILE_NAME),
        }
    }

    /// True if both files are present as regular files.
    ///
    /// Contents, expiry and key/cert agreement are not checked.
    pub fn is_provisioned(&self) -> bool {
        self.paths().exists()
    }

    /// Return the credential paths, generating a new identity if either file is missing.
    pub fn ensure(&self) -> Result<CredentialPaths> {
        let paths = self.paths();
        if paths.exists() {
            debug!(cert = %paths.certificate.display(), "reusing existing credentials");
            return Ok(paths);
        }

        std::fs::create_dir_all(&self.dir).map_err(|e| FlyError::persistence(&self.dir, e))?;
        let _lock = DirLock::acquire(&self.dir)?;

        // Another process may have finished while we waited for the lock.
        if paths.exists() {
            debug!(cert = %paths.certificate.display(), "credentials appeared while waiting for lock");
            return Ok(paths);
        }

        info!(
            dir = %self.dir.display(),
            bits = self.key_bits,
            "generating self-signed node certificate"
        );
        let material = material::generate(self.key_bits)?;

        let key = persist::stage(&self.dir, material.private_key_pem.as_bytes(), KEY_FILE_MODE)?;
        let cert = persist::stage(&self.dir, material.certificate_pem.as_bytes(), CERT_FILE_MODE)?;

        // Key first: a certificate on disk always has its key next to it.
        key.commit(&paths.private_key)?;
        cert.commit(&paths.certificate)?;
        persist::sync_dir(&self.dir)?;

        info!(
            cert = %paths.certificate.display(),
            key = %paths.private_key.display(),
            serial = %hex::encode(material.serial),
            "node certificate written"
        );

        Ok(paths)
    }
}

impl CredentialProvider for CredentialStore {
    fn ensure(&self) -> Result<CredentialPaths> {
        Self::ensure(self)
    }

    fn paths(&self) -> CredentialPaths {
        Self::paths(self)
    }
}

/// Exclusive advisory lock scoped to a directory, released on drop.
struct DirLock {
    file: File,
}

impl DirLock {
    #[cfg(unix)]
    fn acquire(dir: &Path) -> Result<Self> {
        let file = File::open(dir).map_err(|e| FlyError::persistence(dir, e))?;
        file.lock().map_err(|e| FlyError::persistence(dir, e))?;
        Ok(Self { file })
    }

    #[cfg(not(unix))]
    fn acquire(dir: &Path) -> Result<Self> {
        let path = dir.join(".lock");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| FlyError::persistence(&path, e))?;
        file.lock().map_err(|e| FlyError::persistence(&path, e))?;
        Ok(Self { file })
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
