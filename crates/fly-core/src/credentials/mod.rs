//! Node identity bootstrap.
//!
//! A node's identity is a self-signed RSA certificate plus its private key,
//! stored as `cert.pem` and `key.pem` in one directory. [`CredentialStore`]
//! reuses an existing pair or generates and persists a new one.

pub mod material;
pub mod persist;
mod store;

use std::path::PathBuf;

pub use material::{CertificateMaterial, DEFAULT_KEY_BITS, MIN_KEY_BITS};
pub use store::{CredentialStore, CERT_FILE_NAME, KEY_FILE_NAME};

use crate::Result;

/// Locations of a node's certificate and private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPaths {
    /// PEM certificate
    pub certificate: PathBuf,
    /// PEM private key
    pub private_key: PathBuf,
}

impl CredentialPaths {
    /// Both paths exist and are regular files.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.certificate.is_file() && self.private_key.is_file()
    }
}

/// Source of node credentials.
///
/// The server depends on this rather than on [`CredentialStore`] so tests
/// can supply pre-made files.
pub trait CredentialProvider: Send + Sync {
    /// Make sure credentials exist and return where they are.
    fn ensure(&self) -> Result<CredentialPaths>;

    /// Where credentials live, without creating them.
    fn paths(&self) -> CredentialPaths;
}

/// Fixed paths to credentials created elsewhere.
#[derive(Debug, Clone)]
pub struct StaticCredentials(pub CredentialPaths);

impl CredentialProvider for StaticCredentials {
    fn ensure(&self) -> Result<CredentialPaths> {
        Ok(self.0.clone())
    }

    fn paths(&self) -> CredentialPaths {
        self.0.clone()
    }
}
