//! SHA-256 certificate fingerprints via `ring::digest`.

use ring::digest::{digest, SHA256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::{FlyError, Result};

/// SHA-256 digest of a certificate's DER encoding.
///
/// Displayed as 64 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint raw DER bytes.
    #[must_use]
    pub fn of_der(der: &[u8]) -> Self {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(digest(&SHA256, der).as_ref());
        Self(bytes)
    }

    /// Fingerprint the first certificate in a PEM file.
    pub fn of_pem_file(path: &Path) -> Result<Self> {
        let origin = path.display().to_string();
        let content = std::fs::read(path).map_err(|e| FlyError::CertificateParse {
            origin: origin.clone(),
            reason: e.to_string(),
        })?;
        let der = crate::inspect::first_certificate_der(&content, &origin)?;
        Ok(Self::of_der(&der))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for Fingerprint {
    type Err = FlyError;

    /// Accepts `ab12..`, `AB:12:..` and `sha256:ab12..`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let body = trimmed
            .strip_prefix("sha256:")
            .or_else(|| trimmed.strip_prefix("SHA256:"))
            .unwrap_or(trimmed);
        let compact: String = body.chars().filter(|c| *c != ':').collect();

        let decoded = hex::decode(&compact)
            .map_err(|e| FlyError::Config(format!("invalid fingerprint {s:?}: {e}")))?;
        let bytes: [u8; 32] = decoded.try_into().map_err(|v: Vec<u8>| {
            FlyError::Config(format!(
                "invalid fingerprint {s:?}: expected 32 bytes, got {}",
                v.len()
            ))
        })?;

        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = FlyError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Fingerprint> for String {
    fn from(value: Fingerprint) -> Self {
        value.to_string()
    }
}
