//! Certificate parsing for display and verification.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use x509_parser::public_key::PublicKey;

use crate::{Fingerprint, FlyError, Result};

/// Parsed view of a PEM certificate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateSummary {
    /// Serial number magnitude (hex, no leading zero bytes)
    pub serial: String,
    /// Subject distinguished name (empty for fly node certificates)
    pub subject: String,
    /// Issuer distinguished name
    pub issuer: String,
    /// Not valid before
    pub not_before: DateTime<Utc>,
    /// Not valid after
    pub not_after: DateTime<Utc>,
    /// SHA-256 fingerprint of the DER encoding
    pub fingerprint: Fingerprint,
    /// RSA modulus size, if the key is RSA
    pub key_bits: Option<usize>,
    /// Issuer equals subject and the signature verifies with the embedded key
    pub self_signed: bool,
    /// RSA modulus bytes (big-endian, no leading zero bytes)
    #[serde(skip)]
    pub rsa_modulus: Option<Vec<u8>>,
}

impl CertificateSummary {
    /// Serial number as big-endian bytes.
    #[must_use]
    pub fn serial_bytes(&self) -> Vec<u8> {
        hex::decode(&self.serial).unwrap_or_default()
    }
}

/// Summarize the first certificate in a PEM document.
pub fn summarize_pem(pem_text: &str) -> Result<CertificateSummary> {
    let der = first_certificate_der(pem_text.as_bytes(), "memory")?;
    summarize_der(&der, "memory")
}

/// Summarize the first certificate in a PEM file.
pub fn summarize_file(path: &Path) -> Result<CertificateSummary> {
    let origin = path.display().to_string();
    let content = std::fs::read(path).map_err(|e| FlyError::CertificateParse {
        origin: origin.clone(),
        reason: e.to_string(),
    })?;
    let der = first_certificate_der(&content, &origin)?;
    summarize_der(&der, &origin)
}

/// Extract the DER bytes of the first `CERTIFICATE` block.
pub(crate) fn first_certificate_der(content: &[u8], origin: &str) -> Result<Vec<u8>> {
    let blocks = pem::parse_many(content).map_err(|e| FlyError::CertificateParse {
        origin: origin.to_string(),
        reason: e.to_string(),
    })?;

    blocks
        .into_iter()
        .find(|p| p.tag() == "CERTIFICATE")
        .map(pem::Pem::into_contents)
        .ok_or_else(|| FlyError::CertificateParse {
            origin: origin.to_string(),
            reason: "no CERTIFICATE block found".into(),
        })
}

fn summarize_der(der: &[u8], origin: &str) -> Result<CertificateSummary> {
    let (_, cert) =
        x509_parser::parse_x509_certificate(der).map_err(|e| FlyError::CertificateParse {
            origin: origin.to_string(),
            reason: e.to_string(),
        })?;

    let subject = cert.subject().to_string();
    let issuer = cert.issuer().to_string();
    let self_signed = subject == issuer && cert.verify_signature(None).is_ok();

    let (key_bits, rsa_modulus) = match cert.public_key().parsed() {
        Ok(PublicKey::RSA(rsa)) => (
            Some(rsa.key_size()),
            Some(strip_leading_zeros(rsa.modulus).to_vec()),
        ),
        _ => (None, None),
    };

    Ok(CertificateSummary {
        serial: hex::encode(strip_leading_zeros(cert.raw_serial())),
        subject,
        issuer,
        not_before: asn1_to_utc(cert.validity().not_before),
        not_after: asn1_to_utc(cert.validity().not_after),
        fingerprint: Fingerprint::of_der(der),
        key_bits,
        self_signed,
        rsa_modulus,
    })
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// Convert an ASN.1 `GeneralizedTime` / `UTCTime` to `DateTime<Utc>`.
fn asn1_to_utc(t: x509_parser::time::ASN1Time) -> DateTime<Utc> {
    Utc.timestamp_opt(t.timestamp(), 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
