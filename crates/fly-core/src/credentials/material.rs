//! In-memory certificate material: RSA key, serial, validity, self-signed cert.

use rcgen::{CertificateParams, DistinguishedName, KeyPair, SerialNumber, PKCS_RSA_SHA256};
use ring::rand::{SecureRandom, SystemRandom};
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::pkcs8::EncodePrivateKey;
use rsa::RsaPrivateKey;
use time::OffsetDateTime;
use tracing::debug;
use zeroize::Zeroizing;

use crate::{FlyError, Result};

/// Default RSA modulus size.
pub const DEFAULT_KEY_BITS: usize = 4096;

/// Smallest RSA modulus the certificate signer accepts.
pub const MIN_KEY_BITS: usize = 2048;

/// Serial numbers are 128 random bits.
pub const SERIAL_LEN: usize = 16;

/// A freshly generated self-signed identity, PEM-encoded.
///
/// Dropping it wipes the private key PEM.
pub struct CertificateMaterial {
    /// Serial number, big-endian
    pub serial: [u8; SERIAL_LEN],
    /// Start of validity
    pub not_before: OffsetDateTime,
    /// End of validity
    pub not_after: OffsetDateTime,
    /// `CERTIFICATE` PEM block
    pub certificate_pem: String,
    /// `RSA PRIVATE KEY` (PKCS#1) PEM block
    pub private_key_pem: Zeroizing<String>,
}

impl std::fmt::Debug for CertificateMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateMaterial")
            .field("serial", &hex::encode(self.serial))
            .field("not_before", &self.not_before)
            .field("not_after", &self.not_after)
            .finish_non_exhaustive()
    }
}

/// Generate a self-signed certificate with an RSA key of `key_bits`.
pub fn generate(key_bits: usize) -> Result<CertificateMaterial> {
    if key_bits < MIN_KEY_BITS {
        return Err(FlyError::KeyGeneration(format!(
            "{key_bits}-bit RSA keys are not supported, use at least {MIN_KEY_BITS}"
        )));
    }

    let serial = random_serial()?;

    debug!(bits = key_bits, "generating RSA key pair");
    let private_key = RsaPrivateKey::new(&mut rand::rngs::OsRng, key_bits)
        .map_err(|e| FlyError::KeyGeneration(e.to_string()))?;
    let private_key_pem = private_key
        .to_pkcs1_pem(LineEnding::LF)
        .map_err(|e| FlyError::KeyGeneration(format!("PKCS#1 encoding: {e}")))?;
    let pkcs8_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| FlyError::KeyGeneration(format!("PKCS#8 encoding: {e}")))?;

    let key_pair = KeyPair::from_pem_and_sign_algo(&pkcs8_pem, &PKCS_RSA_SHA256)
        .map_err(|e| FlyError::CertificateBuild(format!("load signing key: {e}")))?;

    let not_before = OffsetDateTime::now_utc()
        .replace_nanosecond(0)
        .map_err(|e| FlyError::CertificateBuild(e.to_string()))?;
    let not_after = one_year_after(not_before);

    let mut params = CertificateParams::default();
    params.distinguished_name = DistinguishedName::new();
    params.serial_number = Some(SerialNumber::from(serial.to_vec()));
    params.not_before = not_before;
    params.not_after = not_after;

    let cert = params
        .self_signed(&key_pair)
        .map_err(|e| FlyError::CertificateBuild(e.to_string()))?;

    debug!(serial = %hex::encode(serial), "self-signed certificate built");

    Ok(CertificateMaterial {
        serial,
        not_before,
        not_after,
        certificate_pem: cert.pem(),
        private_key_pem,
    })
}

/// Draw a serial uniformly from `[0, 2^128)`.
fn random_serial() -> Result<[u8; SERIAL_LEN]> {
    let mut serial = [0u8; SERIAL_LEN];
    SystemRandom::new()
        .fill(&mut serial)
        .map_err(|_| FlyError::Randomness("system RNG failed to fill serial".into()))?;
    Ok(serial)
}

/// Same wall-clock instant one calendar year later.
///
/// Feb 29 has no counterpart, so it rolls over to Mar 1.
pub fn one_year_after(start: OffsetDateTime) -> OffsetDateTime {
    start
        .replace_year(start.year() + 1)
        .unwrap_or_else(|_| start + time::Duration::days(366))
}
