//! rustls configuration shared by the listener and the dialer.

use rustls::crypto::CryptoProvider;
use rustls::pki_types::{
    CertificateDer, PrivateKeyDer, PrivatePkcs1KeyDer, PrivatePkcs8KeyDer, PrivateSec1KeyDer,
};
use std::path::Path;
use std::sync::Arc;

use fly_core::{CredentialPaths, FlyError, Result};

/// ALPN identifiers the listener offers, most preferred first.
pub const SERVER_ALPN: [&[u8]; 2] = [b"h2", b"http/1.1"];

/// The crypto provider used for every TLS session.
///
/// Always ring, passed explicitly so the process-wide default never matters.
pub fn provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Build the listener's TLS configuration from on-disk credentials.
pub fn server_config(paths: &CredentialPaths) -> Result<rustls::ServerConfig> {
    let certs = load_certificates(&paths.certificate)?;
    let key = load_private_key(&paths.private_key)?;

    let mut config = rustls::ServerConfig::builder_with_provider(provider())
        .with_safe_default_protocol_versions()
        .map_err(|e| FlyError::Config(format!("TLS protocol versions: {e}")))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| FlyError::CertificateParse {
            origin: paths.certificate.display().to_string(),
            reason: format!("unusable certificate/key pair: {e}"),
        })?;
    config.alpn_protocols = SERVER_ALPN.iter().map(|p| p.to_vec()).collect();

    Ok(config)
}

/// Every `CERTIFICATE` block in a PEM file, in order.
pub fn load_certificates(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let certs: Vec<_> = read_pem(path)?
        .into_iter()
        .filter(|p| p.tag() == "CERTIFICATE")
        .map(|p| CertificateDer::from(p.into_contents()))
        .collect();

    if certs.is_empty() {
        return Err(parse_error(path, "no CERTIFICATE block found"));
    }
    Ok(certs)
}

/// The first private key in a PEM file (PKCS#1, PKCS#8 or SEC1).
pub fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    read_pem(path)?
        .into_iter()
        .find_map(|p| match p.tag() {
            "RSA PRIVATE KEY" => Some(PrivateKeyDer::Pkcs1(PrivatePkcs1KeyDer::from(
                p.into_contents(),
            ))),
            "PRIVATE KEY" => Some(PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(
                p.into_contents(),
            ))),
            "EC PRIVATE KEY" => Some(PrivateKeyDer::Sec1(PrivateSec1KeyDer::from(
                p.into_contents(),
            ))),
            _ => None,
        })
        .ok_or_else(|| parse_error(path, "no private key block found"))
}

fn read_pem(path: &Path) -> Result<Vec<pem::Pem>> {
    let content = std::fs::read(path).map_err(|e| parse_error(path, e))?;
    pem::parse_many(content).map_err(|e| parse_error(path, e))
}

fn parse_error(path: &Path, reason: impl ToString) -> FlyError {
    FlyError::CertificateParse {
        origin: path.display().to_string(),
        reason: reason.to_string(),
    }
}
