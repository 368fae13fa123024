//! Peer certificate verification for self-signed fly nodes.
//!
//! Nodes have no CA, so the usual web PKI checks can't apply. Instead the
//! leaf certificate is identified by its SHA-256 fingerprint and accepted
//! according to a [`TrustPolicy`]. Handshake signatures are still checked
//! against the presented certificate, so a peer must hold the private key.

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, DigitallySignedStruct, SignatureScheme};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use fly_core::Fingerprint;

/// How the dialer decides whether to trust a peer's certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustPolicy {
    /// Accept only a certificate with this fingerprint
    Pinned(Fingerprint),
    /// Accept any certificate and remember what was seen
    TrustOnFirstUse,
    /// Accept any certificate
    Insecure,
}

impl fmt::Display for TrustPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pinned(fp) => write!(f, "pinned({fp})"),
            Self::TrustOnFirstUse => f.write_str("trust-on-first-use"),
            Self::Insecure => f.write_str("insecure"),
        }
    }
}

/// rustls verifier applying a [`TrustPolicy`] and recording the peer fingerprint.
#[derive(Debug)]
pub struct PeerVerifier {
    policy: TrustPolicy,
    provider: Arc<CryptoProvider>,
    observed: Mutex<Option<Fingerprint>>,
}

impl PeerVerifier {
    /// Create a verifier using the given provider's signature algorithms.
    pub const fn new(policy: TrustPolicy, provider: Arc<CryptoProvider>) -> Self {
        Self {
            policy,
            provider,
            observed: Mutex::new(None),
        }
    }

    /// Fingerprint of the last certificate presented, accepted or not.
    pub fn observed(&self) -> Option<Fingerprint> {
        self.observed.lock().map_or(None, |guard| *guard)
    }

    /// Decide on a presented leaf fingerprint.
    fn check(&self, presented: Fingerprint) -> Result<(), CertificateError> {
        match self.policy {
            TrustPolicy::Pinned(expected) if expected == presented => {
                debug!(fingerprint = %presented, "peer matches pinned fingerprint");
                Ok(())
            }
            TrustPolicy::Pinned(expected) => {
                warn!(
                    expected = %expected,
                    presented = %presented,
                    "peer certificate does not match pinned fingerprint"
                );
                Err(CertificateError::ApplicationVerificationFailure)
            }
            TrustPolicy::TrustOnFirstUse => {
                debug!(fingerprint = %presented, "accepting unknown peer on first use");
                Ok(())
            }
            TrustPolicy::Insecure => {
                warn!(fingerprint = %presented, "accepting peer certificate without verification");
                Ok(())
            }
        }
    }
}

impl ServerCertVerifier for PeerVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let presented = Fingerprint::of_der(end_entity.as_ref());
        if let Ok(mut slot) = self.observed.lock() {
            *slot = Some(presented);
        }

        self.check(presented)
            .map(|()| ServerCertVerified::assertion())
            .map_err(rustls::Error::InvalidCertificate)
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
