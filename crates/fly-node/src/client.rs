//! Dialing other fly nodes over HTTPS.

use serde::Serialize;
use std::net::Ipv6Addr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use fly_core::{Fingerprint, FlyError, Result};

use crate::config::DEFAULT_PORT;
use crate::tls;
use crate::verifier::{PeerVerifier, TrustPolicy};

/// Default whole-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("fly/", env!("CARGO_PKG_VERSION"));

/// What a peer answered.
#[derive(Debug, Clone, Serialize)]
pub struct DialResponse {
    /// URL that was requested
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Response headers in received order
    pub headers: Vec<(String, String)>,
    /// Full response body
    pub body: String,
    /// Fingerprint of the certificate the peer presented
    pub peer_fingerprint: Option<Fingerprint>,
}

/// HTTPS client for talking to fly nodes
#[derive(Debug, Clone)]
pub struct NodeClient {
    policy: TrustPolicy,
    port: u16,
    timeout: Duration,
}

impl NodeClient {
    /// Create a client with default port and timeout
    #[must_use]
    pub fn new(policy: TrustPolicy) -> Self {
        NodeClientBuilder::new(policy).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(policy: TrustPolicy) -> NodeClientBuilder {
        NodeClientBuilder::new(policy)
    }

    pub const fn policy(&self) -> TrustPolicy {
        self.policy
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    /// `GET https://{host}:{port}/` and read the whole body.
    pub async fn dial(&self, host: &str) -> Result<DialResponse> {
        self.get(host, "/").await
    }

    /// `GET` an arbitrary path on a peer.
    pub async fn get(&self, host: &str, path: &str) -> Result<DialResponse> {
        let url = node_url(host, self.port, path);
        let verifier = Arc::new(PeerVerifier::new(self.policy, tls::provider()));
        let http = self.http_client(Arc::clone(&verifier))?;

        debug!(url = %url, policy = %self.policy, "GET request");

        let response = http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.request_error(host, &url, &verifier, &e))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| FlyError::Network(format!("read body from {url}: {}", error_chain(&e))))?;

        let peer_fingerprint = verifier.observed();
        info!(
            url = %url,
            status = status.as_u16(),
            bytes = body.len(),
            fingerprint = ?peer_fingerprint.map(|fp| fp.to_string()),
            "peer answered"
        );

        Ok(DialResponse {
            url,
            status: status.as_u16(),
            headers,
            body,
            peer_fingerprint,
        })
    }

    /// One reqwest client per request so the verifier sees exactly one handshake.
    fn http_client(&self, verifier: Arc<PeerVerifier>) -> Result<reqwest::Client> {
        let mut tls = rustls::ClientConfig::builder_with_provider(tls::provider())
            .with_safe_default_protocol_versions()
            .map_err(|e| FlyError::Config(format!("TLS protocol versions: {e}")))?
            .dangerous()
            .with_custom_certificate_verifier(verifier)
            .with_no_client_auth();
        tls.alpn_protocols = vec![b"http/1.1".to_vec()];

        reqwest::Client::builder()
            .use_preconfigured_tls(tls)
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FlyError::Network(format!("build HTTP client: {e}")))
    }

    fn request_error(
        &self,
        host: &str,
        url: &str,
        verifier: &PeerVerifier,
        err: &reqwest::Error,
    ) -> FlyError {
        if let (TrustPolicy::Pinned(expected), Some(seen)) = (self.policy, verifier.observed()) {
            if seen != expected {
                return FlyError::UntrustedPeer {
                    host: host.to_string(),
                    expected: expected.to_string(),
                };
            }
        }
        FlyError::Network(format!("GET {url}: {}", error_chain(err)))
    }
}

/// Builder for configuring a [`NodeClient`]
#[derive(Debug)]
pub struct NodeClientBuilder {
    policy: TrustPolicy,
    port: u16,
    timeout: Duration,
}

impl NodeClientBuilder {
    #[must_use]
    pub fn new(policy: TrustPolicy) -> Self {
        Self {
            policy,
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the peer port
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn build(self) -> NodeClient {
        NodeClient {
            policy: self.policy,
            port: self.port,
            timeout: self.timeout,
        }
    }
}

/// `https://{host}:{port}{path}`, bracketing IPv6 literals.
pub fn node_url(host: &str, port: u16, path: &str) -> String {
    let host = host.trim();
    let authority = if host.parse::<Ipv6Addr>().is_ok() {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    };
    if path.starts_with('/') {
        format!("https://{authority}{path}")
    } else {
        format!("https://{authority}/{path}")
    }
}

/// Display an error and its sources, `outer: inner: root`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
