//! TLS listener: answers every request with a greeting.

use axum::http::{Method, Uri};
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use percent_encoding::percent_decode_str;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use fly_core::{CredentialPaths, CredentialProvider, Fingerprint, FlyError, Result};

use crate::config::NodeConfig;
use crate::tls;

/// How long in-flight requests get to finish after shutdown is requested.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Make sure credentials exist, generating them off the async runtime.
pub async fn bootstrap(credentials: Arc<dyn CredentialProvider>) -> Result<CredentialPaths> {
    tokio::task::spawn_blocking(move || credentials.ensure())
        .await
        .unwrap_or_else(|e| match e.try_into_panic() {
            Ok(panic) => std::panic::resume_unwind(panic),
            Err(_) => Err(FlyError::Cancelled("credential bootstrap".into())),
        })
}

/// The catch-all router.
pub fn router() -> Router {
    Router::new().fallback(hello)
}

async fn hello(method: Method, uri: Uri) -> String {
    debug!(method = %method, path = %uri.path(), "request");
    greeting(uri.path())
}

/// `Hi from {path}`, with the path percent-decoded and the leading slash dropped.
pub fn greeting(path: &str) -> String {
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    format!("Hi from {}", decoded.strip_prefix('/').unwrap_or(&decoded))
}

/// A listener that is bound and serving.
pub struct RunningServer {
    local_addr: SocketAddr,
    fingerprint: Fingerprint,
    handle: Handle,
    task: JoinHandle<std::io::Result<()>>,
}

/// Bootstrap credentials, bind `config.listen` and start serving in the background.
pub async fn start(
    config: &NodeConfig,
    credentials: Arc<dyn CredentialProvider>,
) -> Result<RunningServer> {
    let paths = bootstrap(credentials).await?;
    let fingerprint = Fingerprint::of_pem_file(&paths.certificate)?;
    let tls_config = RustlsConfig::from_config(Arc::new(tls::server_config(&paths)?));

    let listen = config.listen;
    let handle = Handle::new();
    let server = axum_server::bind_rustls(listen, tls_config).handle(handle.clone());
    let task = tokio::spawn(async move { server.serve(router().into_make_service()).await });

    let Some(local_addr) = handle.listening().await else {
        let reason = match task.await {
            Ok(Err(e)) => e.to_string(),
            Ok(Ok(())) => "listener exited before binding".to_string(),
            Err(e) => e.to_string(),
        };
        return Err(FlyError::Network(format!("bind {listen}: {reason}")));
    };

    info!(
        addr = %local_addr,
        cert = %paths.certificate.display(),
        fingerprint = %fingerprint,
        "serving"
    );

    Ok(RunningServer {
        local_addr,
        fingerprint,
        handle,
        task,
    })
}

impl fmt::Debug for RunningServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunningServer")
            .field("local_addr", &self.local_addr)
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

impl RunningServer {
    /// Address actually bound (resolves port 0).
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Fingerprint of the certificate being served.
    pub const fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Stop accepting connections and let in-flight requests finish.
    pub fn shutdown(&self) {
        info!(addr = %self.local_addr, "shutting down");
        self.handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
    }

    /// Shut down gracefully once Ctrl-C is received.
    pub fn shutdown_on_ctrl_c(&self) {
        let handle = self.handle.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("interrupt received, shutting down");
                    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
                }
                Err(e) => warn!(error = %e, "cannot listen for Ctrl-C"),
            }
        });
    }

    /// Wait until the listener stops.
    pub async fn wait(self) -> Result<()> {
        self.task
            .await
            .map_err(|e| FlyError::Network(format!("server task failed: {e}")))?
            .map_err(|e| FlyError::Network(format!("serve {}: {e}", self.local_addr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fly_core::{CredentialStore, MIN_KEY_BITS};

    #[test]
    fn test_greeting() {
        assert_eq!(greeting("/abc"), "Hi from abc");
        assert_eq!(greeting("/"), "Hi from ");
        assert_eq!(greeting("/a/b/c"), "Hi from a/b/c");
    }

    #[test]
    fn test_greeting_decodes_path() {
        assert_eq!(greeting("/a%20b"), "Hi from a b");
        assert_eq!(greeting("/caf%C3%A9"), "Hi from café");
        assert_eq!(greeting("/100%"), "Hi from 100%");
    }

    struct PanickingCredentials;

    impl CredentialProvider for PanickingCredentials {
        fn ensure(&self) -> Result<CredentialPaths> {
            panic!("entropy source exploded");
        }

        fn paths(&self) -> CredentialPaths {
            CredentialPaths {
                certificate: "cert.pem".into(),
                private_key: "key.pem".into(),
            }
        }
    }

    #[tokio::test]
    #[should_panic(expected = "entropy source exploded")]
    async fn test_bootstrap_panic_is_not_reported_as_key_generation() {
        let _ = bootstrap(Arc::new(PanickingCredentials)).await;
    }

    fn local_config() -> NodeConfig {
        NodeConfig {
            listen: "127.0.0.1:0".parse().unwrap(),
            ..NodeConfig::default()
        }
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CredentialStore::new(dir.path()).with_key_bits(MIN_KEY_BITS));

        let server = start(&local_config(), store.clone()).await.unwrap();
        assert_ne!(server.local_addr().port(), 0);
        assert_eq!(
            server.fingerprint(),
            Fingerprint::of_pem_file(&store.paths().certificate).unwrap()
        );

        server.shutdown();
        server.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_port_in_use_is_network_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CredentialStore::new(dir.path()).with_key_bits(MIN_KEY_BITS));

        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let config = NodeConfig {
            listen: occupied.local_addr().unwrap(),
            ..NodeConfig::default()
        };

        let err = start(&config, store).await.unwrap_err();
        assert!(matches!(err, FlyError::Network(_)), "got {err:?}");
        assert!(err.to_string().contains("bind"));
    }

    #[tokio::test]
    async fn test_bootstrap_failure_stops_startup() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path()).with_key_bits(MIN_KEY_BITS);
        std::fs::create_dir(&store.paths().private_key).unwrap();

        let err = start(&local_config(), Arc::new(store)).await.unwrap_err();
        assert!(err.is_bootstrap(), "got {err:?}");
    }
}
