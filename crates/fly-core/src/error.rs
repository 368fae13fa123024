use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for fly operations
pub type Result<T> = std::result::Result<T, FlyError>;

/// Errors that can occur while bootstrapping credentials or talking to peers
#[derive(Error, Debug)]
pub enum FlyError {
    /// The secure random source could not produce bytes
    #[error("secure random source unavailable: {0}")]
    Randomness(String),

    /// RSA key generation or key encoding failed
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Certificate construction or signing failed
    #[error("certificate build failed: {0}")]
    CertificateBuild(String),

    /// Writing credential material to disk failed
    #[error("failed to persist {}: {source}", path.display())]
    Persistence {
        /// File or directory that could not be written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A PEM certificate or key could not be decoded
    #[error("invalid certificate material in {origin}: {reason}")]
    CertificateParse {
        /// Where the material came from (path or "memory")
        origin: String,
        /// Decoder error message
        reason: String,
    },

    /// Listener bind failure or outbound request failure
    #[error("network error: {0}")]
    Network(String),

    /// The peer presented a certificate that does not match the pinned fingerprint
    #[error("untrusted peer {host}: expected fingerprint {expected}")]
    UntrustedPeer {
        /// Host that was dialed
        host: String,
        /// Fingerprint the peer was expected to present
        expected: String,
    },

    /// Configuration is invalid or could not be loaded
    #[error("configuration error: {0}")]
    Config(String),

    /// A background task was cancelled before it finished
    #[error("{0} was cancelled")]
    Cancelled(String),
}

impl FlyError {
    /// Build a persistence error for `path`.
    pub fn persistence(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Returns true if the error happened while provisioning credentials
    #[must_use]
    pub const fn is_bootstrap(&self) -> bool {
        matches!(
            self,
            Self::Randomness(_)
                | Self::KeyGeneration(_)
                | Self::CertificateBuild(_)
                | Self::Persistence { .. }
        )
    }

    /// Returns true if retrying the same operation could succeed
    ///
    /// Nothing in fly retries on its own; callers embedding the crates can.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_message_names_path() {
        let err = FlyError::persistence(
            "/tmp/fly/key.pem",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/fly/key.pem"));
        assert!(msg.contains("denied"));
        assert!(err.is_bootstrap());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_classification() {
        assert!(FlyError::Network("connection refused".into()).is_retryable());
        assert!(!FlyError::Network("connection refused".into()).is_bootstrap());
        assert!(FlyError::Randomness("empty".into()).is_bootstrap());
        assert!(!FlyError::Config("bad".into()).is_bootstrap());
    }
}
