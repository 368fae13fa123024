//! Node configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use fly_core::{FlyError, Result, DEFAULT_KEY_BITS};

/// Port every fly node listens on and dials by default.
pub const DEFAULT_PORT: u16 = 8443;

/// File name of the optional configuration file.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Settings for a fly node, read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Listen address in server mode (default: 0.0.0.0:8443).
    pub listen: SocketAddr,

    /// Port used when dialing a peer.
    pub dial_port: u16,

    /// RSA modulus size for a newly generated identity.
    pub key_bits: usize,

    /// Whole-request timeout for outbound dials, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            dial_port: DEFAULT_PORT,
            key_bits: DEFAULT_KEY_BITS,
            request_timeout_secs: 30,
        }
    }
}

impl NodeConfig {
    /// Load config from a TOML file, falling back to defaults if it is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| FlyError::Config(format!("{}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| FlyError::Config(format!("{}: {e}", path.display())))
    }

    /// Outbound request timeout.
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
