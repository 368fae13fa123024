//! Configuration directory resolution and loading.

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use fly_core::CredentialStore;
use fly_node::config::CONFIG_FILE_NAME;
use fly_node::known_hosts::KNOWN_HOSTS_FILE_NAME;
use fly_node::NodeConfig;

/// Where fly keeps its state, and what `config.toml` says.
#[derive(Debug, Clone)]
pub struct Config {
    /// Configuration directory
    pub dir: PathBuf,

    /// Node settings (defaults when `config.toml` is absent)
    pub node: NodeConfig,
}

impl Config {
    /// Per-user configuration directory for fly.
    pub fn default_dir() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "fly")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().to_path_buf())
    }

    /// Resolve the directory (explicit override first) and load `config.toml`.
    ///
    /// Nothing is created on disk.
    pub fn load(dir: Option<PathBuf>) -> Result<Self> {
        let dir = match dir {
            Some(dir) => dir,
            None => Self::default_dir()?,
        };
        Self::load_from(&dir)
    }

    /// Load `config.toml` from `dir`.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        let node = NodeConfig::load(&path)
            .with_context(|| format!("loading {}", path.display()))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            node,
        })
    }

    /// Credential store for this directory using the configured key size.
    pub fn credential_store(&self) -> CredentialStore {
        CredentialStore::new(&self.dir).with_key_bits(self.node.key_bits)
    }

    /// Path of the known hosts file.
    pub fn known_hosts_path(&self) -> PathBuf {
        self.dir.join(KNOWN_HOSTS_FILE_NAME)
    }
}
