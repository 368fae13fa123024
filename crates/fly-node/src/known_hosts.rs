//! Remembered peer fingerprints, stored as `known_hosts.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use fly_core::credentials::persist::{self, CERT_FILE_MODE};
use fly_core::{Fingerprint, FlyError, Result};

use crate::verifier::TrustPolicy;

/// File name inside the configuration directory.
pub const KNOWN_HOSTS_FILE_NAME: &str = "known_hosts.toml";

/// Map of host name to the certificate fingerprint it presented.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownHosts {
    #[serde(default)]
    hosts: BTreeMap<String, Fingerprint>,
}

impl KnownHosts {
    /// Load from `path`; a missing file is an empty set.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| FlyError::Config(format!("{}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| FlyError::Config(format!("{}: {e}", path.display())))
    }

    /// Write to `path` atomically, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(|e| FlyError::persistence(dir, e))?;

        let content = toml::to_string_pretty(self)
            .map_err(|e| FlyError::Config(format!("serialize known hosts: {e}")))?;
        persist::stage(dir, content.as_bytes(), CERT_FILE_MODE)?.commit(path)?;

        debug!(path = %path.display(), hosts = self.hosts.len(), "known hosts saved");
        Ok(())
    }

    /// Stored fingerprint for `host`.
    pub fn get(&self, host: &str) -> Option<Fingerprint> {
        self.hosts.get(&normalize(host)).copied()
    }

    /// Remember `fingerprint` for `host`, returning the previous entry.
    pub fn insert(&mut self, host: &str, fingerprint: Fingerprint) -> Option<Fingerprint> {
        self.hosts.insert(normalize(host), fingerprint)
    }

    /// Forget `host`.
    pub fn remove(&mut self, host: &str) -> Option<Fingerprint> {
        self.hosts.remove(&normalize(host))
    }

    /// Pinned if the host is known, otherwise trust on first use.
    pub fn policy_for(&self, host: &str) -> TrustPolicy {
        self.get(host)
            .map_or(TrustPolicy::TrustOnFirstUse, TrustPolicy::Pinned)
    }

    /// All entries, sorted by host.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Fingerprint)> {
        self.hosts.iter().map(|(h, fp)| (h.as_str(), fp))
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

/// Host names compare case-insensitively.
fn normalize(host: &str) -> String {
    host.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let hosts = KnownHosts::load(&dir.path().join(KNOWN_HOSTS_FILE_NAME)).unwrap();
        assert!(hosts.is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(KNOWN_HOSTS_FILE_NAME);

        let mut hosts = KnownHosts::default();
        assert_eq!(hosts.insert("Node-A.local", Fingerprint::of_der(b"a")), None);
        hosts.insert("10.0.0.2", Fingerprint::of_der(b"b"));
        hosts.save(&path).unwrap();

        let loaded = KnownHosts::load(&path).unwrap();
        assert_eq!(loaded, hosts);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("node-a.local"), Some(Fingerprint::of_der(b"a")));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains(&Fingerprint::of_der(b"b").to_string()));
    }

    #[test]
    fn test_policy_for() {
        let mut hosts = KnownHosts::default();
        assert_eq!(hosts.policy_for("peer"), TrustPolicy::TrustOnFirstUse);

        let fp = Fingerprint::of_der(b"peer");
        hosts.insert("peer", fp);
        assert_eq!(hosts.policy_for("PEER"), TrustPolicy::Pinned(fp));

        assert_eq!(hosts.remove("peer"), Some(fp));
        assert_eq!(hosts.policy_for("peer"), TrustPolicy::TrustOnFirstUse);
    }

    #[test]
    fn test_corrupt_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(KNOWN_HOSTS_FILE_NAME);
        std::fs::write(&path, "[hosts]\npeer = \"not-a-fingerprint\"\n").unwrap();

        let err = KnownHosts::load(&path).unwrap_err();
        assert!(matches!(err, FlyError::Config(_)));
    }
}
