//! Atomic, permission-aware writes of credential files.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::{FlyError, Result};

/// Mode for the private key file.
pub const KEY_FILE_MODE: u32 = 0o600;

/// Mode for the certificate file.
pub const CERT_FILE_MODE: u32 = 0o644;

/// A file written next to its destination but not yet renamed into place.
pub struct StagedFile {
    temp: NamedTempFile,
}

/// Write `contents` to a temporary file in `dir` with the given Unix mode.
pub fn stage(dir: &Path, contents: &[u8], mode: u32) -> Result<StagedFile> {
    let mut temp = tempfile::Builder::new()
        .prefix(".fly-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| FlyError::persistence(dir, e))?;

    set_mode(temp.as_file(), mode).map_err(|e| FlyError::persistence(temp.path(), e))?;

    temp.write_all(contents)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| FlyError::persistence(temp.path(), e))?;

    Ok(StagedFile { temp })
}

impl StagedFile {
    /// Atomically rename the staged file to `dest`, replacing any file there.
    pub fn commit(self, dest: &Path) -> Result<()> {
        self.temp
            .persist(dest)
            .map_err(|e| FlyError::persistence(dest, e.error))?;
        Ok(())
    }
}

#[cfg(unix)]
fn set_mode(file: &File, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_file: &File, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

/// Flush directory metadata so completed renames survive a crash.
#[cfg(unix)]
pub fn sync_dir(dir: &Path) -> Result<()> {
    File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| FlyError::persistence(dir, e))
}

#[cfg(not(unix))]
pub fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_and_commit() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.pem");

        stage(dir.path(), b"hello", CERT_FILE_MODE)
            .unwrap()
            .commit(&dest)
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"hello");
        // Only the destination remains, no temp leftovers.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_dropped_stage_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        drop(stage(dir.path(), b"secret", KEY_FILE_MODE).unwrap());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_commit_keeps_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("key.pem");
        stage(dir.path(), b"secret", KEY_FILE_MODE)
            .unwrap()
            .commit(&dest)
            .unwrap();

        let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, KEY_FILE_MODE);
    }

    #[test]
    fn test_commit_onto_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("blocked");
        std::fs::create_dir(&dest).unwrap();

        let err = stage(dir.path(), b"x", CERT_FILE_MODE)
            .unwrap()
            .commit(&dest)
            .unwrap_err();
        assert!(matches!(err, FlyError::Persistence { .. }));
    }
}
