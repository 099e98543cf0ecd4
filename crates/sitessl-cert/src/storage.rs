//! On-disk storage for private keys and certificate signing requests
//!
//! Each domain owns two files under the storage root: `<domain>.key` and
//! `<domain>.csr`. Every write stages both into uniquely named temporaries
//! and renames them into place only after both have been written, so a
//! failed write never leaves a half-written pair behind.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, warn};

use crate::csr::CsrError;

/// Fixed location the platform reads keys and CSRs from
pub const DEFAULT_KEY_DIR: &str = "/home/www-data";

/// Held while a staged pair is renamed into place.
///
/// Renames for one pair happen back to back, so concurrent writers for the
/// same domain in this process end with one writer's key next to that
/// writer's CSR.
static COMMIT_LOCK: Mutex<()> = Mutex::new(());

/// Directory holding PEM artifacts, one pair per domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStore {
    root: PathBuf,
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_DIR)
    }
}

impl KeyStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the private key for `domain`
    pub fn key_path(&self, domain: &str) -> PathBuf {
        self.root.join(format!("{}.key", domain))
    }

    /// Path of the CSR for `domain`
    pub fn csr_path(&self, domain: &str) -> PathBuf {
        self.root.join(format!("{}.csr", domain))
    }

    /// Write a key and CSR pair for `domain`, replacing any previous pair.
    ///
    /// Concurrent calls for the same domain all succeed and the last one to
    /// commit wins. Within one process the key and CSR on disk always come
    /// from the same call; writers in other processes are not coordinated.
    pub fn write_pair(
        &self,
        domain: &str,
        key_pem: &str,
        csr_pem: &str,
    ) -> Result<(PathBuf, PathBuf), CsrError> {
        self.write_pair_with(domain, key_pem, csr_pem, stage_file)
    }

    fn write_pair_with<F>(
        &self,
        domain: &str,
        key_pem: &str,
        csr_pem: &str,
        mut stage: F,
    ) -> Result<(PathBuf, PathBuf), CsrError>
    where
        F: FnMut(&Path, &Path, &[u8], u32) -> Result<NamedTempFile, CsrError>,
    {
        ensure_safe_file_stem(domain)?;

        let key_path = self.key_path(domain);
        let csr_path = self.csr_path(domain);

        // Dropping a staged file deletes it, so early returns clean up.
        let key_tmp = stage(&self.root, &key_path, key_pem.as_bytes(), 0o600)?;
        let csr_tmp = stage(&self.root, &csr_path, csr_pem.as_bytes(), 0o644)?;

        let _commit = COMMIT_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        key_tmp
            .persist(&key_path)
            .map_err(|e| CsrError::Storage {
                path: key_path.clone(),
                source: e.error,
            })?;

        if let Err(e) = csr_tmp.persist(&csr_path) {
            // The new key no longer matches whatever CSR is on disk.
            if std::fs::remove_file(&csr_path).is_ok() {
                warn!("Removed stale CSR for {} after failed replace", domain);
            }
            return Err(CsrError::Storage {
                path: csr_path,
                source: e.error,
            });
        }

        debug!(
            "Stored key and CSR for {} in {}",
            domain,
            self.root.display()
        );

        Ok((key_path, csr_path))
    }
}

/// Reject names that would escape the storage root.
///
/// Domains reach this point already validated, this is a second check at the
/// filesystem boundary.
pub fn ensure_safe_file_stem(domain: &str) -> Result<(), CsrError> {
    let unsafe_name = domain.is_empty()
        || domain == "."
        || domain.contains("..")
        || domain.contains('/')
        || domain.contains('\\')
        || domain.contains('\0');

    if unsafe_name {
        return Err(CsrError::UnsafePath(domain.to_string()));
    }

    Ok(())
}

/// Write `contents` to a fresh hidden temporary in `root` named after `target`
fn stage_file(
    root: &Path,
    target: &Path,
    contents: &[u8],
    mode: u32,
) -> Result<NamedTempFile, CsrError> {
    let prefix = format!(
        ".{}.",
        target
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default()
    );

    let mut file = Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(root)
        .map_err(|source| CsrError::Storage {
            path: root.to_path_buf(),
            source,
        })?;

    write_staged(&mut file, contents, mode).map_err(|source| CsrError::Storage {
        path: file.path().to_path_buf(),
        source,
    })?;

    Ok(file)
}

fn write_staged(file: &mut NamedTempFile, contents: &[u8], mode: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(std::fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    file.write_all(contents)?;
    file.as_file().sync_all()
}
