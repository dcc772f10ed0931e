//! Private Key Storage Module
//!
//! Writes generated signing keys into the key namespace:
//! `<root>/<gun segments...>/<fingerprint>.key`. The file contents are an
//! unencrypted PKCS#8 PEM document; nothing else in the crate interprets them.
//!
//! # Security Features
//!
//! - **Restrictive file permissions**: 0600 (owner read/write only) on Unix
//! - **No path escape**: GUN segments `.` and `..` are refused

use std::fs;
use std::path::{Component, Path, PathBuf};

use openssl::pkey::{PKey, PKeyRef, Private};
use tracing::info;

use crate::error::{Result, TrustError};
use crate::fingerprint::Fingerprint;
use crate::key_namespace::{self, FsWalker, KeyEntry, KEY_EXTENSION};

/// Private key files arranged by GUN.
#[derive(Debug, Clone)]
pub struct PrivateKeyStorage {
    root: PathBuf,
}

impl PrivateKeyStorage {
    /// Open the key namespace rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| TrustError::storage(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the key file for `(gun, fingerprint)`.
    pub fn key_path(&self, gun: &str, fingerprint: &Fingerprint) -> Result<PathBuf> {
        let mut path = self.root.clone();
        for segment in gun.split('/').filter(|s| !s.is_empty()) {
            match Path::new(segment).components().next() {
                Some(Component::Normal(_)) => path.push(segment),
                _ => return Err(TrustError::InvalidGun),
            }
        }
        path.push(format!("{}.{}", fingerprint, KEY_EXTENSION));
        Ok(path)
    }

    /// Store a private key under its GUN and certificate fingerprint.
    ///
    /// An existing file for the same pair is replaced.
    pub fn store_key(
        &self,
        gun: &str,
        fingerprint: &Fingerprint,
        private_key: &PKeyRef<Private>,
    ) -> Result<PathBuf> {
        let path = self.key_path(gun, fingerprint)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| TrustError::storage(dir, e))?;
        }

        let pem = private_key.private_key_to_pem_pkcs8()?;

        // Remove existing file if it exists
        if path.exists() {
            fs::remove_file(&path).map_err(|e| TrustError::storage(&path, e))?;
        }
        fs::write(&path, pem).map_err(|e| TrustError::storage(&path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))
                .map_err(|e| TrustError::storage(&path, e))?;
        }

        info!(gun = %gun, fingerprint = %fingerprint, path = %path.display(), "stored private key");
        Ok(path)
    }

    /// Load the private key stored for `(gun, fingerprint)`.
    pub fn retrieve_key(&self, gun: &str, fingerprint: &Fingerprint) -> Result<PKey<Private>> {
        let path = self.key_path(gun, fingerprint)?;
        let pem = fs::read(&path).map_err(|e| TrustError::storage(&path, e))?;
        Ok(PKey::private_key_from_pem(&pem)?)
    }

    /// Delete the key file for `(gun, fingerprint)`. A missing file is not an error.
    pub fn remove_key(&self, gun: &str, fingerprint: &Fingerprint) -> Result<()> {
        let path = self.key_path(gun, fingerprint)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(gun = %gun, fingerprint = %fingerprint, "removed private key");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TrustError::storage(&path, e)),
        }
    }

    /// Every (GUN, fingerprint) pair currently in the namespace.
    pub fn list_keys(&self) -> impl Iterator<Item = KeyEntry> + '_ {
        key_namespace::scan(&FsWalker, &self.root)
    }
}
