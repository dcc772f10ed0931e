//! Trust Store Module
//!
//! The authoritative set of trusted CA certificates. The store is a directory
//! of PEM files, one per certificate, named `<fingerprint>.crt`:
//!
//! ```text
//! trusted_certificates/
//!   3f1c...9a.crt
//!   b702...e4.crt
//! ```
//!
//! Every mutation is written through to disk before it is applied in memory,
//! so nothing survives only in process state. Certificates are always keyed by
//! the fingerprint of their own bytes; a file whose name disagrees with its
//! contents is still indexed by content.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::certificate::Certificate;
use crate::error::{Result, TrustError};
use crate::fingerprint::Fingerprint;

/// Extension used when persisting certificates.
pub const CERT_EXTENSION: &str = "crt";
const LOADABLE_EXTENSIONS: [&str; 2] = [CERT_EXTENSION, "pem"];

pub struct TrustStore {
    root: PathBuf,
    certificates: BTreeMap<Fingerprint, Certificate>,
}

impl TrustStore {
    /// Open the store rooted at `root`, creating the directory if needed and
    /// loading every certificate file it contains.
    ///
    /// Files that do not parse are logged and skipped.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| TrustError::storage(&root, e))?;

        let mut store = Self {
            root,
            certificates: BTreeMap::new(),
        };
        store.load()?;
        info!(
            root = %store.root.display(),
            count = store.certificates.len(),
            "opened trust store"
        );
        Ok(store)
    }

    fn load(&mut self) -> Result<()> {
        let entries = fs::read_dir(&self.root).map_err(|e| TrustError::storage(&self.root, e))?;
        for entry in entries {
            let path = entry.map_err(|e| TrustError::storage(&self.root, e))?.path();
            if !is_loadable(&path) {
                continue;
            }

            let bytes = fs::read(&path).map_err(|e| TrustError::storage(&path, e))?;
            match Certificate::parse_bundle(&bytes) {
                Ok(certs) => {
                    for cert in certs {
                        debug!(
                            path = %path.display(),
                            fingerprint = %cert.fingerprint(),
                            "loaded certificate"
                        );
                        self.certificates.insert(cert.fingerprint().clone(), cert);
                    }
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "skipping unreadable certificate file"
                    );
                }
            }
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn cert_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.root.join(format!("{}.{}", fingerprint, CERT_EXTENSION))
    }

    /// Trust `certificate`. Adding a certificate already present rewrites the
    /// same file and leaves a single entry.
    pub fn add(&mut self, certificate: &Certificate) -> Result<()> {
        let fingerprint = certificate.fingerprint();
        let path = self.cert_path(fingerprint);
        fs::write(&path, certificate.to_pem()?).map_err(|e| TrustError::storage(&path, e))?;

        let replaced = self
            .certificates
            .insert(fingerprint.clone(), certificate.clone())
            .is_some();
        let common_name = certificate.common_name().unwrap_or_default();
        info!(
            fingerprint = %fingerprint,
            common_name = %common_name,
            replaced,
            "trusted certificate"
        );
        Ok(())
    }

    /// Trust every certificate found in the file at `path`.
    ///
    /// The file may be a PEM bundle or a single DER certificate. Returns the
    /// certificates that were added.
    pub fn add_from_file(&mut self, path: &Path) -> Result<Vec<Certificate>> {
        let bytes = fs::read(path).map_err(|e| TrustError::storage(path, e))?;
        let certs = Certificate::parse_bundle(&bytes)?;
        if certs.is_empty() {
            return Err(TrustError::InvalidSource(format!(
                "{}: no certificates found",
                path.display()
            )));
        }
        for cert in &certs {
            self.add(cert)?;
        }
        Ok(certs)
    }

    /// Stop trusting `certificate`.
    ///
    /// # Errors
    /// [`TrustError::NotFound`] if its fingerprint is not in the store.
    pub fn remove(&mut self, certificate: &Certificate) -> Result<()> {
        let fingerprint = certificate.fingerprint();
        if !self.certificates.contains_key(fingerprint) {
            return Err(TrustError::NotFound {
                fingerprint: fingerprint.clone(),
            });
        }

        self.remove_files_holding(fingerprint)?;
        let path = self.cert_path(fingerprint);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(TrustError::storage(&path, e)),
        }

        self.certificates.remove(fingerprint);
        info!(fingerprint = %fingerprint, "removed trust");
        Ok(())
    }

    /// Drop `fingerprint` from every loadable file that holds it, including
    /// files under other names, so it does not come back on reopen.
    ///
    /// Other certificates sharing a bundle are persisted under their own
    /// names before any holding file is touched. A holding file that is
    /// already some sibling's own `<fp>.crt` is rewritten to hold just that
    /// sibling instead of being deleted.
    fn remove_files_holding(&self, fingerprint: &Fingerprint) -> Result<()> {
        let mut holders: Vec<(PathBuf, Vec<Certificate>)> = Vec::new();
        let entries = fs::read_dir(&self.root).map_err(|e| TrustError::storage(&self.root, e))?;
        for entry in entries {
            let path = entry.map_err(|e| TrustError::storage(&self.root, e))?.path();
            if !is_loadable(&path) {
                continue;
            }
            let Ok(bytes) = fs::read(&path) else {
                continue;
            };
            let Ok(certs) = Certificate::parse_bundle(&bytes) else {
                continue;
            };
            if certs.iter().any(|c| c.fingerprint() == fingerprint) {
                let siblings = certs
                    .into_iter()
                    .filter(|c| c.fingerprint() != fingerprint)
                    .collect();
                holders.push((path, siblings));
            }
        }

        let mut rewrites: BTreeMap<PathBuf, Certificate> = BTreeMap::new();
        for sibling in holders.iter().flat_map(|(_, siblings)| siblings) {
            let sibling_path = self.cert_path(sibling.fingerprint());
            if holders.iter().any(|(holder, _)| holder == &sibling_path) {
                rewrites.insert(sibling_path, sibling.clone());
            } else {
                fs::write(&sibling_path, sibling.to_pem()?)
                    .map_err(|e| TrustError::storage(&sibling_path, e))?;
            }
        }

        for (path, _) in &holders {
            let written = match rewrites.get(path) {
                Some(sibling) => fs::write(path, sibling.to_pem()?),
                None => fs::remove_file(path),
            };
            written.map_err(|e| TrustError::storage(path, e))?;
            debug!(path = %path.display(), fingerprint = %fingerprint, "dropped certificate from file");
        }
        Ok(())
    }

    /// Exact lookup by fingerprint.
    pub fn get_by_fingerprint(&self, fingerprint: &Fingerprint) -> Result<&Certificate> {
        self.certificates
            .get(fingerprint)
            .ok_or_else(|| TrustError::NotFound {
                fingerprint: fingerprint.clone(),
            })
    }

    /// All trusted certificates, in ascending fingerprint order.
    pub fn certificates(&self) -> impl Iterator<Item = &Certificate> {
        self.certificates.values()
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }
}

fn is_loadable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| LOADABLE_EXTENSIONS.contains(&ext))
        && path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_signing_cert::SigningCertBuilder;

    fn new_cert(gun: &str) -> Certificate {
        SigningCertBuilder::new(gun).build().unwrap().1
    }

    #[test]
    fn test_add_then_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TrustStore::open(dir.path()).unwrap();
        let cert = new_cert("example.com/foo");

        store.add(&cert).unwrap();

        let found = store.get_by_fingerprint(cert.fingerprint()).unwrap();
        assert_eq!(found, &cert);
        assert_eq!(found.fingerprint(), cert.fingerprint());
        assert!(dir
            .path()
            .join(format!("{}.crt", cert.fingerprint()))
            .is_file());
    }

    #[test]
    fn test_add_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TrustStore::open(dir.path()).unwrap();
        let cert = new_cert("example.com/foo");

        store.add(&cert).unwrap();
        store.add(&cert).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_remove_unknown_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TrustStore::open(dir.path()).unwrap();
        let cert = new_cert("example.com/foo");

        match store.remove(&cert) {
            Err(TrustError::NotFound { fingerprint }) => {
                assert_eq!(&fingerprint, cert.fingerprint())
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_add_then_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TrustStore::open(dir.path()).unwrap();
        let cert = new_cert("example.com/foo");

        store.add(&cert).unwrap();
        store.remove(&cert).unwrap();

        assert!(matches!(
            store.get_by_fingerprint(cert.fingerprint()),
            Err(TrustError::NotFound { .. })
        ));
        assert!(store.is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_reopen_loads_persisted_certificates() {
        let dir = tempfile::tempdir().unwrap();
        let a = new_cert("a.example.com");
        let b = new_cert("b.example.com");
        {
            let mut store = TrustStore::open(dir.path()).unwrap();
            store.add(&a).unwrap();
            store.add(&b).unwrap();
        }
        fs::write(dir.path().join("garbage.crt"), b"not a certificate").unwrap();
        fs::write(dir.path().join("ignored.txt"), b"ignored").unwrap();

        let store = TrustStore::open(dir.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get_by_fingerprint(a.fingerprint()).unwrap(), &a);
        assert_eq!(store.get_by_fingerprint(b.fingerprint()).unwrap(), &b);

        let listed: Vec<&Fingerprint> = store.certificates().map(|c| c.fingerprint()).collect();
        let mut sorted = listed.clone();
        sorted.sort();
        assert_eq!(listed, sorted);
    }

    #[test]
    fn test_loaded_certificates_keyed_by_content() {
        let dir = tempfile::tempdir().unwrap();
        let cert = new_cert("example.com");
        fs::write(dir.path().join("misnamed.pem"), cert.to_pem().unwrap()).unwrap();

        let mut store = TrustStore::open(dir.path()).unwrap();
        assert_eq!(store.get_by_fingerprint(cert.fingerprint()).unwrap(), &cert);

        store.remove(&cert).unwrap();
        assert!(!dir.path().join("misnamed.pem").exists());
        assert!(TrustStore::open(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_remove_from_bundle_keeps_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let a = new_cert("a.example.com");
        let b = new_cert("b.example.com");
        let mut bundle = a.to_pem().unwrap();
        bundle.extend_from_slice(&b.to_pem().unwrap());
        fs::write(dir.path().join("bundle.pem"), bundle).unwrap();

        let mut store = TrustStore::open(dir.path()).unwrap();
        assert_eq!(store.len(), 2);
        store.remove(&a).unwrap();

        let reopened = TrustStore::open(dir.path()).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get_by_fingerprint(b.fingerprint()).unwrap(), &b);
    }

    fn write_bundle(path: &Path, certs: &[&Certificate]) {
        let mut bundle = Vec::new();
        for cert in certs {
            bundle.extend_from_slice(&cert.to_pem().unwrap());
        }
        fs::write(path, bundle).unwrap();
    }

    #[test]
    fn test_remove_from_bundle_named_after_removed_certificate() {
        let dir = tempfile::tempdir().unwrap();
        let a = new_cert("a.example.com");
        let b = new_cert("b.example.com");
        write_bundle(&dir.path().join(format!("{}.crt", a.fingerprint())), &[&a, &b]);

        let mut store = TrustStore::open(dir.path()).unwrap();
        assert_eq!(store.len(), 2);
        store.remove(&a).unwrap();
        assert_eq!(store.len(), 1);

        let reopened = TrustStore::open(dir.path()).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get_by_fingerprint(b.fingerprint()).unwrap(), &b);
        assert!(!dir.path().join(format!("{}.crt", a.fingerprint())).exists());
    }

    #[test]
    fn test_remove_from_bundle_named_after_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let a = new_cert("a.example.com");
        let b = new_cert("b.example.com");
        let b_path = dir.path().join(format!("{}.crt", b.fingerprint()));
        write_bundle(&b_path, &[&a, &b]);

        let mut store = TrustStore::open(dir.path()).unwrap();
        store.remove(&a).unwrap();

        let reopened = TrustStore::open(dir.path()).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get_by_fingerprint(b.fingerprint()).unwrap(), &b);
        assert_eq!(
            Certificate::parse_bundle(&fs::read(&b_path).unwrap()).unwrap(),
            vec![b]
        );
    }

    #[test]
    fn test_add_from_file_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let a = new_cert("a.example.com");
        let b = new_cert("b.example.com");
        let bundle_path = dir.path().join("bundle.pem");
        let mut bundle = a.to_pem().unwrap();
        bundle.extend_from_slice(&b.to_pem().unwrap());
        fs::write(&bundle_path, bundle).unwrap();

        let mut store = TrustStore::open(dir.path().join("store")).unwrap();
        let added = store.add_from_file(&bundle_path).unwrap();

        assert_eq!(added, vec![a, b]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_get_requires_exact_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TrustStore::open(dir.path()).unwrap();
        let cert = new_cert("example.com");
        store.add(&cert).unwrap();

        let prefix = Fingerprint::new(&cert.fingerprint().as_str()[..8]);
        assert!(matches!(
            store.get_by_fingerprint(&prefix),
            Err(TrustError::NotFound { .. })
        ));
    }
}
