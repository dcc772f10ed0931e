use std::io::Write;

use anyhow::{Context, Result};

use crate::certificate::Certificate;
use crate::commands::format_certificate;
use crate::trust::{trust_certificate, CertificateFetcher};
use crate::trust_store::TrustStore;

/// Handle `keys trust <gun> <location>`
///
/// `location` is a URL (fetched, and required to match `gun`) or a local
/// certificate file.
pub fn handle_trust<W, F>(
    out: &mut W,
    store: &mut TrustStore,
    fetcher: &F,
    gun: &str,
    location: &str,
) -> Result<Vec<Certificate>>
where
    W: Write,
    F: CertificateFetcher + ?Sized,
{
    let added = trust_certificate(store, fetcher, gun, location)
        .with_context(|| format!("Failed to trust certificate from {} for {}", location, gun))?;
    for cert in &added {
        writeln!(out, "Adding: {}", format_certificate(cert)?)?;
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrustError;
    use crate::generate_signing_cert::SigningCertBuilder;
    use std::fs;
    use url::Url;

    struct NoNetwork;

    impl CertificateFetcher for NoNetwork {
        fn fetch(&self, url: &Url) -> crate::error::Result<Certificate> {
            Err(TrustError::Fetch {
                url: url.to_string(),
                reason: "offline".to_string(),
            })
        }
    }

    #[test]
    fn test_trust_local_file_reports_addition() {
        let dir = tempfile::tempdir().unwrap();
        let (_, cert) = SigningCertBuilder::new("ca.example.com").build().unwrap();
        let path = dir.path().join("ca.crt");
        fs::write(&path, cert.to_pem().unwrap()).unwrap();
        let mut store = TrustStore::open(dir.path().join("trusted")).unwrap();

        let mut out = Vec::new();
        let added = handle_trust(
            &mut out,
            &mut store,
            &NoNetwork,
            "example.com/foo",
            path.to_str().unwrap(),
        )
        .unwrap();

        assert_eq!(added.len(), 1);
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with(&format!("Adding: ca.example.com {}", cert.fingerprint())));
    }

    #[test]
    fn test_trust_invalid_source_keeps_cause() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TrustStore::open(dir.path()).unwrap();

        let mut out = Vec::new();
        let err = handle_trust(&mut out, &mut store, &NoNetwork, "example.com", "not-a-url-or-path")
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<TrustError>(),
            Some(TrustError::InvalidSource(_))
        ));
        assert!(out.is_empty());
    }
}
