//! Trust addition protocol.
//!
//! Decides how a candidate certificate is obtained and whether it may enter
//! the [`TrustStore`]:
//!
//! ```text
//! location ──resolve_source──┬─ Url       → fetch → verify hostname == GUN → add
//!                            ├─ LocalPath → load bundle → add each
//!                            └─ Invalid   → InvalidSource
//! ```
//!
//! Local files skip the hostname check: anything the operator can point at on
//! disk is taken as already vetted.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{info, warn};
use url::Url;

use crate::certificate::Certificate;
use crate::error::{Result, TrustError};
use crate::source::{resolve_source, CertificateSource};
use crate::trust_store::TrustStore;

/// Retrieves a certificate from a network location.
pub trait CertificateFetcher {
    fn fetch(&self, url: &Url) -> Result<Certificate>;
}

/// Fetches certificates over HTTP(S) with a bounded timeout.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TrustError::Fetch {
                url: String::new(),
                reason: format!("failed to build http client: {err}"),
            })?;
        Ok(Self { client })
    }
}

impl CertificateFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<Certificate> {
        let fetch_error = |reason: String| TrustError::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|err| fetch_error(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("unexpected status {status}")));
        }
        let body = response
            .bytes()
            .map_err(|err| fetch_error(err.to_string()))?;

        Certificate::parse_bundle(&body)?
            .into_iter()
            .next()
            .ok_or_else(|| fetch_error("response contained no certificate".to_string()))
    }
}

/// Admit the certificate(s) at `location` into `store` on behalf of `gun`.
///
/// Returns the certificates that were added. Nothing is added on error.
pub fn trust_certificate<F>(
    store: &mut TrustStore,
    fetcher: &F,
    gun: &str,
    location: &str,
) -> Result<Vec<Certificate>>
where
    F: CertificateFetcher + ?Sized,
{
    match resolve_source(location) {
        CertificateSource::Url(url) => {
            let cert = fetcher.fetch(&url)?;
            if let Err(err) = cert.verify_hostname(gun) {
                warn!(gun = %gun, url = %url, fingerprint = %cert.fingerprint(), "refusing certificate: {err}");
                return Err(err);
            }
            store.add(&cert)?;
            info!(gun = %gun, url = %url, fingerprint = %cert.fingerprint(), "trusted remote certificate");
            Ok(vec![cert])
        }
        CertificateSource::LocalPath(path) => {
            let certs = store.add_from_file(&path)?;
            info!(gun = %gun, path = %path.display(), count = certs.len(), "trusted local certificates");
            Ok(certs)
        }
        CertificateSource::Invalid(location) => Err(TrustError::InvalidSource(location)),
    }
}
