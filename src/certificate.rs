//! X.509 certificate wrapper.
//!
//! [`Certificate`] pairs an OpenSSL `X509` with the DER bytes it was built
//! from, so its [`Fingerprint`] is computed once and never fails afterwards.

use std::fmt;
use std::net::IpAddr;

use openssl::asn1::Asn1Time;
use openssl::nid::Nid;
use openssl::x509::{X509Ref, X509};

use crate::error::{Result, TrustError};
use crate::fingerprint::Fingerprint;

const PEM_MARKER: &[u8] = b"-----BEGIN";

#[derive(Clone)]
pub struct Certificate {
    x509: X509,
    der: Vec<u8>,
    fingerprint: Fingerprint,
}

impl Certificate {
    pub fn from_x509(x509: X509) -> Result<Self> {
        let der = x509.to_der()?;
        let fingerprint = Fingerprint::of_der(&der);
        Ok(Self {
            x509,
            der,
            fingerprint,
        })
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        Self::from_x509(X509::from_der(der)?)
    }

    /// Parse the first certificate of a PEM document.
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        Self::from_x509(X509::from_pem(pem)?)
    }

    /// Parse every certificate in `bytes`.
    ///
    /// PEM input may hold a bundle; anything without a PEM header is read as a
    /// single DER certificate.
    pub fn parse_bundle(bytes: &[u8]) -> Result<Vec<Self>> {
        if contains(bytes, PEM_MARKER) {
            X509::stack_from_pem(bytes)?
                .into_iter()
                .map(Self::from_x509)
                .collect()
        } else {
            Ok(vec![Self::from_der(bytes)?])
        }
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn x509(&self) -> &X509Ref {
        &self.x509
    }

    pub fn to_pem(&self) -> Result<Vec<u8>> {
        Ok(self.x509.to_pem()?)
    }

    /// Subject common name, if present and valid UTF-8.
    pub fn common_name(&self) -> Option<String> {
        self.x509
            .subject_name()
            .entries_by_nid(Nid::COMMONNAME)
            .next()
            .and_then(|entry| std::str::from_utf8(entry.data().as_slice()).ok())
            .map(str::to_string)
    }

    /// Whole days from now until `notAfter`, rounded down.
    pub fn days_until_expiry(&self) -> Result<i32> {
        let now = Asn1Time::days_from_now(0)?;
        let diff = now.diff(self.x509.not_after())?;
        if diff.secs < 0 {
            Ok(diff.days - 1)
        } else {
            Ok(diff.days)
        }
    }

    /// Names this certificate claims to be valid for.
    ///
    /// DNS subject-alt-names take precedence; the subject CN is used only when
    /// the certificate carries none.
    pub fn hostname_claims(&self) -> Vec<String> {
        let dns: Vec<String> = self
            .x509
            .subject_alt_names()
            .map(|sans| {
                sans.iter()
                    .filter_map(|name| name.dnsname().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        if !dns.is_empty() {
            return dns;
        }
        self.common_name().into_iter().collect()
    }

    /// Check that the certificate is valid for `host`.
    pub fn verify_hostname(&self, host: &str) -> Result<()> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            let wanted = match ip {
                IpAddr::V4(v4) => v4.octets().to_vec(),
                IpAddr::V6(v6) => v6.octets().to_vec(),
            };
            let ips: Vec<Vec<u8>> = self
                .x509
                .subject_alt_names()
                .map(|sans| {
                    sans.iter()
                        .filter_map(|name| name.ipaddress().map(<[u8]>::to_vec))
                        .collect()
                })
                .unwrap_or_default();
            if ips.iter().any(|candidate| *candidate == wanted) {
                return Ok(());
            }
            return Err(TrustError::HostnameMismatch {
                gun: host.to_string(),
                names: ips.iter().filter_map(|raw| format_ip(raw)).collect(),
            });
        }

        let names = self.hostname_claims();
        if names.iter().any(|pattern| matches_hostname(pattern, host)) {
            Ok(())
        } else {
            Err(TrustError::HostnameMismatch {
                gun: host.to_string(),
                names,
            })
        }
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("common_name", &self.common_name())
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn format_ip(raw: &[u8]) -> Option<String> {
    match raw.len() {
        4 => <[u8; 4]>::try_from(raw).ok().map(|b| IpAddr::from(b).to_string()),
        16 => <[u8; 16]>::try_from(raw)
            .ok()
            .map(|b| IpAddr::from(b).to_string()),
        _ => None,
    }
}

/// Case-insensitive host comparison with single-label leftmost wildcards.
fn matches_hostname(pattern: &str, host: &str) -> bool {
    let pattern = pattern.trim_end_matches('.').to_ascii_lowercase();
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    if pattern.is_empty() || host.is_empty() {
        return false;
    }
    match pattern.strip_prefix("*.") {
        Some(suffix) => match host.split_once('.') {
            Some((label, rest)) => !label.is_empty() && rest == suffix,
            None => false,
        },
        None => pattern == host,
    }
}
