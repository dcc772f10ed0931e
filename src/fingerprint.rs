//! Certificate fingerprints.
//!
//! A fingerprint is the lowercase hex SHA-256 digest of a certificate's complete
//! DER encoding. It is the only identity the trust store uses: two certificates
//! may share a subject common name, but never a fingerprint unless their bytes
//! are identical.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 fingerprint.
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// Content-derived certificate identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an identifier recovered from storage, such as a file stem.
    pub fn new(id: impl Into<String>) -> Self {
        Fingerprint(id.into())
    }

    /// Fingerprint of a DER-encoded certificate.
    pub fn of_der(der: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(der);
        Fingerprint(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this looks like a full SHA-256 fingerprint.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == FINGERPRINT_HEX_LEN && self.0.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operator input: surrounding whitespace is dropped and hex digits are folded
/// to lowercase. The result is still matched exactly, never as a prefix.
impl FromStr for Fingerprint {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Fingerprint(s.trim().to_ascii_lowercase()))
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
