//! Error types for trust store operations.

use std::io;
use std::path::PathBuf;
use std::time::SystemTimeError;

use openssl::error::ErrorStack;

use crate::fingerprint::Fingerprint;

/// Errors returned by the trust store core.
///
/// None of these are recovered from inside the crate. Command handlers attach
/// context and hand them to the operator.
#[derive(Debug, thiserror::Error)]
pub enum TrustError {
    #[error("certificate {fingerprint} not found")]
    NotFound { fingerprint: Fingerprint },
    #[error("certificate is valid for [{}], not {gun}", .names.join(", "))]
    HostnameMismatch { gun: String, names: Vec<String> },
    #[error("not a URL, not an existing file: {0}")]
    InvalidSource(String),
    #[error("secure random source unavailable: {0}")]
    Entropy(#[source] ErrorStack),
    #[error("storage {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("system clock is before the Unix epoch: {0}")]
    Clock(#[source] SystemTimeError),
    #[error("certificate: {0}")]
    Certificate(#[from] ErrorStack),
    #[error("fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("GUN must not be empty")]
    InvalidGun,
}

impl TrustError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TrustError::Storage {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TrustError>;
