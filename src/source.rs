//! Classification of a trust candidate's location.

use std::path::PathBuf;

use url::Url;

/// Where a candidate certificate comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateSource {
    /// Parsed as a URL with a scheme; fetched and hostname-checked.
    Url(Url),
    /// An existing local path; loaded without hostname checks.
    LocalPath(PathBuf),
    /// Neither of the above.
    Invalid(String),
}

/// Resolve `location` once, in strict priority order: URL, then existing
/// local path, then invalid.
///
/// A string that parses as a URL is never reconsidered as a path, even if a
/// file by that name exists.
pub fn resolve_source(location: &str) -> CertificateSource {
    if let Ok(url) = Url::parse(location) {
        if !url.scheme().is_empty() {
            return CertificateSource::Url(url);
        }
    }
    let path = PathBuf::from(location);
    if !location.is_empty() && path.exists() {
        return CertificateSource::LocalPath(path);
    }
    CertificateSource::Invalid(location.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_url_with_scheme() {
        match resolve_source("https://notary.example.com/root.crt") {
            CertificateSource::Url(url) => {
                assert_eq!(url.scheme(), "https");
                assert_eq!(url.host_str(), Some("notary.example.com"));
            }
            other => panic!("expected URL, got {:?}", other),
        }
    }

    #[test]
    fn test_existing_file_is_local() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("root.crt");
        fs::write(&path, b"pem").unwrap();

        let location = path.to_str().unwrap();
        assert_eq!(resolve_source(location), CertificateSource::LocalPath(path.clone()));
    }

    #[test]
    fn test_url_wins_over_existing_path() {
        let dir = tempfile::tempdir().unwrap();
        let location = format!("file://{}", dir.path().display());
        assert!(matches!(resolve_source(&location), CertificateSource::Url(_)));
    }

    #[test]
    fn test_neither_url_nor_path() {
        assert_eq!(
            resolve_source("not-a-url-or-path"),
            CertificateSource::Invalid("not-a-url-or-path".to_string())
        );
        assert_eq!(resolve_source(""), CertificateSource::Invalid(String::new()));
    }
}
