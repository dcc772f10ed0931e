use std::io::Write;

use anyhow::{Context, Result};

use crate::commands::format_certificate;
use crate::private_key_storage::PrivateKeyStorage;
use crate::trust_store::TrustStore;

/// Handle `keys list`
///
/// Prints every trusted certificate, then every signing key found in the key
/// namespace as `<gun> <fingerprint>`.
pub fn handle_list<W: Write>(
    out: &mut W,
    store: &TrustStore,
    keys: &PrivateKeyStorage,
) -> Result<()> {
    writeln!(out, "# Trusted Root keys: ")?;
    for cert in store.certificates() {
        let line = format_certificate(cert)
            .with_context(|| format!("Failed to describe certificate {}", cert.fingerprint()))?;
        writeln!(out, "{}", line)?;
    }

    writeln!(out)?;
    writeln!(out, "# Signing keys: ")?;
    for entry in keys.list_keys() {
        writeln!(out, "{} {}", entry.gun, entry.fingerprint)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_signing_cert::SigningCertBuilder;

    #[test]
    fn test_list_prints_certificates_then_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TrustStore::open(dir.path().join("trusted")).unwrap();
        let keys = PrivateKeyStorage::new(dir.path().join("private")).unwrap();

        let (key, cert) = SigningCertBuilder::new("example.com/foo").build().unwrap();
        store.add(&cert).unwrap();
        keys.store_key("example.com/foo", cert.fingerprint(), &key).unwrap();

        let mut out = Vec::new();
        handle_list(&mut out, &store, &keys).unwrap();
        let out = String::from_utf8(out).unwrap();

        let expected_cert = format!("example.com/foo {} (expires in: ", cert.fingerprint());
        let expected_key = format!("example.com/foo {}\n", cert.fingerprint());
        let certs_at = out.find("# Trusted Root keys:").unwrap();
        let cert_at = out.find(&expected_cert).unwrap();
        let keys_at = out.find("# Signing keys:").unwrap();
        let key_at = out.find(&expected_key).unwrap();
        assert!(certs_at < cert_at && cert_at < keys_at && keys_at < key_at, "{}", out);
    }

    #[test]
    fn test_list_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrustStore::open(dir.path().join("trusted")).unwrap();
        let keys = PrivateKeyStorage::new(dir.path().join("private")).unwrap();

        let mut out = Vec::new();
        handle_list(&mut out, &store, &keys).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "# Trusted Root keys: \n\n# Signing keys: \n"
        );
    }
}
