use std::io::Write;

use anyhow::{Context, Result};
use tracing::warn;

use crate::fingerprint::Fingerprint;
use crate::generate_signing_cert::SigningCertBuilder;
use crate::private_key_storage::PrivateKeyStorage;
use crate::trust_store::TrustStore;

/// Organization recorded in every generated signing certificate.
pub const SIGNING_ORGANIZATION: &str = "Trust Keys Signing";

/// Handle `keys generate <gun>`
///
/// Creates a new key pair for `gun`, stores the private key in the key
/// namespace and trusts the certificate.
pub fn handle_generate<W: Write>(
    out: &mut W,
    store: &mut TrustStore,
    keys: &PrivateKeyStorage,
    gun: &str,
) -> Result<Fingerprint> {
    let (private_key, cert) = SigningCertBuilder::new(gun)
        .organization(SIGNING_ORGANIZATION)
        .build()
        .context("could not generate key")?;
    let fingerprint = cert.fingerprint().clone();

    keys.store_key(gun, &fingerprint, &private_key)
        .context("Failed to store private key")?;
    // Key and certificate are kept together or not at all.
    if let Err(err) = store.add(&cert) {
        if let Err(cleanup) = keys.remove_key(gun, &fingerprint) {
            warn!(gun = %gun, fingerprint = %fingerprint, error = %cleanup, "orphaned private key left behind");
        }
        return Err(err).context("Failed to add generated certificate to trust store");
    }

    writeln!(out, "Generated new keypair with ID: {}", fingerprint)?;
    Ok(fingerprint)
}
