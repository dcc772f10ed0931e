use std::io::Write;

use anyhow::{Context, Result};

use crate::commands::format_certificate;
use crate::fingerprint::Fingerprint;
use crate::trust_store::TrustStore;

/// Handle `keys remove <fingerprint>`
///
/// The fingerprint must match a trusted certificate exactly.
pub fn handle_remove<W: Write>(
    out: &mut W,
    store: &mut TrustStore,
    fingerprint: &Fingerprint,
) -> Result<()> {
    let cert = store
        .get_by_fingerprint(fingerprint)
        .context("certificate not found in any store")?
        .clone();

    writeln!(out, "Removing: {}", format_certificate(&cert)?)?;
    store
        .remove(&cert)
        .context("Failed to remove certificate from trust store")?;
    Ok(())
}
