//! Handlers for the `keys` subcommands.
//!
//! Each handler receives the stores it operates on explicitly and writes its
//! report to `out`. Errors come back as `anyhow::Error` with operator-facing
//! context.

pub mod generate;
pub mod list;
pub mod remove;
pub mod trust;

use anyhow::Result;

use crate::certificate::Certificate;

/// One display line: `<CN> <fingerprint> (expires in: <days> days)`.
pub fn format_certificate(cert: &Certificate) -> Result<String> {
    Ok(format!(
        "{} {} (expires in: {} days)",
        cert.common_name().unwrap_or_default(),
        cert.fingerprint(),
        cert.days_until_expiry()?
    ))
}
