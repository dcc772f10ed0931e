//! Signing Certificate Generation Module
//!
//! Generates a fresh key pair and a self-signed certificate bound to a GUN.
//! The certificate is a standalone signing identity, not a CA.
//!
//! # Certificate Properties
//! - **Self-signed**: Issuer and subject are the same
//! - **Subject**: CN = GUN, O = organization
//! - **Key Usage**: digitalSignature, keyEncipherment
//! - **Extended Key Usage**: codeSigning
//! - **Basic Constraints**: CA=false (critical)
//! - **Serial Number**: uniform random 128-bit value
//! - **Validity**: exactly 730 days from issuance
//! - **Key**: RSA 2048-bit, SHA-256 signature
//!
//! # Example
//! ```rust,no_run
//! use trust_keys::generate_signing_cert::SigningCertBuilder;
//! # fn example() -> trust_keys::error::Result<()> {
//! let (private_key, certificate) = SigningCertBuilder::new("docker.io/library/ubuntu")
//!     .organization("Example Corporation")
//!     .build()?;
//! println!("{}", certificate.fingerprint());
//! # Ok(())
//! # }
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::extension::{BasicConstraints, ExtendedKeyUsage, KeyUsage};
use openssl::x509::{X509Name, X509};
use tracing::debug;

use crate::certificate::Certificate;
use crate::error::{Result, TrustError};

const X509_VERSION_3: i32 = 2; // X509 version 3 is represented by 2
const RSA_KEY_SIZE: u32 = 2048;
const SERIAL_NUMBER_BITS: i32 = 128;

/// Validity window of every generated certificate (two 365-day years).
pub const VALIDITY_DAYS: i64 = 365 * 2;
const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Builder for a GUN signing key and its self-signed certificate.
///
/// The GUN's syntax is not checked. Only an empty GUN is refused.
pub struct SigningCertBuilder {
    gun: String,
    organization: String,
}

impl SigningCertBuilder {
    pub fn new(gun: impl Into<String>) -> Self {
        Self {
            gun: gun.into(),
            organization: String::new(),
        }
    }

    /// Set the organization (O) for the certificate
    pub fn organization(mut self, org: impl Into<String>) -> Self {
        self.organization = org.into();
        self
    }

    /// Build the key pair and self-signed certificate.
    ///
    /// # Errors
    /// - [`TrustError::InvalidGun`] if the GUN is empty
    /// - [`TrustError::Entropy`] if no serial number can be drawn from the
    ///   secure random source
    /// - [`TrustError::Certificate`] if key generation, encoding or signing fails
    pub fn build(self) -> Result<(PKey<Private>, Certificate)> {
        if self.gun.is_empty() {
            return Err(TrustError::InvalidGun);
        }

        let rsa = Rsa::generate(RSA_KEY_SIZE)?;
        let private_key = PKey::from_rsa(rsa)?;

        let mut builder = X509::builder()?;
        builder.set_version(X509_VERSION_3)?;

        let serial = random_serial()?;
        let serial_number = serial.to_asn1_integer()?;
        builder.set_serial_number(&serial_number)?;

        let mut name_builder = X509Name::builder()?;
        name_builder.append_entry_by_nid(Nid::COMMONNAME, &self.gun)?;
        if !self.organization.is_empty() {
            name_builder.append_entry_by_nid(Nid::ORGANIZATIONNAME, &self.organization)?;
        }
        let name = name_builder.build();
        builder.set_subject_name(&name)?;
        builder.set_issuer_name(&name)?;

        let not_before = unix_now()?;
        let not_after = not_before + VALIDITY_DAYS * SECONDS_PER_DAY;
        let not_before = Asn1Time::from_unix(not_before)?;
        let not_after = Asn1Time::from_unix(not_after)?;
        builder.set_not_before(&not_before)?;
        builder.set_not_after(&not_after)?;

        builder.set_pubkey(&private_key)?;

        builder.append_extension(BasicConstraints::new().critical().build()?)?;
        builder.append_extension(
            KeyUsage::new()
                .critical()
                .digital_signature()
                .key_encipherment()
                .build()?,
        )?;
        builder.append_extension(ExtendedKeyUsage::new().code_signing().build()?)?;

        builder.sign(&private_key, MessageDigest::sha256())?;
        let certificate = Certificate::from_x509(builder.build())?;

        debug!(
            gun = %self.gun,
            fingerprint = %certificate.fingerprint(),
            "generated signing certificate"
        );
        Ok((private_key, certificate))
    }
}

/// Draw a serial number uniformly from [0, 2^128).
///
/// Any failure of the random source is fatal; there is no fallback.
fn random_serial() -> Result<BigNum> {
    let mut serial = BigNum::new().map_err(TrustError::Entropy)?;
    serial
        .rand(SERIAL_NUMBER_BITS, MsbOption::MAYBE_ZERO, false)
        .map_err(TrustError::Entropy)?;
    Ok(serial)
}

fn unix_now() -> Result<i64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(TrustError::Clock)?;
    Ok(elapsed.as_secs() as i64)
}
