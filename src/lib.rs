//! trust-keys - Local Trust Store for GUN Signing Keys
//!
//! Manages the certificate authorities an operator trusts and the signing keys
//! generated for Global Unique Names (GUNs), hierarchical identifiers such as
//! `docker.io/library/ubuntu`.
//!
//! # Overview
//!
//! ```text
//! keys trust <gun> <location> ──► trust::trust_certificate ──► TrustStore::add
//! keys generate <gun> ─────────► SigningCertBuilder ─┬─────► TrustStore::add
//!                                                    └─────► PrivateKeyStorage::store_key
//! keys remove <fingerprint> ───► TrustStore::remove
//! keys list ───────────────────► TrustStore::certificates + key_namespace::scan
//! ```
//!
//! # Storage Layout
//!
//! ```text
//! trust_dir/
//!   <fingerprint>.crt                      PEM, one trusted certificate each
//! private_dir/
//!   docker.io/library/ubuntu/
//!     <fingerprint>.key                    PKCS#8 PEM, mode 0600
//! ```
//!
//! Certificates are identified by [`fingerprint::Fingerprint`]: the hex SHA-256
//! of their DER encoding. Subject names are never used as keys.
//!
//! # Example
//!
//! ```no_run
//! use trust_keys::generate_signing_cert::SigningCertBuilder;
//! use trust_keys::private_key_storage::PrivateKeyStorage;
//! use trust_keys::trust_store::TrustStore;
//!
//! fn main() -> trust_keys::error::Result<()> {
//!     let mut store = TrustStore::open("data/trusted_certificates")?;
//!     let keys = PrivateKeyStorage::new("data/private")?;
//!
//!     let (private_key, cert) = SigningCertBuilder::new("docker.io/library/ubuntu")
//!         .organization("ACME Corp")
//!         .build()?;
//!     keys.store_key("docker.io/library/ubuntu", cert.fingerprint(), &private_key)?;
//!     store.add(&cert)?;
//!
//!     for entry in keys.list_keys() {
//!         println!("{} {}", entry.gun, entry.fingerprint);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! Library APIs return [`error::TrustError`]. The command handlers in
//! [`commands`] wrap it in `anyhow::Error` with operator-facing context.

pub mod certificate;
pub mod cli;
pub mod commands;
pub mod configs;
pub mod error;
pub mod fingerprint;
pub mod generate_signing_cert;
pub mod key_namespace;
pub mod private_key_storage;
pub mod source;
pub mod trust;
pub mod trust_store;
