//! Command-line interface.
//!
//! Parses arguments, loads configuration, constructs the stores and hands
//! them to the `keys` command handlers.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::commands::{generate, list, remove, trust};
use crate::configs::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH};
use crate::fingerprint::Fingerprint;
use crate::private_key_storage::PrivateKeyStorage;
use crate::trust::HttpFetcher;
use crate::trust_store::TrustStore;

#[derive(Parser, Debug)]
#[command(
    name = "trust-keys",
    version,
    about = "Manage trusted certificate authorities and GUN signing keys"
)]
pub struct Cli {
    /// Config file path (toml)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Operations on signature keys and trusted certificate authorities
    Keys(KeysArgs),
}

#[derive(Args, Debug)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub action: Option<KeysAction>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum KeysAction {
    /// List trusted certificate authorities and signing keys (default)
    List,
    /// Trust a new certificate for a specific GUN
    Trust {
        /// Global Unique Name the certificate must be valid for
        gun: String,
        /// URL or local file holding the certificate
        location: String,
    },
    /// Remove trust from a certificate authority
    Remove {
        /// SHA-256 fingerprint of the certificate
        fingerprint: Fingerprint,
    },
    /// Generate a new signing key for a specific GUN
    Generate {
        /// Global Unique Name
        gun: String,
    },
}

/// Run the CLI with already-parsed arguments.
pub fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(&cli.config)?;
    init_tracing(&config.logging);
    debug!(config = %cli.config.display(), "configuration loaded");

    let Command::Keys(keys_args) = cli.command;
    let action = keys_args.action.unwrap_or(KeysAction::List);

    let mut store = TrustStore::open(&config.storage.trust_dir).with_context(|| {
        format!(
            "Failed to open trust store at {}",
            config.storage.trust_dir.display()
        )
    })?;
    let keys = PrivateKeyStorage::new(&config.storage.private_dir).with_context(|| {
        format!(
            "Failed to open private key directory {}",
            config.storage.private_dir.display()
        )
    })?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match action {
        KeysAction::List => list::handle_list(&mut out, &store, &keys),
        KeysAction::Trust { gun, location } => {
            let fetcher = HttpFetcher::new(config.fetch.timeout())?;
            trust::handle_trust(&mut out, &mut store, &fetcher, &gun, &location).map(|_| ())
        }
        KeysAction::Remove { fingerprint } => {
            remove::handle_remove(&mut out, &mut store, &fingerprint)
        }
        KeysAction::Generate { gun } => {
            generate::handle_generate(&mut out, &mut store, &keys, &gun).map(|_| ())
        }
    }
}

/// Logs go to stderr; stdout carries command output only. `RUST_LOG`
/// overrides the configured level.
fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}
