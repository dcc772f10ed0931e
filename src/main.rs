//! trust-keys - local trust store for certificate authorities and GUN
//! signing keys.
//!
//! ```bash
//! trust-keys keys                                  # list
//! trust-keys keys trust docker.io/library/ubuntu https://example.com/root.crt
//! trust-keys keys trust docker.io/library/ubuntu ./root.crt
//! trust-keys keys remove <fingerprint>
//! trust-keys keys generate docker.io/library/ubuntu
//! ```

use anyhow::Result;
use clap::Parser;
use trust_keys::cli::{self, Cli};

fn main() -> Result<()> {
    cli::run(Cli::parse())
}
