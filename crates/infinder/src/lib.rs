//! Library half of the Infinder CLI
//!
//! Holds the resource sources the `fetch` command loads, so they can be
//! exercised from integration tests.

pub mod source;

pub use source::{Source, SourceFetcher};

/// Install the process-wide rustls crypto provider
///
/// Must run before any TLS client is built. Safe to call more than once.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}
