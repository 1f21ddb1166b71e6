//! Core motions module
//!
//! This module provides the primitives shared by the motions crates,
//! including addresses, hashing, signing keys, configuration and time helpers.

pub mod common;
pub mod crypto;
pub mod config;
pub mod utils;

// Re-export key components
pub use common::{Address, Amount, Timestamp};
pub use crypto::{Hash, Signature, KeyPairWrapper, CryptoError, CryptoResult, sha256};
pub use config::{MotionsConfig, ConfigError, ConfigResult};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for motions clients
///
/// Filtering follows `RUST_LOG`, falling back to `default_level` when unset.
/// Fails if a global subscriber is already installed.
pub fn init_tracing(default_level: &str) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}
