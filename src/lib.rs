//! Motions
//!
//! Reputation-weighted, stake-gated motions for organizational ledgers:
//! members stake on a motion, vote on it in secret, reveal their votes and
//! finalize it, executing its action when the supporting side prevails.

use std::path::Path;

use anyhow::Context;
use tracing::info;

/// Module version information
pub mod version {
    /// The current version of the motions library
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// Re-export shared primitives
pub mod core {
    pub use motions_core::*;
}

/// Re-export the motion lifecycle
pub mod governance {
    pub use motions_governance::*;
}

/// Commonly used types
pub mod prelude {
    pub use motions_core::{Address, Amount, KeyPairWrapper, MotionsConfig, Timestamp};
    pub use motions_core::config::EnvOverrides;
    pub use motions_governance::{
        Collaborators, GovernanceError, GovernanceResult, Motion, MotionId, MotionLifecycleCoordinator,
        MotionState, Organization, RemainingStakes, Vote,
    };
}

pub use motions_core::init_tracing;

/// Load a configuration file, apply `MOTIONS_` environment overrides and
/// connect to the organization it names
pub async fn connect_from_file<P: AsRef<Path>>(
    path: P,
    collaborators: motions_governance::Collaborators,
) -> anyhow::Result<motions_governance::Organization> {
    let path = path.as_ref();
    let base = motions_core::MotionsConfig::from_file(path).await
        .with_context(|| format!("Failed to load {}", path.display()))?;
    let config = motions_core::config::EnvOverrides::from_process().apply(base)
        .context("Failed to apply environment overrides")?;

    info!("Connecting to organization {} ({})", config.network.colony_address, config.environment);
    let organization = motions_governance::Organization::connect(config, collaborators).await
        .context("Failed to connect to organization")?;

    Ok(organization)
}
