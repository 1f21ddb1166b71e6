//! Organization handle
//!
//! Resolves once, at connection time, whether the organization has a motions
//! extension installed and builds a coordinator for it if so.

use tracing::info;

use motions_core::{Address, MotionsConfig};

use crate::coordinator::MotionLifecycleCoordinator;
use crate::error::{GovernanceError, GovernanceResult};
use crate::interfaces::Collaborators;

/// A connected organization
pub struct Organization {
    config: MotionsConfig,
    collaborators: Collaborators,
    motions: Option<MotionLifecycleCoordinator>,
}

impl Organization {
    /// Connect to the organization named by `config`
    ///
    /// A missing motions extension leaves [`Organization::motions`] empty. An
    /// extension installed at another version than the configured one fails.
    pub async fn connect(config: MotionsConfig, collaborators: Collaborators) -> GovernanceResult<Self> {
        config.validate()?;

        let colony = config.network.colony_address.clone();
        let executor = collaborators.executor.clone();
        let installed = executor.installed_extension(&colony, &config.extension.name).await?;

        let motions = match installed {
            None => {
                info!("No {} extension installed in {}", config.extension.name, colony);
                None
            }
            Some(extension) => {
                let supported = config.extension.supported_version;
                if extension.version != supported {
                    return Err(GovernanceError::UnsupportedExtension {
                        installed: extension.version,
                        supported,
                    });
                }

                let fractions = executor.stake_fractions(&extension.address).await?;
                info!("Connected to {} v{} at {}", config.extension.name, extension.version, extension.address);
                Some(MotionLifecycleCoordinator::new(
                    colony,
                    config.network.token_address.clone(),
                    extension.address,
                    fractions,
                    collaborators.clone(),
                ))
            }
        };

        Ok(Self { config, collaborators, motions })
    }

    pub fn address(&self) -> &Address {
        &self.config.network.colony_address
    }

    pub fn token_address(&self) -> &Address {
        &self.config.network.token_address
    }

    pub fn config(&self) -> &MotionsConfig {
        &self.config
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// The motions coordinator, if the extension is installed
    pub fn motions(&self) -> Option<&MotionLifecycleCoordinator> {
        self.motions.as_ref()
    }
}
