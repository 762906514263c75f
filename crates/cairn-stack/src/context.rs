//! Collaborators shared by the stacks of one deployment run

use crate::identity::IdentityService;
use crate::provider::Provisioner;
use cairn_core::DeploymentConfig;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Configuration, identity and provider handles injected into every stack
#[derive(Clone)]
pub struct StackContext {
    config: Arc<dyn DeploymentConfig>,
    identity: Arc<dyn IdentityService>,
    provisioner: Arc<dyn Provisioner>,
}

impl StackContext {
    /// Create new context
    #[inline]
    #[must_use]
    pub fn new(
        config: Arc<dyn DeploymentConfig>,
        identity: Arc<dyn IdentityService>,
        provisioner: Arc<dyn Provisioner>,
    ) -> Self {
        Self {
            config,
            identity,
            provisioner,
        }
    }

    /// Get configuration collaborator
    #[inline]
    #[must_use]
    pub fn config(&self) -> &Arc<dyn DeploymentConfig> {
        &self.config
    }

    /// Get identity collaborator
    #[inline]
    #[must_use]
    pub fn identity(&self) -> &Arc<dyn IdentityService> {
        &self.identity
    }

    /// Get provider
    #[inline]
    #[must_use]
    pub fn provisioner(&self) -> &Arc<dyn Provisioner> {
        &self.provisioner
    }
}

impl Debug for StackContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackContext")
            .field("config", &self.config)
            .field("provisioner", &self.provisioner)
            .finish_non_exhaustive()
    }
}
