//! Error types for stack nodes
//!
//! Provides error handling for:
//! - Scope preconditions (using a stack before activation)
//! - Parameter name validation
//! - Provider, identity and configuration collaborators
//! - Top-level stack registration

use cairn_core::{ConfigError, LifecycleError};

/// Main stack error type
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    /// Scope used before `initialize` created it
    #[error("stack '{stack}' has no scope yet; await activation before using it")]
    ScopeNotReady {
        /// Stack identity
        stack: String,
    },

    /// Nested stack initialized before its parent's scope exists
    #[error("parent of stack '{stack}' has no scope; activate the parent first")]
    ParentNotReady {
        /// Stack identity
        stack: String,
    },

    /// Scope created twice
    #[error("scope for stack '{stack}' was already created")]
    ScopeAlreadyCreated {
        /// Stack identity
        stack: String,
    },

    /// Parameter name cannot be mapped to a path
    #[error("invalid parameter name '{name}': {reason}")]
    InvalidParameterName {
        /// Name as given
        name: String,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Top-level stack registered twice
    #[error("top-level stack '{0}' is already registered")]
    DuplicateStack(String),

    /// Nested stack offered to the top-level registry
    #[error("stack '{0}' is nested and cannot be registered as top-level")]
    NotTopLevel(String),

    /// Both identity lookups failed
    #[error("identity resolution failed: {0}")]
    Identity(#[from] IdentityError),

    /// Provider rejected an operation
    #[error("provisioning failed: {0}")]
    Provision(#[from] ProvisionError),

    /// Configuration lookup failed
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Activation failed
    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),
}

impl StackError {
    /// Check if error is a caller contract violation (ordering or input)
    #[inline]
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::ScopeNotReady { .. }
                | Self::ParentNotReady { .. }
                | Self::InvalidParameterName { .. }
                | Self::NotTopLevel(_)
        )
    }

    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Identity(IdentityError::Unavailable(_)))
    }
}

/// Provider (provisioning SDK) errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvisionError {
    /// Construct id already used within the scope
    #[error("construct id '{id}' already exists in scope '{scope}'")]
    DuplicateId {
        /// Scope id
        scope: String,
        /// Conflicting construct id
        id: String,
    },

    /// Provider refused the operation
    #[error("provider rejected operation: {0}")]
    Rejected(String),
}

/// Identity service errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// Caller is not the kind of principal this lookup supports
    #[error("identity lookup not supported for this principal: {0}")]
    NotSupported(String),

    /// Identity service could not be reached
    #[error("identity service unavailable: {0}")]
    Unavailable(String),

    /// Credentials were rejected
    #[error("access denied: {0}")]
    AccessDenied(String),
}
