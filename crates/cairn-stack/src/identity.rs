//! Acting-user resolution
//!
//! The own-user lookup fails for assumed roles and other delegated
//! principals. That failure is expected: [`resolve_user`] falls back to the
//! caller identity and derives a display name from its opaque user id.

use crate::error::IdentityError;
use async_trait::async_trait;

/// User name used when the caller identity carries no user id
pub const PLACEHOLDER_USER: &str = "usr";

/// Result of the own-user lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    /// User name
    pub user_name: String,
}

impl UserIdentity {
    /// Create user identity
    #[inline]
    #[must_use]
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
        }
    }
}

/// Result of the caller-identity lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerIdentity {
    /// Opaque user id, e.g. `AROAEXAMPLE:session-name`
    pub user_id: Option<String>,
    /// Account of the caller
    pub account: Option<String>,
    /// Principal ARN
    pub arn: Option<String>,
}

impl CallerIdentity {
    /// Caller identity with only a user id
    #[inline]
    #[must_use]
    pub fn with_user_id(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    /// Part of the user id before the first `:`, or [`PLACEHOLDER_USER`]
    #[must_use]
    pub fn display_name(&self) -> String {
        self.user_id
            .as_deref()
            .and_then(|id| id.split(':').next())
            .filter(|name| !name.is_empty())
            .unwrap_or(PLACEHOLDER_USER)
            .to_string()
    }
}

/// Identity collaborator
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Look up the caller's own user
    async fn current_user(&self) -> Result<UserIdentity, IdentityError>;

    /// Look up the caller identity (works for delegated principals too)
    async fn caller_identity(&self) -> Result<CallerIdentity, IdentityError>;
}

/// Resolve the acting user name
///
/// # Errors
/// Returns the caller-identity error when both lookups fail
pub async fn resolve_user(identity: &dyn IdentityService) -> Result<String, IdentityError> {
    match identity.current_user().await {
        Ok(user) => Ok(user.user_name),
        Err(err) => {
            tracing::debug!(error = %err, "Own user lookup failed, using caller identity");
            let caller = identity.caller_identity().await?;
            Ok(caller.display_name())
        }
    }
}
