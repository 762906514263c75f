//! Scripted identity service

use async_trait::async_trait;
use cairn_stack::{CallerIdentity, IdentityError, IdentityService, UserIdentity};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// [`IdentityService`] returning fixed answers and counting lookups
#[derive(Debug, Clone)]
pub struct ScriptedIdentity {
    user: Result<UserIdentity, IdentityError>,
    caller: Result<CallerIdentity, IdentityError>,
    user_lookups: Arc<AtomicUsize>,
    caller_lookups: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl ScriptedIdentity {
    fn scripted(
        user: Result<UserIdentity, IdentityError>,
        caller: Result<CallerIdentity, IdentityError>,
    ) -> Self {
        Self {
            user,
            caller,
            user_lookups: Arc::new(AtomicUsize::new(0)),
            caller_lookups: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    /// Plain user; own-user lookup succeeds
    pub fn with_user(user_name: &str) -> Self {
        Self::scripted(
            Ok(UserIdentity::new(user_name)),
            Ok(CallerIdentity::with_user_id(format!("AIDAEXAMPLE:{user_name}"))),
        )
    }

    /// Delegated principal; only the caller-identity lookup succeeds
    pub fn assumed_role(user_id: &str) -> Self {
        Self::scripted(
            Err(IdentityError::NotSupported(
                "must be called with user credentials".to_string(),
            )),
            Ok(CallerIdentity::with_user_id(user_id)),
        )
    }

    /// Caller identity without a user id
    pub fn anonymous_caller() -> Self {
        Self::scripted(
            Err(IdentityError::NotSupported("no user".to_string())),
            Ok(CallerIdentity::default()),
        )
    }

    /// Both lookups fail
    pub fn unavailable() -> Self {
        Self::scripted(
            Err(IdentityError::Unavailable("offline".to_string())),
            Err(IdentityError::Unavailable("offline".to_string())),
        )
    }

    /// Sleep for `delay` before answering the own-user lookup
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn user_lookups(&self) -> usize {
        self.user_lookups.load(Ordering::SeqCst)
    }

    pub fn caller_lookups(&self) -> usize {
        self.caller_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityService for ScriptedIdentity {
    async fn current_user(&self) -> Result<UserIdentity, IdentityError> {
        self.user_lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.user.clone()
    }

    async fn caller_identity(&self) -> Result<CallerIdentity, IdentityError> {
        self.caller_lookups.fetch_add(1, Ordering::SeqCst);
        self.caller.clone()
    }
}
