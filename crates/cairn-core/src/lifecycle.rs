//! Three-phase lifecycle for deployment objects
//!
//! Construction is synchronous and only sets identity fields. Readiness is
//! asynchronous: [`activate`] runs the phases of a [`Lifecycle`] implementor
//! in strict order and records the outcome in the object's readiness signal.
//!
//! # Protocol
//! 1. `pre_initialize` - hook before naming is finalized
//! 2. `initialize` - main construct creation
//! 3. `post_initialize` - tagging, output wiring, policies
//!
//! The first failing phase stops the sequence. The failure is logged with
//! the concrete type name and stored, so every later [`LifecycleObject::ready`]
//! call observes the same error.
//!
//! # Example
//!
//! ```rust,ignore
//! let bucket = Bucket::new("Assets", config);
//! activate(&bucket).await?;
//! bucket.object().ready().await?; // same outcome, any number of times
//! ```

use crate::config::{AccountProps, DeploymentConfig, Environment};
use crate::error::{BoxError, ConfigError, LifecycleError, Phase};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Resource type used when none is given
pub const DEFAULT_RESOURCE_TYPE: &str = "resource";

/// Snapshot of an object's readiness signal
#[derive(Debug, Clone)]
pub enum ReadyState {
    /// Phases not finished (or not started)
    Pending,
    /// All three phases succeeded
    Ready,
    /// A phase failed; permanent
    Failed(LifecycleError),
}

impl ReadyState {
    /// Check if still pending
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Check if ready
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    fn outcome(&self) -> Option<Result<(), LifecycleError>> {
        match self {
            Self::Pending => None,
            Self::Ready => Some(Ok(())),
            Self::Failed(err) => Some(Err(err.clone())),
        }
    }
}

/// Named identity plus readiness signal shared by every resource object
#[derive(Debug)]
pub struct LifecycleObject {
    name: String,
    resource_type: String,
    owner_type: &'static str,
    config: Arc<dyn DeploymentConfig>,
    started: AtomicBool,
    ready_tx: watch::Sender<ReadyState>,
}

impl LifecycleObject {
    /// Create the lifecycle part of an `Owner`
    ///
    /// A missing resource type falls back to [`DEFAULT_RESOURCE_TYPE`] with a
    /// warning naming `Owner`.
    #[must_use]
    pub fn new<Owner: ?Sized>(
        name: impl Into<String>,
        resource_type: Option<&str>,
        config: Arc<dyn DeploymentConfig>,
    ) -> Self {
        let owner_type = short_type_name::<Owner>();
        let resource_type = match resource_type {
            Some(resource_type) if !resource_type.is_empty() => resource_type.to_string(),
            _ => {
                tracing::warn!(
                    "Resource type not defined for {}, defaulting to '{}'",
                    owner_type,
                    DEFAULT_RESOURCE_TYPE
                );
                DEFAULT_RESOURCE_TYPE.to_string()
            }
        };
        let (ready_tx, _) = watch::channel(ReadyState::Pending);

        Self {
            name: name.into(),
            resource_type,
            owner_type,
            config,
            started: AtomicBool::new(false),
            ready_tx,
        }
    }

    /// Get name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get resource type
    #[inline]
    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Short type name of the owning object
    #[inline]
    #[must_use]
    pub fn owner_type(&self) -> &'static str {
        self.owner_type
    }

    /// Get configuration collaborator
    #[inline]
    #[must_use]
    pub fn config(&self) -> &Arc<dyn DeploymentConfig> {
        &self.config
    }

    /// Composite resource name: `{shared prefix}-{name}`
    #[must_use]
    pub fn get_identity(&self) -> String {
        format!("{}-{}", self.shared_resource_name(), self.name)
    }

    /// Shared prefix for this object's resource type
    #[inline]
    #[must_use]
    pub fn shared_resource_name(&self) -> String {
        Self::shared_resource_name_for(self.config.as_ref(), &self.resource_type)
    }

    /// Shared prefix for any resource type
    #[inline]
    #[must_use]
    pub fn shared_resource_name_for(config: &dyn DeploymentConfig, resource_type: &str) -> String {
        config.shared_resource_prefix(resource_type)
    }

    /// Base stack name, optionally suffixed
    #[inline]
    #[must_use]
    pub fn base_stack_name(&self, suffix: &str) -> String {
        self.config.base_prefix(suffix)
    }

    /// Environment for `name`, or the active one
    ///
    /// # Errors
    /// Propagates [`ConfigError`] from the configuration collaborator
    #[inline]
    pub fn environment(&self, name: Option<&str>) -> Result<Environment, ConfigError> {
        self.config.resolve_environment(name)
    }

    /// Full account properties for `name`
    ///
    /// # Errors
    /// Propagates [`ConfigError`] from the configuration collaborator
    #[inline]
    pub fn full_account_props(&self, name: &str) -> Result<AccountProps, ConfigError> {
        self.config.resolve_full_account_properties(name)
    }

    /// Target name for `name`, or the active one
    ///
    /// # Errors
    /// Propagates [`ConfigError`] from the configuration collaborator
    #[inline]
    pub fn target_name(&self, name: Option<&str>) -> Result<String, ConfigError> {
        self.config.resolve_target_name(name)
    }

    /// Current readiness snapshot
    #[must_use]
    pub fn state(&self) -> ReadyState {
        self.ready_tx.borrow().clone()
    }

    /// Check if activation has started
    #[inline]
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Wait for the phases to finish
    ///
    /// Resolves with the same outcome on every call. Pends until the object
    /// is activated.
    ///
    /// # Errors
    /// Returns the stored [`LifecycleError`] if a phase failed or the
    /// activation was dropped before finishing
    pub async fn ready(&self) -> Result<(), LifecycleError> {
        let mut rx = self.ready_tx.subscribe();
        let state = rx
            .wait_for(|state| !state.is_pending())
            .await
            .map(|state| state.clone())
            .map_err(|_| LifecycleError::Abandoned {
                name: self.name.clone(),
            })?;

        state.outcome().unwrap_or_else(|| {
            Err(LifecycleError::Abandoned {
                name: self.name.clone(),
            })
        })
    }

    fn begin(&self) -> bool {
        !self.started.swap(true, Ordering::AcqRel)
    }

    /// Record the outcome; only the first resolution sticks
    fn resolve(&self, outcome: &Result<(), LifecycleError>) {
        self.ready_tx.send_if_modified(|state| {
            if !state.is_pending() {
                return false;
            }
            *state = match outcome {
                Ok(()) => ReadyState::Ready,
                Err(err) => ReadyState::Failed(err.clone()),
            };
            true
        });
    }
}

/// Resource object with three overridable initialization phases
///
/// Every phase defaults to a no-op.
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Lifecycle part of this object
    fn object(&self) -> &LifecycleObject;

    /// Type name used in logs and errors
    fn type_name(&self) -> &'static str {
        self.object().owner_type()
    }

    /// Runs first
    async fn pre_initialize(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Runs after `pre_initialize` succeeded
    async fn initialize(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Runs after `initialize` succeeded
    async fn post_initialize(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Run the three phases of `target` and resolve its readiness signal
///
/// # Errors
/// - [`LifecycleError::AlreadyActivated`] if activation already started;
///   the phases are not run again
/// - [`LifecycleError::PhaseFailed`] wrapping the first phase error
///
/// Dropping the returned future mid-sequence resolves readiness with
/// [`LifecycleError::Abandoned`]; the object cannot be activated again.
pub async fn activate<T: Lifecycle + ?Sized>(target: &T) -> Result<(), LifecycleError> {
    let object = target.object();
    if !object.begin() {
        return Err(LifecycleError::AlreadyActivated {
            type_name: target.type_name(),
            name: object.name().to_string(),
        });
    }

    tracing::debug!(
        name = %object.name(),
        resource_type = %object.resource_type(),
        "Activating {}",
        target.type_name()
    );

    let guard = ActivationGuard {
        object,
        armed: true,
    };
    let outcome = run_phases(target).await;
    guard.finish(&outcome);
    outcome
}

/// Fails the readiness signal with [`LifecycleError::Abandoned`] if
/// [`activate`] is dropped between `begin` and `resolve`
struct ActivationGuard<'a> {
    object: &'a LifecycleObject,
    armed: bool,
}

impl ActivationGuard<'_> {
    fn finish(mut self, outcome: &Result<(), LifecycleError>) {
        self.armed = false;
        self.object.resolve(outcome);
    }
}

impl Drop for ActivationGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!(
                name = %self.object.name(),
                "Activation dropped before the phases finished"
            );
            self.object.resolve(&Err(LifecycleError::Abandoned {
                name: self.object.name().to_string(),
            }));
        }
    }
}

/// Start [`activate`] on the runtime without waiting for it
///
/// Callers observe the outcome through the join handle or through
/// [`LifecycleObject::ready`]. Aborting the handle after the task started
/// resolves readiness with [`LifecycleError::Abandoned`].
pub fn spawn_activation<T>(target: Arc<T>) -> JoinHandle<Result<(), LifecycleError>>
where
    T: Lifecycle + ?Sized + 'static,
{
    tokio::spawn(async move { activate(target.as_ref()).await })
}

async fn run_phases<T: Lifecycle + ?Sized>(target: &T) -> Result<(), LifecycleError> {
    for phase in Phase::ALL {
        let result = match phase {
            Phase::PreInitialize => target.pre_initialize().await,
            Phase::Initialize => target.initialize().await,
            Phase::PostInitialize => target.post_initialize().await,
        };

        if let Err(source) = result {
            tracing::error!(
                phase = %phase,
                error = %source,
                "Initialization of {} object failed",
                target.type_name()
            );
            return Err(LifecycleError::PhaseFailed {
                type_name: target.type_name(),
                phase,
                source: Arc::from(source),
            });
        }
    }

    Ok(())
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
