//! cairn core - lifecycle objects for deployment definitions
//!
//! Every resource object in a deployment tree:
//! - Carries a name and a resource type
//! - Derives its identity as `{shared prefix}-{name}` from the configuration
//! - Initializes in three ordered asynchronous phases
//! - Exposes a readiness signal that resolves exactly once
//!
//! # Example
//!
//! ```rust,ignore
//! use cairn_core::prelude::*;
//!
//! # async fn example(config: std::sync::Arc<dyn DeploymentConfig>) -> Result<(), LifecycleError> {
//! let queue = Queue::new("Orders", config);   // synchronous, sets identity only
//! activate(&queue).await?;                     // runs the three phases
//! println!("{}", queue.object().get_identity());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod telemetry;

pub use config::{AccountProps, DeploymentConfig, DeploymentSettings, Environment, StaticConfig};
pub use error::{BoxError, ConfigError, LifecycleError, Phase, SharedError};
pub use lifecycle::{
    activate, spawn_activation, Lifecycle, LifecycleObject, ReadyState, DEFAULT_RESOURCE_TYPE,
};
pub use telemetry::{init_tracing, init_tracing_with, LogFormat};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with cairn lifecycle objects
    pub use crate::{
        activate, spawn_activation, BoxError, DeploymentConfig, Lifecycle, LifecycleError,
        LifecycleObject, ReadyState,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
