//! cairn stacks - deployable units in a tree of provider scopes
//!
//! Builds on the lifecycle objects from `cairn-core`:
//! - [`StackNode`] wraps one provider scope (root or nested)
//! - Parameter names map to deterministic ids and paths
//! - Outputs export one level up the tree
//! - Root stacks are tagged with their identity, creator and cost center
//! - A policy aspect rejects unapproved wildcard actions
//!
//! Collaborators are traits: [`Provisioner`]/[`Scope`] for the provisioning
//! SDK, [`IdentityService`] for the acting user, [`Aspect`] for policies.
//!
//! # Example
//!
//! ```rust,ignore
//! use cairn_stack::prelude::*;
//!
//! # async fn example(ctx: StackContext) -> Result<(), Box<dyn std::error::Error>> {
//! let billing = StackNode::new(&ctx, Some("Billing"), None);
//! billing.activate().await?;
//!
//! let region = billing.create_parameter("config/region", "Deployment region", "us-east-1")?;
//! assert_eq!(region.parameter_name, "/dev-app-Billing/config/region");
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod context;
pub mod error;
pub mod identity;
pub mod parameter;
pub mod policy;
pub mod provider;
pub mod registry;
pub mod stack;

pub use context::StackContext;
pub use error::{IdentityError, ProvisionError, StackError};
pub use identity::{resolve_user, CallerIdentity, IdentityService, UserIdentity, PLACEHOLDER_USER};
pub use parameter::{parse_parameter_name, ParsedParameterName};
pub use policy::{Aspect, AspectFinding, ConstructView, Policies, DEFAULT_APPROVED_WILDCARD_ACTIONS};
pub use provider::{ParameterHandle, ParameterSpec, Provisioner, Scope, ScopeKind};
pub use registry::StackRegistry;
pub use stack::{
    ExportOutputs, StackNode, StackProps, DEFAULT_STACK_NAME, STACK_RESOURCE_TYPE, TAG_COST_CENTER,
    TAG_CREATED_BY, TAG_STACK_NAME,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with stacks
    pub use crate::{
        ExportOutputs, IdentityService, ParameterHandle, Provisioner, Scope, StackContext,
        StackError, StackNode, StackProps, StackRegistry,
    };
    pub use cairn_core::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
