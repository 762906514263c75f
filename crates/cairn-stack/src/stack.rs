//! Stack nodes
//!
//! A [`StackNode`] is one deployable unit in a tree of stacks. It wraps a
//! single provider [`Scope`], created during the `initialize` phase:
//! - root (no parent): a top-level scope bound to the active account/region,
//!   then tagged with `StackName`, `CreatedBy` and optionally `CostCenter`
//! - nested: a scope inside the parent's scope, untagged
//!
//! `post_initialize` attaches the [`Policies`] aspect unless the stack's
//! properties disable it.
//!
//! Everything that touches the scope (outputs, tags, policies, parameters)
//! requires a finished `initialize`; earlier calls fail with
//! [`StackError::ScopeNotReady`].
//!
//! # Example
//!
//! ```rust,ignore
//! let root = StackNode::new(&ctx, Some("Billing"), None);
//! root.activate().await?;
//!
//! let child = StackNode::new(&ctx, Some("Invoices"), Some(&root));
//! child.activate().await?;
//! child.add_output("QueueUrl", &url, true)?; // also exported on Billing
//! ```

use crate::context::StackContext;
use crate::error::StackError;
use crate::identity::resolve_user;
use crate::parameter::{parse_parameter_name, ParsedParameterName};
use crate::policy::Policies;
use crate::provider::{ParameterHandle, ParameterSpec, Scope};
use async_trait::async_trait;
use cairn_core::{BoxError, Lifecycle, LifecycleError, LifecycleObject};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

/// Name used when a stack is created without one
pub const DEFAULT_STACK_NAME: &str = "DefaultStack";

/// Resource type of every stack
pub const STACK_RESOURCE_TYPE: &str = "stack";

/// Tag holding the stack identity
pub const TAG_STACK_NAME: &str = "StackName";

/// Tag holding the acting user
pub const TAG_CREATED_BY: &str = "CreatedBy";

/// Tag holding the configured cost center
pub const TAG_COST_CENTER: &str = "CostCenter";

/// Stack options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackProps {
    /// Skip the policy aspect
    #[serde(default)]
    pub disable_policies: bool,
    /// Wildcard actions approved on top of the defaults
    #[serde(default)]
    pub approved_wildcard_actions: Option<Vec<String>>,
    /// Caller-defined options
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl StackProps {
    /// Create default props
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable the policy aspect
    #[inline]
    #[must_use]
    pub fn with_policies_disabled(mut self) -> Self {
        self.disable_policies = true;
        self
    }

    /// With approved wildcard actions
    #[inline]
    #[must_use]
    pub fn with_approved_wildcard_actions(
        mut self,
        actions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.approved_wildcard_actions = Some(actions.into_iter().map(Into::into).collect());
        self
    }

    /// With a caller-defined option
    #[inline]
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Something that can register outputs
pub trait ExportOutputs {
    /// Register `value` under `name`, exporting to the parent when asked
    ///
    /// # Errors
    /// Returns [`StackError`] if the scope is missing or the provider rejects the output
    fn add_output(&self, name: &str, value: &str, should_export: bool) -> Result<(), StackError>;
}

/// A deployable unit in the stack tree
#[derive(Debug)]
pub struct StackNode {
    object: LifecycleObject,
    context: StackContext,
    parent: Option<Weak<StackNode>>,
    props: StackProps,
    scope: OnceCell<Box<dyn Scope>>,
}

impl StackNode {
    /// Create a stack with default props
    ///
    /// Only sets identity fields; call [`StackNode::activate`] to create the scope.
    #[must_use]
    pub fn new(
        context: &StackContext,
        name: Option<&str>,
        parent: Option<&Arc<StackNode>>,
    ) -> Arc<Self> {
        Self::with_props(context, name, parent, StackProps::default())
    }

    /// Create a stack with props
    #[must_use]
    pub fn with_props(
        context: &StackContext,
        name: Option<&str>,
        parent: Option<&Arc<StackNode>>,
        props: StackProps,
    ) -> Arc<Self> {
        let name = match name {
            Some(name) if !name.is_empty() => name,
            _ => {
                tracing::warn!(
                    "No stack name provided, prefer a named stack. Defaulting to '{}'",
                    DEFAULT_STACK_NAME
                );
                DEFAULT_STACK_NAME
            }
        };

        Arc::new(Self {
            object: LifecycleObject::new::<Self>(
                name,
                Some(STACK_RESOURCE_TYPE),
                Arc::clone(context.config()),
            ),
            context: context.clone(),
            parent: parent.map(Arc::downgrade),
            props,
            scope: OnceCell::new(),
        })
    }

    /// Run the three lifecycle phases
    ///
    /// A nested stack must be activated after its parent finished.
    ///
    /// # Errors
    /// Returns [`LifecycleError`] if a phase fails or the stack was already activated
    pub async fn activate(&self) -> Result<(), LifecycleError> {
        cairn_core::activate(self).await
    }

    /// Wait for activation to finish
    ///
    /// # Errors
    /// Returns the stored [`LifecycleError`] if a phase failed
    pub async fn ready(&self) -> Result<(), LifecycleError> {
        self.object.ready().await
    }

    /// Get name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.object.name()
    }

    /// Composite identity: `{shared prefix}-{name}`
    #[inline]
    #[must_use]
    pub fn get_identity(&self) -> String {
        self.object.get_identity()
    }

    /// Parent stack, if set and still alive
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Arc<StackNode>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Check if this is a root stack
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Get props
    #[inline]
    #[must_use]
    pub fn props(&self) -> &StackProps {
        &self.props
    }

    /// Get context
    #[inline]
    #[must_use]
    pub fn context(&self) -> &StackContext {
        &self.context
    }

    /// Wrapped provider scope
    ///
    /// # Errors
    /// Returns [`StackError::ScopeNotReady`] before `initialize` finished
    pub fn scope(&self) -> Result<&dyn Scope, StackError> {
        self.scope
            .get()
            .map(|scope| &**scope)
            .ok_or_else(|| StackError::ScopeNotReady {
                stack: self.get_identity(),
            })
    }

    /// Check if the scope exists
    #[inline]
    #[must_use]
    pub fn has_scope(&self) -> bool {
        self.scope.get().is_some()
    }

    /// Register an output, and on the parent scope too if `should_export`
    ///
    /// Export goes one level up only.
    ///
    /// # Errors
    /// Returns [`StackError::ScopeNotReady`] before activation, or the provider error.
    /// The output is written to this stack's scope first: if the parent then
    /// rejects the export (e.g. a sibling already exported the same name), the
    /// error is returned and the local output stays registered.
    pub fn add_output(&self, name: &str, value: &str, should_export: bool) -> Result<(), StackError> {
        self.scope()?.add_output(name, value)?;

        if should_export {
            if let Some(parent) = self.parent() {
                if let Some(parent_scope) = parent.scope.get() {
                    parent_scope.add_output(name, value)?;
                    tracing::debug!(
                        output = %name,
                        stack = %self.get_identity(),
                        parent = %parent_scope.id(),
                        "Exported output to parent"
                    );
                }
            }
        }

        Ok(())
    }

    /// Tag the scope with `StackName`, `CreatedBy` and `CostCenter` (if configured)
    ///
    /// # Errors
    /// Returns [`StackError`] if the scope is missing, the user cannot be
    /// resolved, or the provider rejects a tag
    pub async fn add_tags(&self) -> Result<(), StackError> {
        let scope = self.scope()?;
        let created_by = self.get_user().await?;

        scope.add_tag(TAG_STACK_NAME, &self.get_identity())?;
        scope.add_tag(TAG_CREATED_BY, &created_by)?;

        if let Some(cost_center) = self.context.config().cost_center() {
            scope.add_tag(TAG_COST_CENTER, &cost_center)?;
        }

        Ok(())
    }

    /// Attach the policy aspect, approving `custom` on top of the defaults
    ///
    /// # Errors
    /// Returns [`StackError::ScopeNotReady`] before activation, or the provider error
    pub fn apply_policies(&self, custom: Option<&[String]>) -> Result<(), StackError> {
        let scope = self.scope()?;
        scope.add_aspect(Arc::new(Policies::new(custom)))?;
        Ok(())
    }

    /// Create a persisted string parameter
    ///
    /// # Errors
    /// Returns [`StackError::InvalidParameterName`], [`StackError::ScopeNotReady`],
    /// or the provider error
    pub fn create_parameter(
        &self,
        full_name: &str,
        description: &str,
        value: &str,
    ) -> Result<ParameterHandle, StackError> {
        let parsed = self.parse_parameter_name(full_name)?;
        let spec = ParameterSpec {
            parameter_name: parsed.parameter_name,
            description: description.to_string(),
            value: value.to_string(),
        };

        Ok(self.scope()?.create_string_parameter(&parsed.id, &spec)?)
    }

    /// Reference a parameter created with the same `full_name`
    ///
    /// # Errors
    /// Returns [`StackError::InvalidParameterName`], [`StackError::ScopeNotReady`],
    /// or the provider error
    pub fn load_parameter(&self, full_name: &str) -> Result<ParameterHandle, StackError> {
        let parsed = self.parse_parameter_name(full_name)?;
        Ok(self
            .scope()?
            .import_string_parameter(&parsed.id, &parsed.parameter_name)?)
    }

    /// Derived id and path for a parameter name on this stack
    ///
    /// # Errors
    /// Returns [`StackError::InvalidParameterName`] for empty names or segments
    pub fn parse_parameter_name(&self, full_name: &str) -> Result<ParsedParameterName, StackError> {
        parse_parameter_name(full_name, self.name(), &self.get_identity())
    }

    /// Acting user, falling back to the caller identity
    ///
    /// # Errors
    /// Returns [`StackError::Identity`] only if both lookups fail
    pub async fn get_user(&self) -> Result<String, StackError> {
        Ok(resolve_user(self.context.identity().as_ref()).await?)
    }

    async fn create_scope(&self) -> Result<(), StackError> {
        let env = self.object.environment(None)?;
        let identity = self.get_identity();

        let scope = match &self.parent {
            Some(parent) => {
                let not_ready = || StackError::ParentNotReady {
                    stack: identity.clone(),
                };
                let parent = parent.upgrade().ok_or_else(not_ready)?;
                let parent_scope = parent.scope.get().ok_or_else(not_ready)?;
                tracing::debug!(stack = %identity, parent = %parent_scope.id(), "Creating nested scope");
                parent_scope.create_nested_scope(&identity)?
            }
            None => {
                tracing::debug!(
                    stack = %identity,
                    account = %env.account,
                    region = %env.region,
                    "Creating root scope"
                );
                self.context.provisioner().create_root_scope(&identity, &env)?
            }
        };

        self.scope
            .set(scope)
            .map_err(|_| StackError::ScopeAlreadyCreated {
                stack: identity.clone(),
            })?;

        if self.is_root() {
            self.add_tags().await?;
        }

        tracing::info!("Stack {} initialized", identity);
        Ok(())
    }

    fn apply_configured_policies(&self) -> Result<(), StackError> {
        if self.props.disable_policies {
            tracing::debug!(stack = %self.get_identity(), "Policies disabled");
            return Ok(());
        }
        self.apply_policies(self.props.approved_wildcard_actions.as_deref())
    }
}

#[async_trait]
impl Lifecycle for StackNode {
    fn object(&self) -> &LifecycleObject {
        &self.object
    }

    async fn initialize(&self) -> Result<(), BoxError> {
        self.create_scope().await.map_err(Into::into)
    }

    async fn post_initialize(&self) -> Result<(), BoxError> {
        self.apply_configured_policies().map_err(Into::into)
    }
}

impl ExportOutputs for StackNode {
    fn add_output(&self, name: &str, value: &str, should_export: bool) -> Result<(), StackError> {
        StackNode::add_output(self, name, value, should_export)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{IdentityError, ProvisionError};
    use crate::identity::{CallerIdentity, IdentityService, UserIdentity};
    use crate::provider::Provisioner;
    use cairn_core::{AccountProps, DeploymentSettings, Environment, StaticConfig};
    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    struct Offline;

    impl Provisioner for Offline {
        fn create_root_scope(
            &self,
            _id: &str,
            _env: &Environment,
        ) -> Result<Box<dyn Scope>, ProvisionError> {
            Err(ProvisionError::Rejected("offline".to_string()))
        }
    }

    #[async_trait]
    impl IdentityService for Offline {
        async fn current_user(&self) -> Result<UserIdentity, IdentityError> {
            Err(IdentityError::Unavailable("offline".to_string()))
        }

        async fn caller_identity(&self) -> Result<CallerIdentity, IdentityError> {
            Err(IdentityError::Unavailable("offline".to_string()))
        }
    }

    fn context() -> StackContext {
        let settings = DeploymentSettings::new("app", "dev").with_account(AccountProps::new(
            "dev",
            Environment::new("111111111111", "us-east-1"),
        ));
        StackContext::new(
            Arc::new(StaticConfig::new(settings)),
            Arc::new(Offline),
            Arc::new(Offline),
        )
    }

    #[test]
    fn identity_and_type() {
        let stack = StackNode::new(&context(), Some("Billing"), None);
        assert_eq!(stack.get_identity(), "dev-app-Billing");
        assert_eq!(stack.object().resource_type(), STACK_RESOURCE_TYPE);
        assert_eq!(stack.type_name(), "StackNode");
        assert!(stack.is_root());
    }

    #[test]
    fn missing_name_defaults() {
        let ctx = context();
        assert_eq!(StackNode::new(&ctx, None, None).name(), DEFAULT_STACK_NAME);
        assert_eq!(StackNode::new(&ctx, Some(""), None).name(), DEFAULT_STACK_NAME);
    }

    #[test]
    fn child_keeps_weak_parent() {
        let ctx = context();
        let root = StackNode::new(&ctx, Some("Root"), None);
        let child = StackNode::new(&ctx, Some("Child"), Some(&root));

        assert!(!child.is_root());
        assert_eq!(child.parent().map(|p| p.get_identity()), Some(root.get_identity()));
        assert_eq!(Arc::strong_count(&root), 1);
    }

    #[test]
    fn scope_operations_before_activation_fail_fast() {
        let stack = StackNode::new(&context(), Some("Billing"), None);

        assert!(matches!(
            stack.add_output("Url", "https://example.com", true),
            Err(StackError::ScopeNotReady { .. })
        ));
        assert!(matches!(
            stack.apply_policies(None),
            Err(StackError::ScopeNotReady { .. })
        ));
        assert!(matches!(
            stack.create_parameter("config/region", "desc", "us-east-1"),
            Err(StackError::ScopeNotReady { .. })
        ));
        assert!(matches!(
            stack.load_parameter("config/region"),
            Err(StackError::ScopeNotReady { .. })
        ));
    }

    #[test]
    fn invalid_parameter_name_reported_before_scope() {
        let stack = StackNode::new(&context(), Some("Billing"), None);
        assert!(matches!(
            stack.create_parameter("", "desc", "value"),
            Err(StackError::InvalidParameterName { .. })
        ));
    }

    #[test]
    fn parameter_names_match_example() {
        let stack = StackNode::new(&context(), Some("Billing"), None);
        let parsed = stack.parse_parameter_name("config/region").unwrap();
        assert_eq!(parsed.id, "configregionParameter");
        assert_eq!(parsed.parameter_name, "/dev-app-Billing/config/region");
    }

    #[tokio::test]
    async fn provider_failure_fails_initialize() {
        let stack = StackNode::new(&context(), Some("Billing"), None);
        let err = stack.activate().await.unwrap_err();

        assert_eq!(err.failed_phase(), Some(cairn_core::Phase::Initialize));
        assert!(!stack.has_scope());
        assert!(stack.ready().await.is_err());
    }

    #[tokio::test]
    async fn get_user_propagates_double_failure() {
        let stack = StackNode::new(&context(), Some("Billing"), None);
        assert!(matches!(
            stack.get_user().await,
            Err(StackError::Identity(IdentityError::Unavailable(_)))
        ));
    }

    #[test]
    fn props_deserialize_camel_case() {
        let props: StackProps = serde_json::from_str(
            r#"{"disablePolicies": true, "approvedWildcardActions": ["sqs:*"], "team": "billing"}"#,
        )
        .unwrap();

        assert!(props.disable_policies);
        assert_eq!(props.approved_wildcard_actions, Some(vec!["sqs:*".to_string()]));
        assert_eq!(props.extra.get("team"), Some(&serde_json::json!("billing")));
    }

    #[test]
    fn props_builder() {
        let props = StackProps::new()
            .with_policies_disabled()
            .with_approved_wildcard_actions(["dynamodb:Query*"])
            .with_property("team", serde_json::json!("billing"));
        assert!(props.disable_policies);
        assert_eq!(props.extra.len(), 1);
    }
}
