//! Provisioning SDK seam
//!
//! The provider that actually creates infrastructure constructs sits behind
//! [`Provisioner`] (top-level scopes) and [`Scope`] (everything created inside
//! a scope). Implementations use interior mutability; every method takes
//! `&self`.

use crate::error::ProvisionError;
use crate::policy::Aspect;
use cairn_core::Environment;
use std::fmt::Debug;
use std::sync::Arc;

/// Placement of a scope in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeKind {
    /// Top-level scope bound to an account/region
    Root(Environment),
    /// Scope nested inside the scope with this id
    Nested(String),
}

/// Values for a persisted string parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    /// Addressable name, `/{identity}/{base}/{leaf}`
    pub parameter_name: String,
    /// Human-readable description
    pub description: String,
    /// Stored value
    pub value: String,
}

/// Reference to a string parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterHandle {
    /// Construct id within the owning scope
    pub id: String,
    /// Addressable parameter name
    pub parameter_name: String,
    /// Id of the scope holding the construct
    pub scope_id: String,
    /// `true` when the handle references an existing parameter
    pub imported: bool,
}

/// A provider construct a stack node wraps
pub trait Scope: Send + Sync + Debug {
    /// Construct id of this scope
    fn id(&self) -> &str;

    /// Root or nested placement
    fn kind(&self) -> ScopeKind;

    /// Create a scope nested inside this one
    ///
    /// # Errors
    /// Returns [`ProvisionError`] if the provider rejects the id
    fn create_nested_scope(&self, id: &str) -> Result<Box<dyn Scope>, ProvisionError>;

    /// Register an observable output
    ///
    /// # Errors
    /// Returns [`ProvisionError::DuplicateId`] if the name is taken
    fn add_output(&self, name: &str, value: &str) -> Result<(), ProvisionError>;

    /// Apply a tag to this scope and its children
    ///
    /// # Errors
    /// Returns [`ProvisionError`] if the provider rejects the tag
    fn add_tag(&self, key: &str, value: &str) -> Result<(), ProvisionError>;

    /// Attach a visitor run over this scope's constructs at synthesis
    ///
    /// # Errors
    /// Returns [`ProvisionError`] if the provider rejects the aspect
    fn add_aspect(&self, aspect: Arc<dyn Aspect>) -> Result<(), ProvisionError>;

    /// Create a persisted string parameter
    ///
    /// # Errors
    /// Returns [`ProvisionError::DuplicateId`] if `id` is taken in this scope
    fn create_string_parameter(
        &self,
        id: &str,
        spec: &ParameterSpec,
    ) -> Result<ParameterHandle, ProvisionError>;

    /// Reference an existing string parameter without creating it
    ///
    /// # Errors
    /// Returns [`ProvisionError`] if the provider rejects the reference
    fn import_string_parameter(
        &self,
        id: &str,
        parameter_name: &str,
    ) -> Result<ParameterHandle, ProvisionError>;
}

/// Creates top-level scopes
pub trait Provisioner: Send + Sync + Debug {
    /// Create a top-level scope bound to `env`
    ///
    /// # Errors
    /// Returns [`ProvisionError`] if the provider rejects the scope
    fn create_root_scope(
        &self,
        id: &str,
        env: &Environment,
    ) -> Result<Box<dyn Scope>, ProvisionError>;
}
