//! Deployment configuration
//!
//! [`DeploymentConfig`] is the collaborator every lifecycle object asks for
//! naming prefixes, environments and cost-center values. [`StaticConfig`]
//! answers those questions from in-memory [`DeploymentSettings`].

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Account and region a root scope is bound to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Environment {
    /// Cloud account identifier
    pub account: String,
    /// Region name
    pub region: String,
}

impl Environment {
    /// Create new environment
    #[inline]
    #[must_use]
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            region: region.into(),
        }
    }
}

/// Full properties of a named deployment account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProps {
    /// Account (target) name, e.g. `dev`
    pub name: String,
    /// Account and region
    pub env: Environment,
    /// Free-form account properties
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl AccountProps {
    /// Create account properties
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, env: Environment) -> Self {
        Self {
            name: name.into(),
            env,
            extra: BTreeMap::new(),
        }
    }

    /// With an extra property
    #[inline]
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Configuration collaborator
///
/// Naming functions must be deterministic for a given input within one
/// deployment context.
pub trait DeploymentConfig: Send + Sync + Debug {
    /// Prefix shared by every resource of `resource_type`
    fn shared_resource_prefix(&self, resource_type: &str) -> String;

    /// Base name for stacks, optionally suffixed
    fn base_prefix(&self, suffix: &str) -> String;

    /// Account and region for `name`, or for the active target when `None`
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the environment is not configured
    fn resolve_environment(&self, name: Option<&str>) -> Result<Environment, ConfigError>;

    /// Full account properties for `name`
    ///
    /// # Errors
    /// Returns [`ConfigError::UnknownAccount`] if no such account exists
    fn resolve_full_account_properties(&self, name: &str) -> Result<AccountProps, ConfigError>;

    /// Target name for `name`, or the active target when `None`
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the target is unknown or unset
    fn resolve_target_name(&self, name: Option<&str>) -> Result<String, ConfigError>;

    /// Cost center to tag root stacks with; `None` when unset
    fn cost_center(&self) -> Option<String>;
}

/// In-memory deployment settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSettings {
    /// Application identifier
    pub application: String,
    /// Active target (environment) name
    pub target: String,
    /// Accounts by target name
    #[serde(default)]
    pub accounts: BTreeMap<String, AccountProps>,
    /// Cost center tag value
    #[serde(default)]
    pub cost_center: Option<String>,
    /// Per resource type overrides of the shared prefix
    #[serde(default)]
    pub resource_prefixes: BTreeMap<String, String>,
}

impl DeploymentSettings {
    /// Create settings for an application deployed to `target`
    #[inline]
    #[must_use]
    pub fn new(application: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            target: target.into(),
            ..Self::default()
        }
    }

    /// With an account, keyed by its name
    #[must_use]
    pub fn with_account(mut self, account: AccountProps) -> Self {
        self.accounts.insert(account.name.clone(), account);
        self
    }

    /// With cost center
    #[inline]
    #[must_use]
    pub fn with_cost_center(mut self, cost_center: impl Into<String>) -> Self {
        self.cost_center = Some(cost_center.into());
        self
    }

    /// With active target
    #[inline]
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// With a shared prefix override for one resource type
    #[inline]
    #[must_use]
    pub fn with_prefix_override(
        mut self,
        resource_type: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        self.resource_prefixes
            .insert(resource_type.into(), prefix.into());
        self
    }
}

/// [`DeploymentConfig`] backed by [`DeploymentSettings`]
#[derive(Debug, Clone)]
pub struct StaticConfig {
    settings: DeploymentSettings,
}

impl StaticConfig {
    /// Create from settings
    #[inline]
    #[must_use]
    pub fn new(settings: DeploymentSettings) -> Self {
        Self { settings }
    }

    /// Get settings
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &DeploymentSettings {
        &self.settings
    }

    fn account(&self, name: &str) -> Option<&AccountProps> {
        self.settings.accounts.get(name)
    }
}

impl From<DeploymentSettings> for StaticConfig {
    fn from(settings: DeploymentSettings) -> Self {
        Self::new(settings)
    }
}

impl DeploymentConfig for StaticConfig {
    fn shared_resource_prefix(&self, resource_type: &str) -> String {
        match self.settings.resource_prefixes.get(resource_type) {
            Some(prefix) => prefix.clone(),
            None => format!("{}-{}", self.settings.target, self.settings.application),
        }
    }

    fn base_prefix(&self, suffix: &str) -> String {
        let base = format!("{}-{}", self.settings.application, self.settings.target);
        if suffix.is_empty() {
            base
        } else {
            format!("{base}-{suffix}")
        }
    }

    fn resolve_environment(&self, name: Option<&str>) -> Result<Environment, ConfigError> {
        let target = self.resolve_target_name(name)?;
        self.account(&target)
            .map(|account| account.env.clone())
            .ok_or(ConfigError::UnknownEnvironment(target))
    }

    fn resolve_full_account_properties(&self, name: &str) -> Result<AccountProps, ConfigError> {
        self.account(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownAccount(name.to_string()))
    }

    fn resolve_target_name(&self, name: Option<&str>) -> Result<String, ConfigError> {
        match name {
            Some(name) if self.account(name).is_some() => Ok(name.to_string()),
            Some(name) => Err(ConfigError::UnknownEnvironment(name.to_string())),
            None if self.settings.target.is_empty() => {
                Err(ConfigError::MissingValue("target".to_string()))
            }
            None => Ok(self.settings.target.clone()),
        }
    }

    fn cost_center(&self) -> Option<String> {
        self.settings
            .cost_center
            .clone()
            .filter(|value| !value.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn settings() -> DeploymentSettings {
        DeploymentSettings::new("app", "dev")
            .with_account(AccountProps::new("dev", Environment::new("111111111111", "us-east-1")))
            .with_account(
                AccountProps::new("prod", Environment::new("222222222222", "eu-west-1"))
                    .with_property("webAppUrl", "https://example.com"),
            )
    }

    #[test]
    fn shared_prefix_encodes_target_and_application() {
        let config = StaticConfig::new(settings());
        assert_eq!(config.shared_resource_prefix("stack"), "dev-app");
        assert_eq!(config.shared_resource_prefix("bucket"), "dev-app");
    }

    #[test]
    fn shared_prefix_override_per_type() {
        let config = StaticConfig::new(settings().with_prefix_override("bucket", "dev-app-data"));
        assert_eq!(config.shared_resource_prefix("bucket"), "dev-app-data");
        assert_eq!(config.shared_resource_prefix("stack"), "dev-app");
    }

    #[test]
    fn base_prefix_with_and_without_suffix() {
        let config = StaticConfig::new(settings());
        assert_eq!(config.base_prefix(""), "app-dev");
        assert_eq!(config.base_prefix("Ci"), "app-dev-Ci");
    }

    #[test]
    fn resolve_environment_defaults_to_target() {
        let config = StaticConfig::new(settings());
        let env = config.resolve_environment(None).unwrap();
        assert_eq!(env, Environment::new("111111111111", "us-east-1"));

        let prod = config.resolve_environment(Some("prod")).unwrap();
        assert_eq!(prod.region, "eu-west-1");
    }

    #[test]
    fn resolve_unknown_environment() {
        let config = StaticConfig::new(settings());
        assert_eq!(
            config.resolve_environment(Some("qa")),
            Err(ConfigError::UnknownEnvironment("qa".to_string()))
        );

        let no_target = StaticConfig::new(settings().with_target(""));
        assert_eq!(
            no_target.resolve_target_name(None),
            Err(ConfigError::MissingValue("target".to_string()))
        );
    }

    #[test]
    fn full_account_properties() {
        let config = StaticConfig::new(settings());
        let prod = config.resolve_full_account_properties("prod").unwrap();
        assert_eq!(prod.extra.get("webAppUrl").map(String::as_str), Some("https://example.com"));
        assert!(config.resolve_full_account_properties("qa").is_err());
    }

    #[test]
    fn empty_cost_center_is_none() {
        assert_eq!(StaticConfig::new(settings()).cost_center(), None);
        assert_eq!(
            StaticConfig::new(settings().with_cost_center("")).cost_center(),
            None
        );
        assert_eq!(
            StaticConfig::new(settings().with_cost_center("CC-42")).cost_center(),
            Some("CC-42".to_string())
        );
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let json = r#"{
            "application": "app",
            "target": "dev",
            "accounts": {
                "dev": { "name": "dev", "env": { "account": "1", "region": "us-east-1" } }
            }
        }"#;
        let settings: DeploymentSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.cost_center, None);
        assert!(settings.resource_prefixes.is_empty());
        assert_eq!(settings.accounts["dev"].env.region, "us-east-1");
    }
}
