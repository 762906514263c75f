//! Testing utilities for cairn workspace
//!
//! Shared test doubles and fixtures:
//! - [`MemoryProvisioner`] records scopes, outputs, tags, aspects and parameters
//! - [`ScriptedIdentity`] answers identity lookups from a script
//! - [`fixture_settings`] / [`setup_test_context`] build a ready-to-use context

#![allow(missing_docs)]

mod identity;
mod memory;

pub use identity::ScriptedIdentity;
pub use memory::{MemoryProvisioner, MemoryScope, ScopeRecord};

use cairn_core::{AccountProps, DeploymentConfig, DeploymentSettings, Environment, StaticConfig};
use cairn_stack::StackContext;
use std::sync::Arc;

pub const DEV_ACCOUNT: &str = "111111111111";
pub const DEV_REGION: &str = "us-east-1";
pub const PROD_ACCOUNT: &str = "222222222222";
pub const PROD_REGION: &str = "eu-west-1";

/// Application `app` targeting `dev`, with `dev` and `prod` accounts
pub fn fixture_settings() -> DeploymentSettings {
    DeploymentSettings::new("app", "dev")
        .with_account(AccountProps::new("dev", Environment::new(DEV_ACCOUNT, DEV_REGION)))
        .with_account(AccountProps::new(
            "prod",
            Environment::new(PROD_ACCOUNT, PROD_REGION),
        ))
}

pub fn fixture_config() -> Arc<dyn DeploymentConfig> {
    Arc::new(StaticConfig::new(fixture_settings()))
}

/// Context over [`fixture_settings`] with a fresh provider
pub fn setup_test_context(identity: ScriptedIdentity) -> (StackContext, MemoryProvisioner) {
    setup_test_context_with(fixture_settings(), identity)
}

pub fn setup_test_context_with(
    settings: DeploymentSettings,
    identity: ScriptedIdentity,
) -> (StackContext, MemoryProvisioner) {
    let provisioner = MemoryProvisioner::new();
    let context = StackContext::new(
        Arc::new(StaticConfig::new(settings)),
        Arc::new(identity),
        Arc::new(provisioner.clone()),
    );
    (context, provisioner)
}
