//! Security-policy aspect
//!
//! An [`Aspect`] is a visitor attached to a scope and run over every
//! construct in it when the deployment is synthesized. [`Policies`] flags
//! constructs that grant wildcard actions (`s3:*`, `logs:Get*`) not on its
//! approved list.

use std::collections::BTreeSet;
use std::fmt::Debug;

/// Wildcard actions approved for every stack
pub const DEFAULT_APPROVED_WILDCARD_ACTIONS: &[&str] = &[
    "cloudwatch:Describe*",
    "cloudwatch:Get*",
    "cloudwatch:List*",
    "logs:Describe*",
    "logs:Get*",
    "s3:Abort*",
    "s3:DeleteObject*",
    "s3:GetBucket*",
    "s3:GetObject*",
    "s3:List*",
    "xray:Get*",
];

/// Read-only view of a construct handed to aspects
#[derive(Debug, Clone, Copy)]
pub struct ConstructView<'a> {
    /// Construct path within the tree
    pub path: &'a str,
    /// IAM-style actions the construct grants
    pub actions: &'a [String],
}

/// Problem reported by an aspect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AspectFinding {
    /// Name of the reporting aspect
    pub aspect: String,
    /// Offending construct path
    pub path: String,
    /// Description
    pub message: String,
}

/// Visitor attached to a scope
pub trait Aspect: Send + Sync + Debug {
    /// Aspect name
    fn name(&self) -> &str;

    /// Inspect one construct
    fn visit(&self, construct: &ConstructView<'_>) -> Vec<AspectFinding>;
}

/// Wildcard-action policy enforcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policies {
    approved: BTreeSet<String>,
}

impl Policies {
    /// Default approved list, extended by `custom`
    #[must_use]
    pub fn new(custom: Option<&[String]>) -> Self {
        let mut approved: BTreeSet<String> = DEFAULT_APPROVED_WILDCARD_ACTIONS
            .iter()
            .map(|action| (*action).to_string())
            .collect();
        approved.extend(custom.unwrap_or_default().iter().cloned());
        Self { approved }
    }

    /// Only the given actions are approved; defaults are dropped
    #[must_use]
    pub fn replacing(actions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            approved: actions.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if `action` may be granted
    ///
    /// Actions without a `*` are always allowed.
    #[inline]
    #[must_use]
    pub fn is_allowed(&self, action: &str) -> bool {
        !action.contains('*') || self.approved.contains(action)
    }

    /// Approved wildcard actions
    pub fn approved(&self) -> impl Iterator<Item = &str> {
        self.approved.iter().map(String::as_str)
    }
}

impl Default for Policies {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Aspect for Policies {
    fn name(&self) -> &str {
        "Policies"
    }

    fn visit(&self, construct: &ConstructView<'_>) -> Vec<AspectFinding> {
        construct
            .actions
            .iter()
            .filter(|action| !self.is_allowed(action))
            .map(|action| AspectFinding {
                aspect: self.name().to_string(),
                path: construct.path.to_string(),
                message: format!("wildcard action '{action}' is not approved"),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| (*a).to_string()).collect()
    }

    #[test]
    fn defaults_allow_read_wildcards() {
        let policies = Policies::default();
        assert!(policies.is_allowed("s3:GetObject*"));
        assert!(policies.is_allowed("s3:PutObject"));
        assert!(!policies.is_allowed("s3:*"));
    }

    #[test]
    fn custom_list_extends_defaults() {
        let custom = actions(&["dynamodb:Query*"]);
        let policies = Policies::new(Some(&custom));
        assert!(policies.is_allowed("dynamodb:Query*"));
        assert!(policies.is_allowed("logs:Get*"));
    }

    #[test]
    fn replacing_drops_defaults() {
        let policies = Policies::replacing(["sqs:Receive*"]);
        assert!(policies.is_allowed("sqs:Receive*"));
        assert!(!policies.is_allowed("s3:List*"));
        assert_eq!(policies.approved().count(), 1);
    }

    #[test]
    fn visit_reports_each_unapproved_action() {
        let granted = actions(&["s3:*", "s3:List*", "iam:*", "sqs:SendMessage"]);
        let findings = Policies::default().visit(&ConstructView {
            path: "dev-app-Billing/Role",
            actions: &granted,
        });

        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.path == "dev-app-Billing/Role"));
        assert!(findings[0].message.contains("s3:*"));
        assert!(findings[1].message.contains("iam:*"));
    }
}
