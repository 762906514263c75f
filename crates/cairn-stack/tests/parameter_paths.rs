use cairn_stack::prelude::*;
use cairn_stack::{parse_parameter_name, ProvisionError};
use cairn_test_utils::{setup_test_context, MemoryProvisioner, ScriptedIdentity};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;

proptest! {
    #[test]
    fn prop_two_segments_map_to_identity_path(
        base in "[A-Za-z0-9]{1,12}",
        leaf in "[A-Za-z0-9]{1,12}",
        stack in "[A-Z][a-z]{1,10}",
    ) {
        let identity = format!("dev-app-{stack}");
        let parsed = parse_parameter_name(&format!("{base}/{leaf}"), &stack, &identity).unwrap();

        prop_assert_eq!(parsed.id, format!("{base}{leaf}Parameter"));
        prop_assert_eq!(parsed.parameter_name, format!("/{identity}/{base}/{leaf}"));
    }

    #[test]
    fn prop_single_segment_uses_stack_name(
        leaf in "[A-Za-z0-9]{1,12}",
        stack in "[A-Z][a-z]{1,10}",
    ) {
        let identity = format!("dev-app-{stack}");
        let parsed = parse_parameter_name(&leaf, &stack, &identity).unwrap();

        prop_assert_eq!(parsed.base_name, stack.clone());
        prop_assert_eq!(parsed.parameter_name, format!("/{identity}/{stack}/{leaf}"));
    }

    #[test]
    fn prop_trailing_segments_do_not_change_result(
        base in "[a-z]{1,8}",
        leaf in "[a-z]{1,8}",
        rest in proptest::collection::vec("[a-z]{0,8}", 1..4),
    ) {
        let short = parse_parameter_name(&format!("{base}/{leaf}"), "S", "dev-app-S").unwrap();
        let long_name = format!("{base}/{leaf}/{}", rest.join("/"));
        let long = parse_parameter_name(&long_name, "S", "dev-app-S").unwrap();

        prop_assert_eq!(&long.id, &short.id);
        prop_assert_eq!(&long.parameter_name, &short.parameter_name);
        prop_assert_eq!(long.ignored_segments, rest.len());
    }
}

async fn activated(name: &str) -> (Arc<StackNode>, MemoryProvisioner) {
    let (ctx, provisioner) = setup_test_context(ScriptedIdentity::with_user("alice"));
    let stack = StackNode::new(&ctx, Some(name), None);
    stack.activate().await.unwrap();
    (stack, provisioner)
}

#[tokio::test]
async fn test_create_parameter_under_stack_identity() {
    let (billing, provisioner) = activated("Billing").await;

    let handle = billing
        .create_parameter("config/region", "Deployment region", "us-east-1")
        .unwrap();

    assert_eq!(handle.id, "configregionParameter");
    assert_eq!(handle.parameter_name, "/dev-app-Billing/config/region");
    assert_eq!(handle.scope_id, "dev-app-Billing");
    assert!(!handle.imported);

    let stored = provisioner
        .parameter_by_name("/dev-app-Billing/config/region")
        .unwrap();
    assert_eq!(stored.value, "us-east-1");
    assert_eq!(stored.description, "Deployment region");
}

#[tokio::test]
async fn test_single_segment_nests_under_stack_name() {
    let (billing, _provisioner) = activated("Billing").await;

    let handle = billing.create_parameter("region", "Region", "us-east-1").unwrap();

    assert_eq!(handle.id, "BillingregionParameter");
    assert_eq!(handle.parameter_name, "/dev-app-Billing/Billing/region");
}

#[tokio::test]
async fn test_load_references_created_path() {
    let (billing, provisioner) = activated("Billing").await;

    let created = billing.create_parameter("config/region", "Region", "us-east-1").unwrap();
    let loaded = billing.load_parameter("config/region").unwrap();

    assert_eq!(loaded.id, created.id);
    assert_eq!(loaded.parameter_name, created.parameter_name);
    assert!(loaded.imported);
    assert_eq!(provisioner.scope("dev-app-Billing").unwrap().imports, vec![loaded]);
}

#[tokio::test]
async fn test_extra_segments_collapse_to_first_two() {
    let (billing, _provisioner) = activated("Billing").await;

    let handle = billing.create_parameter("a/b/c", "Value", "1").unwrap();
    assert_eq!(handle.parameter_name, "/dev-app-Billing/a/b");

    let err = billing.create_parameter("a/b", "Value", "2").unwrap_err();
    assert!(matches!(
        err,
        StackError::Provision(ProvisionError::DuplicateId { ref id, .. }) if id == "abParameter"
    ));
}

#[tokio::test]
async fn test_invalid_name_is_rejected_before_scope_check() {
    let (ctx, _provisioner) = setup_test_context(ScriptedIdentity::with_user("alice"));
    let billing = StackNode::new(&ctx, Some("Billing"), None);

    let err = billing.create_parameter("", "Empty", "x").unwrap_err();
    assert!(matches!(err, StackError::InvalidParameterName { .. }));

    let err = billing.load_parameter("config/").unwrap_err();
    assert!(matches!(err, StackError::InvalidParameterName { .. }));

    let err = billing.load_parameter("config/region").unwrap_err();
    assert!(matches!(err, StackError::ScopeNotReady { .. }));
}

#[tokio::test]
async fn test_nested_stack_parameters_use_own_identity() {
    let (ctx, provisioner) = setup_test_context(ScriptedIdentity::with_user("alice"));
    let billing = StackNode::new(&ctx, Some("Billing"), None);
    billing.activate().await.unwrap();
    let invoices = StackNode::new(&ctx, Some("Invoices"), Some(&billing));
    invoices.activate().await.unwrap();

    let handle = invoices.create_parameter("queue/url", "Queue", "https://queue").unwrap();

    assert_eq!(handle.parameter_name, "/dev-app-Invoices/queue/url");
    assert_eq!(handle.scope_id, "dev-app-Invoices");
    assert!(provisioner.scope("dev-app-Billing").unwrap().parameters.is_empty());
}
