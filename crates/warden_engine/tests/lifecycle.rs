//! End-to-end lifecycle scenarios (§8): plan correctness, a full
//! deploy/undeploy round trip through the built-in `link`/`unlink`
//! relationship, unresolvable operation references, and rollback-on-failure.

use std::sync::Arc;

use hashbrown::HashMap;
use warden_engine::{deploy, undeploy, Context, DriverError, Status};
use warden_graph::{InterfaceOp, NodeTemplate, NodeType, Requirement, Value};
use warden_ops::{BoxFuture, OperationRegistry, StandardOperation};

fn leaf(name: &str, node_type: Arc<NodeType>) -> NodeTemplate {
    NodeTemplate {
        name: name.to_string(),
        type_id: "example.Node".to_string(),
        node_type,
        properties: HashMap::new(),
        requirements: Vec::new(),
        template_overrides: HashMap::new(),
        artifacts: HashMap::new(),
    }
}

/// Sets a single boolean marker attribute named after the event, so tests
/// can observe which lifecycle events actually ran.
struct WriteMarker(&'static str);

impl StandardOperation for WriteMarker {
    fn call<'a>(
        &'a self,
        node: &'a warden_graph::Node,
        _inputs: &'a HashMap<String, Value>,
    ) -> BoxFuture<'a, Result<(), Box<dyn std::error::Error>>> {
        Box::pin(async move {
            node.set_attribute(self.0, Value::Bool(true));
            Ok(())
        })
    }
}

/// Wipes every runtime attribute a node carries.
struct ClearAll;

impl StandardOperation for ClearAll {
    fn call<'a>(
        &'a self,
        node: &'a warden_graph::Node,
        _inputs: &'a HashMap<String, Value>,
    ) -> BoxFuture<'a, Result<(), Box<dyn std::error::Error>>> {
        Box::pin(async move {
            node.restore_attributes(HashMap::new());
            Ok(())
        })
    }
}

/// Always fails, for the rollback scenario.
struct AlwaysFails;

impl StandardOperation for AlwaysFails {
    fn call<'a>(
        &'a self,
        _node: &'a warden_graph::Node,
        _inputs: &'a HashMap<String, Value>,
    ) -> BoxFuture<'a, Result<(), Box<dyn std::error::Error>>> {
        Box::pin(async move { Err("operation deliberately failed".into()) })
    }
}

fn markered_node_type() -> Arc<NodeType> {
    let mut standard = HashMap::new();
    standard.insert("create".to_string(), InterfaceOp::new("test:write_created"));
    standard.insert("configure".to_string(), InterfaceOp::new("test:write_configured"));
    standard.insert("start".to_string(), InterfaceOp::new("test:write_started"));
    standard.insert("delete".to_string(), InterfaceOp::new("test:clear"));
    Arc::new(NodeType {
        standard,
        attributes: vec!["created".to_string(), "configured".to_string(), "started".to_string()],
    })
}

fn two_node_template() -> (NodeTemplate, NodeTemplate) {
    let node_type = markered_node_type();
    let test_node = leaf("test_node", node_type.clone());
    let mut dependent_node = leaf("dependent_node", node_type);
    dependent_node.requirements = vec![Requirement::Name("test_node".to_string())];
    (test_node, dependent_node)
}

fn marker_registry() -> OperationRegistry {
    OperationRegistry::builder()
        .register_standard("test:write_created", Arc::new(WriteMarker("created")))
        .register_standard("test:write_configured", Arc::new(WriteMarker("configured")))
        .register_standard("test:write_started", Arc::new(WriteMarker("started")))
        .register_standard("test:clear", Arc::new(ClearAll))
        .build()
}

#[test]
fn plan_orders_prerequisite_before_dependent() {
    let (test_node, dependent_node) = two_node_template();
    let ctx = Context::new(
        "scenario-1",
        vec![test_node, dependent_node],
        Vec::new(),
        HashMap::new(),
        Vec::new(),
        HashMap::new(),
        OperationRegistry::builder().build(),
        false,
    )
    .unwrap();
    let plan = ctx.plan().unwrap();

    let test_id = warden_graph::NodeId::new(0);
    let dependent_id = warden_graph::NodeId::new(1);

    let test_prereqs = plan.prerequisites_for(test_id);
    assert_eq!(test_prereqs, &[test_id]);

    let dependent_prereqs = plan.prerequisites_for(dependent_id);
    let names: Vec<&str> = dependent_prereqs.iter().map(|id| ctx.nodes()[id.index()].name()).collect();
    assert_eq!(names, vec!["test_node", "dependent_node"]);
}

#[tokio::test]
async fn deploy_runs_every_phase_and_propagates_link_attribute() {
    let (test_node, dependent_node) = two_node_template();
    let ctx = Context::new(
        "scenario-2",
        vec![test_node, dependent_node],
        Vec::new(),
        HashMap::new(),
        Vec::new(),
        HashMap::new(),
        marker_registry(),
        false,
    )
    .unwrap();

    deploy(&ctx).await.unwrap();
    assert_eq!(ctx.status(), Status::Completed);

    for name in ["test_node", "dependent_node"] {
        let node = ctx.node_by_name(name).unwrap();
        assert_eq!(node.attribute("created"), Value::Bool(true), "{name} missing created");
        assert_eq!(node.attribute("configured"), Value::Bool(true), "{name} missing configured");
        assert_eq!(node.attribute("started"), Value::Bool(true), "{name} missing started");
    }
}

#[tokio::test]
async fn undeploy_after_deploy_clears_runtime_properties_and_returns_to_pending() {
    let (test_node, dependent_node) = two_node_template();
    let ctx = Context::new(
        "scenario-3",
        vec![test_node, dependent_node],
        Vec::new(),
        HashMap::new(),
        Vec::new(),
        HashMap::new(),
        marker_registry(),
        false,
    )
    .unwrap();

    deploy(&ctx).await.unwrap();
    undeploy(&ctx).await.unwrap();

    assert_eq!(ctx.status(), Status::Pending);
    for name in ["test_node", "dependent_node"] {
        let node = ctx.node_by_name(name).unwrap();
        assert!(node.attributes_snapshot().is_empty(), "{name} still has runtime properties");
        assert!(!node.is_provisioned());
    }
}

#[tokio::test]
async fn deploy_fails_with_unresolvable_standard_operation_reference() {
    let mut node_type = NodeType::default();
    node_type
        .standard
        .insert("create".to_string(), InterfaceOp::new("nonexistent_module:x"));
    let ctx = Context::new(
        "scenario-4",
        vec![leaf("solo", Arc::new(node_type))],
        Vec::new(),
        HashMap::new(),
        Vec::new(),
        HashMap::new(),
        OperationRegistry::builder().build(),
        false,
    )
    .unwrap();

    let err = deploy(&ctx).await.unwrap_err();
    assert_eq!(ctx.status(), Status::Failed);
    assert!(matches!(err, DriverError::Operation(_)));
    assert!(err.to_string().contains("nonexistent_module:x"));
}

#[tokio::test]
async fn deploy_fails_with_malformed_implementation_reference() {
    let mut node_type = NodeType::default();
    node_type
        .standard
        .insert("create".to_string(), InterfaceOp::new("bad_no_colon"));
    let ctx = Context::new(
        "scenario-5",
        vec![leaf("solo", Arc::new(node_type))],
        Vec::new(),
        HashMap::new(),
        Vec::new(),
        HashMap::new(),
        OperationRegistry::builder().build(),
        false,
    )
    .unwrap();

    let err = deploy(&ctx).await.unwrap_err();
    assert!(matches!(
        err,
        DriverError::Operation(warden_ops::OperationError::InvalidReference { .. })
    ));
}

#[tokio::test]
async fn rollback_enabled_deploy_completes_and_subsequent_undeploy_succeeds() {
    let mut ok_type = NodeType::default();
    ok_type.standard.insert("create".to_string(), InterfaceOp::new("test:ok"));

    let mut failing_type = NodeType::default();
    failing_type.standard.insert("create".to_string(), InterfaceOp::new("test:ok"));
    failing_type
        .standard
        .insert("start".to_string(), InterfaceOp::new("test:fail_start"));

    let registry = OperationRegistry::builder()
        .register_standard("test:ok", Arc::new(WriteMarker("created")))
        .register_standard("test:fail_start", Arc::new(AlwaysFails))
        .build();

    let ctx = Context::new(
        "scenario-6",
        vec![leaf("node_ok", Arc::new(ok_type)), leaf("node_fail", Arc::new(failing_type))],
        Vec::new(),
        HashMap::new(),
        Vec::new(),
        HashMap::new(),
        registry,
        true,
    )
    .unwrap();

    deploy(&ctx).await.unwrap();
    assert_eq!(ctx.status(), Status::Failed);
    assert!(ctx.node_by_name("node_ok").unwrap().is_provisioned());
    assert!(!ctx.node_by_name("node_fail").unwrap().is_provisioned());

    undeploy(&ctx).await.unwrap();
    assert_eq!(ctx.status(), Status::Pending);
}
