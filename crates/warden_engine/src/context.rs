//! The context facade (§4.7): the single entry point a caller drives a
//! deployment through.

use std::cell::{Cell, OnceCell};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use warden_graph::{
    build_plan, resolve, DeclaredType, Node, NodeError, NodeTemplate, OutputDefinition, Plan, PlannerError,
    PropertyResolver, RelationshipType, Requirement, TemplateInput, Value,
};
use warden_ops::OperationRegistry;

use crate::error::ContextError;
use crate::status::Status;

/// A bound deployment: the instantiated node set, the deployment plan
/// (built lazily and memoized), bound inputs, declared outputs, and the
/// status state machine.
pub struct Context {
    name: String,
    nodes: Vec<Node>,
    input_definitions: Vec<TemplateInput>,
    inputs: HashMap<String, Value>,
    outputs: Vec<OutputDefinition>,
    relationship_types: HashMap<String, RelationshipType>,
    registry: OperationRegistry,
    status: Cell<Status>,
    rollback_enabled: bool,
    plan: OnceCell<Plan>,
}

impl Context {
    /// Constructs a context from an already-parsed template: instantiated
    /// nodes, declared inputs/outputs, declared relationship types, and a
    /// sealed operation registry. Plan construction is deferred to the
    /// first call to [`Self::plan`] or [`crate::driver::deploy`].
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::MissingCreate`] if any node's type declares
    /// no `create` standard-interface operation — a node can never be
    /// provisioned without one, so this is rejected at construction rather
    /// than surfacing as a deploy-time failure.
    pub fn new(
        name: impl Into<String>,
        nodes: Vec<NodeTemplate>,
        input_definitions: Vec<TemplateInput>,
        inputs: HashMap<String, Value>,
        outputs: Vec<OutputDefinition>,
        relationship_types: HashMap<String, RelationshipType>,
        registry: OperationRegistry,
        rollback_enabled: bool,
    ) -> Result<Self, ContextError> {
        let nodes: Vec<Node> = nodes.into_iter().map(Node::new).collect();
        for node in &nodes {
            let has_create = node
                .standard_event("create")
                .and_then(|op| op.implementation)
                .is_some();
            if !has_create {
                return Err(ContextError::MissingCreate {
                    node: node.name().to_string(),
                });
            }
        }
        Ok(Self {
            name: name.into(),
            nodes,
            input_definitions,
            inputs,
            outputs,
            relationship_types,
            registry,
            status: Cell::new(Status::Pending),
            rollback_enabled,
            plan: OnceCell::new(),
        })
    }

    /// The deployment's unique name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current lifecycle status.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status.get()
    }

    /// Sets the lifecycle status; used by the driver as the deployment
    /// progresses through its phases.
    pub(crate) fn set_status(&self, status: Status) {
        self.status.set(status);
    }

    /// Whether rollback handling is enabled for this deployment.
    #[must_use]
    pub fn rollback_enabled(&self) -> bool {
        self.rollback_enabled
    }

    /// The instantiated node set, in declaration order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Looks up a node by its declared name.
    #[must_use]
    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name() == name)
    }

    /// The sealed operation registry used to resolve event implementations.
    #[must_use]
    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// The declared relationship type for `relationship_name`, if any.
    #[must_use]
    pub fn relationship_type(&self, relationship_name: &str) -> Option<&RelationshipType> {
        self.relationship_types.get(relationship_name)
    }

    /// Finds the `requires` edge `source` declares toward `target_name`,
    /// if any — used to look up the declared relationship type for a
    /// `link`/`unlink` dispatch.
    #[must_use]
    pub fn requirement_toward<'a>(&self, source: &'a Node, target_name: &str) -> Option<&'a Requirement> {
        source.requirements().iter().find(|req| req.target_name() == target_name)
    }

    /// The memoized deployment plan, building it on first access.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError`] if the node set's `requires` edges do not
    /// form a DAG, or name a node outside the deployment.
    pub fn plan(&self) -> Result<&Plan, PlannerError> {
        if self.plan.get().is_none() {
            let built = build_plan(&self.nodes)?;
            drop(self.plan.set(built));
        }
        Ok(self.plan.get().expect("just initialized above"))
    }

    /// Whether any node in the deployment is currently provisioned.
    #[must_use]
    pub fn any_node_provisioned(&self) -> bool {
        self.nodes.iter().any(Node::is_provisioned)
    }

    /// Resolves the declared deployment outputs, once the deployment has
    /// reached a destructible status (§4.7).
    ///
    /// # Errors
    ///
    /// Returns [`OutputsError::NotReady`] if the status is neither
    /// `Completed` nor `Failed`, or [`OutputsError::Node`] if an output's
    /// intrinsic reference cannot be resolved.
    pub fn outputs(&self) -> Result<HashMap<String, Value>, OutputsError> {
        if !self.status.get().available_for_destruction() {
            return Err(OutputsError::NotReady { actual: self.status.get() });
        }
        let resolver = OutputResolver(self);
        self.outputs
            .iter()
            .map(|def| Ok((def.name.clone(), resolve(&def.value, &resolver)?)))
            .collect()
    }

    /// Captures the deployment's critical runtime state — status, bound
    /// inputs, and every node's provisioned flag and attribute view — for
    /// later persistence (§4.7). The template shape itself (node types,
    /// requirements, interfaces) is not part of the snapshot: restoring it
    /// is the caller's job, via [`Self::new`] with the same template data,
    /// before calling [`Self::restore`].
    #[must_use]
    pub fn serialize(&self) -> ContextSnapshot {
        ContextSnapshot {
            name: self.name.clone(),
            status: self.status(),
            inputs: self.inputs.clone(),
            nodes: self.nodes.iter().map(NodeSnapshot::capture).collect(),
        }
    }

    /// Restores status and per-node runtime state from a snapshot taken by
    /// [`Self::serialize`] against a context built from the same template.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::UnknownNode`] if the snapshot names a node this
    /// context's template data does not have.
    pub fn restore(&self, snapshot: &ContextSnapshot) -> Result<(), NodeError> {
        self.set_status(snapshot.status);
        for node_snapshot in &snapshot.nodes {
            let node = self
                .node_by_name(&node_snapshot.name)
                .ok_or_else(|| NodeError::UnknownNode {
                    node: node_snapshot.name.clone(),
                })?;
            node.set_provisioned(node_snapshot.is_provisioned);
            node.restore_attributes(node_snapshot.attributes.clone());
        }
        Ok(())
    }
}

/// A node's persisted runtime state: name, provisioned flag, attribute
/// view. Grounded on the node-level fields the original serializes
/// (`__name`, `is_provisioned`, `__attributes`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// The node's unique name, used to match it back up on restore.
    pub name: String,
    /// Whether the node was provisioned at the time of the snapshot.
    pub is_provisioned: bool,
    /// The node's attribute view at the time of the snapshot.
    pub attributes: HashMap<String, Value>,
}

impl NodeSnapshot {
    fn capture(node: &Node) -> Self {
        Self {
            name: node.name().to_string(),
            is_provisioned: node.is_provisioned(),
            attributes: node.attributes_snapshot(),
        }
    }
}

/// A deployment's persisted critical state, produced by
/// [`Context::serialize`] and consumed by [`Context::restore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    /// The deployment's name.
    pub name: String,
    /// The lifecycle status at the time of the snapshot.
    pub status: Status,
    /// The bound top-level inputs.
    pub inputs: HashMap<String, Value>,
    /// Every node's persisted runtime state.
    pub nodes: Vec<NodeSnapshot>,
}

impl PropertyResolver for Context {
    fn resolve_input(&self, input_name: &str) -> Result<Value, NodeError> {
        if let Some(value) = self.inputs.get(input_name) {
            return Ok(value.clone());
        }
        let Some(definition) = self.input_definitions.iter().find(|input| input.name == input_name) else {
            return Err(NodeError::InputNotFound {
                input: input_name.to_string(),
            });
        };
        if let Some(default) = &definition.default {
            return Ok(default.clone());
        }
        if definition.required {
            return Err(NodeError::MissingRequiredInput {
                input: input_name.to_string(),
            });
        }
        Ok(Value::zero(definition.declared_type.unwrap_or(DeclaredType::String)))
    }

    fn resolve_property(&self, node_template_name: &str, property_name: &str) -> Result<Value, NodeError> {
        let node = self
            .node_by_name(node_template_name)
            .ok_or_else(|| NodeError::UnknownNode {
                node: node_template_name.to_string(),
            })?;
        node.property(property_name, self)
    }

    fn resolve_attribute(&self, node_template_name: &str, attribute_name: &str) -> Result<Value, NodeError> {
        let node = self
            .node_by_name(node_template_name)
            .ok_or_else(|| NodeError::UnknownNode {
                node: node_template_name.to_string(),
            })?;
        Ok(node.attribute(attribute_name))
    }
}

/// Wraps a [`Context`] to enforce the stricter resolution rules output
/// references are held to (§4.7): a `get_attribute` naming an unprovisioned
/// node, or an attribute its type doesn't declare, is an error rather than
/// the `Value::Null` the permissive mid-deploy view returns. Inputs and
/// properties resolve exactly as they do through the context itself.
struct OutputResolver<'a>(&'a Context);

impl PropertyResolver for OutputResolver<'_> {
    fn resolve_input(&self, input_name: &str) -> Result<Value, NodeError> {
        self.0.resolve_input(input_name)
    }

    fn resolve_property(&self, node_template_name: &str, property_name: &str) -> Result<Value, NodeError> {
        self.0.resolve_property(node_template_name, property_name)
    }

    fn resolve_attribute(&self, node_template_name: &str, attribute_name: &str) -> Result<Value, NodeError> {
        let node = self
            .0
            .node_by_name(node_template_name)
            .ok_or_else(|| NodeError::UnknownNode {
                node: node_template_name.to_string(),
            })?;
        node.checked_attribute(attribute_name)
    }
}

/// Errors raised while resolving [`Context::outputs`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OutputsError {
    /// Outputs were requested before the deployment reached a destructible
    /// status.
    #[error("outputs unavailable: status {actual:?} is not completed or failed")]
    NotReady {
        /// The status observed.
        actual: Status,
    },
    /// An output's intrinsic reference could not be resolved.
    #[error(transparent)]
    Node(#[from] NodeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use warden_graph::{IntrinsicRef, NodeType, PropertyValue};

    fn template(name: &str) -> NodeTemplate {
        NodeTemplate {
            name: name.to_string(),
            type_id: "example.Node".to_string(),
            node_type: Arc::new(NodeType::default()),
            properties: HashMap::new(),
            requirements: Vec::new(),
            template_overrides: HashMap::new(),
            artifacts: HashMap::new(),
        }
    }

    fn creatable_template(name: &str) -> NodeTemplate {
        let mut tpl = template(name);
        let mut node_type = NodeType::default();
        node_type
            .standard
            .insert("create".to_string(), warden_graph::InterfaceOp::new("test:create"));
        node_type.attributes = vec!["ip_address".to_string()];
        tpl.node_type = Arc::new(node_type);
        tpl
    }

    fn empty_context(rollback_enabled: bool) -> Context {
        Context::new(
            "demo",
            vec![creatable_template("solo")],
            Vec::new(),
            HashMap::new(),
            Vec::new(),
            HashMap::new(),
            OperationRegistry::builder().build(),
            rollback_enabled,
        )
        .unwrap()
    }

    #[test]
    fn new_context_starts_pending() {
        let ctx = empty_context(false);
        assert_eq!(ctx.status(), Status::Pending);
    }

    #[test]
    fn resolve_input_falls_back_to_zero_value_for_optional_input() {
        let mut ctx = empty_context(false);
        ctx.input_definitions.push(TemplateInput {
            name: "region".to_string(),
            declared_type: Some(DeclaredType::String),
            default: None,
            required: false,
        });
        assert_eq!(ctx.resolve_input("region"), Ok(Value::String(String::new())));
    }

    #[test]
    fn required_input_with_no_binding_is_missing_required_input() {
        let mut ctx = empty_context(false);
        ctx.input_definitions.push(TemplateInput {
            name: "region".to_string(),
            declared_type: Some(DeclaredType::String),
            default: None,
            required: true,
        });
        assert!(matches!(
            ctx.resolve_input("region"),
            Err(NodeError::MissingRequiredInput { .. })
        ));
    }

    #[test]
    fn outputs_unavailable_before_completion() {
        let ctx = empty_context(false);
        assert!(matches!(ctx.outputs(), Err(OutputsError::NotReady { .. })));
    }

    #[test]
    fn outputs_resolve_attribute_once_completed() {
        let mut ctx = empty_context(false);
        ctx.outputs.push(OutputDefinition {
            name: "ip".to_string(),
            value: PropertyValue::Intrinsic(IntrinsicRef::GetAttribute {
                node_template_name: "solo".to_string(),
                attribute_name: "ip_address".to_string(),
            }),
        });
        let node = ctx.node_by_name("solo").unwrap();
        node.set_provisioned(true);
        node.set_attribute("ip_address", Value::String("10.0.0.1".into()));
        ctx.set_status(Status::Completed);
        let outputs = ctx.outputs().unwrap();
        assert_eq!(outputs.get("ip"), Some(&Value::String("10.0.0.1".into())));
    }

    #[test]
    fn outputs_reject_unprovisioned_referenced_node() {
        let mut ctx = empty_context(false);
        ctx.outputs.push(OutputDefinition {
            name: "ip".to_string(),
            value: PropertyValue::Intrinsic(IntrinsicRef::GetAttribute {
                node_template_name: "solo".to_string(),
                attribute_name: "ip_address".to_string(),
            }),
        });
        ctx.set_status(Status::Failed);
        assert!(matches!(
            ctx.outputs(),
            Err(OutputsError::Node(NodeError::NotProvisioned { .. }))
        ));
    }

    #[test]
    fn outputs_reject_undeclared_attribute() {
        let mut ctx = empty_context(false);
        ctx.outputs.push(OutputDefinition {
            name: "mystery".to_string(),
            value: PropertyValue::Intrinsic(IntrinsicRef::GetAttribute {
                node_template_name: "solo".to_string(),
                attribute_name: "undeclared".to_string(),
            }),
        });
        ctx.node_by_name("solo").unwrap().set_provisioned(true);
        ctx.set_status(Status::Completed);
        assert!(matches!(
            ctx.outputs(),
            Err(OutputsError::Node(NodeError::UnknownAttribute { .. }))
        ));
    }

    #[test]
    fn serialize_then_restore_round_trips_node_state() {
        let ctx = empty_context(false);
        ctx.node_by_name("solo").unwrap().set_provisioned(true);
        ctx.node_by_name("solo")
            .unwrap()
            .set_attribute("ip_address", Value::String("10.0.0.2".into()));
        ctx.set_status(Status::Completed);
        let snapshot = ctx.serialize();

        let fresh = empty_context(false);
        fresh.restore(&snapshot).unwrap();

        assert_eq!(fresh.status(), Status::Completed);
        let node = fresh.node_by_name("solo").unwrap();
        assert!(node.is_provisioned());
        assert_eq!(node.attribute("ip_address"), Value::String("10.0.0.2".into()));
    }

    #[test]
    fn restore_rejects_snapshot_naming_unknown_node() {
        let fresh = empty_context(false);
        let snapshot = ContextSnapshot {
            name: "demo".to_string(),
            status: Status::Completed,
            inputs: HashMap::new(),
            nodes: vec![NodeSnapshot {
                name: "ghost".to_string(),
                is_provisioned: true,
                attributes: HashMap::new(),
            }],
        };
        assert!(matches!(fresh.restore(&snapshot), Err(NodeError::UnknownNode { .. })));
    }

    #[test]
    fn new_rejects_node_type_with_no_create_operation() {
        let result = Context::new(
            "demo",
            vec![template("solo")],
            Vec::new(),
            HashMap::new(),
            Vec::new(),
            HashMap::new(),
            OperationRegistry::builder().build(),
            false,
        );
        assert!(matches!(
            result,
            Err(ContextError::MissingCreate { node }) if node == "solo"
        ));
    }
}
