//! The runtime node: property materialization, the attribute view, and
//! lifecycle/relationship event lookup (§4.3, §4.4).

use std::cell::{Cell, RefCell};

use hashbrown::HashMap;

use crate::intrinsic::PropertyValue;
use crate::template::{InterfaceOp, NodeTemplate};
use crate::value::Value;

/// Resolves the intrinsic references a node's properties may carry,
/// without giving the node a back-pointer into whatever owns the rest of
/// the node set (§5, §6).
pub trait PropertyResolver {
    /// Resolves a top-level deployment input by name.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::InputNotFound`] if no input is declared under
    /// this name at all, or [`NodeError::MissingRequiredInput`] if it is
    /// declared `required` with no default and no binding was supplied.
    fn resolve_input(&self, input_name: &str) -> Result<Value, NodeError>;

    /// Resolves another node's declared property by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the node or property does not exist.
    fn resolve_property(&self, node_template_name: &str, property_name: &str) -> Result<Value, NodeError>;

    /// Resolves another node's runtime attribute by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist; an attribute with no
    /// value yet yields `Value::Null` rather than an error (§4.3).
    fn resolve_attribute(&self, node_template_name: &str, attribute_name: &str) -> Result<Value, NodeError>;
}

/// Errors raised while materializing a node's properties or attributes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NodeError {
    /// A declared property was referenced that does not exist on this node.
    #[error("node {node} has no property {property}")]
    PropertyNotFound {
        /// The node searched.
        node: String,
        /// The property name looked up.
        property: String,
    },
    /// A `get_input` reference named an input not declared in the deployment
    /// at all.
    #[error("input {input} is not bound")]
    InputNotFound {
        /// The input name looked up.
        input: String,
    },
    /// A `get_input` reference named an input that is declared `required`
    /// with no default, and no binding was supplied for it.
    #[error("required input {input} has no binding")]
    MissingRequiredInput {
        /// The input name looked up.
        input: String,
    },
    /// A `get_property`/`get_attribute` reference named a node that is not
    /// part of this deployment.
    #[error("no node named {node} in this deployment")]
    UnknownNode {
        /// The node name looked up.
        node: String,
    },
    /// A `get_attribute` reference (or output) named a node that has not
    /// yet been provisioned — its attribute view is empty until then (§4.3).
    #[error("node {node} is not provisioned")]
    NotProvisioned {
        /// The node looked up.
        node: String,
    },
    /// A `get_attribute` reference (or output) named an attribute the
    /// node's type does not declare.
    #[error("node {node} has no declared attribute {attribute}")]
    UnknownAttribute {
        /// The node looked up.
        node: String,
        /// The attribute name looked up.
        attribute: String,
    },
}

/// A node instantiated from a [`NodeTemplate`]: the template's declared
/// shape plus the mutable runtime state (attributes, provisioned flag)
/// operations observe and update as the deployment progresses.
///
/// Mutable fields use interior mutability rather than a lock: execution is
/// single-threaded and cooperative (§5), so a `RefCell`/`Cell` pair is
/// sufficient and keeps operation futures free of a `Send` bound.
#[derive(Debug)]
pub struct Node {
    template: NodeTemplate,
    runtime_properties: RefCell<HashMap<String, Value>>,
    provisioned: Cell<bool>,
}

impl Node {
    /// Instantiates a node from its parsed template, with an empty
    /// attribute view and `provisioned = false`.
    #[must_use]
    pub fn new(template: NodeTemplate) -> Self {
        Self {
            template,
            runtime_properties: RefCell::new(HashMap::new()),
            provisioned: Cell::new(false),
        }
    }

    /// The node's unique name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.template.name
    }

    /// The node's declared type identifier.
    #[must_use]
    pub fn type_id(&self) -> &str {
        &self.template.type_id
    }

    /// The node's `requires` edges.
    #[must_use]
    pub fn requirements(&self) -> &[crate::template::Requirement] {
        &self.template.requirements
    }

    /// Whether the node's `create` event has run successfully and neither
    /// `stop` nor `delete` has since torn it down.
    #[must_use]
    pub fn is_provisioned(&self) -> bool {
        self.provisioned.get()
    }

    /// Sets the provisioned flag; called by the lifecycle driver after a
    /// successful `create`, or after `delete` tears the node down.
    pub fn set_provisioned(&self, provisioned: bool) {
        self.provisioned.set(provisioned);
    }

    /// Materializes a declared property by name: a literal is cloned as-is,
    /// an intrinsic reference is resolved against `resolver` on every call
    /// (§4.3 — properties are never cached, so a property that depends on
    /// a sibling's attribute can resolve mid-deploy once that attribute is
    /// set).
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::PropertyNotFound`] if no such property is
    /// declared, or whatever error the resolver raises for an intrinsic
    /// reference it cannot satisfy.
    pub fn property(&self, name: &str, resolver: &dyn PropertyResolver) -> Result<Value, NodeError> {
        let declared =
            self.template
                .properties
                .get(name)
                .ok_or_else(|| NodeError::PropertyNotFound {
                    node: self.name().to_string(),
                    property: name.to_string(),
                })?;
        crate::intrinsic::resolve(declared, resolver)
    }

    /// Reads the attribute view: `runtime_properties` filtered down to the
    /// names the node type declares, empty until the node is provisioned
    /// (§3, §4.3). A name outside the declared set, or any name before
    /// provisioning, reads as `Value::Null` rather than an error — that is
    /// the permissive path mid-deploy property resolution relies on; the
    /// strict, error-raising counterpart is [`Self::checked_attribute`].
    #[must_use]
    pub fn attribute(&self, name: &str) -> Value {
        if !self.is_provisioned() || !self.declares_attribute(name) {
            return Value::Null;
        }
        self.runtime_properties
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// The strict counterpart to [`Self::attribute`], used for output
    /// resolution (§4.7): an unprovisioned node or an attribute name the
    /// node type doesn't declare is an error instead of `Value::Null`.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::NotProvisioned`] if the node has not been
    /// provisioned, or [`NodeError::UnknownAttribute`] if `name` is not
    /// among the node type's declared attributes.
    pub fn checked_attribute(&self, name: &str) -> Result<Value, NodeError> {
        if !self.is_provisioned() {
            return Err(NodeError::NotProvisioned {
                node: self.name().to_string(),
            });
        }
        if !self.declares_attribute(name) {
            return Err(NodeError::UnknownAttribute {
                node: self.name().to_string(),
                attribute: name.to_string(),
            });
        }
        Ok(self
            .runtime_properties
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or(Value::Null))
    }

    fn declares_attribute(&self, name: &str) -> bool {
        self.template.node_type.attributes.iter().any(|declared| declared == name)
    }

    /// Sets a single runtime attribute.
    pub fn set_attribute(&self, name: impl Into<String>, value: Value) {
        self.runtime_properties.borrow_mut().insert(name.into(), value);
    }

    /// Copies every entry of `other` into this node's attribute view,
    /// overwriting any existing keys — the behavior the built-in `link`
    /// relationship relies on to propagate a target's attributes onto its
    /// source (§4.4).
    pub fn batch_update_attributes(&self, other: &HashMap<String, Value>) {
        self.runtime_properties
            .borrow_mut()
            .extend(other.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Removes every key also present in `other` from this node's
    /// attribute view — the behavior the built-in `unlink` relationship
    /// relies on to undo a prior `link` (§4.4).
    pub fn remove_attributes(&self, other: &HashMap<String, Value>) {
        let mut attrs = self.runtime_properties.borrow_mut();
        for key in other.keys() {
            attrs.remove(key);
        }
    }

    /// A snapshot of the current attribute view, for serialization (§4.7).
    #[must_use]
    pub fn attributes_snapshot(&self) -> HashMap<String, Value> {
        self.runtime_properties.borrow().clone()
    }

    /// Restores an attribute view previously produced by
    /// [`Self::attributes_snapshot`].
    pub fn restore_attributes(&self, attributes: HashMap<String, Value>) {
        *self.runtime_properties.borrow_mut() = attributes;
    }

    /// Resolves the `Standard` interface operation for `event_name`
    /// (`create`/`configure`/`start`/`stop`/`delete`), applying any
    /// per-template override (§4.3).
    #[must_use]
    pub fn standard_event(&self, event_name: &str) -> Option<InterfaceOp> {
        let base = self.template.node_type.standard.get(event_name);
        let overridden = self.template.template_overrides.get(event_name);
        match (base, overridden) {
            (Some(base), Some(overridden)) => Some(base.overlay(overridden)),
            (Some(base), None) => Some(base.clone()),
            (None, Some(overridden)) => Some(overridden.clone()),
            (None, None) => None,
        }
    }
}
