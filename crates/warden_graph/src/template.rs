//! Parsed-template data types: the shape the (external) template parser is
//! contracted to deliver, per §6.

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::intrinsic::PropertyValue;
use crate::value::{DeclaredType, Value};

/// Unique identifier for a node in a [`crate::node::NodeSet`].
///
/// Newtype over the node's position, assigned once at construction time and
/// stable for the node's lifetime — never recomputed from a name lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Creates a node id from a raw index.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// A `requires` edge as declared on a node template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Bare target name; the relationship type is looked up from the
    /// node's "related" mapping supplied by the parser.
    Name(String),
    /// Fully qualified requirement naming an explicit relationship type
    /// and (optionally) a capability to bind to.
    Full {
        /// Name of the target node template.
        node: String,
        /// Declared relationship type, if any.
        relationship: Option<String>,
        /// Declared capability name, if any.
        capability: Option<String>,
    },
}

impl Requirement {
    /// The target node name this requirement depends on.
    #[must_use]
    pub fn target_name(&self) -> &str {
        match self {
            Requirement::Name(name) => name,
            Requirement::Full { node, .. } => node,
        }
    }

    /// The declared relationship type, if this requirement names one
    /// explicitly.
    #[must_use]
    pub fn relationship(&self) -> Option<&str> {
        match self {
            Requirement::Name(_) => None,
            Requirement::Full { relationship, .. } => relationship.as_deref(),
        }
    }
}

/// A single lifecycle or relationship event implementation: an
/// `implementation` reference plus its bound `inputs`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterfaceOp {
    /// `"module-path:symbol"` reference into the operation registry, or
    /// `None` when the event has no implementation (treated as a no-op).
    pub implementation: Option<String>,
    /// Inputs bound to this event's invocation.
    pub inputs: HashMap<String, Value>,
}

impl InterfaceOp {
    /// Creates an operation reference with no bound inputs.
    #[must_use]
    pub fn new(implementation: impl Into<String>) -> Self {
        Self {
            implementation: Some(implementation.into()),
            inputs: HashMap::new(),
        }
    }

    /// Overlays `template_override`'s `implementation` (if set) and merges
    /// its `inputs` on top of `self`, per the template-override rule in
    /// §4.3.
    #[must_use]
    pub fn overlay(&self, template_override: &InterfaceOp) -> Self {
        let implementation = template_override
            .implementation
            .clone()
            .or_else(|| self.implementation.clone());
        let mut inputs = self.inputs.clone();
        for (key, value) in &template_override.inputs {
            inputs.insert(key.clone(), value.clone());
        }
        Self {
            implementation,
            inputs,
        }
    }
}

/// Declared relationship type: its `Configure` interface operations keyed
/// by event name (`link`/`unlink`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipType {
    /// Event name (`link`/`unlink`) → operation reference.
    pub configure: HashMap<String, InterfaceOp>,
}

/// A node type's `Standard` interface and declared attribute names, shared
/// by every [`NodeTemplate`] instantiated from that type.
#[derive(Debug, Clone, Default)]
pub struct NodeType {
    /// Event name → operation reference, for the node's lifecycle events.
    pub standard: HashMap<String, InterfaceOp>,
    /// Attribute names the node type declares (populated into the
    /// attribute view once provisioned).
    pub attributes: Vec<String>,
}

/// A declared template input (`TemplateInput` in §3).
#[derive(Debug, Clone)]
pub struct TemplateInput {
    /// Input name.
    pub name: String,
    /// Declared type, or `None` for an unrecognized/custom type name.
    pub declared_type: Option<DeclaredType>,
    /// Default value, if declared.
    pub default: Option<Value>,
    /// Whether a binding is mandatory when no default is present.
    pub required: bool,
}

/// A declared deployment output (§4.7): a name bound to a literal or an
/// intrinsic reference, resolved once the deployment reaches a
/// destructible status.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDefinition {
    /// Output name.
    pub name: String,
    /// Literal or intrinsic-reference value.
    pub value: PropertyValue,
}

/// The parsed definition of one node in the topology template (`NodeTemplate`
/// in §3) — the immutable input to [`crate::node::Node::new`].
#[derive(Debug, Clone)]
pub struct NodeTemplate {
    /// Unique node name.
    pub name: String,
    /// Type identifier (informational; behavior is driven by `node_type`).
    pub type_id: String,
    /// Shared type definition (interfaces, declared attributes).
    pub node_type: Arc<NodeType>,
    /// Declared properties: literal or intrinsic-reference valued.
    pub properties: HashMap<String, PropertyValue>,
    /// `requires` edges, in declaration order.
    pub requirements: Vec<Requirement>,
    /// Per-template overrides of the type's `Standard` interface.
    pub template_overrides: HashMap<String, InterfaceOp>,
    /// Artifact definitions, opaque to the engine beyond intrinsic
    /// resolution of their values.
    pub artifacts: HashMap<String, Value>,
}
